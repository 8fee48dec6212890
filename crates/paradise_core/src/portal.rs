use glam::Vec3;
use paradise_math::vector::{distance, side};
use paradise_math::{MathError, Matrix4, VectorExt};
use tracing::{debug, warn};

use crate::camera::Camera;
use crate::mesh::BoundingBox;
use crate::object::ObjectId;

const PORTAL_PLANE_FILTER: Vec3 = Vec3::new(1.0, 1.0, 0.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortalSide {
    #[default]
    Unset,
    Front,
    Back,
    OnPlane,
}

impl PortalSide {
    pub fn from_sign(sign: f32) -> Self {
        if sign > 0.0 {
            Self::Front
        } else if sign < 0.0 {
            Self::Back
        } else {
            Self::OnPlane
        }
    }

    pub fn sign(self) -> f32 {
        match self {
            Self::Front => 1.0,
            Self::Back => -1.0,
            Self::Unset | Self::OnPlane => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalFrame {
    pub world: Matrix4,
    pub position: Vec3,
    pub normal: Vec3,
    pub radius: f32,
}

impl PortalFrame {
    pub fn new(world: Matrix4, bounds: &BoundingBox) -> Self {
        let scale = world.size().abs();
        Self {
            position: world.position(),
            normal: world.get_column(2).truncate().normalized(),
            radius: bounds.radius(PORTAL_PLANE_FILTER * scale),
            world,
        }
    }

    pub fn side_of(&self, observer: Vec3) -> PortalSide {
        PortalSide::from_sign(side(observer, self.position, self.normal))
    }

    pub fn is_near(&self, observer: Vec3) -> bool {
        distance(observer, self.position) < self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkFrames {
    pub master: PortalFrame,
    pub link: PortalFrame,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortalLink {
    pub master: ObjectId,
    pub link: ObjectId,
    side: PortalSide,
}

impl PortalLink {
    pub fn side(&self) -> PortalSide {
        self.side
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeleportEvent {
    pub link_index: usize,
    pub master: ObjectId,
    pub link: ObjectId,
    pub from: Vec3,
    pub to: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct PortalRegistry {
    links: Vec<PortalLink>,
}

impl PortalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, master: ObjectId, link: ObjectId) -> usize {
        self.links.push(PortalLink {
            master,
            link,
            side: PortalSide::Unset,
        });
        self.links.len() - 1
    }

    pub fn links(&self) -> &[PortalLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn evaluate_crossings(
        &mut self,
        camera: &mut Camera,
        frames: &[Option<LinkFrames>],
    ) -> Option<TeleportEvent> {
        let observer = camera.transform.position;
        let new_sides: Vec<Option<PortalSide>> = frames
            .iter()
            .map(|frames| frames.map(|f| f.master.side_of(observer)))
            .collect();

        for index in 0..self.links.len() {
            let (Some(Some(pair)), Some(Some(new_side))) =
                (frames.get(index), new_sides.get(index).copied())
            else {
                continue;
            };

            let previous = self.links[index].side;
            if previous == PortalSide::Unset {
                self.links[index].side = new_side;
                continue;
            }

            if new_side == previous || !pair.master.is_near(observer) {
                self.links[index].side = new_side;
                continue;
            }

            let destination = match Self::teleported_camera(camera, pair) {
                Ok(destination) => destination,
                Err(err) => {
                    warn!("Skipping teleport through portal link {index}: {err}");
                    self.links[index].side = new_side;
                    continue;
                }
            };

            destination.write_to_transform(&mut camera.transform);
            let arrived = camera.transform.position;
            for (link, pair) in self.links.iter_mut().zip(frames) {
                if let Some(pair) = pair {
                    link.side = pair.master.side_of(arrived);
                }
            }
            self.links[index].side = new_side;

            let link = &self.links[index];
            debug!("Teleported through portal link {index}: {observer} -> {arrived}");
            return Some(TeleportEvent {
                link_index: index,
                master: link.master,
                link: link.link,
                from: observer,
                to: arrived,
            });
        }

        None
    }

    fn teleported_camera(camera: &Camera, frames: &LinkFrames) -> Result<Matrix4, MathError> {
        camera
            .relative_mirror(&frames.master.world, &frames.link.world)?
            .try_inverse()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use glam::Vec3;
    use paradise_math::{Matrix4, Transform};

    use super::{LinkFrames, PortalFrame, PortalRegistry, PortalSide};
    use crate::camera::Camera;
    use crate::mesh::{BoundingBox, MeshData};
    use crate::object::ObjectId;

    fn frame_with_radius(world: Matrix4, radius: f32) -> PortalFrame {
        PortalFrame {
            position: world.position(),
            normal: world.get_column(2).truncate().normalize(),
            radius,
            world,
        }
    }

    fn linked_pair(radius: f32) -> (PortalRegistry, Vec<Option<LinkFrames>>) {
        let mut registry = PortalRegistry::new();
        registry.add(ObjectId(0), ObjectId(1));
        let far_side =
            Transform::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, PI, 0.0), Vec3::ONE);
        let frames = vec![Some(LinkFrames {
            master: frame_with_radius(Matrix4::IDENTITY, radius),
            link: frame_with_radius(far_side.world_matrix(), radius),
        })];
        (registry, frames)
    }

    fn walk(
        camera: &mut Camera,
        registry: &mut PortalRegistry,
        frames: &[Option<LinkFrames>],
        path: &[Vec3],
    ) -> usize {
        let mut teleports = 0;
        for &position in path {
            camera.transform.position = position;
            if registry.evaluate_crossings(camera, frames).is_some() {
                teleports += 1;
            }
        }
        teleports
    }

    #[test]
    fn first_evaluation_only_records_side() {
        let (mut registry, frames) = linked_pair(2.0);
        let mut camera = Camera::default();
        camera.transform.position = Vec3::new(0.0, 0.0, -1.0);

        assert!(registry.evaluate_crossings(&mut camera, &frames).is_none());
        assert_eq!(registry.links()[0].side(), PortalSide::Back);
        assert_eq!(camera.transform.position, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn crossing_inside_radius_teleports_once() {
        let (mut registry, frames) = linked_pair(2.0);
        let mut camera = Camera::default();
        let path = [Vec3::new(0.5, 0.0, 1.0), Vec3::new(0.5, 0.0, -1.0)];

        assert_eq!(walk(&mut camera, &mut registry, &frames, &path), 1);
    }

    #[test]
    fn crossing_outside_radius_does_not_teleport() {
        let (mut registry, frames) = linked_pair(2.0);
        let mut camera = Camera::default();
        let path = [Vec3::new(5.0, 0.0, 1.0), Vec3::new(5.0, 0.0, -1.0)];

        assert_eq!(walk(&mut camera, &mut registry, &frames, &path), 0);
        assert_eq!(registry.links()[0].side(), PortalSide::Back);
    }

    #[test]
    fn teleport_lands_mirrored_behind_linked_portal() {
        let quad = MeshData::quad(4.0, 4.0);
        let bounds = quad.bounding_box();
        let far_side =
            Transform::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, PI, 0.0), Vec3::ONE);

        let mut registry = PortalRegistry::new();
        registry.add(ObjectId(0), ObjectId(1));
        let frames = vec![Some(LinkFrames {
            master: PortalFrame::new(Matrix4::IDENTITY, &bounds),
            link: PortalFrame::new(far_side.world_matrix(), &bounds),
        })];

        let mut camera = Camera::default();
        camera.transform.position = Vec3::new(0.0, 0.0, 2.0);
        assert!(registry.evaluate_crossings(&mut camera, &frames).is_none());

        camera.transform.position = Vec3::new(0.0, 0.0, -2.0);
        let event = registry
            .evaluate_crossings(&mut camera, &frames)
            .expect("crossing within radius");
        assert!((event.to - Vec3::new(10.0, 0.0, -2.0)).length() < 1.0e-4);
        assert!((camera.transform.position - Vec3::new(10.0, 0.0, -2.0)).length() < 1.0e-4);
        assert!((camera.transform.scale - Vec3::ONE).length() < 1.0e-4);
    }

    #[test]
    fn frame_radius_uses_plane_extent_and_scale() {
        let bounds = BoundingBox {
            min: Vec3::new(-1.0, -2.0, -5.0),
            max: Vec3::new(1.0, 2.0, 5.0),
        };
        let world =
            Transform::new(Vec3::ZERO, Vec3::ZERO, Vec3::new(3.0, 1.0, 1.0)).world_matrix();
        let frame = PortalFrame::new(world, &bounds);
        let expected = Vec3::new(6.0, 4.0, 0.0).length() * 0.5;
        assert!((frame.radius - expected).abs() < 1.0e-5);
        assert_eq!(frame.normal, Vec3::Z);
    }

    #[test]
    fn first_crossing_wins_and_resyncs_every_link() {
        let near_side = Matrix4::IDENTITY;
        let far_side =
            Transform::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, PI, 0.0), Vec3::ONE)
                .world_matrix();
        let beside = Transform::from_position(Vec3::new(1.0, 0.0, 0.0)).world_matrix();

        let mut registry = PortalRegistry::new();
        registry.add(ObjectId(0), ObjectId(1));
        registry.add(ObjectId(1), ObjectId(0));
        registry.add(ObjectId(2), ObjectId(1));
        let frames = vec![
            Some(LinkFrames {
                master: frame_with_radius(near_side, 2.0),
                link: frame_with_radius(far_side, 2.0),
            }),
            Some(LinkFrames {
                master: frame_with_radius(far_side, 2.0),
                link: frame_with_radius(near_side, 2.0),
            }),
            Some(LinkFrames {
                master: frame_with_radius(beside, 2.0),
                link: frame_with_radius(far_side, 2.0),
            }),
        ];

        let mut camera = Camera::default();
        camera.transform.position = Vec3::new(0.0, 0.0, 1.0);
        assert!(registry.evaluate_crossings(&mut camera, &frames).is_none());

        // Both the first and the third portal are crossed within their radius.
        camera.transform.position = Vec3::new(0.0, 0.0, -1.0);
        let event = registry
            .evaluate_crossings(&mut camera, &frames)
            .expect("crossing within radius");
        assert_eq!(event.link_index, 0);
        assert!((event.to - Vec3::new(10.0, 0.0, -1.0)).length() < 1.0e-4);

        let sides: Vec<PortalSide> = registry.links().iter().map(|link| link.side()).collect();
        assert_eq!(sides, [PortalSide::Back, PortalSide::Front, PortalSide::Back]);

        let mut position = camera.transform.position;
        let mut teleports = 0;
        for _ in 0..3 {
            position.z -= 1.0;
            camera.transform.position = position;
            if registry.evaluate_crossings(&mut camera, &frames).is_some() {
                teleports += 1;
            }
        }
        assert_eq!(teleports, 0);
        assert!((camera.transform.position - Vec3::new(10.0, 0.0, -4.0)).length() < 1.0e-4);
    }

    #[test]
    fn reaching_the_plane_within_radius_teleports() {
        let (mut registry, frames) = linked_pair(2.0);
        let mut camera = Camera::default();
        camera.transform.position = Vec3::new(0.5, 0.0, 1.0);
        assert!(registry.evaluate_crossings(&mut camera, &frames).is_none());

        camera.transform.position = Vec3::new(0.5, 0.0, 0.0);
        let event = registry
            .evaluate_crossings(&mut camera, &frames)
            .expect("side change within radius");
        assert!((event.to - Vec3::new(10.5, 0.0, 0.0)).length() < 1.0e-4);
        assert_eq!(registry.links()[0].side(), PortalSide::OnPlane);
    }

    #[test]
    fn missing_frames_keep_previous_side() {
        let (mut registry, frames) = linked_pair(2.0);
        let mut camera = Camera::default();
        camera.transform.position = Vec3::new(0.0, 0.0, 1.0);
        registry.evaluate_crossings(&mut camera, &frames);

        camera.transform.position = Vec3::new(0.0, 0.0, -1.0);
        assert!(registry.evaluate_crossings(&mut camera, &[None]).is_none());
        assert_eq!(registry.links()[0].side(), PortalSide::Front);
    }
}
