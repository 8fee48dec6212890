use tracing::{info, warn};

use crate::camera::{Camera, CameraUniforms};
use crate::object::ObjectId;
use crate::portal::LinkFrames;
use crate::raster::{ClearFlags, DrawCall, MeshHandle, ObjectUniforms, RasterDevice, RasterState};
use crate::scene::SceneGraph;

pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.2, 0.5, 0.3, 1.0];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderFrameStats {
    pub draw_calls: u32,
    pub portal_passes: u32,
    pub teleports: u32,
    pub skipped_portals: u32,
    pub skipped_objects: u32,
}

/// Portal-aware draw orchestrator. Owns the scene so the crossing step can
/// move the camera before any draw is issued.
pub struct SceneRenderer {
    scene: SceneGraph,
    mesh_handles: Vec<MeshHandle>,
    clear_color: [f32; 4],
}

struct PortalView {
    master: DrawCall,
    camera: CameraUniforms,
}

impl SceneRenderer {
    /// Uploads every mesh and the light set. Any device failure aborts construction.
    pub fn new<D: RasterDevice>(scene: SceneGraph, device: &mut D) -> Result<Self, D::Error> {
        let mesh_handles = scene
            .meshes()
            .iter()
            .map(|mesh| device.upload_mesh(mesh))
            .collect::<Result<Vec<_>, _>>()?;
        device.set_lights(&scene.light_uniforms());

        info!(
            "Scene renderer ready: {} meshes uploaded, {} portal links",
            mesh_handles.len(),
            scene.portals.len()
        );

        Ok(Self {
            scene,
            mesh_handles,
            clear_color: DEFAULT_CLEAR_COLOR,
        })
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.scene.camera
    }

    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    pub fn resize(&mut self, aspect: f32) {
        self.scene.camera.set_aspect(aspect);
    }

    pub fn render_frame<D: RasterDevice>(
        &mut self,
        device: &mut D,
    ) -> Result<RenderFrameStats, D::Error> {
        let mut stats = RenderFrameStats::default();

        let frames = self.scene.link_frames();
        if let Some(event) = self
            .scene
            .portals
            .evaluate_crossings(&mut self.scene.camera, &frames)
        {
            stats.teleports += 1;
            info!(
                "Observer crossed portal link {} and arrived at {}",
                event.link_index, event.to
            );
        }

        let draws = self.prepare_draws(&mut stats);
        let default_camera = self.scene.camera.uniforms();

        device.clear(
            ClearFlags::COLOR | ClearFlags::DEPTH | ClearFlags::STENCIL,
            self.clear_color,
        );
        device.set_raster_state(RasterState::OPAQUE);
        device.set_camera(&default_camera);

        for (index, pair) in frames.iter().enumerate() {
            let Some(view) = self.portal_view(index, pair.as_ref(), &draws) else {
                stats.skipped_portals += 1;
                continue;
            };

            device.set_raster_state(RasterState::STENCIL_MARK);
            Self::draw(device, &view.master, &mut stats)?;

            device.set_raster_state(RasterState::PORTAL_INTERIOR);
            device.set_camera(&view.camera);
            self.draw_scenery(device, &draws, &mut stats)?;

            device.set_camera(&default_camera);
            device.set_raster_state(RasterState::STENCIL_UNMARK);
            Self::draw(device, &view.master, &mut stats)?;

            stats.portal_passes += 1;
        }

        device.set_raster_state(RasterState::DEPTH_ONLY);
        device.clear(ClearFlags::DEPTH, self.clear_color);
        for link in self.scene.portals.links() {
            if let Some(Some(master)) = draws.get(link.master.index()) {
                Self::draw(device, master, &mut stats)?;
            }
        }

        device.set_raster_state(RasterState::OPAQUE);
        self.draw_scenery(device, &draws, &mut stats)?;

        Ok(stats)
    }

    /// One draw per object, `None` for objects whose transform is degenerate.
    fn prepare_draws(&self, stats: &mut RenderFrameStats) -> Vec<Option<DrawCall>> {
        self.scene
            .objects()
            .iter()
            .enumerate()
            .map(|(index, object)| {
                let world = self.scene.object_world_matrix(ObjectId(index as u32));
                let (Some(world), Some(&mesh)) =
                    (world, self.mesh_handles.get(object.mesh.index()))
                else {
                    stats.skipped_objects += 1;
                    return None;
                };
                Some(DrawCall {
                    mesh,
                    object: ObjectUniforms::new(world, &object.material, object.is_portal()),
                })
            })
            .collect()
    }

    fn portal_view(
        &self,
        index: usize,
        pair: Option<&LinkFrames>,
        draws: &[Option<DrawCall>],
    ) -> Option<PortalView> {
        let link = &self.scene.portals.links()[index];
        let master = draws.get(link.master.index()).copied().flatten()?;
        let pair = pair?;
        let camera = &self.scene.camera;

        let mirror = match camera.relative_mirror(&pair.master.world, &pair.link.world) {
            Ok(mirror) => mirror,
            Err(err) => {
                warn!("Skipping portal link {index} this frame: {err}");
                return None;
            }
        };
        let eye = match mirror.try_inverse() {
            Ok(inverse) => inverse.position(),
            Err(err) => {
                warn!("Skipping portal link {index} this frame: {err}");
                return None;
            }
        };

        let plane = Camera::clipping_plane(
            &pair.master.world,
            &camera.view_matrix(),
            -link.side().sign(),
        );
        let mut projection = *camera.projection();
        projection.clip_projection(plane);

        Some(PortalView {
            master,
            camera: CameraUniforms::new(projection, mirror, eye),
        })
    }

    fn draw_scenery<D: RasterDevice>(
        &self,
        device: &mut D,
        draws: &[Option<DrawCall>],
        stats: &mut RenderFrameStats,
    ) -> Result<(), D::Error> {
        for (object, draw) in self.scene.objects().iter().zip(draws) {
            if object.is_portal() {
                continue;
            }
            if let Some(draw) = draw {
                Self::draw(device, draw, stats)?;
            }
        }
        Ok(())
    }

    fn draw<D: RasterDevice>(
        device: &mut D,
        call: &DrawCall,
        stats: &mut RenderFrameStats,
    ) -> Result<(), D::Error> {
        device.draw(call)?;
        stats.draw_calls += 1;
        Ok(())
    }
}
