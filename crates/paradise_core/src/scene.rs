use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use glam::{Quat, Vec3};
use paradise_math::gl_math::{candela_to_watts, to_horizontal_fov, to_vertical_fov};
use paradise_math::vector::quaternion_to_euler;
use paradise_math::{Matrix4, Transform};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::camera::Camera;
use crate::hierarchy::{HierarchyError, NodeId, NodeTree};
use crate::light::{LightUniforms, PointLight, MAX_LIGHTS};
use crate::material::Material;
use crate::mesh::{MeshData, MeshError};
use crate::object::{MeshId, ObjectId, ObjectTag, RenderObject};
use crate::portal::{LinkFrames, PortalFrame, PortalRegistry};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub name: Option<String>,
    pub materials: Vec<MaterialDescription>,
    pub meshes: Vec<MeshDescription>,
    pub nodes: Vec<NodeDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDescription {
    pub name: String,
    #[serde(default = "default_base_color")]
    pub base_color: Vec3,
    #[serde(default = "default_roughness")]
    pub roughness: f32,
    #[serde(default)]
    pub metallic: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshDescription {
    pub name: String,
    pub source: MeshSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeshSource {
    Quad {
        width: f32,
        height: f32,
    },
    Cube {
        size: f32,
    },
    Raw {
        positions: Vec<f32>,
        #[serde(default)]
        normals: Vec<f32>,
        #[serde(default)]
        texcoords: Vec<f32>,
        #[serde(default)]
        indices: Option<Vec<u32>>,
    },
}

impl MeshSource {
    pub fn to_mesh(&self) -> Result<MeshData, MeshError> {
        match self {
            Self::Quad { width, height } => Ok(MeshData::quad(*width, *height)),
            Self::Cube { size } => Ok(MeshData::cube(*size)),
            Self::Raw {
                positions,
                normals,
                texcoords,
                indices,
            } => MeshData::from_arrays(positions, normals, texcoords, indices.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescription {
    pub name: String,
    #[serde(default)]
    pub translation: Vec3,
    /// Quaternion `[x, y, z, w]`.
    #[serde(default = "default_rotation")]
    pub rotation: Quat,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub mesh: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub linked_portal: Option<String>,
    #[serde(default)]
    pub camera: Option<CameraDescription>,
    #[serde(default)]
    pub light: Option<LightDescription>,
    #[serde(default)]
    pub children: Vec<String>,
}

impl NodeDescription {
    pub fn transform(&self) -> Transform {
        Transform::new(
            self.translation,
            quaternion_to_euler(self.rotation),
            self.scale,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraDescription {
    pub yfov: f32,
    #[serde(default)]
    pub aspect_ratio: Option<f32>,
    #[serde(default = "default_znear")]
    pub znear: f32,
    #[serde(default = "default_zfar")]
    pub zfar: f32,
}

impl CameraDescription {
    /// Vertical field of view keeping the authored horizontal extent at `aspect`.
    pub fn vertical_fov_for(&self, aspect: f32) -> f32 {
        match self.aspect_ratio {
            Some(authored) if authored > 0.0 && aspect > 0.0 => {
                to_vertical_fov(to_horizontal_fov(self.yfov, authored), aspect)
            }
            _ => self.yfov,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightDescription {
    #[serde(default = "default_base_color")]
    pub color: Vec3,
    /// Luminous intensity in candela.
    pub intensity: f32,
}

fn default_base_color() -> Vec3 {
    Vec3::ONE
}

fn default_roughness() -> f32 {
    0.5
}

fn default_rotation() -> Quat {
    Quat::IDENTITY
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_znear() -> f32 {
    Camera::DEFAULT_NEAR
}

fn default_zfar() -> f32 {
    Camera::DEFAULT_FAR
}

impl SceneDescription {
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to parse scene {}: {err}", path.display()),
            )
        })
    }
}

/// Recoverable problems found while building a scene; the scene is still usable.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneWarning {
    MissingLinkedPortal { node: String, target: String },
    MalformedSceneReference { node: String, target: String },
    MissingCamera,
    TooManyLights { node: String },
    UnknownChild { node: String, child: String },
    InvalidChild {
        node: String,
        child: String,
        reason: HierarchyError,
    },
}

impl fmt::Display for SceneWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLinkedPortal { node, target } => {
                write!(f, "portal {node} links to missing node {target}; rendering it as geometry")
            }
            Self::MalformedSceneReference { node, target } => write!(
                f,
                "portal {node} links to {target}, which is not a mesh object; rendering it as geometry"
            ),
            Self::MissingCamera => write!(f, "scene has no camera; using a default camera"),
            Self::TooManyLights { node } => {
                write!(f, "light {node} exceeds the {MAX_LIGHTS} light limit and was dropped")
            }
            Self::UnknownChild { node, child } => {
                write!(f, "node {node} lists unknown child {child}")
            }
            Self::InvalidChild {
                node,
                child,
                reason,
            } => write!(f, "cannot attach {child} to {node}: {reason}"),
        }
    }
}

#[derive(Debug)]
pub enum SceneBuildError {
    DuplicateNode(String),
    UnknownMesh { node: String, mesh: String },
    UnknownMaterial { node: String, material: String },
    InvalidMesh { mesh: String, source: MeshError },
}

impl fmt::Display for SceneBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode(name) => write!(f, "node name {name} is used more than once"),
            Self::UnknownMesh { node, mesh } => {
                write!(f, "node {node} references unknown mesh {mesh}")
            }
            Self::UnknownMaterial { node, material } => {
                write!(f, "node {node} references unknown material {material}")
            }
            Self::InvalidMesh { mesh, source } => write!(f, "mesh {mesh} is invalid: {source}"),
        }
    }
}

impl std::error::Error for SceneBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidMesh { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Fully resident scene: node hierarchy, drawables, lights, the main camera
/// and the portal link registry.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub nodes: NodeTree,
    pub camera: Camera,
    pub portals: PortalRegistry,
    meshes: Vec<MeshData>,
    objects: Vec<RenderObject>,
    lights: Vec<PointLight>,
}

impl SceneGraph {
    pub fn new(camera: Camera) -> Self {
        Self {
            nodes: NodeTree::new(),
            camera,
            portals: PortalRegistry::new(),
            meshes: Vec::new(),
            objects: Vec::new(),
            lights: Vec::new(),
        }
    }

    pub fn meshes(&self) -> &[MeshData] {
        &self.meshes
    }

    pub fn objects(&self) -> &[RenderObject] {
        &self.objects
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn object(&self, id: ObjectId) -> Option<&RenderObject> {
        self.objects.get(id.index())
    }

    pub fn find_object(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .position(|object| object.name == name)
            .map(|index| ObjectId(index as u32))
    }

    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() as u32 - 1)
    }

    pub fn add_object(&mut self, object: RenderObject) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() as u32 - 1)
    }

    /// Returns `false` once [`MAX_LIGHTS`] lights are present.
    pub fn add_light(&mut self, light: PointLight) -> bool {
        if self.lights.len() >= MAX_LIGHTS {
            return false;
        }
        self.lights.push(light);
        true
    }

    pub fn link_portals(&mut self, master: ObjectId, link: ObjectId) -> Option<usize> {
        self.objects.get(link.index())?;
        let object = self.objects.get_mut(master.index())?;
        object.tag = ObjectTag::Portal;
        Some(self.portals.add(master, link))
    }

    /// `None` when the object's node or one of its ancestors is degenerate.
    pub fn object_world_matrix(&self, id: ObjectId) -> Option<Matrix4> {
        let object = self.object(id)?;
        if self.nodes.is_degenerate(object.node) {
            return None;
        }
        self.nodes.world_matrix(object.node)
    }

    pub fn portal_frame(&self, id: ObjectId) -> Option<PortalFrame> {
        let object = self.object(id)?;
        let world = self.object_world_matrix(id)?;
        let mesh = self.meshes.get(object.mesh.index())?;
        Some(PortalFrame::new(world, &mesh.bounding_box()))
    }

    pub fn link_frames(&self) -> Vec<Option<LinkFrames>> {
        self.portals
            .links()
            .iter()
            .map(|link| {
                Some(LinkFrames {
                    master: self.portal_frame(link.master)?,
                    link: self.portal_frame(link.link)?,
                })
            })
            .collect()
    }

    pub fn light_uniforms(&self) -> LightUniforms {
        let positions = self.lights.iter().map(|light| {
            let position = self
                .nodes
                .world_matrix(light.node)
                .map(|world| world.position())
                .unwrap_or(Vec3::ZERO);
            (position, light)
        });
        LightUniforms::pack(positions)
    }

    /// Builds a scene from a decoded description. `aspect` is the host's
    /// current width / height.
    pub fn build(
        description: &SceneDescription,
        aspect: f32,
    ) -> Result<(Self, Vec<SceneWarning>), SceneBuildError> {
        let mut warnings = Vec::new();
        let mut scene = Self::new(Camera::default());
        scene.camera.set_aspect(aspect);

        let mut materials = FxHashMap::default();
        for entry in &description.materials {
            let mut material = Material {
                base_color: entry.base_color,
                roughness: entry.roughness,
                metallic: entry.metallic,
            };
            material.sanitize();
            materials.insert(entry.name.as_str(), material);
        }

        let mut meshes = FxHashMap::default();
        for entry in &description.meshes {
            let mesh = entry
                .source
                .to_mesh()
                .map_err(|source| SceneBuildError::InvalidMesh {
                    mesh: entry.name.clone(),
                    source,
                })?;
            meshes.insert(entry.name.as_str(), scene.add_mesh(mesh));
        }

        let mut node_ids: FxHashMap<&str, NodeId> = FxHashMap::default();
        let mut object_ids: FxHashMap<&str, ObjectId> = FxHashMap::default();
        let mut camera_node = None;

        for node in &description.nodes {
            if node_ids.contains_key(node.name.as_str()) {
                return Err(SceneBuildError::DuplicateNode(node.name.clone()));
            }
            let id = scene.nodes.insert(node.name.clone(), node.transform());
            node_ids.insert(node.name.as_str(), id);

            if let Some(mesh_name) = &node.mesh {
                let mesh = *meshes.get(mesh_name.as_str()).ok_or_else(|| {
                    SceneBuildError::UnknownMesh {
                        node: node.name.clone(),
                        mesh: mesh_name.clone(),
                    }
                })?;
                let material = match &node.material {
                    Some(name) => *materials.get(name.as_str()).ok_or_else(|| {
                        SceneBuildError::UnknownMaterial {
                            node: node.name.clone(),
                            material: name.clone(),
                        }
                    })?,
                    None => Material::default(),
                };
                let object = scene.add_object(RenderObject {
                    name: node.name.clone(),
                    node: id,
                    mesh,
                    material,
                    tag: ObjectTag::Default,
                });
                object_ids.insert(node.name.as_str(), object);
            } else if let Some(camera) = &node.camera {
                if camera_node.is_none() {
                    let mut authored = Camera::new(
                        camera.vertical_fov_for(aspect),
                        scene.camera.aspect(),
                        camera.znear,
                        camera.zfar,
                    );
                    authored.set_aspect(aspect);
                    scene.camera = authored;
                    camera_node = Some(id);
                } else {
                    debug!("Ignoring additional camera node {}", node.name);
                }
            } else if let Some(light) = &node.light {
                let added = scene.add_light(PointLight {
                    node: id,
                    color: light.color,
                    power: candela_to_watts(light.intensity),
                });
                if !added {
                    warnings.push(SceneWarning::TooManyLights {
                        node: node.name.clone(),
                    });
                }
            }
        }

        for node in &description.nodes {
            let parent = node_ids[node.name.as_str()];
            for child_name in &node.children {
                let Some(&child) = node_ids.get(child_name.as_str()) else {
                    warnings.push(SceneWarning::UnknownChild {
                        node: node.name.clone(),
                        child: child_name.clone(),
                    });
                    continue;
                };
                if let Err(reason) = scene.nodes.set_parent(child, parent) {
                    warnings.push(SceneWarning::InvalidChild {
                        node: node.name.clone(),
                        child: child_name.clone(),
                        reason,
                    });
                }
            }
        }

        match camera_node.and_then(|id| scene.nodes.world_transform(id)) {
            Some(transform) => scene.camera.transform = transform,
            None => warnings.push(SceneWarning::MissingCamera),
        }

        for node in &description.nodes {
            let Some(target) = &node.linked_portal else {
                continue;
            };
            let Some(&master) = object_ids.get(node.name.as_str()) else {
                warnings.push(SceneWarning::MalformedSceneReference {
                    node: node.name.clone(),
                    target: target.clone(),
                });
                continue;
            };
            match object_ids.get(target.as_str()) {
                Some(&link) => {
                    scene.link_portals(master, link);
                }
                None if node_ids.contains_key(target.as_str()) => {
                    warnings.push(SceneWarning::MalformedSceneReference {
                        node: node.name.clone(),
                        target: target.clone(),
                    });
                }
                None => warnings.push(SceneWarning::MissingLinkedPortal {
                    node: node.name.clone(),
                    target: target.clone(),
                }),
            }
        }

        for warning in &warnings {
            warn!("{warning}");
        }
        info!(
            "Built scene {}: {} nodes, {} objects, {} lights, {} portal links",
            description.name.as_deref().unwrap_or("<unnamed>"),
            scene.nodes.len(),
            scene.objects.len(),
            scene.lights.len(),
            scene.portals.len()
        );

        Ok((scene, warnings))
    }
}
