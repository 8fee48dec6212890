use crate::hierarchy::NodeId;
use crate::material::Material;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectTag {
    Default,
    Portal,
}

/// Index into the scene's mesh list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

impl MeshId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A drawable mesh instance placed by a scene node.
#[derive(Debug, Clone)]
pub struct RenderObject {
    pub name: String,
    pub node: NodeId,
    pub mesh: MeshId,
    pub material: Material,
    pub tag: ObjectTag,
}

impl RenderObject {
    pub fn is_portal(&self) -> bool {
        self.tag == ObjectTag::Portal
    }
}
