use std::fmt;

use paradise_math::{Matrix4, Transform};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    UnknownNode(NodeId),
    SelfParent(NodeId),
    Cycle { child: NodeId, parent: NodeId },
}

impl fmt::Display for HierarchyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "node {id} does not exist"),
            Self::SelfParent(id) => write!(f, "node {id} cannot be its own parent"),
            Self::Cycle { child, parent } => {
                write!(f, "parenting {child} under {parent} would create a cycle")
            }
        }
    }
}

impl std::error::Error for HierarchyError {}

/// Arena of spatial nodes. Parent and child links are always kept symmetric:
/// a node appears in exactly the child list of its parent.
#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    nodes: Vec<SceneNode>,
    by_name: FxHashMap<String, NodeId>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a root node. Name lookups resolve to the first node inserted under a name.
    pub fn insert(&mut self, name: impl Into<String>, transform: Transform) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let name = name.into();
        self.by_name.entry(name.clone()).or_insert(id);
        self.nodes.push(SceneNode {
            name,
            transform,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.get(id).map(|node| &node.transform)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.nodes.get_mut(id.index()).map(|node| &mut node.transform)
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids().filter(|id| self.nodes[id.index()].parent.is_none())
    }

    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) -> Result<(), HierarchyError> {
        self.check(child)?;
        self.check(parent)?;
        if child == parent {
            return Err(HierarchyError::SelfParent(child));
        }

        let mut cursor = Some(parent);
        while let Some(ancestor) = cursor {
            if ancestor == child {
                return Err(HierarchyError::Cycle { child, parent });
            }
            cursor = self.nodes[ancestor.index()].parent;
        }

        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        Ok(())
    }

    pub fn clear_parent(&mut self, child: NodeId) -> Result<(), HierarchyError> {
        self.check(child)?;
        self.detach(child);
        Ok(())
    }

    /// Local transform composed with every ancestor's.
    pub fn world_matrix(&self, id: NodeId) -> Option<Matrix4> {
        let node = self.get(id)?;
        let local = node.transform.world_matrix();
        match node.parent {
            Some(parent) => {
                let parent_world = self.world_matrix(parent)?;
                Some(Matrix4::product(&parent_world, &local))
            }
            None => Some(local),
        }
    }

    /// True when the node or any of its ancestors has a degenerate transform.
    pub fn is_degenerate(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(node) = cursor.and_then(|id| self.get(id)) {
            if node.transform.is_degenerate() {
                return true;
            }
            cursor = node.parent;
        }
        false
    }

    pub fn world_transform(&self, id: NodeId) -> Option<Transform> {
        self.world_matrix(id).map(|matrix| matrix.to_transform())
    }

    fn check(&self, id: NodeId) -> Result<(), HierarchyError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(HierarchyError::UnknownNode(id))
        }
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(previous) = self.nodes[child.index()].parent.take() {
            self.nodes[previous.index()]
                .children
                .retain(|&sibling| sibling != child);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use paradise_math::{Matrix4, Transform};

    use super::{HierarchyError, NodeTree};

    #[test]
    fn reparenting_keeps_links_symmetric() {
        let mut tree = NodeTree::new();
        let a = tree.insert("a", Transform::default());
        let b = tree.insert("b", Transform::default());
        let child = tree.insert("child", Transform::default());

        tree.set_parent(child, a).unwrap();
        assert_eq!(tree.get(a).unwrap().children(), &[child]);

        tree.set_parent(child, b).unwrap();
        assert!(tree.get(a).unwrap().children().is_empty());
        assert_eq!(tree.get(b).unwrap().children(), &[child]);
        assert_eq!(tree.get(child).unwrap().parent(), Some(b));

        tree.clear_parent(child).unwrap();
        assert!(tree.get(b).unwrap().children().is_empty());
        assert_eq!(tree.roots().count(), 3);
    }

    #[test]
    fn rejects_self_parent_and_cycles() {
        let mut tree = NodeTree::new();
        let a = tree.insert("a", Transform::default());
        let b = tree.insert("b", Transform::default());
        tree.set_parent(b, a).unwrap();

        assert_eq!(tree.set_parent(a, a), Err(HierarchyError::SelfParent(a)));
        assert_eq!(
            tree.set_parent(a, b),
            Err(HierarchyError::Cycle {
                child: a,
                parent: b
            })
        );
    }

    #[test]
    fn world_matrix_composes_ancestors() {
        let mut tree = NodeTree::new();
        let parent = tree.insert(
            "parent",
            Transform::new(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO, Vec3::splat(2.0)),
        );
        let child = tree.insert("child", Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
        tree.set_parent(child, parent).unwrap();

        let world = tree.world_matrix(child).unwrap();
        assert!((world.position() - Vec3::new(5.0, 2.0, 0.0)).length() < 1.0e-6);
        assert!((world.size() - Vec3::splat(2.0)).length() < 1.0e-6);
        let parent_local = tree.transform(parent).unwrap().world_matrix();
        assert_eq!(tree.world_matrix(parent).unwrap(), parent_local);
        assert_eq!(tree.find("child"), Some(child));

        let root = tree.insert("root", Transform::default());
        assert_eq!(tree.world_matrix(root), Some(Matrix4::IDENTITY));
    }

    #[test]
    fn degenerate_ancestor_taints_descendants() {
        let mut tree = NodeTree::new();
        let parent = tree.insert("parent", Transform::default());
        let child = tree.insert("child", Transform::from_position(Vec3::Y));
        let sibling = tree.insert("sibling", Transform::default());
        tree.set_parent(child, parent).unwrap();
        assert!(!tree.is_degenerate(child));

        tree.transform_mut(parent).unwrap().scale = Vec3::new(1.0, 0.0, 1.0);
        assert!(tree.is_degenerate(parent));
        assert!(tree.is_degenerate(child));
        assert!(!tree.is_degenerate(sibling));

        tree.clear_parent(child).unwrap();
        assert!(!tree.is_degenerate(child));
    }
}
