//! Render-side node graph
//!
//! The [`NodeGraph`] is owned by the render thread. It holds every node's
//! property values and, for groups, the ordered child list. All mutation goes
//! through [`NodeGraph::set_value_direct`] and the tree edits below, which are
//! only called while draining the update queue or advancing animations, so
//! the tree is never mutated while it is being traversed for drawing.

use slotmap::SecondaryMap;
use smallvec::SmallVec;

use crate::error::{GlintError, Result};
use crate::node::{NodeHandle, NodeId, NodeKind, NodeRef, NodeRegistry};
use crate::property::{PropertyHandle, PropertyId, PropertyValue};
use crate::schema::Schema;

/// Kind-specific node state
#[derive(Debug)]
pub enum NodePayload {
    /// Ordered children, each holding a tree reference
    Group { children: SmallVec<[NodeRef; 8]> },
    Rect,
    /// Text nodes re-lay-out before the next draw after a refresh property
    /// changes
    Text { needs_layout: bool },
    Polygon,
}

/// A node as seen by the render thread
#[derive(Debug)]
pub struct Node {
    handle: NodeHandle,
    values: Vec<PropertyValue>,
    destroy_requested: bool,
    payload: NodePayload,
}

impl Node {
    fn new(handle: NodeHandle) -> Self {
        let schema = handle.schema();
        let values = schema.iter().map(|spec| spec.default.clone()).collect();
        let payload = match handle.kind() {
            NodeKind::Group => NodePayload::Group {
                children: SmallVec::new(),
            },
            NodeKind::Rect => NodePayload::Rect,
            NodeKind::Text => NodePayload::Text { needs_layout: true },
            NodeKind::Polygon => NodePayload::Polygon,
        };
        Self {
            handle,
            values,
            destroy_requested: false,
            payload,
        }
    }

    pub fn id(&self) -> NodeId {
        self.handle.id()
    }

    pub fn kind(&self) -> NodeKind {
        self.handle.kind()
    }

    pub fn handle(&self) -> &NodeHandle {
        &self.handle
    }

    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    pub fn schema(&self) -> Schema {
        self.handle.schema()
    }

    pub fn value(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.schema().position(id).and_then(|index| self.values.get(index))
    }

    pub fn float(&self, id: PropertyId) -> Option<f32> {
        self.value(id).and_then(PropertyValue::as_float)
    }

    pub fn is_visible(&self) -> bool {
        self.value(crate::schema::ids::VISIBLE)
            .and_then(PropertyValue::as_bool)
            .unwrap_or(true)
    }

    /// Child ids in draw order (empty for non-groups)
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        let children: &[NodeRef] = match &self.payload {
            NodePayload::Group { children } => children.as_slice(),
            _ => &[],
        };
        children.iter().map(NodeRef::id)
    }

    pub fn needs_layout(&self) -> bool {
        matches!(self.payload, NodePayload::Text { needs_layout: true })
    }

    pub fn is_destroy_requested(&self) -> bool {
        self.destroy_requested
    }

    /// Write a value at a schema position, without queuing
    ///
    /// Returns whether the write invalidated the node's layout.
    fn write(&mut self, index: usize, value: PropertyValue) -> Result<bool> {
        let spec = self
            .schema()
            .get(index)
            .ok_or(GlintError::UnknownProperty(PropertyId(index as u32)))?;
        spec.check(&value)?;

        self.values[index] = value;

        if spec.refresh {
            if let NodePayload::Text { needs_layout } = &mut self.payload {
                *needs_layout = true;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Outcome of removing a child
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// The child was not in the group; nothing changed
    Absent,
}

/// The render thread's view of every node in one context
pub struct NodeGraph {
    registry: NodeRegistry,
    nodes: SecondaryMap<NodeId, Node>,
    root: Option<NodeRef>,
}

impl NodeGraph {
    pub fn new(registry: NodeRegistry) -> Self {
        Self {
            registry,
            nodes: SecondaryMap::new(),
            root: None,
        }
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Materialize a node created by the controller
    ///
    /// Inserting an already-present node keeps its current values.
    pub fn insert(&mut self, handle: NodeHandle) {
        let id = handle.id();
        if !self.nodes.contains_key(id) {
            self.nodes.insert(id, Node::new(handle));
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root.as_ref().map(NodeRef::id)
    }

    /// Read a property's current value
    pub fn value(&self, property: &PropertyHandle) -> Option<&PropertyValue> {
        self.nodes
            .get(property.node())
            .and_then(|node| node.values.get(property.index()))
    }

    pub fn float(&self, property: &PropertyHandle) -> Option<f32> {
        self.value(property).and_then(PropertyValue::as_float)
    }

    /// Mutate a property value in place, without queuing
    ///
    /// Render thread only: this is the path both update-apply and
    /// animation-apply use. Returns whether the node now needs re-layout.
    pub fn set_value_direct(
        &mut self,
        property: &PropertyHandle,
        value: PropertyValue,
    ) -> Result<bool> {
        let node = self
            .nodes
            .get_mut(property.node())
            .ok_or_else(|| GlintError::InvalidTarget(format!("{:?} not in graph", property)))?;
        node.write(property.index(), value)
    }

    /// Mutate a property addressed by raw id
    pub fn set_value_by_id(
        &mut self,
        node: NodeId,
        id: PropertyId,
        value: PropertyValue,
    ) -> Result<bool> {
        let node = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| GlintError::InvalidTarget(format!("{:?} not in graph", node)))?;
        let index = node
            .schema()
            .position(id)
            .ok_or(GlintError::UnknownProperty(id))?;
        node.write(index, value)
    }

    /// Append a child; the group takes a tree reference
    ///
    /// Duplicates are not filtered. A child that is the group itself or one
    /// of its ancestors is rejected, since the tree must stay acyclic.
    pub fn add_child(&mut self, group: NodeId, child: &NodeHandle) -> Result<()> {
        if self.is_in_subtree(child.id(), group) {
            return Err(GlintError::InvalidTarget(format!(
                "{:?} is {:?} or one of its ancestors",
                child.id(),
                group
            )));
        }
        if !self.nodes.contains_key(child.id()) {
            self.insert(child.clone());
        }
        match self.nodes.get_mut(group).map(|node| &mut node.payload) {
            Some(NodePayload::Group { children }) => {
                children.push(child.retain());
                Ok(())
            }
            Some(_) => Err(GlintError::InvalidTarget(format!(
                "{:?} is not a group",
                group
            ))),
            None => Err(GlintError::InvalidTarget(format!("{:?} not in graph", group))),
        }
    }

    /// True if `node` is `top` or lies below it
    fn is_in_subtree(&self, top: NodeId, node: NodeId) -> bool {
        let mut stack = vec![top];
        while let Some(id) = stack.pop() {
            if id == node {
                return true;
            }
            if let Some(current) = self.nodes.get(id) {
                stack.extend(current.children());
            }
        }
        false
    }

    /// Remove the first occurrence of a child, dropping its tree reference
    pub fn remove_child(&mut self, group: NodeId, child: NodeId) -> Result<RemoveOutcome> {
        match self.nodes.get_mut(group).map(|node| &mut node.payload) {
            Some(NodePayload::Group { children }) => {
                match children.iter().position(|c| c.id() == child) {
                    Some(pos) => {
                        children.remove(pos);
                        Ok(RemoveOutcome::Removed)
                    }
                    None => Ok(RemoveOutcome::Absent),
                }
            }
            Some(_) => Err(GlintError::InvalidTarget(format!(
                "{:?} is not a group",
                group
            ))),
            None => Err(GlintError::InvalidTarget(format!("{:?} not in graph", group))),
        }
    }

    /// Replace the root node (the previous root's reference is dropped)
    pub fn set_root(&mut self, root: Option<&NodeHandle>) {
        if let Some(handle) = root {
            self.insert(handle.clone());
        }
        self.root = root.map(NodeHandle::retain);
    }

    /// Mark a node for destruction by the next reclamation pass
    pub fn request_destroy(&mut self, id: NodeId) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.destroy_requested = true;
                true
            }
            None => false,
        }
    }

    /// Free destroyed nodes that nothing references any more
    ///
    /// Must not run while an update batch is being applied. Freeing a group
    /// drops its children's tree references, which can make destroyed
    /// children eligible too, so the pass repeats until nothing changes.
    pub fn reclaim(&mut self) -> Vec<NodeId> {
        let mut freed = Vec::new();
        loop {
            let ready: Vec<NodeId> = self
                .nodes
                .iter()
                .filter(|(_, node)| {
                    node.destroy_requested && node.handle.header().is_unreferenced()
                })
                .map(|(id, _)| id)
                .collect();

            if ready.is_empty() {
                break;
            }

            for id in ready {
                self.nodes.remove(id);
                self.registry.remove(id);
                tracing::debug!("NodeGraph: reclaimed {:?}", id);
                freed.push(id);
            }
        }
        freed
    }

    /// Text nodes whose layout is stale, clearing the flag
    pub fn take_layout_requests(&mut self) -> Vec<NodeId> {
        let mut stale = Vec::new();
        for (id, node) in self.nodes.iter_mut() {
            if let NodePayload::Text { needs_layout } = &mut node.payload {
                if *needs_layout {
                    *needs_layout = false;
                    stale.push(id);
                }
            }
        }
        stale
    }

    /// Depth-first traversal from the root
    pub fn traverse<F: FnMut(&Node, usize)>(&self, mut f: F) {
        fn visit<F: FnMut(&Node, usize)>(graph: &NodeGraph, id: NodeId, depth: usize, f: &mut F) {
            if let Some(node) = graph.nodes.get(id) {
                f(node, depth);
                for child in node.children() {
                    visit(graph, child, depth + 1, f);
                }
            }
        }

        if let Some(root) = self.root() {
            visit(self, root, 0, &mut f);
        }
    }

    /// Count nodes reachable from the root
    pub fn reachable_count(&self) -> usize {
        let mut count = 0;
        self.traverse(|_, _| count += 1);
        count
    }
}

impl std::fmt::Debug for NodeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeGraph")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root())
            .finish()
    }
}
