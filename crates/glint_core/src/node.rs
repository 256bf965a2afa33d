//! Node identity, the shared node arena, and controller-side handles
//!
//! Nodes live in a [`SlotMap`] arena owned by the [`NodeRegistry`]. Each slot
//! stores a [`NodeHeader`] with the node kind, its rendering context and the
//! atomic reference counts for the node and each of its properties. Property
//! values and child lists are *not* here; they belong to the render thread's
//! [`crate::graph::NodeGraph`].
//!
//! The controller creates nodes through the registry (a short critical section
//! on the arena) and afterwards only touches them through handles and queued
//! updates. Slots are removed exclusively by the render thread's reclamation
//! pass, once nothing references the node any more.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::error::{GlintError, Result};
use crate::property::{PropertyHandle, PropertyId, PropertySlot};
use crate::schema::Schema;

new_key_type! {
    /// Stable handle to a node slot in the arena
    pub struct NodeId;
}

impl NodeId {
    /// Convert to raw u64 for the binding layer
    pub fn to_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }

    /// Reconstruct from raw u64
    pub fn from_raw(raw: u64) -> Self {
        slotmap::KeyData::from_ffi(raw).into()
    }
}

/// Closed set of drawable node kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Group,
    Rect,
    Text,
    Polygon,
}

/// Identifies one engine instance (one render thread plus its controller)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ContextId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Shared, cross-thread part of a node stored in its arena slot
pub struct NodeHeader {
    kind: NodeKind,
    context: ContextId,
    refs: crate::property::RefCount,
    pub(crate) properties: Box<[PropertySlot]>,
}

impl NodeHeader {
    fn new(kind: NodeKind, context: ContextId) -> Self {
        let properties = Schema::for_kind(kind).iter().map(PropertySlot::new).collect();
        Self {
            kind,
            context,
            refs: crate::property::RefCount::new(),
            properties,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Node references held by parents and in-flight operations
    pub fn retain_count(&self) -> u32 {
        self.refs.get()
    }

    /// True when neither the node nor any of its properties is referenced
    pub fn is_unreferenced(&self) -> bool {
        self.refs.get() == 0 && self.properties.iter().all(|slot| slot.refs.get() == 0)
    }
}

impl fmt::Debug for NodeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHeader")
            .field("kind", &self.kind)
            .field("context", &self.context)
            .field("refs", &self.refs.get())
            .finish()
    }
}

// ============================================================================
// Handles
// ============================================================================

/// Controller-side handle to a node (cheap to clone)
#[derive(Clone)]
pub struct NodeHandle {
    id: NodeId,
    header: Arc<NodeHeader>,
}

impl NodeHandle {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.header.kind
    }

    pub fn context(&self) -> ContextId {
        self.header.context
    }

    pub fn schema(&self) -> Schema {
        Schema::for_kind(self.header.kind)
    }

    pub(crate) fn header(&self) -> &Arc<NodeHeader> {
        &self.header
    }

    pub fn retain_count(&self) -> u32 {
        self.header.retain_count()
    }

    /// Property handle by stable id
    pub fn property(&self, id: PropertyId) -> Option<PropertyHandle> {
        self.schema()
            .position(id)
            .map(|index| PropertyHandle::new(self.id, index, Arc::clone(&self.header)))
    }

    /// Property handle by schema name
    pub fn property_by_name(&self, name: &str) -> Option<PropertyHandle> {
        self.schema()
            .position_by_name(name)
            .map(|index| PropertyHandle::new(self.id, index, Arc::clone(&self.header)))
    }

    /// All property handles in schema order
    pub fn properties(&self) -> impl Iterator<Item = PropertyHandle> + '_ {
        (0..self.header.properties.len())
            .map(move |index| PropertyHandle::new(self.id, index, Arc::clone(&self.header)))
    }

    /// Take a counted node reference, released when the guard drops
    pub fn retain(&self) -> NodeRef {
        self.header.refs.retain();
        NodeRef {
            handle: self.clone(),
        }
    }

    /// Fail with `InvalidTarget` unless this node belongs to `context`
    pub fn check_context(&self, context: ContextId) -> Result<()> {
        if self.header.context == context {
            Ok(())
        } else {
            Err(GlintError::InvalidTarget(format!(
                "{:?} node belongs to context {} not {}",
                self.header.kind,
                self.header.context.raw(),
                context.raw()
            )))
        }
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.header, &other.header)
    }
}

impl Eq for NodeHandle {}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("id", &self.id)
            .field("kind", &self.header.kind)
            .field("refs", &self.header.retain_count())
            .finish()
    }
}

/// A retained node reference
///
/// Parents hold one per child; queued operations hold one per node they
/// target. The node stays out of reclamation while any exist.
#[derive(Debug)]
pub struct NodeRef {
    handle: NodeHandle,
}

impl NodeRef {
    pub fn handle(&self) -> &NodeHandle {
        &self.handle
    }

    pub fn id(&self) -> NodeId {
        self.handle.id
    }
}

impl Clone for NodeRef {
    fn clone(&self) -> Self {
        self.handle.retain()
    }
}

impl Drop for NodeRef {
    fn drop(&mut self) {
        self.handle.header.refs.release();
    }
}

impl std::ops::Deref for NodeRef {
    type Target = NodeHandle;

    fn deref(&self) -> &NodeHandle {
        &self.handle
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Node factory and arena for one rendering context
///
/// Constructed once per engine and passed to whatever creates nodes. Clones
/// share the same arena.
#[derive(Clone)]
pub struct NodeRegistry {
    context: ContextId,
    arena: Arc<Mutex<SlotMap<NodeId, Arc<NodeHeader>>>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            context: ContextId::next(),
            arena: Arc::new(Mutex::new(SlotMap::with_key())),
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Allocate a node slot and register its fixed property schema
    pub fn create(&self, kind: NodeKind) -> NodeHandle {
        let header = Arc::new(NodeHeader::new(kind, self.context));
        let id = self.arena.lock().insert(Arc::clone(&header));
        tracing::trace!("NodeRegistry: created {:?} {:?}", kind, id);
        NodeHandle { id, header }
    }

    /// Look up a live node
    pub fn get(&self, id: NodeId) -> Option<NodeHandle> {
        self.arena.lock().get(id).map(|header| NodeHandle {
            id,
            header: Arc::clone(header),
        })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.lock().contains_key(id)
    }

    /// Number of live node slots
    pub fn len(&self) -> usize {
        self.arena.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free a slot; only the render thread's reclamation pass calls this
    pub(crate) fn remove(&self, id: NodeId) -> bool {
        self.arena.lock().remove(id).is_some()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("context", &self.context)
            .field("nodes", &self.len())
            .finish()
    }
}
