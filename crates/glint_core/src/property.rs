//! Typed, reference-counted node properties
//!
//! A property is a value slot in a node's fixed schema. The value itself only
//! lives on the render thread (inside [`crate::graph::Node`]); what crosses
//! threads is the [`PropertyHandle`], which carries the schema entry and the
//! atomic reference count stored alongside the node's arena slot.
//!
//! Every queued update and every animation that targets a property holds a
//! [`PropertyRef`] for its whole lifetime. The guard retains on creation and
//! releases when dropped, so an update that is applied, cancelled or simply
//! discarded can never leak or double-release its reference.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::error::{GlintError, Result};
use crate::node::{ContextId, NodeHeader, NodeId};

/// Stable numeric identifier of a property, unique within a node schema
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(pub u32);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The value type a property slot holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Float,
    Bool,
    UInt,
    Text,
    FloatArray,
}

/// A property value
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Float(f32),
    Bool(bool),
    UInt(u32),
    Text(String),
    FloatArray(Vec<f32>),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::UInt(_) => PropertyKind::UInt,
            PropertyValue::Text(_) => PropertyKind::Text,
            PropertyValue::FloatArray(_) => PropertyKind::FloatArray,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u32> {
        match self {
            PropertyValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f32]> {
        match self {
            PropertyValue::FloatArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        PropertyValue::UInt(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<Vec<f32>> for PropertyValue {
    fn from(v: Vec<f32>) -> Self {
        PropertyValue::FloatArray(v)
    }
}

/// One entry of a node kind's fixed schema
#[derive(Debug)]
pub struct PropertySpec {
    pub id: PropertyId,
    pub name: &'static str,
    pub default: PropertyValue,
    /// Writing this property invalidates the node's text layout
    pub refresh: bool,
}

impl PropertySpec {
    pub fn kind(&self) -> PropertyKind {
        self.default.kind()
    }

    /// Fail with `TypeMismatch` unless `value` fits this slot
    pub fn check(&self, value: &PropertyValue) -> Result<()> {
        if value.kind() == self.kind() {
            Ok(())
        } else {
            Err(GlintError::TypeMismatch {
                property: self.name,
                expected: self.kind(),
                found: value.kind(),
            })
        }
    }
}

// ============================================================================
// Reference Counting
// ============================================================================

/// Atomic reference count shared between the controller and render threads
///
/// Only adjusted at queue transition points: enqueue retains, apply,
/// completion and cancellation release.
#[derive(Debug, Default)]
pub struct RefCount(AtomicU32);

impl RefCount {
    pub fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// Increment and return the new count
    pub fn retain(&self) -> u32 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrement and return the new count
    ///
    /// Releasing an already-zero count is a bookkeeping bug; it is logged and
    /// the count stays at zero.
    pub fn release(&self) -> u32 {
        let result = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match result {
            Ok(previous) => previous - 1,
            Err(_) => {
                tracing::error!("RefCount: release() on a zero count");
                debug_assert!(false, "unbalanced release");
                0
            }
        }
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }
}

/// Cross-thread bookkeeping for one schema slot, stored in the node header
#[derive(Debug)]
pub(crate) struct PropertySlot {
    pub(crate) spec: &'static PropertySpec,
    pub(crate) refs: RefCount,
    pub(crate) animated: AtomicBool,
}

impl PropertySlot {
    pub(crate) fn new(spec: &'static PropertySpec) -> Self {
        Self {
            spec,
            refs: RefCount::new(),
            animated: AtomicBool::new(false),
        }
    }
}

// ============================================================================
// Handles
// ============================================================================

/// Controller-side handle to one property of one node (cheap to clone)
#[derive(Clone)]
pub struct PropertyHandle {
    node: NodeId,
    index: usize,
    header: Arc<NodeHeader>,
}

impl PropertyHandle {
    pub(crate) fn new(node: NodeId, index: usize, header: Arc<NodeHeader>) -> Self {
        Self {
            node,
            index,
            header,
        }
    }

    fn slot(&self) -> &PropertySlot {
        &self.header.properties[self.index]
    }

    pub fn id(&self) -> PropertyId {
        self.slot().spec.id
    }

    pub fn name(&self) -> &'static str {
        self.slot().spec.name
    }

    pub fn kind(&self) -> PropertyKind {
        self.slot().spec.kind()
    }

    pub fn spec(&self) -> &'static PropertySpec {
        self.slot().spec
    }

    /// Node owning this property
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Position of this property in its node's schema
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn context(&self) -> ContextId {
        self.header.context()
    }

    /// Fail with `InvalidTarget` unless this property belongs to `context`
    pub fn check_context(&self, context: ContextId) -> Result<()> {
        if self.header.context() == context {
            Ok(())
        } else {
            Err(GlintError::InvalidTarget(format!(
                "property `{}` belongs to context {} not {}",
                self.name(),
                self.header.context().raw(),
                context.raw()
            )))
        }
    }

    /// Number of in-flight updates and animations holding this property
    pub fn retain_count(&self) -> u32 {
        self.slot().refs.get()
    }

    /// Whether a running animation currently writes this property
    pub fn is_animated(&self) -> bool {
        self.slot().animated.load(Ordering::Acquire)
    }

    /// Take a counted reference, released when the guard drops
    pub fn retain(&self) -> PropertyRef {
        self.slot().refs.retain();
        PropertyRef {
            handle: self.clone(),
        }
    }

    /// Claim exclusive animation rights on this property
    ///
    /// Returns `None` when another animation holds the claim.
    pub fn claim_animation(&self) -> Option<AnimationClaim> {
        self.slot()
            .animated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| AnimationClaim {
                handle: self.clone(),
            })
    }
}

impl fmt::Debug for PropertyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyHandle")
            .field("node", &self.node)
            .field("name", &self.name())
            .field("id", &self.id())
            .field("refs", &self.retain_count())
            .finish()
    }
}

/// A retained property reference
///
/// Holding one keeps the property's reference count above zero, which keeps
/// its node out of the reclamation pass.
#[derive(Debug)]
pub struct PropertyRef {
    handle: PropertyHandle,
}

impl PropertyRef {
    pub fn handle(&self) -> &PropertyHandle {
        &self.handle
    }

    /// Release explicitly (same as dropping)
    pub fn release(self) {}
}

impl Clone for PropertyRef {
    fn clone(&self) -> Self {
        self.handle.retain()
    }
}

impl Drop for PropertyRef {
    fn drop(&mut self) {
        self.handle.slot().refs.release();
    }
}

impl std::ops::Deref for PropertyRef {
    type Target = PropertyHandle;

    fn deref(&self) -> &PropertyHandle {
        &self.handle
    }
}

/// Exclusive right to animate a property, given up on drop
#[derive(Debug)]
pub struct AnimationClaim {
    handle: PropertyHandle,
}

impl Drop for AnimationClaim {
    fn drop(&mut self) {
        self.handle.slot().animated.store(false, Ordering::Release);
    }
}
