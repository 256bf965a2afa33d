//! Glint Core
//!
//! Foundational primitives for the Glint scene-graph engine:
//!
//! - **Properties**: typed, reference-counted value slots with a fixed schema
//!   per node kind
//! - **Node Arena**: slotmap-backed node storage shared by the controller and
//!   render threads
//! - **Node Graph**: the render thread's tree of groups, rectangles, text and
//!   polygons
//! - **Update Queue**: FIFO of mutations applied once per frame, plus the
//!   reverse notification channel
//!
//! # Example
//!
//! ```rust
//! use glint_core::{ids, NodeGraph, NodeKind, NodeRegistry, Update, UpdateQueue};
//!
//! let registry = NodeRegistry::new();
//! let mut graph = NodeGraph::new(registry.clone());
//! let queue = UpdateQueue::new();
//!
//! // Controller side
//! let rect = registry.create(NodeKind::Rect);
//! queue.enqueue(Update::Insert(rect.clone()));
//! let x = rect.property(ids::X).unwrap();
//! queue.enqueue(Update::Set { property: x.retain(), value: 42.0f32.into() });
//!
//! // Render side, once per frame
//! for (_, update) in queue.drain() {
//!     update.apply(&mut graph, false).unwrap();
//! }
//! assert_eq!(graph.float(&x), Some(42.0));
//! assert_eq!(x.retain_count(), 0);
//! ```

pub mod error;
pub mod graph;
pub mod node;
pub mod property;
pub mod queue;
pub mod schema;
pub mod update;

pub use error::{GlintError, Result};
pub use graph::{Node, NodeGraph, NodePayload, RemoveOutcome};
pub use node::{ContextId, NodeHandle, NodeHeader, NodeId, NodeKind, NodeRef, NodeRegistry};
pub use property::{
    AnimationClaim, PropertyHandle, PropertyId, PropertyKind, PropertyRef, PropertySpec,
    PropertyValue, RefCount,
};
pub use queue::{NotificationQueue, RequestId, UpdateQueue};
pub use schema::{ids, Schema, TextVAlign, TextWrap, NO_FONT, NO_TEXTURE};
pub use update::{Applied, Update};
