//! Glint Runtime
//!
//! Ties the Glint crates into a running engine with two sides:
//!
//! - **[`Engine`]**: owned by the render thread. Each [`Engine::tick`] drains
//!   the request queue, applies requests in order, advances animations,
//!   reclaims destroyed nodes, re-lays-out stale text and draws.
//! - **[`Controller`]**: owned by the controller thread. Validates calls
//!   synchronously, enqueues them, and dispatches results back as callbacks.
//!
//! # Example
//!
//! ```rust
//! use glint_runtime::prelude::*;
//! use std::time::Duration;
//!
//! let mut engine = Engine::headless(EngineConfig::default());
//! let mut controller = engine.controller();
//!
//! let root = controller.create_node(NodeKind::Group);
//! let rect = controller.create_node(NodeKind::Rect);
//! controller.set_root(Some(&root)).unwrap();
//! controller.add_child(&root, &rect).unwrap();
//!
//! let x = rect.property(ids::X).unwrap();
//! controller
//!     .start_animation(&x, AnimationSpec::new(100.0, Duration::from_secs(1)))
//!     .unwrap();
//!
//! engine.tick(0.0);
//! engine.tick(0.5);
//! assert_eq!(engine.graph().float(&x), Some(50.0));
//! ```

pub mod config;
pub mod controller;
pub mod engine;
pub mod render_loop;
pub mod renderer;
pub mod request;

#[cfg(test)]
mod tests;

pub use config::{EngineConfig, CONFIG_FILE};
pub use controller::{AnimationHandle, Callback, Controller};
pub use engine::{Engine, EngineStats, FrameStats};
pub use render_loop::RenderLoop;
pub use renderer::{
    visible_items, DrawItem, FrameRenderer, HeadlessRenderer, RecordingRenderer, TextLayout,
};
pub use request::{Completion, Notification, Request};

/// Everything a host needs in one import
pub mod prelude {
    pub use crate::{
        AnimationHandle, Completion, Controller, Engine, EngineConfig, FrameRenderer,
        Notification, RenderLoop,
    };
    pub use glint_animation::{AnimationSpec, AnimationState, Easing, Repeat};
    pub use glint_core::{
        ids, GlintError, NodeHandle, NodeKind, PropertyHandle, PropertyId, PropertyValue,
        TextVAlign, TextWrap,
    };
    pub use glint_gpu::{AtlasId, PixelBuffer, TextureHandle, TextureSource};
}
