//! Glint Animation System
//!
//! Time-based float property animations for the Glint scene graph.
//!
//! # Features
//!
//! - **Easing**: linear and cubic in/out/in-out curves
//! - **Repeats**: fixed counts or forever, optionally reversing direction
//! - **Exclusive claims**: one running animation per property
//! - **Clock tolerant**: a clock that jumps backwards keeps elapsed progress
//!
//! Animations run on the render thread inside an [`AnimationScheduler`],
//! writing through [`glint_core::NodeGraph::set_value_direct`].

pub mod animation;
pub mod easing;
pub mod scheduler;

pub use animation::{
    Animation, AnimationSpec, AnimationState, AnimationStatus, Direction, Repeat, Step,
};
pub use easing::Easing;
pub use scheduler::{AnimationId, AnimationScheduler, Finished};
