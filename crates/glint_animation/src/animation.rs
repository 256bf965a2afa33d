//! A single property animation
//!
//! An [`Animation`] is built on the controller thread (which checks the
//! property kind and claims the property) and then moved to the render thread,
//! where the scheduler advances it once per frame. Time is in seconds on the
//! render loop's clock.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use glint_core::{
    AnimationClaim, GlintError, NodeGraph, PropertyKind, PropertyRef, PropertyValue, Result,
};

use crate::easing::Easing;

/// How many times an animation plays
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    /// Play this many times; `Count(0)` never plays
    Count(u32),
    Forever,
}

impl Repeat {
    /// Negative raw counts mean forever
    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            Repeat::Forever
        } else {
            Repeat::Count(raw.min(u32::MAX as i64) as u32)
        }
    }
}

impl Default for Repeat {
    fn default() -> Self {
        Repeat::Count(1)
    }
}

/// Which way the animation currently runs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Animation parameters
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationSpec {
    /// Start value; `None` reads the property when the animation is applied
    pub from: Option<f32>,
    pub to: f32,
    pub duration: Duration,
    pub repeat: Repeat,
    pub autoreverse: bool,
    pub easing: Easing,
}

impl AnimationSpec {
    /// Animate from the property's current value to `to`, once, linearly
    pub fn new(to: f32, duration: Duration) -> Self {
        Self {
            from: None,
            to,
            duration,
            repeat: Repeat::default(),
            autoreverse: false,
            easing: Easing::Linear,
        }
    }

    pub fn from(mut self, from: f32) -> Self {
        self.from = Some(from);
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn forever(self) -> Self {
        self.repeat(Repeat::Forever)
    }

    pub fn autoreverse(mut self, autoreverse: bool) -> Self {
        self.autoreverse = autoreverse;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

// ============================================================================
// Status
// ============================================================================

/// Lifecycle of an animation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AnimationState {
    Idle = 0,
    Running = 1,
    Completed = 2,
    /// Removed by an explicit stop or node destruction
    Stopped = 3,
}

/// Animation state shared by the controller handle and the render thread
#[derive(Clone, Debug)]
pub struct AnimationStatus(Arc<AtomicU8>);

impl AnimationStatus {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(AnimationState::Idle as u8)))
    }

    pub fn get(&self) -> AnimationState {
        match self.0.load(Ordering::Acquire) {
            0 => AnimationState::Idle,
            1 => AnimationState::Running,
            2 => AnimationState::Completed,
            _ => AnimationState::Stopped,
        }
    }

    pub fn set(&self, state: AnimationState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move Idle to Running; fails if the animation was started before
    pub fn start(&self) -> Result<()> {
        self.0
            .compare_exchange(
                AnimationState::Idle as u8,
                AnimationState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|_| GlintError::AlreadyStarted("animation"))
    }
}

impl Default for AnimationStatus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Animation
// ============================================================================

/// Result of advancing an animation by one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// Zero-repeat animation: nothing written
    Inert,
    /// Wrote an intermediate value
    Running(f32),
    /// Wrote the exact end value; the animation is finished
    Finished(f32),
}

/// A float property animation bound to one retained, claimed property
#[derive(Debug)]
pub struct Animation {
    property: PropertyRef,
    _claim: AnimationClaim,
    spec: AnimationSpec,
    status: AnimationStatus,
    from: f32,
    direction: Direction,
    remaining: Repeat,
    start_time: Option<f64>,
    last_time: f64,
}

impl Animation {
    /// Bind an animation to a property it has claimed
    ///
    /// Fails with `TypeMismatch` for anything but a float property.
    pub fn new(
        property: PropertyRef,
        claim: AnimationClaim,
        spec: AnimationSpec,
        status: AnimationStatus,
    ) -> Result<Self> {
        if property.kind() != PropertyKind::Float {
            return Err(GlintError::TypeMismatch {
                property: property.name(),
                expected: PropertyKind::Float,
                found: property.kind(),
            });
        }
        Ok(Self {
            from: spec.from.unwrap_or(0.0),
            remaining: spec.repeat,
            property,
            _claim: claim,
            spec,
            status,
            direction: Direction::Forward,
            start_time: None,
            last_time: 0.0,
        })
    }

    pub fn property(&self) -> &PropertyRef {
        &self.property
    }

    pub fn spec(&self) -> &AnimationSpec {
        &self.spec
    }

    pub fn status(&self) -> &AnimationStatus {
        &self.status
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn remaining(&self) -> Repeat {
        self.remaining
    }

    /// Resolve a missing start value from the property's current value
    ///
    /// Called when the animation reaches the render thread, so it observes
    /// every update applied before it.
    pub fn resolve_from(&mut self, graph: &NodeGraph) {
        if self.spec.from.is_none() {
            self.from = graph.float(&self.property).unwrap_or(0.0);
        }
    }

    /// Start value in effect
    pub fn from_value(&self) -> f32 {
        self.from
    }

    fn value_at(&self, t: f32) -> f32 {
        let t = match self.direction {
            Direction::Forward => t,
            Direction::Backward => 1.0 - t,
        };
        self.from + (self.spec.to - self.from) * self.spec.easing.apply(t)
    }


    /// Advance to `now` and write the new value through the direct-set path
    pub fn tick(&mut self, now: f64, graph: &mut NodeGraph) -> Result<Step> {
        if self.remaining == Repeat::Count(0) {
            return Ok(Step::Inert);
        }

        let mut start = match self.start_time {
            Some(start) => start,
            None => {
                self.last_time = now;
                now
            }
        };

        // Clock went backwards: keep the elapsed time we already had
        if now < start {
            start = now - (self.last_time - start);
            self.last_time = now;
        }

        let duration = self.spec.duration.as_secs_f64();
        let mut t = if duration > 0.0 {
            (now - start) / duration
        } else {
            1.0
        };
        self.last_time = now;

        if t >= 1.0 {
            let again = match &mut self.remaining {
                Repeat::Forever => true,
                Repeat::Count(n) => {
                    *n -= 1;
                    *n > 0
                }
            };

            if !again {
                let end = self.spec.to;
                self.start_time = Some(start);
                graph.set_value_direct(&self.property, PropertyValue::Float(end))?;
                return Ok(Step::Finished(end));
            }

            start = now;
            t = 0.0;
            if self.spec.autoreverse {
                self.direction = self.direction.flipped();
            }
        }

        self.start_time = Some(start);
        let value = self.value_at(t.clamp(0.0, 1.0) as f32);
        graph.set_value_direct(&self.property, PropertyValue::Float(value))?;
        Ok(Step::Running(value))
    }
}
