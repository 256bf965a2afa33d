//! Animation scheduler
//!
//! Owns every running animation on the render thread and advances them once
//! per frame, after the update batch has been applied. Animations are keyed
//! by the id of the request that started them, which is the only name the
//! controller knows them by.

use glint_core::{NodeGraph, NodeId, RequestId};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::animation::{Animation, AnimationState, Step};

new_key_type! {
    /// Handle to an animation in the scheduler
    pub struct AnimationId;
}

/// An animation that completed during [`AnimationScheduler::advance`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Finished {
    pub request: RequestId,
    pub end_value: f32,
}

/// Render-thread registry of active animations
#[derive(Debug, Default)]
pub struct AnimationScheduler {
    animations: SlotMap<AnimationId, (RequestId, Animation)>,
    by_request: FxHashMap<RequestId, AnimationId>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of an animation that just reached the render thread
    pub fn insert(
        &mut self,
        request: RequestId,
        mut animation: Animation,
        graph: &NodeGraph,
    ) -> AnimationId {
        animation.resolve_from(graph);
        animation.status().set(AnimationState::Running);
        tracing::debug!(
            "AnimationScheduler: {} animates `{}` {} -> {} over {:?}",
            request,
            animation.property().name(),
            animation.from_value(),
            animation.spec().to,
            animation.spec().duration
        );
        let id = self.animations.insert((request, animation));
        self.by_request.insert(request, id);
        id
    }

    /// Remove an animation without completing it
    ///
    /// Returns false when it already finished or was never inserted.
    pub fn stop(&mut self, request: RequestId) -> bool {
        let Some(id) = self.by_request.remove(&request) else {
            return false;
        };
        match self.animations.remove(id) {
            Some((_, animation)) => {
                animation.status().set(AnimationState::Stopped);
                tracing::debug!("AnimationScheduler: stopped {}", request);
                true
            }
            None => false,
        }
    }

    /// Stop every animation writing a property of `node`
    pub fn stop_node(&mut self, node: NodeId) -> usize {
        let doomed: Vec<RequestId> = self
            .animations
            .values()
            .filter(|(_, animation)| animation.property().node() == node)
            .map(|(request, _)| *request)
            .collect();
        doomed.iter().filter(|request| self.stop(**request)).count()
    }

    /// Advance every animation to `now`
    ///
    /// Finished animations are removed (releasing their property) and
    /// reported once each.
    pub fn advance(&mut self, now: f64, graph: &mut NodeGraph) -> Vec<Finished> {
        let mut finished = Vec::new();
        let mut dead = Vec::new();

        for (id, (request, animation)) in self.animations.iter_mut() {
            match animation.tick(now, graph) {
                Ok(Step::Inert) | Ok(Step::Running(_)) => {}
                Ok(Step::Finished(end_value)) => {
                    animation.status().set(AnimationState::Completed);
                    finished.push(Finished {
                        request: *request,
                        end_value,
                    });
                    dead.push(id);
                }
                Err(e) => {
                    tracing::warn!("AnimationScheduler: dropping {}: {}", request, e);
                    animation.status().set(AnimationState::Stopped);
                    dead.push(id);
                }
            }
        }

        for id in dead {
            if let Some((request, _)) = self.animations.remove(id) {
                self.by_request.remove(&request);
            }
        }

        if !finished.is_empty() {
            tracing::trace!("AnimationScheduler: {} finished", finished.len());
        }
        finished
    }

    pub fn contains(&self, request: RequestId) -> bool {
        self.by_request.contains_key(&request)
    }

    /// Number of active animations
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}
