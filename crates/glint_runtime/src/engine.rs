//! The render-thread engine
//!
//! [`Engine::tick`] is the whole frame: drain the request queue and apply
//! every request in order, advance animations, reclaim destroyed nodes,
//! re-lay-out stale text, then draw. Anything the controller must hear about
//! is pushed onto the notification queue as soon as it is known.

use glint_animation::AnimationScheduler;
use glint_core::{
    Applied, GlintError, NodeGraph, NodeRegistry, NotificationQueue, RequestId, Update,
    UpdateQueue,
};
use glint_gpu::{
    HeadlessBackend, ResourceCoordinator, ResourceStats, StaticAtlases, TextureSource,
};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::controller::Controller;
use crate::renderer::{FrameRenderer, HeadlessRenderer};
use crate::request::{Completion, Notification, Request};

/// What one frame did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub frame: u64,
    /// Requests drained from the queue
    pub requests: usize,
    /// Requests that failed to apply
    pub failed: usize,
    pub animations_active: usize,
    pub animations_finished: usize,
    pub nodes_reclaimed: usize,
    pub relayouts: usize,
    pub nodes_drawn: usize,
}

/// Totals since the engine was created
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub frames: u64,
    pub requests: u64,
    pub failed: u64,
    pub animations_finished: u64,
    pub nodes_reclaimed: u64,
    pub nodes_live: usize,
    pub textures_created: u64,
    pub textures_deleted: u64,
    pub textures_live: usize,
}

/// Render-thread owner of the node graph, animations and GPU resources
pub struct Engine {
    config: EngineConfig,
    graph: NodeGraph,
    scheduler: AnimationScheduler,
    resources: ResourceCoordinator,
    renderer: Box<dyn FrameRenderer>,
    requests: UpdateQueue<Request>,
    notifications: NotificationQueue<Notification>,
    stats: EngineStats,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        resources: ResourceCoordinator,
        renderer: Box<dyn FrameRenderer>,
    ) -> Self {
        tracing::debug!("Engine: created with {:?}", config);
        Self {
            config,
            graph: NodeGraph::new(NodeRegistry::new()),
            scheduler: AnimationScheduler::new(),
            resources,
            renderer,
            requests: UpdateQueue::new(),
            notifications: NotificationQueue::new(),
            stats: EngineStats::default(),
        }
    }

    /// Engine with an in-memory texture backend and no atlases
    pub fn headless(config: EngineConfig) -> Self {
        let resources = ResourceCoordinator::new(
            Box::new(HeadlessBackend::new()),
            Box::new(StaticAtlases::new()),
            config.atlas_initial_capacity,
        );
        Self::new(config, resources, Box::new(HeadlessRenderer::new()))
    }

    /// A controller bound to this engine's context and queues
    ///
    /// Meant to be called once; the controller then moves to its own thread.
    pub fn controller(&self) -> Controller {
        Controller::new(
            self.graph.registry().clone(),
            self.requests.clone(),
            self.notifications.clone(),
        )
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn resources(&self) -> &ResourceCoordinator {
        &self.resources
    }

    pub fn stats(&self) -> EngineStats {
        let resources: ResourceStats = self.resources.stats();
        EngineStats {
            nodes_live: self.graph.len(),
            textures_created: resources.textures_created,
            textures_deleted: resources.textures_deleted,
            textures_live: self.resources.live_textures(),
            ..self.stats
        }
    }

    /// Run one frame at time `now` (seconds)
    pub fn tick(&mut self, now: f64) -> FrameStats {
        let mut frame = FrameStats {
            frame: self.stats.frames,
            ..Default::default()
        };

        // Apply
        let batch = self.requests.drain();
        frame.requests = batch.len();
        for (id, request) in batch {
            if !self.apply(id, request) {
                frame.failed += 1;
            }
        }

        // Animate
        let finished = self.scheduler.advance(now, &mut self.graph);
        frame.animations_finished = finished.len();
        frame.animations_active = self.scheduler.len();
        self.notifications.extend(finished.into_iter().map(|done| {
            Notification::ok(
                done.request,
                Completion::AnimationFinished {
                    end_value: done.end_value,
                },
            )
        }));

        // Reclaim
        frame.nodes_reclaimed = self.graph.reclaim().len();

        // Layout
        for id in self.graph.take_layout_requests() {
            if let Some(node) = self.graph.node(id) {
                self.renderer.relayout(node);
                frame.relayouts += 1;
            }
        }

        // Draw
        frame.nodes_drawn = self.renderer.draw(&self.graph);

        self.stats.frames += 1;
        self.stats.requests += frame.requests as u64;
        self.stats.failed += frame.failed as u64;
        self.stats.animations_finished += frame.animations_finished as u64;
        self.stats.nodes_reclaimed += frame.nodes_reclaimed as u64;

        if self.config.log_frame_stats && frame.frame % self.config.target_fps.max(1) as u64 == 0 {
            tracing::info!(
                "Engine: frame {} requests={} failed={} animating={} drawn={}",
                frame.frame,
                frame.requests,
                frame.failed,
                frame.animations_active,
                frame.nodes_drawn
            );
        } else {
            tracing::trace!("Engine: {:?}", frame);
        }

        frame
    }

    /// Apply one request; returns false if it failed
    fn apply(&mut self, id: RequestId, request: Request) -> bool {
        tracing::debug!("Engine: applying {} {}", id, request.label());

        let result = match request {
            Request::Update { update, notify } => {
                if let Update::Destroy(node) = &update {
                    let stopped = self.scheduler.stop_node(node.id());
                    if stopped > 0 {
                        tracing::debug!("Engine: stopped {} animations on destroyed node", stopped);
                    }
                }
                match update.apply(&mut self.graph, self.config.strict_properties) {
                    Ok(Applied::Done) => notify.then_some(Ok(Completion::Applied)),
                    Ok(Applied::Skipped) => notify.then_some(Ok(Completion::Skipped)),
                    Err(e) => Some(Err(e)),
                }
            }
            Request::StartAnimation(animation) => {
                let node = animation.property().node();
                let doomed = self
                    .graph
                    .node(node)
                    .map_or(true, |node| node.is_destroy_requested());
                if doomed {
                    animation
                        .status()
                        .set(glint_animation::AnimationState::Stopped);
                    Some(Err(GlintError::InvalidTarget(format!(
                        "{:?} was destroyed before its animation started",
                        node
                    ))))
                } else {
                    self.scheduler.insert(id, animation, &self.graph);
                    None
                }
            }
            Request::StopAnimation(target) => {
                if !self.scheduler.stop(target) {
                    tracing::debug!("Engine: {} already finished", target);
                }
                None
            }
            Request::LoadTexture { source } => Some(
                self.resources
                    .load(&source, None)
                    .map(Completion::TextureLoaded)
                    .map_err(GlintError::from),
            ),
            Request::UpdateTexture { texture, pixels } => Some(
                self.resources
                    .load(&TextureSource::Pixels(pixels), Some(texture))
                    .map(Completion::TextureLoaded)
                    .map_err(GlintError::from),
            ),
            Request::DestroyTexture(loaded) => {
                self.resources.destroy(loaded);
                None
            }
        };

        match result {
            Some(Err(e)) => {
                tracing::warn!("Engine: {} failed: {}", id, e);
                self.notifications.push(Notification::err(id, e));
                false
            }
            Some(Ok(completion)) => {
                self.notifications.push(Notification::ok(id, completion));
                true
            }
            None => true,
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("graph", &self.graph)
            .field("animations", &self.scheduler.len())
            .field("pending", &self.requests.len())
            .field("resources", &self.resources)
            .finish()
    }
}
