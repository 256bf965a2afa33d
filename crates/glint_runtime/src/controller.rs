//! The controller-thread API
//!
//! Everything the host scripting layer does goes through a [`Controller`].
//! Calls validate synchronously (type, context, animation claims) and then
//! only enqueue; nothing here touches render-thread state. Results come back
//! as notifications, which [`Controller::dispatch`] turns into settled
//! texture handles and callback invocations.

use std::sync::Arc;

use glint_animation::{Animation, AnimationSpec, AnimationState, AnimationStatus};
use glint_core::{
    ContextId, GlintError, NodeHandle, NodeKind, NodeRegistry, NotificationQueue, PropertyHandle,
    PropertyId, PropertyKind, PropertyValue, RequestId, Result, Update, UpdateQueue,
};
use glint_gpu::{Ownership, PixelBuffer, TextureHandle, TextureSource};
use rustc_hash::FxHashMap;

use crate::request::{Completion, Notification, Request};

/// Invoked on the controller thread with a request's outcome
pub type Callback = Box<dyn FnOnce(&std::result::Result<Completion, GlintError>) + Send>;

/// An animation as the controller sees it
///
/// Created idle by [`Controller::animate`]; [`AnimationHandle::start`] sends
/// it to the render thread. A handle starts at most once.
#[derive(Debug)]
pub struct AnimationHandle {
    property: PropertyHandle,
    spec: AnimationSpec,
    status: AnimationStatus,
    request: Option<RequestId>,
}

impl AnimationHandle {
    pub fn state(&self) -> AnimationState {
        self.status.get()
    }

    pub fn property(&self) -> &PropertyHandle {
        &self.property
    }

    pub fn spec(&self) -> &AnimationSpec {
        &self.spec
    }

    /// Id of the start request, once started
    pub fn request(&self) -> Option<RequestId> {
        self.request
    }

    /// Claim the property and enqueue the animation
    pub fn start(&mut self, controller: &mut Controller) -> Result<RequestId> {
        self.start_inner(controller, None)
    }

    /// Like [`start`](Self::start), calling `on_complete` when it finishes
    pub fn start_then<F>(&mut self, controller: &mut Controller, on_complete: F) -> Result<RequestId>
    where
        F: FnOnce(&std::result::Result<Completion, GlintError>) + Send + 'static,
    {
        self.start_inner(controller, Some(Box::new(on_complete)))
    }

    fn start_inner(
        &mut self,
        controller: &mut Controller,
        on_complete: Option<Callback>,
    ) -> Result<RequestId> {
        if self.status.get() != AnimationState::Idle {
            return Err(GlintError::AlreadyStarted("animation"));
        }
        self.property.check_context(controller.context())?;

        let claim = self
            .property
            .claim_animation()
            .ok_or(GlintError::PropertyAnimated(self.property.name()))?;
        self.status.start()?;

        let animation = Animation::new(
            self.property.retain(),
            claim,
            self.spec.clone(),
            self.status.clone(),
        )?;
        let id = controller.requests.enqueue(Request::StartAnimation(animation));
        if let Some(callback) = on_complete {
            controller.callbacks.insert(id, callback);
        }
        self.request = Some(id);
        tracing::debug!("Controller: {} starts animation of `{}`", id, self.property.name());
        Ok(id)
    }
}

/// Controller-thread handle to one engine
pub struct Controller {
    registry: NodeRegistry,
    requests: UpdateQueue<Request>,
    notifications: NotificationQueue<Notification>,
    callbacks: FxHashMap<RequestId, Callback>,
    textures: FxHashMap<RequestId, TextureHandle>,
    updates: FxHashMap<RequestId, TextureHandle>,
}

impl Controller {
    pub(crate) fn new(
        registry: NodeRegistry,
        requests: UpdateQueue<Request>,
        notifications: NotificationQueue<Notification>,
    ) -> Self {
        Self {
            registry,
            requests,
            notifications,
            callbacks: FxHashMap::default(),
            textures: FxHashMap::default(),
            updates: FxHashMap::default(),
        }
    }

    pub fn context(&self) -> ContextId {
        self.registry.context()
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Requests not yet drained by the render thread
    pub fn pending(&self) -> usize {
        self.requests.len()
    }

    fn enqueue_update(&mut self, update: Update, callback: Option<Callback>) -> RequestId {
        let notify = callback.is_some();
        let id = self.requests.enqueue(Request::Update { update, notify });
        if let Some(callback) = callback {
            self.callbacks.insert(id, callback);
        }
        id
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Create a node; it reaches the render thread with the next drain
    pub fn create_node(&mut self, kind: NodeKind) -> NodeHandle {
        let node = self.registry.create(kind);
        self.enqueue_update(Update::Insert(node.clone()), None);
        node
    }

    /// Append `child` to `group`'s children
    pub fn add_child(&mut self, group: &NodeHandle, child: &NodeHandle) -> Result<RequestId> {
        self.check_group(group)?;
        child.check_context(self.context())?;
        Ok(self.enqueue_update(
            Update::AddChild {
                group: group.retain(),
                child: child.retain(),
            },
            None,
        ))
    }

    /// Remove the first occurrence of `child`; absent children are ignored
    pub fn remove_child(&mut self, group: &NodeHandle, child: &NodeHandle) -> Result<RequestId> {
        self.check_group(group)?;
        child.check_context(self.context())?;
        Ok(self.enqueue_update(
            Update::RemoveChild {
                group: group.retain(),
                child: child.retain(),
            },
            None,
        ))
    }

    pub fn set_root(&mut self, root: Option<&NodeHandle>) -> Result<RequestId> {
        if let Some(node) = root {
            node.check_context(self.context())?;
        }
        Ok(self.enqueue_update(Update::SetRoot(root.map(NodeHandle::retain)), None))
    }

    /// Destroy a node once nothing references it; its animations stop
    pub fn destroy_node(&mut self, node: &NodeHandle) -> Result<RequestId> {
        node.check_context(self.context())?;
        Ok(self.enqueue_update(Update::Destroy(node.retain()), None))
    }

    fn check_group(&self, group: &NodeHandle) -> Result<()> {
        group.check_context(self.context())?;
        if group.kind() != NodeKind::Group {
            return Err(GlintError::InvalidTarget(format!(
                "{:?} node cannot hold children",
                group.kind()
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Set a property; the kind is checked before anything is enqueued
    pub fn set(
        &mut self,
        property: &PropertyHandle,
        value: impl Into<PropertyValue>,
    ) -> Result<RequestId> {
        let update = self.typed_set(property, value.into())?;
        Ok(self.enqueue_update(update, None))
    }

    /// Set a property and hear back once it is applied
    pub fn set_then<F>(
        &mut self,
        property: &PropertyHandle,
        value: impl Into<PropertyValue>,
        on_applied: F,
    ) -> Result<RequestId>
    where
        F: FnOnce(&std::result::Result<Completion, GlintError>) + Send + 'static,
    {
        let update = self.typed_set(property, value.into())?;
        Ok(self.enqueue_update(update, Some(Box::new(on_applied))))
    }

    fn typed_set(&self, property: &PropertyHandle, value: PropertyValue) -> Result<Update> {
        property.check_context(self.context())?;
        property.spec().check(&value)?;
        Ok(Update::Set {
            property: property.retain(),
            value,
        })
    }

    /// Set a property by raw id
    ///
    /// The id is only resolved on the render thread; an unknown id is logged
    /// and skipped there (or reported, with `strict_properties`).
    pub fn set_by_id(
        &mut self,
        node: &NodeHandle,
        id: PropertyId,
        value: impl Into<PropertyValue>,
    ) -> Result<RequestId> {
        node.check_context(self.context())?;
        Ok(self.enqueue_update(
            Update::SetById {
                node: node.retain(),
                id,
                value: value.into(),
            },
            None,
        ))
    }

    // ========================================================================
    // Animations
    // ========================================================================

    /// Prepare an idle animation of a float property
    pub fn animate(&self, property: &PropertyHandle, spec: AnimationSpec) -> Result<AnimationHandle> {
        property.check_context(self.context())?;
        if property.kind() != PropertyKind::Float {
            return Err(GlintError::TypeMismatch {
                property: property.name(),
                expected: PropertyKind::Float,
                found: property.kind(),
            });
        }
        Ok(AnimationHandle {
            property: property.clone(),
            spec,
            status: AnimationStatus::new(),
            request: None,
        })
    }

    /// Prepare and start an animation
    pub fn start_animation(
        &mut self,
        property: &PropertyHandle,
        spec: AnimationSpec,
    ) -> Result<AnimationHandle> {
        let mut handle = self.animate(property, spec)?;
        handle.start(self)?;
        Ok(handle)
    }

    /// Prepare and start an animation with a completion callback
    pub fn start_animation_then<F>(
        &mut self,
        property: &PropertyHandle,
        spec: AnimationSpec,
        on_complete: F,
    ) -> Result<AnimationHandle>
    where
        F: FnOnce(&std::result::Result<Completion, GlintError>) + Send + 'static,
    {
        let mut handle = self.animate(property, spec)?;
        handle.start_then(self, on_complete)?;
        Ok(handle)
    }

    /// Stop an animation; its completion callback will not run
    ///
    /// A start request still in the queue is cancelled outright. An
    /// animation that already completed is left alone and its callback
    /// still runs on the next dispatch.
    pub fn stop_animation(&mut self, handle: &AnimationHandle) {
        let Some(start) = handle.request else {
            return;
        };

        if self.requests.cancel(start).is_some() {
            self.callbacks.remove(&start);
            handle.status.set(AnimationState::Stopped);
            tracing::debug!("Controller: cancelled pending {}", start);
            return;
        }
        if handle.status.get() == AnimationState::Running {
            self.callbacks.remove(&start);
            self.requests.enqueue(Request::StopAnimation(start));
        }
    }

    // ========================================================================
    // Textures
    // ========================================================================

    /// Start loading a texture into `handle`
    ///
    /// Fails with `AlreadyStarted` if the handle is loading or loaded. The
    /// handle is settled by [`dispatch`](Self::dispatch).
    pub fn load_texture(&mut self, handle: &TextureHandle, source: TextureSource) -> Result<RequestId> {
        handle.begin_load()?;
        let id = self.requests.enqueue(Request::LoadTexture { source });
        self.textures.insert(id, handle.clone());
        Ok(id)
    }

    /// Like [`load_texture`](Self::load_texture), with a callback
    pub fn load_texture_then<F>(
        &mut self,
        handle: &TextureHandle,
        source: TextureSource,
        on_loaded: F,
    ) -> Result<RequestId>
    where
        F: FnOnce(&std::result::Result<Completion, GlintError>) + Send + 'static,
    {
        let id = self.load_texture(handle, source)?;
        self.callbacks.insert(id, Box::new(on_loaded));
        Ok(id)
    }

    /// Re-upload pixels into the texture `handle` already owns
    ///
    /// The texture keeps its id; the handle picks up the new size and format
    /// on dispatch. Shared atlas textures cannot be updated.
    pub fn update_texture(&mut self, handle: &TextureHandle, pixels: PixelBuffer) -> Result<RequestId> {
        let Some(loaded) = handle.loaded() else {
            if handle.is_loading() {
                return Err(GlintError::AlreadyStarted("texture load"));
            }
            return Err(GlintError::InvalidTarget("texture handle holds no texture".into()));
        };
        if loaded.ownership != Ownership::Owned {
            return Err(GlintError::InvalidTarget(format!(
                "{} is a shared atlas texture",
                loaded.texture.id
            )));
        }

        let id = self.requests.enqueue(Request::UpdateTexture {
            texture: loaded.texture.id,
            pixels: Arc::new(pixels),
        });
        self.updates.insert(id, handle.clone());
        Ok(id)
    }

    /// Like [`update_texture`](Self::update_texture), with a callback
    pub fn update_texture_then<F>(
        &mut self,
        handle: &TextureHandle,
        pixels: PixelBuffer,
        on_updated: F,
    ) -> Result<RequestId>
    where
        F: FnOnce(&std::result::Result<Completion, GlintError>) + Send + 'static,
    {
        let id = self.update_texture(handle, pixels)?;
        self.callbacks.insert(id, Box::new(on_updated));
        Ok(id)
    }

    /// Give the handle's texture back; returns `None` if it holds none
    pub fn destroy_texture(&mut self, handle: &TextureHandle) -> Option<RequestId> {
        let loaded = handle.take()?;
        Some(self.requests.enqueue(Request::DestroyTexture(loaded)))
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Cancel a request that has not been applied yet
    ///
    /// Its references are released and its callback dropped. Returns false
    /// if the request was already drained.
    pub fn cancel(&mut self, id: RequestId) -> bool {
        let Some(request) = self.requests.cancel(id) else {
            return false;
        };
        self.callbacks.remove(&id);
        match &request {
            Request::LoadTexture { .. } => {
                if let Some(handle) = self.textures.remove(&id) {
                    handle.abort_load();
                }
            }
            Request::UpdateTexture { .. } => {
                self.updates.remove(&id);
            }
            Request::StartAnimation(animation) => {
                animation.status().set(AnimationState::Stopped);
            }
            _ => {}
        }
        tracing::debug!("Controller: cancelled {} {}", id, request.label());
        true
    }

    /// Deliver everything the render thread reported since the last call
    ///
    /// Settles texture handles first, then runs the request's callback.
    /// Failures without a callback are logged. Returns the number of
    /// notifications handled.
    pub fn dispatch(&mut self) -> usize {
        let notifications = self.notifications.take_all();
        let count = notifications.len();

        for Notification { request, result } in notifications {
            if let Some(handle) = self.textures.remove(&request) {
                match &result {
                    Ok(Completion::TextureLoaded(loaded)) => handle.finish(Ok(*loaded)),
                    _ => handle.abort_load(),
                }
            }
            if let Some(handle) = self.updates.remove(&request) {
                if let Ok(Completion::TextureLoaded(updated)) = &result {
                    if !handle.replace(*updated) {
                        tracing::debug!("Controller: {} settled after its texture was released", request);
                    }
                }
            }

            match self.callbacks.remove(&request) {
                Some(callback) => callback(&result),
                None => {
                    if let Err(e) = &result {
                        tracing::warn!("Controller: {} failed: {}", request, e);
                    }
                }
            }
        }
        count
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("context", &self.context())
            .field("pending", &self.requests.len())
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}
