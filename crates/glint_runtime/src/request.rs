//! Requests sent to the render thread and the notifications sent back

use glint_animation::Animation;
use glint_core::{GlintError, RequestId, Update};
use std::sync::Arc;

use glint_gpu::{LoadedTexture, PixelBuffer, TextureId, TextureSource};

/// One entry of the controller → render queue
#[derive(Debug)]
pub enum Request {
    /// A graph mutation; `notify` asks for a notification even on success
    Update { update: Update, notify: bool },
    /// A claimed, retained animation ready to run
    StartAnimation(Animation),
    /// Stop the animation started by the given request
    StopAnimation(RequestId),
    /// Upload a texture (always notifies)
    LoadTexture { source: TextureSource },
    /// Re-upload pixels into an owned texture (always notifies)
    UpdateTexture {
        texture: TextureId,
        pixels: Arc<PixelBuffer>,
    },
    /// Delete an owned texture or release an atlas checkout
    DestroyTexture(LoadedTexture),
}

impl Request {
    pub fn label(&self) -> &'static str {
        match self {
            Request::Update { update, .. } => update.label(),
            Request::StartAnimation(_) => "start-animation",
            Request::StopAnimation(_) => "stop-animation",
            Request::LoadTexture { .. } => "load-texture",
            Request::UpdateTexture { .. } => "update-texture",
            Request::DestroyTexture(_) => "destroy-texture",
        }
    }
}

/// What a successful request produced
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    Applied,
    /// The request targeted something absent; nothing changed
    Skipped,
    AnimationFinished { end_value: f32 },
    TextureLoaded(LoadedTexture),
}

/// Render → controller result of one request
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub request: RequestId,
    pub result: Result<Completion, GlintError>,
}

impl Notification {
    pub fn ok(request: RequestId, completion: Completion) -> Self {
        Self {
            request,
            result: Ok(completion),
        }
    }

    pub fn err(request: RequestId, error: GlintError) -> Self {
        Self {
            request,
            result: Err(error),
        }
    }

    pub fn is_err(&self) -> bool {
        self.result.is_err()
    }
}
