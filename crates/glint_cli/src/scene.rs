//! Demo scene used by `glint run`
//!
//! A root group holding a pulsing rectangle, a label and a triangle, with a
//! texture upload and a font atlas checkout thrown in so every request kind
//! goes through the engine at least once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use glint_gpu::{HeadlessBackend, ResourceCoordinator, StaticAtlases};
use glint_runtime::prelude::*;
use glint_runtime::Callback;
use tracing::{debug, warn};

/// Atlas id the demo label's font lives in
pub const DEMO_FONT: AtlasId = AtlasId(1);

/// Headless resources with the demo font atlas registered
pub fn resources(config: &EngineConfig) -> Result<ResourceCoordinator, GlintError> {
    let atlas = PixelBuffer::new(128, 128, 1, vec![0; 128 * 128])?;
    Ok(ResourceCoordinator::new(
        Box::new(HeadlessBackend::new()),
        Box::new(StaticAtlases::new().with_atlas(DEMO_FONT, atlas)),
        config.atlas_initial_capacity,
    ))
}

/// Completions the scene heard back through its callbacks
#[derive(Debug, Default)]
pub struct SceneLog {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl SceneLog {
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    fn callback(self: &Arc<Self>, what: &'static str) -> Callback {
        let log = Arc::clone(self);
        Box::new(move |result: &Result<Completion, GlintError>| match result {
            Ok(completion) => {
                debug!("scene: {} -> {:?}", what, completion);
                log.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                warn!("scene: {} failed: {}", what, e);
                log.failed.fetch_add(1, Ordering::Relaxed);
            }
        })
    }
}

/// Handles the scene keeps so it can tear itself down
pub struct Scene {
    root: NodeHandle,
    nodes: Vec<NodeHandle>,
    pulse: AnimationHandle,
    textures: Vec<TextureHandle>,
    pub log: Arc<SceneLog>,
}

impl Scene {
    pub fn build(controller: &mut Controller) -> Result<Self, GlintError> {
        let log = Arc::new(SceneLog::default());

        let root = controller.create_node(NodeKind::Group);
        controller.set_root(Some(&root))?;
        controller.set(&property(&root, ids::W)?, 640.0f32)?;
        controller.set(&property(&root, ids::H)?, 480.0f32)?;

        // Pulsing rectangle
        let rect = controller.create_node(NodeKind::Rect);
        controller.add_child(&root, &rect)?;
        controller.set(&property(&rect, ids::W)?, 120.0f32)?;
        controller.set(&property(&rect, ids::H)?, 80.0f32)?;
        let pulse = controller.start_animation(
            &property(&rect, ids::OPACITY)?,
            AnimationSpec::new(0.2, Duration::from_millis(750))
                .from(1.0)
                .forever()
                .autoreverse(true)
                .easing(Easing::CubicInOut),
        )?;

        // Sliding rectangle that stops after two passes
        controller.start_animation_then(
            &property(&rect, ids::X)?,
            AnimationSpec::new(400.0, Duration::from_secs(1))
                .repeat(Repeat::Count(2))
                .autoreverse(true)
                .easing(Easing::CubicOut),
            log.callback("slide"),
        )?;

        // Label
        let label = controller.create_node(NodeKind::Text);
        controller.add_child(&root, &label)?;
        controller.set(&property(&label, ids::TEXT)?, "Glint")?;
        controller.set(&property(&label, ids::FONT_ID)?, DEMO_FONT.0)?;
        controller.set_then(
            &property(&label, ids::FONT_SIZE)?,
            32.0f32,
            log.callback("label"),
        )?;

        // Triangle
        let triangle = controller.create_node(NodeKind::Polygon);
        controller.add_child(&root, &triangle)?;
        controller.set(
            &property(&triangle, ids::GEOMETRY)?,
            vec![0.0f32, 0.0, 60.0, 0.0, 30.0, 52.0],
        )?;

        // Textures
        let image = TextureHandle::new();
        controller.load_texture_then(
            &image,
            TextureSource::Pixels(Arc::new(PixelBuffer::solid(64, 64, [40, 120, 220, 255]))),
            log.callback("image"),
        )?;
        let font = TextureHandle::new();
        controller.load_texture_then(&font, TextureSource::Atlas(DEMO_FONT), log.callback("font"))?;

        Ok(Self {
            root,
            nodes: vec![rect, label, triangle],
            pulse,
            textures: vec![image, font],
            log,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len() + 1
    }

    /// Stop the animations, release the textures and destroy every node
    pub fn teardown(self, controller: &mut Controller) -> Result<(), GlintError> {
        controller.stop_animation(&self.pulse);
        for texture in &self.textures {
            controller.destroy_texture(texture);
        }
        controller.set_root(None)?;
        for node in &self.nodes {
            controller.remove_child(&self.root, node)?;
            controller.destroy_node(node)?;
        }
        controller.destroy_node(&self.root)?;
        Ok(())
    }
}

fn property(node: &NodeHandle, id: PropertyId) -> Result<PropertyHandle, GlintError> {
    node.property(id).ok_or(GlintError::UnknownProperty(id))
}
