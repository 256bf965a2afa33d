//! End-to-end tests: controller calls, frame ticks and notification dispatch

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use glint_animation::{AnimationSpec, AnimationState, Easing, Repeat};
use glint_core::{ids, GlintError, NodeKind, PropertyKind, PropertyValue};
use glint_gpu::{
    AtlasId, HeadlessBackend, PixelBuffer, ResourceCoordinator, StaticAtlases, TextureHandle,
    TextureSource,
};
use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::controller::Controller;
use crate::engine::Engine;
use crate::render_loop::RenderLoop;
use crate::renderer::{FrameRenderer, RecordingRenderer};
use crate::request::Completion;

const FONT: AtlasId = AtlasId(1);

/// Recording renderer the test can still read after the engine owns it
#[derive(Clone, Default)]
struct SharedRecorder(Arc<Mutex<RecordingRenderer>>);

impl FrameRenderer for SharedRecorder {
    fn relayout(&mut self, node: &glint_core::Node) {
        self.0.lock().relayout(node);
    }

    fn draw(&mut self, graph: &glint_core::NodeGraph) -> usize {
        self.0.lock().draw(graph)
    }
}

struct Harness {
    engine: Engine,
    controller: Controller,
    recorder: SharedRecorder,
    fail_textures: Arc<AtomicBool>,
}

fn harness_with(config: EngineConfig) -> Harness {
    let backend = HeadlessBackend::new();
    let fail_textures = backend.failure_switch();
    let atlases = StaticAtlases::new()
        .with_atlas(FONT, PixelBuffer::new(16, 16, 1, vec![0; 256]).unwrap());
    let resources = ResourceCoordinator::new(Box::new(backend), Box::new(atlases), 4);
    let recorder = SharedRecorder::default();

    let engine = Engine::new(config, resources, Box::new(recorder.clone()));
    let controller = engine.controller();
    Harness {
        engine,
        controller,
        recorder,
        fail_textures,
    }
}

fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() -> usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let read = {
        let count = Arc::clone(&count);
        move || count.load(Ordering::SeqCst)
    };
    (count, read)
}

// ============================================================================
// Animations
// ============================================================================

#[test]
fn test_linear_animation_completes_once() {
    let mut h = harness();
    let rect = h.controller.create_node(NodeKind::Rect);
    let x = rect.property(ids::X).unwrap();

    let (count, fired) = counter();
    let handle = h
        .controller
        .start_animation_then(
            &x,
            AnimationSpec::new(10.0, Duration::from_secs(1)).from(0.0),
            move |result| {
                assert_eq!(result, &Ok(Completion::AnimationFinished { end_value: 10.0 }));
                count.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

    h.engine.tick(0.0);
    h.engine.tick(0.5);
    assert_eq!(h.engine.graph().float(&x), Some(5.0));
    h.controller.dispatch();
    assert_eq!(fired(), 0);

    h.engine.tick(1.0);
    assert_eq!(h.engine.graph().float(&x), Some(10.0));
    h.engine.tick(1.5);
    h.engine.tick(2.0);
    h.controller.dispatch();

    assert_eq!(fired(), 1);
    assert_eq!(handle.state(), AnimationState::Completed);
    assert_eq!(h.engine.graph().float(&x), Some(10.0));
    assert_eq!(x.retain_count(), 0);
    assert!(!x.is_animated());
}

#[test]
fn test_forever_autoreverse_oscillates() {
    let mut h = harness();
    let rect = h.controller.create_node(NodeKind::Rect);
    let w = rect.property(ids::W).unwrap();

    h.controller
        .start_animation(
            &w,
            AnimationSpec::new(20.0, Duration::from_secs(2))
                .from(0.0)
                .forever()
                .autoreverse(true),
        )
        .unwrap();

    h.engine.tick(0.0);
    for cycle in 0..5 {
        let base = cycle as f64 * 2.0;
        h.engine.tick(base + 1.0);
        assert_eq!(h.engine.graph().float(&w), Some(10.0), "cycle {cycle}");
        h.engine.tick(base + 2.0);
        let expected = if cycle % 2 == 0 { 20.0 } else { 0.0 };
        assert_eq!(h.engine.graph().float(&w), Some(expected), "cycle {cycle}");
    }
    assert_eq!(h.engine.scheduler().len(), 1);
    assert_eq!(h.controller.dispatch(), 0);
}

#[test]
fn test_set_then_animate_from_current() {
    let mut h = harness();
    let rect = h.controller.create_node(NodeKind::Rect);
    let y = rect.property(ids::Y).unwrap();

    h.controller.set(&y, 5.0f32).unwrap();
    h.controller
        .start_animation(&y, AnimationSpec::new(15.0, Duration::from_secs(1)))
        .unwrap();

    h.engine.tick(3.0);
    assert_eq!(h.engine.graph().float(&y), Some(5.0));
    h.engine.tick(3.5);
    assert_eq!(h.engine.graph().float(&y), Some(10.0));
}

#[test]
fn test_eased_animation_hits_midpoint() {
    let mut h = harness();
    let rect = h.controller.create_node(NodeKind::Rect);
    let opacity = rect.property(ids::OPACITY).unwrap();

    h.controller
        .start_animation(
            &opacity,
            AnimationSpec::new(1.0, Duration::from_secs(2))
                .from(0.0)
                .easing(Easing::CubicInOut),
        )
        .unwrap();

    h.engine.tick(0.0);
    h.engine.tick(1.0);
    let mid = h.engine.graph().float(&opacity).unwrap();
    assert!((mid - 0.5).abs() < 1e-6);
}

#[test]
fn test_animation_errors_are_synchronous() {
    let mut h = harness();
    let text = h.controller.create_node(NodeKind::Text);

    // Non-float property
    let content = text.property(ids::TEXT).unwrap();
    let err = h
        .controller
        .animate(&content, AnimationSpec::new(1.0, Duration::from_secs(1)))
        .unwrap_err();
    assert_eq!(
        err,
        GlintError::TypeMismatch {
            property: "text",
            expected: PropertyKind::Float,
            found: PropertyKind::Text,
        }
    );

    // Second start of the same handle
    let size = text.property(ids::FONT_SIZE).unwrap();
    let mut handle = h
        .controller
        .animate(&size, AnimationSpec::new(40.0, Duration::from_secs(1)))
        .unwrap();
    assert_eq!(handle.state(), AnimationState::Idle);
    handle.start(&mut h.controller).unwrap();
    assert_eq!(
        handle.start(&mut h.controller),
        Err(GlintError::AlreadyStarted("animation"))
    );

    // Another animation on the same property
    let pending = h.controller.pending();
    assert_eq!(
        h.controller
            .start_animation(&size, AnimationSpec::new(10.0, Duration::from_secs(1)))
            .unwrap_err(),
        GlintError::PropertyAnimated("fontSize")
    );
    assert_eq!(h.controller.pending(), pending);
}

#[test]
fn test_stop_animation() {
    let mut h = harness();
    let rect = h.controller.create_node(NodeKind::Rect);
    let rz = rect.property(ids::ROTATE_Z).unwrap();

    let (count, fired) = counter();
    let handle = h
        .controller
        .start_animation_then(
            &rz,
            AnimationSpec::new(360.0, Duration::from_secs(4)).from(0.0),
            move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

    h.engine.tick(0.0);
    h.engine.tick(1.0);
    assert_eq!(h.engine.graph().float(&rz), Some(90.0));

    h.controller.stop_animation(&handle);
    h.engine.tick(2.0);
    assert_eq!(h.engine.graph().float(&rz), Some(90.0));
    assert_eq!(handle.state(), AnimationState::Stopped);
    assert!(h.engine.scheduler().is_empty());

    h.engine.tick(10.0);
    h.controller.dispatch();
    assert_eq!(fired(), 0);
    assert_eq!(rz.retain_count(), 0);
}

#[test]
fn test_stop_before_drain_cancels() {
    let mut h = harness();
    let rect = h.controller.create_node(NodeKind::Rect);
    let x = rect.property(ids::X).unwrap();

    let handle = h
        .controller
        .start_animation(&x, AnimationSpec::new(1.0, Duration::from_secs(1)))
        .unwrap();
    assert!(x.is_animated());

    h.controller.stop_animation(&handle);
    assert!(!x.is_animated());
    assert_eq!(x.retain_count(), 0);

    h.engine.tick(0.0);
    assert!(h.engine.scheduler().is_empty());
}

#[test]
fn test_stop_after_completion_keeps_callback() {
    let mut h = harness();
    let rect = h.controller.create_node(NodeKind::Rect);
    let x = rect.property(ids::X).unwrap();

    let (count, fired) = counter();
    let handle = h
        .controller
        .start_animation_then(
            &x,
            AnimationSpec::new(10.0, Duration::from_secs(1)).from(0.0),
            move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

    h.engine.tick(0.0);
    h.engine.tick(1.0);
    assert_eq!(handle.state(), AnimationState::Completed);

    // Finished on the render thread, not yet dispatched
    h.controller.stop_animation(&handle);
    assert_eq!(h.controller.pending(), 0);
    assert_eq!(handle.state(), AnimationState::Completed);

    h.controller.dispatch();
    assert_eq!(fired(), 1);
}

#[test]
fn test_zero_repeat_never_writes() {
    let mut h = harness();
    let rect = h.controller.create_node(NodeKind::Rect);
    let x = rect.property(ids::X).unwrap();

    let handle = h
        .controller
        .start_animation(
            &x,
            AnimationSpec::new(50.0, Duration::from_millis(100))
                .from(25.0)
                .repeat(Repeat::Count(0)),
        )
        .unwrap();

    for frame in 0..10 {
        h.engine.tick(frame as f64);
    }
    assert_eq!(h.engine.graph().float(&x), Some(0.0));
    assert_eq!(handle.state(), AnimationState::Running);

    h.controller.stop_animation(&handle);
    h.engine.tick(11.0);
    assert_eq!(x.retain_count(), 0);
}

// ============================================================================
// Updates and the node graph
// ============================================================================

#[test]
fn test_typed_set_rejects_wrong_kind() {
    let mut h = harness();
    let poly = h.controller.create_node(NodeKind::Polygon);
    let geometry = poly.property(ids::GEOMETRY).unwrap();
    let pending = h.controller.pending();

    assert!(matches!(
        h.controller.set(&geometry, 1.0f32),
        Err(GlintError::TypeMismatch {
            property: "geometry",
            ..
        })
    ));
    assert_eq!(h.controller.pending(), pending);
    assert_eq!(geometry.retain_count(), 0);

    h.controller
        .set(&geometry, vec![0.0f32, 0.0, 10.0, 0.0, 5.0, 8.0])
        .unwrap();
    h.engine.tick(0.0);
    let stored = h.engine.graph().value(&geometry).and_then(PropertyValue::as_floats);
    assert_eq!(stored.map(|points| points.len()), Some(6));
}

#[test]
fn test_add_then_remove_child() {
    let mut h = harness();
    let root = h.controller.create_node(NodeKind::Group);
    let child = h.controller.create_node(NodeKind::Rect);
    h.controller.set_root(Some(&root)).unwrap();
    h.engine.tick(0.0);
    let before = child.retain_count();

    h.controller.add_child(&root, &child).unwrap();
    h.engine.tick(0.1);
    assert_eq!(child.retain_count(), before + 1);
    assert_eq!(h.engine.graph().reachable_count(), 2);

    h.controller.remove_child(&root, &child).unwrap();
    h.engine.tick(0.2);
    let children: Vec<_> = h.engine.graph().node(root.id()).unwrap().children().collect();
    assert!(children.is_empty());
    assert_eq!(child.retain_count(), before);
}

#[test]
fn test_cross_context_rejected() {
    let mut first = harness();
    let mut second = harness();
    let group = first.controller.create_node(NodeKind::Group);
    let stranger = second.controller.create_node(NodeKind::Rect);

    assert!(matches!(
        first.controller.add_child(&group, &stranger),
        Err(GlintError::InvalidTarget(_))
    ));
    let x = stranger.property(ids::X).unwrap();
    assert!(matches!(
        first.controller.set(&x, 1.0f32),
        Err(GlintError::InvalidTarget(_))
    ));
    assert!(matches!(
        first
            .controller
            .start_animation(&x, AnimationSpec::new(1.0, Duration::from_secs(1))),
        Err(GlintError::InvalidTarget(_))
    ));
    assert_eq!(stranger.retain_count(), 0);
    assert!(!x.is_animated());

    first.engine.tick(0.0);
    second.engine.tick(0.0);
}

#[test]
fn test_children_only_on_groups() {
    let mut h = harness();
    let rect = h.controller.create_node(NodeKind::Rect);
    let text = h.controller.create_node(NodeKind::Text);
    assert!(matches!(
        h.controller.add_child(&rect, &text),
        Err(GlintError::InvalidTarget(_))
    ));
}

#[test]
fn test_unknown_property_id() {
    // Lenient: skipped with a warning
    let mut h = harness();
    let group = h.controller.create_node(NodeKind::Group);
    h.controller.set_by_id(&group, ids::TEXT, "hi").unwrap();
    let frame = h.engine.tick(0.0);
    assert_eq!(frame.failed, 0);
    assert_eq!(h.controller.dispatch(), 0);

    // Strict: the failure is reported back
    let mut h = harness_with(EngineConfig {
        strict_properties: true,
        ..Default::default()
    });
    let group = h.controller.create_node(NodeKind::Group);
    h.controller.set_by_id(&group, ids::TEXT, "hi").unwrap();
    let frame = h.engine.tick(0.0);
    assert_eq!(frame.failed, 1);
    assert_eq!(h.engine.stats().failed, 1);
    assert_eq!(h.controller.dispatch(), 1);
}

#[test]
fn test_set_callback_after_apply() {
    let mut h = harness();
    let rect = h.controller.create_node(NodeKind::Rect);
    let r = rect.property(ids::R).unwrap();

    let (count, fired) = counter();
    h.controller
        .set_then(&r, 0.25f32, move |result| {
            assert_eq!(result, &Ok(Completion::Applied));
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    h.controller.dispatch();
    assert_eq!(fired(), 0);
    h.engine.tick(0.0);
    h.controller.dispatch();
    assert_eq!(fired(), 1);
}

#[test]
fn test_cancel_pending_update() {
    let mut h = harness();
    let rect = h.controller.create_node(NodeKind::Rect);
    let x = rect.property(ids::X).unwrap();

    let request = h.controller.set(&x, 99.0f32).unwrap();
    assert_eq!(x.retain_count(), 1);
    assert!(h.controller.cancel(request));
    assert_eq!(x.retain_count(), 0);

    h.engine.tick(0.0);
    assert_eq!(h.engine.graph().float(&x), Some(0.0));
    assert!(!h.controller.cancel(request));
}

#[test]
fn test_destroy_reclaims_and_stops_animations() {
    let mut h = harness();
    let root = h.controller.create_node(NodeKind::Group);
    let rect = h.controller.create_node(NodeKind::Rect);
    h.controller.set_root(Some(&root)).unwrap();
    h.controller.add_child(&root, &rect).unwrap();

    let x = rect.property(ids::X).unwrap();
    let anim = h
        .controller
        .start_animation(&x, AnimationSpec::new(1.0, Duration::from_secs(1)).forever())
        .unwrap();
    h.engine.tick(0.0);
    assert_eq!(h.engine.graph().len(), 2);

    h.controller.destroy_node(&rect).unwrap();
    h.engine.tick(0.1);
    // Still a child of the root
    assert!(h.engine.graph().contains(rect.id()));
    assert_eq!(anim.state(), AnimationState::Stopped);
    assert_eq!(x.retain_count(), 0);

    h.controller.remove_child(&root, &rect).unwrap();
    let frame = h.engine.tick(0.2);
    assert_eq!(frame.nodes_reclaimed, 1);
    assert!(!h.engine.graph().contains(rect.id()));
    assert!(!h.controller.registry().contains(rect.id()));
}

#[test]
fn test_animation_on_destroyed_node_rejected() {
    let mut h = harness();
    let rect = h.controller.create_node(NodeKind::Rect);
    let x = rect.property(ids::X).unwrap();
    h.controller.destroy_node(&rect).unwrap();

    let error = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&error);
    let handle = h
        .controller
        .start_animation_then(
            &x,
            AnimationSpec::new(1.0, Duration::from_secs(1)),
            move |result| *slot.lock() = result.clone().err(),
        )
        .unwrap();
    assert!(x.is_animated());
    assert_eq!(x.retain_count(), 1);

    let frame = h.engine.tick(0.0);
    assert_eq!(frame.failed, 1);
    assert_eq!(handle.state(), AnimationState::Stopped);
    assert!(!x.is_animated());
    assert_eq!(x.retain_count(), 0);
    assert!(h.engine.scheduler().is_empty());
    assert!(!h.engine.graph().contains(rect.id()));

    h.controller.dispatch();
    assert!(matches!(
        error.lock().clone(),
        Some(GlintError::InvalidTarget(_))
    ));
}

#[test]
fn test_group_cycle_rejected() {
    let mut h = harness();
    let a = h.controller.create_node(NodeKind::Group);
    let b = h.controller.create_node(NodeKind::Group);
    h.controller.set_root(Some(&a)).unwrap();
    h.controller.add_child(&a, &b).unwrap();
    h.controller.add_child(&b, &a).unwrap();

    let frame = h.engine.tick(0.0);
    assert_eq!(frame.failed, 1);
    assert_eq!(frame.nodes_drawn, 2);
    assert_eq!(h.engine.graph().reachable_count(), 2);
    assert_eq!(a.retain_count(), 1);
    assert_eq!(h.controller.dispatch(), 1);
}

#[test]
fn test_text_refresh_triggers_relayout() {
    let mut h = harness();
    let root = h.controller.create_node(NodeKind::Group);
    let label = h.controller.create_node(NodeKind::Text);
    h.controller.set_root(Some(&root)).unwrap();
    h.controller.add_child(&root, &label).unwrap();
    h.engine.tick(0.0);
    let initial = h.recorder.0.lock().layouts().len();
    assert_eq!(initial, 1);

    // Color: no relayout
    h.controller
        .set(&label.property(ids::G).unwrap(), 0.0f32)
        .unwrap();
    assert_eq!(h.engine.tick(0.1).relayouts, 0);

    h.controller
        .set(&label.property(ids::TEXT).unwrap(), "Hello")
        .unwrap();
    h.controller
        .set(&label.property(ids::FONT_SIZE).unwrap(), 32.0f32)
        .unwrap();
    assert_eq!(h.engine.tick(0.2).relayouts, 1);

    let recorder = h.recorder.0.lock();
    let layout = recorder.layouts().last().unwrap();
    assert_eq!(layout.text, "Hello");
    assert_eq!(layout.font_size, 32.0);
    assert_eq!(recorder.last_frame().map(|items| items.len()), Some(2));
}

// ============================================================================
// Textures
// ============================================================================

#[test]
fn test_texture_load_success() {
    let mut h = harness();
    let handle = TextureHandle::new();
    let pixels = Arc::new(PixelBuffer::solid(8, 4, [255, 0, 0, 255]));

    let (count, fired) = counter();
    h.controller
        .load_texture_then(&handle, TextureSource::Pixels(pixels), move |result| {
            assert!(matches!(result, Ok(Completion::TextureLoaded(_))));
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    assert!(handle.is_loading());

    // Not visible to the controller until dispatch
    h.engine.tick(0.0);
    assert!(handle.texture().is_none());
    h.controller.dispatch();

    let texture = handle.texture().unwrap();
    assert_eq!((texture.width, texture.height), (8, 4));
    assert_eq!(fired(), 1);
    assert_eq!(h.engine.stats().textures_live, 1);

    h.controller.destroy_texture(&handle).unwrap();
    h.engine.tick(0.1);
    assert_eq!(h.engine.stats().textures_live, 0);
    assert!(handle.texture().is_none());
}

#[test]
fn test_texture_load_failure() {
    let mut h = harness();
    h.fail_textures.store(true, Ordering::Release);
    let handle = TextureHandle::new();

    let error = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&error);
    h.controller
        .load_texture_then(
            &handle,
            TextureSource::Pixels(Arc::new(PixelBuffer::solid(1, 1, [0; 4]))),
            move |result| *slot.lock() = result.clone().err(),
        )
        .unwrap();

    h.engine.tick(0.0);
    h.controller.dispatch();
    assert!(matches!(
        error.lock().clone(),
        Some(GlintError::ResourceUnavailable(_))
    ));
    assert!(handle.texture().is_none());
    assert!(!handle.is_loading());

    // The handle can be retried once the backend recovers
    h.fail_textures.store(false, Ordering::Release);
    h.controller
        .load_texture(
            &handle,
            TextureSource::Pixels(Arc::new(PixelBuffer::solid(1, 1, [0; 4]))),
        )
        .unwrap();
    h.engine.tick(0.1);
    h.controller.dispatch();
    assert!(handle.texture().is_some());
}

#[test]
fn test_texture_already_loading() {
    let mut h = harness();
    let handle = TextureHandle::new();
    h.controller
        .load_texture(&handle, TextureSource::Atlas(FONT))
        .unwrap();
    assert_eq!(
        h.controller.load_texture(&handle, TextureSource::Atlas(FONT)),
        Err(GlintError::AlreadyStarted("texture load"))
    );

    h.engine.tick(0.0);
    h.controller.dispatch();
    assert_eq!(
        h.controller.load_texture(&handle, TextureSource::Atlas(FONT)),
        Err(GlintError::AlreadyStarted("texture load"))
    );
}

#[test]
fn test_dropped_image_source() {
    let mut h = harness();
    let handle = TextureHandle::new();
    let image = Arc::new(PixelBuffer::solid(2, 2, [1; 4]));
    h.controller
        .load_texture(&handle, TextureSource::Image(Arc::downgrade(&image)))
        .unwrap();
    drop(image);

    h.engine.tick(0.0);
    assert_eq!(h.controller.dispatch(), 1);
    assert!(handle.texture().is_none());
    assert_eq!(h.engine.stats().textures_live, 0);
}

#[test]
fn test_atlas_shared_between_handles() {
    let mut h = harness();
    let first = TextureHandle::new();
    let second = TextureHandle::new();
    h.controller
        .load_texture(&first, TextureSource::Atlas(FONT))
        .unwrap();
    h.controller
        .load_texture(&second, TextureSource::Atlas(FONT))
        .unwrap();
    h.engine.tick(0.0);
    h.controller.dispatch();

    assert_eq!(first.texture().unwrap().id, second.texture().unwrap().id);
    assert_eq!(h.engine.resources().atlases().ref_count(FONT), 2);
    assert_eq!(h.engine.stats().textures_created, 1);

    h.controller.destroy_texture(&first);
    h.engine.tick(0.1);
    assert_eq!(h.engine.stats().textures_live, 1);

    h.controller.destroy_texture(&second);
    h.engine.tick(0.2);
    assert_eq!(h.engine.stats().textures_live, 0);
}

#[test]
fn test_update_texture_keeps_id() {
    let mut h = harness();
    let handle = TextureHandle::new();
    h.controller
        .load_texture(
            &handle,
            TextureSource::Pixels(Arc::new(PixelBuffer::solid(4, 4, [0; 4]))),
        )
        .unwrap();
    h.engine.tick(0.0);
    h.controller.dispatch();
    let before = handle.texture().unwrap();

    let (count, fired) = counter();
    h.controller
        .update_texture_then(&handle, PixelBuffer::solid(8, 2, [9; 4]), move |result| {
            assert!(matches!(result, Ok(Completion::TextureLoaded(_))));
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    assert_eq!(handle.texture(), Some(before));

    h.engine.tick(0.1);
    h.controller.dispatch();
    let after = handle.texture().unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!((after.width, after.height), (8, 2));
    assert_eq!(fired(), 1);

    let stats = h.engine.stats();
    assert_eq!(stats.textures_created, 1);
    assert_eq!(stats.textures_live, 1);
}

#[test]
fn test_update_texture_rejections() {
    let mut h = harness();
    let pixels = || PixelBuffer::solid(2, 2, [0; 4]);

    // Nothing loaded yet
    let empty = TextureHandle::new();
    assert!(matches!(
        h.controller.update_texture(&empty, pixels()),
        Err(GlintError::InvalidTarget(_))
    ));

    // Load still in flight
    let owned = TextureHandle::new();
    h.controller
        .load_texture(&owned, TextureSource::Pixels(Arc::new(pixels())))
        .unwrap();
    assert_eq!(
        h.controller.update_texture(&owned, pixels()),
        Err(GlintError::AlreadyStarted("texture load"))
    );

    // Shared atlas
    let font = TextureHandle::new();
    h.controller
        .load_texture(&font, TextureSource::Atlas(FONT))
        .unwrap();
    h.engine.tick(0.0);
    h.controller.dispatch();
    assert!(matches!(
        h.controller.update_texture(&font, pixels()),
        Err(GlintError::InvalidTarget(_))
    ));

    // A failed upload leaves the previous texture in place
    let before = owned.texture().unwrap();
    h.fail_textures.store(true, Ordering::Release);
    h.controller
        .update_texture(&owned, PixelBuffer::solid(16, 16, [0; 4]))
        .unwrap();
    h.engine.tick(0.1);
    assert_eq!(h.controller.dispatch(), 1);
    assert_eq!(owned.texture(), Some(before));
}

#[test]
fn test_cancel_pending_texture_load() {
    let mut h = harness();
    let handle = TextureHandle::new();
    let request = h
        .controller
        .load_texture(&handle, TextureSource::Atlas(FONT))
        .unwrap();

    assert!(h.controller.cancel(request));
    assert!(!handle.is_loading());
    h.engine.tick(0.0);
    assert_eq!(h.controller.dispatch(), 0);
    assert_eq!(h.engine.stats().textures_live, 0);
}

// ============================================================================
// Render loop
// ============================================================================

#[test]
fn test_background_loop_drains_requests() {
    let engine = Engine::headless(EngineConfig {
        target_fps: 200,
        ..Default::default()
    });
    let mut controller = engine.controller();
    let mut render_loop = RenderLoop::new(engine);

    let root = controller.create_node(NodeKind::Group);
    controller.set_root(Some(&root)).unwrap();
    let w = root.property(ids::W).unwrap();
    controller.set(&w, 320.0f32).unwrap();

    render_loop.start_background();
    assert!(render_loop.is_running());

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while controller.pending() > 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    render_loop.stop_background();
    assert!(!render_loop.is_running());

    assert_eq!(controller.pending(), 0);
    assert!(render_loop.frames() > 0);
    let width = render_loop.with_engine(|engine| engine.graph().float(&w));
    assert_eq!(width, Some(320.0));
}
