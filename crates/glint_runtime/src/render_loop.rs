//! Background render loop
//!
//! Runs [`Engine::tick`] on a dedicated thread at the configured frame rate
//! until stopped. The engine sits behind a mutex so the owner can still
//! inspect it between frames.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;

use crate::engine::{Engine, EngineStats};

/// Owns the render thread
pub struct RenderLoop {
    engine: Arc<Mutex<Engine>>,
    stop_flag: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
    thread_handle: Option<JoinHandle<()>>,
}

impl RenderLoop {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            frames: Arc::new(AtomicU64::new(0)),
            thread_handle: None,
        }
    }

    /// Start ticking on a background thread (no-op if already running)
    pub fn start_background(&mut self) {
        if self.thread_handle.is_some() {
            return;
        }

        let engine = Arc::clone(&self.engine);
        let stop_flag = Arc::clone(&self.stop_flag);
        let frames = Arc::clone(&self.frames);
        let frame_duration = engine.lock().config().frame_duration();

        self.thread_handle = Some(thread::spawn(move || {
            let clock = Instant::now();
            tracing::debug!("RenderLoop: started, frame budget {:?}", frame_duration);

            while !stop_flag.load(Ordering::Relaxed) {
                let start = Instant::now();

                engine.lock().tick(clock.elapsed().as_secs_f64());
                frames.fetch_add(1, Ordering::Relaxed);

                let elapsed = start.elapsed();
                if elapsed < frame_duration {
                    thread::sleep(frame_duration - elapsed);
                }
            }

            tracing::debug!("RenderLoop: stopped");
        }));
    }

    /// Stop the background thread and wait for it to exit
    pub fn stop_background(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                tracing::error!("RenderLoop: render thread panicked");
            }
        }
        self.stop_flag.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle.is_some()
    }

    /// Frames rendered by the background thread so far
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Run `f` against the engine between frames
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut self.engine.lock())
    }

    pub fn stats(&self) -> EngineStats {
        self.engine.lock().stats()
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.stop_background();
    }
}

impl std::fmt::Debug for RenderLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("running", &self.is_running())
            .field("frames", &self.frames())
            .finish()
    }
}
