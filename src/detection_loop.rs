//! Cancellable per-frame detection loop.
//!
//! One worker thread owns the `Pipeline` and the `FrameSource`. Iterations are
//! strictly serialized: a frame is fully detected, scored and smoothed before
//! the next one is pulled from the source. Control requests (stop, pause, reset)
//! are flags the worker reads between iterations.
//!
//! Publishing and stopping take the same snapshot lock, so once `stop` has
//! returned no further metrics are written or sent, even when a frame was in
//! flight at the time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::error::PipelineError;
use crate::ingest::FrameSource;
use crate::metrics::MetricsVector;
use crate::pipeline::Pipeline;

const DEFAULT_TARGET_FPS: u32 = 30;
const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct LoopConfig {
    /// Iteration rate. Stands in for the display refresh callback.
    pub target_fps: u32,
    /// How often loop stats are logged at debug level.
    pub stats_interval: Duration,
    /// Stop by itself after this many published frames.
    pub max_frames: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            stats_interval: DEFAULT_STATS_INTERVAL,
            max_frames: None,
        }
    }
}

impl LoopConfig {
    fn tick(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.target_fps.max(1) as u64)
    }
}

/// One published snapshot.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsUpdate {
    /// Starts at 1 and increases by one per published frame.
    pub sequence: u64,
    pub metrics: MetricsVector,
    pub timestamp: SystemTime,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Paused,
    Stopped,
    /// Terminal. Carries the fatal error message.
    Failed(String),
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Stopped | LoopState::Failed(_))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames_processed: u64,
    pub frames_published: u64,
    pub failed_detections: u64,
    pub source_errors: u64,
    /// Frames that finished after stop was requested.
    pub frames_discarded: u64,
    pub resets: u64,
}

struct Shared {
    shutdown: AtomicBool,
    paused: AtomicBool,
    reset_requested: AtomicBool,
    snapshot: RwLock<MetricsVector>,
    state: Mutex<LoopState>,
    stats: Mutex<LoopStats>,
}

impl Shared {
    fn set_state(&self, state: LoopState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn update_stats(&self, f: impl FnOnce(&mut LoopStats)) {
        f(&mut self.stats.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

pub struct DetectionLoop {
    pipeline: Pipeline,
    source: Box<dyn FrameSource>,
    config: LoopConfig,
    updates: Option<Sender<MetricsUpdate>>,
}

impl DetectionLoop {
    pub fn new(pipeline: Pipeline, source: Box<dyn FrameSource>, config: LoopConfig) -> Self {
        Self {
            pipeline,
            source,
            config,
            updates: None,
        }
    }

    /// Also send every published snapshot to `tx`.
    pub fn with_updates(mut self, tx: Sender<MetricsUpdate>) -> Self {
        self.updates = Some(tx);
        self
    }

    /// Connect the source and start the worker thread.
    pub fn spawn(mut self) -> Result<LoopHandle> {
        if self.config.target_fps == 0 {
            return Err(anyhow!("target_fps must be greater than zero"));
        }
        self.source.connect()?;

        let shared = Arc::new(Shared {
            shutdown: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            reset_requested: AtomicBool::new(false),
            snapshot: RwLock::new(*self.pipeline.metrics()),
            state: Mutex::new(LoopState::Running),
            stats: Mutex::new(LoopStats::default()),
        });
        let shared_thread = shared.clone();
        let join = thread::Builder::new()
            .name("detection-loop".to_string())
            .spawn(move || self.run(&shared_thread))?;

        log::info!("detection loop started");
        Ok(LoopHandle {
            shared,
            join: Some(join),
        })
    }

    fn run(mut self, shared: &Shared) {
        let tick = self.config.tick();
        let mut sequence = 0u64;
        let mut last_stats_log = Instant::now();

        loop {
            if shared.shutdown.load(Ordering::SeqCst) {
                break;
            }
            let started = Instant::now();

            if shared.reset_requested.swap(false, Ordering::SeqCst) {
                self.pipeline.reset_metrics();
                shared.update_stats(|s| s.resets += 1);
                log::info!("metrics reset");
                if !self.publish(shared, &mut sequence) {
                    break;
                }
            }

            if shared.paused.load(Ordering::SeqCst) {
                thread::park_timeout(tick);
                continue;
            }

            let frame = match self.source.next_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("{}", PipelineError::source(format!("{:#}", e)));
                    shared.update_stats(|s| s.source_errors += 1);
                    thread::park_timeout(tick);
                    continue;
                }
            };

            if let Err(e) = self.pipeline.process_frame(&frame) {
                log::error!("detection loop failed: {}", e);
                shared.set_state(LoopState::Failed(e.to_string()));
                return;
            }
            drop(frame);

            let pipeline_stats = self.pipeline.stats();
            shared.update_stats(|s| {
                s.frames_processed = pipeline_stats.frames_processed;
                s.failed_detections = pipeline_stats.failed_detections;
            });

            if !self.publish(shared, &mut sequence) {
                shared.update_stats(|s| s.frames_discarded += 1);
                break;
            }

            if last_stats_log.elapsed() >= self.config.stats_interval {
                let stats = *shared.stats.lock().unwrap_or_else(PoisonError::into_inner);
                log::debug!(
                    "loop stats: processed={} published={} failed_detections={} source_errors={} source_frames={}",
                    stats.frames_processed,
                    stats.frames_published,
                    stats.failed_detections,
                    stats.source_errors,
                    self.source.stats().frames_captured
                );
                last_stats_log = Instant::now();
            }

            if self.config.max_frames.is_some_and(|max| sequence >= max) {
                log::info!("detection loop reached {} frames", sequence);
                break;
            }

            thread::park_timeout(tick.saturating_sub(started.elapsed()));
        }

        shared.set_state(LoopState::Stopped);
        log::info!("detection loop stopped");
    }

    /// Write the current smoothed metrics to the snapshot and the update
    /// channel. Returns false, publishing nothing, once shutdown is set.
    fn publish(&mut self, shared: &Shared, sequence: &mut u64) -> bool {
        let mut snapshot = shared
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if shared.shutdown.load(Ordering::SeqCst) {
            return false;
        }
        let metrics = *self.pipeline.metrics();
        *snapshot = metrics;
        *sequence += 1;

        if let Some(tx) = &self.updates {
            let update = MetricsUpdate {
                sequence: *sequence,
                metrics,
                timestamp: SystemTime::now(),
            };
            if tx.send(update).is_err() {
                log::debug!("metrics receiver dropped; no longer sending updates");
                self.updates = None;
            }
        }
        shared.update_stats(|s| s.frames_published += 1);
        true
    }
}

/// Control handle for a running `DetectionLoop`. Dropping it stops the loop.
pub struct LoopHandle {
    shared: Arc<Shared>,
    join: Option<JoinHandle<()>>,
}

impl LoopHandle {
    /// Stop the loop and wait for the worker to exit. A frame in flight is
    /// finished but its metrics are discarded.
    pub fn stop(mut self) -> Result<()> {
        self.signal_shutdown();
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("detection loop thread panicked"))?;
        }
        Ok(())
    }

    /// Skip iterations until `resume`. The snapshot keeps its last value.
    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::SeqCst);
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *state == LoopState::Running {
            *state = LoopState::Paused;
        }
    }

    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::SeqCst);
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *state == LoopState::Paused {
            *state = LoopState::Running;
        }
        drop(state);
        self.wake();
    }

    /// Queue a metrics reset. It is applied between two iterations.
    pub fn request_reset(&self) -> crate::error::Result<()> {
        if self.state().is_terminal() {
            return Err(PipelineError::LoopStopped);
        }
        self.shared.reset_requested.store(true, Ordering::SeqCst);
        self.wake();
        Ok(())
    }

    /// Latest published snapshot.
    pub fn metrics(&self) -> MetricsVector {
        *self
            .shared
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> LoopState {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stats(&self) -> LoopStats {
        *self
            .shared
            .stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// True once the worker thread has exited (stopped or failed).
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    fn signal_shutdown(&self) {
        // Held across the store so an in-flight publish either completes first
        // or sees the flag.
        let guard = self
            .shared
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.shared.shutdown.store(true, Ordering::SeqCst);
        drop(guard);
        self.wake();
    }

    fn wake(&self) {
        if let Some(join) = &self.join {
            join.thread().unpark();
        }
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.signal_shutdown();
            if let Some(join) = self.join.take() {
                let _ = join.join();
            }
        }
    }
}
