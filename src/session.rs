//! Recognition session: one worker thread drives either the live camera loop
//! or the simulation fallback and hands admitted gestures to a bounded queue.

use crate::capture::FrameSource;
use crate::config::{ConfigError, DetectionConfig};
use crate::gate::{GestureCounts, TemporalGate};
use crate::gesture::{Gesture, GestureEvent};
use crate::recognizer::{Detection, GestureRecognizer};
use crate::simulation::{GestureSampler, RandomSampler};
use image::RgbImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Pause after an unreadable frame before trying the next one
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Cloneable stop flag that sleeping loops can wait on
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_requested(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for up to `timeout`, waking early on a stop request.
    /// Returns whether stop has been requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// Consumer of every processed frame, e.g. a preview display
///
/// Called from the session worker after classification, with the frame's
/// detection and the gesture emitted for it, if any.
pub trait FrameObserver: Send {
    fn observe(&mut self, frame: &RgbImage, detection: Option<&Detection>, emitted: Option<Gesture>);
}

pub struct SessionOptions {
    pub queue_capacity: usize,
    /// Skip the frame source entirely and run the simulation fallback
    pub force_simulation: bool,
    pub sampler: Box<dyn GestureSampler>,
    pub observer: Option<Box<dyn FrameObserver>>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            force_simulation: false,
            sampler: Box::new(RandomSampler::from_os_rng()),
            observer: None,
        }
    }
}

struct Shared {
    gate: Mutex<TemporalGate>,
    simulated: AtomicBool,
    stop: StopSignal,
}

impl Shared {
    fn gate(&self) -> MutexGuard<'_, TemporalGate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Query side of a running session, shareable across threads
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<Shared>,
}

impl SessionHandle {
    pub fn counts(&self) -> GestureCounts {
        self.shared.gate().counts().clone()
    }

    pub fn count(&self, gesture: Gesture) -> u32 {
        self.shared.gate().count(gesture)
    }

    pub fn last_gesture(&self) -> Option<Gesture> {
        self.shared.gate().last_gesture()
    }

    pub fn is_simulated(&self) -> bool {
        self.shared.simulated.load(Ordering::SeqCst)
    }

    /// Zero the per-gesture counters without touching the cooldown clock
    pub fn reset_counts(&self) {
        self.shared.gate().reset_counts();
        tracing::info!("Gesture statistics reset");
    }

    pub fn request_stop(&self) {
        self.shared.stop.request();
    }
}

/// A running recognition session
///
/// Dropping the session stops the worker and releases the frame source.
pub struct Session {
    handle: SessionHandle,
    events: Receiver<GestureEvent>,
    worker: Option<JoinHandle<()>>,
}

impl Session {
    /// Start recognising gestures
    ///
    /// `open_source` runs on the worker thread. If it fails the session
    /// switches to the simulation fallback instead of ending.
    pub fn start<F>(
        config: &DetectionConfig,
        open_source: F,
        options: SessionOptions,
    ) -> Result<Self, ConfigError>
    where
        F: FnOnce() -> anyhow::Result<Box<dyn FrameSource>> + Send + 'static,
    {
        let recognizer = GestureRecognizer::new(config)?;
        let shared = Arc::new(Shared {
            gate: Mutex::new(TemporalGate::new(config.cooldown)),
            simulated: AtomicBool::new(false),
            stop: StopSignal::new(),
        });
        let (tx, events) = mpsc::sync_channel(options.queue_capacity.max(1));

        tracing::info!(
            "Starting gesture session (cooldown {:?}, queue {})",
            config.cooldown,
            options.queue_capacity.max(1)
        );

        let worker = Worker {
            recognizer,
            emitter: Emitter {
                shared: Arc::clone(&shared),
                tx,
            },
            sampler: options.sampler,
            observer: options.observer,
            period: config.simulation_period,
        };
        let force_simulation = options.force_simulation;
        let join = thread::spawn(move || worker.run(open_source, force_simulation));

        Ok(Self {
            handle: SessionHandle { shared },
            events,
            worker: Some(join),
        })
    }

    /// Admitted gestures in emission order. Disconnects when the worker ends.
    pub fn events(&self) -> &Receiver<GestureEvent> {
        &self.events
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn counts(&self) -> GestureCounts {
        self.handle.counts()
    }

    pub fn count(&self, gesture: Gesture) -> u32 {
        self.handle.count(gesture)
    }

    pub fn is_simulated(&self) -> bool {
        self.handle.is_simulated()
    }

    pub fn reset_counts(&self) {
        self.handle.reset_counts()
    }

    /// Stop the worker, wait for it to release its resources, and return
    /// the final counts
    pub fn stop(mut self) -> GestureCounts {
        self.shutdown();
        self.handle.counts()
    }

    fn shutdown(&mut self) {
        self.handle.request_stop();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Gesture session worker panicked");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Gate + queue hand-off shared by the live and simulated loops
struct Emitter {
    shared: Arc<Shared>,
    tx: SyncSender<GestureEvent>,
}

impl Emitter {
    /// Returns the gesture if the gate admitted it
    fn submit(&self, gesture: Gesture, origin: &str) -> Option<Gesture> {
        if self.shared.stop.is_requested() {
            return None;
        }

        let now = Instant::now();
        let count = {
            let mut gate = self.shared.gate();
            if !gate.admit(gesture, now) {
                return None;
            }
            gate.count(gesture)
        };

        tracing::info!("{} gesture: {} (count: {})", origin, gesture, count);

        match self.tx.try_send(GestureEvent {
            gesture,
            emitted_at: now,
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!("Event queue full, dropping {}", event.gesture);
            }
            Err(TrySendError::Disconnected(event)) => {
                tracing::debug!("No event consumer, {} not delivered", event.gesture);
            }
        }
        Some(gesture)
    }
}

struct Worker {
    recognizer: GestureRecognizer,
    emitter: Emitter,
    sampler: Box<dyn GestureSampler>,
    observer: Option<Box<dyn FrameObserver>>,
    period: Duration,
}

impl Worker {
    fn run<F>(mut self, open_source: F, force_simulation: bool)
    where
        F: FnOnce() -> anyhow::Result<Box<dyn FrameSource>>,
    {
        if force_simulation {
            tracing::info!("Simulation requested, not opening a frame source");
            self.simulate();
            return;
        }

        match open_source() {
            Ok(source) => self.run_live(source),
            Err(err) => {
                tracing::warn!("Failed to initialize frame source: {:#}", err);
                tracing::warn!("Falling back to simulation mode");
                self.simulate();
            }
        }
    }

    fn stop(&self) -> &StopSignal {
        &self.emitter.shared.stop
    }

    fn run_live(&mut self, mut source: Box<dyn FrameSource>) {
        let (width, height) = source.resolution();
        tracing::info!("Running live gesture detection at {}x{}", width, height);

        let mut frame_count = 0u64;
        let mut detection_count = 0u64;

        while !self.stop().is_requested() {
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("Frame source ended");
                    break;
                }
                Err(err) => {
                    tracing::warn!("Failed to read frame: {:#}", err);
                    if self.stop().wait_timeout(READ_ERROR_BACKOFF) {
                        break;
                    }
                    continue;
                }
            };

            if frame.width() == 0 || frame.height() == 0 {
                tracing::warn!("Skipping empty frame");
                continue;
            }
            frame_count += 1;

            let detection = self.recognizer.detect(&frame);
            if detection.is_some() {
                detection_count += 1;
            }
            let emitted = detection
                .as_ref()
                .and_then(|d| self.emitter.submit(d.gesture, "Detected"));

            if let Some(observer) = self.observer.as_mut() {
                observer.observe(&frame, detection.as_ref(), emitted);
            }

            if frame_count % 300 == 0 {
                tracing::debug!(
                    "Processed {} frames, {} with a hand",
                    frame_count,
                    detection_count
                );
            }
        }

        drop(source);
        tracing::info!(
            "Live detection stopped after {} frames ({} with a hand)",
            frame_count,
            detection_count
        );
    }

    fn simulate(&mut self) {
        self.emitter.shared.simulated.store(true, Ordering::SeqCst);
        tracing::info!(
            "Running in simulation mode, one gesture every {:?}",
            self.period
        );

        while !self.stop().wait_timeout(self.period) {
            let gesture = self.sampler.sample();
            self.emitter.submit(gesture, "Simulated");
        }

        tracing::info!("Simulation stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_signal_wakes_waiter() {
        let stop = StopSignal::new();
        let waiter = stop.clone();
        let started = Instant::now();
        let join = thread::spawn(move || waiter.wait_timeout(Duration::from_secs(10)));
        thread::sleep(Duration::from_millis(20));
        stop.request();
        assert!(join.join().unwrap());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_stop_signal_times_out() {
        let stop = StopSignal::new();
        assert!(!stop.wait_timeout(Duration::from_millis(5)));
        assert!(!stop.is_requested());
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let shared = Arc::new(Shared {
            gate: Mutex::new(TemporalGate::new(Duration::ZERO)),
            simulated: AtomicBool::new(false),
            stop: StopSignal::new(),
        });
        let (tx, rx) = mpsc::sync_channel(1);
        let emitter = Emitter {
            shared: Arc::clone(&shared),
            tx,
        };

        assert_eq!(emitter.submit(Gesture::OpenPalm, "Test"), Some(Gesture::OpenPalm));
        thread::sleep(Duration::from_millis(2));
        assert_eq!(emitter.submit(Gesture::OkSign, "Test"), Some(Gesture::OkSign));

        assert_eq!(rx.try_recv().unwrap().gesture, Gesture::OpenPalm);
        assert!(rx.try_recv().is_err());
        assert_eq!(shared.gate().count(Gesture::OkSign), 1);
    }

    #[test]
    fn test_nothing_admitted_after_stop() {
        let shared = Arc::new(Shared {
            gate: Mutex::new(TemporalGate::new(Duration::ZERO)),
            simulated: AtomicBool::new(false),
            stop: StopSignal::new(),
        });
        let (tx, rx) = mpsc::sync_channel(4);
        let emitter = Emitter {
            shared: Arc::clone(&shared),
            tx,
        };
        shared.stop.request();
        assert_eq!(emitter.submit(Gesture::OpenPalm, "Test"), None);
        assert!(rx.try_recv().is_err());
        assert!(shared.gate().counts().is_empty());
    }
}
