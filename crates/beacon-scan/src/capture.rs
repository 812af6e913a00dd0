//! # Capture Module
//!
//! The three acquisition channels behind one "next code" contract.
//!
//! ## Channel Topology
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Acquisition Channels                               │
//! │                                                                         │
//! │  CameraChannel (continuous)                                             │
//! │  ┌───────────────── capture thread ─────────────────┐                  │
//! │  │ pull frame → decode → debounce → try_send ───────┼──┐               │
//! │  │   ▲ bounded rate          drop when consumer busy │  │ capacity-1    │
//! │  │   └── stop flag checked before pull and send      │  │ channel       │
//! │  └───────────────────────────────────────────────────┘  │               │
//! │                                                         ▼               │
//! │  StillImage (one-shot)          ───────────────►  next_code()           │
//! │  WedgeBuffer (scanner/manual)   ───────────────►  (interaction context) │
//! │                                                                         │
//! │  Frames are pulled, not pushed: a frame arriving while a decode is     │
//! │  in flight is simply never read, bounding latency instead of building  │
//! │  backlog.                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::debug;

use beacon_core::code::{normalize, Code};
use beacon_core::types::{DecodeMethod, SourceChannel};

use crate::adapter::DecoderAdapter;
use crate::error::CaptureError;
use crate::frame::Frame;

/// Default pause between camera frame pulls.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Default duplicate-suppression window.
///
/// A barcode held in front of the camera decodes on frame after frame;
/// within this window the repeats are suppressed so one physical
/// presentation dispatches one transaction.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(1500);

// =============================================================================
// Contract Types
// =============================================================================

/// A code acquired by some channel, ready for resolution.
#[derive(Debug, Clone)]
pub struct AcquiredCode {
    pub channel: SourceChannel,
    pub method: DecodeMethod,
    /// Payload as delivered by the channel, before normalization.
    pub raw: String,
    pub code: Code,
    pub acquired_at: DateTime<Utc>,
}

/// Outcome of polling a channel.
#[derive(Debug, Clone)]
pub enum NextCode {
    /// A code was acquired.
    Code(AcquiredCode),
    /// Nothing yet; poll again (continuous channels only).
    Pending,
}

/// The one contract every acquisition channel satisfies.
pub trait CodeSource {
    /// Non-blocking poll for the next acquired code.
    fn next_code(&mut self) -> Result<NextCode, CaptureError>;
}

/// Hardware seam for frame producers.
///
/// The real implementation wraps a camera driver; tests feed synthetic
/// frames. `next_frame` may block on hardware I/O — it always runs on the
/// capture thread, never on the interaction context.
pub trait FrameSource: Send + 'static {
    fn next_frame(&mut self) -> Result<Frame, CaptureError>;
}

// =============================================================================
// Debouncer
// =============================================================================

/// Suppresses repeats of the same code inside a sliding window.
///
/// The window restarts on every sighting, so a label continuously in view
/// dispatches exactly once no matter how long it is held; it becomes
/// admissible again only after being out of sight for a full window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last: Option<(Code, Instant)>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer { window, last: None }
    }

    /// Returns true when the code should be emitted.
    pub fn admit(&mut self, code: &Code, now: Instant) -> bool {
        if let Some((last_code, seen_at)) = &mut self.last {
            if last_code == code && now.duration_since(*seen_at) < self.window {
                *seen_at = now;
                return false;
            }
        }
        self.last = Some((code.clone(), now));
        true
    }
}

// =============================================================================
// Camera Channel
// =============================================================================

/// Camera channel configuration.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Pause between frame pulls (bounds CPU and decode rate).
    pub frame_interval: Duration,
    /// Duplicate-suppression window.
    pub debounce_window: Duration,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            frame_interval: DEFAULT_FRAME_INTERVAL,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
        }
    }
}

/// Continuous capture channel: a dedicated thread pulls frames, decodes,
/// debounces, and hands results across a capacity-1 channel.
pub struct CameraChannel {
    rx: mpsc::Receiver<Result<AcquiredCode, CaptureError>>,
    stop: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl CameraChannel {
    /// Starts the capture thread.
    ///
    /// ## Errors
    /// `CaptureError::Unavailable` when the OS refuses a thread — the same
    /// operator-facing downgrade path as a missing camera.
    pub fn start(
        source: impl FrameSource,
        adapter: Arc<DecoderAdapter>,
        config: CameraConfig,
    ) -> Result<Self, CaptureError> {
        let (tx, rx) = mpsc::channel(1);
        let stop = Arc::new(AtomicBool::new(false));

        let worker_stop = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name("beacon-camera".to_string())
            .spawn(move || run_capture_loop(source, adapter, tx, worker_stop, config))
            .map_err(|e| CaptureError::Unavailable {
                reason: format!("cannot start capture thread: {}", e),
            })?;

        Ok(CameraChannel {
            rx,
            stop,
            worker: Some(worker),
        })
    }

    /// Stops the channel: frame pulls halt at the next loop check, the
    /// frame source (and with it the camera handle) is dropped, and any
    /// decode still in flight has its result discarded.
    ///
    /// Blocks until the capture thread exits — at most one frame interval
    /// plus one decode.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for CameraChannel {
    fn drop(&mut self) {
        // Signal only; joining in drop could stall an unwinding thread.
        self.stop.store(true, Ordering::Release);
    }
}

impl CodeSource for CameraChannel {
    fn next_code(&mut self) -> Result<NextCode, CaptureError> {
        match self.rx.try_recv() {
            Ok(Ok(acquired)) => Ok(NextCode::Code(acquired)),
            Ok(Err(err)) => Err(err),
            Err(TryRecvError::Empty) => Ok(NextCode::Pending),
            Err(TryRecvError::Disconnected) => Err(CaptureError::ChannelClosed),
        }
    }
}

/// The capture thread body.
fn run_capture_loop(
    mut source: impl FrameSource,
    adapter: Arc<DecoderAdapter>,
    tx: mpsc::Sender<Result<AcquiredCode, CaptureError>>,
    stop: Arc<AtomicBool>,
    config: CameraConfig,
) {
    let mut debouncer = Debouncer::new(config.debounce_window);

    while !stop.load(Ordering::Acquire) {
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(err) => {
                // Device failure ends the channel; the interaction surface
                // downgrades to manual entry.
                if !stop.load(Ordering::Acquire) {
                    let _ = tx.try_send(Err(err));
                }
                break;
            }
        };

        match adapter.decode(&frame) {
            Ok(decoded) => {
                // A decode finishing after stop() is discarded.
                if stop.load(Ordering::Acquire) {
                    break;
                }
                if debouncer.admit(&decoded.code, Instant::now()) {
                    let acquired = AcquiredCode {
                        channel: SourceChannel::Camera,
                        method: decoded.method,
                        raw: decoded.code.as_str().to_string(),
                        code: decoded.code,
                        acquired_at: Utc::now(),
                    };
                    // Single-slot handoff: while the consumer holds the
                    // previous result, new ones are dropped, not queued.
                    if tx.try_send(Ok(acquired)).is_err() {
                        debug!("camera: consumer busy, decode result dropped");
                    }
                } else {
                    debug!("camera: duplicate code suppressed by debounce");
                }
            }
            // Per-frame decode misses resolve themselves on the next frame.
            Err(err) => {
                debug!(error = %err, "camera: frame not decoded");
            }
        }

        thread::sleep(config.frame_interval);
    }
    // `source` drops here, releasing the camera handle.
}

// =============================================================================
// Still Image Channel
// =============================================================================

/// One-shot decode of a loaded image. No debounce: a deliberate upload is
/// a deliberate scan.
pub struct StillImage {
    result: Option<Result<AcquiredCode, CaptureError>>,
}

impl StillImage {
    /// Decodes the frame immediately; the result is delivered on the first
    /// `next_code` poll.
    pub fn from_frame(adapter: &DecoderAdapter, frame: &Frame) -> Self {
        let result = adapter
            .decode(frame)
            .map(|decoded| AcquiredCode {
                channel: SourceChannel::Image,
                method: decoded.method,
                raw: decoded.code.as_str().to_string(),
                code: decoded.code,
                acquired_at: Utc::now(),
            })
            .map_err(CaptureError::from);

        StillImage {
            result: Some(result),
        }
    }

    /// Loads a PGM file and decodes it.
    pub fn load_pgm(
        adapter: &DecoderAdapter,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, CaptureError> {
        let frame = Frame::load_pgm(path).map_err(|e| CaptureError::Unavailable {
            reason: format!("cannot load image: {}", e),
        })?;
        Ok(StillImage::from_frame(adapter, &frame))
    }
}

impl CodeSource for StillImage {
    fn next_code(&mut self) -> Result<NextCode, CaptureError> {
        match self.result.take() {
            Some(Ok(acquired)) => Ok(NextCode::Code(acquired)),
            Some(Err(err)) => Err(err),
            None => Err(CaptureError::ChannelClosed),
        }
    }
}

// =============================================================================
// Wedge Buffer (External Scanner / Manual Entry)
// =============================================================================

/// Accumulates keystroke text until a line terminator, then routes the
/// burst straight to the normalizer — no image decoding involved.
///
/// USB wedge scanners emulate a keyboard and finish each scan with CR
/// (often CR+LF); manual entry finishes with Enter. Both land here.
#[derive(Debug)]
pub struct WedgeBuffer {
    channel: SourceChannel,
    buffer: String,
    ready: VecDeque<String>,
}

impl WedgeBuffer {
    /// Buffer for an external USB scanner.
    pub fn scanner() -> Self {
        WedgeBuffer {
            channel: SourceChannel::Scanner,
            buffer: String::new(),
            ready: VecDeque::new(),
        }
    }

    /// Buffer for operator-typed input.
    pub fn manual() -> Self {
        WedgeBuffer {
            channel: SourceChannel::Manual,
            buffer: String::new(),
            ready: VecDeque::new(),
        }
    }

    /// Feeds one keystroke.
    pub fn push(&mut self, c: char) {
        if c == '\n' || c == '\r' {
            // CR+LF delivers two terminators; the second sees an empty
            // buffer and is ignored.
            if !self.buffer.is_empty() {
                self.ready.push_back(std::mem::take(&mut self.buffer));
            }
        } else {
            self.buffer.push(c);
        }
    }

    /// Feeds a whole burst (scanners deliver faster than per-key events).
    pub fn push_str(&mut self, text: &str) {
        for c in text.chars() {
            self.push(c);
        }
    }
}

impl CodeSource for WedgeBuffer {
    fn next_code(&mut self) -> Result<NextCode, CaptureError> {
        let Some(burst) = self.ready.pop_front() else {
            return Ok(NextCode::Pending);
        };

        match normalize(&burst) {
            Ok(code) => Ok(NextCode::Code(AcquiredCode {
                channel: self.channel,
                method: DecodeMethod::Manual,
                raw: burst,
                code,
                acquired_at: Utc::now(),
            })),
            Err(err) => Err(CaptureError::Malformed {
                raw: burst,
                reason: err.to_string(),
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
