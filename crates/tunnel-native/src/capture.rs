//! Frame capture: throttled sampling of rendered frames, a bounded hand-off
//! to an encoder thread, and the GIF / PNG-sequence sinks it writes to.
//!
//! Nothing here touches engine state. A full queue drops the frame instead of
//! blocking the render loop, and encoder failures surface only when the
//! finished capture is joined.

use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::png::PngEncoder;
use image::{Delay, ExtendedColorType, Frame, ImageEncoder, RgbaImage};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const CAPTURE_FPS: u32 = 30;
const QUEUE_DEPTH: usize = 8;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("surface cannot be read back (no COPY_SRC or unsupported format)")]
    ReadbackUnsupported,
    #[error("frame of {got} bytes does not match {width}x{height} RGBA ({expected} bytes)")]
    BadFrameSize {
        width: u32,
        height: u32,
        expected: usize,
        got: usize,
    },
    #[error("mapped frame too small: expected at least {expected} bytes, got {got}")]
    ShortReadback { expected: usize, got: usize },
    #[error("GPU buffer mapping failed: {0}")]
    Map(String),
    #[error("capture i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encoding: {0}")]
    Image(#[from] image::ImageError),
    #[error("encoder thread panicked")]
    WorkerPanicked,
}

/// Tightly packed RGBA8 pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl CapturedFrame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(CaptureError::BadFrameSize {
                width,
                height,
                expected,
                got: rgba.len(),
            });
        }
        Ok(Self { width, height, rgba })
    }
}

/// Per-frame delay for a given capture rate, rounded to whole milliseconds.
pub fn frame_delay_ms(fps: u32) -> u32 {
    (1000.0 / fps.max(1) as f64).round() as u32
}

pub fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

/// Strip the per-row padding wgpu requires on buffer copies.
pub fn copy_tight_rows(
    mapped: &[u8],
    unpadded_bytes_per_row: u32,
    padded_bytes_per_row: u32,
    height: u32,
) -> Result<Vec<u8>, CaptureError> {
    let required_len = padded_bytes_per_row as usize * height as usize;
    if mapped.len() < required_len {
        return Err(CaptureError::ShortReadback {
            expected: required_len,
            got: mapped.len(),
        });
    }

    let mut frame = vec![0_u8; unpadded_bytes_per_row as usize * height as usize];
    for row_index in 0..height as usize {
        let src_start = row_index * padded_bytes_per_row as usize;
        let src_end = src_start + unpadded_bytes_per_row as usize;
        let dst_start = row_index * unpadded_bytes_per_row as usize;
        let dst_end = dst_start + unpadded_bytes_per_row as usize;
        frame[dst_start..dst_end].copy_from_slice(&mapped[src_start..src_end]);
    }
    Ok(frame)
}

/// In-place BGRA8 -> RGBA8.
pub fn bgra_to_rgba(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

/// Destination for captured frames; lives on the encoder thread.
pub trait FrameSink: Send {
    fn push(&mut self, frame: &CapturedFrame) -> Result<(), CaptureError>;
    /// Flush and close, returning where the output was written.
    fn finish(self: Box<Self>) -> Result<PathBuf, CaptureError>;
}

type WriteFailure = Arc<Mutex<Option<io::Error>>>;

/// File handle that keeps the first write error it sees.
///
/// The GIF encoder writes its trailer, and the `BufWriter` its last bytes,
/// while being dropped, where errors are swallowed. Recording them here lets
/// `finish` still report a capture that never reached the disk.
struct RecordingFile {
    file: File,
    failure: WriteFailure,
}

impl RecordingFile {
    fn record(&self, err: &io::Error) {
        if let Ok(mut slot) = self.failure.lock() {
            slot.get_or_insert_with(|| io::Error::new(err.kind(), err.to_string()));
        }
    }
}

impl Write for RecordingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf).map_err(|err| {
            self.record(&err);
            err
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush().map_err(|err| {
            self.record(&err);
            err
        })
    }
}

/// Animated, endlessly looping GIF.
pub struct GifSink {
    path: PathBuf,
    encoder: GifEncoder<BufWriter<RecordingFile>>,
    failure: WriteFailure,
    delay: Delay,
}

impl GifSink {
    pub fn create(path: impl Into<PathBuf>, fps: u32) -> Result<Self, CaptureError> {
        let path = path.into();
        let failure = WriteFailure::default();
        let file = RecordingFile {
            file: File::create(&path)?,
            failure: Arc::clone(&failure),
        };
        let mut encoder = GifEncoder::new(BufWriter::new(file));
        encoder.set_repeat(Repeat::Infinite)?;
        Ok(Self {
            path,
            encoder,
            failure,
            delay: Delay::from_numer_denom_ms(frame_delay_ms(fps), 1),
        })
    }
}

impl FrameSink for GifSink {
    fn push(&mut self, frame: &CapturedFrame) -> Result<(), CaptureError> {
        let image = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone()).ok_or(
            CaptureError::BadFrameSize {
                width: frame.width,
                height: frame.height,
                expected: frame.width as usize * frame.height as usize * 4,
                got: frame.rgba.len(),
            },
        )?;
        self.encoder
            .encode_frame(Frame::from_parts(image, 0, 0, self.delay))?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<PathBuf, CaptureError> {
        let GifSink {
            path,
            encoder,
            failure,
            ..
        } = *self;
        // trailer and buffered bytes go out here
        drop(encoder);
        let failed = failure.lock().ok().and_then(|mut slot| slot.take());
        match failed {
            Some(err) => Err(err.into()),
            None => Ok(path),
        }
    }
}

/// Numbered lossless frames in a directory.
pub struct PngSequenceSink {
    dir: PathBuf,
    next_index: usize,
}

impl PngSequenceSink {
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, next_index: 0 })
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{index:05}.png"))
    }
}

impl FrameSink for PngSequenceSink {
    fn push(&mut self, frame: &CapturedFrame) -> Result<(), CaptureError> {
        let file = File::create(self.frame_path(self.next_index))?;
        PngEncoder::new(BufWriter::new(file)).write_image(
            &frame.rgba,
            frame.width,
            frame.height,
            ExtendedColorType::Rgba8,
        )?;
        self.next_index += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<PathBuf, CaptureError> {
        Ok(self.dir)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CaptureFormat {
    #[default]
    Gif,
    PngSequence,
}

impl CaptureFormat {
    pub fn next(self) -> Self {
        match self {
            CaptureFormat::Gif => CaptureFormat::PngSequence,
            CaptureFormat::PngSequence => CaptureFormat::Gif,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CaptureFormat::Gif => "gif",
            CaptureFormat::PngSequence => "png sequence",
        }
    }

    /// Open a sink under `out_dir`, named after the current time.
    pub fn open_sink(self, out_dir: &Path, fps: u32) -> Result<Box<dyn FrameSink>, CaptureError> {
        fs::create_dir_all(out_dir)?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Ok(match self {
            CaptureFormat::Gif => Box::new(GifSink::create(
                out_dir.join(format!("tunnel-{stamp}.gif")),
                fps,
            )?),
            CaptureFormat::PngSequence => {
                Box::new(PngSequenceSink::create(out_dir.join(format!("tunnel-{stamp}")))?)
            }
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaptureSummary {
    pub path: PathBuf,
    pub frames: usize,
    pub dropped: usize,
}

/// A stopped capture whose encoder may still be flushing.
pub struct CaptureHandle {
    worker: JoinHandle<Result<(PathBuf, usize), CaptureError>>,
    dropped: usize,
}

impl CaptureHandle {
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    pub fn join(self) -> Result<CaptureSummary, CaptureError> {
        let (path, frames) = self
            .worker
            .join()
            .map_err(|_| CaptureError::WorkerPanicked)??;
        Ok(CaptureSummary {
            path,
            frames,
            dropped: self.dropped,
        })
    }
}

struct Session {
    tx: SyncSender<CapturedFrame>,
    worker: JoinHandle<Result<(PathBuf, usize), CaptureError>>,
    sent: usize,
    dropped: usize,
    started: Instant,
}

fn run_encoder(
    rx: Receiver<CapturedFrame>,
    mut sink: Box<dyn FrameSink>,
) -> Result<(PathBuf, usize), CaptureError> {
    let mut frames = 0;
    for frame in rx {
        sink.push(&frame)?;
        frames += 1;
    }
    Ok((sink.finish()?, frames))
}

/// Start/stop state machine plus the sampling throttle.
pub struct Recorder {
    interval: Duration,
    queue_depth: usize,
    last_sample: Option<Instant>,
    session: Option<Session>,
}

impl Recorder {
    pub fn new(fps: u32) -> Self {
        Self::with_queue_depth(fps, QUEUE_DEPTH)
    }

    pub fn with_queue_depth(fps: u32, queue_depth: usize) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            queue_depth: queue_depth.max(1),
            last_sample: None,
            session: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn frames_sent(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.sent)
    }

    pub fn frames_dropped(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.dropped)
    }

    /// Begin recording into `sink`. Returns `Ok(false)` without touching the
    /// running session if one is already active.
    pub fn start(&mut self, sink: Box<dyn FrameSink>) -> Result<bool, CaptureError> {
        if self.session.is_some() {
            return Ok(false);
        }
        let (tx, rx) = mpsc::sync_channel(self.queue_depth);
        let worker = thread::Builder::new()
            .name("capture-encoder".into())
            .spawn(move || run_encoder(rx, sink))?;
        self.session = Some(Session {
            tx,
            worker,
            sent: 0,
            dropped: 0,
            started: Instant::now(),
        });
        self.last_sample = None;
        log::info!("[capture] started");
        Ok(true)
    }

    /// Whether a frame rendered at `now` should be read back and offered.
    pub fn wants_frame(&self, now: Instant) -> bool {
        self.session.is_some()
            && self
                .last_sample
                .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Note that the frame rendered at `now` was sampled. Its pixels arrive
    /// through [`Recorder::offer`] once the readback completes, which may be
    /// a frame or two later.
    pub fn sampled(&mut self, now: Instant) {
        if self.session.is_some() {
            self.last_sample = Some(now);
        }
    }

    /// Hand a frame to the encoder. Never blocks; a full queue drops it.
    pub fn offer(&mut self, frame: CapturedFrame) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.tx.try_send(frame) {
            Ok(()) => session.sent += 1,
            Err(TrySendError::Full(_)) => {
                session.dropped += 1;
                log::debug!("[capture] encoder busy; dropped frame ({} so far)", session.dropped);
            }
            Err(TrySendError::Disconnected(_)) => {
                session.dropped += 1;
                log::warn!("[capture] encoder stopped early; frame discarded");
            }
        }
    }

    /// Stop recording. `fallback` supplies one frame when nothing was sent so
    /// the output is never empty. Returns `None` when not recording.
    pub fn stop(&mut self, fallback: impl FnOnce() -> Option<CapturedFrame>) -> Option<CaptureHandle> {
        let mut session = self.session.take()?;
        if session.sent == 0 {
            if let Some(frame) = fallback() {
                if session.tx.try_send(frame).is_ok() {
                    session.sent += 1;
                }
            }
        }
        log::info!(
            "[capture] stopped after {:.1}s: {} frames queued, {} dropped",
            session.started.elapsed().as_secs_f32(),
            session.sent,
            session.dropped
        );
        // closing the channel lets the worker drain and finish
        drop(session.tx);
        Some(CaptureHandle {
            worker: session.worker,
            dropped: session.dropped,
        })
    }
}
