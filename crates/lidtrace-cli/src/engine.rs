//! Frame processing loop: at most one frame in flight.
//!
//! The producer side (the caller of [`FrameLoop::submit`]) converts and
//! crops each admitted frame synchronously, then hands the square working
//! buffer to a dedicated worker thread that runs detection and draws the
//! overlays. Frames arriving while the worker is busy are dropped, never
//! queued, so a slow detector simply lowers the processed frame rate.

use lidtrace_core::{LandmarkDetector, OverlayRenderer, PixmapSurface};
use lidtrace_frame::{FrameConverter, FrameError, FrameTransformer, RgbBuffer, Rotation, Yuv420Frame};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
    #[error("worker thread exited")]
    ChannelClosed,
}

/// What happened to a submitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Handed to the worker under this sequence number.
    Admitted(u64),
    /// The worker was busy; the frame was discarded.
    Dropped,
}

/// Result of one processing pass, published by the worker.
pub struct FrameOutcome {
    pub sequence: u64,
    /// The working buffer with overlays drawn on it.
    pub image: RgbBuffer,
    pub faces: usize,
    pub overlays_drawn: usize,
    pub overlays_skipped: usize,
}

struct Job {
    sequence: u64,
    image: RgbBuffer,
}

/// Producer-side handle to the processing loop.
///
/// Dropping it closes the job channel and joins the worker, which waits for
/// any in-flight frame to finish before releasing the detector.
pub struct FrameLoop {
    busy: Arc<AtomicBool>,
    jobs: Option<mpsc::Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    converter: FrameConverter,
    transformer: FrameTransformer,
    spare: Option<RgbBuffer>,
    next_sequence: u64,
}

/// Spawn the worker thread and return the producer handle plus the stream
/// of processed frames.
///
/// Fails fast if the working size is unusable or the thread cannot start.
pub fn spawn_frame_loop<D>(
    detector: D,
    renderer: OverlayRenderer,
    output_size: u32,
) -> Result<(FrameLoop, mpsc::UnboundedReceiver<FrameOutcome>), EngineError>
where
    D: LandmarkDetector + Send + 'static,
{
    let transformer = FrameTransformer::new(output_size, output_size)?;
    let busy = Arc::new(AtomicBool::new(false));
    let (job_tx, job_rx) = mpsc::channel::<Job>(1);
    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

    let worker_busy = Arc::clone(&busy);
    let worker = std::thread::Builder::new()
        .name("lidtrace-worker".into())
        .spawn(move || run_worker(detector, renderer, job_rx, outcome_tx, worker_busy))?;

    tracing::info!(output_size, "frame loop started");

    Ok((
        FrameLoop {
            busy,
            jobs: Some(job_tx),
            worker: Some(worker),
            converter: FrameConverter::new(),
            transformer,
            spare: None,
            next_sequence: 0,
        },
        outcome_rx,
    ))
}

impl FrameLoop {
    /// Offer a frame to the pipeline. Never blocks on the worker.
    ///
    /// A conversion failure returns the loop to idle and reports the error;
    /// the next frame starts fresh.
    pub fn submit(
        &mut self,
        frame: &Yuv420Frame<'_>,
        rotation: Rotation,
    ) -> Result<Admission, EngineError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::trace!("worker busy, dropping frame");
            return Ok(Admission::Dropped);
        }

        let image = match self.prepare(frame, rotation) {
            Ok(image) => image,
            Err(e) => {
                self.busy.store(false, Ordering::Release);
                tracing::warn!(error = %e, "frame rejected");
                return Err(e.into());
            }
        };

        let Some(jobs) = &self.jobs else {
            self.busy.store(false, Ordering::Release);
            return Err(EngineError::ChannelClosed);
        };

        let sequence = self.next_sequence;
        match jobs.try_send(Job { sequence, image }) {
            Ok(()) => {
                self.next_sequence += 1;
                Ok(Admission::Admitted(sequence))
            }
            Err(TrySendError::Full(job)) => {
                self.spare = Some(job.image);
                self.busy.store(false, Ordering::Release);
                Ok(Admission::Dropped)
            }
            Err(TrySendError::Closed(_)) => {
                self.busy.store(false, Ordering::Release);
                Err(EngineError::ChannelClosed)
            }
        }
    }

    /// True when no frame is being processed.
    pub fn is_idle(&self) -> bool {
        !self.busy.load(Ordering::Acquire)
    }

    /// Return a finished working buffer so the next frame can reuse it.
    pub fn recycle(&mut self, image: RgbBuffer) {
        self.spare = Some(image);
    }

    /// Convert and crop into a working buffer owned by the next job.
    fn prepare(&mut self, frame: &Yuv420Frame<'_>, rotation: Rotation) -> Result<RgbBuffer, FrameError> {
        let rgb = self.converter.convert(frame)?;
        let mut working = self.spare.take().unwrap_or_default();
        self.transformer.transform_into(rgb, rotation, &mut working);
        Ok(working)
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("frame worker panicked");
            }
        }
    }
}

/// Marks the loop idle when dropped, including on unwind.
struct IdleOnDrop<'a>(&'a AtomicBool);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn run_worker<D: LandmarkDetector>(
    mut detector: D,
    renderer: OverlayRenderer,
    mut jobs: mpsc::Receiver<Job>,
    outcomes: mpsc::UnboundedSender<FrameOutcome>,
    busy: Arc<AtomicBool>,
) {
    tracing::info!("frame worker started");
    while let Some(job) = jobs.blocking_recv() {
        let outcome = {
            let _idle = IdleOnDrop(&busy);
            process_frame(&mut detector, &renderer, job)
        };
        if outcomes.send(outcome).is_err() {
            tracing::debug!("outcome receiver closed");
        }
    }
    drop(detector);
    tracing::info!("frame worker exiting, detector released");
}

/// Detect faces and draw both eyelid curves for each of them.
///
/// Detector failures count as "no faces"; a face whose curves cannot be
/// built is logged and skipped without affecting the others.
fn process_frame<D: LandmarkDetector + ?Sized>(
    detector: &mut D,
    renderer: &OverlayRenderer,
    job: Job,
) -> FrameOutcome {
    let Job { sequence, mut image } = job;

    let faces = match detector.detect(&image) {
        Ok(faces) => faces,
        Err(e) => {
            tracing::warn!(sequence, error = %e, "detector failed; treating frame as faceless");
            Vec::new()
        }
    };

    let mut drawn = 0;
    let mut skipped = 0;
    if !faces.is_empty() {
        match PixmapSurface::new(&mut image) {
            Ok(mut surface) => {
                for (index, face) in faces.iter().enumerate() {
                    match renderer.render_face(&mut surface, &face.landmarks) {
                        Ok(()) => drawn += 1,
                        Err(e) => {
                            skipped += 1;
                            tracing::warn!(sequence, face = index, error = %e, "skipping face overlay");
                        }
                    }
                }
                surface.finish();
            }
            Err(e) => {
                skipped = faces.len();
                tracing::warn!(sequence, error = %e, "cannot draw overlays");
            }
        }
    }

    tracing::debug!(sequence, faces = faces.len(), drawn, skipped, "frame processed");

    FrameOutcome {
        sequence,
        image,
        faces: faces.len(),
        overlays_drawn: drawn,
        overlays_skipped: skipped,
    }
}
