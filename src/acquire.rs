//! Acquisition loop.
//!
//! Drives the sense -> detect -> reduce -> publish cycle on a background
//! thread until told to stop. A transient per-frame failure skips the
//! iteration and keeps the last published count; only the shutdown flag
//! terminates the loop, and the frame source is released on the way out.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::counter::count_matching;
use crate::detect::{DetectorBackend, ObjectClass};
use crate::ingest::FrameSource;
use crate::state::SharedCount;

const SHUTDOWN_POLL: Duration = Duration::from_millis(50);
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Failure classes for one loop iteration.
///
/// Both are swallowed at the loop boundary with a warning; they exist so the
/// skip policy is explicit and testable rather than a blanket catch.
#[derive(Debug)]
pub enum SampleError {
    /// Frame source failed or is unreachable.
    Acquisition(anyhow::Error),
    /// Detector call failed or timed out.
    Detection(anyhow::Error),
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::Acquisition(err) => write!(f, "frame acquisition failed: {}", err),
            SampleError::Detection(err) => write!(f, "detection failed: {}", err),
        }
    }
}

impl std::error::Error for SampleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SampleError::Acquisition(err) | SampleError::Detection(err) => Some(err.as_ref()),
        }
    }
}

/// Pacing and reduction settings for the loop.
#[derive(Clone, Debug)]
pub struct LoopSettings {
    /// Delay between iterations. Zero means "as fast as possible".
    pub interval: Duration,
    /// Class whose detections are counted.
    pub target_class: ObjectClass,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            target_class: ObjectClass::Person,
        }
    }
}

/// Handle to a running acquisition loop.
#[derive(Debug)]
pub struct LoopHandle {
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl LoopHandle {
    /// Raise the shutdown flag and wait for the loop to finish its current
    /// iteration and release the source.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("acquisition loop thread panicked"))?;
        }
        Ok(())
    }
}

pub struct AcquisitionLoop;

impl AcquisitionLoop {
    /// Start the loop on a background thread. The source must already be
    /// connected; the loop owns it from here and closes it on shutdown.
    pub fn spawn(
        source: Box<dyn FrameSource>,
        backend: Box<dyn DetectorBackend>,
        shared: SharedCount,
        settings: LoopSettings,
    ) -> LoopHandle {
        let shutdown = Arc::new(AtomicBool::new(false));
        let loop_flag = shutdown.clone();
        let join = std::thread::spawn(move || {
            run_loop(source, backend, shared, settings, loop_flag);
        });
        LoopHandle {
            shutdown,
            join: Some(join),
        }
    }
}

fn run_loop(
    mut source: Box<dyn FrameSource>,
    mut backend: Box<dyn DetectorBackend>,
    shared: SharedCount,
    settings: LoopSettings,
    shutdown: Arc<AtomicBool>,
) {
    let mut last_health_log = Instant::now();

    while !shutdown.load(Ordering::SeqCst) {
        match sample_once(source.as_mut(), backend.as_mut(), settings.target_class) {
            Ok(Some(count)) => shared.publish(count),
            Ok(None) => log::debug!("source {} has no frame; skipping", source.name()),
            Err(err) => log::warn!("{}; keeping last count", err),
        }

        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            let stats = source.stats();
            log::info!(
                "source health={} frames={} url={}",
                source.is_healthy(),
                stats.frames_captured,
                stats.source
            );
            last_health_log = Instant::now();
        }

        wait_interval(&shutdown, settings.interval);
    }

    source.close();
    log::info!("acquisition loop stopped");
}

/// One sense -> detect -> reduce step.
///
/// `Ok(None)` means the source had nothing to offer this iteration. Shared
/// state is untouched in every non-`Ok(Some)` case.
pub fn sample_once(
    source: &mut dyn FrameSource,
    backend: &mut dyn DetectorBackend,
    target_class: ObjectClass,
) -> std::result::Result<Option<u64>, SampleError> {
    let frame = match source.next_frame().map_err(SampleError::Acquisition)? {
        Some(frame) => frame,
        None => return Ok(None),
    };

    let detections = backend
        .detect(frame.pixels(), frame.width, frame.height)
        .map_err(SampleError::Detection)?;

    Ok(Some(count_matching(&detections, target_class) as u64))
}

/// Sleep the inter-iteration delay in slices so stop() is observed promptly
/// even with long intervals.
fn wait_interval(shutdown: &AtomicBool, interval: Duration) {
    let mut remaining = interval;
    while !remaining.is_zero() && !shutdown.load(Ordering::SeqCst) {
        let slice = remaining.min(SHUTDOWN_POLL);
        std::thread::sleep(slice);
        remaining -= slice;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Detection, StubBackend};
    use crate::frame::Frame;
    use crate::ingest::SourceStats;

    struct OneFrameSource {
        served: bool,
    }

    impl FrameSource for OneFrameSource {
        fn name(&self) -> &'static str {
            "one-frame"
        }
        fn connect(&mut self) -> Result<()> {
            Ok(())
        }
        fn next_frame(&mut self) -> Result<Option<Frame>> {
            if self.served {
                return Ok(None);
            }
            self.served = true;
            Ok(Some(Frame::new(vec![0u8; 4 * 4 * 3], 4, 4)))
        }
        fn close(&mut self) {}
        fn is_healthy(&self) -> bool {
            true
        }
        fn stats(&self) -> SourceStats {
            SourceStats {
                frames_captured: u64::from(self.served),
                source: "one-frame".to_string(),
            }
        }
    }

    struct FailingSource;

    impl FrameSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn connect(&mut self) -> Result<()> {
            Ok(())
        }
        fn next_frame(&mut self) -> Result<Option<Frame>> {
            Err(anyhow!("camera unplugged"))
        }
        fn close(&mut self) {}
        fn is_healthy(&self) -> bool {
            false
        }
        fn stats(&self) -> SourceStats {
            SourceStats {
                frames_captured: 0,
                source: "failing".to_string(),
            }
        }
    }

    #[test]
    fn sample_once_reduces_to_the_target_class() {
        let mut source = OneFrameSource { served: false };
        let mut backend = StubBackend::with_script(vec![vec![
            Detection::centered(ObjectClass::Person, 0.9),
            Detection::centered(ObjectClass::Person, 0.8),
            Detection::centered(ObjectClass::Vehicle, 0.9),
        ]]);

        let count = sample_once(&mut source, &mut backend, ObjectClass::Person)
            .expect("sample succeeds")
            .expect("frame available");
        assert_eq!(count, 2);
    }

    #[test]
    fn sample_once_reports_exhausted_sources_as_none() {
        let mut source = OneFrameSource { served: true };
        let mut backend = StubBackend::new();

        let outcome = sample_once(&mut source, &mut backend, ObjectClass::Person)
            .expect("no-frame is not an error");
        assert!(outcome.is_none());
    }

    #[test]
    fn sample_once_classifies_acquisition_failures() {
        let mut source = FailingSource;
        let mut backend = StubBackend::new();

        let err = sample_once(&mut source, &mut backend, ObjectClass::Person)
            .expect_err("source failure surfaces");
        assert!(matches!(err, SampleError::Acquisition(_)));
        assert!(err.to_string().contains("camera unplugged"));
    }

    #[test]
    fn wait_interval_returns_early_on_shutdown() {
        let shutdown = AtomicBool::new(true);
        let started = Instant::now();
        wait_interval(&shutdown, Duration::from_secs(5));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
