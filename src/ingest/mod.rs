//! Frame ingestion sources.
//!
//! This module provides the sources the acquisition loop samples from:
//! - HTTP cameras (MJPEG multipart streams or single-JPEG snapshots)
//! - Synthetic source (`stub://` URLs, for tests and camera-less bring-up)
//!
//! All sources produce `Frame` instances for one-shot consumption by the
//! detector. The ingestion layer is responsible for:
//! - Decoding frames in-memory
//! - Rate limiting / frame decimation to the configured fps
//! - Bounding its own blocking (socket read timeouts, stall detection);
//!   the acquisition loop never enforces a deadline on top

use anyhow::{anyhow, Context, Result};
use url::Url;

use crate::config::SourceSettings;
use crate::frame::Frame;

mod http;
mod synthetic;

pub use http::HttpSource;
pub use synthetic::SyntheticSource;

/// Capability interface for frame sources.
///
/// The acquisition loop is the only consumer: it calls `connect` once,
/// `next_frame` per iteration, and `close` on shutdown.
pub trait FrameSource: Send {
    /// Source identifier.
    fn name(&self) -> &'static str;

    /// Open the device or stream. Failure here is fatal at daemon startup.
    fn connect(&mut self) -> Result<()>;

    /// Capture the next frame.
    ///
    /// `Ok(None)` means the source has nothing right now (decimation, end of
    /// a finite source); the caller skips the iteration. `Err` is a transient
    /// acquisition failure; the caller skips as well.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the device. Called once on shutdown.
    fn close(&mut self);

    /// True while frames are arriving within the source's grace window.
    fn is_healthy(&self) -> bool;

    /// Get frame statistics.
    fn stats(&self) -> SourceStats;
}

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub source: String,
}

/// Open the source named by the configured URL.
///
/// `stub://` yields the synthetic source; `http://` and `https://` yield the
/// HTTP camera source. Anything else is a startup configuration error.
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    if settings.url.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(settings.clone())));
    }
    let url = Url::parse(&settings.url).context("parse source url")?;
    match url.scheme() {
        "http" | "https" => Ok(Box::new(HttpSource::new(settings.clone()))),
        other => Err(anyhow!(
            "unsupported source scheme '{}'; expected stub:// or http(s)://",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> SourceSettings {
        SourceSettings {
            url: url.to_string(),
            target_fps: 10,
            width: 64,
            height: 48,
        }
    }

    #[test]
    fn open_source_dispatches_on_scheme() -> Result<()> {
        assert_eq!(open_source(&settings("stub://camera0"))?.name(), "synthetic");
        assert_eq!(open_source(&settings("http://cam.local/stream"))?.name(), "http");
        assert!(open_source(&settings("rtsp://cam.local/stream")).is_err());
        assert!(open_source(&settings("not a url")).is_err());
        Ok(())
    }
}
