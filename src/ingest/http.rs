//! HTTP camera source.
//!
//! Ingests frames from cameras that serve MJPEG multipart streams or
//! single-JPEG snapshots over HTTP (IP webcams, ESP32-class boards). The
//! source is responsible for:
//! - Connecting to the stream and detecting which of the two shapes it is
//! - Decoding JPEG frames in-memory
//! - Decimating to the configured target fps
//! - Bounding all socket reads with the agent timeout

use std::io::Read;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use image::GenericImageView;

use super::{FrameSource, SourceStats};
use crate::config::SourceSettings;
use crate::frame::Frame;

const MAX_JPEG_BYTES: usize = 5 * 1024 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpSource {
    settings: SourceSettings,
    agent: ureq::Agent,
    stream: Option<HttpStream>,
    last_frame_at: Option<Instant>,
    connected_at: Option<Instant>,
    frame_count: u64,
}

enum HttpStream {
    Mjpeg(MjpegStream),
    SingleJpeg,
}

impl HttpSource {
    pub fn new(settings: SourceSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(READ_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build();
        Self {
            settings,
            agent,
            stream: None,
            last_frame_at: None,
            connected_at: None,
            frame_count: 0,
        }
    }
}

impl FrameSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    fn connect(&mut self) -> Result<()> {
        let response = self
            .agent
            .get(&self.settings.url)
            .call()
            .context("connect to http camera")?;
        let content_type = response.header("Content-Type").unwrap_or("");
        if content_type.to_lowercase().contains("multipart") {
            let reader = response.into_reader();
            self.stream = Some(HttpStream::Mjpeg(MjpegStream::new(reader)));
        } else {
            self.stream = Some(HttpStream::SingleJpeg);
        }
        self.connected_at = Some(Instant::now());
        log::info!("HttpSource: connected to {}", self.settings.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        // Decimate before touching the socket: the loop's pacing delay may be
        // shorter than the camera interval.
        if let Some(last) = self.last_frame_at {
            if last.elapsed() < frame_interval(self.settings.target_fps) {
                return Ok(None);
            }
        }

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| anyhow!("http source not connected; call connect() first"))?;
        let jpeg_bytes = match stream {
            HttpStream::Mjpeg(stream) => stream.read_next_jpeg()?,
            HttpStream::SingleJpeg => fetch_single_jpeg(&self.agent, &self.settings.url)?,
        };

        let (pixels, width, height) = decode_jpeg(&jpeg_bytes)?;
        self.frame_count += 1;
        self.last_frame_at = Some(Instant::now());

        Ok(Some(Frame::new(pixels, width, height)))
    }

    fn close(&mut self) {
        self.stream = None;
        self.connected_at = None;
        log::info!("HttpSource: closed {}", self.settings.url);
    }

    fn is_healthy(&self) -> bool {
        let Some(connected_at) = self.connected_at else {
            return false;
        };
        let Some(last_frame_at) = self.last_frame_at else {
            return connected_at.elapsed() <= Duration::from_secs(5);
        };
        last_frame_at.elapsed() <= health_grace(self.settings.target_fps)
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.settings.url.clone(),
        }
    }
}

struct MjpegStream {
    reader: Box<dyn Read + Send>,
    buffer: Vec<u8>,
}

impl MjpegStream {
    fn new(reader: Box<dyn Read + Send>) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(64 * 1024),
        }
    }

    fn read_next_jpeg(&mut self) -> Result<Vec<u8>> {
        let mut chunk = vec![0u8; 8192];
        loop {
            if let Some((start, end)) = find_jpeg_bounds(&self.buffer) {
                let frame = self.buffer[start..end].to_vec();
                self.buffer.drain(..end);
                return Ok(frame);
            }

            let read = self.reader.read(&mut chunk).context("read mjpeg chunk")?;
            if read == 0 {
                return Err(anyhow!("mjpeg stream ended"));
            }
            self.buffer.extend_from_slice(&chunk[..read]);

            if self.buffer.len() > MAX_JPEG_BYTES * 2 {
                let keep = 2.min(self.buffer.len());
                let drain_len = self.buffer.len() - keep;
                self.buffer.drain(..drain_len);
            }
        }
    }
}

fn fetch_single_jpeg(agent: &ureq::Agent, url: &str) -> Result<Vec<u8>> {
    let response = agent
        .get(url)
        .call()
        .with_context(|| format!("fetch jpeg snapshot from {}", url))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_JPEG_BYTES as u64)
        .read_to_end(&mut bytes)
        .context("read jpeg snapshot")?;
    if bytes.is_empty() {
        return Err(anyhow!("empty jpeg snapshot"));
    }
    Ok(bytes)
}

fn decode_jpeg(bytes: &[u8]) -> Result<(Vec<u8>, u32, u32)> {
    let image = image::load_from_memory(bytes).context("decode jpeg")?;
    let (width, height) = image.dimensions();
    let rgb = image.into_rgb8();
    Ok((rgb.into_raw(), width, height))
}

fn find_jpeg_bounds(buffer: &[u8]) -> Option<(usize, usize)> {
    let mut start = None;
    let mut i = 0;
    while i + 1 < buffer.len() {
        if buffer[i] == 0xFF && buffer[i + 1] == 0xD8 {
            start = Some(i);
            break;
        }
        i += 1;
    }
    let start = start?;
    let mut j = start + 2;
    while j + 1 < buffer.len() {
        if buffer[j] == 0xFF && buffer[j + 1] == 0xD9 {
            return Some((start, j + 2));
        }
        j += 1;
    }
    None
}

fn frame_interval(target_fps: u32) -> Duration {
    if target_fps == 0 {
        Duration::from_millis(100)
    } else {
        Duration::from_millis((1000 / target_fps).max(1) as u64)
    }
}

fn health_grace(target_fps: u32) -> Duration {
    let base_ms = if target_fps == 0 {
        2_000
    } else {
        (1000 / target_fps).saturating_mul(6)
    };
    Duration::from_millis(base_ms.max(2_000) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_jpeg_bounds_locates_soi_and_eoi() {
        let mut buffer = vec![0x00, 0x11];
        buffer.extend_from_slice(&[0xFF, 0xD8, 0xAA, 0xBB, 0xFF, 0xD9]);
        buffer.extend_from_slice(&[0x22]);

        let (start, end) = find_jpeg_bounds(&buffer).expect("bounds found");
        assert_eq!(&buffer[start..end], &[0xFF, 0xD8, 0xAA, 0xBB, 0xFF, 0xD9]);
    }

    #[test]
    fn find_jpeg_bounds_waits_for_a_complete_frame() {
        assert!(find_jpeg_bounds(&[0xFF, 0xD8, 0xAA]).is_none());
        assert!(find_jpeg_bounds(&[0xAA, 0xBB]).is_none());
    }

    #[test]
    fn frame_interval_matches_target_fps() {
        assert_eq!(frame_interval(10), Duration::from_millis(100));
        assert_eq!(frame_interval(0), Duration::from_millis(100));
    }

    #[test]
    fn next_frame_requires_connect() {
        let mut source = HttpSource::new(SourceSettings {
            url: "http://127.0.0.1:1/stream".to_string(),
            target_fps: 10,
            width: 640,
            height: 480,
        });
        assert!(source.next_frame().is_err());
        assert!(!source.is_healthy());
    }
}
