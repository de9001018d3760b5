//! Synthetic frame source (stub:// URLs).
//!
//! Generates deterministic gradient frames at the configured size. Used by
//! tests and for bringing the daemon up without a camera.

use anyhow::{anyhow, Result};

use super::{FrameSource, SourceStats};
use crate::config::SourceSettings;
use crate::frame::Frame;

pub struct SyntheticSource {
    settings: SourceSettings,
    frame_count: u64,
    scene_state: u8,
    connected: bool,
}

impl SyntheticSource {
    pub fn new(settings: SourceSettings) -> Self {
        Self {
            settings,
            frame_count: 0,
            scene_state: 0,
            connected: false,
        }
    }

    /// Generate synthetic pixel data.
    ///
    /// Simulates a scene that changes occasionally: most frames are a static
    /// gradient, every 50th frame the scene shifts.
    fn generate_synthetic_pixels(&mut self) -> Vec<u8> {
        let pixel_count = (self.settings.width * self.settings.height * 3) as usize;

        if self.frame_count.is_multiple_of(50) {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        log::info!("SyntheticSource: connected to {}", self.settings.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if !self.connected {
            return Err(anyhow!("synthetic source not connected; call connect() first"));
        }
        self.frame_count += 1;
        let pixels = self.generate_synthetic_pixels();
        Ok(Some(Frame::new(
            pixels,
            self.settings.width,
            self.settings.height,
        )))
    }

    fn close(&mut self) {
        self.connected = false;
        log::info!("SyntheticSource: closed {}", self.settings.url);
    }

    fn is_healthy(&self) -> bool {
        self.connected
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.settings.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_settings() -> SourceSettings {
        SourceSettings {
            url: "stub://test".to_string(),
            target_fps: 10,
            width: 64,
            height: 48,
        }
    }

    #[test]
    fn produces_frames_at_the_configured_size() -> Result<()> {
        let mut source = SyntheticSource::new(stub_settings());
        source.connect()?;

        let frame = source.next_frame()?.expect("synthetic always has a frame");
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 48);
        assert_eq!(frame.byte_len(), 64 * 48 * 3);
        assert_eq!(source.stats().frames_captured, 1);
        Ok(())
    }

    #[test]
    fn requires_connect_before_frames() {
        let mut source = SyntheticSource::new(stub_settings());
        assert!(source.next_frame().is_err());
        assert!(!source.is_healthy());
    }

    #[test]
    fn close_releases_the_source() -> Result<()> {
        let mut source = SyntheticSource::new(stub_settings());
        source.connect()?;
        assert!(source.is_healthy());

        source.close();
        assert!(!source.is_healthy());
        assert!(source.next_frame().is_err());
        Ok(())
    }
}
