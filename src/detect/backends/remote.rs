//! Remote HTTP detection backend.
//!
//! Posts the JPEG-encoded frame to an external detection service and parses
//! detections out of the JSON response. Two response shapes are accepted:
//!
//! - `{"detections": [{"label": "person", "confidence": 0.93, "box": [x, y, w, h]}, ...]}`
//! - `{"count": 3}` - plain counting services; the count is treated as that
//!   many person detections.
//!
//! The whole request runs under the configured timeout. A timeout, transport
//! failure, or non-2xx status is an ordinary detection error; the loop keeps
//! the last published count.

use std::time::Duration;

use anyhow::{Context, Result};
use image::ImageEncoder;
use serde::Deserialize;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, ObjectClass};

/// Configuration for a remote detection service.
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    /// Detection endpoint (e.g., "http://127.0.0.1:8080/detect").
    pub url: String,
    /// Hard deadline for one detection request.
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/detect".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Remote HTTP detection backend.
pub struct RemoteBackend {
    config: RemoteConfig,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
struct RemoteResponse {
    #[serde(default)]
    detections: Option<Vec<RemoteDetection>>,
    #[serde(default)]
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RemoteDetection {
    label: String,
    #[serde(default)]
    confidence: f32,
    #[serde(rename = "box", default)]
    bounds: [f32; 4],
}

impl RemoteBackend {
    pub fn new(config: RemoteConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { config, agent }
    }

    fn parse_response(&self, body: &str) -> Result<Vec<Detection>> {
        let response: RemoteResponse =
            serde_json::from_str(body).context("parse detection service response")?;

        if let Some(remote) = response.detections {
            return Ok(remote
                .into_iter()
                .map(|d| Detection {
                    x: d.bounds[0],
                    y: d.bounds[1],
                    w: d.bounds[2],
                    h: d.bounds[3],
                    confidence: d.confidence,
                    class: ObjectClass::from_label(&d.label),
                })
                .collect());
        }

        if let Some(count) = response.count {
            return Ok((0..count)
                .map(|_| Detection::centered(ObjectClass::Person, 1.0))
                .collect());
        }

        anyhow::bail!("detection service response has neither 'detections' nor 'count'")
    }
}

impl DetectorBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let jpeg = encode_jpeg(pixels, width, height)?;
        let response = self
            .agent
            .post(&self.config.url)
            .set("Content-Type", "image/jpeg")
            .send_bytes(&jpeg)
            .context("post frame to detection service")?;
        let body = response
            .into_string()
            .context("read detection service response")?;
        self.parse_response(&body)
    }
}

fn encode_jpeg(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| anyhow::anyhow!("frame dimensions overflow"))?;
    if pixels.len() != expected_len {
        anyhow::bail!(
            "expected {} RGB bytes for {}x{}, received {}",
            expected_len,
            width,
            height,
            pixels.len()
        );
    }

    let mut jpeg = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 80);
    encoder
        .write_image(pixels, width, height, image::ExtendedColorType::Rgb8)
        .context("encode frame as jpeg")?;
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> RemoteBackend {
        RemoteBackend::new(RemoteConfig::default())
    }

    #[test]
    fn parses_labeled_detections() {
        let body = r#"{"detections":[
            {"label":"person","confidence":0.93,"box":[0.1,0.2,0.3,0.4]},
            {"label":"car","confidence":0.88,"box":[0.5,0.5,0.2,0.2]}
        ]}"#;
        let detections = backend().parse_response(body).expect("parses");
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].class, ObjectClass::Person);
        assert_eq!(detections[1].class, ObjectClass::Vehicle);
        assert!((detections[0].x - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn count_only_responses_become_person_detections() {
        let detections = backend().parse_response(r#"{"count":3}"#).expect("parses");
        assert_eq!(detections.len(), 3);
        assert!(detections.iter().all(|d| d.class == ObjectClass::Person));
    }

    #[test]
    fn rejects_responses_without_detections_or_count() {
        assert!(backend().parse_response(r#"{"status":"ok"}"#).is_err());
        assert!(backend().parse_response("not json").is_err());
    }

    #[test]
    fn encode_jpeg_rejects_mismatched_buffers() {
        assert!(encode_jpeg(&[0u8; 10], 4, 4).is_err());
        assert!(encode_jpeg(&vec![0u8; 4 * 4 * 3], 4, 4).is_ok());
    }
}
