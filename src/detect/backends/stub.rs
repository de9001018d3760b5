use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, ObjectClass};

/// Stub backend for testing and camera-less bring-up. Replays a scripted
/// sequence of detection sets, cycling when the script runs out.
pub struct StubBackend {
    script: Vec<Vec<Detection>>,
    cursor: usize,
}

impl StubBackend {
    /// Default script: an empty room with one or two people walking through.
    pub fn new() -> Self {
        Self::with_script(vec![
            vec![],
            vec![Detection::centered(ObjectClass::Person, 0.91)],
            vec![
                Detection::centered(ObjectClass::Person, 0.88),
                Detection::centered(ObjectClass::Person, 0.76),
            ],
            vec![Detection::centered(ObjectClass::Person, 0.83)],
        ])
    }

    pub fn with_script(script: Vec<Vec<Detection>>) -> Self {
        Self { script, cursor: 0 }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<Detection>> {
        if self.script.is_empty() {
            return Ok(vec![]);
        }
        let detections = self.script[self.cursor % self.script.len()].clone();
        self.cursor += 1;
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_backend_cycles_its_script() {
        let mut backend = StubBackend::with_script(vec![
            vec![Detection::centered(ObjectClass::Person, 0.9)],
            vec![],
        ]);

        assert_eq!(backend.detect(b"frame", 4, 4).unwrap().len(), 1);
        assert_eq!(backend.detect(b"frame", 4, 4).unwrap().len(), 0);
        assert_eq!(backend.detect(b"frame", 4, 4).unwrap().len(), 1);
    }

    #[test]
    fn empty_script_detects_nothing() {
        let mut backend = StubBackend::with_script(vec![]);
        assert!(backend.detect(b"frame", 4, 4).unwrap().is_empty());
    }
}
