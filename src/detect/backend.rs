use anyhow::Result;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// A backend reduces one frame to a set of labeled detections. Implementations
/// must bound their own blocking (request timeouts, fixed-size local models);
/// the acquisition loop never enforces a deadline on top. A timeout is an
/// ordinary detection error, not a fatal condition.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on one RGB8 frame.
    ///
    /// An empty vec means "nothing found" and is not an error.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
