//! Detection backends and detection types.

use anyhow::{anyhow, Result};

use crate::config::DetectorSettings;

mod backend;
mod backends;
mod result;

pub use backend::DetectorBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use backends::{RemoteBackend, RemoteConfig, StubBackend};
pub use result::{Detection, ObjectClass};

/// Build the configured detector backend.
///
/// Backend names are validated at config load; this fails only on missing
/// backend-specific settings or model load errors.
pub fn from_settings(settings: &DetectorSettings) -> Result<Box<dyn DetectorBackend>> {
    match settings.backend.as_str() {
        "stub" => Ok(Box::new(StubBackend::new())),
        "remote" => {
            let url = settings
                .remote_url
                .clone()
                .ok_or_else(|| anyhow!("detector.remote_url is required for the remote backend"))?;
            Ok(Box::new(RemoteBackend::new(RemoteConfig {
                url,
                timeout: settings.timeout,
            })))
        }
        #[cfg(feature = "backend-tract")]
        "tract" => {
            let path = settings
                .model_path
                .clone()
                .ok_or_else(|| anyhow!("detector.model_path is required for the tract backend"))?;
            Ok(Box::new(TractBackend::new(
                path,
                settings.model_width,
                settings.model_height,
            )?))
        }
        #[cfg(not(feature = "backend-tract"))]
        "tract" => Err(anyhow!("the tract backend requires the backend-tract feature")),
        other => Err(anyhow!("unknown detector backend '{}'", other)),
    }
}
