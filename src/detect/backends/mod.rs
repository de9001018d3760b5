pub mod remote;
pub mod stub;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use remote::{RemoteBackend, RemoteConfig};
pub use stub::StubBackend;

#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;
