//! headcount - live occupancy counting service.
//!
//! A background loop samples frames from a video source, runs person
//! detection on each frame, and publishes the resulting count into shared
//! state. A small HTTP API serves that count to concurrent clients. In push
//! mode a remote camera client runs detection itself and reports counts
//! directly, bypassing local acquisition.
//!
//! # Module Structure
//!
//! - `ingest`: frame sources (HTTP cameras, synthetic stub)
//! - `detect`: detector backends and detection types
//! - `counter`: reduction of detections to an occupancy count
//! - `state`: the shared (count, timestamp) snapshot
//! - `acquire`: the sense -> detect -> reduce -> publish loop
//! - `api`: the query/push HTTP surface
//! - `config`: daemon configuration (file + env)

pub mod acquire;
pub mod api;
pub mod config;
pub mod counter;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod state;

pub use acquire::{sample_once, AcquisitionLoop, LoopHandle, LoopSettings, SampleError};
pub use counter::count_matching;
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use detect::{Detection, DetectorBackend, ObjectClass, RemoteBackend, RemoteConfig, StubBackend};
pub use frame::Frame;
pub use ingest::{open_source, FrameSource, HttpSource, SourceStats, SyntheticSource};
pub use state::{CountSnapshot, SharedCount};
