//! headcountd - live occupancy counter daemon.
//!
//! This daemon:
//! 1. Opens the configured frame source (HTTP camera or synthetic stub)
//! 2. Runs the detector backend on each sampled frame
//! 3. Reduces detections to the target-class count
//! 4. Publishes the count into shared state
//! 5. Serves the count over the query API (and accepts pushed counts)

use anyhow::Result;
use std::sync::mpsc;

use headcount::api::{ApiConfig, ApiServer};
use headcount::config::HeadcountdConfig;
use headcount::{detect, ingest, AcquisitionLoop, LoopSettings, SharedCount};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = HeadcountdConfig::load()?;
    let shared = SharedCount::new();

    let api_config = ApiConfig {
        addr: cfg.api_addr.clone(),
    };
    let api_handle = ApiServer::new(api_config, shared.clone()).spawn()?;
    log::info!("query api listening on {}", api_handle.addr);

    let mut source = ingest::open_source(&cfg.source)?;
    source.connect()?;

    let mut backend = detect::from_settings(&cfg.detector)?;
    backend.warm_up()?;
    log::info!(
        "source={} detector={} target_class={}",
        cfg.source.url,
        backend.name(),
        cfg.detector.target_class.label()
    );

    let loop_handle = AcquisitionLoop::spawn(
        source,
        backend,
        shared.clone(),
        LoopSettings {
            interval: cfg.interval,
            target_class: cfg.detector.target_class,
        },
    );
    log::info!(
        "headcountd running. sampling every {}ms",
        cfg.interval.as_millis()
    );

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("error setting Ctrl-C handler");

    let _ = rx.recv();
    log::info!("shutdown signal received, stopping...");
    loop_handle.stop()?;
    api_handle.stop()?;

    Ok(())
}
