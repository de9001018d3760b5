//! headcount_api - push-mode API service.
//!
//! This daemon:
//! 1. Serves the query API
//! 2. Does NOT open a camera or run detection
//!
//! Counts arrive exclusively through POST /update_count from remote camera
//! clients (see camera_push).

use anyhow::Result;
use std::sync::mpsc;

use headcount::api::{ApiConfig, ApiServer};
use headcount::config::HeadcountdConfig;
use headcount::SharedCount;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = HeadcountdConfig::load()?;
    let shared = SharedCount::new();

    let api_config = ApiConfig {
        addr: cfg.api_addr.clone(),
    };
    let api_handle = ApiServer::new(api_config, shared).spawn()?;
    log::info!("query api listening on {} (push mode)", api_handle.addr);

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("error setting Ctrl-C handler");

    log::info!("headcount_api waiting for shutdown signal (Ctrl-C)...");
    let _ = rx.recv();
    log::info!("shutdown signal received, stopping API server...");
    api_handle.stop()?;

    Ok(())
}
