//! camera_push - push-mode camera client.
//!
//! Samples the local camera, runs detection locally, and reports the count to
//! a remote headcount service via POST /update_count. A failed report is
//! logged and retried on the next iteration; the local loop never dies on a
//! transient error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use headcount::config::{DetectorSettings, SourceSettings};
use headcount::{detect, ingest, sample_once, ObjectClass};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Report local person counts to a remote headcount service"
)]
struct Args {
    /// Remote /update_count endpoint.
    #[arg(
        long,
        env = "HEADCOUNT_SERVER_URL",
        default_value = "http://127.0.0.1:5000/update_count"
    )]
    server_url: String,

    /// Frame source URL (stub:// or http(s)://).
    #[arg(long, env = "HEADCOUNT_SOURCE_URL", default_value = "stub://camera0")]
    source_url: String,

    /// Detector backend (stub, remote, tract).
    #[arg(long, env = "HEADCOUNT_DETECTOR", default_value = "stub")]
    detector: String,

    /// Remote detection service URL (required with --detector remote).
    #[arg(long, env = "HEADCOUNT_REMOTE_URL")]
    remote_url: Option<String>,

    /// ONNX model path (required with --detector tract).
    #[arg(long, env = "HEADCOUNT_MODEL_PATH")]
    model_path: Option<String>,

    /// Object class to count.
    #[arg(long, env = "HEADCOUNT_TARGET_CLASS", default_value = "person")]
    target_class: String,

    /// Seconds between reports.
    #[arg(long, env = "HEADCOUNT_PUSH_INTERVAL_SECS", default_value = "1")]
    interval_secs: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let target_class = ObjectClass::parse_target(&args.target_class)?;

    let mut source = ingest::open_source(&SourceSettings {
        url: args.source_url.clone(),
        target_fps: 10,
        width: 640,
        height: 480,
    })?;
    source.connect()?;

    let mut backend = detect::from_settings(&DetectorSettings {
        backend: args.detector.clone(),
        remote_url: args.remote_url.clone(),
        timeout: Duration::from_secs(5),
        model_path: args.model_path.clone(),
        model_width: 640,
        model_height: 480,
        target_class,
    })?;
    backend.warm_up()?;

    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(5))
        .build();

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
    })
    .expect("error setting Ctrl-C handler");

    log::info!(
        "camera_push running. source={} detector={} reporting to {}",
        args.source_url,
        backend.name(),
        args.server_url
    );

    while running.load(Ordering::SeqCst) {
        match sample_once(source.as_mut(), backend.as_mut(), target_class) {
            Ok(Some(count)) => match push_count(&agent, &args.server_url, count) {
                Ok(()) => log::info!("reported count={}", count),
                Err(err) => log::warn!("failed to report count: {}", err),
            },
            Ok(None) => log::debug!("no frame available"),
            Err(err) => log::warn!("{}; nothing reported", err),
        }
        std::thread::sleep(Duration::from_secs(args.interval_secs));
    }

    source.close();
    log::info!("camera_push stopped");
    Ok(())
}

fn push_count(agent: &ureq::Agent, url: &str, count: u64) -> Result<()> {
    let body = serde_json::json!({ "count": count }).to_string();
    agent
        .post(url)
        .set("Content-Type", "application/json")
        .send_string(&body)
        .with_context(|| format!("post count to {}", url))?;
    Ok(())
}
