//! demo - end-to-end run of the behavior metrics pipeline
//!
//! Drives the detection loop against the configured source (synthetic by
//! default) and prints smoothed metrics until the time limit or Ctrl-C.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use behavior_lens::{
    open_source, DetectionLoop, LoopState, ModelSet, Pipeline, PipelineConfig,
};

#[path = "../ui.rs"]
mod ui;

const UPDATE_POLL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Run time in seconds.
    #[arg(long, default_value_t = 5)]
    seconds: u64,
    /// Override the configured target frame rate.
    #[arg(long)]
    fps: Option<u32>,
    /// Print every update as a JSON line on stdout.
    #[arg(long)]
    json: bool,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = PipelineConfig::load()?;
    if let Some(fps) = args.fps {
        config.source.target_fps = fps;
    }
    config.validate()?;

    let is_tty = std::io::stderr().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, args.json);

    let pipeline = {
        let _stage = ui.stage("Load models");
        Pipeline::new(build_models(&config))
    };
    let source = {
        let _stage = ui.stage("Open source");
        open_source(config.source_config())?
    };

    let (tx, rx) = mpsc::channel();
    let handle = {
        let _stage = ui.stage("Start detection loop");
        DetectionLoop::new(pipeline, source, config.loop_config())
            .with_updates(tx)
            .spawn()?
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    let mut live = ui.live(args.seconds * config.source.target_fps as u64);
    while Instant::now() < deadline && !interrupted.load(Ordering::SeqCst) {
        match rx.recv_timeout(UPDATE_POLL) {
            Ok(update) => {
                if args.json {
                    println!("{}", serde_json::to_string(&update)?);
                } else {
                    live.update(update.sequence, &update.metrics);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        if handle.is_finished() {
            break;
        }
    }
    live.finish();

    let state = handle.state();
    let stats = handle.stats();
    let metrics = handle.metrics();
    handle.stop()?;

    if let LoopState::Failed(reason) = state {
        return Err(anyhow!("detection loop failed: {}", reason));
    }
    eprintln!("final  {}", ui::summary(&metrics));
    eprintln!(
        "frames processed={} published={} failed_detections={} source_errors={}",
        stats.frames_processed,
        stats.frames_published,
        stats.failed_detections,
        stats.source_errors
    );
    Ok(())
}

#[cfg(feature = "backend-tract")]
fn build_models(config: &PipelineConfig) -> ModelSet {
    use behavior_lens::detect::TractPoseModel;
    use behavior_lens::{SyntheticFaceModel, SyntheticHandModel};

    match &config.models.pose_model_path {
        Some(path) => {
            log::info!("pose model: tract ({})", path.display());
            ModelSet::new(
                TractPoseModel::new(path, config.source.width, config.source.height),
                SyntheticFaceModel::new(),
                SyntheticHandModel::new(),
            )
        }
        None => behavior_lens::synthetic_models(),
    }
}

#[cfg(not(feature = "backend-tract"))]
fn build_models(config: &PipelineConfig) -> ModelSet {
    if config.models.pose_model_path.is_some() {
        log::warn!("pose_model_path is set but this build has no backend-tract; using synthetic models");
    }
    behavior_lens::synthetic_models()
}
