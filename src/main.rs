use anyhow::{Context, Result};
use clap::Parser;
use handtyped::analysis::ShapeAnalyzer;
use handtyped::capture::{FrameSource, WebcamCapture};
use handtyped::config::Config;
use handtyped::output::{PreviewObserver, V4L2Output};
use handtyped::session::{FrameObserver, Session, SessionOptions, DEFAULT_QUEUE_CAPACITY};
use handtyped::simulation::{GestureSampler, RandomSampler};
use handtyped::keymap::normalize_key;
use handtyped::GestureEvent;
use std::collections::BTreeMap;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON configuration file
    /// If not provided, built-in defaults are used
    #[arg(short, long)]
    config: Option<String>,

    /// Input webcam device index (overrides the config file)
    #[arg(short, long)]
    input_device: Option<u32>,

    /// Capture resolution width
    #[arg(long)]
    capture_width: Option<u32>,

    /// Capture resolution height
    #[arg(long)]
    capture_height: Option<u32>,

    /// Target frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Do not open the camera; emit simulated gestures instead
    #[arg(long)]
    simulate: bool,

    /// Seed for simulated gestures
    #[arg(long)]
    seed: Option<u64>,

    /// v4l2loopback device to write an annotated preview to
    #[arg(long)]
    preview_device: Option<String>,

    /// Stop after this many seconds
    #[arg(long)]
    run_for_secs: Option<u64>,

    /// Capacity of the gesture event queue
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("HandTyped starting");

    let mut config = match &args.config {
        Some(path) => Config::load(path).context("Failed to load configuration")?,
        None => Config::default(),
    };
    if let Some(device) = args.input_device {
        config.camera.device_id = device;
    }
    if let Some(width) = args.capture_width {
        config.camera.width = width;
    }
    if let Some(height) = args.capture_height {
        config.camera.height = height;
    }
    if let Some(fps) = args.fps {
        config.camera.fps = fps;
    }
    config.validate().context("Invalid configuration")?;

    tracing::info!("Loaded {} gesture bindings", config.bindings.len());
    for (gesture, key) in &config.bindings {
        tracing::info!("  {} -> {}", gesture, key);
    }

    let observer: Option<Box<dyn FrameObserver>> = match &args.preview_device {
        Some(path) => {
            let output = V4L2Output::new(path, config.camera.width, config.camera.height)
                .context("Failed to initialize preview output")?;
            Some(Box::new(PreviewObserver::new(
                output,
                ShapeAnalyzer::new(&config.detection),
            )))
        }
        None => None,
    };

    let sampler: Box<dyn GestureSampler> = match args.seed {
        Some(seed) => Box::new(RandomSampler::seeded(seed)),
        None => Box::new(RandomSampler::from_os_rng()),
    };

    let camera = config.camera.clone();
    let open_camera = move || -> Result<Box<dyn FrameSource>> {
        let capture = WebcamCapture::new(&camera).context("Failed to initialize webcam capture")?;
        Ok(Box::new(capture))
    };

    let options = SessionOptions {
        queue_capacity: args.queue_capacity,
        force_simulation: args.simulate,
        sampler,
        observer,
    };
    let session = Session::start(&config.detection, open_camera, options)
        .context("Failed to start gesture session")?;

    let deadline = args
        .run_for_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    if deadline.is_none() {
        tracing::info!("Press Ctrl+C to stop");
    }

    dispatch_events(&session, &config.bindings, deadline);

    let simulated = session.is_simulated();
    let counts = session.stop();
    tracing::info!(
        "Session finished ({} mode)",
        if simulated { "simulated" } else { "live" }
    );
    for (gesture, count) in &counts {
        tracing::info!("  {}: {}", gesture, count);
    }

    Ok(())
}

/// Resolve each emitted gesture to its bound key. Key injection itself is
/// left to the desktop automation layer; here the action is logged.
fn dispatch_events(
    session: &Session,
    bindings: &BTreeMap<handtyped::Gesture, String>,
    deadline: Option<Instant>,
) {
    loop {
        let timeout = match deadline {
            Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) if !remaining.is_zero() => remaining.min(Duration::from_millis(250)),
                _ => {
                    tracing::info!("Run time elapsed, stopping");
                    return;
                }
            },
            None => Duration::from_millis(250),
        };

        match session.events().recv_timeout(timeout) {
            Ok(GestureEvent { gesture, .. }) => {
                match bindings.get(&gesture).map(|key| normalize_key(key)) {
                    Some(Ok(key)) => tracing::info!("Gesture {} -> pressing key: {}", gesture, key),
                    Some(Err(err)) => tracing::warn!("Gesture {} not dispatched: {}", gesture, err),
                    None => tracing::info!("Gesture '{}' not mapped to any key", gesture),
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("Gesture source finished");
                return;
            }
        }
    }
}
