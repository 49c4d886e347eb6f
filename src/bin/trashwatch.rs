//! trashwatch - trash detection CLI
//!
//! Dispatches to three flows:
//! 1. `detect`: still image -> detailed JSON on stdout; video file or
//!    camera -> early-exit scan printing `true` / `false`
//! 2. `train`: delegates a training run to the engine
//! 3. `export`: delegates a weight export to the engine

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};

use trashwatch::config::TrashwatchConfig;
use trashwatch::detect::{
    create_engine, resolve_weights, DetectionEngine, EngineCapability, EngineKind, ExportRequest,
    Labels, TrainRequest,
};
use trashwatch::ingest::{classify_source, open_stream_source, SourceKind, StillImageSource};
use trashwatch::{evaluate_detailed, scan, CancelToken, ClassFilter, FrameSource};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect trash in an image, video file, or camera stream.
    Detect(DetectArgs),
    /// Train the underlying model (delegates to the engine).
    Train(TrainArgs),
    /// Export trained weights to another format (delegates to the engine).
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// Image / video path, stub:// stream, or camera index ("0").
    source: String,
    /// Custom weights path; a missing file falls back to the pretrained model.
    #[arg(long)]
    weights: Option<String>,
    /// Labels file (one class name per line).
    #[arg(long)]
    labels: Option<String>,
    /// Confidence threshold (0.0 - 1.0).
    #[arg(long)]
    conf: Option<f32>,
    /// Comma-separated class names counted as trash; empty = every class.
    #[arg(long, value_delimiter = ',')]
    classes: Option<Vec<String>>,
    /// Engine backend (auto | tract | stub).
    #[arg(long, default_value = "auto")]
    engine: String,
    /// Square model input size.
    #[arg(long)]
    input_size: Option<u32>,
    /// Write annotated copies of still-image detections to this directory.
    #[cfg(feature = "annotate")]
    #[arg(long, value_name = "DIR")]
    annotate: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Dataset description file.
    #[arg(long, default_value = "data.yaml")]
    data: PathBuf,
    /// Base or existing model to start training from.
    #[arg(long, default_value = "yolov8n.onnx")]
    model: PathBuf,
    #[arg(long, default_value_t = 50)]
    epochs: u32,
    #[arg(long, default_value_t = 640)]
    imgsz: u32,
    #[arg(long, default_value_t = 16)]
    batch: u32,
    /// Engine backend (auto | tract | stub).
    #[arg(long, default_value = "auto")]
    engine: String,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Weights to export; a missing file falls back to the pretrained model.
    #[arg(long)]
    weights: Option<String>,
    /// Target format.
    #[arg(long, default_value = "onnx")]
    format: String,
    /// Engine backend (auto | tract | stub).
    #[arg(long, default_value = "auto")]
    engine: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Detect(args) => run_detect(args),
        Command::Train(args) => run_train(args),
        Command::Export(args) => run_export(args),
    }
}

fn run_detect(args: DetectArgs) -> Result<()> {
    let mut cfg = TrashwatchConfig::load()?;
    if let Some(weights) = args.weights.clone() {
        cfg.weights = weights;
    }
    if let Some(labels) = args.labels.clone() {
        cfg.labels = Some(labels);
    }
    if let Some(conf) = args.conf {
        cfg.confidence = conf;
    }
    if let Some(input_size) = args.input_size {
        cfg.input_size = input_size;
    }
    if let Some(classes) = args.classes.clone() {
        cfg.trash_classes = classes;
    }
    cfg.validate()?;

    let filter = ClassFilter::new(cfg.trash_classes.clone());
    let weights = resolve_weights(Path::new(&cfg.weights));
    let labels = load_labels(&cfg)?;
    let kind = EngineKind::parse(&args.engine)?;
    let mut engine = create_engine(kind, &weights, labels, cfg.input_size, cfg.confidence)?;

    match classify_source(&args.source) {
        SourceKind::Still(path) => {
            let mut source = StillImageSource::new(&path);
            source.connect()?;
            let frame = source
                .next_frame()?
                .ok_or_else(|| anyhow!("no frame decoded from {}", path.display()))?;

            let detections = engine.infer(&frame)?;
            let report = evaluate_detailed(&detections, &filter, cfg.confidence);

            #[cfg(feature = "annotate")]
            if let Some(dir) = &args.annotate {
                trashwatch::annotate::save_annotated(dir, &frame, &detections)?;
            }

            println!("{}", serde_json::to_string(&report)?);
        }
        stream @ (SourceKind::VideoFile(_) | SourceKind::Camera(_)) => {
            let mut source = open_stream_source(&stream)?;
            source.connect()?;
            let cancel = CancelToken::install_ctrlc()?;

            let found = scan(&mut *source, &mut *engine, &filter, cfg.confidence, &cancel)?;
            println!("{}", if found { "true" } else { "false" });
        }
    }

    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    let cfg = TrashwatchConfig::load()?;
    let kind = EngineKind::parse(&args.engine)?;
    let labels = load_labels(&cfg)?;
    let mut engine = create_engine(kind, &args.model, labels, args.imgsz, cfg.confidence)?;
    if !engine.supports(EngineCapability::Train) {
        bail!(
            "engine '{}' does not support training; train with the upstream model tooling and point --weights at the exported model",
            engine.name()
        );
    }

    let request = TrainRequest {
        data: args.data,
        base_model: args.model,
        epochs: args.epochs,
        image_size: args.imgsz,
        batch_size: args.batch,
    };
    let summary = engine.train(&request)?;

    log::info!(
        "training complete, best weights at {}",
        summary.best_weights.display()
    );
    println!("BEST_WEIGHTS={}", summary.best_weights.display());
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<()> {
    let mut cfg = TrashwatchConfig::load()?;
    if let Some(weights) = args.weights {
        cfg.weights = weights;
    }
    let weights = resolve_weights(Path::new(&cfg.weights));
    let kind = EngineKind::parse(&args.engine)?;
    let labels = load_labels(&cfg)?;
    let mut engine = create_engine(kind, &weights, labels, cfg.input_size, cfg.confidence)?;
    if !engine.supports(EngineCapability::Export) {
        bail!(
            "engine '{}' does not support model export; export with the upstream model tooling",
            engine.name()
        );
    }

    let request = ExportRequest {
        weights,
        format: args.format,
    };
    let exported = engine.export(&request)?;

    log::info!("exported model to {}", exported.display());
    println!("{}", exported.display());
    Ok(())
}

fn load_labels(cfg: &TrashwatchConfig) -> Result<Labels> {
    match &cfg.labels {
        Some(path) => Labels::from_file(path),
        None => Ok(Labels::single_class()),
    }
}
