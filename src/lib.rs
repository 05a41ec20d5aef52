//! ocrlabel: OCR annotation toolkit.
//!
//! ocrlabel runs text detection over uploaded images with a choice of
//! engines, stores the resulting labels per project, and exports projects
//! as PaddleOCR-style datasets (`images/` plus `labels/`, zipped).
//!
//! # Modules
//!
//! - [`geometry`]: Canonical boxes and normalization of backend output
//! - [`model`]: Projects, images and labels
//! - [`detect`]: Detection engines, model providers and the model registry
//! - [`classify`]: Per-image text-only vs. regional classification
//! - [`export`]: Dataset export into a zip archive
//! - [`store`]: JSON-file project store
//! - [`validation`]: Project validation and error reporting
//! - [`error`]: Error types for ocrlabel operations

pub mod classify;
pub mod detect;
pub mod error;
pub mod export;
pub mod geometry;
pub mod model;
pub mod store;
pub mod validation;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

pub use error::OcrLabelError;

use detect::{DetectionEngine, EngineConfig, EngineKind, ModelRegistry, WorkerProvider};
use model::{ImageId, LabelGeometry, NewLabel, ProjectId};
use store::{ProjectSource, ProjectStore};

/// The ocrlabel CLI application.
#[derive(Parser)]
#[command(name = "ocrlabel")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Project store file.
    #[arg(long, global = true, env = "OCRLABEL_STORE", default_value = "ocrlabel.json")]
    store: PathBuf,

    /// Log progress to stderr (repeat for more detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create a new project.
    CreateProject(CreateProjectArgs),
    /// Copy image files into a project.
    Upload(UploadArgs),
    /// Add a regional or text-only label to an image.
    AddLabel(AddLabelArgs),
    /// Remove all labels from an image or a whole project.
    CleanLabels(CleanLabelsArgs),
    /// Detect and read text in an image.
    Detect(DetectArgs),
    /// Validate a project for errors and warnings.
    Validate(ValidateArgs),
    /// Export a project as a PaddleOCR-style zip dataset.
    Export(ExportArgs),
}

#[derive(clap::Args)]
struct CreateProjectArgs {
    /// Project name.
    name: String,

    /// Optional description.
    #[arg(long)]
    description: Option<String>,
}

#[derive(clap::Args)]
struct UploadArgs {
    /// Project to add the images to.
    #[arg(long)]
    project: u64,

    /// Image files to upload.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory uploaded files are copied into (default: `uploads/` next to
    /// the store file).
    #[arg(long)]
    uploads_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
struct AddLabelArgs {
    /// Image to label.
    #[arg(long)]
    image: u64,

    /// Label text.
    #[arg(long)]
    text: String,

    /// Box left edge in pixels. Omit all four box values for a text-only label.
    #[arg(long, allow_negative_numbers = true)]
    x: Option<f64>,

    /// Box top edge in pixels.
    #[arg(long, allow_negative_numbers = true)]
    y: Option<f64>,

    /// Box width in pixels.
    #[arg(long, allow_negative_numbers = true)]
    width: Option<f64>,

    /// Box height in pixels.
    #[arg(long, allow_negative_numbers = true)]
    height: Option<f64>,
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct CleanLabelsArgs {
    /// Clean a single image.
    #[arg(long)]
    image: Option<u64>,

    /// Clean every image of a project.
    #[arg(long)]
    project: Option<u64>,
}

#[derive(clap::Args)]
struct DetectArgs {
    /// Image file to run detection on.
    input: PathBuf,

    /// Detection engine ('joint' or 'two-stage').
    #[arg(long, default_value = "joint")]
    engine: String,

    /// YAML file naming the worker command for each model.
    #[arg(long, env = "OCRLABEL_ENGINES")]
    config: Option<PathBuf>,

    /// Store the detections as regional labels of this image.
    #[arg(long)]
    image_id: Option<u64>,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Project to validate.
    #[arg(long)]
    project: u64,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Project to export.
    #[arg(long)]
    project: u64,

    /// Destination file or directory (default: the suggested file name in
    /// the current directory).
    #[arg(long, short)]
    output: Option<PathBuf>,
}

/// Run the ocrlabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), OcrLabelError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::CreateProject(args)) => run_create_project(&cli.store, args),
        Some(Commands::Upload(args)) => run_upload(&cli.store, args),
        Some(Commands::AddLabel(args)) => run_add_label(&cli.store, args),
        Some(Commands::CleanLabels(args)) => run_clean_labels(&cli.store, args),
        Some(Commands::Detect(args)) => run_detect(&cli.store, args),
        Some(Commands::Validate(args)) => run_validate(&cli.store, args),
        Some(Commands::Export(args)) => run_export(&cli.store, args),
        None => {
            println!("ocrlabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("OCR annotation toolkit.");
            println!();
            println!("Run 'ocrlabel --help' for usage information.");
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_create_project(store_path: &Path, args: CreateProjectArgs) -> Result<(), OcrLabelError> {
    let mut store = ProjectStore::open(store_path)?;
    let project = store.create_project(args.name, args.description);
    store.save(store_path)?;
    println!("Created project {} '{}'", project.id, project.name);
    Ok(())
}

fn run_upload(store_path: &Path, args: UploadArgs) -> Result<(), OcrLabelError> {
    let mut store = ProjectStore::open(store_path)?;
    let uploads_dir = args.uploads_dir.unwrap_or_else(|| {
        store_path
            .parent()
            .map(|parent| parent.join("uploads"))
            .unwrap_or_else(|| PathBuf::from("uploads"))
    });

    let project_id = ProjectId::new(args.project);
    for file in &args.files {
        let image = store.add_image(project_id, file, &uploads_dir)?;
        println!("Uploaded image {} '{}'", image.id, image.filename);
    }
    store.save(store_path)
}

fn run_add_label(store_path: &Path, args: AddLabelArgs) -> Result<(), OcrLabelError> {
    let mut store = ProjectStore::open(store_path)?;
    let geometry = LabelGeometry::from_parts(args.x, args.y, args.width, args.height)?;
    let label = store.create_label(NewLabel {
        image_id: ImageId::new(args.image),
        text: args.text,
        geometry,
    })?;
    store.save(store_path)?;
    println!(
        "Added {} label {} to image {}",
        label.kind(),
        label.id,
        label.image_id
    );
    Ok(())
}

fn run_clean_labels(store_path: &Path, args: CleanLabelsArgs) -> Result<(), OcrLabelError> {
    let mut store = ProjectStore::open(store_path)?;
    let removed = match (args.image, args.project) {
        (Some(image), _) => store.clean_image_labels(ImageId::new(image))?,
        (None, Some(project)) => store.clean_project_labels(ProjectId::new(project))?,
        (None, None) => 0,
    };
    store.save(store_path)?;
    println!("Removed {} label(s)", removed);
    Ok(())
}

fn run_detect(store_path: &Path, args: DetectArgs) -> Result<(), OcrLabelError> {
    // Reject unknown engines before touching config, models or images.
    let kind: EngineKind = args.engine.parse()?;

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let registry = ModelRegistry::install_global(WorkerProvider::new(config));
    let engine = DetectionEngine::new(kind, registry);
    let detections = engine.process_image(&args.input)?;

    let json = serde_json::to_string_pretty(&detections).map_err(|err| {
        OcrLabelError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })?;
    println!("{}", json);

    if let Some(image_id) = args.image_id {
        let mut store = ProjectStore::open(store_path)?;
        let saved = store.save_detections(ImageId::new(image_id), &detections)?;
        store.save(store_path)?;
        eprintln!("Saved {} label(s) to image {}", saved.len(), image_id);
    }
    Ok(())
}

fn run_validate(store_path: &Path, args: ValidateArgs) -> Result<(), OcrLabelError> {
    let store = ProjectStore::open(store_path)?;
    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_project(&store, ProjectId::new(args.project), &opts)?;

    match args.output.as_str() {
        "json" => {
            let json = serde_json::json!({
                "error_count": report.error_count(),
                "warning_count": report.warning_count(),
                "issues": report.issues,
            });
            println!("{:#}", json);
        }
        _ => print!("{}", report),
    }

    if opts.passes(&report) {
        Ok(())
    } else {
        Err(OcrLabelError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    }
}

fn run_export(store_path: &Path, args: ExportArgs) -> Result<(), OcrLabelError> {
    let store = ProjectStore::open(store_path)?;
    let project_id = ProjectId::new(args.project);
    let project = store.project(project_id)?;

    let archive = export::export_project(&store, project_id)?;
    let dest = args
        .output
        .unwrap_or_else(|| PathBuf::from(archive.suggested_filename()));
    let written = archive.persist(&dest)?;

    println!("Exported project {} '{}':", project.id, project.name);
    print!("{}", archive.report());
    println!("  wrote {}", written.display());
    Ok(())
}
