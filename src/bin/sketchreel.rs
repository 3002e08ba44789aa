use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sketchreel::publish::{EnvS3Publisher, Publisher, resolve_output_path};
use sketchreel::request::{
    ImageSpec, SourceRef, parse_captions, parse_image_list, read_input_file,
};
use sketchreel::{
    CursorChoice, Engine, MediaOptions, RenderConfig, RenderMode, RenderRequest, ResolvedRequest,
};
use tracing_subscriber::EnvFilter;

/// Scene length for single-image reveal when `--seconds` is not given.
const DEFAULT_SINGLE_IMAGE_SECONDS: f64 = 6.0;

#[derive(Parser, Debug)]
#[command(name = "sketchreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pencil-reveal video from one image or an image-list file.
    Reveal(RevealArgs),
    /// Pan-zoom video from an image-list file.
    PanZoom(PanZoomArgs),
    /// Render a JSON request payload.
    Request(RequestArgs),
}

#[derive(Args, Debug)]
struct RevealArgs {
    /// Single image (path or URL).
    #[arg(required_unless_present = "multi", conflicts_with = "multi")]
    image: Option<String>,

    /// Image-list JSON file: `[{"image": .., "seconds": ..}, ..]`.
    #[arg(long, value_name = "LIST")]
    multi: Option<PathBuf>,

    /// Scene length for a single image.
    #[arg(long, conflicts_with = "multi")]
    seconds: Option<f64>,

    /// Cursor image drawn at the pencil tip (default: built-in pencil).
    #[arg(long, conflicts_with = "no_cursor")]
    cursor: Option<PathBuf>,

    /// Draw no cursor.
    #[arg(long)]
    no_cursor: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct PanZoomArgs {
    /// Image-list JSON file.
    list: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Request payload JSON file.
    request: PathBuf,

    /// Scene treatment.
    #[arg(long, value_enum, default_value_t = ModeChoice::Reveal)]
    mode: ModeChoice,

    /// Output file name or path (default: generated under the output directory).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Upload the finished video to S3.
    #[arg(long)]
    upload: bool,

    /// Partial JSON render config overlaid on the defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Background audio (path or URL).
    #[arg(long)]
    audio: Option<String>,

    /// Background audio gain in [0, 1].
    #[arg(long)]
    volume: Option<f64>,

    /// Pad a short track with silence instead of looping it.
    #[arg(long)]
    no_loop: bool,

    /// Aspect ratio: 16:9, 9:16, 1:1, 4:5 or 4:3.
    #[arg(long)]
    ratio: Option<String>,

    /// Output quality: 480p, 720p, 1080p, 1440p or 2160p.
    #[arg(long)]
    quality: Option<String>,

    /// Caption alignment JSON file.
    #[arg(long)]
    captions: Option<PathBuf>,

    /// Output file name or path (default: generated under the output directory).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Upload the finished video to S3.
    #[arg(long)]
    upload: bool,

    /// Partial JSON render config overlaid on the defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeChoice {
    Reveal,
    PanZoom,
}

impl From<ModeChoice> for RenderMode {
    fn from(m: ModeChoice) -> Self {
        match m {
            ModeChoice::Reveal => Self::Reveal,
            ModeChoice::PanZoom => Self::PanZoom,
        }
    }
}

/// Everything a subcommand resolves before the engine runs.
struct Job {
    config: RenderConfig,
    request: ResolvedRequest,
    mode: RenderMode,
    cursor: CursorChoice,
    out: Option<PathBuf>,
    upload: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let job = match cli.cmd {
        Command::Reveal(args) => reveal_job(args)?,
        Command::PanZoom(args) => pan_zoom_job(args)?,
        Command::Request(args) => request_job(args)?,
    };
    run(job)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RenderConfig> {
    match path {
        Some(path) => Ok(RenderConfig::from_path(path)?),
        None => Ok(RenderConfig::default()),
    }
}

fn media_options(common: &CommonArgs) -> MediaOptions {
    MediaOptions {
        audio: common.audio.clone(),
        volume: common.volume,
        loop_audio: Some(!common.no_loop),
        ratio: common.ratio.clone(),
        quality: common.quality.clone(),
    }
}

fn load_list(path: &Path) -> anyhow::Result<Vec<ImageSpec>> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let images = parse_image_list(&read_input_file(path, "image list")?)?;
    Ok(images
        .into_iter()
        .map(|spec| ImageSpec {
            source: spec.source.rebase(base),
            ..spec
        })
        .collect())
}

fn resolve_common(
    images: Vec<ImageSpec>,
    common: &CommonArgs,
    config: &RenderConfig,
) -> anyhow::Result<ResolvedRequest> {
    let captions = common
        .captions
        .as_deref()
        .map(|p| read_input_file(p, "captions").and_then(|text| parse_captions(&text)))
        .transpose()?;
    Ok(ResolvedRequest::from_parts(
        images,
        &media_options(common),
        captions,
        config,
    )?)
}

fn reveal_job(args: RevealArgs) -> anyhow::Result<Job> {
    let config = load_config(args.common.config.as_deref())?;
    let images = match (&args.image, &args.multi) {
        (_, Some(list)) => load_list(list)?,
        (Some(image), None) => vec![ImageSpec {
            source: SourceRef::parse(image)?,
            seconds: args.seconds.unwrap_or(DEFAULT_SINGLE_IMAGE_SECONDS),
            direction: None,
        }],
        (None, None) => anyhow::bail!("reveal needs an image or --multi <list>"),
    };
    let request = resolve_common(images, &args.common, &config)?;
    let cursor = match (args.no_cursor, args.cursor) {
        (true, _) => CursorChoice::Hidden,
        (false, Some(path)) => CursorChoice::File(path),
        (false, None) => CursorChoice::Procedural,
    };
    Ok(Job {
        config,
        request,
        mode: RenderMode::Reveal,
        cursor,
        out: args.common.out,
        upload: args.common.upload,
    })
}

fn pan_zoom_job(args: PanZoomArgs) -> anyhow::Result<Job> {
    let config = load_config(args.common.config.as_deref())?;
    let images = load_list(&args.list)?;
    let request = resolve_common(images, &args.common, &config)?;
    Ok(Job {
        config,
        request,
        mode: RenderMode::PanZoom,
        cursor: CursorChoice::Hidden,
        out: args.common.out,
        upload: args.common.upload,
    })
}

fn request_job(args: RequestArgs) -> anyhow::Result<Job> {
    let config = load_config(args.config.as_deref())?;
    let request = RenderRequest::from_path(&args.request)?.validate(&config)?;
    let base = args.request.parent().unwrap_or_else(|| Path::new("."));
    let request = ResolvedRequest {
        images: request
            .images
            .into_iter()
            .map(|spec| ImageSpec {
                source: spec.source.rebase(base),
                ..spec
            })
            .collect(),
        ..request
    };
    Ok(Job {
        config,
        request,
        mode: args.mode.into(),
        cursor: CursorChoice::default(),
        out: args.out,
        upload: args.upload,
    })
}

fn run(job: Job) -> anyhow::Result<()> {
    let publisher: Option<Arc<dyn Publisher>> = if job.upload {
        Some(Arc::new(EnvS3Publisher::new()))
    } else {
        None
    };
    let out = resolve_output_path(&job.config.output_dir, job.out.as_deref());
    let engine = Engine::new(job.config)?
        .with_cursor(job.cursor)
        .with_publisher(publisher);

    let outcome = engine
        .render(&job.request, job.mode, &out)
        .with_context(|| format!("render {} video", job.mode.label()))?;
    match &outcome.url {
        Some(url) => println!("{url}"),
        None => println!("{}", outcome.path.display()),
    }
    Ok(())
}
