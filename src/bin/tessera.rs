use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "tessera", version)]
struct Cli {
    /// Log cache hits/misses and per-stage details.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cut one masked fragment out of an image and write it as a PNG.
    Fragment(FragmentArgs),
    /// Render a project's atlas to a PNG.
    Export(ExportArgs),
    /// Mip-flood the transparent texels of an existing PNG.
    Flood(FloodArgs),
}

#[derive(Parser, Debug)]
struct FragmentArgs {
    /// Source image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Polygon vertex `x,y` in source pixels (repeat, at least 3).
    #[arg(long = "point", value_parser = parse_point, required = true)]
    points: Vec<tessera::Point>,

    /// Physical width of the masked region in meters.
    #[arg(long, default_value_t = 1.0)]
    real_width: f64,

    /// Atlas density in pixels per meter.
    #[arg(long, default_value_t = tessera::DEFAULT_DENSITY)]
    density: f64,

    #[command(flatten)]
    filter: FilterArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Skip the mip-flood post-process.
    #[arg(long)]
    no_flood: bool,

    #[command(flatten)]
    flood: FloodParams,
}

#[derive(Parser, Debug)]
struct FloodArgs {
    /// Input PNG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    flood: FloodParams,
}

#[derive(clap::Args, Debug)]
struct FloodParams {
    /// Texels with alpha above this value count as covered.
    #[arg(long, default_value_t = 0)]
    alpha_threshold: u8,

    /// Pyramid halvings; 0 or less builds the full pyramid.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    levels: i32,
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Resampling filter.
    #[arg(long, value_enum, default_value_t = FilterChoice::Lanczos)]
    filter: FilterChoice,

    /// Kaiser window shape.
    #[arg(long)]
    beta: Option<f64>,

    /// Kaiser support radius in source texels.
    #[arg(long, allow_negative_numbers = true)]
    radius: Option<i64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FilterChoice {
    Nearest,
    Lanczos,
    Kaiser,
}

impl From<FilterChoice> for tessera::FilterMode {
    fn from(c: FilterChoice) -> Self {
        match c {
            FilterChoice::Nearest => Self::Nearest,
            FilterChoice::Lanczos => Self::Lanczos,
            FilterChoice::Kaiser => Self::Kaiser,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Fragment(args) => cmd_fragment(args),
        Command::Export(args) => cmd_export(args),
        Command::Flood(args) => cmd_flood(args),
    }
}

fn parse_point(s: &str) -> Result<tessera::Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected 'x,y', got '{s}'"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x in '{s}': {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y in '{s}': {e}"))?;
    Ok(tessera::Point::new(x, y))
}

fn cmd_fragment(args: FragmentArgs) -> anyhow::Result<()> {
    let root = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let file = args
        .in_path
        .file_name()
        .map(PathBuf::from)
        .with_context(|| format!("input '{}' has no file name", args.in_path.display()))?;
    let sources: Arc<dyn tessera::SourceStore> = Arc::new(tessera::FsSourceStore::new(root));

    let filter = tessera::ResampleFilter::from_mode(
        args.filter.filter.into(),
        args.filter.beta,
        args.filter.radius,
    )?;
    let config = tessera::AtlasConfig {
        density: args.density,
        filter,
        ..tessera::AtlasConfig::default()
    };
    let engine = tessera::AtlasEngine::new(
        Arc::clone(&sources),
        config,
        tessera::EngineOpts::from_env(),
    )?;

    let texture = tessera::Texture::open(sources.as_ref(), file, 1.0)?;
    let mask = tessera::Mask::new(tessera::MaskId(0), args.points, args.real_width)?;
    let fragment = engine.build_fragment(&texture, &mask)?;

    write_png(&args.out, &fragment.image)?;
    eprintln!(
        "wrote {} ({}x{}, scale {:.4})",
        args.out.display(),
        fragment.width(),
        fragment.height(),
        fragment.scale_factor
    );
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let project = tessera::AtlasProject::load(&args.in_path)?;
    let root = project.source_root(&args.in_path);
    let sources: Arc<dyn tessera::SourceStore> = Arc::new(tessera::FsSourceStore::new(root));
    let engine =
        tessera::AtlasEngine::for_project(sources, &project, tessera::EngineOpts::from_env())?;

    let render = engine.render_atlas(&project, || false)?;
    for failure in &render.report.failed {
        eprintln!("skipped fragment {}: {}", failure.index, failure.error);
    }

    let image = if args.no_flood {
        render.image
    } else {
        engine.flood(&render.image, args.flood.alpha_threshold, args.flood.levels)
    };
    write_png(&args.out, &image)?;
    eprintln!(
        "wrote {} ({} fragments, {} skipped)",
        args.out.display(),
        render.report.built.len(),
        render.report.failed.len()
    );
    Ok(())
}

fn cmd_flood(args: FloodArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read '{}'", args.in_path.display()))?;
    let mut image = tessera::decode_rgba8(&bytes)
        .with_context(|| format!("decode '{}'", args.in_path.display()))?;
    tessera::flood_in_place(&mut image, args.flood.alpha_threshold, args.flood.levels);
    write_png(&args.out, &image)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn write_png(path: &Path, image: &tessera::RgbaImage) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        path,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}
