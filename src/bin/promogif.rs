use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use promogif::{
    AnimationClock, CancelToken, Coordinator, DirSink, FrameSampler, FsFetcher, GenerateOutcome,
    OutputProfile, PipelineConfig, PromoScene, ProxyFetcher, ResourceFetcher, SceneHandle,
    SvgRasterizer, TracingObserver,
};

#[derive(Parser, Debug)]
#[command(name = "promogif", version)]
struct Cli {
    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the animated GIF.
    Render(RenderArgs),
    /// Render a single downsampled frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct SourceArgs {
    /// Scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Directory that relative image paths resolve against (defaults to the scene's directory).
    #[arg(long, conflicts_with = "proxy")]
    assets: Option<PathBuf>,

    /// Image proxy endpoint, e.g. `http://localhost:3000/api/proxy-image`.
    #[arg(long)]
    proxy: Option<String>,

    /// Extra directory of `.ttf`/`.otf` fonts.
    #[arg(long)]
    fonts: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Pipeline config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output size: small, medium or large.
    #[arg(long)]
    profile: Option<OutputProfile>,

    /// Number of frames to capture.
    #[arg(long)]
    frames: Option<u32>,

    /// Enable Floyd-Steinberg dithering.
    #[arg(long, default_value_t = false)]
    dither: bool,

    /// Directory the GIF is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Animation clock value to capture.
    #[arg(long, default_value_t = 0)]
    clock: u32,

    /// Output size: small, medium or large.
    #[arg(long, default_value = "medium")]
    profile: OutputProfile,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    match cli.cmd {
        Command::Render(args) => cmd_render(args).await,
        Command::Frame(args) => cmd_frame(args).await,
    }
}

fn build_sampler(source: &SourceArgs) -> anyhow::Result<FrameSampler<SvgRasterizer>> {
    let scene = PromoScene::from_path(&source.scene)?;

    let fetcher: Arc<dyn ResourceFetcher> = match (&source.proxy, &source.assets) {
        (Some(endpoint), _) => Arc::new(ProxyFetcher::new(endpoint.clone())?),
        (None, Some(dir)) => Arc::new(FsFetcher::new(dir)),
        (None, None) => {
            let root = source.scene.parent().unwrap_or_else(|| Path::new("."));
            Arc::new(FsFetcher::new(root))
        }
    };

    let mut rasterizer = SvgRasterizer::new(fetcher);
    if let Some(dir) = &source.fonts {
        rasterizer = rasterizer.with_font_dir(dir);
    }

    let handle = SceneHandle::new(scene, AnimationClock::default());
    Ok(FrameSampler::new(handle, rasterizer))
}

async fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(profile) = args.profile {
        config.output_profile = profile;
    }
    if let Some(frames) = args.frames {
        config.total_frames = frames;
    }
    if args.dither {
        config.encoder.dither = true;
    }

    let sampler = build_sampler(&args.source)?;
    let sink = DirSink::new(&args.out_dir);
    let coordinator =
        Coordinator::new(sampler, sink, config)?.with_observer(Arc::new(TracingObserver));

    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling run");
            on_signal.cancel();
        }
    });

    match coordinator.generate(&cancel).await? {
        GenerateOutcome::Delivered(info) => {
            eprintln!(
                "wrote {} ({} frames, {} bytes)",
                args.out_dir.join(&info.filename).display(),
                info.frame_count,
                info.byte_len
            );
        }
        GenerateOutcome::Ignored => anyhow::bail!("a run is already in progress"),
    }
    Ok(())
}

async fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut sampler = build_sampler(&args.source)?;
    let cancel = CancelToken::new();
    sampler.prepare(&cancel).await?;
    let pixels = sampler.capture_at(args.clock, &cancel).await?;

    let spec = args.profile.spec();
    let frame = tokio::task::spawn_blocking(move || {
        promogif::downsample(pixels, spec.target_width, spec.target_height)
    })
    .await
    .context("downsample task failed")??;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
