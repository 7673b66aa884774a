use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use stridash::{
    CancelToken, EncoderOpts, ExportOpts, ExportRequest, FfmpegSink, FfmpegSinkOpts,
    FfmpegVideoSource, FontSource, FrameComposer, FrameIndex, LiveOpts, Pacing, RenderPhase,
    RenderProgress, VideoSource,
};

#[derive(Parser, Debug)]
#[command(name = "stridash", version, about = "Activity gauge overlays for action video")]
struct Cli {
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one composited frame as a PNG.
    Frame(FrameArgs),
    /// Composite gauges over a video into an MP4 (requires `ffmpeg`).
    Export(ExportArgs),
    /// Capture the live overlay into an MP4 in real time (requires `ffmpeg`).
    Preview(PreviewArgs),
    /// Print the built-in gauge layouts as JSON.
    Presets,
}

#[derive(Parser, Debug)]
struct RequestArgs {
    /// Export request JSON (`fitTimeline`, `sync`, `gauges`, `videoMeta`).
    #[arg(long = "request")]
    request: PathBuf,

    /// Source video; defaults to `videoMeta.filePath`.
    #[arg(long)]
    video: Option<PathBuf>,

    /// TTF/OTF font for gauge text; falls back to a system font.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Render gauges without text.
    #[arg(long, default_value_t = false, conflicts_with = "font")]
    no_text: bool,

    /// Draw dimmed placeholders for gauges without data.
    #[arg(long, default_value_t = false)]
    placeholders: bool,
}

impl RequestArgs {
    fn load(&self) -> anyhow::Result<ExportRequest> {
        let bytes = std::fs::read(&self.request)
            .with_context(|| format!("read request '{}'", self.request.display()))?;
        ExportRequest::from_json(&bytes)
            .with_context(|| format!("invalid request '{}'", self.request.display()))
    }

    fn font(&self) -> FontSource {
        match (&self.font, self.no_text) {
            (_, true) => FontSource::Disabled,
            (Some(path), false) => FontSource::File(path.clone()),
            (None, false) => FontSource::Auto,
        }
    }

    fn video_path<'a>(&'a self, req: &'a ExportRequest) -> Option<&'a Path> {
        self.video.as_deref().or_else(|| req.video_path())
    }
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    req: RequestArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Leave the background transparent instead of decoding the video.
    #[arg(long, default_value_t = false)]
    overlay_only: bool,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    req: RequestArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Refuse to replace an existing output file.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    /// Encoded stills buffered between compositing and the encoder.
    #[arg(long, default_value_t = 4)]
    capacity: usize,

    /// Kill the encoder after this many seconds.
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,

    /// x264 preset.
    #[arg(long, default_value = "medium")]
    preset: String,

    /// x264 constant rate factor.
    #[arg(long, default_value_t = 18)]
    crf: u8,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    req: RequestArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Deliver frames as fast as they render instead of in real time.
    #[arg(long, default_value_t = false)]
    unpaced: bool,

    /// Skip the source video and capture gauges over black.
    #[arg(long, default_value_t = false)]
    overlay_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Presets => cmd_presets(),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let req = args.req.load()?;
    let comp = req.composition()?;
    let total = comp.total_frames();
    if args.frame >= total {
        anyhow::bail!("frame {} is out of range (0..{total})", args.frame);
    }

    let font = args.req.font().load();
    let mut composer = FrameComposer::new(comp, font.as_deref().map(Vec::as_slice))
        .with_placeholders(args.req.placeholders);

    let mut video = match (args.overlay_only, args.req.video_path(&req)) {
        (false, Some(path)) => Some(FfmpegVideoSource::new(path, req.video_meta.duration)),
        _ => None,
    };
    let frame = composer.compose_frame(
        FrameIndex(args.frame),
        video.as_mut().map(|v| v as &mut dyn VideoSource),
    )?;

    stridash::encode::png::write_png(&args.out, &frame)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let req = args.req.load()?;
    let video = args
        .req
        .video_path(&req)
        .context("no source video: pass --video or set videoMeta.filePath")?
        .to_path_buf();
    let comp = req.composition()?;

    let opts = ExportOpts::default()
        .with_channel_capacity(args.capacity)
        .with_font(args.req.font())
        .with_encoder(
            EncoderOpts::default()
                .with_overwrite(!args.no_overwrite)
                .with_preset(args.preset)
                .with_crf(args.crf)
                .with_timeout(Duration::from_secs(args.timeout_secs)),
        );
    let opts = ExportOpts {
        show_placeholders: args.req.placeholders,
        ..opts
    };

    let stats = stridash::export_overlay(
        comp,
        &video,
        &args.out,
        &opts,
        &mut log_progress,
        &CancelToken::new(),
    )?;
    eprintln!(
        "wrote {} ({} frames in {:.1}s)",
        args.out.display(),
        stats.frames,
        stats.elapsed.as_secs_f64()
    );
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let req = args.req.load()?;
    let comp = req.composition()?;

    let mut video = match (args.overlay_only, args.req.video_path(&req)) {
        (false, Some(path)) => Some(FfmpegVideoSource::new(path, req.video_meta.duration)),
        _ => None,
    };
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&args.out));
    let opts = LiveOpts::default()
        .with_pacing(if args.unpaced {
            Pacing::Unpaced
        } else {
            Pacing::Realtime
        })
        .with_font(args.req.font())
        .with_placeholders(args.req.placeholders);

    let stats = stridash::render_live(
        comp,
        video.as_mut().map(|v| v as &mut dyn VideoSource),
        &mut sink,
        &opts,
        &mut log_progress,
        &CancelToken::new(),
    )?;
    eprintln!(
        "wrote {} ({} frames in {:.1}s)",
        args.out.display(),
        stats.frames,
        stats.elapsed.as_secs_f64()
    );
    Ok(())
}

fn cmd_presets() -> anyhow::Result<()> {
    let presets = stridash::gauge::preset::presets();
    println!("{}", serde_json::to_string_pretty(&presets)?);
    Ok(())
}

fn log_progress(p: RenderProgress) {
    match p.phase {
        RenderPhase::Rendering => {
            if p.current_frame.is_multiple_of(30) || p.current_frame + 1 == p.total_frames {
                tracing::info!(
                    frame = p.current_frame,
                    total = p.total_frames,
                    "rendering {:.0}%",
                    p.fraction() * 100.0
                );
            }
        }
        phase => tracing::info!(?phase, total = p.total_frames, "phase"),
    }
}
