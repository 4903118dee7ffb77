use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "framecast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a manifest headlessly into an in-memory surface.
    Play(PlayArgs),
    /// Write a manifest describing a directory of frames and one audio file.
    Manifest(ManifestArgs),
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Manifest URL (http, https, file) or path.
    #[arg(long)]
    manifest: String,

    /// Override the manifest frame rate.
    #[arg(long)]
    fps: Option<f64>,

    /// Override the manifest width.
    #[arg(long)]
    canvas_width: Option<u32>,

    /// Loop instead of ending after the last frame.
    #[arg(long = "loop")]
    looping: bool,

    /// Stop after this many seconds.
    #[arg(long)]
    seconds: Option<f64>,

    /// Write the last drawn frame to this PNG.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Pipeline options JSON.
    #[arg(long)]
    opts: Option<PathBuf>,

    /// Do not fetch or play audio.
    #[arg(long)]
    mute: bool,
}

#[derive(Parser, Debug)]
struct ManifestArgs {
    /// Directory holding the frames and the audio file.
    #[arg(long)]
    dir: PathBuf,

    /// Playback rate to record.
    #[arg(long, default_value_t = framecast::DEFAULT_FPS)]
    fps: f64,

    /// Audio file name (default: first audio file in the directory).
    #[arg(long)]
    audio: Option<String>,

    /// `basePath` to record.
    #[arg(long)]
    base_path: Option<String>,

    /// Output path (default: `<dir>/manifest.json`).
    #[arg(long)]
    out: Option<PathBuf>,
}

enum Event {
    Ready,
    End,
    Error(framecast::PlayerError),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Play(args) => cmd_play(args).await,
        Command::Manifest(args) => cmd_manifest(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn make_player(
    args: &PlayArgs,
    surface: framecast::SharedSurface,
    opts: framecast::PipelineOpts,
) -> anyhow::Result<framecast::Player> {
    let player = framecast::Player::new(surface, opts)?;
    if args.mute {
        return Ok(player.with_audio(Arc::new(framecast::SilentAudio::muted())));
    }

    #[cfg(feature = "media-ffmpeg")]
    let player = {
        let source = Arc::new(framecast::DefaultSource::new(player.opts().request_timeout())?);
        player.with_audio(Arc::new(framecast::FfplayAudio::new(source)))
    };
    Ok(player)
}

async fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let opts = match &args.opts {
        Some(path) => framecast::PipelineOpts::from_path(path)?,
        None => framecast::PipelineOpts::default(),
    };
    let limit = args
        .seconds
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("--seconds must be a non-negative number")?;

    let frame = Arc::new(Mutex::new(framecast::FrameBuffer::new()));
    let player = make_player(&args, frame.clone(), opts)?;

    let mut config = framecast::PlayerConfig::new(args.manifest.clone()).with_loop(args.looping);
    config.fps = args.fps;
    config.canvas_width = args.canvas_width;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (ready_tx, end_tx, error_tx) = (tx.clone(), tx.clone(), tx);
    let callbacks = framecast::Callbacks::new()
        .on_ready(move || {
            let _ = ready_tx.send(Event::Ready);
        })
        .on_end(move || {
            let _ = end_tx.send(Event::End);
        })
        .on_error(move |e| {
            let _ = error_tx.send(Event::Error(e));
        });

    let mut handle = player.start(config, callbacks);
    let deadline = async {
        match limit {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut failure = None;
    loop {
        tokio::select! {
            ev = rx.recv() => match ev {
                Some(Event::Ready) => tracing::info!("playing"),
                Some(Event::End) | None => break,
                Some(Event::Error(e)) => {
                    failure = Some(e);
                    break;
                }
            },
            () = &mut deadline => {
                tracing::info!("time limit reached");
                break;
            }
            r = tokio::signal::ctrl_c() => {
                r.context("listen for ctrl-c")?;
                tracing::info!("interrupted");
                break;
            }
        }
    }

    let report = handle.stop().await;
    tracing::info!(
        frames_released = report.frames_released,
        tick_cancelled = report.tick_cancelled,
        audio_paused = report.audio_paused,
        "session stopped"
    );

    if let Some(out) = &args.out
        && failure.is_none()
    {
        let frame = frame.lock().unwrap_or_else(PoisonError::into_inner);
        frame.save_png(out)?;
        eprintln!("wrote {}", out.display());
    }

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn cmd_manifest(args: ManifestArgs) -> anyhow::Result<()> {
    let opts = framecast::GenerateOpts {
        fps: args.fps,
        audio: args.audio,
        base_path: args.base_path,
    };
    let doc = framecast::generate_manifest(&args.dir, &opts)?;
    let out = args.out.unwrap_or_else(|| args.dir.join("manifest.json"));
    framecast::write_manifest(&out, &doc)?;
    eprintln!("wrote {} ({} frames)", out.display(), doc.frames.len());
    Ok(())
}
