use clap::{Parser, Subcommand};
use std::path::PathBuf;

use heritage_studio::config::Config;
use heritage_studio::engine;
use heritage_studio::error::EngineError;
use heritage_studio::request::{EditRequest, OverlayPosition, TextOverlay};
use heritage_studio::{catalog, init};

#[derive(Parser)]
#[command(name = "heritage-studio")]
#[command(about = "Assemble and edit narrated videos with ffmpeg", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a video from an ordered image sequence and a narration track
    Images {
        /// Image files, in display order
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Narration audio file
        #[arg(short, long)]
        audio: PathBuf,
        /// Output file name (without extension)
        #[arg(short, long, default_value = "final_video")]
        output: String,
    },
    /// Build a video from an existing clip
    Clip {
        /// Source video clip
        clip: PathBuf,
        /// Narration track that replaces the clip's audio
        #[arg(short, long)]
        audio: Option<PathBuf>,
        /// Keep the clip's original audio instead
        #[arg(long, conflicts_with = "audio")]
        keep_original_audio: bool,
        /// Output file name (without extension)
        #[arg(short, long, default_value = "final_video")]
        output: String,
    },
    /// Trim, speed up or slow down, and overlay text on a rendered video
    Edit {
        /// Video to edit
        video: PathBuf,
        /// Trim window start in seconds
        #[arg(long, default_value_t = 0.0)]
        start: f64,
        /// Trim window end in seconds; omit to keep until the end
        #[arg(long)]
        end: Option<f64>,
        /// Playback speed multiplier
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// Overlay text
        #[arg(long)]
        text: Option<String>,
        #[arg(long, default_value_t = 50)]
        font_size: u32,
        #[arg(long, default_value = "#FFFFFF")]
        color: String,
        #[arg(long, value_enum, default_value_t = OverlayPosition::Center)]
        position: OverlayPosition,
        /// Output file name; defaults to edited_<source stem>
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List rendered videos, newest first
    List,
}

fn report(err: &EngineError) {
    match err {
        EngineError::InvalidInput(message) => eprintln!("[INVALID INPUT] {message}"),
        EngineError::Media { message, source } => {
            eprintln!("[MEDIA ERROR] {message}");
            if let Some(cause) = source {
                eprintln!("  caused by: {cause}");
            }
        }
    }
}

async fn run(cfg: &Config, command: Command) -> Result<(), EngineError> {
    match command {
        Command::Images {
            images,
            audio,
            output,
        } => {
            let path = engine::assemble_from_images(cfg, &images, &audio, &output).await?;
            println!("{}", path.display());
        }
        Command::Clip {
            clip,
            audio,
            keep_original_audio,
            output,
        } => {
            let path =
                engine::assemble_from_clip(cfg, &clip, audio.as_deref(), keep_original_audio, &output)
                    .await?;
            println!("{}", path.display());
        }
        Command::Edit {
            video,
            start,
            end,
            speed,
            text,
            font_size,
            color,
            position,
            output,
        } => {
            let overlay = match text {
                Some(text) => Some(TextOverlay::new(text, font_size, color, position)?),
                None => None,
            };
            let output = output.unwrap_or_else(|| engine::edited_output_name(&video));
            let request = EditRequest::new(start, end, speed, overlay, output)?;
            let path = engine::edit(cfg, &video, &request).await?;
            println!("{}", path.display());
        }
        Command::List => {
            for path in catalog::list_rendered(cfg)? {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config).await?;

    init::ensure_directories(&cfg).await?;
    if !init::check_ffmpeg().await {
        eprintln!("[WARNING] FFmpeg or ffprobe not found in PATH. Please install FFmpeg.");
    }

    if let Err(err) = run(&cfg, cli.command).await {
        report(&err);
        std::process::exit(1);
    }

    Ok(())
}
