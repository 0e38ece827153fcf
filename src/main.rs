use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use voxloop::config::Config;
use voxloop::controller::SessionController;
use voxloop::selection::{self, FileCandidate};
use voxloop::surface::{ConsoleSurface, View};

#[derive(Parser)]
#[command(name = "voxloop")]
#[command(about = "Voice-to-voice assistant client: upload a recording, hear the reply")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one recording and play the reply
    Send {
        file: PathBuf,

        /// Override the configured backend base URL
        #[arg(short, long)]
        backend_url: Option<String>,

        /// Save the reply without playing it
        #[arg(long)]
        no_play: bool,
    },
    /// Interactive session: select, process and reset in a loop
    Session,
    /// Print the config file location
    ConfigPath,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(|| dirs::config_dir().map(|d| d.join("voxloop/config.toml")))
        .ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

    match cli.command {
        Some(Commands::ConfigPath) => {
            println!("{}", config_path.display());
        }
        Some(Commands::Send {
            file,
            backend_url,
            no_play,
        }) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async {
                let mut config = Config::load(&config_path).await?;
                if let Some(url) = backend_url {
                    config.backend.base_url = url;
                }
                if no_play {
                    config.playback.autoplay = false;
                }
                info!("Sending {} through the pipeline", file.display());
                send_once(config, &file).await
            })?;
        }
        Some(Commands::Session) | None => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async {
                let config = Config::load(&config_path).await?;
                info!("Starting voxloop session");
                run_session(config).await
            })?;
        }
    }

    Ok(())
}

async fn send_once(config: Config, file: &Path) -> Result<()> {
    let surface = ConsoleSurface::new(&config.ui);
    let mut controller = SessionController::new(config, Box::new(surface));

    let candidate = FileCandidate::from_path(file).await?;
    controller.select_file(candidate);
    if !controller.can_process() {
        anyhow::bail!("File was rejected");
    }

    controller.process_selection().await;

    match controller.view() {
        View::Error { message } => anyhow::bail!("{}", message),
        _ => Ok(()),
    }
}

async fn run_session(config: Config) -> Result<()> {
    let surface = ConsoleSurface::new(&config.ui);
    let mut controller = SessionController::new(config, Box::new(surface));

    println!("voxloop session. Type 'help' for commands.");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let line = line.trim();
        let (cmd, arg) = line
            .split_once(' ')
            .map(|(c, a)| (c, a.trim()))
            .unwrap_or((line, ""));

        match cmd {
            "" => {}
            "select" => {
                if arg.is_empty() {
                    println!("Usage: select <path>");
                    continue;
                }
                match FileCandidate::from_path(Path::new(arg)).await {
                    Ok(candidate) => controller.select_file(candidate),
                    Err(e) => println!("{}", e),
                }
            }
            "process" => controller.process_selection().await,
            "clear" => controller.clear_selection(),
            "retry" => controller.retry(),
            "new" => controller.new_recording(),
            "status" => {
                match controller.selected() {
                    Some(c) => {
                        println!("Selected: {} ({})", c.name, selection::format_size(c.size))
                    }
                    None => println!("Nothing selected"),
                }
                println!("View: {}", controller.view());
            }
            "help" => print_help(),
            "quit" | "exit" => break,
            other => println!("Unknown command: {} (try 'help')", other),
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  select <path>  stage an audio file (wav, mp3, m4a)");
    println!("  process        upload the staged file and play the reply");
    println!("  clear          drop the staged file");
    println!("  retry          reset after an error");
    println!("  new            reset after a reply");
    println!("  status         show the staged file and current view");
    println!("  quit           leave the session");
}
