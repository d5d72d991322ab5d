use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use avatar_puppeteer::{ActionClient, Config, Daemon};

/// Puppeteer - drive an avatar from a local action queue
#[derive(Parser)]
#[command(name = "puppeteer", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/puppeteer/config.toml)
    #[arg(short, long, env = "PUPPETEER_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Play downloaded audio on the default output device
    #[arg(long, env = "PUPPETEER_AUDIO")]
    audio: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the queue and drive the avatar until Ctrl-C (default)
    Run,
    /// Run one fetch cycle without deleting anything and print the result
    Once,
    /// Mark an action as consumed on the server
    Delete {
        /// Action id
        id: i64,
        /// Delete every queued action
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,avatar_puppeteer=info",
        1 => "info,avatar_puppeteer=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            Daemon::new(config).with_audio(cli.audio).run().await?;
        }
        Command::Once => once(config).await?,
        Command::Delete { id, all } => {
            let client = ActionClient::new(&config.network)?;
            client.delete_action(id, all).await?;
            println!("deleted action {id} (delete_all={all})");
        }
    }

    Ok(())
}

/// Run one cycle and print what the avatar would do
async fn once(config: Config) -> anyhow::Result<()> {
    let (action, camera, scene) = Daemon::new(config).run_once().await?;

    println!("action poll: {action:?}");
    println!("camera poll: {camera:?}");

    if let Some(trigger) = scene.avatar().animator().current() {
        println!("animation:   {trigger}");
    }
    if let Some(name) = scene.cameras().rig().active_name() {
        println!("camera:      {name}");
    }
    if scene.display().is_enabled() {
        println!("display:     {}", scene.display().slots().join(" | "));
    }

    Ok(())
}
