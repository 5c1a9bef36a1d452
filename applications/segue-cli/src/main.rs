/// Segue - interactive playback sequencer driver
mod config;
mod device;
mod render;
mod resolver;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::AppConfig;
use crossbeam_channel::RecvTimeoutError;
use device::SimulatedDevice;
use resolver::LocalResolver;
use segue_playback::{BindingId, PlaybackError, PlaybackStatus, SessionHandle, SessionRegistry};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often `play` re-checks the session while waiting for it to drain
const DRAIN_POLL: Duration = Duration::from_millis(250);

const HELP: &str = "\
Commands:
  join [binding]   attach a device (default binding from config)
  leave            detach and clear the queue
  play <query>     link, audio file, directory, or library search
                   (joins the current binding if needed)
  pause | resume
  skip | forward   stop the current song and play the next
  stop             stop playback and clear the queue
  back | backward  go back to the previous song
  queue            show the queue
  quit";

#[derive(Parser)]
#[command(name = "segue")]
#[command(about = "Per-session media playback sequencer", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "SEGUE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from stdin
    Run {
        /// Binding to join at startup
        #[arg(short, long)]
        binding: Option<String>,
    },
    /// Play the given queries in order, then exit
    Play {
        /// Links, paths or search phrases
        #[arg(required = true)]
        queries: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "segue=info,segue_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { binding } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(binding) = binding {
                config.binding = binding;
            }
            run_interactive(&config)?;
        }
        Commands::Play { queries } => {
            let config = load_config(cli.config.as_deref())?;
            play_all(&config, &queries)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = AppConfig::load(path).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    tracing::debug!("Configuration: {:?}", config);
    Ok(config)
}

/// Join `binding` with a fresh simulated device
///
/// Returns the existing session if the binding is already joined.
fn join(
    registry: &SessionRegistry,
    binding: &BindingId,
    config: &AppConfig,
) -> anyhow::Result<SessionHandle> {
    if let Ok(handle) = registry.get(binding) {
        return Ok(handle);
    }

    let device = SimulatedDevice::spawn(binding.as_str(), config.simulated_track())
        .context("Failed to start playback device")?;
    let handle = registry.join(binding.clone(), Box::new(device))?;
    spawn_event_printer(&handle)?;
    Ok(handle)
}

/// Print session events until the session ends
fn spawn_event_printer(handle: &SessionHandle) -> anyhow::Result<()> {
    let events = handle.events().clone();
    thread::Builder::new()
        .name(format!("segue-events-{}", handle.binding()))
        .spawn(move || {
            for event in events.iter() {
                if let Some(text) = render::event(&event) {
                    println!("{text}");
                }
            }
        })
        .context("Failed to start event printer")?;
    Ok(())
}

fn run_interactive(config: &AppConfig) -> anyhow::Result<()> {
    let registry = SessionRegistry::new(config.playback.clone())?;
    let resolver = LocalResolver::new(config.library_dir.clone());
    let mut binding = BindingId::new(config.binding.clone());

    join(&registry, &binding, config)?;
    tracing::info!("Joined {}", binding);
    println!("{HELP}");

    let stdin = io::stdin();
    prompt()?;
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let (command, arg) = match line.trim().split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line.trim(), ""),
        };

        if matches!(command, "quit" | "exit") {
            break;
        }

        if command == "join" && !arg.is_empty() {
            binding = BindingId::new(arg);
        }

        match dispatch(&registry, &binding, &resolver, config, command, arg) {
            Ok(Some(reply)) => println!("{reply}"),
            Ok(None) => {}
            Err(e) => match e.downcast_ref::<PlaybackError>() {
                Some(error) => println!("{}", render::error(error)),
                None => println!("Error: {e:#}"),
            },
        }
        prompt()?;
    }

    registry.leave_all();
    Ok(())
}

fn prompt() -> anyhow::Result<()> {
    print!("> ");
    io::stdout().flush().context("Failed to flush stdout")
}

fn dispatch(
    registry: &SessionRegistry,
    binding: &BindingId,
    resolver: &LocalResolver,
    config: &AppConfig,
    command: &str,
    arg: &str,
) -> anyhow::Result<Option<String>> {
    let reply = match command {
        "" => return Ok(None),
        "help" => HELP.to_string(),
        "join" => {
            join(registry, binding, config)?;
            format!("Joined {binding}")
        }
        "leave" => {
            registry.leave(binding)?;
            "Left and cleared the queue.".to_string()
        }
        "play" | "p" => {
            let report = join(registry, binding, config)?.play_query(resolver, arg)?;
            render::play_report(&report)
        }
        "pause" => render::outcome(&registry.get(binding)?.pause()?),
        "resume" => render::outcome(&registry.get(binding)?.resume()?),
        "skip" | "s" | "forward" => render::outcome(&registry.get(binding)?.skip()?),
        "stop" => render::outcome(&registry.get(binding)?.stop()?),
        "back" | "previous" | "backward" => {
            render::outcome(&registry.get(binding)?.step_back()?)
        }
        "queue" | "q" => render::queue(&registry.get(binding)?.snapshot(None)?),
        other => format!("Unknown command: {other}. Type `help` for commands."),
    };
    Ok(Some(reply))
}

fn is_drained(session: &SessionHandle) -> anyhow::Result<bool> {
    let snapshot = session.snapshot(None)?;
    Ok(snapshot.status == PlaybackStatus::Idle && snapshot.total() == 0)
}

fn play_all(config: &AppConfig, queries: &[String]) -> anyhow::Result<()> {
    let registry = SessionRegistry::new(config.playback.clone())?;
    let resolver = LocalResolver::new(config.library_dir.clone());
    let binding = BindingId::new(config.binding.clone());

    let device = SimulatedDevice::spawn(binding.as_str(), config.simulated_track())
        .context("Failed to start playback device")?;
    let session = registry.join(binding, Box::new(device))?;

    for query in queries {
        match session.play_query(&resolver, query) {
            Ok(report) => println!("{}", render::play_report(&report)),
            Err(e) => println!("{}", render::error(&e)),
        }
    }

    wait_until_drained(&session)?;
    registry.leave_all();
    Ok(())
}

/// Print events until nothing is playing or pending
///
/// A QueueEmpty from an earlier query may still be buffered, so the session
/// itself is asked before returning.
fn wait_until_drained(session: &SessionHandle) -> anyhow::Result<()> {
    while !is_drained(session)? {
        match session.events().recv_timeout(DRAIN_POLL) {
            Ok(event) => {
                if let Some(text) = render::event(&event) {
                    println!("{text}");
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    for event in session.events().try_iter() {
        if let Some(text) = render::event(&event) {
            println!("{text}");
        }
    }
    Ok(())
}
