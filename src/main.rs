use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tabswitch::actor::switch_controller::SwitchController;
use tabswitch::common::config::Config;
use tabswitch::common::log;
use tabswitch::model::TabCatalog;
use tabswitch::sys::event::{KeyPhase, ScriptedKey, parse_key_script};
use tabswitch::sys::memory_host::{HostCall, MemoryHost};
use tabswitch::ui::tab_strip::TabStrip;
use tabswitch::ui::transcript::TranscriptOverlay;
use tokio::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "tabswitch", about = "Drive the tab switcher against a workspace fixture")]
struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tabs the switcher would offer.
    List {
        #[arg(long)]
        workspace: PathBuf,
        /// Keep the active tab in the list.
        #[arg(long)]
        include_active: bool,
        /// Show every discovered view, switchable or not, unordered.
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// Feed a key script through the switcher and print what happens.
    Replay {
        #[arg(long)]
        workspace: PathBuf,
        #[arg(long)]
        keys: PathBuf,
    },
    /// Print the effective configuration.
    Config,
}

fn main() -> anyhow::Result<()> {
    log::init_logging();
    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref()).context("loading config")?;

    match cli.command {
        Command::List { workspace, include_active, all, json } => {
            list(&workspace, &config, include_active, all, json)
        }
        Command::Replay { workspace, keys } => replay(&workspace, &keys, config),
        Command::Config => {
            print!("{}", config.to_toml()?);
            println!("# combo: {}", config.settings.switcher.combo_keys.describe());
            Ok(())
        }
    }
}

fn load_host(path: &Path) -> anyhow::Result<MemoryHost> {
    MemoryHost::load(path).with_context(|| format!("loading workspace {}", path.display()))
}

fn list(
    workspace: &Path,
    config: &Config,
    include_active: bool,
    all: bool,
    json: bool,
) -> anyhow::Result<()> {
    let host = load_host(workspace)?;
    let catalog = TabCatalog::new(&host);
    let exclude_active = config.settings.switcher.exclude_active && !include_active;
    let tabs = if all { catalog.discover() } else { catalog.list_switchable_tabs(exclude_active) };

    if json {
        println!("{}", serde_json::to_string_pretty(&tabs)?);
    } else {
        println!("{}", TabStrip::build(&tabs, usize::MAX));
    }
    Ok(())
}

fn replay(workspace: &Path, keys: &Path, config: Config) -> anyhow::Result<()> {
    let host = load_host(workspace)?;
    let script = std::fs::read_to_string(keys)
        .with_context(|| format!("reading key script {}", keys.display()))?;
    let script = parse_key_script(&script).context("parsing key script")?;
    info!(keys = script.len(), "replaying key script");

    let mut controller =
        SwitchController::new(config.settings.switcher, host, TranscriptOverlay::new());
    for ScriptedKey { phase, event } in &script {
        let (label, propagation) = match phase {
            KeyPhase::Down => ("down", controller.handle_key_down(event)),
            KeyPhase::Up => ("up", controller.handle_key_up(event)),
        };
        println!("> {label} {} [{}] -> {propagation:?}", event.key, event.modifiers.describe());
        for frame in controller.overlay_mut().drain() {
            println!("{frame}");
        }
        // The script has no clock, so deferred focus lands before the next key.
        if let Some(due) = controller.next_focus_deadline() {
            controller.run_pending_focus(due.max(Instant::now()));
        }
        let calls = controller.host_mut().take_calls();
        for call in calls {
            println!("{}", describe_call(controller.host(), call));
        }
    }
    Ok(())
}

fn describe_call(host: &MemoryHost, call: HostCall) -> String {
    let (verb, handle) = match call {
        HostCall::Activate(handle) => ("activate", handle),
        HostCall::FocusEditor(handle) => ("focus editor", handle),
        HostCall::FocusView(handle) => ("focus view", handle),
    };
    let name = host.name_of(handle).unwrap_or("<closed>");
    format!("[{verb} {name}]")
}
