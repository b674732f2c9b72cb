// CineTube CLI - control surface for cinema mode preferences
//
// Reads and writes the same preference store the popup and options page use.
// Values are validated here before they reach the store, which accepts
// anything it is given.

mod config;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use cinetube_config::{
    JsonFileStore, PreferenceStore, SchemaError, SettingName, StatsStore, StoreError,
};
use cinetube_protocol::{
    is_video_site, respond_to_trigger, ActionResponse, Notifier, PageKind, SurfaceMessage,
};

use config::{CliConfig, StorePaths};
use exit_codes::{EXIT_CONFIG, EXIT_STORE, EXIT_SUCCESS, EXIT_USAGE};

const OFF_SITE: &str = "Please open a YouTube video first!";
const OFF_VIDEO: &str = "Please navigate to a video or short!";

#[derive(Parser)]
#[command(name = "cinetube")]
#[command(about = "Inspect and edit CineTube cinema mode preferences")]
#[command(version)]
struct Cli {
    /// Synced preferences file [default: <config dir>/cinetube/preferences.json]
    #[arg(long, global = true, env = "CINETUBE_STORE", value_name = "PATH")]
    store: Option<PathBuf>,

    /// Local data file holding statistics [default: <config dir>/cinetube/local.json]
    #[arg(long, global = true, env = "CINETUBE_LOCAL_STORE", value_name = "PATH")]
    local_store: Option<PathBuf>,

    /// Print the message other surfaces receive for each change, as one JSON line
    #[arg(long, global = true)]
    emit: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the effective value of every setting
    List {
        /// Print one JSON object
        #[arg(long)]
        json: bool,

        /// Only settings that differ from their default
        #[arg(long)]
        changed: bool,
    },

    /// Show the effective value of one setting
    Get {
        /// Setting name, e.g. opacity or cinemaAutoEnabled
        name: SettingName,

        /// Print the value as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change one setting
    #[command(after_help = "\
Examples:
  cinetube set opacity 80
  cinetube set theme dark
  cinetube set cinemaAutoEnabled off

Percentages are clamped to 0-100. Booleans accept true/false, on/off, yes/no, 1/0.")]
    Set {
        name: SettingName,

        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Restore every setting to its default
    Reset,

    /// Show or reset cinema mode statistics
    Stats {
        #[command(subcommand)]
        action: Option<StatsAction>,

        /// Print one JSON object
        #[arg(long)]
        json: bool,
    },

    /// Check whether cinema mode can be triggered on a page
    Page {
        url: String,
    },

    /// Print the resolved store locations
    Paths,
}

#[derive(Subcommand)]
enum StatsAction {
    /// Zero every counter
    Reset,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let cli = Cli::parse();

    let paths = match StorePaths::resolve(cli.store, cli.local_store, &CliConfig::load()) {
        Ok(paths) => paths,
        Err(message) => {
            eprintln!("error: {}", message);
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    let notifier = StdoutNotifier { enabled: cli.emit };

    match smol::block_on(run(cli.command, &paths, &notifier)) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

async fn run(
    command: Commands,
    paths: &StorePaths,
    notifier: &StdoutNotifier,
) -> Result<(), CliError> {
    let prefs = PreferenceStore::new(JsonFileStore::new(&paths.sync));
    let stats = StatsStore::new(JsonFileStore::new(&paths.local));

    match command {
        Commands::List { json, changed } => cmd_list(&prefs, json, changed).await,
        Commands::Get { name, json } => cmd_get(&prefs, name, json).await,
        Commands::Set { name, value } => cmd_set(&prefs, notifier, name, &value).await,
        Commands::Reset => cmd_reset(&prefs, notifier).await,
        Commands::Stats { action: None, json } => cmd_stats(&stats, json).await,
        Commands::Stats {
            action: Some(StatsAction::Reset),
            ..
        } => cmd_stats_reset(&stats, notifier).await,
        Commands::Page { url } => cmd_page(&url, notifier),
        Commands::Paths => {
            println!("preferences: {}", paths.sync.display());
            println!("local:       {}", paths.local.display());
            Ok(())
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(err: SchemaError) -> Self {
        Self { code: EXIT_USAGE, message: err.to_string(), hint: None }
    }

    /// A write the backing store rejected.
    pub fn store(err: StoreError) -> Self {
        let hint = match &err {
            StoreError::QuotaExceeded { .. } => {
                Some("some settings may already have been written; run `cinetube list`".to_string())
            }
            StoreError::Io(_) => Some("check that the store directory is writable".to_string()),
            _ => None,
        };
        Self { code: EXIT_STORE, message: err.to_string(), hint }
    }
}

/// Prints notifications for other surfaces on stdout (enabled by --emit).
///
/// While enabled, stdout carries only notification lines, so commands skip
/// their human-readable output.
struct StdoutNotifier {
    enabled: bool,
}

impl Notifier for StdoutNotifier {
    fn notify(&self, message: SurfaceMessage) {
        if !self.enabled {
            return;
        }
        match serde_json::to_string(&message) {
            Ok(line) => println!("{}", line),
            Err(e) => log::warn!("Cannot encode '{}' notification: {}", message.action(), e),
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Cannot encode output: {}", e),
    }
}

// ============================================================================
// Preferences
// ============================================================================

type Prefs = PreferenceStore<JsonFileStore>;

async fn cmd_list(prefs: &Prefs, json: bool, changed: bool) -> Result<(), CliError> {
    let all = prefs.get_all().await;
    let entries: Vec<(SettingName, &Value)> = if changed {
        all.changed().collect()
    } else {
        all.iter().collect()
    };

    if json {
        let object: serde_json::Map<String, Value> = entries
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), (*value).clone()))
            .collect();
        print_json(&object);
    } else {
        for (name, value) in entries {
            println!("{:<20} {}", name.as_str(), display_value(value));
        }
    }
    Ok(())
}

async fn cmd_get(prefs: &Prefs, name: SettingName, json: bool) -> Result<(), CliError> {
    let value = prefs.get(name).await;
    if json {
        println!("{}", value);
    } else {
        println!("{}", display_value(&value));
    }
    Ok(())
}

async fn cmd_set(
    prefs: &Prefs,
    notifier: &StdoutNotifier,
    name: SettingName,
    input: &str,
) -> Result<(), CliError> {
    let value = name.parse_input(input).map_err(CliError::usage)?;
    prefs
        .set(name, value.clone())
        .await
        .map_err(CliError::store)?;

    if !notifier.enabled {
        println!("{} = {}", name, display_value(&value));
    }
    let message = match (name, value.as_bool()) {
        (SettingName::CinemaAutoEnabled, Some(enabled)) => {
            SurfaceMessage::UpdateCinemaPreference { enabled }
        }
        _ => SurfaceMessage::setting_changed(name, value),
    };
    notifier.notify(message);
    Ok(())
}

async fn cmd_reset(prefs: &Prefs, notifier: &StdoutNotifier) -> Result<(), CliError> {
    prefs.reset().await.map_err(CliError::store)?;
    if !notifier.enabled {
        println!("Settings reset to defaults");
    }
    notifier.notify(SurfaceMessage::settings_snapshot(&prefs.get_all().await));
    Ok(())
}

// ============================================================================
// Statistics
// ============================================================================

type Stats = StatsStore<JsonFileStore>;

async fn cmd_stats(stats: &Stats, json: bool) -> Result<(), CliError> {
    let current = stats.load().await;
    let summary = current.summary();

    if json {
        print_json(&json!({ "stats": current, "summary": summary }));
        return Ok(());
    }

    println!("Today:             {}", summary.today_activations);
    println!("Total activations: {}", summary.activations);
    println!("Total time:        {}m", summary.total_minutes);
    println!("Average session:   {}m", summary.average_minutes);
    if let Some(info) = summary.info {
        println!();
        println!("{}", info);
    }
    Ok(())
}

async fn cmd_stats_reset(stats: &Stats, notifier: &StdoutNotifier) -> Result<(), CliError> {
    stats
        .reset(chrono::Local::now().date_naive())
        .await
        .map_err(CliError::store)?;
    if !notifier.enabled {
        println!("Statistics reset");
    }
    Ok(())
}

// ============================================================================
// Page check
// ============================================================================

fn cmd_page(url: &str, notifier: &StdoutNotifier) -> Result<(), CliError> {
    // Off-site and non-video pages are turned away before the page is asked
    let page = PageKind::classify(url);
    let response = if !is_video_site(url) {
        ActionResponse::failed(OFF_SITE)
    } else if !page.is_video() {
        ActionResponse::failed(OFF_VIDEO)
    } else {
        respond_to_trigger(page)
    };

    if response.success {
        notifier.notify(SurfaceMessage::TriggerCinema);
    }
    if !notifier.enabled {
        print_json(&json!({ "page": page, "response": response }));
    }
    Ok(())
}
