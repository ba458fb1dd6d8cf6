//! LED clock client - Entry point
//!
//! Without a command, keeps polling the clock and prints every state change.
//! With one of the command flags, performs that single request and exits.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::PathBuf;

use colored::Colorize;
use ledclock::app::options::AppOptions;
use ledclock::app::run::run;
use ledclock::app::state::AppState;
use ledclock::config::settings::Settings;
use ledclock::errors::ClockError;
use ledclock::logs::{init_logging, LogOptions};
use ledclock::sync::orchestrator::CycleOutcome;
use ledclock::utils::version_info;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        print_json(&version_info());
        return;
    }

    // Load settings, CLI flags win over the file
    let mut settings = match cli_args.get("config") {
        Some(path) => match Settings::load(path).await {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Unable to read settings file: {e}");
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };
    if let Some(url) = cli_args.get("device") {
        settings.device.base_url = url.clone();
    }
    if let Some(level) = cli_args.get("log-level") {
        match level.parse() {
            Ok(level) => settings.log_level = level,
            Err(e) => eprintln!("{e}, keeping {:?}", settings.log_level),
        }
    }

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: settings.log_dir.as_ref().map(PathBuf::from),
        json_format: settings.log_json,
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    let options = match AppOptions::try_from(&settings) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    if let Some(result) = run_command(&cli_args, &options).await {
        if let Err(e) = result {
            eprintln!("{} {}", "error:".red().bold(), e);
            if e.is_transport() {
                eprintln!("is the clock reachable at {}?", options.device_base_url);
            }
            std::process::exit(1);
        }
        return;
    }

    info!("Running clock client with options: {:?}", options);
    if let Err(e) = run(options, await_shutdown_signal()).await {
        error!("Failed to run the client: {e}");
    }
}

/// Execute a one-shot command, if one was given
async fn run_command(
    cli_args: &HashMap<String, String>,
    options: &AppOptions,
) -> Option<Result<(), ClockError>> {
    let command = ["status", "set", "reboot", "trigger-ota", "switch-ota", "animations"]
        .into_iter()
        .find(|c| cli_args.contains_key(*c))?;

    let app_state = match AppState::init(options) {
        Ok(state) => state,
        Err(e) => return Some(Err(e)),
    };
    let orchestrator = &app_state.orchestrator;

    let result = match command {
        "status" => match orchestrator.run_cycle().await {
            CycleOutcome::Completed => {
                print_json(&orchestrator.snapshot());
                Ok(())
            }
            _ => Err(ClockError::NetworkError("poll cycle failed".to_string())),
        },
        "set" => match parse_assignment(&cli_args[command]) {
            Some(partial) => orchestrator.set_config(&partial).await.map(|r| print_json(&r)),
            None => Err(ClockError::ConfigError(
                "expected --set=<key>=<value>".to_string(),
            )),
        },
        "reboot" => orchestrator.reboot().await.map(|r| print_json(&r)),
        "trigger-ota" => orchestrator
            .trigger_ota(&cli_args[command])
            .await
            .map(|r| print_json(&r)),
        "switch-ota" => orchestrator.switch_ota().await.map(|r| print_json(&r)),
        _ => orchestrator.fetch_animations().await.map(|r| print_json(&r)),
    };

    Some(result)
}

/// Parse `key=value`; the value is read as JSON and falls back to a string
fn parse_assignment(arg: &str) -> Option<BTreeMap<String, Value>> {
    let (key, raw) = arg.split_once('=')?;
    if key.is_empty() {
        return None;
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Some(BTreeMap::from([(key.to_string(), value)]))
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                _ => {
                    error!("Failed to install signal handlers, waiting for Ctrl+C only");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
        }
        info!("Ctrl+C received, shutting down...");
    }
}
