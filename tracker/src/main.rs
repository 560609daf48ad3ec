//! Railtrack - Entry Point
//!
//! Watches deployments on the platform and reports finished builds and
//! deployment logs to the console and to local HTTP clients.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use colored::Colorize;
use railtrack::app::options::AppOptions;
use railtrack::app::run::run;
use railtrack::detect::NotificationKind;
use railtrack::dispatch::{ChannelDispatcher, TrackerEvent};
use railtrack::filesys::file::File;
use railtrack::logs::{init_logging, LogOptions};
use railtrack::models::Severity;
use railtrack::storage::layout::StorageLayout;
use railtrack::storage::settings::Settings;
use railtrack::utils::version_info;

use tokio::sync::broadcast;
use tracing::{error, info};

const TOKEN_ENV: &str = "RAILTRACK_TOKEN";

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
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to render version: {e}"),
        }
        return;
    }

    let layout = StorageLayout::default();
    let settings_file = match cli_args.get("settings") {
        Some(path) => File::new(path),
        None => layout.settings_file(),
    };

    // Write default settings and exit
    if cli_args.contains_key("init-settings") {
        match settings_file.write_json(&Settings::default()).await {
            Ok(()) => println!("Wrote default settings to {}", settings_file.path().display()),
            Err(e) => eprintln!("Unable to write settings file: {e}"),
        }
        return;
    }

    // Retrieve the settings file
    let settings = match settings_file.read_json_or_default::<Settings>().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!(
                "Unable to read settings file {}: {}",
                settings_file.path().display(),
                e
            );
            return;
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: settings.log_dir.clone().or_else(|| Some(layout.logs_dir())),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    let token = cli_args
        .get("token")
        .cloned()
        .or_else(|| env::var(TOKEN_ENV).ok())
        .filter(|token| !token.trim().is_empty());

    // Print events on the console
    let dispatcher = Arc::new(ChannelDispatcher::new(256));
    tokio::spawn(print_events(dispatcher.subscribe()));

    let options = AppOptions::from_settings(&settings);
    info!("Running railtrack {} with options: {:?}", version.version, options);
    let result = run(options, token, dispatcher, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the tracker: {e}");
    }
}

async fn print_events(mut events: broadcast::Receiver<TrackerEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                println!("{}", format!("... {missed} events dropped").dimmed());
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return,
        };

        match event {
            TrackerEvent::HierarchyChanged => {}
            TrackerEvent::LogsUpdated { target, lines } => {
                println!("{}", format!("--- logs for {target:?} ---").bold());
                for line in lines {
                    let stamp = line.timestamp.to_rfc3339().dimmed();
                    match line.severity {
                        Severity::Error => println!("{} {}", stamp, line.message.red()),
                        Severity::Warning => println!("{} {}", stamp, line.message.yellow()),
                        Severity::Info => println!("{} {}", stamp, line.message),
                    }
                }
            }
            TrackerEvent::Transition(notification) => {
                let message = notification.message();
                match notification.kind {
                    NotificationKind::Success => println!("{}", message.green()),
                    NotificationKind::Failure => println!("{}", message.red()),
                    NotificationKind::Cancelled => println!("{}", message.yellow()),
                }
            }
            TrackerEvent::Warning { message } => println!("{}", message.yellow()),
            TrackerEvent::Error { message, .. } => println!("{}", message.red().bold()),
        }
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    error!("Failed to install signal handlers, falling back to Ctrl+C");
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
