//! Genie Console - Entry Point
//!
//! Admin client for the Genie call-campaign platform: paged, filtered views
//! of campaigns, leads, calls, bots and consumers kept fresh by real-time
//! events, plus the mutations an operator needs.

use std::env;
use std::path::PathBuf;

use genie_console::app::command::{parse_args, Command};
use genie_console::app::options::AppOptions;
use genie_console::app::run::run;
use genie_console::filesys::file::File;
use genie_console::logs::{init_logging, LogLevel, LogOptions};
use genie_console::storage::layout::StorageLayout;
use genie_console::storage::settings::Settings;
use genie_console::utils::version_info;

use tracing::{error, info};

const USAGE: &str = "\
usage: genie-console <command> [options]

commands:
  --list=<campaigns|leads|calls|bots|consumers>
  --watch=<campaigns|leads|calls>
  --pause=<id> | --resume=<id> | --cancel=<id>
  --toggle-lead=<call id> [--lead=true|false]
  --delete-lead=<lead id>
  --export-leads[=<path>]
  --assign-voice-account=<account> --owner=<user id>
  --impersonate=<user id> | --stop-impersonating | --whoami
  --version

list options:
  --page=<n> --status=<s> --search=<text> --bot=<id>
  --from=<YYYY-MM-DD> --to=<YYYY-MM-DD> --sort=<asc|desc>
  --query=<query string>

global options:
  --config=<settings.json> --base-url=<url> --log-level=<level>";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli_args = parse_args(env::args().skip(1));

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("{}", e),
        }
        return;
    }

    // Retrieve the settings file
    let layout = StorageLayout::default();
    let settings_file = match cli_args.get("config") {
        Some(path) => File::new(PathBuf::from(path)),
        None => layout.settings_file(),
    };
    let mut settings = match Settings::load(&settings_file).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    // Command line overrides
    if let Some(base_url) = cli_args.get("base-url") {
        settings.backend.base_url = base_url.clone();
    }
    if let Some(level) = cli_args.get("log-level") {
        match level.parse::<LogLevel>() {
            Ok(level) => settings.log_level = level,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(2);
            }
        }
    }

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level,
        json_format: settings.log_json,
        log_dir: settings
            .log_to_file
            .then(|| layout.logs_dir().path().to_path_buf()),
        ..Default::default()
    };
    let log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let options = AppOptions::from_settings(&settings, layout);

    let command = match Command::from_args(&cli_args, options.page_size) {
        Ok(Some(command)) => command,
        Ok(None) => {
            println!("{}", USAGE);
            return;
        }
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    info!("Running Genie console {} ({})", version.version, version.git_hash);
    let code = match run(options, command, await_shutdown_signal()).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e.user_message());
            1
        }
    };

    // Stdin reads cannot be cancelled, so do not wait on them at runtime drop
    drop(log_guard);
    std::process::exit(code);
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
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
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Ctrl+C received, shutting down...");
    }
}
