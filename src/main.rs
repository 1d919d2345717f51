//! addon-import - Main entry point.
//!
//! Imports addon manifests into `localStorage.json` -> profile -> addons.
//!
//! Usage: addon-import [OPTIONS] "<source> <source> ..."
//!
//! Options:
//!   --version, -v            Show version
//!   --help, -h               Show this help
//!   --no-validate            Skip manifest field checks
//!   --store <path>           Store file (default: localStorage.json)
//!   --timeout <secs>         Network fetch timeout (default: 10)
//!   --log-level <level>      Diagnostic log level (default: off)
//!   --log-file               Also write diagnostics to ~/.addon-import/logs/
//!   --log-retention <hours>  Keep log files this long (default: 24)
//!
//! Sources are HTTP(S) URLs, file:// URLs or paths, separated by
//! whitespace, in one argument or several.

use std::env;
use std::process;

use addon_import::config::{CliRequest, ImportConfig};
use addon_import::{Importer, collect_sources, logging};

/// Current version of addon-import.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit code for unusable arguments or configuration.
const EXIT_USAGE: i32 = 2;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    // A broken config file must not hide --version and --help
    let (mut config, load_error) = match ImportConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (ImportConfig::default(), Some(e)),
    };

    let batches = match config.apply_args(args) {
        Ok(CliRequest::Version) => {
            println!("addon-import v{}", VERSION);
            return;
        }
        Ok(CliRequest::Help) => {
            print_usage();
            return;
        }
        Ok(CliRequest::Import(batches)) => batches,
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            process::exit(EXIT_USAGE);
        }
    };

    if let Some(e) = load_error {
        eprintln!("Error loading configuration: {}", e);
        process::exit(EXIT_USAGE);
    }

    if let Err(e) = logging::init(&config.log) {
        eprintln!("Warning: could not initialize logging: {}", e);
    }

    tracing::info!("addon-import v{} starting", VERSION);
    tracing::debug!("Configuration: {:?}", config);

    let sources = collect_sources(&batches);
    let outcome = Importer::new(config).run(&sources);

    tracing::info!("Finished: {:?}", outcome);
    process::exit(outcome.exit_code());
}

fn print_usage() {
    println!("addon-import v{}", VERSION);
    println!();
    println!("Usage: addon-import [OPTIONS] \"<source> <source> ...\"");
    println!();
    println!("Options:");
    println!("  --version, -v            Show version");
    println!("  --help, -h               Show this help");
    println!("  --no-validate            Skip manifest field checks");
    println!("  --store <path>           Store file (default: localStorage.json)");
    println!("  --timeout <secs>         Network fetch timeout (default: 10)");
    println!("  --log-level <level>      Diagnostic log level (default: off)");
    println!("  --log-file               Also write diagnostics to ~/.addon-import/logs/");
    println!("  --log-retention <hours>  Keep log files this long (default: 24)");
}
