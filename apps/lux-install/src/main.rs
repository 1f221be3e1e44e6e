#![warn(clippy::pedantic)]

//! # Lux Installer (lux-install)
//!
//! The `lux-install` command bootstraps a Lux development environment. It
//! downloads the latest published release of the `lux` runtime and the `lpm`
//! package manager for the current platform, places both binaries in one
//! install directory, registers that directory on the user's search path and
//! checks that the binaries run.
//!
//! ## Pipeline
//!
//! 1. Detect the host platform
//! 2. Resolve settings from flags, environment and defaults
//! 3. For each product: fetch the latest release, select an asset, download
//!    and install it
//! 4. Register the install directory on the persistent search path
//! 5. Run `<binary> --version` for every installed product
//! 6. Print a summary
//!
//! A product without a usable release is reported with a pointer to its
//! source repository; the run still exits successfully. Only setup failures
//! (unsupported platform, unusable install directory, HTTP client
//! construction) exit with status 1.
//!
//! ## Examples
//!
//! Install with defaults:
//! ```bash
//! lux-install
//! ```
//!
//! Install into a custom directory without touching PATH:
//! ```bash
//! lux-install --install-dir ~/tools/lux --no-modify-path
//! ```

mod config;
mod errors;
mod installer;
mod orchestrator;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use config::{PRODUCTS, Settings};
use installer::{Platform, ReleaseClient};
use orchestrator::Orchestrator;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("LUX_INSTALL_GIT_COMMIT"),
    ")"
);

/// Installer for the Lux runtime and the lpm package manager.
#[derive(Parser)]
#[command(
    name = "lux-install",
    author,
    version = VERSION,
    about = "Install the Lux runtime and the lpm package manager",
    after_help = "\
ENVIRONMENT VARIABLES:
    LUX_HOME                Install root (default: ~/.lux, %APPDATA%\\lux on Windows)
    LUX_INSTALL_API_URL     Release API base URL (default: https://api.github.com)
    GITHUB_TOKEN            Token sent with release API requests
    RUST_LOG                Log filter, overrides -v"
)]
struct Cli {
    /// Directory to install the binaries into.
    ///
    /// Defaults to `$LUX_HOME/bin`.
    #[arg(long, value_name = "DIR")]
    install_dir: Option<PathBuf>,

    /// Base URL of the release API.
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Do not add the install directory to PATH.
    #[arg(long)]
    no_modify_path: bool,

    /// Skip running the installed binaries with `--version`.
    #[arg(long)]
    no_verify: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let platform = Platform::detect()?;
    let mut settings = Settings::resolve(
        cli.install_dir,
        cli.api_url,
        !cli.no_modify_path,
        !cli.no_verify,
    )?;
    settings.ensure_install_dir()?;
    log::debug!(
        "install dir {}, api {}",
        settings.install_dir.display(),
        settings.api_url
    );

    let client = ReleaseClient::new(&settings.api_url, settings.token.as_deref())
        .context("Failed to set up the release client")?;

    println!("Installing Lux for {platform}...");
    let report = Orchestrator::new(&settings, platform, &client)
        .run(&PRODUCTS, installer::search_path::default_store)
        .await;

    print!("{}", report::render(&report));
    Ok(())
}
