//! CLI argument surface and the install pipeline driver

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::{style, Emoji};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::driver;
use crate::error::InstallError;
use crate::fetch::{Endpoints, Fetcher};
use crate::installer::{InstallOptions, Installer};
use crate::linker;
use crate::platform::{self, Platform};
use crate::prober::{self, MAX_PROBE_ATTEMPTS};
use crate::resolver::{self, Resolver};

static CHECK: Emoji = Emoji("✓ ", "* ");
static ARROW: Emoji = Emoji("→ ", "-> ");
static INFO: Emoji = Emoji("ℹ ", "i ");

#[derive(Parser)]
#[command(name = "chromium-install")]
#[command(author, about = "Download and install Chromium snapshot builds")]
pub struct Cli {
    /// Version to install: full (115.0.5790.170), major-only (115),
    /// "latest" for the newest snapshot, or omitted for the latest
    /// known-good release
    pub version: Option<String>,

    /// Override the root directory for versioned install trees
    #[arg(long)]
    pub basepath: Option<PathBuf>,

    /// Override the symlink target path
    #[arg(long)]
    pub link: Option<PathBuf>,

    /// Delete the downloaded archive after extraction
    #[arg(long)]
    pub tidyup: bool,

    /// Re-download the archive even when a cached copy exists
    #[arg(long)]
    pub redownload: bool,

    /// Proxy URI for all upstream requests
    #[arg(long)]
    pub proxy: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long = "ssl-no-verify")]
    pub ssl_no_verify: bool,

    /// Install a matching chromedriver afterwards via the companion tool
    #[arg(long = "with-driver")]
    pub with_driver: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run the whole pipeline: detect, resolve, probe, install, publish.
pub async fn run(cli: Cli) -> Result<()> {
    platform::validate_platform_table()?;

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(basepath) = &cli.basepath {
        config.base_path = basepath.clone();
    }

    let platform = Platform::detect();
    println!("{} Platform: {}", INFO, style(platform).cyan());

    let fetcher = Fetcher::new(cli.proxy.as_deref(), cli.ssl_no_verify)?;
    let endpoints = Endpoints::default();
    let resolver = Resolver::new(&fetcher, &endpoints, config.base_path.clone());

    // "latest" installs the newest snapshot by raw position, bypassing
    // release metadata entirely; the install directory is then named after
    // the position instead of the milestone.
    let (start, major) = if cli.version.as_deref().map(str::trim) == Some("latest") {
        let position = resolver.last_change_position(platform).await?;
        println!(
            "{} Latest snapshot position: {}",
            INFO,
            style(position).green()
        );
        (position, None)
    } else {
        let resolved = resolver.resolve(cli.version.as_deref()).await?;
        let major = resolver::major_of(&resolved)?;
        println!(
            "{} Resolved {} to {}",
            INFO,
            style(cli.version.as_deref().unwrap_or("<latest known good>")).cyan(),
            style(&resolved).green()
        );

        let start = resolver
            .main_branch_position(major, platform, "stable")
            .await?;
        println!(
            "{} Main-branch position for milestone {}: {}",
            INFO,
            major,
            style(start).green()
        );
        (start, Some(major))
    };

    println!("{} Probing for the nearest downloadable snapshot...", ARROW);
    let found = prober::nearest_downloadable_position(start, |position| {
        let url = endpoints.archive_url(platform, position);
        let fetcher = &fetcher;
        async move { fetcher.exists(&url).await }
    })
    .await?;
    let position = found.ok_or(InstallError::ProbeExhausted {
        start,
        attempts: MAX_PROBE_ATTEMPTS,
    })?;
    println!(
        "{} Downloadable position: {}",
        CHECK,
        style(position).green()
    );

    let dir_name = match major {
        Some(major) => major.to_string(),
        None => position.to_string(),
    };

    println!(
        "{} Installing Chromium into {}...",
        ARROW,
        style(config.base_path.join(&dir_name).display()).cyan()
    );

    let installer = Installer::new(
        &fetcher,
        &endpoints,
        config.downloads.clone(),
        config.base_path.clone(),
    );
    let opts = InstallOptions {
        redownload: cli.redownload,
        tidyup: cli.tidyup,
    };

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("█▓░"),
    );
    let executable = installer
        .install(platform, position, &dir_name, &opts, |downloaded, total| {
            if total > 0 {
                pb.set_length(total);
            }
            pb.set_position(downloaded);
        })
        .await?;
    pb.finish_and_clear();

    println!(
        "{} Installed executable: {}",
        CHECK,
        style(executable.display()).green()
    );

    if linker::publish(&executable, platform, cli.link.as_deref()) {
        println!("{} Symlink updated", CHECK);
    } else {
        println!(
            "{} Symlink not updated; run the executable directly",
            INFO
        );
    }

    if cli.with_driver {
        match major {
            Some(major) => {
                println!(
                    "{} Installing matching chromedriver for milestone {}...",
                    ARROW, major
                );
                driver::install_matching_driver(major, config.prefer_driver_update);
            }
            None => {
                tracing::warn!("no resolved milestone for a snapshot install, skipping chromedriver");
            }
        }
    }

    println!("{} All done", CHECK);
    Ok(())
}
