//! `otapack` - firmware release packager.
//!
//! Arranges compiled firmware for each hardware target into a versioned,
//! channel-scoped tree with per-artifact manifests that devices poll for OTA
//! updates, plus a release index and a browsable root page.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use otapack_core::config::EnvSnapshot;
use otapack_core::{RunOptions, paths, registry, verify, version};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "otapack")]
#[command(author, version, about = "Package firmware builds for OTA distribution", long_about = None)]
struct Cli {
    /// Show debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Package compiled firmware into the distribution tree
    Package {
        /// Build environment(s) to package (defaults to all known)
        #[arg(short, long = "env", value_name = "ENV")]
        envs: Vec<String>,
        /// Update channel name
        #[arg(short, long, default_value = otapack_schema::DEFAULT_CHANNEL)]
        channel: String,
        /// Destination directory for packaged artifacts
        #[arg(short, long, default_value = paths::DEFAULT_OUTPUT)]
        output: PathBuf,
        /// Base directory containing per-environment build outputs
        #[arg(long, default_value = paths::DEFAULT_BUILD_ROOT)]
        build_dir: PathBuf,
        /// Firmware version string (falls back to the generated version header)
        #[arg(long = "version", value_name = "VERSION")]
        fw_version: Option<String>,
        /// ISO-8601 timestamp for the manifests (default: current UTC time)
        #[arg(long)]
        published_at: Option<String>,
        /// Generated header holding VERSION_STRING
        #[arg(long, default_value = version::DEFAULT_VERSION_HEADER)]
        version_header: PathBuf,
        /// KEY=value file with MQTT defaults
        #[arg(long, default_value = otapack_core::config::DEFAULT_ENV_FILE)]
        env_file: PathBuf,
        /// Directory searched for pre-built `<env>.zip` archives
        #[arg(long, default_value = ".")]
        archive_dir: PathBuf,
    },
    /// Re-hash published binaries and compare against their manifests
    Verify {
        /// Distribution root to check
        #[arg(short, long, default_value = paths::DEFAULT_OUTPUT)]
        output: PathBuf,
    },
    /// List known build environments and their chip identifiers
    Targets,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();

    match cli.command {
        Commands::Package {
            envs,
            channel,
            output,
            build_dir,
            fw_version,
            published_at,
            version_header,
            env_file,
            archive_dir,
        } => {
            let opts = RunOptions {
                envs,
                channel,
                output,
                build_root: build_dir,
                version: fw_version,
                published_at,
                version_header,
                env_file,
                archive_dir,
            };
            cli_package(&opts)
        }
        Commands::Verify { output } => cli_verify(&output),
        Commands::Targets => {
            for target in registry::REGISTRY {
                println!("  {:<12} {}", target.env, target.chip);
            }
            Ok(())
        }
    }
}

fn cli_package(opts: &RunOptions) -> Result<()> {
    let env = EnvSnapshot::from_process();
    let summary = otapack_core::run(opts, &env).context("packaging failed")?;

    for artifact in &summary.artifacts {
        println!(
            "  packaged {} -> {}",
            artifact.target.env, artifact.binary_path
        );
    }
    for env in &summary.skipped {
        println!("  skipped {env}");
    }
    if let Some(index) = &summary.index_path {
        println!("  wrote {}", index.display());
    }
    println!("  wrote {}", summary.root_index_path.display());

    println!();
    println!(
        "  {} packaged, {} skipped ({} on {})",
        summary.artifacts.len(),
        summary.skipped.len(),
        summary.release.version,
        summary.release.channel
    );
    Ok(())
}

fn cli_verify(output: &std::path::Path) -> Result<()> {
    println!("  verifying {}", output.display());

    let reports = verify::verify_tree(output)?;
    if reports.is_empty() {
        anyhow::bail!("no manifests found under {}", output.display());
    }

    let mut failed = 0;
    for report in &reports {
        if report.is_ok() {
            println!("  ok {}", report.manifest);
        } else {
            failed += 1;
            eprintln!("  error: {}: {}", report.manifest, report.status);
        }
    }

    println!();
    println!("  {} manifests, {failed} failed", reports.len());
    if failed > 0 {
        anyhow::bail!("verification failed for {failed} manifest(s)");
    }
    Ok(())
}
