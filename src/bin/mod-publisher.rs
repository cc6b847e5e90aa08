//! mod-publisher CLI
//!
//! Publishes one mod release to CurseForge, Modrinth and GitHub Releases.

use anyhow::Result;
use clap::{Parser, Subcommand};
use mod_publisher::Orchestrator;
use mod_publisher::core::config_loader::{CONFIG_FILENAME, ConfigLoader};
use mod_publisher::security::CommandScanner;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process;

/// Multi-target mod release publisher
#[derive(Parser)]
#[command(name = "mod-publisher")]
#[command(version = "0.1.0")]
#[command(about = "Publish mod releases to CurseForge, Modrinth and GitHub", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish the release described by the release file
    Publish {
        /// Release file (defaults to ./publisher.yaml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print payloads instead of uploading
        #[arg(long)]
        debug: bool,

        /// Publish against the Modrinth staging API
        #[arg(long)]
        staging: bool,
    },

    /// Validate the release file and artifact without publishing
    Check {
        /// Release file (defaults to ./publisher.yaml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Write a starter release file
    Init {
        /// Where to write the release file (defaults to ./publisher.yaml)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Publish {
            config,
            debug,
            staging,
        } => {
            let path = config.unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
            publish_command(path, debug, staging).await
        }
        Commands::Check { config } => {
            let path = config.unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
            check_command(path).await
        }
        Commands::Init { path, force } => {
            let path = path.unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
            init_command(path, force).await
        }
    }
}

fn environment() -> HashMap<String, String> {
    std::env::vars().collect()
}

fn build_orchestrator(scanner_command: &[String]) -> Orchestrator {
    let orchestrator = Orchestrator::new();
    match scanner_command.split_first() {
        Some((program, args)) => {
            orchestrator.with_scanner(Box::new(CommandScanner::new(program.clone(), args.to_vec())))
        }
        None => orchestrator,
    }
}

async fn publish_command(config_path: PathBuf, debug: bool, staging: bool) -> Result<i32> {
    println!("\n📦 mod-publisher\n");

    let mut config = ConfigLoader::load(&config_path).await?;
    config.debug |= debug;
    config.use_modrinth_staging |= staging;

    let scanner_command = config.scanner_command.clone();
    let descriptor = ConfigLoader::build_descriptor(config, &environment())?;
    let orchestrator = build_orchestrator(&scanner_command);

    match orchestrator.publish(&descriptor).await {
        Ok(report) => {
            if report.overall_success() {
                Ok(0)
            } else {
                Ok(1)
            }
        }
        Err(e) => {
            eprintln!("\n❌ Publishing aborted: {}", e);
            Ok(1)
        }
    }
}

async fn check_command(config_path: PathBuf) -> Result<i32> {
    println!("\n🔍 Release Check\n");

    let config = ConfigLoader::load(&config_path).await?;
    let scanner_command = config.scanner_command.clone();
    let descriptor = ConfigLoader::build_descriptor(config, &environment())?;
    let orchestrator = build_orchestrator(&scanner_command);

    match orchestrator.check(&descriptor).await {
        Ok(eligible) => {
            println!(
                "✅ Release is valid. Eligible targets: {}",
                eligible
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            Ok(1)
        }
    }
}

const STARTER_CONFIG: &str = r#"# mod-publisher release file
artifact: build/libs/my-mod-1.0.0.jar
version: "1.0.0"
changelog: |
  - Initial release
versionType: release
gameVersions:
  - "1.20.1"
loaders:
  - fabric

# Pre-upload scanner, invoked with the artifact path appended
# scannerCommand: ["clamscan", "--no-summary"]

# Configuring a credential opts the target in
apiKeys:
  curseforge: ${CURSEFORGE_TOKEN}
  modrinth: ${MODRINTH_TOKEN}
  github: ${GITHUB_TOKEN}

curseId: "000000"
modrinthId: "AAAAAAAA"
github:
  repo: owner/repo
"#;

async fn init_command(path: PathBuf, force: bool) -> Result<i32> {
    println!("\n🎯 Initialize mod-publisher\n");

    if path.exists() && !force {
        eprintln!(
            "⚠️  {} already exists, use --force to overwrite",
            path.display()
        );
        return Ok(1);
    }

    tokio::fs::write(&path, STARTER_CONFIG).await?;
    println!("✅ Wrote {}", path.display());
    Ok(0)
}
