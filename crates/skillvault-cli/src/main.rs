//! Skillvault - skill repository vault
//!
//! Usage:
//!   skillvault add <url>          # Fetch a repo, folder or SKILL.md and track it
//!   skillvault sync --all         # Refresh everything and re-validate
//!   skillvault list --status invalid_skill
//!   skillvault remove <label> --delete-files

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skillvault_core::catalog::Resource;
use skillvault_core::config::ConfigStore;
use skillvault_core::context::VaultContext;
use skillvault_core::types::ValidationStatus;
use skillvault_core::vault::{RedownloadOutcome, SyncOutcome, Vault};

#[derive(Parser)]
#[command(name = "skillvault")]
#[command(about = "Skill repository vault", long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Storage root, overrides the configured one
    #[arg(long, global = true, value_name = "DIR")]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a repository, folder or SKILL.md and track its skills
    Add {
        /// Web URL of the repository, folder (tree) or file (blob)
        url: String,
        /// Custom label (used as a prefix when several units are found)
        #[arg(long, short)]
        label: Option<String>,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Refresh tracked resources from their remotes
    Sync {
        /// Resource to sync
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        label: Option<String>,
        /// Sync every tracked resource
        #[arg(long, short)]
        all: bool,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List tracked resources
    #[command(alias = "ls")]
    List {
        /// Only resources from this owner
        #[arg(long)]
        owner: Option<String>,
        /// Only resources from this repository (owner/repo)
        #[arg(long, value_name = "OWNER/REPO")]
        repo: Option<String>,
        /// Only resources for this skill name
        #[arg(long)]
        skill: Option<String>,
        /// Only resources with this validation status
        #[arg(long, value_parser = parse_status)]
        status: Option<ValidationStatus>,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one resource in detail
    Show {
        label: String,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Stop tracking a resource
    #[command(alias = "rm")]
    Remove {
        label: String,
        /// Also delete the resource's local files
        #[arg(long)]
        delete_files: bool,
    },

    /// Re-validate one resource, or all of them
    Validate {
        label: Option<String>,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove every resource whose SKILL.md is invalid
    Cleanup {
        /// Also delete their local files
        #[arg(long)]
        delete_files: bool,
    },

    /// Write a copy of the manifest
    Export { path: PathBuf },

    /// Merge a manifest into this vault (nothing is fetched)
    Import { path: PathBuf },

    /// Delete and re-fetch every working copy
    Redownload {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn parse_status(s: &str) -> Result<ValidationStatus, String> {
    s.parse()
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skillvault=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let vault = open_vault(cli.config, cli.storage)?;
    let ok = run_cli(&vault, cli.command)?;
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn open_vault(config: Option<PathBuf>, storage: Option<PathBuf>) -> Result<Vault> {
    let store = match config {
        Some(path) => ConfigStore::from_path(path),
        None => ConfigStore::from_default()?,
    };
    let context = VaultContext::load(&store, storage)?;
    tracing::debug!(
        storage = %context.storage_root().display(),
        manifest = %context.manifest_path().display(),
        "Opening vault"
    );
    Ok(context.vault())
}

/// Runs one command. Returns `false` when some part of it failed.
fn run_cli(vault: &Vault, command: Commands) -> Result<bool> {
    match command {
        Commands::Add { url, label, format } => {
            let added = vault
                .add_url(&url, label.as_deref())
                .with_context(|| format!("Failed to add {url}"))?;
            match format {
                OutputFormat::Table => {
                    println!("Added {} resource(s) from {}", added.len(), url);
                    print_resource_table(&added);
                }
                OutputFormat::Json => print_resource_json(&added)?,
            }
        }
        Commands::Sync { label, all, format } => {
            let outcomes = match label {
                Some(label) if !all => {
                    let outcome = vault.sync(&label)?;
                    BTreeMap::from([(label, outcome)])
                }
                _ => vault.sync_all()?,
            };
            match format {
                OutputFormat::Table => print_sync_table(&outcomes),
                OutputFormat::Json => print_json(&outcomes)?,
            }
            return Ok(outcomes.values().all(|o| o.success));
        }
        Commands::List {
            owner,
            repo,
            skill,
            status,
            format,
        } => {
            vault.validate_pending()?;
            let resources = list_resources(vault, owner, repo, skill, status)?;
            match format {
                OutputFormat::Table => {
                    if resources.is_empty() {
                        println!("No resources tracked.");
                        println!("Add one with: skillvault add <url>");
                    } else {
                        print_resource_table(&resources);
                    }
                }
                OutputFormat::Json => print_resource_json(&resources)?,
            }
        }
        Commands::Show { label, format } => {
            let resource = vault.get(&label)?;
            match format {
                OutputFormat::Table => print_resource_detail(vault, &resource),
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&resource.to_record())?
                    );
                }
            }
        }
        Commands::Remove {
            label,
            delete_files,
        } => {
            vault.remove(&label, delete_files)?;
            println!("Removed {}", label);
        }
        Commands::Validate { label, format } => {
            let statuses = match label {
                Some(label) => {
                    let resource = vault.validate_resource(&label)?;
                    if let OutputFormat::Table = format {
                        print_resource_detail(vault, &resource);
                        return Ok(true);
                    }
                    BTreeMap::from([(label, resource.validation_status)])
                }
                None => vault.validate_all()?,
            };
            match format {
                OutputFormat::Table => {
                    println!("  {:<40} Status", "Label");
                    println!("  {}", "-".repeat(60));
                    for (label, status) in &statuses {
                        println!("  {:<40} {}", truncate(label, 40), status_cell(*status));
                    }
                }
                OutputFormat::Json => print_json(&statuses)?,
            }
        }
        Commands::Cleanup { delete_files } => {
            let removed = vault.cleanup_invalid(delete_files)?;
            if removed.is_empty() {
                println!("No invalid skills to clean up.");
            } else {
                println!("Removed {} invalid skill(s):", removed.len());
                for label in removed {
                    println!("  {}", label);
                }
            }
        }
        Commands::Export { path } => {
            vault.export_manifest(&path)?;
            println!("Exported manifest to {}", path.display());
        }
        Commands::Import { path } => {
            let summary = vault.import_manifest(&path)?;
            println!(
                "Imported {}: {} added, {} replaced",
                path.display(),
                summary.added,
                summary.replaced
            );
        }
        Commands::Redownload { format } => {
            let outcomes = vault.redownload_all()?;
            match format {
                OutputFormat::Table => print_redownload_table(&outcomes),
                OutputFormat::Json => print_json(&outcomes)?,
            }
            return Ok(outcomes.values().all(|o| o.success));
        }
    }
    Ok(true)
}

fn list_resources(
    vault: &Vault,
    owner: Option<String>,
    repo: Option<String>,
    skill: Option<String>,
    status: Option<ValidationStatus>,
) -> Result<Vec<Resource>> {
    let mut resources = match (&repo, &owner, &skill, status) {
        (Some(repo), ..) => {
            let (repo_owner, repo_name) = repo
                .split_once('/')
                .with_context(|| format!("Expected OWNER/REPO, got '{repo}'"))?;
            vault.filter_by_repo(repo_owner, repo_name)?
        }
        (None, Some(owner), ..) => vault.filter_by_owner(owner)?,
        (None, None, Some(skill), _) => vault.filter_by_skill_name(skill)?,
        (None, None, None, Some(status)) => vault.list_by_validation_status(status)?,
        (None, None, None, None) => vault.list()?,
    };

    if let Some(owner) = &owner {
        resources.retain(|r| &r.owner == owner);
    }
    if let Some(skill) = &skill {
        resources.retain(|r| r.unit_name.as_ref() == Some(skill));
    }
    if let Some(status) = status {
        resources.retain(|r| r.validation_status == status);
    }
    Ok(resources)
}

fn print_resource_table(resources: &[Resource]) {
    println!(
        "  {:<40} {:<7} {:<20} {:<30} Status",
        "Label", "Kind", "Skill", "Path"
    );
    println!("  {}", "-".repeat(112));

    for resource in resources {
        let skill = resource.unit_name.as_deref().unwrap_or("-");
        let path = resource
            .relative_path
            .as_deref()
            .or(resource.folder_hint.as_deref())
            .unwrap_or("-");
        println!(
            "  {:<40} {:<7} {:<20} {:<30} {}",
            truncate(&resource.label, 40),
            resource.kind.as_str(),
            truncate(skill, 20),
            truncate(path, 30),
            status_cell(resource.validation_status)
        );
    }
}

fn print_resource_detail(vault: &Vault, resource: &Resource) {
    println!("{}", style(&resource.label).bold());
    println!("  Source:      {}", resource.source_url);
    println!(
        "  Repository:  {} ({})",
        resource.repo_label(),
        resource.branch
    );
    println!("  Kind:        {}", resource.kind);
    if let Some(path) = resource.relative_path.as_deref() {
        println!("  Path:        {}", path);
    }
    if let Some(unit) = resource.unit_name.as_deref() {
        println!("  Skill:       {}", unit);
    }
    println!(
        "  Local:       {}",
        resource.local_path(vault.storage_root()).display()
    );
    println!("  Added:       {}", resource.added_at.to_rfc3339());
    println!("  Last synced: {}", resource.last_synced_at.to_rfc3339());
    println!("  Status:      {}", status_cell(resource.validation_status));
    for error in &resource.validation_errors {
        println!("    {} {}", style("-").red(), error);
    }
}

fn print_resource_json(resources: &[Resource]) -> Result<()> {
    let records: Vec<_> = resources
        .iter()
        .map(|r| serde_json::Value::Object(r.to_record()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn print_sync_table(outcomes: &BTreeMap<String, SyncOutcome>) {
    println!(
        "  {:<40} {:<6} {:<6} {:<8} Result",
        "Label", "Units", "Added", "Changed"
    );
    println!("  {}", "-".repeat(80));

    for (label, outcome) in outcomes {
        let result = match (&outcome.error, outcome.status) {
            (Some(error), _) => style(format!("FAILED: {error}")).red().to_string(),
            (None, Some(status)) => status_cell(status),
            (None, None) => "-".to_string(),
        };
        println!(
            "  {:<40} {:<6} {:<6} {:<8} {}",
            truncate(label, 40),
            outcome.units,
            outcome.added.len(),
            if outcome.content_changed { "yes" } else { "no" },
            result
        );
    }

    let failed = outcomes.values().filter(|o| !o.success).count();
    if failed > 0 {
        println!("\nSummary: {} synced, {} failed", outcomes.len() - failed, failed);
    } else {
        println!("\nSummary: {} synced, all OK", outcomes.len());
    }
}

fn print_redownload_table(outcomes: &BTreeMap<String, RedownloadOutcome>) {
    for (label, outcome) in outcomes {
        match &outcome.error {
            None => println!("  {} {}", style("[OK]").green(), label),
            Some(error) => println!("  {} {}: {}", style("[FAILED]").red(), label, error),
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn status_cell(status: ValidationStatus) -> String {
    let text = status.as_str();
    match status {
        ValidationStatus::ValidSkill => style(text).green().to_string(),
        ValidationStatus::InvalidSkill => style(text).red().to_string(),
        ValidationStatus::NotASkill => style(text).dim().to_string(),
        ValidationStatus::Unvalidated => style(text).yellow().to_string(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
