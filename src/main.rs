use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use notevault::commands::Commands;
use notevault::models::ItemStatus;

#[derive(Parser)]
#[command(name = "notevault", about = "Staged note triage and vault commit workflow")]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create the workspace layout and write the default config
    Init,
    /// Manage staged notes
    Stage {
        #[command(subcommand)]
        cmd: StageCmd,
    },
    /// Classify pending notes and prepare a proposal
    Process,
    /// Review proposal details
    Review {
        /// Proposal ID or "latest"
        #[arg(default_value = "latest")]
        proposal_id: String,
    },
    /// Finalize an approved proposal into the vault and commit ledger
    Commit {
        /// Proposal ID or "latest"
        proposal_id: String,
    },
    /// Show workflow status
    Status,
}

#[derive(Subcommand)]
enum StageCmd {
    /// Copy a file into stage/inbox
    Add { path: PathBuf },
    /// List pending staged files
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let commands = Commands::open(&root)?;

    match cli.cmd {
        Cmd::Init => {
            let path = commands.init_config()?;
            println!("Initialized config at {}", path.display());
        }
        Cmd::Stage { cmd: StageCmd::Add { path } } => {
            let staged = commands.stage_add(&path)?;
            let rel = staged.strip_prefix(commands.root()).unwrap_or(&staged);
            println!("Staged file: {}", rel.display());
        }
        Cmd::Stage { cmd: StageCmd::List } => {
            let pending = commands.stage_list()?;
            if pending.is_empty() {
                println!("No pending staged files.");
            } else {
                println!("Pending staged files ({}):", pending.len());
                for path in pending {
                    println!("- {}", path.display());
                }
            }
        }
        Cmd::Process => {
            let outcome = commands.process()?;
            match outcome.saved {
                None => println!("No staged files found in stage/inbox."),
                Some((json_path, md_path)) => {
                    let proposal = outcome.proposal;
                    println!("Proposal created: {}", proposal.proposal_id);
                    println!(
                        "- JSON: {}",
                        json_path.strip_prefix(commands.root()).unwrap_or(&json_path).display()
                    );
                    println!(
                        "- Report: {}",
                        md_path.strip_prefix(commands.root()).unwrap_or(&md_path).display()
                    );
                    println!("- Commit preview: {}", proposal.commit_message_preview);
                }
            }
        }
        Cmd::Review { proposal_id } => {
            let proposal = commands.review(Some(proposal_id.as_str()))?;
            println!("Proposal: {}", proposal.proposal_id);
            println!("Created: {}", proposal.created_at);
            println!("{}", serde_json::to_string_pretty(&proposal.stats)?);
            println!("Commit preview: {}", proposal.commit_message_preview);
            println!();
            for item in &proposal.items {
                let status = match item.status {
                    ItemStatus::Ready => "ready",
                    ItemStatus::Invalid => "invalid",
                };
                println!("- {}", item.entry_id);
                println!(
                    "  status={} category={} confidence={}",
                    status, item.classification.category, item.classification.confidence
                );
                println!("  source={}", item.source_rel_path);
                println!("  target={}", item.target_entry_path);
                if let Some(summary) = &item.summary {
                    println!("  summary_trigger={}", summary.triggered_by.join(","));
                }
                if let Some(reason) = &item.invalid_reason {
                    println!("  invalid_reason={}", reason);
                }
                if !item.warnings.is_empty() {
                    println!("  warnings={}", item.warnings.join(" | "));
                }
            }
        }
        Cmd::Commit { proposal_id } => {
            let result = commands.commit(&proposal_id)?;
            println!("Committed proposal: {}", result.proposal_id);
            println!("Commit ref: {}", result.commit_ref);
            println!(
                "Summary: committed={}, duplicates={}, invalid={}",
                result.committed_entries, result.skipped_duplicates, result.invalid_entries
            );
            println!("Message: {}", result.message);
        }
        Cmd::Status => {
            let report = commands.status()?;
            println!("Pending staged files: {}", report.pending_files);
            println!("Saved proposals: {}", report.saved_proposals);
            println!(
                "Latest proposal: {}",
                report.latest_proposal.as_deref().unwrap_or("-")
            );
            match report.last_commit {
                Some(record) => {
                    println!("Last committed proposal: {}", record.proposal_id);
                    println!("Last commit ref: {}", record.commit_ref);
                }
                None => {
                    println!("Last committed proposal: -");
                    println!("Last commit ref: -");
                }
            }
        }
    }

    Ok(())
}
