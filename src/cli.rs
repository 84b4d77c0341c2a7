//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use pansaver_core::DEFAULT_BATCH_LIMIT;

/// Harvest netdisk share links and batch-save them into your own account.
///
/// Pansaver extracts share links (URL + extraction code + title) from chat
/// or page text, queues them with dedup, and transfers pending links
/// through per-platform adapters.
#[derive(Parser, Debug)]
#[command(name = "pansaver")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the link database
    #[arg(long, default_value = "pansaver.db", global = true)]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Harvest share links from text (file argument or stdin)
    Ingest(IngestArgs),

    /// Transfer pending links into the destination account
    Transfer(TransferArgs),

    /// Show queue aggregates by status and platform
    Status,

    /// Return links stranded in processing back to pending
    Reset,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Text file to scan; reads stdin when omitted
    pub file: Option<PathBuf>,

    /// Chat channel id the text came from (chat origin)
    #[arg(long, conflicts_with = "page_url", allow_hyphen_values = true)]
    pub channel: Option<i64>,

    /// Message id within the channel
    #[arg(long, default_value_t = 0)]
    pub message: i64,

    /// Sender id within the channel
    #[arg(long, default_value_t = 0)]
    pub sender: i64,

    /// Sender display name
    #[arg(long)]
    pub sender_name: Option<String>,

    /// Source page URL the text was scraped from (page origin)
    #[arg(long)]
    pub page_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    /// Maximum links pulled in this run
    #[arg(long, default_value_t = DEFAULT_BATCH_LIMIT, value_parser = clap::value_parser!(i64).range(1..=500))]
    pub limit: i64,

    /// Delay after every link in milliseconds (0 disables pacing)
    #[arg(long, default_value_t = 2000, value_parser = clap::value_parser!(u64).range(0..=60_000))]
    pub delay_ms: u64,

    /// Take a longer rest after this many links (0 disables the rest)
    #[arg(long, default_value_t = 5)]
    pub rest_every: usize,

    /// Rest duration in seconds
    #[arg(long, default_value_t = 10)]
    pub rest_secs: u64,

    /// Destination folder id in the account ("0" is the root folder)
    #[arg(long, default_value = "0")]
    pub dest: String,

    /// Path to the cached session cookie file from the login tool
    #[arg(long)]
    pub cookies: PathBuf,

    /// WebDriver endpoint for UI-automation platforms (e.g. http://localhost:4444)
    #[arg(long)]
    pub webdriver: Option<String>,

    /// Path to the append-only audit log
    #[arg(long, default_value = "transfer_audit.jsonl")]
    pub audit_log: PathBuf,
}
