//! Ingest command: extract share links from text and queue them.

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Result, bail};
use pansaver_core::{Database, LinkOrigin, LinkQueue, NewLink, extract};
use tracing::{debug, info};

use crate::cli::IngestArgs;

pub async fn run(db_path: &Path, args: &IngestArgs) -> Result<()> {
    let origin = build_origin(args)?;
    let text = read_input_text(args)?;

    let candidates = extract(&text);
    if candidates.is_empty() {
        info!("no share links found in input");
        return Ok(());
    }
    let found = candidates.len();

    let links: Vec<NewLink> = candidates
        .into_iter()
        .map(|candidate| NewLink::from_candidate(candidate, origin.clone()))
        .collect();

    let db = Database::new(db_path).await?;
    let queue = LinkQueue::new(db);
    let stored = queue.insert(&links).await?;

    info!(found, stored, "ingest complete");
    println!("Found {found} link(s), stored {stored} new");
    Ok(())
}

fn build_origin(args: &IngestArgs) -> Result<LinkOrigin> {
    if let Some(channel_id) = args.channel {
        return Ok(LinkOrigin::ChatMessage {
            channel_id,
            message_id: args.message,
            sender_id: args.sender,
            sender_name: args.sender_name.clone(),
        });
    }
    if let Some(source_url) = &args.page_url {
        return Ok(LinkOrigin::PageScrape {
            source_url: source_url.clone(),
        });
    }
    bail!("specify the text origin: --channel <id> for chat or --page-url <url> for scrapes");
}

fn read_input_text(args: &IngestArgs) -> Result<String> {
    if let Some(file) = &args.file {
        debug!(file = %file.display(), "reading input file");
        return Ok(std::fs::read_to_string(file)?);
    }

    if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }

    bail!("no input: pass a text file or pipe text via stdin");
}
