//! Fingerprint command - inspect what a sync push would carry

use crate::config::AppConfig;
use crate::domain::{Snapshot, SyncEntry};

pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    let allow_list = config.sync.allow_list();
    let snapshot = Snapshot::build(&config.knowledge_bases, &allow_list);

    println!("selection:   {}", allow_list.signature());
    println!(
        "entries:     {}",
        snapshot
            .entries
            .iter()
            .map(SyncEntry::id)
            .collect::<Vec<_>>()
            .join(", ")
    );
    if !snapshot.missing.is_empty() {
        println!("missing:     {}", snapshot.missing.join(", "));
    }
    println!("fingerprint: {}", snapshot.fingerprint);

    Ok(())
}
