//! Open and save command handlers.

use std::path::Path;

use anyhow::{Context, Result};
use restyle_core::links::{self, SystemOpener};

pub fn open(url: &str, label: &str) -> Result<()> {
    let message = links::open_for_download(&SystemOpener, url, label)?;
    println!("{message}");
    Ok(())
}

pub async fn save(url: &str, out: &Path, label: &str) -> Result<()> {
    let path = links::save_url(url, out, label)
        .await
        .with_context(|| format!("save {url}"))?;
    println!("{}", path.display());
    Ok(())
}
