//! Transform command handler: pick, upload, and print the derived URLs.

use std::path::Path;

use anyhow::{Context, Result, bail};
use restyle_core::config::Config;
use restyle_core::images::path_mime;
use restyle_core::intake::FileSource;
use restyle_core::links::{self, SystemOpener};
use restyle_core::media::MediaClient;
use restyle_core::presets;
use restyle_core::studio::{PickOutcome, ResultImage, Studio};
use restyle_core::transform::{AugmentationPolicy, TransformRequest, UrlBuilder};
use tracing::warn;

use super::auth;

pub struct TransformRunOptions<'a> {
    pub config: &'a Config,
    pub path: Option<&'a str>,
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
    pub preset: Option<&'a str>,
    pub augment: Option<AugmentationPolicy>,
    pub remove: bool,
    pub open: bool,
    pub save: Option<&'a Path>,
}

pub async fn run(options: TransformRunOptions<'_>) -> Result<()> {
    let config = options.config;
    let preset = match options.preset {
        Some(name) => match presets::find(name) {
            Some(preset) => Some(preset),
            None => bail!("Unknown preset '{name}'. Run `restyle presets` to list them."),
        },
        None => None,
    };

    let session = auth::session_gate(config).current().await?;

    let mut builder = UrlBuilder::from_config(config);
    if let Some(policy) = options.augment {
        builder = builder.with_policy(policy);
    }

    // Prompts from config, then the preset, then explicit flags.
    let request = TransformRequest::new(config.prompts.from.as_str(), config.prompts.to.as_str());
    let mut studio = Studio::new(session.context(), builder, request);
    if let Some(preset) = preset {
        studio.select_preset(preset);
    }
    if let Some(from) = options.from {
        studio.set_from(from);
    }
    if let Some(to) = options.to {
        studio.set_to(to);
    }
    let source = FileSource::stdin(
        options.path.map(path_mime::normalize_input_path),
        config.intake.max_dimension,
    );
    let uploader = MediaClient::from_config(config);

    if studio.pick_and_upload(&source, &uploader).await? == PickOutcome::Cancelled {
        eprintln!("No photo selected.");
        return Ok(());
    }

    if options.remove {
        studio.apply_generative_remove();
    }

    let results = studio.results();
    for ResultImage { label, url } in &results {
        println!("{label:<13} {url}");
    }

    // The original is already on disk; only derived images are handed out.
    let derived = results.iter().filter(|r| r.label != "Original");

    if options.open {
        for result in derived.clone() {
            match links::open_for_download(&SystemOpener, result.url, result.label) {
                Ok(message) => eprintln!("{message}"),
                Err(e) => warn!("{e}"),
            }
        }
    }

    if let Some(out) = options.save {
        let targets: Vec<(&str, &str)> = derived.map(|r| (r.label, r.url)).collect();
        let saved = links::save_all(&targets, out)
            .await
            .context("save results")?;
        for ((label, _), path) in targets.iter().zip(&saved) {
            eprintln!("Saved {label} to {}", path.display());
        }
    }

    Ok(())
}
