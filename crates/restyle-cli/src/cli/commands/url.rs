//! URL builder command handlers. Offline: nothing is uploaded or fetched.

use restyle_core::config::Config;
use restyle_core::transform::{AugmentationPolicy, TransformRequest, UrlBuilder};

pub struct ReplaceOptions<'a> {
    pub public_id: &'a str,
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
    pub augment: Option<AugmentationPolicy>,
    pub no_preserve_geometry: bool,
}

fn builder(config: &Config, augment: Option<AugmentationPolicy>) -> UrlBuilder {
    let builder = UrlBuilder::from_config(config);
    match augment {
        Some(policy) => builder.with_policy(policy),
        None => builder,
    }
}

pub fn replace(config: &Config, options: &ReplaceOptions<'_>) {
    let request = TransformRequest::new(
        options.from.unwrap_or(&config.prompts.from),
        options.to.unwrap_or(&config.prompts.to),
    );
    let mut builder = builder(config, options.augment);
    if options.no_preserve_geometry {
        builder = builder.with_preserve_geometry(false);
    }
    println!("{}", builder.replace_url(options.public_id, &request));
}

pub fn remove(config: &Config, public_id: &str, prompt: Option<&str>) {
    let prompt = prompt.unwrap_or(&config.prompts.from);
    println!("{}", builder(config, None).remove_url(public_id, prompt));
}
