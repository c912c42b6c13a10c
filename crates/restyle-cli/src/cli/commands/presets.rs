//! Presets command handler.

use restyle_core::config::Config;
use restyle_core::presets;

pub fn list(config: &Config) {
    let current = presets::selected(&config.prompts.to).map(|p| p.id);
    for preset in presets::all() {
        let marker = if Some(preset.id) == current { '*' } else { ' ' };
        println!(
            "{marker} {:<10} {:<14} {}",
            preset.id, preset.label, preset.to
        );
    }
}
