//! Built-in hairstyle catalog.

use crate::transform::{DEFAULT_FROM_PROMPT, TransformRequest};

/// A named `(from, to)` prompt pair offered as a one-tap choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HairstylePreset {
    pub id: &'static str,
    pub label: &'static str,
    pub from: &'static str,
    pub to: &'static str,
    /// Thumbnail asset shown next to the label.
    pub thumbnail: Option<&'static str>,
}

impl HairstylePreset {
    pub fn request(&self) -> TransformRequest {
        TransformRequest::new(self.from, self.to)
    }
}

const fn preset(
    id: &'static str,
    label: &'static str,
    to: &'static str,
    thumbnail: &'static str,
) -> HairstylePreset {
    HairstylePreset {
        id,
        label,
        from: DEFAULT_FROM_PROMPT,
        to,
        thumbnail: Some(thumbnail),
    }
}

static PRESETS: &[HairstylePreset] = &[
    preset("long", "Long Hair", "long hair", "hairstyles/long hair.png"),
    preset("short", "Short Hair", "short hair", "hairstyles/short hair.png"),
    preset("curly", "Curly Hair", "curly hair with bangs", "hairstyles/curly hair.png"),
    preset("straight", "Straight Hair", "straight long hair", "hairstyles/straighthair.png"),
    preset("bob", "Bob Cut", "bob haircut", "hairstyles/bob cat.png"),
    preset("pixie", "Pixie Cut", "pixie cut short hair", "hairstyles/pixie cut.png"),
    preset("afro", "Afro Hair", "afro hairstyle", "hairstyles/alfro.png"),
    preset("braided", "Braided Hair", "braided hairstyle", "hairstyles/braided.png"),
    preset("wavy", "Wavy Hair", "wavy hair", "hairstyles/wavyhair.png"),
    preset("ponytail", "Ponytail", "high ponytail", "hairstyles/ponytail.png"),
    preset("bangs", "Bangs", "hair with bangs", "hairstyles/bangs.png"),
    preset("bald", "Bald", "bald head", "hairstyles/bald.png"),
];

/// Returns every preset in display order.
pub fn all() -> &'static [HairstylePreset] {
    PRESETS
}

/// Finds a preset by id or by label, ignoring case and surrounding whitespace.
pub fn find(name: &str) -> Option<&'static HairstylePreset> {
    let needle = name.trim();
    PRESETS.iter().find(|p| {
        p.id.eq_ignore_ascii_case(needle) || p.label.eq_ignore_ascii_case(needle)
    })
}

/// Finds the preset whose `to` prompt matches, used to mark the current selection.
pub fn selected(to: &str) -> Option<&'static HairstylePreset> {
    PRESETS.iter().find(|p| p.to == to)
}
