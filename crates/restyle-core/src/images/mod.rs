//! Photo file helpers: path handling and upload preparation.

pub mod path_mime;
pub mod prepare;
