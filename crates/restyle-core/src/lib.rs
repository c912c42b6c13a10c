//! Core restyle library (session, photo intake, upload and transform URLs, config).

pub mod config;
pub mod error;
pub mod images;
pub mod intake;
pub mod links;
pub mod logging;
pub mod media;
pub mod presets;
pub mod session;
pub mod studio;
pub mod transform;
