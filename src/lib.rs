//! Travel map toolkit.
//!
//! The popup carousel state machine (`carousel`, `session`, `gesture`,
//! `viewport`) plus the tooling around the map: trip config ETL, media
//! preprocessing and a small server for the generated map data.

pub mod carousel;
pub mod constants;
pub mod directions;
pub mod etl;
pub mod gesture;
pub mod image_processing;
pub mod popup;
pub mod processing;
pub mod server;
pub mod session;
pub mod settings;
pub mod trip;
pub mod utils;
pub mod viewport;
