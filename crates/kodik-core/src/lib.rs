//! Kodik Player Extraction Library
//!
//! Provides an async API for extracting streaming-video metadata and media
//! segments from the Kodik embeddable player, which exposes no public API.
//!
//! # Overview
//!
//! The pipeline reconstructs a player session by scraping embedded script
//! state, then walks the service's catalogs down to playable files:
//! - signed-session derivation from the player page and its companion script
//! - translation (dub) discovery, with a single-translation fallback
//! - episode catalog per translation
//! - per-quality asset resolution through a custom URL cipher
//! - segmented-manifest parsing and concurrent segment download
//!
//! # Example
//!
//! ```no_run
//! use kodik_core::{KodikScraper, Result, select};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let scraper = KodikScraper::new()?;
//!
//!     let (session, translations) = scraper
//!         .player("https://kodik.cc/serial/48654/3520fabb8f5368fc344a62bb174c2a15/720p")
//!         .await?;
//!
//!     let translation = select::favorite_translation(&translations, &["Дубляж", "Субтитры"])
//!         .unwrap_or(&translations[0]);
//!
//!     let episodes = scraper.episodes(&session, translation).await?;
//!     let videos = scraper.videos(&session, translation, &episodes[0]).await?;
//!
//!     if let Some(video) = select::favorite_quality(&videos, &["720p", "480p"]) {
//!         scraper.download(&session, video, "episode-1".as_ref()).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Sessions
//!
//! A [`PlayerSession`] is valid only for the player page it was derived
//! from; it carries no expiry and must be re-derived per player URL. All
//! later signed requests embed its [`PlayerSession::sign`] mapping.

mod cipher;
mod client;
mod downloader;
mod error;
pub mod manifest;
pub mod parser;
mod scraper;
pub mod select;
mod types;

// Re-export the cipher codec
pub use cipher::decode_url;

// Re-export client types
pub use client::{ClientConfig, KodikClient, RateLimiter};

// Re-export error types
pub use error::{KodikError, Result};

// Re-export the manifest parser
pub use manifest::{HlsManifest, parse_manifest};

// Re-export parser functions
pub use parser::{parse_assets, parse_episodes, parse_session, parse_translations};

// Re-export main scraper API
pub use scraper::KodikScraper;

// Re-export selection helpers
pub use select::{favorite_quality, favorite_translation};

// Re-export data types
pub use types::{Episode, PlayerSession, Translation, TranslationKind, Video};
