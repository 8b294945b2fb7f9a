//! Page parsers for the player service
//!
//! Contains modules for parsing each fetched page type of the pipeline.
//! Every parser takes raw fetched text and returns a typed result, so
//! all of them are testable from fixtures without any network.

pub mod assets;
pub mod episodes;
pub mod session;
pub mod translations;

pub use assets::parse_assets;
pub use episodes::parse_episodes;
pub use session::{parse_script_url, parse_session};
pub use translations::parse_translations;
