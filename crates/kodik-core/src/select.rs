//! Ranked-preference selection helpers
//!
//! Pure policy functions for picking one item out of a catalog when the
//! caller wants "best available" rather than "all available".

use crate::types::{Translation, Video};

/// Picks the preferred translation from a ranked preference list
///
/// The first preferred title that is present among `translations` wins;
/// titles compare case- and surrounding-whitespace-insensitively. Returns
/// `None` when nothing matches.
pub fn favorite_translation<'a>(
    translations: &'a [Translation],
    preferred_titles: &[&str],
) -> Option<&'a Translation> {
    preferred_titles.iter().find_map(|wanted| {
        translations
            .iter()
            .find(|translation| labels_match(&translation.title, wanted))
    })
}

/// Picks the preferred quality from a ranked preference list
///
/// Same ranking rules as [`favorite_translation`], applied to quality
/// labels.
pub fn favorite_quality<'a>(videos: &'a [Video], preferred_qualities: &[&str]) -> Option<&'a Video> {
    preferred_qualities.iter().find_map(|wanted| {
        videos
            .iter()
            .find(|video| labels_match(&video.quality, wanted))
    })
}

fn labels_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
