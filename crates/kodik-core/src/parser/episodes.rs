//! Episode catalog parser
//!
//! Parses the season/episode option structure returned by the catalog
//! endpoint. Season labels live in a separate selector element; an
//! episode referencing a season key absent from that table is a fatal
//! parse inconsistency, never a silently empty label.

use std::collections::HashMap;
use std::str::FromStr;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::error::{KodikError, Result};
use crate::types::Episode;

/// Parses the episode catalog page into [`Episode`] records in document
/// order
///
/// # Errors
/// - `Catalog("no seasons")` when the page carries no season blocks
/// - `Catalog` when a season block is empty, an episode references an
///   unknown season key, or an option attribute is missing/malformed
pub fn parse_episodes(html: &str) -> Result<Vec<Episode>> {
    let document = Html::parse_document(html);
    let season_selector = parse_selector(".series-options div")?;
    let option_selector = parse_selector("option")?;

    let seasons: Vec<ElementRef> = document.select(&season_selector).collect();
    if seasons.is_empty() {
        warn!("no seasons found in episode catalog page");
        return Err(KodikError::Catalog("no seasons".to_string()));
    }

    let season_names = season_name_table(&document)?;
    let mut episodes = Vec::new();

    for season in seasons {
        let season_key = season
            .value()
            .classes()
            .next()
            .map(str::to_string)
            .ok_or_else(|| KodikError::Catalog("season block has no class".to_string()))?;

        let season_name = season_names.get(&season_key).cloned().ok_or_else(|| {
            warn!(season = %season_key, "season key missing from season selector");
            KodikError::Catalog(format!("unknown season key: {season_key}"))
        })?;

        let options: Vec<ElementRef> = season.select(&option_selector).collect();
        if options.is_empty() {
            return Err(KodikError::Catalog(format!(
                "season {season_key} has no episodes"
            )));
        }

        for option in options {
            episodes.push(Episode {
                id: parse_attr(&option, "data-id")?,
                index: parse_attr(&option, "value")?,
                season: season_key.clone(),
                season_name: season_name.clone(),
                hash: required_attr(&option, "data-hash")?,
                title: required_attr(&option, "data-title")?,
                assets: None,
            });
        }
    }

    Ok(episodes)
}

/// Builds the season-key → label lookup from the season selector element
fn season_name_table(document: &Html) -> Result<HashMap<String, String>> {
    let selector = parse_selector(".serial-seasons-box option")?;

    let mut names = HashMap::new();
    for option in document.select(&selector) {
        let value = required_attr(&option, "value")?;
        let title = required_attr(&option, "data-title")?;
        names.insert(format!("season-{value}"), title);
    }
    Ok(names)
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| KodikError::Catalog(format!("invalid selector: {e:?}")))
}

fn required_attr(element: &ElementRef, name: &str) -> Result<String> {
    element
        .value()
        .attr(name)
        .map(str::to_string)
        .ok_or_else(|| KodikError::Catalog(format!("episode option is missing {name}")))
}

fn parse_attr<T: FromStr>(element: &ElementRef, name: &str) -> Result<T> {
    let raw = required_attr(element, name)?;
    raw.parse()
        .map_err(|_| KodikError::Catalog(format!("attribute {name} is not numeric: {raw}")))
}
