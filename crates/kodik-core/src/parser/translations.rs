//! Translation catalog parser
//!
//! Reads the translation selector from an already-fetched player page.
//! Pages without a selector expose a single implicit translation through
//! inline script variables instead.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::error::{KodikError, Result};
use crate::types::{Translation, TranslationKind};

/// Lists available translations from the player page body
///
/// Returns one [`Translation`] per selector option in document order, or
/// the single synthetic translation when the selector is absent. Never
/// returns an empty list: a page with neither selector nor inline
/// variables is a catalog error.
pub fn parse_translations(html: &str) -> Result<Vec<Translation>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(".serial-translations-box select option")
        .map_err(|e| KodikError::Catalog(format!("invalid selector: {e:?}")))?;

    let options: Vec<ElementRef> = document.select(&selector).collect();
    if options.is_empty() {
        info!("no translation selector, reading single-translation variables");
        return single_translation(&document).map(|translation| vec![translation]);
    }

    let mut translations = Vec::with_capacity(options.len());
    for option in options {
        let raw_id = required_attr(&option, "data-media-id")?;
        let id = raw_id.parse().map_err(|_| {
            KodikError::Catalog(format!("translation id is not numeric: {raw_id}"))
        })?;

        let raw_kind = required_attr(&option, "data-media-type")?;
        let kind = TranslationKind::from_attr(&raw_kind).ok_or_else(|| {
            KodikError::Catalog(format!("unknown translation kind: {raw_kind}"))
        })?;

        translations.push(Translation {
            id,
            hash: required_attr(&option, "data-media-hash")?,
            kind,
            title: required_attr(&option, "data-title")?,
            episodes: None,
        });
    }

    Ok(translations)
}

fn required_attr(element: &ElementRef, name: &str) -> Result<String> {
    element
        .value()
        .attr(name)
        .map(str::to_string)
        .ok_or_else(|| KodikError::Catalog(format!("translation option is missing {name}")))
}

/// Builds the synthetic translation from inline script variables
fn single_translation(document: &Html) -> Result<Translation> {
    let selector = Selector::parse("script")
        .map_err(|e| KodikError::Catalog(format!("invalid selector: {e:?}")))?;

    let script_text = document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>())
        .unwrap_or_default();

    let id = capture(&script_text, r"var serialId = Number\((.*?)\);");
    let hash = capture(&script_text, r#"var serialHash = "(.*?)";"#);
    let title = capture(&script_text, r#"var translationTitle = "(.*?)";"#);

    let (Some(id), Some(hash), Some(title)) = (id, hash, title) else {
        warn!("single translation variables missing from player page");
        return Err(KodikError::Catalog(
            "single translation variables missing".to_string(),
        ));
    };

    let id = id
        .parse()
        .map_err(|_| KodikError::Catalog(format!("serial id is not numeric: {id}")))?;

    Ok(Translation {
        id,
        hash,
        kind: TranslationKind::Serial,
        title,
        episodes: None,
    })
}

fn capture(text: &str, pattern: &str) -> Option<String> {
    Regex::new(pattern)
        .ok()?
        .captures(text)?
        .get(1)
        .map(|m| m.as_str().to_string())
}
