//! Player session extraction
//!
//! The signing endpoint is deliberately split between the player page and
//! a separately loaded companion script; both are scraped here and
//! combined atomically. No partial session is ever produced.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::error::{KodikError, Result};
use crate::types::PlayerSession;

/// Signed query fields embedded as a single-quoted JSON literal in the
/// first inline script of the player page.
#[derive(Debug, Deserialize)]
struct UrlParams {
    d: String,
    d_sign: String,
    #[serde(rename = "ref")]
    reference: String,
    ref_sign: String,
    pd: String,
    pd_sign: String,
}

/// Finds the companion script reference in the player page and resolves
/// it against the page URL
pub fn parse_script_url(player_url: &str, html: &str) -> Result<String> {
    let re = Regex::new(r#"src="(/assets/js/.*?)"></script>"#)
        .map_err(|e| KodikError::SessionExtraction(format!("invalid pattern: {e}")))?;

    let src = re
        .captures(html)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| {
            warn!("player script url not found");
            KodikError::SessionExtraction("player script url not found".to_string())
        })?;

    let base = Url::parse(player_url)
        .map_err(|e| KodikError::InvalidUrl(format!("{player_url}: {e}")))?;
    let resolved = base
        .join(src.as_str())
        .map_err(|e| KodikError::InvalidUrl(format!("{}: {e}", src.as_str())))?;

    Ok(resolved.to_string())
}

/// Derives a complete [`PlayerSession`] from the fetched player page and
/// its companion script body
///
/// # Errors
/// - `SessionExtraction("urlParams not found")` when the embedded literal
///   is absent, or a malformed-literal variant when it will not decode
/// - `SessionExtraction("endpoint not found")` when the companion script
///   carries no POST endpoint literal
pub fn parse_session(player_url: &str, page_html: &str, script_body: &str) -> Result<PlayerSession> {
    let params = parse_url_params(page_html)?;
    let endpoint_path = parse_endpoint(script_body)?;

    let endpoint = if endpoint_path.starts_with('/') {
        format!("https://{}{}", params.pd, endpoint_path)
    } else {
        format!("https://{}/{}", params.pd, endpoint_path)
    };

    let reference = urlencoding::decode(&params.reference)
        .map_err(|e| {
            KodikError::SessionExtraction(format!("ref field is not valid percent-encoding: {e}"))
        })?
        .into_owned();

    Ok(PlayerSession {
        domain: params.d,
        domain_sign: params.d_sign,
        reference,
        reference_sign: params.ref_sign,
        player_domain: params.pd,
        player_domain_sign: params.pd_sign,
        player_url: player_url.to_string(),
        endpoint,
    })
}

/// Extracts the `urlParams` literal from the first inline script node
fn parse_url_params(html: &str) -> Result<UrlParams> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script")
        .map_err(|e| KodikError::SessionExtraction(format!("invalid selector: {e:?}")))?;

    let script_text = document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>())
        .unwrap_or_default();

    let re = Regex::new(r"var urlParams = '(.*?)';")
        .map_err(|e| KodikError::SessionExtraction(format!("invalid pattern: {e}")))?;

    let raw = re
        .captures(&script_text)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| {
            warn!("urlParams not found in player page");
            KodikError::SessionExtraction("urlParams not found".to_string())
        })?;

    serde_json::from_str(raw.as_str())
        .map_err(|e| KodikError::SessionExtraction(format!("urlParams is malformed: {e}")))
}

/// Locates the base64 POST endpoint literal inside the companion script
fn parse_endpoint(script: &str) -> Result<String> {
    let re = Regex::new(r#"type:"POST",url:atob\("(.*?)"\),"#)
        .map_err(|e| KodikError::SessionExtraction(format!("invalid pattern: {e}")))?;

    let encoded = re
        .captures(script)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| {
            warn!("endpoint not found in player script");
            KodikError::SessionExtraction("endpoint not found".to_string())
        })?;

    let decoded = STANDARD
        .decode(encoded.as_str())
        .map_err(|e| KodikError::SessionExtraction(format!("endpoint literal is not base64: {e}")))?;

    String::from_utf8(decoded)
        .map_err(|e| KodikError::SessionExtraction(format!("endpoint path is not UTF-8: {e}")))
}
