//! Media response parser
//!
//! The media endpoint answers JSON with a per-quality `links` map plus
//! advertising fields (`vast`, `reserve_vast`, `ip`, `advert_script`)
//! that carry no playable data and are ignored whether present or not.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::warn;

use crate::cipher::decode_url;
use crate::error::{KodikError, Result};
use crate::types::Video;

#[derive(Debug, Deserialize)]
struct MediaResponse {
    #[serde(default)]
    links: BTreeMap<String, Vec<MediaLink>>,
}

#[derive(Debug, Deserialize)]
struct MediaLink {
    src: String,
}

/// Parses the media endpoint response into one [`Video`] per quality
///
/// Each quality's first link is taken, decoded through the cipher, and
/// prefixed with `https:` when scheme-relative. Qualities are surfaced in
/// sorted-key order. An absent or empty `links` map is a legitimate
/// content state and yields an empty list.
pub fn parse_assets(body: &str) -> Result<Vec<Video>> {
    let response: MediaResponse = serde_json::from_str(body)
        .map_err(|e| KodikError::Catalog(format!("media response is not valid JSON: {e}")))?;

    let mut assets = Vec::with_capacity(response.links.len());
    for (quality, links) in response.links {
        let Some(link) = links.first() else {
            warn!(quality = %quality, "quality has no links, skipping");
            continue;
        };

        let decoded = decode_url(&link.src)?;
        let url = if decoded.starts_with("//") {
            format!("https:{decoded}")
        } else {
            decoded
        };

        assets.push(Video { quality, url });
    }

    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::encode_url;

    #[test]
    fn test_parse_single_quality() {
        let src = encode_url("//cloud.example/video/42/720.mp4:hls:manifest.m3u8");
        let body = format!(r#"{{"links": {{"720p": [{{"src": "{src}"}}]}}}}"#);

        let assets = parse_assets(&body).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].quality, "720p");
        assert_eq!(
            assets[0].url,
            "https://cloud.example/video/42/720.mp4:hls:manifest.m3u8"
        );
    }

    #[test]
    fn test_decoded_absolute_url_is_not_reprefixed() {
        let src = encode_url("https://cdn.example/v.mp4");
        let body = format!(r#"{{"links": {{"720p": [{{"src": "{src}"}}]}}}}"#);

        let assets = parse_assets(&body).unwrap();
        assert_eq!(assets[0].url, "https://cdn.example/v.mp4");
    }

    #[test]
    fn test_advertising_fields_are_ignored() {
        let src = encode_url("//cloud.example/480.mp4");
        let body = format!(
            r#"{{
                "advert_script": "<script></script>",
                "vast": true,
                "reserve_vast": false,
                "ip": "203.0.113.7",
                "links": {{"480p": [{{"src": "{src}"}}]}}
            }}"#
        );

        let assets = parse_assets(&body).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].quality, "480p");
    }

    #[test]
    fn test_empty_links_is_not_an_error() {
        let assets = parse_assets(r#"{"links": {}}"#).unwrap();
        assert!(assets.is_empty());
    }

    #[test]
    fn test_missing_links_is_not_an_error() {
        let assets = parse_assets(r#"{"ip": "203.0.113.7"}"#).unwrap();
        assert!(assets.is_empty());
    }

    #[test]
    fn test_qualities_in_sorted_order() {
        let src_720 = encode_url("//cloud.example/720.mp4");
        let src_480 = encode_url("//cloud.example/480.mp4");
        let src_360 = encode_url("//cloud.example/360.mp4");
        let body = format!(
            r#"{{"links": {{
                "720p": [{{"src": "{src_720}"}}],
                "360p": [{{"src": "{src_360}"}}],
                "480p": [{{"src": "{src_480}"}}]
            }}}}"#
        );

        let qualities: Vec<String> = parse_assets(&body)
            .unwrap()
            .into_iter()
            .map(|video| video.quality)
            .collect();
        assert_eq!(qualities, vec!["360p", "480p", "720p"]);
    }

    #[test]
    fn test_quality_with_no_links_is_skipped() {
        let src = encode_url("//cloud.example/720.mp4");
        let body = format!(
            r#"{{"links": {{"1080p": [], "720p": [{{"src": "{src}"}}]}}}}"#
        );

        let assets = parse_assets(&body).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].quality, "720p");
    }

    #[test]
    fn test_first_link_wins() {
        let first = encode_url("//cloud.example/a.mp4");
        let second = encode_url("//cloud.example/b.mp4");
        let body = format!(
            r#"{{"links": {{"720p": [{{"src": "{first}"}}, {{"src": "{second}"}}]}}}}"#
        );

        let assets = parse_assets(&body).unwrap();
        assert_eq!(assets[0].url, "https://cloud.example/a.mp4");
    }

    #[test]
    fn test_malformed_body_is_a_catalog_error() {
        let result = parse_assets("<html>not json</html>");
        assert!(matches!(result, Err(KodikError::Catalog(_))));
    }
}
