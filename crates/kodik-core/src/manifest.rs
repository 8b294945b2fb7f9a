//! Segmented-video manifest parser
//!
//! Parses the text manifest returned for a resolved video URL into an
//! ordered segment list plus stream metadata. Segment paths are relative
//! to the manifest's own location: the manifest path embeds a `:hls:`
//! marker and segments resolve against the directory of the portion
//! preceding it.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{KodikError, Result};

const HLS_PATH_MARKER: &str = ":hls:";

/// Parsed segmented-video manifest
///
/// Segment order is significant: the index equals playback order and
/// equals the on-disk numbering used by the downloader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HlsManifest {
    /// `#EXT-X-PLAYLIST-TYPE` value, empty if the tag is absent
    pub stream_type: String,

    /// `#EXT-X-TARGETDURATION` value in seconds, 0 if the tag is absent
    pub target_duration: u32,

    /// Absolute segment URLs in order of appearance
    pub segments: Vec<String>,
}

/// Parses a manifest body fetched from `manifest_url`
///
/// Blank lines are skipped. Parsing stops at `#EXT-X-ENDLIST`; unknown
/// `#` tags are ignored. A tag line without a `:` separator or a
/// non-integer target duration is a fatal parse error.
pub fn parse_manifest(body: &str, manifest_url: &str) -> Result<HlsManifest> {
    let base = Url::parse(manifest_url)
        .map_err(|e| KodikError::InvalidUrl(format!("{manifest_url}: {e}")))?;
    let base_dir = segment_base_dir(base.path());

    let mut stream_type = String::new();
    let mut target_duration = 0;
    let mut segments = Vec::new();
    let mut saw_magic = false;

    for line in body.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line == "#EXTM3U" {
            saw_magic = true;
        } else if line == "#EXT-X-ENDLIST" {
            break;
        } else if let Some(tag) = line.strip_prefix('#') {
            let (key, value) = tag.split_once(':').ok_or_else(|| {
                KodikError::ManifestParse(format!("metadata line without separator: {line}"))
            })?;
            match key {
                "EXT-X-TARGETDURATION" => {
                    target_duration = value.trim().parse().map_err(|_| {
                        KodikError::ManifestParse(format!("invalid target duration: {value}"))
                    })?;
                }
                "EXT-X-PLAYLIST-TYPE" => stream_type = value.trim().to_string(),
                _ => {}
            }
        } else {
            segments.push(segment_url(&base, &base_dir, line));
        }
    }

    if !saw_magic {
        debug!("manifest is missing the #EXTM3U marker");
    }

    Ok(HlsManifest {
        stream_type,
        target_duration,
        segments,
    })
}

/// Directory the segment paths resolve against: the manifest path
/// truncated at the `:hls:` marker, minus its final component.
fn segment_base_dir(path: &str) -> String {
    let prefix = path.split(HLS_PATH_MARKER).next().unwrap_or(path);
    match prefix.rfind('/') {
        Some(0) | None => String::new(),
        Some(pos) => prefix[..pos].to_string(),
    }
}

fn segment_url(base: &Url, base_dir: &str, line: &str) -> String {
    let line = line.strip_prefix("./").unwrap_or(line);
    let path = if line.starts_with('/') {
        line.to_string()
    } else {
        format!("{base_dir}/{line}")
    };

    let mut url = base.clone();
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}
