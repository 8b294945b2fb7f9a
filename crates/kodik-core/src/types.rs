//! Core data types for the Kodik extraction pipeline
//!
//! Contains the records passed between pipeline stages. All of them are
//! plain immutable data; parsing lives in the `parser` modules so the
//! records stay easy to construct from fixtures.

use serde::{Deserialize, Serialize};

/// Signed session parameters derived from one player page
///
/// Valid only for the player page it was derived from; it carries no
/// expiry and must be re-derived per player URL. Every later signed
/// request embeds [`PlayerSession::sign`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSession {
    /// Source-site domain (`d`)
    pub domain: String,

    /// Signature over the source-site domain (`d_sign`)
    pub domain_sign: String,

    /// Percent-decoded referring page (`ref`)
    pub reference: String,

    /// Signature over the referring page (`ref_sign`)
    pub reference_sign: String,

    /// Host serving the player and its backend (`pd`)
    pub player_domain: String,

    /// Signature over the player host (`pd_sign`)
    pub player_domain_sign: String,

    /// The player page this session was derived from
    pub player_url: String,

    /// Absolute URL of the media POST endpoint
    pub endpoint: String,
}

impl PlayerSession {
    /// The fixed signed-parameter mapping embedded in every authenticated
    /// request: the six signed fields plus two constant flags.
    pub fn sign(&self) -> Vec<(&'static str, String)> {
        vec![
            ("d", self.domain.clone()),
            ("d_sign", self.domain_sign.clone()),
            ("pd", self.player_domain.clone()),
            ("pd_sign", self.player_domain_sign.clone()),
            ("ref", self.reference.clone()),
            ("ref_sign", self.reference_sign.clone()),
            ("bad_user", "false".to_string()),
            ("cdn_is_working", "true".to_string()),
        ]
    }
}

/// Content kind of a translation
///
/// Determines both the catalog URL path segment and the server-side
/// `type` field used when resolving assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationKind {
    /// A series with an episode catalog
    Serial,
    /// A single standalone asset
    Video,
}

impl TranslationKind {
    /// Parses the `data-media-type` attribute value
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "serial" => Some(Self::Serial),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    /// Path segment used when building the episode catalog URL
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Video => "video",
        }
    }

    /// Server-side `type` field sent to the media endpoint
    pub fn request_type(self) -> &'static str {
        match self {
            Self::Serial => "seria",
            Self::Video => "video",
        }
    }
}

/// One audio/subtitle translation (dub) of a title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Media id used by the catalog and media endpoints
    pub id: u64,

    /// Media hash paired with the id in signed requests
    pub hash: String,

    /// Serial or standalone video
    pub kind: TranslationKind,

    /// Human-readable studio/track title
    pub title: String,

    /// Episode catalog, once discovered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes: Option<Vec<Episode>>,
}

/// One playable unit within a serial translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// Episode id used by the media endpoint
    pub id: u64,

    /// 1-based position reported by the source; display/ordering only,
    /// not guaranteed contiguous
    pub index: u32,

    /// Raw CSS-class key of the season block (e.g. "season-1")
    pub season: String,

    /// Human label for the season, looked up by the `season` key
    pub season_name: String,

    /// Episode hash paired with the id in signed requests
    pub hash: String,

    /// Episode title
    pub title: String,

    /// Per-quality assets, once resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<Video>>,
}

/// One resolved video asset at a specific quality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Quality label as offered by the service (e.g. "720p")
    pub quality: String,

    /// Fully resolved, directly fetchable URL
    pub url: String,
}
