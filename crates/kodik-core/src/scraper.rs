//! High-level extraction pipeline for the Kodik player
//!
//! Combines the HTTP client with the per-page parsers into the
//! session → translations → episodes → assets → download chain. Each
//! request carries the exact headers the player backend requires; they
//! are protocol requirements of the service, not stylistic choices.

use std::path::Path;

use reqwest::header::{
    ACCEPT, CONNECTION, HOST, HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER,
};
use tracing::info;
use url::Url;

use crate::client::{ClientConfig, KodikClient};
use crate::downloader;
use crate::error::{KodikError, Result};
use crate::manifest::{self, HlsManifest};
use crate::parser;
use crate::types::{Episode, PlayerSession, Translation, TranslationKind, Video};

const SEC_FETCH_DEST: HeaderName = HeaderName::from_static("sec-fetch-dest");
const SEC_FETCH_MODE: HeaderName = HeaderName::from_static("sec-fetch-mode");
const SEC_FETCH_SITE: HeaderName = HeaderName::from_static("sec-fetch-site");
const SEC_FETCH_STORAGE_ACCESS: HeaderName = HeaderName::from_static("sec-fetch-storage-access");
const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// Main extraction API for the Kodik player
///
/// A thin façade over [`KodikClient`] and the parsers: every method
/// performs the fetches of one pipeline stage and hands the bodies to the
/// matching parser.
pub struct KodikScraper {
    client: KodikClient,
}

impl KodikScraper {
    /// Create a new scraper with default configuration
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new() -> Result<Self> {
        let client = KodikClient::new()?;
        Ok(Self { client })
    }

    /// Create a new scraper with custom client configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = KodikClient::with_config(config)?;
        Ok(Self { client })
    }

    /// Derives the signed session and the translation catalog from a
    /// player page
    ///
    /// Fetches the page once and its companion script once; the same page
    /// body feeds both the session extractor and the translation list, so
    /// either both succeed or the stage fails as a whole.
    ///
    /// # Errors
    /// - `Fetch`/`Http` when the page or the script cannot be fetched
    /// - `SessionExtraction` when the embedded session data is absent
    /// - `Catalog` when neither selector nor inline variables are present
    pub async fn player(&self, player_url: &str) -> Result<(PlayerSession, Vec<Translation>)> {
        info!("requesting player page from \"{player_url}\"");
        let page = self
            .client
            .get_text(
                player_url,
                &[("translations", "true".to_string())],
                &self.iframe_headers()?,
            )
            .await?;

        let script_url = parser::parse_script_url(player_url, &page)?;
        info!("requesting player script from \"{script_url}\"");
        let script = self
            .client
            .get_text(&script_url, &[], &script_headers(player_url, &script_url)?)
            .await?;

        let session = parser::parse_session(player_url, &page, &script)?;
        let translations = parser::parse_translations(&page)?;
        Ok((session, translations))
    }

    /// Fetches the episode list for one translation
    ///
    /// A `Video`-kind translation is a single asset by the service's own
    /// design and resolves to one synthetic episode without a catalog
    /// request. For `Serial`-kind translations a catalog page without
    /// seasons is a fatal error.
    pub async fn episodes(
        &self,
        session: &PlayerSession,
        translation: &Translation,
    ) -> Result<Vec<Episode>> {
        if translation.kind == TranslationKind::Video {
            return Ok(vec![Episode {
                id: translation.id,
                index: 1,
                season: String::new(),
                season_name: String::new(),
                hash: translation.hash.clone(),
                title: translation.title.clone(),
                assets: None,
            }]);
        }

        let url = catalog_url(session, translation);
        let mut query = session.sign();
        query.push(("first_url", "false".to_string()));

        info!("requesting episodes for translation id={}", translation.id);
        let body = self
            .client
            .get_text(&url, &query, &self.iframe_headers()?)
            .await?;
        parser::parse_episodes(&body)
    }

    /// Resolves the per-quality video assets for one episode
    ///
    /// An empty result is a legitimate content state: the episode has no
    /// playable source, which is not a protocol error.
    pub async fn videos(
        &self,
        session: &PlayerSession,
        translation: &Translation,
        episode: &Episode,
    ) -> Result<Vec<Video>> {
        let mut form = session.sign();
        form.push(("type", translation.kind.request_type().to_string()));
        form.push(("id", episode.id.to_string()));
        form.push(("hash", episode.hash.clone()));
        form.push(("info", "{}".to_string()));

        info!(
            "requesting assets for episode \"{}\" (id={})",
            episode.title, episode.id
        );
        let body = self
            .client
            .post_form(&session.endpoint, &form, &api_headers(session)?)
            .await?;
        parser::parse_assets(&body)
    }

    /// Fetches and parses the segmented manifest for one video asset
    pub async fn manifest(&self, session: &PlayerSession, video: &Video) -> Result<HlsManifest> {
        info!("requesting manifest from \"{}\"", video.url);
        let body = self
            .client
            .get_text(&video.url, &[], &manifest_headers(session)?)
            .await?;
        manifest::parse_manifest(&body, &video.url)
    }

    /// Downloads every segment of one video asset into `out_dir`
    ///
    /// Writes `segment-<index>.ts` files numbered in manifest order and
    /// succeeds only if every segment is fetched and persisted.
    pub async fn download(
        &self,
        session: &PlayerSession,
        video: &Video,
        out_dir: &Path,
    ) -> Result<()> {
        let manifest = self.manifest(session, video).await?;
        downloader::download_segments(
            &self.client,
            &manifest.segments,
            &segment_headers(),
            out_dir,
        )
        .await
    }

    /// Headers for iframe-style navigation requests (player page, episode
    /// catalog)
    fn iframe_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(SEC_FETCH_DEST, HeaderValue::from_static("iframe"));
        headers.insert(SEC_FETCH_MODE, HeaderValue::from_static("navigate"));
        headers.insert(SEC_FETCH_SITE, HeaderValue::from_static("cross-site"));
        headers.insert(SEC_FETCH_STORAGE_ACCESS, HeaderValue::from_static("active"));
        headers.insert(REFERER, header_value(&self.client.config().referer)?);
        Ok(headers)
    }
}

/// Builds the episode catalog URL for one translation
fn catalog_url(session: &PlayerSession, translation: &Translation) -> String {
    format!(
        "https://{}/{}/{}/{}/720p",
        session.player_domain,
        translation.kind.path_segment(),
        translation.id,
        translation.hash
    )
}

/// Headers for the companion-script subresource request
fn script_headers(player_url: &str, script_url: &str) -> Result<HeaderMap> {
    let parsed = Url::parse(script_url)
        .map_err(|e| KodikError::InvalidUrl(format!("{script_url}: {e}")))?;
    let host = match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => return Err(KodikError::InvalidUrl(script_url.to_string())),
    };

    let mut headers = HeaderMap::new();
    headers.insert(REFERER, header_value(player_url)?);
    headers.insert(HOST, header_value(&host)?);
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(SEC_FETCH_DEST, HeaderValue::from_static("script"));
    headers.insert(SEC_FETCH_MODE, HeaderValue::from_static("no-cors"));
    headers.insert(SEC_FETCH_SITE, HeaderValue::from_static("same-origin"));
    headers.insert(SEC_FETCH_STORAGE_ACCESS, HeaderValue::from_static("active"));
    Ok(headers)
}

/// Headers for the signed media POST
fn api_headers(session: &PlayerSession) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(SEC_FETCH_DEST, HeaderValue::from_static("empty"));
    headers.insert(SEC_FETCH_MODE, HeaderValue::from_static("cors"));
    headers.insert(SEC_FETCH_SITE, HeaderValue::from_static("same-origin"));
    headers.insert(SEC_FETCH_STORAGE_ACCESS, HeaderValue::from_static("active"));
    headers.insert(REFERER, header_value(&session.player_url)?);
    headers.insert(HOST, header_value(&session.player_domain)?);
    headers.insert(
        ORIGIN,
        header_value(&format!("https://{}", session.player_domain))?,
    );
    headers.insert(X_REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
    Ok(headers)
}

/// Headers for the manifest request
fn manifest_headers(session: &PlayerSession) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        ORIGIN,
        header_value(&format!("https://{}", session.player_domain))?,
    );
    headers.insert(
        REFERER,
        header_value(&format!("https://{}/", session.player_domain))?,
    );
    headers.insert(SEC_FETCH_DEST, HeaderValue::from_static("empty"));
    headers.insert(SEC_FETCH_MODE, HeaderValue::from_static("cors"));
    headers.insert(SEC_FETCH_SITE, HeaderValue::from_static("cross-site"));
    Ok(headers)
}

/// Headers for segment requests
fn segment_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(SEC_FETCH_DEST, HeaderValue::from_static("empty"));
    headers.insert(SEC_FETCH_MODE, HeaderValue::from_static("cors"));
    headers.insert(SEC_FETCH_SITE, HeaderValue::from_static("cross-site"));
    headers
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| KodikError::InvalidUrl(format!("value not usable as header: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> PlayerSession {
        PlayerSession {
            domain: "animesite.example".to_string(),
            domain_sign: "dsig".to_string(),
            reference: "https://animesite.example/title".to_string(),
            reference_sign: "rsig".to_string(),
            player_domain: "p.kodik.example".to_string(),
            player_domain_sign: "psig".to_string(),
            player_url: "https://p.kodik.example/serial/1/abc/720p".to_string(),
            endpoint: "https://p.kodik.example/gvi".to_string(),
        }
    }

    #[test]
    fn test_scraper_creation() {
        let scraper = KodikScraper::new();
        assert!(scraper.is_ok());
    }

    #[test]
    fn test_catalog_url() {
        let translation = Translation {
            id: 1337,
            hash: "deadbeef".to_string(),
            kind: TranslationKind::Serial,
            title: "Дубляж".to_string(),
            episodes: None,
        };

        assert_eq!(
            catalog_url(&session(), &translation),
            "https://p.kodik.example/serial/1337/deadbeef/720p"
        );
    }

    #[test]
    fn test_catalog_url_video_kind() {
        let translation = Translation {
            id: 7,
            hash: "cafe".to_string(),
            kind: TranslationKind::Video,
            title: "Фильм".to_string(),
            episodes: None,
        };

        assert_eq!(
            catalog_url(&session(), &translation),
            "https://p.kodik.example/video/7/cafe/720p"
        );
    }

    #[test]
    fn test_api_headers_host_and_origin() {
        let headers = api_headers(&session()).unwrap();
        assert_eq!(headers.get(HOST).unwrap(), "p.kodik.example");
        assert_eq!(headers.get(ORIGIN).unwrap(), "https://p.kodik.example");
        assert_eq!(headers.get(X_REQUESTED_WITH).unwrap(), "XMLHttpRequest");
    }

    #[test]
    fn test_script_headers_host_includes_port() {
        let headers = script_headers(
            "http://127.0.0.1:8080/serial/1/a/720p",
            "http://127.0.0.1:8080/assets/js/app.player.js",
        )
        .unwrap();
        assert_eq!(headers.get(HOST).unwrap(), "127.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_video_kind_translation_yields_synthetic_episode() {
        let scraper = KodikScraper::new().unwrap();
        let translation = Translation {
            id: 99,
            hash: "beef".to_string(),
            kind: TranslationKind::Video,
            title: "Фильм".to_string(),
            episodes: None,
        };

        let episodes = scraper.episodes(&session(), &translation).await.unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].id, 99);
        assert_eq!(episodes[0].index, 1);
        assert_eq!(episodes[0].hash, "beef");
        assert_eq!(episodes[0].title, "Фильм");
        assert!(episodes[0].season.is_empty());
    }
}
