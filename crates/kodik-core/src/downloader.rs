//! Concurrent segment download
//!
//! Fans out over every segment of a manifest with a bounded number of
//! in-flight fetches, writes each to `segment-<index>.ts`, and reports
//! success only when every segment succeeded. A failed segment is logged
//! and recorded; its siblings run to completion regardless.

use std::path::Path;

use futures::stream::{self, StreamExt};
use reqwest::header::HeaderMap;
use tracing::{error, info};

use crate::client::KodikClient;
use crate::error::{KodikError, Result};

/// Fetches every segment and persists it under `out_dir`
///
/// On-disk numbering matches manifest order, not arrival order. The
/// aggregate result is a logical AND across all segments; per-segment
/// causes are logged before the aggregate failure is returned. Failed
/// segments are not retried.
pub(crate) async fn download_segments(
    client: &KodikClient,
    segments: &[String],
    headers: &HeaderMap,
    out_dir: &Path,
) -> Result<()> {
    if segments.is_empty() {
        return Err(KodikError::ManifestParse(
            "manifest has no segments".to_string(),
        ));
    }

    tokio::fs::create_dir_all(out_dir).await?;

    let total = segments.len();
    let concurrency = client.config().segment_concurrency.max(1);

    let results: Vec<bool> = stream::iter(segments.iter().enumerate().map(|(index, url)| {
        async move {
            match fetch_and_write(client, index, total, url, headers, out_dir).await {
                Ok(()) => true,
                Err(e) => {
                    error!(index, error = %e, "segment download failed");
                    false
                }
            }
        }
    }))
    .buffered(concurrency)
    .collect()
    .await;

    let failed = results.iter().filter(|ok| !**ok).count();
    if failed > 0 {
        return Err(KodikError::Segment { failed, total });
    }

    Ok(())
}

async fn fetch_and_write(
    client: &KodikClient,
    index: usize,
    total: usize,
    url: &str,
    headers: &HeaderMap,
    out_dir: &Path,
) -> Result<()> {
    info!("requesting segment {}/{} from \"{}\"", index + 1, total, url);
    let bytes = client.get_bytes(url, headers).await?;

    let path = out_dir.join(format!("segment-{index}.ts"));
    tokio::fs::write(&path, bytes).await?;
    Ok(())
}
