//! Debug script to walk the full extraction pipeline against a live player page

use kodik_core::{KodikScraper, select};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let player_url = args.next().expect("usage: fetch_video <player-url> [out-dir]");
    let out_dir = args.next().unwrap_or_else(|| "segments".to_string());

    let scraper = KodikScraper::new()?;

    let (session, translations) = scraper.player(&player_url).await?;
    println!("endpoint: {}", session.endpoint);
    for translation in &translations {
        println!(
            "translation {}: {} ({:?})",
            translation.id, translation.title, translation.kind
        );
    }

    let translation = &translations[0];
    let episodes = scraper.episodes(&session, translation).await?;
    println!("{} episodes", episodes.len());

    let episode = &episodes[0];
    let videos = scraper.videos(&session, translation, episode).await?;
    for video in &videos {
        println!("{}: {}", video.quality, video.url);
    }

    if let Some(video) = select::favorite_quality(&videos, &["720p", "480p", "360p"]) {
        scraper.download(&session, video, out_dir.as_ref()).await?;
        println!("saved segments into {out_dir}/");
    } else {
        println!("no playable source");
    }

    Ok(())
}
