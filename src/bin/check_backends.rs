use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use youtube_extractor::{Config, VideoExtractor, YtDlpClient};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("youtube_extractor=info,check_backends=info")
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    info!("🔍 Checking extraction backend availability...");

    match YtDlpClient::from_config(&config).check_installed().await {
        Ok(version) => info!("✅ yt-dlp {} ({})", version, config.youtube.ytdlp_path),
        Err(e) => {
            info!("❌ {}", e);
            info!("💡 Install yt-dlp with: pip install -U yt-dlp");
        }
    }

    match (&config.youtube.cookies_file, config.cookies_file()) {
        (_, Some(path)) => info!("🍪 Cookie file: {}", path.display()),
        (Some(path), None) => info!("⚠️ Cookie file {} does not exist, requests go out without cookies", path.display()),
        (None, None) => info!("🍪 No cookie file configured"),
    }

    if let Err(e) = config.validate() {
        info!("❌ Invalid configuration: {}", e);
        return Ok(());
    }

    let extractor = VideoExtractor::from_config(&config)?;
    info!("📋 Transcript backends, in order:");
    for backend in extractor.transcript_backends() {
        info!("   - {}", backend);
    }

    info!("{}", config.summary());
    info!("🎉 Backend check finished");

    Ok(())
}
