use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ExtractError, Result};

/// What the downloader should include in its record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractMode {
    Metadata,
    Subtitles { languages: Vec<String> },
    Comments { max_comments: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    pub url: String,
    pub mode: ExtractMode,
}

impl ExtractRequest {
    pub fn metadata(url: impl Into<String>) -> Self {
        Self { url: url.into(), mode: ExtractMode::Metadata }
    }

    pub fn subtitles(url: impl Into<String>, languages: Vec<String>) -> Self {
        Self { url: url.into(), mode: ExtractMode::Subtitles { languages } }
    }

    pub fn comments(url: impl Into<String>, max_comments: usize) -> Self {
        Self { url: url.into(), mode: ExtractMode::Comments { max_comments } }
    }
}

/// Capability that turns a video URL into a loosely-typed info record
#[async_trait]
pub trait VideoDownloader: Send + Sync {
    async fn extract(&self, request: &ExtractRequest) -> Result<Value>;

    /// Whether requests carry a cookie file
    fn cookies_configured(&self) -> bool {
        false
    }
}

/// Downloader backed by the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlpClient {
    binary: String,
    cookies_file: Option<PathBuf>,
    user_agent: String,
    accept_language: String,
    socket_timeout: Duration,
    player_clients: Vec<String>,
    command_timeout: Duration,
}

impl YtDlpClient {
    pub fn from_config(config: &Config) -> Self {
        let youtube = &config.youtube;
        Self {
            binary: youtube.ytdlp_path.clone(),
            cookies_file: config.cookies_file().map(PathBuf::from),
            user_agent: youtube.user_agent.clone(),
            accept_language: youtube.accept_language.clone(),
            socket_timeout: Duration::from_secs(youtube.socket_timeout_secs),
            player_clients: youtube.player_clients.clone(),
            command_timeout: Duration::from_secs(youtube.command_timeout_secs),
        }
    }

    /// Command-line arguments for one request, URL last
    pub fn build_args(&self, request: &ExtractRequest) -> Vec<String> {
        let mut args: Vec<String> = [
            "--dump-single-json",
            "--skip-download",
            "--no-playlist",
            "--no-warnings",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.push("--user-agent".into());
        args.push(self.user_agent.clone());
        args.push("--add-header".into());
        args.push(format!("Accept-Language:{}", self.accept_language));
        args.push("--add-header".into());
        args.push("Referer:https://www.youtube.com/".into());

        args.extend(["--retries", "3", "--extractor-retries", "3"].iter().map(|s| s.to_string()));
        args.push("--socket-timeout".into());
        args.push(self.socket_timeout.as_secs().to_string());

        let mut extractor_args = format!(
            "youtube:player_client={};player_skip=webpage",
            self.player_clients.join(",")
        );

        match &request.mode {
            ExtractMode::Metadata => {}
            ExtractMode::Subtitles { languages } => {
                args.push("--sub-langs".into());
                args.push(languages.join(","));
            }
            ExtractMode::Comments { max_comments } => {
                args.push("--write-comments".into());
                extractor_args.push_str(&format!(";max_comments={};comment_sort=top", max_comments));
            }
        }

        args.push("--extractor-args".into());
        args.push(extractor_args);

        if let Some(cookies) = &self.cookies_file {
            args.push("--cookies".into());
            args.push(cookies.display().to_string());
        }

        args.push(request.url.clone());
        args
    }

    /// Report the installed yt-dlp version
    pub async fn check_installed(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ExtractError::Backend(format!(
                "{} --version exited with {}",
                self.binary, output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn spawn_error(&self, e: std::io::Error) -> ExtractError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExtractError::Backend(format!(
                "{} is not installed. Install it with: pip install yt-dlp",
                self.binary
            ))
        } else {
            ExtractError::Io(e)
        }
    }
}

#[async_trait]
impl VideoDownloader for YtDlpClient {
    async fn extract(&self, request: &ExtractRequest) -> Result<Value> {
        info!("ℹ️ Fetching video record ({:?}): {}", request.mode, request.url);
        let args = self.build_args(request);
        debug!("Running {} {}", self.binary, args.join(" "));

        let run = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.command_timeout, run)
            .await
            .map_err(|_| {
                ExtractError::upstream(format!(
                    "yt-dlp timed out after {}s",
                    self.command_timeout.as_secs()
                ))
            })?
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(ExtractError::upstream(last_error_line(&stderr)));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    fn cookies_configured(&self) -> bool {
        self.cookies_file.is_some()
    }
}

/// Most specific error line from yt-dlp stderr
pub fn last_error_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|line| line.to_string())
        .unwrap_or_else(|| "yt-dlp exited without output".to_string())
}
