use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Path to the SQLite work ledger.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./remuxd.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Base URL of the file-hosting API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Host that upload servers are subdomains of.
    #[serde(default = "default_upload_host")]
    pub upload_host: String,

    /// Site-scoped credential sent alongside the bearer token on content
    /// resolution.
    #[serde(default = "default_site_token")]
    pub site_token: String,

    /// Timeout for ordinary API calls, in seconds.
    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,

    /// Timeout covering an entire file download, in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Timeout covering an entire file upload, in seconds.
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.gofile.io".to_string()
}
fn default_upload_host() -> String {
    "gofile.io".to_string()
}
fn default_site_token() -> String {
    "4fd6sg89d7s6".to_string()
}
fn default_api_timeout() -> u64 {
    30
}
fn default_download_timeout() -> u64 {
    600
}
fn default_upload_timeout() -> u64 {
    900
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            upload_host: default_upload_host(),
            site_token: default_site_token(),
            api_timeout_secs: default_api_timeout(),
            download_timeout_secs: default_download_timeout(),
            upload_timeout_secs: default_upload_timeout(),
        }
    }
}

impl RemoteConfig {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Newline-delimited `host:port` SOCKS5 endpoints. A missing file means
    /// direct egress.
    #[serde(default = "default_proxy_file")]
    pub file: PathBuf,
}

fn default_proxy_file() -> PathBuf {
    PathBuf::from("./socks5-proxies.txt")
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            file: default_proxy_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Concurrency ceiling for in-flight items.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum items pulled from the ledger per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Directory for per-item scratch files. Created at startup if absent.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Keep polling for new batches forever.
    #[serde(default = "default_true")]
    pub continuous: bool,

    /// Pause between successive non-empty batches, in seconds.
    #[serde(default = "default_loop_delay")]
    pub loop_delay_secs: u64,

    /// Pause when the backlog is empty, in seconds.
    #[serde(default = "default_idle_delay")]
    pub idle_delay_secs: u64,

    /// Pause after a loop-level error, in seconds.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,

    /// Extract embedded subtitle streams to WebVTT.
    #[serde(default = "default_true")]
    pub extract_subtitles: bool,

    /// Carry all audio tracks into the output (otherwise just the first).
    #[serde(default = "default_true")]
    pub multi_audio: bool,
}

fn default_workers() -> usize {
    3
}
fn default_batch_size() -> usize {
    50
}
fn default_temp_dir() -> PathBuf {
    PathBuf::from("./temp")
}
fn default_true() -> bool {
    true
}
fn default_loop_delay() -> u64 {
    30
}
fn default_idle_delay() -> u64 {
    60
}
fn default_error_backoff() -> u64 {
    10
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            batch_size: default_batch_size(),
            temp_dir: default_temp_dir(),
            continuous: default_true(),
            loop_delay_secs: default_loop_delay(),
            idle_delay_secs: default_idle_delay(),
            error_backoff_secs: default_error_backoff(),
            extract_subtitles: default_true(),
            multi_audio: default_true(),
        }
    }
}

impl PipelineConfig {
    pub fn loop_delay(&self) -> Duration {
        Duration::from_secs(self.loop_delay_secs)
    }

    pub fn idle_delay(&self) -> Duration {
        Duration::from_secs(self.idle_delay_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Path or name of the ffmpeg binary.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,

    /// Path or name of the ffprobe binary.
    #[serde(default = "default_ffprobe")]
    pub ffprobe: PathBuf,

    /// Kill deadline for a probe, in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Kill deadline for extracting one subtitle stream, in seconds.
    #[serde(default = "default_subtitle_timeout")]
    pub subtitle_timeout_secs: u64,

    /// Kill deadline for a transcode, in seconds.
    #[serde(default = "default_transcode_timeout")]
    pub transcode_timeout_secs: u64,
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}
fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}
fn default_probe_timeout() -> u64 {
    30
}
fn default_subtitle_timeout() -> u64 {
    60
}
fn default_transcode_timeout() -> u64 {
    45 * 60
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            probe_timeout_secs: default_probe_timeout(),
            subtitle_timeout_secs: default_subtitle_timeout(),
            transcode_timeout_secs: default_transcode_timeout(),
        }
    }
}

impl ToolsConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn subtitle_timeout(&self) -> Duration {
        Duration::from_secs(self.subtitle_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}
