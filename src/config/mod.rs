mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./remuxd.toml",
        "~/.config/remuxd/config.toml",
        "/etc/remuxd/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.pipeline.workers == 0 {
        anyhow::bail!("Pipeline worker count cannot be 0");
    }

    if config.pipeline.batch_size == 0 {
        anyhow::bail!("Pipeline batch size cannot be 0");
    }

    if config.remote.api_base.is_empty() {
        anyhow::bail!("Remote API base URL cannot be empty");
    }

    if !config.proxy.file.exists() {
        tracing::warn!(
            "Proxy list {:?} does not exist, egress will be direct",
            config.proxy.file
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_converter_constants() {
        let config = Config::default();
        assert_eq!(config.pipeline.workers, 3);
        assert_eq!(config.pipeline.batch_size, 50);
        assert_eq!(config.remote.api_timeout_secs, 30);
        assert_eq!(config.remote.download_timeout_secs, 600);
        assert_eq!(config.remote.upload_timeout_secs, 900);
        assert_eq!(config.tools.transcode_timeout_secs, 2700);
        assert!(config.pipeline.continuous);
        assert!(config.pipeline.extract_subtitles);
        assert!(config.pipeline.multi_audio);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[pipeline]\nworkers = 5\n\n[remote]\napi_base = \"http://localhost:9000\"\n"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.pipeline.workers, 5);
        assert_eq!(config.pipeline.batch_size, 50);
        assert_eq!(config.remote.api_base, "http://localhost:9000");
        assert_eq!(config.remote.site_token, "4fd6sg89d7s6");
    }

    #[test]
    fn zero_workers_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[pipeline]\nworkers = 0\n").unwrap();

        assert!(load_config(file.path()).is_err());
    }
}
