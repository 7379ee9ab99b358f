//! Optional config file loading. Search order: ./fwoscrape.toml, then
//! $XDG_CONFIG_HOME/fwoscrape/config.toml (or ~/.config/fwoscrape/config.toml).

use serde::Deserialize;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Base URL of the site (mirror). Must be an absolute http(s) URL.
    pub site: Option<String>,
    /// Default output directory for `download` when -o is not set. Paths are relative to CWD.
    pub output_dir: Option<PathBuf>,
    /// Directory where fetched images are stored.
    pub image_dir: Option<PathBuf>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Delay in seconds between requests.
    pub request_delay_secs: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Number of HTTP attempts for transient failures.
    pub retry_count: Option<u32>,
    /// Delay in seconds before each retry (e.g. [1, 2, 4]).
    pub retry_backoff_secs: Option<Vec<u64>>,
}

/// Search order: (1) ./fwoscrape.toml, (2) $XDG_CONFIG_HOME/fwoscrape/config.toml.
/// Missing file returns Ok(None). Invalid TOML, an invalid `site`, or an I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("fwoscrape.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("fwoscrape").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config = parse_config(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            tracing::debug!(path = %path.display(), "loaded config");
            return Ok(Some(config));
        }
    }
    Ok(None)
}

fn parse_config(s: &str) -> Result<Config, String> {
    let config: Config = toml::from_str(s).map_err(|e| e.to_string())?;
    if let Some(ref site) = config.site {
        validate_site(site)?;
    }
    Ok(config)
}

/// Require an absolute http(s) URL for the site base.
pub fn validate_site(site: &str) -> Result<(), String> {
    let url = reqwest::Url::parse(site).map_err(|e| format!("site '{}': {}", site, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!(
            "site '{}': unsupported scheme '{}' (use http or https)",
            site, other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let c = parse_config("").unwrap();
        assert!(c.site.is_none());
        assert!(c.output_dir.is_none());
        assert!(c.image_dir.is_none());
        assert!(c.user_agent.is_none());
        assert!(c.request_delay_secs.is_none());
        assert!(c.timeout_secs.is_none());
        assert!(c.retry_count.is_none());
        assert!(c.retry_backoff_secs.is_none());
    }

    #[test]
    fn parse_full_config() {
        let s = r#"
            site = "https://mirror.example.com"
            output_dir = "out"
            image_dir = "images"
            user_agent = "Custom/1.0"
            request_delay_secs = 3
            timeout_secs = 60
            retry_count = 5
            retry_backoff_secs = [1, 2, 4, 8]
        "#;
        let c = parse_config(s).unwrap();
        assert_eq!(c.site.as_deref(), Some("https://mirror.example.com"));
        assert_eq!(c.output_dir.as_deref(), Some(std::path::Path::new("out")));
        assert_eq!(c.image_dir.as_deref(), Some(std::path::Path::new("images")));
        assert_eq!(c.user_agent.as_deref(), Some("Custom/1.0"));
        assert_eq!(c.request_delay_secs, Some(3));
        assert_eq!(c.timeout_secs, Some(60));
        assert_eq!(c.retry_count, Some(5));
        assert_eq!(
            c.retry_backoff_secs.as_deref(),
            Some([1, 2, 4, 8].as_slice())
        );
    }

    #[test]
    fn parse_partial_config() {
        let c = parse_config("request_delay_secs = 1").unwrap();
        assert!(c.site.is_none());
        assert_eq!(c.request_delay_secs, Some(1));
        assert!(c.timeout_secs.is_none());
    }

    #[test]
    fn invalid_toml_errors() {
        assert!(parse_config("output_dir = [").is_err());
    }

    #[test]
    fn relative_site_errors() {
        assert!(parse_config(r#"site = "f-w-o.com""#).is_err());
    }

    #[test]
    fn non_http_site_errors() {
        let err = validate_site("ftp://f-w-o.com").unwrap_err();
        assert!(err.contains("unsupported scheme"));
    }
}
