use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use textile_engine::{OutputKind, RenderOptions, Textile, TextileError, textplugs};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Rendering defaults read from `~/.config/textile/config.toml`. Every field
/// is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputKind,
    pub restricted: bool,
    pub lite: bool,
    pub no_images: bool,
    pub strict_whitespace: bool,
    pub link_rel: Option<String>,
    pub base_url: Option<String>,
    pub max_span_depth: usize,
    /// Names from [`textplugs::AVAILABLE`].
    pub textplugs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputKind::Html,
            restricted: false,
            lite: false,
            no_images: false,
            strict_whitespace: false,
            link_rel: None,
            base_url: None,
            max_span_depth: textile_engine::textile::DEFAULT_MAX_SPAN_DEPTH,
            textplugs: Vec::new(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/textile");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn to_render_options(&self) -> RenderOptions {
        RenderOptions {
            restricted: self.restricted,
            lite: self.lite,
            encode_only: false,
            suppress_images: self.no_images,
            strict_whitespace: self.strict_whitespace,
            link_rel: self.link_rel.clone().filter(|rel| !rel.is_empty()),
        }
    }

    /// Builds a converter with this output, span depth, base URL and textplugs.
    /// Unknown textplug names are logged and skipped.
    pub fn build_textile(&self) -> Result<Textile, TextileError> {
        let mut builder = Textile::builder()
            .output(self.output)
            .max_span_depth(self.max_span_depth);
        if let Some(base_url) = &self.base_url {
            builder = builder.base_url(base_url.as_str());
        }
        let mut textile = builder.build()?;
        for name in &self.textplugs {
            if !textplugs::register(&mut textile, name) {
                log::warn!("textplug {name:?} was not enabled");
            }
        }
        Ok(textile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/textile/config.toml"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_span_depth, 5);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config_content = r#"
output = "text"
restricted = true
link_rel = "nofollow"
textplugs = ["hr"]
"#;

        let config: Config = toml::from_str(config_content).unwrap();

        assert_eq!(config.output, OutputKind::Text);
        assert!(config.restricted);
        assert!(!config.lite);
        assert_eq!(config.link_rel.as_deref(), Some("nofollow"));
        assert_eq!(config.textplugs, vec!["hr".to_string()]);
    }

    #[test]
    fn test_unknown_output_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "output = \"pdf\"\n").unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            lite: true,
            base_url: Some("https://example.com/".to_string()),
            textplugs: vec!["hr".to_string()],
            ..Config::default()
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_render_options_follow_the_config() {
        let config = Config {
            restricted: true,
            no_images: true,
            link_rel: Some(String::new()),
            ..Config::default()
        };

        let options = config.to_render_options();

        assert!(options.restricted);
        assert!(options.suppress_images);
        assert!(!options.lite);
        assert_eq!(options.link_rel, None);
    }

    #[test]
    fn test_build_textile_enables_textplugs() {
        let config = Config {
            textplugs: vec!["hr".to_string(), "nonsense".to_string()],
            ..Config::default()
        };

        let textile = config.build_textile().unwrap();
        let html = textile.render("hr.", &config.to_render_options());

        assert_eq!(html, "<hr />");
    }

    #[test]
    fn test_build_textile_uses_text_output() {
        let config = Config {
            output: OutputKind::Text,
            ..Config::default()
        };

        let textile = config.build_textile().unwrap();

        assert_eq!(textile.output_kind(), OutputKind::Text);
    }
}
