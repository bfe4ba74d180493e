//! Configuration management for ssg.
//!
//! Parses `ssg.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Directory settings support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.source_dir`
//! - `site.output_dir`
//! - `layouts.dir`
//! - `partials.dir`

mod expand;

use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override content source directory.
    pub source_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "ssg.toml";

const DEFAULT_SOURCE_DIR: &str = "content";
const DEFAULT_OUTPUT_DIR: &str = "dist";
const DEFAULT_LAYOUTS_DIR: &str = "layouts";
const DEFAULT_PARTIALS_DIR: &str = "partials";
const DEFAULT_PAGES: &str = r"\.html?\b";
const DEFAULT_INDEX_FILE: &str = r"^index\.\w+";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site configuration (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Layout lookup configuration.
    layouts: DirConfigRaw,
    /// Partial lookup configuration.
    partials: DirConfigRaw,
    /// Navigation configuration.
    pub navigation: NavigationConfig,

    /// Resolved paths (set after loading).
    #[serde(skip)]
    pub paths: PathsConfig,
    /// Regex selecting page files, matched against relative paths.
    #[serde(skip)]
    pub pages: String,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw site configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
    pages: Option<String>,
}

/// Raw `[layouts]` / `[partials]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DirConfigRaw {
    dir: Option<String>,
}

/// Resolved directories, absolute when loaded from a file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    /// Content root.
    pub source_dir: PathBuf,
    /// Output root.
    pub output_dir: PathBuf,
    /// Layout lookup directory.
    pub layouts_dir: PathBuf,
    /// Partial lookup directory.
    pub partials_dir: PathBuf,
}

/// Navigation configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Regexes matching index file names; a matching page takes its
    /// directory's URL.
    pub index_files: Vec<String>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            index_files: vec![DEFAULT_INDEX_FILE.to_owned()],
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.output_dir`").
        field: String,
        /// Error message (e.g., "${`OUT_DIR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a string field to be a valid regex.
fn require_regex(value: &str, field: &str) -> Result<(), ConfigError> {
    Regex::new(value)
        .map(drop)
        .map_err(|e| ConfigError::Validation(format!("{field} is not a valid regex: {e}")))
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `ssg.toml` in current directory and parents,
    /// falling back to defaults relative to the current directory.
    ///
    /// CLI settings are applied after loading and path resolution; the
    /// result is validated last.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails
    /// or the configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.paths.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.paths.output_dir.clone_from(output_dir);
        }
    }

    /// Compiled pages pattern.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the pattern is not a valid regex.
    pub fn pages_regex(&self) -> Result<Regex, ConfigError> {
        Regex::new(&self.pages)
            .map_err(|e| ConfigError::Validation(format!("site.pages is not a valid regex: {e}")))
    }

    /// Compiled index file patterns.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if a pattern is not a valid regex.
    pub fn index_regexes(&self) -> Result<Vec<Regex>, ConfigError> {
        self.navigation
            .index_files
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    ConfigError::Validation(format!(
                        "navigation.index_files is not a valid regex: {e}"
                    ))
                })
            })
            .collect()
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(current)
    }

    fn discover_from(mut current: PathBuf) -> Option<PathBuf> {
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfigRaw::default(),
            layouts: DirConfigRaw::default(),
            partials: DirConfigRaw::default(),
            navigation: NavigationConfig::default(),
            paths: PathsConfig {
                source_dir: base.join(DEFAULT_SOURCE_DIR),
                output_dir: base.join(DEFAULT_OUTPUT_DIR),
                layouts_dir: base.join(DEFAULT_LAYOUTS_DIR),
                partials_dir: base.join(DEFAULT_PARTIALS_DIR),
            },
            pages: DEFAULT_PAGES.to_owned(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called by [`Config::load`] once CLI settings are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if a directory setting is empty, the
    /// source and output directories coincide, or a pattern is not a valid
    /// regex.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_dirs()?;
        self.validate_patterns()?;
        Ok(())
    }

    fn validate_dirs(&self) -> Result<(), ConfigError> {
        let raw = [
            (self.site.source_dir.as_deref(), "site.source_dir"),
            (self.site.output_dir.as_deref(), "site.output_dir"),
            (self.layouts.dir.as_deref(), "layouts.dir"),
            (self.partials.dir.as_deref(), "partials.dir"),
        ];
        for (value, field) in raw {
            if let Some(value) = value {
                require_non_empty(value, field)?;
            }
        }

        if self.paths.source_dir == self.paths.output_dir {
            return Err(ConfigError::Validation(
                "site.output_dir must differ from site.source_dir".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_patterns(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.pages, "site.pages")?;
        require_regex(&self.pages, "site.pages")?;

        if self.navigation.index_files.is_empty() {
            return Err(ConfigError::Validation(
                "navigation.index_files cannot be empty".to_owned(),
            ));
        }
        for pattern in &self.navigation.index_files {
            require_non_empty(pattern, "navigation.index_files")?;
            require_regex(pattern, "navigation.index_files")?;
        }

        Ok(())
    }

    /// Expand environment variable references in directory settings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let fields = [
            (&mut self.site.source_dir, "site.source_dir"),
            (&mut self.site.output_dir, "site.output_dir"),
            (&mut self.layouts.dir, "layouts.dir"),
            (&mut self.partials.dir, "partials.dir"),
        ];
        for (value, field) in fields {
            if let Some(raw) = value {
                *raw = expand::expand_env(raw, field)?;
            }
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.paths = PathsConfig {
            source_dir: resolve(self.site.source_dir.as_deref(), DEFAULT_SOURCE_DIR),
            output_dir: resolve(self.site.output_dir.as_deref(), DEFAULT_OUTPUT_DIR),
            layouts_dir: resolve(self.layouts.dir.as_deref(), DEFAULT_LAYOUTS_DIR),
            partials_dir: resolve(self.partials.dir.as_deref(), DEFAULT_PARTIALS_DIR),
        };
        self.pages = self
            .site
            .pages
            .clone()
            .unwrap_or_else(|| DEFAULT_PAGES.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(
            config.paths,
            PathsConfig {
                source_dir: PathBuf::from("/test/content"),
                output_dir: PathBuf::from("/test/dist"),
                layouts_dir: PathBuf::from("/test/layouts"),
                partials_dir: PathBuf::from("/test/partials"),
            }
        );
        assert_eq!(config.pages, r"\.html?\b");
        assert_eq!(config.navigation.index_files, vec![r"^index\.\w+".to_owned()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let mut config: Config = toml::from_str("").unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.paths.source_dir, PathBuf::from("/project/content"));
        assert_eq!(config.pages, r"\.html?\b");
        assert_eq!(config.navigation.index_files.len(), 1);
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[site]
source_dir = "src"
output_dir = "public"
pages = '\.(html|xml)$'

[layouts]
dir = "theme/layouts"

[partials]
dir = "theme/partials"

[navigation]
index_files = ['^index\.', '^README\.md$']
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.paths,
            PathsConfig {
                source_dir: PathBuf::from("/project/src"),
                output_dir: PathBuf::from("/project/public"),
                layouts_dir: PathBuf::from("/project/theme/layouts"),
                partials_dir: PathBuf::from("/project/theme/partials"),
            }
        );
        assert_eq!(config.pages, r"\.(html|xml)$");
        assert_eq!(config.index_regexes().unwrap().len(), 2);
        assert!(config.pages_regex().unwrap().is_match("feed.xml"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ssg.toml");
        std::fs::write(&path, "[site]\noutput_dir = \"out\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.paths.output_dir, dir.path().join("out"));
        assert_eq!(config.paths.source_dir, dir.path().join("content"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(p) if p == path));
    }

    #[test]
    fn test_load_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ssg.toml");
        std::fs::write(&path, "[site\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_applies_cli_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ssg.toml");
        std::fs::write(&path, "").unwrap();
        let settings = CliSettings {
            source_dir: Some(PathBuf::from("/override/src")),
            output_dir: None,
        };

        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.paths.source_dir, PathBuf::from("/override/src"));
        assert_eq!(config.paths.output_dir, dir.path().join("dist"));
    }

    #[test]
    fn test_load_validates_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ssg.toml");
        std::fs::write(&path, "").unwrap();
        let settings = CliSettings {
            source_dir: Some(PathBuf::from("/same")),
            output_dir: Some(PathBuf::from("/same")),
        };

        let result = Config::load(Some(&path), Some(&settings));

        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_discover_from_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ssg.toml"), "").unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = Config::discover_from(nested).unwrap();

        assert_eq!(found, dir.path().join("ssg.toml"));
    }

    #[test]
    fn test_expand_env_vars_dirs() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("SSG_CONFIG_TEST_THEME", "plain");
        }
        let toml = r#"
[layouts]
dir = "themes/${SSG_CONFIG_TEST_THEME}/layouts"

[site]
output_dir = "${SSG_CONFIG_TEST_UNSET:-dist}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();
        config.resolve_paths(Path::new("/p"));

        assert_eq!(config.paths.layouts_dir, PathBuf::from("/p/themes/plain/layouts"));
        assert_eq!(config.paths.output_dir, PathBuf::from("/p/dist"));
        unsafe {
            std::env::remove_var("SSG_CONFIG_TEST_THEME");
        }
    }

    #[test]
    fn test_validate_empty_dir() {
        let mut config: Config = toml::from_str("[partials]\ndir = \"\"\n").unwrap();
        config.resolve_paths(Path::new("/p"));

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("partials.dir cannot be empty"));
    }

    #[test]
    fn test_validate_same_source_and_output() {
        let mut config: Config =
            toml::from_str("[site]\nsource_dir = \"site\"\noutput_dir = \"site\"\n").unwrap();
        config.resolve_paths(Path::new("/p"));

        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_invalid_regex() {
        let mut config: Config = toml::from_str("[site]\npages = \"(\"\n").unwrap();
        config.resolve_paths(Path::new("/p"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("site.pages is not a valid regex"));

        let mut config: Config = toml::from_str("[navigation]\nindex_files = [\"[\"]\n").unwrap();
        config.resolve_paths(Path::new("/p"));
        assert!(config.validate().is_err());
        assert!(config.index_regexes().is_err());
    }

    #[test]
    fn test_validate_no_index_files() {
        let mut config: Config = toml::from_str("[navigation]\nindex_files = []\n").unwrap();
        config.resolve_paths(Path::new("/p"));

        assert!(config.validate().is_err());
    }
}
