//! Site configuration management for `penmark.toml`.
//!
//! # Sections
//!
//! | Section        | Purpose                                         |
//! |----------------|-------------------------------------------------|
//! | `[base]`       | Site metadata (title, author, description)      |
//! | `[base.social]`| Profile links for the theme                     |
//! | `[build]`      | Theme name and content/output/theme directories |
//! | `[serve]`      | Preview server (interface, port) and debounce   |
//!
//! The configuration is loaded once per command and passed by reference into
//! the build, watch and serve entry points. Nothing reads it from global state.
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Blog"
//! author = "Alice"
//!
//! [build]
//! theme = "default"
//! output = "public"
//!
//! [serve]
//! port = 8080
//! ```

mod base;
mod build;
pub mod defaults;
mod error;
mod serve;

pub use base::BaseConfig;
pub use build::BuildConfig;
pub use error::ConfigError;
pub use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config filename
pub const CONFIG_FILE: &str = "penmark.toml";

/// Subdirectory of the content dir holding posts (also the output subdirectory).
pub const POSTS_DIR: &str = "posts";

/// Subdirectory of the content dir holding assets (also the output subdirectory).
pub const ASSETS_DIR: &str = "assets";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing penmark.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Absolute site root; every relative path resolves against it
    #[serde(skip)]
    pub root: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Preview server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Default configuration rooted at `root`, with all paths resolved.
    #[cfg(test)]
    pub fn with_root(root: &Path) -> Self {
        let mut config = Self::default();
        config.resolve_paths(root, Path::new(CONFIG_FILE));
        config
    }

    /// Load the config file named on the command line and apply CLI overrides.
    ///
    /// A missing config file is an error for every command except `init`,
    /// which starts from defaults.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = match (config_path.exists(), cli.is_init()) {
            (true, true) => bail!(
                "Config file `{}` already exists. Remove it manually or init in a different path.",
                config_path.display()
            ),
            (true, false) => Self::from_path(&config_path)?,
            (false, true) => Self::default(),
            (false, false) => bail!("Config file `{}` not found.", config_path.display()),
        };

        config.update_with_cli(cli);
        if !cli.is_init() {
            config.validate()?;
        }
        Ok(config)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let base = cli.root.clone().unwrap_or_else(|| PathBuf::from("./"));
        let root = match &cli.command {
            Commands::Init { name: Some(name) } => base.join(name),
            _ => base,
        };
        self.resolve_paths(&root, &cli.config);

        if let Commands::Watch { interface, port } = &cli.command {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve all paths against `root` and normalize them to absolute paths
    fn resolve_paths(&mut self, root: &Path, config_file: &Path) {
        let root = normalize_path(root);

        self.config_path = normalize_path(&root.join(config_file));
        self.build.themes = normalize_path(&root.join(&self.build.themes));
        self.build.content = normalize_path(&root.join(&self.build.content));
        self.build.output = normalize_path(&root.join(&self.build.output));
        self.root = root;
    }

    /// Validate values that serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build.theme.trim().is_empty() {
            return Err(ConfigError::Validation("[build.theme] must not be empty".into()));
        }
        if self.build.theme.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "[build.theme] must be a directory name, not a path".into(),
            ));
        }
        if self.serve.port == 0 {
            return Err(ConfigError::Validation("[serve.port] must not be 0".into()));
        }
        if self.serve.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "[serve.debounce_ms] must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Path accessors
    // ------------------------------------------------------------------------

    /// Active theme directory: `<themes>/<theme>`
    pub fn theme_dir(&self) -> PathBuf {
        self.build.themes.join(&self.build.theme)
    }

    /// Theme asset directory: `<themes>/<theme>/assets`
    pub fn theme_assets_dir(&self) -> PathBuf {
        self.theme_dir().join(ASSETS_DIR)
    }

    /// Content posts directory: `<content>/posts`
    pub fn posts_dir(&self) -> PathBuf {
        self.build.content.join(POSTS_DIR)
    }

    /// Content asset directory: `<content>/assets`
    pub fn assets_dir(&self) -> PathBuf {
        self.build.content.join(ASSETS_DIR)
    }

    /// Output posts directory: `<output>/posts`
    pub fn output_posts_dir(&self) -> PathBuf {
        self.build.output.join(POSTS_DIR)
    }

    /// Output asset directory: `<output>/assets`
    pub fn output_assets_dir(&self) -> PathBuf {
        self.build.output.join(ASSETS_DIR)
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists
fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}
