//! Site configuration management for `sitecap.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── content    # [content]
//! │   └── languages  # [languages]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   ├── field      # FieldPath
//! │   └── handle     # Global config handle
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section        | Purpose                                          |
//! |----------------|--------------------------------------------------|
//! | `[content]`    | Content mounts (source, language, weight)        |
//! | `[languages]`  | Default language and per-language settings       |
//! | `[build]`      | Output directory, worker pool, error policy      |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    BuildConfig, ContentConfig, LanguageEntry, LanguagesConfig, MountConfig,
    WORKER_MULTIPLIER_ENV,
};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config};

use crate::capture::ProcessorOptions;
use crate::cli::{Cli, Commands};
use crate::core::ErrorPolicy;
use crate::page::SourceSpec;
use crate::utils::path::normalize_path;
use crate::vfs::Mount;
use crate::{debug, log};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_CONFIG_NAME: &str = "sitecap.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sitecap.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file; empty when running on defaults
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Site root: the config file's directory, else the working directory
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub languages: LanguagesConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

impl SiteConfig {
    /// Load configuration for a command.
    ///
    /// Searches upward from cwd for the config file. Without one, defaults
    /// apply and the working directory is the site root; an explicitly
    /// named config file must exist.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config, &cwd) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = normalize_path(&path);
                config
            }
            None if cli.config != Path::new(DEFAULT_CONFIG_NAME) => {
                bail!("Config file '{}' not found", cli.config.display());
            }
            None => {
                debug!("config"; "no {} found, using defaults", DEFAULT_CONFIG_NAME);
                Self::default()
            }
        };

        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        config.finalize(cli, &root);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Resolve paths against the root and apply CLI overrides.
    fn finalize(&mut self, cli: &Cli, root: &Path) {
        self.root = normalize_path(root);

        if let Some(content) = &cli.content {
            self.content.override_source(content);
        }
        if let Some(output) = &cli.output {
            self.build.output = output.clone();
        }
        self.apply_command_options(cli);

        let root = self.root.clone();
        self.content.normalize(&root);
        self.build.normalize(&root);
    }

    fn apply_command_options(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.common().verbose);

        if let Commands::Capture { args } = &cli.command {
            if args.fail_fast {
                self.build.on_error = ErrorPolicy::Cancel;
            }
            if args.partial {
                self.build.partial = true;
            }
        }
    }

    /// Validate configuration, collecting all errors at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.languages.validate(&mut diag);
        self.content.validate(&self.languages, &mut diag);
        self.build.validate(&mut diag);

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    // ========================================================================
    // runtime views
    // ========================================================================

    /// Get path relative to the site root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    pub fn source_spec(&self) -> SourceSpec {
        self.languages
            .languages()
            .into_iter()
            .fold(
                SourceSpec::new(&self.languages.default, &self.build.output),
                SourceSpec::with_language,
            )
            .with_default_in_subdir(self.languages.default_in_subdir)
    }

    pub fn mounts(&self) -> Vec<Mount> {
        self.content.mounts()
    }

    /// Codes `MountFs` recognizes in `name.<lang>.ext`.
    pub fn language_codes(&self) -> Vec<String> {
        self.source_spec().language_codes()
    }

    pub fn processor_options(&self) -> ProcessorOptions {
        self.build.processor_options()
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CaptureArgs, CommonArgs, WalkArgs};
    use crate::page::Language;
    use clap::ColorChoice;
    use tempfile::TempDir;

    fn cli(command: Commands) -> Cli {
        Cli {
            color: ColorChoice::Never,
            output: None,
            content: None,
            config: PathBuf::from(DEFAULT_CONFIG_NAME),
            command,
        }
    }

    fn capture_args() -> CaptureArgs {
        CaptureArgs {
            common: CommonArgs::default(),
            fail_fast: false,
            partial: false,
            json: false,
            progress: false,
        }
    }

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(SiteConfig::from_str("[content\nbase_path = 1").is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[build]\noutput = \"dist\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = SiteConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_source_spec_from_config() {
        let config = test_parse_config(
            r#"
[build]
output = "/srv/site"

[languages]
default = "en"
default_in_subdir = true

[languages.fr]
weight = 1

[languages.de]
weight = 2
disabled = true
"#,
        );
        let spec = config.source_spec();
        assert_eq!(spec.default_lang, "en");
        assert!(spec.default_in_subdir);
        assert_eq!(spec.publish_dir, PathBuf::from("/srv/site"));
        assert_eq!(spec.language_codes(), ["en", "fr", "de"]);
        assert_eq!(spec.language("de"), Some(&Language::new("de").with_weight(2).disabled()));
    }

    #[test]
    fn test_finalize_resolves_paths_and_overrides() {
        let root = TempDir::new().unwrap();
        let mut config = test_parse_config("[[content.mounts]]\nsource = \"a\"\n[[content.mounts]]\nsource = \"b\"");

        let mut cli = cli(Commands::Capture {
            args: CaptureArgs {
                fail_fast: true,
                partial: true,
                ..capture_args()
            },
        });
        cli.content = Some(PathBuf::from("docs"));
        cli.output = Some(PathBuf::from("out"));
        config.finalize(&cli, root.path());

        let root = normalize_path(root.path());
        assert_eq!(config.mounts(), [Mount::new(root.join("docs"))]);
        assert_eq!(config.build.output, root.join("out"));
        assert_eq!(config.build.on_error, ErrorPolicy::Cancel);
        assert!(config.processor_options().partial_build);
        assert_eq!(config.root_relative(root.join("out/x")), PathBuf::from("out/x"));
    }

    #[test]
    fn test_validate_reports_all_sections() {
        let root = TempDir::new().unwrap();
        let mut config = test_parse_config(
            "[build]\nitem_queue = 0\n[languages.en]\ndisabled = true\n[[content.mounts]]\nsource = \"missing\"",
        );
        config.finalize(
            &cli(Commands::Walk {
                args: WalkArgs::default(),
            }),
            root.path(),
        );

        let err = config.validate().unwrap_err();
        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err:?}");
        };
        assert_eq!(diag.len(), 3);
    }

    #[test]
    fn test_default_config_validates_with_content_dir() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("content")).unwrap();

        let mut config = SiteConfig::default();
        config.finalize(
            &cli(Commands::Walk {
                args: WalkArgs::default(),
            }),
            root.path(),
        );
        config.validate().unwrap();
        assert_eq!(config.language_codes(), ["en"]);
    }
}
