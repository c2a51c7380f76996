//! # Folio CLI
//!
//! Command-line front end for `folio-core`: open a IIIF manifest or legacy
//! package from a URL or local file and print navigation answers.
//!
//! ## Usage
//!
//! ```bash
//! folio --data-uri https://example.org/iiif/book/manifest.json info
//! folio --data-uri package.json --paging pages 3
//! folio --data-uri manifest.json --sequence-index 1 label "iv"
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Resolved configuration, turned into `BootstrapOptions`
//! - `AutoResolver` - Fetches over HTTP(S) with reqwest, or from disk
//! - `report` - Plain-text renderings of provider queries

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod report;
mod resolver;

pub use resolver::{parse_body, unwrap_jsonp, AutoResolver, FetchError, FileResolver, HttpResolver};

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use folio_core::{open, BootstrapOptions, CanvasIndex, Dialect, DocumentProvider, ManifestResolver, Settings};

/// Command-line arguments for folio.
#[derive(Debug, Clone, Parser)]
#[command(name = "folio")]
#[command(about = "Resolve and navigate IIIF manifests and legacy packages")]
#[command(version)]
pub struct CliArgs {
    /// Document URI or path (e.g., <https://example.org/manifest.json>)
    #[arg(long, env = "FOLIO_DATA_URI")]
    pub data_uri: String,

    /// Prefix prepended to the document URI
    #[arg(long, env = "FOLIO_DATA_BASE_URI")]
    pub data_base_uri: Option<String>,

    /// Sequence to open
    #[arg(long, default_value = "0")]
    pub sequence_index: usize,

    /// Settings JSON file
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Treat the document as a legacy package
    #[arg(long)]
    pub legacy: bool,

    /// Fetch through the JSONP callback wrapper
    #[arg(long)]
    pub jsonp: bool,

    /// Enable two-page spreads
    #[arg(long)]
    pub paging: bool,

    /// Running on the viewer's home domain
    #[arg(long)]
    pub home_domain: bool,

    /// Only viewer instance on the page
    #[arg(long)]
    pub only_instance: bool,

    /// What to print
    #[command(subcommand)]
    pub command: Command,
}

/// Report to print.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Document summary and metadata
    Info,
    /// Navigation tree
    Tree,
    /// Resolve a typed label to a canvas index
    Label {
        /// Label to look up
        query: String,
    },
    /// Spread and stepping targets around a canvas
    Pages {
        /// Canvas index
        #[arg(allow_negative_numbers = true)]
        index: CanvasIndex,
    },
    /// Structures containing a canvas
    Structure {
        /// Canvas index
        #[arg(allow_negative_numbers = true)]
        index: CanvasIndex,
    },
    /// Thumbnail descriptors
    Thumbs {
        /// Thumbnail width
        #[arg(default_value = "100")]
        width: u32,
        /// Thumbnail height
        #[arg(default_value = "150")]
        height: u32,
    },
}

/// CLI configuration.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Document URI or path.
    pub data_uri: String,
    /// Prefix prepended to the document URI.
    pub data_base_uri: Option<String>,
    /// Sequence to open.
    pub sequence_index: usize,
    /// Settings JSON file.
    pub settings_path: Option<PathBuf>,
    /// Force the legacy dialect.
    pub legacy: bool,
    /// Use JSONP transport.
    pub jsonp: bool,
    /// Enable two-page spreads.
    pub paging: bool,
    /// Running on the home domain.
    pub home_domain: bool,
    /// Only viewer instance.
    pub only_instance: bool,
    /// Report to print.
    pub command: Command,
}

impl CliConfig {
    /// Configuration for a document with default flags.
    #[must_use]
    pub fn new(data_uri: impl Into<String>, command: Command) -> Self {
        Self {
            data_uri: data_uri.into(),
            data_base_uri: None,
            sequence_index: 0,
            settings_path: None,
            legacy: false,
            jsonp: false,
            paging: false,
            home_domain: false,
            only_instance: false,
            command,
        }
    }

    /// Build bootstrap options: settings file first, then flag overrides.
    ///
    /// # Errors
    ///
    /// Fails if the settings file cannot be read or parsed.
    pub async fn bootstrap_options(&self) -> anyhow::Result<BootstrapOptions> {
        let mut options = BootstrapOptions::new(self.data_uri.clone());

        if let Some(path) = &self.settings_path {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading settings from {}", path.display()))?;
            options.settings = Settings::from_json(&json)
                .with_context(|| format!("parsing settings from {}", path.display()))?;
        }

        if let Some(base) = &self.data_base_uri {
            options.settings.data_base_uri = Some(base.clone());
        }
        if self.paging {
            options.settings.paging_enabled = true;
        }
        if self.legacy {
            options.dialect = Some(Dialect::Legacy);
        }

        options.sequence_index = self.sequence_index;
        options.context.jsonp = self.jsonp;
        options.context.is_home_domain = self.home_domain;
        options.context.is_only_instance = self.only_instance;
        Ok(options)
    }
}

impl From<CliArgs> for CliConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            data_uri: args.data_uri,
            data_base_uri: args.data_base_uri,
            sequence_index: args.sequence_index,
            settings_path: args.settings,
            legacy: args.legacy,
            jsonp: args.jsonp,
            paging: args.paging,
            home_domain: args.home_domain,
            only_instance: args.only_instance,
            command: args.command,
        }
    }
}

/// Open the configured document and render the requested report.
///
/// # Errors
///
/// Fails when the settings file or the document cannot be loaded.
pub async fn run<R>(config: &CliConfig, resolver: &R) -> anyhow::Result<String>
where
    R: ManifestResolver + ?Sized,
{
    let options = config.bootstrap_options().await?;
    let viewer = open(resolver, options)
        .await
        .with_context(|| format!("opening {}", config.data_uri))?;

    let text = match &config.command {
        Command::Info => report::render_info(viewer.as_ref()),
        Command::Tree => report::render_tree(viewer.tree()),
        Command::Label { query } => report::render_label(viewer.as_ref(), query),
        Command::Pages { index } => report::render_pages(viewer.as_ref(), *index),
        Command::Structure { index } => report::render_structure(viewer.as_ref(), *index),
        Command::Thumbs { width, height } => report::render_thumbs(viewer.as_ref(), *width, *height),
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_into_config() {
        let args = CliArgs::try_parse_from([
            "folio",
            "--data-uri",
            "package.json",
            "--legacy",
            "--paging",
            "--sequence-index",
            "1",
            "pages",
            "-1",
        ])
        .unwrap();
        let config = CliConfig::from(args);

        assert_eq!(config.data_uri, "package.json");
        assert!(config.legacy);
        assert!(config.paging);
        assert_eq!(config.sequence_index, 1);
        assert_eq!(config.command, Command::Pages { index: -1 });
    }

    #[test]
    fn thumbs_take_positional_size() {
        let args = CliArgs::try_parse_from(["folio", "--data-uri", "m.json", "thumbs", "64", "48"]).unwrap();
        assert_eq!(
            args.command,
            Command::Thumbs {
                width: 64,
                height: 48
            }
        );
    }

    #[test]
    fn thumbs_have_default_size() {
        let args = CliArgs::try_parse_from(["folio", "--data-uri", "m.json", "thumbs"]).unwrap();
        assert_eq!(
            args.command,
            Command::Thumbs {
                width: 100,
                height: 150
            }
        );
    }

    #[tokio::test]
    async fn flags_override_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"dataBaseUri": "http://old/", "pagingEnabled": false, "theme": "dark"}"#,
        )
        .unwrap();

        let mut config = CliConfig::new("package.json", Command::Info);
        config.settings_path = Some(path);
        config.data_base_uri = Some("http://new/".into());
        config.paging = true;
        config.legacy = true;
        config.jsonp = true;

        let options = config.bootstrap_options().await.unwrap();
        assert_eq!(options.settings.data_base_uri.as_deref(), Some("http://new/"));
        assert!(options.settings.paging_enabled);
        assert_eq!(options.settings.extra.get("theme"), Some(&serde_json::json!("dark")));
        assert_eq!(options.forced_dialect(), Some(Dialect::Legacy));
        assert!(options.context.jsonp);
        assert_eq!(options.context.data_uri, "package.json");
    }

    #[tokio::test]
    async fn missing_settings_file_is_an_error() {
        let mut config = CliConfig::new("m.json", Command::Info);
        config.settings_path = Some(PathBuf::from("/nonexistent/folio/settings.json"));
        let err = config.bootstrap_options().await.unwrap_err();
        assert!(err.to_string().contains("reading settings"));
    }
}
