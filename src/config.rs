//! YAML configuration

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use umlsplit_core::{CommunityOptions, HotspotOptions, ImportanceOptions, NamespaceOptions, OutlierOptions};

pub const DEFAULT_CONFIG_FILE: &str = "umlsplit.yaml";
pub const DEFAULT_OUTPUT_DIR: &str = "output/views";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub analysis: AnalysisConfig,
    pub diagram: DiagramConfig,
    pub views: ViewsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub json_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub generate_report: bool,
    pub report_format: ReportFormat,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            generate_report: true,
            report_format: ReportFormat::Markdown,
        }
    }
}

/// What the generated PlantUML class views show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub show_members: bool,
    pub show_methods: bool,
    /// Wrap classes in one `package` block per namespace.
    pub group_by_namespace: bool,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        DiagramConfig {
            show_members: true,
            show_methods: true,
            group_by_namespace: true,
        }
    }
}

/// A view section: an `enabled` switch next to the strategy's own options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toggle<T> {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(flatten)]
    pub options: T,
}

fn enabled_by_default() -> bool {
    true
}

impl<T: Default> Toggle<T> {
    fn on() -> Self {
        Toggle {
            enabled: true,
            options: T::default(),
        }
    }

    fn off() -> Self {
        Toggle {
            enabled: false,
            options: T::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerOptions {
    /// Layer name -> namespace prefix.
    pub layers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    pub namespace: Toggle<NamespaceOptions>,
    pub community: Toggle<CommunityOptions>,
    pub hotspot: Toggle<HotspotOptions>,
    pub importance: Toggle<ImportanceOptions>,
    pub layer: Toggle<LayerOptions>,
    pub god_classes: Toggle<OutlierOptions>,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        ViewsConfig {
            namespace: Toggle::on(),
            community: Toggle::on(),
            hotspot: Toggle::on(),
            importance: Toggle::on(),
            layer: Toggle::off(),
            god_classes: Toggle::off(),
        }
    }
}

impl Config {
    /// Load `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::warn!("Config file not found: {}; using defaults", path.display());
            return Ok(Config::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        // An empty document parses as null
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}
