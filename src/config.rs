use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::rules::{Rule, RuleError, RuleTable};

#[derive(Debug, Deserialize, Clone)]
pub struct PackageConfig {
    /// Folder holding the template containers.
    #[serde(default = "default_templates")]
    pub templates: String,

    /// File extension of template containers, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Prefix of the merged and archived artifact names.
    #[serde(default = "default_package_name")]
    pub package_name: String,

    /// Tokens in template file names replaced by `_<LastName>`.
    #[serde(default = "default_filename_tokens")]
    pub filename_tokens: Vec<String>,

    /// Default output folder; the CLI `--output` flag overrides it.
    pub output: Option<String>,

    #[serde(default)]
    pub rules: RulesConfig,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub converter: ConverterConfig,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_templates() -> String {
    "templates".to_string()
}

fn default_extension() -> String {
    "docx".to_string()
}

fn default_package_name() -> String {
    "Document_Package".to_string()
}

fn default_filename_tokens() -> Vec<String> {
    vec!["_JQD".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct RulesConfig {
    /// Start from the built-in table.
    #[serde(default = "default_true")]
    pub builtin: bool,
    /// Additional rule table files.
    #[serde(default)]
    pub files: Vec<String>,
    /// Rules written inline in the config.
    #[serde(default)]
    pub extra: Vec<Rule>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            builtin: default_true(),
            files: Vec::new(),
            extra: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// minijinja patterns for the package artifacts. Available variables:
/// `package`, `last_name`, `document_date`.
#[derive(Debug, Deserialize, Clone)]
pub struct NamingConfig {
    #[serde(default = "default_merged_name")]
    pub merged: String,
    #[serde(default = "default_archive_name")]
    pub archive: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            merged: default_merged_name(),
            archive: default_archive_name(),
        }
    }
}

fn default_merged_name() -> String {
    "{{ package }}_{{ last_name }}_{{ document_date }}_COMPLETE.pdf".to_string()
}

fn default_archive_name() -> String {
    "{{ package }}_{{ last_name }}_{{ document_date }}_Individual_PDFs.zip".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ConverterConfig {
    #[serde(default = "default_converter_command")]
    pub command: String,
    #[serde(default = "default_converter_args")]
    pub args: Vec<String>,
    /// Extension of the produced page-format file.
    #[serde(default = "default_converter_extension")]
    pub extension: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            command: default_converter_command(),
            args: default_converter_args(),
            extension: default_converter_extension(),
        }
    }
}

fn default_converter_command() -> String {
    "soffice".to_string()
}

fn default_converter_args() -> Vec<String> {
    ["--headless", "--convert-to", "pdf", "--outdir", "{outdir}", "{input}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_converter_extension() -> String {
    "pdf".to_string()
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid rule table {path:?}: {source}")]
    Rules {
        path: String,
        #[source]
        source: RuleError,
    },
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            templates: default_templates(),
            extension: default_extension(),
            package_name: default_package_name(),
            filename_tokens: default_filename_tokens(),
            output: None,
            rules: RulesConfig::default(),
            naming: NamingConfig::default(),
            converter: ConverterConfig::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl PackageConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: PackageConfig = serde_yaml::from_str(&content)?;
        config.base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Ok(config)
    }

    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.base_dir.join(relative)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.resolve(&self.templates)
    }

    /// Assembles the rule table: built-in rules, then each file, then the
    /// inline extras. A literal defined twice anywhere is an error.
    pub fn rule_table(&self) -> Result<RuleTable, ConfigError> {
        let mut table = if self.rules.builtin {
            RuleTable::builtin().map_err(|source| ConfigError::Rules {
                path: "<builtin>".to_string(),
                source,
            })?
        } else {
            RuleTable::default()
        };

        for file in &self.rules.files {
            let loaded = RuleTable::load(&self.resolve(file)).map_err(|source| {
                ConfigError::Rules {
                    path: file.clone(),
                    source,
                }
            })?;
            table.extend(loaded).map_err(|source| ConfigError::Rules {
                path: file.clone(),
                source,
            })?;
        }

        table
            .extend(RuleTable {
                rules: self.rules.extra.clone(),
            })
            .map_err(|source| ConfigError::Rules {
                path: "<config>".to_string(),
                source,
            })?;
        Ok(table)
    }
}
