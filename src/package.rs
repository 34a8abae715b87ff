use log::{error, info, warn};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::archive::create_archive;
use crate::config::{ConfigError, PackageConfig};
use crate::convert::{CommandConverter, PageConverter};
use crate::customer::CustomerRecord;
use crate::document::process_document;
use crate::engine::TemplateEngine;
use crate::merge::merge_pdfs;
use crate::replacements::{build_replacements, MapError, ReplacementMap};
use crate::rules::{RuleError, RuleTable};

/// Characters that cannot appear in a file name on common platforms.
const UNSAFE_FILENAME_CHARS: &str = r#"[\\/:*?"<>|]"#;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Cannot create output directory {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot read template folder {path:?}: {source}")]
    Templates {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Rules(#[from] RuleError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("Invalid naming pattern: {0}")]
    Naming(String),
}

/// A per-file failure that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub file: String,
    pub error: String,
}

impl Failure {
    fn new(file: &Path, error: impl ToString) -> Self {
        Self {
            file: file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.to_string_lossy().into_owned()),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct PackageResult {
    pub generated: Vec<PathBuf>,
    pub errors: Vec<Failure>,
    pub output_dir: PathBuf,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub page_files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conversion_errors: Vec<Failure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merge_skipped: Vec<Failure>,
}

#[derive(Serialize)]
struct NamingContext<'a> {
    last_name: &'a str,
    document_date: &'a str,
}

/// Fills every template of a package for one customer.
pub struct PackageGenerator {
    config: PackageConfig,
    rules: RuleTable,
    engine: TemplateEngine,
    converter: Box<dyn PageConverter>,
    unsafe_chars: Regex,
    dry_run: bool,
}

impl PackageGenerator {
    /// Loads and validates the rule table named by `config`.
    pub fn new(config: PackageConfig) -> Result<Self, PackageError> {
        let rules = config.rule_table()?;
        Self::with_rules(config, rules)
    }

    pub fn with_rules(config: PackageConfig, rules: RuleTable) -> Result<Self, PackageError> {
        let mut engine = TemplateEngine::new();
        engine.add_global("package".to_string(), config.package_name.clone());
        rules.validate(&engine)?;

        let sample = NamingContext {
            last_name: "Customer",
            document_date: "undated",
        };
        for pattern in [&config.naming.merged, &config.naming.archive] {
            engine
                .render_string(pattern, &sample)
                .map_err(PackageError::Naming)?;
        }

        let unsafe_chars =
            Regex::new(UNSAFE_FILENAME_CHARS).map_err(|e| PackageError::Naming(e.to_string()))?;
        let converter = Box::new(CommandConverter::new(config.converter.clone()));

        Ok(Self {
            config,
            rules,
            engine,
            converter,
            unsafe_chars,
            dry_run: false,
        })
    }

    pub fn with_converter<C: PageConverter + 'static>(mut self, converter: C) -> Self {
        self.converter = Box::new(converter);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn build_map(&self, customer: &CustomerRecord) -> Result<ReplacementMap, PackageError> {
        Ok(build_replacements(customer, &self.rules, &self.engine)?)
    }

    /// Template containers in the configured folder, sorted by file name.
    pub fn list_templates(&self) -> Result<Vec<PathBuf>, PackageError> {
        let dir = self.config.templates_dir();
        let entries = fs::read_dir(&dir).map_err(|source| PackageError::Templates {
            path: dir.clone(),
            source,
        })?;

        let mut templates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.to_string_lossy() == self.config.extension)
            })
            .collect();
        templates.sort();
        Ok(templates)
    }

    fn safe_last_name(&self, customer: &CustomerRecord) -> String {
        self.unsafe_chars
            .replace_all(customer.display_last_name(), "_")
            .into_owned()
    }

    /// Output file name for `template`: each configured token becomes
    /// `_<last_name>`.
    pub fn output_name(&self, template: &Path, last_name: &str) -> String {
        let mut name = template
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let replacement = format!("_{}", last_name);
        for token in &self.config.filename_tokens {
            if !token.is_empty() {
                name = name.replace(token.as_str(), &replacement);
            }
        }
        name
    }

    /// Fills every template into `output_dir`. A template that fails is
    /// recorded in `errors` and the batch continues.
    pub fn generate_package(
        &self,
        customer: &CustomerRecord,
        output_dir: &Path,
    ) -> Result<PackageResult, PackageError> {
        if !self.dry_run {
            fs::create_dir_all(output_dir).map_err(|source| PackageError::OutputDir {
                path: output_dir.to_path_buf(),
                source,
            })?;
        }

        let map = self.build_map(customer)?;
        let templates = self.list_templates()?;
        let last_name = self.safe_last_name(customer);
        info!(
            "Filling {} templates for {} into {:?}",
            templates.len(),
            last_name,
            output_dir
        );

        let mut result = PackageResult {
            output_dir: output_dir.to_path_buf(),
            ..Default::default()
        };

        for template in templates {
            let output_path = output_dir.join(self.output_name(&template, &last_name));
            if self.dry_run {
                info!("[DRY RUN] Would write: {:?}", output_path);
                result.generated.push(output_path);
                continue;
            }
            match process_document(&template, &map, &output_path) {
                Ok(_) => result.generated.push(output_path),
                Err(e) => {
                    error!("Error processing {:?}: {}", template, e);
                    result.errors.push(Failure::new(&template, e));
                }
            }
        }

        Ok(result)
    }

    fn artifact_path(
        &self,
        pattern: &str,
        context: &NamingContext,
        output_dir: &Path,
    ) -> Result<PathBuf, PackageError> {
        let name = self
            .engine
            .render_string(pattern, context)
            .map_err(PackageError::Naming)?;
        Ok(output_dir.join(name))
    }

    /// Fills the package, converts every generated document, merges the
    /// converted files into one and archives them.
    pub fn generate_full_package(
        &self,
        customer: &CustomerRecord,
        output_dir: &Path,
    ) -> Result<PackageResult, PackageError> {
        let mut result = self.generate_package(customer, output_dir)?;
        if result.generated.is_empty() {
            warn!("No documents generated; skipping conversion");
            return Ok(result);
        }

        let last_name = self.safe_last_name(customer);
        let document_date = if customer.document_date.is_empty() {
            "undated".to_string()
        } else {
            self.unsafe_chars
                .replace_all(&customer.document_date, "_")
                .into_owned()
        };
        let context = NamingContext {
            last_name: &last_name,
            document_date: &document_date,
        };
        let merged_path = self.artifact_path(&self.config.naming.merged, &context, output_dir)?;
        let archive_path = self.artifact_path(&self.config.naming.archive, &context, output_dir)?;

        if self.dry_run {
            info!(
                "[DRY RUN] Would convert {} documents into {:?} and {:?}",
                result.generated.len(),
                merged_path,
                archive_path
            );
            result.merged = Some(merged_path);
            result.archive = Some(archive_path);
            return Ok(result);
        }

        for document in &result.generated {
            match self.converter.convert(document, output_dir) {
                Ok(page_file) => result.page_files.push(page_file),
                Err(e) => {
                    warn!("Could not convert {:?}: {}", document, e);
                    result.conversion_errors.push(Failure::new(document, e));
                }
            }
        }
        if result.page_files.is_empty() {
            warn!("No documents converted; skipping merge and archive");
            return Ok(result);
        }
        result.page_files.sort();

        match merge_pdfs(&result.page_files, &merged_path) {
            Ok(report) => {
                result.merge_skipped = report
                    .skipped
                    .iter()
                    .map(|(file, message)| Failure::new(file, message))
                    .collect();
                result.merged = Some(merged_path);
            }
            Err(e) => {
                error!("Merge failed: {}", e);
                result.errors.push(Failure::new(&merged_path, e));
            }
        }

        match create_archive(&result.page_files, &archive_path) {
            Ok(_) => result.archive = Some(archive_path),
            Err(e) => {
                error!("Archive failed: {}", e);
                result.errors.push(Failure::new(&archive_path, e));
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConversionError;
    use crate::test_support::{read_member, sample_customer, write_pdf, write_simple_docx};
    use tempfile::{tempdir, TempDir};

    /// Writes a one-page PDF for every input, failing on names containing
    /// `fail_on`.
    struct FakeConverter {
        fail_on: Option<&'static str>,
        garbage: bool,
    }

    impl PageConverter for FakeConverter {
        fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConversionError> {
            let stem = input
                .file_stem()
                .ok_or_else(|| ConversionError::InvalidInput(input.to_path_buf()))?
                .to_string_lossy()
                .into_owned();
            if self.fail_on.is_some_and(|f| stem.contains(f)) {
                return Err(ConversionError::Failed {
                    command: "fake".into(),
                    status: "exit status: 1".into(),
                    stderr: "cannot convert".into(),
                });
            }
            let output = out_dir.join(format!("{}.pdf", stem));
            if self.garbage {
                fs::write(&output, b"not a pdf").unwrap();
            } else {
                write_pdf(&output, 1, &stem);
            }
            Ok(output)
        }
    }

    fn setup(names: &[&str]) -> (TempDir, PackageConfig) {
        let dir = tempdir().unwrap();
        let templates = dir.path().join("templates");
        fs::create_dir(&templates).unwrap();
        for name in names {
            write_simple_docx(&templates.join(name), "JANE QUINN DOE of Springfield", "JQD");
        }
        let config = PackageConfig {
            base_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        (dir, config)
    }

    #[test]
    fn test_batch_with_one_corrupt_template() {
        let (dir, config) = setup(&[
            "01_Notice_JQD.docx",
            "02_Affidavit_JQD.docx",
            "04_Deed_JQD.docx",
            "05_Bond_JQD.docx",
        ]);
        fs::write(dir.path().join("templates/03_Broken_JQD.docx"), b"garbage").unwrap();
        let output = dir.path().join("out");

        let generator = PackageGenerator::new(config).unwrap();
        let result = generator
            .generate_package(&sample_customer(), &output)
            .unwrap();

        assert_eq!(result.generated.len(), 4);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].file, "03_Broken_JQD.docx");
        assert_eq!(result.output_dir, output);
        assert_eq!(result.generated[0], output.join("01_Notice_Smith.docx"));

        let body = read_member(&result.generated[0], "word/document.xml");
        assert!(body.contains("JOHN MICHAEL SMITH of Houston"));
        assert_eq!(
            read_member(&result.generated[0], "word/header1.xml"),
            crate::test_support::word_xml("JMS")
        );
    }

    #[test]
    fn test_only_configured_extension_is_processed() {
        let (dir, config) = setup(&["a_JQD.docx"]);
        fs::write(dir.path().join("templates/notes.txt"), "JQD").unwrap();
        fs::create_dir(dir.path().join("templates/old.docx")).unwrap();

        let generator = PackageGenerator::new(config).unwrap();
        let templates = generator.list_templates().unwrap();
        assert_eq!(templates, vec![dir.path().join("templates/a_JQD.docx")]);
    }

    #[test]
    fn test_output_name_uses_sanitized_last_name() {
        let (dir, config) = setup(&[]);
        let generator = PackageGenerator::new(config).unwrap();
        let mut customer = sample_customer();
        customer.last_name = "Smith/Jones".into();

        let last = generator.safe_last_name(&customer);
        assert_eq!(last, "Smith_Jones");
        assert_eq!(
            generator.output_name(&dir.path().join("Notice_JQD_v2_JQD.docx"), &last),
            "Notice_Smith_Jones_v2_Smith_Jones.docx"
        );

        customer.last_name.clear();
        assert_eq!(generator.safe_last_name(&customer), "Customer");
    }

    #[test]
    fn test_unwritable_output_dir_is_fatal() {
        let (dir, config) = setup(&["a_JQD.docx"]);
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let generator = PackageGenerator::new(config).unwrap();
        let result = generator.generate_package(&sample_customer(), &blocker.join("out"));
        assert!(matches!(result, Err(PackageError::OutputDir { .. })));
    }

    #[test]
    fn test_missing_template_folder_is_fatal() {
        let dir = tempdir().unwrap();
        let config = PackageConfig {
            base_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let generator = PackageGenerator::new(config).unwrap();
        let result = generator.generate_package(&sample_customer(), &dir.path().join("out"));
        assert!(matches!(result, Err(PackageError::Templates { .. })));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let (dir, config) = setup(&["a_JQD.docx", "b_JQD.docx"]);
        let output = dir.path().join("out");

        let generator = PackageGenerator::new(config).unwrap().with_dry_run(true);
        let result = generator
            .generate_full_package(&sample_customer(), &output)
            .unwrap();

        assert_eq!(result.generated.len(), 2);
        assert!(!output.exists());
        assert_eq!(
            result.merged,
            Some(output.join("Document_Package_Smith_2025-01-15_COMPLETE.pdf"))
        );
    }

    #[test]
    fn test_full_package_converts_merges_and_archives() {
        let (dir, config) = setup(&["01_Notice_JQD.docx", "02_Bond_JQD.docx", "03_Deed_JQD.docx"]);
        let output = dir.path().join("out");

        let generator = PackageGenerator::new(config)
            .unwrap()
            .with_converter(FakeConverter {
                fail_on: Some("Bond"),
                garbage: false,
            });
        let result = generator
            .generate_full_package(&sample_customer(), &output)
            .unwrap();

        assert_eq!(result.generated.len(), 3);
        assert_eq!(
            result.page_files,
            vec![output.join("01_Notice_Smith.pdf"), output.join("03_Deed_Smith.pdf")]
        );
        assert_eq!(result.conversion_errors.len(), 1);
        assert_eq!(result.conversion_errors[0].file, "02_Bond_Smith.docx");

        let merged = result.merged.unwrap();
        assert_eq!(
            merged,
            output.join("Document_Package_Smith_2025-01-15_COMPLETE.pdf")
        );
        assert_eq!(lopdf::Document::load(&merged).unwrap().get_pages().len(), 2);

        let archive = result.archive.unwrap();
        assert_eq!(
            archive,
            output.join("Document_Package_Smith_2025-01-15_Individual_PDFs.zip")
        );
        assert_eq!(
            crate::test_support::member_names(&archive),
            vec!["01_Notice_Smith.pdf", "03_Deed_Smith.pdf"]
        );
    }

    #[test]
    fn test_full_package_names_fall_back_when_fields_missing() {
        let (dir, mut config) = setup(&["a_JQD.docx"]);
        config.package_name = "Estate".into();
        let output = dir.path().join("out");
        let customer = CustomerRecord {
            first_name: "Ann".into(),
            ..Default::default()
        };

        let generator = PackageGenerator::new(config)
            .unwrap()
            .with_converter(FakeConverter {
                fail_on: None,
                garbage: false,
            });
        let result = generator.generate_full_package(&customer, &output).unwrap();

        assert_eq!(result.generated, vec![output.join("a_Customer.docx")]);
        assert_eq!(
            result.merged,
            Some(output.join("Estate_Customer_undated_COMPLETE.pdf"))
        );
    }

    #[test]
    fn test_invalid_naming_pattern_is_rejected() {
        let (_dir, mut config) = setup(&[]);
        config.naming.merged = "{{ missing_variable }}.pdf".into();
        assert!(matches!(
            PackageGenerator::new(config),
            Err(PackageError::Naming(_))
        ));
    }

    #[test]
    fn test_failed_merge_and_archive_are_recorded() {
        let (dir, config) = setup(&["01_Notice_JQD.docx", "02_Deed_JQD.docx"]);
        let output = dir.path().join("out");
        let archive_path = output.join("Document_Package_Smith_2025-01-15_Individual_PDFs.zip");
        fs::create_dir_all(&archive_path).unwrap();

        let generator = PackageGenerator::new(config)
            .unwrap()
            .with_converter(FakeConverter {
                fail_on: None,
                garbage: true,
            });
        let result = generator
            .generate_full_package(&sample_customer(), &output)
            .unwrap();

        assert_eq!(result.generated.len(), 2);
        assert_eq!(result.page_files.len(), 2);
        assert_eq!(result.merged, None);
        assert_eq!(result.archive, None);

        let failed: Vec<&str> = result.errors.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(
            failed,
            vec![
                "Document_Package_Smith_2025-01-15_COMPLETE.pdf",
                "Document_Package_Smith_2025-01-15_Individual_PDFs.zip",
            ]
        );
        assert!(!output
            .join("Document_Package_Smith_2025-01-15_COMPLETE.pdf")
            .exists());
    }
}
