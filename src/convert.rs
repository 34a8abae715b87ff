use crate::config::ConverterConfig;
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("Converter reported success but {0:?} was not produced")]
    MissingOutput(PathBuf),
    #[error("Input {0:?} has no file name")]
    InvalidInput(PathBuf),
}

/// Turns a document container into a page-format file.
pub trait PageConverter {
    /// Converts `input` and returns the path of the file written to
    /// `out_dir`.
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConversionError>;
}

/// Runs an external converter, LibreOffice by default.
///
/// Arguments may contain `{input}` and `{outdir}`, which are replaced with
/// the document path and the output directory.
pub struct CommandConverter {
    config: ConverterConfig,
}

impl CommandConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Path the converter is expected to produce for `input`.
    pub fn expected_output(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConversionError> {
        let stem = input
            .file_stem()
            .ok_or_else(|| ConversionError::InvalidInput(input.to_path_buf()))?;
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(&self.config.extension);
        Ok(out_dir.join(name))
    }

    fn expand_args(&self, input: &Path, out_dir: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let out_dir = out_dir.to_string_lossy();
        self.config
            .args
            .iter()
            .map(|arg| arg.replace("{input}", &input).replace("{outdir}", &out_dir))
            .collect()
    }
}

impl Default for CommandConverter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}

impl PageConverter for CommandConverter {
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConversionError> {
        let expected = self.expected_output(input, out_dir)?;
        let args = self.expand_args(input, out_dir);

        debug!("Running {} {:?}", self.config.command, args);
        let output = Command::new(&self.config.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ConversionError::Spawn {
                command: self.config.command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("{}: {}", self.config.command, stdout.trim());
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("Conversion failed for {:?}: {}", input, stderr);
            return Err(ConversionError::Failed {
                command: self.config.command.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        if !expected.is_file() {
            return Err(ConversionError::MissingOutput(expected));
        }
        info!("Converted {:?}", expected);
        Ok(expected)
    }
}
