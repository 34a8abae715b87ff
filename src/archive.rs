use log::info;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Archive I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] ZipError),
    #[error("{0:?} has no file name")]
    InvalidInput(PathBuf),
}

/// Writes `files` into a deflated zip at `output_path`, each stored under
/// its base name. Returns the number of members written.
pub fn create_archive(files: &[PathBuf], output_path: &Path) -> Result<usize, ArchiveError> {
    let mut zip = ZipWriter::new(File::create(output_path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ArchiveError::InvalidInput(path.clone()))?;
        zip.start_file(name.as_str(), options)?;
        io::copy(&mut File::open(path)?, &mut zip)?;
    }
    zip.finish()?;

    info!("Archived {} files into {:?}", files.len(), output_path);
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{member_names, read_member};
    use tempfile::tempdir;

    #[test]
    fn test_archive_flattens_names() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("pdf");
        std::fs::create_dir(&nested).unwrap();
        let a = nested.join("Notice_Smith.pdf");
        let b = dir.path().join("Affidavit_Smith.pdf");
        std::fs::write(&a, "first").unwrap();
        std::fs::write(&b, "second").unwrap();
        let output = dir.path().join("bundle.zip");

        let count = create_archive(&[a, b], &output).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            member_names(&output),
            vec!["Notice_Smith.pdf", "Affidavit_Smith.pdf"]
        );
        assert_eq!(read_member(&output, "Notice_Smith.pdf"), "first");
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = tempdir().unwrap();
        let result = create_archive(
            &[dir.path().join("absent.pdf")],
            &dir.path().join("bundle.zip"),
        );
        assert!(matches!(result, Err(ArchiveError::Io(_))));
    }

    #[test]
    fn test_empty_archive() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("empty.zip");
        assert_eq!(create_archive(&[], &output).unwrap(), 0);
        assert!(member_names(&output).is_empty());
    }
}
