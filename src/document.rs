use log::{debug, error, info};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::replacements::ReplacementMap;
use crate::substitution::{apply_substitutions, count_occurrences};

/// Parts that carry visible document text. Anything else is copied as is.
pub const TEXT_PARTS: [&str; 7] = [
    "word/document.xml",
    "word/header1.xml",
    "word/header2.xml",
    "word/header3.xml",
    "word/footer1.xml",
    "word/footer2.xml",
    "word/footer3.xml",
];

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Cannot open container {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
    #[error("Cannot read container member: {0}")]
    Member(#[from] ZipError),
    #[error("Container member {0:?} escapes the package root")]
    UnsafeMember(String),
    #[error("Part {part} is not valid UTF-8: {source}")]
    Decode {
        part: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("Scratch directory error: {0}")]
    Scratch(#[from] io::Error),
    #[error("Cannot write container {path:?}: {message}")]
    Repack { path: PathBuf, message: String },
}

/// A container member extracted into the scratch directory.
struct Member {
    name: String,
    local: PathBuf,
    is_dir: bool,
}

/// Extracts every member of `archive` under `root`, keeping archive order.
fn extract_members<R: io::Read + io::Seek>(
    archive: &mut ZipArchive<R>,
    root: &Path,
) -> Result<Vec<Member>, ProcessingError> {
    let mut members = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        let relative = entry
            .enclosed_name()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| ProcessingError::UnsafeMember(name.clone()))?;
        let local = root.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&local)?;
        } else {
            if let Some(parent) = local.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&local)?;
            io::copy(&mut entry, &mut out)?;
        }
        members.push(Member {
            is_dir: entry.is_dir(),
            name,
            local,
        });
    }
    Ok(members)
}

/// Applies `map` to every text part present under `root`. Returns the number
/// of replacements made.
fn substitute_parts(root: &Path, map: &ReplacementMap) -> Result<usize, ProcessingError> {
    let mut total = 0;
    for part in TEXT_PARTS {
        let path = root.join(part);
        if !path.is_file() {
            continue;
        }
        let content = String::from_utf8(fs::read(&path)?).map_err(|source| {
            ProcessingError::Decode {
                part: part.to_string(),
                source,
            }
        })?;
        let count = count_occurrences(&content, map);
        if count == 0 {
            continue;
        }
        fs::write(&path, apply_substitutions(&content, map))?;
        debug!("{}: {} replacements", part, count);
        total += count;
    }
    Ok(total)
}

fn write_container(output_path: &Path, members: &[Member]) -> Result<(), ZipRepackError> {
    let file = File::create(output_path)?;
    let mut zip = ZipWriter::new(file);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for member in members {
        if member.is_dir {
            zip.add_directory(member.name.as_str(), deflated)?;
            continue;
        }
        let options = if member.name.starts_with("word/media/") {
            stored
        } else {
            deflated
        };
        zip.start_file(member.name.as_str(), options)?;
        let mut local = File::open(&member.local)?;
        io::copy(&mut local, &mut zip)?;
    }
    zip.finish()?;
    Ok(())
}

#[derive(Error, Debug)]
enum ZipRepackError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Zip(#[from] ZipError),
}

/// Fills one template container and writes the result to `output_path`.
///
/// The template is extracted into a private scratch directory that is
/// removed when this function returns, on success or failure. Replacement
/// keys and values are XML-escaped before they are applied to the text
/// parts. An existing file at `output_path` is overwritten.
pub fn process_document(
    template_path: &Path,
    map: &ReplacementMap,
    output_path: &Path,
) -> Result<usize, ProcessingError> {
    let file = File::open(template_path).map_err(|e| ProcessingError::Open {
        path: template_path.to_path_buf(),
        source: ZipError::Io(e),
    })?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|source| ProcessingError::Open {
            path: template_path.to_path_buf(),
            source,
        })?;

    let scratch = tempfile::tempdir()?;
    let members = extract_members(&mut archive, scratch.path())?;
    let replaced = substitute_parts(scratch.path(), &map.xml_escaped())?;

    if let Err(e) = write_container(output_path, &members) {
        error!("Failed to repack {:?}: {}", output_path, e);
        let _ = fs::remove_file(output_path);
        return Err(ProcessingError::Repack {
            path: output_path.to_path_buf(),
            message: e.to_string(),
        });
    }

    info!("{:?} ({} replacements)", output_path, replaced);
    Ok(replaced)
}
