use log::{info, warn};
use lopdf::{Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("None of the {0} source files could be read")]
    NothingToMerge(usize),
    #[error("Malformed page tree: {0}")]
    Structure(String),
    #[error("Failed to save merged document: {0}")]
    Save(String),
    #[error("Failed to write merged document: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Sources that made it into the output, in merge order.
    pub merged: Vec<PathBuf>,
    /// Sources that could not be read, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    pub pages: usize,
}

/// Shifts every indirect reference inside `object` by `offset`.
fn shift_references(object: &mut Object, offset: u32) {
    match object {
        Object::Reference(id) => id.0 += offset,
        Object::Array(items) => items
            .iter_mut()
            .for_each(|item| shift_references(item, offset)),
        Object::Dictionary(dict) => dict
            .iter_mut()
            .for_each(|(_, value)| shift_references(value, offset)),
        Object::Stream(stream) => stream
            .dict
            .iter_mut()
            .for_each(|(_, value)| shift_references(value, offset)),
        _ => {}
    }
}

/// Object id of the document's root `Pages` node.
fn pages_root(doc: &Document) -> Result<ObjectId, MergeError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| MergeError::Structure("no Root in trailer".into()))?;
    let catalog = doc
        .objects
        .get(&catalog_id)
        .ok_or_else(|| MergeError::Structure("catalog not found".into()))?
        .as_dict()
        .map_err(|_| MergeError::Structure("catalog is not a dictionary".into()))?;
    catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| MergeError::Structure("no Pages in catalog".into()))
}

/// Moves all objects of `source` into `dest` and returns the page ids of
/// `source` as they are numbered in `dest`.
fn import_document(dest: &mut Document, source: Document) -> Vec<ObjectId> {
    let offset = dest.max_id;
    let pages: Vec<ObjectId> = source
        .get_pages()
        .values()
        .map(|&(id, generation)| (id + offset, generation))
        .collect();

    for ((id, generation), mut object) in source.objects {
        shift_references(&mut object, offset);
        dest.objects.insert((id + offset, generation), object);
    }
    dest.max_id = dest.max_id.max(source.max_id + offset);
    pages
}

/// Merges `files` in sorted file-name order into `output_path`.
///
/// A source that cannot be loaded is skipped with a warning and listed in
/// the report; only when nothing is readable does the merge fail.
pub fn merge_pdfs(files: &[PathBuf], output_path: &Path) -> Result<MergeReport, MergeError> {
    let mut sorted = files.to_vec();
    sorted.sort();

    let mut report = MergeReport::default();
    let mut dest: Option<(Document, ObjectId, Vec<ObjectId>)> = None;

    for path in sorted {
        let doc = match Document::load(&path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Could not add {:?}: {}", path, e);
                report.skipped.push((path, e.to_string()));
                continue;
            }
        };

        match dest.as_mut() {
            None => {
                let root = match pages_root(&doc) {
                    Ok(root) => root,
                    Err(e) => {
                        warn!("Could not add {:?}: {}", path, e);
                        report.skipped.push((path, e.to_string()));
                        continue;
                    }
                };
                let kids = doc.get_pages().values().copied().collect();
                dest = Some((doc, root, kids));
            }
            Some((merged, _, kids)) => {
                kids.extend(import_document(merged, doc));
            }
        }
        report.merged.push(path);
    }

    let (mut merged, root, kids) = dest.ok_or(MergeError::NothingToMerge(files.len()))?;

    for kid in &kids {
        if let Some(Object::Dictionary(page)) = merged.objects.get_mut(kid) {
            page.set("Parent", Object::Reference(root));
        }
    }
    match merged.objects.get_mut(&root) {
        Some(Object::Dictionary(pages)) => {
            pages.set(
                "Kids",
                Object::Array(kids.iter().map(|&id| Object::Reference(id)).collect()),
            );
            pages.set("Count", Object::Integer(kids.len() as i64));
        }
        _ => return Err(MergeError::Structure("Pages is not a dictionary".into())),
    }

    merged.compress();
    let mut buffer = Vec::new();
    merged
        .save_to(&mut buffer)
        .map_err(|e| MergeError::Save(e.to_string()))?;
    std::fs::write(output_path, buffer)?;

    report.pages = kids.len();
    info!(
        "Merged {} files ({} pages) into {:?}",
        report.merged.len(),
        report.pages,
        output_path
    );
    Ok(report)
}
