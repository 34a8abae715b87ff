use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::customer::{CustomerRecord, LienAmount};

pub fn sample_customer() -> CustomerRecord {
    CustomerRecord {
        first_name: "John".into(),
        middle_name: "Michael".into(),
        last_name: "Smith".into(),
        suffix: String::new(),
        ssn: "123-45-6789".into(),
        street_address: "456 Oak Lane".into(),
        city: "Houston".into(),
        state: "Texas".into(),
        zip_code: "77001".into(),
        county: "Harris".into(),
        birth_state: "Texas".into(),
        ucc_filing_number: "202512345678".into(),
        ucc_filing_state: "Delaware".into(),
        registered_mail_number: "RF123456789US".into(),
        dtc_routing_number: "0810-0001-2".into(),
        dtc_account_number: "012345678".into(),
        lien_amount: LienAmount(250_000_000),
        document_date: "2025-01-15".into(),
        birth_date: "1985-06-15".into(),
        birth_cert_number: "124-85-061589".into(),
    }
}

/// Wraps plain text in the smallest WordprocessingML body Word accepts.
pub fn word_xml(text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#,
        text
    )
}

/// Writes a zip container with the given members, in order.
pub fn write_docx(path: &Path, members: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (name, data) in members {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// Writes a docx whose body contains `body_text`, plus a header part.
pub fn write_simple_docx(path: &Path, body_text: &str, header_text: &str) {
    let body = word_xml(body_text);
    let header = word_xml(header_text);
    write_docx(
        path,
        &[
            ("[Content_Types].xml", b"<Types/>".as_slice()),
            ("word/document.xml", body.as_bytes()),
            ("word/header1.xml", header.as_bytes()),
            ("word/media/image1.png", b"\x89PNG not really".as_slice()),
        ],
    );
}

/// Reads one member of a zip container as text.
pub fn read_member(path: &Path, name: &str) -> String {
    use std::io::Read;
    let file = File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

/// Member names of a zip container, in archive order.
pub fn member_names(path: &Path) -> Vec<String> {
    let file = File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Builds a PDF with `pages` pages, each showing `label`.
pub fn write_pdf(path: &Path, pages: u32, label: &str) {
    use lopdf::{Dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let catalog_id = doc.new_object_id();

    let mut kids = Vec::new();
    for page in 0..pages {
        let content_id = doc.new_object_id();
        let page_id = doc.new_object_id();
        let content = format!("BT /F1 12 Tf 50 700 Td ({}-{}) Tj ET", label, page + 1);
        doc.objects.insert(
            content_id,
            Object::Stream(Stream::new(Dictionary::new(), content.into_bytes())),
        );

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(pages_id));
        page_dict.set("Contents", Object::Reference(content_id));
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );
        doc.objects.insert(page_id, Object::Dictionary(page_dict));
        kids.push(Object::Reference(page_id));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(pages as i64));
    pages_dict.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).unwrap();
}
