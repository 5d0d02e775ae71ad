use std::{
    io::{Cursor, Read},
    path::Path,
};

use quick_xml::{Reader as XmlReader, events::Event};
use thiserror::Error;
use zip::ZipArchive;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "docx", "pdf"];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("'utf-8' codec can't decode the uploaded file: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("failed to open DOCX archive: {0}")]
    DocxArchive(#[from] zip::result::ZipError),
    #[error("failed to read DOCX XML: {0}")]
    DocxRead(#[from] std::io::Error),
    #[error("failed to parse DOCX XML: {0}")]
    DocxXml(String),
    #[error("failed to extract PDF text: {0}")]
    Pdf(String),
    #[error("unsupported file type: {0}")]
    Unsupported(String),
}

/// Decodes an uploaded document into text, choosing the reader by file extension.
/// Files without an extension are treated as plain text.
pub fn decode_upload(file_name: &str, bytes: Vec<u8>) -> Result<String, DecodeError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("txt")
        .to_ascii_lowercase();

    match extension.as_str() {
        "txt" => Ok(String::from_utf8(bytes)?),
        "docx" => extract_docx_text(&bytes),
        "pdf" => pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|err| DecodeError::Pdf(err.to_string())),
        other => Err(DecodeError::Unsupported(other.to_string())),
    }
}

fn extract_docx_text(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut document = archive.by_name("word/document.xml")?;

    let mut xml = String::new();
    document.read_to_string(&mut xml)?;

    let mut reader = XmlReader::from_str(&xml);
    let mut buf = Vec::new();
    let mut output = String::new();
    let mut in_text_node = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"w:p" => push_paragraph_break(&mut output),
                b"w:tab" => output.push('\t'),
                b"w:br" => output.push('\n'),
                b"w:t" => in_text_node = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:p" => push_paragraph_break(&mut output),
                b"w:tab" => output.push('\t'),
                b"w:br" => output.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text_node => {
                let value = e
                    .unescape()
                    .map_err(|err| DecodeError::DocxXml(err.to_string()))?;
                output.push_str(&value);
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"w:t" => in_text_node = false,
            Ok(Event::Eof) => break,
            Err(err) => return Err(DecodeError::DocxXml(err.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(output.trim().to_string())
}

fn push_paragraph_break(output: &mut String) {
    if !output.is_empty() {
        output.push_str("\n\n");
    }
}
