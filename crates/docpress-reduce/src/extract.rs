//! Best-effort text-sample extraction for content-sample duplicate matching.
//!
//! Only text-bearing types (pdf/docx/txt) produce samples. Every failure
//! degrades to `None` — a missing sample just disables the content-sample
//! strategy for that file, it never fails an ingestion.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use tracing::debug;

use docpress_core::types::FileType;

/// Upper bound on bytes read from a plain-text file when sampling.
/// Four bytes per char covers the UTF-8 worst case.
const TXT_READ_FACTOR: usize = 4;

/// Decompressed-size cap for the DOCX document part (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extract up to `max_chars` characters of text from the file, if its type
/// is text-bearing and extraction succeeds.
pub fn text_sample(path: &Path, file_type: FileType, max_chars: usize) -> Option<String> {
    let result = match file_type {
        FileType::Txt => txt_sample(path, max_chars),
        FileType::Docx => docx_sample(path, max_chars),
        FileType::Pdf => pdf_sample(path, max_chars),
        _ => return None,
    };
    match result {
        Ok(text) if !text.is_empty() => Some(text),
        Ok(_) => None,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "text sample extraction failed");
            None
        }
    }
}

fn take_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn txt_sample(path: &Path, max_chars: usize) -> Result<String, Box<dyn std::error::Error>> {
    let mut file = File::open(path)?;
    let mut buf = Vec::new();
    file.take((max_chars * TXT_READ_FACTOR) as u64)
        .read_to_end(&mut buf)?;
    Ok(take_chars(&String::from_utf8_lossy(&buf), max_chars))
}

fn pdf_sample(path: &Path, max_chars: usize) -> Result<String, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let text = pdf_extract::extract_text_from_mem(&bytes)?;
    Ok(take_chars(text.trim(), max_chars))
}

/// Pull the visible text runs (`<w:t>` elements) out of a DOCX archive's
/// `word/document.xml`, separated by single spaces.
fn docx_sample(path: &Path, max_chars: usize) -> Result<String, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let entry = archive.by_name("word/document.xml")?;

    let mut xml = Vec::new();
    entry.take(MAX_XML_ENTRY_BYTES).read_to_end(&mut xml)?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err("word/document.xml exceeds size limit".into());
    }

    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut chars = 0usize;
    let mut in_text_run = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Event::End(e) if e.local_name().as_ref() == b"t" => in_text_run = false,
            Event::Text(t) if in_text_run => {
                let run = t.unescape()?;
                if !out.is_empty() && !run.is_empty() {
                    out.push(' ');
                    chars += 1;
                }
                for c in run.chars() {
                    out.push(c);
                    chars += 1;
                    if chars >= max_chars {
                        return Ok(out);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
