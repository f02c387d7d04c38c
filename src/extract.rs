//! Text extraction for uploaded documents (PDF, DOCX, email).
//!
//! The ingestion boundary supplies raw bytes plus a declared [`FileKind`];
//! this module returns flat UTF-8 text or a typed error:
//!
//! | Failure | Error |
//! |---------|-------|
//! | Extension outside the allow-list | [`Error::UnsupportedFormat`] |
//! | Bytes do not parse as the declared kind | [`Error::CorruptInput`] |
//! | Parsed, but no non-whitespace text | [`Error::EmptyContent`] |

use std::io::Read;

use docqa_core::models::FileKind;
use docqa_core::{Error, Result};
use mail_parser::{Message, MessageParser, MessagePart, MimeHeaders, PartType};
use quick_xml::events::Event;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extract text from a file, resolving its kind from the filename.
pub fn extract_file(bytes: &[u8], filename: &str) -> Result<(FileKind, String)> {
    let kind = FileKind::from_filename(filename)?;
    let text = extract_text(bytes, kind)?;
    Ok((kind, text))
}

/// Extract plain text from bytes of a known kind.
pub fn extract_text(bytes: &[u8], kind: FileKind) -> Result<String> {
    let text = match kind {
        FileKind::Pdf => extract_pdf(bytes)?,
        FileKind::Docx => extract_docx(bytes)?,
        FileKind::Email => extract_email(bytes)?,
    };
    if text.trim().is_empty() {
        return Err(Error::EmptyContent);
    }
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::CorruptInput(format!("PDF extraction failed: {}", e)))
}

fn extract_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| Error::CorruptInput(format!("not a DOCX archive: {}", e)))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| Error::CorruptInput("word/document.xml not found".to_string()))?;

    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| Error::CorruptInput(e.to_string()))?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(Error::CorruptInput(format!(
            "word/document.xml exceeds size limit ({} bytes)",
            MAX_XML_ENTRY_BYTES
        )));
    }
    docx_paragraphs(&xml)
}

/// Walk WordprocessingML, emitting `w:t` runs and one line per paragraph.
fn docx_paragraphs(xml: &[u8]) -> Result<String> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| Error::CorruptInput(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" | b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::CorruptInput(format!("malformed DOCX XML: {}", e))),
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim_end_matches('\n').to_string())
}

fn extract_email(bytes: &[u8]) -> Result<String> {
    let message = MessageParser::default()
        .parse(bytes)
        .ok_or_else(|| Error::CorruptInput("not a parseable RFC 822 message".to_string()))?;

    let body = first_plain_text(&message, 0)
        .or_else(|| message.body_text(0).map(|b| b.into_owned()))
        .unwrap_or_default();

    let subject = message.subject().unwrap_or("").trim();
    if subject.is_empty() && body.trim().is_empty() {
        return Ok(String::new());
    }
    Ok(format!("Subject: {}\n\n{}", subject, body))
}

/// Depth-first search for the first `text/plain` part, descending into
/// multiparts and attached messages.
fn first_plain_text(message: &Message<'_>, part_id: usize) -> Option<String> {
    let part = message.parts.get(part_id)?;
    match &part.body {
        PartType::Text(text) if is_plain(part) => Some(text.to_string()),
        PartType::Multipart(children) => children
            .iter()
            .find_map(|child| first_plain_text(message, *child as usize)),
        PartType::Message(inner) => first_plain_text(inner, 0),
        _ => None,
    }
}

fn is_plain(part: &MessagePart<'_>) -> bool {
    match part.content_type() {
        // No Content-Type header means text/plain.
        None => true,
        Some(ct) => {
            ct.ctype().eq_ignore_ascii_case("text")
                && ct
                    .subtype()
                    .map_or(true, |s| s.eq_ignore_ascii_case("plain"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            let xml = format!(
                "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
                body
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn docx_paragraphs_joined_by_newline() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t xml:space=\"preserve\">Grace </w:t></w:r><w:r><w:t>period</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Thirty</w:t><w:tab/><w:t>days</w:t></w:r></w:p>",
        );
        let text = extract_text(&bytes, FileKind::Docx).unwrap();
        assert_eq!(text, "Grace period\nThirty\tdays");
    }

    #[test]
    fn docx_without_text_is_empty_content() {
        let bytes = docx_with_body("<w:p/><w:p><w:r><w:t>  </w:t></w:r></w:p>");
        assert!(matches!(
            extract_text(&bytes, FileKind::Docx),
            Err(Error::EmptyContent)
        ));
    }

    #[test]
    fn invalid_zip_is_corrupt_input() {
        let err = extract_text(b"not a zip", FileKind::Docx).unwrap_err();
        assert!(matches!(err, Error::CorruptInput(_)));
    }

    #[test]
    fn invalid_pdf_is_corrupt_input() {
        let err = extract_text(b"not a pdf", FileKind::Pdf).unwrap_err();
        assert!(matches!(err, Error::CorruptInput(_)));
    }

    #[test]
    fn unsupported_extension_rejected_before_parsing() {
        let err = extract_file(b"hello", "notes.txt").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn email_subject_prefixed_to_plain_body() {
        let raw = b"From: a@example.com\r\nTo: b@example.com\r\nSubject: Renewal notice\r\n\r\nYour policy renews on 1 March.\r\n";
        let text = extract_text(raw, FileKind::Email).unwrap();
        assert!(text.starts_with("Subject: Renewal notice\n\n"));
        assert!(text.contains("Your policy renews on 1 March."));
    }

    #[test]
    fn email_prefers_first_plain_part() {
        let raw = concat!(
            "From: a@example.com\r\n",
            "Subject: Mixed\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/alternative; boundary=\"XYZ\"\r\n",
            "\r\n",
            "--XYZ\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>html version</p>\r\n",
            "--XYZ\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain version\r\n",
            "--XYZ--\r\n",
        );
        let text = extract_text(raw.as_bytes(), FileKind::Email).unwrap();
        assert!(text.contains("plain version"));
        assert!(!text.contains("html version"));
    }

    #[test]
    fn email_without_subject_still_gets_subject_line() {
        let raw = b"From: a@example.com\r\nTo: b@example.com\r\n\r\nPlease call back.\r\n";
        let text = extract_text(raw, FileKind::Email).unwrap();
        assert!(text.starts_with("Subject: \n\n"));
        assert!(text.contains("Please call back."));
    }

    #[test]
    fn email_without_subject_or_body_is_empty_content() {
        let raw = b"From: a@example.com\r\nTo: b@example.com\r\n\r\n  \r\n";
        assert!(matches!(
            extract_text(raw, FileKind::Email),
            Err(Error::EmptyContent)
        ));
    }
}
