//! Format writers: encode an ordered [`ContentSequence`] into a destination document.

mod docx;
mod pdf;
mod pptx;

pub use docx::write_docx;
pub use pdf::write_pdf;
pub use pptx::write_pptx;

use crate::constants::PKG_RELS_NAMESPACE;
use crate::{ContentSequence, ConverterConfig, Format, Result};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Writer {
    Pdf,
    Docx,
    Pptx,
}

impl Writer {
    /// Plain text is never produced, so `Txt` has no writer.
    pub fn for_format(format: Format) -> Option<Writer> {
        match format {
            Format::Pdf => Some(Writer::Pdf),
            Format::Docx => Some(Writer::Docx),
            Format::Pptx => Some(Writer::Pptx),
            Format::Txt => None,
        }
    }

    pub fn format(self) -> Format {
        match self {
            Writer::Pdf => Format::Pdf,
            Writer::Docx => Format::Docx,
            Writer::Pptx => Format::Pptx,
        }
    }

    pub fn write(self, sequence: &ContentSequence, config: &ConverterConfig) -> Result<Vec<u8>> {
        match self {
            Writer::Pdf => write_pdf(sequence, config),
            Writer::Docx => write_docx(sequence, config),
            Writer::Pptx => write_pptx(sequence, config),
        }
    }
}

/// Accumulates the parts of an OOXML package.
pub(crate) struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl PackageWriter {
    pub(crate) fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated),
        }
    }

    pub(crate) fn add_part(&mut self, name: &str, content: &[u8]) -> Result<()> {
        self.zip.start_file(name, self.options)?;
        self.zip.write_all(content)?;
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<Vec<u8>> {
        Ok(self.zip.finish()?.into_inner())
    }
}

pub(crate) const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

/// Builds a `.rels` part from `(id, type, target)` entries.
pub(crate) fn relationships_xml<S: AsRef<str>>(entries: &[(S, &str, String)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, rel_type, target)| {
            format!(r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#, id.as_ref(), rel_type, escape_xml(target))
        })
        .collect();
    format!(r#"{}<Relationships xmlns="{}">{}</Relationships>"#, XML_DECLARATION, PKG_RELS_NAMESPACE, body)
}

/// Escapes text for XML content and attribute values, dropping characters XML 1.0 forbids.
pub(crate) fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

/// Content type registered in `[Content_Types].xml` for an image extension.
pub(crate) fn image_content_type(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "jpx" | "jp2" => "image/jp2",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_xml_handles_markup_and_control_characters() {
        assert_eq!(escape_xml("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(escape_xml("form\u{c}feed\tok"), "formfeed\tok");
    }

    #[test]
    fn txt_has_no_writer() {
        assert_eq!(Writer::for_format(Format::Txt), None);
        assert_eq!(Writer::for_format(Format::Pptx).map(Writer::format), Some(Format::Pptx));
    }
}
