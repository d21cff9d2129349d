//! Format readers: decode a source document into an ordered [`ContentSequence`].
//!
//! Every reader reports a malformed payload as [`crate::Error::UnreadableSource`]
//! tagged with its format, except the text reader which reports
//! [`crate::Error::EncodingFailure`].

mod docx;
mod pdf;
mod pptx;
mod txt;

pub use docx::read_docx;
pub use pdf::read_pdf;
pub use pptx::read_pptx;
pub use txt::read_txt;

use crate::{ContentSequence, ConverterConfig, Format, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reader {
    Pdf,
    Docx,
    Pptx,
    Txt,
}

impl Reader {
    /// Every source format has exactly one reader.
    pub fn for_format(format: Format) -> Reader {
        match format {
            Format::Pdf => Reader::Pdf,
            Format::Docx => Reader::Docx,
            Format::Pptx => Reader::Pptx,
            Format::Txt => Reader::Txt,
        }
    }

    pub fn read(self, bytes: &[u8], config: &ConverterConfig) -> Result<ContentSequence> {
        match self {
            Reader::Pdf => read_pdf(bytes),
            Reader::Docx => read_docx(bytes),
            Reader::Pptx => read_pptx(bytes, config),
            Reader::Txt => read_txt(bytes),
        }
    }
}
