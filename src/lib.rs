mod constants;
mod container;
mod converter_config;
mod parse_rels;
mod parse_xml;
mod readers;
mod relocate;
mod router;
mod scratch;
mod slide;
mod types;
mod writers;

pub use container::Package;
pub use converter_config::{ConverterConfig, ConverterConfigBuilder, TextboxGeometry};
pub use parse_rels::{parse_relationships, Relationship};
pub use parse_xml::parse_slide_xml;
pub use readers::{read_docx, read_pdf, read_pptx, read_txt, Reader};
pub use relocate::relocate_images;
pub use router::{
    route, Conversion, ConversionReport, ConversionState, Converter, Route, SkipReason,
    TargetOutcome, TargetReport,
};
pub use scratch::ScratchSpace;
pub use slide::{Slide, SlideShape};
pub use types::*;
pub use writers::{write_docx, write_pdf, write_pptx, Writer};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported file extension: {0:?}")]
    UnsupportedFormat(String),

    #[error("Unreadable {format} source: {detail}")]
    UnreadableSource { format: Format, detail: String },

    #[error("Text is not valid UTF-8: {0}")]
    EncodingFailure(#[from] std::str::Utf8Error),

    #[error("No conversion from {from} to {to}")]
    UnsupportedPair { from: Format, to: Format },

    #[error("Could not persist image to {path:?}: {source}")]
    ImagePersistFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image not found: {path:?}")]
    ImageNotFound { path: PathBuf },

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn unreadable(format: Format, detail: impl ToString) -> Self {
        Error::UnreadableSource { format, detail: detail.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
