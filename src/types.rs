use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// The document formats understood by the conversion matrix.
///
/// The declaration order is also the order in which targets are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Format {
    Pdf,
    Docx,
    Pptx,
    Txt,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Pdf, Format::Docx, Format::Pptx, Format::Txt];

    /// Maps a file extension (without the dot, any case) to a format.
    pub fn from_extension(ext: &str) -> Result<Format> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Format::Pdf),
            "docx" => Ok(Format::Docx),
            "pptx" => Ok(Format::Pptx),
            "txt" => Ok(Format::Txt),
            _ => Err(Error::UnsupportedFormat(ext.to_string())),
        }
    }

    /// Infers the format from the extension of `filename`.
    pub fn from_filename(filename: &str) -> Result<Format> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(filename.to_string()))?;
        Format::from_extension(ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Docx => "docx",
            Format::Pptx => "pptx",
            Format::Txt => "txt",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Format::from_extension(s.trim().trim_start_matches('.'))
    }
}

/// An uploaded document: the original filename plus its raw bytes.
#[derive(Debug, Clone)]
pub struct SourceArtifact {
    filename: String,
    format: Format,
    bytes: Vec<u8>,
}

impl SourceArtifact {
    /// Wraps an in-memory payload. The format is inferred from the filename's extension.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let filename = filename.into();
        let format = Format::from_filename(&filename)?;
        Ok(Self { filename, format, bytes })
    }

    /// Reads a document from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?
            .to_string();
        let format = Format::from_filename(&filename)?;
        let bytes = std::fs::read(path)?;
        Ok(Self { filename, format, bytes })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The filename without its final extension.
    pub fn stem(&self) -> &str {
        file_stem(&self.filename)
    }
}

fn file_stem(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(0) | None => filename,
        Some(pos) => &filename[..pos],
    }
}

/// Where the bytes of an extracted image live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Encoded image bytes as extracted from the source document.
    Bytes(Vec<u8>),
    /// A file in scratch storage holding the encoded image.
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub text: String,
    pub origin_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlock {
    pub source: ImageSource,
    /// Extension of the encoded format, e.g. `jpeg` or `png`.
    pub extension: String,
    pub page_index: usize,
    pub sequence_in_page: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentUnit {
    Text(TextBlock),
    Image(ImageBlock),
}

impl ContentUnit {
    pub fn text(text: impl Into<String>, origin_index: usize) -> Self {
        ContentUnit::Text(TextBlock { text: text.into(), origin_index })
    }

    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            ContentUnit::Text(block) => Some(block),
            ContentUnit::Image(_) => None,
        }
    }
}

/// How the source document was divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Pages, paragraphs or lines flowing one after another.
    Flow,
    /// A slide deck; text blocks carry their slide index as `origin_index`.
    Slides { count: usize },
}

/// The ordered output of a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSequence {
    pub layout: Layout,
    pub units: Vec<ContentUnit>,
}

impl ContentSequence {
    pub fn flow(units: Vec<ContentUnit>) -> Self {
        Self { layout: Layout::Flow, units }
    }

    pub fn text_blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.units.iter().filter_map(ContentUnit::as_text)
    }

    pub fn image_blocks(&self) -> impl Iterator<Item = &ImageBlock> {
        self.units.iter().filter_map(|unit| match unit {
            ContentUnit::Image(image) => Some(image),
            ContentUnit::Text(_) => None,
        })
    }
}

/// One produced document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedArtifact {
    pub filename: String,
    pub format: Format,
    pub bytes: Vec<u8>,
}

impl ConvertedArtifact {
    /// `<source-filename-without-extension>_converted.<target-extension>`
    pub fn derive_filename(source_filename: &str, target: Format) -> String {
        format!("{}_converted.{}", file_stem(source_filename), target.extension())
    }
}

/// A source document together with the formats it should be converted to.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source: SourceArtifact,
    pub targets: std::collections::BTreeSet<Format>,
}

impl ConversionRequest {
    pub fn new(source: SourceArtifact, targets: impl IntoIterator<Item = Format>) -> Self {
        Self { source, targets: targets.into_iter().collect() }
    }
}
