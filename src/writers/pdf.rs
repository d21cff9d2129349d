use crate::{ContentSequence, ConverterConfig, Layout, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

/// Points per millimetre.
const MM: f32 = 72.0 / 25.4;
/// A4 portrait, in points.
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 10.0 * MM;
const BREAK_MARGIN: f32 = 15.0 * MM;
/// Horizontal padding inside a cell.
const CELL_PADDING: f32 = 1.0 * MM;

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];
const DEFAULT_WIDTH: u16 = 556;

/// Writes the text of a sequence as a PDF.
///
/// With [`Layout::Flow`] all text blocks flow from a single first page, breaking onto new
/// pages as needed. With [`Layout::Slides`] every slide starts a new page holding that
/// slide's blocks one below the other. Each block is a multi-line cell; images are not
/// rendered. The output always has at least one page.
pub fn write_pdf(sequence: &ContentSequence, config: &ConverterConfig) -> Result<Vec<u8>> {
    let mut composer = PdfComposer::new(config);

    match sequence.layout {
        Layout::Flow => {
            composer.add_page()?;
            for block in sequence.text_blocks() {
                composer.multi_cell(&block.text)?;
            }
        }
        Layout::Slides { count } => {
            let mut blocks = sequence.text_blocks().peekable();
            for slide in 0..count {
                composer.add_page()?;
                while let Some(block) = blocks.next_if(|b| b.origin_index == slide) {
                    composer.multi_cell(&block.text)?;
                }
            }
            for block in blocks {
                composer.multi_cell(&block.text)?;
            }
        }
    }

    composer.finish()
}

/// Lays out lines of Helvetica text top to bottom across A4 pages.
struct PdfComposer {
    doc: Document,
    pages_id: ObjectId,
    /// Shared `/Resources` object, referenced from every page.
    resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    operations: Option<Vec<Operation>>,
    /// Distance of the next line from the top edge.
    cursor: f32,
    font_size: f32,
    line_height: f32,
}

impl PdfComposer {
    fn new(config: &ConverterConfig) -> Self {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        Self {
            doc,
            pages_id,
            resources_id,
            page_ids: Vec::new(),
            operations: None,
            cursor: MARGIN,
            font_size: config.pdf_font_size,
            line_height: config.pdf_line_height_mm * MM,
        }
    }

    fn add_page(&mut self) -> Result<()> {
        self.flush_page()?;
        self.operations = Some(Vec::new());
        self.cursor = MARGIN;
        Ok(())
    }

    fn flush_page(&mut self) -> Result<()> {
        if let Some(operations) = self.operations.take() {
            let content = Content { operations }.encode()?;
            let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => self.pages_id,
                "Contents" => content_id,
                "Resources" => self.resources_id,
            });
            self.page_ids.push(page_id);
        }
        Ok(())
    }

    /// Writes `text` as wrapped lines, one line for empty text.
    fn multi_cell(&mut self, text: &str) -> Result<()> {
        let max_width = PAGE_WIDTH - 2.0 * MARGIN - 2.0 * CELL_PADDING;
        for line in wrap_text(text, max_width, self.font_size) {
            if self.operations.is_none() || self.cursor + self.line_height > PAGE_HEIGHT - BREAK_MARGIN {
                self.add_page()?;
            }
            let baseline = PAGE_HEIGHT - (self.cursor + 0.5 * self.line_height + 0.3 * self.font_size);
            if !line.is_empty() {
                let bytes: Vec<u8> = line.chars().map(win_ansi_byte).collect();
                if let Some(operations) = self.operations.as_mut() {
                    operations.extend([
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), self.font_size.into()]),
                        Operation::new("Td", vec![(MARGIN + CELL_PADDING).into(), baseline.into()]),
                        Operation::new("Tj", vec![Object::string_literal(bytes)]),
                        Operation::new("ET", vec![]),
                    ]);
                }
            }
            self.cursor += self.line_height;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        if self.page_ids.is_empty() && self.operations.is_none() {
            self.add_page()?;
        }
        self.flush_page()?;
        debug!("Writing PDF with {} pages", self.page_ids.len());

        let kids: Vec<Object> = self.page_ids.iter().map(|id| (*id).into()).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

fn char_width(c: char, font_size: f32) -> f32 {
    let units = match c {
        ' '..='~' => HELVETICA_WIDTHS[c as usize - 32],
        _ => DEFAULT_WIDTH,
    };
    f32::from(units) * font_size / 1000.0
}

/// Splits text into lines no wider than `max_width`, breaking at the last space when
/// possible and inside a word otherwise. Explicit newlines always break.
fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for raw in text.split('\n') {
        let mut line = String::new();
        let mut width = 0.0;
        let mut last_space: Option<usize> = None;

        for c in raw.chars().filter(|c| *c != '\r') {
            let c = if c.is_whitespace() { ' ' } else { c };
            let w = char_width(c, font_size);

            if c == ' ' {
                if width + w > max_width {
                    lines.push(std::mem::take(&mut line));
                    width = 0.0;
                    last_space = None;
                    continue;
                }
                last_space = Some(line.len());
            } else if width + w > max_width && !line.is_empty() {
                match last_space {
                    Some(pos) => {
                        let rest = line[pos + 1..].to_string();
                        line.truncate(pos);
                        lines.push(std::mem::replace(&mut line, rest));
                    }
                    None => lines.push(std::mem::take(&mut line)),
                }
                width = line.chars().map(|c| char_width(c, font_size)).sum();
                last_space = None;
            }

            line.push(c);
            width += w;
        }

        lines.push(line);
    }

    lines
}

/// Maps a character to its WinAnsiEncoding byte, `?` when it has none.
fn win_ansi_byte(c: char) -> u8 {
    match c {
        ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '•' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        _ => b'?',
    }
}
