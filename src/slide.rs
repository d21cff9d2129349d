use crate::parse_xml;
use crate::{ContentUnit, Result};

/// A shape on a slide, classified once when the slide is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideShape {
    /// A shape with a text frame, holding its full text.
    Text(String),
    /// Pictures, tables, charts, groups and connectors.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub part_name: String,
    /// Zero-based position in the presentation.
    pub index: usize,
    pub shapes: Vec<SlideShape>,
}

impl Slide {
    pub fn parse(xml: &[u8], part_name: String, index: usize) -> Result<Slide> {
        let shapes = parse_xml::parse_slide_xml(xml)?;
        Ok(Slide { part_name, index, shapes })
    }

    /// Number encoded in a slide part name, e.g. `7` for `ppt/slides/slide7.xml`.
    pub fn extract_slide_number(path: &str) -> Option<u32> {
        path.split('/')
            .next_back()
            .and_then(|filename| filename.strip_prefix("slide").and_then(|s| s.strip_suffix(".xml")))
            .and_then(|num_str| num_str.parse::<u32>().ok())
    }

    /// One text block per text shape, in shape order, tagged with this slide's index.
    pub fn text_blocks(&self) -> impl Iterator<Item = ContentUnit> + '_ {
        self.shapes.iter().filter_map(move |shape| match shape {
            SlideShape::Text(text) => Some(ContentUnit::text(text.clone(), self.index)),
            SlideShape::Other => None,
        })
    }
}
