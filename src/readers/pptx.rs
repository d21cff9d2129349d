use crate::constants::{P_NAMESPACE, PRESENTATION_PART, RELS_NAMESPACE};
use crate::parse_rels::{parse_relationships, target_by_id};
use crate::{ContentSequence, ConverterConfig, Error, Format, Layout, Package, Result, Slide};
use rayon::prelude::*;
use roxmltree::Document;
use tracing::debug;

/// Reads a PowerPoint presentation, producing one text block per text shape,
/// in slide order and then shape order.
///
/// Each block's `origin_index` is the zero-based index of its slide; a slide without
/// text shapes contributes no blocks but still counts towards [`Layout::Slides`].
pub fn read_pptx(bytes: &[u8], config: &ConverterConfig) -> Result<ContentSequence> {
    read_slides(bytes, config)
        .map(|slides| {
            let count = slides.len();
            let units = slides.iter().flat_map(Slide::text_blocks).collect();
            ContentSequence { layout: Layout::Slides { count }, units }
        })
        .map_err(|e| match e {
            Error::UnreadableSource { .. } => e,
            other => Error::unreadable(Format::Pptx, other),
        })
}

fn read_slides(bytes: &[u8], config: &ConverterConfig) -> Result<Vec<Slide>> {
    let mut package = Package::open(bytes)?;
    let slide_paths = slide_order(&mut package)?;
    debug!("Presentation has {} slides", slide_paths.len());

    // Reading from the archive needs `&mut`, so parts are loaded sequentially
    let mut raw_slides = Vec::with_capacity(slide_paths.len());
    for (index, path) in slide_paths.into_iter().enumerate() {
        let xml = package.read_part(&path)?;
        raw_slides.push((index, path, xml));
    }

    if config.parallel_slides {
        raw_slides
            .into_par_iter()
            .map(|(index, path, xml)| Slide::parse(&xml, path, index))
            .collect()
    } else {
        raw_slides
            .into_iter()
            .map(|(index, path, xml)| Slide::parse(&xml, path, index))
            .collect()
    }
}

/// Determines the slide parts in presentation order.
///
/// The order comes from `<p:sldIdLst>` in `ppt/presentation.xml`. Packages without
/// a presentation part fall back to the slide parts sorted by their number.
fn slide_order(package: &mut Package) -> Result<Vec<String>> {
    let Some(presentation) = package.read_optional_part(PRESENTATION_PART)? else {
        return Ok(numbered_slide_parts(package));
    };

    let rels = package
        .read_optional_part(&Package::rels_path_for(PRESENTATION_PART))?
        .map(|data| parse_relationships(&data))
        .transpose()?
        .unwrap_or_default();

    let xml_str = std::str::from_utf8(&presentation)?;
    let doc = Document::parse(xml_str)?;

    let Some(sld_id_lst) = doc
        .root_element()
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "sldIdLst" && n.tag_name().namespace() == Some(P_NAMESPACE))
    else {
        return Ok(Vec::new());
    };

    sld_id_lst
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "sldId")
        .map(|sld_id| {
            let rel_id = sld_id
                .attribute((RELS_NAMESPACE, "id"))
                .ok_or_else(|| Error::unreadable(Format::Pptx, "<p:sldId> without r:id"))?;
            let target = target_by_id(&rels, rel_id)
                .ok_or_else(|| Error::unreadable(Format::Pptx, format!("dangling slide relationship {}", rel_id)))?;
            Ok(Package::resolve_target(PRESENTATION_PART, target))
        })
        .collect()
}

fn numbered_slide_parts(package: &Package) -> Vec<String> {
    let mut slides: Vec<(u32, String)> = package
        .part_names()
        .into_iter()
        .filter(|name| name.starts_with("ppt/slides/slide"))
        .filter_map(|name| Slide::extract_slide_number(&name).map(|number| (number, name)))
        .collect();
    slides.sort();
    slides.into_iter().map(|(_, name)| name).collect()
}
