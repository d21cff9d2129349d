use super::{escape_xml, image_content_type, relationships_xml, PackageWriter, XML_DECLARATION};
use crate::constants::{
    A_NAMESPACE, EMU_PER_INCH, IMAGE_REL, OFFICE_DOCUMENT_REL, PIC_NAMESPACE, RELS_NAMESPACE, WP_NAMESPACE, W_NAMESPACE,
};
use crate::{ContentSequence, ContentUnit, ConverterConfig, Error, ImageBlock, ImageSource, Result};
use std::collections::BTreeSet;
use std::io::Cursor;
use tracing::{debug, warn};

/// A picture staged for `word/media`.
struct Media {
    rel_id: String,
    part_name: String,
    extension: String,
    bytes: Vec<u8>,
}

/// Writes a Word document with one paragraph per text block and one inline picture
/// (in its own paragraph) per image block, in sequence order.
///
/// Pictures are scaled to `config.image_width_inches`, keeping their aspect ratio.
///
/// # Errors
///
/// [`Error::ImageNotFound`] when an image block references a file that does not exist.
pub fn write_docx(sequence: &ContentSequence, config: &ConverterConfig) -> Result<Vec<u8>> {
    let mut body = String::new();
    let mut media: Vec<Media> = Vec::new();

    for unit in &sequence.units {
        match unit {
            ContentUnit::Text(block) => body.push_str(&text_paragraph(&block.text)),
            ContentUnit::Image(image) => {
                let number = media.len() + 1;
                let bytes = load_image(image)?;
                let (cx, cy) = display_extent(&bytes, config.image_width_inches);
                let item = Media {
                    rel_id: format!("rIdImg{}", number),
                    part_name: format!("media/image{}.{}", number, image.extension),
                    extension: image.extension.to_ascii_lowercase(),
                    bytes,
                };
                body.push_str(&picture_paragraph(&item, number, cx, cy));
                media.push(item);
            }
        }
    }

    debug!("Writing DOCX with {} units and {} pictures", sequence.units.len(), media.len());

    let mut package = PackageWriter::new();
    package.add_part("[Content_Types].xml", content_types(&media).as_bytes())?;
    package.add_part("_rels/.rels", root_rels().as_bytes())?;
    package.add_part("word/document.xml", document_xml(&body).as_bytes())?;
    package.add_part("word/_rels/document.xml.rels", document_rels(&media).as_bytes())?;
    for item in &media {
        package.add_part(&format!("word/{}", item.part_name), &item.bytes)?;
    }
    package.finish()
}

fn load_image(image: &ImageBlock) -> Result<Vec<u8>> {
    match &image.source {
        ImageSource::Bytes(bytes) => Ok(bytes.clone()),
        ImageSource::File(path) => std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ImageNotFound { path: path.clone() },
            _ => Error::Io(e),
        }),
    }
}

/// Picture size in EMU: the configured width and a height matching the image's aspect ratio.
fn display_extent(bytes: &[u8], width_inches: f32) -> (i64, i64) {
    let cx = (f64::from(width_inches) * EMU_PER_INCH as f64).round() as i64;
    let dimensions = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::from)
        .and_then(|reader| reader.into_dimensions());

    match dimensions {
        Ok((width, height)) if width > 0 => (cx, (cx as f64 * f64::from(height) / f64::from(width)).round() as i64),
        Ok(_) | Err(_) => {
            warn!("Could not read picture dimensions, using a square frame");
            (cx, cx)
        }
    }
}

fn text_paragraph(text: &str) -> String {
    if text.is_empty() {
        return "<w:p/>".to_string();
    }

    let mut run = String::new();
    for (line_index, line) in text.split('\n').enumerate() {
        if line_index > 0 {
            run.push_str("<w:br/>");
        }
        for (tab_index, piece) in line.split('\t').enumerate() {
            if tab_index > 0 {
                run.push_str("<w:tab/>");
            }
            if !piece.is_empty() {
                run.push_str(&format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape_xml(piece)));
            }
        }
    }

    format!("<w:p><w:r>{}</w:r></w:p>", run)
}

fn picture_paragraph(media: &Media, number: usize, cx: i64, cy: i64) -> String {
    let name = media.part_name.rsplit('/').next().unwrap_or(&media.part_name);
    format!(
        concat!(
            r#"<w:p><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic><a:graphicData uri="{pic_ns}"><pic:pic>"#,
            r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
        ),
        cx = cx,
        cy = cy,
        id = number,
        name = escape_xml(name),
        rel_id = media.rel_id,
        pic_ns = PIC_NAMESPACE,
    )
}

fn document_xml(body: &str) -> String {
    format!(
        concat!(
            "{decl}",
            r#"<w:document xmlns:w="{w}" xmlns:r="{r}" xmlns:wp="{wp}" xmlns:a="{a}" xmlns:pic="{pic}">"#,
            r#"<w:body>{body}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/>"#,
            r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>"#,
            r#"</w:sectPr></w:body></w:document>"#
        ),
        w = W_NAMESPACE,
        r = RELS_NAMESPACE,
        wp = WP_NAMESPACE,
        a = A_NAMESPACE,
        pic = PIC_NAMESPACE,
        body = body,
        decl = XML_DECLARATION,
    )
}

fn content_types(media: &[Media]) -> String {
    let extensions: BTreeSet<&str> = media.iter().map(|m| m.extension.as_str()).collect();
    let defaults: String = extensions
        .iter()
        .map(|ext| format!(r#"<Default Extension="{}" ContentType="{}"/>"#, escape_xml(ext), image_content_type(ext)))
        .collect();

    format!(
        concat!(
            "{decl}",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            "{defaults}",
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"</Types>"#
        ),
        decl = XML_DECLARATION,
        defaults = defaults,
    )
}

fn root_rels() -> String {
    relationships_xml(&[("rId1", OFFICE_DOCUMENT_REL, "word/document.xml".to_string())])
}

fn document_rels(media: &[Media]) -> String {
    let entries: Vec<(&str, &str, String)> =
        media.iter().map(|m| (m.rel_id.as_str(), IMAGE_REL, m.part_name.clone())).collect();
    relationships_xml(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{read_docx, Package};

    #[test]
    fn empty_sequence_is_a_valid_document_without_paragraphs() {
        let bytes = write_docx(&ContentSequence::flow(vec![]), &ConverterConfig::default()).unwrap();
        let sequence = read_docx(&bytes).unwrap();
        assert!(sequence.units.is_empty());
    }

    #[test]
    fn text_round_trips_through_reader() {
        let units = vec![
            ContentUnit::text("first line\nsecond\tcolumn", 0),
            ContentUnit::text("", 1),
            ContentUnit::text("<tags> & \"quotes\"", 2),
        ];
        let bytes = write_docx(&ContentSequence::flow(units), &ConverterConfig::default()).unwrap();

        let texts: Vec<_> = read_docx(&bytes).unwrap().text_blocks().map(|b| b.text.clone()).collect();
        assert_eq!(texts, vec!["first line\nsecond\tcolumn", "", "<tags> & \"quotes\""]);
    }

    #[test]
    fn missing_image_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image_0_0.png");
        let units = vec![ContentUnit::Image(ImageBlock {
            source: ImageSource::File(path.clone()),
            extension: "png".to_string(),
            page_index: 0,
            sequence_in_page: 0,
        })];

        match write_docx(&ContentSequence::flow(units), &ConverterConfig::default()) {
            Err(Error::ImageNotFound { path: missing }) => assert_eq!(missing, path),
            other => panic!("expected ImageNotFound, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn picture_height_follows_aspect_ratio() {
        let mut png = Vec::new();
        image::DynamicImage::new_rgb8(40, 10)
            .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();

        let (cx, cy) = display_extent(&png, 5.0);
        assert_eq!(cx, 5 * EMU_PER_INCH);
        assert_eq!(cy, 5 * EMU_PER_INCH / 4);
        assert_eq!(display_extent(b"not an image", 1.0), (EMU_PER_INCH, EMU_PER_INCH));
    }

    #[test]
    fn pictures_are_stored_as_media_parts() {
        let units = vec![
            ContentUnit::text("caption", 0),
            ContentUnit::Image(ImageBlock {
                source: ImageSource::Bytes(vec![1, 2, 3]),
                extension: "jpeg".to_string(),
                page_index: 0,
                sequence_in_page: 0,
            }),
        ];
        let bytes = write_docx(&ContentSequence::flow(units), &ConverterConfig::default()).unwrap();

        let mut package = Package::open(&bytes).unwrap();
        assert_eq!(package.read_part("word/media/image1.jpeg").unwrap(), vec![1, 2, 3]);
        let types = String::from_utf8(package.read_part("[Content_Types].xml").unwrap()).unwrap();
        assert!(types.contains(r#"Extension="jpeg" ContentType="image/jpeg""#));
    }
}
