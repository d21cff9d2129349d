use crate::{ContentSequence, ContentUnit, Error, Format, ImageBlock, ImageSource, Result};
use image::{DynamicImage, GrayImage, ImageOutputFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeSet;
use std::io::Cursor;
use tracing::{debug, info, warn};

/// How far up the page tree `/Resources` are searched for.
const MAX_PAGE_TREE_DEPTH: usize = 32;
/// How many colour spaces may be nested, e.g. an `/Indexed` over an `/ICCBased` space.
const MAX_COLOR_SPACE_DEPTH: usize = 4;

/// Reads a PDF, producing for every page one text block followed by that page's images.
///
/// Text extraction is best effort: a page whose text cannot be decoded still yields an
/// empty text block so that page count and ordering survive. Images are taken from the
/// page's `/XObject` resources in dictionary order, including images drawn by form
/// XObjects. JPEG and JPEG 2000 streams are passed through untouched. Pixel data in a
/// gray, RGB, CMYK or indexed colour space is re-encoded as PNG; anything else is skipped.
pub fn read_pdf(bytes: &[u8]) -> Result<ContentSequence> {
    let doc = Document::load_mem(bytes).map_err(|e| Error::unreadable(Format::Pdf, e))?;
    let pages = doc.get_pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut units = Vec::new();
    for (page_index, (page_number, page_id)) in pages.into_iter().enumerate() {
        let text = doc.extract_text(&[page_number]).unwrap_or_else(|e| {
            warn!("Page {}: text extraction failed, keeping an empty block: {}", page_number, e);
            String::new()
        });
        units.push(ContentUnit::text(text, page_index));

        let images = page_images(&doc, page_id);
        debug!("Page {}: {} images", page_number, images.len());
        units.extend(images.into_iter().enumerate().map(|(sequence_in_page, (bytes, extension))| {
            ContentUnit::Image(ImageBlock {
                source: ImageSource::Bytes(bytes),
                extension: extension.to_string(),
                page_index,
                sequence_in_page,
            })
        }));
    }

    Ok(ContentSequence::flow(units))
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// The page's `/Resources`, following `/Parent` links for inherited resources.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve(doc, resources)?.as_dict().ok();
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn xobject_dict<'a>(doc: &'a Document, resources: &'a Dictionary) -> Option<&'a Dictionary> {
    resolve(doc, resources.get(b"XObject").ok()?)?.as_dict().ok()
}

fn page_images(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, &'static str)> {
    let mut images = Vec::new();
    if let Some(xobjects) = page_resources(doc, page_id).and_then(|resources| xobject_dict(doc, resources)) {
        collect_images(doc, xobjects, &mut BTreeSet::new(), &mut images);
    }
    images
}

/// Appends the images in `xobjects`, descending into the resources of form XObjects.
/// Every referenced object is visited at most once, so self-referencing forms terminate.
fn collect_images(
    doc: &Document,
    xobjects: &Dictionary,
    visited: &mut BTreeSet<ObjectId>,
    images: &mut Vec<(Vec<u8>, &'static str)>,
) {
    for (name, object) in xobjects.iter() {
        if let Object::Reference(id) = object {
            if !visited.insert(*id) {
                continue;
            }
        }
        let Some(stream) = resolve(doc, object).and_then(|o| o.as_stream().ok()) else {
            continue;
        };
        match stream.dict.get(b"Subtype").and_then(Object::as_name).ok() {
            Some(b"Image") => match encode_image(doc, stream) {
                Some(encoded) => images.push(encoded),
                None => warn!("Skipping image /{}: unsupported encoding", String::from_utf8_lossy(name)),
            },
            Some(b"Form") => {
                let nested = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|resources| resolve(doc, resources))
                    .and_then(|resources| resources.as_dict().ok())
                    .and_then(|resources| xobject_dict(doc, resources));
                if let Some(nested) = nested {
                    collect_images(doc, nested, visited, images);
                }
            }
            _ => {}
        }
    }
}

fn filter_names(dict: &Dictionary) -> Vec<&[u8]> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.as_slice()],
        Ok(Object::Array(filters)) => filters.iter().filter_map(|f| f.as_name().ok()).collect(),
        _ => Vec::new(),
    }
}

/// The stream's data with all filters undone.
fn plain_content(stream: &Stream) -> Option<Vec<u8>> {
    if filter_names(&stream.dict).is_empty() {
        return Some(stream.content.clone());
    }
    // lopdf refuses to decode streams marked as images
    let mut data = stream.clone();
    data.dict.remove(b"Subtype");
    data.decompressed_content().ok()
}

/// The colour spaces whose samples can be turned into RGB or gray pixels.
#[derive(Debug, Clone, PartialEq)]
enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
    /// One sample per pixel indexing into `palette`, a table of `hival + 1` colours in `base`.
    Indexed {
        base: Box<ColorModel>,
        hival: usize,
        palette: Vec<u8>,
    },
}

impl ColorModel {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"DeviceGray" | b"CalGray" | b"G" => Some(Self::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(Self::Rgb),
            b"DeviceCMYK" | b"CMYK" => Some(Self::Cmyk),
            _ => None,
        }
    }

    fn resolve(doc: &Document, object: &Object, depth: usize) -> Option<Self> {
        if depth > MAX_COLOR_SPACE_DEPTH {
            return None;
        }
        let parts = match resolve(doc, object)? {
            Object::Name(name) => return Self::from_name(name),
            Object::Array(parts) => parts,
            _ => return None,
        };
        let (family, params) = parts.split_first()?;
        match resolve(doc, family)?.as_name().ok()? {
            b"ICCBased" => {
                let profile = match resolve(doc, params.first()?)? {
                    Object::Stream(stream) => &stream.dict,
                    Object::Dictionary(dict) => dict,
                    _ => return None,
                };
                match profile.get(b"N").and_then(Object::as_i64).ok() {
                    Some(1) => Some(Self::Gray),
                    Some(3) => Some(Self::Rgb),
                    Some(4) => Some(Self::Cmyk),
                    _ => Self::resolve(doc, profile.get(b"Alternate").ok()?, depth + 1),
                }
            }
            b"Indexed" | b"I" => {
                let [base, hival, lookup] = params else {
                    return None;
                };
                let base = Self::resolve(doc, base, depth + 1)?;
                if matches!(base, Self::Indexed { .. }) {
                    return None;
                }
                let hival = usize::try_from(resolve(doc, hival)?.as_i64().ok()?).ok()?;
                let palette = match resolve(doc, lookup)? {
                    Object::String(bytes, _) => bytes.clone(),
                    Object::Stream(stream) => plain_content(stream)?,
                    _ => return None,
                };
                Some(Self::Indexed { base: Box::new(base), hival, palette })
            }
            other => Self::from_name(other),
        }
    }

    fn components(&self) -> usize {
        match self {
            Self::Gray | Self::Indexed { .. } => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
        }
    }
}

/// Returns the encoded image bytes and their file extension.
fn encode_image(doc: &Document, stream: &Stream) -> Option<(Vec<u8>, &'static str)> {
    match filter_names(&stream.dict).as_slice() {
        [b"DCTDecode"] => return Some((stream.content.clone(), "jpeg")),
        [b"JPXDecode"] => return Some((stream.content.clone(), "jpx")),
        _ => {}
    }

    let dict = &stream.dict;
    let width = u32::try_from(dict.get(b"Width").and_then(Object::as_i64).ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").and_then(Object::as_i64).ok()?).ok()?;
    let bits = u8::try_from(dict.get(b"BitsPerComponent").and_then(Object::as_i64).ok()?).ok()?;
    let model = ColorModel::resolve(doc, dict.get(b"ColorSpace").ok()?, 0)?;
    let image = decode_pixels(&model, width, height, bits, &plain_content(stream)?)?;

    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png).ok()?;
    Some((png, "png"))
}

fn decode_pixels(model: &ColorModel, width: u32, height: u32, bits: u8, data: &[u8]) -> Option<DynamicImage> {
    let per_row = usize::try_from(width).ok()? * model.components();
    let samples = unpack_samples(data, per_row, usize::try_from(height).ok()?, bits)?;

    if let ColorModel::Indexed { base, hival, palette } = model {
        let n = base.components();
        let mut colors = Vec::with_capacity(samples.len() * n);
        for index in samples {
            let start = usize::from(index).min(*hival) * n;
            colors.extend_from_slice(palette.get(start..start + n)?);
        }
        return device_image(base, width, height, colors);
    }

    let max = (1u16 << bits) - 1;
    let scaled = samples.into_iter().map(|v| (u16::from(v) * 255 / max) as u8).collect();
    device_image(model, width, height, scaled)
}

fn device_image(model: &ColorModel, width: u32, height: u32, data: Vec<u8>) -> Option<DynamicImage> {
    match model {
        ColorModel::Gray => Some(DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, data)?)),
        ColorModel::Rgb => Some(DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, data)?)),
        ColorModel::Cmyk => Some(DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, cmyk_to_rgb(&data))?)),
        ColorModel::Indexed { .. } => None,
    }
}

fn cmyk_to_rgb(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(4)
        .flat_map(|p| {
            let k = 255 - u16::from(p[3]);
            [p[0], p[1], p[2]].map(|c| ((255 - u16::from(c)) * k / 255) as u8)
        })
        .collect()
}

/// Splits rows of packed samples into one byte per sample. Rows start on a byte boundary.
fn unpack_samples(data: &[u8], per_row: usize, rows: usize, bits: u8) -> Option<Vec<u8>> {
    let total = per_row.checked_mul(rows)?;
    match bits {
        8 => data.get(..total).map(<[u8]>::to_vec),
        1 | 2 | 4 => {
            let bits = usize::from(bits);
            let row_bytes = (per_row * bits).div_ceil(8);
            let mask = (1u8 << bits) - 1;
            let mut samples = Vec::with_capacity(total);
            for row in data.chunks(row_bytes).take(rows) {
                for i in 0..per_row {
                    let offset = i * bits;
                    let shift = 8 - bits - offset % 8;
                    samples.push((row.get(offset / 8)? >> shift) & mask);
                }
            }
            (samples.len() == total).then_some(samples)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, StringFormat};

    /// A one-page document without content whose page inherits `xobjects` from `/Pages`.
    fn pdf_with_xobjects(build: impl FnOnce(&mut Document) -> Dictionary) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let xobjects = build(&mut doc);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => dictionary! { "XObject" => xobjects },
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn raw_image(width: i64, height: i64, color_space: impl Into<Object>, bits: i64, data: Vec<u8>) -> Stream {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => color_space,
                "BitsPerComponent" => bits,
            },
            data,
        )
    }

    fn decoded_images(pdf: &[u8]) -> Vec<RgbImage> {
        read_pdf(pdf)
            .unwrap()
            .image_blocks()
            .map(|image| {
                assert_eq!(image.extension, "png");
                let ImageSource::Bytes(png) = &image.source else { panic!("expected in-memory bytes") };
                image::load_from_memory(png).unwrap().to_rgb8()
            })
            .collect()
    }

    #[test]
    fn page_without_text_keeps_empty_block_and_inherited_image() {
        let pdf = pdf_with_xobjects(|doc| {
            let image_id = doc.add_object(raw_image(2, 1, "DeviceRGB", 8, vec![255, 0, 0, 0, 0, 255]));
            dictionary! { "Im1" => image_id }
        });
        let sequence = read_pdf(&pdf).unwrap();

        assert_eq!(sequence.units.len(), 2);
        assert_eq!(sequence.units[0], ContentUnit::text("", 0));

        let image = sequence.image_blocks().next().unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!((image.page_index, image.sequence_in_page), (0, 0));

        let decoded = &decoded_images(&pdf)[0];
        assert_eq!(decoded.dimensions(), (2, 1));
        assert_eq!(decoded.get_pixel(1, 0).0, [0, 0, 255]);
    }

    #[test]
    fn icc_based_images_follow_the_profile_component_count() {
        let pdf = pdf_with_xobjects(|doc| {
            let rgb: Vec<Object> = vec!["ICCBased".into(), dictionary! { "N" => 3 }.into()];
            let rgb_id = doc.add_object(raw_image(1, 1, rgb, 8, vec![10, 20, 30]));

            let profile_id = doc.add_object(Stream::new(dictionary! { "N" => 4 }, b"profile".to_vec()));
            let cmyk: Vec<Object> = vec!["ICCBased".into(), profile_id.into()];
            let cmyk_id = doc.add_object(raw_image(2, 1, cmyk, 8, vec![0, 0, 0, 0, 255, 0, 0, 0]));

            let fallback: Vec<Object> = vec!["ICCBased".into(), dictionary! { "Alternate" => "DeviceGray" }.into()];
            let gray_id = doc.add_object(raw_image(1, 1, fallback, 8, vec![77]));

            dictionary! { "Im1" => rgb_id, "Im2" => cmyk_id, "Im3" => gray_id }
        });
        let images = decoded_images(&pdf);

        assert_eq!(images.len(), 3);
        assert_eq!(images[0].get_pixel(0, 0).0, [10, 20, 30]);
        assert_eq!(images[1].get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(images[1].get_pixel(1, 0).0, [0, 255, 255]);
        assert_eq!(images[2].get_pixel(0, 0).0, [77, 77, 77]);
    }

    #[test]
    fn indexed_images_expand_through_their_palette() {
        let pdf = pdf_with_xobjects(|doc| {
            let palette = Object::String(vec![255, 0, 0, 0, 255, 0], StringFormat::Hexadecimal);
            let indexed: Vec<Object> = vec!["Indexed".into(), "DeviceRGB".into(), 1.into(), palette];
            let image_id = doc.add_object(raw_image(3, 1, indexed, 8, vec![1, 0, 7]));
            dictionary! { "Im1" => image_id }
        });
        let image = &decoded_images(&pdf)[0];

        assert_eq!(image.get_pixel(0, 0).0, [0, 255, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [255, 0, 0]);
        // indices above hival are clamped
        assert_eq!(image.get_pixel(2, 0).0, [0, 255, 0]);
    }

    #[test]
    fn packed_and_compressed_samples_are_decoded() {
        let pdf = pdf_with_xobjects(|doc| {
            // 3 pixels per row, each row padded to a whole byte
            let packed_id = doc.add_object(raw_image(3, 2, "DeviceGray", 1, vec![0b1010_0000, 0b0100_0000]));

            let mut flate = raw_image(16, 16, "DeviceGray", 8, vec![128; 256]);
            flate.compress().unwrap();
            assert!(flate.dict.get(b"Filter").is_ok());
            let flate_id = doc.add_object(flate);

            dictionary! { "Im1" => packed_id, "Im2" => flate_id }
        });
        let images = decoded_images(&pdf);

        assert_eq!(images.len(), 2);
        let row0: Vec<u8> = (0..3).map(|x| images[0].get_pixel(x, 0).0[0]).collect();
        let row1: Vec<u8> = (0..3).map(|x| images[0].get_pixel(x, 1).0[0]).collect();
        assert_eq!(row0, [255, 0, 255]);
        assert_eq!(row1, [0, 255, 0]);
        assert_eq!(images[1].dimensions(), (16, 16));
        assert_eq!(images[1].get_pixel(15, 15).0, [128, 128, 128]);
    }

    #[test]
    fn unsupported_color_spaces_are_skipped() {
        let pdf = pdf_with_xobjects(|doc| {
            let lab: Vec<Object> = vec!["Lab".into(), dictionary! { "WhitePoint" => vec![1.into(), 1.into(), 1.into()] }.into()];
            let image_id = doc.add_object(raw_image(1, 1, lab, 8, vec![50, 0, 0]));
            dictionary! { "Im1" => image_id }
        });
        let sequence = read_pdf(&pdf).unwrap();

        assert_eq!(sequence.units, vec![ContentUnit::text("", 0)]);
    }

    #[test]
    fn images_drawn_by_forms_are_found_and_cycles_end() {
        let pdf = pdf_with_xobjects(|doc| {
            let image_id = doc.add_object(raw_image(1, 1, "DeviceRGB", 8, vec![1, 2, 3]));
            let form_id = doc.new_object_id();
            let form = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), 10.into(), 10.into()],
                    "Resources" => dictionary! {
                        "XObject" => dictionary! { "Fm1" => form_id, "Im1" => image_id },
                    },
                },
                b"/Fm1 Do /Im1 Do".to_vec(),
            );
            doc.objects.insert(form_id, Object::Stream(form));
            dictionary! { "Fm1" => form_id }
        });
        let images = decoded_images(&pdf);

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].get_pixel(0, 0).0, [1, 2, 3]);
    }

    #[test]
    fn non_pdf_bytes_are_unreadable() {
        assert!(matches!(
            read_pdf(b"%PDF-1.4 truncated"),
            Err(Error::UnreadableSource { format: Format::Pdf, .. })
        ));
    }
}
