use super::{escape_xml, relationships_xml, PackageWriter, XML_DECLARATION};
use crate::constants::{
    A_NAMESPACE, EMU_PER_POINT, OFFICE_DOCUMENT_REL, P_NAMESPACE, RELS_NAMESPACE, SLIDE_LAYOUT_REL, SLIDE_MASTER_REL, SLIDE_REL,
    THEME_REL,
};
use crate::{ContentSequence, ConverterConfig, Result, TextboxGeometry};
use tracing::debug;

/// 10in x 7.5in, the classic 4:3 slide.
const SLIDE_WIDTH_EMU: i64 = 9_144_000;
const SLIDE_HEIGHT_EMU: i64 = 6_858_000;

/// Writes a presentation with one slide per text block.
///
/// Every slide uses the same blank layout and carries a single textbox at the configured
/// position, holding the block's text verbatim (one paragraph per line). Image blocks
/// are ignored. An empty sequence produces a presentation without slides.
pub fn write_pptx(sequence: &ContentSequence, config: &ConverterConfig) -> Result<Vec<u8>> {
    let slides: Vec<String> = sequence
        .text_blocks()
        .map(|block| slide_xml(&block.text, &config.textbox))
        .collect();
    debug!("Writing PPTX with {} slides", slides.len());

    let mut package = PackageWriter::new();
    package.add_part("[Content_Types].xml", content_types(slides.len()).as_bytes())?;
    package.add_part(
        "_rels/.rels",
        relationships_xml(&[("rId1", OFFICE_DOCUMENT_REL, "ppt/presentation.xml".to_string())]).as_bytes(),
    )?;
    package.add_part("ppt/presentation.xml", presentation_xml(slides.len()).as_bytes())?;
    package.add_part("ppt/_rels/presentation.xml.rels", presentation_rels(slides.len()).as_bytes())?;
    package.add_part("ppt/slideMasters/slideMaster1.xml", slide_master_xml().as_bytes())?;
    package.add_part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        relationships_xml(&[
            ("rId1", SLIDE_LAYOUT_REL, "../slideLayouts/slideLayout1.xml".to_string()),
            ("rId2", THEME_REL, "../theme/theme1.xml".to_string()),
        ])
        .as_bytes(),
    )?;
    package.add_part("ppt/slideLayouts/slideLayout1.xml", slide_layout_xml().as_bytes())?;
    package.add_part(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        relationships_xml(&[("rId1", SLIDE_MASTER_REL, "../slideMasters/slideMaster1.xml".to_string())]).as_bytes(),
    )?;
    package.add_part("ppt/theme/theme1.xml", theme_xml().as_bytes())?;

    let slide_rels = relationships_xml(&[("rId1", SLIDE_LAYOUT_REL, "../slideLayouts/slideLayout1.xml".to_string())]);
    for (index, slide) in slides.iter().enumerate() {
        let number = index + 1;
        package.add_part(&format!("ppt/slides/slide{}.xml", number), slide.as_bytes())?;
        package.add_part(&format!("ppt/slides/_rels/slide{}.xml.rels", number), slide_rels.as_bytes())?;
    }

    package.finish()
}

fn namespaces() -> String {
    format!(r#"xmlns:a="{}" xmlns:r="{}" xmlns:p="{}""#, A_NAMESPACE, RELS_NAMESPACE, P_NAMESPACE)
}

fn content_types(slide_count: usize) -> String {
    let slides: String = (1..=slide_count)
        .map(|n| {
            format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                n
            )
        })
        .collect();

    format!(
        concat!(
            "{decl}",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
            r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#,
            r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
            r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
            "{slides}</Types>"
        ),
        decl = XML_DECLARATION,
        slides = slides,
    )
}

/// Slide relationships start after the master (`rId1`) and the theme (`rId2`).
fn slide_rel_id(index: usize) -> String {
    format!("rId{}", index + 3)
}

fn presentation_xml(slide_count: usize) -> String {
    let slide_ids = if slide_count == 0 {
        String::new()
    } else {
        let ids: String = (0..slide_count)
            .map(|i| format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + i, slide_rel_id(i)))
            .collect();
        format!("<p:sldIdLst>{}</p:sldIdLst>", ids)
    };

    format!(
        concat!(
            "{decl}<p:presentation {ns} saveSubsetFonts=\"1\">",
            r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
            "{slide_ids}",
            r#"<p:sldSz cx="{cx}" cy="{cy}" type="screen4x3"/><p:notesSz cx="{cy}" cy="{cx}"/>"#,
            "</p:presentation>"
        ),
        decl = XML_DECLARATION,
        ns = namespaces(),
        slide_ids = slide_ids,
        cx = SLIDE_WIDTH_EMU,
        cy = SLIDE_HEIGHT_EMU,
    )
}

fn presentation_rels(slide_count: usize) -> String {
    let mut entries = vec![
        ("rId1".to_string(), SLIDE_MASTER_REL, "slideMasters/slideMaster1.xml".to_string()),
        ("rId2".to_string(), THEME_REL, "theme/theme1.xml".to_string()),
    ];
    entries.extend((0..slide_count).map(|i| (slide_rel_id(i), SLIDE_REL, format!("slides/slide{}.xml", i + 1))));
    relationships_xml(&entries)
}

const EMPTY_SHAPE_TREE: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

fn slide_master_xml() -> String {
    format!(
        concat!(
            "{decl}<p:sldMaster {ns}>",
            r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{tree}</p:spTree></p:cSld>"#,
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" "#,
            r#"accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            "</p:sldMaster>"
        ),
        decl = XML_DECLARATION,
        ns = namespaces(),
        tree = EMPTY_SHAPE_TREE,
    )
}

fn slide_layout_xml() -> String {
    format!(
        concat!(
            "{decl}<p:sldLayout {ns} type=\"blank\" preserve=\"1\">",
            r#"<p:cSld name="Blank"><p:spTree>{tree}</p:spTree></p:cSld>"#,
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
        ),
        decl = XML_DECLARATION,
        ns = namespaces(),
        tree = EMPTY_SHAPE_TREE,
    )
}

fn theme_xml() -> String {
    let accents = ["4F81BD", "C0504D", "9BBB59", "8064A2", "4BACC6", "F79646"];
    let accent_colors: String = accents
        .iter()
        .enumerate()
        .map(|(i, rgb)| format!(r#"<a:accent{n}><a:srgbClr val="{rgb}"/></a:accent{n}>"#, n = i + 1, rgb = rgb))
        .collect();
    let font = r#"<a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/>"#;
    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = format!(r#"<a:ln w="9525">{}</a:ln>"#, fill);
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";

    format!(
        concat!(
            "{decl}<a:theme xmlns:a=\"{a}\" name=\"Office Theme\"><a:themeElements>",
            r#"<a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#,
            r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F497D"/></a:dk2>"#,
            r#"<a:lt2><a:srgbClr val="EEECE1"/></a:lt2>{accents}<a:hlink><a:srgbClr val="0000FF"/></a:hlink>"#,
            r#"<a:folHlink><a:srgbClr val="800080"/></a:folHlink></a:clrScheme>"#,
            r#"<a:fontScheme name="Office"><a:majorFont>{font}</a:majorFont><a:minorFont>{font}</a:minorFont></a:fontScheme>"#,
            r#"<a:fmtScheme name="Office"><a:fillStyleLst>{fill}{fill}{fill}</a:fillStyleLst>"#,
            r#"<a:lnStyleLst>{line}{line}{line}</a:lnStyleLst><a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst>"#,
            r#"<a:bgFillStyleLst>{fill}{fill}{fill}</a:bgFillStyleLst></a:fmtScheme>"#,
            "</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"
        ),
        decl = XML_DECLARATION,
        a = A_NAMESPACE,
        accents = accent_colors,
        font = font,
        fill = fill,
        line = line,
        effect = effect,
    )
}

fn to_emu(points: f32) -> i64 {
    (f64::from(points) * EMU_PER_POINT as f64).round() as i64
}

fn text_paragraphs(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#.to_string()
            } else {
                format!(r#"<a:p><a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r></a:p>"#, escape_xml(line))
            }
        })
        .collect()
}

fn slide_xml(text: &str, textbox: &TextboxGeometry) -> String {
    format!(
        concat!(
            "{decl}<p:sld {ns}><p:cSld><p:spTree>{tree}",
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="TextBox 1"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
            r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#,
            r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0"/><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#,
            "</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"
        ),
        decl = XML_DECLARATION,
        ns = namespaces(),
        tree = EMPTY_SHAPE_TREE,
        x = to_emu(textbox.left),
        y = to_emu(textbox.top),
        cx = to_emu(textbox.width),
        cy = to_emu(textbox.height),
        paragraphs = text_paragraphs(text),
    )
}
