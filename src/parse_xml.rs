use crate::constants::{A_NAMESPACE, P_NAMESPACE};
use crate::slide::SlideShape;
use crate::{Error, Format, Result};
use roxmltree::{Document, Node};

/// Parses raw XML slide data from a PowerPoint (pptx) file and classifies every shape.
///
/// Each direct child of the slide's shape tree (`<p:spTree>`) is classified exactly once:
/// a `<p:sp>` becomes [`SlideShape::Text`], everything else (pictures, graphic frames,
/// group shapes, connectors) becomes [`SlideShape::Other`].
///
/// # Errors
///
/// Parsing fails if:
/// - The provided XML data isn't valid UTF-8.
/// - The XML is malformed or misses the `<p:cSld>` or `<p:spTree>` elements.
pub fn parse_slide_xml(xml_data: &[u8]) -> Result<Vec<SlideShape>> {
    let xml_str = std::str::from_utf8(xml_data)?;
    let doc = Document::parse(xml_str)?;
    let root = doc.root_element();

    let c_sld = root
        .children()
        .find(|n| is_element(n, P_NAMESPACE, "cSld"))
        .ok_or_else(|| Error::unreadable(Format::Pptx, "slide has no <p:cSld> element"))?;

    let sp_tree = c_sld
        .children()
        .find(|n| is_element(n, P_NAMESPACE, "spTree"))
        .ok_or_else(|| Error::unreadable(Format::Pptx, "slide has no <p:spTree> element"))?;

    let shapes = sp_tree
        .children()
        .filter(|n| n.is_element() && n.tag_name().namespace() == Some(P_NAMESPACE))
        .filter_map(|node| match node.tag_name().name() {
            "sp" => Some(SlideShape::Text(shape_text(&node))),
            // shape tree properties, not shapes
            "nvGrpSpPr" | "grpSpPr" | "extLst" => None,
            _ => Some(SlideShape::Other),
        })
        .collect();

    Ok(shapes)
}

fn is_element(node: &Node, namespace: &str, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(namespace)
}

/// Collects the text of a shape's text body (`<p:txBody>`).
///
/// Paragraphs (`<a:p>`) are joined with `\n`, line breaks (`<a:br>`) become `\n`,
/// and text runs (`<a:r>`) and fields (`<a:fld>`) are concatenated.
/// A shape without a text body yields an empty string.
fn shape_text(sp_node: &Node) -> String {
    let Some(tx_body) = sp_node.children().find(|n| is_element(n, P_NAMESPACE, "txBody")) else {
        return String::new();
    };

    tx_body
        .children()
        .filter(|n| is_element(n, A_NAMESPACE, "p"))
        .map(|p| paragraph_text(&p))
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(p_node: &Node) -> String {
    let mut text = String::new();

    for child in p_node.children().filter(|n| n.is_element() && n.tag_name().namespace() == Some(A_NAMESPACE)) {
        match child.tag_name().name() {
            "r" | "fld" => {
                if let Some(t) = child.children().find(|n| is_element(n, A_NAMESPACE, "t")) {
                    text.push_str(t.text().unwrap_or_default());
                }
            }
            "br" => text.push('\n'),
            _ => {}
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn load_xml(filename: &str) -> Vec<u8> {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("tests");
        path.push("test_data");
        path.push("xml");
        path.push(filename);
        fs::read(path).expect("Unable to read test data file")
    }

    #[test]
    fn classifies_shapes_in_tree_order() {
        let shapes = parse_slide_xml(&load_xml("slide_mixed_shapes.xml")).unwrap();

        assert_eq!(
            shapes,
            vec![
                SlideShape::Text("Quarterly review".to_string()),
                SlideShape::Other,
                SlideShape::Text("Revenue up\nCosts down\nNext: hiring".to_string()),
                SlideShape::Other,
            ]
        );
    }

    #[test]
    fn shape_without_text_body_is_empty_text() {
        let xml = br#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
            <p:cSld><p:spTree><p:nvGrpSpPr/><p:grpSpPr/><p:sp><p:spPr/></p:sp></p:spTree></p:cSld></p:sld>"#;
        assert_eq!(parse_slide_xml(xml).unwrap(), vec![SlideShape::Text(String::new())]);
    }

    #[test]
    fn slide_without_shape_tree_is_unreadable() {
        let xml = br#"<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld/></p:sld>"#;
        assert!(matches!(parse_slide_xml(xml), Err(Error::UnreadableSource { format: Format::Pptx, .. })));
    }
}
