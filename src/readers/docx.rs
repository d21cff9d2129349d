use crate::constants::{DEFAULT_DOCX_PART, OFFICE_DOCUMENT_REL, W_NAMESPACE};
use crate::parse_rels::{find_target, parse_relationships};
use crate::{ContentSequence, ContentUnit, Error, Format, Package, Result};
use roxmltree::{Document, Node};
use tracing::debug;

/// Reads a Word document, producing one text block per body paragraph.
///
/// Only paragraphs that are direct children of `<w:body>` count; tables, headers
/// and text boxes are not visited. Paragraph text is the concatenation of its runs with
/// `<w:tab/>` as `\t` and `<w:br/>`/`<w:cr/>` as `\n`. Embedded images are not extracted.
pub fn read_docx(bytes: &[u8]) -> Result<ContentSequence> {
    read_paragraphs(bytes).map_err(|e| match e {
        Error::UnreadableSource { .. } => e,
        other => Error::unreadable(Format::Docx, other),
    })
}

fn read_paragraphs(bytes: &[u8]) -> Result<ContentSequence> {
    let mut package = Package::open(bytes)?;
    let main_part = main_document_part(&mut package)?;
    debug!("Reading DOCX main part {}", main_part);

    let xml = package.read_part(&main_part)?;
    let xml_str = std::str::from_utf8(&xml)?;
    let doc = Document::parse(xml_str)?;

    let body = doc
        .root_element()
        .children()
        .find(|n| is_w(n, "body"))
        .ok_or_else(|| Error::unreadable(Format::Docx, "document has no <w:body> element"))?;

    let units = body
        .children()
        .filter(|n| is_w(n, "p"))
        .enumerate()
        .map(|(index, p)| {
            let mut text = String::new();
            collect_text(&p, &mut text);
            ContentUnit::text(text, index)
        })
        .collect();

    Ok(ContentSequence::flow(units))
}

/// Locates the main document part through the package relationships.
fn main_document_part(package: &mut Package) -> Result<String> {
    if let Some(rels) = package.read_optional_part(&Package::rels_path_for(""))? {
        let relationships = parse_relationships(&rels)?;
        if let Some(target) = find_target(&relationships, OFFICE_DOCUMENT_REL) {
            return Ok(Package::resolve_target("", target));
        }
    }
    Ok(DEFAULT_DOCX_PART.to_string())
}

fn is_w(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(W_NAMESPACE)
}

fn collect_text(node: &Node, out: &mut String) {
    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().namespace() != Some(W_NAMESPACE) {
            // drawings, math and markup compatibility blocks carry no run text
            continue;
        }
        match child.tag_name().name() {
            "t" => out.push_str(child.text().unwrap_or_default()),
            "tab" => out.push('\t'),
            "br" | "cr" => out.push('\n'),
            "txbxContent" | "pPr" | "rPr" | "del" => {}
            _ => collect_text(&child, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn package(document_xml: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn paragraphs_in_document_order() {
        let bytes = package(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
                <w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r><w:hyperlink><w:r><w:t>world</w:t></w:r></w:hyperlink></w:p>
                <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
                <w:p/>
                <w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p>
                <w:sectPr/>
            </w:body></w:document>"#,
        );

        let sequence = read_docx(&bytes).unwrap();
        let texts: Vec<_> = sequence.text_blocks().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello world", "", "a\tb\nc"]);
        assert_eq!(sequence.text_blocks().last().unwrap().origin_index, 2);
    }

    #[test]
    fn empty_body_has_no_paragraphs() {
        let bytes = package(r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body/></w:document>"#);
        assert!(read_docx(&bytes).unwrap().units.is_empty());
    }

    #[test]
    fn garbage_is_unreadable_docx() {
        assert!(matches!(
            read_docx(b"PK\x03\x04 definitely not a zip"),
            Err(Error::UnreadableSource { format: Format::Docx, .. })
        ));
    }
}
