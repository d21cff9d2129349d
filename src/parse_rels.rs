use crate::Result;
use roxmltree::Document;

/// One `<Relationship>` entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// Parses relationship (`.rels`) XML data, returning every relationship in document order.
///
/// Entries missing one of `Id`, `Type` or `Target` are skipped.
///
/// # Errors
///
/// An error is returned if:
/// - The XML data is not valid UTF-8.
/// - Malformed or invalid XML structure is detected.
pub fn parse_relationships(xml_data: &[u8]) -> Result<Vec<Relationship>> {
    let xml_str = std::str::from_utf8(xml_data)?;
    let doc = Document::parse(xml_str)?;
    let root = doc.root_element();

    let mut relationships = Vec::new();
    for rel in root.children().filter(|n| n.is_element() && n.tag_name().name() == "Relationship") {
        if let (Some(id), Some(rel_type), Some(target)) =
            (rel.attribute("Id"), rel.attribute("Type"), rel.attribute("Target"))
        {
            relationships.push(Relationship {
                id: id.to_string(),
                rel_type: rel_type.to_string(),
                target: target.to_string(),
            });
        }
    }

    Ok(relationships)
}

/// Returns the target of the first relationship of type `rel_type`.
pub(crate) fn find_target<'r>(relationships: &'r [Relationship], rel_type: &str) -> Option<&'r str> {
    relationships
        .iter()
        .find(|rel| rel.rel_type == rel_type)
        .map(|rel| rel.target.as_str())
}

pub(crate) fn target_by_id<'r>(relationships: &'r [Relationship], id: &str) -> Option<&'r str> {
    relationships
        .iter()
        .find(|rel| rel.id == id)
        .map(|rel| rel.target.as_str())
}
