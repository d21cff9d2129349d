use super::Result;
use std::io::{Cursor, Read};

/// An Open Packaging Conventions container (the zip file behind `.docx` and `.pptx`)
/// held entirely in memory.
///
/// `Package` gives access to the raw bytes of individual parts and helps
/// resolve relationship targets between them.
pub struct Package<'a> {
    archive: zip::ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Package<'a> {
    /// Opens a package from its raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Zip`] when the bytes are not a readable zip archive.
    pub fn open(bytes: &'a [u8]) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        Ok(Self { archive })
    }

    /// Names of all parts, in archive order.
    pub fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    /// Reads a part from the package by its internal path.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<u8>)` - The content of the part as a byte vector.
    /// * `Err(_)` - If the part could not be found or read.
    pub fn read_part(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self.archive.by_name(name)?;
        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Reads a part if it exists.
    pub fn read_optional_part(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        if self.has_part(name) {
            self.read_part(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Resolves a relationship `target` relative to the part that owns the relationship.
    ///
    /// # Example
    ///
    /// ```
    /// use docshift::Package;
    ///
    /// assert_eq!(Package::resolve_target("ppt/presentation.xml", "slides/slide1.xml"), "ppt/slides/slide1.xml");
    /// assert_eq!(Package::resolve_target("ppt/slides/slide1.xml", "../media/image1.png"), "ppt/media/image1.png");
    /// assert_eq!(Package::resolve_target("", "word/document.xml"), "word/document.xml");
    /// ```
    pub fn resolve_target(base_part: &str, target: &str) -> String {
        if let Some(absolute) = target.strip_prefix('/') {
            return absolute.to_string();
        }

        let mut segments: Vec<&str> = match base_part.rsplit_once('/') {
            Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
            None => Vec::new(),
        };

        for segment in target.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }

        segments.join("/")
    }

    /// Constructs the path to the relationships part of a given part.
    ///
    /// For `ppt/slides/slide1.xml` this is `ppt/slides/_rels/slide1.xml.rels`,
    /// for the package root (`""`) it is `_rels/.rels`.
    pub fn rels_path_for(part: &str) -> String {
        match part.rsplit_once('/') {
            Some((dir, name)) => format!("{}/_rels/{}.rels", dir, name),
            None => format!("_rels/{}.rels", part),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rels_path_for_nested_part() {
        assert_eq!(Package::rels_path_for("ppt/slides/slide1.xml"), "ppt/slides/_rels/slide1.xml.rels");
        assert_eq!(Package::rels_path_for("word/document.xml"), "word/_rels/document.xml.rels");
    }

    #[test]
    fn rels_path_for_package_root() {
        assert_eq!(Package::rels_path_for(""), "_rels/.rels");
    }

    #[test]
    fn resolve_absolute_target() {
        assert_eq!(Package::resolve_target("ppt/presentation.xml", "/ppt/slides/slide2.xml"), "ppt/slides/slide2.xml");
    }

    #[test]
    fn open_rejects_non_zip_bytes() {
        assert!(matches!(Package::open(b"not a zip"), Err(crate::Error::Zip(_))));
    }
}
