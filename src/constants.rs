pub const P_NAMESPACE: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub const A_NAMESPACE: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const W_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const RELS_NAMESPACE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const PKG_RELS_NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const WP_NAMESPACE: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub const PIC_NAMESPACE: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

pub const OFFICE_DOCUMENT_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const SLIDE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const SLIDE_LAYOUT_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub const SLIDE_MASTER_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub const THEME_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
pub const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// English Metric Units per inch and per typographic point.
pub const EMU_PER_INCH: i64 = 914_400;
pub const EMU_PER_POINT: i64 = 12_700;

pub const DEFAULT_DOCX_PART: &str = "word/document.xml";
pub const PRESENTATION_PART: &str = "ppt/presentation.xml";
