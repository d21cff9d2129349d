/// Position and size of the textbox placed on every generated slide, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextboxGeometry {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for TextboxGeometry {
    fn default() -> Self {
        Self { left: 100.0, top: 100.0, width: 600.0, height: 400.0 }
    }
}

/// Configuration options for the format writers and readers.
///
/// Use [`ConverterConfig::builder()`] to create a configuration instance.
/// Only the fields you set are changed, everything else keeps its default.
///
/// # Configuration Options
///
/// | Parameter | Type | Default | Description |
/// |-----------|------|---------|-------------|
/// | `image_width_inches` | `f32` | `5.0` | Display width of pictures inserted into DOCX output |
/// | `pdf_font_size` | `f32` | `12.0` | Helvetica size used for PDF output |
/// | `pdf_line_height_mm` | `f32` | `10.0` | Height of one rendered line in PDF output |
/// | `textbox` | [`TextboxGeometry`] | 100/100/600/400 pt | Textbox placed on generated slides |
/// | `parallel_slides` | `bool` | `false` | Parse slide XML on the rayon thread pool |
///
/// # Example
///
/// ```
/// use docshift::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .image_width_inches(4.0)
///     .parallel_slides(true)
///     .build();
/// assert_eq!(config.pdf_font_size, 12.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterConfig {
    pub image_width_inches: f32,
    pub pdf_font_size: f32,
    pub pdf_line_height_mm: f32,
    pub textbox: TextboxGeometry,
    pub parallel_slides: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            image_width_inches: 5.0,
            pdf_font_size: 12.0,
            pdf_line_height_mm: 10.0,
            textbox: TextboxGeometry::default(),
            parallel_slides: false,
        }
    }
}

impl ConverterConfig {
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder::default()
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug, Default)]
pub struct ConverterConfigBuilder {
    image_width_inches: Option<f32>,
    pdf_font_size: Option<f32>,
    pdf_line_height_mm: Option<f32>,
    textbox: Option<TextboxGeometry>,
    parallel_slides: Option<bool>,
}

impl ConverterConfigBuilder {
    /// Sets the display width of pictures in DOCX output.
    pub fn image_width_inches(mut self, value: f32) -> Self {
        self.image_width_inches = Some(value);
        self
    }

    pub fn pdf_font_size(mut self, value: f32) -> Self {
        self.pdf_font_size = Some(value);
        self
    }

    pub fn pdf_line_height_mm(mut self, value: f32) -> Self {
        self.pdf_line_height_mm = Some(value);
        self
    }

    /// Sets where the textbox lands on generated slides.
    pub fn textbox(mut self, value: TextboxGeometry) -> Self {
        self.textbox = Some(value);
        self
    }

    /// Sets whether slides of a PPTX source are parsed in parallel.
    pub fn parallel_slides(mut self, value: bool) -> Self {
        self.parallel_slides = Some(value);
        self
    }

    /// Builds the final [`ConverterConfig`], applying defaults for any fields that were not set.
    pub fn build(self) -> ConverterConfig {
        let defaults = ConverterConfig::default();
        ConverterConfig {
            image_width_inches: self.image_width_inches.unwrap_or(defaults.image_width_inches),
            pdf_font_size: self.pdf_font_size.unwrap_or(defaults.pdf_font_size),
            pdf_line_height_mm: self.pdf_line_height_mm.unwrap_or(defaults.pdf_line_height_mm),
            textbox: self.textbox.unwrap_or(defaults.textbox),
            parallel_slides: self.parallel_slides.unwrap_or(defaults.parallel_slides),
        }
    }
}
