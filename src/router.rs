use crate::{
    relocate_images, ConversionRequest, ConvertedArtifact, ConverterConfig, Error, Format, Reader, Result,
    ScratchSpace, SourceArtifact, Writer,
};
use std::fs;
use tracing::{debug, info, warn};

/// The reader and writer that carry one source format to one target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub reader: Reader,
    pub writer: Writer,
    /// Extracted images must be written to scratch storage before the writer runs.
    pub relocate_images: bool,
}

/// Looks up the conversion path for a pair of formats.
///
/// Returns `None` for identical formats and for pairs without a writer (every `Txt` target).
///
/// ```
/// use docshift::{route, Format};
///
/// assert!(route(Format::Pdf, Format::Docx).unwrap().relocate_images);
/// assert!(route(Format::Docx, Format::Txt).is_none());
/// ```
pub fn route(source: Format, target: Format) -> Option<Route> {
    use Format::*;

    let relocate_images = match (source, target) {
        (Pdf, Pdf) | (Docx, Docx) | (Pptx, Pptx) | (Txt, Txt) => return None,
        (Pdf, Txt) | (Docx, Txt) | (Pptx, Txt) => return None,
        (Pdf, Docx) => true,
        (Pdf, Pptx) | (Docx, Pdf) | (Docx, Pptx) | (Pptx, Pdf) | (Pptx, Docx) | (Txt, Pdf) | (Txt, Docx) | (Txt, Pptx) => {
            false
        }
    };

    Some(Route { reader: Reader::for_format(source), writer: Writer::for_format(target)?, relocate_images })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The target equals the source format.
    SameFormat,
    /// No reader/writer path exists for the pair.
    UnsupportedPair,
}

#[derive(Debug)]
pub enum TargetOutcome {
    Converted(ConvertedArtifact),
    Skipped(SkipReason),
    Failed(Error),
}

#[derive(Debug)]
pub struct TargetReport {
    pub target: Format,
    pub outcome: TargetOutcome,
}

/// Result of a request: one report per requested target, in format order.
#[derive(Debug)]
pub struct ConversionReport {
    pub source: Format,
    pub targets: Vec<TargetReport>,
}

impl ConversionReport {
    pub fn artifacts(&self) -> impl Iterator<Item = &ConvertedArtifact> {
        self.targets.iter().filter_map(|report| match &report.outcome {
            TargetOutcome::Converted(artifact) => Some(artifact),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (Format, &Error)> {
        self.targets.iter().filter_map(|report| match &report.outcome {
            TargetOutcome::Failed(error) => Some((report.target, error)),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (Format, SkipReason)> + '_ {
        self.targets.iter().filter_map(|report| match report.outcome {
            TargetOutcome::Skipped(reason) => Some((report.target, reason)),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionState {
    Idle,
    Routing,
    Converting,
    Succeeded,
    Failed,
}

/// One request moving through `Idle -> Routing -> Converting -> Succeeded | Failed`.
///
/// Per-target problems never fail the conversion; they are recorded in the report. Only an
/// unusable scratch directory ends in [`ConversionState::Failed`].
#[derive(Debug)]
pub struct Conversion<'r> {
    request: &'r ConversionRequest,
    state: ConversionState,
}

impl<'r> Conversion<'r> {
    pub fn new(request: &'r ConversionRequest) -> Self {
        Self { request, state: ConversionState::Idle }
    }

    pub fn state(&self) -> ConversionState {
        self.state
    }

    fn transition(&mut self, next: ConversionState) {
        debug!("{}: {:?} -> {:?}", self.request.source.filename(), self.state, next);
        self.state = next;
    }

    pub fn run(&mut self, converter: &Converter, scratch: &ScratchSpace) -> Result<ConversionReport> {
        let request = self.request;
        let source = &request.source;

        self.transition(ConversionState::Routing);
        let plan: Vec<(Format, std::result::Result<Route, SkipReason>)> = request
            .targets
            .iter()
            .map(|&target| {
                let planned = if target == source.format() {
                    Err(SkipReason::SameFormat)
                } else {
                    route(source.format(), target).ok_or(SkipReason::UnsupportedPair)
                };
                (target, planned)
            })
            .collect();

        self.transition(ConversionState::Converting);
        if let Err(e) = fs::metadata(scratch.dir()).and_then(|meta| {
            if meta.is_dir() {
                Ok(())
            } else {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "scratch path is not a directory"))
            }
        }) {
            self.transition(ConversionState::Failed);
            return Err(Error::Io(e));
        }

        let mut targets = Vec::with_capacity(plan.len());
        for (target, planned) in plan {
            let outcome = match planned {
                Err(reason) => {
                    info!("Skipping {} -> {}: {:?}", source.format(), target, reason);
                    TargetOutcome::Skipped(reason)
                }
                Ok(route) => match converter.convert_target(source, route, scratch) {
                    Ok(artifact) => {
                        info!("Converted {} -> {}", source.filename(), artifact.filename);
                        TargetOutcome::Converted(artifact)
                    }
                    Err(e) => {
                        warn!("Conversion of {} to {} failed: {}", source.filename(), target, e);
                        TargetOutcome::Failed(e)
                    }
                },
            };
            targets.push(TargetReport { target, outcome });
        }

        self.transition(ConversionState::Succeeded);
        Ok(ConversionReport { source: source.format(), targets })
    }
}

/// Runs conversion requests with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Converts `request` to each of its targets, storing produced artifacts in `scratch`.
    pub fn convert(&self, request: &ConversionRequest, scratch: &ScratchSpace) -> Result<ConversionReport> {
        Conversion::new(request).run(self, scratch)
    }

    /// Reads the source, relocates images when the route asks for it, then writes and stores
    /// the target document.
    pub fn convert_target(&self, source: &SourceArtifact, route: Route, scratch: &ScratchSpace) -> Result<ConvertedArtifact> {
        let mut sequence = route.reader.read(source.bytes(), &self.config)?;
        if route.relocate_images {
            relocate_images(&mut sequence, scratch)?;
        }

        let format = route.writer.format();
        let artifact = ConvertedArtifact {
            filename: ConvertedArtifact::derive_filename(source.filename(), format),
            format,
            bytes: route.writer.write(&sequence, &self.config)?,
        };
        scratch.store_artifact(&artifact)?;
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txt_request(text: &[u8], targets: &[Format]) -> ConversionRequest {
        let source = SourceArtifact::new("notes.txt", text.to_vec()).unwrap();
        ConversionRequest::new(source, targets.iter().copied())
    }

    #[test]
    fn every_distinct_pair_has_a_route_except_txt_targets() {
        for source in Format::ALL {
            for target in Format::ALL {
                let found = route(source, target);
                if source == target || target == Format::Txt {
                    assert_eq!(found, None, "{source} -> {target}");
                } else {
                    let found = found.unwrap();
                    assert_eq!(found.writer.format(), target);
                    assert_eq!(found.reader, Reader::for_format(source));
                    assert_eq!(found.relocate_images, source == Format::Pdf && target == Format::Docx);
                }
            }
        }
    }

    #[test]
    fn same_format_and_txt_targets_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::shared(root.path()).unwrap();
        let request = txt_request(b"a\nb", &[Format::Txt, Format::Pptx]);

        let report = Converter::default().convert(&request, &scratch).unwrap();
        assert_eq!(report.skipped().collect::<Vec<_>>(), vec![(Format::Txt, SkipReason::SameFormat)]);
        assert_eq!(report.artifacts().count(), 1);

        let source = SourceArtifact::new("deck.pptx", vec![]).unwrap();
        let request = ConversionRequest::new(source, [Format::Txt]);
        let report = Converter::default().convert(&request, &scratch).unwrap();
        assert_eq!(report.skipped().collect::<Vec<_>>(), vec![(Format::Txt, SkipReason::UnsupportedPair)]);
        assert!(!scratch.artifact_path("deck_converted.txt").exists());
    }

    #[test]
    fn targets_are_reported_in_format_order_and_stored() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::shared(root.path()).unwrap();
        let request = txt_request(b"one", &[Format::Pptx, Format::Docx, Format::Pdf]);

        let report = Converter::default().convert(&request, &scratch).unwrap();
        let names: Vec<_> = report.artifacts().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["notes_converted.pdf", "notes_converted.docx", "notes_converted.pptx"]);
        for artifact in report.artifacts() {
            assert_eq!(scratch.read_artifact(&artifact.filename).unwrap(), artifact.bytes);
        }
    }

    #[test]
    fn one_failing_target_does_not_stop_the_others() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::shared(root.path()).unwrap();
        // a directory where the PDF artifact should go makes only that target fail
        fs::create_dir(scratch.artifact_path("notes_converted.pdf")).unwrap();
        let request = txt_request(b"hello", &[Format::Pdf, Format::Docx]);

        let report = Converter::default().convert(&request, &scratch).unwrap();
        assert!(report.has_failures());
        assert_eq!(report.failures().map(|(format, _)| format).collect::<Vec<_>>(), vec![Format::Pdf]);
        assert_eq!(report.artifacts().map(|a| a.format).collect::<Vec<_>>(), vec![Format::Docx]);
    }

    #[test]
    fn invalid_utf8_fails_each_target_with_encoding_failure() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::shared(root.path()).unwrap();
        let request = txt_request(&[0xff, 0xfe, b'a'], &[Format::Docx, Format::Pdf]);

        let report = Converter::default().convert(&request, &scratch).unwrap();
        assert_eq!(report.artifacts().count(), 0);
        assert_eq!(report.failures().count(), 2);
        assert!(report.failures().all(|(_, e)| matches!(e, Error::EncodingFailure(_))));
    }

    #[test]
    fn state_machine_ends_in_succeeded_or_failed() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::shared(root.path().join("scratch")).unwrap();
        let request = txt_request(b"x", &[Format::Docx]);

        let mut conversion = Conversion::new(&request);
        assert_eq!(conversion.state(), ConversionState::Idle);
        conversion.run(&Converter::default(), &scratch).unwrap();
        assert_eq!(conversion.state(), ConversionState::Succeeded);

        fs::remove_dir_all(scratch.dir()).unwrap();
        let mut conversion = Conversion::new(&request);
        assert!(conversion.run(&Converter::default(), &scratch).is_err());
        assert_eq!(conversion.state(), ConversionState::Failed);
    }
}
