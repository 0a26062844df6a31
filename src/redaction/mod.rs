//! Redaction passes.
//!
//! [`RedactionService`] drives the three passes over a document: a preview
//! of one page, a hit analysis across all pages, and the destructive
//! redaction that writes a new output file. Every pass compiles the pattern
//! set, resolves hits to geometry with [`MatchResolver`] and, for redaction,
//! consolidates them with [`RedactionMerger`] before committing page by page.

pub mod config;
pub mod job;
pub mod merge;
pub mod report;
pub mod resolver;

pub use config::{RedactionConfig, SingleCharScope};
pub use job::{spawn_pass, PassControl, PassHandle};
pub use merge::RedactionMerger;
pub use report::{
    DetectorStatus, Highlight, HitReport, MatchSource, PageHits, PatternHits, PreviewReport,
    RedactionReport,
};
pub use resolver::{MatchResolver, Resolution};

use crate::detect::{
    detector_for, entity_color, load_detector, mask_entities, DetectionConfig, Entity,
    EntityDetector, ModelKind, ModelLoad,
};
use crate::document::{DocumentHandle, DocumentProvider, MupdfProvider, PageContext};
use crate::domain::{CompiledPattern, MatchTemplate, Pattern, PatternOrigin, PatternSet};
use crate::error::{RedactorError, RedactorResult};
use crate::geometry::Rect;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Opacity of preview highlights painted over the page raster.
const HIGHLIGHT_ALPHA: f32 = 0.35;

/// Redaction service coordinating document access, detection and passes.
#[derive(Clone)]
pub struct RedactionService {
    provider: Arc<dyn DocumentProvider>,
    detectors: HashMap<ModelKind, Arc<dyn EntityDetector>>,
}

impl RedactionService {
    /// Creates a service reading and writing documents through `provider`.
    pub fn new(provider: Arc<dyn DocumentProvider>) -> Self {
        Self {
            provider,
            detectors: HashMap::new(),
        }
    }

    /// Creates a service backed by MuPDF.
    pub fn with_mupdf() -> Self {
        Self::new(Arc::new(MupdfProvider::new()))
    }

    /// Registers the detector used for its model kind, replacing the default.
    pub fn with_detector(mut self, detector: Arc<dyn EntityDetector>) -> Self {
        self.detectors.insert(detector.model(), detector);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// The detector that runs for `kind`.
    pub fn detector(&self, kind: ModelKind) -> Arc<dyn EntityDetector> {
        self.detectors
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| detector_for(kind))
    }

    /// Loads the detector for `kind` on a background thread, including one
    /// registered with [`RedactionService::with_detector`].
    pub fn load_detector(&self, kind: ModelKind) -> ModelLoad {
        load_detector(self.detector(kind))
    }

    fn open(&self, input: &Path) -> RedactorResult<Box<dyn DocumentHandle>> {
        self.provider.open(input)
    }

    /// Loads the words and text of one page, e.g. to turn a selection into
    /// a pattern.
    pub fn page_context(&self, input: &Path, page_index: usize) -> RedactorResult<PageContext> {
        let mut doc = self.open(input)?;
        check_page_index(doc.as_ref(), page_index)?;
        let page = doc.page(page_index)?;
        let ctx = PageContext::load(&*page, page_index)?;
        Ok(ctx)
    }

    /// Builds a pattern from the text under `area` on one page, e.g. a
    /// rubber-band selection in a viewer.
    pub fn pattern_from_selection(
        &self,
        input: &Path,
        page_index: usize,
        area: &Rect,
        template: MatchTemplate,
    ) -> RedactorResult<Pattern> {
        let ctx = self.page_context(input, page_index)?;
        let selected = ctx.words.text_in_area(area);
        if selected.is_empty() {
            return Err(RedactorError::invalid_input(
                "selection",
                format!("no text under the selected area on page {}", page_index + 1),
            ));
        }
        let inputs = [selected.as_str()];
        let regex = template.regex(&inputs)?;
        debug!(page = page_index + 1, selected = %selected, template = template.name(), "selection pattern");
        Ok(Pattern::new(
            template.label(&inputs),
            regex,
            PatternOrigin::Selection,
        ))
    }

    /// Resolves every pattern and entity on one page without modifying it.
    ///
    /// With `render_scale`, the page is rasterized at that zoom and the
    /// highlights are painted over it.
    pub fn preview_page(
        &self,
        input: &Path,
        page_index: usize,
        patterns: &PatternSet,
        config: &RedactionConfig,
        render_scale: Option<f32>,
    ) -> RedactorResult<PreviewReport> {
        config.validate()?;
        let (compiled, skipped_patterns) = patterns.compile();
        let mut detection = DetectorSession::new(self, config.detection.as_ref());

        let mut doc = self.open(input)?;
        check_page_index(doc.as_ref(), page_index)?;
        let page = doc.page(page_index)?;
        let ctx = PageContext::load(&*page, page_index)?;
        let found = collect_page(&ctx, &compiled, &mut detection, config);

        let bitmap = match render_scale {
            Some(scale) => {
                if !(scale.is_finite() && scale > 0.0) {
                    return Err(RedactorError::invalid_input(
                        "zoom",
                        format!("{} is not a positive number", scale),
                    ));
                }
                let mut bitmap = page.render(scale)?;
                for h in &found.highlights {
                    bitmap.fill_rect(&h.rect.scale(scale), h.color, HIGHLIGHT_ALPHA);
                }
                Some(bitmap)
            }
            None => None,
        };

        debug!(
            page = page_index + 1,
            highlights = found.highlights.len(),
            "preview ready"
        );
        Ok(PreviewReport {
            page: page_index + 1,
            highlights: found.highlights,
            skipped_patterns,
            unresolved: found.unresolved,
            detector_status: detection.status,
            bitmap,
        })
    }

    /// Counts resolved hits per pattern per page across the document.
    pub fn analyze(
        &self,
        input: &Path,
        patterns: &PatternSet,
        config: &RedactionConfig,
        control: &PassControl,
    ) -> RedactorResult<HitReport> {
        config.validate()?;
        if patterns.is_empty() {
            return Err(RedactorError::invalid_input(
                "patterns",
                "No patterns specified",
            ));
        }
        let (compiled, skipped_patterns) = patterns.compile();
        let mut report = HitReport {
            patterns: compiled
                .iter()
                .map(|p| PatternHits {
                    label: p.label.clone(),
                    total: 0,
                    pages: Vec::new(),
                })
                .collect(),
            skipped_patterns,
            ..Default::default()
        };

        let mut doc = self.open(input)?;
        let page_count = doc.page_count()?;
        info!(input = %input.display(), pages = page_count, patterns = compiled.len(), "analyzing hits");

        for index in 0..page_count {
            control.checkpoint()?;
            let page = doc.page(index)?;
            let ctx = PageContext::load(&*page, index)?;
            let resolver =
                MatchResolver::new(&ctx.words).with_single_char_scope(config.single_char_scope);
            for (i, pattern) in compiled.iter().enumerate() {
                let hits = resolver.find_matches(&pattern.regex).matches.len();
                report.record(i, index + 1, hits);
            }
            report.pages_scanned += 1;
            control.advance();
        }

        info!(total_hits = report.total_hits, "analysis complete");
        Ok(report)
    }

    /// Removes every pattern hit and detected entity and writes the result
    /// to `output`.
    ///
    /// The input is never modified. A page whose commit keeps failing aborts
    /// the pass before anything is written.
    pub fn redact(
        &self,
        input: &Path,
        output: &Path,
        patterns: &PatternSet,
        config: &RedactionConfig,
        control: &PassControl,
    ) -> RedactorResult<RedactionReport> {
        config.validate()?;
        if same_file(input, output) {
            return Err(RedactorError::invalid_input(
                "output",
                "Output must differ from the input; redaction never writes in place",
            ));
        }
        if patterns.is_empty() && config.detection.is_none() {
            return Err(RedactorError::invalid_input(
                "patterns",
                "No patterns or entity detection specified",
            ));
        }

        let (compiled, skipped_patterns) = patterns.compile();
        let mut detection = DetectorSession::new(self, config.detection.as_ref());
        let merger = RedactionMerger::from_config(config);

        let mut doc = self.open(input)?;
        let page_count = doc.page_count()?;
        info!(
            input = %input.display(),
            output = %output.display(),
            pages = page_count,
            patterns = compiled.len(),
            backend = self.provider.name(),
            "starting redaction"
        );

        let mut report = RedactionReport {
            skipped_patterns,
            ..Default::default()
        };

        for index in 0..page_count {
            control.checkpoint()?;
            let regions = {
                let page = doc.page(index)?;
                let ctx = PageContext::load(&*page, index)?;
                let found = collect_page(&ctx, &compiled, &mut detection, config);
                report.pattern_matches += found.pattern_matches;
                report.entity_matches += found.entity_matches;
                report.unresolved += found.unresolved;
                merger.merge(found.highlights.iter().map(|h| h.rect))
            };

            if !regions.is_empty() {
                let applied = commit_page(doc.as_mut(), index, &regions, config)?;
                report.regions_applied += applied;
                report.pages_modified += 1;
            }
            report.pages_processed += 1;
            control.advance();
        }

        doc.save(output, config.compact_output)?;
        report.detector_status = detection.status;

        info!(
            regions = report.regions_applied,
            pages_modified = report.pages_modified,
            "redaction complete"
        );
        Ok(report)
    }

    /// Full text of the document, one page per line group.
    pub fn extract_text(&self, input: &Path) -> RedactorResult<String> {
        let mut doc = self.open(input)?;
        let page_count = doc.page_count()?;
        let mut pages = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let page = doc.page(index)?;
            let text = page.extract_text().map_err(|e| RedactorError::TextExtraction {
                path: input.to_path_buf(),
                reason: format!("page {}: {}", index + 1, e),
            })?;
            pages.push(text);
        }
        Ok(pages.join("\n"))
    }

    /// Detects entities in plain text and masks them.
    pub fn mask_text(&self, text: &str, detection: &DetectionConfig) -> RedactorResult<String> {
        detection.validate()?;
        let detector = self.detector(detection.model);
        let entities = detector
            .detect(text, &detection.labels)
            .map_err(|e| RedactorError::BackendError {
                backend: detection.model.to_string(),
                message: "entity detection failed".to_string(),
                source: Some(Box::new(e)),
            })?;
        let entities = detection.filter(entities);
        debug!(entities = entities.len(), style = %detection.masking, "masking text");
        Ok(mask_entities(text, &entities, detection.masking))
    }

    /// Runs [`RedactionService::redact`] on a worker thread.
    pub fn spawn_redact(
        &self,
        input: PathBuf,
        output: PathBuf,
        patterns: PatternSet,
        config: RedactionConfig,
    ) -> RedactorResult<PassHandle<RedactionReport>> {
        let service = self.clone();
        spawn_pass("redact", move |control| {
            service.redact(&input, &output, &patterns, &config, control)
        })
    }

    /// Runs [`RedactionService::analyze`] on a worker thread.
    pub fn spawn_analyze(
        &self,
        input: PathBuf,
        patterns: PatternSet,
        config: RedactionConfig,
    ) -> RedactorResult<PassHandle<HitReport>> {
        let service = self.clone();
        spawn_pass("analyze", move |control| {
            service.analyze(&input, &patterns, &config, control)
        })
    }
}

fn check_page_index(doc: &dyn DocumentHandle, page_index: usize) -> RedactorResult<()> {
    let count = doc.page_count()?;
    if page_index >= count {
        return Err(RedactorError::invalid_input(
            "page",
            format!("page {} is out of range (document has {})", page_index + 1, count),
        ));
    }
    Ok(())
}

fn same_file(input: &Path, output: &Path) -> bool {
    if input == output {
        return true;
    }
    match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Applies `regions` to one page, reloading and retrying it as a whole.
fn commit_page(
    doc: &mut dyn DocumentHandle,
    index: usize,
    regions: &[Rect],
    config: &RedactionConfig,
) -> RedactorResult<usize> {
    let mut reason = String::new();
    for attempt in 1..=config.page_attempts {
        let mut page = doc.page(index)?;
        match page.commit_redactions(regions, config.fill) {
            Ok(applied) => return Ok(applied),
            Err(e) => {
                warn!(page = index + 1, attempt, error = %e, "page commit failed");
                reason = e.to_string();
            }
        }
    }
    Err(RedactorError::PartialRedaction {
        page: index + 1,
        attempts: config.page_attempts,
        reason,
    })
}

/// Entity detection for one pass. The first failure disables the detector
/// for the rest of the pass and is reported once.
struct DetectorSession<'c> {
    detector: Option<Arc<dyn EntityDetector>>,
    config: Option<&'c DetectionConfig>,
    status: DetectorStatus,
}

impl<'c> DetectorSession<'c> {
    fn new(service: &RedactionService, config: Option<&'c DetectionConfig>) -> Self {
        match config {
            Some(c) => Self {
                detector: Some(service.detector(c.model)),
                config: Some(c),
                status: DetectorStatus::Ran,
            },
            None => Self {
                detector: None,
                config: None,
                status: DetectorStatus::Disabled,
            },
        }
    }

    fn detect(&mut self, text: &str) -> Vec<Entity> {
        let (Some(detector), Some(config)) = (&self.detector, self.config) else {
            return Vec::new();
        };
        match detector.detect(text, &config.labels) {
            Ok(entities) => config.filter(entities),
            Err(e) => {
                warn!(error = %e, "entity detection unavailable; continuing with patterns only");
                self.status = DetectorStatus::Degraded {
                    reason: e.to_string(),
                };
                self.detector = None;
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Default)]
struct PageFindings {
    highlights: Vec<Highlight>,
    pattern_matches: usize,
    entity_matches: usize,
    unresolved: usize,
}

fn collect_page(
    ctx: &PageContext,
    patterns: &[CompiledPattern],
    detection: &mut DetectorSession<'_>,
    config: &RedactionConfig,
) -> PageFindings {
    let resolver = MatchResolver::new(&ctx.words).with_single_char_scope(config.single_char_scope);
    let mut found = PageFindings::default();

    for pattern in patterns {
        let resolution = resolver.find_matches(&pattern.regex);
        found.pattern_matches += resolution.matches.len();
        found.unresolved += resolution.unresolved;
        found
            .highlights
            .extend(resolution.matches.into_iter().map(|m| Highlight {
                rect: m.rect,
                text: m.text,
                label: pattern.label.clone(),
                color: pattern.color,
                source: MatchSource::Pattern,
            }));
    }

    let entities = detection.detect(ctx.text());
    let mut by_label: BTreeMap<String, Vec<Entity>> = BTreeMap::new();
    for entity in entities {
        by_label.entry(entity.label.clone()).or_default().push(entity);
    }
    for (label, group) in by_label {
        let resolution = resolver.resolve_entities(&group);
        found.entity_matches += resolution.matches.len();
        found.unresolved += resolution.unresolved;
        let color = entity_color(&label);
        found
            .highlights
            .extend(resolution.matches.into_iter().map(|m| Highlight {
                rect: m.rect,
                text: m.text,
                label: label.clone(),
                color,
                source: MatchSource::Entity,
            }));
    }
    found
}
