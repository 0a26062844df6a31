//! PDF Redaction CLI Application.
//!
//! This binary provides a command-line interface for the redactor library:
//! previewing and analyzing pattern hits, redacting documents, extracting
//! text and masking entities in plain text.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use redactor::detect::{MaskingStyle, ModelKind};
use redactor::domain::PRESETS;
use redactor::{
    Color, DetectionConfig, MatchTemplate, PassControl, Pattern, PatternOrigin, PatternSet,
    RedactionConfig, RedactionService, SingleCharScope,
};

/// PDF Redaction Tool
///
/// Find sensitive text with patterns or entity detection and remove it
/// permanently from PDF documents.
#[derive(Parser)]
#[command(name = "redactor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact pattern hits and detected entities into a new PDF
    Redact {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output PDF file path (must differ from the input)
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        #[command(flatten)]
        patterns: PatternArgs,

        #[command(flatten)]
        detection: DetectionArgs,

        #[command(flatten)]
        geometry: GeometryArgs,

        /// Fill color for removed regions
        #[arg(long, value_name = "#RRGGBB", default_value = "#000000")]
        fill: Color,

        /// Write the output without garbage collection and compression
        #[arg(long)]
        no_compact: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the matches on one page without modifying the document
    Preview {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// One-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[command(flatten)]
        patterns: PatternArgs,

        #[command(flatten)]
        detection: DetectionArgs,

        #[command(flatten)]
        geometry: GeometryArgs,

        /// Write the page with highlights as a PNG image
        #[arg(long, value_name = "FILE")]
        render: Option<PathBuf>,

        /// Zoom used when rendering
        #[arg(long, default_value_t = 1.5)]
        zoom: f32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count pattern hits per page across the whole document
    Analyze {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        patterns: PatternArgs,

        #[command(flatten)]
        geometry: GeometryArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract text from a PDF (for debugging and verification)
    Extract {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Detect entities in plain text and mask them
    Mask {
        /// Text file to read (defaults to stdin)
        #[arg(short, long, value_name = "FILE", conflicts_with = "text")]
        input: Option<PathBuf>,

        /// Text to mask
        #[arg(long)]
        text: Option<String>,

        /// Detection model
        #[arg(long, default_value = "builtin")]
        model: ModelKind,

        /// Minimum confidence for an entity to be masked
        #[arg(long, default_value_t = 0.35)]
        threshold: f32,

        /// Entity labels to mask (default: all)
        #[arg(long = "label", value_name = "LABEL")]
        labels: Vec<String>,

        /// Masking style: type_label, full_mask, partial_mask or redact
        #[arg(long, default_value = "type_label")]
        style: MaskingStyle,
    },

    /// List presets, match templates and detection models
    Presets,
}

/// Pattern sources shared by the document commands.
#[derive(Args, Debug, Default)]
struct PatternArgs {
    /// Preset pattern by name (can be specified multiple times)
    #[arg(long = "preset", value_name = "NAME")]
    presets: Vec<String>,

    /// Custom regex pattern (can be specified multiple times)
    #[arg(short, long = "pattern", value_name = "REGEX")]
    patterns: Vec<String>,

    /// Match template by name, e.g. "Text after word"
    #[arg(long, value_name = "NAME")]
    template: Option<String>,

    /// Input for the match template (repeat for templates with several)
    #[arg(long = "template-input", value_name = "TEXT", requires = "template")]
    template_inputs: Vec<String>,

    /// JSON file holding a list of patterns
    #[arg(long, value_name = "FILE")]
    patterns_file: Option<PathBuf>,
}

impl PatternArgs {
    fn build(&self) -> Result<PatternSet> {
        let mut set = PatternSet::new();

        if let Some(path) = &self.patterns_file {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let loaded: Vec<Pattern> = serde_json::from_str(&json)
                .with_context(|| format!("Invalid pattern file {}", path.display()))?;
            for pattern in loaded {
                set.add(pattern)?;
            }
        }
        for name in &self.presets {
            set.add_preset(name)?;
        }
        for regex in &self.patterns {
            set.add_template(MatchTemplate::CustomRegex, &[regex.as_str()], PatternOrigin::Custom)?;
        }
        if let Some(name) = &self.template {
            let template = MatchTemplate::from_name(&name.replace('-', " "))
                .with_context(|| format!("Unknown match template '{}'", name))?;
            let inputs: Vec<&str> = self.template_inputs.iter().map(String::as_str).collect();
            set.add_template(template, &inputs, PatternOrigin::Custom)?;
        }
        Ok(set)
    }
}

/// Entity detection options.
#[derive(Args, Debug, Default)]
struct DetectionArgs {
    /// Enable entity detection with the given model
    #[arg(long, value_name = "MODEL")]
    detect: Option<ModelKind>,

    /// Minimum confidence for a detected entity
    #[arg(long, default_value_t = 0.35)]
    threshold: f32,

    /// Entity labels to keep (default: all)
    #[arg(long = "entity", value_name = "LABEL", requires = "detect")]
    labels: Vec<String>,
}

impl DetectionArgs {
    fn build(&self) -> Option<DetectionConfig> {
        self.detect.map(|model| {
            DetectionConfig::new(model)
                .with_threshold(self.threshold)
                .with_labels(self.labels.iter().cloned())
        })
    }
}

/// Geometry options.
#[derive(Args, Debug)]
struct GeometryArgs {
    /// Padding added around every match, in points
    #[arg(long, default_value_t = 2.0)]
    padding: f32,

    /// Single-character matches: every occurrence on the page, or only the matched one
    #[arg(long, value_name = "SCOPE", default_value = "page")]
    single_char_scope: SingleCharScope,
}

impl GeometryArgs {
    fn apply(&self, config: RedactionConfig) -> RedactionConfig {
        config
            .with_padding(self.padding)
            .with_single_char_scope(self.single_char_scope)
    }
}

/// Redaction command handler with dependency injection.
struct RedactionHandler {
    service: RedactionService,
    verbose: bool,
}

impl RedactionHandler {
    /// Creates a new handler backed by MuPDF.
    fn new(verbose: bool) -> Self {
        Self {
            service: RedactionService::with_mupdf(),
            verbose,
        }
    }

    fn require_input(input: &Path) -> Result<()> {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }
        Ok(())
    }

    /// Executes a redaction operation.
    fn redact(
        &self,
        input: &Path,
        output: &Path,
        patterns: &PatternSet,
        config: &RedactionConfig,
        json: bool,
    ) -> Result<()> {
        Self::require_input(input)?;

        if patterns.is_empty() && config.detection.is_none() {
            anyhow::bail!(
                "No redaction targets specified. Use --preset, --pattern, --template, --patterns-file or --detect."
            );
        }

        if self.verbose {
            eprintln!("Input:  {}", input.display());
            eprintln!("Output: {}", output.display());
            eprintln!("Patterns: {}", patterns.len());
        }

        let report = self
            .service
            .redact(input, output, patterns, config, &PassControl::detached())
            .with_context(|| "Redaction failed")?;

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        for skipped in &report.skipped_patterns {
            println!("⚠ Skipped pattern '{}': {}", skipped.label, skipped.reason);
        }
        if let redactor::redaction::DetectorStatus::Degraded { reason } = &report.detector_status {
            println!("⚠ Entity detection unavailable, used patterns only: {}", reason);
        }

        if self.verbose {
            println!("\nRedaction Summary:");
            println!("  Pages processed: {}", report.pages_processed);
            println!("  Pages modified:  {}", report.pages_modified);
            println!("  Pattern matches: {}", report.pattern_matches);
            println!("  Entity matches:  {}", report.entity_matches);
            println!("  Unresolved:      {}", report.unresolved);
        }

        if report.has_redactions() {
            println!(
                "✓ Successfully redacted {} region(s) → {}",
                report.regions_applied,
                output.display()
            );
        } else {
            println!("⚠ No instances found to redact");
        }

        Ok(())
    }

    /// Previews one page.
    fn preview(
        &self,
        input: &Path,
        page: usize,
        patterns: &PatternSet,
        config: &RedactionConfig,
        render: Option<(&Path, f32)>,
        json: bool,
    ) -> Result<()> {
        Self::require_input(input)?;
        if page == 0 {
            anyhow::bail!("Page numbers start at 1");
        }

        let report = self
            .service
            .preview_page(input, page - 1, patterns, config, render.map(|(_, zoom)| zoom))
            .with_context(|| "Preview failed")?;

        if let (Some((path, _)), Some(bitmap)) = (render, &report.bitmap) {
            bitmap
                .save_png(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !json {
                println!("✓ Rendered page {} → {}", report.page, path.display());
            }
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        for skipped in &report.skipped_patterns {
            println!("⚠ Skipped pattern '{}': {}", skipped.label, skipped.reason);
        }
        println!("Page {}: {} match(es)", report.page, report.match_count());
        for h in &report.highlights {
            println!(
                "  [{}] {:?} at ({:.1}, {:.1}, {:.1}, {:.1})",
                h.label, h.text, h.rect.x0, h.rect.y0, h.rect.x1, h.rect.y1
            );
        }
        Ok(())
    }

    /// Counts hits across the document.
    fn analyze(
        &self,
        input: &Path,
        patterns: &PatternSet,
        config: &RedactionConfig,
        json: bool,
    ) -> Result<()> {
        Self::require_input(input)?;
        if patterns.is_empty() {
            anyhow::bail!("Please add at least one pattern");
        }

        let report = self
            .service
            .analyze(input, patterns, config, &PassControl::detached())
            .with_context(|| "Hit analysis failed")?;

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        for skipped in &report.skipped_patterns {
            println!("⚠ Skipped pattern '{}': {}", skipped.label, skipped.reason);
        }
        for pattern in &report.patterns {
            println!("{}: {} hit(s)", pattern.label, pattern.total);
            for page in &pattern.pages {
                println!("  page {}: {}", page.page, page.hits);
            }
        }
        println!(
            "Total: {} hit(s) across {} page(s)",
            report.total_hits, report.pages_scanned
        );
        Ok(())
    }

    /// Extracts text from a PDF.
    fn extract(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        Self::require_input(input)?;

        let text = self
            .service
            .extract_text(input)
            .with_context(|| "Text extraction failed")?;

        if let Some(output_path) = output {
            std::fs::write(output_path, &text)
                .with_context(|| format!("Failed to write to {}", output_path.display()))?;
            println!(
                "✓ Extracted {} characters → {}",
                text.len(),
                output_path.display()
            );
        } else {
            println!("{}", text);
        }

        Ok(())
    }

    /// Masks entities in plain text.
    fn mask(&self, text: &str, detection: &DetectionConfig) -> Result<()> {
        let masked = self
            .service
            .mask_text(text, detection)
            .with_context(|| "Masking failed")?;
        print!("{}", masked);
        if !masked.ends_with('\n') {
            println!();
        }
        Ok(())
    }

    fn list_catalog(&self) {
        println!("Presets:");
        for preset in PRESETS {
            println!("  {:<28} {}", preset.name, preset.regex);
        }
        println!("\nMatch templates:");
        for template in MatchTemplate::ALL {
            let inputs = template.inputs();
            if inputs.is_empty() {
                println!("  {}", template.name());
            } else {
                println!("  {} ({})", template.name(), inputs.join(", "));
            }
        }
        println!("\nDetection models:");
        for kind in ModelKind::ALL {
            let info = kind.info();
            println!("  {:<26} {}", info.name, info.description);
            println!("  {:<26} labels: {}", "", info.labels.join(", "));
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn base_config(geometry: &GeometryArgs, detection: Option<DetectionConfig>) -> RedactionConfig {
    let config = geometry.apply(RedactionConfig::default());
    match detection {
        Some(d) => config.with_detection(d),
        None => config,
    }
}

fn read_mask_input(input: Option<&Path>, text: Option<&str>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text.to_string());
    }
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let handler = RedactionHandler::new(cli.verbose);

    match &cli.command {
        Commands::Redact {
            input,
            output,
            patterns,
            detection,
            geometry,
            fill,
            no_compact,
            json,
        } => {
            let set = patterns.build()?;
            let config = base_config(geometry, detection.build())
                .with_fill(*fill)
                .with_compact_output(!no_compact);
            handler.redact(input, output, &set, &config, *json)?;
        }
        Commands::Preview {
            input,
            page,
            patterns,
            detection,
            geometry,
            render,
            zoom,
            json,
        } => {
            let set = patterns.build()?;
            let config = base_config(geometry, detection.build());
            let render = render.as_deref().map(|path| (path, *zoom));
            handler.preview(input, *page, &set, &config, render, *json)?;
        }
        Commands::Analyze {
            input,
            patterns,
            geometry,
            json,
        } => {
            let set = patterns.build()?;
            let config = base_config(geometry, None);
            handler.analyze(input, &set, &config, *json)?;
        }
        Commands::Extract { input, output } => {
            handler.extract(input, output.as_deref())?;
        }
        Commands::Mask {
            input,
            text,
            model,
            threshold,
            labels,
            style,
        } => {
            let detection = DetectionConfig::new(*model)
                .with_threshold(*threshold)
                .with_labels(labels.iter().cloned().collect::<BTreeSet<_>>())
                .with_masking(*style);
            let text = read_mask_input(input.as_deref(), text.as_deref())?;
            handler.mask(&text, &detection)?;
        }
        Commands::Presets => handler.list_catalog(),
    }

    Ok(())
}
