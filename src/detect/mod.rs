//! Entity detection.
//!
//! Detectors are black boxes behind [`EntityDetector`]. Which one runs is
//! chosen by [`ModelKind`] in the pass configuration. A detector that cannot
//! run says so with [`DetectorError::Unavailable`] rather than returning an
//! empty result, so callers can tell "nothing found" from "could not run".

pub mod builtin;
pub mod loader;
pub mod mask;

pub use builtin::RegexEntityDetector;
pub use loader::{load_detector, ModelLoad};
pub use mask::{mask_entities, MaskingStyle};

use crate::domain::PALETTE;
use crate::error::{RedactorError, RedactorResult};
use crate::geometry::Color;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// A classified span of text. `start` and `end` are character offsets into
/// the exact text passed to [`EntityDetector::detect`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    #[error("{model} model is unavailable: {reason}")]
    Unavailable { model: ModelKind, reason: String },

    #[error("{model} detection failed: {reason}")]
    Failed { model: ModelKind, reason: String },
}

/// Finds entities in text.
pub trait EntityDetector: Send + Sync {
    /// The model this detector implements.
    fn model(&self) -> ModelKind;

    /// Detects entities whose label is in `labels` (all labels when empty).
    fn detect(&self, text: &str, labels: &BTreeSet<String>) -> Result<Vec<Entity>, DetectorError>;
}

/// Detection model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Pattern-based detector compiled into this crate.
    Builtin,
    Spacy,
    Flair,
    Transformers,
}

/// Catalog entry describing a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub labels: &'static [&'static str],
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Builtin,
        ModelKind::Spacy,
        ModelKind::Flair,
        ModelKind::Transformers,
    ];

    pub fn info(self) -> ModelInfo {
        match self {
            ModelKind::Builtin => ModelInfo {
                name: "builtin/patterns",
                description: "Pattern-based PII detector",
                labels: builtin::LABELS,
            },
            ModelKind::Spacy => ModelInfo {
                name: "spaCy/en_core_web_lg",
                description: "General-purpose NER model",
                labels: &[
                    "PERSON", "ORG", "GPE", "LOC", "PRODUCT", "EVENT", "DATE", "TIME", "MONEY",
                ],
            },
            ModelKind::Flair => ModelInfo {
                name: "flair/ner-english-large",
                description: "High-accuracy NER model",
                labels: &["PER", "ORG", "LOC", "MISC"],
            },
            ModelKind::Transformers => ModelInfo {
                name: "HuggingFace/deid_roberta",
                description: "Medical data de-identification",
                labels: &["PATIENT", "DOCTOR", "HOSPITAL", "MEDICALRECORD", "DATE"],
            },
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ModelKind::ALL
            .into_iter()
            .find(|k| {
                let name = k.info().name.to_ascii_lowercase();
                lower == name || name.split('/').next() == Some(lower.as_str())
            })
            .or(match lower.as_str() {
                "huggingface" | "transformer" => Some(ModelKind::Transformers),
                _ => None,
            })
            .ok_or_else(|| format!("unknown model '{}'", s))
    }
}

/// A statistical model that is not linked into this build.
#[derive(Debug, Clone, Copy)]
pub struct ExternalModel {
    kind: ModelKind,
}

impl ExternalModel {
    pub fn new(kind: ModelKind) -> Self {
        Self { kind }
    }
}

impl EntityDetector for ExternalModel {
    fn model(&self) -> ModelKind {
        self.kind
    }

    fn detect(&self, _text: &str, _labels: &BTreeSet<String>) -> Result<Vec<Entity>, DetectorError> {
        Err(DetectorError::Unavailable {
            model: self.kind,
            reason: "model is not installed; register an implementation for it".to_string(),
        })
    }
}

/// The default detector for a model kind.
pub fn detector_for(kind: ModelKind) -> Arc<dyn EntityDetector> {
    match kind {
        ModelKind::Builtin => Arc::new(RegexEntityDetector::new()),
        other => Arc::new(ExternalModel::new(other)),
    }
}

/// Detection settings for one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub model: ModelKind,
    /// Minimum score an entity needs to be kept.
    pub threshold: f32,
    /// Labels to keep; empty keeps every label.
    pub labels: BTreeSet<String>,
    pub masking: MaskingStyle,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Builtin,
            threshold: 0.35,
            labels: BTreeSet::new(),
            masking: MaskingStyle::Redact,
        }
    }
}

impl DetectionConfig {
    pub fn new(model: ModelKind) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_masking(mut self, masking: MaskingStyle) -> Self {
        self.masking = masking;
        self
    }

    pub fn validate(&self) -> RedactorResult<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(RedactorError::invalid_input(
                "threshold",
                format!("{} is outside [0, 1]", self.threshold),
            ));
        }
        Ok(())
    }

    /// Keeps entities with an allowed label and a score at or above the
    /// threshold.
    pub fn filter(&self, entities: Vec<Entity>) -> Vec<Entity> {
        entities
            .into_iter()
            .filter(|e| self.labels.is_empty() || self.labels.contains(&e.label))
            .filter(|e| e.score >= self.threshold)
            .collect()
    }
}

/// Stable highlight color for an entity label.
pub fn entity_color(label: &str) -> Color {
    let hash = label
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    PALETTE[hash as usize % PALETTE.len()]
}
