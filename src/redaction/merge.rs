//! Candidate rectangle consolidation.

use super::config::RedactionConfig;
use crate::geometry::Rect;
use tracing::debug;

/// Turns candidate rectangles into the regions that are actually removed.
///
/// Noise-sized rectangles are dropped, the rest padded and sorted top to
/// bottom, left to right, then folded into the first region they touch. The
/// result covers every padded input. It is not a minimal cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedactionMerger {
    padding: f32,
    min_extent: f32,
}

impl Default for RedactionMerger {
    fn default() -> Self {
        Self {
            padding: 2.0,
            min_extent: 0.1,
        }
    }
}

impl RedactionMerger {
    pub fn new(padding: f32, min_extent: f32) -> Self {
        Self {
            padding,
            min_extent,
        }
    }

    pub fn from_config(config: &RedactionConfig) -> Self {
        Self::new(config.padding, config.min_extent)
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    /// Merges `candidates` into non-overlapping covering regions.
    pub fn merge<I>(&self, candidates: I) -> Vec<Rect>
    where
        I: IntoIterator<Item = Rect>,
    {
        let mut padded: Vec<Rect> = candidates
            .into_iter()
            .filter(|r| {
                let finite = [r.x0, r.y0, r.x1, r.y1].iter().all(|v| v.is_finite());
                finite && !r.is_degenerate(self.min_extent)
            })
            .map(|r| r.expand(self.padding))
            .collect();
        let candidates = padded.len();
        padded.sort_by(|a, b| a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0)));

        let mut regions: Vec<Rect> = Vec::new();
        for rect in padded {
            match regions.iter_mut().find(|region| region.intersects(&rect)) {
                Some(region) => *region = region.union(&rect),
                None => regions.push(rect),
            }
        }

        // A grown region can reach one created before it; fold until stable
        // so no two output regions overlap.
        let mut changed = true;
        while changed {
            changed = false;
            let mut i = 0;
            while i < regions.len() {
                let mut j = i + 1;
                while j < regions.len() {
                    if regions[i].intersects(&regions[j]) {
                        let absorbed = regions.swap_remove(j);
                        regions[i] = regions[i].union(&absorbed);
                        changed = true;
                    } else {
                        j += 1;
                    }
                }
                i += 1;
            }
        }

        debug!(candidates, regions = regions.len(), "merged redaction candidates");
        regions
    }
}
