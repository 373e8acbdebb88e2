use serde::{Deserialize, Serialize};

use super::continuation::ContinuationToken;
use super::result::EnrichedResult;

/// Cached results for one platform combined with the caller's watermark.
///
/// Recomputed from both stores on every read, never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergedView {
    pub results: Vec<EnrichedResult>,
    pub continuation: Option<ContinuationToken>,
    pub has_more: bool,
    pub displayed_index: usize,
}

impl MergedView {
    /// Items past the watermark, in provider order.
    #[must_use]
    pub fn unseen(&self) -> &[EnrichedResult] {
        self.results
            .get(self.displayed_index..)
            .unwrap_or_default()
    }

    /// A watermark beyond the result set refers to a replaced snapshot and restarts at zero.
    #[must_use]
    pub const fn clamp_watermark(displayed_index: usize, result_count: usize) -> usize {
        if displayed_index > result_count {
            0
        } else {
            displayed_index
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Platform;

    fn view(n: usize, displayed_index: usize) -> MergedView {
        MergedView {
            results: (0..n)
                .map(|i| EnrichedResult::new(Platform::Youtube, format!("u{i}"), format!("t{i}")))
                .collect(),
            continuation: None,
            has_more: false,
            displayed_index,
        }
    }

    #[test]
    fn test_clamp_resets_overrun_to_zero() {
        assert_eq!(MergedView::clamp_watermark(50, 10), 0);
        assert_eq!(MergedView::clamp_watermark(10, 10), 10);
        assert_eq!(MergedView::clamp_watermark(3, 10), 3);
    }

    #[test]
    fn test_unseen_skips_watermark() {
        assert_eq!(view(5, 2).unseen().len(), 3);
        assert_eq!(view(5, 5).unseen().len(), 0);
        assert!(view(2, 9).unseen().is_empty());
    }
}
