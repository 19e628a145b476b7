//! Quality scoring for converted documents.
//!
//! The score is a coarse, additive measure of how substantive a capture is:
//! enough words, several paragraphs of reasonable length, some structure,
//! media and references. Callers use it to flag thin captures for review.

use crate::result::ContentStats;

/// Weights and tiers of the quality score.
///
/// Every component only ever adds to the score, so the score is
/// non-decreasing in each count. The total is capped at 100.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityWeights {
    /// `(min_words, points)` tiers; the highest satisfied tier applies.
    ///
    /// Default: `[(50, 10), (100, 20), (300, 30)]`
    pub word_tiers: Vec<(usize, u32)>,

    /// Minimum paragraphs for the paragraph bonus.
    ///
    /// Default: `3`
    pub min_paragraphs: usize,

    /// Points for having enough paragraphs.
    ///
    /// Default: `20`
    pub paragraph_points: u32,

    /// `(min_headings, points)` tiers; the highest satisfied tier applies.
    ///
    /// Default: `[(1, 10), (2, 15)]`
    pub heading_tiers: Vec<(usize, u32)>,

    /// Inclusive range of average words per paragraph earning a bonus.
    ///
    /// Averages above the upper bound keep the bonus, so that adding words
    /// never lowers the score.
    ///
    /// Default: `(20, 100)`
    pub paragraph_length_range: (usize, usize),

    /// Points for paragraphs of reasonable length.
    ///
    /// Default: `15`
    pub paragraph_length_points: u32,

    /// Points for at least one image.
    ///
    /// Default: `10`
    pub image_points: u32,

    /// Minimum links for the link bonus.
    ///
    /// Default: `2`
    pub min_links: usize,

    /// Points for enough links.
    ///
    /// Default: `10`
    pub link_points: u32,

    /// Reading speed used for the reading-time estimate.
    ///
    /// Default: `200`
    pub words_per_minute: usize,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            word_tiers: vec![(50, 10), (100, 20), (300, 30)],
            min_paragraphs: 3,
            paragraph_points: 20,
            heading_tiers: vec![(1, 10), (2, 15)],
            paragraph_length_range: (20, 100),
            paragraph_length_points: 15,
            image_points: 10,
            min_links: 2,
            link_points: 10,
            words_per_minute: 200,
        }
    }
}

/// Upper bound of the quality score.
pub const MAX_QUALITY_SCORE: u8 = 100;

/// Output of the scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QualityReport {
    /// Score in `0..=100`.
    pub quality_score: u8,
    /// Estimated minutes to read, rounded up.
    pub reading_time_minutes: usize,
}

/// Points of the highest tier whose threshold `value` reaches.
fn tier_points(tiers: &[(usize, u32)], value: usize) -> u32 {
    tiers
        .iter()
        .filter(|(min, _)| value >= *min)
        .map(|(_, points)| *points)
        .max()
        .unwrap_or(0)
}

/// Score a document from its word count and content stats.
///
/// # Examples
///
/// ```
/// use clipmark::scoring::{score, QualityWeights};
/// use clipmark::ContentStats;
///
/// let stats = ContentStats { paragraphs: 3, headings: 1, images: 0, links: 0 };
/// let report = score(120, &stats, &QualityWeights::default());
/// // 20 (words) + 20 (paragraphs) + 10 (heading) + 15 (40 words/paragraph)
/// assert_eq!(report.quality_score, 65);
/// assert_eq!(report.reading_time_minutes, 1);
/// ```
#[must_use]
pub fn score(word_count: usize, stats: &ContentStats, weights: &QualityWeights) -> QualityReport {
    let mut total: u32 = 0;

    total += tier_points(&weights.word_tiers, word_count);

    if stats.paragraphs >= weights.min_paragraphs {
        total += weights.paragraph_points;
    }

    total += tier_points(&weights.heading_tiers, stats.headings);

    if stats.paragraphs > 0 {
        let average = word_count / stats.paragraphs;
        let (low, _) = weights.paragraph_length_range;
        if average >= low {
            total += weights.paragraph_length_points;
        }
    }

    if stats.images >= 1 {
        total += weights.image_points;
    }

    if stats.links >= weights.min_links {
        total += weights.link_points;
    }

    QualityReport {
        quality_score: total.min(u32::from(MAX_QUALITY_SCORE)) as u8,
        reading_time_minutes: reading_time(word_count, weights.words_per_minute),
    }
}

/// Minutes to read `word_count` words, rounded up.
#[must_use]
pub fn reading_time(word_count: usize, words_per_minute: usize) -> usize {
    word_count.div_ceil(words_per_minute.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(paragraphs: usize, headings: usize, images: usize, links: usize) -> ContentStats {
        ContentStats {
            paragraphs,
            headings,
            images,
            links,
        }
    }

    #[test]
    fn empty_document_scores_zero() {
        let report = score(0, &ContentStats::default(), &QualityWeights::default());
        assert_eq!(report.quality_score, 0);
        assert_eq!(report.reading_time_minutes, 0);
    }

    #[test]
    fn word_tiers_are_exclusive() {
        let weights = QualityWeights::default();
        let none = ContentStats::default();
        assert_eq!(score(49, &none, &weights).quality_score, 0);
        assert_eq!(score(50, &none, &weights).quality_score, 10);
        assert_eq!(score(100, &none, &weights).quality_score, 20);
        assert_eq!(score(300, &none, &weights).quality_score, 30);
    }

    #[test]
    fn heading_tiers() {
        let weights = QualityWeights::default();
        assert_eq!(score(0, &stats(0, 1, 0, 0), &weights).quality_score, 10);
        assert_eq!(score(0, &stats(0, 5, 0, 0), &weights).quality_score, 15);
    }

    #[test]
    fn full_document_is_capped() {
        let report = score(600, &stats(10, 4, 3, 12), &QualityWeights::default());
        // 30 + 20 + 15 + 15 + 10 + 10
        assert_eq!(report.quality_score, 100);
        assert_eq!(report.reading_time_minutes, 3);
    }

    #[test]
    fn single_link_earns_nothing() {
        let weights = QualityWeights::default();
        assert_eq!(score(0, &stats(0, 0, 0, 1), &weights).quality_score, 0);
        assert_eq!(score(0, &stats(0, 0, 0, 2), &weights).quality_score, 10);
    }

    #[test]
    fn short_paragraphs_miss_length_bonus() {
        let weights = QualityWeights::default();
        // 60 words over 6 paragraphs: 10 each.
        assert_eq!(score(60, &stats(6, 0, 0, 0), &weights).quality_score, 30);
    }

    #[test]
    fn adding_words_never_lowers_score() {
        let weights = QualityWeights::default();
        let one_paragraph = stats(1, 0, 0, 0);
        let mut previous = 0;
        for words in 0..400 {
            let current = score(words, &one_paragraph, &weights).quality_score;
            assert!(current >= previous, "{words} words scored {current} < {previous}");
            previous = current;
        }
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time(1, 200), 1);
        assert_eq!(reading_time(200, 200), 1);
        assert_eq!(reading_time(201, 200), 2);
    }
}
