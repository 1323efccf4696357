//! Score band validation.
//!
//! Bands must each be well-formed, must not overlap, and together must cover
//! every integer in 0..=100.

use serde::Serialize;
use serde_json::json;

use crate::core::{Analyzer as AnalyzerTrait, Domain, IssueCode, SurveyContext, ValidationIssue};
use crate::model::{ScoreBand, ScoreBandView, SCORE_MAX, SCORE_MIN};

/// Band analyzer.
#[derive(Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }
}

impl AnalyzerTrait for Analyzer {
    type Output = Analysis;

    fn name(&self) -> &'static str {
        "bands"
    }

    fn description(&self) -> &'static str {
        "Check score bands for gaps, overlaps, and invalid ranges"
    }

    fn analyze(&self, ctx: &SurveyContext<'_>) -> Self::Output {
        match ctx.scoring() {
            Some(config) => check_bands(&config.score_ranges),
            None => Analysis::default(),
        }
    }
}

/// Run every band check over a band list.
pub fn check_bands(ranges: &[ScoreBandView]) -> Analysis {
    let mut analysis = Analysis::default();
    if ranges.is_empty() {
        analysis.issues.push(ValidationIssue::warning(
            Domain::Scoring,
            IssueCode::NoBandsDefined,
            "Scoring is enabled but no score bands are defined",
        ));
        return analysis;
    }

    let bands: Vec<&ScoreBand> = ranges.iter().map(|r| &r.band).collect();
    check_ranges(&bands, &mut analysis.issues);

    // Inverted bands cover nothing and were reported above.
    let usable: Vec<&ScoreBand> = bands.iter().copied().filter(|b| b.min <= b.max).collect();
    analysis.gaps = find_gaps(&usable);
    for gap in &analysis.gaps {
        analysis.issues.push(
            ValidationIssue::error(
                Domain::Scoring,
                IssueCode::BandGap,
                format!("Scores {}-{} are not covered by any band", gap.min, gap.max),
            )
            .with_details(json!({ "min": gap.min, "max": gap.max })),
        );
    }

    analysis.overlaps = find_overlaps(&usable);
    for overlap in &analysis.overlaps {
        analysis.issues.push(
            ValidationIssue::error(
                Domain::Scoring,
                IssueCode::BandOverlap,
                format!(
                    "Bands \"{}\" and \"{}\" overlap on scores {}-{}",
                    overlap.first_label, overlap.second_label, overlap.min, overlap.max
                ),
            )
            .with_band(overlap.first.clone())
            .with_details(json!({
                "bands": [overlap.first, overlap.second],
                "labels": [overlap.first_label, overlap.second_label],
                "min": overlap.min,
                "max": overlap.max,
            })),
        );
    }

    analysis
}

fn check_ranges(bands: &[&ScoreBand], issues: &mut Vec<ValidationIssue>) {
    for band in bands {
        if band.min >= band.max {
            issues.push(
                ValidationIssue::error(
                    Domain::Scoring,
                    IssueCode::InvalidBandRange,
                    format!(
                        "Band \"{}\" has min {} not below max {}",
                        band.label, band.min, band.max
                    ),
                )
                .with_band(band.id.clone())
                .with_details(json!({ "min": band.min, "max": band.max })),
            );
        }
        if band.min < SCORE_MIN {
            issues.push(
                ValidationIssue::error(
                    Domain::Scoring,
                    IssueCode::BandOutOfRange,
                    format!("Band \"{}\" starts below {}", band.label, SCORE_MIN),
                )
                .with_band(band.id.clone())
                .with_details(json!({ "min": band.min })),
            );
        }
        if band.max > SCORE_MAX {
            issues.push(
                ValidationIssue::warning(
                    Domain::Scoring,
                    IssueCode::BandOutOfRange,
                    format!("Band \"{}\" ends above {}", band.label, SCORE_MAX),
                )
                .with_band(band.id.clone())
                .with_details(json!({ "max": band.max })),
            );
        }
    }
}

/// Uncovered ranges in 0..=100, walking bands sorted by min.
pub fn find_gaps(bands: &[&ScoreBand]) -> Vec<ScoreRange> {
    let mut sorted: Vec<&ScoreBand> = bands.to_vec();
    sorted.sort_by(|a, b| (a.min, a.max, &a.id).cmp(&(b.min, b.max, &b.id)));

    let mut gaps = Vec::new();
    let mut cursor = i64::from(SCORE_MIN);
    let end = i64::from(SCORE_MAX);
    for band in sorted {
        let (min, max) = (i64::from(band.min), i64::from(band.max));
        if cursor > end {
            break;
        }
        if min > cursor {
            gaps.push(ScoreRange {
                min: cursor,
                max: (min - 1).min(end),
            });
        }
        cursor = cursor.max(max + 1);
    }
    if cursor <= end {
        gaps.push(ScoreRange { min: cursor, max: end });
    }
    gaps
}

/// Every pair of bands sharing at least one score, in input order.
pub fn find_overlaps(bands: &[&ScoreBand]) -> Vec<BandOverlap> {
    let mut overlaps = Vec::new();
    for (i, a) in bands.iter().enumerate() {
        for b in &bands[i + 1..] {
            if a.min <= b.max && b.min <= a.max {
                overlaps.push(BandOverlap {
                    first: a.id.clone(),
                    second: b.id.clone(),
                    first_label: a.label.clone(),
                    second_label: b.label.clone(),
                    min: i64::from(a.min.max(b.min)),
                    max: i64::from(a.max.min(b.max)),
                });
            }
        }
    }
    overlaps
}

/// Inclusive score range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandOverlap {
    pub first: String,
    pub second: String,
    pub first_label: String,
    pub second_label: String,
    pub min: i64,
    pub max: i64,
}

/// Result of band analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Analysis {
    pub gaps: Vec<ScoreRange>,
    pub overlaps: Vec<BandOverlap>,
    pub issues: Vec<ValidationIssue>,
}
