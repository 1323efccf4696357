use proptest::prelude::*;

use surveyflow::analyzers::bands::check_bands;
use surveyflow::core::IssueCode;
use surveyflow::model::{
    AnswerSet, AnswerValue, LogicRule, Question, QuestionType, ScoreBand, ScoreBandView,
    ScoreConfig, ScoringCategory,
};
use surveyflow::score::normalize_score;
use surveyflow::{compute_score_trace, validate_survey};

fn linear(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| Question::new(format!("q{}", i + 1), i as i64, format!("Question {}", i + 1)))
        .collect()
}

/// Split 0..=100 at the given cut points into contiguous bands.
fn partition(cuts: &[i32]) -> Vec<ScoreBandView> {
    let mut bounds: Vec<i32> = cuts.iter().copied().filter(|c| *c > 0 && *c < 100).collect();
    bounds.sort_unstable();
    bounds.dedup();

    let mut bands = Vec::new();
    let mut start = 0;
    for (i, cut) in bounds.iter().enumerate() {
        // Keep min < max so ranges stay valid
        if *cut - 1 > start {
            bands.push(ScoreBand::new(format!("b{}", i), start, cut - 1, format!("B{}", i)).into());
            start = *cut;
        }
    }
    bands.push(ScoreBand::new("last", start, 100, "Last").into());
    bands
}

// ---------------------------------------------------------------------------
// Band properties
// ---------------------------------------------------------------------------

proptest! {
    /// Any contiguous, non-overlapping partition of 0..=100 is clean.
    #[test]
    fn complete_partition_has_no_gap_or_overlap(
        cuts in prop::collection::vec(1i32..100, 0..8),
        reverse in any::<bool>(),
    ) {
        let mut bands = partition(&cuts);
        if reverse {
            bands.reverse();
        }
        let result = check_bands(&bands);
        prop_assert!(result.gaps.is_empty(), "gaps: {:?}", result.gaps);
        prop_assert!(result.overlaps.is_empty(), "overlaps: {:?}", result.overlaps);
    }

    /// Removing one band from a partition always leaves exactly its range uncovered.
    #[test]
    fn dropping_a_band_reports_its_range(
        cuts in prop::collection::vec(1i32..100, 1..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut bands = partition(&cuts);
        prop_assume!(bands.len() > 1);
        let removed = bands.remove(pick.index(bands.len()));
        let result = check_bands(&bands);
        let gap_codes = result.issues.iter().filter(|i| i.code == IssueCode::BandGap).count();
        prop_assert_eq!(gap_codes, 1);
        prop_assert_eq!(result.gaps[0].min, i64::from(removed.band.min));
        prop_assert_eq!(result.gaps[0].max, i64::from(removed.band.max));
    }

    /// Every pair of bands sharing a score is reported, and no other pair.
    #[test]
    fn overlap_detection_matches_brute_force(
        raw in prop::collection::vec((0i32..=100, 0i32..=100), 1..6),
    ) {
        let bands: Vec<ScoreBandView> = raw
            .iter()
            .enumerate()
            .map(|(i, (a, b))| {
                ScoreBand::new(format!("b{}", i), *a.min(b), *a.max(b), format!("B{}", i)).into()
            })
            .collect();
        let mut expected = 0;
        for i in 0..bands.len() {
            for j in (i + 1)..bands.len() {
                let (a, b) = (&bands[i].band, &bands[j].band);
                if (0..=100).any(|s| a.contains(s) && b.contains(s)) {
                    expected += 1;
                }
            }
        }
        prop_assert_eq!(check_bands(&bands).overlaps.len(), expected);
    }
}

// ---------------------------------------------------------------------------
// Flow properties
// ---------------------------------------------------------------------------

proptest! {
    /// A survey with no logic rules has every question reachable.
    #[test]
    fn no_rules_means_all_reachable(n in 1usize..40) {
        let result = validate_survey(&linear(n), None);
        prop_assert_eq!(result.summary.flow.reachable_count, n);
        prop_assert_eq!(result.summary.flow.unreachable_count, 0);
        prop_assert!(result.issues.is_empty());
    }

    /// Validation output is identical across runs for arbitrary rule sets.
    #[test]
    fn validation_is_deterministic(
        n in 2usize..12,
        rules in prop::collection::vec((0usize..12, 0usize..14, 0u8..3, any::<bool>()), 0..10),
    ) {
        let mut questions = linear(n);
        for (i, (from, to, action, conditional)) in rules.iter().enumerate() {
            let from = from % n;
            let target = if *to >= n { "ghost".to_string() } else { format!("q{}", to + 1) };
            let condition = conditional.then(|| format!("answer(\"q{}\") == {}", from + 1, i));
            let rule = match action {
                0 => LogicRule::skip(format!("r{}", i), condition.as_deref(), &target),
                1 => LogicRule::show(format!("r{}", i), condition.as_deref(), &target),
                _ => LogicRule::end(format!("r{}", i), condition.as_deref()),
            };
            questions[from].logic_rules.push(rule);
        }

        let first = validate_survey(&questions, None);
        let second = validate_survey(&questions, None);
        prop_assert_eq!(&first.issues, &second.issues);
        prop_assert_eq!(first.is_valid, first.summary.error_count == 0);
        prop_assert_eq!(
            first.summary.flow.reachable_count + first.summary.flow.unreachable_count,
            n
        );
    }
}

// ---------------------------------------------------------------------------
// Score properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn normalized_score_is_bounded(raw in -1.0e6f64..1.0e6, max in -10.0f64..1.0e6) {
        let score = normalize_score(raw, max);
        prop_assert!(score <= 100);
        if max <= 0.0 {
            prop_assert_eq!(score, 0);
        }
    }

    /// Category scores stay within 0..=100 for any answers and weights.
    #[test]
    fn category_scores_are_bounded(
        weights in prop::collection::vec(0.0f64..20.0, 1..6),
        picks in prop::collection::vec(0usize..4, 1..6),
        reversed in any::<bool>(),
    ) {
        let mut questions = Vec::new();
        let mut answers = AnswerSet::new();
        for (i, weight) in weights.iter().enumerate() {
            let mut question = Question::new(format!("q{}", i), i as i64, "Pick")
                .with_type(QuestionType::MultipleChoice)
                .scorable(Some("eng"), *weight)
                .with_option_scores(&[("a", 0.0), ("b", 1.0), ("c", 3.0)]);
            if reversed {
                question = question.reversed();
            }
            questions.push(question);
            if let Some(pick) = picks.get(i) {
                let option = ["a", "b", "c", "unknown"][*pick];
                answers.insert(format!("q{}", i), AnswerValue::Text(option.to_string()));
            }
        }
        let config = ScoreConfig::enabled(
            vec![ScoringCategory::new("eng", "Engagement")],
            partition(&[40, 70]),
        );
        let trace = compute_score_trace(&questions, &config, &answers);
        let eng = &trace.categories[0];
        prop_assert!(eng.normalized_score <= 100);
        prop_assert!(eng.raw_score <= eng.max_possible_score + 1e-9);
        prop_assert!(eng.band.is_some());
    }
}
