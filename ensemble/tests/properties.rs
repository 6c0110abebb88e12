use proptest::prelude::*;
use vouch_ensemble::{
    EnsembleConfig, EnsembleEngine, ModelResult, ModelTable, Outcome, QualityContext,
};

fn model_result() -> impl Strategy<Value = ModelResult> {
    (0.0f64..=1.0, 0.01f64..=1.0, 0.01f64..=1.0, 0.0f64..=1.0, any::<bool>()).prop_map(
        |(normalized, weight, reliability, confidence, prediction)| ModelResult {
            model: "p".into(),
            raw_score: normalized,
            normalized_score: normalized,
            adaptive_threshold: 0.9,
            prediction,
            confidence,
            reliability,
            weight,
        },
    )
}

fn score(outcome: &Outcome) -> f64 {
    outcome.verdict().expect("verdict").ensemble_score
}

proptest! {
    #[test]
    fn scores_and_votes_stay_in_unit_interval(
        results in prop::collection::vec(model_result(), 4..12),
        quality in 0.0f64..=1.0,
        penalty in -0.1f64..=1.0,
    ) {
        let engine = EnsembleEngine::default();
        let ctx = QualityContext::new(quality, penalty);
        let outcome = engine.decide(results, Some(&ctx));
        let v = outcome.verdict().expect("four or more usable results");
        prop_assert!((0.0..=1.0).contains(&v.ensemble_score));
        prop_assert!((0.0..=1.0).contains(&v.vote_ratio));
        prop_assert!(v.estimated_far >= 0.001);
        prop_assert!(v.estimated_frr >= 0.01);
    }

    #[test]
    fn lowering_one_score_never_raises_ensemble(
        raw in prop::collection::vec(0.0f64..=1.0, 4..=8),
        idx in any::<prop::sample::Index>(),
        drop in 0.0f64..=1.0,
        quality in 0.0f64..=1.0,
    ) {
        let table = ModelTable::default();
        let engine = EnsembleEngine::new(table.ensemble.clone());
        let ctx = QualityContext::new(quality, 0.0);
        let evaluate = |scores: &[f64]| -> Vec<ModelResult> {
            table
                .names()
                .zip(scores)
                .map(|(name, &s)| ModelResult::evaluate(&table, name, s, Some(&ctx)).unwrap())
                .collect()
        };
        let before = score(&engine.decide(evaluate(&raw), Some(&ctx)));

        let mut lowered = raw;
        let i = idx.index(lowered.len());
        lowered[i] = (lowered[i] - drop).max(0.0);
        let results = evaluate(&lowered);
        prop_assert_eq!(
            results[i].prediction,
            results[i].normalized_score >= results[i].adaptive_threshold
        );
        let after = score(&engine.decide(results, Some(&ctx)));

        prop_assert!(after <= before + 1e-12, "before {before}, after {after}");
    }

    #[test]
    fn exception_never_fires_below_five_models(
        results in prop::collection::vec(model_result(), 4..5),
    ) {
        let engine = EnsembleEngine::default();
        let mut unanimous = results;
        for r in &mut unanimous {
            r.normalized_score = 1.0;
            r.prediction = true;
            r.reliability = 0.99;
        }
        let outcome = engine.decide(unanimous, None);
        prop_assert!(!outcome.verdict().unwrap().high_confidence_exception);
    }

    #[test]
    fn below_minimum_is_never_different(
        results in prop::collection::vec(model_result(), 0..4),
    ) {
        let engine = EnsembleEngine::default();
        let outcome = engine.decide(results, None);
        let is_insufficient = matches!(outcome, Outcome::InsufficientModels { .. });
        prop_assert!(is_insufficient);
    }

    #[test]
    fn decisions_are_deterministic(
        results in prop::collection::vec(model_result(), 4..10),
        quality in 0.0f64..=1.0,
    ) {
        let engine = EnsembleEngine::default();
        let ctx = QualityContext::new(quality, 0.0);
        let a = engine.decide(results.clone(), Some(&ctx));
        let b = engine.decide(results, Some(&ctx));
        prop_assert_eq!(a, b);
    }
}

#[test]
fn raised_minimum_from_config() {
    let table = ModelTable::from_yaml("ensemble:\n  minimum_models: 6\n").unwrap();
    let engine = EnsembleEngine::new(table.ensemble.clone());
    let results: Vec<ModelResult> = table
        .names()
        .take(5)
        .map(|name| ModelResult::evaluate(&table, name, 1.0, None).unwrap())
        .collect();
    assert_eq!(
        engine.decide(results, None),
        Outcome::InsufficientModels {
            valid: 5,
            required: 6
        }
    );
}

#[test]
fn evaluated_identical_scores_accept() {
    let table = ModelTable::default();
    let engine = EnsembleEngine::new(EnsembleConfig::default());
    let ctx = QualityContext::new(0.7, 0.0);
    let results: Vec<ModelResult> = table
        .names()
        .map(|name| ModelResult::evaluate(&table, name, 1.0, Some(&ctx)).unwrap())
        .collect();
    let outcome = engine.decide(results, Some(&ctx));
    assert!(outcome.is_verified());
}
