use std::time::Instant;

use hashbrown::HashSet;
use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::info;

use crate::error::{require_positive, Result};
use crate::io::{sorted_users, Interactions, ItemId, UserId};
use crate::knn::{ItemScore, Recommender};
use crate::metrics::evaluation_reporter::{EvaluationReporter, EvaluationResult};
use crate::stopwatch::LatencyRecorder;

/// Recommendations for every evaluated user, in ascending user order.
pub struct Evaluation {
    /// Comma separated metric names, in the column order of `EvaluationResult::to_csv_line`.
    pub metric_names: String,
    pub result: EvaluationResult,
    pub recommendations: Vec<(UserId, Vec<ItemScore>)>,
    pub latencies: LatencyRecorder,
}

/// Evaluates `model` over all users in `train`.
///
/// The model is shared read-only by every worker, users are ranked in parallel and
/// the metrics are then accumulated in ascending user order.
pub fn evaluate<R: Recommender>(
    model: &R,
    train: &Interactions,
    test: &Interactions,
    how_many: usize,
) -> Result<Evaluation> {
    evaluate_with_progress(model, train, test, how_many, &ProgressBar::hidden())
}

pub fn evaluate_with_progress<R: Recommender>(
    model: &R,
    train: &Interactions,
    test: &Interactions,
    how_many: usize,
    progress: &ProgressBar,
) -> Result<Evaluation> {
    require_positive("num_items_to_recommend", how_many)?;
    let start_time = Instant::now();
    let users = sorted_users(train);
    progress.set_length(users.len() as u64);

    let ranked: Vec<(UserId, Vec<ItemScore>, f64)> = users
        .par_iter()
        .map(|&user| {
            let user_start = Instant::now();
            let recommendations = model.recommend(user, train, how_many);
            let duration_as_micros = user_start.elapsed().as_micros() as f64;
            progress.inc(1);
            (user, recommendations, duration_as_micros)
        })
        .collect();
    progress.finish_and_clear();

    let no_test_items = HashSet::new();
    let mut reporter = EvaluationReporter::new(train, how_many);
    let mut latencies = LatencyRecorder::with_capacity(ranked.len());
    let mut recommendations = Vec::with_capacity(ranked.len());
    for (user, scored_items, duration_as_micros) in ranked {
        let item_ids: Vec<ItemId> = scored_items.iter().map(|scored| scored.id).collect();
        let test_items = test.get(&user).unwrap_or(&no_test_items);
        reporter.add(&item_ids, test_items);
        latencies.record(duration_as_micros);
        recommendations.push((user, scored_items));
    }

    let result = reporter.result()?;
    info!(
        model = %model.get_name(),
        qty_users = result.qty_users,
        qty_recommendations = result.qty_recommendations,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "evaluation done"
    );
    Ok(Evaluation {
        metric_names: reporter.get_name(),
        result,
        recommendations,
        latencies,
    })
}

#[cfg(test)]
mod evaluation_test {
    use proptest::prelude::*;

    use super::*;
    use crate::io::{group_by_user, Interaction};
    use crate::knn::similarity::BuildOptions;
    use crate::knn::{Algorithm, Model};
    use crate::split::split_data;

    fn dataset() -> Vec<Interaction> {
        let mut data = Vec::new();
        for user_id in 1..=40_u32 {
            for item_id in 1..=30_u32 {
                if (user_id * 7 + item_id * 3) % 5 < 2 || (user_id + item_id) % 11 == 0 {
                    data.push((user_id, item_id));
                }
            }
        }
        data
    }

    #[test]
    fn should_evaluate_both_algorithms() {
        let (train, test) = split_data(&dataset(), 2, 1, 1).unwrap();
        for algorithm in [Algorithm::ItemBased, Algorithm::UserBased] {
            let model = Model::train(algorithm, &train, 10, &BuildOptions::default()).unwrap();
            let evaluation = evaluate(&model, &train, &test, 5).unwrap();
            let result = &evaluation.result;

            assert!((0.0..=1.0).contains(&result.recall));
            assert!((0.0..=1.0).contains(&result.precision));
            assert!(result.coverage > 0.0 && result.coverage <= 1.0);
            assert!(result.popularity > 0.0);
            assert_eq!(train.len(), result.qty_users);
            assert_eq!(train.len(), evaluation.recommendations.len());
            assert_eq!(train.len(), evaluation.latencies.len());
            assert_eq!("Recall@5,Precision@5,Coverage@5,Popularity@5", evaluation.metric_names);

            for (user, scored_items) in &evaluation.recommendations {
                assert!(scored_items.len() <= 5);
                for scored in scored_items {
                    assert!(!train[user].contains(&scored.id));
                }
            }
        }
    }

    #[test]
    fn should_evaluate_users_without_test_items() {
        let train = group_by_user(&[(1, 10), (1, 20), (2, 10), (2, 30)]);
        let test = group_by_user(&[(1, 30)]);
        let model =
            Model::train(Algorithm::ItemBased, &train, 5, &BuildOptions::default()).unwrap();
        let evaluation = evaluate(&model, &train, &test, 3).unwrap();
        assert!((1.0 - evaluation.result.recall).abs() < f64::EPSILON);
        assert!((1.0 / 6.0 - evaluation.result.precision).abs() < f64::EPSILON);
        assert!((2.0 / 3.0 - evaluation.result.coverage).abs() < f64::EPSILON);
    }

    #[test]
    fn should_surface_evaluation_without_any_recommendation() {
        let train = group_by_user(&[(1, 10), (2, 20)]);
        let test = group_by_user(&[(1, 20)]);
        let model =
            Model::train(Algorithm::UserBased, &train, 5, &BuildOptions::default()).unwrap();
        assert!(evaluate(&model, &train, &test, 3).is_err());
    }

    #[test]
    fn should_reject_zero_recommendation_size() {
        let train = group_by_user(&[(1, 10), (1, 20)]);
        let model =
            Model::train(Algorithm::ItemBased, &train, 5, &BuildOptions::default()).unwrap();
        assert!(evaluate(&model, &train, &Interactions::new(), 0).is_err());
        assert!(Model::train(Algorithm::ItemBased, &train, 0, &BuildOptions::default()).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn recommendations_are_deterministic_and_exclude_seen_items(
            data in prop::collection::vec((1_u32..25, 1_u32..35), 1..250),
            k in 1_usize..8,
            how_many in 1_usize..8,
            user_based in any::<bool>(),
        ) {
            let train = group_by_user(&data);
            let algorithm = if user_based { Algorithm::UserBased } else { Algorithm::ItemBased };
            let first = Model::train(algorithm, &train, k, &BuildOptions::default()).unwrap();
            let second = Model::train(algorithm, &train, k, &BuildOptions::default()).unwrap();

            for user in sorted_users(&train) {
                let recommendations = first.recommend(user, &train, how_many);
                prop_assert!(recommendations.len() <= how_many);
                for scored in &recommendations {
                    prop_assert!(!train[&user].contains(&scored.id));
                    prop_assert!(scored.score > 0.0);
                }
                prop_assert_eq!(recommendations, second.recommend(user, &train, how_many));
            }
        }
    }
}
