use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;
use tracing::info;

use tandem::config::AppConfig;
use tandem::dataframeutils::determine_interaction_statistics;
use tandem::evaluation::evaluate_with_progress;
use tandem::io::{self, RecommendationRecord};
use tandem::knn::{Model, Recommender};
use tandem::logging;
use tandem::split::split_data;
use tandem::stopwatch::Stopwatch;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_default();
    let config = AppConfig::new(&config_path).context("invalid configuration")?;
    logging::init(&config.log.level);

    ThreadPoolBuilder::new()
        .num_threads(config.runtime.num_workers)
        .build_global()
        .context("could not configure worker pool")?;

    let interactions =
        io::read_interactions(&config.data.interactions_path, config.data.delimiter)
            .with_context(|| format!("reading {}", config.data.interactions_path))?;
    determine_interaction_statistics(&config.data.interactions_path, &interactions);

    let (train, test) = split_data(
        &interactions,
        config.split.ratio_m,
        config.split.held_out_k,
        config.split.seed,
    )?;
    drop(interactions);

    let stopwatch = Stopwatch::new();
    let model = Model::train(
        config.model.algorithm,
        &train,
        config.model.neighborhood_size_k,
        &config.build.options(),
    )?;
    info!(
        model = %model.get_name(),
        elapsed_ms = stopwatch.elapsed_millis(),
        "model trained"
    );

    let progress = ProgressBar::new(train.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] {bar:40} {pos}/{len} users"),
    );
    progress.set_message("ranking");
    let evaluation = evaluate_with_progress(
        &model,
        &train,
        &test,
        config.model.num_items_to_recommend,
        &progress,
    )?;

    if let Some(out_path) = &config.data.recommendations_out_path {
        let records = evaluation
            .recommendations
            .iter()
            .flat_map(|(user_id, scored_items)| {
                scored_items
                    .iter()
                    .enumerate()
                    .map(move |(rank, scored)| RecommendationRecord {
                        user_id: *user_id,
                        rank: rank + 1,
                        item_id: scored.id,
                        score: scored.score,
                    })
            });
        io::write_recommendations(out_path, records)
            .with_context(|| format!("writing {}", out_path))?;
    }

    let result = &evaluation.result;
    println!("===============================================================");
    println!("===               EVALUATING {:<30}====", model.get_name());
    println!("===============================================================");
    println!("{}", evaluation.metric_names);
    println!("{}", result.to_csv_line());
    println!("Qty evaluated users: {}", result.qty_users);
    println!("Qty recommendations: {}", result.qty_recommendations);
    println!("Recommendation latency");
    for (label, q) in [("p90", 0.90), ("p95", 0.95), ("p99.5", 0.995)] {
        if let Some(micros) = evaluation.latencies.percentile_in_micros(q) {
            println!("{} (microseconds): {:.1}", label, micros);
        }
    }
    Ok(())
}
