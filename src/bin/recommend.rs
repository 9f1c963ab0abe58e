use anyhow::{bail, Context};
use itertools::Itertools;

use tandem::config::AppConfig;
use tandem::io::{self, UserId};
use tandem::knn::{Model, Recommender};
use tandem::logging;
use tandem::split::split_data;
use tandem::stopwatch::Stopwatch;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let (config_path, user) = match (args.next(), args.next()) {
        (Some(config_path), Some(user)) => (config_path, user),
        _ => bail!("usage: recommend <config-file> <user-id>"),
    };
    let user: UserId = user
        .parse()
        .with_context(|| format!("user id must be a non-negative integer, got '{}'", user))?;

    let config = AppConfig::new(&config_path).context("invalid configuration")?;
    logging::init(&config.log.level);

    let interactions =
        io::read_interactions(&config.data.interactions_path, config.data.delimiter)
            .with_context(|| format!("reading {}", config.data.interactions_path))?;
    let (train, test) = split_data(
        &interactions,
        config.split.ratio_m,
        config.split.held_out_k,
        config.split.seed,
    )?;

    let user_items = match train.get(&user) {
        Some(items) => items,
        None => bail!("user {} has no interactions in the training split", user),
    };
    println!(
        "Training items of user {}: {}",
        user,
        user_items.iter().sorted().join(", ")
    );

    let mut stopwatch = Stopwatch::new();
    let model = Model::train(
        config.model.algorithm,
        &train,
        config.model.neighborhood_size_k,
        &config.build.options(),
    )?;
    println!("{} trained in {} ms", model.get_name(), stopwatch.elapsed_millis());

    stopwatch.start();
    let recommendations = model.recommend(user, &train, config.model.num_items_to_recommend);
    println!("Recommended in {} ms", stopwatch.elapsed_millis());

    let test_items = test.get(&user);
    for scored in recommendations.iter() {
        let hit = test_items.map_or(false, |items| items.contains(&scored.id));
        println!("{}\t{:.6}\t{}", scored.id, scored.score, hit);
    }
    Ok(())
}
