#[macro_use]
extern crate bencher;

use bencher::Bencher;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use tandem::io::{group_by_user, Interaction, Interactions};
use tandem::knn::item_based::ItemBasedIndex;
use tandem::knn::similarity::BuildOptions;
use tandem::knn::user_based::UserBasedIndex;
use tandem::knn::Recommender;

benchmark_group!(
    benches,
    bench_item_similarity_build,
    bench_user_similarity_build,
    bench_item_based_recommend
);
benchmark_main!(benches);

const NUM_USERS: u32 = 1_000;
const NUM_ITEMS: u32 = 1_700;
const INTERACTIONS_PER_USER: usize = 50;
const NEIGHBORHOOD_SIZE_K: usize = 20;
const HOW_MANY: usize = 10;

fn synthetic_train() -> Interactions {
    let mut rng = Pcg64::seed_from_u64(42);
    let interactions: Vec<Interaction> = (1..=NUM_USERS)
        .flat_map(|user_id| {
            (0..INTERACTIONS_PER_USER)
                .map(|_| {
                    // skew towards low ids to get a popularity long tail
                    let draw: f64 = rng.gen();
                    let item_id = 1 + (draw * draw * NUM_ITEMS as f64) as u32;
                    (user_id, item_id)
                })
                .collect::<Vec<_>>()
        })
        .collect();
    group_by_user(&interactions)
}

fn bench_item_similarity_build(bench: &mut Bencher) {
    let train = synthetic_train();
    bench.iter(|| {
        ItemBasedIndex::new(&train, NEIGHBORHOOD_SIZE_K, &BuildOptions::default()).unwrap()
    });
}

fn bench_user_similarity_build(bench: &mut Bencher) {
    let train = synthetic_train();
    bench.iter(|| {
        UserBasedIndex::new(&train, NEIGHBORHOOD_SIZE_K, &BuildOptions::default()).unwrap()
    });
}

fn bench_item_based_recommend(bench: &mut Bencher) {
    let train = synthetic_train();
    let index = ItemBasedIndex::new(&train, NEIGHBORHOOD_SIZE_K, &BuildOptions::default()).unwrap();
    let mut user_id = 0;
    bench.iter(|| {
        user_id = user_id % NUM_USERS + 1;
        index.recommend(user_id, &train, HOW_MANY)
    });
}
