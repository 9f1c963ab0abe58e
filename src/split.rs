use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing::info;

use crate::error::{CfError, Result};
use crate::io::{Interaction, Interactions};

/// Partitions `interactions` into `(train, test)` with one seeded draw `r` in `[0, ratio_m)`
/// per record.
///
/// Records with `r == held_out_k` go to **train**, all others go to **test**. With the
/// default `ratio_m = 2` both sides receive half of the data on average; for larger
/// `ratio_m` the train side is the `1 / ratio_m` minority.
///
/// The same seed always yields the same split.
pub fn split_data(
    interactions: &[Interaction],
    ratio_m: u32,
    held_out_k: u32,
    seed: u64,
) -> Result<(Interactions, Interactions)> {
    if ratio_m == 0 {
        return Err(CfError::invalid("ratio_m", "must be a positive integer"));
    }
    if held_out_k >= ratio_m {
        return Err(CfError::invalid(
            "held_out_k",
            format!("must lie in [0, {}), got {}", ratio_m, held_out_k),
        ));
    }

    let mut rng = Pcg64::seed_from_u64(seed);
    let mut train = Interactions::new();
    let mut test = Interactions::new();

    for &(user_id, item_id) in interactions {
        let draw: u32 = rng.gen_range(0..ratio_m);
        let side = if draw == held_out_k { &mut train } else { &mut test };
        side.entry(user_id).or_default().insert(item_id);
    }

    // A duplicated record may have been drawn into both sides, train wins.
    for (user_id, train_items) in train.iter() {
        if let Some(test_items) = test.get_mut(user_id) {
            test_items.retain(|item_id| !train_items.contains(item_id));
        }
    }
    test.retain(|_, items| !items.is_empty());

    info!(
        train_users = train.len(),
        test_users = test.len(),
        ratio_m,
        held_out_k,
        seed,
        "split interactions"
    );
    Ok((train, test))
}
