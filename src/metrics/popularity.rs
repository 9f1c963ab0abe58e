use hashbrown::{HashMap, HashSet};

use crate::error::{CfError, Result};
use crate::io::{Interactions, ItemId};
use crate::metrics::UserMetric;

/// Average `ln(1 + popularity)` of recommended items, where popularity is the number of
/// training users of an item. Lower means more long-tail recommendations.
pub struct Popularity {
    sum_of_scores: f64,
    qty: usize,
    popularity_scores: HashMap<ItemId, u32>,
    length: usize,
}

impl Popularity {
    pub fn new(train: &Interactions, length: usize) -> Popularity {
        let mut popularity_scores = HashMap::new();
        for item_id in train.values().flatten() {
            *popularity_scores.entry(*item_id).or_insert(0) += 1;
        }

        Popularity {
            sum_of_scores: 0.0,
            qty: 0,
            popularity_scores,
            length,
        }
    }
}

impl UserMetric for Popularity {
    fn add(&mut self, recommendations: &[ItemId], _test_items: &HashSet<ItemId>) {
        for item_id in recommendations {
            let item_freq = self.popularity_scores.get(item_id).copied().unwrap_or(0);
            self.sum_of_scores += (1.0 + item_freq as f64).ln();
            self.qty += 1;
        }
    }

    fn result(&self) -> Result<f64> {
        if self.qty > 0 {
            Ok(self.sum_of_scores / self.qty as f64)
        } else {
            Err(CfError::UndefinedMetric {
                metric: self.get_name(),
                reason: "no recommendations were produced",
            })
        }
    }

    fn get_name(&self) -> String {
        format!("Popularity@{}", self.length)
    }
}
