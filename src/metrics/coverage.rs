use hashbrown::HashSet;

use crate::error::{CfError, Result};
use crate::io::{Interactions, ItemId};
use crate::metrics::UserMetric;

pub struct Coverage {
    unique_training_items: usize,
    recommended_items: HashSet<ItemId>,
    length: usize,
}

impl Coverage {
    pub fn new(train: &Interactions, length: usize) -> Coverage {
        let distinct_item_ids: HashSet<ItemId> = train.values().flatten().copied().collect();
        Coverage {
            unique_training_items: distinct_item_ids.len(),
            recommended_items: HashSet::new(),
            length,
        }
    }
}

impl UserMetric for Coverage {
    fn add(&mut self, recommendations: &[ItemId], _test_items: &HashSet<ItemId>) {
        self.recommended_items.extend(recommendations.iter().copied());
    }

    fn result(&self) -> Result<f64> {
        if self.unique_training_items > 0 {
            Ok(self.recommended_items.len() as f64 / self.unique_training_items as f64)
        } else {
            Err(CfError::UndefinedMetric {
                metric: self.get_name(),
                reason: "the training set contains no items",
            })
        }
    }

    fn get_name(&self) -> String {
        format!("Coverage@{}", self.length)
    }
}
