use hashbrown::HashSet;

use crate::error::{CfError, Result};
use crate::io::ItemId;
use crate::metrics::{count_hits, UserMetric};

pub struct Recall {
    qty_hits: usize,
    qty_test_items: usize,
    length: usize,
}

impl Recall {
    /// Returns a Recall evaluation metric.
    /// Recall is the share of all held-out interactions that were recommended, summed over
    /// users before dividing.
    ///
    /// # Arguments
    ///
    /// * `length` - the recommendation list length 'N' used for evaluation.
    ///
    pub fn new(length: usize) -> Recall {
        Recall {
            qty_hits: 0,
            qty_test_items: 0,
            length,
        }
    }
}

impl UserMetric for Recall {
    fn add(&mut self, recommendations: &[ItemId], test_items: &HashSet<ItemId>) {
        self.qty_hits += count_hits(recommendations, test_items);
        self.qty_test_items += test_items.len();
    }

    fn result(&self) -> Result<f64> {
        if self.qty_test_items > 0 {
            Ok(self.qty_hits as f64 / self.qty_test_items as f64)
        } else {
            Err(CfError::UndefinedMetric {
                metric: self.get_name(),
                reason: "no held-out test items for the evaluated users",
            })
        }
    }

    fn get_name(&self) -> String {
        format!("Recall@{}", self.length)
    }
}
