use hashbrown::HashSet;

use crate::error::{CfError, Result};
use crate::io::ItemId;
use crate::metrics::{count_hits, UserMetric};

pub struct Precision {
    qty_hits: usize,
    qty_users: usize,
    length: usize,
}

impl Precision {
    /// Returns a Precision evaluation metric.
    /// Precision divides the hits by the nominal recommendation budget `length` per user,
    /// also for users that received fewer than `length` recommendations.
    ///
    /// # Arguments
    ///
    /// * `length` - the recommendation list length 'N' used for evaluation.
    ///
    pub fn new(length: usize) -> Precision {
        Precision {
            qty_hits: 0,
            qty_users: 0,
            length,
        }
    }
}

impl UserMetric for Precision {
    fn add(&mut self, recommendations: &[ItemId], test_items: &HashSet<ItemId>) {
        self.qty_hits += count_hits(recommendations, test_items);
        self.qty_users += 1;
    }

    fn result(&self) -> Result<f64> {
        let budget = self.qty_users * self.length;
        if budget > 0 {
            Ok(self.qty_hits as f64 / budget as f64)
        } else {
            Err(CfError::UndefinedMetric {
                metric: self.get_name(),
                reason: "no users were evaluated",
            })
        }
    }

    fn get_name(&self) -> String {
        format!("Precision@{}", self.length)
    }
}

#[cfg(test)]
mod precision_test {
    use super::*;

    #[test]
    fn should_divide_by_nominal_budget() {
        let length = 20;
        let mut mymetric = Precision::new(length);
        let recommendations: Vec<ItemId> = vec![1, 2, 3, 4];
        let test_items: HashSet<ItemId> = vec![3, 55, 4].into_iter().collect();
        mymetric.add(&recommendations, &test_items);
        assert_eq!(2.0 / length as f64, mymetric.result().unwrap());
        assert_eq!("Precision@20", mymetric.get_name());
    }

    #[test]
    fn should_report_undefined_precision_without_users() {
        let mymetric = Precision::new(10);
        assert!(mymetric.result().is_err());
    }
}
