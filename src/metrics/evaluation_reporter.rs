use hashbrown::HashSet;
use serde_derive::Serialize;

use crate::error::Result;
use crate::io::{Interactions, ItemId};
use crate::metrics::coverage::Coverage;
use crate::metrics::popularity::Popularity;
use crate::metrics::precision::Precision;
use crate::metrics::recall::Recall;
use crate::metrics::UserMetric;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub recall: f64,
    pub precision: f64,
    pub coverage: f64,
    pub popularity: f64,
    pub qty_users: usize,
    pub qty_recommendations: usize,
}

pub struct EvaluationReporter {
    recall: Recall,
    precision: Precision,
    coverage: Coverage,
    popularity: Popularity,
    qty_users: usize,
    qty_recommendations: usize,
}

impl EvaluationReporter {
    pub fn new(train: &Interactions, length: usize) -> EvaluationReporter {
        EvaluationReporter {
            recall: Recall::new(length),
            precision: Precision::new(length),
            coverage: Coverage::new(train, length),
            popularity: Popularity::new(train, length),
            qty_users: 0,
            qty_recommendations: 0,
        }
    }

    pub fn add(&mut self, recommendations: &[ItemId], test_items: &HashSet<ItemId>) {
        self.recall.add(recommendations, test_items);
        self.precision.add(recommendations, test_items);
        self.coverage.add(recommendations, test_items);
        self.popularity.add(recommendations, test_items);
        self.qty_users += 1;
        self.qty_recommendations += recommendations.len();
    }

    pub fn result(&self) -> Result<EvaluationResult> {
        Ok(EvaluationResult {
            recall: self.recall.result()?,
            precision: self.precision.result()?,
            coverage: self.coverage.result()?,
            popularity: self.popularity.result()?,
            qty_users: self.qty_users,
            qty_recommendations: self.qty_recommendations,
        })
    }

    pub fn get_name(&self) -> String {
        format!(
            "{},{},{},{}",
            self.recall.get_name(),
            self.precision.get_name(),
            self.coverage.get_name(),
            self.popularity.get_name()
        )
    }
}

impl EvaluationResult {
    pub fn to_csv_line(&self) -> String {
        format!(
            "{:.4},{:.4},{:.4},{:.4}",
            self.recall, self.precision, self.coverage, self.popularity
        )
    }
}
