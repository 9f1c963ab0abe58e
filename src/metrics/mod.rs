use hashbrown::HashSet;

use crate::error::Result;
use crate::io::ItemId;

pub mod coverage;
pub mod evaluation_reporter;
pub mod popularity;
pub mod precision;
pub mod recall;

/// A metric accumulated over the users of one evaluation pass.
pub trait UserMetric {
    /// Adds one user's ranked recommendations and their held-out items.
    fn add(&mut self, recommendations: &[ItemId], test_items: &HashSet<ItemId>);
    /// Fails when the metric's denominator is zero.
    fn result(&self) -> Result<f64>;
    fn get_name(&self) -> String;
}

pub(crate) fn count_hits(recommendations: &[ItemId], test_items: &HashSet<ItemId>) -> usize {
    recommendations
        .iter()
        .filter(|item_id| test_items.contains(*item_id))
        .count()
}
