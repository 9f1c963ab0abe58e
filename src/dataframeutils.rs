use num_format::{Locale, ToFormattedString};
use rayon::prelude::*;
use tracing::info;

use crate::io::{EntityId, Interaction};

/// Cardinalities and id ranges observed in an interaction log.
///
/// The id ranges replace any fixed population size: downstream structures are sized from
/// what was actually seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionStats {
    pub descriptive_name: String,
    pub qty_records: usize,
    pub qty_unique_user_ids: usize,
    pub qty_unique_item_ids: usize,
    /// Inclusive `(min, max)` user id, `None` for an empty log.
    pub user_id_range: Option<(EntityId, EntityId)>,
    pub item_id_range: Option<(EntityId, EntityId)>,
}

pub fn determine_interaction_statistics(
    descriptive_name: &str,
    interactions: &[Interaction],
) -> InteractionStats {
    let qty_records = interactions.len();

    let mut user_ids: Vec<EntityId> = interactions
        .par_iter()
        .map(|(user_id, _item_id)| *user_id)
        .collect();
    user_ids.par_sort_unstable();
    user_ids.dedup();

    let mut item_ids: Vec<EntityId> = interactions
        .par_iter()
        .map(|(_user_id, item_id)| *item_id)
        .collect();
    item_ids.par_sort_unstable();
    item_ids.dedup();

    let stats = InteractionStats {
        descriptive_name: descriptive_name.to_string(),
        qty_records,
        qty_unique_user_ids: user_ids.len(),
        qty_unique_item_ids: item_ids.len(),
        user_id_range: id_range(&user_ids),
        item_id_range: id_range(&item_ids),
    };

    info!(
        name = %stats.descriptive_name,
        records = %stats.qty_records.to_formatted_string(&Locale::en),
        users = %stats.qty_unique_user_ids.to_formatted_string(&Locale::en),
        items = %stats.qty_unique_item_ids.to_formatted_string(&Locale::en),
        user_id_range = ?stats.user_id_range,
        item_id_range = ?stats.item_id_range,
        density = stats.density(),
        "loaded interactions"
    );
    stats
}

fn id_range(sorted_ids: &[EntityId]) -> Option<(EntityId, EntityId)> {
    Some((*sorted_ids.first()?, *sorted_ids.last()?))
}

impl InteractionStats {
    /// Share of the user x item grid that holds an interaction.
    pub fn density(&self) -> f64 {
        let cells = self.qty_unique_user_ids as f64 * self.qty_unique_item_ids as f64;
        if cells > 0.0 {
            self.qty_records as f64 / cells
        } else {
            0.0
        }
    }
}
