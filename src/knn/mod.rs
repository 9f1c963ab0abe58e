use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::str::FromStr;

use dary_heap::OctonaryHeap;
use hashbrown::HashMap;

use crate::error::{require_positive, CfError, Result};
use crate::io::{EntityId, Interactions, ItemId, UserId};
use crate::knn::item_based::ItemBasedIndex;
use crate::knn::similarity::BuildOptions;
use crate::knn::user_based::UserBasedIndex;

pub mod inverted_index;
pub mod item_based;
pub mod neighbors;
pub mod similarity;
pub mod user_based;

/// A similarity partner of some entity. Ordered worst-first so that a `BinaryHeap` keeps
/// the weakest of the current top-k on top.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Neighbor {
    pub id: EntityId,
    pub score: f64,
}

impl Neighbor {
    pub fn new(id: EntityId, score: f64) -> Self {
        Neighbor { id, score }
    }
}

impl Eq for Neighbor {}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_order(self.score, self.id, other.score, other.id)
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ItemScore {
    pub id: ItemId,
    pub score: f64,
}

impl ItemScore {
    pub fn new(id: ItemId, score: f64) -> Self {
        ItemScore { id, score }
    }
}

impl Eq for ItemScore {}

impl Ord for ItemScore {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_order(self.score, self.id, other.score, other.id)
    }
}

impl PartialOrd for ItemScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reverse order by score, ties broken by ascending id. `Less` means "ranks higher".
fn rank_order(score: f64, id: u32, other_score: f64, other_id: u32) -> Ordering {
    match score.partial_cmp(&other_score) {
        Some(Ordering::Less) => Ordering::Greater,
        Some(Ordering::Greater) => Ordering::Less,
        _ => id.cmp(&other_id),
    }
}

/// Keeps the `k` best neighbors out of `candidates`, best first.
pub(crate) fn top_k_neighbors<I>(candidates: I, k: usize) -> Vec<Neighbor>
where
    I: IntoIterator<Item = Neighbor>,
{
    if k == 0 {
        return Vec::new();
    }
    let mut closest: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(k);
    for candidate in candidates {
        if closest.len() < k {
            closest.push(candidate);
        } else if let Some(mut weakest) = closest.peek_mut() {
            if candidate < *weakest {
                *weakest = candidate;
            }
        }
    }
    closest.into_sorted_vec()
}

/// Turns accumulated item scores into the final top-`how_many` list.
///
/// Only strictly positive scores are eligible; a short list is returned as is, never padded.
pub(crate) fn top_n(item_scores: HashMap<ItemId, f64>, how_many: usize) -> Vec<ItemScore> {
    if how_many == 0 {
        return Vec::new();
    }
    let mut top_items: OctonaryHeap<ItemScore> = OctonaryHeap::with_capacity(how_many);
    for (item_id, score) in item_scores.into_iter() {
        if score <= 0.0 {
            continue;
        }
        let scored_item = ItemScore::new(item_id, score);
        if top_items.len() < how_many {
            top_items.push(scored_item);
        } else if let Some(mut bottom) = top_items.peek_mut() {
            if scored_item < *bottom {
                *bottom = scored_item;
            }
        }
    }
    top_items.into_sorted_vec()
}

/// Ranks unseen items for a user against a prebuilt, read-only similarity structure.
pub trait Recommender: Send + Sync {
    /// Returns at most `how_many` items not in `train[user]`, best first.
    fn recommend(&self, user: UserId, train: &Interactions, how_many: usize) -> Vec<ItemScore>;

    fn get_name(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    ItemBased,
    UserBased,
}

impl FromStr for Algorithm {
    type Err = CfError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "item_based" | "itemcf" | "item" => Ok(Algorithm::ItemBased),
            "user_based" | "usercf" | "user" => Ok(Algorithm::UserBased),
            other => Err(CfError::Config(format!(
                "unknown algorithm '{}', expected item_based or user_based",
                other
            ))),
        }
    }
}

/// A trained model of either variant.
pub enum Model {
    ItemBased(ItemBasedIndex),
    UserBased(UserBasedIndex),
}

impl Model {
    /// Builds the similarity structures for `algorithm` once from `train`.
    pub fn train(
        algorithm: Algorithm,
        train: &Interactions,
        neighborhood_size_k: usize,
        options: &BuildOptions,
    ) -> Result<Self> {
        require_positive("neighborhood_size_k", neighborhood_size_k)?;
        let model = match algorithm {
            Algorithm::ItemBased => {
                Model::ItemBased(ItemBasedIndex::new(train, neighborhood_size_k, options)?)
            }
            Algorithm::UserBased => {
                Model::UserBased(UserBasedIndex::new(train, neighborhood_size_k, options)?)
            }
        };
        Ok(model)
    }
}

impl Recommender for Model {
    fn recommend(&self, user: UserId, train: &Interactions, how_many: usize) -> Vec<ItemScore> {
        match self {
            Model::ItemBased(index) => index.recommend(user, train, how_many),
            Model::UserBased(index) => index.recommend(user, train, how_many),
        }
    }

    fn get_name(&self) -> String {
        match self {
            Model::ItemBased(index) => index.get_name(),
            Model::UserBased(index) => index.get_name(),
        }
    }
}
