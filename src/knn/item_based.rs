use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use tracing::debug;

use crate::error::Result;
use crate::io::{Interactions, ItemId, UserId};
use crate::knn::inverted_index::SimilaritySubject;
use crate::knn::neighbors::NeighborTable;
use crate::knn::similarity::{BuildOptions, SimilarityMatrix};
use crate::knn::{top_n, ItemScore, Recommender};

/// Item-to-item similarities plus the precomputed top-k neighbors of every item.
pub struct ItemBasedIndex {
    similarities: SimilarityMatrix,
    neighbor_table: NeighborTable,
}

impl ItemBasedIndex {
    pub fn new(
        train: &Interactions,
        neighborhood_size_k: usize,
        options: &BuildOptions,
    ) -> Result<Self> {
        let similarities = SimilarityMatrix::build(train, SimilaritySubject::Items, options)?;
        Ok(Self::from_matrix(similarities, neighborhood_size_k))
    }

    pub fn from_matrix(similarities: SimilarityMatrix, neighborhood_size_k: usize) -> Self {
        let neighbor_table = NeighborTable::precompute(&similarities, neighborhood_size_k);
        ItemBasedIndex {
            similarities,
            neighbor_table,
        }
    }

    pub fn similarities(&self) -> &SimilarityMatrix {
        &self.similarities
    }

    /// Scores every unseen item related to the user's items.
    ///
    /// A candidate earns `W[candidate][item]` for each of its top-k neighbors the user
    /// already interacted with.
    fn score_candidates(&self, user_items: &HashSet<ItemId>) -> HashMap<ItemId, f64> {
        let candidates: Vec<ItemId> = user_items
            .iter()
            .filter_map(|item_id| self.similarities.related(*item_id))
            .flat_map(|related| related.keys().copied())
            .filter(|candidate| !user_items.contains(candidate))
            .sorted_unstable()
            .dedup()
            .collect();

        let mut item_scores: HashMap<ItemId, f64> = HashMap::with_capacity(candidates.len());
        for candidate in candidates {
            let score: f64 = self
                .neighbor_table
                .neighbors(candidate)
                .iter()
                .filter(|neighbor| user_items.contains(&neighbor.id))
                .map(|neighbor| neighbor.score)
                .sum();
            item_scores.insert(candidate, score);
        }
        item_scores
    }
}

impl Recommender for ItemBasedIndex {
    fn recommend(&self, user: UserId, train: &Interactions, how_many: usize) -> Vec<ItemScore> {
        let user_items = match train.get(&user) {
            Some(items) if !items.is_empty() => items,
            _ => {
                debug!(user, "user has no training items");
                return Vec::new();
            }
        };
        let item_scores = self.score_candidates(user_items);
        top_n(item_scores, how_many)
    }

    fn get_name(&self) -> String {
        format!("ItemCF(k={})", self.neighbor_table.k())
    }
}

#[cfg(test)]
mod item_based_test {
    use float_cmp::approx_eq;

    use super::*;
    use crate::io::group_by_user;

    fn build_index(data: &[(UserId, ItemId)], k: usize) -> (Interactions, ItemBasedIndex) {
        let train = group_by_user(data);
        let index = ItemBasedIndex::new(&train, k, &BuildOptions::default()).unwrap();
        (train, index)
    }

    #[test]
    fn should_recommend_items_similar_to_the_users_items() {
        let (train, index) = build_index(&[(1, 10), (1, 20), (2, 10), (2, 30)], 10);

        let recommendations = index.recommend(1, &train, 10);
        assert_eq!(1, recommendations.len());
        assert_eq!(30, recommendations[0].id);
        let expected = index.similarities().similarity(30, 10).unwrap();
        assert!(approx_eq!(f64, expected, recommendations[0].score, ulps = 2));
    }

    #[test]
    fn should_aggregate_over_several_known_items() {
        // item 40 is related to both 10 and 20, item 50 only to 10
        #[rustfmt::skip]
        let data = [
            (1, 10), (1, 20),
            (2, 10), (2, 40),
            (3, 20), (3, 40),
            (4, 10), (4, 50),
        ];
        let (train, index) = build_index(&data, 10);
        let recommendations = index.recommend(1, &train, 10);
        let ids: Vec<ItemId> = recommendations.iter().map(|scored| scored.id).collect();
        assert_eq!(vec![40, 50], ids);

        let similarities = index.similarities();
        let expected =
            similarities.similarity(40, 10).unwrap() + similarities.similarity(40, 20).unwrap();
        assert!(approx_eq!(f64, expected, recommendations[0].score, ulps = 4));
    }

    #[test]
    fn should_only_credit_top_k_neighbors_of_the_candidate() {
        // 30 is most similar to 40, so with k = 1 it earns nothing from the user's item 10
        #[rustfmt::skip]
        let data = [
            (1, 10),
            (2, 10), (2, 30),
            (3, 30), (3, 40),
            (4, 30), (4, 40),
        ];
        let (train, index) = build_index(&data, 1);
        assert!(index.recommend(1, &train, 10).is_empty());

        let (train, index) = build_index(&data, 2);
        let ids: Vec<ItemId> = index
            .recommend(1, &train, 10)
            .iter()
            .map(|scored| scored.id)
            .collect();
        assert_eq!(vec![30], ids);
    }

    #[test]
    fn should_never_recommend_seen_items() {
        let data = [(1, 10), (1, 20), (1, 30), (2, 10), (2, 20), (2, 30), (2, 40)];
        let (train, index) = build_index(&data, 10);
        let recommendations = index.recommend(1, &train, 10);
        let ids: Vec<ItemId> = recommendations.iter().map(|scored| scored.id).collect();
        assert_eq!(vec![40], ids);
        assert!(index.recommend(2, &train, 10).is_empty());
    }

    #[test]
    fn should_return_empty_list_for_unknown_or_empty_user() {
        let (mut train, index) = build_index(&[(1, 10), (1, 20)], 10);
        assert!(index.recommend(99, &train, 10).is_empty());
        train.insert(5, HashSet::new());
        assert!(index.recommend(5, &train, 10).is_empty());
    }

    #[test]
    fn should_return_fewer_than_n_when_few_items_are_eligible() {
        let (train, index) = build_index(&[(1, 10), (2, 10), (2, 20), (3, 10), (3, 30)], 10);
        let recommendations = index.recommend(1, &train, 100);
        assert_eq!(2, recommendations.len());
        assert_eq!("ItemCF(k=10)", index.get_name());
    }
}
