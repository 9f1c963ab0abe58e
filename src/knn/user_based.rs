use hashbrown::HashMap;
use tracing::debug;

use crate::error::Result;
use crate::io::{Interactions, ItemId, UserId};
use crate::knn::inverted_index::SimilaritySubject;
use crate::knn::neighbors::find_neighbors;
use crate::knn::similarity::{BuildOptions, SimilarityMatrix};
use crate::knn::{top_n, ItemScore, Recommender};

/// User-to-user similarities; neighbors are selected per request.
pub struct UserBasedIndex {
    similarities: SimilarityMatrix,
    neighborhood_size_k: usize,
}

impl UserBasedIndex {
    pub fn new(
        train: &Interactions,
        neighborhood_size_k: usize,
        options: &BuildOptions,
    ) -> Result<Self> {
        let similarities = SimilarityMatrix::build(train, SimilaritySubject::Users, options)?;
        Ok(Self::from_matrix(similarities, neighborhood_size_k))
    }

    pub fn from_matrix(similarities: SimilarityMatrix, neighborhood_size_k: usize) -> Self {
        UserBasedIndex {
            similarities,
            neighborhood_size_k,
        }
    }

    pub fn similarities(&self) -> &SimilarityMatrix {
        &self.similarities
    }
}

impl Recommender for UserBasedIndex {
    fn recommend(&self, user: UserId, train: &Interactions, how_many: usize) -> Vec<ItemScore> {
        let user_items = match train.get(&user) {
            Some(items) if !items.is_empty() => items,
            _ => {
                debug!(user, "user has no training items");
                return Vec::new();
            }
        };

        let neighbors = find_neighbors(&self.similarities, user, self.neighborhood_size_k);

        let mut item_scores: HashMap<ItemId, f64> = HashMap::new();
        for neighbor in neighbors.iter() {
            let neighbor_items = match train.get(&neighbor.id) {
                Some(items) => items,
                None => continue,
            };
            for item_id in neighbor_items.iter() {
                if !user_items.contains(item_id) {
                    *item_scores.entry(*item_id).or_insert(0.0) += neighbor.score;
                }
            }
        }

        top_n(item_scores, how_many)
    }

    fn get_name(&self) -> String {
        format!("UserCF(k={})", self.neighborhood_size_k)
    }
}

#[cfg(test)]
mod user_based_test {
    use float_cmp::approx_eq;

    use super::*;
    use crate::io::group_by_user;

    fn build_index(data: &[(UserId, ItemId)], k: usize) -> (Interactions, UserBasedIndex) {
        let train = group_by_user(data);
        let index = UserBasedIndex::new(&train, k, &BuildOptions::default()).unwrap();
        (train, index)
    }

    #[test]
    fn should_recommend_items_of_similar_users() {
        let (train, index) = build_index(&[(1, 10), (1, 20), (2, 10), (2, 30)], 10);
        let recommendations = index.recommend(1, &train, 10);
        assert_eq!(1, recommendations.len());
        assert_eq!(30, recommendations[0].id);
        let expected = index.similarities().similarity(1, 2).unwrap();
        assert!(approx_eq!(f64, expected, recommendations[0].score, ulps = 2));
    }

    #[test]
    fn should_sum_weights_of_neighbors_holding_the_same_item() {
        #[rustfmt::skip]
        let data = [
            (1, 10), (1, 20),
            (2, 10), (2, 30),
            (3, 20), (3, 30), (3, 40),
        ];
        let (train, index) = build_index(&data, 10);
        let recommendations = index.recommend(1, &train, 10);
        let ids: Vec<ItemId> = recommendations.iter().map(|scored| scored.id).collect();
        assert_eq!(vec![30, 40], ids);

        let similarities = index.similarities();
        let w12 = similarities.similarity(1, 2).unwrap();
        let w13 = similarities.similarity(1, 3).unwrap();
        assert!(approx_eq!(f64, w12 + w13, recommendations[0].score, ulps = 4));
        assert!(approx_eq!(f64, w13, recommendations[1].score, ulps = 2));
    }

    #[test]
    fn should_limit_to_k_most_similar_users() {
        // user 2 shares two items with user 1, user 3 only one
        #[rustfmt::skip]
        let data = [
            (1, 10), (1, 20),
            (2, 10), (2, 20), (2, 30),
            (3, 10), (3, 40),
        ];
        let (train, index) = build_index(&data, 1);
        let ids: Vec<ItemId> = index
            .recommend(1, &train, 10)
            .iter()
            .map(|scored| scored.id)
            .collect();
        assert_eq!(vec![30], ids);
    }

    #[test]
    fn should_return_empty_list_without_related_users() {
        let (train, index) = build_index(&[(1, 10), (2, 20)], 5);
        assert!(index.recommend(1, &train, 10).is_empty());
        assert!(index.recommend(7, &train, 10).is_empty());
        assert_eq!("UserCF(k=5)", index.get_name());
    }
}
