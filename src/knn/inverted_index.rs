use hashbrown::HashMap;
use itertools::Itertools;

use crate::io::{EntityId, Interactions};

/// Which side of the interactions the similarity is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilaritySubject {
    /// Groups are users' item sets, similarity is between items.
    Items,
    /// Groups are items' user sets, similarity is between users.
    Users,
}

/// The co-occurrence groups derived from a training snapshot.
///
/// Every group holds the entities that co-occur through one pivot (a user for item
/// similarity, an item for user similarity). Groups are ordered by pivot id and members are
/// sorted, so any pass over them is deterministic.
pub struct InvertedIndex {
    subject: SimilaritySubject,
    groups: Vec<Vec<EntityId>>,
}

impl InvertedIndex {
    pub fn new(train: &Interactions, subject: SimilaritySubject) -> Self {
        let groups: Vec<Vec<EntityId>> = match subject {
            SimilaritySubject::Items => train
                .iter()
                .sorted_unstable_by_key(|(user_id, _)| **user_id)
                .map(|(_, item_ids)| item_ids.iter().copied().sorted_unstable().collect::<Vec<_>>())
                .collect(),
            SimilaritySubject::Users => {
                let mut item_to_users: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
                for (user_id, item_ids) in train.iter() {
                    for item_id in item_ids {
                        item_to_users.entry(*item_id).or_default().push(*user_id);
                    }
                }
                item_to_users
                    .into_iter()
                    .sorted_unstable_by_key(|(item_id, _)| *item_id)
                    .map(|(_, mut user_ids)| {
                        user_ids.sort_unstable();
                        user_ids
                    })
                    .collect()
            }
        };
        InvertedIndex { subject, groups }
    }

    pub fn subject(&self) -> SimilaritySubject {
        self.subject
    }

    pub fn groups(&self) -> &[Vec<EntityId>] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod inverted_index_test {
    use super::*;
    use crate::io::group_by_user;

    #[test]
    fn should_use_user_item_sets_as_groups_for_item_similarity() {
        let train = group_by_user(&[(2, 30), (1, 20), (1, 10), (2, 10)]);
        let index = InvertedIndex::new(&train, SimilaritySubject::Items);
        assert_eq!(&[vec![10, 20], vec![10, 30]], index.groups());
    }

    #[test]
    fn should_invert_to_item_user_sets_for_user_similarity() {
        let train = group_by_user(&[(2, 30), (1, 20), (1, 10), (2, 10)]);
        let index = InvertedIndex::new(&train, SimilaritySubject::Users);
        assert_eq!(SimilaritySubject::Users, index.subject());
        assert_eq!(&[vec![1, 2], vec![1], vec![2]], index.groups());
    }

    #[test]
    fn should_handle_empty_train() {
        let index = InvertedIndex::new(&Interactions::new(), SimilaritySubject::Users);
        assert!(index.is_empty());
    }
}
