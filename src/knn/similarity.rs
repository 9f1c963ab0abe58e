use std::time::{Duration, Instant};

use hashbrown::HashMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{CfError, Result};
use crate::io::{EntityId, Interactions};
use crate::knn::inverted_index::{InvertedIndex, SimilaritySubject};

const DEFAULT_CHUNK_SIZE: usize = 1024;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Number of groups a single worker folds into its own builder.
    pub chunk_size: usize,
    /// Abort the co-occurrence pass once this much time has passed.
    pub deadline: Option<Duration>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            deadline: None,
        }
    }
}

/// Inverse-frequency damping for a pairing observed in a group of `group_size` members.
fn damping(group_size: usize) -> f64 {
    1.0 / (1.0 + group_size as f64).ln()
}

/// Accumulates `C` and `N` over a sequence of co-occurrence groups.
#[derive(Default)]
pub struct CooccurrenceBuilder {
    cooccurrences: HashMap<EntityId, HashMap<EntityId, f64>>,
    popularity: HashMap<EntityId, u32>,
}

impl CooccurrenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one group of distinct entities that co-occur through a common pivot.
    pub fn add_group(&mut self, members: &[EntityId]) {
        for member in members {
            *self.popularity.entry(*member).or_insert(0) += 1;
        }
        if members.len() < 2 {
            return;
        }
        let weight = damping(members.len());
        for (position, &left) in members.iter().enumerate() {
            for &right in &members[position + 1..] {
                *self.row_mut(left).entry(right).or_insert(0.0) += weight;
                *self.row_mut(right).entry(left).or_insert(0.0) += weight;
            }
        }
    }

    fn row_mut(&mut self, entity: EntityId) -> &mut HashMap<EntityId, f64> {
        self.cooccurrences.entry(entity).or_default()
    }

    /// Folds a builder over later groups into this one.
    pub fn merge(&mut self, other: CooccurrenceBuilder) {
        for (entity, count) in other.popularity {
            *self.popularity.entry(entity).or_insert(0) += count;
        }
        for (entity, other_row) in other.cooccurrences {
            let row = self.row_mut(entity);
            for (partner, value) in other_row {
                *row.entry(partner).or_insert(0.0) += value;
            }
        }
    }

    pub fn finish(self) -> CooccurrenceCounts {
        CooccurrenceCounts {
            cooccurrences: self.cooccurrences,
            popularity: self.popularity,
        }
    }
}

/// The frozen output of a co-occurrence pass.
pub struct CooccurrenceCounts {
    cooccurrences: HashMap<EntityId, HashMap<EntityId, f64>>,
    popularity: HashMap<EntityId, u32>,
}

impl CooccurrenceCounts {
    /// Runs the co-occurrence pass over `index` in parallel chunks.
    ///
    /// Partial builders are merged in chunk order, so the result does not depend on the
    /// number of threads or on scheduling.
    pub fn from_index(index: &InvertedIndex, options: &BuildOptions) -> Result<Self> {
        Self::from_index_since(index, options, Instant::now())
    }

    /// The deadline is measured from `start_time` and checked before every group.
    fn from_index_since(
        index: &InvertedIndex,
        options: &BuildOptions,
        start_time: Instant,
    ) -> Result<Self> {
        let chunk_size = options.chunk_size.max(1);

        let partials: Vec<CooccurrenceBuilder> = index
            .groups()
            .par_chunks(chunk_size)
            .map(|groups| {
                let mut builder = CooccurrenceBuilder::new();
                for group in groups {
                    check_deadline(start_time, options.deadline)?;
                    builder.add_group(group);
                }
                Ok(builder)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut partials = partials.into_iter();
        let mut builder = partials.next().unwrap_or_default();
        for partial in partials {
            builder.merge(partial);
        }

        debug!(
            subject = ?index.subject(),
            qty_groups = index.len(),
            chunk_size,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "co-occurrence pass done"
        );
        Ok(builder.finish())
    }

    #[cfg(test)]
    fn cooccurrence(&self, left: EntityId, right: EntityId) -> Option<f64> {
        self.cooccurrences.get(&left)?.get(&right).copied()
    }

    pub fn popularity(&self, entity: EntityId) -> u32 {
        self.popularity.get(&entity).copied().unwrap_or(0)
    }
}

fn check_deadline(start_time: Instant, deadline: Option<Duration>) -> Result<()> {
    match deadline {
        Some(limit) if start_time.elapsed() > limit => Err(CfError::DeadlineExceeded {
            elapsed: start_time.elapsed(),
        }),
        _ => Ok(()),
    }
}

/// Sparse, popularity-normalised similarity `W[a][b] = C[a][b] / sqrt(N[a] * N[b])`.
///
/// Only co-occurring pairs are stored. The keys of a row are exactly `related[a]`.
pub struct SimilarityMatrix {
    subject: SimilaritySubject,
    rows: HashMap<EntityId, HashMap<EntityId, f64>>,
    popularity: HashMap<EntityId, u32>,
}

impl SimilarityMatrix {
    /// Builds the inverted index and the similarity matrix for `subject` from `train`.
    pub fn build(
        train: &Interactions,
        subject: SimilaritySubject,
        options: &BuildOptions,
    ) -> Result<Self> {
        let start_time = Instant::now();
        let index = InvertedIndex::new(train, subject);
        let counts = CooccurrenceCounts::from_index(&index, options)?;
        let matrix = SimilarityMatrix::from_counts(subject, counts);
        info!(
            ?subject,
            qty_groups = index.len(),
            qty_entities = matrix.qty_entities(),
            qty_pairs = matrix.qty_pairs(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "built similarity matrix"
        );
        Ok(matrix)
    }

    pub fn from_counts(subject: SimilaritySubject, counts: CooccurrenceCounts) -> Self {
        let CooccurrenceCounts {
            cooccurrences,
            popularity,
        } = counts;

        // Every entity with a row appeared in at least one group, so N is positive here.
        let rows = cooccurrences
            .into_par_iter()
            .map(|(entity, row)| {
                let entity_popularity = popularity[&entity] as f64;
                let similarities = row
                    .into_iter()
                    .map(|(partner, cooccurrence)| {
                        let partner_popularity = popularity[&partner] as f64;
                        let similarity =
                            cooccurrence / (entity_popularity * partner_popularity).sqrt();
                        (partner, similarity)
                    })
                    .collect::<HashMap<EntityId, f64>>();
                (entity, similarities)
            })
            .collect();

        SimilarityMatrix {
            subject,
            rows,
            popularity,
        }
    }

    pub fn subject(&self) -> SimilaritySubject {
        self.subject
    }

    /// `W[left][right]`, `None` when the pair never co-occurred.
    pub fn similarity(&self, left: EntityId, right: EntityId) -> Option<f64> {
        self.rows.get(&left)?.get(&right).copied()
    }

    /// The row of `entity`, `None` when it has no related entities.
    pub fn related(&self, entity: EntityId) -> Option<&HashMap<EntityId, f64>> {
        self.rows.get(&entity).filter(|row| !row.is_empty())
    }

    /// Number of groups `entity` took part in.
    pub fn popularity(&self, entity: EntityId) -> u32 {
        self.popularity.get(&entity).copied().unwrap_or(0)
    }

    /// All entities seen during the build, including those without related entities.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.popularity.keys().copied()
    }

    pub fn qty_entities(&self) -> usize {
        self.popularity.len()
    }

    pub fn qty_pairs(&self) -> usize {
        self.rows.values().map(|row| row.len()).sum()
    }
}
