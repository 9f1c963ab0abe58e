use std::time::Instant;

use hashbrown::HashMap;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::io::EntityId;
use crate::knn::similarity::SimilarityMatrix;
use crate::knn::{top_k_neighbors, Neighbor};

/// The `k` most similar partners of `entity`, best first, ties by ascending id.
///
/// An entity without related entities has no neighbors; this is reported at warn level and
/// yields an empty list.
pub fn find_neighbors(matrix: &SimilarityMatrix, entity: EntityId, k: usize) -> Vec<Neighbor> {
    match matrix.related(entity) {
        Some(related) => select(related, entity, k),
        None => {
            warn!(entity, subject = ?matrix.subject(), "entity has no related entities");
            Vec::new()
        }
    }
}

fn select(related: &HashMap<EntityId, f64>, entity: EntityId, k: usize) -> Vec<Neighbor> {
    if k > related.len() {
        debug!(entity, k, qty_related = related.len(), "fewer related entities than k");
    }
    top_k_neighbors(
        related
            .iter()
            .map(|(partner, score)| Neighbor::new(*partner, *score)),
        k,
    )
}

/// Precomputed top-k neighbor lists for every entity of a similarity matrix.
pub struct NeighborTable {
    k: usize,
    neighbors: HashMap<EntityId, Vec<Neighbor>>,
}

impl NeighborTable {
    pub fn precompute(matrix: &SimilarityMatrix, k: usize) -> Self {
        let start_time = Instant::now();
        let entities: Vec<EntityId> = matrix.entities().collect();

        let neighbors: HashMap<EntityId, Vec<Neighbor>> = entities
            .par_iter()
            .map(|&entity| {
                let closest = match matrix.related(entity) {
                    Some(related) => select(related, entity, k),
                    None => {
                        debug!(entity, "entity has no related entities");
                        Vec::new()
                    }
                };
                (entity, closest)
            })
            .collect();

        let qty_without_neighbors = neighbors.values().filter(|list| list.is_empty()).count();
        if qty_without_neighbors > 0 {
            warn!(
                qty_without_neighbors,
                subject = ?matrix.subject(),
                "entities have no related entities and thus no neighbors"
            );
        }
        info!(
            qty_entities = neighbors.len(),
            k,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "precomputed neighbor table"
        );

        NeighborTable { k, neighbors }
    }

    /// Neighbors of `entity`, an empty slice for entities the table does not know.
    pub fn neighbors(&self, entity: EntityId) -> &[Neighbor] {
        self.neighbors
            .get(&entity)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    pub fn k(&self) -> usize {
        self.k
    }
}
