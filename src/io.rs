use std::fs::File;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use serde_derive::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;

pub type UserId = u32;
pub type ItemId = u32;
/// Either a user or an item, depending on which side the similarity is computed for.
pub type EntityId = u32;

pub type Interaction = (UserId, ItemId);
pub type Interactions = HashMap<UserId, HashSet<ItemId>>;

/// Reads `(user, item)` pairs from a headerless delimited file.
///
/// Only the first two fields of a record are used, extra fields (ratings, timestamps) are
/// ignored. Ids start at 1; records with fewer than two fields, non-integer ids or a zero
/// id are skipped.
pub fn read_interactions<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Vec<Interaction>> {
    let reader = create_record_reader(path.as_ref(), delimiter)?;
    let (interactions, qty_skipped) = parse_records(reader)?;

    if qty_skipped > 0 {
        warn!(
            qty_skipped,
            path = %path.as_ref().display(),
            "skipped malformed interaction records"
        );
    }
    info!(
        qty_records = interactions.len(),
        path = %path.as_ref().display(),
        "read interactions"
    );
    Ok(interactions)
}

fn create_record_reader(path: &Path, delimiter: u8) -> Result<Reader<File>> {
    let reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;
    Ok(reader)
}

fn parse_records<R: std::io::Read>(mut reader: Reader<R>) -> Result<(Vec<Interaction>, usize)> {
    let mut interactions = Vec::new();
    let mut qty_skipped = 0_usize;
    for result in reader.records() {
        match result {
            Ok(record) => match parse_record(&record) {
                Some(interaction) => interactions.push(interaction),
                None => {
                    debug!(?record, "skipping malformed record");
                    qty_skipped += 1;
                }
            },
            // Broken UTF-8 and similar per-record failures are skipped, IO failures are not.
            Err(error) if error.is_io_error() => return Err(error.into()),
            Err(error) => {
                debug!(%error, "skipping unreadable record");
                qty_skipped += 1;
            }
        }
    }
    Ok((interactions, qty_skipped))
}

fn parse_record(record: &StringRecord) -> Option<Interaction> {
    let user_id = parse_id(record.get(0)?)?;
    let item_id = parse_id(record.get(1)?)?;
    Some((user_id, item_id))
}

fn parse_id(field: &str) -> Option<EntityId> {
    field.parse::<EntityId>().ok().filter(|id| *id > 0)
}

/// Groups raw pairs into one item set per user.
pub fn group_by_user(interactions: &[Interaction]) -> Interactions {
    interactions
        .iter()
        .copied()
        .into_group_map()
        .into_iter()
        .map(|(user_id, item_ids)| (user_id, item_ids.into_iter().collect::<HashSet<_>>()))
        .collect()
}

/// Returns the keys of `interactions` in ascending order.
pub fn sorted_users(interactions: &Interactions) -> Vec<UserId> {
    interactions.keys().copied().sorted_unstable().collect()
}

#[derive(Serialize, Debug)]
pub struct RecommendationRecord {
    pub user_id: UserId,
    pub rank: usize,
    pub item_id: ItemId,
    pub score: f64,
}

/// Writes ranked recommendations as `user_id,rank,item_id,score` rows.
pub fn write_recommendations<P: AsRef<Path>>(
    path: P,
    records: impl IntoIterator<Item = RecommendationRecord>,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    let mut qty_written = 0_usize;
    for record in records {
        writer.serialize(record)?;
        qty_written += 1;
    }
    writer.flush()?;
    info!(qty_written, path = %path.as_ref().display(), "wrote recommendations");
    Ok(())
}
