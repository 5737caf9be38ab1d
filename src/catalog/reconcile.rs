//! Merge a freshly delivered remote snapshot with the built-in defaults.
//!
//! Reconciliation is two-phase: the returned `records` are shown immediately (optimistic),
//! while `writes` are sent to the store. The next snapshot delivered by the store is the
//! source of truth and, once the writes landed, reconciles to zero further writes.

use uuid::Uuid;

use crate::dao::{
    defaults::{TRACKED_CORRECTIONS, TrackedField},
    models::{GamePatch, GameRecord},
};

/// Prefix of identifiers assigned locally before the store assigns real ones.
pub const TEMPORARY_ID_PREFIX: &str = "local-";

/// Write the store must receive to converge with the reconciled view.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogWrite {
    /// Seed a default record. The record's temporary id is not persisted.
    Add(GameRecord),
    /// Merge corrected fields into an existing record.
    Patch {
        /// Store-assigned id of the record to correct.
        id: String,
        /// Only the fields that differ from the tracked default.
        patch: GamePatch,
    },
}

/// Outcome of reconciling one snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation {
    /// Records to show now, corrections already applied.
    pub records: Vec<GameRecord>,
    /// Writes that bring the store in line with `records`.
    pub writes: Vec<CatalogWrite>,
}

fn temporary_id() -> String {
    format!("{TEMPORARY_ID_PREFIX}{}", Uuid::new_v4().simple())
}

/// Reconcile a remote snapshot (absent or empty means "nothing stored yet") with `defaults`.
pub fn reconcile(remote: Option<&[GameRecord]>, defaults: &[GameRecord]) -> Reconciliation {
    let remote = match remote {
        Some(records) if !records.is_empty() => records,
        _ => return seed(defaults),
    };

    let mut records = Vec::with_capacity(remote.len());
    let mut writes = Vec::new();

    for record in remote {
        let mut record = record.clone();
        if let Some(patch) = correction_for(&record, defaults) {
            patch.apply_to(&mut record);
            writes.push(CatalogWrite::Patch {
                id: record.id.clone(),
                patch,
            });
        }
        records.push(record);
    }

    Reconciliation { records, writes }
}

fn seed(defaults: &[GameRecord]) -> Reconciliation {
    let records: Vec<GameRecord> = defaults
        .iter()
        .cloned()
        .map(|mut record| {
            record.id = temporary_id();
            record
        })
        .collect();
    let writes = records.iter().cloned().map(CatalogWrite::Add).collect();
    Reconciliation { records, writes }
}

/// Build the patch bringing a tracked record back in line with its default, if needed.
fn correction_for(record: &GameRecord, defaults: &[GameRecord]) -> Option<GamePatch> {
    let (_, fields) = TRACKED_CORRECTIONS
        .iter()
        .find(|(name, _)| *name == record.name)?;
    let canonical = defaults.iter().find(|d| d.name == record.name)?;

    let mut patch = GamePatch::default();
    for field in fields.iter() {
        match field {
            TrackedField::ExternalUrl if record.external_url != canonical.external_url => {
                patch.external_url = Some(canonical.external_url.clone());
            }
            TrackedField::ImageUrl if record.image_url != canonical.image_url => {
                patch.image_url = Some(canonical.image_url.clone());
            }
            TrackedField::InternalRoute
                if canonical.internal_route.is_some()
                    && record.internal_route != canonical.internal_route =>
            {
                patch.internal_route = canonical.internal_route.clone();
            }
            _ => {}
        }
    }

    (!patch.is_empty()).then_some(patch)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::dao::defaults::default_games;

    fn stored(defaults: &[GameRecord]) -> Vec<GameRecord> {
        defaults
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, mut record)| {
                record.id = format!("doc{index}");
                record
            })
            .collect()
    }

    #[test]
    fn empty_snapshot_seeds_defaults() {
        let defaults = default_games();
        let result = reconcile(Some(&[]), &defaults);
        assert_eq!(result.records.len(), defaults.len());
        assert_eq!(result.writes.len(), defaults.len());
        assert!(result.writes.iter().all(|w| matches!(w, CatalogWrite::Add(_))));
    }

    #[test]
    fn absent_snapshot_seeds_with_unique_temporary_ids() {
        let defaults = default_games();
        let result = reconcile(None, &defaults);
        let ids: HashSet<_> = result.records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), defaults.len());
        assert!(result.records.iter().all(|r| r.id.starts_with(TEMPORARY_ID_PREFIX)));
        let names: Vec<_> = result.records.iter().map(|r| r.name.clone()).collect();
        let expected: Vec<_> = defaults.iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn matching_snapshot_needs_no_writes() {
        let defaults = default_games();
        let snapshot = stored(&defaults);
        let result = reconcile(Some(&snapshot), &defaults);
        assert!(result.writes.is_empty());
        assert_eq!(result.records, snapshot);
    }

    #[test]
    fn stale_tracked_url_is_patched_optimistically() {
        let defaults = default_games();
        let mut snapshot = stored(&defaults);
        let index = snapshot.iter().position(|r| r.name == "2048").unwrap();
        snapshot[index].external_url = "https://old.example/2048".into();

        let result = reconcile(Some(&snapshot), &defaults);
        assert_eq!(result.writes.len(), 1);
        let CatalogWrite::Patch { id, patch } = &result.writes[0] else {
            panic!("expected a patch, got {:?}", result.writes[0]);
        };
        assert_eq!(id, &snapshot[index].id);
        assert_eq!(
            patch,
            &GamePatch {
                external_url: Some(defaults[index].external_url.clone()),
                ..GamePatch::default()
            }
        );
        assert_eq!(result.records[index].external_url, defaults[index].external_url);
    }

    #[test]
    fn untracked_records_are_left_alone() {
        let defaults = default_games();
        let mut snapshot = stored(&defaults);
        let index = snapshot.iter().position(|r| r.name == "Tetris").unwrap();
        snapshot[index].external_url = "https://elsewhere.example".into();

        let result = reconcile(Some(&snapshot), &defaults);
        assert!(result.writes.is_empty());
        assert_eq!(result.records[index].external_url, "https://elsewhere.example");
    }

    #[test]
    fn reconciling_the_corrected_snapshot_is_idempotent() {
        let defaults = default_games();
        let mut snapshot = stored(&defaults);
        for record in snapshot.iter_mut() {
            record.external_url = "https://stale.example".into();
            record.internal_route = None;
        }

        let first = reconcile(Some(&snapshot), &defaults);
        assert_eq!(first.writes.len(), TRACKED_CORRECTIONS.len());

        let second = reconcile(Some(&first.records), &defaults);
        assert!(second.writes.is_empty());
        assert_eq!(second.records, first.records);
    }
}
