// Normalizes items read from storage or an import file.
//
// Older data may lack fields, cached episode ids or timestamps, and may have
// been written before the watched invariants were enforced. Running the pass
// on well-formed items changes nothing.

use crate::episodes::{build_episodes, roll_up};
use crate::store::{timestamp, IdSequence};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info};
use tracker_models::{Item, SeriesInfo};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub ids_reassigned: usize,
    pub timestamps_filled: usize,
    pub episode_ids_filled: usize,
    pub episodes_dropped: usize,
    pub episode_lists_rebuilt: usize,
    pub watched_state_fixed: usize,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

pub fn migrate(items: &mut [Item], ids: &mut IdSequence) -> MigrationReport {
    let mut report = MigrationReport::default();

    ids.observe(items.iter().map(|item| item.id));
    let mut seen = HashSet::new();

    for item in items.iter_mut() {
        if !IdSequence::is_plausible(item.id) || !seen.insert(item.id) {
            let old = item.id;
            item.id = ids.next_id();
            seen.insert(item.id);
            debug!("Reassigned id {} -> {} for '{}'", old, item.id, item.title);
            report.ids_reassigned += 1;
        }

        if fill_timestamps(item) {
            report.timestamps_filled += 1;
        }

        if item.is_series() {
            migrate_episodes(item, &mut report);
        } else if !item.episodes.is_empty() {
            report.episodes_dropped += item.episodes.len();
            item.episodes.clear();
        }

        let before = (item.watched, item.user_rating, item.user_review.len());
        roll_up(item);
        if before != (item.watched, item.user_rating, item.user_review.len()) {
            report.watched_state_fixed += 1;
        }
    }

    if !report.is_clean() {
        info!("Migrated collection data: {:?}", report);
    }
    report
}

fn fill_timestamps(item: &mut Item) -> bool {
    let mut changed = false;
    if item.created_at == DateTime::<Utc>::UNIX_EPOCH {
        // Ids are creation timestamps in milliseconds.
        item.created_at = DateTime::from_timestamp_millis(item.id.value())
            .filter(|ts| *ts > DateTime::<Utc>::UNIX_EPOCH)
            .unwrap_or_else(timestamp);
        changed = true;
    }
    if item.last_updated == DateTime::<Utc>::UNIX_EPOCH {
        item.last_updated = item.created_at;
        changed = true;
    }
    changed
}

fn migrate_episodes(item: &mut Item, report: &mut MigrationReport) {
    let mut keys = HashSet::new();
    let before = item.episodes.len();
    item.episodes
        .retain(|ep| ep.season > 0 && ep.episode > 0 && keys.insert(ep.key()));
    report.episodes_dropped += before - item.episodes.len();

    for ep in item.episodes.iter_mut().filter(|ep| ep.episode_id.is_empty()) {
        ep.episode_id = format!("{}-{}", ep.season, ep.episode);
        report.episode_ids_filled += 1;
    }

    if item.episodes.is_empty() {
        let info = item
            .metadata
            .as_ref()
            .map(|m| SeriesInfo {
                season_count: m.total_seasons,
                total_episodes: m.total_episodes,
                seasons: Vec::new(),
            })
            .unwrap_or_default();
        item.episodes = build_episodes(&info);
        report.episode_lists_rebuilt += 1;
    }
}
