use crate::episodes::{self, roll_up, EpisodeProgress};
use crate::error::{TrackerError, TrackerResult};
use crate::store::CollectionStore;
use serde::Serialize;
use tracing::{debug, info};
use tracker_models::{EpisodeKey, Item};

/// What marking an episode watched would involve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadePreview {
    pub target: EpisodeKey,
    pub target_watched: bool,
    /// Unwatched episodes before the target, in viewing order.
    pub unwatched_before: Vec<EpisodeKey>,
}

impl CascadePreview {
    /// True when the caller has to decide whether earlier episodes are
    /// marked along with the target.
    pub fn requires_confirmation(&self) -> bool {
        !self.target_watched && !self.unwatched_before.is_empty()
    }
}

/// Result of an episode operation.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeToggle {
    pub item: Item,
    pub marked: Vec<EpisodeKey>,
    pub unmarked: Vec<EpisodeKey>,
    pub completed: bool,
    /// The operation finished the show.
    pub newly_completed: bool,
    pub rating_cleared: bool,
}

impl EpisodeToggle {
    /// The show was just finished and has no rating yet.
    pub fn should_prompt_for_rating(&self) -> bool {
        self.newly_completed && self.item.user_rating == 0
    }
}

/// Episode-level operations on one series. Borrows the store so every
/// change is persisted and announced through it.
pub struct EpisodeTracker<'a> {
    store: &'a mut CollectionStore,
    index: usize,
}

impl<'a> EpisodeTracker<'a> {
    pub(crate) fn new(store: &'a mut CollectionStore, index: usize) -> TrackerResult<Self> {
        let item = store.item_at(index);
        if !item.is_series() {
            return Err(TrackerError::validation(format!(
                "'{}' is a movie and has no episodes",
                item.title
            )));
        }
        Ok(Self { store, index })
    }

    pub fn item(&self) -> &Item {
        self.store.item_at(self.index)
    }

    pub fn progress(&self) -> EpisodeProgress {
        episodes::progress(self.item())
    }

    pub fn season_progress(&self, season: u32) -> EpisodeProgress {
        episodes::season_progress(self.item(), season)
    }

    pub fn seasons(&self) -> Vec<u32> {
        episodes::seasons(self.item())
    }

    pub fn cascade_preview(&self, season: u32, episode: u32) -> TrackerResult<CascadePreview> {
        let item = self.item();
        let target = EpisodeKey::new(season, episode);
        let current = item.episode(target).ok_or_else(|| missing_episode(item, target))?;

        Ok(CascadePreview {
            target,
            target_watched: current.watched,
            unwatched_before: if current.watched {
                Vec::new()
            } else {
                episodes::unwatched_before(item, target)
            },
        })
    }

    /// Flip one episode. Marking it watched also marks every earlier
    /// unwatched episode when `cascade` is set; un-marking never cascades.
    pub fn toggle_episode(
        &mut self,
        season: u32,
        episode: u32,
        cascade: bool,
    ) -> TrackerResult<EpisodeToggle> {
        let preview = self.cascade_preview(season, episode)?;

        if preview.target_watched {
            let target = preview.target;
            return self.apply(move |item| (Vec::new(), set_watched(item, |key| key == target, false)));
        }

        let mut marked = if cascade {
            preview.unwatched_before.clone()
        } else {
            Vec::new()
        };
        marked.push(preview.target);
        debug!(
            "Marking {} episodes watched (cascade: {})",
            marked.len(),
            cascade && preview.requires_confirmation()
        );

        self.apply(move |item| {
            set_watched(item, |key| marked.contains(&key), true);
            (marked, Vec::new())
        })
    }

    pub fn mark_season_watched(&mut self, season: u32) -> TrackerResult<EpisodeToggle> {
        if !self.item().episodes.iter().any(|ep| ep.season == season) {
            let item = self.item();
            return Err(TrackerError::not_found(format!(
                "season {} of '{}' (id {})",
                season, item.title, item.id
            )));
        }

        self.apply(|item| (set_watched(item, |key| key.season == season, true), Vec::new()))
    }

    pub fn mark_all_watched(&mut self) -> TrackerResult<EpisodeToggle> {
        self.apply(|item| (set_watched(item, |_| true, true), Vec::new()))
    }

    pub fn mark_all_unwatched(&mut self) -> TrackerResult<EpisodeToggle> {
        self.apply(|item| (Vec::new(), set_watched(item, |_| true, false)))
    }

    fn apply<F>(&mut self, mutate: F) -> TrackerResult<EpisodeToggle>
    where
        F: FnOnce(&mut Item) -> (Vec<EpisodeKey>, Vec<EpisodeKey>),
    {
        let item = self.store.item_at_mut(self.index);
        let was_complete = item.watched;
        let (marked, unmarked) = mutate(item);
        let outcome = roll_up(item);

        if outcome.completed && !was_complete {
            info!("Completed '{}'", item.title);
        }

        let item = self.store.commit_at(self.index)?;
        Ok(EpisodeToggle {
            item,
            marked,
            unmarked,
            completed: outcome.completed,
            newly_completed: outcome.completed && !was_complete,
            rating_cleared: outcome.rating_cleared,
        })
    }
}

/// Set `watched` on matching episodes; returns the keys that actually changed.
fn set_watched<P>(item: &mut Item, matches: P, watched: bool) -> Vec<EpisodeKey>
where
    P: Fn(EpisodeKey) -> bool,
{
    let mut changed: Vec<EpisodeKey> = item
        .episodes
        .iter_mut()
        .filter(|ep| ep.watched != watched && matches(ep.key()))
        .map(|ep| {
            ep.watched = watched;
            ep.key()
        })
        .collect();
    changed.sort();
    changed
}

fn missing_episode(item: &Item, key: EpisodeKey) -> TrackerError {
    TrackerError::not_found(format!("episode {} of '{}' (id {})", key, item.title, item.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChangeKind;
    use crate::storage::MemoryStore;
    use crate::store::StoreOptions;
    use std::sync::{Arc, Mutex};
    use tracker_models::{ItemDraft, ItemId, ItemPatch, SeriesInfo};

    fn store_with_series(seasons: u32, total: u32) -> (CollectionStore, ItemId) {
        let mut store = CollectionStore::open(MemoryStore::new(), StoreOptions::default());
        let item = store
            .add(ItemDraft::series("Dark", SeriesInfo::from_totals(seasons, total)))
            .unwrap();
        (store, item.id)
    }

    fn watched_keys(item: &Item) -> Vec<EpisodeKey> {
        item.episodes.iter().filter(|ep| ep.watched).map(|ep| ep.key()).collect()
    }

    #[test]
    fn test_cascade_confirmed_marks_all_earlier_episodes() {
        let (mut store, id) = store_with_series(1, 3);
        let mut tracker = store.episodes(id).unwrap();

        let preview = tracker.cascade_preview(1, 3).unwrap();
        assert!(preview.requires_confirmation());
        assert_eq!(preview.unwatched_before.len(), 2);

        let outcome = tracker.toggle_episode(1, 3, true).unwrap();
        assert_eq!(outcome.marked.len(), 3);
        assert!(outcome.item.episodes.iter().all(|ep| ep.watched));
        assert!(outcome.item.watched);
        assert!(outcome.newly_completed);
        assert!(outcome.should_prompt_for_rating());
    }

    #[test]
    fn test_cascade_declined_marks_only_target() {
        let (mut store, id) = store_with_series(1, 3);
        let outcome = store.episodes(id).unwrap().toggle_episode(1, 3, false).unwrap();

        assert_eq!(watched_keys(&outcome.item), vec![EpisodeKey::new(1, 3)]);
        assert!(!outcome.item.watched);
    }

    #[test]
    fn test_first_episode_needs_no_confirmation() {
        let (mut store, id) = store_with_series(2, 4);
        let tracker = store.episodes(id).unwrap();
        assert!(!tracker.cascade_preview(1, 1).unwrap().requires_confirmation());
    }

    #[test]
    fn test_cascade_crosses_seasons() {
        let (mut store, id) = store_with_series(2, 4);
        let mut tracker = store.episodes(id).unwrap();
        tracker.toggle_episode(1, 1, false).unwrap();

        let outcome = tracker.toggle_episode(2, 1, true).unwrap();
        assert_eq!(
            outcome.marked,
            vec![EpisodeKey::new(1, 2), EpisodeKey::new(2, 1)]
        );
    }

    #[test]
    fn test_unwatching_clears_rating_without_cascade() {
        let (mut store, id) = store_with_series(1, 3);
        store.episodes(id).unwrap().mark_all_watched().unwrap();
        store.update(id, ItemPatch::review(9, "Loved it")).unwrap();

        let outcome = store.episodes(id).unwrap().toggle_episode(1, 1, true).unwrap();
        assert_eq!(outcome.unmarked, vec![EpisodeKey::new(1, 1)]);
        assert_eq!(watched_keys(&outcome.item).len(), 2);
        assert!(!outcome.item.watched);
        assert!(outcome.rating_cleared);
        assert_eq!(outcome.item.user_rating, 0);
        assert!(outcome.item.user_review.is_empty());
    }

    #[test]
    fn test_mark_season_and_roll_up() {
        let (mut store, id) = store_with_series(2, 15);
        let mut tracker = store.episodes(id).unwrap();

        let outcome = tracker.mark_season_watched(1).unwrap();
        assert_eq!(outcome.marked.len(), 8);
        assert!(!outcome.completed);
        assert_eq!(tracker.season_progress(1).percent, 100);
        assert_eq!(tracker.progress().watched, 8);

        let outcome = tracker.mark_season_watched(2).unwrap();
        assert!(outcome.completed);
        assert!(tracker.item().watched);

        assert!(matches!(
            tracker.mark_season_watched(3),
            Err(TrackerError::NotFound(_))
        ));
    }

    #[test]
    fn test_mark_all_unwatched_resets_show() {
        let (mut store, id) = store_with_series(1, 4);
        store.episodes(id).unwrap().mark_all_watched().unwrap();
        store.update(id, ItemPatch::rating(7)).unwrap();

        let outcome = store.episodes(id).unwrap().mark_all_unwatched().unwrap();
        assert_eq!(outcome.unmarked.len(), 4);
        assert!(!outcome.item.watched);
        assert_eq!(outcome.item.user_rating, 0);
    }

    #[test]
    fn test_roll_up_holds_after_every_operation() {
        let (mut store, id) = store_with_series(3, 7);
        let mut tracker = store.episodes(id).unwrap();

        let outcomes = vec![
            tracker.toggle_episode(1, 2, true).unwrap(),
            tracker.mark_season_watched(3).unwrap(),
            tracker.mark_all_watched().unwrap(),
            tracker.toggle_episode(2, 1, false).unwrap(),
            tracker.toggle_episode(2, 1, false).unwrap(),
            tracker.mark_all_unwatched().unwrap(),
        ];

        for outcome in outcomes {
            let item = outcome.item;
            assert_eq!(item.watched, item.episodes.iter().all(|ep| ep.watched));
            assert!(item.user_rating == 0 || item.watched);
        }
    }

    #[test]
    fn test_missing_episode_and_movie() {
        let (mut store, id) = store_with_series(1, 2);
        assert!(matches!(
            store.episodes(id).unwrap().toggle_episode(1, 9, false),
            Err(TrackerError::NotFound(_))
        ));

        let movie = store.add(ItemDraft::movie("Heat")).unwrap();
        assert!(matches!(
            store.episodes(movie.id),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn test_episode_changes_are_persisted_and_announced() {
        let storage = MemoryStore::new();
        let mut store = CollectionStore::open(storage.clone(), StoreOptions::default());
        let id = store
            .add(ItemDraft::series("Dark", SeriesInfo::from_totals(1, 2)))
            .unwrap()
            .id;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |event| sink.lock().unwrap().push(event.kind));

        store.episodes(id).unwrap().toggle_episode(1, 1, false).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![ChangeKind::Updated]);

        let reopened = CollectionStore::open(storage, StoreOptions::default());
        assert!(reopened.get_by_id(id).unwrap().episodes[0].watched);
    }
}
