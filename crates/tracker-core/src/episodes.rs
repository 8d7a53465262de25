// Episode-list construction and the derived state of a series.
//
// Everything here is a pure function over models; `tracker` and `store` call
// into it and own persistence and notification.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;
use tracker_models::{Episode, EpisodeKey, Item, SeriesInfo};

/// Layout used when nothing is known about a show.
pub const DEFAULT_SEASON_COUNT: u32 = 1;
pub const DEFAULT_TOTAL_EPISODES: u32 = 10;
/// Assumed season length when only the season count is known.
pub const FALLBACK_EPISODES_PER_SEASON: u32 = 10;

/// Build the tracked episode list for a new series.
///
/// In priority order: explicit per-season episode numbers, per-season counts
/// (season 0 is specials and never tracked), an even split of the total
/// episode count across seasons, and finally one season of ten episodes.
pub fn build_episodes(info: &SeriesInfo) -> Vec<Episode> {
    let episodes = from_season_breakdown(info);
    if !episodes.is_empty() {
        debug!("Built {} episodes from season breakdown", episodes.len());
        return episodes;
    }

    let seasons = info.season_count.filter(|n| *n > 0);
    let total = info.total_episodes.filter(|n| *n > 0);
    let (seasons, total) = match (seasons, total) {
        (Some(s), Some(t)) => (s, t),
        (Some(s), None) => (s, s.saturating_mul(FALLBACK_EPISODES_PER_SEASON)),
        (None, Some(t)) => (DEFAULT_SEASON_COUNT, t),
        (None, None) => (DEFAULT_SEASON_COUNT, DEFAULT_TOTAL_EPISODES),
    };

    let episodes: Vec<Episode> = distribute_episodes(total, seasons)
        .into_iter()
        .zip(1u32..)
        .flat_map(|(count, season)| (1..=count).map(move |episode| Episode::new(season, episode)))
        .collect();

    debug!(
        "Built {} episodes across {} seasons from totals",
        episodes.len(),
        seasons
    );
    episodes
}

fn from_season_breakdown(info: &SeriesInfo) -> Vec<Episode> {
    let mut seen = HashSet::new();
    let mut episodes = Vec::new();

    for season in info.seasons.iter().filter(|s| s.season_number > 0) {
        let numbers: Vec<u32> = match (&season.episode_numbers, season.episode_count) {
            (Some(numbers), _) if !numbers.is_empty() => numbers.clone(),
            (_, Some(count)) if count > 0 => (1..=count).collect(),
            _ => continue,
        };

        for number in numbers.into_iter().filter(|n| *n > 0) {
            if seen.insert(EpisodeKey::new(season.season_number, number)) {
                episodes.push(Episode::new(season.season_number, number));
            }
        }
    }

    episodes.sort_by_key(Episode::key);
    episodes
}

/// Per-season episode counts for `total` episodes over `seasons` seasons.
///
/// Seasons get `ceil(total / seasons)` each and the last one takes what is
/// left. When `total >= seasons` every later season keeps at least one
/// episode, so a short split hands out fewer to the seasons before it.
/// The counts always sum to `total`.
pub fn distribute_episodes(total: u32, seasons: u32) -> Vec<u32> {
    if seasons == 0 {
        return Vec::new();
    }

    let per_season = total.div_ceil(seasons);
    let reserve = u32::from(total >= seasons);
    let mut remaining = total;
    (1..=seasons)
        .map(|season| {
            let kept_back = reserve * (seasons - season);
            let count = per_season.min(remaining.saturating_sub(kept_back));
            remaining -= count;
            count
        })
        .collect()
}

/// Outcome of re-deriving an item's watched state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RollUp {
    pub completed: bool,
    pub rating_cleared: bool,
}

/// The single place that enforces the watched invariants: a series is watched
/// exactly when every episode is, and an unwatched item carries no rating or
/// review.
pub fn roll_up(item: &mut Item) -> RollUp {
    if item.is_series() {
        item.watched = !item.episodes.is_empty() && item.episodes.iter().all(|ep| ep.watched);
    }

    let rating_cleared = !item.watched && clear_rating(item);
    RollUp {
        completed: item.watched,
        rating_cleared,
    }
}

/// Returns true when there was something to clear.
pub(crate) fn clear_rating(item: &mut Item) -> bool {
    let had_rating = item.has_rating();
    item.user_rating = 0;
    item.user_review.clear();
    had_rating
}

/// Unwatched episodes strictly before `target` in viewing order.
pub fn unwatched_before(item: &Item, target: EpisodeKey) -> Vec<EpisodeKey> {
    let mut keys: Vec<EpisodeKey> = item
        .episodes
        .iter()
        .filter(|ep| !ep.watched && ep.key() < target)
        .map(Episode::key)
        .collect();
    keys.sort();
    keys
}

/// Distinct season numbers, ascending.
pub fn seasons(item: &Item) -> Vec<u32> {
    item.episodes
        .iter()
        .map(|ep| ep.season)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EpisodeProgress {
    pub watched: usize,
    pub total: usize,
    pub percent: u8,
}

impl EpisodeProgress {
    fn from_counts(watched: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            ((watched as f64 / total as f64) * 100.0).round() as u8
        };
        Self { watched, total, percent }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.watched == self.total
    }
}

pub fn progress(item: &Item) -> EpisodeProgress {
    EpisodeProgress::from_counts(item.watched_episode_count(), item.episodes.len())
}

pub fn season_progress(item: &Item, season: u32) -> EpisodeProgress {
    let (watched, total) = item
        .episodes
        .iter()
        .filter(|ep| ep.season == season)
        .fold((0, 0), |(w, t), ep| (w + usize::from(ep.watched), t + 1));
    EpisodeProgress::from_counts(watched, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tracker_models::{ItemId, MediaKind, SeasonInfo};

    fn season_counts(episodes: &[Episode]) -> Vec<(u32, usize)> {
        let mut counts: Vec<(u32, usize)> = Vec::new();
        for ep in episodes {
            match counts.last_mut() {
                Some((season, count)) if *season == ep.season => *count += 1,
                _ => counts.push((ep.season, 1)),
            }
        }
        counts
    }

    fn series_with(episodes: Vec<Episode>) -> Item {
        Item {
            id: ItemId(1),
            title: "Severance".to_string(),
            media_kind: MediaKind::Series,
            year: None,
            genres: Vec::new(),
            watched: false,
            user_rating: 0,
            user_review: String::new(),
            episodes,
            external_id: None,
            metadata: None,
            created_at: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_even_split_puts_remainder_in_last_season() {
        let episodes = build_episodes(&SeriesInfo::from_totals(2, 15));
        assert_eq!(season_counts(&episodes), vec![(1, 8), (2, 7)]);
    }

    #[test]
    fn test_distribution_sums_to_total() {
        for seasons in 1..=12u32 {
            for total in seasons..=60u32 {
                let counts = distribute_episodes(total, seasons);
                assert_eq!(counts.iter().sum::<u32>(), total, "S={} T={}", seasons, total);

                assert!(counts.iter().all(|c| *c >= 1), "S={} T={}", seasons, total);

                let per = total.div_ceil(seasons);
                if per * (seasons - 1) < total {
                    assert!(counts[..counts.len() - 1].iter().all(|c| *c == per));
                    assert_eq!(counts[counts.len() - 1], total - per * (seasons - 1));
                }
            }
        }
    }

    #[test]
    fn test_short_split_keeps_every_season() {
        assert_eq!(distribute_episodes(5, 4), vec![2, 1, 1, 1]);
        assert_eq!(distribute_episodes(6, 4), vec![2, 2, 1, 1]);
        let episodes = build_episodes(&SeriesInfo::from_totals(4, 5));
        assert_eq!(season_counts(&episodes), vec![(1, 2), (2, 1), (3, 1), (4, 1)]);
        assert_eq!(episodes.len(), 5);
    }

    #[test]
    fn test_fewer_episodes_than_seasons() {
        assert_eq!(distribute_episodes(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(distribute_episodes(0, 3), vec![0, 0, 0]);
    }

    #[test]
    fn test_no_metadata_defaults_to_ten_episodes() {
        let episodes = build_episodes(&SeriesInfo::default());
        assert_eq!(season_counts(&episodes), vec![(1, 10)]);
        assert!(episodes.iter().all(|ep| !ep.watched));
        assert_eq!(episodes[9].episode_id, "1-10");
    }

    #[test]
    fn test_season_count_only_assumes_ten_per_season() {
        let info = SeriesInfo {
            season_count: Some(3),
            ..SeriesInfo::default()
        };
        assert_eq!(build_episodes(&info).len(), 30);
    }

    #[test]
    fn test_explicit_numbers_skip_specials() {
        let info = SeriesInfo::from_seasons(vec![
            SeasonInfo::with_numbers(0, vec![1, 2]),
            SeasonInfo::with_numbers(1, vec![1, 2, 3]),
            SeasonInfo::with_numbers(2, vec![1, 2]),
        ]);
        let episodes = build_episodes(&info);
        assert_eq!(season_counts(&episodes), vec![(1, 3), (2, 2)]);
    }

    #[test]
    fn test_counts_without_numbers_are_synthesized() {
        let info = SeriesInfo::from_seasons(vec![
            SeasonInfo::with_count(1, 6),
            SeasonInfo {
                season_number: 2,
                episode_count: None,
                episode_numbers: None,
            },
            SeasonInfo::with_count(3, 4),
        ]);
        let episodes = build_episodes(&info);
        assert_eq!(season_counts(&episodes), vec![(1, 6), (3, 4)]);
    }

    #[test]
    fn test_duplicate_numbers_are_dropped() {
        let info = SeriesInfo::from_seasons(vec![SeasonInfo::with_numbers(1, vec![1, 2, 2, 3, 0])]);
        let keys: Vec<u32> = build_episodes(&info).iter().map(|ep| ep.episode).collect();
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[test]
    fn test_breakdown_without_usable_seasons_falls_back_to_totals() {
        let info = SeriesInfo {
            season_count: Some(2),
            total_episodes: Some(15),
            seasons: vec![SeasonInfo::with_numbers(0, vec![1])],
        };
        assert_eq!(build_episodes(&info).len(), 15);
    }

    #[test]
    fn test_roll_up_clears_rating_when_incomplete() {
        let mut item = series_with(vec![Episode::new(1, 1), Episode::new(1, 2)]);
        item.episodes[0].watched = true;
        item.watched = true;
        item.user_rating = 9;
        item.user_review = "Great".to_string();

        let outcome = roll_up(&mut item);
        assert!(!outcome.completed);
        assert!(outcome.rating_cleared);
        assert!(!item.watched);
        assert_eq!(item.user_rating, 0);
        assert!(item.user_review.is_empty());
    }

    #[test]
    fn test_roll_up_completes_series() {
        let mut item = series_with(vec![Episode::new(1, 1), Episode::new(2, 1)]);
        item.episodes.iter_mut().for_each(|ep| ep.watched = true);
        assert_eq!(
            roll_up(&mut item),
            RollUp {
                completed: true,
                rating_cleared: false
            }
        );
        assert!(item.watched);
    }

    #[test]
    fn test_unwatched_before_and_progress() {
        let mut item = series_with(vec![
            Episode::new(2, 1),
            Episode::new(1, 2),
            Episode::new(1, 1),
            Episode::new(1, 3),
        ]);
        item.episodes[1].watched = true; // S01E02

        assert_eq!(
            unwatched_before(&item, EpisodeKey::new(2, 1)),
            vec![EpisodeKey::new(1, 1), EpisodeKey::new(1, 3)]
        );
        assert!(unwatched_before(&item, EpisodeKey::new(1, 1)).is_empty());
        assert_eq!(seasons(&item), vec![1, 2]);

        assert_eq!(
            progress(&item),
            EpisodeProgress {
                watched: 1,
                total: 4,
                percent: 25
            }
        );
        assert_eq!(season_progress(&item, 1).percent, 33);
        assert_eq!(season_progress(&item, 3).total, 0);
    }
}
