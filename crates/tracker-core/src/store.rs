use crate::episodes::{build_episodes, roll_up};
use crate::error::{StorageError, TrackerError, TrackerResult};
use crate::events::{ChangeEvent, ChangeKind, ChangeNotifier, SubscriptionToken};
use crate::filter::{self, ItemQuery};
use crate::migration::migrate;
use crate::storage::KeyValueStore;
use crate::tracker::EpisodeTracker;
use crate::SNAPSHOT_VERSION;
use chrono::{DateTime, SubsecRound, Utc};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use tracker_config::Config;
use tracker_models::{
    CollectionStats, Item, ItemDraft, ItemId, ItemPatch, MediaKind, SeriesInfo, Snapshot,
};

static TITLE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d{4})\)").expect("title year regex should compile"));

/// Release year written as a `(YYYY)` suffix in a title.
pub fn year_from_title(title: &str) -> Option<u32> {
    TITLE_YEAR
        .captures(title)
        .and_then(|caps| caps[1].parse().ok())
        .filter(|year| *year > 0)
}

/// Current time at the millisecond precision timestamps are stored with.
pub(crate) fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Storage keys the collection and the saved list query live under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub movies_key: String,
    pub filters_key: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            movies_key: "movies".to_string(),
            filters_key: "filters".to_string(),
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            movies_key: config.storage.collection_key.clone(),
            filters_key: config.storage.filter_key.clone(),
        }
    }
}

/// How far past the current time an id may lie and still count as a
/// creation timestamp (clock skew between devices).
const ID_FUTURE_TOLERANCE_MS: i64 = 24 * 60 * 60 * 1000;

/// Hands out creation-timestamp ids that never repeat within a process,
/// even for several adds in the same millisecond.
#[derive(Debug, Default)]
pub struct IdSequence {
    last: i64,
}

impl IdSequence {
    /// Positive and not further in the future than a day.
    pub fn is_plausible(id: ItemId) -> bool {
        let limit = Utc::now()
            .timestamp_millis()
            .saturating_add(ID_FUTURE_TOLERANCE_MS);
        id.is_assigned() && id.value() <= limit
    }

    /// Record ids already in use. Implausible ids are ignored; they get
    /// reassigned during migration.
    pub fn observe(&mut self, ids: impl IntoIterator<Item = ItemId>) {
        for id in ids.into_iter().filter(|id| Self::is_plausible(*id)) {
            self.last = self.last.max(id.value());
        }
    }

    pub fn next_id(&mut self) -> ItemId {
        let now = Utc::now().timestamp_millis();
        self.last = now.max(self.last.saturating_add(1));
        ItemId(self.last)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// A series only becomes watched through its episodes.
    SeriesIncomplete { watched: usize, total: usize },
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoOpReason::SeriesIncomplete { watched, total } => write!(
                f,
                "series is marked watched through its episodes ({}/{} watched)",
                watched, total
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WatchToggle {
    Toggled(Item),
    Unchanged { item: Item, reason: NoOpReason },
}

impl WatchToggle {
    pub fn item(&self) -> &Item {
        match self {
            WatchToggle::Toggled(item) => item,
            WatchToggle::Unchanged { item, .. } => item,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, WatchToggle::Toggled(_))
    }
}

/// The authoritative collection, mirrored to a key-value store after every
/// mutation.
pub struct CollectionStore {
    storage: Box<dyn KeyValueStore>,
    options: StoreOptions,
    items: Vec<Item>,
    ids: IdSequence,
    notifier: ChangeNotifier,
}

impl CollectionStore {
    /// Open the collection persisted in `storage`. Missing or unreadable data
    /// yields an empty collection.
    pub fn open(storage: impl KeyValueStore + 'static, options: StoreOptions) -> Self {
        let mut store = Self {
            storage: Box::new(storage),
            options,
            items: Vec::new(),
            ids: IdSequence::default(),
            notifier: ChangeNotifier::new(),
        };
        store.load_all();
        store
    }

    /// Re-read the collection from storage, replacing the in-memory copy.
    pub fn load_all(&mut self) -> &[Item] {
        let mut items = self.read_items();
        migrate(&mut items, &mut self.ids);
        info!("Loaded collection: {} items", items.len());
        self.items = items;
        &self.items
    }

    fn read_items(&self) -> Vec<Item> {
        let key = &self.options.movies_key;
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No stored collection under '{}'", key);
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read collection storage: {}. Starting with an empty collection", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Item>>(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(
                    "Collection data corruption detected ({}). Starting with an empty collection",
                    e
                );
                Vec::new()
            }
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionToken
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.notifier.unsubscribe(token)
    }

    pub fn add(&mut self, draft: ItemDraft) -> TrackerResult<Item> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(TrackerError::validation("title must not be empty"));
        }

        let episodes = match draft.media_kind {
            MediaKind::Movie => Vec::new(),
            MediaKind::Series => {
                let info = draft.series.clone().unwrap_or_else(|| {
                    draft
                        .metadata
                        .as_ref()
                        .map(|m| SeriesInfo {
                            season_count: m.total_seasons,
                            total_episodes: m.total_episodes,
                            seasons: Vec::new(),
                        })
                        .unwrap_or_default()
                });
                build_episodes(&info)
            }
        };

        let now = timestamp();
        let item = Item {
            id: self.ids.next_id(),
            title: title.to_string(),
            media_kind: draft.media_kind,
            year: draft.year.or_else(|| year_from_title(title)),
            genres: draft.genres,
            watched: false,
            user_rating: 0,
            user_review: String::new(),
            episodes,
            external_id: draft.external_id,
            metadata: draft.metadata,
            created_at: now,
            last_updated: now,
        };

        info!(
            "Added {} '{}' (id {}, {} episodes)",
            item.media_kind.label(),
            item.title,
            item.id,
            item.episodes.len()
        );
        self.items.push(item.clone());
        self.commit(ChangeKind::Added, vec![item.clone()])?;
        Ok(item)
    }

    pub fn get_by_id(&self, id: ItemId) -> TrackerResult<&Item> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .ok_or_else(|| missing_item(id))
    }

    fn index_of(&self, id: ItemId) -> TrackerResult<usize> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| missing_item(id))
    }

    /// Merge `patch` into an item. The patch is checked against the merged
    /// result, so a rejected patch changes nothing.
    pub fn update(&mut self, id: ItemId, patch: ItemPatch) -> TrackerResult<Item> {
        let index = self.index_of(id)?;
        let mut updated = self.items[index].clone();
        apply_patch(&mut updated, patch)?;
        updated.last_updated = timestamp();

        debug!("Updated '{}' (id {})", updated.title, updated.id);
        self.items[index] = updated.clone();
        self.commit(ChangeKind::Updated, vec![updated.clone()])?;
        Ok(updated)
    }

    /// Apply several patches with a single write. Either all apply or none.
    pub fn batch_update(
        &mut self,
        patches: impl IntoIterator<Item = (ItemId, ItemPatch)>,
    ) -> TrackerResult<Vec<Item>> {
        let mut staged: HashMap<usize, Item> = HashMap::new();
        let mut order = Vec::new();

        for (id, patch) in patches {
            let index = self.index_of(id)?;
            if !staged.contains_key(&index) {
                order.push(index);
                staged.insert(index, self.items[index].clone());
            }
            if let Some(item) = staged.get_mut(&index) {
                apply_patch(item, patch)?;
            }
        }

        if order.is_empty() {
            return Ok(Vec::new());
        }

        let now = timestamp();
        let mut updated = Vec::with_capacity(order.len());
        for index in order {
            if let Some(mut item) = staged.remove(&index) {
                item.last_updated = now;
                self.items[index] = item.clone();
                updated.push(item);
            }
        }

        info!("Batch updated {} items", updated.len());
        self.commit(ChangeKind::Updated, updated.clone())?;
        Ok(updated)
    }

    pub fn delete(&mut self, id: ItemId) -> TrackerResult<Item> {
        let index = self.index_of(id)?;
        let removed = self.items.remove(index);
        info!("Deleted '{}' (id {})", removed.title, removed.id);
        self.commit(ChangeKind::Deleted, vec![removed.clone()])?;
        Ok(removed)
    }

    /// Flip a movie's watched state. A series can only be un-marked here, and
    /// only once all of its episodes are watched.
    pub fn toggle_watched(&mut self, id: ItemId) -> TrackerResult<WatchToggle> {
        let index = self.index_of(id)?;
        let item = &mut self.items[index];

        match item.media_kind {
            MediaKind::Movie => item.watched = !item.watched,
            MediaKind::Series if item.watched => {
                item.episodes.iter_mut().for_each(|ep| ep.watched = false);
            }
            MediaKind::Series => {
                let reason = NoOpReason::SeriesIncomplete {
                    watched: item.watched_episode_count(),
                    total: item.episodes.len(),
                };
                debug!("Toggle on '{}' ignored: {}", item.title, reason);
                return Ok(WatchToggle::Unchanged {
                    item: item.clone(),
                    reason,
                });
            }
        }

        roll_up(item);
        let item = self.commit_at(index)?;
        Ok(WatchToggle::Toggled(item))
    }

    /// Case-insensitive match over title, genres and the media-kind label, in
    /// collection order. A blank term matches everything.
    pub fn search(&self, term: &str) -> Vec<&Item> {
        let term = term.trim().to_lowercase();
        self.items
            .iter()
            .filter(|item| term.is_empty() || filter::matches_term(item, &term))
            .collect()
    }

    pub fn stats(&self) -> CollectionStats {
        CollectionStats::from_items(&self.items)
    }

    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION.to_string(),
            export_date: timestamp(),
            movies: self.items.clone(),
            statistics: self.stats(),
        }
    }

    /// Replace the collection with a typed snapshot.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> TrackerResult<Vec<Item>> {
        if let Some(position) = snapshot.movies.iter().position(|item| item.title.trim().is_empty()) {
            return Err(TrackerError::validation(format!(
                "item {}: title must not be empty",
                position + 1
            )));
        }
        self.replace_all(snapshot.movies)
    }

    /// Replace the collection with an untyped export document. Nothing is
    /// imported unless every item validates.
    pub fn import_value(&mut self, document: Value) -> TrackerResult<Vec<Item>> {
        let items = validate_import(&document)?;
        self.replace_all(items)
    }

    pub fn import_json(&mut self, json: &str) -> TrackerResult<Vec<Item>> {
        let document: Value = serde_json::from_str(json)
            .map_err(|e| TrackerError::validation(format!("invalid JSON: {}", e)))?;
        self.import_value(document)
    }

    fn replace_all(&mut self, mut items: Vec<Item>) -> TrackerResult<Vec<Item>> {
        migrate(&mut items, &mut self.ids);
        info!("Imported {} items, replacing {}", items.len(), self.items.len());
        self.items = items;
        self.commit(ChangeKind::Imported, self.items.clone())?;
        Ok(self.items.clone())
    }

    /// Episode operations for one series.
    pub fn episodes(&mut self, id: ItemId) -> TrackerResult<EpisodeTracker<'_>> {
        let index = self.index_of(id)?;
        EpisodeTracker::new(self, index)
    }

    pub fn query(&self, query: &ItemQuery) -> Vec<&Item> {
        query.apply(&self.items)
    }

    pub fn available_genres(&self) -> Vec<String> {
        filter::available_genres(&self.items)
    }

    /// Last saved list query; the default when absent or unreadable.
    pub fn saved_query(&self) -> ItemQuery {
        match self.storage.get(&self.options.filters_key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring unreadable saved filters: {}", e);
                ItemQuery::default()
            }),
            Ok(None) => ItemQuery::default(),
            Err(e) => {
                warn!("Failed to read saved filters: {}", e);
                ItemQuery::default()
            }
        }
    }

    pub fn save_query(&self, query: &ItemQuery) -> TrackerResult<()> {
        let json = serde_json::to_string(query).map_err(StorageError::from)?;
        self.storage.set(&self.options.filters_key, &json)?;
        debug!("Saved list query");
        Ok(())
    }

    pub(crate) fn item_at(&self, index: usize) -> &Item {
        &self.items[index]
    }

    pub(crate) fn item_at_mut(&mut self, index: usize) -> &mut Item {
        &mut self.items[index]
    }

    /// Stamp, persist and announce an item already changed in place.
    pub(crate) fn commit_at(&mut self, index: usize) -> TrackerResult<Item> {
        let item = &mut self.items[index];
        item.last_updated = timestamp();
        let item = item.clone();
        self.commit(ChangeKind::Updated, vec![item.clone()])?;
        Ok(item)
    }

    /// Write through, then notify. Subscribers hear about the change even when
    /// the write failed, since the in-memory collection did change.
    fn commit(&mut self, kind: ChangeKind, affected: Vec<Item>) -> TrackerResult<()> {
        let result = self.persist();
        if let Err(e) = &result {
            warn!("Collection change ({}) not persisted: {}", kind, e);
        }
        self.notifier.notify(&ChangeEvent::new(kind, affected));
        result.map_err(TrackerError::from)
    }

    fn persist(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.items)?;
        self.storage.set(&self.options.movies_key, &json)
    }
}

impl fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionStore")
            .field("options", &self.options)
            .field("items", &self.items.len())
            .field("notifier", &self.notifier)
            .finish()
    }
}

fn missing_item(id: ItemId) -> TrackerError {
    TrackerError::not_found(format!("item {}", id))
}

fn apply_patch(item: &mut Item, patch: ItemPatch) -> TrackerResult<()> {
    if let Some(title) = patch.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(TrackerError::validation("title must not be empty"));
        }
        item.title = title.to_string();
    }
    if let Some(year) = patch.year {
        item.year = year;
    }
    if let Some(genres) = patch.genres {
        item.genres = genres;
    }
    if let Some(external_id) = patch.external_id {
        item.external_id = external_id;
    }
    if let Some(metadata) = patch.metadata {
        item.metadata = Some(metadata);
    }

    if let Some(watched) = patch.watched {
        if item.is_series() {
            return Err(TrackerError::validation(
                "a series is marked watched through its episodes",
            ));
        }
        item.watched = watched;
    }

    if let Some(rating) = patch.user_rating {
        if rating > 10 {
            return Err(TrackerError::validation(format!(
                "rating must be between 0 and 10, got {}",
                rating
            )));
        }
        if rating > 0 && !item.watched {
            return Err(TrackerError::validation(format!(
                "'{}' must be watched before it can be rated",
                item.title
            )));
        }
        item.user_rating = rating;
    }
    if let Some(review) = patch.user_review {
        if !review.trim().is_empty() && !item.watched {
            return Err(TrackerError::validation(format!(
                "'{}' must be watched before it can be reviewed",
                item.title
            )));
        }
        item.user_review = review.trim().to_string();
    }

    roll_up(item);
    Ok(())
}

fn validate_import(document: &Value) -> TrackerResult<Vec<Item>> {
    let movies = document
        .get("movies")
        .ok_or_else(|| TrackerError::validation("missing 'movies' list"))?
        .as_array()
        .ok_or_else(|| TrackerError::validation("'movies' must be a list"))?;

    if document.get("version").is_none() {
        warn!("Import document has no version; assuming current format");
    }

    movies
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let position = index + 1;
            let title = raw
                .get("title")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    TrackerError::validation(format!("item {}: title must not be empty", position))
                })?;

            let kind = raw.get("type").and_then(Value::as_str).unwrap_or("");
            if MediaKind::from_label(kind).is_none() {
                return Err(TrackerError::validation(format!(
                    "item {} ('{}'): type must be 'movie' or 'tv', got '{}'",
                    position, title, kind
                )));
            }

            serde_json::from_value::<Item>(raw.clone()).map_err(|e| {
                TrackerError::validation(format!("item {} ('{}'): {}", position, title, e))
            })
        })
        .collect()
}
