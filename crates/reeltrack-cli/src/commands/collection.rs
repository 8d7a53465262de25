use super::context::AppContext;
use super::prompts;
use crate::output::{kind_name, Output};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use tracker_core::{ItemQuery, MediaFilter, SortOrder, WatchFilter, WatchToggle};
use tracker_models::{ItemDraft, ItemPatch, MediaKind, SeriesInfo};
use tracing::warn;

#[allow(clippy::too_many_arguments)]
pub fn run_add(
    ctx: &mut AppContext,
    title: String,
    kind: MediaKind,
    year: Option<u32>,
    genres: Vec<String>,
    seasons: Option<u32>,
    episodes: Option<u32>,
    output: &Output,
) -> Result<()> {
    let mut draft = ItemDraft::new(title, kind).with_genres(genres);
    draft.year = year;

    match kind {
        MediaKind::Series if seasons.is_some() || episodes.is_some() => {
            draft.series = Some(SeriesInfo {
                season_count: seasons,
                total_episodes: episodes,
                seasons: Vec::new(),
            });
        }
        MediaKind::Movie if seasons.is_some() || episodes.is_some() => {
            output.warn("--seasons and --episodes only apply to TV shows; ignoring them");
        }
        _ => {}
    }

    let item = ctx.store.add(draft)?;

    if output.is_human() {
        let detail = if item.is_series() {
            format!(" with {} episodes", item.episodes.len())
        } else {
            String::new()
        };
        output.success(format!(
            "Added {} '{}' (#{}){}",
            kind_name(item.media_kind),
            item.title,
            item.id,
            detail
        ));
    } else {
        output.json_value(&item);
    }
    Ok(())
}

pub struct ListArgs {
    pub media: Option<MediaFilter>,
    pub status: Option<WatchFilter>,
    pub genre: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortOrder>,
    pub save: bool,
    pub reset: bool,
}

pub fn run_list(ctx: &AppContext, args: ListArgs, output: &Output) -> Result<()> {
    let saved = if args.reset {
        ctx.store.save_query(&ItemQuery::default())?;
        ItemQuery::default()
    } else {
        ctx.store.saved_query()
    };

    let mut query = saved.clone();
    if saved.is_default() {
        match ctx.config.display.default_sort.parse::<SortOrder>() {
            Ok(sort) => query.sort = sort,
            Err(e) => warn!("Ignoring display.default_sort: {}", e),
        }
    }
    if let Some(media) = args.media {
        query.media = media;
    }
    if let Some(status) = args.status {
        query.status = status;
    }
    if let Some(genre) = args.genre {
        query.genre = genre;
    }
    if let Some(search) = args.search {
        query.search = search;
    }
    if let Some(sort) = args.sort {
        query.sort = sort;
    }

    if args.save {
        ctx.store.save_query(&query)?;
    }

    let items = ctx.store.query(&query);
    output.items(&items);

    if output.is_human() {
        output.println(
            format!(
                "{} of {} items (sorted by {})",
                items.len(),
                ctx.store.len(),
                query.sort
            )
            .dimmed()
            .to_string(),
        );
        if args.save {
            output.success("Saved list selection");
        }
    }
    Ok(())
}

pub fn run_show(ctx: &mut AppContext, selector: &str, output: &Output) -> Result<()> {
    let id = ctx.resolve(selector)?;
    let item = ctx.store.get_by_id(id)?.clone();

    if !item.is_series() {
        output.item_detail(&item, &[]);
        return Ok(());
    }

    let tracker = ctx.store.episodes(id)?;
    let seasons: Vec<_> = tracker
        .seasons()
        .into_iter()
        .map(|season| (season, tracker.season_progress(season)))
        .collect();
    let progress = tracker.progress();

    output.item_detail(&item, &seasons);
    if output.is_human() {
        output.println(format!(
            "{} of {} episodes watched ({}%)",
            progress.watched, progress.total, progress.percent
        ));
    }
    Ok(())
}

pub fn run_search(ctx: &AppContext, term: &str, output: &Output) -> Result<()> {
    let items = ctx.store.search(term);
    output.items(&items);
    if output.is_human() && !items.is_empty() {
        output.println(format!("{} match(es) for '{}'", items.len(), term.trim()));
    }
    Ok(())
}

pub fn run_watch(ctx: &mut AppContext, selector: &str, output: &Output) -> Result<()> {
    let id = ctx.resolve(selector)?;
    let previous_rating = ctx.store.get_by_id(id)?.user_rating;

    match ctx.store.toggle_watched(id)? {
        WatchToggle::Toggled(item) => {
            if !output.is_human() {
                output.json(&json!({ "changed": true, "item": item }));
                return Ok(());
            }
            if item.watched {
                output.success(format!("Marked '{}' as watched", item.title));
                output.info(format!("Rate it with: reeltrack rate {} <1-10>", item.id));
            } else {
                output.success(format!("Marked '{}' as unwatched", item.title));
                if previous_rating > 0 {
                    output.warn("Rating and review were cleared");
                }
            }
        }
        WatchToggle::Unchanged { item, reason } => {
            if !output.is_human() {
                output.json(&json!({
                    "changed": false,
                    "item": item,
                    "reason": reason.to_string(),
                }));
                return Ok(());
            }
            output.warn(format!("'{}' was not changed: {}", item.title, reason));
            output.info(format!(
                "Use 'reeltrack episode', 'reeltrack season' or 'reeltrack episodes-all {}'",
                item.id
            ));
        }
    }
    Ok(())
}

pub fn run_rate(
    ctx: &mut AppContext,
    selector: &str,
    rating: u8,
    review: Option<String>,
    output: &Output,
) -> Result<()> {
    let id = ctx.resolve(selector)?;
    let patch = match review {
        Some(review) => ItemPatch::review(rating, review),
        None => ItemPatch::rating(rating),
    };

    let item = ctx.store.update(id, patch)?;
    if output.is_human() {
        if item.user_rating == 0 {
            output.success(format!("Cleared the rating of '{}'", item.title));
        } else {
            output.success(format!("Rated '{}' {}/10", item.title, item.user_rating));
        }
    } else {
        output.json_value(&item);
    }
    Ok(())
}

pub fn run_edit(
    ctx: &mut AppContext,
    selector: &str,
    title: Option<String>,
    year: Option<u32>,
    clear_year: bool,
    genres: Option<Vec<String>>,
    output: &Output,
) -> Result<()> {
    let id = ctx.resolve(selector)?;
    let patch = ItemPatch {
        title,
        year: if clear_year { Some(None) } else { year.map(Some) },
        genres,
        ..ItemPatch::default()
    };

    if patch.is_empty() {
        output.warn("Nothing to change. Pass --title, --year, --clear-year or --genre");
        return Ok(());
    }

    let item = ctx.store.update(id, patch)?;
    if output.is_human() {
        output.success(format!("Updated '{}' (#{})", item.title, item.id));
    } else {
        output.json_value(&item);
    }
    Ok(())
}

pub fn run_delete(ctx: &mut AppContext, selector: &str, yes: bool, output: &Output) -> Result<()> {
    let id = ctx.resolve(selector)?;
    let title = ctx.store.get_by_id(id)?.title.clone();

    if !yes {
        if !prompts::is_interactive() {
            return Err(eyre!("Refusing to delete '{}' without --yes", title));
        }
        if !prompts::prompt_yes_no(&format!("Delete '{}'?", title), Some(false))? {
            output.info("Cancelled");
            return Ok(());
        }
    }

    let removed = ctx.store.delete(id)?;
    if output.is_human() {
        output.success(format!("Deleted '{}'", removed.title));
    } else {
        output.json(&json!({ "deleted": removed.id, "title": removed.title }));
    }
    Ok(())
}

pub fn run_stats(ctx: &AppContext, output: &Output) -> Result<()> {
    let stats = ctx.store.stats();
    let genres = ctx.store.available_genres();

    if !output.is_human() {
        output.json(&json!({
            "statistics": stats,
            "genres": genres,
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Collection").fg(Color::Cyan).add_attribute(Attribute::Bold),
        Cell::new(""),
    ]);
    table.add_row(vec![Cell::new("Total"), Cell::new(stats.total)]);
    table.add_row(vec![Cell::new("Movies"), Cell::new(stats.movie_count)]);
    table.add_row(vec![Cell::new("TV shows"), Cell::new(stats.series_count)]);
    table.add_row(vec![Cell::new("Watched"), Cell::new(stats.watched_count)]);
    table.add_row(vec![
        Cell::new("Watchlist"),
        Cell::new(stats.total - stats.watched_count),
    ]);
    if !genres.is_empty() {
        table.add_row(vec![Cell::new("Genres"), Cell::new(genres.join(", "))]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", table);
    Ok(())
}
