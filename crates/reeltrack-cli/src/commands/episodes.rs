use super::context::AppContext;
use super::prompts;
use crate::output::Output;
use color_eyre::Result;
use serde_json::json;
use tracker_core::{CascadePreview, EpisodeToggle};
use tracker_models::{EpisodeKey, ItemId, ItemPatch};

const PREVIEW_LIMIT: usize = 6;

/// Toggle one episode. `cascade` overrides the prompt; without a terminal
/// the earlier episodes are left alone.
pub fn run_episode(
    ctx: &mut AppContext,
    selector: &str,
    season: u32,
    episode: u32,
    cascade: Option<bool>,
    output: &Output,
) -> Result<()> {
    let id = ctx.resolve(selector)?;
    let mut tracker = ctx.store.episodes(id)?;
    let preview = tracker.cascade_preview(season, episode)?;

    let cascade = if preview.requires_confirmation() {
        match cascade {
            Some(choice) => choice,
            None if output.is_human() && prompts::is_interactive() => {
                prompts::prompt_yes_no(&cascade_question(&preview), Some(true))?
            }
            None => false,
        }
    } else {
        false
    };

    let result = tracker.toggle_episode(season, episode, cascade)?;
    report(ctx, id, &result, output)
}

pub fn run_season(ctx: &mut AppContext, selector: &str, season: u32, output: &Output) -> Result<()> {
    let id = ctx.resolve(selector)?;
    let result = ctx.store.episodes(id)?.mark_season_watched(season)?;
    report(ctx, id, &result, output)
}

pub fn run_all(ctx: &mut AppContext, selector: &str, unwatch: bool, output: &Output) -> Result<()> {
    let id = ctx.resolve(selector)?;
    let mut tracker = ctx.store.episodes(id)?;
    let result = if unwatch {
        tracker.mark_all_unwatched()?
    } else {
        tracker.mark_all_watched()?
    };
    report(ctx, id, &result, output)
}

fn cascade_question(preview: &CascadePreview) -> String {
    format!(
        "{} earlier episode(s) are unwatched ({}). Mark them watched too?",
        preview.unwatched_before.len(),
        key_list(&preview.unwatched_before)
    )
}

fn key_list(keys: &[EpisodeKey]) -> String {
    let mut shown: Vec<String> = keys.iter().take(PREVIEW_LIMIT).map(|k| k.to_string()).collect();
    if keys.len() > PREVIEW_LIMIT {
        shown.push(format!("and {} more", keys.len() - PREVIEW_LIMIT));
    }
    shown.join(", ")
}

fn report(ctx: &mut AppContext, id: ItemId, result: &EpisodeToggle, output: &Output) -> Result<()> {
    let item = &result.item;

    if !output.is_human() {
        output.json(&json!({
            "item": item,
            "marked": result.marked,
            "unmarked": result.unmarked,
            "completed": result.completed,
            "newlyCompleted": result.newly_completed,
            "ratingCleared": result.rating_cleared,
        }));
        return Ok(());
    }

    if result.marked.is_empty() && result.unmarked.is_empty() {
        output.info(format!("Nothing to change for '{}'", item.title));
    }
    if !result.marked.is_empty() {
        output.success(format!(
            "Marked {} episode(s) of '{}' watched: {}",
            result.marked.len(),
            item.title,
            key_list(&result.marked)
        ));
    }
    if !result.unmarked.is_empty() {
        output.success(format!(
            "Unmarked {} episode(s) of '{}': {}",
            result.unmarked.len(),
            item.title,
            key_list(&result.unmarked)
        ));
    }
    if result.rating_cleared {
        output.warn("The show is no longer complete; its rating and review were cleared");
    }
    if result.newly_completed {
        output.success(format!("Finished '{}'", item.title));
    }

    if result.should_prompt_for_rating() {
        if !prompts::is_interactive() {
            output.info(format!("Rate it with: reeltrack rate {} <1-10>", item.id));
            return Ok(());
        }
        if let Some(rating) = prompts::prompt_rating("Your rating (1-10, empty to skip)")? {
            let rated = ctx.store.update(id, ItemPatch::rating(rating))?;
            output.success(format!("Rated '{}' {}/10", rated.title, rated.user_rating));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_list_truncates() {
        let keys: Vec<EpisodeKey> = (1..=8).map(|e| EpisodeKey::new(1, e)).collect();
        assert_eq!(
            key_list(&keys),
            "S01E01, S01E02, S01E03, S01E04, S01E05, S01E06, and 2 more"
        );
        assert_eq!(key_list(&keys[..2]), "S01E01, S01E02");
    }
}
