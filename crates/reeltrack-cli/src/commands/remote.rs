use super::context::AppContext;
use super::prompts;
use crate::output::{kind_name, Output};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Table};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracker_config::CredentialStore;
use tracker_models::MediaKind;
use tracker_sources::{
    enrich, BatchOptions, EnrichmentRequest, MetadataProvider, SearchResult, SourceError,
    TmdbClient,
};
use tracing::debug;

fn tmdb_client(ctx: &AppContext) -> Result<TmdbClient> {
    let mut credentials = CredentialStore::new(ctx.paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

    TmdbClient::from_config(&ctx.config, credentials.tmdb_api_key()).map_err(|e| match e {
        SourceError::MissingApiKey(_) => eyre!(
            "No TMDB API key configured. Run 'reeltrack config tmdb' or set TMDB_API_KEY"
        ),
        SourceError::Disabled(_) => {
            eyre!("TMDB lookups are disabled. Run 'reeltrack config tmdb --enable'")
        }
        other => other.into(),
    })
}

pub async fn run_find(
    ctx: &mut AppContext,
    query: String,
    tv: bool,
    add: Option<usize>,
    output: &Output,
) -> Result<()> {
    let client = tmdb_client(ctx)?;
    let kind = if tv { MediaKind::Series } else { MediaKind::Movie };

    let results = client.search(&query, kind).await?;
    debug!("{} results for '{}'", results.len(), query);

    if results.is_empty() {
        output.warn(format!("No results for '{}'", query));
        return Ok(());
    }

    let choice = match add {
        Some(number) if (1..=results.len()).contains(&number) => Some(number - 1),
        Some(number) => {
            return Err(eyre!(
                "--add {} is out of range (1-{})",
                number,
                results.len()
            ))
        }
        None if output.is_human() && prompts::is_interactive() => {
            print_results(&results);
            let labels: Vec<String> = results.iter().map(result_label).collect();
            prompts::prompt_select("Add which title? (Esc to cancel)", &labels)?
        }
        None => {
            if output.is_human() {
                print_results(&results);
            } else {
                output.json_value(&results);
            }
            return Ok(());
        }
    };

    let Some(index) = choice else {
        output.info("Nothing added");
        return Ok(());
    };

    let picked = &results[index];
    if let Some(existing) = ctx
        .store
        .items()
        .iter()
        .find(|item| item.external_id == Some(picked.external_id) && item.media_kind == kind)
    {
        output.warn(format!(
            "'{}' is already in the collection (#{})",
            existing.title, existing.id
        ));
        return Ok(());
    }

    let spinner = spinner(output, format!("Fetching details for '{}'...", picked.title));
    let details = client.details(picked.external_id, kind).await;
    spinner.finish_and_clear();

    let item = ctx.store.add(details?.into_draft())?;
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

pub async fn run_enrich(ctx: &mut AppContext, refresh: bool, output: &Output) -> Result<()> {
    let requests = EnrichmentRequest::for_items(ctx.store.items(), refresh);
    if requests.is_empty() {
        output.info("No items need metadata");
        return Ok(());
    }

    let client = tmdb_client(ctx)?;
    let options = BatchOptions::from_config(&ctx.config.tmdb);

    let progress = if output.is_human() && !output.is_quiet() {
        let pb = ProgressBar::new(requests.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .map_err(|e| eyre!("Invalid progress template: {}", e))?
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        pb.set_message("Fetching metadata");
        pb
    } else {
        ProgressBar::hidden()
    };

    let report = enrich(&client, requests, options, |done| progress.set_position(done as u64)).await;
    progress.finish_and_clear();

    let updated = ctx.store.batch_update(report.patches())?;

    if output.is_human() {
        output.success(format!("Updated metadata for {} item(s)", updated.len()));
        for (request, error) in &report.failed {
            output.warn(format!("'{}': {}", request.title, error));
        }
    } else {
        let failed: Vec<_> = report
            .failed
            .iter()
            .map(|(request, error)| {
                json!({
                    "id": request.item_id,
                    "title": request.title,
                    "error": error.to_string(),
                })
            })
            .collect();
        output.json(&json!({
            "updated": updated.len(),
            "failed": failed,
        }));
    }
    Ok(())
}

fn spinner(output: &Output, message: String) -> ProgressBar {
    if !output.is_human() || output.is_quiet() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

fn result_label(result: &SearchResult) -> String {
    match result.year {
        Some(year) => format!("{} ({})", result.title, year),
        None => result.title.clone(),
    }
}

fn print_results(results: &[SearchResult]) {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Year").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("TMDB").add_attribute(Attribute::Bold),
        Cell::new("Rating").add_attribute(Attribute::Bold),
    ]);
    for (number, result) in results.iter().enumerate() {
        table.add_row(vec![
            Cell::new(number + 1),
            Cell::new(&result.title),
            Cell::new(result.year.map(|y| y.to_string()).unwrap_or_default()),
            Cell::new(kind_name(result.media_kind)),
            Cell::new(result.external_id),
            Cell::new(result.rating.map(|r| format!("{:.1}", r)).unwrap_or_default()),
        ]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", table);
}
