use super::context::AppContext;
use super::prompts;
use crate::output::Output;
use chrono::Local;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracker_core::{default_export_file_name, read_snapshot_file, write_snapshot_file, ImportSummary};

pub fn run_export(ctx: &AppContext, path: Option<PathBuf>, output: &Output) -> Result<()> {
    let path = path.unwrap_or_else(|| {
        ctx.paths
            .backup_dir()
            .join(default_export_file_name(Local::now().date_naive()))
    });

    let snapshot = ctx.store.export_snapshot();
    write_snapshot_file(&path, &snapshot)?;

    if output.is_human() {
        output.success(format!(
            "Exported {} items to {}",
            snapshot.statistics.total,
            path.display()
        ));
    } else {
        output.json(&json!({
            "path": path.display().to_string(),
            "statistics": snapshot.statistics,
        }));
    }
    Ok(())
}

pub fn run_import(ctx: &mut AppContext, file: &Path, yes: bool, output: &Output) -> Result<()> {
    let document = read_snapshot_file(file)?;
    let summary = ImportSummary::from_document(&document);

    if !yes {
        if !prompts::is_interactive() {
            return Err(eyre!(
                "Importing replaces the whole collection; pass --yes to confirm"
            ));
        }
        print_summary(&summary, ctx.store.len(), output);
        if !prompts::prompt_yes_no("Replace the current collection with this backup?", Some(false))? {
            output.info("Import cancelled");
            return Ok(());
        }
    }

    let items = ctx.store.import_value(document)?;

    if output.is_human() {
        output.success(format!("Imported {} items from {}", items.len(), file.display()));
    } else {
        output.json(&json!({
            "imported": items.len(),
            "summary": summary,
        }));
    }
    Ok(())
}

fn print_summary(summary: &ImportSummary, current: usize, output: &Output) {
    output.println(format!("{}", "Backup contents".bright_cyan().bold()));
    output.println(format!(
        "  {} items: {} movies, {} TV shows, {} watched",
        summary.total, summary.movies, summary.tv_shows, summary.watched
    ));
    if let Some(date) = &summary.export_date {
        output.println(format!("  Exported: {}", date));
    }
    match &summary.version {
        Some(version) => output.println(format!("  Version: {}", version)),
        None => output.warn("Backup has no version field"),
    }
    output.warn(format!("This replaces all {} items currently in the collection", current));
}
