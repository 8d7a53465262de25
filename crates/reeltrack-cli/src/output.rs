use clap::ValueEnum;
use comfy_table::{Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use tracker_core::EpisodeProgress;
use tracker_models::{Item, MediaKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => {
                println!("{} {}", "✓".green(), msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                let json = json!({
                    "type": "success",
                    "message": msg.as_ref()
                });
                self.print_json(&json);
            }
        }
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        // Errors should always be shown, even in quiet mode
        match self.format {
            OutputFormat::Human => {
                eprintln!("{} {}", "✗".red(), msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                let json = json!({
                    "type": "error",
                    "message": msg.as_ref()
                });
                self.print_json(&json);
            }
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => {
                println!("{}", msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                let json = json!({
                    "type": "info",
                    "message": msg.as_ref()
                });
                self.print_json(&json);
            }
        }
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => {
                println!("{} {}", "⚠".yellow(), msg.as_ref());
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                let json = json!({
                    "type": "warning",
                    "message": msg.as_ref()
                });
                self.print_json(&json);
            }
        }
    }

    /// Plain line for human output; ignored in JSON modes.
    pub fn println(&self, msg: impl AsRef<str>) {
        if self.quiet || !self.is_human() {
            return;
        }
        println!("{}", msg.as_ref());
    }

    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && self.format != OutputFormat::Human {
            return;
        }

        self.print_json(data);
    }

    /// Serialize any value for the JSON modes.
    pub fn json_value<T: Serialize>(&self, data: &T) {
        match serde_json::to_value(data) {
            Ok(value) => self.json(&value),
            Err(e) => self.error(format!("Failed to serialize output: {}", e)),
        }
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(data).unwrap_or_default());
            }
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Human => {
                println!("{}", data);
            }
        }
    }

    /// A list of items: a table for humans, an array otherwise.
    pub fn items(&self, items: &[&Item]) {
        if self.is_human() {
            if self.quiet {
                return;
            }
            if items.is_empty() {
                println!("{}", "No items found.".dimmed());
                return;
            }
            println!("{}", item_table(items));
        } else {
            self.json_value(&items);
        }
    }

    /// One item with its episode breakdown.
    pub fn item_detail(&self, item: &Item, seasons: &[(u32, EpisodeProgress)]) {
        if !self.is_human() {
            self.json_value(item);
            return;
        }
        if self.quiet {
            return;
        }

        let mut table = Table::new();
        table.set_header(vec![
            Cell::new(&item.title).fg(Color::Cyan).add_attribute(Attribute::Bold),
            Cell::new(format!("#{}", item.id)),
        ]);
        table.add_row(vec![Cell::new("Type"), Cell::new(kind_name(item.media_kind))]);
        table.add_row(vec![
            Cell::new("Year"),
            Cell::new(item.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string())),
        ]);
        table.add_row(vec![Cell::new("Genres"), Cell::new(genre_list(item))]);
        table.add_row(vec![Cell::new("Watched"), Cell::new(watched_mark(item.watched))]);
        table.add_row(vec![Cell::new("Rating"), Cell::new(rating_text(item.user_rating))]);
        if !item.user_review.is_empty() {
            table.add_row(vec![Cell::new("Review"), Cell::new(&item.user_review)]);
        }
        if let Some(metadata) = &item.metadata {
            if let Some(overview) = &metadata.overview {
                table.add_row(vec![Cell::new("Overview"), Cell::new(overview)]);
            }
            if let Some(rating) = metadata.rating {
                table.add_row(vec![Cell::new("TMDB rating"), Cell::new(format!("{:.1}", rating))]);
            }
            if let Some(runtime) = metadata.runtime {
                table.add_row(vec![Cell::new("Runtime"), Cell::new(format!("{} min", runtime))]);
            }
            if !metadata.cast.is_empty() {
                table.add_row(vec![Cell::new("Cast"), Cell::new(metadata.cast.join(", "))]);
            }
            if let Some(status) = &metadata.status {
                table.add_row(vec![Cell::new("Status"), Cell::new(status)]);
            }
        }
        table.add_row(vec![
            Cell::new("Added"),
            Cell::new(item.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        println!("{}", table);

        if !seasons.is_empty() {
            let mut season_table = Table::new();
            season_table.set_header(vec![
                Cell::new("Season").add_attribute(Attribute::Bold),
                Cell::new("Watched").add_attribute(Attribute::Bold),
                Cell::new("Progress").add_attribute(Attribute::Bold),
            ]);
            for (season, progress) in seasons {
                season_table.add_row(vec![
                    Cell::new(season),
                    Cell::new(format!("{}/{}", progress.watched, progress.total)),
                    Cell::new(progress_bar(progress)),
                ]);
            }
            season_table.load_preset(comfy_table::presets::UTF8_FULL);
            season_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", season_table);
        }
    }
}

fn item_table(items: &[&Item]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("Year").add_attribute(Attribute::Bold),
        Cell::new("Watched").add_attribute(Attribute::Bold),
        Cell::new("Rating").add_attribute(Attribute::Bold),
        Cell::new("Genres").add_attribute(Attribute::Bold),
    ]);

    for item in items {
        let watched = if item.is_series() {
            format!(
                "{} {}/{}",
                watched_mark(item.watched),
                item.watched_episode_count(),
                item.episodes.len()
            )
        } else {
            watched_mark(item.watched)
        };

        table.add_row(vec![
            Cell::new(item.id),
            Cell::new(&item.title),
            Cell::new(kind_name(item.media_kind)),
            Cell::new(item.year.map(|y| y.to_string()).unwrap_or_default()),
            Cell::new(watched),
            Cell::new(rating_text(item.user_rating)),
            Cell::new(genre_list(item)),
        ]);
    }

    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

pub fn kind_name(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "Movie",
        MediaKind::Series => "TV",
    }
}

fn watched_mark(watched: bool) -> String {
    if watched {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

pub fn rating_text(rating: u8) -> String {
    if rating == 0 {
        "-".to_string()
    } else {
        format!("{}/10", rating)
    }
}

fn genre_list(item: &Item) -> String {
    item.genres.join(", ")
}

fn progress_bar(progress: &EpisodeProgress) -> String {
    const WIDTH: usize = 20;
    let filled = (progress.percent as usize * WIDTH) / 100;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(WIDTH - filled));
    if progress.is_complete() {
        format!("{} {}%", bar.green(), progress.percent)
    } else {
        format!("{} {}%", bar, progress.percent)
    }
}

/// Show the first and last two characters of a secret.
pub fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    if s.len() <= 4 {
        return "*".repeat(s.len());
    }
    format!("{}***{}", &s[..2], &s[s.len() - 2..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "<not set>");
        assert_eq!(mask_string("abc"), "***");
        assert_eq!(mask_string("abcdef123"), "ab***23");
    }

    #[test]
    fn test_rating_text() {
        assert_eq!(rating_text(0), "-");
        assert_eq!(rating_text(8), "8/10");
    }
}
