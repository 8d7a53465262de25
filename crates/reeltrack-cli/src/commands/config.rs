use super::prompts;
use crate::output::{mask_string, Output};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use tracker_config::{Config, CredentialStore, PathManager};

pub async fn run_config(cmd: crate::ConfigCommands, paths: &PathManager, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show => show_config(paths, output),
        crate::ConfigCommands::Tmdb {
            api_key,
            enable,
            disable,
            clear,
        } => configure_tmdb(paths, api_key, enable, disable, clear, output),
        crate::ConfigCommands::Init { force } => init_config(paths, force, output),
    }
}

fn load_config(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))
}

fn load_credentials(paths: &PathManager) -> Result<CredentialStore> {
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    Ok(credentials)
}

fn show_config(paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if !config_file.exists() {
        output.warn(format!(
            "Configuration file not found at: {} (showing defaults)",
            config_file.display()
        ));
        output.info("Run 'reeltrack config init' to write it.");
    }

    let config = load_config(paths)?;
    let credentials = load_credentials(paths)?;
    let api_key = credentials.tmdb_api_key().unwrap_or_default();
    let validation = config.validate().err().map(|e| e.to_string());

    if !output.is_human() {
        output.json(&json!({
            "configFile": config_file.display().to_string(),
            "storage": {
                "dataDir": config.storage.data_dir,
                "collectionKey": config.storage.collection_key,
                "filterKey": config.storage.filter_key,
            },
            "tmdb": {
                "enabled": config.tmdb.enabled,
                "apiKey": mask_string(&api_key),
                "baseUrl": config.tmdb.base_url,
                "imageBaseUrl": config.tmdb.image_base_url,
                "rateLimitDelayMs": config.tmdb.rate_limit_delay_ms,
                "batchSize": config.tmdb.batch_size,
                "language": config.tmdb.language,
                "region": config.tmdb.region,
            },
            "display": {
                "defaultSort": config.display.default_sort,
                "posterSize": config.display.poster_size,
            },
            "logging": {
                "level": config.logging.level,
                "file": config.logging.file,
            },
            "error": validation,
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    println!("\n{}", "╔════════════════════════════════════════════════════════════╗".bright_white());
    println!("{} {}", "║".bright_white(), "Configuration".bright_cyan().bold());
    println!("{}", "╚════════════════════════════════════════════════════════════╝".bright_white());
    println!();

    let mut info_table = Table::new();
    info_table.set_header(vec![
        Cell::new("Config File").add_attribute(comfy_table::Attribute::Bold),
        Cell::new(config_file.display().to_string()),
    ]);
    info_table.add_row(vec![
        Cell::new("Data Directory"),
        Cell::new(
            config
                .storage
                .data_dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| paths.data_dir().display().to_string()),
        ),
    ]);
    info_table.load_preset(comfy_table::presets::UTF8_FULL);
    info_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", info_table);
    println!();

    let mut storage_table = Table::new();
    storage_table.set_header(vec![Cell::new("Storage")
        .fg(comfy_table::Color::Cyan)
        .add_attribute(comfy_table::Attribute::Bold)]);
    storage_table.add_row(vec![
        Cell::new("Collection Key"),
        Cell::new(&config.storage.collection_key),
    ]);
    storage_table.add_row(vec![Cell::new("Filter Key"), Cell::new(&config.storage.filter_key)]);
    storage_table.load_preset(comfy_table::presets::UTF8_FULL);
    storage_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", storage_table);
    println!();

    let mut tmdb_table = Table::new();
    tmdb_table.set_header(vec![Cell::new("TMDB Configuration")
        .fg(comfy_table::Color::Cyan)
        .add_attribute(comfy_table::Attribute::Bold)]);
    tmdb_table.add_row(vec![
        Cell::new("Enabled"),
        Cell::new(if config.tmdb.enabled {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        }),
    ]);
    tmdb_table.add_row(vec![Cell::new("API Key"), Cell::new(mask_string(&api_key))]);
    tmdb_table.add_row(vec![Cell::new("Base URL"), Cell::new(&config.tmdb.base_url)]);
    tmdb_table.add_row(vec![Cell::new("Posters"), Cell::new(config.poster_base())]);
    tmdb_table.add_row(vec![
        Cell::new("Batches"),
        Cell::new(format!(
            "{} per batch, {} ms apart",
            config.tmdb.batch_size, config.tmdb.rate_limit_delay_ms
        )),
    ]);
    tmdb_table.add_row(vec![
        Cell::new("Language"),
        Cell::new(match &config.tmdb.region {
            Some(region) => format!("{} ({})", config.tmdb.language, region),
            None => config.tmdb.language.clone(),
        }),
    ]);
    tmdb_table.load_preset(comfy_table::presets::UTF8_FULL);
    tmdb_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", tmdb_table);
    println!();

    let mut display_table = Table::new();
    display_table.set_header(vec![Cell::new("Display & Logging")
        .fg(comfy_table::Color::Cyan)
        .add_attribute(comfy_table::Attribute::Bold)]);
    display_table.add_row(vec![Cell::new("Default Sort"), Cell::new(&config.display.default_sort)]);
    display_table.add_row(vec![Cell::new("Log Level"), Cell::new(&config.logging.level)]);
    display_table.add_row(vec![
        Cell::new("Log File"),
        Cell::new(if config.logging.file {
            paths.log_file().display().to_string()
        } else {
            "off".to_string()
        }),
    ]);
    display_table.load_preset(comfy_table::presets::UTF8_FULL);
    display_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", display_table);

    if let Some(error) = validation {
        println!();
        output.warn(format!("Configuration is invalid: {}", error));
    }
    Ok(())
}

fn configure_tmdb(
    paths: &PathManager,
    api_key: Option<String>,
    enable: bool,
    disable: bool,
    clear: bool,
    output: &Output,
) -> Result<()> {
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;

    let mut config = load_config(paths)?;
    let mut credentials = load_credentials(paths)?;

    let api_key = match api_key {
        Some(key) => Some(key),
        None if !(enable || disable || clear) => {
            if !prompts::is_interactive() {
                return Err(eyre!("Pass --api-key, --enable, --disable or --clear"));
            }
            output.println("Get an API key at https://www.themoviedb.org/settings/api");
            let current = credentials.stored_tmdb_api_key().cloned();
            let key = prompts::prompt_string("TMDB API key", current.as_deref())?;
            Some(key)
        }
        None => None,
    };

    if let Some(key) = api_key {
        let key = key.trim().to_string();
        if key.is_empty() {
            return Err(eyre!("API key cannot be empty"));
        }
        credentials.set_tmdb_api_key(key);
        config.tmdb.enabled = true;
    }
    if clear {
        credentials.clear_tmdb_api_key();
    }
    if enable {
        config.tmdb.enabled = true;
    }
    if disable {
        config.tmdb.enabled = false;
    }

    credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;
    config
        .save_to_file(&paths.config_file())
        .map_err(|e| eyre!("Failed to save config: {}", e))?;

    let masked = mask_string(credentials.stored_tmdb_api_key().map(String::as_str).unwrap_or_default());
    if output.is_human() {
        output.success(format!(
            "TMDB {} (API key: {})",
            if config.tmdb.enabled { "enabled" } else { "disabled" },
            masked
        ));
    } else {
        output.json(&json!({
            "enabled": config.tmdb.enabled,
            "apiKey": masked,
        }));
    }
    Ok(())
}

fn init_config(paths: &PathManager, force: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {}. Use --force to overwrite",
            config_file.display()
        ));
        return Ok(());
    }

    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;
    Config::default()
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write config: {}", e))?;

    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}
