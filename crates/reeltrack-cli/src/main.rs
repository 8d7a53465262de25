use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::{backup, collection, config, context::AppContext, episodes, remote};
use std::path::PathBuf;
use tracker_core::{MediaFilter, SortOrder, WatchFilter};
use tracker_models::MediaKind;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "reeltrack")]
#[command(about = "ReelTrack - Keep track of the movies and shows you watch")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a movie or TV show to the collection
    #[command(long_about = "Add a title to the collection by hand. TV shows get an episode list built from --seasons and --episodes; without them a single season of 10 episodes is created. A '(YYYY)' suffix in the title is used as the year when --year is not given.")]
    Add {
        /// Title, e.g. "Alien (1979)"
        title: String,

        /// Media type: movie or tv
        #[arg(long = "type", short = 't', default_value = "movie")]
        kind: MediaKind,

        /// Release year
        #[arg(long)]
        year: Option<u32>,

        /// Genres (comma separated)
        #[arg(long, value_delimiter = ',')]
        genre: Vec<String>,

        /// Number of seasons (TV only)
        #[arg(long)]
        seasons: Option<u32>,

        /// Total number of episodes across all seasons (TV only)
        #[arg(long)]
        episodes: Option<u32>,
    },

    /// Search TMDB and add a result
    #[command(long_about = "Search The Movie Database for a title. Pick a result interactively or pass --add with its number; the details (genres, overview, cast, seasons) are fetched and the title is added to the collection.")]
    Find {
        /// Search query (at least 2 characters)
        query: String,

        /// Search TV shows instead of movies
        #[arg(long, action = ArgAction::SetTrue)]
        tv: bool,

        /// Add the result with this number without prompting
        #[arg(long, value_name = "N")]
        add: Option<usize>,
    },

    /// List the collection with filters and sorting
    #[command(long_about = "List items in the collection. Filters and sort order default to the last saved selection; use --save to remember the current one and --reset to go back to defaults.")]
    List {
        /// Media filter: all, movie or tv
        #[arg(long = "type", short = 't')]
        media: Option<MediaFilter>,

        /// Watch status: all, watchlist or watched
        #[arg(long)]
        status: Option<WatchFilter>,

        /// Genre substring
        #[arg(long)]
        genre: Option<String>,

        /// Search term over title, genres and type
        #[arg(long)]
        search: Option<String>,

        /// Sort: added, title, title-desc, year, year-old, rating
        #[arg(long)]
        sort: Option<SortOrder>,

        /// Remember this selection for the next list
        #[arg(long, action = ArgAction::SetTrue)]
        save: bool,

        /// Forget the saved selection
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "save")]
        reset: bool,
    },

    /// Show one item with its episode progress
    Show {
        /// Item id or title
        item: String,
    },

    /// Search the collection
    Search {
        /// Case-insensitive term matched against title, genres and type
        term: String,
    },

    /// Toggle the watched state of a movie (or unmark a finished show)
    Watch {
        /// Item id or title
        item: String,
    },

    /// Rate and review a watched item
    Rate {
        /// Item id or title
        item: String,

        /// Rating from 1 to 10, 0 clears it
        #[arg(value_parser = clap::value_parser!(u8).range(0..=10))]
        rating: u8,

        /// Review text
        #[arg(long)]
        review: Option<String>,
    },

    /// Edit title, year or genres of an item
    Edit {
        /// Item id or title
        item: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, conflicts_with = "clear_year")]
        year: Option<u32>,

        /// Remove the year
        #[arg(long, action = ArgAction::SetTrue)]
        clear_year: bool,

        /// Replace genres (comma separated)
        #[arg(long, value_delimiter = ',')]
        genre: Option<Vec<String>>,
    },

    /// Delete an item
    Delete {
        /// Item id or title
        item: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y', action = ArgAction::SetTrue)]
        yes: bool,
    },

    /// Toggle one episode of a show
    #[command(long_about = "Toggle the watched state of one episode. When earlier episodes are still unwatched you are asked whether to mark them too; use --cascade or --no-cascade to decide up front.")]
    Episode {
        /// Item id or title
        item: String,

        season: u32,

        episode: u32,

        /// Also mark earlier unwatched episodes
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "no_cascade")]
        cascade: bool,

        /// Only toggle this episode
        #[arg(long, action = ArgAction::SetTrue)]
        no_cascade: bool,
    },

    /// Mark every episode of a season as watched
    Season {
        /// Item id or title
        item: String,

        season: u32,
    },

    /// Mark every episode of a show as watched (or unwatched)
    EpisodesAll {
        /// Item id or title
        item: String,

        /// Unmark instead of mark
        #[arg(long, action = ArgAction::SetTrue)]
        unwatch: bool,
    },

    /// Collection statistics
    Stats,

    /// Export the collection to a JSON backup file
    Export {
        /// Output file (defaults to reeltrack-backup-YYYY-MM-DD.json in the backup directory)
        #[arg(long, short = 'p')]
        path: Option<PathBuf>,
    },

    /// Replace the collection with a JSON backup file
    Import {
        /// Backup file (.json)
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y', action = ArgAction::SetTrue)]
        yes: bool,
    },

    /// Fetch TMDB metadata for items that carry a TMDB id
    Enrich {
        /// Refetch metadata that is already present
        #[arg(long, action = ArgAction::SetTrue)]
        refresh: bool,
    },

    /// Configure settings and the TMDB API key
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks the API key)
    Show,

    /// Configure TMDB access
    #[command(long_about = "Store a TMDB API key in the credentials file and enable or disable metadata lookups. Get a key at https://www.themoviedb.org/settings/api. The TMDB_API_KEY environment variable takes precedence over the stored key.")]
    Tmdb {
        /// TMDB API key (if not provided, will prompt)
        #[arg(long)]
        api_key: Option<String>,

        /// Enable TMDB lookups
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "disable")]
        enable: bool,

        /// Disable TMDB lookups
        #[arg(long, action = ArgAction::SetTrue)]
        disable: bool,

        /// Remove the stored API key
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "api_key")]
        clear: bool,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let output = output::Output::new(cli.output, cli.quiet);

    let paths = tracker_config::PathManager::default();

    // Config commands must work even when the file is broken
    if let Commands::Config { cmd } = cli.command {
        logging::init_logging(cli.verbose, cli.quiet, "warn", None)
            .map_err(|e| eyre!("{}", e))?;
        return config::run_config(cmd, &paths, &output).await;
    }

    let settings = AppContext::load_config(&paths)?;
    let log_file = settings.logging.file.then(|| paths.log_file());
    logging::init_logging(
        cli.verbose,
        cli.quiet,
        &settings.logging.level,
        log_file.as_deref(),
    )
    .map_err(|e| eyre!("{}", e))?;

    let mut ctx = AppContext::open(paths, settings)?;

    match cli.command {
        Commands::Add {
            title,
            kind,
            year,
            genre,
            seasons,
            episodes,
        } => collection::run_add(&mut ctx, title, kind, year, genre, seasons, episodes, &output),
        Commands::Find { query, tv, add } => remote::run_find(&mut ctx, query, tv, add, &output).await,
        Commands::List {
            media,
            status,
            genre,
            search,
            sort,
            save,
            reset,
        } => {
            let args = collection::ListArgs {
                media,
                status,
                genre,
                search,
                sort,
                save,
                reset,
            };
            collection::run_list(&ctx, args, &output)
        }
        Commands::Show { item } => collection::run_show(&mut ctx, &item, &output),
        Commands::Search { term } => collection::run_search(&ctx, &term, &output),
        Commands::Watch { item } => collection::run_watch(&mut ctx, &item, &output),
        Commands::Rate {
            item,
            rating,
            review,
        } => collection::run_rate(&mut ctx, &item, rating, review, &output),
        Commands::Edit {
            item,
            title,
            year,
            clear_year,
            genre,
        } => collection::run_edit(&mut ctx, &item, title, year, clear_year, genre, &output),
        Commands::Delete { item, yes } => collection::run_delete(&mut ctx, &item, yes, &output),
        Commands::Episode {
            item,
            season,
            episode,
            cascade,
            no_cascade,
        } => {
            let choice = match (cascade, no_cascade) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            episodes::run_episode(&mut ctx, &item, season, episode, choice, &output)
        }
        Commands::Season { item, season } => episodes::run_season(&mut ctx, &item, season, &output),
        Commands::EpisodesAll { item, unwatch } => {
            episodes::run_all(&mut ctx, &item, unwatch, &output)
        }
        Commands::Stats => collection::run_stats(&ctx, &output),
        Commands::Export { path } => backup::run_export(&ctx, path, &output),
        Commands::Import { file, yes } => backup::run_import(&mut ctx, &file, yes, &output),
        Commands::Enrich { refresh } => remote::run_enrich(&mut ctx, refresh, &output).await,
        // Handled before the store is opened
        Commands::Config { .. } => Ok(()),
    }
}
