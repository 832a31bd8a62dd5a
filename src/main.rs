use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use eventscout::browse::{Pagination, SearchBox, SearchState};
use eventscout::commands::{self, ListingPage};
use eventscout::config::AppConfig;
use eventscout::context::AppContext;
use eventscout::favorites::Category;
use eventscout::seatgeek::models::{format_datetime, Event, EventQuery, Venue, VenueQuery};

#[derive(Parser)]
#[command(name = "eventscout", about = "Browse events and venues, keep favorites", version)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding the local storage file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the favorites list
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Search upcoming events
    Events {
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(short = 't', long = "type", default_value = "concert")]
        event_type: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show one event
    Event { id: i64 },
    /// Search venues by name or city
    Venues {
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show one venue
    Venue { id: i64 },
    /// Search interactively: type to search, `:n`/`:p` to page, `:q` to quit
    Browse {
        #[arg(value_enum)]
        target: BrowseTarget,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BrowseTarget {
    Events,
    Venues,
}

#[derive(Subcommand)]
enum FavoritesAction {
    List {
        #[arg(short, long)]
        category: Option<Category>,
    },
    Add {
        category: Category,
        id: i64,
        name: String,
    },
    Remove {
        category: Category,
        id: i64,
    },
    Toggle {
        category: Category,
        id: i64,
        name: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn star(is_favorite: bool) -> &'static str {
    if is_favorite {
        "*"
    } else {
        " "
    }
}

fn print_events(listing: &ListingPage<Event>) {
    if listing.items.is_empty() {
        println!("No data found");
    }
    for row in &listing.items {
        let event = &row.item;
        println!(
            "{} {:>9}  {:<40} {} ({})",
            star(row.is_favorite),
            event.id,
            event.short_title,
            event.display_datetime(),
            event.venue.name_v2
        );
    }
    println!("{}", listing.pagination.label());
}

fn print_venues(listing: &ListingPage<Venue>) {
    if listing.items.is_empty() {
        println!("No data found");
    }
    for row in &listing.items {
        let venue = &row.item;
        println!(
            "{} {:>9}  {:<40} {} ({} upcoming)",
            star(row.is_favorite),
            venue.id,
            venue.name_v2,
            venue.display_location,
            venue.num_upcoming_events
        );
    }
    println!("{}", listing.pagination.label());
}

async fn show_page(
    ctx: &AppContext,
    config: &AppConfig,
    target: BrowseTarget,
    search: &SearchState,
    json: bool,
) -> anyhow::Result<Pagination> {
    match target {
        BrowseTarget::Events => {
            let base = EventQuery {
                per_page: config.page_size,
                ..EventQuery::default()
            };
            let listing = commands::browse_events(ctx, search, &base).await?;
            if json {
                print_json(&listing)?;
            } else {
                print_events(&listing);
            }
            Ok(listing.pagination)
        }
        BrowseTarget::Venues => {
            let base = VenueQuery {
                per_page: config.page_size,
                ..VenueQuery::default()
            };
            let listing = commands::browse_venues(ctx, search, &base).await?;
            if json {
                print_json(&listing)?;
            } else {
                print_venues(&listing);
            }
            Ok(listing.pagination)
        }
    }
}

async fn run_browse(
    ctx: &AppContext,
    config: &AppConfig,
    target: BrowseTarget,
    json: bool,
) -> anyhow::Result<()> {
    ctx.use_favorites()?.ready().await;

    let mut search = SearchBox::new(config.search_debounce());
    let mut pagination = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut refetch = true;

    println!("Type to search, :n / :p to change page, :q to quit");

    loop {
        if refetch {
            match show_page(ctx, config, target, search.state(), json).await {
                Ok(page) => pagination = Some(page),
                Err(e) => log::error!("{:#}", e),
            }
        }

        refetch = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    ":q" => break,
                    ":n" => pagination
                        .as_ref()
                        .is_some_and(|p| search.state_mut().next_page(p)),
                    ":p" => pagination
                        .as_ref()
                        .is_some_and(|p| search.state_mut().previous_page(p)),
                    text => {
                        search.type_text(text);
                        false
                    }
                }
            }
            settled = search.next_query() => settled.unwrap_or(false),
        };
    }

    Ok(())
}

async fn run_favorites(ctx: &AppContext, action: FavoritesAction, json: bool) -> anyhow::Result<()> {
    let store = ctx.use_favorites()?;
    store.ready().await;

    match action {
        FavoritesAction::List { category } => {
            let items = commands::get_favorites(ctx, category)?;
            if json {
                return print_json(&items);
            }
            if items.is_empty() {
                println!("No favorites yet.");
            }
            for item in items {
                println!("{:<24} {}", item.detail_path(), item.display_name);
            }
        }
        FavoritesAction::Add { category, id, name } => {
            commands::add_favorite(ctx, id, &name, category)?;
            println!("Added /{}/{}", category, id);
        }
        FavoritesAction::Remove { category, id } => {
            commands::remove_favorite(ctx, id, category)?;
            println!("Removed /{}/{}", category, id);
        }
        FavoritesAction::Toggle { category, id, name } => {
            let now = commands::toggle_favorite(ctx, id, &name, category)?;
            if now {
                println!("Added /{}/{}", category, id);
            } else {
                println!("Removed /{}/{}", category, id);
            }
        }
    }

    store.flush().await;
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let ctx = eventscout::bootstrap(&config)
        .await
        .with_context(|| format!("failed to start with data dir {:?}", config.data_dir))?;
    let json = cli.json;

    match cli.command {
        Command::Favorites { action } => run_favorites(&ctx, action, json).await?,
        Command::Events {
            query,
            event_type,
            page,
        } => {
            ctx.use_favorites()?.ready().await;
            let query = EventQuery {
                event_type,
                q: query,
                page,
                per_page: config.page_size,
                ..EventQuery::default()
            };
            let listing = commands::search_events(&ctx, &query).await?;
            if json {
                return print_json(&listing);
            }
            print_events(&listing);
        }
        Command::Event { id } => {
            ctx.use_favorites()?.ready().await;
            let row = commands::get_event(&ctx, id).await?;
            if json {
                return print_json(&row);
            }
            let event = &row.item;
            println!("{} {}", star(row.is_favorite), event.short_title);
            println!("  {} UTC", event.display_datetime());
            if let Some(local) = &event.datetime_local {
                println!("  {} local", format_datetime(local));
            }
            println!("  {}, {}", event.venue.name_v2, event.venue.display_location);
            if let Some(url) = &event.url {
                println!("  {}", url);
            }
        }
        Command::Venues { query, page } => {
            ctx.use_favorites()?.ready().await;
            let query = VenueQuery {
                q: query,
                page,
                per_page: config.page_size,
                ..VenueQuery::default()
            };
            let listing = commands::search_venues(&ctx, &query).await?;
            if json {
                return print_json(&listing);
            }
            print_venues(&listing);
        }
        Command::Venue { id } => {
            ctx.use_favorites()?.ready().await;
            let row = commands::get_venue(&ctx, id).await?;
            if json {
                return print_json(&row);
            }
            let venue = &row.item;
            println!("{} {}", star(row.is_favorite), venue.name_v2);
            println!("  {}", venue.display_location);
            if let Some(address) = &venue.address {
                println!("  {}", address);
            }
            if let Some(capacity) = venue.capacity.filter(|c| *c > 0) {
                println!("  Capacity: {}", capacity);
            }
            println!("  Upcoming events: {}", venue.num_upcoming_events);
        }
        Command::Browse { target } => run_browse(&ctx, &config, target, json).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<eventscout::errors::AppError>() {
            Some(app_error) if json => {
                eprintln!(
                    "{}",
                    serde_json::to_string(app_error).unwrap_or_else(|_| app_error.to_string())
                );
            }
            _ => log::error!("{:#}", e),
        }
        std::process::exit(1);
    }
}
