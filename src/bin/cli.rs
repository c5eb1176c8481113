//! Clubhub CLI
//!
//! Command-line interface for clubs, posts, subscriptions and search.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use clubhub::error::{ClubhubError, Result};
use clubhub::search::{FuzzyCapability, RankedSearch, SearchConfig, SearchPath};
use clubhub::storage::queries::*;
use clubhub::storage::Storage;
use clubhub::types::*;

#[derive(Parser)]
#[command(name = "clubhub")]
#[command(about = "Student club platform CLI")]
#[command(version)]
struct Cli {
    /// Database path
    #[arg(
        long,
        env = "CLUBHUB_DB_PATH",
        default_value = "~/.local/share/clubhub/clubhub.db"
    )]
    db_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage clubs
    Club {
        #[command(subcommand)]
        action: ClubAction,
    },
    /// Register a user
    AddUser {
        /// Unique username
        username: String,
    },
    /// Subscribe a user to a club
    Subscribe {
        user: UserId,
        club: ClubId,
        /// Subscribe without notifications
        #[arg(long)]
        mute: bool,
    },
    /// Remove a subscription
    Unsubscribe { user: UserId, club: ClubId },
    /// Publish a post
    Post {
        /// Club ID
        club: ClubId,
        /// Title
        title: String,
        /// Body text
        #[arg(short, long, default_value = "")]
        content: String,
        /// Post type (post, event, announcement)
        #[arg(short, long, default_value = "post")]
        r#type: String,
        /// Post carries a sign-up form
        #[arg(long)]
        form: bool,
    },
    /// Search posts (newest first when the query is empty)
    Search {
        /// Search query
        #[arg(default_value = "")]
        query: String,
        /// Restrict to one club
        #[arg(long)]
        club: Option<String>,
        /// Restrict to one post type
        #[arg(short, long)]
        r#type: Option<String>,
        /// Only events and posts with forms
        #[arg(long)]
        events: bool,
        /// Maximum results
        #[arg(short, long)]
        limit: Option<String>,
    },
    /// List a user's notifications
    Notifications {
        user: UserId,
        /// Only unread
        #[arg(short, long)]
        unread: bool,
    },
    /// Mark a notification as read
    Read { user: UserId, id: i64 },
    /// Show statistics
    Stats,
}

#[derive(Subcommand)]
enum ClubAction {
    /// Create a club
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// List clubs
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Expand ~ in path
    let db_path = shellexpand::tilde(&cli.db_path).to_string();

    let storage = Storage::open(StorageConfig {
        db_path,
        ..StorageConfig::default()
    })?;

    match cli.command {
        Commands::Club { action } => match action {
            ClubAction::Create { name, description } => {
                let club = storage.with_transaction(|conn| {
                    create_club(
                        conn,
                        &CreateClubInput {
                            name,
                            description,
                            avatar_url: String::new(),
                        },
                    )
                })?;
                println!("Created club #{}: {}", club.id, club.name);
            }
            ClubAction::List => {
                let clubs = storage.with_connection(list_clubs)?;
                for club in clubs {
                    println!("[{}] {}", club.id, club.name);
                }
            }
        },

        Commands::AddUser { username } => {
            let user = storage.with_transaction(|conn| create_user(conn, &username))?;
            println!("Created user #{}: {}", user.id, user.username);
        }

        Commands::Subscribe { user, club, mute } => {
            let sub = storage.with_transaction(|conn| subscribe(conn, user, club, !mute))?;
            println!(
                "User #{} subscribed to club #{} (notifications {})",
                sub.user_id,
                sub.club_id,
                if sub.notifications_enabled { "on" } else { "off" }
            );
        }

        Commands::Unsubscribe { user, club } => {
            if storage.with_transaction(|conn| unsubscribe(conn, user, club))? {
                println!("User #{} unsubscribed from club #{}", user, club);
            } else {
                println!("User #{} was not subscribed to club #{}", user, club);
            }
        }

        Commands::Post {
            club,
            title,
            content,
            r#type,
            form,
        } => {
            let post_type: PostType = r#type.parse().map_err(ClubhubError::InvalidInput)?;
            let post = storage.with_transaction(|conn| {
                create_post(
                    conn,
                    &CreatePostInput {
                        club_id: club,
                        title,
                        content,
                        image_url: String::new(),
                        post_type,
                        is_form: form,
                        published_at: None,
                    },
                )
            })?;
            println!("Published post #{}", post.id);
        }

        Commands::Search {
            query,
            club,
            r#type,
            events,
            limit,
        } => {
            let config = SearchConfig::default();
            let capability = FuzzyCapability::new(Arc::new(storage.clone()));
            let filter = PostFilter::from_params(
                club.as_deref(),
                r#type.as_deref(),
                None,
                events.then_some("true"),
            );
            let limit = clubhub::search::parse_limit(limit.as_deref(), config.max_limit);

            let results =
                RankedSearch::new(&storage, &capability, &config).search(&filter, &query, limit)?;

            if results.hits.is_empty() {
                println!("No posts found.");
            }
            for hit in &results.hits {
                match hit.score {
                    Some(score) => println!(
                        "[{}] {:.3} {} ({})",
                        hit.post.id, score, hit.post.title, hit.post.post_type
                    ),
                    None => println!("[{}] {} ({})", hit.post.id, hit.post.title, hit.post.post_type),
                }
            }
            if results.path == SearchPath::SafetyNet {
                eprintln!("(ranked in process after an empty database result)");
            }
        }

        Commands::Notifications { user, unread } => {
            let notifications =
                storage.with_connection(|conn| list_notifications(conn, user, unread))?;
            for n in notifications {
                let marker = if n.is_read { " " } else { "*" };
                println!("{} [{}] {}", marker, n.id, n.text);
            }
        }

        Commands::Read { user, id } => {
            storage.with_transaction(|conn| mark_notification_read(conn, user, id))?;
            println!("Marked notification #{} as read", id);
        }

        Commands::Stats => {
            let stats = storage.with_connection(platform_stats)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
