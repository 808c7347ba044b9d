use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, warn};

use forestry_rating::api::ApiClient;
use forestry_rating::credentials::{get_token_from_env, resolve_token, settle_actor};
use forestry_rating::model::{ForestryId, IndicatorId, Period, Role, SectionId};
use forestry_rating::store::{RatingStore, StoreError};

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;
const EXIT_PERMISSION: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and store the session token
    Login,
    /// Create an account, then log in with it
    Register {
        /// Role to request (the server defaults to viewer)
        #[arg(long, value_parser = ["admin", "engineer", "viewer"])]
        role: Option<String>,
    },
    /// Remove the stored session
    Logout,
    /// Rank forestries by total score (default if no subcommand)
    List,
    /// Show the per-indicator scores of one forestry
    Show {
        /// Forestry id (as shown in list)
        forestry: ForestryId,
        /// Only indicators of this section
        #[arg(long)]
        section: Option<SectionId>,
    },
    /// Record a raw value for a forestry and indicator
    Set {
        forestry: ForestryId,
        indicator: IndicatorId,
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
}

#[derive(Parser, Debug)]
#[command(name = "forestry-rating")]
#[command(about = "Forestry rating by weighted indicators", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file (defaults to ~/.config/forestry-rating/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Rating period as YYYY-MM (defaults to config, then the current month)
    #[arg(short, long, global = true)]
    period: Option<Period>,

    /// Tab-separated output for scripting
    #[arg(long, global = true)]
    tsv: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn exit_code_for(err: &StoreError) -> i32 {
    if err.api_error().is_auth() {
        EXIT_AUTH
    } else {
        EXIT_NETWORK
    }
}

fn report(err: &dyn std::error::Error) {
    eprintln!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

#[tokio::main]
async fn main() {
    // Pick ring explicitly; fails only if a provider is already installed
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let command = cli.command.unwrap_or(Commands::List);

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match forestry_rating::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = forestry_rating::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let session_path = match forestry_rating::session::get_session_path() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Session management needs no data
    match command {
        Commands::Login | Commands::Register { .. } => {
            let client = match ApiClient::new(&config.api_url, None, config.timeout()) {
                Ok(c) => c,
                Err(e) => {
                    report(&e);
                    std::process::exit(EXIT_CONFIG);
                }
            };
            let result = match &command {
                Commands::Register { role } => {
                    let role = role.as_deref().map(Role::from_persisted);
                    forestry_rating::credentials::register_interactive(&client, &session_path, role)
                        .await
                }
                _ => forestry_rating::credentials::login_interactive(&client, &session_path).await,
            };
            match result {
                Ok(session) => {
                    println!(
                        "Logged in as {} ({:?}).",
                        session.actor.email, session.actor.role
                    );
                    std::process::exit(EXIT_SUCCESS);
                }
                Err(e) => {
                    eprintln!("{:#}", e);
                    std::process::exit(EXIT_AUTH);
                }
            }
        }
        Commands::Logout => {
            if let Err(e) = forestry_rating::session::clear_session(&session_path) {
                eprintln!("{:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
            println!("Logged out.");
            std::process::exit(EXIT_SUCCESS);
        }
        _ => {}
    }

    let session = match forestry_rating::session::load_session(&session_path) {
        Ok(s) => s,
        Err(e) => {
            warn!("ignoring stored session: {:#}", e);
            None
        }
    };

    let token = resolve_token(session.as_ref(), &config.api_url);
    let mut client = match ApiClient::new(&config.api_url, token.clone(), config.timeout()) {
        Ok(c) => c,
        Err(e) => {
            report(&e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Check the token with the server; a stored role may be stale
    let actor = match token {
        Some(_) => {
            let stored = session
                .filter(|s| get_token_from_env().is_none() && s.matches_api(&config.api_url))
                .map(|s| (session_path.as_path(), s));
            match settle_actor(client.me().await, stored) {
                Ok(Some(actor)) => Some(actor),
                Ok(None) => {
                    eprintln!("Session expired or token rejected; continuing read-only. Run `forestry-rating login`.");
                    client = match ApiClient::new(&config.api_url, None, config.timeout()) {
                        Ok(c) => c,
                        Err(e) => {
                            report(&e);
                            std::process::exit(EXIT_CONFIG);
                        }
                    };
                    None
                }
                Err(e) => {
                    report(&e);
                    std::process::exit(EXIT_NETWORK);
                }
            }
        }
        None => None,
    };
    debug!(actor = ?actor, "acting as");

    let period = cli
        .period
        .or(config.period)
        .unwrap_or_else(Period::current);

    let mut store = RatingStore::new(config.scoring.clone().unwrap_or_default(), period);
    store.set_actor(actor);

    if let Err(e) = store.load_all_data(&client, period).await {
        report(&e);
        std::process::exit(exit_code_for(&e));
    }

    let use_colors = forestry_rating::output::should_use_colors();

    match command {
        Commands::List => {
            let ranking = store.ranking(period);
            let output = if cli.tsv {
                forestry_rating::output::format_tsv(&ranking)
            } else {
                forestry_rating::output::format_ranking_table(&ranking, period, use_colors)
            };
            println!("{}", output);
        }
        Commands::Show { forestry, section } => {
            let Some(entry) = store.forestry(forestry) else {
                eprintln!("Unknown forestry {}.", forestry);
                std::process::exit(EXIT_CONFIG);
            };
            let rows = match section {
                Some(section) => store.section_breakdown(forestry, section, period),
                None => store.breakdown(forestry, period),
            };
            if cli.tsv {
                for row in &rows {
                    println!(
                        "{}\t{}\t{}\t{}\t{}",
                        row.indicator.id,
                        row.indicator.name,
                        row.value,
                        forestry_rating::output::format_score(row.score),
                        row.class
                    );
                }
            } else {
                let total = store.get_total_score(forestry, period);
                println!(
                    "{}",
                    forestry_rating::output::format_breakdown(entry, period, &rows, &total, use_colors)
                );
            }
        }
        Commands::Set {
            forestry,
            indicator,
            value,
        } => {
            if store.forestry(forestry).is_none() {
                eprintln!("Unknown forestry {}.", forestry);
                std::process::exit(EXIT_CONFIG);
            }
            if store.indicator(indicator).is_none() {
                eprintln!("Unknown or inactive indicator {}.", indicator);
                std::process::exit(EXIT_CONFIG);
            }
            if !store.can_edit_indicator(indicator) {
                eprintln!(
                    "You are not allowed to edit indicator {}. Log in as an admin or as an engineer responsible for it.",
                    indicator
                );
                std::process::exit(EXIT_PERMISSION);
            }

            if let Err(e) = store
                .save_value(&client, forestry, indicator, value, period)
                .await
            {
                report(&e);
                std::process::exit(exit_code_for(&e));
            }

            let score = store.get_score(forestry, indicator, period);
            println!(
                "Saved {} for forestry {}, indicator {} ({}). Score: {}, total: {}",
                value,
                forestry,
                indicator,
                period,
                forestry_rating::output::format_score(score),
                store.get_total_score(forestry, period)
            );
        }
        Commands::Login | Commands::Register { .. } | Commands::Logout => {
            unreachable!("handled before loading data")
        }
    }

    std::process::exit(EXIT_SUCCESS);
}
