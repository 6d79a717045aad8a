use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::filter::LevelFilter;

use psi_board::api::{fetch_sites_by_audit_type, ApiClient, AuthError};
use psi_board::audit::{filter_live, partition_sites, AuditType, LiveStatus, Site};
use psi_board::config::{Config, API_KEY_ENV};
use psi_board::insights::{self, MetricKey};
use psi_board::output;
use psi_board::scoring::{self, Direction, ScoringConfig};

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    /// Aligned columns, colored when stdout is a terminal
    #[default]
    Table,
    /// Tab-separated leaderboard rows; other commands print a plain table
    Tsv,
    /// Pretty-printed JSON
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank sites by weighted score change since the previous audit (default)
    Leaderboard {
        /// Show the biggest regressions first instead of the biggest improvements
        #[arg(long)]
        losers: bool,

        /// Only print the first N entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Current scores of all successfully audited sites
    Scores {
        /// Column to sort by (performance, seo, accessibility, best-practices, totalBlockingTime)
        #[arg(long, default_value = "performance")]
        sort: MetricKey,

        /// Sort highest first
        #[arg(long)]
        descending: bool,
    },
    /// Sites whose latest audit failed
    Errors,
    /// Sites with audits switched off for the selected audit type
    Disabled,
    /// Number of sites per score range and category
    Distribution,
    /// Previous vs current value of one metric per site
    Delta {
        #[arg(short, long, default_value = "performance")]
        metric: MetricKey,
    },
    /// Latest mobile vs desktop performance per site
    Compare {
        /// Desktop site list, required together with --input
        #[arg(long)]
        desktop_input: Option<PathBuf>,
    },
    /// Audit history of one site for the selected audit type, newest first
    History {
        /// Site id; with --input the file holds this site's audit list instead
        site_id: String,
    },
    /// Organizations known to the API
    Organizations,
}

#[derive(Parser, Debug)]
#[command(name = "psi-board")]
#[command(about = "Lighthouse/PSI leaderboards and score summaries", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/psi-board/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Read sites (or, for history, audits) from a JSON file instead of the API
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Audit type to load (lhs-mobile, lhs-desktop, cwv, 404)
    #[arg(short = 't', long, global = true, default_value = "lhs-mobile")]
    audit_type: AuditType,

    /// Restrict to live or non-live sites (all, live, non-live)
    #[arg(long, global = true, default_value = "all")]
    live: LiveStatus,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_with(code: i32, message: impl Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(code);
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with(EXIT_CONFIG, format!("Failed to serialize output: {}", e)),
    }
}

/// Exit for a failed API call; a rejected key is an auth failure, anything
/// else a network failure.
fn exit_api_error(context: &str, e: anyhow::Error) -> ! {
    let code = if e.downcast_ref::<AuthError>().is_some() {
        EXIT_AUTH
    } else {
        EXIT_NETWORK
    };
    exit_with(code, format!("{}: {:#}", context, e))
}

fn create_client(config: &Config) -> ApiClient {
    let api_config = match config.api.resolve(std::env::var(API_KEY_ENV).ok()) {
        Ok(c) => c,
        Err(e) => exit_with(EXIT_CONFIG, format!("Config error: {}", e)),
    };
    match ApiClient::new(api_config) {
        Ok(client) => client,
        Err(e) => exit_with(EXIT_NETWORK, format!("Failed to create API client: {:#}", e)),
    }
}

fn load_input(path: &Path) -> Vec<Site> {
    match psi_board::audit::load_sites(path) {
        Ok(sites) => sites,
        Err(e) => exit_with(EXIT_CONFIG, format!("Input error: {:#}", e)),
    }
}

async fn load_sites(input: Option<&Path>, config: &Config, audit_type: AuditType) -> Vec<Site> {
    if let Some(path) = input {
        return load_input(path);
    }

    let client = create_client(config);
    match client.sites_with_latest_audits(audit_type).await {
        Ok(sites) => sites,
        Err(e) => exit_api_error(&format!("Failed to load {} sites", audit_type), e),
    }
}

async fn load_strategy_pair(
    input: Option<&Path>,
    desktop_input: Option<&Path>,
    config: &Config,
) -> (Vec<Site>, Vec<Site>) {
    match (input, desktop_input) {
        (Some(mobile), Some(desktop)) => (load_input(mobile), load_input(desktop)),
        (Some(_), None) | (None, Some(_)) => exit_with(
            EXIT_CONFIG,
            "compare needs both --input (mobile) and --desktop-input, or neither to fetch from the API",
        ),
        (None, None) => {
            let client = create_client(config);
            let types = [AuditType::LighthouseMobile, AuditType::LighthouseDesktop];
            match fetch_sites_by_audit_type(&client, &types).await {
                Ok(mut by_type) => (
                    by_type.remove(&AuditType::LighthouseMobile).unwrap_or_default(),
                    by_type.remove(&AuditType::LighthouseDesktop).unwrap_or_default(),
                ),
                Err(e) => exit_api_error("Failed to load sites", e),
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let Cli {
        verbose,
        config,
        input,
        audit_type,
        live,
        format,
        command,
    } = Cli::parse();

    init_logging(verbose);

    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        log::debug!("rustls crypto provider already installed");
    }

    let command = command.unwrap_or(Commands::Leaderboard {
        losers: false,
        limit: None,
    });
    let start_time = Instant::now();

    // Load config
    let config_path = config.map(PathBuf::from);
    let config = match psi_board::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => exit_with(EXIT_CONFIG, format!("Config error: {:#}", e)),
    };

    // Validate scoring config at startup
    let effective_scoring: ScoringConfig = config.scoring.clone().unwrap_or_default();
    if let Err(errors) = scoring::validate_scoring(&effective_scoring) {
        eprintln!("Scoring config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let use_colors = format == OutputFormat::Table && output::should_use_colors();

    match &command {
        Commands::History { site_id } => {
            let audits = match input.as_deref() {
                Some(path) => match psi_board::audit::load_audits(path) {
                    Ok(audits) => audits,
                    Err(e) => exit_with(EXIT_CONFIG, format!("Input error: {:#}", e)),
                },
                None => match create_client(&config)
                    .audits_for_site(site_id, audit_type)
                    .await
                {
                    Ok(audits) => audits,
                    Err(e) => exit_api_error(&format!("Failed to load audits of {}", site_id), e),
                },
            };
            match format {
                OutputFormat::Json => print_json(&audits),
                _ => println!("{}", output::format_audit_history(&audits, use_colors)),
            }
            std::process::exit(EXIT_SUCCESS);
        }
        Commands::Organizations => {
            if input.is_some() {
                exit_with(EXIT_CONFIG, "organizations are only available from the API");
            }
            let organizations = match create_client(&config).organizations().await {
                Ok(orgs) => orgs,
                Err(e) => exit_api_error("Failed to load organizations", e),
            };
            match format {
                OutputFormat::Json => print_json(&organizations),
                _ => println!("{}", output::format_organizations(&organizations)),
            }
            std::process::exit(EXIT_SUCCESS);
        }
        _ => {}
    }

    if let Commands::Compare { desktop_input } = &command {
        let (mobile, desktop) =
            load_strategy_pair(input.as_deref(), desktop_input.as_deref(), &config).await;
        let pairs = insights::performance_pairs(
            &filter_live(&mobile, live),
            &filter_live(&desktop, live),
        );
        match format {
            OutputFormat::Json => print_json(&pairs),
            _ => println!("{}", output::format_performance_pairs(&pairs)),
        }
        log::debug!("Done in {:?}", start_time.elapsed());
        std::process::exit(EXIT_SUCCESS);
    }

    let sites = load_sites(input.as_deref(), &config, audit_type).await;
    let buckets = partition_sites(&sites, audit_type, live);

    match command {
        Commands::Leaderboard { losers, limit } => {
            let mut entries = scoring::compute_leaderboard(
                &buckets.scored,
                Direction::from_show_winners(!losers),
                &effective_scoring,
            );
            if let Some(limit) = limit {
                entries.truncate(limit);
            }
            match format {
                OutputFormat::Table => {
                    println!("{}", output::format_leaderboard_table(&entries, use_colors))
                }
                OutputFormat::Tsv => println!("{}", output::format_leaderboard_tsv(&entries)),
                OutputFormat::Json => print_json(&entries),
            }
        }
        Commands::Scores { sort, descending } => {
            let sorted = insights::sort_by_column(&buckets.scored, sort, !descending);
            match format {
                OutputFormat::Json => print_json(&sorted),
                _ => println!("{}", output::format_scores_table(&sorted, use_colors)),
            }
        }
        Commands::Errors => match format {
            OutputFormat::Json => print_json(&buckets.errors),
            _ => println!("{}", output::format_errors(&buckets.errors, use_colors)),
        },
        Commands::Disabled => match format {
            OutputFormat::Json => print_json(&buckets.disabled),
            _ => println!("{}", output::format_site_list(&buckets.disabled)),
        },
        Commands::Distribution => {
            let rows = insights::score_distribution(&buckets.scored);
            match format {
                OutputFormat::Json => print_json(&rows),
                _ => println!("{}", output::format_distribution(&rows)),
            }
        }
        Commands::Delta { metric } => {
            let series = insights::delta_series(&filter_live(&sites, live), metric);
            match format {
                OutputFormat::Json => print_json(&series),
                _ => println!("{}", output::format_delta_series(&series, metric)),
            }
        }
        Commands::Compare { .. } | Commands::History { .. } | Commands::Organizations => {
            unreachable!("handled above")
        }
    }

    log::debug!(
        "{} sites ({} scored, {} errors, {} disabled) in {:?}",
        sites.len(),
        buckets.scored.len(),
        buckets.errors.len(),
        buckets.disabled.len(),
        start_time.elapsed()
    );

    std::process::exit(EXIT_SUCCESS);
}
