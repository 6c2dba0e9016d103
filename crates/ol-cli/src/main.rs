//! originlist CLI
//!
//! CLI tool for querying access configurations and dry-running origin sync.

mod bench;
mod config;
mod sync;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use ol_core::{Access, Whitelist};

use crate::config::load_config;

#[derive(Parser)]
#[command(name = "ol-cli")]
#[command(about = "originlist access configuration tools")]
struct Cli {
    /// Debug logging on stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether URLs are allowed
    Check {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// URLs to check
        #[arg(required = true)]
        urls: Vec<String>,

        /// Treat the requests as XHR (global access does not apply)
        #[arg(long)]
        xhr: bool,

        /// Print one JSON report per URL
        #[arg(long)]
        json: bool,
    },

    /// List the features granted to a URL
    Features {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        url: String,
    },

    /// Show which rule decides a URL and how the rules are indexed
    Explain {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        url: String,
    },

    /// Dry-run origin sync and print the permission entries it installs
    Sync {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Number of webviews to register
        #[arg(short, long, default_value_t = 1)]
        webviews: u32,

        /// Extra origins granted at runtime; suffix with `=sub` to allow subdomains
        #[arg(short, long)]
        origin: Vec<String>,
    },

    /// Benchmark lookup latency for a configuration
    Bench {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Passes over the derived request set
        #[arg(short, long, default_value_t = 2000)]
        iterations: usize,

        /// Fail if p99 latency exceeds this many microseconds
        #[arg(long)]
        budget_us: Option<f64>,
    },
}

#[derive(Serialize)]
struct UrlReport<'a> {
    url: &'a str,
    allowed: bool,
    rule: Option<&'a str>,
    features: Vec<&'a str>,
}

fn main() {
    let cli = Cli::parse();

    // logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();

    let result = match cli.command {
        Commands::Check {
            config,
            urls,
            xhr,
            json,
        } => load_config(&config)
            .and_then(|compiled| cmd_check(&compiled.whitelist, &urls, xhr, json)),
        Commands::Features { config, url } => load_config(&config)
            .map(|compiled| cmd_features(&compiled.whitelist, &url)),
        Commands::Explain { config, url } => load_config(&config)
            .map(|compiled| cmd_explain(&compiled.whitelist, &url)),
        Commands::Sync {
            config,
            webviews,
            origin,
        } => load_config(&config).and_then(|compiled| {
            let origins = origin.iter().map(|raw| sync::parse_origin_arg(raw)).collect();
            sync::run_sync(compiled, sync::SyncOptions { webviews, origins })
        }),
        Commands::Bench {
            config,
            iterations,
            budget_us,
        } => load_config(&config).and_then(|compiled| {
            bench::run_bench(
                &compiled.whitelist,
                bench::BenchOptions {
                    iterations,
                    budget_p99_us: budget_us,
                },
            )
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn url_report<'a>(whitelist: &'a Whitelist, url: &'a str, xhr: bool) -> UrlReport<'a> {
    let rule = whitelist
        .resolver()
        .get_access_by_url(url)
        .and_then(|access| access.rule());
    UrlReport {
        url,
        allowed: whitelist.is_access_allowed(url, xhr),
        rule: rule.map(|r| r.raw_uri.as_str()),
        features: rule
            .map(|r| r.features.iter().map(|f| f.as_str()).collect())
            .unwrap_or_default(),
    }
}

/// Exits non-zero when any URL is denied.
fn cmd_check(whitelist: &Whitelist, urls: &[String], xhr: bool, json: bool) -> Result<(), String> {
    let mut denied = 0usize;

    for url in urls {
        let report = url_report(whitelist, url, xhr);
        if !report.allowed {
            denied += 1;
        }

        if json {
            let line = serde_json::to_string(&report)
                .map_err(|e| format!("Failed to encode report: {}", e))?;
            println!("{}", line);
        } else {
            println!(
                "{} {}{}",
                if report.allowed { "ALLOW" } else { "DENY " },
                url,
                report.rule.map(|r| format!("  [{}]", r)).unwrap_or_default()
            );
        }
    }

    if denied > 0 {
        return Err(format!("{} of {} URL(s) denied", denied, urls.len()));
    }
    Ok(())
}

fn cmd_features(whitelist: &Whitelist, url: &str) {
    for feature in whitelist.get_features_for_url(url) {
        println!("{}", feature);
    }
}

fn cmd_explain(whitelist: &Whitelist, url: &str) {
    let explained = whitelist.explain(url);

    println!("URL: {}", explained.url);
    println!("  Allowed:      {}", explained.allowed);
    println!("  XHR allowed:  {}", explained.xhr_allowed);
    match explained.access {
        Some(Access::Rule(rule)) => {
            println!("  Rule:         {}", rule.raw_uri);
            println!("  Subdomains:   {}", rule.allow_subdomain);
            let features: Vec<&str> = rule.features.iter().map(|f| f.as_str()).collect();
            println!("  Features:     [{}]", features.join(", "));
        }
        Some(Access::Unconditional) => println!("  Rule:         (data URI, always allowed)"),
        None => println!("  Rule:         (none)"),
    }
    println!();

    let resolver = whitelist.resolver();
    println!("Rules: {} (global access: {})", resolver.rules().len(), resolver.global_access());
    if let Some(local) = resolver.local_access() {
        println!("  Local access: {} feature(s)", local.features.len());
    }
    println!("Indices:");
    for stat in resolver.index_stats() {
        println!(
            "  {}://{}  {} folder(s), max depth {}",
            stat.scheme, stat.authority, stat.entries, stat.max_depth
        );
    }
}
