use std::time::Instant;

use ol_core::{AccessRule, Whitelist};

pub struct BenchOptions {
    pub iterations: usize,
    /// Fail when p99 exceeds this many microseconds.
    pub budget_p99_us: Option<f64>,
}

/// Measure `is_access_allowed` latency over requests derived from the rules.
pub fn run_bench(whitelist: &Whitelist, opts: BenchOptions) -> Result<(), String> {
    let urls = bench_urls(whitelist.resolver().rules());
    if urls.is_empty() {
        return Err("Configuration has no URI rules to benchmark".to_string());
    }

    println!("Access Lookup Benchmark");
    println!("==================================================");
    println!("Requests per iteration: {}", urls.len());

    // First query builds the index.
    let cold_start = Instant::now();
    let _ = whitelist.is_access_allowed(&urls[0], true);
    let cold_start_us = cold_start.elapsed().as_secs_f64() * 1_000_000.0;

    println!("Warming up...");
    for _ in 0..100 {
        for url in &urls {
            let _ = whitelist.is_access_allowed(url, true);
        }
    }

    println!("Measuring lookup latency...");
    let mut latencies = Vec::with_capacity(opts.iterations * urls.len());
    let mut allowed = 0usize;
    for _ in 0..opts.iterations {
        for url in &urls {
            let start = Instant::now();
            let ok = whitelist.is_access_allowed(url, true);
            latencies.push(start.elapsed().as_secs_f64() * 1_000_000.0);
            allowed += ok as usize;
        }
    }
    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let p50 = percentile(&latencies, 0.50);
    let p99 = percentile(&latencies, 0.99);

    println!();
    println!("Results");
    println!("--------------------------------------------------");
    println!("  Index build:   {:.2} μs", cold_start_us);
    println!("  Lookups:       {} ({} allowed)", latencies.len(), allowed);
    println!("  p50:           {:.3} μs", p50);
    println!("  p99:           {:.3} μs", p99);
    println!("  max:           {:.3} μs", latencies.last().copied().unwrap_or(0.0));

    match opts.budget_p99_us {
        Some(limit) if p99 > limit => Err(format!("p99 {:.3} μs exceeds budget {:.3} μs", p99, limit)),
        Some(limit) => {
            println!("✓ p99 within budget ({:.3} μs)", limit);
            Ok(())
        }
        None => Ok(()),
    }
}

/// For every URI rule: the rule itself, a deeper path, a subdomain and a
/// sibling host that should be denied.
fn bench_urls(rules: &[AccessRule]) -> Vec<String> {
    let mut urls = Vec::new();
    for uri in rules.iter().filter_map(AccessRule::uri_ref) {
        if uri.authority.is_empty() {
            continue;
        }
        let path = uri.path.trim_end_matches('/');
        urls.push(uri.source.clone());
        urls.push(format!("{}://{}{}/deeper/page.html", uri.scheme, uri.authority, path));
        urls.push(format!("{}://www.{}{}/index.html", uri.scheme, uri.authority, path));
        urls.push(format!("{}://not-{}/index.html", uri.scheme, uri.authority));
    }
    urls
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64) * p).ceil() as usize;
    let idx = idx.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx]
}
