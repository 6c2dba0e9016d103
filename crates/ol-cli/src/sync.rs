use std::sync::Arc;

use ol_compiler::CompiledConfig;
use ol_core::{OriginSync, RecordingHost};

pub struct SyncOptions {
    pub webviews: u32,
    /// (origin, allow_subdomains)
    pub origins: Vec<(String, bool)>,
}

/// Parse `url` or `url=sub` into an origin grant.
pub fn parse_origin_arg(raw: &str) -> (String, bool) {
    match raw.strip_suffix("=sub") {
        Some(url) => (url.to_string(), true),
        None => (raw.to_string(), false),
    }
}

/// Run origin sync against a recording host and print every entry installed.
pub fn run_sync(compiled: CompiledConfig, opts: SyncOptions) -> Result<(), String> {
    if opts.webviews == 0 {
        return Err("At least one webview is required".to_string());
    }

    let mut sync = OriginSync::new(Arc::new(compiled.whitelist), RecordingHost::<u32>::new())
        .with_internal_endpoint(compiled.internal_endpoint);

    for webview in 0..opts.webviews {
        sync.add_webview(webview);
    }

    for (origin, allow_subdomains) in &opts.origins {
        let before = sync.domains().len();
        sync.add_origin_access(origin, *allow_subdomains);
        if sync.domains().len() == before {
            println!("skipped {} (known or not whitelisted)", origin);
        }
    }

    println!("Domains:");
    for domain in sync.domains() {
        println!(
            "  {}{}",
            domain.marker,
            if domain.allow_subdomains { " (+subdomains)" } else { "" }
        );
    }
    println!();

    let entries = sync.host().entries();
    println!("Permission entries ({}):", entries.len());
    for entry in &entries {
        println!(
            "  [webview {}] {} -> {}{}",
            entry.webview,
            entry.source,
            entry.destination,
            if entry.allow_subdomains { " (+subdomains)" } else { "" }
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origin_arg() {
        assert_eq!(parse_origin_arg("http://a.com"), ("http://a.com".to_string(), false));
        assert_eq!(parse_origin_arg("http://a.com=sub"), ("http://a.com".to_string(), true));
        assert_eq!(parse_origin_arg("http://a.com/p?x=1"), ("http://a.com/p?x=1".to_string(), false));
    }
}
