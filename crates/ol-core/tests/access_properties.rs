use std::collections::HashSet;
use std::sync::Arc;

use ol_core::origin_sync::OriginPermission;
use ol_core::types::LOCAL_ACCESS_TOKEN;
use ol_core::{Access, AccessResolver, AccessRule, FeatureId, OriginSync, RecordingHost, Whitelist};

fn whitelist(rules: Vec<AccessRule>) -> Whitelist {
    Whitelist::from_rules(rules, false).unwrap()
}

fn raw_uri<'a>(resolver: &'a AccessResolver, url: &str) -> Option<&'a str> {
    resolver
        .get_access_by_url(url)
        .and_then(|access| access.rule())
        .map(|rule| rule.raw_uri.as_str())
}

#[test]
fn end_to_end_camera_feature() {
    let wl = whitelist(vec![AccessRule::new(
        "http://example.com/",
        false,
        vec![FeatureId::from("app.camera")],
    )]);

    assert!(wl.is_access_allowed("http://example.com/index.html", false));
    assert_eq!(
        wl.get_features_for_url("http://example.com/index.html"),
        vec![FeatureId::from("app.camera")]
    );

    assert!(!wl.is_access_allowed("http://evil.com/index.html", false));
    assert!(wl.get_features_for_url("http://evil.com/index.html").is_empty());
}

#[test]
fn subdomain_strictness() {
    let strict = whitelist(vec![AccessRule::uri("http://example.com/", false)]);
    assert!(!strict.is_access_allowed("http://sub.example.com/x", false));

    let loose = whitelist(vec![AccessRule::uri("http://example.com/", true)]);
    assert!(loose.is_access_allowed("http://sub.example.com/x", false));
}

#[test]
fn longest_registered_prefix_wins() {
    let wl = whitelist(vec![
        AccessRule::uri("http://example.com/app", false),
        AccessRule::uri("http://example.com/app/a/b", false),
    ]);
    let resolver = wl.resolver();
    assert_eq!(raw_uri(resolver, "http://example.com/app/a/b/c/d"), Some("http://example.com/app/a/b"));
    assert_eq!(raw_uri(resolver, "http://example.com/app/z"), Some("http://example.com/app"));
}

#[test]
fn wildcard_query_matches_any_query() {
    let wl = whitelist(vec![AccessRule::uri("http://example.com/secure?*", false)]);
    assert!(wl.is_access_allowed("http://example.com/secure?x=1", true));
    assert!(wl.is_access_allowed("http://example.com/secure?anything", true));
}

#[test]
fn data_uris_always_allowed() {
    for rules in [Vec::new(), vec![AccessRule::uri("http://example.com/", false)]] {
        let resolver = AccessResolver::new(rules, false).unwrap();
        assert_eq!(
            resolver.get_access_by_url("data:text/plain,hello"),
            Some(Access::Unconditional)
        );
    }
}

#[test]
fn local_marker_is_the_local_fallback() {
    let wl = whitelist(vec![
        AccessRule::new(LOCAL_ACCESS_TOKEN, false, vec![FeatureId::from("app.ui")]),
        AccessRule::uri("http://example.com/", false),
    ]);
    assert_eq!(raw_uri(wl.resolver(), "local:///x/y"), Some(LOCAL_ACCESS_TOKEN));
    assert!(wl.is_feature_allowed("local:///index.html", "app.ui"));
    assert!(!wl.is_feature_allowed("http://example.com/", "app.ui"));
}

#[test]
fn authority_peeling_terminates() {
    let labels: Vec<String> = (0..64).map(|i| format!("l{i}")).collect();
    let host = format!("{}.example.com", labels.join("."));

    let wl = whitelist(vec![
        AccessRule::uri("http://example.com/never", false),
        AccessRule::uri("http://l63.example.com/never", false),
        AccessRule::uri("http://l40.l41.l42.l43.l44.l45.l46.l47.l48.l49.l50.l51.l52.l53.l54.l55.l56.l57.l58.l59.l60.l61.l62.l63.example.com/never", false),
    ]);
    assert!(!wl.is_access_allowed(&format!("http://{host}/nothing/here"), true));
    assert!(!wl.is_access_allowed(&format!("http://{host}:8080/nothing"), true));
}

#[test]
fn first_declared_rule_keeps_a_shared_folder() {
    let wl = whitelist(vec![
        AccessRule::new("http://example.com/app", false, vec![FeatureId::from("first")]),
        AccessRule::new("http://example.com/APP/", false, vec![FeatureId::from("second")]),
    ]);
    assert_eq!(
        wl.get_features_for_url("http://example.com/app/page"),
        vec![FeatureId::from("first")]
    );
}

#[test]
fn add_domain_twice_installs_the_same_entries() {
    let wl = Arc::new(whitelist(vec![
        AccessRule::uri(LOCAL_ACCESS_TOKEN, false),
        AccessRule::uri("http://example.com/", true),
    ]));
    let mut sync = OriginSync::new(wl, RecordingHost::<u32>::new());
    sync.add_webview(1);

    sync.add_origin_access("http://cdn.example.com/lib.js", false);
    let once: HashSet<OriginPermission<u32>> = sync.host().entries().into_iter().collect();

    sync.add_origin_access("http://cdn.example.com/other.js", false);
    let twice: HashSet<OriginPermission<u32>> = sync.host().entries().into_iter().collect();

    assert_eq!(once, twice);
}

#[test]
fn every_domain_pair_is_wired_on_every_webview() {
    let wl = Arc::new(whitelist(vec![
        AccessRule::uri(LOCAL_ACCESS_TOKEN, false),
        AccessRule::uri("http://a.com/", true),
        AccessRule::uri("https://b.com/", false),
    ]));
    let mut sync = OriginSync::new(wl, RecordingHost::<&'static str>::new());
    sync.add_webview("main");
    sync.add_origin_access("http://x.a.com/", false);
    sync.add_webview("popup");

    let entries: HashSet<(String, String, String)> = sync
        .host()
        .entries()
        .into_iter()
        .map(|e| (e.webview.to_string(), e.source, e.destination))
        .collect();

    let markers: Vec<String> = sync.domains().iter().map(|d| d.marker.clone()).collect();
    assert_eq!(markers.len(), 4);

    for webview in ["main", "popup"] {
        for a in &markers {
            let to_internal = (webview.to_string(), a.clone(), sync.internal_endpoint().to_string());
            assert!(entries.contains(&to_internal), "{webview}: {a} -> internal");
            for b in &markers {
                if a == b {
                    continue;
                }
                assert!(
                    entries.contains(&(webview.to_string(), a.clone(), b.clone())),
                    "{webview}: {a} -> {b}"
                );
            }
        }
    }
}
