use std::sync::Arc;

use ol_compiler::{build_whitelist, parse_config};
use ol_core::types::{FILE_MARKER, LOCAL_MARKER};
use ol_core::{OriginSync, RecordingHost};

const CONFIG: &str = r#"{
    "hasMultiAccess": false,
    "internalEndpoint": "http://localhost:8472",
    "accessList": [
        { "uri": "WIDGET_LOCAL", "features": [{ "id": "app.ui" }] },
        { "uri": "http://example.com/", "features": [{ "id": "app.camera" }] },
        { "uri": "https://api.partner.com/v1", "allowSubDomain": true,
          "features": [{ "id": "app.contacts" }, { "id": "app.camera" }] },
        { "uri": "https://api.partner.com/v1?*" },
        { "uri": "http://example.com/" }
    ]
}"#;

#[test]
fn config_drives_dispatcher_queries() {
    let compiled = build_whitelist(&parse_config(CONFIG).unwrap()).unwrap();
    let wl = &compiled.whitelist;
    assert_eq!(compiled.stats.deduped, 1);

    assert!(wl.is_access_allowed("http://example.com/index.html", true));
    assert!(wl.is_feature_allowed("http://example.com/index.html", "app.camera"));
    assert!(!wl.is_access_allowed("http://evil.com/index.html", false));

    let features: Vec<String> = wl
        .get_features_for_url("https://eu.api.partner.com/v1/people")
        .iter()
        .map(|f| f.to_string())
        .collect();
    assert_eq!(features, vec!["app.contacts", "app.camera"]);

    assert!(wl.is_access_allowed("https://api.partner.com/v1?token=abc", true));
    assert!(wl.get_features_for_url("https://api.partner.com/v1?token=abc").is_empty());
    assert!(!wl.is_access_allowed("https://api.partner.com/v2", true));

    assert!(wl.is_feature_allowed("local:///index.html", "app.ui"));
    assert!(!wl.is_access_allowed("file:///accounts/1000/shared/photo.jpg", true));
}

#[test]
fn config_seeds_origin_sync() {
    let compiled = build_whitelist(&parse_config(CONFIG).unwrap()).unwrap();
    let endpoint = compiled.internal_endpoint.clone();
    let mut sync = OriginSync::new(Arc::new(compiled.whitelist), RecordingHost::<u8>::new())
        .with_internal_endpoint(endpoint.as_str());

    sync.add_webview(0);
    let markers: Vec<&str> = sync.domains().iter().map(|d| d.marker.as_str()).collect();
    assert_eq!(markers, vec![LOCAL_MARKER, "http://example.com", "https://api.partner.com"]);

    let entries = sync.host().entries();
    assert!(entries.iter().any(|e| e.source == LOCAL_MARKER && e.destination == FILE_MARKER));
    assert!(entries
        .iter()
        .any(|e| e.source == "http://example.com" && e.destination == "https://api.partner.com" && e.allow_subdomains));
    assert!(entries
        .iter()
        .any(|e| e.source == "https://api.partner.com" && e.destination == endpoint));
}
