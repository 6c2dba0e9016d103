//! Origin Sync
//!
//! Mirrors whitelisted origins into each WebView host's native cross-origin
//! permission table. After every successful `add_domain` / `add_webview`,
//! each registered webview holds bidirectional entries between every pair of
//! known domains, plus a one-way entry from every domain to the framework's
//! internal endpoint.
//!
//! Domains and webviews are append-only; there is no teardown.

use std::cell::RefCell;
use std::sync::Arc;

use crate::types::{SchemeClass, DEFAULT_INTERNAL_ENDPOINT, FILE_MARKER, LOCAL_MARKER};
use crate::uri::UriRef;
use crate::whitelist::Whitelist;

// =============================================================================
// Host Seam
// =============================================================================

/// The WebView runtime's cross-origin permission table.
///
/// Calls are fire-and-forget; the engine never inspects an outcome.
pub trait OriginPermissionHost {
    type Handle: Clone + PartialEq;

    fn add_origin_permission(
        &self,
        webview: &Self::Handle,
        source_origin: &str,
        destination_origin: &str,
        allow_subdomains: bool,
    );
}

/// A known origin and whether entries towards it cover its subdomains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEntry {
    pub marker: String,
    pub allow_subdomains: bool,
}

/// Canonical permission-table marker for a URL.
pub fn origin_marker(url: &str) -> String {
    let uri = UriRef::parse(url);
    let class = uri.scheme_class();
    if class == SchemeClass::LOCAL {
        LOCAL_MARKER.to_string()
    } else if class == SchemeClass::FILE {
        FILE_MARKER.to_string()
    } else {
        uri.origin()
    }
}

// =============================================================================
// Sync
// =============================================================================

pub struct OriginSync<H: OriginPermissionHost> {
    whitelist: Arc<Whitelist>,
    host: H,
    internal_endpoint: String,
    domains: Vec<DomainEntry>,
    webviews: Vec<H::Handle>,
    seeded: bool,
}

impl<H: OriginPermissionHost> OriginSync<H> {
    pub fn new(whitelist: Arc<Whitelist>, host: H) -> Self {
        Self {
            whitelist,
            host,
            internal_endpoint: DEFAULT_INTERNAL_ENDPOINT.to_string(),
            domains: Vec::new(),
            webviews: Vec::new(),
            seeded: false,
        }
    }

    /// Override the endpoint the framework serves its own resources from.
    pub fn with_internal_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.internal_endpoint = endpoint.into();
        self
    }

    #[inline]
    pub fn domains(&self) -> &[DomainEntry] {
        &self.domains
    }

    #[inline]
    pub fn webviews(&self) -> &[H::Handle] {
        &self.webviews
    }

    #[inline]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[inline]
    pub fn internal_endpoint(&self) -> &str {
        &self.internal_endpoint
    }

    /// Register a domain and wire it against every known domain on every
    /// registered webview. No-op for known, relative or non-whitelisted domains.
    pub fn add_domain(&mut self, url: &str, allow_subdomains: bool) {
        // Global access allows anything, including input with no origin.
        if !UriRef::parse(url).is_absolute() {
            log::debug!("not mirroring {url}: not an absolute URI");
            return;
        }

        let marker = origin_marker(url);
        if self.domains.iter().any(|d| d.marker == marker) {
            return;
        }

        if !self.whitelist.is_access_allowed(url, false) {
            log::debug!("not mirroring {url}: origin is not whitelisted");
            return;
        }

        log::debug!(
            "mirroring {marker} to {} webview(s) against {} domain(s)",
            self.webviews.len(),
            self.domains.len()
        );

        for webview in &self.webviews {
            self.host
                .add_origin_permission(webview, &marker, &self.internal_endpoint, false);

            for domain in &self.domains {
                self.host
                    .add_origin_permission(webview, &marker, &domain.marker, domain.allow_subdomains);
                self.host
                    .add_origin_permission(webview, &domain.marker, &marker, allow_subdomains);
            }
        }

        self.domains.push(DomainEntry {
            marker,
            allow_subdomains,
        });
    }

    /// Register a webview and install every known entry on it.
    pub fn add_webview(&mut self, webview: H::Handle) {
        if self.webviews.contains(&webview) {
            return;
        }

        self.seed();
        self.webviews.push(webview.clone());

        let endpoint = self.internal_endpoint.as_str();
        self.host
            .add_origin_permission(&webview, LOCAL_MARKER, FILE_MARKER, true);
        self.host
            .add_origin_permission(&webview, FILE_MARKER, LOCAL_MARKER, true);
        self.host
            .add_origin_permission(&webview, LOCAL_MARKER, endpoint, true);

        for (i, source) in self.domains.iter().enumerate() {
            self.host
                .add_origin_permission(&webview, &source.marker, endpoint, false);

            for destination in self.domains.iter().skip(i + 1) {
                self.host.add_origin_permission(
                    &webview,
                    &source.marker,
                    &destination.marker,
                    destination.allow_subdomains,
                );
                self.host.add_origin_permission(
                    &webview,
                    &destination.marker,
                    &source.marker,
                    source.allow_subdomains,
                );
            }
        }

        log::debug!(
            "registered webview #{} with {} domain(s)",
            self.webviews.len(),
            self.domains.len()
        );
    }

    /// Runtime entry point for granting an additional origin.
    pub fn add_origin_access(&mut self, origin: &str, allow_subdomains: bool) {
        self.seed();
        self.add_domain(origin, allow_subdomains);
    }

    /// Populate `domains` from the whitelist's rules, once.
    fn seed(&mut self) {
        if self.seeded {
            return;
        }
        self.seeded = true;

        for rule in self.whitelist.resolver().rules() {
            let marker = if rule.is_local_marker() {
                LOCAL_MARKER.to_string()
            } else {
                origin_marker(&rule.raw_uri)
            };

            if self.domains.iter().any(|d| d.marker == marker) {
                continue;
            }
            self.domains.push(DomainEntry {
                marker,
                allow_subdomains: rule.allow_subdomain,
            });
        }
    }
}

// =============================================================================
// Recording Host
// =============================================================================

/// One entry installed in a host's permission table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OriginPermission<K> {
    pub webview: K,
    pub source: String,
    pub destination: String,
    pub allow_subdomains: bool,
}

/// Host that records every entry instead of forwarding it. Used for dry runs
/// of a configuration and in tests.
#[derive(Debug, Default)]
pub struct RecordingHost<K> {
    entries: RefCell<Vec<OriginPermission<K>>>,
}

impl<K: Clone> RecordingHost<K> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Entries in installation order, including repeats.
    pub fn entries(&self) -> Vec<OriginPermission<K>> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl<K: Clone + PartialEq> OriginPermissionHost for RecordingHost<K> {
    type Handle = K;

    fn add_origin_permission(
        &self,
        webview: &K,
        source_origin: &str,
        destination_origin: &str,
        allow_subdomains: bool,
    ) {
        self.entries.borrow_mut().push(OriginPermission {
            webview: webview.clone(),
            source: source_origin.to_string(),
            destination: destination_origin.to_string(),
            allow_subdomains,
        });
    }
}
