//! Dispatcher-facing whitelist queries.

use crate::resolver::{AccessResolver, RuleSetError};
use crate::types::{Access, AccessRule, FeatureId};

/// Allow and feature queries over a resolved rule set.
pub struct Whitelist {
    resolver: AccessResolver,
}

/// Everything the whitelist knows about one URL.
#[derive(Debug, Clone)]
pub struct Explanation<'a> {
    pub url: String,
    pub access: Option<Access<'a>>,
    pub allowed: bool,
    pub xhr_allowed: bool,
}

impl<'a> Explanation<'a> {
    /// The rule that decided the outcome, if one did.
    pub fn rule(&self) -> Option<&'a AccessRule> {
        self.access.and_then(|access| access.rule())
    }
}

impl Whitelist {
    pub fn new(resolver: AccessResolver) -> Self {
        Self { resolver }
    }

    pub fn from_rules(rules: Vec<AccessRule>, global_access: bool) -> Result<Self, RuleSetError> {
        AccessResolver::new(rules, global_access).map(Self::new)
    }

    #[inline]
    pub fn resolver(&self) -> &AccessResolver {
        &self.resolver
    }

    /// Feature ids granted to `url`, in declaration order.
    pub fn get_features_for_url(&self, url: &str) -> Vec<FeatureId> {
        match self.resolver.get_access_by_url(url) {
            Some(Access::Rule(rule)) => rule.features.clone(),
            _ => Vec::new(),
        }
    }

    pub fn is_feature_allowed(&self, url: &str, feature: &str) -> bool {
        self.resolver
            .get_access_by_url(url)
            .and_then(|access| access.rule())
            .is_some_and(|rule| rule.has_feature(feature))
    }

    /// Global access covers navigation but never XHR.
    pub fn is_access_allowed(&self, url: &str, is_xhr: bool) -> bool {
        (self.resolver.global_access() && !is_xhr) || self.resolver.get_access_by_url(url).is_some()
    }

    pub fn explain(&self, url: &str) -> Explanation<'_> {
        let access = self.resolver.get_access_by_url(url);
        let global = self.resolver.global_access();
        Explanation {
            url: url.to_string(),
            access,
            allowed: global || access.is_some(),
            xhr_allowed: access.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_whitelist() -> Whitelist {
        Whitelist::from_rules(
            vec![AccessRule::new("http://example.com/", false, vec!["app.camera".into()])],
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_allowed_origin_gets_features() {
        let wl = camera_whitelist();
        assert!(wl.is_access_allowed("http://example.com/index.html", false));
        assert_eq!(
            wl.get_features_for_url("http://example.com/index.html"),
            vec![FeatureId::from("app.camera")]
        );
        assert!(wl.is_feature_allowed("http://example.com/index.html", "app.camera"));
        assert!(!wl.is_feature_allowed("http://example.com/index.html", "app.contacts"));
    }

    #[test]
    fn test_unknown_origin_denied() {
        let wl = camera_whitelist();
        assert!(!wl.is_access_allowed("http://evil.com/index.html", false));
        assert!(wl.get_features_for_url("http://evil.com/index.html").is_empty());
    }

    #[test]
    fn test_global_access_excludes_xhr() {
        let wl = Whitelist::from_rules(Vec::new(), true).unwrap();
        assert!(wl.is_access_allowed("http://anywhere.com/", false));
        assert!(!wl.is_access_allowed("http://anywhere.com/", true));
        assert!(wl.is_access_allowed("data:,x", true));
    }

    #[test]
    fn test_query_on_registered_folder() {
        let wl = Whitelist::from_rules(vec![AccessRule::uri("http://example.com/app/page", false)], false)
            .unwrap();
        assert!(wl.is_access_allowed("http://example.com/app/page", true));
        assert!(wl.is_access_allowed("http://example.com/app/page?x=1", true));
        assert!(wl.is_access_allowed("http://example.com/app/page/x?y=1", true));
        assert!(!wl.is_access_allowed("http://example.com/app?x=1", true));

        let wl = Whitelist::from_rules(
            vec![
                AccessRule::uri("http://example.com/", false),
                AccessRule::new("http://example.com/api", false, vec!["app.api".into()]),
            ],
            false,
        )
        .unwrap();
        assert_eq!(wl.get_features_for_url("http://example.com/api?v=1"), vec![FeatureId::from("app.api")]);
        assert_eq!(wl.get_features_for_url("http://example.com/api/x"), vec![FeatureId::from("app.api")]);
        assert!(wl.get_features_for_url("http://example.com/other?v=1").is_empty());
    }

    #[test]
    fn test_data_uri_has_no_features() {
        let wl = camera_whitelist();
        assert!(wl.is_access_allowed("data:text/plain,hello", true));
        assert!(wl.get_features_for_url("data:text/plain,hello").is_empty());
    }

    #[test]
    fn test_explain() {
        let wl = camera_whitelist();
        let explained = wl.explain("http://example.com/a");
        assert!(explained.allowed);
        assert!(explained.xhr_allowed);
        assert_eq!(explained.rule().map(|r| r.raw_uri.as_str()), Some("http://example.com/"));

        let explained = wl.explain("http://evil.com/");
        assert!(!explained.allowed);
        assert!(explained.rule().is_none());
    }
}
