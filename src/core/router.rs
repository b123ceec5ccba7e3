//! Static path-prefix routing.
//!
//! The rule set is loaded once at startup and immutable thereafter. Lookup is
//! longest-prefix match on whole path segments; among equal-length prefixes
//! the first-declared rule wins, which is why the table keeps declaration
//! order instead of a map.
use crate::config::models::RouteRuleConfig;

/// One routing rule binding a path prefix to a logical service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub prefix: String,
    pub service: String,
    pub require_auth: bool,
}

impl RouteRule {
    pub fn new(prefix: impl Into<String>, service: impl Into<String>, require_auth: bool) -> Self {
        Self {
            prefix: prefix.into(),
            service: service.into(),
            require_auth,
        }
    }
}

impl From<&RouteRuleConfig> for RouteRule {
    fn from(config: &RouteRuleConfig) -> Self {
        Self::new(config.prefix.clone(), config.service.clone(), config.require_auth)
    }
}

/// Declaration-ordered route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(configs: &[RouteRuleConfig]) -> Self {
        Self::new(configs.iter().map(RouteRule::from).collect())
    }

    /// Longest-prefix match for an incoming path. Ties on prefix length go to
    /// the first-declared rule: a later rule only replaces the current best
    /// when its prefix is strictly longer.
    pub fn route(&self, path: &str) -> Option<&RouteRule> {
        let mut best: Option<&RouteRule> = None;
        for rule in &self.rules {
            if prefix_matches(path, &rule.prefix)
                && best.is_none_or(|b| rule.prefix.len() > b.prefix.len())
            {
                best = Some(rule);
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}

/// A prefix matches only at path-segment boundaries: the path is the prefix
/// itself or continues with a `/`. `/auth` owns `/auth` and `/auth/login`
/// but not `/authentic`.
fn prefix_matches(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}
