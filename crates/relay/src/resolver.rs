//! Map source location names onto destination feed ids.
//!
//! The source service names some hydrophones differently from the
//! destination. Those names go through an alias table first; everything
//! else must match a destination feed name exactly (case-sensitive).

use std::collections::HashMap;

use tracing::warn;

use orca_core::DestinationFeed;

use crate::error::ResolveError;

/// Source location name → canonical destination feed name.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("North SJC", "North San Juan Channel"),
    ("Haro Strait", "Orcasound Lab"),
];

#[derive(Debug, Clone)]
pub struct FeedResolver {
    aliases: HashMap<String, String>,
}

impl Default for FeedResolver {
    fn default() -> Self {
        Self::with_aliases(DEFAULT_ALIASES.iter().copied())
    }
}

impl FeedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases<I, K, V>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            aliases: aliases
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The destination name a source location should be looked up under.
    pub fn canonical_name<'a>(&'a self, location: &'a str) -> &'a str {
        self.aliases
            .get(location)
            .map(String::as_str)
            .unwrap_or(location)
    }

    /// Find the feed for `location` in `feeds`.
    ///
    /// When several feeds share the canonical name, the first in fetch order
    /// wins and the ambiguity is logged.
    pub fn resolve<'f>(
        &self,
        location: &str,
        feeds: &'f [DestinationFeed],
    ) -> Result<&'f DestinationFeed, ResolveError> {
        let canonical = self.canonical_name(location);
        let mut matches = feeds.iter().filter(|feed| feed.name == canonical);

        let first = matches.next().ok_or_else(|| ResolveError::UnknownLocation {
            location: location.to_string(),
            canonical: canonical.to_string(),
        })?;

        let others = matches.count();
        if others > 0 {
            warn!(
                name = %canonical,
                chosen = %first.id,
                others,
                "Feed name is ambiguous, using first in fetch order"
            );
        }
        Ok(first)
    }
}
