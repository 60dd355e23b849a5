use chrono::{DateTime, Utc};
use url::Url;

use crate::feed::item::{Item, Story};
use crate::util::humanize_since;

/// Substrings a link must contain for its story to be shown.
pub const DEFAULT_ALLOWED_HOSTS: [&str; 2] = ["github", "gitlab"];

/// Decides which items reach the page and derives their presentation fields.
///
/// Matching is a plain substring test on the link URL, not a host
/// comparison: `https://notgithub.example` passes, as does any URL with
/// "github" in its path.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    needles: Vec<String>,
}

impl Default for EligibilityFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_HOSTS)
    }
}

impl EligibilityFilter {
    /// Build a filter from allow-list substrings. Empty needles are dropped,
    /// since they would match every link.
    pub fn new<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let needles = needles
            .into_iter()
            .map(Into::into)
            .filter(|n: &String| !n.is_empty())
            .collect();
        Self { needles }
    }

    pub fn is_eligible(&self, url: &str) -> bool {
        !url.is_empty() && self.needles.iter().any(|n| url.contains(n.as_str()))
    }

    /// Returns the enriched story, or `None` when the item does not qualify.
    pub fn evaluate(&self, item: Item, now: DateTime<Utc>) -> Option<Story> {
        if !self.is_eligible(&item.url) {
            return None;
        }

        let display_host = Url::parse(&item.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .unwrap_or_default();
        let age = humanize_since(item.time, now);

        Some(Story {
            item,
            display_host,
            age,
        })
    }
}
