use std::fmt;

/// A ranked story list exposed by the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Top,
    New,
    Show,
    Best,
}

impl FeedKind {
    /// Every feed the front page links to, in menu order.
    pub const ALL: [FeedKind; 4] = [FeedKind::Top, FeedKind::New, FeedKind::Show, FeedKind::Best];

    /// Map a page tag to a feed.
    ///
    /// Matching ignores ASCII case and surrounding whitespace. Unknown tags
    /// fall back to [`FeedKind::Top`] so a bad link still renders a page.
    pub fn resolve(tag: &str) -> Self {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(tag))
            .unwrap_or(FeedKind::Top)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeedKind::Top => "top",
            FeedKind::New => "new",
            FeedKind::Show => "show",
            FeedKind::Best => "best",
        }
    }

    /// File name of the identifier list under the API base.
    pub fn list_path(self) -> &'static str {
        match self {
            FeedKind::Top => "topstories.json",
            FeedKind::New => "newstories.json",
            FeedKind::Show => "showstories.json",
            FeedKind::Best => "beststories.json",
        }
    }

    /// Full list endpoint for this feed under `base_url`.
    pub fn list_url(self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.list_path())
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
