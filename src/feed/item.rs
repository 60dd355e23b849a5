use serde::{Deserialize, Serialize};

/// Item type tag as reported by the API's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Story,
    Job,
    Comment,
    Poll,
    #[serde(rename = "pollopt")]
    PollOpt,
    /// Any tag this client does not know about.
    #[serde(other)]
    Other,
}

/// One item record from `GET <base>/item/<id>.json`.
///
/// Only `id` is required. The API omits `url` for text posts and `kids`
/// for items without comments, so every other field falls back to its
/// default when absent.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Item {
    pub id: u64,
    #[serde(default)]
    pub by: String,
    #[serde(default)]
    pub score: i64,
    /// Submission time, Unix seconds
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub kids: Vec<u64>,
    #[serde(default)]
    pub descendants: i64,
}

/// An eligible item plus the presentation fields derived when it was fetched.
///
/// `age` is computed once, at fetch time. A cached page therefore shows
/// ages that drift until the cache entry expires.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    #[serde(flatten)]
    pub item: Item,
    /// Host of the link URL, empty when the URL does not parse
    pub display_host: String,
    /// Relative age such as "33 minutes ago"
    pub age: String,
}
