//! Small helpers shared by the feed and rendering code.
//!
//! # Examples
//!
//! ```
//! use chrono::DateTime;
//! use codehn::util::humanize_since;
//!
//! let now = DateTime::from_timestamp(1_700_002_000, 0).unwrap();
//! assert_eq!(humanize_since(1_700_000_020, now), "33 minutes ago");
//! ```

mod time;

pub use time::humanize_since;
