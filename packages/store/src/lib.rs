//! # Store crate: everything the app keeps on the device
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`kv`] | The [`KeyValueStore`] trait and JSON helpers |
//! | [`MemoryStore`], [`FileStore`] | Store implementations |
//! | [`ObservedStore`] | Store wrapper publishing a revision on every write |
//! | [`models`] | Typed activity records and their categories |
//! | [`log`] | [`ActivityLog`]: capped, newest-first arrays per category |
//! | [`history`] | Merged, sorted, filterable history |
//! | [`summary`] | [`TodaySummary`] for the home screen |
//! | [`feed`] | [`HistoryFeed`]: keeps history and summary current |
//! | [`session`] | [`ClientSession`]: signed-in user, token, survey state |
//! | [`community`] | [`CommunityCache`]: own posts, likes and saves |
//! | [`remote`] | [`ApiClient`] for the HTTP backend |
//! | [`config`] | [`TrackerConfig`] read from `tracker.toml` |

pub mod community;
pub mod config;
pub mod error;
pub mod feed;
pub mod history;
pub mod kv;
pub mod log;
pub mod models;
pub mod remote;
pub mod session;
pub mod summary;

mod file_store;
mod memory;
mod observed;

pub use community::{CommunityCache, CommunityFilter};
pub use config::TrackerConfig;
pub use error::StoreError;
pub use feed::{Feed, HistoryFeed};
pub use file_store::FileStore;
pub use history::{aggregate, HistoryEntry, HistoryFilter};
pub use kv::KeyValueStore;
pub use log::{ActivityLog, Snapshot};
pub use memory::MemoryStore;
pub use models::Category;
pub use observed::ObservedStore;
pub use remote::{ApiClient, ClientError};
pub use session::ClientSession;
pub use summary::TodaySummary;
