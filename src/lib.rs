pub mod cancel;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod matching;
pub mod models;
pub mod order;
pub mod providers;
pub mod queue;
pub mod resolver;
pub mod session;
pub mod subsonic;

#[cfg(test)]
mod testing;

pub use cancel::CancelToken;
pub use catalog::CatalogResolver;
pub use config::{Credentials, SessionConfig};
pub use errors::{ProxyError, Result};
pub use matching::{best_match, FuzzySimilarity, Similarity};
pub use models::{EntityHandle, EntityKind, PlayMode, Track};
pub use providers::CatalogService;
pub use queue::{Cursor, PlaybackQueue};
pub use resolver::TrackResolver;
pub use session::ProxySession;
pub use subsonic::SubsonicCatalog;
