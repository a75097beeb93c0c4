//! Shared application state.

use std::sync::Arc;

use kitchen_core::clock::Clock;
use kitchen_core::identity::{DisplayNameResolver, RoleDirectory};
use kitchen_core::repository::EventRepository;
use kitchen_core::storage::{ImageFetcher, ObjectStorage};
use kitchen_export::application::query_handlers::BundleSources;
use kitchen_export::archive::ArchiveWriter;
use kitchen_presence::domain::repository::PresenceRepository;

use crate::feed::ChangeFeed;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for deterministic time.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// Event repository for loading and persisting domain events.
    pub event_repository: Arc<dyn EventRepository>,
    /// Heartbeat rows.
    pub presence_repository: Arc<dyn PresenceRepository>,
    /// Issues signed upload URLs.
    pub object_storage: Arc<dyn ObjectStorage>,
    /// Downloads image bytes for export.
    pub image_fetcher: Arc<dyn ImageFetcher>,
    /// Writes export archives.
    pub archive_writer: Arc<dyn ArchiveWriter>,
    /// Resolves user roles.
    pub role_directory: Arc<dyn RoleDirectory>,
    /// Names for users whose records carry none.
    pub display_names: Arc<dyn DisplayNameResolver>,
    /// Per-project change notifications.
    pub feed: Arc<ChangeFeed>,
}

impl AppState {
    /// The collaborators export handlers read from.
    #[must_use]
    pub fn bundle_sources(&self) -> BundleSources<'_> {
        BundleSources {
            repo: &*self.event_repository,
            names: &*self.display_names,
            fetcher: &*self.image_fetcher,
            archive: &*self.archive_writer,
        }
    }
}
