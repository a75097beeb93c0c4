//! Shared test doubles for the collaborative script kitchen.

mod clock;
mod identity;
mod repository;
mod storage;

pub use clock::{FixedClock, fixed_now};
pub use identity::{StaticDisplayNames, StaticRoleDirectory};
pub use repository::{
    EmptyEventRepository, FailingEventRepository, InMemoryEventRepository,
    InterleavingEventRepository, RecordingEventRepository,
};
pub use storage::{STUB_PUBLIC_BASE, StubImageFetcher, StubObjectStorage};
