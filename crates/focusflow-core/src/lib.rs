pub mod enrich;
pub mod error;
pub mod resolver;
pub mod session;
pub mod store;

pub use enrich::{EnrichmentCoordinator, EnrichmentState, EnrichmentTicket};
pub use error::CoreError;
pub use resolver::resolve;
pub use session::{SessionController, SessionPatch, DEFAULT_TITLE};
pub use store::{FileStorage, HistoryStorage, HistoryStore, MemoryStorage};
