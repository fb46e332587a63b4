pub mod config;
pub mod history;
pub mod load;

use focusflow_config::PathManager;
use focusflow_core::{FileStorage, HistoryStore, SessionController};
use tracing::warn;

/// Open the persisted history and wrap it in a session controller.
///
/// Directory creation failure is tolerated: the engine keeps working in
/// memory and individual writes log their own warnings.
pub fn open_controller(paths: &PathManager) -> SessionController {
    if let Err(e) = paths.ensure_directories() {
        warn!("could not create data directories: {:#}", e);
    }
    let store = HistoryStore::open(Box::new(FileStorage::new(paths.history_file())));
    SessionController::new(store)
}
