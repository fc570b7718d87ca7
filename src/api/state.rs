use std::sync::Arc;

use tokio::sync::Mutex;

use daftar_core::BookManager;
use daftar_domain::DisplayRate;

/// Shared handler state.
///
/// The book manager sits behind one async mutex, so each request runs its
/// read-modify-write against the book to completion before the next starts.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<Mutex<BookManager>>,
    pub display_rate: Arc<DisplayRate>,
}

impl AppState {
    pub fn new(manager: BookManager, display_rate: DisplayRate) -> Self {
        Self {
            manager: Arc::new(Mutex::new(manager)),
            display_rate: Arc::new(display_rate),
        }
    }
}
