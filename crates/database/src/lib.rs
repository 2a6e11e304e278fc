pub mod db_connect;
pub mod service;
pub mod user_store;

use surrealdb::{Surreal, engine::any::Any};

pub use service::DbService;
pub use user_store::{SurrealUserStore, UserStore};

/// Handle to a SurrealDB instance with namespace and database already selected.
///
/// The underlying client multiplexes requests over one connection and is safe
/// to share between tasks, so the handle is usually wrapped in an `Arc` and
/// cloned into every service that needs it.
pub struct Database {
    client: Surreal<Any>,
}

impl Database {
    pub fn client(&self) -> &Surreal<Any> {
        &self.client
    }
}
