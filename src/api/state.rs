use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use std::sync::Arc;

// Connection pool type
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// State shared by every handler: the Postgres pool behind the project,
/// note, task and image tables.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<Pool>,
}

impl AppState {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}
