use crate::config::database::Database;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct HealthState {
    /// `None` when running on in-memory stores
    pub(crate) database: Option<Arc<Database>>,
}

impl HealthState {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            database: Some(Arc::clone(db_conn)),
        }
    }
}
