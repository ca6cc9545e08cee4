//! Server and store introspection

use sushi_core::DatabaseStats;

use super::CommandResult;
use crate::AppState;

/// Base URL of the running file server, empty when none is running
pub fn get_file_server_url(state: &AppState) -> CommandResult<String> {
    Ok(state.file_server_url().unwrap_or_default())
}

pub fn get_database_stats(state: &AppState) -> CommandResult<DatabaseStats> {
    Ok(state.core.db.stats()?)
}
