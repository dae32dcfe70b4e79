//! The role gate in front of AI diagnosis.
//!
//! Roles are fetched from the record store on every request; there is no
//! cache, so a revoked role takes effect immediately. A storage failure is
//! an error, never an implicit allow.

use crate::store::{RecordStore, StoreResult};
use era_types::Role;

/// Returns true iff `user_id` holds at least one privileged role
/// (`medic` or `admin`).
///
/// # Errors
///
/// Propagates the store failure; callers surface it as a role-verification
/// error, distinct from a definite "not permitted".
pub async fn authorize(store: &dyn RecordStore, user_id: &str) -> StoreResult<bool> {
    let roles = store.fetch_roles(user_id).await?;
    Ok(roles.iter().any(Role::is_privileged))
}
