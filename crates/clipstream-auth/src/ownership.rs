//! Owner-based authorization
//!
//! The only permission model in Clipstream: the caller either owns the
//! resource or they do not. Pure comparison, no I/O.

use crate::error::AuthError;

/// Allow the operation only when the caller owns the resource
pub fn authorize_owner(resource_owner_id: i64, caller_id: i64) -> Result<(), AuthError> {
    if resource_owner_id == caller_id {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
