//! Shared response envelope types for API handlers.
//!
//! Reads use a `{ "data": ... }` envelope. Creation endpoints answer with the
//! bare `{ "id": ... }` of the new row.

use miso_core::types::DbId;
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `201 Created` body: the ID of the inserted row.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: DbId,
}
