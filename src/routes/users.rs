//! Placeholder business endpoints.

use axum::{body::Bytes, http::StatusCode, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: u64,
}

pub async fn list() -> Json<UserList> {
    Json(UserList { users: Vec::new() })
}

/// Accepts any body, JSON or not.
pub async fn create(_body: Bytes) -> (StatusCode, Json<Created>) {
    (StatusCode::CREATED, Json(Created { id: 1 }))
}
