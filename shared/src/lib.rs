//! Shared types for the staff management system
//!
//! Wire types used by both the client SDK and the mock backend:
//! the response envelope, auth DTOs and the employee/department models.

pub mod client;
pub mod models;
pub mod response;

// Re-exports
pub use response::ApiResponse;
pub use serde::{Deserialize, Serialize};
