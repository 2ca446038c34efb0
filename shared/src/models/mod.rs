//! Data models
//!
//! Transport shapes for the REST API. All IDs are `i64`, field names
//! travel as camelCase.

pub mod department;
pub mod employee;
pub mod user;

// Re-exports
pub use department::*;
pub use employee::*;
pub use user::*;
