//! Staff Client - client SDK for the employee/department admin backend
//!
//! Wraps the REST API (`/employees`, `/departments`, `/auth`) behind typed
//! services, keeps cached resource lists in observable stores and tracks the
//! login session. Every 401 clears the stored token, sends the user to the
//! login view and resets the session.

pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod logger;
pub mod navigation;
pub mod services;
pub mod session;
pub mod store;
pub mod token;

pub use client::{StaffClient, StaffClientBuilder};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use guard::{GuardDecision, RouteGuard};
pub use http::{ApiRequest, HttpClient, NetworkHttpClient};
pub use navigation::{AuthEvent, Navigator, NoopNavigator, RecordingNavigator, UnauthorizedHandler};
pub use session::{Session, SessionPhase, SessionReset, SessionStore};
pub use store::{
    DepartmentStatistics, DepartmentStore, DepartmentView, EmployeeStatistics, EmployeeStore,
    ResourceState,
};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};

// Re-export shared types for convenience
pub use shared::ApiResponse;
pub use shared::client::{AuthResponse, LoginRequest, RegisterRequest};
pub use shared::models::{
    Department, DepartmentCreate, DepartmentSummary, DepartmentUpdate, Employee, EmployeeCreate,
    EmployeeStatus, EmployeeSummary, EmployeeUpdate, User, UserRole,
};
