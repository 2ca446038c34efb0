//! Resource services
//!
//! One method per backend operation. Each call is a single attempt; failures
//! carry the server message, the transport message, or the operation's
//! fallback text, in that order.

pub mod auth;
pub mod department;
pub mod employee;

pub use auth::AuthService;
pub use department::DepartmentService;
pub use employee::EmployeeService;

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::VecDeque;
    use std::sync::{Mutex, PoisonError};

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::http::{ApiRequest, HttpClient};
    use crate::{ApiResponse, ClientResult};

    /// Scripted HTTP client: records requests, replays queued replies
    #[derive(Default)]
    pub(crate) struct FakeHttp {
        requests: Mutex<Vec<ApiRequest>>,
        replies: Mutex<VecDeque<ClientResult<ApiResponse<Value>>>>,
    }

    impl FakeHttp {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn reply(&self, reply: ClientResult<ApiResponse<Value>>) {
            self.replies
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(reply);
        }

        pub(crate) fn reply_data(&self, data: Value) {
            self.reply(Ok(ApiResponse::ok(data)));
        }

        pub(crate) fn requests(&self) -> Vec<ApiRequest> {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl HttpClient for FakeHttp {
        async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse<Value>> {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request);
            self.replies
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or_else(|| Ok(ApiResponse::message("Success")))
        }
    }
}
