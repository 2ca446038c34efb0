//! Employee service - employee related API requests

use std::sync::Arc;

use shared::models::{Employee, EmployeeCreate, EmployeeStatus, EmployeeUpdate};

use crate::http::{ApiRequest, HttpClient, NetworkHttpClient};
use crate::{ClientError, ClientResult};

/// Employee API
pub struct EmployeeService<H = NetworkHttpClient> {
    http: Arc<H>,
}

impl<H> Clone for EmployeeService<H> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
        }
    }
}

fn or(fallback: &'static str) -> impl FnOnce(ClientError) -> ClientError {
    move |e| e.with_fallback(fallback)
}

impl<H: HttpClient> EmployeeService<H> {
    pub fn new(http: Arc<H>) -> Self {
        Self { http }
    }

    /// Get all employees
    pub async fn list(&self) -> ClientResult<Vec<Employee>> {
        self.http
            .fetch(ApiRequest::get("/employees"))
            .await
            .map_err(or("Failed to fetch employees"))
    }

    /// Get an employee by id
    pub async fn get(&self, id: i64) -> ClientResult<Employee> {
        self.http
            .fetch(ApiRequest::get(format!("/employees/{}", id)))
            .await
            .map_err(|e| e.with_fallback(&format!("Failed to fetch employee with id: {}", id)))
    }

    pub async fn create(&self, data: &EmployeeCreate) -> ClientResult<Employee> {
        self.http
            .fetch(ApiRequest::post("/employees").json(data)?)
            .await
            .map_err(or("Failed to create employee"))
    }

    pub async fn update(&self, id: i64, data: &EmployeeUpdate) -> ClientResult<Employee> {
        self.http
            .fetch(ApiRequest::put(format!("/employees/{}", id)).json(data)?)
            .await
            .map_err(or("Failed to update employee"))
    }

    /// Delete an employee; an empty success body counts as deleted
    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.http
            .fetch_unit(ApiRequest::delete(format!("/employees/{}", id)))
            .await
            .map_err(or("Failed to delete employee"))
    }

    pub async fn update_status(&self, id: i64, status: EmployeeStatus) -> ClientResult<Employee> {
        self.http
            .fetch(ApiRequest::patch(format!("/employees/{}/status", id)).query("status", status))
            .await
            .map_err(or("Failed to update employee status"))
    }

    pub async fn by_status(&self, status: EmployeeStatus) -> ClientResult<Vec<Employee>> {
        self.http
            .fetch(ApiRequest::get(format!("/employees/status/{}", status)))
            .await
            .map_err(or("Failed to fetch employees by status"))
    }

    pub async fn by_department(&self, department_id: i64) -> ClientResult<Vec<Employee>> {
        self.http
            .fetch(ApiRequest::get(format!(
                "/employees/department/{}",
                department_id
            )))
            .await
            .map_err(or("Failed to fetch employees by department"))
    }

    /// Search employees by name
    pub async fn search(&self, name: &str) -> ClientResult<Vec<Employee>> {
        self.http
            .fetch(ApiRequest::get("/employees/search").query("name", name))
            .await
            .map_err(or("Failed to search employees by name"))
    }

    /// Number of employees in a department
    pub async fn count_by_department(&self, department_id: i64) -> ClientResult<i64> {
        self.http
            .fetch(ApiRequest::get(format!(
                "/employees/count/department/{}",
                department_id
            )))
            .await
            .map_err(or("Failed to get employee count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fake::FakeHttp;
    use http::StatusCode;
    use reqwest::Method;
    use serde_json::json;

    fn employee_json(id: i64, first: &str) -> serde_json::Value {
        json!({
            "id": id,
            "firstName": first,
            "lastName": "Doe",
            "email": format!("{}@x.com", first.to_lowercase()),
            "status": "ACTIVE"
        })
    }

    #[tokio::test]
    async fn test_list_unwraps_data() {
        let http = Arc::new(FakeHttp::new());
        http.reply_data(json!([employee_json(1, "John"), employee_json(2, "Jane")]));
        let service = EmployeeService::new(http.clone());

        let list = service.list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].first_name, "Jane");
        assert_eq!(http.requests()[0].path, "/employees");
    }

    #[tokio::test]
    async fn test_status_update_uses_patch_with_query() {
        let http = Arc::new(FakeHttp::new());
        http.reply_data(employee_json(4, "Ann"));
        let service = EmployeeService::new(http.clone());

        service
            .update_status(4, EmployeeStatus::Terminated)
            .await
            .unwrap();
        let req = &http.requests()[0];
        assert_eq!(req.method, Method::PATCH);
        assert_eq!(req.path, "/employees/4/status");
        assert_eq!(req.query, vec![("status".into(), "TERMINATED".into())]);
    }

    #[tokio::test]
    async fn test_server_message_wins_over_fallback() {
        let http = Arc::new(FakeHttp::new());
        http.reply(Err(ClientError::api(
            StatusCode::BAD_REQUEST,
            "This email already exists: a@x.com",
        )));
        let service = EmployeeService::new(http);

        let err = service
            .create(&EmployeeCreate::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "This email already exists: a@x.com");
    }

    #[tokio::test]
    async fn test_blank_server_message_uses_fallback() {
        let http = Arc::new(FakeHttp::new());
        http.reply(Err(ClientError::api(StatusCode::INTERNAL_SERVER_ERROR, "")));
        let service = EmployeeService::new(http);

        let err = service.list().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch employees");
    }

    #[tokio::test]
    async fn test_search_encodes_name_as_query() {
        let http = Arc::new(FakeHttp::new());
        http.reply_data(json!([]));
        let service = EmployeeService::new(http.clone());

        let found = service.search("john smith").await.unwrap();
        assert!(found.is_empty());
        assert_eq!(
            http.requests()[0].query,
            vec![("name".into(), "john smith".into())]
        );
    }

    #[tokio::test]
    async fn test_success_without_data_is_invalid() {
        let http = Arc::new(FakeHttp::new());
        let service = EmployeeService::new(http);

        // default fake reply carries no data
        let err = service.get(9).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }
}
