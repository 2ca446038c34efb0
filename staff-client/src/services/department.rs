//! Department service - department related API requests

use std::sync::Arc;

use shared::models::{Department, DepartmentCreate, DepartmentSummary, DepartmentUpdate};

use crate::http::{ApiRequest, HttpClient, NetworkHttpClient};
use crate::{ClientError, ClientResult};

/// Department API
pub struct DepartmentService<H = NetworkHttpClient> {
    http: Arc<H>,
}

impl<H> Clone for DepartmentService<H> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
        }
    }
}

fn or(fallback: &'static str) -> impl FnOnce(ClientError) -> ClientError {
    move |e| e.with_fallback(fallback)
}

impl<H: HttpClient> DepartmentService<H> {
    pub fn new(http: Arc<H>) -> Self {
        Self { http }
    }

    /// All departments without employee detail
    pub async fn list(&self) -> ClientResult<Vec<Department>> {
        self.http
            .fetch(ApiRequest::get("/departments").query("includeEmployees", false))
            .await
            .map_err(or("Failed to fetch departments"))
    }

    /// All departments, projected to summaries
    pub async fn list_summary(&self) -> ClientResult<Vec<DepartmentSummary>> {
        let departments: Vec<Department> = self
            .http
            .fetch(ApiRequest::get("/departments").query("includeEmployees", false))
            .await
            .map_err(or("Failed to fetch department summaries"))?;
        Ok(departments.iter().map(DepartmentSummary::from).collect())
    }

    /// All departments including their employees
    pub async fn list_with_employees(&self) -> ClientResult<Vec<Department>> {
        self.http
            .fetch(ApiRequest::get("/departments").query("includeEmployees", true))
            .await
            .map_err(or("Failed to fetch departments with employees"))
    }

    pub async fn get(&self, id: i64, include_employees: bool) -> ClientResult<Department> {
        self.http
            .fetch(
                ApiRequest::get(format!("/departments/{}", id))
                    .query("includeEmployees", include_employees),
            )
            .await
            .map_err(|e| e.with_fallback(&format!("Failed to fetch department with id: {}", id)))
    }

    pub async fn create(&self, data: &DepartmentCreate) -> ClientResult<Department> {
        self.http
            .fetch(ApiRequest::post("/departments").json(data)?)
            .await
            .map_err(or("Failed to create department"))
    }

    pub async fn update(&self, id: i64, data: &DepartmentUpdate) -> ClientResult<Department> {
        self.http
            .fetch(ApiRequest::put(format!("/departments/{}", id)).json(data)?)
            .await
            .map_err(or("Failed to update department"))
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.http
            .fetch_unit(ApiRequest::delete(format!("/departments/{}", id)))
            .await
            .map_err(or("Failed to delete department"))
    }

    pub async fn search_by_name(&self, name: &str) -> ClientResult<Vec<Department>> {
        self.http
            .fetch(ApiRequest::get("/departments/search/name").query("name", name))
            .await
            .map_err(or("Failed to search departments"))
    }

    pub async fn search_by_location(&self, location: &str) -> ClientResult<Vec<Department>> {
        self.http
            .fetch(ApiRequest::get("/departments/search/location").query("location", location))
            .await
            .map_err(or("Failed to search departments by location"))
    }

    pub async fn search_by_manager(&self, manager: &str) -> ClientResult<Vec<Department>> {
        self.http
            .fetch(ApiRequest::get("/departments/search/manager").query("manager", manager))
            .await
            .map_err(or("Failed to search departments by manager"))
    }

    /// Departments without employees
    pub async fn list_empty(&self) -> ClientResult<Vec<Department>> {
        self.http
            .fetch(ApiRequest::get("/departments/empty"))
            .await
            .map_err(or("Failed to fetch empty departments"))
    }

    /// Departments that have at least one employee
    pub async fn list_having_employees(&self) -> ClientResult<Vec<Department>> {
        self.http
            .fetch(ApiRequest::get("/departments/with-employees"))
            .await
            .map_err(or("Failed to fetch departments with employees"))
    }

    pub async fn employee_count(&self, id: i64) -> ClientResult<i64> {
        self.http
            .fetch(ApiRequest::get(format!("/departments/{}/employee-count", id)))
            .await
            .map_err(or("Failed to count employees"))
    }

    pub async fn exists(&self, id: i64) -> ClientResult<bool> {
        self.http
            .fetch(ApiRequest::get(format!("/departments/{}/exists", id)))
            .await
            .map_err(or("Failed to check department existence"))
    }
}
