//! `/employees` handlers

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use serde::Deserialize;
use shared::ApiResponse;
use shared::models::{Employee, EmployeeCreate, EmployeeStatus, EmployeeUpdate};

use crate::error::MockResult;
use crate::state::MockState;

pub(super) fn routes() -> Router<Arc<MockState>> {
    Router::new()
        .route("/employees", get(list).post(create))
        .route("/employees/search", get(search))
        .route("/employees/status/{status}", get(by_status))
        .route("/employees/department/{department_id}", get(by_department))
        .route("/employees/count/department/{department_id}", get(count_by_department))
        .route("/employees/{id}", get(get_by_id).put(update).delete(delete))
        .route("/employees/{id}/status", patch(update_status))
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    status: EmployeeStatus,
}

#[derive(Debug, Deserialize)]
struct NameQuery {
    #[serde(default)]
    name: String,
}

async fn list(State(state): State<Arc<MockState>>) -> Json<ApiResponse<Vec<Employee>>> {
    Json(ApiResponse::ok(state.store.read().await.employees()))
}

async fn get_by_id(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
) -> MockResult<Json<ApiResponse<Employee>>> {
    Ok(Json(ApiResponse::ok(state.store.read().await.employee(id)?)))
}

async fn create(
    State(state): State<Arc<MockState>>,
    Json(payload): Json<EmployeeCreate>,
) -> MockResult<(StatusCode, Json<ApiResponse<Employee>>)> {
    let employee = state.store.write().await.create_employee(payload)?;
    tracing::info!(id = employee.id, "Employee created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            employee,
            "Employee created successfully",
        )),
    ))
}

async fn update(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    Json(payload): Json<EmployeeUpdate>,
) -> MockResult<Json<ApiResponse<Employee>>> {
    let employee = state.store.write().await.update_employee(id, payload)?;
    Ok(Json(ApiResponse::ok_with_message(
        employee,
        "Employee updated successfully",
    )))
}

/// Answers 204 without a body
async fn delete(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
) -> MockResult<StatusCode> {
    state.store.write().await.delete_employee(id)?;
    tracing::info!(id, "Employee deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn update_status(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    Query(query): Query<StatusQuery>,
) -> MockResult<Json<ApiResponse<Employee>>> {
    let employee = state
        .store
        .write()
        .await
        .update_employee_status(id, query.status)?;
    let message = format!("Employee status updated to {}", query.status);
    Ok(Json(ApiResponse::ok_with_message(employee, message)))
}

async fn by_status(
    State(state): State<Arc<MockState>>,
    Path(status): Path<EmployeeStatus>,
) -> Json<ApiResponse<Vec<Employee>>> {
    Json(ApiResponse::ok(
        state.store.read().await.employees_by_status(status),
    ))
}

async fn by_department(
    State(state): State<Arc<MockState>>,
    Path(department_id): Path<i64>,
) -> MockResult<Json<ApiResponse<Vec<Employee>>>> {
    let employees = state
        .store
        .read()
        .await
        .employees_by_department(department_id)?;
    Ok(Json(ApiResponse::ok(employees)))
}

async fn count_by_department(
    State(state): State<Arc<MockState>>,
    Path(department_id): Path<i64>,
) -> MockResult<Json<ApiResponse<i64>>> {
    let count = state
        .store
        .read()
        .await
        .employees_by_department(department_id)?
        .len() as i64;
    Ok(Json(ApiResponse::ok(count)))
}

async fn search(
    State(state): State<Arc<MockState>>,
    Query(query): Query<NameQuery>,
) -> MockResult<Json<ApiResponse<Vec<Employee>>>> {
    let found = state.store.read().await.search_employees(&query.name)?;
    if let Some(delay) = state.search_delay(&query.name).await {
        tokio::time::sleep(delay).await;
    }
    let message = format!("Found {} employees matching '{}'", found.len(), query.name);
    Ok(Json(ApiResponse::ok_with_message(found, message)))
}

