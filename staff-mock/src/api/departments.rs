//! `/departments` handlers

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use shared::ApiResponse;
use shared::models::{Department, DepartmentCreate, DepartmentUpdate};

use crate::error::MockResult;
use crate::state::MockState;

pub(super) fn routes() -> Router<Arc<MockState>> {
    Router::new()
        .route("/departments", get(list).post(create))
        .route("/departments/search/name", get(search_by_name))
        .route("/departments/search/location", get(search_by_location))
        .route("/departments/search/manager", get(search_by_manager))
        .route("/departments/with-employees", get(with_employees))
        .route("/departments/empty", get(empty))
        .route(
            "/departments/{id}",
            get(get_by_id).put(update).delete(delete),
        )
        .route("/departments/{id}/employee-count", get(employee_count))
        .route("/departments/{id}/exists", get(exists))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncludeQuery {
    include_employees: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct NameQuery {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct LocationQuery {
    #[serde(default)]
    location: String,
}

#[derive(Debug, Deserialize)]
struct ManagerQuery {
    #[serde(default)]
    manager: String,
}

async fn list(
    State(state): State<Arc<MockState>>,
    Query(query): Query<IncludeQuery>,
) -> Json<ApiResponse<Vec<Department>>> {
    let include = query.include_employees.unwrap_or(false);
    let departments = state.store.read().await.departments(include);
    let message = if include {
        "Departments with employees retrieved successfully"
    } else {
        "Departments retrieved successfully"
    };
    Json(ApiResponse::ok_with_message(departments, message))
}

async fn get_by_id(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    Query(query): Query<IncludeQuery>,
) -> MockResult<Json<ApiResponse<Department>>> {
    let include = query.include_employees.unwrap_or(true);
    let department = state.store.read().await.department(id, include)?;
    Ok(Json(ApiResponse::ok_with_message(
        department,
        "Department retrieved successfully",
    )))
}

async fn create(
    State(state): State<Arc<MockState>>,
    Json(payload): Json<DepartmentCreate>,
) -> MockResult<(StatusCode, Json<ApiResponse<Department>>)> {
    let department = state.store.write().await.create_department(payload)?;
    tracing::info!(id = department.id, name = %department.name, "Department created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            department,
            "Department created successfully",
        )),
    ))
}

async fn update(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    Json(payload): Json<DepartmentUpdate>,
) -> MockResult<Json<ApiResponse<Department>>> {
    let department = state.store.write().await.update_department(id, payload)?;
    Ok(Json(ApiResponse::ok_with_message(
        department,
        "Department updated successfully",
    )))
}

/// Answers with an envelope, unlike employee deletion
async fn delete(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
) -> MockResult<Json<ApiResponse<()>>> {
    state.store.write().await.delete_department(id)?;
    tracing::info!(id, "Department deleted");
    Ok(Json(ApiResponse::message("Department deleted successfully")))
}

async fn search_by_name(
    State(state): State<Arc<MockState>>,
    Query(query): Query<NameQuery>,
) -> MockResult<Json<ApiResponse<Vec<Department>>>> {
    let found = state
        .store
        .read()
        .await
        .search_departments(&query.name, |d| Some(d.name.as_str()))?;
    if let Some(delay) = state.search_delay(&query.name).await {
        tokio::time::sleep(delay).await;
    }
    Ok(Json(ApiResponse::ok(found)))
}

async fn search_by_location(
    State(state): State<Arc<MockState>>,
    Query(query): Query<LocationQuery>,
) -> MockResult<Json<ApiResponse<Vec<Department>>>> {
    let found = state
        .store
        .read()
        .await
        .search_departments(&query.location, |d| d.location.as_deref())?;
    Ok(Json(ApiResponse::ok(found)))
}

async fn search_by_manager(
    State(state): State<Arc<MockState>>,
    Query(query): Query<ManagerQuery>,
) -> MockResult<Json<ApiResponse<Vec<Department>>>> {
    let found = state
        .store
        .read()
        .await
        .search_departments(&query.manager, |d| d.manager_name.as_deref())?;
    Ok(Json(ApiResponse::ok(found)))
}

async fn with_employees(State(state): State<Arc<MockState>>) -> Json<ApiResponse<Vec<Department>>> {
    let departments = state
        .store
        .read()
        .await
        .departments(false)
        .into_iter()
        .filter(|d| !d.is_empty())
        .collect();
    Json(ApiResponse::ok(departments))
}

async fn empty(State(state): State<Arc<MockState>>) -> Json<ApiResponse<Vec<Department>>> {
    let departments = state
        .store
        .read()
        .await
        .departments(false)
        .into_iter()
        .filter(Department::is_empty)
        .collect();
    Json(ApiResponse::ok(departments))
}

async fn employee_count(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
) -> MockResult<Json<ApiResponse<i64>>> {
    let department = state.store.read().await.department(id, false)?;
    Ok(Json(ApiResponse::ok(department.employee_count)))
}

async fn exists(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<bool>> {
    let exists = state.store.read().await.department(id, false).is_ok();
    Json(ApiResponse::ok(exists))
}
