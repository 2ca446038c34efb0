//! Department store

use std::sync::Arc;

use shared::models::{Department, DepartmentCreate, DepartmentSummary, DepartmentUpdate};
use tokio::sync::watch;

use super::{Lane, ResourceCell, ResourceState};
use crate::http::{HttpClient, NetworkHttpClient};
use crate::services::DepartmentService;
use crate::{ClientError, ClientResult};

/// Which representation `fetch_departments` loads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DepartmentView {
    /// Departments without employee detail
    #[default]
    Summary,
    /// Departments including their employee lists
    Detailed,
}

/// Aggregates over the canonical department list
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepartmentStatistics {
    pub total: usize,
    pub empty: usize,
    pub with_employees: usize,
    pub total_employees: i64,
    /// Rounded to two decimal places, 0 for an empty list
    pub average_employees_per_department: f64,
}

impl DepartmentStatistics {
    pub fn compute(departments: &[Department]) -> Self {
        let total = departments.len();
        let empty = departments.iter().filter(|d| d.is_empty()).count();
        let total_employees: i64 = departments.iter().map(|d| d.employee_count).sum();
        let average = if total == 0 {
            0.0
        } else {
            (total_employees as f64 / total as f64 * 100.0).round() / 100.0
        };
        Self {
            total,
            empty,
            with_employees: total - empty,
            total_employees,
            average_employees_per_department: average,
        }
    }
}

/// Cached department list with CRUD operations
pub struct DepartmentStore<H = NetworkHttpClient> {
    service: DepartmentService<H>,
    view: DepartmentView,
    cell: Arc<ResourceCell<Department>>,
}

impl<H> Clone for DepartmentStore<H> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            view: self.view,
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<H: HttpClient> DepartmentStore<H> {
    pub fn new(http: Arc<H>, view: DepartmentView) -> Self {
        Self {
            service: DepartmentService::new(http),
            view,
            cell: Arc::new(ResourceCell::new()),
        }
    }

    pub fn view(&self) -> DepartmentView {
        self.view
    }

    pub fn snapshot(&self) -> ResourceState<Department> {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Department>> {
        self.cell.subscribe()
    }

    pub fn statistics(&self) -> DepartmentStatistics {
        DepartmentStatistics::compute(&self.cell.snapshot().items)
    }

    /// Summary projection of what is currently displayed
    pub fn summaries(&self) -> Vec<DepartmentSummary> {
        self.cell
            .snapshot()
            .visible()
            .iter()
            .map(DepartmentSummary::from)
            .collect()
    }

    pub fn clear_error(&self) {
        self.cell.modify(|s| s.error = None);
    }

    /// Load the list in this store's view
    pub async fn fetch_departments(&self) -> ClientResult<Vec<Department>> {
        match self.view {
            DepartmentView::Summary => self.fetch_departments_summary().await,
            DepartmentView::Detailed => self.fetch_departments_with_employees().await,
        }
    }

    pub async fn fetch_departments_with_employees(&self) -> ClientResult<Vec<Department>> {
        self.cell
            .track_latest(
                Lane::List,
                "Failed to fetch departments with employees",
                self.service.list_with_employees(),
                |state, departments| state.replace_all(departments.clone()),
            )
            .await
    }

    pub async fn fetch_departments_summary(&self) -> ClientResult<Vec<Department>> {
        self.cell
            .track_latest(
                Lane::List,
                "Failed to fetch departments",
                self.service.list(),
                |state, departments| state.replace_all(departments.clone()),
            )
            .await
    }

    /// Re-read the list after changes made elsewhere
    pub async fn refresh_departments(&self) -> ClientResult<Vec<Department>> {
        self.fetch_departments().await
    }

    pub async fn get_department(&self, id: i64, include_employees: bool) -> ClientResult<Department> {
        self.cell
            .track(
                "Failed to fetch department",
                self.service.get(id, include_employees),
                |_, _| {},
            )
            .await
    }

    pub async fn create_department(&self, data: &DepartmentCreate) -> ClientResult<Department> {
        let created = self
            .cell
            .track(
                "Failed to create department",
                self.service.create(data),
                |state, department| state.insert(department.clone()),
            )
            .await?;
        tracing::info!(id = created.id, name = %created.name, "Department created");
        Ok(created)
    }

    pub async fn update_department(
        &self,
        id: i64,
        data: &DepartmentUpdate,
    ) -> ClientResult<Department> {
        self.cell
            .track(
                "Failed to update department",
                self.service.update(id, data),
                |state, department| state.replace(department.clone()),
            )
            .await
    }

    /// Delete a department
    ///
    /// A department the cache knows to still have employees is refused
    /// without contacting the server.
    pub async fn delete_department(&self, id: i64) -> ClientResult<()> {
        let occupied = self
            .cell
            .snapshot()
            .get(id)
            .map(|d| d.employee_count)
            .filter(|count| *count > 0);
        if let Some(count) = occupied {
            let message = format!(
                "Cannot delete department with {} assigned employee(s)",
                count
            );
            tracing::warn!(id, count, "Refusing to delete non-empty department");
            self.cell.modify(|s| s.error = Some(message.clone()));
            return Err(ClientError::Rejected(message));
        }

        self.cell
            .track(
                "Failed to delete department",
                self.service.delete(id),
                move |state, _| state.remove(id),
            )
            .await?;
        tracing::info!(id, "Department deleted");
        Ok(())
    }

    /// Search by name and show the results as the current view
    ///
    /// Blank input restores the full list without a request.
    pub async fn search_departments_by_name(&self, name: &str) -> ClientResult<Vec<Department>> {
        if name.trim().is_empty() {
            self.reset_search();
            return Ok(self.cell.snapshot().items);
        }
        self.cell
            .track_latest(
                Lane::Search,
                "Failed to search departments",
                self.service.search_by_name(name),
                |state, found| state.search_results = Some(found.clone()),
            )
            .await
    }

    pub fn reset_search(&self) {
        self.cell.next_generation(Lane::Search);
        self.cell.modify(|s| s.search_results = None);
    }

    /// Departments without employees; the cache is not touched
    pub async fn empty_departments(&self) -> ClientResult<Vec<Department>> {
        self.cell
            .track(
                "Failed to fetch empty departments",
                self.service.list_empty(),
                |_, _| {},
            )
            .await
    }

    /// Options for a department picker
    ///
    /// Does not toggle `loading`; a failure is still recorded in `error`.
    pub async fn departments_for_selection(&self) -> ClientResult<Vec<DepartmentSummary>> {
        match self.service.list_summary().await {
            Ok(summaries) => Ok(summaries),
            Err(e) => {
                let message = e.message_or("Failed to fetch departments for selection");
                self.cell.modify(|s| s.error = Some(message));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fake::FakeHttp;
    use serde_json::json;

    fn department(id: i64, employee_count: i64) -> Department {
        Department {
            id,
            name: format!("Dept{}", id),
            description: None,
            location: None,
            manager_name: None,
            created_at: None,
            updated_at: None,
            employees: None,
            employee_count,
            active_employee_count: employee_count,
        }
    }

    #[test]
    fn test_statistics() {
        let stats = DepartmentStatistics::compute(&[
            department(1, 0),
            department(2, 3),
            department(3, 4),
        ]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.empty, 1);
        assert_eq!(stats.with_employees, 2);
        assert_eq!(stats.total_employees, 7);
        assert_eq!(stats.average_employees_per_department, 2.33);

        let none = DepartmentStatistics::compute(&[]);
        assert_eq!(none, DepartmentStatistics::default());
    }

    #[tokio::test]
    async fn test_fetch_uses_view() {
        let http = Arc::new(FakeHttp::new());
        http.reply_data(json!([department(1, 2)]));
        let store = DepartmentStore::new(http.clone(), DepartmentView::Detailed);

        let list = store.fetch_departments().await.unwrap();
        assert_eq!(list.len(), 1);
        let requests = http.requests();
        assert_eq!(
            requests[0].query,
            vec![("includeEmployees".to_string(), "true".to_string())]
        );
        assert_eq!(store.snapshot().items, list);
    }

    #[tokio::test]
    async fn test_delete_occupied_department_is_refused_locally() {
        let http = Arc::new(FakeHttp::new());
        http.reply_data(json!([department(5, 2), department(6, 0)]));
        let store = DepartmentStore::new(http.clone(), DepartmentView::Summary);
        store.fetch_departments().await.unwrap();

        let err = store.delete_department(5).await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected(_)));
        // only the fetch went out
        assert_eq!(http.requests().len(), 1);

        let state = store.snapshot();
        assert_eq!(state.items.len(), 2);
        assert!(state.error.is_some());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_blank_search_restores_list() {
        let http = Arc::new(FakeHttp::new());
        http.reply_data(json!([department(1, 0), department(2, 0)]));
        http.reply_data(json!([department(2, 0)]));
        let store = DepartmentStore::new(http.clone(), DepartmentView::Summary);
        store.fetch_departments().await.unwrap();

        store.search_departments_by_name("Dept2").await.unwrap();
        assert_eq!(store.snapshot().visible().len(), 1);
        assert_eq!(store.summaries().len(), 1);

        let restored = store.search_departments_by_name("  ").await.unwrap();
        assert_eq!(restored.len(), 2);
        assert!(!store.snapshot().is_searching());
        assert_eq!(http.requests().len(), 2);
    }
}
