//! Employee store

use std::sync::Arc;

use shared::models::{Employee, EmployeeCreate, EmployeeStatus, EmployeeUpdate};
use tokio::sync::watch;

use super::{Lane, ResourceCell, ResourceState};
use crate::ClientResult;
use crate::http::{HttpClient, NetworkHttpClient};
use crate::services::EmployeeService;

/// Head counts by status over the canonical list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmployeeStatistics {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub terminated: usize,
}

impl EmployeeStatistics {
    pub fn compute(employees: &[Employee]) -> Self {
        let count = |status: EmployeeStatus| employees.iter().filter(|e| e.status == status).count();
        Self {
            total: employees.len(),
            active: count(EmployeeStatus::Active),
            inactive: count(EmployeeStatus::Inactive),
            terminated: count(EmployeeStatus::Terminated),
        }
    }
}

/// Cached employee list with CRUD operations
pub struct EmployeeStore<H = NetworkHttpClient> {
    service: EmployeeService<H>,
    cell: Arc<ResourceCell<Employee>>,
}

impl<H> Clone for EmployeeStore<H> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<H: HttpClient> EmployeeStore<H> {
    pub fn new(http: Arc<H>) -> Self {
        Self {
            service: EmployeeService::new(http),
            cell: Arc::new(ResourceCell::new()),
        }
    }

    pub fn snapshot(&self) -> ResourceState<Employee> {
        self.cell.snapshot()
    }

    /// Receive a new snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Employee>> {
        self.cell.subscribe()
    }

    pub fn statistics(&self) -> EmployeeStatistics {
        EmployeeStatistics::compute(&self.cell.snapshot().items)
    }

    pub fn clear_error(&self) {
        self.cell.modify(|s| s.error = None);
    }

    /// Replace the cached list with the server's
    pub async fn fetch_employees(&self) -> ClientResult<Vec<Employee>> {
        self.cell
            .track_latest(
                Lane::List,
                "Failed to fetch employees",
                self.service.list(),
                |state, employees| state.replace_all(employees.clone()),
            )
            .await
    }

    /// Single employee; the cached list is not touched
    pub async fn get_employee(&self, id: i64) -> ClientResult<Employee> {
        self.cell
            .track("Failed to fetch employee", self.service.get(id), |_, _| {})
            .await
    }

    pub async fn create_employee(&self, data: &EmployeeCreate) -> ClientResult<Employee> {
        let created = self
            .cell
            .track(
                "Failed to create employee",
                self.service.create(data),
                |state, employee| state.insert(employee.clone()),
            )
            .await?;
        tracing::info!(id = created.id, "Employee created");
        Ok(created)
    }

    pub async fn update_employee(&self, id: i64, data: &EmployeeUpdate) -> ClientResult<Employee> {
        self.cell
            .track(
                "Failed to update employee",
                self.service.update(id, data),
                |state, employee| state.replace(employee.clone()),
            )
            .await
    }

    pub async fn update_employee_status(
        &self,
        id: i64,
        status: EmployeeStatus,
    ) -> ClientResult<Employee> {
        self.cell
            .track(
                "Failed to update employee status",
                self.service.update_status(id, status),
                |state, employee| state.replace(employee.clone()),
            )
            .await
    }

    pub async fn delete_employee(&self, id: i64) -> ClientResult<()> {
        self.cell
            .track(
                "Failed to delete employee",
                self.service.delete(id),
                move |state, _| state.remove(id),
            )
            .await?;
        tracing::info!(id, "Employee deleted");
        Ok(())
    }

    /// Filtered list returned to the caller, the cache is not touched
    pub async fn employees_by_status(&self, status: EmployeeStatus) -> ClientResult<Vec<Employee>> {
        self.cell
            .track(
                "Failed to fetch employees by status",
                self.service.by_status(status),
                |_, _| {},
            )
            .await
    }

    pub async fn employees_by_department(&self, department_id: i64) -> ClientResult<Vec<Employee>> {
        self.cell
            .track(
                "Failed to fetch employees by department",
                self.service.by_department(department_id),
                |_, _| {},
            )
            .await
    }

    /// Search by name and show the results as the current view
    ///
    /// Blank input restores the full list without a request.
    pub async fn search_employees(&self, name: &str) -> ClientResult<Vec<Employee>> {
        if name.trim().is_empty() {
            self.reset_search();
            return Ok(self.cell.snapshot().items);
        }
        self.cell
            .track_latest(
                Lane::Search,
                "Failed to search employees",
                self.service.search(name),
                |state, found| state.search_results = Some(found.clone()),
            )
            .await
    }

    /// Drop the search view (and any search still in flight)
    pub fn reset_search(&self) {
        self.cell.next_generation(Lane::Search);
        self.cell.modify(|s| s.search_results = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: i64, status: EmployeeStatus) -> Employee {
        Employee {
            id,
            first_name: format!("First{}", id),
            last_name: "Last".into(),
            email: format!("e{}@x.com", id),
            phone: None,
            position: None,
            salary: None,
            hire_date: None,
            status,
            created_at: None,
            updated_at: None,
            department: None,
        }
    }

    #[test]
    fn test_statistics() {
        let stats = EmployeeStatistics::compute(&[
            employee(1, EmployeeStatus::Active),
            employee(2, EmployeeStatus::Active),
            employee(3, EmployeeStatus::Inactive),
            employee(4, EmployeeStatus::Terminated),
        ]);
        assert_eq!(
            stats,
            EmployeeStatistics {
                total: 4,
                active: 2,
                inactive: 1,
                terminated: 1,
            }
        );
        assert_eq!(EmployeeStatistics::compute(&[]), EmployeeStatistics::default());
    }
}
