//! In-memory backend state
//!
//! Employees keep a department reference by id; the department summary in
//! employee responses and the counts in department responses are derived
//! on every read.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use shared::client::AuthResponse;
use shared::models::{
    Department, DepartmentCreate, DepartmentUpdate, Employee, EmployeeCreate, EmployeeStatus,
    EmployeeUpdate, User, UserRole,
};
use tokio::sync::RwLock;

use crate::error::{MockError, MockResult};

/// Account known to the mock
#[derive(Debug, Clone)]
pub struct Account {
    pub user: User,
    pub password: String,
}

#[derive(Debug, Clone)]
struct EmployeeRecord {
    employee: Employee,
    department_id: Option<i64>,
}

/// Mutable data behind the lock
#[derive(Debug, Default)]
pub struct Store {
    accounts: Vec<Account>,
    /// access token -> username
    access_tokens: HashMap<String, String>,
    /// refresh token -> username
    refresh_tokens: HashMap<String, String>,
    departments: BTreeMap<i64, Department>,
    employees: BTreeMap<i64, EmployeeRecord>,
    next_user_id: i64,
    next_department_id: i64,
    next_employee_id: i64,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.trim().to_lowercase()))
}

impl Store {
    /// Store with the default accounts and a small organisation
    pub fn seeded() -> Self {
        let mut store = Self {
            next_user_id: 1,
            next_department_id: 1,
            next_employee_id: 1,
            ..Self::default()
        };
        store.add_account("admin", "password123", "admin@example.com", UserRole::Admin);
        store.add_account("user", "password123", "user@example.com", UserRole::User);

        let seed_departments = [
            ("Engineering", "Seattle", "Alice Chen"),
            ("Marketing", "New York", "Mark Davis"),
            ("Finance", "Chicago", "Fiona Green"),
        ];
        for (name, location, manager) in seed_departments {
            // seed names are unique
            let _ = store.create_department(DepartmentCreate {
                name: name.to_string(),
                description: Some(format!("{} department", name)),
                location: Some(location.to_string()),
                manager_name: Some(manager.to_string()),
            });
        }

        let seed_employees = [
            ("John", "Smith", "Software Engineer", 1, EmployeeStatus::Active),
            ("Jane", "Doe", "QA Engineer", 1, EmployeeStatus::Active),
            ("Bob", "Johnson", "Marketing Lead", 2, EmployeeStatus::Inactive),
        ];
        for (first, last, position, department_id, status) in seed_employees {
            let _ = store.create_employee(EmployeeCreate {
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: format!("{}.{}@example.com", first, last).to_lowercase(),
                position: Some(position.to_string()),
                salary: Some(Decimal::new(85_000, 0)),
                status: Some(status),
                department_id: Some(department_id),
                ..EmployeeCreate::default()
            });
        }
        store
    }

    fn add_account(&mut self, username: &str, password: &str, email: &str, role: UserRole) {
        let timestamp = now();
        let user = User {
            id: self.next_user_id,
            username: username.to_string(),
            email: email.to_string(),
            role,
            created_at: Some(timestamp),
            updated_at: Some(timestamp),
        };
        self.next_user_id += 1;
        self.accounts.push(Account {
            user,
            password: password.to_string(),
        });
    }

    // ========== Auth ==========

    pub fn login(&mut self, username: &str, password: &str) -> MockResult<AuthResponse> {
        let user = self
            .accounts
            .iter()
            .find(|a| a.user.username == username && a.password == password)
            .map(|a| a.user.clone())
            .ok_or_else(|| MockError::Auth("Invalid username or password".into()))?;
        Ok(self.issue_tokens(&user))
    }

    fn issue_tokens(&mut self, user: &User) -> AuthResponse {
        let access_token = format!("tok-{}", uuid::Uuid::new_v4());
        let refresh_token = format!("ref-{}", uuid::Uuid::new_v4());
        self.access_tokens
            .insert(access_token.clone(), user.username.clone());
        self.refresh_tokens
            .insert(refresh_token.clone(), user.username.clone());
        AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }

    pub fn register(&mut self, username: &str, password: &str, email: &str) -> MockResult<()> {
        let length = username.trim().chars().count();
        if !(3..=50).contains(&length) {
            return Err(MockError::validation(
                "Username must be between 3 and 50 characters",
            ));
        }
        if password.chars().count() <= 6 {
            return Err(MockError::validation(
                "Password must be longer than 6 characters",
            ));
        }
        if !email.contains('@') {
            return Err(MockError::validation("Email should be valid"));
        }
        if self.accounts.iter().any(|a| a.user.username == username) {
            return Err(MockError::Auth("User already exists".into()));
        }
        if self.accounts.iter().any(|a| a.user.email == email) {
            return Err(MockError::Auth("Email already exists".into()));
        }
        self.add_account(username, password, email, UserRole::User);
        Ok(())
    }

    pub fn refresh(&mut self, refresh_token: &str) -> MockResult<AuthResponse> {
        let username = self
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| MockError::Auth("Invalid refresh token".into()))?;
        let user = self
            .user_by_name(&username)
            .ok_or_else(|| MockError::Auth("User not found".into()))?;
        Ok(self.issue_tokens(&user))
    }

    pub fn revoke(&mut self, access_token: &str) {
        self.access_tokens.remove(access_token);
    }

    pub fn revoke_all(&mut self) {
        self.access_tokens.clear();
        self.refresh_tokens.clear();
    }

    /// Username for a live access token
    pub fn token_owner(&self, access_token: &str) -> Option<&str> {
        self.access_tokens.get(access_token).map(String::as_str)
    }

    pub fn user_by_name(&self, username: &str) -> Option<User> {
        self.accounts
            .iter()
            .find(|a| a.user.username == username)
            .map(|a| a.user.clone())
    }

    // ========== Departments ==========

    fn department_dto(&self, department: &Department, include_employees: bool) -> Department {
        let members: Vec<&EmployeeRecord> = self
            .employees
            .values()
            .filter(|r| r.department_id == Some(department.id))
            .collect();
        Department {
            employee_count: members.len() as i64,
            active_employee_count: members
                .iter()
                .filter(|r| r.employee.is_active())
                .count() as i64,
            employees: include_employees
                .then(|| members.iter().map(|r| r.employee.summary()).collect()),
            ..department.clone()
        }
    }

    pub fn departments(&self, include_employees: bool) -> Vec<Department> {
        self.departments
            .values()
            .map(|d| self.department_dto(d, include_employees))
            .collect()
    }

    pub fn department(&self, id: i64, include_employees: bool) -> MockResult<Department> {
        self.departments
            .get(&id)
            .map(|d| self.department_dto(d, include_employees))
            .ok_or_else(|| MockError::not_found(format!("Department with ID {}", id)))
    }

    fn name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.departments
            .values()
            .any(|d| Some(d.id) != except && d.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn create_department(&mut self, data: DepartmentCreate) -> MockResult<Department> {
        if blank(&data.name) {
            return Err(MockError::validation("Department name is required"));
        }
        if self.name_taken(&data.name, None) {
            return Err(MockError::Conflict(format!(
                "Department name already exists: {}",
                data.name.trim()
            )));
        }
        let timestamp = now();
        let department = Department {
            id: self.next_department_id,
            name: data.name.trim().to_string(),
            description: data.description,
            location: data.location,
            manager_name: data.manager_name,
            created_at: Some(timestamp),
            updated_at: Some(timestamp),
            employees: None,
            employee_count: 0,
            active_employee_count: 0,
        };
        self.next_department_id += 1;
        self.departments.insert(department.id, department.clone());
        Ok(department)
    }

    pub fn update_department(&mut self, id: i64, data: DepartmentUpdate) -> MockResult<Department> {
        if !self.departments.contains_key(&id) {
            return Err(MockError::not_found(format!("Department with ID {}", id)));
        }
        if data.is_empty() {
            return Err(MockError::validation("No updates provided"));
        }
        if let Some(name) = &data.name {
            if blank(name) {
                return Err(MockError::validation("Department name is required"));
            }
            if self.name_taken(name, Some(id)) {
                return Err(MockError::Conflict(format!(
                    "Department name already exists: {}",
                    name.trim()
                )));
            }
        }
        if let Some(department) = self.departments.get_mut(&id) {
            if let Some(name) = data.name {
                department.name = name.trim().to_string();
            }
            if data.description.is_some() {
                department.description = data.description;
            }
            if data.location.is_some() {
                department.location = data.location;
            }
            if data.manager_name.is_some() {
                department.manager_name = data.manager_name;
            }
            department.updated_at = Some(now());
        }
        self.department(id, false)
    }

    pub fn delete_department(&mut self, id: i64) -> MockResult<()> {
        let department = self.department(id, false)?;
        if department.employee_count > 0 {
            return Err(MockError::DepartmentNotEmpty(format!(
                "Department has {} employees and cannot be deleted",
                department.employee_count
            )));
        }
        self.departments.remove(&id);
        Ok(())
    }

    pub fn search_departments(
        &self,
        term: &str,
        field: impl Fn(&Department) -> Option<&str>,
    ) -> MockResult<Vec<Department>> {
        if blank(term) {
            return Err(MockError::validation("Search term cannot be empty"));
        }
        Ok(self
            .departments
            .values()
            .filter(|d| contains_ignore_case(field(d), term))
            .map(|d| self.department_dto(d, false))
            .collect())
    }

    // ========== Employees ==========

    fn employee_dto(&self, record: &EmployeeRecord) -> Employee {
        Employee {
            department: record
                .department_id
                .and_then(|id| self.departments.get(&id))
                .map(Department::summary),
            ..record.employee.clone()
        }
    }

    fn employees_where(&self, predicate: impl Fn(&EmployeeRecord) -> bool) -> Vec<Employee> {
        self.employees
            .values()
            .filter(|r| predicate(r))
            .map(|r| self.employee_dto(r))
            .collect()
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.employees_where(|_| true)
    }

    pub fn employee(&self, id: i64) -> MockResult<Employee> {
        self.employees
            .get(&id)
            .map(|r| self.employee_dto(r))
            .ok_or_else(|| MockError::not_found(format!("Employee with ID {}", id)))
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.employees
            .values()
            .any(|r| Some(r.employee.id) != except && r.employee.email.eq_ignore_ascii_case(email))
    }

    fn check_department(&self, department_id: Option<i64>) -> MockResult<()> {
        match department_id {
            Some(id) if !self.departments.contains_key(&id) => {
                Err(MockError::not_found(format!("Department with ID {}", id)))
            }
            _ => Ok(()),
        }
    }

    pub fn create_employee(&mut self, data: EmployeeCreate) -> MockResult<Employee> {
        if blank(&data.first_name) || blank(&data.last_name) {
            return Err(MockError::validation("First and last name are required"));
        }
        if !data.email.contains('@') {
            return Err(MockError::validation("Email should be valid"));
        }
        if self.email_taken(&data.email, None) {
            return Err(MockError::Conflict(format!(
                "This email already exists: {}",
                data.email
            )));
        }
        self.check_department(data.department_id)?;

        let timestamp = now();
        let employee = Employee {
            id: self.next_employee_id,
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            phone: data.phone,
            position: data.position,
            salary: data.salary,
            hire_date: data.hire_date,
            status: data.status.unwrap_or(EmployeeStatus::Active),
            created_at: Some(timestamp),
            updated_at: Some(timestamp),
            department: None,
        };
        self.next_employee_id += 1;
        let record = EmployeeRecord {
            employee,
            department_id: data.department_id,
        };
        let dto = self.employee_dto(&record);
        self.employees.insert(dto.id, record);
        Ok(dto)
    }

    pub fn update_employee(&mut self, id: i64, data: EmployeeUpdate) -> MockResult<Employee> {
        if !self.employees.contains_key(&id) {
            return Err(MockError::not_found(format!("Employee with ID {}", id)));
        }
        if data.is_empty() {
            return Err(MockError::validation("No updates provided"));
        }
        if let Some(email) = &data.email
            && self.email_taken(email, Some(id))
        {
            return Err(MockError::Conflict(format!("Email already exists: {}", email)));
        }
        self.check_department(data.department_id)?;

        if let Some(record) = self.employees.get_mut(&id) {
            let employee = &mut record.employee;
            if let Some(first_name) = data.first_name {
                employee.first_name = first_name;
            }
            if let Some(last_name) = data.last_name {
                employee.last_name = last_name;
            }
            if let Some(email) = data.email {
                employee.email = email;
            }
            if data.phone.is_some() {
                employee.phone = data.phone;
            }
            if data.position.is_some() {
                employee.position = data.position;
            }
            if data.salary.is_some() {
                employee.salary = data.salary;
            }
            if data.hire_date.is_some() {
                employee.hire_date = data.hire_date;
            }
            if let Some(status) = data.status {
                employee.status = status;
            }
            if data.department_id.is_some() {
                record.department_id = data.department_id;
            }
            employee.updated_at = Some(now());
        }
        self.employee(id)
    }

    pub fn update_employee_status(&mut self, id: i64, status: EmployeeStatus) -> MockResult<Employee> {
        let record = self
            .employees
            .get_mut(&id)
            .ok_or_else(|| MockError::not_found(format!("Employee with ID {}", id)))?;
        record.employee.status = status;
        record.employee.updated_at = Some(now());
        self.employee(id)
    }

    pub fn delete_employee(&mut self, id: i64) -> MockResult<()> {
        self.employees
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| MockError::not_found(format!("Employee with ID {}", id)))
    }

    pub fn employees_by_status(&self, status: EmployeeStatus) -> Vec<Employee> {
        self.employees_where(|r| r.employee.status == status)
    }

    pub fn employees_by_department(&self, department_id: i64) -> MockResult<Vec<Employee>> {
        self.check_department(Some(department_id))?;
        Ok(self.employees_where(|r| r.department_id == Some(department_id)))
    }

    pub fn search_employees(&self, name: &str) -> MockResult<Vec<Employee>> {
        if blank(name) {
            return Err(MockError::validation("Search name cannot be empty"));
        }
        Ok(self.employees_where(|r| {
            contains_ignore_case(Some(r.employee.full_name().as_str()), name)
        }))
    }
}

/// Shared state handed to every handler
#[derive(Debug)]
pub struct MockState {
    pub store: RwLock<Store>,
    search_delays: RwLock<HashMap<String, Duration>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self::new(Store::seeded())
    }
}

impl MockState {
    pub fn new(store: Store) -> Self {
        Self {
            store: RwLock::new(store),
            search_delays: RwLock::new(HashMap::new()),
        }
    }

    /// Delay answers to searches for exactly `term`
    pub async fn set_search_delay(&self, term: impl Into<String>, delay: Duration) {
        self.search_delays.write().await.insert(term.into(), delay);
    }

    pub(crate) async fn search_delay(&self, term: &str) -> Option<Duration> {
        self.search_delays.read().await.get(term).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_login() {
        let mut store = Store::seeded();
        let auth = store.login("admin", "password123").unwrap();
        assert_eq!(auth.role, UserRole::Admin);
        assert_eq!(store.token_owner(&auth.access_token), Some("admin"));
        assert!(store.login("admin", "wrong").is_err());
    }

    #[test]
    fn test_department_counts_follow_employees() {
        let store = Store::seeded();
        let engineering = store.department(1, true).unwrap();
        assert_eq!(engineering.employee_count, 2);
        assert_eq!(engineering.employees.map(|e| e.len()), Some(2));
        let finance = store.department(3, false).unwrap();
        assert!(finance.is_empty());
        assert!(finance.employees.is_none());
    }

    #[test]
    fn test_delete_department_with_employees_fails() {
        let mut store = Store::seeded();
        assert!(matches!(
            store.delete_department(1),
            Err(MockError::DepartmentNotEmpty(_))
        ));
        assert!(store.delete_department(3).is_ok());
        assert!(matches!(store.delete_department(3), Err(MockError::NotFound(_))));
    }

    #[test]
    fn test_unique_constraints() {
        let mut store = Store::seeded();
        let duplicate = DepartmentCreate {
            name: "engineering".into(),
            ..DepartmentCreate::default()
        };
        assert!(matches!(
            store.create_department(duplicate),
            Err(MockError::Conflict(_))
        ));

        let duplicate = EmployeeCreate {
            first_name: "Johnny".into(),
            last_name: "Smith".into(),
            email: "john.smith@example.com".into(),
            ..EmployeeCreate::default()
        };
        assert!(matches!(
            store.create_employee(duplicate),
            Err(MockError::Conflict(_))
        ));
    }

    #[test]
    fn test_empty_department_update_is_rejected() {
        let mut store = Store::seeded();
        assert!(matches!(
            store.update_department(1, DepartmentUpdate::default()),
            Err(MockError::Validation(_))
        ));

        let renamed = store
            .update_department(
                3,
                DepartmentUpdate {
                    location: Some("Denver".into()),
                    ..DepartmentUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.location.as_deref(), Some("Denver"));
        assert_eq!(renamed.name, "Finance");
    }

    #[test]
    fn test_search() {
        let store = Store::seeded();
        assert_eq!(store.search_employees("john").unwrap().len(), 2);
        assert!(store.search_employees("zzz").unwrap().is_empty());
        assert!(store.search_employees("  ").is_err());
    }
}
