//! Department Model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::employee::EmployeeSummary;

/// Department entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub manager_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,

    // -- Detail (only when requested with includeEmployees=true) --
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<Vec<EmployeeSummary>>,
    #[serde(default)]
    pub employee_count: i64,
    #[serde(default)]
    pub active_employee_count: i64,
}

impl Department {
    pub fn is_empty(&self) -> bool {
        self.employee_count == 0
    }

    pub fn summary(&self) -> DepartmentSummary {
        DepartmentSummary {
            id: self.id,
            name: self.name.clone(),
            location: self.location.clone(),
            manager_name: self.manager_name.clone(),
        }
    }
}

/// Department summary, used in lists and selection boxes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub manager_name: Option<String>,
}

impl From<&Department> for DepartmentSummary {
    fn from(department: &Department) -> Self {
        department.summary()
    }
}

/// Create department payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCreate {
    /// Required, max 100 characters
    pub name: String,
    /// Max 500 characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_name: Option<String>,
}

/// Update department payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_name: Option<String>,
}

impl DepartmentUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.manager_name.is_none()
    }
}
