//! Employee and duty reference data.
//!
//! Both are loaded once per allocation run by the caller and are never
//! mutated while a solve is in progress.

use serde::{Deserialize, Serialize};

/// Represents an employee taking part in the rotation.
///
/// # Examples
///
/// ```
/// use rota_engine::models::Employee;
///
/// let employee = Employee::new("emp_001", "Samuel Brown");
/// assert_eq!(employee.id, "emp_001");
/// assert_eq!(employee.name, "Samuel Brown");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Employee {
    /// Creates an employee record.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A duty an employee can be allocated to (e.g. "Mail Sorting").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Duty {
    /// Unique identifier for the duty.
    pub id: String,
    /// Duty name or type.
    pub name: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Duty {
    /// Creates a duty record without a description.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_employee() {
        let json = r#"{ "id": "emp_001", "name": "Samuel Brown" }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee, Employee::new("emp_001", "Samuel Brown"));
    }

    #[test]
    fn test_deserialize_employee_missing_name_fails() {
        let json = r#"{ "id": "emp_001" }"#;

        let result: Result<Employee, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_duty_without_description() {
        let json = r#"{ "id": "mail_sorting", "name": "Mail Sorting" }"#;

        let duty: Duty = serde_json::from_str(json).unwrap();
        assert_eq!(duty.id, "mail_sorting");
        assert!(duty.description.is_none());
    }

    #[test]
    fn test_serialize_duty_omits_missing_description() {
        let duty = Duty::new("scanning", "Scanning and Bar Coding");
        let json = serde_json::to_string(&duty).unwrap();

        assert_eq!(json, r#"{"id":"scanning","name":"Scanning and Bar Coding"}"#);
    }

    #[test]
    fn test_serialize_duty_with_description() {
        let duty = Duty {
            description: Some("Operate the franking machines".to_string()),
            ..Duty::new("machine_operation", "Machine Operation")
        };
        let json = serde_json::to_string(&duty).unwrap();

        assert!(json.contains("\"description\":\"Operate the franking machines\""));
    }
}
