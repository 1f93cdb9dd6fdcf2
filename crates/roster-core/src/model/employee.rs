//! Employee records and mutation inputs

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable, server-assigned employee id
///
/// The directory service uses GraphQL `ID`, which may arrive as a string or a
/// number; both deserialize to the same textual id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EmployeeId(String);

impl EmployeeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EmployeeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EmployeeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for EmployeeId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for EmployeeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

/// Employment status; `Flagged` marks a record for admin attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentStatus {
    #[serde(alias = "ACTIVE")]
    Active,
    #[serde(alias = "FLAGGED")]
    Flagged,
}

impl EmploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Flagged => "flagged",
        }
    }
}

impl fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmploymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "flagged" => Ok(Self::Flagged),
            other => Err(format!("unknown employment status: {}", other)),
        }
    }
}

/// Read-through copy of an employee record owned by the directory service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u32,
    pub class: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    pub attendance: f64,
    pub status: EmploymentStatus,
}

/// Cursor pagination metadata for one page of a connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

/// One fetched slice of the employee collection
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeConnection {
    pub records: Vec<EmployeeRecord>,
    pub page_info: PageInfo,
    pub total_count: u64,
}

/// Acknowledgement of a status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: EmployeeId,
    pub status: EmploymentStatus,
}

/// Fields for creating an employee (and the matching user account)
#[derive(Clone, PartialEq, Serialize)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub age: u32,
    pub class: String,
    pub subjects: Vec<String>,
    pub attendance: f64,
}

impl NewEmployee {
    /// Start a new employee with the required identity fields
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            phone: String::new(),
            age: 0,
            class: String::new(),
            subjects: Vec::new(),
            attendance: 0.0,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = age;
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects = subjects.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attendance(mut self, attendance: f64) -> Self {
        self.attendance = attendance;
        self
    }
}

impl fmt::Debug for NewEmployee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewEmployee")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone", &self.phone)
            .field("age", &self.age)
            .field("class", &self.class)
            .field("subjects", &self.subjects)
            .field("attendance", &self.attendance)
            .finish()
    }
}

/// Partial or full replacement of an employee's editable fields
///
/// `subjects`, when present, replaces the stored list wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmployeeChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<f64>,
}

impl EmployeeChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full replacement built from an existing record (the edit form's initial state)
    pub fn from_record(record: &EmployeeRecord) -> Self {
        Self {
            name: Some(record.name.clone()),
            email: Some(record.email.clone()),
            phone: Some(record.phone.clone()),
            age: Some(record.age),
            class: Some(record.class.clone()),
            subjects: Some(record.subjects.clone()),
            attendance: Some(record.attendance),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects = Some(subjects.into_iter().map(Into::into).collect());
        self
    }

    pub fn attendance(mut self, attendance: f64) -> Self {
        self.attendance = Some(attendance);
        self
    }

    /// True when no field would be sent
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.age.is_none()
            && self.class.is_none()
            && self.subjects.is_none()
            && self.attendance.is_none()
    }
}
