//! Common types used across the server
//!
//! Domain records owned by the [`Repository`](crate::repository::Repository)
//! and the request/response payloads exchanged over HTTP.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Actor role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tenant,
    Applicant,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Tenant => f.write_str("tenant"),
            Role::Applicant => f.write_str("applicant"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tenant" => Ok(Role::Tenant),
            "applicant" => Ok(Role::Applicant),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A stored user account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
}

impl User {
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// Public view of a user, also the cached profile value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
}

/// Partial update of a user; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: i64,
    pub tenant_id: i64,
    pub title: String,
    pub compensation: i64,
    pub city: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVacancy {
    pub title: String,
    pub compensation: i64,
    pub city: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VacancyPatch {
    pub new_title: Option<String>,
    pub new_city: Option<String>,
    pub new_compensation: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    pub id: i64,
    pub applicant_id: i64,
    pub title: String,
    pub about: String,
    pub stack: String,
    pub city: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewResume {
    pub title: String,
    pub about: String,
    pub city: String,
    pub stack: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResumePatch {
    pub new_title: Option<String>,
    pub new_about: Option<String>,
    pub new_city: Option<String>,
    pub new_stack: Option<String>,
}

/// Lifecycle of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Send,
    Viewed,
    Shortlisted,
    Interview,
    Rejected,
    Hired,
}

/// Statuses a tenant may assign; `send` is reserved for new applications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Viewed,
    Shortlisted,
    Interview,
    Rejected,
    Hired,
}

impl From<ReviewStatus> for ResponseStatus {
    fn from(status: ReviewStatus) -> Self {
        match status {
            ReviewStatus::Viewed => ResponseStatus::Viewed,
            ReviewStatus::Shortlisted => ResponseStatus::Shortlisted,
            ReviewStatus::Interview => ResponseStatus::Interview,
            ReviewStatus::Rejected => ResponseStatus::Rejected,
            ReviewStatus::Hired => ResponseStatus::Hired,
        }
    }
}

/// An application of a resume to a vacancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResponse {
    pub id: i64,
    pub applicant_id: i64,
    pub resume_id: i64,
    pub vacancy_id: i64,
    pub cover_letter: Option<String>,
    pub status: ResponseStatus,
}

#[derive(Debug, Clone)]
pub struct NewResponse {
    pub applicant_id: i64,
    pub resume_id: i64,
    pub vacancy_id: i64,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeSummary {
    pub id: i64,
    pub title: String,
    pub stack: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// An application as seen by the vacancy owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseDetail {
    pub id: i64,
    pub cover_letter: Option<String>,
    pub status: ResponseStatus,
    pub resume: ResumeSummary,
    pub user: ApplicantSummary,
}

/// Rows removed alongside a deleted parent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub vacancies: usize,
    pub resumes: usize,
    pub responses: usize,
}

/// Offset pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

pub(crate) fn default_limit() -> u64 {
    10
}

/// One page of a listing together with the unpaginated total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub total: u64,
    pub items: Vec<T>,
}

/// Vacancy search filters; text filters are case-insensitive substrings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VacancyQuery {
    pub title: Option<String>,
    pub city: Option<String>,
    pub compensation: Option<i64>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Resume search filters; text filters are case-insensitive substrings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResumeQuery {
    pub title: Option<String>,
    pub city: Option<String>,
    pub stack: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Standard acknowledgement body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
