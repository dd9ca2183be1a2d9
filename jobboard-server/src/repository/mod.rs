//! Relational store boundary
//!
//! Every method is one committed unit of work. Lookups by id that match
//! nothing return [`RepoError::NotFound`] naming the entity. Deleting a user
//! cascades to their vacancies, resumes and responses; deleting a vacancy or
//! resume cascades to its responses.

mod memory;

#[cfg(test)]
mod tests;

pub use memory::MemoryRepository;

use crate::types::{
    CascadeSummary, JobResponse, NewResponse, NewResume, NewUser, NewVacancy, Page, PageParams,
    ResponseDetail, ResponseStatus, Resume, ResumePatch, ResumeQuery, User, UserPatch, Vacancy,
    VacancyPatch, VacancyQuery,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    /// The entity name, e.g. `"Vacancy"`
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait Repository: Send + Sync {
    // Users
    async fn create_user(&self, new: NewUser) -> RepoResult<User>;
    async fn user(&self, id: i64) -> RepoResult<User>;
    async fn user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn update_user(&self, id: i64, patch: UserPatch) -> RepoResult<User>;
    async fn delete_user(&self, id: i64) -> RepoResult<CascadeSummary>;
    async fn list_users(&self, page: PageParams) -> RepoResult<Page<User>>;

    // Vacancies
    async fn create_vacancy(&self, tenant_id: i64, new: NewVacancy) -> RepoResult<Vacancy>;
    async fn vacancy(&self, id: i64) -> RepoResult<Vacancy>;
    async fn vacancies_of(&self, tenant_id: i64) -> RepoResult<Vec<Vacancy>>;
    async fn update_vacancy(&self, id: i64, patch: VacancyPatch) -> RepoResult<Vacancy>;
    async fn delete_vacancy(&self, id: i64) -> RepoResult<CascadeSummary>;
    async fn list_vacancies(&self, page: PageParams) -> RepoResult<Page<Vacancy>>;
    async fn search_vacancies(&self, query: &VacancyQuery) -> RepoResult<Vec<Vacancy>>;

    // Resumes
    async fn create_resume(&self, applicant_id: i64, new: NewResume) -> RepoResult<Resume>;
    async fn resume(&self, id: i64) -> RepoResult<Resume>;
    async fn resumes_of(&self, applicant_id: i64) -> RepoResult<Vec<Resume>>;
    async fn update_resume(&self, id: i64, patch: ResumePatch) -> RepoResult<Resume>;
    async fn delete_resume(&self, id: i64) -> RepoResult<CascadeSummary>;
    async fn list_resumes(&self, page: PageParams) -> RepoResult<Page<Resume>>;
    async fn search_resumes(&self, query: &ResumeQuery) -> RepoResult<Vec<Resume>>;

    // Responses
    /// Fails with [`RepoError::Conflict`] if the resume already applied to the vacancy
    async fn create_response(&self, new: NewResponse) -> RepoResult<JobResponse>;
    async fn response(&self, id: i64) -> RepoResult<JobResponse>;
    async fn responses_for_vacancy(&self, vacancy_id: i64) -> RepoResult<Vec<ResponseDetail>>;
    async fn set_response_status(&self, id: i64, status: ResponseStatus)
    -> RepoResult<JobResponse>;
    async fn delete_response(&self, id: i64) -> RepoResult<()>;
    async fn list_responses(&self, page: PageParams) -> RepoResult<Page<JobResponse>>;
}
