use super::{RepoError, RepoResult, Repository};
use crate::types::{
    ApplicantSummary, CascadeSummary, JobResponse, NewResponse, NewResume, NewUser, NewVacancy,
    Page, PageParams, ResponseDetail, ResponseStatus, Resume, ResumePatch, ResumeQuery,
    ResumeSummary, User, UserPatch, Vacancy, VacancyPatch, VacancyQuery,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    vacancies: BTreeMap<i64, Vacancy>,
    resumes: BTreeMap<i64, Resume>,
    responses: BTreeMap<i64, JobResponse>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn drop_responses(&mut self, keep: impl Fn(&JobResponse) -> bool) -> usize {
        let before = self.responses.len();
        self.responses.retain(|_, r| keep(r));
        before - self.responses.len()
    }
}

/// In-process [`Repository`] over ordered maps
///
/// Each method runs under a single lock acquisition, so every call commits
/// atomically. Ids are allocated from one sequence shared by all tables.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: &str, needle: Option<&String>) -> bool {
    match needle {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

// Empty edit fields leave the stored value alone
fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

fn paginate<T: Clone>(items: impl Iterator<Item = T>, limit: u64, offset: u64) -> Vec<T> {
    items
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect()
}

fn page_of<T: Clone>(map: &BTreeMap<i64, T>, page: PageParams) -> Page<T> {
    Page {
        total: map.len() as u64,
        items: paginate(map.values().cloned(), page.limit, page.offset),
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, new: NewUser) -> RepoResult<User> {
        let mut t = self.tables.write();
        if t.users.values().any(|u| u.email == new.email) {
            return Err(RepoError::Conflict(
                "This email already exists in database".to_string(),
            ));
        }
        let user = User {
            id: t.next_id(),
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            name: new.name,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user(&self, id: i64) -> RepoResult<User> {
        self.tables
            .read()
            .users
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound("User"))
    }

    async fn user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> RepoResult<User> {
        let mut t = self.tables.write();
        let user = t.users.get_mut(&id).ok_or(RepoError::NotFound("User"))?;
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(hash) = patch.password_hash {
            user.password_hash = hash;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> RepoResult<CascadeSummary> {
        let mut t = self.tables.write();
        if t.users.remove(&id).is_none() {
            return Err(RepoError::NotFound("User"));
        }

        let vacancy_ids: Vec<i64> = t
            .vacancies
            .values()
            .filter(|v| v.tenant_id == id)
            .map(|v| v.id)
            .collect();
        let resume_ids: Vec<i64> = t
            .resumes
            .values()
            .filter(|r| r.applicant_id == id)
            .map(|r| r.id)
            .collect();

        for vid in &vacancy_ids {
            t.vacancies.remove(vid);
        }
        for rid in &resume_ids {
            t.resumes.remove(rid);
        }
        let responses = t.drop_responses(|r| {
            r.applicant_id != id
                && !vacancy_ids.contains(&r.vacancy_id)
                && !resume_ids.contains(&r.resume_id)
        });

        Ok(CascadeSummary {
            vacancies: vacancy_ids.len(),
            resumes: resume_ids.len(),
            responses,
        })
    }

    async fn list_users(&self, page: PageParams) -> RepoResult<Page<User>> {
        Ok(page_of(&self.tables.read().users, page))
    }

    async fn create_vacancy(&self, tenant_id: i64, new: NewVacancy) -> RepoResult<Vacancy> {
        let mut t = self.tables.write();
        if !t.users.contains_key(&tenant_id) {
            return Err(RepoError::NotFound("User"));
        }
        let vacancy = Vacancy {
            id: t.next_id(),
            tenant_id,
            title: new.title,
            compensation: new.compensation,
            city: new.city,
        };
        t.vacancies.insert(vacancy.id, vacancy.clone());
        Ok(vacancy)
    }

    async fn vacancy(&self, id: i64) -> RepoResult<Vacancy> {
        self.tables
            .read()
            .vacancies
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound("Vacancy"))
    }

    async fn vacancies_of(&self, tenant_id: i64) -> RepoResult<Vec<Vacancy>> {
        Ok(self
            .tables
            .read()
            .vacancies
            .values()
            .filter(|v| v.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn update_vacancy(&self, id: i64, patch: VacancyPatch) -> RepoResult<Vacancy> {
        let mut t = self.tables.write();
        let vacancy = t
            .vacancies
            .get_mut(&id)
            .ok_or(RepoError::NotFound("Vacancy"))?;
        if let Some(title) = non_empty(patch.new_title) {
            vacancy.title = title;
        }
        if let Some(city) = non_empty(patch.new_city) {
            vacancy.city = city;
        }
        if let Some(compensation) = patch.new_compensation.filter(|c| *c != 0) {
            vacancy.compensation = compensation;
        }
        Ok(vacancy.clone())
    }

    async fn delete_vacancy(&self, id: i64) -> RepoResult<CascadeSummary> {
        let mut t = self.tables.write();
        if t.vacancies.remove(&id).is_none() {
            return Err(RepoError::NotFound("Vacancy"));
        }
        let responses = t.drop_responses(|r| r.vacancy_id != id);
        Ok(CascadeSummary {
            vacancies: 1,
            resumes: 0,
            responses,
        })
    }

    async fn list_vacancies(&self, page: PageParams) -> RepoResult<Page<Vacancy>> {
        Ok(page_of(&self.tables.read().vacancies, page))
    }

    async fn search_vacancies(&self, query: &VacancyQuery) -> RepoResult<Vec<Vacancy>> {
        let t = self.tables.read();
        let matches = t.vacancies.values().filter(|v| {
            contains_ci(&v.title, query.title.as_ref())
                && contains_ci(&v.city, query.city.as_ref())
                && query.compensation.is_none_or(|min| v.compensation >= min)
        });
        Ok(paginate(matches.cloned(), query.limit, query.offset))
    }

    async fn create_resume(&self, applicant_id: i64, new: NewResume) -> RepoResult<Resume> {
        let mut t = self.tables.write();
        if !t.users.contains_key(&applicant_id) {
            return Err(RepoError::NotFound("User"));
        }
        let resume = Resume {
            id: t.next_id(),
            applicant_id,
            title: new.title,
            about: new.about,
            stack: new.stack,
            city: new.city,
        };
        t.resumes.insert(resume.id, resume.clone());
        Ok(resume)
    }

    async fn resume(&self, id: i64) -> RepoResult<Resume> {
        self.tables
            .read()
            .resumes
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound("Resume"))
    }

    async fn resumes_of(&self, applicant_id: i64) -> RepoResult<Vec<Resume>> {
        Ok(self
            .tables
            .read()
            .resumes
            .values()
            .filter(|r| r.applicant_id == applicant_id)
            .cloned()
            .collect())
    }

    async fn update_resume(&self, id: i64, patch: ResumePatch) -> RepoResult<Resume> {
        let mut t = self.tables.write();
        let resume = t
            .resumes
            .get_mut(&id)
            .ok_or(RepoError::NotFound("Resume"))?;
        if let Some(title) = non_empty(patch.new_title) {
            resume.title = title;
        }
        if let Some(about) = non_empty(patch.new_about) {
            resume.about = about;
        }
        if let Some(city) = non_empty(patch.new_city) {
            resume.city = city;
        }
        if let Some(stack) = non_empty(patch.new_stack) {
            resume.stack = stack;
        }
        Ok(resume.clone())
    }

    async fn delete_resume(&self, id: i64) -> RepoResult<CascadeSummary> {
        let mut t = self.tables.write();
        if t.resumes.remove(&id).is_none() {
            return Err(RepoError::NotFound("Resume"));
        }
        let responses = t.drop_responses(|r| r.resume_id != id);
        Ok(CascadeSummary {
            vacancies: 0,
            resumes: 1,
            responses,
        })
    }

    async fn list_resumes(&self, page: PageParams) -> RepoResult<Page<Resume>> {
        Ok(page_of(&self.tables.read().resumes, page))
    }

    async fn search_resumes(&self, query: &ResumeQuery) -> RepoResult<Vec<Resume>> {
        let t = self.tables.read();
        let matches = t.resumes.values().filter(|r| {
            contains_ci(&r.title, query.title.as_ref())
                && contains_ci(&r.city, query.city.as_ref())
                && contains_ci(&r.stack, query.stack.as_ref())
        });
        Ok(paginate(matches.cloned(), query.limit, query.offset))
    }

    async fn create_response(&self, new: NewResponse) -> RepoResult<JobResponse> {
        let mut t = self.tables.write();
        if !t.vacancies.contains_key(&new.vacancy_id) {
            return Err(RepoError::NotFound("Vacancy"));
        }
        if !t.resumes.contains_key(&new.resume_id) {
            return Err(RepoError::NotFound("Resume"));
        }
        if t
            .responses
            .values()
            .any(|r| r.resume_id == new.resume_id && r.vacancy_id == new.vacancy_id)
        {
            return Err(RepoError::Conflict(
                "You have already applied to this vacancy with this resume".to_string(),
            ));
        }
        let response = JobResponse {
            id: t.next_id(),
            applicant_id: new.applicant_id,
            resume_id: new.resume_id,
            vacancy_id: new.vacancy_id,
            cover_letter: new.cover_letter,
            status: ResponseStatus::Send,
        };
        t.responses.insert(response.id, response.clone());
        Ok(response)
    }

    async fn response(&self, id: i64) -> RepoResult<JobResponse> {
        self.tables
            .read()
            .responses
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound("Response"))
    }

    async fn responses_for_vacancy(&self, vacancy_id: i64) -> RepoResult<Vec<ResponseDetail>> {
        let t = self.tables.read();
        let details = t
            .responses
            .values()
            .filter(|r| r.vacancy_id == vacancy_id)
            .filter_map(|r| {
                // Cascades keep these joins total; skip rather than fail if not
                let resume = t.resumes.get(&r.resume_id)?;
                let user = t.users.get(&r.applicant_id)?;
                Some(ResponseDetail {
                    id: r.id,
                    cover_letter: r.cover_letter.clone(),
                    status: r.status,
                    resume: ResumeSummary {
                        id: resume.id,
                        title: resume.title.clone(),
                        stack: resume.stack.clone(),
                    },
                    user: ApplicantSummary {
                        id: user.id,
                        name: user.name.clone(),
                        email: user.email.clone(),
                    },
                })
            })
            .collect();
        Ok(details)
    }

    async fn set_response_status(
        &self,
        id: i64,
        status: ResponseStatus,
    ) -> RepoResult<JobResponse> {
        let mut t = self.tables.write();
        let response = t
            .responses
            .get_mut(&id)
            .ok_or(RepoError::NotFound("Response"))?;
        response.status = status;
        Ok(response.clone())
    }

    async fn delete_response(&self, id: i64) -> RepoResult<()> {
        self.tables
            .write()
            .responses
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound("Response"))
    }

    async fn list_responses(&self, page: PageParams) -> RepoResult<Page<JobResponse>> {
        Ok(page_of(&self.tables.read().responses, page))
    }
}
