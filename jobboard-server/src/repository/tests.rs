use super::*;
use crate::types::{NewResponse, NewResume, NewUser, NewVacancy, Role};

async fn user(repo: &MemoryRepository, email: &str, role: Role) -> User {
    repo.create_user(NewUser {
        email: email.to_string(),
        password_hash: "hash".to_string(),
        role,
        name: email.split('@').next().unwrap_or_default().to_string(),
    })
    .await
    .unwrap()
}

async fn vacancy(repo: &MemoryRepository, tenant: i64, title: &str, city: &str, pay: i64) -> Vacancy {
    repo.create_vacancy(
        tenant,
        NewVacancy {
            title: title.to_string(),
            compensation: pay,
            city: city.to_string(),
        },
    )
    .await
    .unwrap()
}

async fn resume(repo: &MemoryRepository, applicant: i64, title: &str, stack: &str) -> Resume {
    repo.create_resume(
        applicant,
        NewResume {
            title: title.to_string(),
            about: "about".to_string(),
            city: "Berlin".to_string(),
            stack: stack.to_string(),
        },
    )
    .await
    .unwrap()
}

async fn apply(repo: &MemoryRepository, applicant: i64, resume: i64, vacancy: i64) -> RepoResult<JobResponse> {
    repo.create_response(NewResponse {
        applicant_id: applicant,
        resume_id: resume,
        vacancy_id: vacancy,
        cover_letter: Some("hello".to_string()),
    })
    .await
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let repo = MemoryRepository::new();
    user(&repo, "a@example.com", Role::Tenant).await;

    let err = repo
        .create_user(NewUser {
            email: "a@example.com".into(),
            password_hash: "x".into(),
            role: Role::Applicant,
            name: "other".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[tokio::test]
async fn test_lookup_by_email_and_id() {
    let repo = MemoryRepository::new();
    let alice = user(&repo, "alice@example.com", Role::Applicant).await;

    assert_eq!(repo.user(alice.id).await.unwrap(), alice);
    assert_eq!(
        repo.user_by_email("alice@example.com").await.unwrap(),
        Some(alice)
    );
    assert_eq!(repo.user_by_email("bob@example.com").await.unwrap(), None);
    assert_eq!(repo.user(999).await, Err(RepoError::NotFound("User")));
}

#[tokio::test]
async fn test_user_patch_only_touches_given_fields() {
    let repo = MemoryRepository::new();
    let alice = user(&repo, "alice@example.com", Role::Applicant).await;

    let updated = repo
        .update_user(
            alice.id,
            UserPatch {
                name: Some("Alice B".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Alice B");
    assert_eq!(updated.role, Role::Applicant);
    assert_eq!(updated.password_hash, alice.password_hash);
}

#[tokio::test]
async fn test_vacancy_patch() {
    let repo = MemoryRepository::new();
    let tenant = user(&repo, "t@example.com", Role::Tenant).await;
    let v = vacancy(&repo, tenant.id, "Rust dev", "Berlin", 5000).await;

    let updated = repo
        .update_vacancy(
            v.id,
            VacancyPatch {
                new_compensation: Some(7000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.compensation, 7000);
    assert_eq!(updated.title, "Rust dev");
    assert_eq!(repo.vacancy(v.id).await.unwrap(), updated);
}

#[tokio::test]
async fn test_duplicate_application_conflicts() {
    let repo = MemoryRepository::new();
    let tenant = user(&repo, "t@example.com", Role::Tenant).await;
    let applicant = user(&repo, "a@example.com", Role::Applicant).await;
    let v = vacancy(&repo, tenant.id, "Rust dev", "Berlin", 5000).await;
    let r = resume(&repo, applicant.id, "Engineer", "rust").await;

    let first = apply(&repo, applicant.id, r.id, v.id).await.unwrap();
    assert_eq!(first.status, ResponseStatus::Send);

    let second = apply(&repo, applicant.id, r.id, v.id).await;
    assert!(matches!(second, Err(RepoError::Conflict(_))));
}

#[tokio::test]
async fn test_apply_to_missing_vacancy() {
    let repo = MemoryRepository::new();
    let applicant = user(&repo, "a@example.com", Role::Applicant).await;
    let r = resume(&repo, applicant.id, "Engineer", "rust").await;

    let err = apply(&repo, applicant.id, r.id, 404).await.unwrap_err();
    assert_eq!(err, RepoError::NotFound("Vacancy"));
}

#[tokio::test]
async fn test_responses_for_vacancy_join() {
    let repo = MemoryRepository::new();
    let tenant = user(&repo, "t@example.com", Role::Tenant).await;
    let applicant = user(&repo, "a@example.com", Role::Applicant).await;
    let v = vacancy(&repo, tenant.id, "Rust dev", "Berlin", 5000).await;
    let r = resume(&repo, applicant.id, "Engineer", "rust, tokio").await;
    apply(&repo, applicant.id, r.id, v.id).await.unwrap();

    let details = repo.responses_for_vacancy(v.id).await.unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].resume.stack, "rust, tokio");
    assert_eq!(details[0].user.email, "a@example.com");
    assert_eq!(details[0].cover_letter.as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_set_status() {
    let repo = MemoryRepository::new();
    let tenant = user(&repo, "t@example.com", Role::Tenant).await;
    let applicant = user(&repo, "a@example.com", Role::Applicant).await;
    let v = vacancy(&repo, tenant.id, "Rust dev", "Berlin", 5000).await;
    let r = resume(&repo, applicant.id, "Engineer", "rust").await;
    let resp = apply(&repo, applicant.id, r.id, v.id).await.unwrap();

    let updated = repo
        .set_response_status(resp.id, ResponseStatus::Interview)
        .await
        .unwrap();
    assert_eq!(updated.status, ResponseStatus::Interview);
    assert_eq!(
        repo.set_response_status(999, ResponseStatus::Hired).await,
        Err(RepoError::NotFound("Response"))
    );
}

#[tokio::test]
async fn test_delete_vacancy_cascades_to_responses() {
    let repo = MemoryRepository::new();
    let tenant = user(&repo, "t@example.com", Role::Tenant).await;
    let applicant = user(&repo, "a@example.com", Role::Applicant).await;
    let v1 = vacancy(&repo, tenant.id, "Rust dev", "Berlin", 5000).await;
    let v2 = vacancy(&repo, tenant.id, "Go dev", "Berlin", 4000).await;
    let r = resume(&repo, applicant.id, "Engineer", "rust").await;
    apply(&repo, applicant.id, r.id, v1.id).await.unwrap();
    let kept = apply(&repo, applicant.id, r.id, v2.id).await.unwrap();

    let summary = repo.delete_vacancy(v1.id).await.unwrap();
    assert_eq!(summary.vacancies, 1);
    assert_eq!(summary.responses, 1);

    let page = repo.list_responses(PageParams::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, kept.id);
}

#[tokio::test]
async fn test_delete_user_cascades() {
    let repo = MemoryRepository::new();
    let tenant = user(&repo, "t@example.com", Role::Tenant).await;
    let applicant = user(&repo, "a@example.com", Role::Applicant).await;
    let v = vacancy(&repo, tenant.id, "Rust dev", "Berlin", 5000).await;
    let r1 = resume(&repo, applicant.id, "Engineer", "rust").await;
    resume(&repo, applicant.id, "Lead", "rust").await;
    apply(&repo, applicant.id, r1.id, v.id).await.unwrap();

    let summary = repo.delete_user(applicant.id).await.unwrap();
    assert_eq!(
        summary,
        CascadeSummary {
            vacancies: 0,
            resumes: 2,
            responses: 1
        }
    );
    assert!(repo.resumes_of(applicant.id).await.unwrap().is_empty());
    assert_eq!(repo.vacancies_of(tenant.id).await.unwrap().len(), 1);
    assert_eq!(
        repo.delete_user(applicant.id).await,
        Err(RepoError::NotFound("User"))
    );
}

#[tokio::test]
async fn test_search_vacancies_filters() {
    let repo = MemoryRepository::new();
    let tenant = user(&repo, "t@example.com", Role::Tenant).await;
    vacancy(&repo, tenant.id, "Senior Rust Developer", "Berlin", 7000).await;
    vacancy(&repo, tenant.id, "Rust Intern", "Munich", 1500).await;
    vacancy(&repo, tenant.id, "Go Developer", "Berlin", 6000).await;

    let query = VacancyQuery {
        title: Some("rust".into()),
        limit: 10,
        ..Default::default()
    };
    assert_eq!(repo.search_vacancies(&query).await.unwrap().len(), 2);

    let query = VacancyQuery {
        title: Some("rust".into()),
        compensation: Some(5000),
        limit: 10,
        ..Default::default()
    };
    let hits = repo.search_vacancies(&query).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Senior Rust Developer");

    let query = VacancyQuery {
        city: Some("BERLIN".into()),
        limit: 1,
        offset: 1,
        ..Default::default()
    };
    let hits = repo.search_vacancies(&query).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Go Developer");
}

#[tokio::test]
async fn test_search_resumes_by_stack() {
    let repo = MemoryRepository::new();
    let applicant = user(&repo, "a@example.com", Role::Applicant).await;
    resume(&repo, applicant.id, "Backend", "Rust, Tokio, Axum").await;
    resume(&repo, applicant.id, "Frontend", "TypeScript").await;

    let query = ResumeQuery {
        stack: Some("tokio".into()),
        limit: 10,
        ..Default::default()
    };
    let hits = repo.search_resumes(&query).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Backend");
}

#[tokio::test]
async fn test_listing_reports_total() {
    let repo = MemoryRepository::new();
    for i in 0..5 {
        user(&repo, &format!("u{i}@example.com"), Role::Applicant).await;
    }

    let page = repo
        .list_users(PageParams {
            limit: 2,
            offset: 4,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].email, "u4@example.com");
}

#[tokio::test]
async fn test_empty_patch_fields_are_ignored() {
    let repo = MemoryRepository::new();
    let applicant = user(&repo, "a@example.com", Role::Applicant).await;
    let r = resume(&repo, applicant.id, "Engineer", "rust").await;

    let updated = repo
        .update_resume(
            r.id,
            ResumePatch {
                new_title: Some(String::new()),
                new_stack: Some("rust, axum".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Engineer");
    assert_eq!(updated.stack, "rust, axum");
}
