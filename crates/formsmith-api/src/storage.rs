//! Repositories - persistence abstraction for users, groups and forms
//!
//! The server only ships in-memory implementations; the traits are the seam
//! a database-backed store plugs into.

use async_trait::async_trait;
use chrono::Utc;
use formsmith_core::Form;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::models::{Group, StoredForm, Submission, User, View};

/// Repository result type
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: &str) -> RepoResult<User>;

    async fn find_by_email(&self, email: &str) -> RepoResult<User>;

    /// Fails with `Conflict` when the email is taken
    async fn insert(&self, user: User) -> RepoResult<()>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn get(&self, id: &str) -> RepoResult<Group>;

    async fn insert(&self, group: Group) -> RepoResult<()>;

    async fn save(&self, group: &Group) -> RepoResult<()>;

    async fn delete(&self, id: &str) -> RepoResult<()>;

    async fn list_by_owner(&self, owner_id: &str) -> RepoResult<Vec<Group>>;
}

#[async_trait]
pub trait FormRepository: Send + Sync {
    async fn get(&self, id: &str) -> RepoResult<StoredForm>;

    /// Fails with `Conflict` when the id already exists
    async fn insert(&self, form: StoredForm) -> RepoResult<()>;

    /// Replaces the document only; views and submissions are left as they
    /// are. Returns the stored document.
    async fn replace_form(&self, id: &str, form: Form) -> RepoResult<Form>;

    /// Sets the document title in place. Returns the stored document.
    async fn rename(&self, id: &str, title: &str) -> RepoResult<Form>;

    async fn delete(&self, id: &str) -> RepoResult<()>;

    async fn list_by_owner(&self, owner_id: &str) -> RepoResult<Vec<StoredForm>>;

    async fn record_view(&self, id: &str, view: View) -> RepoResult<()>;

    /// Appends a submission. With `unique_user` set, a second submission by
    /// the same user is a `Conflict`; the check and the append happen under
    /// one lock.
    async fn append_submission(
        &self,
        id: &str,
        submission: Submission,
        unique_user: bool,
    ) -> RepoResult<()>;

    /// Removes every form in a group, returning how many went
    async fn delete_by_group(&self, owner_id: &str, group_id: &str) -> RepoResult<usize>;
}

// ============ In-memory ============

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: &str) -> RepoResult<User> {
        self.users
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<User> {
        self.users
            .read()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(email.to_string()))
    }

    async fn insert(&self, user: User) -> RepoResult<()> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(RepositoryError::Conflict(format!("email {} already registered", user.email)));
        }
        users.insert(user.id.clone(), user);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryGroupRepository {
    groups: RwLock<HashMap<String, Group>>,
}

impl InMemoryGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn get(&self, id: &str) -> RepoResult<Group> {
        self.groups
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn insert(&self, group: Group) -> RepoResult<()> {
        let mut groups = self.groups.write();
        if groups.contains_key(&group.id) {
            return Err(RepositoryError::Conflict(group.id));
        }
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn save(&self, group: &Group) -> RepoResult<()> {
        self.groups.write().insert(group.id.clone(), group.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        self.groups
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn list_by_owner(&self, owner_id: &str) -> RepoResult<Vec<Group>> {
        let mut groups: Vec<Group> = self
            .groups
            .read()
            .values()
            .filter(|g| g.owner_id == owner_id)
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(groups)
    }
}

#[derive(Default)]
pub struct InMemoryFormRepository {
    forms: RwLock<HashMap<String, StoredForm>>,
}

impl InMemoryFormRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FormRepository for InMemoryFormRepository {
    async fn get(&self, id: &str) -> RepoResult<StoredForm> {
        self.forms
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn insert(&self, form: StoredForm) -> RepoResult<()> {
        let mut forms = self.forms.write();
        if forms.contains_key(&form.id) {
            return Err(RepositoryError::Conflict(format!("form {} already exists", form.id)));
        }
        forms.insert(form.id.clone(), form);
        Ok(())
    }

    async fn replace_form(&self, id: &str, form: Form) -> RepoResult<Form> {
        let mut forms = self.forms.write();
        let stored = forms
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        stored.form = form;
        stored.updated_at = Utc::now();
        Ok(stored.form.clone())
    }

    async fn rename(&self, id: &str, title: &str) -> RepoResult<Form> {
        let mut forms = self.forms.write();
        let stored = forms
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        stored.form.title = title.to_string();
        stored.updated_at = Utc::now();
        Ok(stored.form.clone())
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        self.forms
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn list_by_owner(&self, owner_id: &str) -> RepoResult<Vec<StoredForm>> {
        let mut forms: Vec<StoredForm> = self
            .forms
            .read()
            .values()
            .filter(|f| f.owner_id == owner_id)
            .cloned()
            .collect();
        forms.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(forms)
    }

    async fn record_view(&self, id: &str, view: View) -> RepoResult<()> {
        let mut forms = self.forms.write();
        let form = forms
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        form.views.push(view);
        Ok(())
    }

    async fn append_submission(
        &self,
        id: &str,
        submission: Submission,
        unique_user: bool,
    ) -> RepoResult<()> {
        let mut forms = self.forms.write();
        let form = forms
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        if unique_user {
            if let Some(user_id) = submission.user_id.as_deref() {
                if form.submissions.iter().any(|s| s.user_id.as_deref() == Some(user_id)) {
                    return Err(RepositoryError::Conflict(
                        "You have already responded to this form".into(),
                    ));
                }
            }
        }
        form.submissions.push(submission);
        Ok(())
    }

    async fn delete_by_group(&self, owner_id: &str, group_id: &str) -> RepoResult<usize> {
        let mut forms = self.forms.write();
        let before = forms.len();
        forms.retain(|_, f| !(f.owner_id == owner_id && f.form.group_id == group_id));
        Ok(before - forms.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(user: Option<&str>) -> Submission {
        Submission {
            id: formsmith_core::new_id(),
            answers: HashMap::new(),
            timestamp: Utc::now(),
            ip: None,
            user_id: user.map(str::to_string),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let repo = InMemoryFormRepository::new();
        let form = StoredForm::new("f1".into(), "u1".into(), Form::new("A", "g"));
        repo.insert(form.clone()).await.unwrap();
        let err = repo.insert(form).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unique_submission_per_user() {
        let repo = InMemoryFormRepository::new();
        repo.insert(StoredForm::new("f1".into(), "u1".into(), Form::new("A", "g")))
            .await
            .unwrap();

        repo.append_submission("f1", submission(Some("u2")), true).await.unwrap();
        let err = repo.append_submission("f1", submission(Some("u2")), true).await;
        assert!(matches!(err, Err(RepositoryError::Conflict(_))));

        // anonymous answers are never deduplicated
        repo.append_submission("f1", submission(None), true).await.unwrap();
        repo.append_submission("f1", submission(None), true).await.unwrap();
        assert_eq!(repo.get("f1").await.unwrap().submissions.len(), 3);
    }

    #[tokio::test]
    async fn test_document_updates_keep_responses() {
        let repo = InMemoryFormRepository::new();
        repo.insert(StoredForm::new("f1".into(), "u1".into(), Form::new("A", "g")))
            .await
            .unwrap();
        let snapshot = repo.get("f1").await.unwrap();

        repo.append_submission("f1", submission(None), false).await.unwrap();
        repo.record_view("f1", View { ip: None, timestamp: Utc::now() }).await.unwrap();

        let mut edited = snapshot.form.clone();
        edited.title = "B".into();
        assert_eq!(repo.replace_form("f1", edited).await.unwrap().title, "B");
        assert_eq!(repo.rename("f1", "C").await.unwrap().title, "C");

        let stored = repo.get("f1").await.unwrap();
        assert_eq!(stored.form.title, "C");
        assert_eq!(stored.submissions.len(), 1);
        assert_eq!(stored.views.len(), 1);
        assert!(stored.updated_at >= snapshot.updated_at);
        assert!(matches!(repo.rename("nope", "X").await, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_by_group_only_touches_owner() {
        let repo = InMemoryFormRepository::new();
        repo.insert(StoredForm::new("a".into(), "u1".into(), Form::new("A", "g1"))).await.unwrap();
        repo.insert(StoredForm::new("b".into(), "u1".into(), Form::new("B", "g2"))).await.unwrap();
        repo.insert(StoredForm::new("c".into(), "u2".into(), Form::new("C", "g1"))).await.unwrap();

        assert_eq!(repo.delete_by_group("u1", "g1").await.unwrap(), 1);
        assert!(repo.get("a").await.is_err());
        assert!(repo.get("c").await.is_ok());
    }

    #[tokio::test]
    async fn test_email_is_unique_ignoring_case() {
        let repo = InMemoryUserRepository::new();
        let user = User {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            salt: String::new(),
            created_at: Utc::now(),
        };
        repo.insert(user.clone()).await.unwrap();
        let dup = User { id: "u2".into(), email: "ADA@example.com".into(), ..user };
        assert!(matches!(repo.insert(dup).await, Err(RepositoryError::Conflict(_))));
        assert_eq!(repo.find_by_email("Ada@Example.com").await.unwrap().id, "u1");
    }
}
