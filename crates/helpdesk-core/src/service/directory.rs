//! Users, departments, and issue types.

use tracing::{info, warn};
use uuid::Uuid;

use super::Helpdesk;
use crate::{
  Error, Result,
  directory::{Department, IssueType, NewLookup, NewUser, Removal, User},
  store::HelpdeskStore,
};

fn required_name(name: &str) -> Result<String> {
  let name = name.trim();
  if name.is_empty() {
    return Err(Error::Invalid("name must not be empty".into()));
  }
  Ok(name.to_owned())
}

/// Map a store removal outcome onto the service's conventions: `false` for
/// not found, an error for a restricted delete.
fn removal(kind: &'static str, id: Uuid, outcome: Removal) -> Result<bool> {
  match outcome {
    Removal::Removed => {
      info!(%id, kind, "deleted");
      Ok(true)
    }
    Removal::NotFound => Ok(false),
    Removal::InUse => {
      warn!(%id, kind, "delete refused, still referenced");
      Err(Error::InUse { kind, id })
    }
  }
}

impl<S: HelpdeskStore> Helpdesk<S> {
  // ── Users ─────────────────────────────────────────────────────────────

  pub async fn create_user(&self, input: NewUser) -> Result<User> {
    let name = required_name(&input.name)?;
    let email = input.email.trim().to_owned();
    if !email.contains('@') {
      return Err(Error::Invalid(format!("{email:?} is not an email address")));
    }
    if let Some(department_id) = input.department_id
      && self.get_department(department_id).await?.is_none()
    {
      return Err(Error::UnknownReference { kind: "department", id: department_id });
    }

    let user = User {
      user_id: Uuid::new_v4(),
      name,
      email,
      role: input.role,
      department_id: input.department_id,
      support_level: input.support_level,
      is_active: true,
      created_at: self.now(),
    };
    if !self.store.insert_user(user.clone()).await.map_err(Error::store)? {
      return Err(Error::DuplicateName { kind: "user", name: user.name });
    }
    info!(user_id = %user.user_id, role = %user.role, "user created");
    Ok(user)
  }

  pub async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self.store.get_user(id).await.map_err(Error::store)
  }

  pub async fn list_users(&self, active_only: bool) -> Result<Vec<User>> {
    self.store.list_users(active_only).await.map_err(Error::store)
  }

  pub async fn set_user_active(&self, id: Uuid, active: bool) -> Result<bool> {
    self.store.set_user_active(id, active).await.map_err(Error::store)
  }

  pub async fn delete_user(&self, id: Uuid) -> Result<bool> {
    let outcome = self.store.delete_user(id).await.map_err(Error::store)?;
    removal("user", id, outcome)
  }

  // ── Departments ───────────────────────────────────────────────────────

  pub async fn create_department(&self, input: NewLookup) -> Result<Department> {
    let department = Department {
      department_id: Uuid::new_v4(),
      name:          required_name(&input.name)?,
      description:   input.description,
      is_active:     true,
      created_at:    self.now(),
    };
    if !self
      .store
      .insert_department(department.clone())
      .await
      .map_err(Error::store)?
    {
      return Err(Error::DuplicateName { kind: "department", name: department.name });
    }
    Ok(department)
  }

  pub async fn get_department(&self, id: Uuid) -> Result<Option<Department>> {
    self.store.get_department(id).await.map_err(Error::store)
  }

  pub async fn list_departments(&self, active_only: bool) -> Result<Vec<Department>> {
    self.store.list_departments(active_only).await.map_err(Error::store)
  }

  pub async fn set_department_active(&self, id: Uuid, active: bool) -> Result<bool> {
    self.store.set_department_active(id, active).await.map_err(Error::store)
  }

  pub async fn delete_department(&self, id: Uuid) -> Result<bool> {
    let outcome = self.store.delete_department(id).await.map_err(Error::store)?;
    removal("department", id, outcome)
  }

  // ── Issue types ───────────────────────────────────────────────────────

  pub async fn create_issue_type(&self, input: NewLookup) -> Result<IssueType> {
    let issue_type = IssueType {
      issue_type_id: Uuid::new_v4(),
      name:          required_name(&input.name)?,
      description:   input.description,
      is_active:     true,
      created_at:    self.now(),
    };
    if !self
      .store
      .insert_issue_type(issue_type.clone())
      .await
      .map_err(Error::store)?
    {
      return Err(Error::DuplicateName { kind: "issue type", name: issue_type.name });
    }
    Ok(issue_type)
  }

  pub async fn get_issue_type(&self, id: Uuid) -> Result<Option<IssueType>> {
    self.store.get_issue_type(id).await.map_err(Error::store)
  }

  pub async fn list_issue_types(&self, active_only: bool) -> Result<Vec<IssueType>> {
    self.store.list_issue_types(active_only).await.map_err(Error::store)
  }

  pub async fn set_issue_type_active(&self, id: Uuid, active: bool) -> Result<bool> {
    self.store.set_issue_type_active(id, active).await.map_err(Error::store)
  }

  pub async fn delete_issue_type(&self, id: Uuid) -> Result<bool> {
    let outcome = self.store.delete_issue_type(id).await.map_err(Error::store)?;
    removal("issue type", id, outcome)
  }
}
