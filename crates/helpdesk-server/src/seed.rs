//! `--seed-demo`: a minimal directory for trying the server out.

use helpdesk_core::{
  Helpdesk,
  directory::{NewLookup, NewUser, UserRole},
  store::HelpdeskStore,
  ticket::SupportLevel,
};
use tracing::info;

/// Insert a department, a few issue types, and one analyst per support
/// level. Does nothing if any user already exists.
pub async fn demo_directory<S: HelpdeskStore>(desk: &Helpdesk<S>) -> helpdesk_core::Result<()> {
  if !desk.list_users(false).await?.is_empty() {
    info!("directory not empty, skipping demo seed");
    return Ok(());
  }

  let department = desk
    .create_department(NewLookup {
      name:        "IT Support".into(),
      description: Some("First line for everything with a plug".into()),
    })
    .await?;

  for name in ["Hardware", "Software", "Network", "Access"] {
    desk
      .create_issue_type(NewLookup { name: name.into(), description: None })
      .await?;
  }

  for (name, level) in [
    ("Nina One", SupportLevel::N1),
    ("Theo Two", SupportLevel::N2),
    ("Tara Three", SupportLevel::N3),
  ] {
    let email = format!("{}@helpdesk.local", name.to_lowercase().replace(' ', "."));
    let user = desk
      .create_user(NewUser {
        name: name.into(),
        email,
        role: UserRole::Analyst,
        department_id: Some(department.department_id),
        support_level: Some(level),
      })
      .await?;
    info!(user_id = %user.user_id, %level, "demo analyst created");
  }

  Ok(())
}
