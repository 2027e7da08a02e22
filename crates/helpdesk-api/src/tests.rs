//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{HeaderMap, Method, Request, StatusCode, header},
};
use helpdesk_core::{
  Helpdesk,
  directory::{NewLookup, NewUser, User, UserRole},
  notify::EventKind,
  ticket::SupportLevel,
};
use helpdesk_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{
  EventHub, api_router,
  identity::{USER_ID_HEADER, USER_ROLE_HEADER},
};

struct Fixture {
  app:        Router,
  events:     Arc<EventHub>,
  issue_type: Uuid,
  reporter:   User,
  analyst:    User,
}

async fn fixture() -> Fixture {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let events = Arc::new(EventHub::new());
  let desk = Arc::new(Helpdesk::new(store).with_notifier(events.clone()));

  let issue_type = desk
    .create_issue_type(NewLookup { name: "Network".into(), description: None })
    .await
    .unwrap()
    .issue_type_id;
  let reporter = desk
    .create_user(NewUser {
      name:          "Rob".into(),
      email:         "rob@example.com".into(),
      role:          UserRole::EndUser,
      department_id: None,
      support_level: None,
    })
    .await
    .unwrap();
  let analyst = desk
    .create_user(NewUser {
      name:          "Alice".into(),
      email:         "alice@example.com".into(),
      role:          UserRole::Analyst,
      department_id: None,
      support_level: Some(SupportLevel::N1),
    })
    .await
    .unwrap();

  Fixture { app: api_router(desk, events.clone()), events, issue_type, reporter, analyst }
}

fn as_user(user: &User) -> [(&'static str, String); 2] {
  [(USER_ID_HEADER, user.user_id.to_string()), (USER_ROLE_HEADER, user.role.to_string())]
}

async fn send(
  app: &Router,
  method: Method,
  uri: &str,
  headers: &[(&'static str, String)],
  body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
  let mut request = Request::builder().method(method).uri(uri);
  for (name, value) in headers {
    request = request.header(*name, value);
  }
  let request = match body {
    Some(json) => request
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => request.body(Body::empty()).unwrap(),
  };

  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let headers = response.headers().clone();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, headers, value)
}

async fn open_ticket(f: &Fixture, title: &str, priority: &str) -> Value {
  let (status, _, ticket) = send(
    &f.app,
    Method::POST,
    "/tickets",
    &as_user(&f.reporter),
    Some(json!({ "title": title, "priority": priority, "issue_type_id": f.issue_type })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  ticket
}

#[tokio::test]
async fn create_returns_ticket_with_etag() {
  let f = fixture().await;
  let (status, headers, ticket) = send(
    &f.app,
    Method::POST,
    "/tickets",
    &as_user(&f.reporter),
    Some(json!({ "title": "Wi-Fi drops", "issue_type_id": f.issue_type })),
  )
  .await;

  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(headers[header::ETAG], "\"1\"");
  assert_eq!(ticket["status"], "Open");
  assert_eq!(ticket["priority"], "Medium");
  assert_eq!(ticket["support_level"], "N1");
  assert_eq!(ticket["created_by"], f.reporter.user_id.to_string());
  assert_eq!(ticket["resolved_at"], Value::Null);
}

#[tokio::test]
async fn anonymous_create_is_unauthorized() {
  let f = fixture().await;
  let (status, _, body) = send(
    &f.app,
    Method::POST,
    "/tickets",
    &[],
    Some(json!({ "title": "who am I", "issue_type_id": f.issue_type })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_identity_is_a_bad_request() {
  let f = fixture().await;
  let (status, _, _) =
    send(&f.app, Method::GET, "/tickets", &[(USER_ID_HEADER, "nope".to_string())], None).await;
  // Listing does not read the caller; a write does.
  assert_eq!(status, StatusCode::OK);

  let (status, _, _) = send(
    &f.app,
    Method::POST,
    "/tickets",
    &[(USER_ID_HEADER, "nope".to_string())],
    Some(json!({ "title": "x", "issue_type_id": f.issue_type })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_ticket_is_not_found() {
  let f = fixture().await;
  let id = Uuid::new_v4();
  let (status, _, body) = send(&f.app, Method::GET, &format!("/tickets/{id}"), &[], None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains(&id.to_string()));

  let (status, _, _) = send(
    &f.app,
    Method::POST,
    &format!("/tickets/{id}/assign"),
    &as_user(&f.analyst),
    Some(json!({ "analyst_id": f.analyst.user_id })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resolving_over_http_sets_resolved_at_and_bumps_etag() {
  let f = fixture().await;
  let ticket = open_ticket(&f, "printer jam", "High").await;
  let id = ticket["ticket_id"].as_str().unwrap();

  let (status, headers, ticket) = send(
    &f.app,
    Method::POST,
    &format!("/tickets/{id}/status"),
    &as_user(&f.analyst),
    Some(json!({ "status": "Resolved" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(headers[header::ETAG], "\"2\"");
  assert_eq!(ticket["status"], "Resolved");
  assert!(ticket["resolved_at"].is_string());

  let (_, _, history) =
    send(&f.app, Method::GET, &format!("/tickets/{id}/history"), &[], None).await;
  let kinds: Vec<_> = history.as_array().unwrap().iter().map(|h| h["change_type"].clone()).collect();
  assert_eq!(kinds, [json!("created"), json!("status_change")]);
}

#[tokio::test]
async fn stale_if_match_is_a_conflict() {
  let f = fixture().await;
  let ticket = open_ticket(&f, "monitor flicker", "Low").await;
  let id = ticket["ticket_id"].as_str().unwrap();
  let mut headers = as_user(&f.reporter).to_vec();
  headers.push(("if-match", "\"1\"".to_string()));

  let patch = json!({ "title": "monitor flickers" });
  let (status, etag, _) =
    send(&f.app, Method::PATCH, &format!("/tickets/{id}"), &headers, Some(patch.clone())).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(etag[header::ETAG], "\"2\"");

  let (status, _, _) =
    send(&f.app, Method::PATCH, &format!("/tickets/{id}"), &headers, Some(patch)).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn paging_and_filters() {
  let f = fixture().await;
  for n in 0..3 {
    open_ticket(&f, &format!("ticket {n}"), "Low").await;
  }

  let (status, _, page) =
    send(&f.app, Method::GET, "/tickets/page?page_number=1&page_size=2", &[], None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["items"].as_array().unwrap().len(), 2);
  assert_eq!(page["total_count"], 3);
  assert_eq!(page["page_number"], 1);

  let (status, _, page) = send(
    &f.app,
    Method::GET,
    "/tickets/page?page_number=1&page_size=10&priority=Urgent",
    &[],
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["items"], json!([]));
  assert_eq!(page["total_count"], 0);

  let (status, _, _) = send(&f.app, Method::GET, "/tickets/page?page_size=0", &[], None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, _, list) = send(&f.app, Method::GET, "/tickets?priority=Low", &[], None).await;
  assert_eq!(list.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn stats_and_near_sla_respond() {
  let f = fixture().await;
  open_ticket(&f, "fresh", "Urgent").await;

  let (status, _, stats) = send(&f.app, Method::GET, "/tickets/stats", &[], None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(stats["total"], 1);
  assert_eq!(stats["by_priority"]["Urgent"], 1);
  assert_eq!(stats["sla_breached"], 0);

  let (status, _, near) =
    send(&f.app, Method::GET, "/tickets/near-sla?threshold_hours=0", &[], None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(near, json!([]));
}

#[tokio::test]
async fn malformed_query_strings_get_a_json_error() {
  let f = fixture().await;

  for uri in [
    "/tickets?status=Bogus",
    "/tickets/page?page_size=many",
    "/tickets/near-sla?threshold_hours=soon",
    "/users?active_only=maybe",
  ] {
    let (status, _, body) = send(&f.app, Method::GET, uri, &[], None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    assert!(body["error"].is_string(), "{uri}: {body}");
  }
}

#[tokio::test]
async fn near_sla_threshold_out_of_range_is_a_bad_request() {
  let f = fixture().await;
  open_ticket(&f, "fresh", "Urgent").await;

  let (status, _, body) =
    send(&f.app, Method::GET, "/tickets/near-sla?threshold_hours=10000000000", &[], None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("out of range"));
}

#[tokio::test]
async fn internal_notes_stay_with_staff() {
  let f = fixture().await;
  let ticket = open_ticket(&f, "laptop slow", "Medium").await;
  let id = ticket["ticket_id"].as_str().unwrap();
  let uri = format!("/tickets/{id}/messages");

  let (status, _, _) = send(
    &f.app,
    Method::POST,
    &uri,
    &as_user(&f.analyst),
    Some(json!({ "body": "probably the antivirus", "is_internal": true })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, _, _) = send(
    &f.app,
    Method::POST,
    &uri,
    &as_user(&f.analyst),
    Some(json!({ "body": "Looking into it." })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (_, _, staff) = send(&f.app, Method::GET, &uri, &as_user(&f.analyst), None).await;
  assert_eq!(staff.as_array().unwrap().len(), 2);

  let (_, _, public) = send(&f.app, Method::GET, &uri, &as_user(&f.reporter), None).await;
  let public = public.as_array().unwrap();
  assert_eq!(public.len(), 1);
  assert_eq!(public[0]["body"], "Looking into it.");
}

#[tokio::test]
async fn changes_reach_event_subscribers() {
  let f = fixture().await;
  let ticket = open_ticket(&f, "keyboard", "Low").await;
  let id: Uuid = ticket["ticket_id"].as_str().unwrap().parse().unwrap();
  let mut rx = f.events.subscribe(id);

  let (status, _, _) = send(
    &f.app,
    Method::POST,
    &format!("/tickets/{id}/assign"),
    &as_user(&f.analyst),
    Some(json!({ "analyst_id": f.analyst.user_id })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let event = rx.recv().await.unwrap();
  assert_eq!(event.ticket_id, id);
  assert_eq!(event.kind, EventKind::Assigned);

  // The stream never ends; only the response head is inspected.
  let request = Request::builder()
    .uri(format!("/tickets/{id}/events"))
    .body(Body::empty())
    .unwrap();
  let response = f.app.clone().oneshot(request).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
  assert!(content_type.starts_with("text/event-stream"));
}

#[tokio::test]
async fn directory_conflicts() {
  let f = fixture().await;

  let (status, _, _) = send(
    &f.app,
    Method::POST,
    "/issue-types",
    &[],
    Some(json!({ "name": "network" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  open_ticket(&f, "cable cut", "High").await;
  let (status, _, _) =
    send(&f.app, Method::DELETE, &format!("/issue-types/{}", f.issue_type), &[], None).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _, _) = send(
    &f.app,
    Method::POST,
    &format!("/users/{}/active", f.analyst.user_id),
    &[],
    Some(json!({ "is_active": false })),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, _, active) = send(&f.app, Method::GET, "/users?active_only=true", &[], None).await;
  let names: Vec<_> = active.as_array().unwrap().iter().map(|u| u["name"].clone()).collect();
  assert_eq!(names, [json!("Rob")]);
}
