#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use calbatch::{dispatch, DispatchSettings, Invocation, Session};
use calbatch_calendar::CalendarClient;
use calbatch_core::{AppError, Config};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const WORK: &str = "/calendars/work%40group.calendar.google.com/events";

async fn mock_calendar_list(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users/me/calendarList"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "work@group.calendar.google.com", "summary": "Work", "accessRole": "owner"},
                {"id": "me@gmail.com", "summary": "Personal", "accessRole": "owner", "primary": true}
            ]
        })))
        .mount(server)
        .await;
}

async fn mock_work_events(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(WORK))
        .and(query_param("maxResults", "2500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "e1", "summary": "Standup"},
                {"id": "e2", "summary": "Meeting"}
            ]
        })))
        .mount(server)
        .await;
}

async fn dispatch_args(server: &MockServer, args: &[&str]) -> (Result<(), AppError>, String) {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let invocation = Invocation::from_args(&args, true);
    let client = CalendarClient::with_base_url("test-token", &server.uri());
    let mut session = Session::new(client);
    let settings = DispatchSettings::from(&Config::default());

    let mut out = Vec::new();
    let result = dispatch::run(&invocation, &mut session, &settings, &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn list_calendars_and_events() {
    let server = MockServer::start().await;
    mock_calendar_list(&server).await;
    mock_work_events(&server).await;

    let (result, out) = dispatch_args(&server, &["Work"]).await;

    result.unwrap();
    assert_eq!(
        out,
        "Calendar: \"Work\" id: work@group.calendar.google.com\n\
         Event: \"Standup\" id: e1\n\
         Event: \"Meeting\" id: e2\n"
    );
}

#[tokio::test]
async fn unmatched_calendar_makes_no_event_requests() {
    let server = MockServer::start().await;
    mock_calendar_list(&server).await;
    Mock::given(method("GET"))
        .and(path(WORK))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let (result, out) = dispatch_args(&server, &["Nonexistent"]).await;

    result.unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn delete_issues_one_request_per_matching_event() {
    let server = MockServer::start().await;
    mock_calendar_list(&server).await;
    mock_work_events(&server).await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/e1", WORK)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/e2", WORK)))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let (result, out) = dispatch_args(&server, &["Work", "Standup", "delete"]).await;

    result.unwrap();
    assert!(out.contains("deleting event \"Standup\" from \"Work\""));
}

#[tokio::test]
async fn copy_inserts_prefixed_events() {
    let server = MockServer::start().await;
    mock_calendar_list(&server).await;
    mock_work_events(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("{}/e2", WORK)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "e2",
            "etag": "\"1\"",
            "iCalUID": "e2@google.com",
            "htmlLink": "https://www.google.com/calendar/event?eid=e2",
            "summary": "Meeting",
            "start": {"dateTime": "2024-02-01T10:00:00Z"},
            "end": {"dateTime": "2024-02-01T11:00:00Z"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(WORK))
        .and(body_partial_json(json!({"start": {"dateTime": "2024-02-01T10:00:00Z"}})))
        .respond_with(|req: &Request| {
            let body: Value = serde_json::from_slice(&req.body).unwrap();
            ResponseTemplate::new(200).set_body_json(json!({
                "id": format!("copy-{}", body["colorId"].as_str().unwrap()),
                "summary": body["summary"],
            }))
        })
        .expect(2)
        .mount(&server)
        .await;

    let (result, out) = dispatch_args(&server, &["Work", "Meeting", "copy", "Prep", "Review"]).await;

    result.unwrap();
    assert!(out.contains("copying event \"Meeting\" to Prep, Review\n"));
    assert!(out.contains("New Event: \"01 Prep: Meeting\" id: copy-1\n"));
    assert!(out.contains("New Event: \"02 Review: Meeting\" id: copy-2\n"));

    let inserts: Vec<Value> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method == wiremock::http::Method::POST)
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(inserts.len(), 2);
    for body in &inserts {
        assert!(body.get("id").is_none());
        assert!(body.get("etag").is_none());
        assert!(body.get("iCalUID").is_none());
        assert!(body.get("htmlLink").is_none());
    }
}

#[tokio::test]
async fn copy_without_prefixes_prints_usage_offline() {
    let server = MockServer::start().await;

    let (result, out) = dispatch_args(&server, &["Work", "Meeting", "copy"]).await;

    result.unwrap();
    assert!(out.starts_with("Usage:"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn expired_token_surfaces_as_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/calendarList"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (result, _) = dispatch_args(&server, &["Work"]).await;

    assert!(matches!(result, Err(AppError::Remote(_))));
}
