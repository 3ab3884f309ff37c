//! HTTP/JSON interface layer for the planner core.
//!
//! # Responsibility
//! - Translate HTTP requests into `TaskService` calls and serialize
//!   results back to the wire.
//! - Reject structurally invalid payloads (malformed ids, malformed
//!   JSON, missing required fields) before the core is invoked.
//!
//! # Invariants
//! - The shared service sits behind one mutex; every operation holds
//!   the lock for its whole duration so updates to the same task never
//!   interleave mid-reconciliation.
//! - Core `TaskNotFound` maps to 404 with a structured error body
//!   (`{"detail": ..., "code": ...}`); the core never sees transport
//!   concerns.

use log::{debug, warn};
use planner_core::{
    InMemoryTaskStore, Task, TaskDraft, TaskId, TaskPatch, TaskService, TaskServiceError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

// Payloads are small task/reminder documents; anything beyond this is
// rejected before buffering more.
const MAX_HEADER_BYTES: usize = 16 * 1024;
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Task service shared across connections, one lock per operation.
pub type SharedService = Arc<Mutex<TaskService<InMemoryTaskStore>>>;

/// Builds a shared service over a fresh in-memory store.
pub fn shared_service() -> SharedService {
    Arc::new(Mutex::new(TaskService::new(InMemoryTaskStore::new())))
}

#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub bind: SocketAddr,
}

#[derive(Debug, Error)]
pub enum HttpServeError {
    #[error("bind failed: {0}")]
    Bind(std::io::Error),
    #[error("accept failed: {0}")]
    Accept(std::io::Error),
}

/// Response envelope for `GET /tasks/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

/// Response envelope for single-task operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOperationResponse {
    pub task: Task,
}

/// Structured error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub detail: String,
    pub code: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HttpResponse {
    status: u16,
    body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Index,
    Healthz,
    ListTasks,
    CreateTask,
    UpdateTask(TaskId),
    DeleteTask(TaskId),
    AcknowledgeTask(TaskId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
enum RouteError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    target: String,
    body: Vec<u8>,
}

/// Serves the task API until the listener fails.
pub fn serve_api(config: HttpServerConfig, service: SharedService) -> Result<(), HttpServeError> {
    serve_with_limit(config, service, None)
}

fn serve_with_limit(
    config: HttpServerConfig,
    service: SharedService,
    max_requests: Option<usize>,
) -> Result<(), HttpServeError> {
    let listener = TcpListener::bind(config.bind).map_err(HttpServeError::Bind)?;
    let mut served = 0usize;

    for stream in listener.incoming() {
        if let Some(limit) = max_requests {
            if served >= limit {
                break;
            }
        }

        match stream {
            Ok(mut stream) => {
                if let Err(err) = handle_connection(&mut stream, &service) {
                    warn!("event=request_failed module=http error={err}");
                    let _ = write_response(
                        &mut stream,
                        error_response(500, format!("internal server error: {err}")),
                    );
                }
                served += 1;
            }
            Err(err) => return Err(HttpServeError::Accept(err)),
        }
    }

    Ok(())
}

fn handle_connection(stream: &mut TcpStream, service: &SharedService) -> Result<(), String> {
    let request = match read_request(stream) {
        Ok(request) => request,
        Err(err) => {
            return write_response(stream, route_error_response(err)).map_err(|e| e.to_string());
        }
    };

    let response = match parse_route(&request.method, &request.target) {
        Ok(route) => execute_route(service, route, &request.body),
        Err(err) => route_error_response(err),
    };

    debug!(
        "event=request_handled module=http method={} target={} status={}",
        request.method, request.target, response.status
    );
    write_response(stream, response).map_err(|e| e.to_string())
}

fn read_request(stream: &mut TcpStream) -> Result<HttpRequest, RouteError> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        let n = stream
            .read(&mut chunk)
            .map_err(|e| RouteError::BadRequest(format!("failed to read request: {e}")))?;
        if n == 0 {
            return Err(RouteError::BadRequest(
                "connection closed before headers were complete".to_string(),
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            break end;
        }
        if buf.len() > MAX_HEADER_BYTES {
            return Err(RouteError::BadRequest("request headers too large".to_string()));
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.lines();
    let request_line = lines
        .next()
        .ok_or_else(|| RouteError::BadRequest("missing request line".to_string()))?;
    let (method, target) = parse_request_line(request_line)?;
    let content_length = parse_content_length(lines)?;

    if content_length > MAX_BODY_BYTES {
        return Err(RouteError::BadRequest("request body too large".to_string()));
    }

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream
            .read(&mut chunk)
            .map_err(|e| RouteError::BadRequest(format!("failed to read body: {e}")))?;
        if n == 0 {
            return Err(RouteError::BadRequest(
                "connection closed before body was complete".to_string(),
            ));
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok(HttpRequest {
        method,
        target,
        body,
    })
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

fn parse_request_line(line: &str) -> Result<(String, String), RouteError> {
    let mut parts = line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| RouteError::BadRequest("missing method".to_string()))?;
    let target = parts
        .next()
        .ok_or_else(|| RouteError::BadRequest("missing target".to_string()))?;
    Ok((method.to_string(), target.to_string()))
}

fn parse_content_length<'a>(lines: impl Iterator<Item = &'a str>) -> Result<usize, RouteError> {
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                return value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| RouteError::BadRequest("invalid content-length".to_string()));
            }
        }
    }
    Ok(0)
}

fn parse_route(method: &str, target: &str) -> Result<Route, RouteError> {
    let path = match target.split_once('?') {
        Some((path, _query)) => path,
        None => target,
    };
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [] => expect_method(method, "GET", Route::Index),
        ["healthz"] => expect_method(method, "GET", Route::Healthz),
        ["tasks"] => match method {
            "GET" => Ok(Route::ListTasks),
            "POST" => Ok(Route::CreateTask),
            other => Err(RouteError::MethodNotAllowed(format!(
                "{other} not supported on {path}; use GET or POST"
            ))),
        },
        ["tasks", raw_id] => {
            let id = parse_task_id(raw_id)?;
            match method {
                "PUT" => Ok(Route::UpdateTask(id)),
                "DELETE" => Ok(Route::DeleteTask(id)),
                other => Err(RouteError::MethodNotAllowed(format!(
                    "{other} not supported on {path}; use PUT or DELETE"
                ))),
            }
        }
        ["tasks", raw_id, "acknowledge"] => {
            let id = parse_task_id(raw_id)?;
            expect_method(method, "POST", Route::AcknowledgeTask(id))
        }
        _ => Err(RouteError::NotFound(format!("unknown route: {path}"))),
    }
}

fn expect_method(method: &str, expected: &str, route: Route) -> Result<Route, RouteError> {
    if method == expected {
        Ok(route)
    } else {
        Err(RouteError::MethodNotAllowed(format!(
            "{method} not supported here; use {expected}"
        )))
    }
}

fn parse_task_id(raw: &str) -> Result<TaskId, RouteError> {
    Uuid::parse_str(raw).map_err(|_| RouteError::BadRequest(format!("malformed task id: {raw}")))
}

fn execute_route(service: &SharedService, route: Route, body: &[u8]) -> HttpResponse {
    match route {
        Route::Index => HttpResponse {
            status: 200,
            body: Some(json!({
                "service": "planner.tasks.v1",
                "routes": [
                    "GET /healthz",
                    "GET /tasks/",
                    "POST /tasks/",
                    "PUT /tasks/{id}",
                    "DELETE /tasks/{id}",
                    "POST /tasks/{id}/acknowledge"
                ]
            })),
        },
        Route::Healthz => HttpResponse {
            status: 200,
            body: Some(json!({
                "ok": planner_core::ping() == "pong",
                "version": planner_core::core_version()
            })),
        },
        Route::ListTasks => {
            let service = match service.lock() {
                Ok(service) => service,
                Err(_) => return poisoned_response(),
            };
            typed_response(
                200,
                &TaskListResponse {
                    tasks: service.list_tasks(),
                },
            )
        }
        Route::CreateTask => {
            let draft: TaskDraft = match parse_payload(body) {
                Ok(draft) => draft,
                Err(response) => return response,
            };
            let mut service = match service.lock() {
                Ok(service) => service,
                Err(_) => return poisoned_response(),
            };
            let task = service.create_task(draft);
            typed_response(201, &TaskOperationResponse { task })
        }
        Route::UpdateTask(id) => {
            let patch: TaskPatch = match parse_payload(body) {
                Ok(patch) => patch,
                Err(response) => return response,
            };
            let mut service = match service.lock() {
                Ok(service) => service,
                Err(_) => return poisoned_response(),
            };
            match service.update_task(id, patch) {
                Ok(task) => typed_response(200, &TaskOperationResponse { task }),
                Err(err) => not_found_response(err),
            }
        }
        Route::DeleteTask(id) => {
            let mut service = match service.lock() {
                Ok(service) => service,
                Err(_) => return poisoned_response(),
            };
            if service.delete_task(id) {
                HttpResponse {
                    status: 204,
                    body: None,
                }
            } else {
                not_found_response(TaskServiceError::TaskNotFound(id))
            }
        }
        Route::AcknowledgeTask(id) => {
            let mut service = match service.lock() {
                Ok(service) => service,
                Err(_) => return poisoned_response(),
            };
            match service.acknowledge_snooze(id) {
                Ok(task) => typed_response(200, &TaskOperationResponse { task }),
                Err(err) => not_found_response(err),
            }
        }
    }
}

fn parse_payload<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, HttpResponse> {
    serde_json::from_slice(body)
        .map_err(|err| error_response(400, format!("invalid payload: {err}")))
}

fn typed_response<T: Serialize>(status: u16, payload: &T) -> HttpResponse {
    match serde_json::to_value(payload) {
        Ok(body) => HttpResponse {
            status,
            body: Some(body),
        },
        Err(err) => error_response(500, format!("response serialization failed: {err}")),
    }
}

fn route_error_response(err: RouteError) -> HttpResponse {
    match err {
        RouteError::BadRequest(msg) => error_response(400, msg),
        RouteError::NotFound(msg) => error_response(404, msg),
        RouteError::MethodNotAllowed(msg) => error_response(405, msg),
    }
}

fn not_found_response(err: TaskServiceError) -> HttpResponse {
    error_response(404, err.to_string())
}

fn poisoned_response() -> HttpResponse {
    error_response(500, "task service state is poisoned".to_string())
}

fn error_response(status: u16, detail: String) -> HttpResponse {
    HttpResponse {
        status,
        body: Some(json!({ "detail": detail, "code": status })),
    }
}

fn write_response(stream: &mut TcpStream, response: HttpResponse) -> std::io::Result<()> {
    let body = match &response.body {
        Some(value) => serde_json::to_vec(value)?,
        None => Vec::new(),
    };
    let content_type = if response.body.is_some() {
        "Content-Type: application/json\r\n"
    } else {
        ""
    };
    let header = format!(
        "HTTP/1.1 {} {}\r\n{}Content-Length: {}\r\nAccess-Control-Allow-Origin: *\r\nAccess-Control-Allow-Methods: GET, POST, PUT, DELETE\r\nConnection: close\r\n\r\n",
        response.status,
        reason_phrase(response.status),
        content_type,
        body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(&body)?;
    stream.flush()
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn create_body() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "title": "Essay draft",
            "subject": "English",
            "type": "Assignment",
            "due_date": "2025-06-20T09:00:00Z",
            "reminders": [
                {"time": "2025-06-19T18:00:00Z"}
            ]
        }))
        .unwrap()
    }

    fn created_task(service: &SharedService) -> Task {
        let response = execute_route(service, Route::CreateTask, &create_body());
        assert_eq!(response.status, 201);
        let envelope: TaskOperationResponse =
            serde_json::from_value(response.body.unwrap()).unwrap();
        envelope.task
    }

    #[test]
    fn route_parsing_covers_all_task_routes() {
        let id = Uuid::new_v4();
        let base = format!("/tasks/{id}");

        assert_eq!(parse_route("GET", "/tasks/").unwrap(), Route::ListTasks);
        assert_eq!(parse_route("GET", "/tasks").unwrap(), Route::ListTasks);
        assert_eq!(parse_route("POST", "/tasks/").unwrap(), Route::CreateTask);
        assert_eq!(parse_route("PUT", &base).unwrap(), Route::UpdateTask(id));
        assert_eq!(parse_route("DELETE", &base).unwrap(), Route::DeleteTask(id));
        assert_eq!(
            parse_route("POST", &format!("{base}/acknowledge")).unwrap(),
            Route::AcknowledgeTask(id)
        );
        assert_eq!(parse_route("GET", "/healthz").unwrap(), Route::Healthz);
    }

    #[test]
    fn route_parsing_rejects_malformed_ids_and_unknown_paths() {
        let err = parse_route("PUT", "/tasks/not-a-uuid").unwrap_err();
        assert!(matches!(err, RouteError::BadRequest(_)));

        let err = parse_route("GET", "/nope").unwrap_err();
        assert!(matches!(err, RouteError::NotFound(_)));

        let err = parse_route("PATCH", "/tasks/").unwrap_err();
        assert!(matches!(err, RouteError::MethodNotAllowed(_)));
    }

    #[test]
    fn create_then_list_roundtrip_over_the_wire_shapes() {
        let service = shared_service();
        let task = created_task(&service);
        assert_eq!(task.category, "Assignment");
        assert_eq!(task.reminders.len(), 1);
        assert_eq!(
            task.reminders[0].time,
            Utc.with_ymd_and_hms(2025, 6, 19, 18, 0, 0).unwrap()
        );

        let response = execute_route(&service, Route::ListTasks, &[]);
        assert_eq!(response.status, 200);
        let envelope: TaskListResponse = serde_json::from_value(response.body.unwrap()).unwrap();
        assert_eq!(envelope.tasks.len(), 1);
        assert_eq!(envelope.tasks[0].id, task.id);
    }

    #[test]
    fn update_applies_merge_patch_and_unknown_id_maps_to_404() {
        let service = shared_service();
        let task = created_task(&service);

        let body = serde_json::to_vec(&json!({"title": "Essay final"})).unwrap();
        let response = execute_route(&service, Route::UpdateTask(task.id), &body);
        assert_eq!(response.status, 200);
        let envelope: TaskOperationResponse =
            serde_json::from_value(response.body.unwrap()).unwrap();
        assert_eq!(envelope.task.title, "Essay final");
        assert_eq!(envelope.task.subject, "English");

        let missing = Uuid::new_v4();
        let body = serde_json::to_vec(&json!({"title": "x"})).unwrap();
        let response = execute_route(&service, Route::UpdateTask(missing), &body);
        assert_eq!(response.status, 404);
        let error: ApiErrorResponse = serde_json::from_value(response.body.unwrap()).unwrap();
        assert_eq!(error.code, 404);
        assert!(error.detail.contains(&missing.to_string()));
    }

    #[test]
    fn malformed_payload_is_rejected_with_400() {
        let service = shared_service();
        let response = execute_route(&service, Route::CreateTask, b"{not json");
        assert_eq!(response.status, 400);
        let error: ApiErrorResponse = serde_json::from_value(response.body.unwrap()).unwrap();
        assert_eq!(error.code, 400);
    }

    #[test]
    fn delete_returns_204_then_404() {
        let service = shared_service();
        let task = created_task(&service);

        let response = execute_route(&service, Route::DeleteTask(task.id), &[]);
        assert_eq!(response.status, 204);
        assert!(response.body.is_none());

        let response = execute_route(&service, Route::DeleteTask(task.id), &[]);
        assert_eq!(response.status, 404);
    }

    #[test]
    fn acknowledge_returns_the_updated_task() {
        let service = shared_service();
        let task = created_task(&service);

        let response = execute_route(&service, Route::AcknowledgeTask(task.id), &[]);
        assert_eq!(response.status, 200);
        let envelope: TaskOperationResponse =
            serde_json::from_value(response.body.unwrap()).unwrap();
        assert_eq!(envelope.task.reminders[0].snoozes_acknowledged, 1);
    }

    #[test]
    fn request_parsing_extracts_method_target_and_body() {
        let raw = b"PUT /tasks/abc HTTP/1.1\r\nHost: x\r\nContent-Length: 4\r\n\r\nbody";
        let end = find_header_end(raw).unwrap();
        assert_eq!(&raw[end..], b"body");

        let (method, target) = parse_request_line("PUT /tasks/abc HTTP/1.1").unwrap();
        assert_eq!(method, "PUT");
        assert_eq!(target, "/tasks/abc");

        let length =
            parse_content_length(["Host: x", "Content-Length: 4"].into_iter()).unwrap();
        assert_eq!(length, 4);
        let absent = parse_content_length(["Host: x"].into_iter()).unwrap();
        assert_eq!(absent, 0);
    }

    #[test]
    fn healthz_reports_core_version() {
        let service = shared_service();
        let response = execute_route(&service, Route::Healthz, &[]);
        assert_eq!(response.status, 200);
        let body = response.body.unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["version"], planner_core::core_version());
    }
}
