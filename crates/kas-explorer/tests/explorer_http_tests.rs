//! End-to-end tests against an in-process explorer backend.

use std::collections::HashMap;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use kas_explorer::client::{ExplorerBackend, HttpBackend};
use kas_explorer::controller::ExplorerController;
use kas_explorer::download::DownloadOpener;
use kas_explorer::plain::PlainSkin;
use kas_protocol::{
    DownloadMode, Endpoint, ExplorerKind, ExplorerRequest, NavigationPath, ProtocolError,
};
use kas_session::{Event, Session, SessionOptions};

/// Query string and body of every request the fake backend saw.
type Seen = Arc<Mutex<Vec<(HashMap<String, String>, Value)>>>;

/// Canned backend: `help` returns predicates, navigation echoes the state
/// with two children, `export` returns a download link, `boom` fails with
/// HTTP 500 and `garbage` returns a non-JSON body.
async fn explore(
    State(seen): State<Seen>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    seen.lock().unwrap().push((query, body.clone()));
    let state = body["state"].clone();
    match body["predicate"].as_str().unwrap_or_default() {
        "help" => Json(json!({
            "state": state,
            "valid": true,
            "info": "root of the search space",
            "children": [
                {"value": "conv", "caption": "convolution", "label": "C"},
                {"value": "pool", "caption": "pooling"}
            ],
            "message": "help loaded",
            "available_predicates": [
                {"name": "export", "additional_args": ["file name"]},
                {"name": "reset"}
            ],
            "help_message": "Pick a child to descend."
        }))
        .into_response(),
        "" => Json(json!({
            "state": state,
            "valid": true,
            "info": format!("depth {}", state.as_array().map(Vec::len).unwrap_or(0)),
            "children": [{"value": "leaf", "caption": "a leaf"}],
            "message": ""
        }))
        .into_response(),
        "export" => Json(json!({
            "state": state,
            "valid": true,
            "info": "exported",
            "message": format!("exported to {}", body["args"][0].as_str().unwrap_or("?")),
            "download_url": "files/out.zip"
        }))
        .into_response(),
        "boom" => (StatusCode::INTERNAL_SERVER_ERROR, "kaboom").into_response(),
        _ => (StatusCode::OK, "<html>not json</html>").into_response(),
    }
}

async fn spawn_backend() -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/explore", post(explore))
        .route("/kas/explore", post(explore))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

#[derive(Clone, Default)]
struct RecordingOpener(Arc<Mutex<Vec<String>>>);

impl DownloadOpener for RecordingOpener {
    fn open(&self, url: &str) -> std::io::Result<()> {
        self.0.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

fn controller(backend: &str, opener: RecordingOpener) -> ExplorerController {
    let session = Session::new(SessionOptions {
        backend: backend.to_string(),
        ..SessionOptions::default()
    });
    ExplorerController::new(
        session,
        Arc::new(HttpBackend::new().unwrap()),
        Box::new(opener),
    )
}

#[tokio::test]
async fn test_http_backend_posts_json_with_explorer_query() {
    let (base, seen) = spawn_backend().await;
    let endpoint = Endpoint::new(&base, ExplorerKind::Algorithm).unwrap();
    let http = HttpBackend::new().unwrap();

    let response = http
        .explore(&endpoint, &ExplorerRequest::help(NavigationPath::root()))
        .await
        .unwrap();
    assert_eq!(response.children.len(), 2);
    assert_eq!(response.children[0].label.as_deref(), Some("C"));
    assert_eq!(response.available_predicates.unwrap()[1].additional_args, Vec::<String>::new());

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].0.get("explorer").map(String::as_str), Some("algorithm"));
    assert_eq!(seen[0].1, json!({"state": [], "predicate": "help", "args": []}));
}

#[tokio::test]
async fn test_http_backend_keeps_path_prefix() {
    let (base, seen) = spawn_backend().await;
    let endpoint = Endpoint::new(&format!("{base}/kas/"), ExplorerKind::SearchSpace).unwrap();
    let http = HttpBackend::new().unwrap();

    http.explore(&endpoint, &ExplorerRequest::navigate(["a"].into_iter().collect()))
        .await
        .unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_http_backend_reports_status_and_decode_errors() {
    let (base, _) = spawn_backend().await;
    let endpoint = Endpoint::new(&base, ExplorerKind::SearchSpace).unwrap();
    let http = HttpBackend::new().unwrap();
    let root = NavigationPath::root();

    let err = http
        .explore(&endpoint, &ExplorerRequest::predicate(root.clone(), "boom", vec![]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ProtocolError::Status {
            status: 500,
            body: "kaboom".into()
        }
    );

    let err = http
        .explore(&endpoint, &ExplorerRequest::predicate(root, "garbage", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut ctl = controller(&format!("http://{addr}"), RecordingOpener::default());
    ctl.dispatch(Event::ApplyHelp);
    ctl.settle().await;

    let session = ctl.session();
    assert!(session.last_error().unwrap().starts_with("transport error"));
    assert!(session.console().messages().last().unwrap().starts_with("Request failed:"));
    assert_eq!(session.in_flight(), 0);
}

#[tokio::test]
async fn test_controller_full_exploration_flow() {
    let (base, seen) = spawn_backend().await;
    let opener = RecordingOpener::default();
    let mut ctl = controller(&base, opener.clone());

    ctl.dispatch(Event::ApplyHelp);
    ctl.settle().await;
    assert_eq!(ctl.session().help_message(), "Pick a child to descend.");
    assert_eq!(ctl.session().predicates().len(), 2);

    let event = ctl.session().select_child_value("conv").unwrap();
    ctl.dispatch(event);
    ctl.settle().await;
    assert_eq!(ctl.session().path().segments(), ["conv".to_string()]);
    assert_eq!(ctl.session().info(), "depth 1");
    // Navigation responses carry no predicates; the help set stays.
    assert_eq!(ctl.session().predicates().len(), 2);

    ctl.dispatch(Event::InvokePredicate {
        name: "export".into(),
        args: vec!["model.onnx".into()],
    });
    ctl.settle().await;
    assert_eq!(ctl.session().console().messages().last(), Some(&"exported to model.onnx"));
    assert_eq!(
        opener.0.lock().unwrap().as_slice(),
        [format!("{base}/files/out.zip")]
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(
        seen[2].1,
        json!({"state": ["conv"], "predicate": "export", "args": ["model.onnx"]})
    );
}

#[tokio::test]
async fn test_server_error_keeps_previous_view() {
    let (base, _) = spawn_backend().await;
    let mut ctl = controller(&base, RecordingOpener::default());
    ctl.dispatch(Event::ApplyHelp);
    ctl.settle().await;

    ctl.dispatch(Event::InvokePredicate {
        name: "boom".into(),
        args: vec![],
    });
    ctl.settle().await;

    let session = ctl.session();
    assert_eq!(session.info(), "root of the search space");
    assert_eq!(session.children().len(), 2);
    assert_eq!(session.last_error(), Some("backend returned HTTP 500: kaboom"));
}

async fn run_plain(
    base: &str,
    script: &str,
    download_mode: DownloadMode,
) -> (String, RecordingOpener) {
    let opener = RecordingOpener::default();
    let session = Session::new(SessionOptions {
        backend: base.to_string(),
        console_capacity: 100,
        download_mode,
        ..SessionOptions::default()
    });
    let controller = ExplorerController::new(
        session,
        Arc::new(HttpBackend::new().unwrap()),
        Box::new(opener.clone()),
    );
    let mut skin = PlainSkin::new(controller, Cursor::new(script.as_bytes().to_vec()), Vec::new());
    skin.run().await.unwrap();
    let (_, _, out) = skin.into_parts();
    (String::from_utf8(out).unwrap(), opener)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_plain_skin_scripted_session() {
    let (base, seen) = spawn_backend().await;
    let script = "apply\nchild #1\nrun export\nreport.csv\nquit\n";
    let (out, opener) = run_plain(&base, script, DownloadMode::Raw).await;

    assert!(out.contains("Actions:  export(file name), reset"));
    assert!(out.contains("State:    Root / pool   (valid)"));
    assert!(out.contains("Enter 0-th argument: (file name) > "));
    assert!(out.contains("  exported to report.csv"));
    assert_eq!(opener.0.lock().unwrap().as_slice(), ["files/out.zip".to_string()]);
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_plain_skin_cancelled_prompt_sends_nothing() {
    let (base, seen) = spawn_backend().await;
    let script = "apply\nrun export\n:cancel\nrun nope\nfly\n";
    let (out, opener) = run_plain(&base, script, DownloadMode::Relative).await;

    assert!(out.contains("nothing was sent"));
    assert!(out.contains("error: predicate 'nope' is not available"));
    assert!(out.contains("error: unknown command 'fly'"));
    assert!(opener.0.lock().unwrap().is_empty());
    // Only the help request reached the backend.
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_plain_skin_backend_change_waits_for_apply() {
    let (base, seen) = spawn_backend().await;
    let script = format!("backend {base}/kas\nshow\napply\n");
    let (out, _) = run_plain("http://127.0.0.1:1", &script, DownloadMode::Relative).await;

    assert!(out.contains(&format!("backend set to {base}/kas (use 'apply' to connect)")));
    assert!(out.contains("Actions:  export(file name), reset"));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_help_round_trip_leaves_only_the_banner() {
    let (base, _) = spawn_backend().await;
    let mut ctl = controller(&base, RecordingOpener::default());
    ctl.dispatch(Event::LogMessage("before connect".into()));
    ctl.dispatch(Event::ApplyHelp);
    ctl.settle().await;

    assert_eq!(ctl.session().console().messages(), vec![kas_session::CONSOLE_BANNER]);
    assert_eq!(ctl.session().help_message(), "Pick a child to descend.");
}
