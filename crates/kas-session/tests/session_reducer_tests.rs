use kas_protocol::*;
use kas_session::*;

fn response(state: &[&str]) -> ExplorerResponse {
    ExplorerResponse {
        state: state.iter().copied().collect(),
        valid: true,
        info: String::new(),
        children: Vec::new(),
        message: String::new(),
        download_url: None,
        available_predicates: None,
        help_message: None,
    }
}

fn child(value: &str) -> ExplorerChild {
    ExplorerChild {
        value: value.into(),
        caption: format!("caption of {value}"),
        label: None,
    }
}

fn only_request(effects: Vec<Effect>) -> OutboundRequest {
    let mut effects = effects.into_iter();
    match (effects.next(), effects.next()) {
        (Some(Effect::SendRequest(req)), None) => req,
        other => panic!("expected exactly one request, got {other:?}"),
    }
}

/// Drive a session to `path` with the given children by applying a response.
fn session_at(path: &[&str], children: &[&str]) -> Session {
    let (s, effects) = Session::default().reduce(Event::NavigateTo(path.iter().copied().collect()));
    let seq = only_request(effects).seq;
    let mut resp = response(path);
    resp.children = children.iter().map(|c| child(c)).collect();
    let (s, _) = s.reduce(Event::ResponseReceived { seq, response: resp });
    s
}

// ─── Scenarios ──────────────────────────────────────────────────────────────

#[test]
fn test_set_explorer_kind_issues_help_at_root() {
    let (s, effects) = Session::default().reduce(Event::SetExplorerKind(ExplorerKind::SearchSpace));
    let req = only_request(effects);
    assert_eq!(req.body, ExplorerRequest::help(NavigationPath::root()));
    assert_eq!(req.kind, ExplorerKind::SearchSpace);
    assert_eq!(
        req.endpoint().unwrap().explore_url().as_str(),
        "http://localhost:7070/explore?explorer=search_space"
    );
    assert_eq!(s.console().messages(), vec![CONSOLE_BANNER]);
}

#[test]
fn test_set_explorer_kind_switches_kind_before_request() {
    let s = session_at(&["a"], &[]);
    let (s, effects) = s.reduce(Event::SetExplorerKind(ExplorerKind::Algorithm));
    let req = only_request(effects);
    assert_eq!(s.kind(), ExplorerKind::Algorithm);
    assert_eq!(req.kind, ExplorerKind::Algorithm);
    assert_eq!(req.body.state.segments(), ["a".to_string()]);
    assert_eq!(req.body.predicate, HELP_PREDICATE);
}

#[test]
fn test_apply_help_resets_console_after_response() {
    let (s, _) = Session::default().reduce(Event::LogMessage("old".into()));
    let (s, effects) = s.reduce(Event::ApplyHelp);
    let req = only_request(effects);
    assert_eq!(req.body.predicate, "help");
    assert_eq!(s.console().messages(), vec![CONSOLE_BANNER, "old"]);

    let mut resp = response(&[]);
    resp.message = "help loaded".into();
    resp.help_message = Some("pick a child".into());
    let (s, _) = s.reduce(Event::ResponseReceived { seq: req.seq, response: resp });
    assert_eq!(s.console().messages(), vec![CONSOLE_BANNER]);
    assert_eq!(s.help_message(), "pick a child");

    // Later responses log normally.
    let (s, effects) = s.reduce(Event::NavigateTo(["a"].into_iter().collect()));
    let seq = only_request(effects).seq;
    let mut resp = response(&["a"]);
    resp.message = "moved".into();
    let (s, _) = s.reduce(Event::ResponseReceived { seq, response: resp });
    assert_eq!(s.console().messages(), vec![CONSOLE_BANNER, "moved"]);
}

#[test]
fn test_explorer_switch_resets_console_only_for_help_response() {
    let (s, _) = Session::default().reduce(Event::LogMessage("old".into()));
    let (s, help) = s.reduce(Event::SetExplorerKind(ExplorerKind::Algorithm));
    let help_seq = only_request(help).seq;
    let (s, nav) = s.reduce(Event::NavigateTo(["a"].into_iter().collect()));
    let nav_seq = only_request(nav).seq;

    let mut resp = response(&["a"]);
    resp.message = "navigated".into();
    let (s, _) = s.reduce(Event::ResponseReceived { seq: nav_seq, response: resp });
    assert_eq!(s.console().messages(), vec![CONSOLE_BANNER, "old", "navigated"]);

    let (s, _) = s.reduce(Event::ResponseReceived { seq: help_seq, response: response(&["a"]) });
    assert_eq!(s.console().messages(), vec![CONSOLE_BANNER]);
}

#[test]
fn test_failed_help_keeps_console() {
    let (s, _) = Session::default().reduce(Event::LogMessage("old".into()));
    let (s, effects) = s.reduce(Event::ApplyHelp);
    let seq = only_request(effects).seq;
    let (s, _) = s.reduce(Event::RequestFailed {
        seq,
        error: ProtocolError::Transport("connection refused".into()),
    });
    let messages = s.console().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1], "old");
    assert!(messages[2].starts_with("Request failed"));
}

#[test]
fn test_breadcrumb_root_navigates_to_empty_path() {
    let s = session_at(&["a", "b"], &[]);
    let event = s.select_breadcrumb(0).unwrap();
    let (s, effects) = s.reduce(event);
    let req = only_request(effects);
    assert_eq!(req.body, ExplorerRequest::navigate(NavigationPath::root()));
    assert!(s.path().is_root(), "path is updated before the response");
}

#[test]
fn test_breadcrumb_out_of_range_is_rejected() {
    let s = session_at(&["a"], &[]);
    assert_eq!(
        s.select_breadcrumb(2),
        Err(SessionError::BreadcrumbOutOfRange { index: 2, len: 1 })
    );
}

#[test]
fn test_child_click_appends_value() {
    let s = session_at(&["a"], &["c", "d"]);
    let event = s.select_child_value("c").unwrap();
    assert_eq!(event, Event::NavigateTo(["a", "c"].into_iter().collect()));
    assert_eq!(s.select_child(1).unwrap(), Event::NavigateTo(["a", "d"].into_iter().collect()));
    assert!(s.select_child(2).is_err());
    assert!(s.select_child_value("zz").is_err());
}

#[test]
fn test_download_url_opens_relative_to_backend() {
    let (s, _) = Session::default().reduce(Event::SetBackend("http://host".into()));
    let mut resp = response(&[]);
    resp.download_url = Some("export/1.zip".into());
    let (_, effects) = s.reduce(Event::ResponseReceived { seq: 1, response: resp });
    assert_eq!(effects, vec![Effect::OpenDownload("http://host/export/1.zip".into())]);
}

#[test]
fn test_download_url_raw_mode() {
    let s = Session::new(SessionOptions {
        download_mode: DownloadMode::Raw,
        ..Default::default()
    });
    let mut resp = response(&[]);
    resp.download_url = Some("export/1.zip".into());
    let (_, effects) = s.reduce(Event::ResponseReceived { seq: 1, response: resp });
    assert_eq!(effects, vec![Effect::OpenDownload("export/1.zip".into())]);
}

#[test]
fn test_download_uses_backend_of_the_request() {
    let (s, _) = Session::default().reduce(Event::SetBackend("http://a".into()));
    let (s, effects) = s.reduce(Event::InvokePredicate {
        name: "export".into(),
        args: vec![],
    });
    let seq = only_request(effects).seq;
    let (s, _) = s.reduce(Event::SetBackend("http://b".into()));

    let mut resp = response(&[]);
    resp.download_url = Some("export/1.zip".into());
    let (_, effects) = s.reduce(Event::ResponseReceived { seq, response: resp });
    assert_eq!(effects, vec![Effect::OpenDownload("http://a/export/1.zip".into())]);
}

// ─── Response folding ───────────────────────────────────────────────────────

#[test]
fn test_response_path_is_authoritative() {
    let (s, effects) = Session::default().reduce(Event::NavigateTo(["p"].into_iter().collect()));
    let seq = only_request(effects).seq;
    assert_eq!(s.path().segments(), ["p".to_string()]);
    let (s, _) = s.reduce(Event::ResponseReceived { seq, response: response(&["s", "t"]) });
    assert_eq!(s.path().segments(), ["s".to_string(), "t".to_string()]);
}

#[test]
fn test_invoke_predicate_keeps_path() {
    let s = session_at(&["a"], &[]);
    let (s, effects) = s.reduce(Event::InvokePredicate {
        name: "export".into(),
        args: vec!["x".into()],
    });
    let req = only_request(effects);
    assert_eq!(req.body.predicate, "export");
    assert_eq!(req.body.args, vec!["x".to_string()]);
    assert_eq!(req.body.state.segments(), ["a".to_string()]);
    assert_eq!(s.path().segments(), ["a".to_string()]);
}

#[test]
fn test_absent_predicates_are_sticky() {
    let mut help = response(&[]);
    help.available_predicates = Some(vec![ExplorerPredicate {
        name: "export".into(),
        additional_args: vec!["file".into()],
    }]);
    help.help_message = Some("help text".into());
    let (s, _) = Session::default().reduce(Event::ResponseReceived { seq: 1, response: help });
    assert_eq!(s.predicates().len(), 1);

    let (s, _) = s.reduce(Event::ResponseReceived { seq: 2, response: response(&["a"]) });
    assert_eq!(s.predicates().len(), 1, "absent field leaves predicates unchanged");
    assert_eq!(s.help_message(), "help text");

    let mut replace = response(&["a"]);
    replace.available_predicates = Some(vec![]);
    let (s, _) = s.reduce(Event::ResponseReceived { seq: 3, response: replace });
    assert!(s.predicates().is_empty(), "present field replaces wholesale");
    assert!(s.predicate("export").is_err());
}

#[test]
fn test_response_replaces_info_children_and_logs_message() {
    let mut resp = response(&["a"]);
    resp.info = "node a".into();
    resp.valid = false;
    resp.children = vec![child("b")];
    resp.message = "moved".into();
    let (s, _) = session_at(&[], &["old"]).reduce(Event::ResponseReceived { seq: 9, response: resp });
    assert_eq!(s.info(), "node a");
    assert_eq!(s.valid(), Some(false));
    assert_eq!(s.children(), &[child("b")]);
    assert_eq!(s.console().messages().last(), Some(&"moved"));
}

#[test]
fn test_empty_message_leaves_console_untouched() {
    let s = Session::default();
    let before = s.console().messages().iter().map(|m| m.to_string()).collect::<Vec<_>>();
    let (s, _) = s.reduce(Event::ResponseReceived { seq: 1, response: response(&[]) });
    let (s, _) = s.reduce(Event::LogMessage(String::new()));
    assert_eq!(s.console().messages(), before);
}

// ─── Ordering ───────────────────────────────────────────────────────────────

#[test]
fn test_last_arrival_wins_by_default() {
    let (s, e1) = Session::default().reduce(Event::NavigateTo(["first"].into_iter().collect()));
    let (s, e2) = s.reduce(Event::NavigateTo(["second"].into_iter().collect()));
    let (first, second) = (only_request(e1).seq, only_request(e2).seq);

    let (s, _) = s.reduce(Event::ResponseReceived { seq: second, response: response(&["second"]) });
    let (s, _) = s.reduce(Event::ResponseReceived { seq: first, response: response(&["first"]) });
    assert_eq!(s.path().segments(), ["first".to_string()]);
    assert_eq!(s.in_flight(), 0);
}

#[test]
fn test_latest_request_discards_stale_response() {
    let s = Session::new(SessionOptions {
        ordering: ResponseOrdering::LatestRequest,
        ..Default::default()
    });
    let (s, e1) = s.reduce(Event::NavigateTo(["first"].into_iter().collect()));
    let (s, e2) = s.reduce(Event::NavigateTo(["second"].into_iter().collect()));
    let (first, second) = (only_request(e1).seq, only_request(e2).seq);

    let (s, _) = s.reduce(Event::ResponseReceived { seq: second, response: response(&["second"]) });
    let mut stale = response(&["first"]);
    stale.download_url = Some("never.zip".into());
    let (s, effects) = s.reduce(Event::ResponseReceived { seq: first, response: stale });
    assert!(effects.is_empty(), "stale response produces no side effects");
    assert_eq!(s.path().segments(), ["second".to_string()]);
    assert_eq!(s.in_flight(), 0);
}

// ─── Arguments ──────────────────────────────────────────────────────────────

struct CancelAll(usize);

impl ArgumentPrompter for CancelAll {
    fn prompt(&mut self, _prompt: &str) -> Option<String> {
        self.0 += 1;
        None
    }
}

#[test]
fn test_cancelled_arguments_never_issue_a_request() {
    let mut help = response(&[]);
    help.available_predicates = Some(vec![ExplorerPredicate {
        name: "export".into(),
        additional_args: vec!["file".into()],
    }]);
    let (s, _) = Session::default().reduce(Event::ResponseReceived { seq: 1, response: help });
    let predicate = s.predicate("export").unwrap().clone();

    let mut prompter = CancelAll(0);
    let result = collect_arguments(&predicate, &mut prompter);
    assert_eq!(result, Err(SessionError::ArgumentsCancelled("export".into())));
    assert_eq!(prompter.0, 1);
    assert_eq!(s.in_flight(), 0);
}
