//! Unit tests for the controller and command lifecycles.

use std::cell::Cell;
use std::fs;
use std::rc::Rc;

use kore_config::LogLevel;
use rstest::{fixture, rstest};

use super::support::{TestApp, command_router, web_router};
use crate::dispatch::{CONTROLLERS_ROOT, ControllerRegistry, WebRouter};
use crate::handler::{CommandOutcome, Controller, ControllerContext};
use crate::web::Request;

#[fixture]
fn harness() -> TestApp {
    TestApp::new()
}

#[rstest]
fn json_responses_declare_their_content_type(harness: TestApp) {
    let router = web_router(&Rc::new(Cell::new(0)));
    let response = router.dispatch(&harness.app, &Request::new("post", "/mock/7"));
    assert_eq!(response.status(), 200);
    assert_eq!(response.header("Content-Type"), Some("application/json"));
    let body: serde_json::Value = serde_json::from_slice(response.body()).expect("json");
    assert_eq!(body["method"], "POST");
    assert_eq!(body["args"], serde_json::json!(["7"]));
}

#[rstest]
fn redirects_carry_location(harness: TestApp) {
    let router = web_router(&Rc::new(Cell::new(0)));
    let response = router.dispatch(&harness.app, &Request::new("GET", "/bounce"));
    assert_eq!(response.status(), 302);
    assert_eq!(response.header("Location"), Some("/login"));
}

#[rstest]
fn views_render_into_the_response(harness: TestApp) {
    let router = web_router(&Rc::new(Cell::new(0)));
    let response = router.dispatch(
        &harness.app,
        &Request::new("GET", "/greeter?name=%3Cb%3EAnn"),
    );
    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), "<h1>Hello &lt;b&gt;Ann</h1>");
}

#[rstest]
fn failing_pre_hook_skips_the_action(harness: TestApp) {
    let actions = Rc::new(Cell::new(0));
    let router = web_router(&actions);

    let rejected = harness.logged(|| router.dispatch(&harness.app, &Request::new("GET", "/guarded")));
    assert_eq!(rejected.status(), 401);
    assert_eq!(actions.get(), 0);
    assert_eq!(harness.app.logger().name(), "guarded");
    assert!(harness.log_text().contains("missing token"));

    let request = Request::new("GET", "/guarded").with_header("X-Token", "t");
    let admitted = router.dispatch(&harness.app, &request);
    assert_eq!(admitted.text(), "welcome");
    assert_eq!(actions.get(), 1);
}

struct Quiet;

impl Controller for Quiet {
    fn module_name(&self) -> &str {
        "quiet"
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Warn
    }

    fn action(&mut self, ctx: &mut ControllerContext<'_>) -> anyhow::Result<()> {
        tracing::warn!("quiet warning");
        ctx.respond(204, Vec::new());
        Ok(())
    }
}

#[rstest]
fn lines_below_the_handler_level_are_not_written(harness: TestApp) {
    let router = WebRouter::new(
        ControllerRegistry::new(CONTROLLERS_ROOT).with("quiet", || Box::new(Quiet)),
    );
    let response = harness.logged(|| router.dispatch(&harness.app, &Request::new("GET", "/quiet")));
    assert_eq!(response.status(), 204);

    let log = harness.log_text();
    assert!(harness.app.logger().current_file().as_str().contains("quiet-"));
    assert!(log.contains("[WARN]"), "log was: {log}");
    assert!(log.contains("quiet warning"), "log was: {log}");
    assert!(!log.contains("[START]"), "log was: {log}");
}

#[rstest]
fn error_hooks_can_recover_commands(harness: TestApp) {
    let router = command_router();
    let mut out = Vec::new();
    let outcome = router
        .dispatch(&harness.app, &["kore", "forgiving_command"], &mut out)
        .expect("handled error");
    assert_eq!(outcome, CommandOutcome::Completed);
    assert_eq!(String::from_utf8_lossy(&out), "handled: recoverable\n");
    assert_eq!(harness.app.logger().name(), "forgiving");
    assert!(!harness.app.paths().lock_file("forgiving").exists());
}

#[rstest]
fn stale_markers_do_not_block_commands(harness: TestApp) {
    let lock_path = harness.app.paths().lock_file("mock_command");
    fs::write(&lock_path, "4242").expect("marker");
    let old = filetime::FileTime::from_unix_time(0, 0);
    filetime::set_file_mtime(&lock_path, old).expect("age marker");

    let mut out = Vec::new();
    let outcome = command_router()
        .dispatch(&harness.app, &["kore", "mock_command", "x"], &mut out)
        .expect("run");
    assert_eq!(outcome, CommandOutcome::Completed);
    assert_eq!(String::from_utf8_lossy(&out), "args=x opts=\n");
    assert!(!lock_path.exists());
}
