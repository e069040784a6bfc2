//! Shared fixtures: a temporary application and a set of recording handlers.

use std::cell::Cell;
use std::fs;
use std::io::Write;
use std::rc::Rc;

use anyhow::{anyhow, bail};
use camino::Utf8PathBuf;
use kore_config::Settings;
use serde_json::json;
use tempfile::TempDir;
use tracing_subscriber::prelude::*;

use crate::app::App;
use crate::dispatch::{
    COMMANDS_ROOT, CONTROLLERS_ROOT, CommandRegistry, CommandRouter, ControllerRegistry, WebRouter,
};
use crate::handler::{Command, CommandContext, Controller, ControllerContext};

/// Application rooted in a temporary directory with an empty configuration.
pub(crate) struct TestApp {
    pub(crate) _dir: TempDir,
    pub(crate) app: App,
}

impl TestApp {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let app_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 path");
        let settings = Settings {
            app_dir,
            ..Settings::default()
        };
        let config_dir = settings.paths().config_dir().to_owned();
        fs::create_dir_all(&config_dir).expect("config dir");
        fs::write(
            config_dir.join("config.toml"),
            "[database]\ndb = \":memory:\"\n",
        )
        .expect("config file");
        let views_dir = settings.paths().views_dir().to_owned();
        fs::create_dir_all(&views_dir).expect("views dir");
        fs::write(views_dir.join("hello.html"), "<h1>Hello {{ name }}</h1>").expect("view");

        let app = App::bootstrap(settings).expect("bootstrap");
        Self { _dir: dir, app }
    }

    /// Runs `body` with the file sink installed as the thread's subscriber.
    pub(crate) fn logged<T>(&self, body: impl FnOnce() -> T) -> T {
        let subscriber = tracing_subscriber::registry().with(self.app.logger().layer());
        tracing::subscriber::with_default(subscriber, body)
    }

    /// Contents of the active log file, empty when nothing was written.
    pub(crate) fn log_text(&self) -> String {
        fs::read_to_string(self.app.logger().current_file()).unwrap_or_default()
    }
}

/// Responds with its identifier and arguments as JSON.
pub(crate) struct Echo;

impl Controller for Echo {
    fn action(&mut self, ctx: &mut ControllerContext<'_>) -> anyhow::Result<()> {
        let body = json!({
            "controller": ctx.identifier().as_str(),
            "args": ctx.args(),
            "method": ctx.method(),
        });
        ctx.respond_json(&body, 200)?;
        Ok(())
    }
}

/// Always fails.
pub(crate) struct Failing;

impl Controller for Failing {
    fn action(&mut self, _ctx: &mut ControllerContext<'_>) -> anyhow::Result<()> {
        bail!("controller exploded")
    }
}

/// Always panics.
pub(crate) struct Panicking;

impl Controller for Panicking {
    fn action(&mut self, _ctx: &mut ControllerContext<'_>) -> anyhow::Result<()> {
        panic!("controller panicked")
    }
}

/// Chooses a status, then fails.
pub(crate) struct Teapot;

impl Controller for Teapot {
    fn action(&mut self, ctx: &mut ControllerContext<'_>) -> anyhow::Result<()> {
        ctx.response_mut().set_status(418);
        Err(anyhow!("short and stout"))
    }
}

/// Rejects the request in its pre-hook.
pub(crate) struct Guarded {
    pub(crate) actions: Rc<Cell<usize>>,
}

impl Controller for Guarded {
    fn module_name(&self) -> &str {
        "guarded"
    }

    fn pre_action(&mut self, ctx: &mut ControllerContext<'_>) -> anyhow::Result<()> {
        if ctx.header("X-Token").is_none() {
            ctx.response_mut().set_status(401);
            bail!("missing token");
        }
        Ok(())
    }

    fn action(&mut self, ctx: &mut ControllerContext<'_>) -> anyhow::Result<()> {
        self.actions.set(self.actions.get() + 1);
        ctx.respond(200, "welcome");
        Ok(())
    }
}

/// Renders the `hello` view.
pub(crate) struct Greeter;

impl Controller for Greeter {
    fn action(&mut self, ctx: &mut ControllerContext<'_>) -> anyhow::Result<()> {
        let name = ctx.query_or("name", "world").to_owned();
        ctx.respond_view("hello", &json!({ "name": name }), 200)?;
        Ok(())
    }
}

/// Redirects to `/login`.
pub(crate) struct Bounce;

impl Controller for Bounce {
    fn action(&mut self, ctx: &mut ControllerContext<'_>) -> anyhow::Result<()> {
        ctx.redirect("/login");
        Ok(())
    }
}

/// Writes its arguments and options.
pub(crate) struct MockCommand;

impl Command for MockCommand {
    fn exec(&mut self, ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        let opts: Vec<String> = ctx
            .opts()
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        let line = format!("args={} opts={}", ctx.args().join(","), opts.join(","));
        writeln!(ctx.out(), "{line}")?;
        Ok(())
    }
}

/// Always fails.
pub(crate) struct FailingCommand;

impl Command for FailingCommand {
    fn exec(&mut self, _ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        bail!("command exploded")
    }
}

/// Always panics.
pub(crate) struct PanickingCommand;

impl Command for PanickingCommand {
    fn exec(&mut self, _ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        panic!("command panicked")
    }
}

/// Fails and swallows its own error.
pub(crate) struct ForgivingCommand;

impl Command for ForgivingCommand {
    fn command_name(&self, _identifier: &crate::dispatch::HandlerId) -> String {
        String::from("forgiving")
    }

    fn exec(&mut self, _ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        bail!("recoverable")
    }

    fn handle_error(
        &mut self,
        ctx: &mut CommandContext<'_>,
        error: anyhow::Error,
    ) -> anyhow::Result<()> {
        writeln!(ctx.out(), "handled: {error}")?;
        Ok(())
    }
}

pub(crate) fn controllers(guarded_actions: &Rc<Cell<usize>>) -> ControllerRegistry {
    let actions = Rc::clone(guarded_actions);
    ControllerRegistry::new(CONTROLLERS_ROOT)
        .with("index", || Box::new(Echo))
        .with("mock", || Box::new(Echo))
        .with("path1/mock", || Box::new(Echo))
        .with("failing", || Box::new(Failing))
        .with("panicking", || Box::new(Panicking))
        .with("teapot", || Box::new(Teapot))
        .with("greeter", || Box::new(Greeter))
        .with("bounce", || Box::new(Bounce))
        .with("guarded", move || {
            Box::new(Guarded {
                actions: Rc::clone(&actions),
            })
        })
}

pub(crate) fn commands() -> CommandRegistry {
    CommandRegistry::new(COMMANDS_ROOT)
        .with("mock_command", || Box::new(MockCommand))
        .with("jobs/failing_command", || Box::new(FailingCommand))
        .with("panicking_command", || Box::new(PanickingCommand))
        .with("forgiving_command", || Box::new(ForgivingCommand))
}

pub(crate) fn web_router(guarded_actions: &Rc<Cell<usize>>) -> WebRouter {
    WebRouter::new(controllers(guarded_actions))
}

pub(crate) fn command_router() -> CommandRouter {
    CommandRouter::new(commands())
}
