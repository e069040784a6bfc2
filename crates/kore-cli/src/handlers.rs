//! Handlers shipped with the stock binaries.

use anyhow::bail;
use kore::dispatch::{COMMANDS_ROOT, CONTROLLERS_ROOT};
use kore::{
    Command, CommandContext, CommandRegistry, Controller, ControllerContext, ControllerRegistry,
};
use serde_json::json;

/// Describes the application and echoes the path arguments.
struct Index;

impl Controller for Index {
    fn action(&mut self, ctx: &mut ControllerContext<'_>) -> anyhow::Result<()> {
        let name = ctx.app().config().get_str("app.name").unwrap_or("kore");
        let body = json!({ "app": name, "args": ctx.args() });
        ctx.respond_json(&body, 200)?;
        Ok(())
    }
}

struct Hello;

impl Controller for Hello {
    fn module_name(&self) -> &str {
        "hello"
    }

    fn action(&mut self, ctx: &mut ControllerContext<'_>) -> anyhow::Result<()> {
        let greeting = format!("Hello, {}!", ctx.arg_or(0, "world"));
        ctx.response_mut()
            .set_header("Content-Type", "text/plain; charset=utf-8");
        ctx.respond(200, greeting);
        Ok(())
    }
}

/// Liveness check for schedulers.
struct Ping;

impl Command for Ping {
    fn exec(&mut self, ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        if ctx.opt("fail").is_some() {
            bail!("ping asked to fail");
        }
        let line = std::iter::once("pong")
            .chain(ctx.args().iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(ctx.out(), "{line}")?;
        Ok(())
    }
}

/// Prints one configuration value, or the whole tree, as JSON.
struct ConfigShow;

impl Command for ConfigShow {
    fn command_name(&self, _identifier: &kore::HandlerId) -> String {
        "config_show".to_owned()
    }

    fn exec(&mut self, ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
        let config = ctx.app().config();
        let value = ctx.arg(0).map_or_else(
            || serde_json::Value::Object(config.all().clone()),
            |key| config.get(key).cloned().unwrap_or(serde_json::Value::Null),
        );
        let rendered = serde_json::to_string_pretty(&value)?;
        writeln!(ctx.out(), "{rendered}")?;
        Ok(())
    }
}

/// Controllers reachable through `kore-cgi`.
#[must_use]
pub fn controllers() -> ControllerRegistry {
    ControllerRegistry::new(CONTROLLERS_ROOT)
        .with("index", || Box::new(Index))
        .with("hello", || Box::new(Hello))
}

/// Commands reachable through `kore`.
#[must_use]
pub fn commands() -> CommandRegistry {
    CommandRegistry::new(COMMANDS_ROOT)
        .with("ping", || Box::new(Ping))
        .with("config/show", || Box::new(ConfigShow))
}
