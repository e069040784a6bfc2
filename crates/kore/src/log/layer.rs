//! Bridge from `tracing` events to the application log files.

use std::fmt;

use kore_config::LogLevel;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use super::Logger;

/// `tracing` layer writing events into the date-stamped log files.
#[derive(Debug, Clone)]
pub struct FileLogLayer {
    logger: Logger,
}

impl FileLogLayer {
    pub(super) const fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl<S: Subscriber> Layer<S> for FileLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let severity = severity_of(*metadata.level());
        if !self.logger.enabled(severity) {
            return;
        }

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let caller = caller_of(metadata);
        // The sink cannot report its own failure through tracing without
        // re-entering this layer.
        if self
            .logger
            .write_line(severity, &caller, &visitor.line(), visitor.dump.as_deref())
            .is_err()
        {
            self.logger.record_failure();
        }
    }
}

const fn severity_of(level: Level) -> LogLevel {
    match level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warn,
        Level::INFO => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

fn caller_of(metadata: &Metadata<'_>) -> String {
    let module = metadata.module_path().unwrap_or_else(|| metadata.target());
    metadata
        .line()
        .map_or_else(|| module.to_owned(), |line| format!("{module}:{line}"))
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
    dump: Option<String>,
}

impl LineVisitor {
    fn line(&self) -> String {
        format!("{}{}", self.message, self.fields)
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => value.clone_into(&mut self.message),
            "dump" => self.dump = Some(value.to_owned()),
            name => self.fields.push_str(&format!(" {name}={value}")),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "dump" => self.dump = Some(format!("{value:#?}")),
            name => self.fields.push_str(&format!(" {name}={value:?}")),
        }
    }
}
