//! The structured-log wire format.
//!
//! A `console`/`tracing` call made while inside an API-request or
//! workflow-task span becomes exactly one JSON line on stderr carrying
//! `api_name`/`task_name`; outside any such span, logging passes through
//! unchanged. Implemented as a custom `tracing_subscriber::Layer`.

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

#[derive(Clone, Default)]
struct ScopeTag {
    api_name: Option<String>,
    task_name: Option<String>,
}

#[derive(Default)]
struct TagVisitor {
    api_name: Option<String>,
    task_name: Option<String>,
}

impl Visit for TagVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "api_name" => self.api_name = Some(value.to_string()),
            "task_name" => self.task_name = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "api_name" => self.api_name = Some(format!("{value:?}").trim_matches('"').to_string()),
            "task_name" => self.task_name = Some(format!("{value:?}").trim_matches('"').to_string()),
            _ => {}
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    parts: Vec<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.parts.insert(0, value.to_string());
        } else {
            self.parts.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.parts.insert(0, format!("{value:?}"));
        } else {
            self.parts.push(format!("{}={:?}", field.name(), value));
        }
    }
}

/// `tracing_subscriber::Layer` that emits the documented structured log
/// line for events inside an api/task-scoped span, and a plain line
/// otherwise.
pub struct StructuredLogLayer;

impl<S> Layer<S> for StructuredLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = TagVisitor::default();
        attrs.record(&mut visitor);
        if visitor.api_name.is_some() || visitor.task_name.is_some() {
            if let Some(span) = ctx.span(id) {
                span.extensions_mut().insert(ScopeTag {
                    api_name: visitor.api_name,
                    task_name: visitor.task_name,
                });
            }
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let mut visitor = TagVisitor::default();
        values.record(&mut visitor);
        if let Some(span) = ctx.span(id) {
            let mut ext = span.extensions_mut();
            if let Some(tag) = ext.get_mut::<ScopeTag>() {
                if visitor.api_name.is_some() {
                    tag.api_name = visitor.api_name;
                }
                if visitor.task_name.is_some() {
                    tag.task_name = visitor.task_name;
                }
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let scope_tag = ctx
            .event_scope(event)
            .and_then(|scope| scope.into_iter().find_map(|span| {
                span.extensions().get::<ScopeTag>().cloned()
            }));

        let mut message = MessageVisitor::default();
        event.record(&mut message);
        let text = message.parts.join(" ");

        match scope_tag {
            Some(tag) if tag.api_name.is_some() || tag.task_name.is_some() => {
                let mut line = serde_json::json!({
                    "__moose_structured_log__": true,
                    "level": event.metadata().level().as_str(),
                    "message": text,
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                });
                if let Some(api_name) = tag.api_name {
                    line["api_name"] = serde_json::Value::String(api_name);
                }
                if let Some(task_name) = tag.task_name {
                    line["task_name"] = serde_json::Value::String(task_name);
                }
                eprintln!("{line}");
            }
            _ => {
                eprintln!(
                    "{} {} {}",
                    chrono::Utc::now().to_rfc3339(),
                    event.metadata().level(),
                    text
                );
            }
        }
    }
}

/// Install the structured-log layer as the global default subscriber. Call
/// once at process startup (gateway, streaming, or workflow binary entry
/// point).
pub fn init() {
    use tracing_subscriber::prelude::*;
    let _ = tracing_subscriber::registry()
        .with(StructuredLogLayer)
        .try_init();
}

/// Open the per-request async-local context for one API invocation
///. Console output emitted from user code during this
/// scope carries `api_name`.
pub fn api_scope(api_name: &str) -> tracing::Span {
    tracing::info_span!("moose_api_request", api_name = %api_name)
}

/// Open the per-task async-local context for one workflow activity
/// execution. Console output during this scope carries
/// `task_name`.
pub fn task_scope(workflow: &str, task: &str) -> tracing::Span {
    let task_name = format!("{workflow}/{task}");
    tracing::info_span!("moose_task_execution", task_name = %task_name)
}
