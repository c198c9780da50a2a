// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tracing subscriber initialization.
//!
//! In JSON mode every event becomes one line of the form
//!
//! ```text
//! {"ts": "...", "level": "info", "logger": "access", "msg": "request", ...fields, "request_id": "..."}
//! ```
//!
//! where `logger` is the event target and `request_id` comes from the task-local
//! [`notes_core::context`] of the request being served, when there is one.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives; overrides the configured default level

use std::fmt::{self, Write as _};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use notes_core::context;

use crate::config::LogFormat;

/// Keys every JSON line starts with; event fields never overwrite them.
const RESERVED_KEYS: [&str; 5] = ["ts", "level", "logger", "msg", "request_id"];

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{level},sqlx=warn,hyper=warn,tower_http=warn"))
}

/// Install the global subscriber writing to stdout.
pub fn init_subscriber(format: LogFormat, default_level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(JsonLineFormat)
                    .with_writer(std::io::stdout),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_ansi(false)
                    .with_target(true),
            )
            .try_init(),
    }
}

/// Formats each event as a single flat JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLineFormat;

impl<S, N> FormatEvent<S, N> for JsonLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let record = render(event, context::current_request_id());
        let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}

/// Build the JSON object for one event.
fn render(event: &Event<'_>, request_id: Option<String>) -> Value {
    let meta = event.metadata();

    let mut visitor = FieldVisitor::default();
    event.record(&mut visitor);

    let mut record = Map::new();
    record.insert(
        "ts".to_string(),
        Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
    );
    record.insert(
        "level".to_string(),
        Value::from(meta.level().to_string().to_lowercase()),
    );
    record.insert("logger".to_string(), Value::from(meta.target()));
    record.insert(
        "msg".to_string(),
        Value::from(visitor.message.unwrap_or_default()),
    );

    for (key, value) in visitor.fields {
        if !RESERVED_KEYS.contains(&key.as_str()) {
            record.insert(key, value);
        }
    }

    if let Some(request_id) = request_id {
        record.insert("request_id".to_string(), Value::from(request_id));
    }

    Value::Object(record)
}

/// Collects event fields with their native JSON types.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if name == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else if !name.starts_with("log.") {
            self.fields.insert(name.to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.insert(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{value:?}");
        // Lists of names recorded with `?` keep their JSON array shape.
        if text.starts_with('[')
            && let Ok(list @ Value::Array(_)) = serde_json::from_str(&text)
        {
            self.insert(field, list);
            return;
        }
        self.insert(field, Value::from(text));
    }
}
