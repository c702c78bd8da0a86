use chrono::Utc;
use std::collections::BTreeMap;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use super::config::ServiceContext;
use super::dispatcher::{AlertDispatcher, OperatorAlert};

/// Turns events at or above `min_level` into operator alerts.
pub(crate) struct AlertLayer {
    dispatcher: AlertDispatcher,
    service: ServiceContext,
    min_level: Level,
}

impl AlertLayer {
    pub(crate) fn new(dispatcher: AlertDispatcher, service: ServiceContext, min_level: Level) -> Self {
        Self {
            dispatcher,
            service,
            min_level,
        }
    }
}

#[derive(Default)]
struct AlertFields {
    message: Option<String>,
    fields: BTreeMap<String, String>,
}

impl AlertFields {
    fn insert(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields
                .insert(field.name().to_string(), redact(field.name(), value));
        }
    }
}

impl Visit for AlertFields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }
}

impl<S: Subscriber> Layer<S> for AlertLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // Level ordering in tracing: ERROR is the smallest.
        if *metadata.level() > self.min_level {
            return;
        }

        let mut visitor = AlertFields::default();
        event.record(&mut visitor);

        self.dispatcher.dispatch(OperatorAlert {
            level: *metadata.level(),
            at: Utc::now(),
            service_name: self.service.service_name.clone(),
            stage: self.service.stage.clone(),
            component: self.service.component.clone(),
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
        });
    }
}

pub(crate) fn redact(field_name: &str, value: String) -> String {
    let name = field_name.to_ascii_lowercase();
    let sensitive = ["secret", "password", "token", "authorization", "server_key", "signature"]
        .iter()
        .any(|marker| name.contains(marker));

    if sensitive { "[redacted]".to_string() } else { value }
}
