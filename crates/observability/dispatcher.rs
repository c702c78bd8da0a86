use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::mpsc;
use tracing::Level;

const QUEUE_CAPACITY: usize = 128;

/// One log event promoted to an operator alert.
#[derive(Debug, Clone)]
pub(crate) struct OperatorAlert {
    pub(crate) level: Level,
    pub(crate) at: DateTime<Utc>,
    pub(crate) service_name: String,
    pub(crate) stage: String,
    pub(crate) component: String,
    pub(crate) target: String,
    pub(crate) message: String,
    pub(crate) fields: BTreeMap<String, String>,
}

#[async_trait]
pub(crate) trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &OperatorAlert) -> Result<()>;
}

/// Bounded queue between the tracing layer (sync) and the sinks (async).
/// Alerts are dropped when the queue is full so logging never blocks a request.
#[derive(Clone)]
pub(crate) struct AlertDispatcher {
    tx: mpsc::Sender<OperatorAlert>,
}

impl AlertDispatcher {
    pub(crate) fn spawn(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        let (tx, mut rx) = mpsc::channel::<OperatorAlert>(QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                for sink in &sinks {
                    if let Err(err) = sink.deliver(&alert).await {
                        // eprintln: a tracing event here could feed back into the queue.
                        eprintln!("observability: alert delivery failed: {err}");
                    }
                }
            }
        });

        Self { tx }
    }

    pub(crate) fn dispatch(&self, alert: OperatorAlert) -> bool {
        self.tx.try_send(alert).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    struct RecordingSink {
        seen: Mutex<Vec<String>>,
        notify: Notify,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn deliver(&self, alert: &OperatorAlert) -> Result<()> {
            self.seen.lock().unwrap().push(alert.message.clone());
            self.notify.notify_one();
            Ok(())
        }
    }

    #[tokio::test]
    async fn alerts_reach_every_sink() {
        let sink = Arc::new(RecordingSink {
            seen: Mutex::new(Vec::new()),
            notify: Notify::new(),
        });
        let dispatcher = AlertDispatcher::spawn(vec![sink.clone() as Arc<dyn AlertSink>]);

        assert!(dispatcher.dispatch(OperatorAlert {
            level: Level::ERROR,
            at: Utc::now(),
            service_name: "billing".to_string(),
            stage: "test".to_string(),
            component: "backend".to_string(),
            target: "backend::usecases".to_string(),
            message: "charge orphaned".to_string(),
            fields: BTreeMap::new(),
        }));

        sink.notify.notified().await;
        assert_eq!(*sink.seen.lock().unwrap(), vec!["charge orphaned".to_string()]);
    }
}
