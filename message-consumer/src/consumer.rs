use std::sync::Arc;

use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use message_table::sink::RenderSink;
use message_table::view::MessageTable;

use crate::source::{DeliveredMessage, MessageSource};

/// The ingestion loop: waits on the message source, feeds the table, and
/// hands every refreshed view to the render sink.
pub struct ConsumerLoop<S> {
    source: S,
    table: Arc<MessageTable>,
    sink: Arc<dyn RenderSink + Send + Sync>,
}

impl<S: MessageSource> ConsumerLoop<S> {
    pub fn new(
        source: S,
        table: Arc<MessageTable>,
        sink: Arc<dyn RenderSink + Send + Sync>,
    ) -> Self {
        Self {
            source,
            table,
            sink,
        }
    }

    /// Run until the token is cancelled or the source closes. Cancellation
    /// is honored at the delivery wait; a message already being handled
    /// completes first.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("starting consumer loop");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("cancellation requested, stopping consumer loop");
                    break;
                }
                delivery = self.source.receive() => match delivery {
                    Some(message) => self.handle_message(message).await,
                    None => {
                        info!("message source closed, stopping consumer loop");
                        break;
                    }
                },
            }
        }
    }

    async fn handle_message(&self, message: DeliveredMessage) {
        match self.table.ingest(&message.data, &message.attributes).await {
            Ok(snapshot) => {
                if let Err(render_error) = self.sink.render(&snapshot).await {
                    // The record is already durable; rendering is best effort.
                    error!(error = %render_error, "failed to render refreshed table");
                }
                message.ack();
                counter!("consumer_messages_acked_total").increment(1);
            }
            Err(ingest_error) if ingest_error.is_malformed_message() => {
                warn!(error = %ingest_error, "rejected malformed message");
                counter!("consumer_messages_malformed_total").increment(1);
            }
            Err(ingest_error) => {
                warn!(
                    error = %ingest_error,
                    "message not ingested, left unacknowledged for redelivery"
                );
                counter!("consumer_messages_failed_total").increment(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bytes::Bytes;

    use message_table::dedup::{DedupStrategy, DuplicateDetector};
    use message_table::sink::PrintSink;
    use message_table::store::RowStore;

    use super::*;
    use crate::source::ChannelSource;

    async fn table() -> Arc<MessageTable> {
        let store = RowStore::new("messages", "sqlite::memory:").await.unwrap();
        Arc::new(MessageTable::new(
            store,
            DuplicateDetector::new(DedupStrategy::Store),
        ))
    }

    fn attributes() -> HashMap<String, String> {
        HashMap::from([(String::from("version"), String::from("1"))])
    }

    fn payload(message_id: i64) -> Bytes {
        Bytes::from(format!(
            r#"{{
                "message_id": {},
                "item_id": 100,
                "location": "Georgia",
                "quantity": 10,
                "transaction_datetime": "2023-09-05 12:00:00",
                "transaction_number": 7
            }}"#,
            message_id
        ))
    }

    #[tokio::test]
    async fn acks_ingested_messages_and_skips_malformed_ones() {
        let table = table().await;
        let (sender, source) = ChannelSource::new(8);
        let cancel = CancellationToken::new();
        let consumer = ConsumerLoop::new(source, table.clone(), Arc::new(PrintSink {}));
        let handle = tokio::spawn(consumer.run(cancel.clone()));

        let (message, acked) = DeliveredMessage::with_ack(payload(1), attributes());
        sender.send(message).await.unwrap();
        acked.await.expect("valid message should be acked");

        let (message, acked) =
            DeliveredMessage::with_ack(Bytes::from_static(b"not json"), attributes());
        sender.send(message).await.unwrap();
        assert!(acked.await.is_err(), "malformed message must not be acked");

        cancel.cancel();
        handle.await.unwrap();

        let snapshot = table.refresh().await.unwrap();
        assert_eq!(snapshot.rows.len(), 1);
    }

    #[tokio::test]
    async fn loop_stops_when_the_source_closes() {
        let table = table().await;
        let (sender, source) = ChannelSource::new(1);
        let consumer = ConsumerLoop::new(source, table, Arc::new(PrintSink {}));
        let handle = tokio::spawn(consumer.run(CancellationToken::new()));

        drop(sender);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn loop_stops_on_cancellation() {
        let table = table().await;
        let (_sender, source) = ChannelSource::new(1);
        let cancel = CancellationToken::new();
        let consumer = ConsumerLoop::new(source, table, Arc::new(PrintSink {}));
        let handle = tokio::spawn(consumer.run(cancel.clone()));

        cancel.cancel();
        handle.await.unwrap();
    }
}
