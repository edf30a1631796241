use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::{mpsc, oneshot};

/// One delivery from the transport: payload bytes, the attribute map, and
/// the acknowledge callback. Dropping the message without calling [`ack`]
/// leaves it unacknowledged, which is how redelivery is requested.
///
/// [`ack`]: DeliveredMessage::ack
pub struct DeliveredMessage {
    pub data: Bytes,
    pub attributes: HashMap<String, String>,
    ack: Option<oneshot::Sender<()>>,
}

impl DeliveredMessage {
    pub fn new(data: Bytes, attributes: HashMap<String, String>) -> DeliveredMessage {
        DeliveredMessage {
            data,
            attributes,
            ack: None,
        }
    }

    /// Like [`DeliveredMessage::new`], but the returned receiver resolves
    /// when the message is acknowledged and errors when it is dropped
    /// unacknowledged.
    pub fn with_ack(
        data: Bytes,
        attributes: HashMap<String, String>,
    ) -> (DeliveredMessage, oneshot::Receiver<()>) {
        let (sender, receiver) = oneshot::channel();
        (
            DeliveredMessage {
                data,
                attributes,
                ack: Some(sender),
            },
            receiver,
        )
    }

    /// Acknowledge the delivery. Called only after the record is durably
    /// inserted.
    pub fn ack(mut self) {
        if let Some(sender) = self.ack.take() {
            let _ = sender.send(());
        }
    }
}

/// The subscription transport, reduced to the one event the table consumes.
#[async_trait]
pub trait MessageSource {
    /// The next delivery, or `None` once the stream is closed.
    async fn receive(&mut self) -> Option<DeliveredMessage>;
}

/// Source fed from an in-process channel. Tests and embedded publishers use
/// this in place of a broker client.
pub struct ChannelSource {
    receiver: mpsc::Receiver<DeliveredMessage>,
}

impl ChannelSource {
    pub fn new(capacity: usize) -> (mpsc::Sender<DeliveredMessage>, ChannelSource) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, ChannelSource { receiver })
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn receive(&mut self) -> Option<DeliveredMessage> {
        self.receiver.recv().await
    }
}

/// Dev transport: every non-empty stdin line is one JSON payload, with the
/// configured version attached as its delivery attribute.
pub struct StdinSource {
    lines: Lines<BufReader<Stdin>>,
    version: String,
}

impl StdinSource {
    pub fn new(version: String) -> StdinSource {
        StdinSource {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            version,
        }
    }
}

#[async_trait]
impl MessageSource for StdinSource {
    async fn receive(&mut self) -> Option<DeliveredMessage> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let attributes =
                        HashMap::from([(String::from("version"), self.version.clone())]);
                    return Some(DeliveredMessage::new(Bytes::from(line.into_bytes()), attributes));
                }
                Ok(None) => return None,
                Err(error) => {
                    tracing::warn!(error = %error, "failed to read from stdin");
                    return None;
                }
            }
        }
    }
}
