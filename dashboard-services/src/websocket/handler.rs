//! WebSocket connection handler
//!
//! Each connection registers with the hub, forwards every published snapshot
//! as a `data_update`, and answers `request_data` straight from the store.

use chrono::Utc;
use dashboard_core::{ClientMessage, ErrorCode, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use super::hub::{BroadcastHub, SubscriberId};
use crate::series_store::SeriesStore;

/// Outgoing queue depth per connection
const OUTGOING_BUFFER: usize = 100;

/// Shared state for WebSocket handlers
#[derive(Clone)]
pub struct WebSocketState {
    pub store: Arc<SeriesStore>,
    pub hub: Arc<BroadcastHub>,
}

impl WebSocketState {
    pub fn new(store: Arc<SeriesStore>, hub: Arc<BroadcastHub>) -> Self {
        Self { store, hub }
    }

    /// Snapshot of the store wrapped as a `data_update`
    pub fn data_update(&self) -> ServerMessage {
        ServerMessage::DataUpdate(Arc::new(self.store.snapshot()))
    }

    /// Handle a new WebSocket connection
    ///
    /// Runs until the client disconnects or the socket errors, then removes
    /// the connection from the hub.
    pub async fn handle_connection<S>(&self, socket: S)
    where
        S: futures_util::Stream<
                Item = Result<Message, tokio_tungstenite::tungstenite::Error>,
            > + futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
            + Send
            + 'static,
    {
        let mut subscription = self.hub.subscribe();
        let subscriber_id = subscription.id;
        info!("New WebSocket connection: {}", subscriber_id);

        let (mut ws_sender, mut ws_receiver) = socket.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<ServerMessage>(OUTGOING_BUFFER);

        let _ = outgoing_tx.send(ServerMessage::connected()).await;

        // Task: forward hub snapshots to this client
        let forward_tx = outgoing_tx.clone();
        let forward_task = tokio::spawn(async move {
            while let Some(snapshot) = subscription.recv().await {
                if forward_tx
                    .send(ServerMessage::DataUpdate(snapshot))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        // Task: send outgoing messages to the socket
        let mut send_task = tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                let json = match serde_json::to_string(&message) {
                    Ok(j) => j,
                    Err(e) => {
                        error!("Failed to serialize message: {}", e);
                        continue;
                    }
                };

                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        });

        // Receive and process incoming messages
        let recv_task = {
            let outgoing_tx = outgoing_tx.clone();
            let state = self.clone();
            async move {
                while let Some(result) = ws_receiver.next().await {
                    match result {
                        Ok(Message::Close(_)) => {
                            debug!("Received close from {}", subscriber_id);
                            break;
                        }
                        Ok(msg) => {
                            if let Err(e) =
                                state.handle_message(subscriber_id, msg, &outgoing_tx).await
                            {
                                warn!("Error handling message from {}: {}", subscriber_id, e);
                            }
                        }
                        Err(e) => {
                            debug!("WebSocket error for {}: {}", subscriber_id, e);
                            break;
                        }
                    }
                }
            }
        };

        tokio::select! {
            _ = &mut send_task => {}
            _ = recv_task => {}
        }

        forward_task.abort();
        send_task.abort();
        self.hub.unsubscribe(subscriber_id);
        info!("WebSocket connection closed: {}", subscriber_id);
    }

    /// Handle one incoming frame
    async fn handle_message(
        &self,
        subscriber_id: SubscriberId,
        msg: Message,
        outgoing_tx: &mpsc::Sender<ServerMessage>,
    ) -> Result<(), String> {
        match msg {
            Message::Text(text) => {
                let client_msg: ClientMessage = match serde_json::from_str(&text) {
                    Ok(m) => m,
                    Err(e) => {
                        let _ = outgoing_tx
                            .send(ServerMessage::Error {
                                code: ErrorCode::InvalidMessage,
                                message: format!("Invalid message: {}", e),
                            })
                            .await;
                        return Err(format!("Invalid JSON: {}", e));
                    }
                };

                match client_msg {
                    ClientMessage::RequestData => {
                        debug!("{} requested data", subscriber_id);
                        let _ = outgoing_tx.send(self.data_update()).await;
                    }
                    ClientMessage::Ping { timestamp } => {
                        let _ = outgoing_tx
                            .send(ServerMessage::Pong {
                                client_timestamp: timestamp,
                                server_timestamp: Utc::now().timestamp_millis(),
                            })
                            .await;
                    }
                }
            }
            Message::Binary(_) => {
                let _ = outgoing_tx
                    .send(ServerMessage::Error {
                        code: ErrorCode::InvalidMessage,
                        message: "Binary messages not supported".to_string(),
                    })
                    .await;
            }
            // Control frames are answered by tungstenite
            Message::Ping(_) | Message::Pong(_) | Message::Close(_) | Message::Frame(_) => {}
        }

        Ok(())
    }
}

impl std::fmt::Debug for WebSocketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketState")
            .field("subscribers", &self.hub.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dashboard_core::Category;
    use serde_json::Value;
    use std::time::Duration;
    use tokio::io::DuplexStream;
    use tokio_tungstenite::tungstenite::protocol::Role;
    use tokio_tungstenite::WebSocketStream;

    async fn connect(state: &WebSocketState) -> WebSocketStream<DuplexStream> {
        let (server_io, client_io) = tokio::io::duplex(64 * 1024);
        let server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;
        let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;

        let state = state.clone();
        tokio::spawn(async move { state.handle_connection(server).await });
        client
    }

    async fn next_event(client: &mut WebSocketStream<DuplexStream>) -> Value {
        let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("socket error");
        match msg {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    fn state() -> WebSocketState {
        let store = Arc::new(SeriesStore::new(50));
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 14, 5, 9).unwrap();
        store.upsert(Category::Stocks, "AAPL", 150.0, now).unwrap();
        WebSocketState::new(store, Arc::new(BroadcastHub::new(4)))
    }

    #[tokio::test]
    async fn test_connected_then_request_data() {
        let state = state();
        let mut client = connect(&state).await;

        let greeting = next_event(&mut client).await;
        assert_eq!(greeting["event"], "connected");
        assert_eq!(greeting["data"]["data"], "Connected to dashboard");

        client
            .send(Message::Text(r#"{"event":"request_data"}"#.into()))
            .await
            .unwrap();
        let update = next_event(&mut client).await;
        assert_eq!(update["event"], "data_update");
        assert_eq!(update["data"]["stocks"]["AAPL"]["current_price"], 150.0);
    }

    #[tokio::test]
    async fn test_published_snapshot_is_forwarded() {
        let state = state();
        let mut client = connect(&state).await;
        next_event(&mut client).await;

        // The greeting is only sent after registration
        assert_eq!(state.hub.subscriber_count(), 1);
        state.hub.publish(Arc::new(state.store.snapshot()));

        let update = next_event(&mut client).await;
        assert_eq!(update["event"], "data_update");
        assert_eq!(update["data"]["stocks"]["AAPL"]["timestamps"][0], "14:05:09");
    }

    #[tokio::test]
    async fn test_malformed_message_gets_error() {
        let state = state();
        let mut client = connect(&state).await;
        next_event(&mut client).await;

        client
            .send(Message::Text(r#"{"event":"subscribe"}"#.into()))
            .await
            .unwrap();
        let reply = next_event(&mut client).await;
        assert_eq!(reply["event"], "error");
        assert_eq!(reply["data"]["code"], "invalid_message");
    }

    #[tokio::test]
    async fn test_ping_gets_pong() {
        let state = state();
        let mut client = connect(&state).await;
        next_event(&mut client).await;

        client
            .send(Message::Text(
                r#"{"event":"ping","data":{"timestamp":42}}"#.into(),
            ))
            .await
            .unwrap();
        let reply = next_event(&mut client).await;
        assert_eq!(reply["event"], "pong");
        assert_eq!(reply["data"]["client_timestamp"], 42);
    }

    #[tokio::test]
    async fn test_disconnect_unsubscribes() {
        let state = state();
        let mut client = connect(&state).await;
        next_event(&mut client).await;
        assert_eq!(state.hub.subscriber_count(), 1);

        client.close(None).await.unwrap();
        drop(client);

        tokio::time::timeout(Duration::from_secs(2), async {
            while state.hub.subscriber_count() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }
}
