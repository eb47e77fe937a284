//! WebSocket route handler
//!
//! Upgrades `/ws` and hands the socket to [`WebSocketState`] through a
//! channel-backed adapter speaking tungstenite message types.
//!
//! [`WebSocketState`]: dashboard_services::WebSocketState

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_tungstenite::tungstenite::{self, Message as TungsteniteMessage};
use tracing::{info, warn};

use crate::AppState;

/// Frames buffered in each direction between axum and the handler
const BRIDGE_BUFFER: usize = 100;

/// Create WebSocket routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Inbound axum frame as a tungstenite frame; `None` for close
fn from_axum(msg: Message) -> Option<TungsteniteMessage> {
    match msg {
        Message::Text(text) => Some(TungsteniteMessage::Text(text.as_str().into())),
        Message::Binary(data) => Some(TungsteniteMessage::Binary(data)),
        Message::Ping(data) => Some(TungsteniteMessage::Ping(data)),
        Message::Pong(data) => Some(TungsteniteMessage::Pong(data)),
        Message::Close(_) => None,
    }
}

/// Outbound tungstenite frame as an axum frame; raw frames are skipped
fn to_axum(msg: TungsteniteMessage) -> Option<Message> {
    match msg {
        TungsteniteMessage::Text(text) => Some(Message::Text(text.as_str().into())),
        TungsteniteMessage::Binary(data) => Some(Message::Binary(data)),
        TungsteniteMessage::Ping(data) => Some(Message::Ping(data)),
        TungsteniteMessage::Pong(data) => Some(Message::Pong(data)),
        TungsteniteMessage::Close(_) => Some(Message::Close(None)),
        TungsteniteMessage::Frame(_) => None,
    }
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let (inbound_tx, inbound_rx) = mpsc::channel::<TungsteniteMessage>(BRIDGE_BUFFER);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<TungsteniteMessage>(BRIDGE_BUFFER);

    // Task: client frames into the handler
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let Some(msg) = from_axum(msg) else {
                break;
            };
            if inbound_tx.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Task: handler frames out to the client
    let send_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let Some(msg) = to_axum(msg) else {
                continue;
            };
            let closing = matches!(msg, Message::Close(_));
            if sender.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    let bridge = ChannelSocket {
        inbound: inbound_rx,
        outbound: outbound_tx,
    };
    state.ws_state.handle_connection(bridge).await;

    recv_task.abort();
    send_task.abort();
}

/// Stream + Sink of tungstenite messages backed by a pair of channels
struct ChannelSocket {
    inbound: mpsc::Receiver<TungsteniteMessage>,
    outbound: mpsc::Sender<TungsteniteMessage>,
}

impl futures_util::Stream for ChannelSocket {
    type Item = Result<TungsteniteMessage, tungstenite::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inbound.poll_recv(cx).map(|msg| msg.map(Ok))
    }
}

impl futures_util::Sink<TungsteniteMessage> for ChannelSocket {
    type Error = tungstenite::Error;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: TungsteniteMessage) -> Result<(), Self::Error> {
        match self.outbound.try_send(item) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!("WebSocket outbound buffer full, dropping frame");
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(tungstenite::Error::ConnectionClosed),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}
