// Per-connection WebSocket session

use crate::hub::{ClientEvent, ConnectionId, Hub, OutboundReceiver, ServerEvent};
use axum::extract::ws::{Message, WebSocket};
use std::sync::Arc;
use tracing::{debug, warn};

/// Drives a single WebSocket connection: inbound `sendMessage` events go to the
/// hub, queued `receiveMessage` events go out to the socket.
pub struct ConnectionSession {
    id: ConnectionId,
    hub: Arc<Hub>,
    outbound_rx: OutboundReceiver,
}

impl ConnectionSession {
    /// Register with the hub and return the session bound to the new connection
    pub fn open(hub: Arc<Hub>) -> Self {
        let (id, outbound_rx) = hub.connect();
        Self {
            id,
            hub,
            outbound_rx,
        }
    }

    /// Run until the client closes or the socket fails, then unregister.
    pub async fn run(mut self, mut socket: WebSocket) {
        loop {
            tokio::select! {
                // Incoming client frames
                msg = socket.recv() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_client_frame(&text);
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            break;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = socket.send(Message::Pong(data)).await {
                                warn!(connection_id = %self.id, error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Some(Ok(_)) => {
                            // Ignore binary, pong messages
                        }
                        Some(Err(e)) => {
                            warn!(connection_id = %self.id, error = %e, "WebSocket error");
                            break;
                        }
                    }
                }

                // Messages fanned out by the hub
                Some(event) = self.outbound_rx.recv() => {
                    if let Err(e) = send_event(&mut socket, &event).await {
                        debug!(connection_id = %self.id, error = %e, "Failed to send to client");
                        break;
                    }
                }

                else => {
                    break;
                }
            }
        }

        self.hub.disconnect(self.id);
    }

    /// Parse a text frame and hand `sendMessage` payloads to the hub.
    /// Anything else is logged and ignored.
    fn handle_client_frame(&self, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(ClientEvent::SendMessage(payload)) => {
                debug!(connection_id = %self.id, payload = %payload, "Message received");
                self.hub.on_message(self.id, payload);
            }
            Err(e) => {
                warn!(connection_id = %self.id, error = %e, "Ignoring malformed client frame");
            }
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> anyhow::Result<()> {
    let json = serde_json::to_string(event)?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}
