//! WebSocket handler streaming store events to connected views

use super::handlers::{AppError, SwaproState};
use crate::events::{SyncEvent, Topic};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::HashSet;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, Duration};
use tracing::{debug, warn};

/// Query parameters for filtering WebSocket events
#[derive(Debug, Deserialize, Default)]
pub struct WsQuery {
    /// Comma-separated topics to receive (e.g. "jobs_updated,notification_added")
    pub topics: Option<String>,
    /// Only forward events for this owner key (user, candidate or application id)
    pub scope: Option<String>,
}

/// Connection-level event filter
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    topics: Option<HashSet<Topic>>,
    scope: Option<String>,
}

impl EventFilter {
    pub fn from_query(query: WsQuery) -> Result<Self, AppError> {
        let topics = match query.topics {
            Some(raw) => Some(
                raw.split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| s.parse::<Topic>())
                    .collect::<Result<HashSet<_>, _>>()
                    .map_err(|e| AppError::BadRequest(e.to_string()))?,
            ),
            None => None,
        };
        Ok(Self {
            topics,
            scope: query.scope.filter(|s| !s.is_empty()),
        })
    }

    /// Unscoped events (global collections, sync lifecycle) always pass the
    /// scope filter.
    pub fn matches(&self, event: &SyncEvent) -> bool {
        if let Some(topics) = &self.topics {
            if !topics.contains(&event.topic) {
                return false;
            }
        }
        match (&self.scope, &event.scope) {
            (Some(wanted), Some(scope)) => wanted == scope,
            _ => true,
        }
    }
}

/// WebSocket upgrade handler for `/ws/events`
pub async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<SwaproState>,
    Query(query): Query<WsQuery>,
) -> Response {
    let filter = match EventFilter::from_query(query) {
        Ok(filter) => filter,
        Err(e) => return e.into_response(),
    };
    ws.on_upgrade(move |socket| handle_ws(socket, state, filter))
}

/// Handle an individual WebSocket connection
async fn handle_ws(socket: WebSocket, state: SwaproState, filter: EventFilter) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut event_rx = state.store.bus().stream();

    // Ping interval (30s)
    let mut ping_interval = interval(Duration::from_secs(30));
    // Skip the first immediate tick
    ping_interval.tick().await;

    debug!(filter = ?filter, "WebSocket events client connected");

    loop {
        tokio::select! {
            result = event_rx.recv() => {
                match result {
                    Ok(event) => {
                        if !filter.matches(&event) {
                            continue;
                        }
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                                    debug!("WebSocket send failed, client disconnected");
                                    break;
                                }
                            }
                            Err(e) => warn!("Failed to serialize SyncEvent: {}", e),
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(skipped = n, "WebSocket client lagged, skipping events");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Event bus closed, shutting down WebSocket");
                        break;
                    }
                }
            }

            // Send periodic pings to detect dead clients
            _ = ping_interval.tick() => {
                if ws_sender.send(Message::Ping(vec![].into())).await.is_err() {
                    debug!("Ping failed, client disconnected");
                    break;
                }
            }

            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {}", e);
                        break;
                    }
                    // Pongs and client text are ignored
                    _ => {}
                }
            }
        }
    }

    debug!("WebSocket connection closed");
}
