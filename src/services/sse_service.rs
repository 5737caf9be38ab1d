use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::debug;

use crate::{
    dto::sse::ServerEvent,
    state::{SharedState, SseHub},
};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Subscribe to the shared public SSE stream.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.public_sse().subscribe()
}

/// Events delivered to one subscriber. Lagging subscribers skip what they missed.
pub fn event_stream(receiver: broadcast::Receiver<ServerEvent>) -> impl Stream<Item = ServerEvent> {
    BroadcastStream::new(receiver).filter_map(|item| async move {
        match item {
            Ok(payload) => Some(payload),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                debug!(skipped, "public SSE subscriber lagged");
                None
            }
        }
    })
}

/// Wrap a hub subscription into an SSE response with periodic keep-alives.
pub fn to_sse_stream(
    receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = event_stream(receiver).map(|payload| {
        let event = Event::default().data(payload.data);
        Ok(match payload.event {
            Some(name) => event.event(name),
            None => event,
        })
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

/// Send a human-readable info message onto the public SSE stream.
pub fn broadcast_public_info(hub: &SseHub, message: &str) {
    hub.broadcast(ServerEvent::new(Some("info".into()), message.to_string()));
}
