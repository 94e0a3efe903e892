//! Decoding of the Engine API event feed.
//!
//! `GET /events` streams one JSON object per line for as long as the
//! connection stays open. Long silences between lines are normal.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;

use swarm_registrator_core::{EventKind, LifecycleEvent, ServiceId, ServiceName};

use crate::error::{OrchestratorError, Result};
use crate::EventStream;

/// Event type Docker uses for Swarm services.
pub const SERVICE_EVENT_TYPE: &str = "service";

/// Longest feed line accepted, in bytes, excluding the newline.
pub const MAX_LINE_BYTES: usize = 1 << 20;

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "Type", default)]
    event_type: String,
    #[serde(rename = "Action", default)]
    action: String,
    #[serde(rename = "Actor", default)]
    actor: RawActor,
    #[serde(default)]
    time: Option<i64>,
    #[serde(rename = "timeNano", default)]
    time_nano: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawActor {
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(rename = "Attributes", default)]
    attributes: HashMap<String, String>,
}

impl RawEvent {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        match (self.time_nano, self.time) {
            (Some(nanos), _) => {
                let secs = nanos.div_euclid(1_000_000_000);
                let subsec = u32::try_from(nanos.rem_euclid(1_000_000_000)).ok()?;
                DateTime::from_timestamp(secs, subsec)
            }
            (None, Some(secs)) => DateTime::from_timestamp(secs, 0),
            (None, None) => None,
        }
    }
}

/// Decode one line of the event feed.
///
/// Events whose `Type` is not `service`, and service events with an action
/// other than `create`, `update` or `remove`, decode to [`EventKind::Other`].
///
/// # Errors
///
/// Returns `OrchestratorError::EventDecode` if the line is not a JSON event,
/// or if a service lifecycle event lacks a usable actor ID or name.
pub fn decode_event(line: &str) -> Result<LifecycleEvent> {
    let raw: RawEvent = serde_json::from_str(line)
        .map_err(|e| OrchestratorError::EventDecode(format!("invalid JSON: {e}")))?;

    let time = raw.timestamp();
    let service_name = ServiceName::new(raw.actor.attributes.get("name").cloned().unwrap_or_default());
    let service_id = ServiceId::new(raw.actor.id);

    let kind = if raw.event_type == SERVICE_EVENT_TYPE {
        EventKind::from_action(&raw.action)
    } else {
        EventKind::Other
    };

    if kind != EventKind::Other {
        service_id.validate().map_err(|e| {
            OrchestratorError::EventDecode(format!("{} event: {e}", raw.action))
        })?;
        service_name.validate().map_err(|e| {
            OrchestratorError::EventDecode(format!(
                "{} event for {service_id}: {e}",
                raw.action
            ))
        })?;
    }

    Ok(LifecycleEvent {
        kind,
        service_id,
        service_name,
        time,
    })
}

fn decode_line(line: &[u8]) -> Result<LifecycleEvent> {
    let text = std::str::from_utf8(line)
        .map_err(|e| OrchestratorError::EventDecode(format!("invalid UTF-8: {e}")))?;
    decode_event(text.trim())
}

fn oversized_line() -> OrchestratorError {
    OrchestratorError::EventDecode(format!("line longer than {MAX_LINE_BYTES} bytes"))
}

struct LineState<B> {
    chunks: BoxStream<'static, Result<B>>,
    buffer: Vec<u8>,
    decoded: VecDeque<Result<LifecycleEvent>>,
    // Set while dropping the rest of an oversized line.
    discarding: bool,
    done: bool,
}

impl<B> LineState<B> {
    fn split_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.discarding {
                self.discarding = false;
            } else {
                self.push_line(&line);
            }
        }

        if self.buffer.len() > MAX_LINE_BYTES {
            self.buffer.clear();
            if !self.discarding {
                self.discarding = true;
                self.decoded.push_back(Err(oversized_line()));
            }
        }
    }

    fn push_line(&mut self, line: &[u8]) {
        if line.iter().all(u8::is_ascii_whitespace) {
            return;
        }
        let content = line.strip_suffix(b"\n").unwrap_or(line);
        if content.len() > MAX_LINE_BYTES {
            self.decoded.push_back(Err(oversized_line()));
        } else {
            self.decoded.push_back(decode_line(content));
        }
    }

    fn finish(&mut self) {
        self.done = true;
        let rest = std::mem::take(&mut self.buffer);
        if !self.discarding {
            self.push_line(&rest);
        }
    }
}

/// Turn a stream of raw body chunks into a stream of decoded events.
///
/// Chunk boundaries need not align with lines. A decode failure is yielded
/// for that line only and decoding continues; a transport error is yielded
/// and ends the stream. A line longer than [`MAX_LINE_BYTES`] yields one
/// decode failure and is dropped without being buffered whole.
pub fn decode_lines<S, B>(chunks: S) -> EventStream
where
    S: futures::Stream<Item = Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = LineState {
        chunks: chunks.boxed(),
        buffer: Vec::new(),
        decoded: VecDeque::new(),
        discarding: false,
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.decoded.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }

            match state.chunks.next().await {
                Some(Ok(chunk)) => {
                    state.buffer.extend_from_slice(chunk.as_ref());
                    state.split_lines();
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
                None => state.finish(),
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATE: &str = r#"{"Type":"service","Action":"create","Actor":{"ID":"qz1m8w3l","Attributes":{"name":"web"}},"scope":"swarm","time":1700000000,"timeNano":1700000000500000000}"#;
    const CONTAINER: &str = r#"{"status":"start","id":"4f2a","Type":"container","Action":"start","Actor":{"ID":"4f2a","Attributes":{"name":"/nginx","image":"nginx"}},"time":1700000001}"#;

    #[test]
    fn decode_service_create() {
        let event = decode_event(CREATE).unwrap();
        assert_eq!(event.kind, EventKind::ServiceCreated);
        assert_eq!(event.service_id.as_str(), "qz1m8w3l");
        assert_eq!(event.service_name.as_str(), "web");

        let time = event.time.unwrap();
        assert_eq!(time.timestamp(), 1_700_000_000);
        assert_eq!(time.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn decode_update_and_remove() {
        let update = decode_event(
            r#"{"Type":"service","Action":"update","Actor":{"ID":"a1","Attributes":{"name":"api","updatestate.new":"updating"}}}"#,
        )
        .unwrap();
        assert_eq!(update.kind, EventKind::ServiceUpdated);
        assert!(update.time.is_none());

        let remove = decode_event(
            r#"{"Type":"service","Action":"remove","Actor":{"ID":"a1","Attributes":{"name":"api"}},"time":1700000002}"#,
        )
        .unwrap();
        assert_eq!(remove.kind, EventKind::ServiceRemoved);
        assert_eq!(remove.time.unwrap().timestamp(), 1_700_000_002);
    }

    #[test]
    fn non_service_events_are_other() {
        let event = decode_event(CONTAINER).unwrap();
        assert_eq!(event.kind, EventKind::Other);
    }

    #[test]
    fn unknown_service_action_is_other() {
        let event = decode_event(r#"{"Type":"service","Action":"scale","Actor":{}}"#).unwrap();
        assert_eq!(event.kind, EventKind::Other);
    }

    #[test]
    fn service_event_without_name_is_malformed() {
        let err = decode_event(r#"{"Type":"service","Action":"create","Actor":{"ID":"a1"}}"#)
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::EventDecode(_)));

        let err = decode_event(
            r#"{"Type":"service","Action":"remove","Actor":{"Attributes":{"name":"api"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, OrchestratorError::EventDecode(_)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            decode_event("not json"),
            Err(OrchestratorError::EventDecode(_))
        ));
    }

    #[tokio::test]
    async fn lines_split_across_chunks() {
        let (head, tail) = CREATE.split_at(40);
        let chunks: Vec<Result<Vec<u8>>> = vec![
            Ok(head.as_bytes().to_vec()),
            Ok(format!("{tail}\n\n{CONTAINER}").into_bytes()),
            Ok(b"\n{broken\n".to_vec()),
        ];

        let events: Vec<_> = decode_lines(stream::iter(chunks)).collect().await;
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].as_ref().unwrap().kind, EventKind::ServiceCreated);
        assert_eq!(events[1].as_ref().unwrap().kind, EventKind::Other);
        assert!(matches!(events[2], Err(OrchestratorError::EventDecode(_))));
    }

    #[tokio::test]
    async fn transport_error_ends_stream() {
        let chunks: Vec<Result<Vec<u8>>> = vec![
            Ok(format!("{CREATE}\n").into_bytes()),
            Err(OrchestratorError::Transport("connection reset".into())),
            Ok(format!("{CREATE}\n").into_bytes()),
        ];

        let events: Vec<_> = decode_lines(stream::iter(chunks)).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(matches!(events[1], Err(OrchestratorError::Transport(_))));
    }

    #[tokio::test]
    async fn oversized_line_is_dropped_and_decoding_resumes() {
        let chunks: Vec<Result<Vec<u8>>> = vec![
            Ok(vec![b'x'; MAX_LINE_BYTES]),
            Ok(b"yyyy".to_vec()),
            Ok(b"zzzz\n".to_vec()),
            Ok(format!("{CREATE}\n").into_bytes()),
        ];

        let events: Vec<_> = decode_lines(stream::iter(chunks)).collect().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            Err(OrchestratorError::EventDecode(reason)) if reason.contains("longer than")
        ));
        assert_eq!(events[1].as_ref().unwrap().kind, EventKind::ServiceCreated);
    }

    #[tokio::test]
    async fn oversized_line_in_one_chunk_is_rejected() {
        let mut body = vec![b'x'; MAX_LINE_BYTES + 1];
        body.push(b'\n');
        body.extend_from_slice(CREATE.as_bytes());
        let chunks: Vec<Result<Vec<u8>>> = vec![Ok(body)];

        let events: Vec<_> = decode_lines(stream::iter(chunks)).collect().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Err(OrchestratorError::EventDecode(_))));
        assert_eq!(events[1].as_ref().unwrap().kind, EventKind::ServiceCreated);
    }
}
