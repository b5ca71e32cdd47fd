//! Per-task event stream consumption.
//!
//! A [`StreamClient`] owns the live connection for one task. Each inbound
//! frame is decoded on its own and dispatched to a [`StreamHandler`]; a bad
//! frame is reported but does not end the stream, while a transport failure
//! or the result event does.

use futures_util::StreamExt;
use tracing::{debug, info, trace, warn};

use nexus_core::{CoreError, StreamEvent, TaskId};

use crate::error::ClientError;
use crate::orchestrator::FrameStream;

/// Callbacks for decoded stream traffic.
pub trait StreamHandler {
    /// Progress line received.
    fn on_log(&mut self, message: String);

    /// Final report received. The client closes right after this returns.
    fn on_result(&mut self, result: String);

    /// A frame was malformed ([`ClientError::MalformedEvent`]) or the
    /// connection failed. For anything but a malformed frame the client is
    /// already closed when this is called.
    fn on_error(&mut self, error: ClientError);
}

/// Whether the stream can deliver more events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFlow {
    Open,
    Closed,
}

/// Live event stream for one task.
pub struct StreamClient {
    task_id: TaskId,
    frames: Option<FrameStream>,
    max_consecutive_malformed: u32,
    malformed_streak: u32,
    frames_received: u64,
}

impl StreamClient {
    /// Wrap an opened connection.
    pub fn open(task_id: TaskId, frames: FrameStream, max_consecutive_malformed: u32) -> Self {
        debug!(task_id = %task_id, "Event stream opened");
        Self {
            task_id,
            frames: Some(frames),
            max_consecutive_malformed,
            malformed_streak: 0,
            frames_received: 0,
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn is_closed(&self) -> bool {
        self.frames.is_none()
    }

    /// Number of frames read so far.
    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Wait for the next frame and dispatch it.
    ///
    /// Returns [`StreamFlow::Closed`] once the client is closed; closed
    /// clients return immediately without touching the handler.
    pub async fn pump<H>(&mut self, handler: &mut H) -> StreamFlow
    where
        H: StreamHandler + ?Sized,
    {
        let Some(frames) = self.frames.as_mut() else {
            return StreamFlow::Closed;
        };

        let next = frames.next().await;
        match next {
            Some(Ok(raw)) => self.dispatch(&raw, handler),
            Some(Err(e)) => {
                warn!(task_id = %self.task_id, error = %e, "Event stream failed");
                self.close();
                handler.on_error(e);
            }
            None => {
                warn!(
                    task_id = %self.task_id,
                    frames = self.frames_received,
                    "Event stream ended before a result"
                );
                self.close();
                handler.on_error(ClientError::Transport(
                    "stream ended before a result was delivered".to_string(),
                ));
            }
        }

        if self.is_closed() {
            StreamFlow::Closed
        } else {
            StreamFlow::Open
        }
    }

    /// Drop the connection. Safe to call any number of times.
    pub fn close(&mut self) {
        if self.frames.take().is_some() {
            debug!(
                task_id = %self.task_id,
                frames = self.frames_received,
                "Event stream closed"
            );
        }
    }

    fn dispatch<H>(&mut self, raw: &str, handler: &mut H)
    where
        H: StreamHandler + ?Sized,
    {
        self.frames_received += 1;
        trace!(task_id = %self.task_id, raw = %raw, "Stream frame");

        let event = match StreamEvent::decode(raw) {
            Ok(event) => event,
            Err(e) => {
                self.malformed(raw, e, handler);
                return;
            }
        };
        self.malformed_streak = 0;

        match event {
            Some(StreamEvent::Log { message }) => handler.on_log(message),
            Some(StreamEvent::Result { result }) => {
                info!(
                    task_id = %self.task_id,
                    frames = self.frames_received,
                    "Result received"
                );
                handler.on_result(result);
                self.close();
            }
            None => {
                debug!(task_id = %self.task_id, "Ignoring event with unknown status");
            }
        }
    }

    fn malformed<H>(&mut self, raw: &str, error: CoreError, handler: &mut H)
    where
        H: StreamHandler + ?Sized,
    {
        self.malformed_streak += 1;
        let preview: String = raw.chars().take(200).collect();
        warn!(
            task_id = %self.task_id,
            error = %error,
            preview = %preview,
            streak = self.malformed_streak,
            "Failed to decode stream event"
        );

        if self.max_consecutive_malformed > 0
            && self.malformed_streak >= self.max_consecutive_malformed
        {
            self.close();
            handler.on_error(ClientError::Transport(format!(
                "{} consecutive malformed events",
                self.malformed_streak
            )));
            return;
        }

        let detail = match error {
            CoreError::MalformedEvent(detail) => detail,
            other => other.to_string(),
        };
        handler.on_error(ClientError::MalformedEvent(detail));
    }
}
