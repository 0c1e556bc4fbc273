// Persistent push stream from the MCP endpoint
//
// A background task owns the HTTP connection; the caller owns the handle and
// ends the stream with close() or by dropping it.

use futures::stream::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::ClientError;
use super::sse::SseDecoder;

/// Receives every JSON message pushed by the server
pub type MessageCallback = Box<dyn FnMut(Value) + Send + 'static>;

/// Receives transport faults on the stream
pub type ErrorCallback = Box<dyn FnMut(ClientError) + Send + 'static>;

/// Handle to an open signal stream
pub struct SignalStream {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SignalStream {
    /// Start streaming in the background. Must be called inside a tokio runtime.
    pub(crate) fn spawn(
        request: reqwest::RequestBuilder,
        on_message: MessageCallback,
        on_error: Option<ErrorCallback>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Signal stream cancelled");
                }
                _ = run_stream(request, on_message, on_error) => {}
            }
        });

        Self {
            cancel,
            task: Some(task),
        }
    }

    /// Terminate the stream and release its connection. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            self.cancel.cancel();
            task.abort();
            debug!("Signal stream closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_none()
    }

    /// True once the server ended the stream or a transport fault stopped it
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }
}

impl Drop for SignalStream {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_stream(
    request: reqwest::RequestBuilder,
    mut on_message: MessageCallback,
    mut on_error: Option<ErrorCallback>,
) {
    let mut report = |err: ClientError| match on_error.as_mut() {
        Some(callback) => callback(err),
        None => debug!(error = %err, "Signal stream fault (no error handler)"),
    };

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            report(e.into());
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        report(ClientError::transport(
            Some(status.as_u16()),
            format!("signal stream rejected with status {}", status),
        ));
        return;
    }

    debug!("Signal stream connected");

    let mut decoder = SseDecoder::new();
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                for data in decoder.push(&bytes) {
                    deliver(&mut on_message, &data);
                }
            }
            Err(e) => {
                report(e.into());
                return;
            }
        }
    }

    if let Some(data) = decoder.finish() {
        deliver(&mut on_message, &data);
    }

    debug!("Signal stream ended by server");
}

fn deliver(on_message: &mut MessageCallback, data: &str) {
    match serde_json::from_str::<Value>(data) {
        Ok(message) => on_message(message),
        Err(e) => warn!(error = %e, "Dropping unparsable signal stream message"),
    }
}
