//! Recording in-memory backend.

use super::{Backend, BackendError, BackendResult, BinaryResponse};
use crate::BoxFuture;
use crate::sync::CanvasPayload;
use crate::tools::{Tool, ToolForm};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A request the backend received.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    SaveCanvas {
        session_id: String,
        page_index: usize,
        payload: CanvasPayload,
    },
    Download {
        session_id: String,
    },
    Tool {
        tool: Tool,
        form: ToolForm,
    },
}

/// In-memory backend that records every request.
///
/// Requests can be made to fail and to suspend for a number of polls before
/// answering, which lets callers observe ordering across awaits.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: RefCell<Vec<BackendCall>>,
    trace: RefCell<Vec<String>>,
    fail_saves: Cell<bool>,
    fail_downloads: Cell<bool>,
    latency_polls: Cell<usize>,
    document: RefCell<BinaryResponse>,
    tool_response: RefCell<BinaryResponse>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer downloads with this body and headers.
    pub fn with_document(self, response: BinaryResponse) -> Self {
        self.document.replace(response);
        self
    }

    /// Answer tool requests with this body and headers.
    pub fn with_tool_response(self, response: BinaryResponse) -> Self {
        self.tool_response.replace(response);
        self
    }

    /// Suspend every request for `polls` polls before answering.
    pub fn with_latency(self, polls: usize) -> Self {
        self.latency_polls.set(polls);
        self
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    pub fn set_fail_downloads(&self, fail: bool) {
        self.fail_downloads.set(fail);
    }

    /// All requests received so far, in arrival order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.borrow().clone()
    }

    /// `"<request>:begin"` / `"<request>:end"` markers in the order they happened.
    pub fn trace(&self) -> Vec<String> {
        self.trace.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, BackendCall::SaveCanvas { .. }))
            .count()
    }

    fn begin(&self, label: &str, call: BackendCall) {
        self.trace.borrow_mut().push(format!("{}:begin", label));
        self.calls.borrow_mut().push(call);
    }

    fn end(&self, label: &str) {
        self.trace.borrow_mut().push(format!("{}:end", label));
    }

    async fn wait(&self) {
        for _ in 0..self.latency_polls.get() {
            YieldNow(false).await;
        }
    }
}

/// Yields to the executor once.
struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

impl Backend for RecordingBackend {
    fn save_page_canvas<'a>(
        &'a self,
        session_id: &'a str,
        page_index: usize,
        payload: &'a CanvasPayload,
    ) -> BoxFuture<'a, BackendResult<()>> {
        Box::pin(async move {
            self.begin(
                "save",
                BackendCall::SaveCanvas {
                    session_id: session_id.to_string(),
                    page_index,
                    payload: payload.clone(),
                },
            );
            self.wait().await;
            self.end("save");

            if self.fail_saves.get() {
                return Err(BackendError::Status {
                    status: 500,
                    message: "save rejected".to_string(),
                });
            }
            Ok(())
        })
    }

    fn download_document<'a>(
        &'a self,
        session_id: &'a str,
    ) -> BoxFuture<'a, BackendResult<BinaryResponse>> {
        Box::pin(async move {
            self.begin(
                "download",
                BackendCall::Download {
                    session_id: session_id.to_string(),
                },
            );
            self.wait().await;
            self.end("download");

            if self.fail_downloads.get() {
                return Err(BackendError::Status {
                    status: 404,
                    message: "document not found".to_string(),
                });
            }
            Ok(self.document.borrow().clone())
        })
    }

    fn run_tool<'a>(
        &'a self,
        tool: Tool,
        form: ToolForm,
    ) -> BoxFuture<'a, BackendResult<BinaryResponse>> {
        Box::pin(async move {
            self.begin(tool.endpoint(), BackendCall::Tool { tool, form });
            self.wait().await;
            self.end(tool.endpoint());
            Ok(self.tool_response.borrow().clone())
        })
    }
}
