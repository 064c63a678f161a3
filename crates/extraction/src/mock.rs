//! Canned model client for tests and offline runs

use crate::{ExtractionError, ExtractionSchema, LlmClient, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

enum Reply {
    Text(String),
    Fail(fn() -> ExtractionError),
}

/// Mock LLM client - returns a configurable response and counts calls.
///
/// Replies queued with [`MockLlmClient::then`] are consumed in order; once the
/// queue is empty the default reply is repeated.
pub struct MockLlmClient {
    default: Reply,
    queued: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self::with_reply(Reply::Text(response.to_string()))
    }

    /// A client whose every call fails with the error built by `make_error`
    pub fn failing(make_error: fn() -> ExtractionError) -> Self {
        Self::with_reply(Reply::Fail(make_error))
    }

    fn with_reply(default: Reply) -> Self {
        Self {
            default,
            queued: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a one-shot text reply ahead of the default
    pub fn then(self, response: &str) -> Self {
        self.push(Reply::Text(response.to_string()))
    }

    /// Queue a one-shot failure ahead of the default
    pub fn then_fail(self, make_error: fn() -> ExtractionError) -> Self {
        self.push(Reply::Fail(make_error))
    }

    fn push(self, reply: Reply) -> Self {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(reply);
        }
        self
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl LlmClient for MockLlmClient {
    fn generate_structured(&self, prompt: &str, _schema: &ExtractionSchema) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let next = self.queued.lock().ok().and_then(|mut q| q.pop_front());
        match next.as_ref().unwrap_or(&self.default) {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(make_error) => Err(make_error()),
        }
    }
}
