//! Mock generator for testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::GeneratorError;
use crate::generator::{GenerationRequest, TextGenerator};
use crate::response::GenerationResponse;

type Responder = dyn Fn(&GenerationRequest) -> Result<String, GeneratorError> + Send + Sync;

/// Scriptable generator that records every request it receives.
///
/// Useful for testing without a running model. Responses go through
/// [`GenerationResponse::from_backend_text`] like a real backend's would.
pub struct MockGenerator {
    responder: Arc<Responder>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    /// Create a mock answering with `responder`.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<String, GeneratorError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same text.
    pub fn fixed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Answer with each text in turn, repeating the last one once the
    /// script runs out.
    pub fn scripted<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue: VecDeque<String> = texts.into_iter().map(Into::into).collect();
        let script = Mutex::new(queue);
        Self::new(move |_| {
            let mut script = script
                .lock()
                .map_err(|_| GeneratorError::ApiError("mock script poisoned".to_string()))?;
            let next = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            };
            Ok(next.unwrap_or_default())
        })
    }

    /// Fail every call with an API error.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(GeneratorError::ApiError(message.clone())))
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.iter().map(|req| req.prompt.clone()).collect())
            .unwrap_or_default()
    }

    /// Full requests received, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::fixed("mock answer")
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GeneratorError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let text = (self.responder)(&request)?;
        Ok(GenerationResponse::from_backend_text(text))
    }
}
