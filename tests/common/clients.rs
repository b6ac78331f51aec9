use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use rowloom::generation::{GenerationClient, GenerationError};

/// Client returning the same canned completion for every call, recording
/// the prompts it saw.
pub struct StaticClient {
    response: String,
    calls: Mutex<Vec<String>>,
}

impl StaticClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// JSON-object completion, the shape a well-behaved model produces.
    pub fn structured() -> Self {
        Self::new(r#"{"category": "Tools", "confidence": 0.9}"#)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn user_prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for StaticClient {
    async fn generate(
        &self,
        _model: &str,
        _system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(user_prompt.to_string());
        Ok(self.response.clone())
    }
}

/// Client that fails on a fixed set of call indices (0-based) and succeeds
/// otherwise. Used to exercise per-item failure isolation.
pub struct FlakyClient {
    failing_calls: Vec<usize>,
    seen: AtomicUsize,
}

impl FlakyClient {
    pub fn failing_on(failing_calls: Vec<usize>) -> Self {
        Self {
            failing_calls,
            seen: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GenerationClient for FlakyClient {
    async fn generate(
        &self,
        _model: &str,
        _system_prompt: &str,
        _user_prompt: &str,
    ) -> Result<String, GenerationError> {
        let index = self.seen.fetch_add(1, Ordering::SeqCst);
        if self.failing_calls.contains(&index) {
            Err(GenerationError::EmptyResponse)
        } else {
            Ok(r#"{"status": "ok"}"#.to_string())
        }
    }
}
