use super::VisionModel;
use crate::submission::ImageSubmission;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Deterministic stand-in for the hosted model.
pub struct MockVisionClient {
    responses: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
    last_image: Arc<Mutex<Option<ImageSubmission>>>,
    should_fail: Arc<Mutex<bool>>,
    delay: Option<Duration>,
}

impl MockVisionClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            last_image: Arc::new(Mutex::new(None)),
            should_fail: Arc::new(Mutex::new(false)),
            delay: None,
        }
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(response.into());
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    /// Sleep before answering, for exercising deadlines.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_image(&self) -> Option<ImageSubmission> {
        self.last_image.lock().unwrap().clone()
    }

    /// Handle sharing this mock's counters, for inspecting a mock that has
    /// been moved into a service.
    pub fn handle(&self) -> MockVisionHandle {
        MockVisionHandle {
            call_count: Arc::clone(&self.call_count),
            last_image: Arc::clone(&self.last_image),
        }
    }
}

impl Default for MockVisionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct MockVisionHandle {
    call_count: Arc<Mutex<usize>>,
    last_image: Arc<Mutex<Option<ImageSubmission>>>,
}

impl MockVisionHandle {
    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_image(&self) -> Option<ImageSubmission> {
        self.last_image.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionModel for MockVisionClient {
    async fn generate(&self, _prompt: &str, image: &ImageSubmission) -> Result<String> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        *self.last_image.lock().unwrap() = Some(image.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if *self.should_fail.lock().unwrap() {
            return Err(Error::AiProvider("Mock failure".to_string()));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("I could not tell what this plant is.".to_string())
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}
