use crate::answer::QuizAnswer;
use crate::backend::ModelBackend;
use crate::classify::{CallOutcome, FailureCategory, classify};
use crate::guard::InFlightGuard;
use crate::parse::parse_response;
use crate::request::build_chat_request;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// A screenshot already cropped, downscaled and encoded as a `data:` URL.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub data_url: String,
}

/// A validated answer plus how long the round trip took.
#[derive(Debug, Clone, PartialEq)]
pub struct Answered {
    pub answer: QuizAnswer,
    pub elapsed: Duration,
}

pub type CaptureResult = Result<Answered, FailureCategory>;

/// Model settings the pipeline needs for each request.
#[derive(Debug, Clone)]
pub struct RequestSettings {
    pub model: String,
    pub enable_reasoning: bool,
}

/// Runs captures against a backend, one at a time.
pub struct Pipeline<B: ModelBackend> {
    backend: Arc<B>,
    settings: RequestSettings,
    guard: InFlightGuard,
}

impl<B: ModelBackend + 'static> Pipeline<B> {
    pub fn new(backend: B, settings: RequestSettings) -> Self {
        Self {
            backend: Arc::new(backend),
            settings,
            guard: InFlightGuard::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Request, send, classify and parse on the calling thread.
    /// Doesn't touch the in-flight guard.
    pub fn run_once(&self, image: &ImagePayload) -> CaptureResult {
        run_capture(self.backend.as_ref(), &self.settings, image)
    }

    /// Start a capture on a worker thread. Returns `None` without doing
    /// anything if a capture is already in flight: triggers are dropped,
    /// not queued. `on_done` runs on the worker before the slot is freed.
    pub fn trigger<F>(&self, image: ImagePayload, on_done: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce(CaptureResult) + Send + 'static,
    {
        let Some(permit) = self.guard.try_acquire() else {
            warn!("previous capture still running; dropping trigger");
            return None;
        };

        let backend = Arc::clone(&self.backend);
        let settings = self.settings.clone();
        let handle = thread::spawn(move || {
            let _permit = permit;
            let result = catch_unwind(AssertUnwindSafe(|| {
                run_capture(backend.as_ref(), &settings, &image)
            }))
            .unwrap_or_else(|_| {
                error!("capture worker panicked");
                Err(FailureCategory::Generic)
            });
            on_done(result);
        });

        Some(handle)
    }
}

fn run_capture<B: ModelBackend + ?Sized>(
    backend: &B,
    settings: &RequestSettings,
    image: &ImagePayload,
) -> CaptureResult {
    let start = Instant::now();
    let request = build_chat_request(&settings.model, &image.data_url, settings.enable_reasoning);

    let outcome = classify(&backend.send(&request));
    let text = match outcome {
        CallOutcome::Success(text) => text,
        other => {
            let category = other.category().unwrap_or(FailureCategory::Generic);
            error!(?other, %category, "model call failed");
            return Err(category);
        }
    };

    let answer = parse_response(&text).map_err(|_| FailureCategory::Parse)?;
    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis() as u64,
        mode = %answer.mode(),
        confidence = answer.confidence,
        "capture answered"
    );
    Ok(Answered { answer, elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{Answer, Verdict};
    use crate::backend::RawResponse;
    use crate::request::ChatRequest;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::mpsc;

    /// Returns a fixed response and records the requests it saw.
    struct CannedBackend {
        response: RawResponse,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl CannedBackend {
        fn new(response: RawResponse) -> Self {
            Self {
                response,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn content(text: &str) -> Self {
            Self::new(RawResponse::Http {
                status: 200,
                body: Some(json!({"choices": [{"message": {"content": text}}]})),
            })
        }
    }

    impl ModelBackend for CannedBackend {
        fn send(&self, request: &ChatRequest) -> RawResponse {
            self.seen.lock().unwrap().push(request.clone());
            self.response.clone()
        }
    }

    /// Blocks until released, to hold a capture in flight.
    struct GatedBackend {
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl ModelBackend for GatedBackend {
        fn send(&self, _request: &ChatRequest) -> RawResponse {
            let _ = self.gate.lock().unwrap().recv();
            RawResponse::Timeout
        }
    }

    struct PanickingBackend;

    impl ModelBackend for PanickingBackend {
        fn send(&self, _request: &ChatRequest) -> RawResponse {
            panic!("transport misbehaved");
        }
    }

    fn settings() -> RequestSettings {
        RequestSettings {
            model: "test/model".to_string(),
            enable_reasoning: false,
        }
    }

    fn image() -> ImagePayload {
        ImagePayload {
            data_url: "data:image/png;base64,AAAA".to_string(),
        }
    }

    #[test]
    fn test_run_once_success() {
        let pipeline = Pipeline::new(
            CannedBackend::content(
                "```json\n{\"mode\":\"tf\",\"question\":\"Is the sky blue?\",\"answer_index\":0}\n```",
            ),
            settings(),
        );
        let answered = pipeline.run_once(&image()).unwrap();
        assert_eq!(answered.answer.confidence, 1.0);
        assert_eq!(
            answered.answer.answer,
            Answer::TrueFalse {
                choices: None,
                answer: Verdict::True,
            }
        );

        let seen = pipeline.backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "test/model");
    }

    #[test]
    fn test_run_once_failure_categories() {
        let cases = [
            (
                RawResponse::Http {
                    status: 401,
                    body: None,
                },
                FailureCategory::Auth,
            ),
            (
                RawResponse::Http {
                    status: 500,
                    body: None,
                },
                FailureCategory::NoResponse,
            ),
            (RawResponse::Timeout, FailureCategory::NoResponse),
            (
                RawResponse::Transport("dns".to_string()),
                FailureCategory::NoResponse,
            ),
            (
                RawResponse::Http {
                    status: 200,
                    body: Some(json!({"choices": []})),
                },
                FailureCategory::Parse,
            ),
        ];
        for (response, expected) in cases {
            let pipeline = Pipeline::new(CannedBackend::new(response), settings());
            assert_eq!(pipeline.run_once(&image()), Err(expected));
        }
    }

    #[test]
    fn test_invalid_answer_is_parse_failure() {
        let pipeline = Pipeline::new(
            CannedBackend::content(r#"{"mode":"tf","question":"Q","choices":["Yes","No"],"answer_index":0}"#),
            settings(),
        );
        assert_eq!(pipeline.run_once(&image()), Err(FailureCategory::Parse));
    }

    #[test]
    fn test_trigger_drops_while_in_flight() {
        let (release, gate) = mpsc::channel();
        let pipeline = Pipeline::new(
            GatedBackend {
                gate: Mutex::new(gate),
            },
            settings(),
        );

        let (done_tx, done_rx) = mpsc::channel();
        let handle = pipeline
            .trigger(image(), move |result| done_tx.send(result).unwrap())
            .expect("first trigger starts");
        assert!(pipeline.is_busy());
        assert!(pipeline.trigger(image(), |_| {}).is_none());

        release.send(()).unwrap();
        handle.join().unwrap();
        assert_eq!(done_rx.recv().unwrap(), Err(FailureCategory::NoResponse));
        assert!(!pipeline.is_busy());

        // Slot is free again.
        release.send(()).unwrap();
        let handle = pipeline.trigger(image(), |_| {}).expect("slot released");
        handle.join().unwrap();
    }

    #[test]
    fn test_worker_panic_maps_to_generic() {
        let pipeline = Pipeline::new(PanickingBackend, settings());
        let (tx, rx) = mpsc::channel();
        let handle = pipeline
            .trigger(image(), move |result| tx.send(result).unwrap())
            .unwrap();
        handle.join().unwrap();
        assert_eq!(rx.recv().unwrap(), Err(FailureCategory::Generic));
        assert!(!pipeline.is_busy());
    }
}
