//! Recognition orchestration.
//!
//! One engine instance serves the whole process: lazily initialized on first
//! use, reused afterwards, and never invoked concurrently. At-most-one-
//! in-flight is enforced structurally by keeping the engine behind a mutex
//! and treating `try_lock` failure as the busy signal, instead of a boolean
//! flag threaded through callbacks.

use std::sync::{Mutex, TryLockError};

use serde::Serialize;

use crate::image::OwnedImage;
use crate::ocr::{Engine, EngineError};
use crate::preprocess::{preprocess, Preprocess};
use crate::region::Region;

/// Sentinel text recorded for a region whose OCR invocation failed.
pub const RECOGNITION_FAILED: &str = "[인식 실패]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Loading,
    Processing,
    Recognizing,
    Done,
}

/// Progress event delivered synchronously between recognition steps.
///
/// Handlers run on the calling thread and must not block; the loop resumes
/// as soon as they return.
#[derive(Debug, Clone)]
pub struct Progress {
    pub status: Status,
    pub text: String,
    pub progress: f32,
}

/// Unprocessed OCR output for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecognition {
    pub region_id: String,
    pub region_label: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RecognizeError {
    /// Another recognition call is in flight. Nothing was changed.
    #[error("recognition already in progress")]
    Busy,

    /// The caller supplied no regions; surfaced before any work begins.
    #[error("no regions to recognize")]
    NoRegions,

    /// Engine initialization failed; no region was processed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

struct EngineState<E> {
    engine: E,
    initialized: bool,
}

/// Sequences preprocess → OCR across a region snapshot.
pub struct Recognizer<E> {
    engine: Mutex<EngineState<E>>,
    preprocess: Preprocess,
}

impl<E: Engine> Recognizer<E> {
    pub fn new(engine: E, preprocess: Preprocess) -> Self {
        Self {
            engine: Mutex::new(EngineState {
                engine,
                initialized: false,
            }),
            preprocess,
        }
    }

    /// Whether a recognition call is currently in flight.
    pub fn in_flight(&self) -> bool {
        matches!(self.engine.try_lock(), Err(TryLockError::WouldBlock))
    }

    /// Recognize every region of `image`, in order.
    ///
    /// Engine failures on individual regions are absorbed: the region gets
    /// [`RECOGNITION_FAILED`] as its text and the batch keeps going. Only
    /// structural preconditions and engine initialization fail the call as a
    /// whole.
    pub fn recognize(
        &self,
        image: &OwnedImage,
        regions: &[Region],
        on_progress: &mut dyn FnMut(Progress),
    ) -> Result<Vec<RawRecognition>, RecognizeError> {
        let mut state = match self.engine.try_lock() {
            Ok(state) => state,
            Err(TryLockError::WouldBlock) => return Err(RecognizeError::Busy),
            // The engine keeps no per-call state, so a lock poisoned by a
            // panicked run is still usable.
            Err(TryLockError::Poisoned(err)) => err.into_inner(),
        };

        if regions.is_empty() {
            return Err(RecognizeError::NoRegions);
        }

        if !state.initialized {
            state.engine.initialize(on_progress)?;
            state.initialized = true;
        }

        let total = regions.len();
        let mut results = Vec::with_capacity(total);

        for (i, region) in regions.iter().enumerate() {
            on_progress(Progress {
                status: Status::Processing,
                text: format!("영역 \"{}\" 인식 중 ({}/{})", region.label, i + 1, total),
                progress: i as f32 / total as f32,
            });

            let buffer = preprocess(image, region, &self.preprocess);

            let fraction = (i as f32 + 0.5) / total as f32;
            on_progress(Progress {
                status: Status::Recognizing,
                text: format!("OCR 인식 중... {}%", (fraction * 100.0).round()),
                progress: fraction,
            });

            let text = match state.engine.recognize(buffer.as_image(), region.mode) {
                Ok(text) => text.trim().to_string(),
                Err(err) => {
                    tracing::warn!(region = %region.label, error = %err, "region recognition failed");
                    RECOGNITION_FAILED.to_string()
                }
            };
            tracing::debug!(region = %region.label, raw = %text, "raw recognition");

            results.push(RawRecognition {
                region_id: region.id.clone(),
                region_label: region.label.clone(),
                text,
            });
        }

        on_progress(Progress {
            status: Status::Done,
            text: "완료".to_string(),
            progress: 1.0,
        });

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{Receiver, Sender};
    use std::sync::Arc;

    use super::*;
    use crate::image::{Color, OwnedImage};
    use crate::ocr::RecognitionMode;

    fn region(id: &str, label: &str) -> Region {
        Region {
            id: id.to_string(),
            label: label.to_string(),
            nx: 0.0,
            ny: 0.0,
            nw: 1.0,
            nh: 1.0,
            mode: RecognitionMode::Block,
        }
    }

    fn blank_image() -> OwnedImage {
        OwnedImage::filled(64, 64, Color::WHITE)
    }

    /// Engine returning a fixed script of results, with failure injection.
    struct ScriptedEngine {
        responses: Vec<Result<String, ()>>,
        call: usize,
        init_failures: usize,
        init_count: Arc<AtomicUsize>,
    }

    impl ScriptedEngine {
        fn new(responses: Vec<Result<String, ()>>) -> Self {
            Self {
                responses,
                call: 0,
                init_failures: 0,
                init_count: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Engine for ScriptedEngine {
        fn initialize(&mut self, report: &mut dyn FnMut(Progress)) -> Result<(), EngineError> {
            report(Progress {
                status: Status::Loading,
                text: "loading".into(),
                progress: 0.0,
            });
            if self.init_failures > 0 {
                self.init_failures -= 1;
                return Err(EngineError::Init(anyhow::anyhow!("models missing")));
            }
            self.init_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn recognize(
            &mut self,
            _image: crate::image::Image<'_>,
            _mode: RecognitionMode,
        ) -> Result<String, EngineError> {
            let response = self.responses[self.call % self.responses.len()].clone();
            self.call += 1;
            response.map_err(|_| EngineError::Recognize(anyhow::anyhow!("ocr failed")))
        }
    }

    #[test]
    fn empty_region_set_is_rejected_before_init() {
        let engine = ScriptedEngine::new(vec![Ok("x".into())]);
        let inits = engine.init_count.clone();
        let recognizer = Recognizer::new(engine, Preprocess::per_region());

        let err = recognizer
            .recognize(&blank_image(), &[], &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, RecognizeError::NoRegions));
        assert_eq!(inits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn region_failure_records_sentinel_and_continues() {
        let engine = ScriptedEngine::new(vec![
            Ok("격파쇄 Lv +2".into()),
            Err(()),
            Ok("타격쇄 Lv +3".into()),
        ]);
        let recognizer = Recognizer::new(engine, Preprocess::per_region());
        let regions = [region("r_1", "a"), region("r_2", "b"), region("r_3", "c")];

        let mut events = Vec::new();
        let results = recognizer
            .recognize(&blank_image(), &regions, &mut |p| events.push(p))
            .expect("batch must survive a single bad region");

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].text, "격파쇄 Lv +2");
        assert_eq!(results[1].text, RECOGNITION_FAILED);
        assert_eq!(results[1].region_id, "r_2");
        assert_eq!(results[2].text, "타격쇄 Lv +3");

        // Loading, then Processing/Recognizing per region, Done last.
        assert_eq!(events.first().map(|p| p.status), Some(Status::Loading));
        let processing: Vec<_> = events
            .iter()
            .filter(|p| p.status == Status::Processing)
            .collect();
        assert_eq!(processing.len(), 3);
        assert!(processing[0].text.contains("(1/3)"));
        assert!(processing[2].text.contains("(3/3)"));
        assert_eq!(
            events.iter().filter(|p| p.status == Status::Recognizing).count(),
            3
        );
        let done = events.last().expect("events");
        assert_eq!(done.status, Status::Done);
        assert_eq!(done.progress, 1.0);

        // Fractions never go backwards.
        for pair in events.windows(2) {
            assert!(pair[0].progress <= pair[1].progress);
        }
    }

    #[test]
    fn engine_initializes_once_across_calls() {
        let engine = ScriptedEngine::new(vec![Ok("x".into())]);
        let inits = engine.init_count.clone();
        let recognizer = Recognizer::new(engine, Preprocess::per_region());
        let regions = [region("r_1", "a")];

        for _ in 0..3 {
            recognizer
                .recognize(&blank_image(), &regions, &mut |_| {})
                .expect("recognize");
        }
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_init_is_fatal_but_retried_next_call() {
        let mut engine = ScriptedEngine::new(vec![Ok("x".into())]);
        engine.init_failures = 1;
        let inits = engine.init_count.clone();
        let recognizer = Recognizer::new(engine, Preprocess::per_region());
        let regions = [region("r_1", "a")];

        let err = recognizer
            .recognize(&blank_image(), &regions, &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, RecognizeError::Engine(EngineError::Init(_))));

        // The next call retries initialization and succeeds.
        let results = recognizer
            .recognize(&blank_image(), &regions, &mut |_| {})
            .expect("second call");
        assert_eq!(results.len(), 1);
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    /// Engine that parks inside `recognize` until released, so a second call
    /// can be attempted while the first is provably in flight.
    struct BlockingEngine {
        started: Sender<()>,
        release: Receiver<()>,
    }

    impl Engine for BlockingEngine {
        fn initialize(&mut self, _report: &mut dyn FnMut(Progress)) -> Result<(), EngineError> {
            Ok(())
        }

        fn recognize(
            &mut self,
            _image: crate::image::Image<'_>,
            _mode: RecognitionMode,
        ) -> Result<String, EngineError> {
            self.started.send(()).expect("test channel");
            self.release.recv().expect("test channel");
            Ok("블로킹 결과".into())
        }
    }

    #[test]
    fn second_call_while_busy_is_rejected_without_disturbing_the_first() {
        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let recognizer = Arc::new(Recognizer::new(
            BlockingEngine {
                started: started_tx,
                release: release_rx,
            },
            Preprocess::per_region(),
        ));

        let worker = {
            let recognizer = recognizer.clone();
            std::thread::spawn(move || {
                recognizer.recognize(&blank_image(), &[region("r_1", "a")], &mut |_| {})
            })
        };

        // Wait until the first call is inside the engine.
        started_rx.recv().expect("worker started");
        assert!(recognizer.in_flight());

        let err = recognizer
            .recognize(&blank_image(), &[region("r_2", "b")], &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, RecognizeError::Busy));

        release_tx.send(()).expect("release worker");
        let results = worker.join().expect("join").expect("first call result");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "블로킹 결과");
    }
}
