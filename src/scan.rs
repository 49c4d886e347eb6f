//! Early-exit stream scanning.
//!
//! [`scan`] walks a possibly unbounded frame stream one frame at a time,
//! running the engine and the boolean reducer on each, and stops at the
//! first positive frame. Execution is single-threaded and blocking; the
//! only suspension points are the engine call and the source fetch.
//! Cancellation is cooperative: a shared flag polled once per frame
//! iteration, typically wired to Ctrl-C.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::decision::{evaluate, ClassFilter};
use crate::detect::DetectionEngine;
use crate::ingest::FrameSource;

/// Shared cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token flipped by SIGINT. Install once per process.
    pub fn install_ctrlc() -> Result<Self> {
        let token = Self::new();
        let flag = token.flag.clone();
        ctrlc::set_handler(move || {
            log::info!("interrupt received, stopping scan");
            flag.store(true, Ordering::SeqCst);
        })
        .context("failed to install interrupt handler")?;
        Ok(token)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Scan a frame stream for trash.
///
/// Returns `Ok(true)` on the first qualifying frame without fetching or
/// inferring any further frames. Returns `Ok(false)` when the stream ends
/// or the token is cancelled first; a positive found before cancellation
/// still wins, because it returns immediately.
pub fn scan<S, E>(
    source: &mut S,
    engine: &mut E,
    filter: &ClassFilter,
    threshold: f32,
    cancel: &CancelToken,
) -> Result<bool>
where
    S: FrameSource + ?Sized,
    E: DetectionEngine + ?Sized,
{
    loop {
        if cancel.is_cancelled() {
            return Ok(false);
        }
        let Some(frame) = source.next_frame()? else {
            return Ok(false);
        };
        let detections = engine.infer(&frame)?;
        if evaluate(&detections, filter, threshold) {
            log::info!("trash detected on frame {}", frame.index);
            return Ok(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Detection, StubEngine};
    use crate::frame::Frame;

    /// Counting source: serves a fixed number of identical frames.
    struct CountingSource {
        remaining: usize,
        served: usize,
    }

    impl CountingSource {
        fn new(frames: usize) -> Self {
            Self {
                remaining: frames,
                served: 0,
            }
        }
    }

    impl FrameSource for CountingSource {
        fn connect(&mut self) -> Result<()> {
            Ok(())
        }

        fn next_frame(&mut self) -> Result<Option<Frame>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            self.served += 1;
            Ok(Some(Frame::new(vec![0u8; 12], 2, 2, self.served as u64)?))
        }
    }

    fn positive() -> Vec<Detection> {
        vec![Detection {
            class_name: "trash".to_string(),
            confidence: 0.9,
            bbox: [0.0, 0.0, 5.0, 5.0],
        }]
    }

    #[test]
    fn scan_stops_at_first_positive_frame() -> Result<()> {
        let mut source = CountingSource::new(3);
        // Frame 1: nothing. Frame 2: positive. Frame 3 must never be evaluated.
        let mut engine = StubEngine::scripted(vec![vec![], positive(), positive()]);

        let found = scan(
            &mut source,
            &mut engine,
            &ClassFilter::everything(),
            0.4,
            &CancelToken::new(),
        )?;

        assert!(found);
        assert_eq!(engine.infer_calls(), 2);
        assert_eq!(source.served, 2);
        Ok(())
    }

    #[test]
    fn scan_returns_false_on_exhaustion() -> Result<()> {
        let mut source = CountingSource::new(4);
        let mut engine = StubEngine::empty();

        let found = scan(
            &mut source,
            &mut engine,
            &ClassFilter::everything(),
            0.4,
            &CancelToken::new(),
        )?;

        assert!(!found);
        assert_eq!(engine.infer_calls(), 4);
        Ok(())
    }

    #[test]
    fn cancelled_scan_returns_false_without_inference() -> Result<()> {
        let mut source = CountingSource::new(10);
        let mut engine = StubEngine::scripted(vec![positive()]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let found = scan(
            &mut source,
            &mut engine,
            &ClassFilter::everything(),
            0.4,
            &cancel,
        )?;

        assert!(!found);
        assert_eq!(engine.infer_calls(), 0);
        assert_eq!(source.served, 0);
        Ok(())
    }

    #[test]
    fn scan_respects_class_filter() -> Result<()> {
        let mut source = CountingSource::new(2);
        let mut engine = StubEngine::scripted(vec![
            vec![Detection {
                class_name: "person".to_string(),
                confidence: 0.99,
                bbox: [0.0, 0.0, 5.0, 5.0],
            }],
            vec![],
        ]);
        let filter = ClassFilter::new(vec!["bottle".to_string()]);

        let found = scan(&mut source, &mut engine, &filter, 0.4, &CancelToken::new())?;

        assert!(!found);
        assert_eq!(engine.infer_calls(), 2);
        Ok(())
    }
}
