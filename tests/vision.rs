//! Vision pipeline integration tests
//!
//! Tests the shared snapshot and the vision loop without camera hardware:
//! frame sources and detection engines are scripted at the trait seams.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, Instant};

use vigil_hud::vision::{
    BoundingBox, Detection, DetectionEngine, Frame, FrameSource, VisionState, VisionWorker,
};
use vigil_hud::{Error, Result};

mod common;

/// Frame whose first byte encodes the capture cycle
fn cycle_frame(cycle: u8) -> Frame {
    Frame::from_rgb8(4, 4, vec![cycle; 48]).unwrap()
}

/// Detection whose label encodes the capture cycle
fn cycle_detection(cycle: u8) -> Detection {
    Detection {
        label: format!("cycle-{cycle}"),
        confidence: 0.9,
        bounds: BoundingBox {
            x: 0,
            y: 0,
            width: 4,
            height: 4,
        },
    }
}

/// Source producing numbered frames, recording reads and release
struct CycleSource {
    cycle: u8,
    reads: Arc<AtomicU32>,
    closed: Arc<AtomicBool>,
}

impl CycleSource {
    fn new() -> (Self, Arc<AtomicU32>, Arc<AtomicBool>) {
        let reads = Arc::new(AtomicU32::new(0));
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                cycle: 0,
                reads: Arc::clone(&reads),
                closed: Arc::clone(&closed),
            },
            reads,
            closed,
        )
    }
}

impl FrameSource for CycleSource {
    fn read(&mut self) -> Option<Frame> {
        self.cycle = self.cycle.wrapping_add(1);
        self.reads.fetch_add(1, Ordering::SeqCst);
        Some(cycle_frame(self.cycle))
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Engine labeling each frame with its cycle number
struct CycleEngine;

impl DetectionEngine for CycleEngine {
    fn infer(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        Ok(vec![cycle_detection(frame.data[0])])
    }
}

/// Engine that fails on every frame
struct FailingEngine;

impl DetectionEngine for FailingEngine {
    fn infer(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        Err(Error::Detector("synthetic failure".to_string()))
    }
}

/// Wait until the state satisfies a predicate or the deadline passes
fn wait_for(state: &VisionState, pred: impl Fn(&VisionState) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if pred(state) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn test_worker_publishes_paired_snapshots() {
    let state = Arc::new(VisionState::new());
    let (source, _, _) = CycleSource::new();

    let worker = VisionWorker::start(
        move || -> Option<Box<dyn FrameSource>> { Some(Box::new(source)) },
        CycleEngine,
        Arc::clone(&state),
        Duration::from_millis(1),
    )
    .unwrap();

    assert!(wait_for(&state, |s| s.snapshot().is_some()));

    // Every observed snapshot pairs a frame with its own cycle's detections
    for _ in 0..200 {
        if let Some((frame, detections)) = state.snapshot() {
            assert_eq!(detections.len(), 1);
            assert_eq!(detections[0].label, format!("cycle-{}", frame.data[0]));
        }
    }

    worker.stop();
}

#[test]
fn test_concurrent_reader_never_sees_torn_pair() {
    let state = Arc::new(VisionState::new());

    let writer_state = Arc::clone(&state);
    let stop = Arc::new(AtomicBool::new(false));
    let writer_stop = Arc::clone(&stop);

    let writer = std::thread::spawn(move || {
        let mut cycle: u8 = 0;
        while !writer_stop.load(Ordering::Relaxed) {
            cycle = cycle.wrapping_add(1);
            writer_state.publish(cycle_frame(cycle), vec![cycle_detection(cycle)]);
        }
    });

    let deadline = Instant::now() + Duration::from_millis(500);
    let mut observed = 0u32;
    while Instant::now() < deadline {
        if let Some((frame, detections)) = state.snapshot() {
            observed += 1;
            assert_eq!(detections[0].label, format!("cycle-{}", frame.data[0]));
        }
    }

    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
    assert!(observed > 0);
}

#[test]
fn test_failing_engine_publishes_empty_detections_and_continues() {
    let state = Arc::new(VisionState::new());
    let (source, reads, _) = CycleSource::new();

    let worker = VisionWorker::start(
        move || -> Option<Box<dyn FrameSource>> { Some(Box::new(source)) },
        FailingEngine,
        Arc::clone(&state),
        Duration::from_millis(1),
    )
    .unwrap();

    assert!(wait_for(&state, |s| s.snapshot().is_some()));

    let (frame, detections) = state.snapshot().unwrap();
    assert!(!frame.data.is_empty());
    assert!(detections.is_empty());

    // The loop survives the failure and keeps capturing
    let before = reads.load(Ordering::SeqCst);
    assert!(wait_for(&state, |_| {
        reads.load(Ordering::SeqCst) > before + 3
    }));

    worker.stop();
}

#[test]
fn test_stop_releases_source_and_clears_state() {
    let state = Arc::new(VisionState::new());
    let (source, _, closed) = CycleSource::new();

    let worker = VisionWorker::start(
        move || -> Option<Box<dyn FrameSource>> { Some(Box::new(source)) },
        CycleEngine,
        Arc::clone(&state),
        Duration::from_millis(1),
    )
    .unwrap();

    assert!(wait_for(&state, |s| s.frame().is_some()));

    worker.stop();

    // Join happened inside stop: the device is released and the snapshot cleared
    assert!(closed.load(Ordering::SeqCst));
    assert!(state.snapshot().is_none());
    assert!(state.detections().is_empty());
}

#[test]
fn test_reads_without_publish_are_idempotent() {
    let state = VisionState::new();
    state.publish(cycle_frame(5), vec![common::detection("person", 0.9)]);

    let first = state.snapshot();
    let second = state.snapshot();
    assert_eq!(first, second);
    assert_eq!(state.detections(), state.detections());
}
