//! Scanning loop tests against mocked camera, model, windows and clock.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use blinkboard_core::domain::KeyLayout;
use blinkboard_core::ports::{Clock, Surface};
use blinkboard_core::{pipeline, Flow, Ports, Session, SessionConfig};
use blinkboard_test_support::{LandmarkBuilder, ManualClock, MockDisplay, MockFrameSource, MockLandmarker};

fn session(clock: &ManualClock) -> Session {
    Session::new(SessionConfig::default(), KeyLayout::default(), clock.now())
}

fn closed() -> Option<f32> {
    Some(5.0)
}

fn open() -> Option<f32> {
    Some(3.0)
}

// === Resource release ===

#[test]
fn test_release_after_exit_key() {
    let clock = ManualClock::new();
    let mut session = session(&clock);
    let mut source = MockFrameSource::new();
    let landmarker = MockLandmarker::new();
    let mut display = MockDisplay::exit_after(3);

    let summary = pipeline::run(
        &mut session,
        &mut Ports {
            source: &mut source,
            landmarker: &landmarker,
            display: &mut display,
            clock: &clock,
        },
    )
    .unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.commits, 0);
    assert_eq!(source.releases(), 1);
    assert_eq!(display.polls(), 3);
}

#[test]
fn test_release_after_frame_error() {
    let clock = ManualClock::new();
    let mut session = session(&clock);
    let mut source = MockFrameSource::new().failing_after(2);
    let landmarker = MockLandmarker::new();
    let mut display = MockDisplay::new();

    let err = pipeline::run(
        &mut session,
        &mut Ports {
            source: &mut source,
            landmarker: &landmarker,
            display: &mut display,
            clock: &clock,
        },
    )
    .unwrap_err();

    assert!(format!("{err:#}").contains("Failed to read camera frame"));
    assert_eq!(source.releases(), 1);
    assert_eq!(session.frames(), 2);
}

#[test]
fn test_release_after_detection_error() {
    let clock = ManualClock::new();
    let mut session = session(&clock);
    let mut source = MockFrameSource::new();
    let landmarker = MockLandmarker::from_ratios([open()]);
    landmarker.push_error("model exploded");
    let mut display = MockDisplay::new();

    let err = pipeline::run(
        &mut session,
        &mut Ports {
            source: &mut source,
            landmarker: &landmarker,
            display: &mut display,
            clock: &clock,
        },
    )
    .unwrap_err();

    assert!(format!("{err:#}").contains("model exploded"));
    assert_eq!(source.releases(), 1);
    assert_eq!(landmarker.calls(), 2);
}

// === Typing ===

#[test]
fn test_five_closed_frames_type_active_key() {
    let clock = ManualClock::new();
    let mut session = session(&clock);
    let mut source = MockFrameSource::new();
    let landmarker = MockLandmarker::from_ratios([closed(); 5]);
    let mut display = MockDisplay::exit_after(5);

    let summary = pipeline::run(
        &mut session,
        &mut Ports {
            source: &mut source,
            landmarker: &landmarker,
            display: &mut display,
            clock: &clock,
        },
    )
    .unwrap();

    assert_eq!(summary.text, "1");
    assert_eq!(summary.commits, 1);
    assert_eq!(session.blink_counter(), 0);
}

#[test]
fn test_broken_run_types_nothing() {
    let clock = ManualClock::new();
    let mut session = session(&clock);
    let mut source = MockFrameSource::new();
    let landmarker = MockLandmarker::from_ratios([closed(), closed(), Some(3.0), closed(), closed()]);
    let mut display = MockDisplay::exit_after(5);

    let summary = pipeline::run(
        &mut session,
        &mut Ports {
            source: &mut source,
            landmarker: &landmarker,
            display: &mut display,
            clock: &clock,
        },
    )
    .unwrap();

    assert_eq!(summary.text, "");
    assert_eq!(session.blink_counter(), 2);
}

#[test]
fn test_frames_without_face_keep_counter() {
    let clock = ManualClock::new();
    let mut session = session(&clock);
    let mut source = MockFrameSource::new();
    let landmarker = MockLandmarker::from_ratios([closed(), closed(), None, closed()]);
    let mut display = MockDisplay::exit_after(4);

    pipeline::run(
        &mut session,
        &mut Ports {
            source: &mut source,
            landmarker: &landmarker,
            display: &mut display,
            clock: &clock,
        },
    )
    .unwrap();

    assert_eq!(session.blink_counter(), 3);
}

#[test]
fn test_scan_advance_changes_typed_key() {
    let clock = ManualClock::new();
    let mut session = session(&clock);
    let mut source = MockFrameSource::new();
    let landmarker = MockLandmarker::from_ratios([open(), closed(), closed(), closed(), closed(), closed()]);
    let mut display = MockDisplay::new();
    let mut ports = Ports {
        source: &mut source,
        landmarker: &landmarker,
        display: &mut display,
        clock: &clock,
    };

    assert_eq!(pipeline::step(&mut session, &mut ports).unwrap(), Flow::Continue);
    assert_eq!(session.active_key(), '1');

    clock.advance(Duration::from_secs(3));
    for _ in 0..5 {
        pipeline::step(&mut session, &mut ports).unwrap();
    }

    assert_eq!(session.active_key(), '2');
    assert_eq!(session.text(), "2");
}

#[test]
fn test_largest_face_only() {
    let clock = ManualClock::new();
    let config = SessionConfig {
        face_selection: blinkboard_core::FaceSelection::Largest,
        ..SessionConfig::default()
    };
    let mut session = Session::new(config, KeyLayout::default(), clock.now());
    let mut source = MockFrameSource::new();
    let landmarker = MockLandmarker::new();
    for _ in 0..5 {
        landmarker.push_faces(vec![
            LandmarkBuilder::new().bbox(0, 0, 50, 50).ratio(3.0).build(),
            LandmarkBuilder::new().bbox(100, 100, 200, 200).ratio(5.0).build(),
        ]);
    }
    let mut display = MockDisplay::exit_after(5);

    let summary = pipeline::run(
        &mut session,
        &mut Ports {
            source: &mut source,
            landmarker: &landmarker,
            display: &mut display,
            clock: &clock,
        },
    )
    .unwrap();

    // The small open-eyed face is ignored, so the large one's run completes.
    assert_eq!(summary.text, "1");
}

// === Rendering ===

#[test]
fn test_three_surfaces_shown_each_frame() {
    let clock = ManualClock::new();
    let mut session = session(&clock);
    let mut source = MockFrameSource::with_size(640, 480);
    let landmarker = MockLandmarker::new();
    let mut display = MockDisplay::exit_after(2);

    pipeline::run(
        &mut session,
        &mut Ports {
            source: &mut source,
            landmarker: &landmarker,
            display: &mut display,
            clock: &clock,
        },
    )
    .unwrap();

    let surfaces: Vec<Surface> = display.shown().iter().map(|(s, _)| *s).collect();
    assert_eq!(
        surfaces,
        vec![
            Surface::Camera,
            Surface::Keyboard,
            Surface::Board,
            Surface::Camera,
            Surface::Keyboard,
            Surface::Board,
        ]
    );
    assert_eq!(display.last(Surface::Camera).map(|i| i.dimensions()), Some((320, 240)));
    assert_eq!(display.last(Surface::Keyboard).map(|i| i.dimensions()), Some((1200, 500)));
    assert_eq!(display.last(Surface::Board).map(|i| i.dimensions()), Some((1000, 500)));
}

#[test]
fn test_frames_scaled_before_detection() {
    let clock = ManualClock::new();
    let mut session = session(&clock);
    let mut source = MockFrameSource::with_size(640, 480);
    let landmarker = MockLandmarker::new();
    let mut display = MockDisplay::exit_after(1);

    pipeline::run(
        &mut session,
        &mut Ports {
            source: &mut source,
            landmarker: &landmarker,
            display: &mut display,
            clock: &clock,
        },
    )
    .unwrap();

    assert_eq!(landmarker.frame_sizes(), vec![(320, 240)]);
}

#[test]
fn test_summary_json_fields() {
    let clock = ManualClock::new();
    let mut session = session(&clock);
    let mut source = MockFrameSource::new();
    let landmarker = MockLandmarker::from_ratios([closed(); 5]);
    let mut display = MockDisplay::exit_after(5);

    let summary = pipeline::run(
        &mut session,
        &mut Ports {
            source: &mut source,
            landmarker: &landmarker,
            display: &mut display,
            clock: &clock,
        },
    )
    .unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["text"], "1");
    assert_eq!(json["frames"], 5);
    assert_eq!(json["commits"], 1);
    assert!(json["finished_at"].as_str().unwrap().contains('T'));
}
