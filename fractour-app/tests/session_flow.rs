use std::path::PathBuf;
use std::time::{Duration, Instant};

use fractour_app::{load_keyframes, AppPreferences, RenderBridge, Session, TourState};
use fractour_core::{Bounds, Viewport};
use fractour_render::{Painter, Palette};

fn prefs() -> AppPreferences {
    AppPreferences {
        canvas_width: 120.0,
        canvas_height: 80.0,
        seconds_per_segment: 0.05,
        playback_delay_ms: 0,
        ..AppPreferences::default()
    }
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fractour_flow_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn explore_zoom_pick_and_undo() {
    let mut session = Session::new(&prefs());
    session.raster().unwrap();

    session.start_select(30.0, 20.0);
    session.update_select(60.0, 40.0);
    assert!(session.end_select());
    let zoomed = session.bounds();
    assert!(zoomed.width() < Bounds::DEFAULT.width());

    let (id, c) = session.pick(60.0, 40.0);
    let view = *session.detail_views().get(id).unwrap();
    assert_eq!(view.c, c);
    let julia = view.render(&session.painter(), 48.0, 48.0).unwrap();
    assert_eq!((julia.image.width, julia.image.height), (48, 48));

    session.pan(-12.0, 6.0);
    assert!(session.detail_views().is_empty());
    session.resize(160.0, 80.0);
    assert!((session.viewport().aspect_ratio() - 2.0).abs() < 1e-9);

    assert!(session.undo());
    assert!(session.undo());
    assert!(!session.undo());
}

#[test]
fn tour_round_trip_through_files() {
    let dir = scratch("tour");
    let mut session = Session::new(&prefs());
    session.set_bounds(Bounds::new(-1.0, 0.0, -0.4, 0.4));
    session.add_keyframe(Some("Seahorse approach"));
    let path = dir.join("keyframes.json");
    session.save_keyframes(&path).unwrap();
    assert_eq!(load_keyframes(&path).unwrap().len(), 2);

    let mut replay = Session::new(&prefs());
    replay.load_keyframes(&path).unwrap();
    assert!(replay.start_tour());
    let deadline = Instant::now() + Duration::from_secs(30);
    while !replay.poll_tour() {
        assert!(Instant::now() < deadline, "tour never finished");
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(replay.tour_state(), TourState::Idle);
    assert_eq!(replay.bounds(), Bounds::new(-1.0, 0.0, -0.4, 0.4));
    assert!(replay.tour().frames().is_some());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn bridge_serves_latest_request() {
    let mut bridge = RenderBridge::spawn().unwrap();
    let painter = Painter {
        palette: Palette::Ice,
        ..Painter::default()
    };
    bridge.request(Viewport::default_mandelbrot(400.0, 300.0), painter);
    let latest = bridge.request(Viewport::default_mandelbrot(64.0, 48.0), painter);

    let response = bridge.wait(Duration::from_secs(30)).unwrap();
    assert_eq!(response.id, latest);
    assert_eq!(response.frame.image.width, 64);
}

#[test]
fn preferences_round_trip() {
    let dir = scratch("prefs");
    let path = dir.join("preferences.json");
    let mut saved = prefs();
    saved.palette = Palette::Fire;
    saved.save_to(&path).unwrap();

    let loaded = AppPreferences::load_from(&path);
    assert_eq!(loaded, saved);
    assert_eq!(loaded.painter().palette, Palette::Fire);

    std::fs::remove_dir_all(&dir).unwrap();
}
