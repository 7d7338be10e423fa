use std::time::Duration;

use iso_garden_catalog::Catalog;
use iso_garden_core::{
    Camera, Event, GridCoord, InputEvent, Key, Modifiers, PointerButton, ScreenPoint, Viewport,
    WheelUnit,
};
use iso_garden_persistence::{LocalCache, RemoteOp};
use iso_garden_projection::Projection;
use iso_garden_session::{GardenSession, SessionSettings};

#[derive(Clone, Debug)]
enum Step {
    Input(InputEvent),
    Tick(Duration),
}

fn at(x: i32, y: i32) -> ScreenPoint {
    Projection::new(Camera::default(), Viewport::new(1280.0, 720.0))
        .world_to_screen(GridCoord::new(x, y))
}

fn script() -> Vec<Step> {
    let primary = PointerButton::Primary;
    let mut steps = Vec::new();
    for (x, y) in [(0, 0), (1, 0), (0, 1), (-2, 3)] {
        steps.push(Step::Input(InputEvent::PointerMove { position: at(x, y) }));
        steps.push(Step::Input(InputEvent::PointerDown {
            position: at(x, y),
            button: primary,
        }));
        steps.push(Step::Input(InputEvent::PointerUp {
            position: at(x, y),
            button: primary,
        }));
        steps.push(Step::Tick(Duration::from_millis(16)));
    }
    steps.extend([
        Step::Input(InputEvent::PointerDown {
            position: at(0, 0),
            button: primary,
        }),
        Step::Input(InputEvent::PointerMove { position: at(1, 0) }),
        Step::Input(InputEvent::PointerUp {
            position: at(1, 0),
            button: primary,
        }),
        Step::Input(InputEvent::KeyDown {
            key: Key::ArrowLeft,
            modifiers: Modifiers::default(),
            repeat: false,
        }),
        Step::Input(InputEvent::Wheel {
            position: ScreenPoint::new(400.0, 300.0),
            delta_y: -120.0,
            unit: WheelUnit::Pixel,
        }),
        Step::Tick(Duration::from_secs(1)),
        Step::Input(InputEvent::KeyDown {
            key: Key::Delete,
            modifiers: Modifiers::default(),
            repeat: false,
        }),
        Step::Input(InputEvent::KeyDown {
            key: Key::S,
            modifiers: Modifiers {
                ctrl: false,
                meta: true,
            },
            repeat: false,
        }),
    ]);
    steps
}

fn replay(steps: &[Step]) -> (Vec<Event>, Vec<RemoteOp>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = SessionSettings {
        profile: Some("replay".to_owned()),
        ..SessionSettings::default()
    };
    let mut session = GardenSession::new(
        settings,
        Catalog::builtin(),
        LocalCache::for_profile(dir.path(), Some("replay")),
    );
    let mut events = Vec::new();
    let mut ops = Vec::new();
    for step in steps {
        match step {
            Step::Input(event) => session.handle_input(event, &mut events),
            Step::Tick(elapsed) => session.tick(*elapsed),
        }
        ops.extend(
            session
                .drain_remote_requests()
                .into_iter()
                .map(|request| request.op),
        );
    }
    (events, ops)
}

#[test]
fn identical_scripts_produce_identical_event_and_write_streams() {
    let steps = script();
    let first = replay(&steps);
    let second = replay(&steps);
    assert_eq!(first, second);
    assert!(!first.0.is_empty());
}

#[test]
fn replayed_script_ends_with_a_manual_save() {
    let (events, ops) = replay(&script());
    assert_eq!(events.last(), Some(&Event::SaveStarted));
    assert!(matches!(ops.last(), Some(RemoteOp::SyncLayout(tiles)) if tiles.len() == 3));
    assert!(ops
        .iter()
        .any(|op| matches!(op, RemoteOp::UpsertInventory(_))));
}
