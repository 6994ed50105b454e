use blink::interaction::DragState;
use blink::prelude::*;
use serde_json::json;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Root clump `a` holding clump `b` at `(bx, by)`, which draws a 20x20
/// square centred on its origin.
fn scene_with_b(bx: f32, by: f32) -> Canvas {
    serde_json::from_value(json!({
        "content": {
            "nodeUUID": "a",
            "elements": [{
                "class": "clump",
                "nodeUUID": "b",
                "transform": { "position": { "x": bx, "y": by } },
                "elements": [{
                    "class": "atom",
                    "nodeUUID": "square",
                    "type": "shape",
                    "shape": "rectangle",
                    "bounds": { "w": 20, "h": 20 },
                    "fill": 0xff0000
                }]
            }]
        }
    }))
    .unwrap()
}

fn context_with(canvas: &Canvas) -> RenderContext<SoftwareBackend> {
    init_logging();
    let mut ctx = RenderContext::new(SoftwareBackend::new());
    let outcome = pollster::block_on(ctx.update(canvas, &MemoryLoader::new()));
    assert!(matches!(outcome, RenderOutcome::Rendered(_)));
    ctx
}

#[test]
fn test_drag_reports_absolute_position() {
    let mut ctx = context_with(&scene_with_b(10.0, 10.0));

    assert!(ctx.handle_pointer(PointerEvent::Down(Point::new(10.0, 10.0))).is_none());
    assert_eq!(ctx.selection(), Some("b"));

    let notification = ctx
        .handle_pointer(PointerEvent::Move(Point::new(15.0, 18.0)))
        .unwrap();
    assert_eq!(notification, ChangeNotification::position("b", Point::new(15.0, 18.0)));

    let b = ctx.node("b").unwrap();
    assert_eq!(
        ctx.scene().get(b).unwrap().matrix.translation(),
        Point::new(15.0, 18.0)
    );

    assert!(ctx.handle_pointer(PointerEvent::Up(Point::new(15.0, 18.0))).is_none());
    assert_eq!(ctx.interaction().state(), &DragState::Idle);
    assert!(ctx.handle_pointer(PointerEvent::Move(Point::new(50.0, 50.0))).is_none());
}

#[test]
fn test_each_move_emits_one_notification() {
    let mut ctx = context_with(&scene_with_b(10.0, 10.0));
    ctx.handle_pointer(PointerEvent::Down(Point::new(10.0, 10.0)));

    let positions: Vec<Point> = [(11.0, 10.0), (12.0, 12.0), (12.0, 15.0)]
        .into_iter()
        .filter_map(|(x, y)| ctx.handle_pointer(PointerEvent::Move(Point::new(x, y))))
        .map(|n| Point::new(n.inputs.position_x, n.inputs.position_y))
        .collect();
    assert_eq!(
        positions,
        vec![
            Point::new(11.0, 10.0),
            Point::new(12.0, 12.0),
            Point::new(12.0, 15.0)
        ]
    );
}

#[test]
fn test_drag_is_measured_in_world_space() {
    let mut ctx = context_with(&scene_with_b(10.0, 10.0));
    ctx.set_viewport(Viewport::new(Point::new(100.0, 0.0), 2.0));

    // World (10, 10) is screen (120, 20).
    ctx.handle_pointer(PointerEvent::Down(Point::new(120.0, 20.0)));
    assert_eq!(ctx.selection(), Some("b"));
    let notification = ctx
        .handle_pointer(PointerEvent::Move(Point::new(130.0, 36.0)))
        .unwrap();
    assert_eq!(notification.inputs.position_x, 15.0);
    assert_eq!(notification.inputs.position_y, 18.0);
}

#[test]
fn test_press_on_empty_space_selects_nothing() {
    let mut ctx = context_with(&scene_with_b(10.0, 10.0));
    ctx.handle_pointer(PointerEvent::Down(Point::new(500.0, 500.0)));
    assert_eq!(ctx.selection(), None);
    assert!(ctx.handle_pointer(PointerEvent::Move(Point::new(510.0, 500.0))).is_none());
}

#[test]
fn test_echoed_position_does_not_rebuild() {
    let mut ctx = context_with(&scene_with_b(10.0, 10.0));
    ctx.handle_pointer(PointerEvent::Down(Point::new(10.0, 10.0)));
    ctx.handle_pointer(PointerEvent::Move(Point::new(15.0, 18.0)));
    ctx.handle_pointer(PointerEvent::Up(Point::new(15.0, 18.0)));

    let echoed = scene_with_b(15.0, 18.0);
    let outcome = pollster::block_on(ctx.update(&echoed, &MemoryLoader::new()));
    let RenderOutcome::Rendered(stats) = outcome else {
        panic!("expected a render pass, got {outcome:?}");
    };
    assert_eq!(stats.clumps_built, 0);
    assert_eq!(stats.atoms_reused, 1);
    assert_eq!(ctx.selection(), Some("b"));
}

#[test]
fn test_overlay_tracks_selection() {
    let mut ctx = context_with(&scene_with_b(10.0, 10.0));
    assert!(ctx.overlay().is_none());
    assert!(!ctx.select("nope"));

    assert!(ctx.select("b"));
    let overlay = ctx.overlay().unwrap();
    assert_eq!(overlay.node, "b");
    assert_eq!(
        overlay.corners,
        [
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 20.0),
            Point::new(0.0, 20.0),
        ]
    );
    assert_eq!(overlay.pivot, Point::new(10.0, 10.0));
    assert_eq!(overlay.handles[0].cursor, Cursor::NwseResize);

    ctx.handle_pointer(PointerEvent::Down(Point::new(10.0, 10.0)));
    ctx.handle_pointer(PointerEvent::Move(Point::new(15.0, 10.0)));
    assert_eq!(ctx.overlay().unwrap().corners[0], Point::new(5.0, 0.0));

    ctx.clear_selection();
    assert!(ctx.overlay().is_none());
    assert_eq!(ctx.selection(), None);
}

#[test]
fn test_selection_dropped_with_its_node() {
    let mut ctx = context_with(&scene_with_b(10.0, 10.0));
    assert!(ctx.select("b"));

    let without_b: Canvas = serde_json::from_value(json!({ "content": { "nodeUUID": "a" } })).unwrap();
    pollster::block_on(ctx.update(&without_b, &MemoryLoader::new()));
    assert_eq!(ctx.selection(), None);
    assert!(ctx.overlay().is_none());
}

#[test]
fn test_notification_serializes_for_host() {
    let mut ctx = context_with(&scene_with_b(100.0, 50.0));
    ctx.handle_pointer(PointerEvent::Down(Point::new(100.0, 50.0)));
    let notification = ctx
        .handle_pointer(PointerEvent::Move(Point::new(105.0, 58.0)))
        .unwrap();
    assert_eq!(
        notification.to_json().unwrap(),
        r#"{"nodeUUID":"b","inputs":{"positionX":105.0,"positionY":58.0}}"#
    );
}
