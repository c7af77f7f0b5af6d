use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use proptest::prelude::*;
use solidkit_core::event_bus::EventBus;
use solidkit_gizmo::{
    Camera, DistanceGizmo, Gizmo, GizmoContext, GizmoHandle, GizmoState, HeadlessViewport,
    InputRouter, Mode, PointerKind, PointerSample, Viewport,
};

fn ndc() -> impl Strategy<Value = Vec2> {
    (-0.9f32..0.9, -0.9f32..0.9).prop_map(|(x, y)| Vec2::new(x, y))
}

proptest! {
    #[test]
    fn prop_drag_cycle_returns_to_none(
        distance in 5.0f32..50.0,
        moves in prop::collection::vec(ndc(), 0..12),
    ) {
        let viewport = Rc::new(HeadlessViewport::new(
            1,
            Camera::top(Vec3::ZERO, distance),
            640.0,
            480.0,
        ));
        let router = InputRouter::new();
        let ctx = GizmoContext::new(
            vec![viewport.clone() as Rc<dyn Viewport>],
            router.clone(),
            Arc::new(EventBus::new()),
        );
        let handle = GizmoHandle::new(DistanceGizmo::new("distance", Vec3::ZERO, Vec3::Y));
        let calls = Rc::new(Cell::new(0usize));
        let c = calls.clone();
        let _op = handle.execute(&ctx, move |_| c.set(c.get() + 1), Mode::Persistent);

        let at = {
            let camera = viewport.camera();
            let mut gizmo = handle.gizmo().borrow_mut();
            gizmo.update(&camera);
            camera.project(gizmo.view().picker_center())
        };
        let id = viewport.id();

        router.pointer_sample(id, PointerKind::Move, PointerSample::moved(at));
        prop_assert_eq!(handle.state(), GizmoState::Hover);
        router.pointer_sample(id, PointerKind::Down, PointerSample::primary(at));
        prop_assert_eq!(handle.state(), GizmoState::Dragging);

        for position in &moves {
            router.pointer_sample(id, PointerKind::Move, PointerSample::moved(*position));
            prop_assert_eq!(handle.state(), GizmoState::Dragging);
        }

        let end = moves.last().copied().unwrap_or(at);
        router.pointer_sample(id, PointerKind::Up, PointerSample::primary(end));
        prop_assert_eq!(handle.state(), GizmoState::None);
        prop_assert_eq!(calls.get(), moves.len());
        prop_assert!(viewport.controls_enabled());
    }

    #[test]
    fn prop_stray_events_never_leave_none(
        events in prop::collection::vec((0u8..3, ndc(), -1i32..3), 0..20),
    ) {
        // Pointer events far from the handle must never start an interaction
        let viewport = Rc::new(HeadlessViewport::new(
            1,
            Camera::top(Vec3::new(100.0, 100.0, 0.0), 10.0),
            640.0,
            480.0,
        ));
        let router = InputRouter::new();
        let ctx = GizmoContext::new(
            vec![viewport.clone() as Rc<dyn Viewport>],
            router.clone(),
            Arc::new(EventBus::new()),
        );
        let handle = GizmoHandle::new(DistanceGizmo::new("distance", Vec3::ZERO, Vec3::Y));
        let _op = handle.execute(&ctx, |_| {}, Mode::Persistent);

        for (kind, position, button) in events {
            let kind = match kind {
                0 => PointerKind::Down,
                1 => PointerKind::Move,
                _ => PointerKind::Up,
            };
            router.pointer_sample(
                viewport.id(),
                kind,
                PointerSample::new(position.x, position.y, button),
            );
            prop_assert_eq!(handle.state(), GizmoState::None);
        }
    }
}
