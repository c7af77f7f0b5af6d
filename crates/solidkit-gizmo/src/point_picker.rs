//! Picking a point in space with the pointer.
//!
//! The pointer ray is projected onto a [`ConstructionPlane`]. Every projected
//! move publishes [`GizmoEvent::PointPickerChanged`]; a primary click, or the
//! `point-picker:finish` command, accepts the current point.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use solidkit_core::event_bus::{EditorEvent, EventBus, GizmoEvent};
use solidkit_core::{
    shared, shared_none, CancellableOperation, CompositeDisposable, Disposable, Error,
    OperationHooks, Shared,
};

use crate::camera::Ray;
use crate::gizmo::GizmoContext;
use crate::input::{EventTarget, PointerKind};
use crate::viewport::{PointerSample, Viewport, ViewportId};

pub const FINISH_POINT_PICKER: &str = "point-picker:finish";

/// Plane the pointer ray is projected onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstructionPlane {
    pub origin: Vec3,
    /// Unit length.
    pub normal: Vec3,
}

impl Default for ConstructionPlane {
    fn default() -> Self {
        Self::XY
    }
}

impl ConstructionPlane {
    /// The ground plane.
    pub const XY: Self = Self {
        origin: Vec3::ZERO,
        normal: Vec3::Z,
    };

    pub fn new(origin: Vec3, normal: Vec3) -> Self {
        Self {
            origin,
            normal: normal.normalize_or_zero(),
        }
    }

    /// Same orientation, passing through `point`.
    pub fn through(self, point: Vec3) -> Self {
        Self {
            origin: point,
            ..self
        }
    }

    pub fn project(&self, ray: &Ray) -> Option<Vec3> {
        ray.intersect_plane(self.origin, self.normal)
    }
}

/// An accepted point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointResult {
    pub point: Vec3,
    pub viewport: ViewportId,
}

/// Collects points from the pointer, one execution per point.
#[derive(Debug, Default)]
pub struct PointPicker {
    plane: ConstructionPlane,
    picked: Shared<Vec<Vec3>>,
}

impl PointPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plane(&self) -> ConstructionPlane {
        self.plane
    }

    pub fn restrict_to_plane(&mut self, plane: ConstructionPlane) {
        self.plane = plane;
    }

    /// Points accepted so far, oldest first.
    pub fn picked_points(&self) -> Vec<Vec3> {
        self.picked.borrow().clone()
    }

    pub fn last_picked(&self) -> Option<Vec3> {
        self.picked.borrow().last().copied()
    }

    /// Forget the most recently accepted point.
    pub fn undo(&self) -> Option<Vec3> {
        self.picked.borrow_mut().pop()
    }

    /// Track the pointer until a point is accepted.
    ///
    /// `cb` sees every projected point. Finishing before the pointer ever
    /// crossed the plane rejects with [`Error::NoOp`].
    pub fn execute(
        &self,
        ctx: &GizmoContext,
        cb: impl FnMut(Vec3) + 'static,
    ) -> CancellableOperation<PointResult> {
        let plane = self.plane;
        let picked = self.picked.clone();
        let cb: Rc<RefCell<dyn FnMut(Vec3)>> = Rc::new(RefCell::new(cb));
        let current = shared_none::<PointResult>();
        let disposables = shared(CompositeDisposable::new());

        let dispose = {
            let disposables = disposables.clone();
            let bus = ctx.bus.clone();
            Disposable::new(move || {
                let items = disposables.borrow_mut().take();
                for item in items {
                    item.dispose();
                }
                picker_changed(&bus);
            })
        };

        CancellableOperation::new(|resolver| {
            let settle: Rc<dyn Fn()> = {
                let current = current.clone();
                let resolver = resolver.clone();
                Rc::new(move || {
                    let result = *current.borrow();
                    match result {
                        Some(result) => {
                            picked.borrow_mut().push(result.point);
                            resolver.resolve(result);
                        }
                        None => resolver.reject(Error::NoOp),
                    }
                })
            };
            let accept: Rc<dyn Fn()> = {
                let dispose = dispose.clone();
                let settle = settle.clone();
                Rc::new(move || {
                    dispose.dispose();
                    settle();
                })
            };

            for viewport in &ctx.viewports {
                let vp = viewport.id();
                viewport.disable_controls();
                {
                    let viewport = viewport.clone();
                    disposables
                        .borrow_mut()
                        .add_action(move || viewport.enable_controls());
                }

                let on_move = {
                    let viewport = viewport.clone();
                    let current = current.clone();
                    let cb = cb.clone();
                    let bus = ctx.bus.clone();
                    ctx.router.on_pointer(EventTarget::Element(vp), PointerKind::Move, move |s| {
                        if let Some(result) = project(&plane, &*viewport, s) {
                            *current.borrow_mut() = Some(result);
                            (&mut *cb.borrow_mut())(result.point);
                            picker_changed(&bus);
                        }
                    })
                };
                let on_down = {
                    let viewport = viewport.clone();
                    let current = current.clone();
                    let accept = accept.clone();
                    ctx.router.on_pointer(EventTarget::Element(vp), PointerKind::Down, move |s| {
                        if s.button != PointerSample::PRIMARY {
                            return;
                        }
                        if let Some(result) = project(&plane, &*viewport, s) {
                            *current.borrow_mut() = Some(result);
                        }
                        accept();
                    })
                };
                let on_finish = {
                    let accept = accept.clone();
                    ctx.router
                        .on_command(EventTarget::Element(vp), FINISH_POINT_PICKER, move || accept())
                };
                let mut d = disposables.borrow_mut();
                d.add(on_move);
                d.add(on_down);
                d.add(on_finish);
            }

            OperationHooks::new(move || dispose.dispose(), move || settle())
        })
    }
}

fn project(plane: &ConstructionPlane, viewport: &dyn Viewport, sample: PointerSample) -> Option<PointResult> {
    let ray = viewport.camera().ray(sample.position());
    plane.project(&ray).map(|point| PointResult {
        point,
        viewport: viewport.id(),
    })
}

fn picker_changed(bus: &EventBus) {
    bus.publish(EditorEvent::Gizmo(GizmoEvent::PointPickerChanged))
        .ok();
}
