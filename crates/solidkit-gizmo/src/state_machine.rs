//! Per-gizmo interaction state machine.
//!
//! Handles the classic hover, press, drag, release cycle as well as modal
//! keyboard interaction, where a key command starts tracking the pointer
//! without a press and a click ends it. Along the way it computes movement
//! data in screen space, on a camera-facing plane through the gizmo, and in
//! polar screen coordinates around the gizmo's projected center.
//!
//! Transitions that arrive in the wrong state are ignored. Every borrow of
//! the machine's own state is released before the gizmo, its callback or a
//! disposer runs, so those may call back into the machine.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use glam::{Vec2, Vec3};
use solidkit_core::event_bus::{EditorEvent, EventBus, GizmoEvent};
use solidkit_core::{Disposable, Shared};

use crate::camera::{Camera, Ray};
use crate::focus::FocusClaim;
use crate::gizmo::{CommandFlow, Gizmo, GizmoCommand};
use crate::picker::Intersector;
use crate::viewport::{PointerSample, Viewport, ViewportId};

/// Movement data handed to gizmo hooks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementInfo {
    /// Pointer position at the start of the interaction, NDC.
    pub point_start_2d: Vec2,
    /// Current pointer position, NDC.
    pub point_end_2d: Vec2,
    /// Start position on the camera-facing plane through the gizmo.
    pub point_start_3d: Vec3,
    /// Current position on that plane.
    pub point_end_3d: Vec3,
    /// The gizmo's position projected to NDC.
    pub center_2d: Vec2,
    /// Unit vector from `center_2d` towards the pointer.
    pub radius: Vec2,
    /// Polar angle swept since the start, radians, counter-clockwise positive.
    pub angle: f32,
    pub viewport: ViewportId,
    pub camera: Camera,
}

/// Observable state of a [`GizmoStateMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GizmoState {
    None,
    Hover,
    Dragging,
    Command,
}

impl GizmoState {
    /// Dragging and command mode own the interaction.
    pub fn is_active(self) -> bool {
        matches!(self, GizmoState::Dragging | GizmoState::Command)
    }
}

enum State {
    None,
    Hover,
    Dragging { clear_handlers: Disposable },
    Command { clear_handlers: Disposable, text: String },
}

impl State {
    fn tag(&self) -> GizmoState {
        match self {
            State::None => GizmoState::None,
            State::Hover => GizmoState::Hover,
            State::Dragging { .. } => GizmoState::Dragging,
            State::Command { .. } => GizmoState::Command,
        }
    }
}

#[derive(Default)]
struct Tracking {
    sample: PointerSample,
    camera: Camera,
    ray: Ray,
    anchor: Vec3,
    info: MovementInfo,
}

type ValueCallback<V> = Box<dyn FnMut(V)>;

pub struct GizmoStateMachine<G: Gizmo> {
    gizmo: Shared<G>,
    cb: RefCell<ValueCallback<G::Value>>,
    title: String,
    state: RefCell<State>,
    tracking: RefCell<Tracking>,
    enabled: Cell<bool>,
    focus: Option<FocusClaim>,
    bus: Arc<EventBus>,
    me: Weak<Self>,
}

impl<G: Gizmo> std::fmt::Debug for GizmoStateMachine<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GizmoStateMachine")
            .field("title", &self.title)
            .field("state", &self.state())
            .field("enabled", &self.enabled.get())
            .finish()
    }
}

impl<G: Gizmo> GizmoStateMachine<G> {
    pub fn new(
        gizmo: Shared<G>,
        cb: impl FnMut(G::Value) + 'static,
        focus: Option<FocusClaim>,
        bus: Arc<EventBus>,
    ) -> Rc<Self> {
        let title = gizmo.borrow().title().to_string();
        Rc::new_cyclic(|me| Self {
            gizmo,
            cb: RefCell::new(Box::new(cb)),
            title,
            state: RefCell::new(State::None),
            tracking: RefCell::new(Tracking::default()),
            enabled: Cell::new(true),
            focus,
            bus,
            me: me.clone(),
        })
    }

    pub fn state(&self) -> GizmoState {
        self.state.borrow().tag()
    }

    pub fn info(&self) -> MovementInfo {
        self.tracking.borrow().info
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// A disabled machine ignores all input until re-enabled.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    /// Re-project the gizmo for `viewport` and rebuild the pointer ray.
    ///
    /// Must precede every transition.
    pub fn update(&self, viewport: &dyn Viewport, sample: PointerSample) {
        let camera = viewport.camera();
        let Some(anchor) = self.with_gizmo(|gizmo, _| {
            gizmo.update(&camera);
            gizmo.view().position
        }) else {
            return;
        };

        let mut t = self.tracking.borrow_mut();
        t.sample = sample;
        t.camera = camera;
        t.anchor = anchor;
        t.ray = camera.ray(sample.position());
        t.info.viewport = viewport.id();
        t.info.camera = camera;
    }

    pub fn pointer_hover(&self) {
        if !self.accepts_input() {
            return;
        }
        let current = self.state();
        if !matches!(current, GizmoState::None | GizmoState::Hover) {
            return;
        }

        let intersector = self.intersector();
        let Some(hit) = self.with_gizmo(|gizmo, _| gizmo.view().hit(intersector.ray()).is_some())
        else {
            return;
        };

        match (current, hit) {
            (GizmoState::None, true) => {
                self.with_gizmo(|gizmo, _| gizmo.on_pointer_enter(&intersector));
                *self.state.borrow_mut() = State::Hover;
                self.changed();
            }
            (GizmoState::Hover, false) => {
                self.with_gizmo(|gizmo, _| gizmo.on_pointer_leave(&intersector));
                *self.state.borrow_mut() = State::None;
                self.changed();
            }
            _ => {}
        }
    }

    /// Start a drag from `Hover` with the primary button.
    ///
    /// `on_start` installs the drag listeners and returns their disposer.
    pub fn pointer_down(&self, on_start: impl FnOnce() -> Disposable) {
        if !self.accepts_input() {
            return;
        }
        if self.state() != GizmoState::Hover {
            return;
        }
        if self.tracking.borrow().sample.button != PointerSample::PRIMARY {
            return;
        }

        if !self.begin() {
            return;
        }
        self.take_focus();
        let clear_handlers = on_start();
        *self.state.borrow_mut() = State::Dragging { clear_handlers };
        tracing::debug!("{}: dragging", self.title);
        self.changed();
    }

    pub fn pointer_move(&self) {
        if !self.accepts_input() {
            return;
        }
        let tracks = match &*self.state.borrow() {
            State::Dragging { .. } => {
                self.tracking.borrow().sample.button == PointerSample::NO_BUTTON
            }
            State::Command { .. } => true,
            State::None | State::Hover => false,
        };
        if tracks {
            self.track();
        }
    }

    /// End a drag or modal command with the primary button.
    pub fn pointer_up(&self, on_finish: impl FnOnce()) {
        if !self.accepts_input() {
            return;
        }
        if !self.state().is_active() {
            return;
        }
        if self.tracking.borrow().sample.button != PointerSample::PRIMARY {
            return;
        }
        let Some(clear_handlers) = self.take_active() else {
            return;
        };

        clear_handlers.dispose();
        self.changed();
        let intersector = self.intersector();
        let info = self.info();
        self.with_gizmo(|gizmo, cb| {
            gizmo.on_pointer_up(cb, &intersector, &info);
            if let Some(helper) = gizmo.view_mut().helper.as_mut() {
                helper.on_end();
            }
        });
        self.release_focus();
        tracing::debug!("{}: released", self.title);
        on_finish();
    }

    /// Keyboard entry into modal tracking, or a mode switch while already in it.
    pub fn command(&self, command: &GizmoCommand<G>, on_start: impl FnOnce() -> Disposable) {
        if !self.enabled.get() {
            return;
        }

        match self.state() {
            GizmoState::None | GizmoState::Hover => {
                self.take_focus();
                let clear_handlers = on_start();
                let flow = self.with_gizmo(|gizmo, cb| (command.run)(gizmo, cb));
                if flow != Some(CommandFlow::Modal) {
                    clear_handlers.dispose();
                    self.release_focus();
                    return;
                }

                let camera = self.tracking.borrow().camera;
                if let Some(anchor) = self.with_gizmo(|gizmo, _| {
                    gizmo.update(&camera);
                    gizmo.view().position
                }) {
                    self.tracking.borrow_mut().anchor = anchor;
                }
                if !self.begin() {
                    clear_handlers.dispose();
                    self.release_focus();
                    return;
                }
                *self.state.borrow_mut() = State::Command {
                    clear_handlers,
                    text: String::new(),
                };
                tracing::debug!("{}: command {}", self.title, command.name);
                self.changed();
            }
            GizmoState::Command => {
                self.with_gizmo(|gizmo, cb| (command.run)(gizmo, cb));
                self.track();
            }
            GizmoState::Dragging => {}
        }
    }

    /// Typed text while in command mode, e.g. a numeric value.
    ///
    /// Named keys such as `Enter` or `Escape` are left to the keymap.
    pub fn key_press(&self, key: &str) {
        if !self.accepts_input() || key.chars().count() != 1 {
            return;
        }
        let text = match &mut *self.state.borrow_mut() {
            State::Command { text, .. } => {
                text.push_str(key);
                text.clone()
            }
            _ => return,
        };
        self.with_gizmo(|gizmo, cb| gizmo.on_key_press(cb, &text));
        self.changed();
    }

    /// Abandon the current interaction and return to `None`.
    pub fn interrupt(&self) {
        let previous = std::mem::replace(&mut *self.state.borrow_mut(), State::None);
        let intersector = self.intersector();
        match previous {
            State::Dragging { clear_handlers } | State::Command { clear_handlers, .. } => {
                clear_handlers.dispose();
                self.with_gizmo(|gizmo, cb| {
                    gizmo.on_interrupt(cb);
                    if let Some(helper) = gizmo.view_mut().helper.as_mut() {
                        helper.on_end();
                    }
                    gizmo.on_pointer_leave(&intersector);
                });
                self.release_focus();
                tracing::debug!("{}: interrupted", self.title);
                self.changed();
            }
            State::Hover => {
                self.with_gizmo(|gizmo, _| gizmo.on_pointer_leave(&intersector));
                self.changed();
            }
            State::None => {}
        }
    }

    /// Tear down an active interaction without notifying the gizmo's value callback.
    pub fn finish(&self) {
        if let Some(clear_handlers) = self.take_active() {
            clear_handlers.dispose();
            self.with_gizmo(|gizmo, _| {
                if let Some(helper) = gizmo.view_mut().helper.as_mut() {
                    helper.on_end();
                }
            });
        }
        self.release_focus();
    }

    fn accepts_input(&self) -> bool {
        self.enabled.get() && !self.focus.as_ref().is_some_and(FocusClaim::is_blocked)
    }

    fn take_active(&self) -> Option<Disposable> {
        let mut state = self.state.borrow_mut();
        if !state.tag().is_active() {
            return None;
        }
        match std::mem::replace(&mut *state, State::None) {
            State::Dragging { clear_handlers } | State::Command { clear_handlers, .. } => {
                Some(clear_handlers)
            }
            State::None | State::Hover => None,
        }
    }

    fn take_focus(&self) {
        if let Some(focus) = &self.focus {
            let me = self.me.clone();
            focus.acquire(Disposable::new(move || {
                if let Some(machine) = me.upgrade() {
                    machine.interrupt();
                }
            }));
        }
    }

    fn release_focus(&self) {
        if let Some(focus) = &self.focus {
            focus.release();
        }
    }

    fn intersector(&self) -> Intersector {
        Intersector::new(self.tracking.borrow().ray)
    }

    fn plane_intersection(&self) -> Option<Vec3> {
        let t = self.tracking.borrow();
        let hit = t.ray.intersect_plane(t.anchor, t.camera.backward());
        if hit.is_none() {
            tracing::error!(
                "{}: pointer ray misses the camera plane through the gizmo",
                self.title
            );
        }
        hit
    }

    /// Record start points and notify the gizmo and its helper.
    fn begin(&self) -> bool {
        let Some(start_3d) = self.plane_intersection() else {
            return false;
        };
        let info = {
            let mut t = self.tracking.borrow_mut();
            let center = t.camera.project(t.anchor);
            let start_2d = t.sample.position();
            t.info.center_2d = center;
            t.info.point_start_2d = start_2d;
            t.info.point_end_2d = start_2d;
            t.info.point_start_3d = start_3d;
            t.info.point_end_3d = start_3d;
            t.info.radius = (start_2d - center).normalize_or_zero();
            t.info.angle = 0.0;
            t.info
        };
        let intersector = self.intersector();
        self.with_gizmo(|gizmo, cb| {
            gizmo.on_pointer_down(cb, &intersector, &info);
            if let Some(helper) = gizmo.view_mut().helper.as_mut() {
                helper.on_start(info.center_2d);
            }
        });
        true
    }

    /// Recompute end points, radius and angle, then notify the gizmo.
    fn track(&self) {
        let Some(end_3d) = self.plane_intersection() else {
            return;
        };
        let info = {
            let mut t = self.tracking.borrow_mut();
            let end_2d = t.sample.position();
            let info = &mut t.info;
            info.point_end_2d = end_2d;
            info.point_end_3d = end_3d;
            info.radius = (end_2d - info.center_2d).normalize_or_zero();
            let start_radius = info.point_start_2d - info.center_2d;
            info.angle = info.radius.y.atan2(info.radius.x) - start_radius.y.atan2(start_radius.x);
            *info
        };
        let intersector = self.intersector();
        self.with_gizmo(|gizmo, cb| {
            if let Some(helper) = gizmo.view_mut().helper.as_mut() {
                helper.on_move(info.point_end_2d);
            }
            gizmo.on_pointer_move(cb, &intersector, &info);
        });
        self.changed();
    }

    fn with_gizmo<R>(&self, f: impl FnOnce(&mut G, &mut dyn FnMut(G::Value)) -> R) -> Option<R> {
        let (Ok(mut gizmo), Ok(mut cb)) = (self.gizmo.try_borrow_mut(), self.cb.try_borrow_mut())
        else {
            tracing::error!("{}: re-entrant gizmo access ignored", self.title);
            return None;
        };
        Some(f(&mut *gizmo, &mut **cb))
    }

    fn changed(&self) {
        self.bus
            .publish(EditorEvent::Gizmo(GizmoEvent::Changed {
                title: self.title.clone(),
            }))
            .ok();
    }
}
