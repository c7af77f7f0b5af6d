//! Gizmos and their execution.
//!
//! A gizmo is a small on-screen widget that manipulates one value: a visible
//! handle, an invisible picker that is easy to hit, and optional drag
//! feedback. [`GizmoHandle::execute`] wires a fresh [`GizmoStateMachine`] to
//! every viewport and exposes the interaction as a [`CancellableOperation`].
//!
//! Gizmos also offer modal keyboard interaction: each [`GizmoCommand`] is
//! registered as a named command (for example `gizmo:move:x`) that starts
//! tracking the pointer without a click.

use std::rc::Rc;
use std::sync::Arc;

use glam::Vec3;
use solidkit_core::event_bus::{EditorEvent, EventBus, GizmoEvent};
use solidkit_core::{
    shared, shared_none, CancellableOperation, CompositeDisposable, Disposable, OperationHooks, Shared,
    SharedOption,
};

use crate::camera::{Camera, Ray};
use crate::focus::FocusClaim;
use crate::helper::{GizmoHelper, HelperScene, NodeId};
use crate::input::{EventTarget, InputRouter, PointerKind};
use crate::picker::{Intersection, Intersector, Picker};
use crate::state_machine::{GizmoState, GizmoStateMachine, MovementInfo};
use crate::viewport::Viewport;

/// Whether an execution stays open after one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Keep accepting interactions until finished or cancelled from outside.
    #[default]
    Persistent,
    /// Resolve as soon as one interaction completes.
    Transitory,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "persistent" => Ok(Mode::Persistent),
            "transitory" => Ok(Mode::Transitory),
            other => Err(format!("unknown gizmo mode '{}'", other)),
        }
    }
}

/// Visual parts of a gizmo.
#[derive(Debug)]
pub struct GizmoView {
    /// World position; the camera-facing drag plane passes through it.
    pub position: Vec3,
    /// Zoom-compensating scale applied to the picker.
    pub scale: f32,
    /// Offset of the visible handle (and the picker) from `position`.
    pub handle: Vec3,
    pub picker: Box<dyn Picker>,
    /// Displacement shown as feedback while dragging.
    pub delta: Option<Vec3>,
    pub helper: Option<Box<dyn GizmoHelper>>,
}

impl GizmoView {
    pub fn new(picker: impl Picker + 'static) -> Self {
        Self {
            position: Vec3::ZERO,
            scale: 1.0,
            handle: Vec3::ZERO,
            picker: Box::new(picker),
            delta: None,
            helper: None,
        }
    }

    pub fn with_helper(mut self, helper: impl GizmoHelper + 'static) -> Self {
        self.helper = Some(Box::new(helper));
        self
    }

    /// World position of the handle, where the picker sits.
    pub fn picker_center(&self) -> Vec3 {
        self.position + self.handle
    }

    pub fn hit(&self, ray: &Ray) -> Option<Intersection> {
        self.picker.intersect(ray, self.picker_center(), self.scale)
    }
}

/// What a keyboard command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFlow {
    /// Start tracking the pointer in command mode.
    Modal,
    /// The command applied its effect immediately; nothing to track.
    Done,
}

type CommandFn<G> = dyn Fn(&mut G, &mut dyn FnMut(<G as Gizmo>::Value)) -> CommandFlow;

/// A named keyboard command offered by a gizmo.
pub struct GizmoCommand<G: Gizmo> {
    pub name: String,
    pub run: Rc<CommandFn<G>>,
}

impl<G: Gizmo> Clone for GizmoCommand<G> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            run: self.run.clone(),
        }
    }
}

impl<G: Gizmo> std::fmt::Debug for GizmoCommand<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GizmoCommand")
            .field("name", &self.name)
            .finish()
    }
}

impl<G: Gizmo> GizmoCommand<G> {
    pub fn new(
        name: impl Into<String>,
        run: impl Fn(&mut G, &mut dyn FnMut(G::Value)) -> CommandFlow + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            run: Rc::new(run),
        }
    }

    /// A command that only enters modal tracking.
    pub fn modal(name: impl Into<String>) -> Self {
        Self::new(name, |_, _| CommandFlow::Modal)
    }
}

/// A manipulable widget producing values of type `Value`.
pub trait Gizmo: 'static {
    type Value: 'static;

    fn title(&self) -> &str;

    fn view(&self) -> &GizmoView;

    fn view_mut(&mut self) -> &mut GizmoView;

    /// Keyboard commands registered while the gizmo executes.
    fn commands(&self) -> Vec<GizmoCommand<Self>>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Called before every transition with the camera of the event's viewport.
    fn update(&mut self, camera: &Camera) {
        let view = self.view_mut();
        view.scale = camera.scale_independent_of_zoom(view.position);
        view.picker.face(camera.backward());
    }

    fn on_pointer_enter(&mut self, _intersector: &Intersector) {}

    fn on_pointer_leave(&mut self, _intersector: &Intersector) {}

    fn on_key_press(&mut self, _cb: &mut dyn FnMut(Self::Value), _text: &str) {}

    fn on_pointer_down(
        &mut self,
        cb: &mut dyn FnMut(Self::Value),
        intersector: &Intersector,
        info: &MovementInfo,
    );

    fn on_pointer_move(
        &mut self,
        cb: &mut dyn FnMut(Self::Value),
        intersector: &Intersector,
        info: &MovementInfo,
    );

    fn on_pointer_up(
        &mut self,
        cb: &mut dyn FnMut(Self::Value),
        intersector: &Intersector,
        info: &MovementInfo,
    );

    fn on_interrupt(&mut self, cb: &mut dyn FnMut(Self::Value));
}

/// Everything a gizmo execution attaches to.
#[derive(Clone)]
pub struct GizmoContext {
    pub viewports: Vec<Rc<dyn Viewport>>,
    pub router: InputRouter,
    pub helpers: Shared<HelperScene>,
    pub bus: Arc<EventBus>,
}

impl GizmoContext {
    pub fn new(viewports: Vec<Rc<dyn Viewport>>, router: InputRouter, bus: Arc<EventBus>) -> Self {
        Self {
            viewports,
            router,
            helpers: shared(HelperScene::new()),
            bus,
        }
    }

    pub fn enable_all_controls(&self) {
        for viewport in &self.viewports {
            viewport.enable_controls();
        }
    }
}

impl std::fmt::Debug for GizmoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GizmoContext")
            .field("viewports", &self.viewports.len())
            .field("router", &self.router)
            .finish()
    }
}

/// Owns a gizmo and tracks its current execution.
pub struct GizmoHandle<G: Gizmo> {
    gizmo: Shared<G>,
    node: SharedOption<NodeId>,
    machine: SharedOption<Rc<GizmoStateMachine<G>>>,
}

impl<G: Gizmo> Clone for GizmoHandle<G> {
    fn clone(&self) -> Self {
        Self {
            gizmo: self.gizmo.clone(),
            node: self.node.clone(),
            machine: self.machine.clone(),
        }
    }
}

impl<G: Gizmo> GizmoHandle<G> {
    pub fn new(gizmo: G) -> Self {
        Self {
            gizmo: shared(gizmo),
            node: shared_none(),
            machine: shared_none(),
        }
    }

    pub fn gizmo(&self) -> &Shared<G> {
        &self.gizmo
    }

    pub fn title(&self) -> String {
        self.gizmo.borrow().title().to_string()
    }

    /// State machine of the running execution, if any.
    pub fn machine(&self) -> Option<Rc<GizmoStateMachine<G>>> {
        self.machine.borrow().clone()
    }

    pub fn state(&self) -> GizmoState {
        self.machine().map_or(GizmoState::None, |m| m.state())
    }

    /// Node in the helper scene, once the gizmo has been placed there.
    pub fn node(&self) -> Option<NodeId> {
        *self.node.borrow()
    }

    pub(crate) fn node_slot(&self) -> SharedOption<NodeId> {
        self.node.clone()
    }

    /// Place the gizmo under `parent` in the helper scene.
    pub fn attach_to(&self, scene: &mut HelperScene, parent: NodeId) -> Option<NodeId> {
        if let Some(existing) = self.node() {
            return Some(existing);
        }
        let title = self.title();
        let id = scene.create_child(parent, title)?;
        *self.node.borrow_mut() = Some(id);
        Some(id)
    }

    pub fn interrupt(&self) {
        if let Some(machine) = self.machine() {
            machine.interrupt();
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        if let Some(machine) = self.machine() {
            machine.set_enabled(enabled);
        }
    }

    /// Run the gizmo until it is finished, cancelled or, in
    /// [`Mode::Transitory`], until one interaction completes.
    pub fn execute(
        &self,
        ctx: &GizmoContext,
        cb: impl FnMut(G::Value) + 'static,
        mode: Mode,
    ) -> CancellableOperation<()> {
        self.execute_with_focus(ctx, cb, mode, None)
    }

    /// Like [`execute`](Self::execute), competing for focus through `focus`.
    pub fn execute_with_focus(
        &self,
        ctx: &GizmoContext,
        cb: impl FnMut(G::Value) + 'static,
        mode: Mode,
        focus: Option<FocusClaim>,
    ) -> CancellableOperation<()> {
        let title = self.title();
        let disposables = shared(CompositeDisposable::new());

        // A gizmo outside any composite gets its own root node.
        if self.node().is_none() {
            let id = {
                let mut scene = ctx.helpers.borrow_mut();
                let id = scene.create(title.clone());
                scene.attach(id);
                id
            };
            *self.node.borrow_mut() = Some(id);
            let helpers = ctx.helpers.clone();
            let node = self.node.clone();
            disposables.borrow_mut().add_action(move || {
                helpers.borrow_mut().remove(id);
                node.borrow_mut().take();
            });
        }

        let machine = GizmoStateMachine::new(self.gizmo.clone(), cb, focus, ctx.bus.clone());
        *self.machine.borrow_mut() = Some(machine.clone());
        let slot = self.machine.clone();
        disposables.borrow_mut().add_action(move || {
            slot.borrow_mut().take();
        });

        let commands = self.gizmo.borrow().commands();
        let names: Vec<String> = commands.iter().map(|c| c.name.clone()).collect();

        let dispose = {
            let machine = machine.clone();
            let disposables = disposables.clone();
            let bus = ctx.bus.clone();
            let title = title.clone();
            Disposable::new(move || {
                machine.finish();
                let items = disposables.borrow_mut().take();
                for item in items {
                    item.dispose();
                }
                gizmo_changed(&bus, &title);
            })
        };

        CancellableOperation::new(|resolver| {
            ctx.bus
                .publish(EditorEvent::Gizmo(GizmoEvent::KeybindingsRegistered {
                    commands: names.clone(),
                }))
                .ok();
            {
                let bus = ctx.bus.clone();
                disposables.borrow_mut().add_action(move || {
                    bus.publish(EditorEvent::Gizmo(GizmoEvent::KeybindingsCleared {
                        commands: names,
                    }))
                    .ok();
                });
            }

            for viewport in &ctx.viewports {
                let vp = viewport.id();

                // Document-level listeners that follow the pointer during an interaction
                let add_handlers: Rc<dyn Fn() -> Disposable> = {
                    let router = ctx.router.clone();
                    let viewport = viewport.clone();
                    let machine = machine.clone();
                    let dispose = dispose.clone();
                    let resolver = resolver.clone();
                    Rc::new(move || {
                        viewport.disable_controls();
                        let reenable = {
                            let viewport = viewport.clone();
                            Disposable::new(move || viewport.enable_controls())
                        };
                        let on_move = {
                            let machine = machine.clone();
                            let viewport = viewport.clone();
                            router.on_pointer(EventTarget::Document, PointerKind::Move, move |s| {
                                machine.update(&*viewport, s);
                                machine.pointer_move();
                            })
                        };
                        let on_up = {
                            let machine = machine.clone();
                            let viewport = viewport.clone();
                            let dispose = dispose.clone();
                            let resolver = resolver.clone();
                            router.on_pointer(EventTarget::Document, PointerKind::Up, move |s| {
                                machine.update(&*viewport, s);
                                machine.pointer_up(|| {
                                    if mode == Mode::Transitory {
                                        dispose.dispose();
                                        resolver.resolve(());
                                    }
                                });
                            })
                        };
                        Disposable::new(move || {
                            reenable.dispose();
                            on_up.dispose();
                            on_move.dispose();
                        })
                    })
                };

                // Keyboard commands, e.g. 'x' for gizmo:move:x
                for command in &commands {
                    let router = ctx.router.clone();
                    let viewport = viewport.clone();
                    let machine = machine.clone();
                    let add_handlers = add_handlers.clone();
                    let command = command.clone();
                    let name = command.name.clone();
                    let registration = ctx.router.on_command(EventTarget::Element(vp), name, move || {
                        // Seed the start position from the last pointer event on this viewport
                        let sample = router.last_sample(viewport.id()).unwrap_or_default();
                        machine.update(&*viewport, sample);
                        machine.command(&command, || add_handlers());
                    });
                    disposables.borrow_mut().add(registration);
                }

                let on_down = {
                    let viewport = viewport.clone();
                    let machine = machine.clone();
                    ctx.router.on_pointer(EventTarget::Element(vp), PointerKind::Down, move |s| {
                        machine.update(&*viewport, s);
                        machine.pointer_down(|| add_handlers());
                    })
                };
                let on_hover = {
                    let viewport = viewport.clone();
                    let machine = machine.clone();
                    ctx.router.on_pointer(EventTarget::Element(vp), PointerKind::Move, move |s| {
                        machine.update(&*viewport, s);
                        machine.pointer_hover();
                    })
                };
                let mut d = disposables.borrow_mut();
                d.add(on_down);
                d.add(on_hover);
            }

            let on_key = {
                let machine = machine.clone();
                ctx.router.on_key(move |key| machine.key_press(key))
            };
            disposables.borrow_mut().add(on_key);
            gizmo_changed(&ctx.bus, &title);

            let on_finish = resolver.clone();
            OperationHooks::new(
                move || dispose.dispose(),
                move || on_finish.resolve(()),
            )
        })
    }
}

fn gizmo_changed(bus: &EventBus, title: &str) {
    bus.publish(EditorEvent::Gizmo(GizmoEvent::Changed {
        title: title.to_string(),
    }))
    .ok();
}
