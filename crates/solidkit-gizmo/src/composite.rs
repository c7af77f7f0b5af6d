//! Composite gizmos: several sub-gizmos jointly editing one parameter set.
//!
//! All members listen to input at the same time, but only one may drive the
//! operation. A member takes focus on pointer down (if nobody holds it) or
//! steals it with a keyboard command, which interrupts the current holder
//! first. While a member holds focus, the others ignore pointer input.

use std::rc::Rc;

use solidkit_core::{shared, CancellableOperation, Shared, SharedOption};

use crate::focus::{FocusArbiter, FocusClaim};
use crate::gizmo::{Gizmo, GizmoContext, GizmoHandle, Mode};
use crate::helper::NodeId;

type CompositeCallback<P> = Shared<Box<dyn FnMut(&P)>>;

trait Member<P> {
    fn execute(
        &self,
        ctx: &GizmoContext,
        params: Shared<P>,
        cb: CompositeCallback<P>,
        mode: Mode,
        focus: FocusClaim,
    ) -> CancellableOperation<()>;

    fn interrupt(&self);

    fn set_enabled(&self, enabled: bool);

    fn node_slot(&self) -> SharedOption<NodeId>;
}

struct Bound<G: Gizmo, P> {
    handle: GizmoHandle<G>,
    on_value: Rc<dyn Fn(&mut P, G::Value)>,
}

impl<G: Gizmo, P: 'static> Member<P> for Bound<G, P> {
    fn execute(
        &self,
        ctx: &GizmoContext,
        params: Shared<P>,
        cb: CompositeCallback<P>,
        mode: Mode,
        focus: FocusClaim,
    ) -> CancellableOperation<()> {
        let on_value = self.on_value.clone();
        self.handle.execute_with_focus(
            ctx,
            move |value| {
                on_value(&mut params.borrow_mut(), value);
                let params = params.borrow();
                match cb.try_borrow_mut() {
                    Ok(mut cb) => cb(&params),
                    Err(_) => tracing::error!("composite callback re-entered; value dropped"),
                }
            },
            mode,
            Some(focus),
        )
    }

    fn interrupt(&self) {
        self.handle.interrupt();
    }

    fn set_enabled(&self, enabled: bool) {
        self.handle.set_enabled(enabled);
    }

    fn node_slot(&self) -> SharedOption<NodeId> {
        self.handle.node_slot()
    }
}

pub struct CompositeGizmo<P: 'static> {
    title: String,
    params: Shared<P>,
    node: NodeId,
    arbiter: FocusArbiter,
    members: Vec<Box<dyn Member<P>>>,
}

impl<P: 'static> std::fmt::Debug for CompositeGizmo<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeGizmo")
            .field("title", &self.title)
            .field("members", &self.members.len())
            .field("focus", &self.arbiter.holder())
            .finish()
    }
}

impl<P: 'static> CompositeGizmo<P> {
    /// Create the composite with its own (detached) node in the helper scene.
    pub fn new(title: impl Into<String>, params: P, ctx: &GizmoContext) -> Self {
        let title = title.into();
        let node = ctx.helpers.borrow_mut().create(title.clone());
        Self {
            title,
            params: shared(params),
            node,
            arbiter: FocusArbiter::new(),
            members: Vec::new(),
        }
    }

    pub fn params(&self) -> &Shared<P> {
        &self.params
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Index of the member currently holding focus.
    pub fn focused(&self) -> Option<usize> {
        self.arbiter.holder()
    }

    /// Place a sub-gizmo under this composite in the helper scene.
    pub fn add<G: Gizmo>(&self, ctx: &GizmoContext, handle: &GizmoHandle<G>) {
        let mut scene = ctx.helpers.borrow_mut();
        if handle.attach_to(&mut scene, self.node).is_none() {
            tracing::warn!("{}: composite node missing from helper scene", self.title);
        }
    }

    /// Add a member whose values are written into the parameters by `on_value`.
    pub fn add_gizmo<G: Gizmo>(
        &mut self,
        ctx: &GizmoContext,
        handle: GizmoHandle<G>,
        on_value: impl Fn(&mut P, G::Value) + 'static,
    ) {
        self.add(ctx, &handle);
        self.members.push(Box::new(Bound {
            handle,
            on_value: Rc::new(on_value),
        }));
    }

    /// Execute every member. `cb` receives the parameters after each change.
    ///
    /// Settles when the first member's operation settles, or when the returned
    /// operation is finished or cancelled; the other members are cancelled.
    /// Settling removes the composite's subtree from the helper scene, so a
    /// composite executes once.
    pub fn execute(
        &self,
        ctx: &GizmoContext,
        cb: impl FnMut(&P) + 'static,
        mode: Mode,
    ) -> CancellableOperation<()> {
        ctx.helpers.borrow_mut().attach(self.node);
        let cb: CompositeCallback<P> = shared(Box::new(cb));

        let operations = self
            .members
            .iter()
            .map(|member| {
                member.execute(
                    ctx,
                    self.params.clone(),
                    cb.clone(),
                    mode,
                    self.arbiter.claim(),
                )
            })
            .collect();
        let all = CancellableOperation::race(operations);

        let helpers = ctx.helpers.clone();
        let node = self.node;
        let arbiter = self.arbiter.clone();
        let slots: Vec<SharedOption<NodeId>> =
            self.members.iter().map(|m| m.node_slot()).collect();
        all.finally(move || {
            arbiter.interrupt_holder();
            helpers.borrow_mut().remove(node);
            for slot in slots {
                slot.borrow_mut().take();
            }
        });
        all
    }

    /// Interrupt and disable every member.
    pub fn disable(&self) {
        for member in &self.members {
            member.interrupt();
            member.set_enabled(false);
        }
    }

    pub fn enable(&self) {
        for member in &self.members {
            member.set_enabled(true);
        }
    }
}
