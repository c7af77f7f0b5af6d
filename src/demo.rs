//! A scripted headless session: offset a face by dragging a distance gizmo
//! and typing a draft angle, then undo, redo and abandon a second attempt.

use std::rc::Rc;

use async_trait::async_trait;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use solidkit_command::{
    Calculation, CancelOrFinish, Command, CommandExt, InMemoryDocument, Item, ParametricFactory,
};
use solidkit_core::{CancellableRegistor, Error, Result};
use solidkit_gizmo::{
    AngleGizmo, CompositeGizmo, DistanceGizmo, Gizmo, GizmoContext, GizmoHandle,
    HeadlessViewport, Mode, PointerKind, PointerSample, Viewport,
};

use crate::editor::Editor;

/// Draft angles at or beyond this many degrees fold the face over.
const MAX_DRAFT_DEGREES: f64 = 60.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetParams {
    pub distance: f64,
    /// Degrees
    pub draft_angle: f64,
}

impl Default for OffsetParams {
    fn default() -> Self {
        Self {
            distance: 1.0,
            draft_angle: 0.0,
        }
    }
}

pub struct OffsetFace;

impl Calculation for OffsetFace {
    type Params = OffsetParams;

    fn name(&self) -> &str {
        "offset-face"
    }

    fn keys(&self) -> &[&'static str] {
        &["distance", "draft_angle"]
    }

    fn calculate(&self, params: &OffsetParams) -> Result<Vec<Item>> {
        if params.distance == 0.0 {
            return Err(Error::NoOp);
        }
        if params.draft_angle.abs() >= MAX_DRAFT_DEGREES {
            return Err(Error::validation(format!(
                "draft angle must stay below {} degrees",
                MAX_DRAFT_DEGREES
            )));
        }
        Ok(vec![Item::new("offset face")
            .with("distance", params.distance)
            .with("draft_angle", params.draft_angle)])
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct GizmoValues {
    distance: f32,
    /// Radians
    draft: f32,
}

/// Offsets a face along +Y with a draft angle, previewing as the gizmos move.
pub struct OffsetFaceCommand {
    registor: CancellableRegistor,
    document: Rc<InMemoryDocument>,
    gizmos: GizmoContext,
    mode: Mode,
    distance: GizmoHandle<DistanceGizmo>,
    draft: GizmoHandle<AngleGizmo>,
}

impl OffsetFaceCommand {
    pub fn new(editor: &Editor) -> Self {
        Self {
            registor: CancellableRegistor::new(),
            document: editor.document.clone(),
            gizmos: editor.gizmos.clone(),
            mode: editor.default_mode,
            distance: GizmoHandle::new(DistanceGizmo::new("distance", Vec3::ZERO, Vec3::Y)),
            draft: GizmoHandle::new(AngleGizmo::new("draft", Vec3::new(3.0, 0.0, 0.0))),
        }
    }

    pub fn distance_handle(&self) -> &GizmoHandle<DistanceGizmo> {
        &self.distance
    }

    pub fn draft_handle(&self) -> &GizmoHandle<AngleGizmo> {
        &self.draft
    }
}

#[async_trait(?Send)]
impl Command for OffsetFaceCommand {
    fn title(&self) -> &str {
        "Offset Face"
    }

    fn registor(&self) -> &CancellableRegistor {
        &self.registor
    }

    async fn execute(&self) -> Result<()> {
        let initial = OffsetParams::default();
        let factory = self.register(ParametricFactory::new(
            OffsetFace,
            initial.clone(),
            self.document.clone(),
            self.gizmos.bus.clone(),
        ))?;
        factory.update()?;

        self.distance
            .gizmo()
            .borrow_mut()
            .set_value(initial.distance as f32);
        let values = GizmoValues {
            distance: initial.distance as f32,
            draft: (initial.draft_angle as f32).to_radians(),
        };
        let mut composite = CompositeGizmo::new("offset-face", values, &self.gizmos);
        composite.add_gizmo(&self.gizmos, self.distance.clone(), |p: &mut GizmoValues, v| {
            p.distance = v
        });
        composite.add_gizmo(&self.gizmos, self.draft.clone(), |p: &mut GizmoValues, v| {
            p.draft = v
        });

        let preview = factory.clone();
        let op = composite.execute(
            &self.gizmos,
            move |values: &GizmoValues| {
                // Failures are reported by the factory and the last good preview stays
                preview
                    .update_with(|p| {
                        p.distance = f64::from(values.distance);
                        p.draft_angle = f64::from(values.draft.to_degrees());
                    })
                    .ok();
            },
            self.mode,
        );
        self.register(op)?.await?;

        let ids = factory.commit()?;
        self.document.select(ids);
        Ok(())
    }
}

/// What the scripted session left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub items: Vec<Item>,
    pub undo_names: Vec<String>,
    pub can_redo: bool,
}

struct Script<'a> {
    editor: &'a Editor,
    viewport: &'a HeadlessViewport,
}

impl Script<'_> {
    fn send(&self, kind: PointerKind, sample: PointerSample) {
        self.editor
            .router
            .pointer_sample(self.viewport.id(), kind, sample);
    }

    fn grab_point<G: Gizmo>(&self, handle: &GizmoHandle<G>) -> Vec2 {
        let camera = self.viewport.camera();
        let mut gizmo = handle.gizmo().borrow_mut();
        gizmo.update(&camera);
        camera.project(gizmo.view().picker_center())
    }

    fn drag<G: Gizmo>(&self, handle: &GizmoHandle<G>, to: Vec2) {
        let from = self.grab_point(handle);
        tracing::debug!("Dragging {} from {} to {}", handle.title(), from, to);
        self.send(PointerKind::Move, PointerSample::moved(from));
        self.send(PointerKind::Down, PointerSample::primary(from));
        self.send(PointerKind::Move, PointerSample::moved(to));
        self.send(PointerKind::Up, PointerSample::primary(to));
    }

    fn type_keys(&self, keys: &str) {
        for c in keys.chars() {
            self.editor.router.press_key(&c.to_string());
        }
    }
}

/// Drive an [`Editor`] through a short, fixed session.
///
/// Binds `t` to the draft gizmo's keyboard command for the duration. Must run
/// inside a `tokio::task::LocalSet`.
pub async fn run_scripted_session(
    editor: &Editor,
    viewport: &HeadlessViewport,
) -> anyhow::Result<SessionReport> {
    let script = Script { editor, viewport };
    let executor = editor.executor();
    editor.router.bind_key("t", "gizmo:draft");

    // Drag the distance out, type a draft angle, confirm
    let command = Rc::new(OffsetFaceCommand::new(editor));
    let running = executor.enqueue(command.clone(), CancelOrFinish::Finish);
    script.drag(command.distance_handle(), Vec2::new(0.0, 0.6));
    script.type_keys("t15");
    script.send(PointerKind::Up, PointerSample::primary(Vec2::ZERO));
    editor.router.press_key("Enter");
    running.await;
    tracing::info!("Document holds {} item(s)", editor.document.len());

    if let Some(name) = executor.undo() {
        tracing::info!("Undid {}", name);
    }
    if let Some(name) = executor.redo() {
        tracing::info!("Redid {}", name);
    }

    // A second attempt, abandoned halfway
    let command = Rc::new(OffsetFaceCommand::new(editor));
    let running = executor.enqueue(command.clone(), CancelOrFinish::Finish);
    script.drag(command.distance_handle(), Vec2::new(0.0, 0.2));
    editor.router.press_key("Escape");
    running.await;

    let history = executor.history().borrow();
    Ok(SessionReport {
        items: editor
            .document
            .items()
            .into_iter()
            .map(|(_, item)| item)
            .collect(),
        undo_names: history
            .undo_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        can_redo: history.can_redo(),
    })
}
