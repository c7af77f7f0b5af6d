use glam::Vec3;

use super::{parse_number, InputMode, MagnitudeState};
use crate::camera::Camera;
use crate::gizmo::{Gizmo, GizmoCommand, GizmoView};
use crate::picker::{Intersector, SpherePicker};
use crate::state_machine::MovementInfo;

/// Shaft length added on top of the value, in zoom-independent units.
const MIN_SHAFT: f32 = 0.1;
const KNOB_RADIUS: f32 = 0.2;

/// A pin with a ball on top, dragged along its axis.
///
/// Emits the distance travelled along the axis, accumulated over
/// interactions.
#[derive(Debug)]
pub struct DistanceGizmo {
    name: String,
    view: GizmoView,
    axis: Vec3,
    state: MagnitudeState,
    mode: InputMode,
    plane_normal: Vec3,
    start_point: Option<Vec3>,
    hovered: bool,
}

impl DistanceGizmo {
    pub fn new(name: impl Into<String>, position: Vec3, axis: Vec3) -> Self {
        let mut view = GizmoView::new(SpherePicker::new(KNOB_RADIUS));
        view.position = position;
        let axis = axis.normalize_or_zero();
        let mut gizmo = Self {
            name: name.into(),
            view,
            axis: if axis == Vec3::ZERO { Vec3::Y } else { axis },
            state: MagnitudeState::default(),
            mode: InputMode::Pointer,
            plane_normal: Vec3::Z,
            start_point: None,
            hovered: false,
        };
        gizmo.render();
        gizmo
    }

    pub fn value(&self) -> f32 {
        self.state.current()
    }

    pub fn set_value(&mut self, value: f32) {
        self.state.set_original(value);
        self.render();
    }

    pub fn set_min(&mut self, min: f32) {
        self.state.min = min;
    }

    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    fn render(&mut self) {
        let length = self.state.current() + MIN_SHAFT * self.view.scale;
        self.view.handle = self.axis * length;
        self.view.delta = Some(self.axis * self.state.current());
    }
}

impl Gizmo for DistanceGizmo {
    type Value = f32;

    fn title(&self) -> &str {
        &self.name
    }

    fn view(&self) -> &GizmoView {
        &self.view
    }

    fn view_mut(&mut self) -> &mut GizmoView {
        &mut self.view
    }

    fn commands(&self) -> Vec<GizmoCommand<Self>> {
        vec![GizmoCommand::modal(format!("gizmo:{}", self.name))]
    }

    fn update(&mut self, camera: &Camera) {
        self.view.scale = camera.scale_independent_of_zoom(self.view.position);
        self.render();

        // Drag plane contains the axis and faces the camera as much as it can
        let eye = (camera.get_eye_position() - self.view.position).normalize_or_zero();
        let normal = self.axis.cross(eye.cross(self.axis)).normalize_or_zero();
        self.plane_normal = if normal == Vec3::ZERO { eye } else { normal };
    }

    fn on_pointer_enter(&mut self, _intersector: &Intersector) {
        self.hovered = true;
    }

    fn on_pointer_leave(&mut self, _intersector: &Intersector) {
        self.hovered = false;
    }

    fn on_key_press(&mut self, cb: &mut dyn FnMut(f32), text: &str) {
        match parse_number(text) {
            Some(distance) => {
                self.state.set_current(distance);
                self.mode = InputMode::Keyboard;
                self.render();
                cb(self.state.current());
            }
            None => self.mode = InputMode::Pointer,
        }
    }

    fn on_pointer_down(
        &mut self,
        _cb: &mut dyn FnMut(f32),
        intersector: &Intersector,
        _info: &MovementInfo,
    ) {
        self.start_point = intersector.intersect_plane(self.view.position, self.plane_normal);
    }

    fn on_pointer_move(
        &mut self,
        cb: &mut dyn FnMut(f32),
        intersector: &Intersector,
        _info: &MovementInfo,
    ) {
        if self.mode != InputMode::Pointer {
            return;
        }
        let Some(start) = self.start_point else {
            return;
        };
        // Misses only when dragging across viewports
        let Some(point) = intersector.intersect_plane(self.view.position, self.plane_normal) else {
            return;
        };
        let travelled = (point - start).dot(self.axis);
        self.state.set_current(self.state.original() + travelled);
        self.render();
        cb(self.state.current());
    }

    fn on_pointer_up(
        &mut self,
        _cb: &mut dyn FnMut(f32),
        _intersector: &Intersector,
        _info: &MovementInfo,
    ) {
        self.state.push();
        self.start_point = None;
        self.mode = InputMode::Pointer;
        self.render();
    }

    fn on_interrupt(&mut self, cb: &mut dyn FnMut(f32)) {
        self.state.revert();
        self.start_point = None;
        self.mode = InputMode::Pointer;
        self.render();
        cb(self.state.current());
    }
}
