use glam::Vec3;

use super::{parse_number, InputMode, MagnitudeState};
use crate::gizmo::{Gizmo, GizmoCommand, GizmoView};
use crate::helper::DashedLineHelper;
use crate::picker::{Intersector, RingPicker};
use crate::state_machine::MovementInfo;

const RING_RADIUS: f32 = 1.0;
const RING_TOLERANCE: f32 = 0.1;

/// A camera-facing circle; sweeping the pointer around it emits an angle in radians.
#[derive(Debug)]
pub struct AngleGizmo {
    name: String,
    view: GizmoView,
    state: MagnitudeState,
    mode: InputMode,
}

impl AngleGizmo {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        let mut view = GizmoView::new(RingPicker::new(RING_RADIUS, RING_TOLERANCE))
            .with_helper(DashedLineHelper::default());
        view.position = position;
        Self {
            name: name.into(),
            view,
            state: MagnitudeState::default(),
            mode: InputMode::Pointer,
        }
    }

    pub fn value(&self) -> f32 {
        self.state.current()
    }

    pub fn set_value(&mut self, radians: f32) {
        self.state.set_original(radians);
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }
}

impl Gizmo for AngleGizmo {
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

    /// Typed values are degrees.
    fn on_key_press(&mut self, cb: &mut dyn FnMut(f32), text: &str) {
        match parse_number(text) {
            Some(degrees) => {
                let angle = degrees.to_radians();
                self.state.set_current(angle);
                self.mode = InputMode::Keyboard;
                cb(angle);
            }
            None => self.mode = InputMode::Pointer,
        }
    }

    fn on_pointer_down(
        &mut self,
        _cb: &mut dyn FnMut(f32),
        _intersector: &Intersector,
        _info: &MovementInfo,
    ) {
    }

    fn on_pointer_move(
        &mut self,
        cb: &mut dyn FnMut(f32),
        _intersector: &Intersector,
        info: &MovementInfo,
    ) {
        if self.mode != InputMode::Pointer {
            return;
        }
        self.state.set_current(self.state.original() + info.angle);
        cb(self.state.current());
    }

    fn on_pointer_up(
        &mut self,
        _cb: &mut dyn FnMut(f32),
        _intersector: &Intersector,
        _info: &MovementInfo,
    ) {
        self.state.push();
        self.mode = InputMode::Pointer;
    }

    fn on_interrupt(&mut self, cb: &mut dyn FnMut(f32)) {
        self.state.revert();
        self.mode = InputMode::Pointer;
        cb(self.state.current());
    }
}
