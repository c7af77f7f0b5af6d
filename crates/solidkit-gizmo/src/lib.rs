//! # SolidKit Gizmo
//!
//! Interactive on-screen widgets for editing command parameters: cameras and
//! pointer rays, input routing, per-gizmo state machines, composite gizmos
//! with focus arbitration, a few ready-made gizmos and a point picker.

pub mod camera;
pub mod composite;
pub mod focus;
pub mod gizmo;
pub mod gizmos;
pub mod helper;
pub mod input;
pub mod picker;
pub mod point_picker;
pub mod state_machine;
pub mod viewport;

pub use camera::{Camera, Ray};
pub use composite::CompositeGizmo;
pub use focus::{FocusArbiter, FocusClaim};
pub use gizmo::{CommandFlow, Gizmo, GizmoCommand, GizmoContext, GizmoHandle, GizmoView, Mode};
pub use gizmos::{AngleGizmo, DistanceGizmo, InputMode, MagnitudeState};
pub use helper::{DashedLineHelper, GizmoHelper, HelperScene, NodeId};
pub use input::{EventTarget, InputRouter, PointerKind};
pub use picker::{BoxPicker, Intersection, Intersector, Picker, RingPicker, SpherePicker};
pub use point_picker::{ConstructionPlane, PointPicker, PointResult, FINISH_POINT_PICKER};
pub use state_machine::{GizmoState, GizmoStateMachine, MovementInfo};
pub use viewport::{HeadlessViewport, PointerSample, Viewport, ViewportId};
