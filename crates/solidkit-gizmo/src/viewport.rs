//! Viewports as seen by gizmos.
//!
//! A viewport owns a camera and a pixel-sized surface that emits pointer
//! events. Gizmos only need to convert client coordinates to normalized
//! device coordinates and to suspend camera navigation while a drag is in
//! progress.

use std::cell::{Cell, RefCell};
use std::fmt;

use glam::Vec2;

use crate::camera::Camera;

/// Identifies a viewport for input routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ViewportId(pub u32);

impl fmt::Display for ViewportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewport#{}", self.0)
    }
}

/// One pointer event in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Horizontal position in [-1, 1], right is positive.
    pub x: f32,
    /// Vertical position in [-1, 1], up is positive.
    pub y: f32,
    /// `0` for the primary button, `-1` when no button changed (move sampling).
    pub button: i32,
}

impl PointerSample {
    pub const PRIMARY: i32 = 0;
    pub const NO_BUTTON: i32 = -1;

    pub fn new(x: f32, y: f32, button: i32) -> Self {
        Self { x, y, button }
    }

    /// A move sample at the given position.
    pub fn moved(position: Vec2) -> Self {
        Self::new(position.x, position.y, Self::NO_BUTTON)
    }

    /// A primary-button sample at the given position.
    pub fn primary(position: Vec2) -> Self {
        Self::new(position.x, position.y, Self::PRIMARY)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl Default for PointerSample {
    fn default() -> Self {
        Self::new(0.0, 0.0, Self::NO_BUTTON)
    }
}

/// What a gizmo needs from a viewport.
pub trait Viewport {
    fn id(&self) -> ViewportId;

    fn camera(&self) -> Camera;

    /// Surface size in pixels, `(width, height)`.
    fn size(&self) -> (f32, f32);

    /// Convert client pixel coordinates to a [`PointerSample`].
    fn normalize(&self, client_x: f32, client_y: f32, button: i32) -> PointerSample {
        let (width, height) = self.size();
        if width <= 0.0 || height <= 0.0 {
            return PointerSample::new(0.0, 0.0, button);
        }
        PointerSample::new(
            (client_x / width) * 2.0 - 1.0,
            -(client_y / height) * 2.0 + 1.0,
            button,
        )
    }

    /// Suspend camera navigation (orbit, pan, zoom).
    fn disable_controls(&self);

    /// Resume camera navigation.
    fn enable_controls(&self);
}

/// A viewport with no window behind it, for tests and scripted sessions.
#[derive(Debug)]
pub struct HeadlessViewport {
    id: ViewportId,
    camera: RefCell<Camera>,
    size: Cell<(f32, f32)>,
    controls_enabled: Cell<bool>,
    disable_count: Cell<usize>,
}

impl HeadlessViewport {
    pub fn new(id: u32, camera: Camera, width: f32, height: f32) -> Self {
        let mut camera = camera;
        camera.update_aspect_ratio(width, height);
        Self {
            id: ViewportId(id),
            camera: RefCell::new(camera),
            size: Cell::new((width, height)),
            controls_enabled: Cell::new(true),
            disable_count: Cell::new(0),
        }
    }

    pub fn set_camera(&self, camera: Camera) {
        let (width, height) = self.size.get();
        let mut camera = camera;
        camera.update_aspect_ratio(width, height);
        *self.camera.borrow_mut() = camera;
    }

    pub fn resize(&self, width: f32, height: f32) {
        self.size.set((width, height));
        self.camera.borrow_mut().update_aspect_ratio(width, height);
    }

    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled.get()
    }

    /// How many times controls were disabled over the viewport's life.
    pub fn disable_count(&self) -> usize {
        self.disable_count.get()
    }
}

impl Viewport for HeadlessViewport {
    fn id(&self) -> ViewportId {
        self.id
    }

    fn camera(&self) -> Camera {
        *self.camera.borrow()
    }

    fn size(&self) -> (f32, f32) {
        self.size.get()
    }

    fn disable_controls(&self) {
        self.controls_enabled.set(false);
        self.disable_count.set(self.disable_count.get() + 1);
    }

    fn enable_controls(&self) {
        self.controls_enabled.set(true);
    }
}
