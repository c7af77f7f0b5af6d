use glam::{Mat4, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,   // radians
    pub pitch: f32, // radians
    pub fov: f32,   // degrees
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Multiplier on the on-screen size of gizmos.
    pub gizmo_scale: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 10.0,
            yaw: -45.0f32.to_radians(),
            pitch: 45.0f32.to_radians(),
            fov: 45.0,
            aspect_ratio: 1.0,
            near: 0.1,
            far: 1000.0,
            min_distance: 0.1,
            max_distance: 1000.0,
            gizmo_scale: 1.0,
        }
    }
}

impl Camera {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance,
            ..Default::default()
        }
    }

    /// Camera looking straight down the Z axis at `target`; screen right is +X, screen up is +Y.
    pub fn top(target: Vec3, distance: f32) -> Self {
        let mut camera = Self::new(target, distance);
        camera.set_view(0.0, 90.0);
        camera
    }

    pub fn with_gizmo_scale(mut self, scale: f32) -> Self {
        self.gizmo_scale = scale;
        self
    }

    pub fn update_aspect_ratio(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect_ratio = width / height;
        }
    }

    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch += delta_pitch;

        // Clamp pitch to avoid flipping over the pole
        let limit = 89.0f32.to_radians();
        self.pitch = self.pitch.clamp(-limit, limit);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance -= delta;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }

    pub fn set_view(&mut self, yaw_deg: f32, pitch_deg: f32) {
        self.yaw = yaw_deg.to_radians();
        self.pitch = pitch_deg.to_radians();
    }

    pub fn get_eye_position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();

        // Z-up convention
        let offset = Vec3::new(cos_pitch * cos_yaw, cos_pitch * sin_yaw, sin_pitch) * self.distance;

        self.target + offset
    }

    /// Unit vector from the target back towards the eye.
    ///
    /// This is the normal of any plane that faces the camera.
    pub fn backward(&self) -> Vec3 {
        (self.get_eye_position() - self.target).normalize_or_zero()
    }

    pub fn get_view_matrix(&self) -> Mat4 {
        let eye = self.get_eye_position();
        let forward = (self.target - eye).normalize();

        // Forward parallel to Z (up): use Y as up for vertical views
        let up = if forward.cross(Vec3::Z).length_squared() < 0.001 {
            Vec3::Y
        } else {
            Vec3::Z
        };

        Mat4::look_at_rh(eye, self.target, up)
    }

    pub fn get_projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect_ratio,
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.get_projection_matrix() * self.get_view_matrix()
    }

    /// Project a world point to normalized device coordinates.
    pub fn project(&self, world: Vec3) -> Vec2 {
        self.view_projection().project_point3(world).truncate()
    }

    /// Pointer ray through a point given in normalized device coordinates.
    pub fn ray(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        // perspective_rh maps the near plane to z = 0 and the far plane to z = 1
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }

    /// World-space scale that keeps a gizmo the same size on screen at any zoom.
    pub fn scale_independent_of_zoom(&self, position: Vec3) -> f32 {
        let distance = self.get_eye_position().distance(position);
        let factor = distance * (1.9 * (self.fov.to_radians() / 2.0).tan()).min(7.0);
        factor / 7.0 * self.gizmo_scale
    }

    pub fn fit_to_bounds(&mut self, min: Vec3, max: Vec3) {
        let center = (min + max) * 0.5;
        let size = max - min;
        let max_dim = size.max_element();

        self.target = center;

        // distance = (size/2) / tan(fov/2), with a 1.2 margin
        let fov_rad = self.fov.to_radians();
        let distance = (max_dim * 1.2) / (fov_rad / 2.0).tan();

        self.distance = distance.clamp(self.min_distance, self.max_distance);
    }
}

/// A half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::NEG_Z)
    }
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Parameter along the ray where it crosses the plane, if in front of the origin.
    pub fn plane_distance(&self, point: Vec3, normal: Vec3) -> Option<f32> {
        let denom = normal.dot(self.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        (t >= 0.0).then_some(t)
    }

    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
        self.plane_distance(point, normal).map(|t| self.at(t))
    }
}
