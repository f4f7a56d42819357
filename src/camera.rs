use cgmath::{Point2, Vector4};

const NEAR: f32 = 1e-6;
const FAR: f32 = 10000.0;

// Axis aligned rectangle in world units, origin at the bottom left.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WorldRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl WorldRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        WorldRect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn overlaps(&self, other: &WorldRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }
}

pub struct OrthographicCamera {
    // Center of the view in world units.
    pub position: Point2<f32>,
    pub viewport_width: f32,
    pub viewport_height: f32,
    combined: cgmath::Matrix4<f32>,
}

impl OrthographicCamera {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        let mut camera = OrthographicCamera {
            position: Point2::new(0.0, 0.0),
            viewport_width,
            viewport_height,
            combined: cgmath::Matrix4::from_scale(1.0),
        };
        camera.update();
        camera
    }

    // Recomputes the projection. Call after changing position or size.
    pub fn update(&mut self) {
        let half_width = self.viewport_width / 2.0;
        let half_height = self.viewport_height / 2.0;
        self.combined = cgmath::ortho(
            self.position.x - half_width,
            self.position.x + half_width,
            self.position.y - half_height,
            self.position.y + half_height,
            NEAR,
            FAR,
        );
    }

    pub fn combined(&self) -> cgmath::Matrix4<f32> {
        self.combined
    }

    pub fn look_at(&mut self, center: Point2<f32>) {
        self.position = center;
        self.update();
    }

    // World point to normalized device coordinates, both axes in [-1, 1] when visible.
    pub fn project(&self, point: Point2<f32>) -> Point2<f32> {
        let ndc = self.combined * Vector4::new(point.x, point.y, 0.0, 1.0);
        Point2::new(ndc.x, ndc.y)
    }

    pub fn visible_rect(&self) -> WorldRect {
        WorldRect::new(
            self.position.x - self.viewport_width / 2.0,
            self.position.y - self.viewport_height / 2.0,
            self.viewport_width,
            self.viewport_height,
        )
    }
}
