use cgmath::Point2;
use log::info;

use crate::camera::OrthographicCamera;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScalingMode {
    // Fill the whole screen, distorting the aspect ratio.
    Stretch,
    // Keep the aspect ratio and letter box the rest.
    Fit,
}

impl From<crate::game_params::ScalingParam> for ScalingMode {
    fn from(param: crate::game_params::ScalingParam) -> Self {
        match param {
            crate::game_params::ScalingParam::Stretch => ScalingMode::Stretch,
            crate::game_params::ScalingParam::Fit => ScalingMode::Fit,
        }
    }
}

// Pixel rectangle on the output surface, origin at the top left.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

// Everything a canvas needs to place world geometry on screen.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub combined: cgmath::Matrix4<f32>,
    pub screen: ScreenRect,
}

impl Projection {
    // Maps world units 1:1 to pixels of a width x height surface, world origin at the bottom left.
    pub fn pixels(width: u32, height: u32) -> Self {
        Projection {
            combined: cgmath::ortho(0.0, width as f32, 0.0, height as f32, 1e-6, 10000.0),
            screen: ScreenRect {
                x: 0,
                y: 0,
                width,
                height,
            },
        }
    }

    // World is Y-up, pixels are Y-down.
    pub fn world_to_screen(&self, point: Point2<f32>) -> Point2<f32> {
        let ndc = self.combined * cgmath::Vector4::new(point.x, point.y, 0.0, 1.0);
        Point2::new(
            self.screen.x as f32 + (ndc.x + 1.0) / 2.0 * self.screen.width as f32,
            self.screen.y as f32 + (1.0 - ndc.y) / 2.0 * self.screen.height as f32,
        )
    }
}

pub struct Viewport {
    mode: ScalingMode,
    world_width: f32,
    world_height: f32,
    camera: OrthographicCamera,
    screen: ScreenRect,
}

impl Viewport {
    pub fn new(
        mode: ScalingMode,
        world_width: f32,
        world_height: f32,
        camera: OrthographicCamera,
    ) -> Self {
        let mut viewport = Viewport {
            mode,
            world_width,
            world_height,
            camera,
            screen: ScreenRect {
                x: 0,
                y: 0,
                width: world_width as u32,
                height: world_height as u32,
            },
        };
        viewport.apply();
        viewport
    }

    fn apply(&mut self) {
        self.camera.viewport_width = self.world_width;
        self.camera.viewport_height = self.world_height;
        self.camera.update();
    }

    pub fn update(&mut self, screen_width: u32, screen_height: u32) {
        self.screen = match self.mode {
            ScalingMode::Stretch => ScreenRect {
                x: 0,
                y: 0,
                width: screen_width,
                height: screen_height,
            },
            ScalingMode::Fit => {
                let target_aspect = self.world_width / self.world_height;
                let aspect = screen_width as f32 / screen_height.max(1) as f32;
                let (width, height) = if target_aspect > aspect {
                    // Desired view is wider than actual, letter box on top and bottom.
                    (screen_width, (screen_width as f32 / target_aspect).round() as u32)
                } else {
                    // Desired view is taller than actual, letter box on left and right.
                    ((screen_height as f32 * target_aspect).round() as u32, screen_height)
                };
                ScreenRect {
                    x: ((screen_width - width) / 2) as i32,
                    y: ((screen_height - height) / 2) as i32,
                    width,
                    height,
                }
            }
        };
        info!(
            "Viewport {:?} for screen ({}, {}): {:?}",
            self.mode, screen_width, screen_height, self.screen
        );
        self.apply();
    }

    pub fn camera(&self) -> &OrthographicCamera {
        &self.camera
    }

    pub fn screen(&self) -> ScreenRect {
        self.screen
    }

    pub fn projection(&self) -> Projection {
        Projection {
            combined: self.camera.combined(),
            screen: self.screen,
        }
    }
}
