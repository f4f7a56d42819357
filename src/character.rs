use cgmath::Point2;
use log::warn;
use std::rc::Rc;

use crate::camera::WorldRect;
use crate::canvas::Canvas;
use crate::texture::{Texture, TextureRegion};

// A textured quad placed in the world by its bottom left corner.
pub struct Sprite {
    texture: Rc<Texture>,
    region: TextureRegion,
    position: Point2<f32>,
    pub width: f32,
    pub height: f32,
}

impl Sprite {
    pub fn new(texture: Rc<Texture>, region: TextureRegion) -> Self {
        Sprite {
            texture,
            region,
            position: Point2::new(0.0, 0.0),
            width: region.width as f32,
            height: region.height as f32,
        }
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Point2::new(x, y);
    }

    pub fn position(&self) -> Point2<f32> {
        self.position
    }

    pub fn region(&self) -> TextureRegion {
        self.region
    }

    pub fn bounds(&self) -> WorldRect {
        WorldRect::new(self.position.x, self.position.y, self.width, self.height)
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.draw_region(&self.texture, self.region, self.bounds());
    }
}

pub struct Character {
    sprite: Sprite,
    fall_velocity: f32,
}

impl Character {
    pub const DEFAULT_FALL_VELOCITY: f32 = -2.0;

    // The first frame of the sheet is the one shown.
    pub fn new(
        sheet: Rc<Texture>,
        frame_width: u32,
        frame_height: u32,
        fall_velocity: f32,
    ) -> Self {
        let region = match sheet
            .split(frame_width, frame_height)
            .first()
            .and_then(|row| row.first())
        {
            Some(region) => *region,
            None => {
                warn!(
                    "Sprite sheet ({}, {}) is smaller than a ({}, {}) frame, using the whole sheet",
                    sheet.width(),
                    sheet.height(),
                    frame_width,
                    frame_height
                );
                sheet.full_region()
            }
        };
        Character {
            sprite: Sprite::new(sheet, region),
            fall_velocity,
        }
    }

    pub fn x(&self) -> f32 {
        self.sprite.position().x
    }

    pub fn y(&self) -> f32 {
        self.sprite.position().y
    }

    pub fn position(&self) -> Point2<f32> {
        self.sprite.position()
    }

    pub fn fall_velocity(&self) -> f32 {
        self.fall_velocity
    }

    // Moves one step down, unconditionally.
    pub fn fall(&mut self) {
        let position = self.sprite.position();
        self.sprite
            .set_position(position.x, position.y + self.fall_velocity);
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.sprite.set_position(x, y);
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    pub fn render(&self, canvas: &mut dyn Canvas) {
        self.sprite.draw(canvas);
    }
}
