use log::info;

// A decoded RGBA image living in CPU memory. Rust image defaults to row major, top row first.
#[derive(Debug)]
pub struct Texture {
    pub image: image::RgbaImage,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureRegion {
    // Pixel coordinates in the texture, origin at the top left.
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub fn from_image(image: image::RgbaImage) -> Self {
        Texture { image }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let image = image::load_from_memory(bytes)?.into_rgba8();
        info!(
            "Loading image with (width, height) = ({}, {})",
            image.width(),
            image.height()
        );
        Ok(Texture { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn full_region(&self) -> TextureRegion {
        TextureRegion {
            x: 0,
            y: 0,
            width: self.width(),
            height: self.height(),
        }
    }

    // Cuts the texture into frames of the given size. Outer index is the row, top to bottom.
    // Partial frames on the right and bottom edges are dropped.
    pub fn split(&self, frame_width: u32, frame_height: u32) -> Vec<Vec<TextureRegion>> {
        if frame_width == 0 || frame_height == 0 {
            return vec![];
        }
        let columns = self.width() / frame_width;
        let rows = self.height() / frame_height;
        (0..rows)
            .map(|row| {
                (0..columns)
                    .map(|column| TextureRegion {
                        x: column * frame_width,
                        y: row * frame_height,
                        width: frame_width,
                        height: frame_height,
                    })
                    .collect()
            })
            .collect()
    }

    pub fn sample(&self, x: u32, y: u32) -> image::Rgba<u8> {
        *self.image.get_pixel(x, y)
    }
}
