use log::trace;

use crate::camera::{OrthographicCamera, WorldRect};
use crate::canvas::{Canvas, Color};
use crate::color_maps;
use crate::texture::{Texture, TextureRegion};
use crate::tile_map::{TileId, TileMap};

const PALETTE_SIZE: u32 = 16;

// Draws the visible part of every layer of a tile map, bottom layer first.
pub struct MapRenderer {
    view: WorldRect,
    palette: image::RgbaImage,
}

// Tileset frame for a tile id. Ids start at 1 and run left to right, top to bottom.
pub fn tile_region(tileset: &Texture, id: TileId, tile_size: u32) -> Option<TextureRegion> {
    if id == 0 || tile_size == 0 {
        return None;
    }
    let columns = tileset.width() / tile_size;
    if columns == 0 {
        return None;
    }
    let index = id - 1;
    let x = (index % columns) * tile_size;
    let y = (index / columns).checked_mul(tile_size)?;
    if y.checked_add(tile_size)? > tileset.height() {
        return None;
    }
    Some(TextureRegion {
        x,
        y,
        width: tile_size,
        height: tile_size,
    })
}

impl MapRenderer {
    pub fn new(color_map: usize) -> Self {
        MapRenderer {
            view: WorldRect::new(0.0, 0.0, 0.0, 0.0),
            palette: color_maps::create_color_map(
                PALETTE_SIZE,
                color_maps::get_color_map_from_index(color_map),
            ),
        }
    }

    pub fn set_view(&mut self, camera: &OrthographicCamera) {
        self.view = camera.visible_rect();
    }

    pub fn view(&self) -> WorldRect {
        self.view
    }

    fn palette_color(&self, id: TileId) -> Color {
        self.palette.get_pixel(id % PALETTE_SIZE, 0).0
    }

    // Cell range overlapping the view, clamped to the map.
    fn visible_cells(&self, map: &TileMap) -> (std::ops::Range<u32>, std::ops::Range<u32>) {
        let clamp = |v: f32, cells: u32| v.max(0.0).min(cells as f32) as u32;
        let tile_width = map.tile_width as f32;
        let tile_height = map.tile_height as f32;
        let columns = clamp((self.view.x / tile_width).floor(), map.width)
            ..clamp((self.view.right() / tile_width).ceil(), map.width);
        let rows = clamp((self.view.y / tile_height).floor(), map.height)
            ..clamp((self.view.top() / tile_height).ceil(), map.height);
        (columns, rows)
    }

    // Returns the number of tiles drawn.
    pub fn render(&self, map: &TileMap, canvas: &mut dyn Canvas) -> usize {
        let (columns, rows) = self.visible_cells(map);
        let mut drawn = 0;
        for layer in map.layers() {
            for row in rows.clone() {
                for column in columns.clone() {
                    let id = match layer.cell(column as i32, row as i32) {
                        Some(id) => id,
                        None => continue,
                    };
                    let dest = WorldRect::new(
                        (column * map.tile_width) as f32,
                        (row * map.tile_height) as f32,
                        map.tile_width as f32,
                        map.tile_height as f32,
                    );
                    let region = map
                        .tileset
                        .as_ref()
                        .and_then(|t| tile_region(t, id, map.tile_width).map(|r| (t, r)));
                    match region {
                        Some((tileset, region)) => canvas.draw_region(tileset, region, dest),
                        None => canvas.fill_rect(dest, self.palette_color(id)),
                    }
                    drawn += 1;
                }
            }
        }
        trace!("Drew {} tiles", drawn);
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::FrameCanvas;
    use crate::tile_map::TileLayer;
    use cgmath::Point2;
    use std::rc::Rc;

    fn ground_map() -> TileMap {
        let mut ground = TileLayer::new("ground", 10, 10);
        for column in 0..10 {
            ground.set(column, 0, 1);
        }
        ground.set(9, 9, 2);
        TileMap::new(10, 10, 16, vec![TileLayer::new("background", 10, 10), ground])
    }

    #[test]
    fn region_lookup() {
        let tileset = Texture::from_image(image::RgbaImage::new(48, 32));
        assert_eq!(tile_region(&tileset, 0, 16), None);
        assert_eq!(
            tile_region(&tileset, 1, 16),
            Some(TextureRegion {
                x: 0,
                y: 0,
                width: 16,
                height: 16
            })
        );
        assert_eq!(tile_region(&tileset, 5, 16).map(|r| (r.x, r.y)), Some((16, 16)));
        assert_eq!(tile_region(&tileset, 7, 16), None);
        assert_eq!(tile_region(&tileset, 0x8000_0001, 16), None);
        assert_eq!(tile_region(&tileset, u32::MAX, 1), None);
    }

    #[test]
    fn culls_to_view() {
        let map = ground_map();
        let mut renderer = MapRenderer::new(0);
        let mut camera = OrthographicCamera::new(80.0, 80.0);
        camera.look_at(Point2::new(40.0, 40.0));
        renderer.set_view(&camera);
        let mut canvas = FrameCanvas::new(80, 80);
        // Columns 0..5 of the bottom row.
        assert_eq!(renderer.render(&map, &mut canvas), 5);

        camera.look_at(Point2::new(120.0, 120.0));
        renderer.set_view(&camera);
        // Only the top right corner tile.
        assert_eq!(renderer.render(&map, &mut canvas), 1);

        camera.viewport_width = 160.0;
        camera.viewport_height = 160.0;
        camera.look_at(Point2::new(80.0, 80.0));
        renderer.set_view(&camera);
        assert_eq!(renderer.render(&map, &mut canvas), 11);
    }

    #[test]
    fn palette_fill_without_tileset() {
        let map = ground_map();
        let mut renderer = MapRenderer::new(1);
        let mut camera = OrthographicCamera::new(160.0, 160.0);
        camera.look_at(Point2::new(80.0, 80.0));
        renderer.set_view(&camera);
        let mut canvas = FrameCanvas::new(160, 160);
        renderer.render(&map, &mut canvas);
        assert_eq!(canvas.pixel(0, 159), renderer.palette_color(1));
        assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(canvas.pixel(159, 0), renderer.palette_color(2));
    }

    #[test]
    fn tileset_draw() {
        let mut map = ground_map();
        let mut sheet = image::RgbaImage::new(16, 16);
        for pixel in sheet.pixels_mut() {
            *pixel = image::Rgba([10, 20, 30, 255]);
        }
        map.tileset = Some(Rc::new(Texture::from_image(sheet)));
        let mut renderer = MapRenderer::new(0);
        let mut camera = OrthographicCamera::new(160.0, 160.0);
        camera.look_at(Point2::new(80.0, 80.0));
        renderer.set_view(&camera);
        let mut canvas = FrameCanvas::new(160, 160);
        renderer.render(&map, &mut canvas);
        assert_eq!(canvas.pixel(5, 150), [10, 20, 30, 255]);
        // Tile 2 is outside the one tile tileset and falls back to the palette.
        assert_eq!(canvas.pixel(159, 0), renderer.palette_color(2));
    }
}
