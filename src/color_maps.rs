#[allow(dead_code)]
#[repr(u8)]
#[derive(Copy, Clone)]
enum ColorMap {
    Viridis = 0,
    Magma = 1,
    Inferno = 2,
    Plasma = 3,
}

use lazy_static::lazy_static;
lazy_static! {
    static ref COLOR_MAPS: [scarlet::colormap::ListedColorMap; 4] = [
        scarlet::colormap::ListedColorMap::viridis(),
        scarlet::colormap::ListedColorMap::magma(),
        scarlet::colormap::ListedColorMap::inferno(),
        scarlet::colormap::ListedColorMap::plasma(),
    ];
}

// Out of range indices wrap around.
pub fn get_color_map_from_index(i: usize) -> &'static scarlet::colormap::ListedColorMap {
    &COLOR_MAPS[i % COLOR_MAPS.len()]
}

// Samples a color map into a size x 1 rgba strip.
pub fn create_color_map(size: u32, cm: &scarlet::colormap::ListedColorMap) -> image::RgbaImage {
    image::ImageBuffer::<image::Rgba<u8>, Vec<u8>>::from_fn(size, 1, |x, _y| {
        let parameter = if size > 1 {
            x as f64 / (size - 1) as f64
        } else {
            0.0
        };
        let color_point: scarlet::color::RGBColor =
            scarlet::colormap::ColorMap::transform_single(cm, parameter);
        image::Rgba([
            color_point.int_r(),
            color_point.int_g(),
            color_point.int_b(),
            255,
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_opaque_and_varies() {
        let palette = create_color_map(8, get_color_map_from_index(ColorMap::Viridis as usize));
        assert_eq!(palette.dimensions(), (8, 1));
        assert!(palette.pixels().all(|p| p[3] == 255));
        assert_ne!(palette.get_pixel(0, 0), palette.get_pixel(7, 0));
    }

    #[test]
    fn index_wraps() {
        let a = create_color_map(4, get_color_map_from_index(ColorMap::Magma as usize));
        let b = create_color_map(4, get_color_map_from_index(5));
        assert_eq!(a, b);
        assert_eq!(create_color_map(1, get_color_map_from_index(0)).width(), 1);
    }
}
