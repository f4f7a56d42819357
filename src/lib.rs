pub mod assets;
pub mod camera;
pub mod canvas;
pub mod character;
pub mod color_maps;
pub mod fps_estimator;
pub mod game;
pub mod game_params;
pub mod map_renderer;
pub mod physics;
pub mod screen;
pub mod texture;
pub mod tile_map;
pub mod viewport;
