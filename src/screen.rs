use anyhow::bail;
use cgmath::Point2;
use log::{info, trace, warn};
use std::rc::Rc;

use crate::assets::{AssetKind, AssetManager};
use crate::camera::OrthographicCamera;
use crate::canvas::Canvas;
use crate::character::Character;
use crate::game_params::GameParams;
use crate::map_renderer::MapRenderer;
use crate::physics::{self, FallStep};
use crate::tile_map::TileMap;
use crate::viewport::Viewport;

// Lifecycle of a screen, driven by the Game. `show` runs once before the first frame and
// `dispose` once when the screen is discarded.
pub trait Screen {
    fn show(&mut self, assets: &mut AssetManager) -> anyhow::Result<()>;
    fn render(&mut self, delta: std::time::Duration, canvas: &mut dyn Canvas);
    fn resize(&mut self, width: u32, height: u32);
    fn pause(&mut self) {}
    fn resume(&mut self) {}
    fn hide(&mut self) {}
    fn dispose(&mut self, assets: &mut AssetManager);
}

// Everything built by `show`.
struct Level {
    viewport: Viewport,
    map: Rc<TileMap>,
    map_renderer: MapRenderer,
    character: Character,
}

// Shows the map and lets the character fall onto the collision layer.
pub struct GameScreen {
    params: GameParams,
    level: Option<Level>,
    frame: u64,
}

impl GameScreen {
    pub fn new(params: GameParams) -> Self {
        GameScreen {
            params,
            level: None,
            frame: 0,
        }
    }

    fn load_resources(&self, assets: &mut AssetManager) -> anyhow::Result<()> {
        assets.load(&self.params.level_params.map, AssetKind::TileMap);
        assets.load(
            &self.params.character_params.sprite_sheet,
            AssetKind::Texture,
        );
        // Blocks until everything is loaded.
        assets.finish_loading()
    }

    fn release_resources(&self, assets: &mut AssetManager) {
        for name in &[
            &self.params.level_params.map,
            &self.params.character_params.sprite_sheet,
        ] {
            if assets.is_loaded(name) {
                assets.unload(name);
            }
        }
    }

    fn create_level(&self, assets: &AssetManager) -> anyhow::Result<Level> {
        let width = self.params.camera_width;
        let height = self.params.camera_height;
        let mut camera = OrthographicCamera::new(width, height);
        camera.look_at(Point2::new(width / 2.0, height / 2.0));
        let viewport = Viewport::new(self.params.scaling.into(), width, height, camera);

        let level_params = &self.params.level_params;
        let map = assets.get_map(&level_params.map)?;
        if map.layer(level_params.collision_layer).is_none() {
            bail!(
                "map '{}' has {} layers, no collision layer at index {}",
                level_params.map,
                map.layers().len(),
                level_params.collision_layer
            );
        }
        if map.tile_width as f32 != level_params.cell_size {
            warn!(
                "Map tiles are {} units but collision cells are {}",
                map.tile_width, level_params.cell_size
            );
        }

        let character_params = &self.params.character_params;
        let sheet = assets.get_texture(&character_params.sprite_sheet)?;
        let mut character = Character::new(
            sheet,
            character_params.frame_width,
            character_params.frame_height,
            character_params.fall_velocity,
        );
        character.set_position(
            width * character_params.start_x,
            height * character_params.start_y,
        );

        Ok(Level {
            viewport,
            map,
            map_renderer: MapRenderer::new(self.params.color_map),
            character,
        })
    }

    // One fall step against the collision layer.
    fn move_character(
        level: &mut Level,
        cell_size: f32,
        collision_layer: usize,
    ) -> Option<FallStep> {
        let layer = level.map.layer(collision_layer)?;
        let character = &mut level.character;
        let step = physics::resolve_fall(
            character.position(),
            character.fall_velocity(),
            cell_size,
            layer,
        );
        match step {
            FallStep::Falling { .. } => character.fall(),
            FallStep::Landed { position, .. } => character.set_position(position.x, position.y),
        }
        Some(step)
    }

    pub fn character(&self) -> Option<&Character> {
        self.level.as_ref().map(|l| &l.character)
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.level.as_ref().map(|l| &l.viewport)
    }

    pub fn is_shown(&self) -> bool {
        self.level.is_some()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl Screen for GameScreen {
    fn show(&mut self, assets: &mut AssetManager) -> anyhow::Result<()> {
        let level = match self
            .load_resources(assets)
            .and_then(|_| self.create_level(assets))
        {
            Ok(level) => level,
            Err(e) => {
                self.release_resources(assets);
                return Err(e);
            }
        };
        info!(
            "Showing map '{}' of {:?} world units with the character at {:?}",
            self.params.level_params.map,
            level.map.world_size(),
            level.character.position()
        );
        self.level = Some(level);
        self.frame = 0;
        Ok(())
    }

    // The fall step is per frame, independent of `delta`.
    fn render(&mut self, delta: std::time::Duration, canvas: &mut dyn Canvas) {
        let level = match self.level.as_mut() {
            Some(level) => level,
            None => {
                warn!("render called before show");
                return;
            }
        };
        let step = GameScreen::move_character(
            level,
            self.params.level_params.cell_size,
            self.params.level_params.collision_layer,
        );
        trace!("frame {} ({:?}): {:?}", self.frame, delta, step);

        canvas.clear(self.params.clear_color);
        canvas.set_projection(level.viewport.projection());

        level.map_renderer.set_view(level.viewport.camera());
        level.map_renderer.render(&level.map, canvas);

        if level
            .character
            .sprite()
            .bounds()
            .overlaps(&level.map_renderer.view())
        {
            level.character.render(canvas);
        }
        self.frame += 1;
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(level) = self.level.as_mut() {
            level.viewport.update(width, height);
        }
    }

    fn pause(&mut self) {
        info!("Paused at frame {}", self.frame);
    }

    fn resume(&mut self) {
        info!("Resumed at frame {}", self.frame);
    }

    fn hide(&mut self) {
        info!("Hidden at frame {}", self.frame);
    }

    fn dispose(&mut self, assets: &mut AssetManager) {
        if self.level.take().is_some() {
            self.release_resources(assets);
            info!("Disposed game screen");
        }
    }
}
