use serde::{Deserialize, Serialize};

// Parameters that define the game. These don't change at runtime.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GameParams {
    // Size of the camera in world units.
    pub camera_width: f32,
    pub camera_height: f32,
    // Initial size of the output surface in pixels.
    pub window_width: u32,
    pub window_height: u32,

    pub fps: f64,
    pub clear_color: [f32; 4],
    pub scaling: ScalingParam,
    pub color_map: usize,

    #[serde(default)]
    pub level_params: LevelParams,

    #[serde(default)]
    pub character_params: CharacterParams,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScalingParam {
    Stretch,
    Fit,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LevelParams {
    pub map: String,
    pub cell_size: f32,
    pub collision_layer: usize,
}

impl Default for LevelParams {
    fn default() -> Self {
        LevelParams {
            map: "map.toml".to_string(),
            cell_size: 16.0,
            collision_layer: 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CharacterParams {
    pub sprite_sheet: String,
    pub frame_width: u32,
    pub frame_height: u32,
    // Per-frame vertical step in world units. Negative is down.
    pub fall_velocity: f32,
    // Starting position as a fraction of the camera size.
    pub start_x: f32,
    pub start_y: f32,
}

impl Default for CharacterParams {
    fn default() -> Self {
        CharacterParams {
            sprite_sheet: "character.png".to_string(),
            frame_width: 16,
            frame_height: 32,
            fall_velocity: crate::character::Character::DEFAULT_FALL_VELOCITY,
            start_x: 0.1,
            start_y: 0.9,
        }
    }
}

impl std::str::FromStr for GameParams {
    type Err = toml::de::Error;
    fn from_str(serialized: &str) -> Result<Self, Self::Err> {
        let params = toml::from_str(serialized)?;
        Ok(params)
    }
}

impl Default for GameParams {
    fn default() -> Self {
        GameParams {
            camera_width: 800.0,
            camera_height: 480.0,
            window_width: 800,
            window_height: 480,
            fps: 60.0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            scaling: ScalingParam::Stretch,
            color_map: 0,
            level_params: LevelParams::default(),
            character_params: CharacterParams::default(),
        }
    }
}

pub fn read_config_from_file(path: &str) -> anyhow::Result<GameParams> {
    let params = std::fs::read_to_string(path)?.parse()?;
    Ok(params)
}

pub fn get_game_config(path: &str) -> GameParams {
    match read_config_from_file(path) {
        Ok(params) => params,
        Err(e) => {
            log::error!("Failed to parse config file({}): {:?}", path, e);
            get_game_config_from_default_file()
        }
    }
}

pub fn get_game_config_from_default_file() -> GameParams {
    let config_data = include_str!("../game_config.toml");
    match config_data.parse() {
        Ok(params) => params,
        Err(e) => {
            log::error!(
                "Failed to parse config file({}): {:?}",
                "../game_config.toml",
                e
            );
            GameParams::default()
        }
    }
}
