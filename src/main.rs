use log::{error, info};
use tilefall::assets::{AssetManager, AssetSource};
use tilefall::canvas::FrameCanvas;
use tilefall::fps_estimator::FpsEstimator;
use tilefall::game::Game;
use tilefall::screen::GameScreen;

gflags::define! {
    --config: &str = "game_config.toml"
}
gflags::define! {
    --log_filter: &str = "warn,tilefall=info"
}
gflags::define! {
    /// Directory searched before the embedded assets.
    --assets: &str = "assets"
}
gflags::define! {
    --frames: u32 = 240
}
gflags::define! {
    /// The last frame is written here.
    --snapshot: &str = "frame.png"
}
gflags::define! {
    /// Also write every Nth frame next to the snapshot. 0 disables.
    --snapshot_every: u32 = 0
}
gflags::define! {
    /// Sleep between frames to hold the configured fps.
    --realtime = false
}
gflags::define! {
    -h, --help = false
}

// frame.png -> frame_0042.png
fn numbered_path(path: &str, frame: u32) -> String {
    let path = std::path::Path::new(path);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("frame");
    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("png");
    let file_name = format!("{}_{:04}.{}", stem, frame, extension);
    path.with_file_name(file_name).to_string_lossy().into_owned()
}

fn run() -> anyhow::Result<()> {
    let params = tilefall::game_params::get_game_config(CONFIG.flag);
    let width = params.window_width;
    let height = params.window_height;
    let target_fps = params.fps;

    let assets = AssetManager::new(AssetSource::with_fallback(ASSETS.flag));
    let mut game = Game::new(assets, width, height);
    let mut canvas = FrameCanvas::new(width, height);
    game.set_screen(Box::new(GameScreen::new(params)))?;

    info!("Entering render loop...");
    let mut fps = FpsEstimator::new(target_fps, REALTIME.flag);
    for frame in 0..FRAMES.flag {
        let delta = fps.tick();
        game.render(delta, &mut canvas);
        if SNAPSHOT_EVERY.flag > 0 && frame % SNAPSHOT_EVERY.flag == 0 {
            canvas.save(&numbered_path(SNAPSHOT.flag, frame))?;
        }
    }
    fps.report();
    canvas.save(SNAPSHOT.flag)?;
    game.dispose();
    Ok(())
}

fn main() {
    gflags::parse();
    if HELP.flag {
        gflags::print_help_and_exit(0);
    }
    scrub_log::init_with_filter_string(LOG_FILTER.flag).unwrap();
    if let Err(e) = run() {
        error!("{:?}", e);
        std::process::exit(1);
    }
}
