use log::info;

use crate::assets::AssetManager;
use crate::canvas::Canvas;
use crate::screen::Screen;

// Owns the asset manager and forwards lifecycle events to the current screen.
pub struct Game {
    assets: AssetManager,
    screen: Option<Box<dyn Screen>>,
    size: (u32, u32),
}

impl Game {
    pub fn new(assets: AssetManager, width: u32, height: u32) -> Self {
        Game {
            assets,
            screen: None,
            size: (width, height),
        }
    }

    pub fn assets(&self) -> &AssetManager {
        &self.assets
    }

    pub fn has_screen(&self) -> bool {
        self.screen.is_some()
    }

    // Shows `screen` and makes it current. The previous screen is hidden and handed back
    // undisposed. If `show` fails the previous screen stays current.
    pub fn set_screen(
        &mut self,
        mut screen: Box<dyn Screen>,
    ) -> anyhow::Result<Option<Box<dyn Screen>>> {
        screen.show(&mut self.assets)?;
        screen.resize(self.size.0, self.size.1);
        let previous = self.screen.replace(screen);
        Ok(previous.map(|mut previous| {
            previous.hide();
            previous
        }))
    }

    pub fn render(&mut self, delta: std::time::Duration, canvas: &mut dyn Canvas) {
        if let Some(screen) = self.screen.as_mut() {
            screen.render(delta, canvas);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32, canvas: &mut dyn Canvas) {
        info!("Resizing to ({}, {})", width, height);
        self.size = (width, height);
        canvas.resize(width, height);
        if let Some(screen) = self.screen.as_mut() {
            screen.resize(width, height);
        }
    }

    pub fn pause(&mut self) {
        if let Some(screen) = self.screen.as_mut() {
            screen.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Some(screen) = self.screen.as_mut() {
            screen.resume();
        }
    }

    // Disposes a screen returned by set_screen.
    pub fn dispose_screen(&mut self, mut screen: Box<dyn Screen>) {
        screen.dispose(&mut self.assets);
    }

    pub fn dispose(&mut self) {
        if let Some(mut screen) = self.screen.take() {
            screen.hide();
            screen.dispose(&mut self.assets);
        }
        self.assets.clear();
        info!("Game disposed");
    }
}
