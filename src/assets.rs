use anyhow::{anyhow, bail, Context};
use log::{info, warn};
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;

use crate::texture::Texture;
use crate::tile_map::TileMap;

// Default assets compiled into the binary.
#[derive(rust_embed::RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/assets/"]
pub struct EmbeddedAssets;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssetKind {
    TileMap,
    Texture,
}

#[derive(Debug, Clone)]
enum Asset {
    TileMap(Rc<TileMap>),
    Texture(Rc<Texture>),
}

impl Asset {
    fn kind(&self) -> AssetKind {
        match self {
            Asset::TileMap(_) => AssetKind::TileMap,
            Asset::Texture(_) => AssetKind::Texture,
        }
    }
}

// Where asset bytes come from. Files on disk shadow the embedded copies.
#[derive(Debug, Clone)]
pub struct AssetSource {
    root: Option<PathBuf>,
    use_embedded: bool,
}

impl AssetSource {
    pub fn directory(root: impl Into<PathBuf>) -> Self {
        AssetSource {
            root: Some(root.into()),
            use_embedded: false,
        }
    }

    pub fn embedded() -> Self {
        AssetSource {
            root: None,
            use_embedded: true,
        }
    }

    pub fn with_fallback(root: impl Into<PathBuf>) -> Self {
        AssetSource {
            root: Some(root.into()),
            use_embedded: true,
        }
    }

    pub fn read(&self, name: &str) -> anyhow::Result<Vec<u8>> {
        if let Some(root) = &self.root {
            let path = root.join(name);
            if path.is_file() {
                return std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()));
            }
        }
        if self.use_embedded {
            if let Some(bytes) = EmbeddedAssets::get(name) {
                return Ok(bytes.into_owned());
            }
        }
        bail!("asset '{}' not found", name)
    }
}

// A loaded asset stays alive while it was requested by name or a loaded map depends on it.
struct Loaded {
    asset: Asset,
    requested: bool,
    dependents: usize,
}

pub struct AssetManager {
    source: AssetSource,
    queue: VecDeque<(String, AssetKind)>,
    loaded: BTreeMap<String, Loaded>,
}

impl AssetManager {
    pub fn new(source: AssetSource) -> Self {
        AssetManager {
            source,
            queue: VecDeque::new(),
            loaded: BTreeMap::new(),
        }
    }

    // Queues an asset. Nothing is read until finish_loading. Requesting an asset that is only
    // loaded as a dependency keeps it alive on its own.
    pub fn load(&mut self, name: &str, kind: AssetKind) {
        if let Some(entry) = self.loaded.get_mut(name) {
            entry.requested = true;
            return;
        }
        if self.queue.iter().any(|(n, _)| n == name) {
            return;
        }
        self.queue.push_back((name.to_string(), kind));
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    // Blocks until every queued asset is decoded. Maps pull in their tileset.
    pub fn finish_loading(&mut self) -> anyhow::Result<()> {
        while let Some((name, kind)) = self.queue.pop_front() {
            // Pulled in by a map earlier in the queue.
            if let Some(entry) = self.loaded.get_mut(&name) {
                entry.requested = true;
                continue;
            }
            let asset = match self.load_now(&name, kind) {
                Ok(asset) => asset,
                Err(e) => {
                    self.queue.clear();
                    return Err(e);
                }
            };
            info!("Loaded {:?} '{}'", kind, name);
            self.loaded.insert(
                name,
                Loaded {
                    asset,
                    requested: true,
                    dependents: 0,
                },
            );
        }
        Ok(())
    }

    fn load_now(&mut self, name: &str, kind: AssetKind) -> anyhow::Result<Asset> {
        let bytes = self.source.read(name)?;
        match kind {
            AssetKind::Texture => {
                let texture = Texture::from_bytes(&bytes)
                    .with_context(|| format!("Failed to decode texture '{}'", name))?;
                Ok(Asset::Texture(Rc::new(texture)))
            }
            AssetKind::TileMap => {
                let text = String::from_utf8(bytes)
                    .with_context(|| format!("Map '{}' is not utf-8", name))?;
                let mut map = TileMap::parse(&text)
                    .with_context(|| format!("Failed to parse map '{}'", name))?;
                if let Some(tileset) = map.tileset_name.clone() {
                    if !self.loaded.contains_key(&tileset) {
                        let texture = self
                            .load_now(&tileset, AssetKind::Texture)
                            .with_context(|| format!("Loading tileset of map '{}'", name))?;
                        self.loaded.insert(
                            tileset.clone(),
                            Loaded {
                                asset: texture,
                                requested: false,
                                dependents: 0,
                            },
                        );
                    }
                    map.tileset = Some(self.get_texture(&tileset)?);
                    if let Some(entry) = self.loaded.get_mut(&tileset) {
                        entry.dependents += 1;
                    }
                }
                Ok(Asset::TileMap(Rc::new(map)))
            }
        }
    }

    fn wrong_kind(name: &str, asset: &Asset, kind: AssetKind) -> anyhow::Error {
        anyhow!(
            "asset '{}' is a {:?}, not a {:?}",
            name,
            asset.kind(),
            kind
        )
    }

    pub fn get_map(&self, name: &str) -> anyhow::Result<Rc<TileMap>> {
        match self.loaded.get(name).map(|entry| &entry.asset) {
            Some(Asset::TileMap(map)) => Ok(Rc::clone(map)),
            Some(other) => Err(Self::wrong_kind(name, other, AssetKind::TileMap)),
            None => bail!("asset '{}' is not loaded", name),
        }
    }

    pub fn get_texture(&self, name: &str) -> anyhow::Result<Rc<Texture>> {
        match self.loaded.get(name).map(|entry| &entry.asset) {
            Some(Asset::Texture(texture)) => Ok(Rc::clone(texture)),
            Some(other) => Err(Self::wrong_kind(name, other, AssetKind::Texture)),
            None => bail!("asset '{}' is not loaded", name),
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains_key(name)
    }

    pub fn loaded_names(&self) -> impl Iterator<Item = &str> {
        self.loaded.keys().map(|k| k.as_str())
    }

    // Withdraws the request for `name`. The manager drops its handle once no loaded map depends
    // on the asset either; the resource is freed once every other handle is gone.
    pub fn unload(&mut self, name: &str) -> bool {
        let entry = match self.loaded.get_mut(name) {
            Some(entry) => entry,
            None => {
                warn!("unload of unknown asset '{}'", name);
                return false;
            }
        };
        entry.requested = false;
        if entry.dependents > 0 {
            info!(
                "Keeping '{}', still needed by {} maps",
                name, entry.dependents
            );
            return true;
        }
        self.remove(name);
        true
    }

    fn remove(&mut self, name: &str) {
        if let Some(entry) = self.loaded.remove(name) {
            if let Asset::TileMap(map) = &entry.asset {
                if let Some(tileset) = &map.tileset_name {
                    self.release_dependency(tileset);
                }
            }
            info!("Unloaded {:?} '{}'", entry.asset.kind(), name);
        }
    }

    fn release_dependency(&mut self, name: &str) {
        if let Some(entry) = self.loaded.get_mut(name) {
            entry.dependents = entry.dependents.saturating_sub(1);
            if entry.dependents == 0 && !entry.requested {
                self.remove(name);
            }
        }
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.loaded.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_assets_present() {
        for entry in EmbeddedAssets::iter() {
            println!("Found asset: {:?}", entry);
        }
        assert!(EmbeddedAssets::get("map.toml").is_some());
        assert!(EmbeddedAssets::get("character.png").is_some());
        assert!(EmbeddedAssets::get("tiles.png").is_some());
    }

    #[test]
    fn load_defaults() {
        let mut assets = AssetManager::new(AssetSource::embedded());
        assets.load("map.toml", AssetKind::TileMap);
        assets.load("character.png", AssetKind::Texture);
        assets.load("map.toml", AssetKind::TileMap);
        assert_eq!(assets.queued(), 2);
        assert!(!assets.is_loaded("map.toml"));
        assets.finish_loading().unwrap();
        assert_eq!(assets.queued(), 0);

        let map = assets.get_map("map.toml").unwrap();
        assert!(map.layer(1).is_some());
        assert!(map.tileset.is_some());
        assert!(assets.is_loaded("tiles.png"));
        assert!(assets.get_texture("character.png").is_ok());
        assert_eq!(assets.loaded_names().count(), 3);
    }

    #[test]
    fn wrong_kind_and_missing() {
        let mut assets = AssetManager::new(AssetSource::embedded());
        assets.load("character.png", AssetKind::Texture);
        assets.finish_loading().unwrap();
        assert!(assets.get_map("character.png").is_err());
        assert!(assets.get_texture("nope.png").is_err());
    }

    #[test]
    fn failed_load_clears_queue() {
        let mut assets = AssetManager::new(AssetSource::embedded());
        assets.load("missing.toml", AssetKind::TileMap);
        assets.load("character.png", AssetKind::Texture);
        assert!(assets.finish_loading().is_err());
        assert_eq!(assets.queued(), 0);
        assert!(!assets.is_loaded("character.png"));
    }

    #[test]
    fn directory_shadows_embedded() {
        let dir = std::env::temp_dir().join(format!("tilefall-assets-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("map.toml"),
            "width = 1\nheight = 1\ntile_width = 8\ntile_height = 8\n\
             [[layers]]\nname = \"ground\"\ndata = \"1\"\n",
        )
        .unwrap();
        let mut assets = AssetManager::new(AssetSource::with_fallback(&dir));
        assets.load("map.toml", AssetKind::TileMap);
        assets.load("character.png", AssetKind::Texture);
        assets.finish_loading().unwrap();
        let map = assets.get_map("map.toml").unwrap();
        assert_eq!(map.tile_width, 8);
        assert!(map.tileset.is_none());
        std::fs::remove_dir_all(&dir).unwrap();

        let only_dir = AssetSource::directory(&dir);
        assert!(only_dir.read("character.png").is_err());
    }

    #[test]
    fn unload_releases_tileset() {
        let mut assets = AssetManager::new(AssetSource::embedded());
        assets.load("map.toml", AssetKind::TileMap);
        assets.finish_loading().unwrap();
        let map = assets.get_map("map.toml").unwrap();
        assert!(assets.unload("map.toml"));
        assert!(!assets.is_loaded("tiles.png"));
        assert!(!assets.unload("map.toml"));
        // Outstanding handles stay valid.
        assert!(map.layer(0).is_some());
        assets.clear();
        assert_eq!(assets.loaded_names().count(), 0);
    }

    #[test]
    fn requested_tileset_survives_map_unload() {
        let mut assets = AssetManager::new(AssetSource::embedded());
        assets.load("tiles.png", AssetKind::Texture);
        assets.load("map.toml", AssetKind::TileMap);
        assets.finish_loading().unwrap();
        assert!(assets.unload("map.toml"));
        assert!(assets.is_loaded("tiles.png"));
        assert!(assets.unload("tiles.png"));
        assert_eq!(assets.loaded_names().count(), 0);
    }

    #[test]
    fn tileset_requested_after_its_map() {
        let mut assets = AssetManager::new(AssetSource::embedded());
        assets.load("map.toml", AssetKind::TileMap);
        assets.load("tiles.png", AssetKind::Texture);
        assets.finish_loading().unwrap();
        assets.unload("map.toml");
        assert!(assets.is_loaded("tiles.png"));
    }

    #[test]
    fn tileset_kept_while_a_map_needs_it() {
        let mut assets = AssetManager::new(AssetSource::embedded());
        assets.load("map.toml", AssetKind::TileMap);
        assets.finish_loading().unwrap();
        assert!(assets.unload("tiles.png"));
        assert!(assets.is_loaded("tiles.png"));
        assets.unload("map.toml");
        assert_eq!(assets.loaded_names().count(), 0);
    }

    #[test]
    fn shared_tileset() {
        let dir = std::env::temp_dir().join(format!("tilefall-shared-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("small.toml"),
            "width = 1\nheight = 1\ntile_width = 16\ntile_height = 16\n\
             tileset = \"tiles.png\"\n[[layers]]\nname = \"ground\"\ndata = \"1\"\n",
        )
        .unwrap();
        let mut assets = AssetManager::new(AssetSource::with_fallback(&dir));
        assets.load("map.toml", AssetKind::TileMap);
        assets.load("small.toml", AssetKind::TileMap);
        assets.finish_loading().unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        let small = assets.get_map("small.toml").unwrap();
        let tileset = assets.get_texture("tiles.png").unwrap();
        assert!(Rc::ptr_eq(small.tileset.as_ref().unwrap(), &tileset));

        assets.unload("map.toml");
        assert!(assets.is_loaded("tiles.png"));
        assets.unload("small.toml");
        assert!(!assets.is_loaded("tiles.png"));
    }
}
