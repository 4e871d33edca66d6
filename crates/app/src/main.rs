//! Entry point for Vitrina: logging, CLI flags, then the gallery window or
//! a headless asset check.

mod config;

use anyhow::Result;
use platform::{PlatformConfig, manifest::GalleryManifest};

use crate::config::AppConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_args(std::env::args().skip(1));
    let mut manifest = match &config.gallery {
        Some(path) => GalleryManifest::load(path)?,
        None => GalleryManifest::builtin(),
    };
    if let Some(dir) = &config.assets {
        manifest.asset.dir = dir.clone();
    }

    if config.check_assets {
        log::info!(
            "Checking assets in {}",
            manifest.asset.dir.display()
        );
        return platform::check_assets(&manifest.asset);
    }

    log::info!(
        "Starting Vitrina. Backend: {:?}, show_fps={}, window_size={}x{}, items={}",
        config.backends,
        config.show_fps,
        config.width,
        config.height,
        manifest.items.len()
    );

    platform::run(PlatformConfig {
        backends: config.backends,
        show_fps: config.show_fps,
        width: config.width,
        height: config.height,
        manifest,
    })?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
