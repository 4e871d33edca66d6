//! Platform layer: window, event loop, egui input and the gallery wiring.
//!
//! - Idle by default: the loop waits for input, a finished fetch or a running
//!   viewer session before drawing again.
//! - A finished fetch wakes the loop through a user event; the result itself
//!   is only applied on the UI thread.

mod app;
pub mod gallery;
pub mod manifest;
mod ui;

use anyhow::{Result, anyhow};
use asset::{AssetStore, Ensure};
use parking_lot::Mutex;
use renderer::{ViewerRegion, ViewerSettings};
use winit::event_loop::{ControlFlow, EventLoop};

use crate::{
    app::App,
    gallery::GalleryController,
    manifest::{AssetSpec, GalleryManifest},
};

/// Everything the window needs from the command line.
#[derive(Clone, Debug)]
pub struct PlatformConfig {
    pub backends: wgpu::Backends,
    pub show_fps: bool,
    pub width: u32,
    pub height: u32,
    pub manifest: GalleryManifest,
}

/// Events posted to the loop from other threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppEvent {
    /// The loader thread finished; poll the store.
    AssetReady,
}

/// Open the gallery window. Returns when the window is closed.
pub fn run(config: PlatformConfig) -> Result<()> {
    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let proxy = Mutex::new(event_loop.create_proxy());
    let store = AssetStore::new(config.manifest.asset.source()).with_notifier(move || {
        if proxy.lock().send_event(AppEvent::AssetReady).is_err() {
            log::debug!("Event loop closed before the asset arrived");
        }
    });
    let gallery = GalleryController::new(
        config.manifest.items.clone(),
        store,
        ViewerRegion::new(ViewerSettings::default()),
    );

    let mut app = App::new(&config, gallery);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("Event loop error: {e:?}"))?;
    app.finish()
}

/// Load the model once without opening a window and log what was found.
pub fn check_assets(spec: &AssetSpec) -> Result<()> {
    let mut store = AssetStore::new(spec.source());
    let model = match store.ensure_loaded()? {
        Ensure::Ready(model) => model,
        Ensure::Started | Ensure::Busy => store
            .wait()
            .ok_or_else(|| anyhow!("Asset fetch was not started"))??,
    };

    log::info!(
        "Model '{}': {} parts, {} materials, {} vertices, {} triangles",
        model.name,
        model.parts.len(),
        model.materials.len(),
        model.vertex_count(),
        model.triangle_count()
    );
    if let Some(bounds) = model.bounds() {
        log::info!("  bounds {:?} .. {:?}, size {:?}", bounds.min, bounds.max, bounds.size());
    }
    for material in &model.materials {
        match &material.diffuse_map {
            Some(tex) => log::info!(
                "  material '{}': diffuse map {}x{}",
                material.name,
                tex.width,
                tex.height
            ),
            None => log::info!("  material '{}': no diffuse map", material.name),
        }
    }
    Ok(())
}
