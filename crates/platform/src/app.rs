//! winit application: owns the window, GPU state and egui, and forwards
//! frames to the gallery.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Result, anyhow};
use renderer::GpuState;
use wgpu::SurfaceError;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow},
    window::{Window, WindowId},
};

use crate::{AppEvent, PlatformConfig, gallery::GalleryController, ui};

/// Window plus everything that only exists while it does.
struct Viewport {
    window: Arc<Window>,
    gpu: GpuState,
    egui: egui_winit::State,
}

/// Frames per second averaged over half a second.
struct FpsCounter {
    frames: u32,
    since: Instant,
    value: f32,
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_millis(500);

    fn new(now: Instant) -> Self {
        Self {
            frames: 0,
            since: now,
            value: 0.0,
        }
    }

    fn tick(&mut self, now: Instant) -> f32 {
        self.frames += 1;
        let elapsed = now - self.since;
        if elapsed >= Self::WINDOW {
            self.value = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.since = now;
        }
        self.value
    }
}

pub(crate) struct App {
    backends: wgpu::Backends,
    size: PhysicalSize<u32>,
    gallery: GalleryController,
    egui_ctx: egui::Context,
    viewport: Option<Viewport>,
    fps: Option<FpsCounter>,
    last_frame: Instant,
    /// When egui next wants a frame, if it asked for one.
    repaint_at: Option<Instant>,
    fatal: Option<anyhow::Error>,
}

impl App {
    pub(crate) fn new(config: &PlatformConfig, gallery: GalleryController) -> Self {
        let now = Instant::now();
        Self {
            backends: config.backends,
            size: PhysicalSize::new(config.width.max(1), config.height.max(1)),
            gallery,
            egui_ctx: egui::Context::default(),
            viewport: None,
            fps: config.show_fps.then(|| FpsCounter::new(now)),
            last_frame: now,
            repaint_at: None,
            fatal: None,
        }
    }

    /// Error that ended the loop, if any.
    pub(crate) fn finish(self) -> Result<()> {
        match self.fatal {
            Some(err) => Err(err),
            None => {
                log::info!("Event loop finished.");
                Ok(())
            }
        }
    }

    fn create_viewport(&self, event_loop: &ActiveEventLoop) -> Result<Viewport> {
        let attrs = Window::default_attributes()
            .with_title("Vitrina")
            .with_inner_size(self.size)
            .with_min_inner_size(PhysicalSize::new(480_u32, 320_u32));
        let window = Arc::new(event_loop.create_window(attrs)?);
        log::info!(
            "Window created: {}x{} (scale {:.2})",
            window.inner_size().width,
            window.inner_size().height,
            window.scale_factor()
        );

        let gpu = GpuState::new_blocking(window.clone(), self.backends)?;
        let egui = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &*window,
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.max_texture_side()),
        );
        Ok(Viewport { window, gpu, egui })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(vp) = self.viewport.as_mut() else {
            return;
        };

        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.gallery.strip_mut().advance(dt);
        let fps = self.fps.as_mut().map(|counter| counter.tick(now));

        let texture = vp.gpu.prepare_viewer(self.gallery.region_mut());

        let raw_input = vp.egui.take_egui_input(&vp.window);
        let gallery = &mut self.gallery;
        let output = self
            .egui_ctx
            .run(raw_input, |ctx| ui::draw(ctx, gallery, texture, fps));
        vp.egui
            .handle_platform_output(&vp.window, output.platform_output);

        self.repaint_at = output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .and_then(|v| now.checked_add(v.repaint_delay));

        let paint_jobs = self
            .egui_ctx
            .tessellate(output.shapes, output.pixels_per_point);
        match vp
            .gpu
            .render_ui(&paint_jobs, &output.textures_delta, output.pixels_per_point)
        {
            Ok(()) => {}
            Err(err) if GpuState::is_surface_lost(&err) => {
                log::warn!("Surface lost/outdated ({err:?}); recreating");
                vp.gpu.recreate_surface();
                vp.window.request_redraw();
            }
            Err(SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow!("GPU out of memory"));
            }
            Err(err) => log::warn!("Skipping frame: {err:?}"),
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewport.is_some() {
            return;
        }
        match self.create_viewport(event_loop) {
            Ok(vp) => {
                vp.window.request_redraw();
                self.viewport = Some(vp);
            }
            Err(err) => self.fail(event_loop, err.context("Failed to initialise the window")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(vp) = self.viewport.as_mut() else {
            return;
        };

        let response = vp.egui.on_window_event(&vp.window, &event);
        if response.repaint {
            vp.window.request_redraw();
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                if let Some(session) = self.gallery.region_mut().clear() {
                    log::debug!("Stopped session {} on close", session.id().0);
                }
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Resized: {}x{}", new_size.width, new_size.height);
                vp.gpu.resize(new_size.width, new_size.height);
                vp.window.request_redraw();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::AssetReady => {
                if let Some(outcome) = self.gallery.poll_asset() {
                    log::debug!("Asset fetch settled: {outcome:?}");
                }
                if let Some(vp) = &self.viewport {
                    vp.window.request_redraw();
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(vp) = &self.viewport else {
            return;
        };

        let now = Instant::now();
        let egui_due = self.repaint_at.is_some_and(|at| at <= now);
        if self.gallery.needs_redraw() || egui_due {
            vp.window.request_redraw();
            event_loop.set_control_flow(ControlFlow::Wait);
        } else if let Some(at) = self.repaint_at {
            event_loop.set_control_flow(ControlFlow::WaitUntil(at));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_counter_averages_over_its_window() {
        let start = Instant::now();
        let mut fps = FpsCounter::new(start);
        for i in 1..30 {
            assert_eq!(fps.tick(start + Duration::from_millis(i * 10)), 0.0);
        }
        let value = fps.tick(start + Duration::from_millis(500));
        assert!((value - 60.0).abs() < 1e-3, "got {value}");
    }
}
