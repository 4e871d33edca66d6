//! Renderer: wgpu device/surface, the lit model pipeline, viewer sessions
//! drawn offscreen and shown through the egui pass.
//! wgpu = 23.x, winit = 0.30.x, egui-wgpu = 0.30.x

mod gpu;
pub mod pipeline;
pub mod region;
pub mod session;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use wgpu::{
    Backends, CommandEncoderDescriptor, Device, DeviceDescriptor, Features, Instance,
    InstanceDescriptor, Limits, LoadOp, Operations, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, StoreOp, Surface, SurfaceConfiguration,
    SurfaceError, TextureUsages,
};
use winit::{dpi::PhysicalSize, window::Window};

pub use pipeline::ModelPipeline;
pub use region::{Placeholder, ViewerRegion};
pub use session::{ModelInstance, SessionId, ViewerSession, ViewerSettings};

/// Behind the UI, visible only where panels leave gaps.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.05,
    b: 0.08,
    a: 1.0,
};

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    model_pipeline: ModelPipeline,
    egui_renderer: egui_wgpu::Renderer,

    /// Session whose colour target is registered with egui, and its handle.
    bound: Option<(SessionId, egui::TextureId)>,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Device, surface and pipelines for `window`, restricted to `backends`.
    pub async fn new(window: Arc<Window>, backends: Backends) -> Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // One surface, one adapter that can present to it.
        let instance = Instance::new(InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .context("create_surface failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("No suitable GPU adapter for backends {:?}", backends))?;
        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("Vitrina Device"),
                    required_features: Features::empty(),
                    required_limits: Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("request_device failed")?;

        // egui expects an sRGB target when one is offered.
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats"))?;

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let model_pipeline = ModelPipeline::new(&device);
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            model_pipeline,
            egui_renderer,
            bound: None,
            width,
            height,
        })
    }

    pub fn new_blocking(window: Arc<Window>, backends: Backends) -> Result<Self> {
        pollster::block_on(Self::new(window, backends))
    }

    pub fn max_texture_side(&self) -> usize {
        self.device.limits().max_texture_dimension_2d as usize
    }

    /// Resize: reconfigure surface.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }

    /// Draw the region's running session (if any) into its own target and
    /// return the egui handle to show it with.
    pub fn prepare_viewer(&mut self, region: &mut ViewerRegion) -> Option<egui::TextureId> {
        let Some(session) = region.session_mut().filter(|s| s.is_running()) else {
            self.release_bound();
            return None;
        };

        if self.bound.is_some_and(|(id, _)| id != session.id()) {
            self.release_bound();
        }

        let retargeted = session.render(&self.model_pipeline, &self.device, &self.queue);
        let view = session.gpu.as_ref()?.color_view();

        let texture_id = match self.bound {
            Some((_, texture_id)) => {
                if retargeted {
                    self.egui_renderer.update_egui_texture_from_wgpu_texture(
                        &self.device,
                        view,
                        wgpu::FilterMode::Linear,
                        texture_id,
                    );
                }
                texture_id
            }
            None => {
                let texture_id = self.egui_renderer.register_native_texture(
                    &self.device,
                    view,
                    wgpu::FilterMode::Linear,
                );
                self.bound = Some((session.id(), texture_id));
                texture_id
            }
        };
        Some(texture_id)
    }

    fn release_bound(&mut self) {
        if let Some((id, texture_id)) = self.bound.take() {
            log::debug!("Releasing viewer target of session {}", id.0);
            self.egui_renderer.free_texture(&texture_id);
        }
    }

    /// Paint one UI frame to the window surface.
    pub fn render_ui(
        &mut self,
        paint_jobs: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        pixels_per_point: f32,
    ) -> Result<(), SurfaceError> {
        for (id, delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.width, self.height],
            pixels_per_point,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("UiEncoder"),
            });
        let user_buffers = self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            paint_jobs,
            &screen,
        );

        {
            let rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("UiPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            let mut rpass = rpass.forget_lifetime();
            self.egui_renderer.render(&mut rpass, paint_jobs, &screen);
        }

        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue
            .submit(user_buffers.into_iter().chain(Some(encoder.finish())));
        frame.present();
        Ok(())
    }
}
