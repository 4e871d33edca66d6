//! GPU resources owned by one viewer session, and drawing it.

use asset::{Material, texture::TextureData};
use corelib::{Scene, Transform, Vec3};
use wgpu::{
    BindGroup, Buffer, BufferUsages, CommandEncoderDescriptor, Device, LoadOp, Operations, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, StoreOp, TextureView, util::DeviceExt,
};

use crate::{
    pipeline::{
        GlobalsUniform, GpuVertex, MaterialUniform, ModelPipeline, create_color_view,
        create_depth_view,
    },
    session::{ModelInstance, ViewerSession},
};

struct PartGpu {
    vertex_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,
    material_bg: BindGroup,
}

pub(crate) struct SessionGpu {
    size: [u32; 2],
    color_view: TextureView,
    depth_view: TextureView,
    globals_buf: Buffer,
    globals_bg: BindGroup,
    parts: Vec<PartGpu>,
}

impl SessionGpu {
    pub(crate) fn new(
        pipeline: &ModelPipeline,
        device: &Device,
        queue: &Queue,
        instance: &ModelInstance,
        size: [u32; 2],
    ) -> Self {
        let globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals UBO"),
            size: std::mem::size_of::<GlobalsUniform>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals BG"),
            layout: &pipeline.globals_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });

        let white = TextureData::white();
        let max_side = device.limits().max_texture_dimension_2d;
        let parts = instance
            .model
            .parts
            .iter()
            .filter(|part| part.mesh.is_valid())
            .map(|part| {
                let vertices: Vec<GpuVertex> = part.mesh.vertices.iter().map(GpuVertex::from).collect();
                let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Model VB"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: BufferUsages::VERTEX,
                });
                let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Model IB"),
                    contents: bytemuck::cast_slice(&part.mesh.indices),
                    usage: BufferUsages::INDEX,
                });

                let material = instance.material_for(part);
                let texture = match material.diffuse_map.as_deref() {
                    Some(tex) if tex.is_valid() && tex.width.max(tex.height) <= max_side => tex,
                    Some(tex) => {
                        log::warn!(
                            "Material '{}': {}x{} diffuse map unusable on this device",
                            material.name,
                            tex.width,
                            tex.height
                        );
                        &white
                    }
                    None => &white,
                };
                let material_bg = material_bind_group(pipeline, device, queue, material, texture);

                PartGpu {
                    vertex_buf,
                    index_buf,
                    index_count: part.mesh.indices.len() as u32,
                    material_bg,
                }
            })
            .collect();

        Self {
            size,
            color_view: create_color_view(device, size[0], size[1]),
            depth_view: create_depth_view(device, size[0], size[1]),
            globals_buf,
            globals_bg,
            parts,
        }
    }

    pub(crate) fn color_view(&self) -> &TextureView {
        &self.color_view
    }

    /// Recreate the targets if the region changed size. Returns `true` if it did.
    fn resize(&mut self, device: &Device, size: [u32; 2]) -> bool {
        if size == self.size {
            return false;
        }
        self.size = size;
        self.color_view = create_color_view(device, size[0], size[1]);
        self.depth_view = create_depth_view(device, size[0], size[1]);
        true
    }

    fn write_globals(&self, queue: &Queue, scene: &Scene, transform: &Transform) {
        let camera = &scene.camera;
        let globals = GlobalsUniform {
            view_proj: camera.proj_view().to_cols_array_2d(),
            model: transform.matrix().to_cols_array_2d(),
            normal: transform.normal_matrix().to_cols_array_2d(),
            camera_pos: camera.eye.extend(1.0).to_array(),
            ambient: scene.ambient.radiance().extend(1.0).to_array(),
            sun_dir: scene.sun.to_light().extend(0.0).to_array(),
            sun_color: scene.sun.radiance().extend(1.0).to_array(),
        };
        queue.write_buffer(&self.globals_buf, 0, bytemuck::bytes_of(&globals));
    }

    fn draw(&self, pipeline: &ModelPipeline, device: &Device, queue: &Queue, background: Vec3) {
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("ViewerEncoder"),
        });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("ViewerPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color {
                            r: background.x as f64,
                            g: background.y as f64,
                            b: background.z as f64,
                            a: 1.0,
                        }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&pipeline.pipeline);
            rpass.set_bind_group(0, &self.globals_bg, &[]);
            for part in &self.parts {
                rpass.set_bind_group(1, &part.material_bg, &[]);
                rpass.set_vertex_buffer(0, part.vertex_buf.slice(..));
                rpass.set_index_buffer(part.index_buf.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..part.index_count, 0, 0..1);
            }
        }

        queue.submit(Some(encoder.finish()));
    }
}

fn material_bind_group(
    pipeline: &ModelPipeline,
    device: &Device,
    queue: &Queue,
    material: &Material,
    texture: &TextureData,
) -> BindGroup {
    let [r, g, b] = material.diffuse;
    let [sr, sg, sb] = material.specular;
    let uniform = MaterialUniform {
        diffuse: [r, g, b, material.opacity],
        specular: [sr, sg, sb, material.shininess],
    };
    let uniform_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Material UBO"),
        contents: bytemuck::bytes_of(&uniform),
        usage: BufferUsages::UNIFORM,
    });

    let size = wgpu::Extent3d {
        width: texture.width,
        height: texture.height,
        depth_or_array_layers: 1,
    };
    let gpu_tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Diffuse Map"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &gpu_tex,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &texture.data,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(texture.bytes_per_pixel() * texture.width),
            rows_per_image: Some(texture.height),
        },
        size,
    );
    let view = gpu_tex.create_view(&wgpu::TextureViewDescriptor::default());

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Material BG"),
        layout: &pipeline.material_bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&pipeline.sampler),
            },
        ],
    })
}

impl ViewerSession {
    /// Draw one frame into the session's own target, creating GPU resources
    /// on first use. Returns `true` when the colour target is new, so the UI
    /// must re-bind it.
    pub(crate) fn render(
        &mut self,
        pipeline: &ModelPipeline,
        device: &Device,
        queue: &Queue,
    ) -> bool {
        if !self.tick() {
            return false;
        }

        let mut retargeted = false;
        if self.gpu.is_none() {
            self.gpu = Some(SessionGpu::new(pipeline, device, queue, &self.instance, self.size));
            retargeted = true;
        }
        let Some(gpu) = self.gpu.as_mut() else {
            return false;
        };
        retargeted |= gpu.resize(device, self.size);
        gpu.write_globals(queue, &self.scene, &self.instance.transform);
        gpu.draw(pipeline, device, queue, self.scene.background);
        retargeted
    }
}
