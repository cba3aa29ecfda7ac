//! wgpu implementation of [`GpuBackend`]
//!
//! One pipeline, no vertex buffers: the quad is generated from
//! `vertex_index` as a triangle strip. Per-draw matrices live in a single
//! uniform buffer addressed with dynamic offsets; every texture carries its
//! own bind group.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use futures::executor::block_on;
use wgpu::util::DeviceExt;

use crate::error::GpuError;
use crate::provider::PixelBuffer;
use crate::render::frame::{FramePlan, QuadKind};
use crate::render::gpu::GpuBackend;
use crate::render::row_padding::pad_rgba_rows;

const SHADER_SOURCE: &str = include_str!("shaders/carousel.wgsl");
const INITIAL_UNIFORM_SLOTS: usize = 32;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct QuadUniforms {
    mvp: [[f32; 4]; 4],
    /// alpha, reflection flag, reflection strength, unused
    params: [f32; 4],
}

/// GPU texture plus the bind group that samples it.
#[derive(Debug)]
pub struct WgpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

impl WgpuTexture {
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

#[derive(Debug)]
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniforms: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_slots: usize,
    uniform_stride: u64,
    viewport: (u32, u32),
}

impl WgpuBackend {
    /// Build the carousel pipeline for render targets of `format`.
    ///
    /// Shader or pipeline validation errors are fatal.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
    ) -> Result<Self, GpuError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Carousel Shader"),
                source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
            });

        let uniform_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Carousel Quad Uniforms Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(
                            std::mem::size_of::<QuadUniforms>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

        let texture_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Carousel Tile Texture Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(
                            wgpu::SamplerBindingType::Filtering,
                        ),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float {
                                filterable: true,
                            },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                ],
            });

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Carousel Pipeline Layout"),
                bind_group_layouts: &[&uniform_layout, &texture_layout],
                push_constant_ranges: &[],
            });

        let pipeline =
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Carousel Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            });

        if let Some(err) = block_on(device.pop_error_scope()) {
            log::error!("Carousel pipeline creation failed: {err}");
            return Err(GpuError::Shader(err.to_string()));
        }

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Carousel Tile Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let alignment =
            u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let uniform_size = std::mem::size_of::<QuadUniforms>() as u64;
        let uniform_stride = uniform_size.next_multiple_of(alignment);
        let (uniforms, uniform_bind_group) = create_uniforms(
            &device,
            &uniform_layout,
            uniform_stride,
            INITIAL_UNIFORM_SLOTS,
        );

        Ok(Self {
            device,
            queue,
            pipeline,
            uniform_layout,
            texture_layout,
            sampler,
            uniforms,
            uniform_bind_group,
            uniform_slots: INITIAL_UNIFORM_SLOTS,
            uniform_stride,
            viewport: (0, 0),
        })
    }

    /// Request a device from any available adapter, without a surface.
    pub fn headless_device() -> Result<(wgpu::Device, wgpu::Queue), GpuError> {
        let instance =
            wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = block_on(instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                force_fallback_adapter: false,
                compatible_surface: None,
            },
        ))
        .map_err(|_| GpuError::NoAdapter)?;
        block_on(adapter.request_device(&wgpu::DeviceDescriptor::default()))
            .map_err(|err| GpuError::Device(err.to_string()))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn ensure_uniform_slots(&mut self, needed: usize) {
        if needed <= self.uniform_slots {
            return;
        }
        let slots = needed.next_power_of_two();
        let (uniforms, bind_group) = create_uniforms(
            &self.device,
            &self.uniform_layout,
            self.uniform_stride,
            slots,
        );
        self.uniforms.destroy();
        self.uniforms = uniforms;
        self.uniform_bind_group = bind_group;
        self.uniform_slots = slots;
    }
}

impl GpuBackend for WgpuBackend {
    type Texture = WgpuTexture;
    type Target = wgpu::TextureView;

    fn create_texture(
        &mut self,
        pixels: &PixelBuffer,
    ) -> Result<WgpuTexture, GpuError> {
        pixels
            .validate()
            .map_err(|err| GpuError::Texture(err.to_string()))?;
        let max = self.device.limits().max_texture_dimension_2d;
        if pixels.width > max || pixels.height > max {
            return Err(GpuError::Texture(format!(
                "{}x{} exceeds device limit {max}",
                pixels.width, pixels.height
            )));
        }

        let size = wgpu::Extent3d {
            width: pixels.width,
            height: pixels.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Carousel Tile"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let (data, stride) = pad_rgba_rows(
            &pixels.pixels,
            pixels.width,
            pixels.height,
            wgpu::COPY_BYTES_PER_ROW_ALIGNMENT,
        );
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(stride),
                rows_per_image: Some(pixels.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group =
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Carousel Tile Bind Group"),
                layout: &self.texture_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Sampler(
                            &self.sampler,
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                ],
            });

        Ok(WgpuTexture {
            texture,
            bind_group,
        })
    }

    fn destroy_texture(&mut self, texture: WgpuTexture) {
        texture.texture.destroy();
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn render(
        &mut self,
        target: &wgpu::TextureView,
        frame: &FramePlan<'_, WgpuTexture>,
    ) -> Result<(), GpuError> {
        self.ensure_uniform_slots(frame.draws.len());

        let stride = self.uniform_stride as usize;
        let mut staging = vec![0u8; stride * frame.draws.len()];
        for (slot, draw) in frame.draws.iter().enumerate() {
            let (flag, strength) = match draw.kind {
                QuadKind::Main => (0.0, 1.0),
                QuadKind::Reflection { strength } => (1.0, strength),
            };
            let uniforms = QuadUniforms {
                mvp: draw.mvp.to_cols_array_2d(),
                params: [draw.alpha, flag, strength, 0.0],
            };
            let bytes = bytemuck::bytes_of(&uniforms);
            staging[slot * stride..slot * stride + bytes.len()]
                .copy_from_slice(bytes);
        }
        if !staging.is_empty() {
            self.queue.write_buffer(&self.uniforms, 0, &staging);
        }

        let mut encoder = self.device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some("Carousel Frame"),
            },
        );
        {
            let [r, g, b, a] = frame.clear_color.map(f64::from);
            let mut pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Carousel Pass"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: target,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r,
                                    g,
                                    b,
                                    a,
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                        },
                    )],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

            pass.set_pipeline(&self.pipeline);
            for (slot, draw) in frame.draws.iter().enumerate() {
                let offset = (slot as u64 * self.uniform_stride) as u32;
                pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);
                pass.set_bind_group(1, &draw.texture.bind_group, &[]);
                pass.draw(0..4, 0..1);
            }
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

fn create_uniforms(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    slots: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Carousel Quad Uniforms"),
        contents: &vec![0u8; (stride as usize) * slots],
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Carousel Quad Uniforms Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: NonZeroU64::new(
                    std::mem::size_of::<QuadUniforms>() as u64,
                ),
            }),
        }],
    });
    (buffer, bind_group)
}
