//! wgpu point-sprite backend.
//!
//! Each point is one instance of a six-vertex quad fed by three per-instance
//! vertex buffers (position, size, color). The fragment stage discards
//! outside the unit disk and blends with straight alpha. Frames render into
//! an offscreen target texture owned by the backend; hosts copy or sample it.

use indexmap::IndexMap;
use tracing::{debug, trace, warn};
use wgpu::util::DeviceExt;

use crate::error::{ChartError, ChartResult};
use crate::render::{BufferId, BufferKind, GpuBackend, PointFrame};

const VERTICES_PER_POINT: u32 = 6;
const GLOBALS_SIZE: u64 = std::mem::size_of::<PointGlobals>() as u64;

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const SIZE_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32];
const COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x3];

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct PointGlobals {
    viewport_px: [f32; 2],
    pixel_ratio: f32,
    alpha: f32,
}

struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

struct GlobalsRing {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: usize,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    globals_layout: wgpu::BindGroupLayout,
    globals_stride: u64,
    globals: Option<GlobalsRing>,
    target: Option<RenderTarget>,
    buffers: IndexMap<u64, wgpu::Buffer>,
    next_id: u64,
}

impl WgpuBackend {
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Point Sprite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/points.wgsl").into()),
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("point_globals_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(GLOBALS_SIZE),
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Sprite Pipeline Layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Point Sprite Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &POSITION_ATTRIBUTES,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<f32>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &SIZE_ATTRIBUTES,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &COLOR_ATTRIBUTES,
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let globals_stride = GLOBALS_SIZE.div_ceil(alignment) * alignment;

        Self {
            device,
            queue,
            format,
            pipeline,
            globals_layout,
            globals_stride,
            globals: None,
            target: None,
            buffers: IndexMap::new(),
            next_id: 0,
        }
    }

    /// Offscreen texture the last frame was rendered into.
    #[must_use]
    pub fn target_texture(&self) -> Option<&wgpu::Texture> {
        self.target.as_ref().map(|target| &target.texture)
    }

    #[must_use]
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    fn ensure_globals(&mut self, draws: usize) {
        let draws = draws.max(1);
        if self
            .globals
            .as_ref()
            .is_some_and(|ring| ring.capacity >= draws)
        {
            return;
        }
        let capacity = draws.next_power_of_two();
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Point Globals Buffer"),
            size: self.globals_stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("point_globals_bind_group"),
            layout: &self.globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(GLOBALS_SIZE),
                }),
            }],
        });
        if let Some(previous) = self.globals.take() {
            previous.buffer.destroy();
        }
        self.globals = Some(GlobalsRing {
            buffer,
            bind_group,
            capacity,
        });
    }

    fn buffer(&self, id: &BufferId) -> ChartResult<&wgpu::Buffer> {
        self.buffers.get(&id.raw()).ok_or(ChartError::Lifecycle {
            operation: "draw with released buffer",
            state: "released",
        })
    }
}

impl GpuBackend for WgpuBackend {
    fn configure_surface(&mut self, width: u32, height: u32) -> ChartResult<()> {
        let width = width.max(1);
        let height = height.max(1);
        let max_dimension = self.device.limits().max_texture_dimension_2d;
        if width > max_dimension || height > max_dimension {
            return Err(ChartError::ContextUnavailable(format!(
                "surface {width}x{height} exceeds device limit {max_dimension}"
            )));
        }
        if self
            .target
            .as_ref()
            .is_some_and(|target| target.width == width && target.height == height)
        {
            return Ok(());
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Point Cloud Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        if let Some(previous) = self.target.take() {
            previous.texture.destroy();
        }
        debug!(width, height, "configured point cloud target");
        self.target = Some(RenderTarget {
            texture,
            view,
            width,
            height,
        });
        Ok(())
    }

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        label: &str,
        contents: &[f32],
    ) -> ChartResult<BufferId> {
        if contents.is_empty() || contents.len() % kind.components() != 0 {
            return Err(ChartError::InvalidData(format!(
                "buffer `{label}` has invalid length {}",
                contents.len()
            )));
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(contents),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.next_id += 1;
        self.buffers.insert(self.next_id, buffer);
        trace!(id = self.next_id, label, "wgpu buffer created");
        Ok(BufferId::from_raw(self.next_id))
    }

    fn release_buffer(&mut self, buffer: BufferId) {
        match self.buffers.shift_remove(&buffer.raw()) {
            Some(buffer) => buffer.destroy(),
            None => warn!(id = buffer.raw(), "release of unknown wgpu buffer"),
        }
    }

    fn render(&mut self, frame: &PointFrame<'_>) -> ChartResult<()> {
        frame.validate()?;
        let target_matches = self.target.as_ref().is_some_and(|target| {
            target.width == frame.surface_width && target.height == frame.surface_height
        });
        if !target_matches {
            return Err(ChartError::InvalidViewport {
                width: frame.surface_width,
                height: frame.surface_height,
            });
        }
        self.ensure_globals(frame.draws.len());

        let (Some(target), Some(globals)) = (self.target.as_ref(), self.globals.as_ref()) else {
            return Err(ChartError::Lifecycle {
                operation: "render",
                state: "surface not configured",
            });
        };

        for (slot, draw) in frame.draws.iter().enumerate() {
            let uniform = PointGlobals {
                viewport_px: [draw.viewport.width as f32, draw.viewport.height as f32],
                pixel_ratio: frame.style.device_pixel_ratio as f32,
                alpha: frame.style.point_alpha,
            };
            self.queue.write_buffer(
                &globals.buffer,
                slot as u64 * self.globals_stride,
                bytemuck::bytes_of(&uniform),
            );
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Point Cloud Encoder"),
            });
        {
            let clear = frame.style.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Point Cloud Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(clear.red),
                            g: f64::from(clear.green),
                            b: f64::from(clear.blue),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);

            for (slot, draw) in frame.draws.iter().enumerate() {
                let viewport = draw.viewport;
                pass.set_viewport(
                    viewport.x as f32,
                    viewport.top_from(frame.surface_height) as f32,
                    viewport.width as f32,
                    viewport.height as f32,
                    0.0,
                    1.0,
                );
                let scissor = draw.scissor;
                pass.set_scissor_rect(
                    scissor.x,
                    scissor.top_from(frame.surface_height),
                    scissor.width,
                    scissor.height,
                );
                let offset = u32::try_from(slot as u64 * self.globals_stride).map_err(|_| {
                    ChartError::Backend("too many draws for the globals buffer".to_owned())
                })?;
                pass.set_bind_group(0, &globals.bind_group, &[offset]);
                pass.set_vertex_buffer(0, self.buffer(draw.buffers.position())?.slice(..));
                pass.set_vertex_buffer(1, self.buffer(draw.buffers.size())?.slice(..));
                pass.set_vertex_buffer(2, self.buffer(draw.buffers.color())?.slice(..));
                pass.draw(0..VERTICES_PER_POINT, 0..draw.buffers.point_count());
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        trace!(draws = frame.draws.len(), "wgpu frame submitted");
        Ok(())
    }
}
