use std::borrow::Cow;

use anyhow::{anyhow, Result};
use paneconfig::PANE_COUNT;
use wgpu::naga::ShaderStage;
use winit::dpi::PhysicalSize;

use crate::shaders::{COMPOSITE_FRAGMENT, COMPOSITE_VERTEX};

use super::context::GpuContext;

/// Region of the window occupied by one pane, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Splits the window into equal left and right halves. The right pane takes
/// the odd pixel.
pub(crate) fn pane_viewports(size: PhysicalSize<u32>) -> [Viewport; PANE_COUNT] {
    let left = size.width / 2;
    [
        Viewport {
            x: 0,
            y: 0,
            width: left,
            height: size.height,
        },
        Viewport {
            x: left,
            y: 0,
            width: size.width - left,
            height: size.height,
        },
    ]
}

/// Offscreen colour target a pane renders into.
pub(crate) struct PaneTarget {
    pub view: wgpu::TextureView,
    _texture: wgpu::Texture,
}

impl PaneTarget {
    pub(crate) fn new(ctx: &GpuContext, viewport: Viewport, label: &str) -> Self {
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: viewport.width.max(1),
                height: viewport.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ctx.surface_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            view,
            _texture: texture,
        }
    }
}

/// Blits the pane targets side by side into the swapchain.
pub(crate) struct Compositor {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    bind_groups: Vec<wgpu::BindGroup>,
}

impl Compositor {
    pub(crate) fn new(ctx: &GpuContext) -> Result<Self> {
        let device = &ctx.device;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("composite layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("composite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let (pipeline, error) = ctx.scoped(|device| {
            let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("composite vertex"),
                source: wgpu::ShaderSource::Glsl {
                    shader: Cow::Borrowed(COMPOSITE_VERTEX),
                    stage: ShaderStage::Vertex,
                    defines: &[],
                },
            });
            let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("composite fragment"),
                source: wgpu::ShaderSource::Glsl {
                    shader: Cow::Borrowed(COMPOSITE_FRAGMENT),
                    stage: ShaderStage::Fragment,
                    defines: &[],
                },
            });
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("composite pipeline layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("composite pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex,
                    entry_point: Some("main"),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: Some("main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview: None,
                cache: None,
            })
        });
        if let Some(err) = error {
            return Err(anyhow!("failed to build composite pipeline: {err}"));
        }

        Ok(Self {
            pipeline,
            layout,
            sampler,
            bind_groups: Vec::new(),
        })
    }

    /// Rebuilds the bind groups after the pane targets were recreated.
    pub(crate) fn bind(&mut self, device: &wgpu::Device, targets: &[&PaneTarget]) {
        self.bind_groups = targets
            .iter()
            .map(|target| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("composite bind group"),
                    layout: &self.layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&target.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                    ],
                })
            })
            .collect();
    }

    pub(crate) fn present(&self, ctx: &GpuContext) -> Result<(), wgpu::SurfaceError> {
        let frame = ctx.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("composite encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("composite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            for (viewport, bind_group) in pane_viewports(ctx.size).iter().zip(&self.bind_groups) {
                if viewport.width == 0 || viewport.height == 0 {
                    continue;
                }
                pass.set_viewport(
                    viewport.x as f32,
                    viewport.y as f32,
                    viewport.width as f32,
                    viewport.height as f32,
                    0.0,
                    1.0,
                );
                pass.set_bind_group(0, bind_group, &[]);
                pass.draw(0..3, 0..1);
            }
        }

        ctx.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
