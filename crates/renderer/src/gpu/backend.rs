use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use paneconfig::PANE_COUNT;
use scheduler::PaneId;
use tracing::{debug, warn};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::graphics::{
    ContextError, GraphicsApi, ProgramId, ShaderId, ShaderStage, VertexArrayId,
};
use crate::types::ShaderCompiler;

use super::compositor::{pane_viewports, Compositor, PaneTarget};
use super::context::GpuContext;
use super::shader;

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    module: Option<wgpu::ShaderModule>,
    info_log: String,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<ShaderId>,
    pipeline: Option<wgpu::RenderPipeline>,
    info_log: String,
}

/// Commands recorded for the current pane between `make_current` and `flush`.
#[derive(Default)]
struct PendingFrame {
    clear: Option<wgpu::Color>,
    draws: Vec<(ProgramId, u32, u32)>,
}

/// Per-pane context state: its render target and the bindings a GL context
/// would keep.
struct PaneContext {
    target: PaneTarget,
    vertex_array: Option<VertexArrayId>,
    program: Option<ProgramId>,
    frame: PendingFrame,
}

/// [`GraphicsApi`] on top of wgpu.
///
/// Shaders become shader modules, a linked program becomes a render pipeline
/// targeting the pane texture, and each pane records into its own offscreen
/// target that [`present`](WgpuGraphics::present) composites into the window.
pub(crate) struct WgpuGraphics {
    ctx: GpuContext,
    compiler: ShaderCompiler,
    compositor: Compositor,
    panes: [PaneContext; PANE_COUNT],
    current: Option<PaneId>,
    next_id: u32,
    shaders: HashMap<ShaderId, ShaderObject>,
    programs: HashMap<ProgramId, ProgramObject>,
    vertex_arrays: Vec<VertexArrayId>,
}

impl WgpuGraphics {
    pub(crate) fn new(window: Arc<Window>, compiler: ShaderCompiler) -> Result<Self> {
        let ctx = GpuContext::new(window)?;
        let mut compositor = Compositor::new(&ctx)?;
        let panes = create_targets(&ctx).map(|target| PaneContext {
            target,
            vertex_array: None,
            program: None,
            frame: PendingFrame::default(),
        });
        compositor.bind(&ctx.device, &panes.each_ref().map(|pane| &pane.target));
        debug!(%compiler, format = ?ctx.surface_format, "GPU backend ready");

        Ok(Self {
            ctx,
            compiler,
            compositor,
            panes,
            current: None,
            next_id: 0,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            vertex_arrays: Vec::new(),
        })
    }

    /// Reconfigures the swapchain and, when the size changed, reallocates
    /// both pane targets. Returns `true` only if the targets were replaced
    /// and therefore lost their content.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) -> bool {
        let unchanged = new_size == self.ctx.size;
        if !self.ctx.resize(new_size) || unchanged {
            return false;
        }
        let targets = create_targets(&self.ctx);
        for (pane, target) in self.panes.iter_mut().zip(targets) {
            pane.target = target;
        }
        self.compositor
            .bind(&self.ctx.device, &self.panes.each_ref().map(|pane| &pane.target));
        true
    }

    pub(crate) fn present(&self) -> Result<(), wgpu::SurfaceError> {
        self.compositor.present(&self.ctx)
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn current_pane(&mut self) -> Option<&mut PaneContext> {
        let pane = self.current?;
        self.panes.get_mut(pane.index())
    }

    fn build_pipeline(&self, program: &ProgramObject) -> Result<wgpu::RenderPipeline, String> {
        let mut vertex = None;
        let mut fragment = None;
        for shader in &program.attached {
            let Some(object) = self.shaders.get(shader) else {
                continue;
            };
            let slot = match object.stage {
                ShaderStage::Vertex => &mut vertex,
                ShaderStage::Fragment => &mut fragment,
            };
            *slot = object.module.as_ref();
        }
        let (Some(vertex), Some(fragment)) = (vertex, fragment) else {
            return Err("program needs one compiled vertex and one compiled fragment shader".into());
        };

        let format = self.ctx.surface_format;
        let (pipeline, error) = self.ctx.scoped(|device| {
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("pane pipeline layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("pane pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some("main"),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
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
                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: Some("main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview: None,
                cache: None,
            })
        });
        match error {
            Some(err) => Err(err.to_string()),
            None => Ok(pipeline),
        }
    }
}

fn create_targets(ctx: &GpuContext) -> [PaneTarget; PANE_COUNT] {
    let viewports = pane_viewports(ctx.size);
    PaneId::ALL.map(|pane| PaneTarget::new(ctx, viewports[pane.index()], "pane target"))
}

impl GraphicsApi for WgpuGraphics {
    fn make_current(&mut self, pane: PaneId) -> Result<(), ContextError> {
        self.current = Some(pane);
        match self.context_error(pane) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // One device backs both panes, so a latched error affects each of them.
    fn context_error(&self, _pane: PaneId) -> Option<ContextError> {
        self.ctx.errors.get().map(ContextError)
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId> {
        let id = ShaderId::new(self.allocate())?;
        self.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                module: None,
                info_log: String::new(),
            },
        );
        Some(id)
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        if let Some(object) = self.shaders.get_mut(&shader) {
            object.source = source.to_string();
        }
    }

    fn compile_shader(&mut self, shader: ShaderId) -> bool {
        let Some(object) = self.shaders.get(&shader) else {
            return false;
        };
        let label = format!("{} shader {}", object.stage, shader.get());
        let result =
            shader::create_module(&self.ctx, self.compiler, object.stage, &label, &object.source);

        let Some(object) = self.shaders.get_mut(&shader) else {
            return false;
        };
        match result {
            Ok(module) => {
                object.module = Some(module);
                object.info_log.clear();
                true
            }
            Err(log) => {
                object.module = None;
                object.info_log = log;
                false
            }
        }
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.shaders
            .get(&shader)
            .map(|object| object.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
    }

    fn create_program(&mut self) -> Option<ProgramId> {
        let id = ProgramId::new(self.allocate())?;
        self.programs.insert(id, ProgramObject::default());
        Some(id)
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if let Some(object) = self.programs.get_mut(&program) {
            if !object.attached.contains(&shader) {
                object.attached.push(shader);
            }
        }
    }

    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if let Some(object) = self.programs.get_mut(&program) {
            object.attached.retain(|attached| *attached != shader);
        }
    }

    fn link_program(&mut self, program: ProgramId) -> bool {
        let Some(object) = self.programs.get(&program) else {
            return false;
        };
        let result = self.build_pipeline(object);

        let Some(object) = self.programs.get_mut(&program) else {
            return false;
        };
        match result {
            Ok(pipeline) => {
                object.pipeline = Some(pipeline);
                object.info_log.clear();
                true
            }
            Err(log) => {
                object.pipeline = None;
                object.info_log = log;
                false
            }
        }
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.programs
            .get(&program)
            .map(|object| object.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        for pane in &mut self.panes {
            if pane.program == Some(program) {
                pane.program = None;
            }
        }
    }

    fn create_vertex_array(&mut self) -> Option<VertexArrayId> {
        let id = VertexArrayId::new(self.allocate())?;
        self.vertex_arrays.push(id);
        Some(id)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        let known = vertex_array.map_or(true, |id| self.vertex_arrays.contains(&id));
        if !known {
            warn!(?vertex_array, "binding unknown vertex array");
            return;
        }
        if let Some(pane) = self.current_pane() {
            pane.vertex_array = vertex_array;
        }
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.vertex_arrays.retain(|id| *id != vertex_array);
        for pane in &mut self.panes {
            if pane.vertex_array == Some(vertex_array) {
                pane.vertex_array = None;
            }
        }
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        let [r, g, b, a] = rgba.map(f64::from);
        if let Some(pane) = self.current_pane() {
            pane.frame.clear = Some(wgpu::Color { r, g, b, a });
        }
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        if let Some(pane) = self.current_pane() {
            pane.program = program;
        }
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        let Some(pane) = self.current_pane() else {
            return;
        };
        let Some(program) = pane.program else {
            return;
        };
        if pane.vertex_array.is_none() {
            warn!("draw without a bound vertex array; skipping");
            return;
        }
        pane.frame.draws.push((program, first, count));
    }

    fn flush(&mut self) {
        let Some(index) = self.current.map(PaneId::index) else {
            return;
        };
        let frame = std::mem::take(&mut self.panes[index].frame);
        let load = frame
            .clear
            .map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear);

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pane encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pane pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.panes[index].target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            for (program, first, count) in &frame.draws {
                let Some(pipeline) = self
                    .programs
                    .get(program)
                    .and_then(|object| object.pipeline.as_ref())
                else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.draw(*first..first + count, 0..1);
            }
        }
        self.ctx.queue.submit(Some(encoder.finish()));
    }
}
