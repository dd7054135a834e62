use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use scheduler::PaneId;
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

use crate::edit::EditWindow;
use crate::gpu::WgpuGraphics;
use crate::pane::RenderOutcome;
use crate::types::{EditWindowConfig, ShaderCompiler};

/// Event-loop side of the edit window: owns the winit window, the GPU backend
/// (only while resumed) and the toolkit-independent [`EditWindow`].
struct WindowState {
    window: Arc<Window>,
    shader_compiler: ShaderCompiler,
    gpu: Option<WgpuGraphics>,
    edit: EditWindow,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &EditWindowConfig) -> Self {
        Self {
            window,
            shader_compiler: config.shader_compiler,
            gpu: None,
            edit: EditWindow::new(config, Instant::now()),
        }
    }

    fn resume(&mut self) -> Result<()> {
        if self.gpu.is_some() {
            return Ok(());
        }
        let mut gpu = WgpuGraphics::new(self.window.clone(), self.shader_compiler)?;
        for pane in PaneId::ALL {
            self.edit.realize(pane, &mut gpu);
            self.edit.queue_repaint(pane);
        }
        self.gpu = Some(gpu);
        self.window.request_redraw();
        Ok(())
    }

    fn suspend(&mut self) {
        let Some(mut gpu) = self.gpu.take() else {
            return;
        };
        for pane in PaneId::ALL {
            self.edit.unrealize(pane, &mut gpu);
        }
        debug!("GPU backend released");
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.edit.configure(Instant::now());
        if self.reallocate(new_size) {
            self.window.request_redraw();
        }
    }

    /// Reconfigures the surface at `size`. Returns `true` when the pane
    /// targets were replaced and both panes were queued for repaint.
    fn reallocate(&mut self, size: PhysicalSize<u32>) -> bool {
        let Some(gpu) = self.gpu.as_mut() else {
            return false;
        };
        if !gpu.resize(size) {
            return false;
        }
        self.edit.invalidate(Instant::now());
        true
    }

    /// Lost/outdated swapchain. Unchanged pane targets keep their content and
    /// are composited again on the next redraw, so no redraw is requested
    /// unless they had to be reallocated.
    fn recover_surface(&mut self) {
        if self.reallocate(self.window.inner_size()) {
            self.window.request_redraw();
        }
    }

    fn redraw(&mut self) -> Result<(), wgpu::SurfaceError> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Ok(());
        };
        let now = Instant::now();
        // A redraw nobody asked for (expose, compositor damage) repaints both.
        let panes = if self.edit.has_pending() {
            self.edit.take_pending()
        } else {
            PaneId::ALL.to_vec()
        };
        for pane in panes {
            if self.edit.paint(pane, gpu, now) == RenderOutcome::Declined {
                debug!(pane = %self.edit.pane(pane).label(), "paint declined");
            }
        }
        gpu.present()
    }

    fn on_timer(&mut self, elwt: &EventLoopWindowTarget<()>) {
        let queued = self.edit.render_timeout(Instant::now());
        if !queued.is_empty() {
            debug!(?queued, "settle timer queued repaint");
            self.window.request_redraw();
        }
        elwt.set_control_flow(ControlFlow::WaitUntil(self.edit.next_timer_deadline()));
    }
}

pub(crate) fn run(config: EditWindowConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let (width, height) = config.surface_size;
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)
        .context("failed to create edit window")?;
    let window = Arc::new(window);
    info!(
        title = %config.title,
        width,
        height,
        compiler = %config.shader_compiler,
        "opening edit window"
    );

    let mut state = WindowState::new(window, &config);
    let fatal: Rc<Cell<Option<anyhow::Error>>> = Rc::default();
    let exit_error = fatal.clone();

    let result = event_loop.run(move |event, elwt| match event {
        Event::Resumed => {
            if let Err(err) = state.resume() {
                error!("failed to initialise GPU: {err:#}");
                exit_error.set(Some(err.context("failed to initialise GPU")));
                elwt.exit();
            }
        }
        Event::Suspended => state.suspend(),
        Event::WindowEvent { window_id, event } if window_id == state.window.id() => match event {
            WindowEvent::CloseRequested => {
                state.suspend();
                elwt.exit();
            }
            WindowEvent::Resized(new_size) => state.resize(new_size),
            WindowEvent::RedrawRequested => match state.redraw() {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    state.recover_surface();
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    error!("surface out of memory; exiting");
                    exit_error.set(Some(anyhow!("surface out of memory")));
                    elwt.exit();
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    warn!("surface timeout; retrying next frame");
                }
                Err(other) => {
                    warn!("surface error: {other:?}; retrying next frame");
                }
            },
            _ => {}
        },
        Event::AboutToWait => state.on_timer(elwt),
        Event::LoopExiting => state.suspend(),
        _ => {}
    });
    exit_status(result, fatal.take())
}

/// A fatal error raised inside the loop outranks how the loop itself ended.
fn exit_status<E: fmt::Display>(result: Result<(), E>, fatal: Option<anyhow::Error>) -> Result<()> {
    if let Some(err) = fatal {
        return Err(err);
    }
    result.map_err(|err| anyhow!("event loop error: {err}"))
}
