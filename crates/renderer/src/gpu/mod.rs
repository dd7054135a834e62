//! wgpu backend for the edit panes.
//!
//! - `context` owns the instance, device and surface, and latches uncaptured
//!   device errors so panes can report them as context errors.
//! - `shader` turns GLSL into shader modules through naga or shaderc.
//! - `backend` implements [`GraphicsApi`](crate::graphics::GraphicsApi) with
//!   one offscreen target per pane.
//! - `compositor` blits the pane targets side by side into the swapchain.

mod backend;
mod compositor;
mod context;
mod shader;

pub(crate) use backend::WgpuGraphics;
