use std::borrow::Cow;

use crate::graphics::ShaderStage;
use crate::types::ShaderCompiler;

use super::context::GpuContext;

/// Compiles one GLSL stage into a shader module.
///
/// Validation errors are captured in an error scope and returned as the
/// compile log instead of reaching the device's uncaptured error handler.
pub(crate) fn create_module(
    ctx: &GpuContext,
    compiler: ShaderCompiler,
    stage: ShaderStage,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, String> {
    let shader_source = match compiler {
        ShaderCompiler::Shaderc => spirv_source(stage, label, source)?,
        ShaderCompiler::NagaGlsl => wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_string()),
            stage: naga_stage(stage),
            defines: &[],
        },
    };

    let (module, error) = ctx.scoped(|device| {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: shader_source,
        })
    });
    match error {
        Some(err) => Err(err.to_string()),
        None => Ok(module),
    }
}

fn naga_stage(stage: ShaderStage) -> wgpu::naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => wgpu::naga::ShaderStage::Vertex,
        ShaderStage::Fragment => wgpu::naga::ShaderStage::Fragment,
    }
}

#[cfg(feature = "shaderc")]
fn spirv_source(
    stage: ShaderStage,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderSource<'static>, String> {
    let compiler = shaderc::Compiler::new()
        .into_iter()
        .next()
        .ok_or_else(|| "shaderc compiler could not be initialised".to_string())?;
    let kind = match stage {
        ShaderStage::Vertex => shaderc::ShaderKind::Vertex,
        ShaderStage::Fragment => shaderc::ShaderKind::Fragment,
    };
    let artifact = compiler
        .compile_into_spirv(source, kind, label, "main", None)
        .map_err(|err| err.to_string())?;
    if artifact.get_num_warnings() > 0 {
        tracing::debug!(%stage, label, "shaderc warnings:\n{}", artifact.get_warning_messages());
    }
    Ok(wgpu::ShaderSource::SpirV(Cow::Owned(
        artifact.as_binary().to_vec(),
    )))
}

#[cfg(not(feature = "shaderc"))]
fn spirv_source(
    _stage: ShaderStage,
    _label: &str,
    _source: &str,
) -> Result<wgpu::ShaderSource<'static>, String> {
    Err("shaderc support was not compiled in; rebuild with the `shaderc` feature or use the naga compiler".to_string())
}
