//! Shader program: two WGSL stages read from disk, compiled, and linked into
//! a render pipeline.
//!
//! A stage that fails to compile is logged and left absent; the program then
//! stays unlinked and the frame is drawn without the curve. Nothing here
//! panics on bad shader input.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use super::pipeline::create_line_strip_pipeline;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

/// Why a stage failed to compile. `diagnostic` holds the compiler's
/// rendered report, source snippet included.
#[derive(Debug)]
pub enum ShaderError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        diagnostic: String,
    },
    Validate {
        path: PathBuf,
        diagnostic: String,
    },
    MissingEntryPoint {
        path: PathBuf,
        stage: ShaderStage,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            Self::Parse { path, diagnostic } => {
                write!(f, "{} failed to parse:\n{diagnostic}", path.display())
            }
            Self::Validate { path, diagnostic } => {
                write!(f, "{} failed validation:\n{diagnostic}", path.display())
            }
            Self::MissingEntryPoint { path, stage } => write!(
                f,
                "{} has no @{} entry point",
                path.display(),
                stage.label()
            ),
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A parsed and validated stage, not yet on a device.
#[derive(Debug)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub entry_point: String,
    module: naga::Module,
}

pub fn compile_stage(path: &Path, stage: ShaderStage) -> Result<CompiledStage, ShaderError> {
    let source = std::fs::read_to_string(path).map_err(|source| ShaderError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    compile_source(&source, path, stage)
}

/// Compile WGSL text; `path` only labels diagnostics.
pub fn compile_source(
    source: &str,
    path: &Path,
    stage: ShaderStage,
) -> Result<CompiledStage, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Parse {
        path: path.to_path_buf(),
        diagnostic: e.emit_to_string(source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| ShaderError::Validate {
        path: path.to_path_buf(),
        diagnostic: e.emit_to_string(source),
    })?;

    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage.naga_stage())
        .map(|ep| ep.name.clone())
        .ok_or_else(|| ShaderError::MissingEntryPoint {
            path: path.to_path_buf(),
            stage,
        })?;

    Ok(CompiledStage {
        stage,
        entry_point,
        module,
    })
}

struct StageModule {
    module: wgpu::ShaderModule,
    entry_point: String,
}

pub struct ShaderProgram {
    vertex: Option<StageModule>,
    fragment: Option<StageModule>,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl ShaderProgram {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        vertex_path: &Path,
        fragment_path: &Path,
    ) -> Self {
        let vertex = Self::add_shader(device, vertex_path, ShaderStage::Vertex);
        let fragment = Self::add_shader(device, fragment_path, ShaderStage::Fragment);

        let pipeline = match (&vertex, &fragment) {
            (Some(vs), Some(fs)) => Self::link(device, format, vs, fs),
            _ => None,
        };

        let program = Self {
            vertex,
            fragment,
            pipeline,
        };
        if !program.is_linked() {
            let broken: Vec<&str> = [ShaderStage::Vertex, ShaderStage::Fragment]
                .into_iter()
                .filter(|&s| !program.stage_valid(s))
                .map(ShaderStage::label)
                .collect();
            log::error!(
                "shader program not linked (invalid stages: {}); the curve will not be drawn",
                if broken.is_empty() { "none".to_string() } else { broken.join(", ") }
            );
        }
        program
    }

    fn add_shader(device: &wgpu::Device, path: &Path, stage: ShaderStage) -> Option<StageModule> {
        let compiled = match compile_stage(path, stage) {
            Ok(compiled) => compiled,
            Err(e) => {
                log::error!("ERROR compiling {} shader:\n\n{e}", stage.label());
                return None;
            }
        };

        log::debug!(
            "compiled {} shader {} (entry point {})",
            compiled.stage.label(),
            path.display(),
            compiled.entry_point
        );

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(stage.label()),
            source: wgpu::ShaderSource::Naga(Cow::Owned(compiled.module)),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            log::error!("ERROR creating {} shader module:\n\n{err}", stage.label());
            return None;
        }

        Some(StageModule {
            module,
            entry_point: compiled.entry_point,
        })
    }

    fn link(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        vs: &StageModule,
        fs: &StageModule,
    ) -> Option<wgpu::RenderPipeline> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = create_line_strip_pipeline(
            device,
            format,
            (&vs.module, &vs.entry_point),
            (&fs.module, &fs.entry_point),
        );
        match pollster::block_on(device.pop_error_scope()) {
            None => Some(pipeline),
            Some(err) => {
                log::error!("ERROR linking shader program:\n\n{err}");
                None
            }
        }
    }

    /// The linked pipeline, if both stages compiled and linked.
    pub fn pipeline(&self) -> Option<&wgpu::RenderPipeline> {
        self.pipeline.as_ref()
    }

    pub fn is_linked(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn stage_valid(&self, stage: ShaderStage) -> bool {
        match stage {
            ShaderStage::Vertex => self.vertex.is_some(),
            ShaderStage::Fragment => self.fragment.is_some(),
        }
    }
}
