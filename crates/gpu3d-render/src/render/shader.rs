//! Depth-mode shader variants.
//!
//! Each variant is assembled from three text fragments per stage (a shared
//! header, a per-stage common fragment, and the variant body), compiled with
//! naga, linked by matching the stage interfaces, and only then turned into
//! wgpu shader modules and a render pipeline.

use std::fmt;

use crate::geometry::Polygon;

use super::{PackedVertex, RenderCtx, COLOR_FORMAT, DEPTH_FORMAT};

/// Flag bit selecting the W-buffered variant.
pub const RENDER_FLAG_WBUFFER: u32 = 0x01;

const VS_ENTRY: &str = "vs_main";
const FS_ENTRY: &str = "fs_main";

const SHADER_HEADER: &str = include_str!("shaders/header.wgsl");
const VS_COMMON: &str = include_str!("shaders/vs_common.wgsl");
const FS_COMMON: &str = include_str!("shaders/fs_common.wgsl");

const VS_ZBUFFER: &str = include_str!("shaders/vs_zbuffer.wgsl");
const FS_ZBUFFER: &str = include_str!("shaders/fs_zbuffer.wgsl");
const VS_WBUFFER: &str = include_str!("shaders/vs_wbuffer.wgsl");
const FS_WBUFFER: &str = include_str!("shaders/fs_wbuffer.wgsl");

// ── variants ──────────────────────────────────────────────────────────────

/// The two depth-buffering modes, indexed by their flag value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderVariant {
    /// Depth from perspective-divided Z.
    ZBuffer = 0,
    /// Depth written explicitly from interpolated Z.
    WBuffer = 1,
}

impl ShaderVariant {
    pub const ALL: [ShaderVariant; 2] = [ShaderVariant::ZBuffer, ShaderVariant::WBuffer];

    #[inline]
    pub const fn flags(self) -> u32 {
        self as u32
    }

    #[inline]
    pub const fn from_flags(flags: u32) -> Self {
        if flags & RENDER_FLAG_WBUFFER != 0 {
            ShaderVariant::WBuffer
        } else {
            ShaderVariant::ZBuffer
        }
    }

    /// Variant used for a whole frame.
    ///
    /// Only the first polygon in the list decides, degenerate or not; the
    /// depth mode is global per frame.
    pub fn for_frame(polygons: &[Polygon]) -> Option<Self> {
        polygons.first().map(|p| {
            if p.w_buffer {
                ShaderVariant::WBuffer
            } else {
                ShaderVariant::ZBuffer
            }
        })
    }

    /// Built-in variant bodies.
    pub fn source(self) -> VariantSource<'static> {
        match self {
            ShaderVariant::ZBuffer => VariantSource {
                vertex: VS_ZBUFFER,
                fragment: FS_ZBUFFER,
            },
            ShaderVariant::WBuffer => VariantSource {
                vertex: VS_WBUFFER,
                fragment: FS_WBUFFER,
            },
        }
    }

    pub fn name(self) -> String {
        format!("RenderShader{:02X}", self.flags())
    }
}

/// Variant-specific text for both stages; header and common code are added
/// by the builder.
#[derive(Debug, Copy, Clone)]
pub struct VariantSource<'s> {
    pub vertex: &'s str,
    pub fragment: &'s str,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        })
    }
}

/// Full text of one stage: header, stage common code, variant body.
pub fn compose_stage(stage: Stage, body: &str) -> String {
    let common = match stage {
        Stage::Vertex => VS_COMMON,
        Stage::Fragment => FS_COMMON,
    };

    let mut src = String::with_capacity(SHADER_HEADER.len() + common.len() + body.len());
    src.push_str(SHADER_HEADER);
    src.push_str(common);
    src.push_str(body);
    src
}

// ── errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderBuildError {
    Compile {
        variant: ShaderVariant,
        stage: Stage,
        log: String,
    },
    Link {
        variant: ShaderVariant,
        log: String,
    },
}

impl fmt::Display for ShaderBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderBuildError::Compile {
                variant,
                stage,
                log,
            } => write!(f, "failed to compile {stage} shader {}: {log}", variant.name()),
            ShaderBuildError::Link { variant, log } => {
                write!(f, "failed to link program {}: {log}", variant.name())
            }
        }
    }
}

impl std::error::Error for ShaderBuildError {}

// ── compile ───────────────────────────────────────────────────────────────

/// A parsed and validated shader stage.
#[derive(Debug)]
pub struct CompiledStage {
    pub stage: Stage,
    pub source: String,
    module: naga::Module,
}

/// Parses and validates one stage. The error carries naga's diagnostic.
pub fn compile_stage(
    variant: ShaderVariant,
    stage: Stage,
    source: String,
) -> Result<CompiledStage, ShaderBuildError> {
    let compile_err = |log: String| {
        log::error!("failed to compile {stage} shader {}: {log}", variant.name());
        ShaderBuildError::Compile {
            variant,
            stage,
            log,
        }
    };

    let module = naga::front::wgsl::parse_str(&source)
        .map_err(|err| compile_err(err.emit_to_string(&source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|err| compile_err(err.emit_to_string(&source)))?;

    Ok(CompiledStage {
        stage,
        source,
        module,
    })
}

// ── link ──────────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScalarClass {
    Float,
    Sint,
    Uint,
    Other,
}

/// Type of one interface slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct IoType {
    pub class: ScalarClass,
    pub lanes: u8,
}

impl IoType {
    const fn uint(lanes: u8) -> Self {
        Self {
            class: ScalarClass::Uint,
            lanes,
        }
    }

    const OTHER: IoType = IoType {
        class: ScalarClass::Other,
        lanes: 0,
    };

    fn of(inner: &naga::TypeInner) -> Self {
        let class = |kind: naga::ScalarKind| match kind {
            naga::ScalarKind::Float | naga::ScalarKind::AbstractFloat => ScalarClass::Float,
            naga::ScalarKind::Sint | naga::ScalarKind::AbstractInt => ScalarClass::Sint,
            naga::ScalarKind::Uint => ScalarClass::Uint,
            _ => ScalarClass::Other,
        };

        match *inner {
            naga::TypeInner::Scalar(scalar) => Self {
                class: class(scalar.kind),
                lanes: 1,
            },
            naga::TypeInner::Vector { size, scalar } => Self {
                class: class(scalar.kind),
                lanes: size as u8,
            },
            _ => Self::OTHER,
        }
    }

    fn of_vertex_format(format: wgpu::VertexFormat) -> Self {
        match format {
            wgpu::VertexFormat::Uint32 => Self::uint(1),
            wgpu::VertexFormat::Uint16x2 | wgpu::VertexFormat::Uint32x2 => Self::uint(2),
            wgpu::VertexFormat::Uint32x3 => Self::uint(3),
            wgpu::VertexFormat::Uint8x4
            | wgpu::VertexFormat::Uint16x4
            | wgpu::VertexFormat::Uint32x4 => Self::uint(4),
            _ => Self::OTHER,
        }
    }
}

/// One user-defined interface location.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StageIo {
    pub location: u32,
    pub ty: IoType,
}

/// Reflected interface of a linked program.
///
/// Two builds of the same source produce equal interfaces.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProgramInterface {
    pub vertex_inputs: Vec<StageIo>,
    /// Locations passed from the vertex to the fragment stage.
    pub varyings: Vec<StageIo>,
    pub color_outputs: Vec<StageIo>,
    pub writes_depth: bool,
}

#[derive(Default)]
struct EntryIo {
    locations: Vec<StageIo>,
    builtins: Vec<naga::BuiltIn>,
}

impl EntryIo {
    fn collect(
        &mut self,
        module: &naga::Module,
        ty: naga::Handle<naga::Type>,
        binding: Option<&naga::Binding>,
    ) {
        match binding {
            Some(naga::Binding::Location { location, .. }) => self.locations.push(StageIo {
                location: *location,
                ty: IoType::of(&module.types[ty].inner),
            }),
            Some(naga::Binding::BuiltIn(builtin)) => self.builtins.push(*builtin),
            None => {
                if let naga::TypeInner::Struct { ref members, .. } = module.types[ty].inner {
                    for member in members {
                        self.collect(module, member.ty, member.binding.as_ref());
                    }
                }
            }
        }
    }

    fn inputs(module: &naga::Module, entry: &naga::EntryPoint) -> Self {
        let mut io = Self::default();
        for arg in &entry.function.arguments {
            io.collect(module, arg.ty, arg.binding.as_ref());
        }
        io.locations.sort_by_key(|l| l.location);
        io
    }

    fn outputs(module: &naga::Module, entry: &naga::EntryPoint) -> Self {
        let mut io = Self::default();
        if let Some(result) = &entry.function.result {
            io.collect(module, result.ty, result.binding.as_ref());
        }
        io.locations.sort_by_key(|l| l.location);
        io
    }
}

fn find_entry<'m>(
    module: &'m naga::Module,
    name: &str,
    stage: naga::ShaderStage,
) -> Option<&'m naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == name && ep.stage == stage)
}

/// Links a vertex and a fragment stage by checking their interfaces.
///
/// Fails when an entry point is missing, a vertex input does not match the
/// packed vertex layout, a fragment input is not written by the vertex stage
/// (or has a different type), or nothing is written to color location 0.
pub fn link(
    variant: ShaderVariant,
    vs: &CompiledStage,
    fs: &CompiledStage,
) -> Result<ProgramInterface, ShaderBuildError> {
    let link_err = |log: String| {
        log::error!("failed to link program {}: {log}", variant.name());
        ShaderBuildError::Link { variant, log }
    };

    let vs_entry = find_entry(&vs.module, VS_ENTRY, naga::ShaderStage::Vertex)
        .ok_or_else(|| link_err(format!("vertex stage has no `{VS_ENTRY}` entry point")))?;
    let fs_entry = find_entry(&fs.module, FS_ENTRY, naga::ShaderStage::Fragment)
        .ok_or_else(|| link_err(format!("fragment stage has no `{FS_ENTRY}` entry point")))?;

    let vertex_inputs = EntryIo::inputs(&vs.module, vs_entry).locations;
    let vs_outputs = EntryIo::outputs(&vs.module, vs_entry);
    let fs_inputs = EntryIo::inputs(&fs.module, fs_entry).locations;
    let fs_outputs = EntryIo::outputs(&fs.module, fs_entry);

    for input in &vertex_inputs {
        let attr = PackedVertex::attributes()
            .iter()
            .find(|a| a.shader_location == input.location)
            .ok_or_else(|| {
                link_err(format!(
                    "vertex input location {} has no vertex buffer attribute",
                    input.location
                ))
            })?;
        if IoType::of_vertex_format(attr.format) != input.ty {
            return Err(link_err(format!(
                "vertex input location {} is {:?} but the vertex layout provides {:?}",
                input.location, input.ty, attr.format
            )));
        }
    }

    for input in &fs_inputs {
        match vs_outputs.locations.iter().find(|o| o.location == input.location) {
            Some(output) if output.ty == input.ty => {}
            Some(output) => {
                return Err(link_err(format!(
                    "location {} is {:?} in the vertex stage but {:?} in the fragment stage",
                    input.location, output.ty, input.ty
                )));
            }
            None => {
                return Err(link_err(format!(
                    "fragment input location {} is not written by the vertex stage",
                    input.location
                )));
            }
        }
    }

    if !fs_outputs.locations.iter().any(|o| o.location == 0) {
        return Err(link_err("fragment stage does not write color location 0".into()));
    }

    Ok(ProgramInterface {
        vertex_inputs,
        varyings: fs_inputs,
        color_outputs: fs_outputs.locations,
        writes_depth: fs_outputs.builtins.contains(&naga::BuiltIn::FragDepth),
    })
}

/// Composes, compiles and links one variant without touching the GPU.
pub fn compile_and_link(
    variant: ShaderVariant,
    source: VariantSource<'_>,
) -> Result<(CompiledStage, CompiledStage, ProgramInterface), ShaderBuildError> {
    let vs = compile_stage(variant, Stage::Vertex, compose_stage(Stage::Vertex, source.vertex))?;
    let fs = compile_stage(
        variant,
        Stage::Fragment,
        compose_stage(Stage::Fragment, source.fragment),
    )?;
    let interface = link(variant, &vs, &fs)?;
    Ok((vs, fs, interface))
}

// ── programs ──────────────────────────────────────────────────────────────

/// A built variant: both stage modules plus the render pipeline using them.
pub struct ShaderProgram {
    pub variant: ShaderVariant,
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
    pub pipeline: wgpu::RenderPipeline,
    pub interface: ProgramInterface,
}

/// Builds shader programs on one device.
pub struct ShaderProgramBuilder<'a> {
    device: &'a wgpu::Device,
}

impl<'a> ShaderProgramBuilder<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }

    /// Compiles and links `variant` from `source`, then creates its GPU
    /// objects. No GPU object is created when compile or link fails.
    pub fn build_variant(
        &self,
        variant: ShaderVariant,
        source: VariantSource<'_>,
    ) -> Result<ShaderProgram, ShaderBuildError> {
        let (vs, fs, interface) = compile_and_link(variant, source)?;
        let name = variant.name();

        let vertex = self.create_module(&format!("{name} vertex"), &vs.source);
        let fragment = self.create_module(&format!("{name} fragment"), &fs.source);

        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("gpu3d render pipeline layout"),
                bind_group_layouts: &[],
                immediate_size: 0,
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&name),
                layout: Some(&layout),

                vertex: wgpu::VertexState {
                    module: &vertex,
                    entry_point: Some(VS_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &[PackedVertex::layout()],
                },

                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: Some(FS_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: COLOR_FORMAT,
                        blend: None,
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

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),

                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        log::debug!("built shader program {name} ({interface:?})");

        Ok(ShaderProgram {
            variant,
            vertex,
            fragment,
            pipeline,
            interface,
        })
    }

    fn create_module(&self, label: &str, source: &str) -> wgpu::ShaderModule {
        self.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
    }
}

/// Both depth-mode programs, built once at startup.
pub struct ShaderSet {
    programs: [ShaderProgram; 2],
}

impl ShaderSet {
    pub fn build(ctx: &RenderCtx<'_>) -> Result<Self, ShaderBuildError> {
        let builder = ShaderProgramBuilder::new(ctx.device);
        let z = builder.build_variant(ShaderVariant::ZBuffer, ShaderVariant::ZBuffer.source())?;
        let w = builder.build_variant(ShaderVariant::WBuffer, ShaderVariant::WBuffer.source())?;
        Ok(Self { programs: [z, w] })
    }

    /// Program drawing with `variant`.
    #[inline]
    pub fn select(&self, variant: ShaderVariant) -> &ShaderProgram {
        &self.programs[variant.flags() as usize]
    }
}
