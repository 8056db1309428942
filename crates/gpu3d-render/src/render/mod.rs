//! GPU rendering subsystem.
//!
//! One frame flows through these stages:
//! - `assembler` packs polygons into a vertex/index stream
//! - `shader` owns the two depth-mode pipelines
//! - `frame` clears the targets, draws and queues the color copy
//! - `readback` maps the copy and serves scanlines
//!
//! Convention: screen coordinates are pixels with a top-left origin and +Y
//! down. Screen row 0 is row 0 of every target.

mod assembler;
mod ctx;
mod frame;
mod packed;
mod readback;
mod resources;
mod shader;

pub use assembler::{
    Assembler, AssemblyCounts, CapacityError, OverflowPolicy, MAX_INDICES, MAX_VERTICES,
};
pub use ctx::{RenderCtx, RenderTarget};
pub use frame::{FrameRenderer, FrameStats, DEFAULT_CLEAR_COLOR};
pub use packed::{z_shift, PackedVertex, PACKED_VERTEX_WORDS, ZSHIFT_OFFSET};
pub use readback::{read_aux, ReadbackError, ScanlineReadback, LINE_WORDS};
pub use resources::{
    FrameResources, AUX_FORMAT, AUX_ROW_BYTES, AUX_SENTINEL, AUX_USAGES, COLOR_FORMAT,
    DEPTH_FORMAT, FRAME_BYTES, ROW_BYTES, SCREEN_EXTENT, SCREEN_HEIGHT, SCREEN_WIDTH,
};
pub use shader::{
    compile_and_link, compile_stage, compose_stage, link, CompiledStage, IoType,
    ProgramInterface, ScalarClass, ShaderBuildError, ShaderProgram, ShaderProgramBuilder,
    ShaderSet, ShaderVariant, Stage, StageIo, VariantSource, RENDER_FLAG_WBUFFER,
};
