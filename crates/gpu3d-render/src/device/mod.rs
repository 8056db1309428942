//! GPU device management.
//!
//! This module is responsible for:
//! - resolving the device entry points the pipeline needs
//! - creating the wgpu Instance/Adapter/Device/Queue (headless, no surface)

mod gpu;
mod init;
mod loader;
mod resolver;

pub use gpu::Gpu;
pub use init::GpuInit;
pub use loader::AdapterLoader;
pub use resolver::{resolve, Capability, DeviceFunctions, EntryPoint, ProcLoader, ResolveError};
