use std::fmt;

/// Device entry points the render pipeline relies on.
///
/// Each one is looked up by name through a [`ProcLoader`]; the platform decides
/// how (and whether) the current device provides it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EntryPoint {
    /// Bgra8Unorm color target that can be rendered to and copied from.
    ColorTarget,
    /// Depth32Float depth attachment.
    DepthTarget,
    /// Rg32Uint per-pixel metadata image, copyable to and from the host.
    AuxImage,
    /// Vertex/index buffers large enough for the staging arenas.
    GeometryBuffers,
    /// Integer vertex attributes (`Uint16x4`, `Uint8x4`, `Uint32x3`).
    IntegerVertexAttributes,
    /// WGSL shader modules.
    ShaderModules,
    /// Fragment stage writes `frag_depth`.
    FragmentDepth,
    /// Indexed triangle-list draws with 16-bit indices.
    DrawIndexed,
    /// Texture-to-buffer copies into a host-mappable buffer.
    PixelPack,
    /// Blocking map of a readback buffer.
    MapRead,
}

impl EntryPoint {
    pub const ALL: [EntryPoint; 10] = [
        EntryPoint::ColorTarget,
        EntryPoint::DepthTarget,
        EntryPoint::AuxImage,
        EntryPoint::GeometryBuffers,
        EntryPoint::IntegerVertexAttributes,
        EntryPoint::ShaderModules,
        EntryPoint::FragmentDepth,
        EntryPoint::DrawIndexed,
        EntryPoint::PixelPack,
        EntryPoint::MapRead,
    ];

    /// Name passed to the platform lookup hook.
    pub const fn name(self) -> &'static str {
        match self {
            EntryPoint::ColorTarget => "color_target_bgra8",
            EntryPoint::DepthTarget => "depth_target_d32f",
            EntryPoint::AuxImage => "aux_image_rg32ui",
            EntryPoint::GeometryBuffers => "geometry_buffers",
            EntryPoint::IntegerVertexAttributes => "integer_vertex_attributes",
            EntryPoint::ShaderModules => "shader_modules_wgsl",
            EntryPoint::FragmentDepth => "fragment_depth_write",
            EntryPoint::DrawIndexed => "draw_indexed_u16",
            EntryPoint::PixelPack => "copy_texture_to_buffer",
            EntryPoint::MapRead => "map_buffer_read",
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a resolved entry point is provided by the device.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Capability {
    /// Part of the baseline API.
    Core,
    /// Needs these optional features enabled on the device.
    Feature(wgpu::Features),
}

/// Platform hook resolving an entry point name.
///
/// Returns `None` when the entry point is unavailable.
pub trait ProcLoader {
    fn get_proc_address(&self, name: &str) -> Option<Capability>;
}

impl<F> ProcLoader for F
where
    F: Fn(&str) -> Option<Capability>,
{
    fn get_proc_address(&self, name: &str) -> Option<Capability> {
        self(name)
    }
}

/// Fully resolved entry point table.
///
/// Only ever built complete: [`resolve`] either finds every entry point or
/// returns a [`ResolveError`].
#[derive(Debug, Clone)]
pub struct DeviceFunctions {
    table: Vec<(EntryPoint, Capability)>,
    required_features: wgpu::Features,
}

impl DeviceFunctions {
    /// Capability backing `entry`.
    pub fn get(&self, entry: EntryPoint) -> Option<Capability> {
        self.table
            .iter()
            .find(|(e, _)| *e == entry)
            .map(|(_, cap)| *cap)
    }

    /// Union of optional features the device must be created with.
    pub fn required_features(&self) -> wgpu::Features {
        self.required_features
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// One or more required entry points could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveError {
    pub missing: Vec<EntryPoint>,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing device entry points: ")?;
        for (i, entry) in self.missing.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(entry.name())?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolveError {}

/// Resolves every [`EntryPoint`] through `loader`.
pub fn resolve(loader: &impl ProcLoader) -> Result<DeviceFunctions, ResolveError> {
    let mut table = Vec::with_capacity(EntryPoint::ALL.len());
    let mut missing = Vec::new();
    let mut required_features = wgpu::Features::empty();

    for entry in EntryPoint::ALL {
        match loader.get_proc_address(entry.name()) {
            Some(cap) => {
                if let Capability::Feature(features) = cap {
                    required_features |= features;
                }
                table.push((entry, cap));
            }
            None => {
                log::error!("device entry point {} not found", entry.name());
                missing.push(entry);
            }
        }
    }

    if !missing.is_empty() {
        return Err(ResolveError { missing });
    }

    log::debug!(
        "resolved {} device entry points (features: {:?})",
        table.len(),
        required_features
    );

    Ok(DeviceFunctions {
        table,
        required_features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_all_core_entry_points() {
        let functions = resolve(&|_: &str| Some(Capability::Core)).expect("all present");
        assert_eq!(functions.len(), EntryPoint::ALL.len());
        assert_eq!(functions.required_features(), wgpu::Features::empty());
        for entry in EntryPoint::ALL {
            assert_eq!(functions.get(entry), Some(Capability::Core));
        }
    }

    #[test]
    fn reports_every_missing_entry_point() {
        let loader = |name: &str| match name {
            "aux_image_rg32ui" | "map_buffer_read" => None,
            _ => Some(Capability::Core),
        };

        let err = resolve(&loader).unwrap_err();
        assert_eq!(err.missing, vec![EntryPoint::AuxImage, EntryPoint::MapRead]);
        assert_eq!(
            err.to_string(),
            "missing device entry points: aux_image_rg32ui, map_buffer_read"
        );
    }

    #[test]
    fn feature_capabilities_are_accumulated() {
        let loader = |name: &str| {
            if name == EntryPoint::AuxImage.name() {
                Some(Capability::Feature(
                    wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
                ))
            } else {
                Some(Capability::Core)
            }
        };

        let functions = resolve(&loader).expect("all present");
        assert_eq!(
            functions.required_features(),
            wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES
        );
    }

    #[test]
    fn entry_point_names_are_unique() {
        let mut names: Vec<_> = EntryPoint::ALL.iter().map(|e| e.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EntryPoint::ALL.len());
    }
}
