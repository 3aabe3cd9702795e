//! D3D11 architectural limits used to size slot arrays.

/// `D3D11_COMMONSHADER_CONSTANT_BUFFER_API_SLOT_COUNT`
pub const MAX_CONSTANT_BUFFER_SLOTS: usize = 14;
/// `D3D11_COMMONSHADER_INPUT_RESOURCE_SLOT_COUNT`
pub const MAX_SHADER_RESOURCE_SLOTS: usize = 128;
/// `D3D11_COMMONSHADER_SAMPLER_SLOT_COUNT`
pub const MAX_SAMPLER_SLOTS: usize = 16;
/// `D3D11_1_UAV_SLOT_COUNT`
pub const MAX_UNORDERED_ACCESS_SLOTS: usize = 64;
/// `D3D11_SIMULTANEOUS_RENDER_TARGET_COUNT`
pub const MAX_RENDER_TARGETS: usize = 8;

pub const MAX_VERTEX_BINDINGS: usize = 16;
pub const MAX_VIEWPORTS: usize = 16;
pub const MAX_SCISSORS: usize = 16;

/// Stencil reference used when applying a depth-stencil state.
pub const DEFAULT_STENCIL_REF: u32 = 1;
/// Default `OMSetBlendState` sample mask.
pub const DEFAULT_SAMPLE_MASK: u32 = u32::MAX;
/// Descriptor sets accepted by a single bind call.
pub const MAX_BOUND_DESCRIPTOR_SETS: usize = 32;
