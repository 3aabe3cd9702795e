//! Non-slot pipeline state snapshots kept in state stacks.

use crate::limits::{DEFAULT_SAMPLE_MASK, MAX_VERTEX_BINDINGS};
use crate::state_stack::StackState;
use crate::types::{
    BlendStateId, BufferId, DepthStencilStateId, DepthStencilView, IndexFormat, InputLayoutId,
    PrimitiveTopology, RasterizerStateId, Rect, RenderTargetView, ShaderId, ShaderStage, Viewport,
};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndexBufferState {
    pub buffer: Option<BufferId>,
    pub format: IndexFormat,
    pub offset: u32,
}

impl StackState for IndexBufferState {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBufferState {
    pub start_slot: u32,
    pub num_buffers: u32,
    pub buffers: [Option<BufferId>; MAX_VERTEX_BINDINGS],
    pub strides: [u32; MAX_VERTEX_BINDINGS],
    pub offsets: [u32; MAX_VERTEX_BINDINGS],
}

impl VertexBufferState {
    /// The first `num_buffers` entries as (buffers, strides, offsets), bound from `start_slot`.
    pub fn bound(&self) -> (&[Option<BufferId>], &[u32], &[u32]) {
        let n = self.num_buffers as usize;
        (&self.buffers[..n], &self.strides[..n], &self.offsets[..n])
    }
}

impl StackState for VertexBufferState {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScissorState {
    pub rects: Vec<Rect>,
}

impl StackState for ScissorState {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewportState {
    pub viewports: Vec<Viewport>,
}

impl StackState for ViewportState {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RtvDsvState {
    pub rtvs: Vec<RenderTargetView>,
    pub dsv: Option<DepthStencilView>,
}

impl StackState for RtvDsvState {}

/// Shaders and fixed-function state set together by `set_pipeline_state`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineState {
    pub vs: Option<ShaderId>,
    pub hs: Option<ShaderId>,
    pub ds: Option<ShaderId>,
    pub gs: Option<ShaderId>,
    pub ps: Option<ShaderId>,
    pub cs: Option<ShaderId>,
    pub input_layout: Option<InputLayoutId>,
    pub primitive_topology: PrimitiveTopology,
    pub rasterizer_state: Option<RasterizerStateId>,
    pub depth_stencil_state: Option<DepthStencilStateId>,
    pub blend_state: Option<BlendStateId>,
    pub blend_factors: [f32; 4],
    pub sample_mask: u32,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            vs: None,
            hs: None,
            ds: None,
            gs: None,
            ps: None,
            cs: None,
            input_layout: None,
            primitive_topology: PrimitiveTopology::Undefined,
            rasterizer_state: None,
            depth_stencil_state: None,
            blend_state: None,
            blend_factors: [0.0; 4],
            sample_mask: DEFAULT_SAMPLE_MASK,
        }
    }
}

impl PipelineState {
    pub fn shader(&self, stage: ShaderStage) -> Option<ShaderId> {
        match stage {
            ShaderStage::Vertex => self.vs,
            ShaderStage::Hull => self.hs,
            ShaderStage::Domain => self.ds,
            ShaderStage::Geometry => self.gs,
            ShaderStage::Pixel => self.ps,
            ShaderStage::Compute => self.cs,
        }
    }

    /// Whether `self` and `other` set the same graphics stages and fixed-function state.
    pub fn graphics_matches(&self, other: &PipelineState) -> bool {
        PipelineState { cs: None, ..*self } == PipelineState { cs: None, ..*other }
    }

    pub fn compute_matches(&self, other: &PipelineState) -> bool {
        self.cs == other.cs
    }
}

impl StackState for PipelineState {}

/// Copies `src`, asserting it fits within `max` entries.
pub(crate) fn bounded_vec<T: Copy>(src: &[T], max: usize, what: &str) -> Vec<T> {
    assert!(
        src.len() <= max,
        "{} {what} exceeds the limit of {max}",
        src.len()
    );
    src.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_buffer_window() {
        let mut state = VertexBufferState::default();
        state.start_slot = 3;
        state.num_buffers = 2;
        state.buffers[0] = Some(BufferId(5));
        state.buffers[1] = Some(BufferId(6));
        state.buffers[2] = Some(BufferId(7));
        state.strides[1] = 32;
        let (buffers, strides, offsets) = state.bound();
        assert_eq!(buffers, &[Some(BufferId(5)), Some(BufferId(6))]);
        assert_eq!(strides, &[0, 32]);
        assert_eq!(offsets, &[0, 0]);
    }

    #[test]
    fn pipeline_default_uses_full_sample_mask() {
        let state = PipelineState::default();
        assert_eq!(state.sample_mask, u32::MAX);
        assert_eq!(state.shader(ShaderStage::Vertex), None);
    }

    #[test]
    #[should_panic(expected = "exceeds the limit of 8")]
    fn bounded_vec_asserts() {
        let rects = [Rect::default(); 9];
        let _ = bounded_vec(&rects, 8, "rects");
    }
}
