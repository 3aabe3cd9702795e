//! Deferred command recording for a D3D11 immediate context.
//!
//! State setters only touch the uncommitted head of their [`StateStack`]. Terminal operations
//! commit every stack they consume and append an [`Action`] that holds the resulting indices.
//! Replay lives in [`crate::execute`].

use std::cell::Cell;

use crate::action::{
    Action, ClearDsvArgs, ClearRtvArgs, DispatchArgs, DrawArgs, DrawIndexedArgs,
    GraphicsStateIndices, NullifyArgs, NullifyType,
};
use crate::context::DeviceContext;
use crate::copy::{BufferToBufferCopy, BufferToImageCopy, ImageToBufferCopy, ImageToImageCopy};
use crate::limits::{MAX_RENDER_TARGETS, MAX_SCISSORS, MAX_VERTEX_BINDINGS, MAX_VIEWPORTS};
use crate::slots::{ComputeSlotState, GraphicsSlotState};
use crate::state::{
    bounded_vec, IndexBufferState, PipelineState, RtvDsvState, ScissorState, VertexBufferState,
    ViewportState,
};
use crate::state_stack::StateStack;
use crate::types::{
    BufferId, ClearFlags, DepthStencilView, IndexFormat, QueryId, Rect, RenderTargetView,
    ResourceId, SamplerId, ShaderId, ShaderResourceView, ShaderStage, UnorderedAccessView, Viewport,
};

/// A recorded, replayable sequence of D3D11 commands.
///
/// A list is recording from construction (or [`CommandList::reset`]) until it is executed.
/// Recording into an executed list without resetting it first is a bug and trips a debug
/// assertion.
#[derive(Debug)]
pub struct CommandList {
    pub(crate) graphics_slot_state: StateStack<GraphicsSlotState>,
    pub(crate) compute_slot_state: StateStack<ComputeSlotState>,
    pub(crate) index_buffer_state: StateStack<IndexBufferState>,
    pub(crate) vertex_buffer_state: StateStack<VertexBufferState>,
    pub(crate) scissor_state: StateStack<ScissorState>,
    pub(crate) viewport_state: StateStack<ViewportState>,
    pub(crate) rtv_dsv_state: StateStack<RtvDsvState>,
    pub(crate) pipeline_state: StateStack<PipelineState>,
    pub(crate) actions: Vec<Action>,
    executed: Cell<bool>,
}

impl Default for CommandList {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandList {
    pub fn new() -> Self {
        Self {
            graphics_slot_state: StateStack::new(),
            compute_slot_state: StateStack::new(),
            index_buffer_state: StateStack::new(),
            vertex_buffer_state: StateStack::new(),
            scissor_state: StateStack::new(),
            viewport_state: StateStack::new(),
            rtv_dsv_state: StateStack::new(),
            pipeline_state: StateStack::new(),
            actions: Vec::new(),
            executed: Cell::new(false),
        }
    }

    /// Discards all recorded actions and state history and starts a new recording.
    pub fn reset(&mut self) {
        self.graphics_slot_state.reset();
        self.compute_slot_state.reset();
        self.index_buffer_state.reset();
        self.vertex_buffer_state.reset();
        self.scissor_state.reset();
        self.viewport_state.reset();
        self.rtv_dsv_state.reset();
        self.pipeline_state.reset();
        self.actions.clear();
        self.executed.set(false);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_executed(&self) -> bool {
        self.executed.get()
    }

    pub(crate) fn mark_executed(&self) {
        self.executed.set(true);
    }

    pub fn graphics_slot_states(&self) -> &StateStack<GraphicsSlotState> {
        &self.graphics_slot_state
    }

    pub fn compute_slot_states(&self) -> &StateStack<ComputeSlotState> {
        &self.compute_slot_state
    }

    pub fn viewport_states(&self) -> &StateStack<ViewportState> {
        &self.viewport_state
    }

    pub fn pipeline_states(&self) -> &StateStack<PipelineState> {
        &self.pipeline_state
    }

    fn debug_assert_recording(&self) {
        debug_assert!(
            !self.executed.get(),
            "command list was executed; reset() it before recording again"
        );
    }

    // ---------------------------------------------------------------------------------------------
    // Slot bindings
    // ---------------------------------------------------------------------------------------------

    pub fn set_constant_buffers(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        buffers: &[Option<BufferId>],
    ) {
        self.debug_assert_recording();
        match stage {
            ShaderStage::Compute => self
                .compute_slot_state
                .current_mut()
                .cs
                .constant_buffers
                .update(start_slot, buffers),
            _ => self
                .graphics_slot_state
                .current_mut()
                .stage_mut(stage)
                .constant_buffers
                .update(start_slot, buffers),
        }
    }

    pub fn set_shader_resources(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        views: &[Option<ShaderResourceView>],
    ) {
        self.debug_assert_recording();
        match stage {
            ShaderStage::Compute => self
                .compute_slot_state
                .current_mut()
                .cs
                .shader_resources
                .update(start_slot, views),
            _ => self
                .graphics_slot_state
                .current_mut()
                .stage_mut(stage)
                .shader_resources
                .update(start_slot, views),
        }
    }

    pub fn set_samplers(&mut self, stage: ShaderStage, start_slot: u32, samplers: &[Option<SamplerId>]) {
        self.debug_assert_recording();
        match stage {
            ShaderStage::Compute => self
                .compute_slot_state
                .current_mut()
                .cs
                .samplers
                .update(start_slot, samplers),
            _ => self
                .graphics_slot_state
                .current_mut()
                .stage_mut(stage)
                .samplers
                .update(start_slot, samplers),
        }
    }

    pub fn cs_set_unordered_access_views(
        &mut self,
        start_slot: u32,
        views: &[Option<UnorderedAccessView>],
    ) {
        self.debug_assert_recording();
        self.compute_slot_state
            .current_mut()
            .cs
            .unordered_access
            .update(start_slot, views);
    }

    // ---------------------------------------------------------------------------------------------
    // Fixed-function state
    // ---------------------------------------------------------------------------------------------

    pub fn ia_set_index_buffer(&mut self, buffer: Option<BufferId>, format: IndexFormat, offset: u32) {
        self.debug_assert_recording();
        *self.index_buffer_state.current_mut() = IndexBufferState {
            buffer,
            format,
            offset,
        };
    }

    /// # Panics
    ///
    /// Panics if the three slices differ in length or hold more than 16 bindings.
    pub fn ia_set_vertex_buffers(
        &mut self,
        start_slot: u32,
        buffers: &[Option<BufferId>],
        strides: &[u32],
        offsets: &[u32],
    ) {
        self.debug_assert_recording();
        assert!(
            buffers.len() == strides.len() && buffers.len() == offsets.len(),
            "vertex buffer, stride and offset counts differ ({}, {}, {})",
            buffers.len(),
            strides.len(),
            offsets.len()
        );
        assert!(
            buffers.len() <= MAX_VERTEX_BINDINGS,
            "{} vertex buffers exceeds the limit of {MAX_VERTEX_BINDINGS}",
            buffers.len()
        );

        let n = buffers.len();
        let state = self.vertex_buffer_state.current_mut();
        state.start_slot = start_slot;
        state.num_buffers = n as u32;
        state.buffers[..n].copy_from_slice(buffers);
        state.strides[..n].copy_from_slice(strides);
        state.offsets[..n].copy_from_slice(offsets);
    }

    pub fn rs_set_scissor_rects(&mut self, rects: &[Rect]) {
        self.debug_assert_recording();
        self.scissor_state.current_mut().rects = bounded_vec(rects, MAX_SCISSORS, "scissor rects");
    }

    pub fn rs_set_viewports(&mut self, viewports: &[Viewport]) {
        self.debug_assert_recording();
        self.viewport_state.current_mut().viewports =
            bounded_vec(viewports, MAX_VIEWPORTS, "viewports");
    }

    pub fn om_set_render_targets(&mut self, rtvs: &[RenderTargetView], dsv: Option<DepthStencilView>) {
        self.debug_assert_recording();
        let state = self.rtv_dsv_state.current_mut();
        state.rtvs = bounded_vec(rtvs, MAX_RENDER_TARGETS, "render target views");
        state.dsv = dsv;
    }

    pub fn set_pipeline_state(&mut self, state: &PipelineState) {
        self.debug_assert_recording();
        *self.pipeline_state.current_mut() = *state;
    }

    /// Replaces every pipeline field except the compute shader.
    pub fn set_graphics_pipeline_state(&mut self, state: &PipelineState) {
        self.debug_assert_recording();
        let current = self.pipeline_state.current_mut();
        *current = PipelineState {
            cs: current.cs,
            ..*state
        };
    }

    pub fn cs_set_shader(&mut self, shader: Option<ShaderId>) {
        self.debug_assert_recording();
        self.pipeline_state.current_mut().cs = shader;
    }

    // ---------------------------------------------------------------------------------------------
    // Terminal operations
    // ---------------------------------------------------------------------------------------------

    fn push(&mut self, action: Action) {
        self.debug_assert_recording();
        self.actions.push(action);
    }

    pub fn clear_depth_stencil_view(
        &mut self,
        dsv: DepthStencilView,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    ) {
        let rtv_dsv_state_index = self.rtv_dsv_state.commit();
        self.push(Action::ClearDsv(ClearDsvArgs {
            rtv_dsv_state_index,
            dsv,
            flags,
            depth,
            stencil,
        }));
    }

    pub fn clear_render_target_view(&mut self, rtv: RenderTargetView, color: [f32; 4]) {
        let rtv_dsv_state_index = self.rtv_dsv_state.commit();
        self.push(Action::ClearRtv(ClearRtvArgs {
            rtv_dsv_state_index,
            rtv,
            color,
        }));
    }

    /// Records an unbind of every SRV (or compute UAV) slot that references `resource` at the
    /// time of replay.
    pub fn nullify(&mut self, resource: ResourceId, kind: NullifyType) {
        self.push(Action::Nullify(NullifyArgs { resource, kind }));
    }

    pub fn dispatch(
        &mut self,
        thread_group_count_x: u32,
        thread_group_count_y: u32,
        thread_group_count_z: u32,
    ) {
        let compute_slot_state_index = self.compute_slot_state.commit();
        let pipeline_state_index = self.pipeline_state.commit();
        self.push(Action::Dispatch(DispatchArgs {
            compute_slot_state_index,
            pipeline_state_index,
            thread_group_count_x,
            thread_group_count_y,
            thread_group_count_z,
        }));
    }

    fn commit_graphics_state(&mut self) -> GraphicsStateIndices {
        GraphicsStateIndices {
            graphics_slot_state_index: self.graphics_slot_state.commit(),
            vertex_buffer_state_index: self.vertex_buffer_state.commit(),
            scissor_state_index: self.scissor_state.commit(),
            viewport_state_index: self.viewport_state.commit(),
            rtv_dsv_state_index: self.rtv_dsv_state.commit(),
            pipeline_state_index: self.pipeline_state.commit(),
        }
    }

    pub fn draw_instanced(
        &mut self,
        vertex_count_per_instance: u32,
        instance_count: u32,
        start_vertex_location: u32,
        start_instance_location: u32,
    ) {
        let state = self.commit_graphics_state();
        self.push(Action::Draw(DrawArgs {
            state,
            vertex_count_per_instance,
            instance_count,
            start_vertex_location,
            start_instance_location,
        }));
    }

    pub fn draw_indexed_instanced(
        &mut self,
        index_count_per_instance: u32,
        instance_count: u32,
        start_index_location: u32,
        base_vertex_location: i32,
        start_instance_location: u32,
    ) {
        let state = self.commit_graphics_state();
        let index_buffer_state_index = self.index_buffer_state.commit();
        self.push(Action::DrawIndexed(DrawIndexedArgs {
            state,
            index_buffer_state_index,
            index_count_per_instance,
            instance_count,
            start_index_location,
            base_vertex_location,
            start_instance_location,
        }));
    }

    pub fn copy_buffer_to_buffer(&mut self, copy: &BufferToBufferCopy) {
        self.push(Action::CopyBufferToBuffer(*copy));
    }

    pub fn copy_buffer_to_image(&mut self, copy: &BufferToImageCopy) {
        self.push(Action::CopyBufferToImage(*copy));
    }

    pub fn copy_image_to_buffer(&mut self, copy: &ImageToBufferCopy) {
        self.push(Action::CopyImageToBuffer(*copy));
    }

    pub fn copy_image_to_image(&mut self, copy: &ImageToImageCopy) {
        self.push(Action::CopyImageToImage(*copy));
    }

    pub fn begin_query(&mut self, query: QueryId) {
        self.push(Action::BeginQuery(query));
    }

    pub fn end_query(&mut self, query: QueryId) {
        self.push(Action::EndQuery(query));
    }

    pub fn write_timestamp(&mut self, query: QueryId) {
        self.push(Action::WriteTimestamp(query));
    }

    /// Records a callback that draws directly on the device context during replay.
    pub fn imgui_render<F>(&mut self, render: F)
    where
        F: Fn(&mut dyn DeviceContext) + Send + 'static,
    {
        self.push(Action::ImGuiRender(Box::new(render)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::GraphicsShaderSlots;
    use crate::types::{RtvId, SrvId, TextureId};

    fn rtv(id: u32) -> RenderTargetView {
        RenderTargetView {
            id: RtvId(id),
            resource: TextureId(id).into(),
        }
    }

    fn draw_indices(action: &Action) -> GraphicsStateIndices {
        match action {
            Action::Draw(args) => args.state,
            Action::DrawIndexed(args) => args.state,
            other => panic!("expected a draw, got {other:?}"),
        }
    }

    #[test]
    fn draws_without_state_changes_share_indices() {
        let mut list = CommandList::new();
        list.rs_set_viewports(&[Viewport {
            width: 800.0,
            height: 600.0,
            max_depth: 1.0,
            ..Viewport::default()
        }]);
        list.draw_instanced(3, 1, 0, 0);
        list.draw_instanced(3, 1, 3, 0);
        assert_eq!(draw_indices(&list.actions()[0]), draw_indices(&list.actions()[1]));
    }

    #[test]
    fn only_touched_stack_advances() {
        let mut list = CommandList::new();
        list.rs_set_scissor_rects(&[Rect {
            right: 10,
            bottom: 10,
            ..Rect::default()
        }]);
        list.draw_instanced(3, 1, 0, 0);
        list.rs_set_scissor_rects(&[Rect {
            right: 20,
            bottom: 20,
            ..Rect::default()
        }]);
        list.draw_instanced(3, 1, 0, 0);

        let a = draw_indices(&list.actions()[0]);
        let b = draw_indices(&list.actions()[1]);
        assert_ne!(a.scissor_state_index, b.scissor_state_index);
        assert_eq!(a.viewport_state_index, b.viewport_state_index);
        assert_eq!(a.pipeline_state_index, b.pipeline_state_index);
        assert_eq!(a.rtv_dsv_state_index, b.rtv_dsv_state_index);
    }

    #[test]
    fn terminal_without_state_references_defaults() {
        let mut list = CommandList::new();
        list.draw_instanced(1, 1, 0, 0);
        let idx = draw_indices(&list.actions()[0]);
        assert_eq!(idx.graphics_slot_state_index, 0);
        assert_eq!(idx.pipeline_state_index, 0);
    }

    #[test]
    fn clear_commits_render_targets() {
        let mut list = CommandList::new();
        list.om_set_render_targets(&[rtv(1)], None);
        list.clear_render_target_view(rtv(1), [0.0; 4]);
        match &list.actions()[0] {
            Action::ClearRtv(args) => {
                assert_eq!(args.rtv_dsv_state_index, 1);
                assert_eq!(list.rtv_dsv_state.at(1).rtvs, vec![rtv(1)]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn slot_updates_route_by_stage() {
        let mut list = CommandList::new();
        let view = ShaderResourceView {
            id: SrvId(2),
            resource: TextureId(8).into(),
        };
        list.set_shader_resources(ShaderStage::Pixel, 4, &[Some(view)]);
        list.set_shader_resources(ShaderStage::Compute, 1, &[Some(view)]);
        list.draw_instanced(3, 1, 0, 0);
        list.dispatch(1, 1, 1);

        let graphics = list.graphics_slot_states().at(1);
        assert_eq!(graphics.ps.shader_resources.get(4), Some(view));
        assert_eq!(graphics.vs, GraphicsShaderSlots::default());
        let compute = list.compute_slot_states().at(1);
        assert_eq!(compute.cs.shader_resources.resource(1), Some(TextureId(8).into()));
    }

    #[test]
    fn reset_clears_actions_and_history() {
        let mut list = CommandList::new();
        list.rs_set_viewports(&[Viewport::default()]);
        list.draw_instanced(3, 1, 0, 0);
        list.mark_executed();
        list.reset();

        assert!(list.actions().is_empty());
        assert!(!list.is_executed());
        assert_eq!(list.viewport_states().len(), 1);
        assert_eq!(list.viewport_states().at(0), &ViewportState::default());
        assert_eq!(list.pipeline_states().at(0), &PipelineState::default());
    }

    #[test]
    #[should_panic(expected = "vertex buffer, stride and offset counts differ")]
    fn mismatched_vertex_buffer_arrays_panic() {
        let mut list = CommandList::new();
        list.ia_set_vertex_buffers(0, &[Some(BufferId(1))], &[16, 16], &[0]);
    }

    #[test]
    #[should_panic(expected = "exceeds the limit of 8")]
    fn too_many_render_targets_panic() {
        let mut list = CommandList::new();
        let rtvs: Vec<_> = (0..9).map(rtv).collect();
        list.om_set_render_targets(&rtvs, None);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "reset() it before recording again")]
    fn recording_after_execute_asserts() {
        let mut list = CommandList::new();
        list.mark_executed();
        list.draw_instanced(3, 1, 0, 0);
    }
}
