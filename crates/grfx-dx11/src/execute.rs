//! Replay of a recorded [`CommandList`] onto a device context.
//!
//! Replay is one linear pass over the actions. Every state index an action references is compared
//! with the index last applied for that kind during this pass, and only changed state is re-issued.
//! The last-applied indices live for one `execute` call; the bound-resource table in
//! [`DeviceContextState`] lives as long as the device context.

use tracing::{debug, debug_span, error, trace};

use crate::action::{
    Action, ClearDsvArgs, ClearRtvArgs, DispatchArgs, DrawArgs, DrawIndexedArgs,
    GraphicsStateIndices, NullifyArgs, NullifyType,
};
use crate::bound_state::DeviceContextState;
use crate::command_list::CommandList;
use crate::context::{CopyRegion, DeviceContext, DeviceError, SubresourceUpdate};
use crate::copy::{
    pack_texel_rows, source_box, subresource_index, BufferToBufferCopy, BufferToImageCopy,
    ImageToBufferCopy, ImageToImageCopy,
};
use crate::limits::DEFAULT_STENCIL_REF;
use crate::slots::{
    ComputeSlotState, ConstantBufferSlots, GraphicsSlotState, SamplerSlots,
    ShaderResourceViewSlots, UnorderedAccessViewSlots,
};
use crate::state::{IndexBufferState, PipelineState, RtvDsvState, ScissorState, VertexBufferState, ViewportState};
use crate::state_stack::StateStack;
use crate::types::{BufferId, MapType, Offset3, ShaderStage, TextureId};

/// Environment variable that turns off redundant-state elision when set to a truthy value.
pub const DISABLE_STATE_ELISION_ENV: &str = "GRFX_DX11_DISABLE_STATE_ELISION";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteConfig {
    /// Skip re-applying state whose index matches the one applied last. With this off every
    /// action re-issues all state it references.
    pub elide_redundant_state: bool,
}

impl Default for ExecuteConfig {
    fn default() -> Self {
        Self {
            elide_redundant_state: true,
        }
    }
}

impl ExecuteConfig {
    /// Default configuration, adjusted by [`DISABLE_STATE_ELISION_ENV`].
    pub fn from_env() -> Self {
        Self {
            elide_redundant_state: !env_var_truthy(DISABLE_STATE_ELISION_ENV),
        }
    }
}

fn env_var_truthy(name: &str) -> bool {
    let Ok(raw) = std::env::var(name) else {
        return false;
    };

    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}

/// Counters collected during one replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecuteMetrics {
    pub actions: usize,
    /// State snapshots re-issued to the device.
    pub state_applications: u32,
    /// State snapshots skipped because the same index was already applied.
    pub state_elisions: u32,
    /// SRV/UAV slots unbound by `Nullify` actions.
    pub nullified_slots: u32,
    /// Copies abandoned because a map or staging allocation failed.
    pub skipped_copies: u32,
}

impl ExecuteMetrics {
    pub fn accumulate(&mut self, other: &ExecuteMetrics) {
        self.actions += other.actions;
        self.state_applications = self.state_applications.saturating_add(other.state_applications);
        self.state_elisions = self.state_elisions.saturating_add(other.state_elisions);
        self.nullified_slots = self.nullified_slots.saturating_add(other.nullified_slots);
        self.skipped_copies = self.skipped_copies.saturating_add(other.skipped_copies);
    }
}

const INVALID_STATE_INDEX: u32 = u32::MAX;

/// Index of the snapshot last applied for each state kind during one replay.
#[derive(Debug, Clone, Copy)]
struct ExecutionState {
    graphics_slot: u32,
    compute_slot: u32,
    index_buffer: u32,
    vertex_buffer: u32,
    scissor: u32,
    viewport: u32,
    rtv_dsv: u32,
    graphics_pipeline: u32,
    compute_pipeline: u32,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self {
            graphics_slot: INVALID_STATE_INDEX,
            compute_slot: INVALID_STATE_INDEX,
            index_buffer: INVALID_STATE_INDEX,
            vertex_buffer: INVALID_STATE_INDEX,
            scissor: INVALID_STATE_INDEX,
            viewport: INVALID_STATE_INDEX,
            rtv_dsv: INVALID_STATE_INDEX,
            graphics_pipeline: INVALID_STATE_INDEX,
            compute_pipeline: INVALID_STATE_INDEX,
        }
    }
}

impl CommandList {
    /// Replays every recorded action, in order, onto `context`.
    ///
    /// `bound` must be the state table of `context`; it is updated with every SRV/UAV binding
    /// issued and consulted by `Nullify` actions. The list is marked executed and must be reset
    /// before it is recorded into again. It may be executed more than once.
    pub fn execute(
        &self,
        context: &mut dyn DeviceContext,
        bound: &mut DeviceContextState,
        config: &ExecuteConfig,
    ) -> ExecuteMetrics {
        let _span = debug_span!("command_list_execute", actions = self.actions.len()).entered();
        self.mark_executed();

        let mut executor = Executor {
            list: self,
            ctx: context,
            bound,
            elide: config.elide_redundant_state,
            applied: ExecutionState::default(),
            metrics: ExecuteMetrics {
                actions: self.actions.len(),
                ..ExecuteMetrics::default()
            },
        };
        for action in &self.actions {
            executor.execute_action(action);
        }

        let metrics = executor.metrics;
        debug!(
            actions = metrics.actions,
            applied = metrics.state_applications,
            elided = metrics.state_elisions,
            nullified = metrics.nullified_slots,
            skipped_copies = metrics.skipped_copies,
            "executed command list"
        );
        metrics
    }
}

struct Executor<'a> {
    list: &'a CommandList,
    ctx: &'a mut dyn DeviceContext,
    bound: &'a mut DeviceContextState,
    elide: bool,
    applied: ExecutionState,
    metrics: ExecuteMetrics,
}

/// Records `index` as applied and reports whether the device needs it.
fn index_changed(
    applied: &mut u32,
    index: u32,
    elide: bool,
    metrics: &mut ExecuteMetrics,
    kind: &'static str,
) -> bool {
    if elide && *applied == index {
        metrics.state_elisions += 1;
        return false;
    }
    *applied = index;
    metrics.state_applications += 1;
    trace!(kind, index, "applying state");
    true
}

/// [`index_changed`] for the shared pipeline stack: a new index whose snapshot `matches` the one
/// applied last on the fields this kind of action consumes is still elided.
fn pipeline_changed(
    applied: &mut u32,
    index: u32,
    stack: &StateStack<PipelineState>,
    matches: fn(&PipelineState, &PipelineState) -> bool,
    elide: bool,
    metrics: &mut ExecuteMetrics,
    kind: &'static str,
) -> bool {
    if elide
        && *applied != INVALID_STATE_INDEX
        && *applied != index
        && matches(stack.at(*applied), stack.at(index))
    {
        *applied = index;
        metrics.state_elisions += 1;
        return false;
    }
    index_changed(applied, index, elide, metrics, kind)
}

impl Executor<'_> {
    fn execute_action(&mut self, action: &Action) {
        trace!(action = action.name(), "execute");
        match action {
            Action::ClearDsv(args) => self.clear_dsv(args),
            Action::ClearRtv(args) => self.clear_rtv(args),
            Action::Nullify(args) => self.nullify(args),
            Action::Dispatch(args) => self.dispatch(args),
            Action::Draw(args) => self.draw(args),
            Action::DrawIndexed(args) => self.draw_indexed(args),
            Action::CopyBufferToBuffer(copy) => copy_buffer_to_buffer(&mut *self.ctx, copy),
            Action::CopyBufferToImage(copy) => {
                let result = copy_buffer_to_image(&mut *self.ctx, copy);
                self.finish_copy("buffer-to-image", result);
            }
            Action::CopyImageToBuffer(copy) => {
                let result = copy_image_to_buffer(&mut *self.ctx, copy);
                self.finish_copy("image-to-buffer", result);
            }
            Action::CopyImageToImage(copy) => copy_image_to_image(&mut *self.ctx, copy),
            Action::BeginQuery(query) => self.ctx.begin_query(*query),
            Action::EndQuery(query) => self.ctx.end_query(*query),
            Action::WriteTimestamp(query) => self.ctx.end_query(*query),
            Action::ImGuiRender(render) => render(&mut *self.ctx),
        }
    }

    fn finish_copy(&mut self, what: &'static str, result: Result<(), DeviceError>) {
        if let Err(err) = result {
            error!(copy = what, error = %err, "skipping copy");
            self.metrics.skipped_copies += 1;
        }
    }

    fn apply_rtv_dsv(&mut self, index: u32) {
        if index_changed(&mut self.applied.rtv_dsv, index, self.elide, &mut self.metrics, "rtv_dsv") {
            apply_render_targets(&mut *self.ctx, self.list.rtv_dsv_state.at(index));
        }
    }

    fn clear_dsv(&mut self, args: &ClearDsvArgs) {
        self.apply_rtv_dsv(args.rtv_dsv_state_index);
        self.ctx
            .clear_depth_stencil_view(args.dsv, args.flags, args.depth, args.stencil);
    }

    fn clear_rtv(&mut self, args: &ClearRtvArgs) {
        self.apply_rtv_dsv(args.rtv_dsv_state_index);
        self.ctx.clear_render_target_view(args.rtv, args.color);
    }

    fn nullify(&mut self, args: &NullifyArgs) {
        match args.kind {
            NullifyType::Srv => {
                for stage in ShaderStage::ALL {
                    for slot in self.bound.bound_srv_slots(stage, args.resource) {
                        self.ctx.set_shader_resources(stage, slot, &[None]);
                        self.bound.set_bound_srv_slot(stage, slot, None);
                        self.metrics.nullified_slots += 1;
                    }
                }
            }
            NullifyType::Uav => {
                for slot in self.bound.bound_uav_slots(args.resource) {
                    self.ctx.cs_set_unordered_access_views(slot, &[None]);
                    self.bound.set_bound_uav_slot(slot, None);
                    self.metrics.nullified_slots += 1;
                }
            }
        }
    }

    fn dispatch(&mut self, args: &DispatchArgs) {
        let list = self.list;
        if index_changed(
            &mut self.applied.compute_slot,
            args.compute_slot_state_index,
            self.elide,
            &mut self.metrics,
            "compute_slots",
        ) {
            apply_compute_slots(
                &mut *self.ctx,
                self.bound,
                list.compute_slot_state.at(args.compute_slot_state_index),
            );
        }
        if pipeline_changed(
            &mut self.applied.compute_pipeline,
            args.pipeline_state_index,
            &list.pipeline_state,
            PipelineState::compute_matches,
            self.elide,
            &mut self.metrics,
            "compute_pipeline",
        ) {
            apply_compute_pipeline(&mut *self.ctx, list.pipeline_state.at(args.pipeline_state_index));
        }

        self.ctx.dispatch(
            args.thread_group_count_x,
            args.thread_group_count_y,
            args.thread_group_count_z,
        );
    }

    /// Applies everything a draw needs except the index buffer, in device order.
    fn apply_graphics_state(&mut self, state: &GraphicsStateIndices, index_buffer: Option<u32>) {
        let list = self.list;
        if index_changed(
            &mut self.applied.graphics_slot,
            state.graphics_slot_state_index,
            self.elide,
            &mut self.metrics,
            "graphics_slots",
        ) {
            apply_graphics_slots(
                &mut *self.ctx,
                self.bound,
                list.graphics_slot_state.at(state.graphics_slot_state_index),
            );
        }
        if let Some(index) = index_buffer {
            if index_changed(
                &mut self.applied.index_buffer,
                index,
                self.elide,
                &mut self.metrics,
                "index_buffer",
            ) {
                apply_index_buffer(&mut *self.ctx, list.index_buffer_state.at(index));
            }
        }
        if index_changed(
            &mut self.applied.vertex_buffer,
            state.vertex_buffer_state_index,
            self.elide,
            &mut self.metrics,
            "vertex_buffers",
        ) {
            apply_vertex_buffers(&mut *self.ctx, list.vertex_buffer_state.at(state.vertex_buffer_state_index));
        }
        if index_changed(
            &mut self.applied.scissor,
            state.scissor_state_index,
            self.elide,
            &mut self.metrics,
            "scissors",
        ) {
            apply_scissors(&mut *self.ctx, list.scissor_state.at(state.scissor_state_index));
        }
        if index_changed(
            &mut self.applied.viewport,
            state.viewport_state_index,
            self.elide,
            &mut self.metrics,
            "viewports",
        ) {
            apply_viewports(&mut *self.ctx, list.viewport_state.at(state.viewport_state_index));
        }
        self.apply_rtv_dsv(state.rtv_dsv_state_index);
        if pipeline_changed(
            &mut self.applied.graphics_pipeline,
            state.pipeline_state_index,
            &list.pipeline_state,
            PipelineState::graphics_matches,
            self.elide,
            &mut self.metrics,
            "graphics_pipeline",
        ) {
            apply_graphics_pipeline(&mut *self.ctx, list.pipeline_state.at(state.pipeline_state_index));
        }
    }

    fn draw(&mut self, args: &DrawArgs) {
        self.apply_graphics_state(&args.state, None);
        self.ctx.draw_instanced(
            args.vertex_count_per_instance,
            args.instance_count,
            args.start_vertex_location,
            args.start_instance_location,
        );
    }

    fn draw_indexed(&mut self, args: &DrawIndexedArgs) {
        self.apply_graphics_state(&args.state, Some(args.index_buffer_state_index));
        self.ctx.draw_indexed_instanced(
            args.index_count_per_instance,
            args.instance_count,
            args.start_index_location,
            args.base_vertex_location,
            args.start_instance_location,
        );
    }
}

// -------------------------------------------------------------------------------------------------
// State application
// -------------------------------------------------------------------------------------------------

fn apply_constant_buffers(ctx: &mut dyn DeviceContext, stage: ShaderStage, slots: &ConstantBufferSlots) {
    for range in slots.ranges() {
        ctx.set_constant_buffers(stage, range.start_slot, slots.range_values(*range));
    }
}

fn apply_shader_resources(
    ctx: &mut dyn DeviceContext,
    bound: &mut DeviceContextState,
    stage: ShaderStage,
    slots: &ShaderResourceViewSlots,
) {
    for range in slots.ranges() {
        ctx.set_shader_resources(stage, range.start_slot, slots.range_values(*range));
        for slot in range.start_slot..range.start_slot + range.num_slots {
            bound.set_bound_srv_slot(stage, slot, slots.resource(slot));
        }
    }
}

fn apply_samplers(ctx: &mut dyn DeviceContext, stage: ShaderStage, slots: &SamplerSlots) {
    for range in slots.ranges() {
        ctx.set_samplers(stage, range.start_slot, slots.range_values(*range));
    }
}

fn apply_unordered_access(
    ctx: &mut dyn DeviceContext,
    bound: &mut DeviceContextState,
    slots: &UnorderedAccessViewSlots,
) {
    for range in slots.ranges() {
        ctx.cs_set_unordered_access_views(range.start_slot, slots.range_values(*range));
        for slot in range.start_slot..range.start_slot + range.num_slots {
            bound.set_bound_uav_slot(slot, slots.resource(slot));
        }
    }
}

fn apply_graphics_slots(
    ctx: &mut dyn DeviceContext,
    bound: &mut DeviceContextState,
    state: &GraphicsSlotState,
) {
    for stage in ShaderStage::GRAPHICS {
        let slots = state.stage(stage);
        apply_constant_buffers(ctx, stage, &slots.constant_buffers);
        apply_shader_resources(ctx, bound, stage, &slots.shader_resources);
        apply_samplers(ctx, stage, &slots.samplers);
    }
}

fn apply_compute_slots(
    ctx: &mut dyn DeviceContext,
    bound: &mut DeviceContextState,
    state: &ComputeSlotState,
) {
    let cs = &state.cs;
    apply_constant_buffers(ctx, ShaderStage::Compute, &cs.constant_buffers);
    apply_shader_resources(ctx, bound, ShaderStage::Compute, &cs.shader_resources);
    apply_samplers(ctx, ShaderStage::Compute, &cs.samplers);
    apply_unordered_access(ctx, bound, &cs.unordered_access);
}

fn apply_index_buffer(ctx: &mut dyn DeviceContext, state: &IndexBufferState) {
    ctx.ia_set_index_buffer(state.buffer, state.format, state.offset);
}

fn apply_vertex_buffers(ctx: &mut dyn DeviceContext, state: &VertexBufferState) {
    let (buffers, strides, offsets) = state.bound();
    ctx.ia_set_vertex_buffers(state.start_slot, buffers, strides, offsets);
}

fn apply_scissors(ctx: &mut dyn DeviceContext, state: &ScissorState) {
    ctx.rs_set_scissor_rects(&state.rects);
}

fn apply_viewports(ctx: &mut dyn DeviceContext, state: &ViewportState) {
    ctx.rs_set_viewports(&state.viewports);
}

fn apply_render_targets(ctx: &mut dyn DeviceContext, state: &RtvDsvState) {
    ctx.om_set_render_targets(&state.rtvs, state.dsv);
}

fn apply_compute_pipeline(ctx: &mut dyn DeviceContext, state: &PipelineState) {
    ctx.set_shader(ShaderStage::Compute, state.cs);
}

fn apply_graphics_pipeline(ctx: &mut dyn DeviceContext, state: &PipelineState) {
    // The vertex shader is always set; optional stages keep whatever is bound when absent.
    ctx.set_shader(ShaderStage::Vertex, state.vs);
    for stage in [
        ShaderStage::Hull,
        ShaderStage::Domain,
        ShaderStage::Geometry,
        ShaderStage::Pixel,
    ] {
        if let Some(shader) = state.shader(stage) {
            ctx.set_shader(stage, Some(shader));
        }
    }

    ctx.ia_set_input_layout(state.input_layout);
    ctx.ia_set_primitive_topology(state.primitive_topology);
    ctx.rs_set_state(state.rasterizer_state);
    ctx.om_set_blend_state(state.blend_state, state.blend_factors, state.sample_mask);
    // TODO: take the stencil reference from the pipeline's depth-stencil description once it
    // carries one.
    ctx.om_set_depth_stencil_state(state.depth_stencil_state, DEFAULT_STENCIL_REF);
}

// -------------------------------------------------------------------------------------------------
// Copies
// -------------------------------------------------------------------------------------------------

fn copy_buffer_to_buffer(ctx: &mut dyn DeviceContext, copy: &BufferToBufferCopy) {
    ctx.copy_subresource_region(&CopyRegion {
        dst: copy.dst.into(),
        dst_subresource: 0,
        dst_offset: Offset3 {
            x: copy.dst_offset,
            y: 0,
            z: 0,
        },
        src: copy.src.into(),
        src_subresource: 0,
        src_box: Some(copy.src_box()),
    });
}

fn copy_buffer_to_image(ctx: &mut dyn DeviceContext, copy: &BufferToImageCopy) -> Result<(), DeviceError> {
    let mapped = ctx.map_read(copy.src.into(), 0, copy.map_type)?;
    let offset = copy.footprint.footprint_offset as usize;
    let data = mapped
        .data
        .get(offset..)
        .ok_or(DeviceError::MappedRangeTooSmall {
            needed: offset,
            available: mapped.data.len(),
        })?;

    for layer in 0..copy.region.array_layer_count {
        ctx.update_subresource(&SubresourceUpdate {
            dst: copy.dst.id.into(),
            dst_subresource: copy.dst_subresource(layer),
            dst_box: copy.dst_box(),
            data,
            row_pitch: copy.row_pitch(),
            depth_pitch: copy.depth_pitch(),
            flags: copy.copy_flags(),
        });
    }
    Ok(())
}

/// Image-to-buffer copies go through the CPU: the region is copied into a staging texture, read
/// back, tightly packed into a staging buffer and finally copied into the destination.
fn copy_image_to_buffer(ctx: &mut dyn DeviceContext, copy: &ImageToBufferCopy) -> Result<(), DeviceError> {
    let staging_texture = ctx.create_staging_texture(&copy.staging_texture_desc())?;
    let staging_buffer = match ctx.create_staging_buffer(&copy.staging_buffer_desc()) {
        Ok(buffer) => buffer,
        Err(err) => {
            ctx.release(staging_texture.into());
            return Err(err);
        }
    };

    let result = stage_and_copy(ctx, copy, staging_texture, staging_buffer);

    ctx.release(staging_texture.into());
    ctx.release(staging_buffer.into());
    result
}

fn stage_and_copy(
    ctx: &mut dyn DeviceContext,
    copy: &ImageToBufferCopy,
    staging_texture: TextureId,
    staging_buffer: BufferId,
) -> Result<(), DeviceError> {
    ctx.copy_subresource_region(&CopyRegion {
        dst: staging_texture.into(),
        dst_subresource: 0,
        dst_offset: Offset3::default(),
        src: copy.src.id.into(),
        src_subresource: copy.src_subresource(),
        // Depth-stencil textures can only be copied whole.
        src_box: (!copy.is_depth_stencil_copy())
            .then(|| source_box(copy.src.desc.dimension, copy.src_location.offset, copy.extent)),
    });

    let mapped = ctx.map_read(staging_texture.into(), 0, MapType::Read)?;
    let mut packed = vec![0u8; copy.dst.desc.size as usize];
    pack_texel_rows(&mapped, copy.bytes_per_row(), copy.extent, &mut packed)?;
    ctx.map_write(staging_buffer.into(), 0, MapType::Write, &packed)?;

    ctx.copy_resource(copy.dst.id.into(), staging_buffer.into());
    Ok(())
}

fn copy_image_to_image(ctx: &mut dyn DeviceContext, copy: &ImageToImageCopy) {
    let src = &copy.src_location;
    let dst = &copy.dst_location;
    for layer in 0..src.array_layer_count {
        let src_subresource =
            subresource_index(src.mip_level, src.array_layer + layer, copy.src.desc.mip_levels);
        let dst_subresource =
            subresource_index(dst.mip_level, dst.array_layer + layer, copy.dst.desc.mip_levels);

        let region = if copy.is_depth_stencil_copy() {
            CopyRegion {
                dst: copy.dst.id.into(),
                dst_subresource,
                dst_offset: Offset3::default(),
                src: copy.src.id.into(),
                src_subresource,
                src_box: None,
            }
        } else {
            CopyRegion {
                dst: copy.dst.id.into(),
                dst_subresource,
                dst_offset: dst.offset,
                src: copy.src.id.into(),
                src_subresource,
                src_box: Some(source_box(copy.src.desc.dimension, src.offset, copy.extent)),
            }
        };
        ctx.copy_subresource_region(&region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShaderId;

    #[test]
    fn index_changed_tracks_and_elides() {
        let mut applied = INVALID_STATE_INDEX;
        let mut metrics = ExecuteMetrics::default();
        assert!(index_changed(&mut applied, 0, true, &mut metrics, "test"));
        assert!(!index_changed(&mut applied, 0, true, &mut metrics, "test"));
        assert!(index_changed(&mut applied, 1, true, &mut metrics, "test"));
        assert_eq!(metrics.state_applications, 2);
        assert_eq!(metrics.state_elisions, 1);
    }

    #[test]
    fn index_changed_without_elision_always_applies() {
        let mut applied = 3;
        let mut metrics = ExecuteMetrics::default();
        assert!(index_changed(&mut applied, 3, false, &mut metrics, "test"));
        assert_eq!(metrics.state_elisions, 0);
    }

    #[test]
    fn pipeline_changed_elides_matching_snapshots() {
        let mut stack: StateStack<PipelineState> = StateStack::new();
        stack.current_mut().vs = Some(ShaderId(1));
        let graphics = stack.commit();
        stack.current_mut().cs = Some(ShaderId(2));
        let compute = stack.commit();

        let mut applied = graphics;
        let mut metrics = ExecuteMetrics::default();
        let matches = PipelineState::graphics_matches;
        assert!(!pipeline_changed(&mut applied, compute, &stack, matches, true, &mut metrics, "test"));
        assert_eq!(applied, compute);
        assert_eq!(metrics.state_elisions, 1);

        let mut applied = graphics;
        let matches = PipelineState::compute_matches;
        assert!(pipeline_changed(&mut applied, compute, &stack, matches, true, &mut metrics, "test"));
        assert!(pipeline_changed(&mut applied, compute, &stack, matches, false, &mut metrics, "test"));
    }

    #[test]
    fn metrics_accumulate() {
        let mut total = ExecuteMetrics::default();
        let one = ExecuteMetrics {
            actions: 2,
            state_applications: 3,
            state_elisions: 1,
            nullified_slots: 4,
            skipped_copies: 0,
        };
        total.accumulate(&one);
        total.accumulate(&one);
        assert_eq!(total.actions, 4);
        assert_eq!(total.nullified_slots, 8);
    }

    #[test]
    fn truthy_env_values() {
        let name = "GRFX_DX11_TEST_TRUTHY_ENV";
        std::env::set_var(name, " Yes ");
        assert!(env_var_truthy(name));
        std::env::set_var(name, "0");
        assert!(!env_var_truthy(name));
        std::env::remove_var(name);
        assert!(!env_var_truthy(name));
    }
}
