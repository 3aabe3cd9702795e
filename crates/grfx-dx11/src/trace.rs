//! A headless [`DeviceContext`] that records every call it receives.
//!
//! `TraceContext` keeps enough state to stand in for a real context: a byte store per resource
//! (so maps and copies move data around), the SRV bindings per stage (so binding a resource for
//! output while it is still readable is reported as a hazard) and timestamp-disjoint query
//! results.

use std::collections::HashMap;

use crate::context::{
    CopyRegion, DeviceContext, DeviceError, MappedSubresource, SubresourceUpdate, TimestampDisjoint,
};
use crate::types::{
    BlendStateId, Box3, BufferDesc, BufferId, ClearFlags, CopyFlags, DepthStencilStateId,
    DepthStencilView, IndexFormat, InputLayoutId, MapType, PrimitiveTopology, QueryId, QueryKind,
    RasterizerStateId, Rect, RenderTargetView, ResourceId, SamplerId, ShaderId,
    ShaderResourceView, ShaderStage, TextureDesc, TextureId, UnorderedAccessView, Viewport,
};

/// One call issued to a [`TraceContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    SetConstantBuffers {
        stage: ShaderStage,
        start_slot: u32,
        buffers: Vec<Option<BufferId>>,
    },
    SetShaderResources {
        stage: ShaderStage,
        start_slot: u32,
        views: Vec<Option<ShaderResourceView>>,
    },
    SetSamplers {
        stage: ShaderStage,
        start_slot: u32,
        samplers: Vec<Option<SamplerId>>,
    },
    SetUnorderedAccessViews {
        start_slot: u32,
        views: Vec<Option<UnorderedAccessView>>,
    },
    SetShader {
        stage: ShaderStage,
        shader: Option<ShaderId>,
    },
    SetIndexBuffer {
        buffer: Option<BufferId>,
        format: IndexFormat,
        offset: u32,
    },
    SetVertexBuffers {
        start_slot: u32,
        buffers: Vec<Option<BufferId>>,
        strides: Vec<u32>,
        offsets: Vec<u32>,
    },
    SetInputLayout(Option<InputLayoutId>),
    SetPrimitiveTopology(PrimitiveTopology),
    SetScissorRects(Vec<Rect>),
    SetViewports(Vec<Viewport>),
    SetRasterizerState(Option<RasterizerStateId>),
    SetRenderTargets {
        rtvs: Vec<RenderTargetView>,
        dsv: Option<DepthStencilView>,
    },
    SetBlendState {
        state: Option<BlendStateId>,
        blend_factors: [f32; 4],
        sample_mask: u32,
    },
    SetDepthStencilState {
        state: Option<DepthStencilStateId>,
        stencil_ref: u32,
    },
    ClearRenderTargetView {
        rtv: RenderTargetView,
        color: [f32; 4],
    },
    ClearDepthStencilView {
        dsv: DepthStencilView,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    },
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },
    DrawInstanced {
        vertex_count_per_instance: u32,
        instance_count: u32,
        start_vertex_location: u32,
        start_instance_location: u32,
    },
    DrawIndexedInstanced {
        index_count_per_instance: u32,
        instance_count: u32,
        start_index_location: u32,
        base_vertex_location: i32,
        start_instance_location: u32,
    },
    CopySubresourceRegion(CopyRegion),
    CopyResource {
        dst: ResourceId,
        src: ResourceId,
    },
    UpdateSubresource {
        dst: ResourceId,
        dst_subresource: u32,
        dst_box: Box3,
        data_len: usize,
        row_pitch: u32,
        depth_pitch: u32,
        flags: CopyFlags,
    },
    Map {
        resource: ResourceId,
        subresource: u32,
        map_type: MapType,
    },
    CreateStagingTexture {
        desc: TextureDesc,
        id: TextureId,
    },
    CreateStagingBuffer {
        desc: BufferDesc,
        id: BufferId,
    },
    Release(ResourceId),
    CreateQuery {
        kind: QueryKind,
        id: QueryId,
    },
    BeginQuery(QueryId),
    EndQuery(QueryId),
    GetTimestampDisjoint(QueryId),
}

impl DeviceCall {
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            DeviceCall::DrawInstanced { .. } | DeviceCall::DrawIndexedInstanced { .. }
        )
    }
}

/// A resource bound for output while an SRV still reads from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingHazard {
    pub resource: ResourceId,
    pub stage: ShaderStage,
    pub slot: u32,
}

/// First ID handed out for staging resources and queries, well clear of test handles.
const FIRST_GENERATED_ID: u32 = 0x1000;

#[derive(Debug, Default)]
pub struct TraceContext {
    calls: Vec<DeviceCall>,
    memory: HashMap<ResourceId, MappedSubresource>,
    srv_bindings: HashMap<(ShaderStage, u32), ResourceId>,
    hazards: Vec<BindingHazard>,
    ended_queries: Vec<QueryId>,
    next_id: u32,
    fail_maps: bool,
    timestamp_frequency: u64,
}

impl TraceContext {
    pub fn new() -> Self {
        Self {
            next_id: FIRST_GENERATED_ID,
            timestamp_frequency: 1_000_000_000,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn count_calls(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(*c)).count()
    }

    pub fn hazards(&self) -> &[BindingHazard] {
        &self.hazards
    }

    /// Seeds the contents returned when `resource` is mapped.
    pub fn set_resource_data(&mut self, resource: ResourceId, data: MappedSubresource) {
        self.memory.insert(resource, data);
    }

    pub fn resource_data(&self, resource: ResourceId) -> Option<&MappedSubresource> {
        self.memory.get(&resource)
    }

    /// Makes every subsequent map fail.
    pub fn set_map_failure(&mut self, fail: bool) {
        self.fail_maps = fail;
    }

    pub fn set_timestamp_frequency(&mut self, frequency: u64) {
        self.timestamp_frequency = frequency;
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check_output_binding(&mut self, resource: ResourceId) {
        let mut found: Vec<BindingHazard> = self
            .srv_bindings
            .iter()
            .filter(|(_, bound)| **bound == resource)
            .map(|(&(stage, slot), _)| BindingHazard {
                resource,
                stage,
                slot,
            })
            .collect();
        found.sort_by_key(|h| (h.stage.index(), h.slot));
        self.hazards.extend(found);
    }
}

impl DeviceContext for TraceContext {
    fn set_constant_buffers(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        buffers: &[Option<BufferId>],
    ) {
        self.calls.push(DeviceCall::SetConstantBuffers {
            stage,
            start_slot,
            buffers: buffers.to_vec(),
        });
    }

    fn set_shader_resources(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        views: &[Option<ShaderResourceView>],
    ) {
        for (slot, view) in (start_slot..).zip(views) {
            match view {
                Some(view) => {
                    self.srv_bindings.insert((stage, slot), view.resource);
                }
                None => {
                    self.srv_bindings.remove(&(stage, slot));
                }
            }
        }
        self.calls.push(DeviceCall::SetShaderResources {
            stage,
            start_slot,
            views: views.to_vec(),
        });
    }

    fn set_samplers(&mut self, stage: ShaderStage, start_slot: u32, samplers: &[Option<SamplerId>]) {
        self.calls.push(DeviceCall::SetSamplers {
            stage,
            start_slot,
            samplers: samplers.to_vec(),
        });
    }

    fn cs_set_unordered_access_views(&mut self, start_slot: u32, views: &[Option<UnorderedAccessView>]) {
        for view in views.iter().flatten() {
            self.check_output_binding(view.resource);
        }
        self.calls.push(DeviceCall::SetUnorderedAccessViews {
            start_slot,
            views: views.to_vec(),
        });
    }

    fn set_shader(&mut self, stage: ShaderStage, shader: Option<ShaderId>) {
        self.calls.push(DeviceCall::SetShader { stage, shader });
    }

    fn ia_set_index_buffer(&mut self, buffer: Option<BufferId>, format: IndexFormat, offset: u32) {
        self.calls.push(DeviceCall::SetIndexBuffer {
            buffer,
            format,
            offset,
        });
    }

    fn ia_set_vertex_buffers(
        &mut self,
        start_slot: u32,
        buffers: &[Option<BufferId>],
        strides: &[u32],
        offsets: &[u32],
    ) {
        self.calls.push(DeviceCall::SetVertexBuffers {
            start_slot,
            buffers: buffers.to_vec(),
            strides: strides.to_vec(),
            offsets: offsets.to_vec(),
        });
    }

    fn ia_set_input_layout(&mut self, layout: Option<InputLayoutId>) {
        self.calls.push(DeviceCall::SetInputLayout(layout));
    }

    fn ia_set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.calls.push(DeviceCall::SetPrimitiveTopology(topology));
    }

    fn rs_set_scissor_rects(&mut self, rects: &[Rect]) {
        self.calls.push(DeviceCall::SetScissorRects(rects.to_vec()));
    }

    fn rs_set_viewports(&mut self, viewports: &[Viewport]) {
        self.calls.push(DeviceCall::SetViewports(viewports.to_vec()));
    }

    fn rs_set_state(&mut self, state: Option<RasterizerStateId>) {
        self.calls.push(DeviceCall::SetRasterizerState(state));
    }

    fn om_set_render_targets(&mut self, rtvs: &[RenderTargetView], dsv: Option<DepthStencilView>) {
        for rtv in rtvs {
            self.check_output_binding(rtv.resource);
        }
        if let Some(dsv) = dsv {
            self.check_output_binding(dsv.resource);
        }
        self.calls.push(DeviceCall::SetRenderTargets {
            rtvs: rtvs.to_vec(),
            dsv,
        });
    }

    fn om_set_blend_state(
        &mut self,
        state: Option<BlendStateId>,
        blend_factors: [f32; 4],
        sample_mask: u32,
    ) {
        self.calls.push(DeviceCall::SetBlendState {
            state,
            blend_factors,
            sample_mask,
        });
    }

    fn om_set_depth_stencil_state(&mut self, state: Option<DepthStencilStateId>, stencil_ref: u32) {
        self.calls
            .push(DeviceCall::SetDepthStencilState { state, stencil_ref });
    }

    fn clear_render_target_view(&mut self, rtv: RenderTargetView, color: [f32; 4]) {
        self.calls
            .push(DeviceCall::ClearRenderTargetView { rtv, color });
    }

    fn clear_depth_stencil_view(
        &mut self,
        dsv: DepthStencilView,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    ) {
        self.calls.push(DeviceCall::ClearDepthStencilView {
            dsv,
            flags,
            depth,
            stencil,
        });
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.calls.push(DeviceCall::Dispatch { x, y, z });
    }

    fn draw_instanced(
        &mut self,
        vertex_count_per_instance: u32,
        instance_count: u32,
        start_vertex_location: u32,
        start_instance_location: u32,
    ) {
        self.calls.push(DeviceCall::DrawInstanced {
            vertex_count_per_instance,
            instance_count,
            start_vertex_location,
            start_instance_location,
        });
    }

    fn draw_indexed_instanced(
        &mut self,
        index_count_per_instance: u32,
        instance_count: u32,
        start_index_location: u32,
        base_vertex_location: i32,
        start_instance_location: u32,
    ) {
        self.calls.push(DeviceCall::DrawIndexedInstanced {
            index_count_per_instance,
            instance_count,
            start_index_location,
            base_vertex_location,
            start_instance_location,
        });
    }

    fn copy_subresource_region(&mut self, region: &CopyRegion) {
        // Whole-resource data only; the box is recorded but not applied.
        if let Some(data) = self.memory.get(&region.src).cloned() {
            self.memory.insert(region.dst, data);
        }
        self.calls.push(DeviceCall::CopySubresourceRegion(*region));
    }

    fn copy_resource(&mut self, dst: ResourceId, src: ResourceId) {
        if let Some(data) = self.memory.get(&src).cloned() {
            self.memory.insert(dst, data);
        }
        self.calls.push(DeviceCall::CopyResource { dst, src });
    }

    fn update_subresource(&mut self, update: &SubresourceUpdate<'_>) {
        self.calls.push(DeviceCall::UpdateSubresource {
            dst: update.dst,
            dst_subresource: update.dst_subresource,
            dst_box: update.dst_box,
            data_len: update.data.len(),
            row_pitch: update.row_pitch,
            depth_pitch: update.depth_pitch,
            flags: update.flags,
        });
    }

    fn map_read(
        &mut self,
        resource: ResourceId,
        subresource: u32,
        map_type: MapType,
    ) -> Result<MappedSubresource, DeviceError> {
        self.calls.push(DeviceCall::Map {
            resource,
            subresource,
            map_type,
        });
        if self.fail_maps {
            return Err(DeviceError::MapFailed {
                resource,
                subresource,
            });
        }
        Ok(self.memory.get(&resource).cloned().unwrap_or_default())
    }

    fn map_write(
        &mut self,
        resource: ResourceId,
        subresource: u32,
        map_type: MapType,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        self.calls.push(DeviceCall::Map {
            resource,
            subresource,
            map_type,
        });
        if self.fail_maps {
            return Err(DeviceError::MapFailed {
                resource,
                subresource,
            });
        }
        let len = data.len() as u32;
        self.memory.insert(
            resource,
            MappedSubresource {
                data: data.to_vec(),
                row_pitch: len,
                depth_pitch: len,
            },
        );
        Ok(())
    }

    fn create_staging_texture(&mut self, desc: &TextureDesc) -> Result<TextureId, DeviceError> {
        let id = TextureId(self.next_id());
        self.calls
            .push(DeviceCall::CreateStagingTexture { desc: *desc, id });
        Ok(id)
    }

    fn create_staging_buffer(&mut self, desc: &BufferDesc) -> Result<BufferId, DeviceError> {
        let id = BufferId(self.next_id());
        self.calls
            .push(DeviceCall::CreateStagingBuffer { desc: *desc, id });
        Ok(id)
    }

    fn release(&mut self, resource: ResourceId) {
        self.memory.remove(&resource);
        self.calls.push(DeviceCall::Release(resource));
    }

    fn create_query(&mut self, kind: QueryKind) -> Result<QueryId, DeviceError> {
        let id = QueryId(self.next_id());
        self.calls.push(DeviceCall::CreateQuery { kind, id });
        Ok(id)
    }

    fn begin_query(&mut self, query: QueryId) {
        self.ended_queries.retain(|q| *q != query);
        self.calls.push(DeviceCall::BeginQuery(query));
    }

    fn end_query(&mut self, query: QueryId) {
        self.ended_queries.push(query);
        self.calls.push(DeviceCall::EndQuery(query));
    }

    fn timestamp_disjoint(&mut self, query: QueryId) -> Option<TimestampDisjoint> {
        self.calls.push(DeviceCall::GetTimestampDisjoint(query));
        self.ended_queries
            .contains(&query)
            .then_some(TimestampDisjoint {
                frequency: self.timestamp_frequency,
                disjoint: false,
            })
    }
}
