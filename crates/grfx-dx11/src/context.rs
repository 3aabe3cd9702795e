//! The immediate-context surface that command lists replay into.

use thiserror::Error;

use crate::types::{
    BlendStateId, Box3, BufferDesc, BufferId, ClearFlags, CopyFlags, DepthStencilStateId,
    DepthStencilView, IndexFormat, InputLayoutId, MapType, Offset3, PrimitiveTopology, QueryId,
    QueryKind, RasterizerStateId, Rect, RenderTargetView, ResourceId, SamplerId, ShaderId,
    ShaderResourceView, ShaderStage, TextureDesc, TextureId, UnorderedAccessView, Viewport,
};

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to map subresource {subresource} of {resource}")]
    MapFailed {
        resource: ResourceId,
        subresource: u32,
    },
    #[error("failed to create staging {0}")]
    StagingCreationFailed(&'static str),
    #[error("failed to create {0:?} query")]
    QueryCreationFailed(QueryKind),
    #[error("mapped data too small: need {needed} bytes, have {available}")]
    MappedRangeTooSmall { needed: usize, available: usize },
}

/// Contents of a subresource read back through `Map`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MappedSubresource {
    pub data: Vec<u8>,
    pub row_pitch: u32,
    pub depth_pitch: u32,
}

/// Arguments of `CopySubresourceRegion`. `src_box: None` copies the whole subresource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyRegion {
    pub dst: ResourceId,
    pub dst_subresource: u32,
    pub dst_offset: Offset3,
    pub src: ResourceId,
    pub src_subresource: u32,
    pub src_box: Option<Box3>,
}

/// Arguments of `UpdateSubresource1`.
#[derive(Debug, Clone, Copy)]
pub struct SubresourceUpdate<'a> {
    pub dst: ResourceId,
    pub dst_subresource: u32,
    pub dst_box: Box3,
    pub data: &'a [u8],
    pub row_pitch: u32,
    pub depth_pitch: u32,
    pub flags: CopyFlags,
}

/// `D3D11_QUERY_DATA_TIMESTAMP_DISJOINT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampDisjoint {
    pub frequency: u64,
    pub disjoint: bool,
}

/// A D3D11 immediate device context.
///
/// State setters and draw calls cannot fail. Only the entry points that allocate or map memory
/// report errors. Staging and query creation live here because replay has no other handle to the
/// owning device.
pub trait DeviceContext {
    fn set_constant_buffers(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        buffers: &[Option<BufferId>],
    );
    fn set_shader_resources(
        &mut self,
        stage: ShaderStage,
        start_slot: u32,
        views: &[Option<ShaderResourceView>],
    );
    fn set_samplers(&mut self, stage: ShaderStage, start_slot: u32, samplers: &[Option<SamplerId>]);
    fn cs_set_unordered_access_views(&mut self, start_slot: u32, views: &[Option<UnorderedAccessView>]);
    fn set_shader(&mut self, stage: ShaderStage, shader: Option<ShaderId>);

    fn ia_set_index_buffer(&mut self, buffer: Option<BufferId>, format: IndexFormat, offset: u32);
    fn ia_set_vertex_buffers(
        &mut self,
        start_slot: u32,
        buffers: &[Option<BufferId>],
        strides: &[u32],
        offsets: &[u32],
    );
    fn ia_set_input_layout(&mut self, layout: Option<InputLayoutId>);
    fn ia_set_primitive_topology(&mut self, topology: PrimitiveTopology);

    fn rs_set_scissor_rects(&mut self, rects: &[Rect]);
    fn rs_set_viewports(&mut self, viewports: &[Viewport]);
    fn rs_set_state(&mut self, state: Option<RasterizerStateId>);

    fn om_set_render_targets(&mut self, rtvs: &[RenderTargetView], dsv: Option<DepthStencilView>);
    fn om_set_blend_state(
        &mut self,
        state: Option<BlendStateId>,
        blend_factors: [f32; 4],
        sample_mask: u32,
    );
    fn om_set_depth_stencil_state(&mut self, state: Option<DepthStencilStateId>, stencil_ref: u32);

    fn clear_render_target_view(&mut self, rtv: RenderTargetView, color: [f32; 4]);
    fn clear_depth_stencil_view(
        &mut self,
        dsv: DepthStencilView,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    );

    fn dispatch(&mut self, x: u32, y: u32, z: u32);
    fn draw_instanced(
        &mut self,
        vertex_count_per_instance: u32,
        instance_count: u32,
        start_vertex_location: u32,
        start_instance_location: u32,
    );
    fn draw_indexed_instanced(
        &mut self,
        index_count_per_instance: u32,
        instance_count: u32,
        start_index_location: u32,
        base_vertex_location: i32,
        start_instance_location: u32,
    );

    fn copy_subresource_region(&mut self, region: &CopyRegion);
    fn copy_resource(&mut self, dst: ResourceId, src: ResourceId);
    fn update_subresource(&mut self, update: &SubresourceUpdate<'_>);

    /// `Map` + read + `Unmap`.
    fn map_read(
        &mut self,
        resource: ResourceId,
        subresource: u32,
        map_type: MapType,
    ) -> Result<MappedSubresource, DeviceError>;
    /// `Map` + write `data` at offset 0 + `Unmap`.
    fn map_write(
        &mut self,
        resource: ResourceId,
        subresource: u32,
        map_type: MapType,
        data: &[u8],
    ) -> Result<(), DeviceError>;

    fn create_staging_texture(&mut self, desc: &TextureDesc) -> Result<TextureId, DeviceError>;
    fn create_staging_buffer(&mut self, desc: &BufferDesc) -> Result<BufferId, DeviceError>;
    fn release(&mut self, resource: ResourceId);

    fn create_query(&mut self, kind: QueryKind) -> Result<QueryId, DeviceError>;
    fn begin_query(&mut self, query: QueryId);
    fn end_query(&mut self, query: QueryId);
    /// `GetData` on a timestamp-disjoint query. `None` while the result is not available yet.
    fn timestamp_disjoint(&mut self, query: QueryId) -> Option<TimestampDisjoint>;
}
