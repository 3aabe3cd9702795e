//! Render-pass and descriptor-set level recording on top of [`CommandList`].
//!
//! `CommandBuffer` accepts the explicit-API vocabulary used by Vulkan and D3D12 backends (render
//! passes, resource-state transitions, descriptor sets, pipeline objects) and lowers each call to
//! the D3D11-shaped commands a [`CommandList`] records.

use tracing::warn;

use crate::action::NullifyType;
use crate::command_list::CommandList;
use crate::context::DeviceContext;
use crate::copy::{
    BufferFootprint, BufferToBufferCopy, BufferToImageCopy, ImageLocation, ImageRegion,
    ImageToBufferCopy, ImageToImageCopy,
};
use crate::limits::{MAX_BOUND_DESCRIPTOR_SETS, MAX_SCISSORS, MAX_VERTEX_BINDINGS, MAX_VIEWPORTS};
use crate::state::PipelineState;
use crate::types::{
    BlendStateId, Buffer, BufferId, ClearFlags, DepthStencilStateId, DepthStencilView, Extent3,
    IndexFormat, InputLayoutId, MapType, PrimitiveTopology, QueryId, RasterizerStateId, Rect,
    RenderTargetView, ResourceId, SamplerId, ShaderId, ShaderResourceView, ShaderStage,
    ShaderStageFlags, Texture, UnorderedAccessView, Viewport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachmentLoadOp {
    #[default]
    Load,
    Clear,
    DontCare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetAttachment {
    pub view: RenderTargetView,
    pub load_op: AttachmentLoadOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilAttachment {
    pub view: DepthStencilView,
    pub depth_load_op: AttachmentLoadOp,
    pub stencil_load_op: AttachmentLoadOp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderPass {
    pub render_targets: Vec<RenderTargetAttachment>,
    pub depth_stencil: Option<DepthStencilAttachment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepthStencilClearValue {
    pub depth: f32,
    pub stencil: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderPassBeginInfo<'a> {
    pub render_pass: &'a RenderPass,
    /// Clear colors for the first `rtv_clear_values.len()` render targets.
    pub rtv_clear_values: &'a [[f32; 4]],
    pub dsv_clear_value: DepthStencilClearValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    Undefined,
    General,
    ConstantBuffer,
    VertexBuffer,
    IndexBuffer,
    RenderTarget,
    UnorderedAccess,
    DepthStencilRead,
    DepthStencilWrite,
    NonPixelShaderResource,
    PixelShaderResource,
    ShaderResource,
    CopySrc,
    CopyDst,
    Present,
}

impl ResourceState {
    /// Slot kind that may still reference a resource leaving this state.
    fn nullify_type(self) -> Option<NullifyType> {
        match self {
            ResourceState::ShaderResource
            | ResourceState::PixelShaderResource
            | ResourceState::NonPixelShaderResource => Some(NullifyType::Srv),
            ResourceState::General | ResourceState::UnorderedAccess => Some(NullifyType::Uav),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportDesc {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl From<ViewportDesc> for Viewport {
    fn from(v: ViewportDesc) -> Self {
        Viewport {
            top_left_x: v.x,
            top_left_y: v.y,
            width: v.width,
            height: v.height,
            min_depth: v.min_depth,
            max_depth: v.max_depth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Far edges saturate at `i32::MAX`.
impl From<Rect2D> for Rect {
    fn from(r: Rect2D) -> Self {
        let far = |origin: i32, extent: u32| origin.saturating_add_unsigned(extent);
        Rect {
            left: r.x,
            top: r.y,
            right: far(r.x, r.width),
            bottom: far(r.y, r.height),
        }
    }
}

/// Typed contents of one descriptor binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptors {
    ConstantBuffers(Vec<Option<BufferId>>),
    ShaderResources(Vec<Option<ShaderResourceView>>),
    Samplers(Vec<Option<SamplerId>>),
    UnorderedAccess(Vec<Option<UnorderedAccessView>>),
}

/// Consecutive slots starting at `binding`, visible to the stages in `visibility`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorArray {
    pub binding: u32,
    pub visibility: ShaderStageFlags,
    pub descriptors: Descriptors,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorSet {
    pub arrays: Vec<DescriptorArray>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicsPipelineDesc {
    pub vs: Option<ShaderId>,
    pub hs: Option<ShaderId>,
    pub ds: Option<ShaderId>,
    pub gs: Option<ShaderId>,
    pub ps: Option<ShaderId>,
    pub input_layout: Option<InputLayoutId>,
    pub primitive_topology: PrimitiveTopology,
    pub rasterizer_state: Option<RasterizerStateId>,
    pub depth_stencil_state: Option<DepthStencilStateId>,
    pub blend_state: Option<BlendStateId>,
    pub blend_factors: [f32; 4],
    pub sample_mask: u32,
}

impl Default for GraphicsPipelineDesc {
    fn default() -> Self {
        let defaults = PipelineState::default();
        Self {
            vs: None,
            hs: None,
            ds: None,
            gs: None,
            ps: None,
            input_layout: None,
            primitive_topology: defaults.primitive_topology,
            rasterizer_state: None,
            depth_stencil_state: None,
            blend_state: None,
            blend_factors: defaults.blend_factors,
            sample_mask: defaults.sample_mask,
        }
    }
}

impl From<&GraphicsPipelineDesc> for PipelineState {
    fn from(desc: &GraphicsPipelineDesc) -> Self {
        PipelineState {
            vs: desc.vs,
            hs: desc.hs,
            ds: desc.ds,
            gs: desc.gs,
            ps: desc.ps,
            cs: None,
            input_layout: desc.input_layout,
            primitive_topology: desc.primitive_topology,
            rasterizer_state: desc.rasterizer_state,
            depth_stencil_state: desc.depth_stencil_state,
            blend_state: desc.blend_state,
            blend_factors: desc.blend_factors,
            sample_mask: desc.sample_mask,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComputePipelineDesc {
    pub cs: Option<ShaderId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBufferView {
    pub buffer: BufferId,
    pub format: IndexFormat,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferView {
    pub buffer: BufferId,
    pub stride: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferToBufferCopyInfo {
    pub size: u64,
    pub src_offset: u64,
    pub dst_offset: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferToImageCopyInfo {
    pub src_buffer: BufferFootprint,
    pub dst_image: ImageRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageToBufferCopyInfo {
    pub src_image: ImageLocation,
    pub extent: Extent3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageToImageCopyInfo {
    pub src_image: ImageLocation,
    pub dst_image: ImageLocation,
    pub extent: Extent3,
}

/// Layout of the data an image-to-buffer copy writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageToBufferOutputPitch {
    pub row_pitch: u32,
}

/// A fixed set of queries plus the range whose results the next readback collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPool {
    queries: Vec<QueryId>,
    resolve_start: u32,
    resolve_count: u32,
}

impl QueryPool {
    pub fn new(queries: Vec<QueryId>) -> Self {
        Self {
            queries,
            resolve_start: 0,
            resolve_count: 0,
        }
    }

    pub fn query(&self, index: u32) -> QueryId {
        self.queries[index as usize]
    }

    pub fn len(&self) -> u32 {
        self.queries.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Queries selected by the last `resolve_query_data`, in pool order.
    pub fn resolved(&self) -> &[QueryId] {
        let start = self.resolve_start as usize;
        &self.queries[start..start + self.resolve_count as usize]
    }
}

fn narrow(value: u64, what: &str) -> u32 {
    assert!(
        value <= u64::from(u32::MAX),
        "{what} {value} does not fit in 32 bits"
    );
    value as u32
}

#[derive(Debug, Default)]
pub struct CommandBuffer {
    list: CommandList,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command_list(&self) -> &CommandList {
        &self.list
    }

    /// Starts a new recording, discarding everything recorded before.
    pub fn begin(&mut self) {
        self.list.reset();
    }

    pub fn end(&mut self) {}

    pub fn begin_render_pass(&mut self, info: &RenderPassBeginInfo<'_>) {
        let pass = info.render_pass;
        let rtvs: Vec<RenderTargetView> = pass.render_targets.iter().map(|a| a.view).collect();
        let dsv = pass.depth_stencil.map(|a| a.view);
        self.list.om_set_render_targets(&rtvs, dsv);

        for (attachment, color) in pass.render_targets.iter().zip(info.rtv_clear_values) {
            if attachment.load_op == AttachmentLoadOp::Clear {
                self.list.clear_render_target_view(attachment.view, *color);
            }
        }

        if let Some(attachment) = pass.depth_stencil {
            let mut flags = ClearFlags::empty();
            if attachment.depth_load_op == AttachmentLoadOp::Clear {
                flags |= ClearFlags::DEPTH;
            }
            if attachment.stencil_load_op == AttachmentLoadOp::Clear {
                flags |= ClearFlags::STENCIL;
            }
            if !flags.is_empty() {
                self.list.clear_depth_stencil_view(
                    attachment.view,
                    flags,
                    info.dsv_clear_value.depth,
                    info.dsv_clear_value.stencil as u8,
                );
            }
        }
    }

    pub fn end_render_pass(&mut self) {}

    /// Unbinds `resource` from the shader slots its previous state could have left it in.
    pub fn transition_resource(
        &mut self,
        resource: ResourceId,
        before: ResourceState,
        _after: ResourceState,
    ) {
        if let Some(kind) = before.nullify_type() {
            self.list.nullify(resource, kind);
        }
    }

    pub fn buffer_resource_barrier(
        &mut self,
        _buffer: BufferId,
        _before: ResourceState,
        _after: ResourceState,
    ) {
    }

    pub fn set_viewports(&mut self, viewports: &[ViewportDesc]) {
        let viewports: Vec<Viewport> = clamp(viewports, MAX_VIEWPORTS, "viewports")
            .iter()
            .map(|&v| v.into())
            .collect();
        self.list.rs_set_viewports(&viewports);
    }

    pub fn set_scissors(&mut self, scissors: &[Rect2D]) {
        let rects: Vec<Rect> = clamp(scissors, MAX_SCISSORS, "scissors")
            .iter()
            .map(|&r| r.into())
            .collect();
        self.list.rs_set_scissor_rects(&rects);
    }

    pub fn bind_graphics_descriptor_sets(&mut self, sets: &[&DescriptorSet]) {
        for set in clamp(sets, MAX_BOUND_DESCRIPTOR_SETS, "descriptor sets") {
            for array in &set.arrays {
                for stage in ShaderStage::GRAPHICS {
                    if array.visibility.contains(stage.flag()) {
                        self.set_slots(stage, array);
                    }
                }
            }
        }
    }

    pub fn bind_compute_descriptor_sets(&mut self, sets: &[&DescriptorSet]) {
        for set in clamp(sets, MAX_BOUND_DESCRIPTOR_SETS, "descriptor sets") {
            for array in &set.arrays {
                if array.visibility.contains(ShaderStageFlags::COMPUTE) {
                    self.set_slots(ShaderStage::Compute, array);
                }
            }
        }
    }

    fn set_slots(&mut self, stage: ShaderStage, array: &DescriptorArray) {
        let start = array.binding;
        match &array.descriptors {
            Descriptors::ConstantBuffers(buffers) => {
                self.list.set_constant_buffers(stage, start, buffers)
            }
            Descriptors::ShaderResources(views) => self.list.set_shader_resources(stage, start, views),
            Descriptors::Samplers(samplers) => self.list.set_samplers(stage, start, samplers),
            Descriptors::UnorderedAccess(views) => {
                if stage == ShaderStage::Compute {
                    self.list.cs_set_unordered_access_views(start, views);
                } else {
                    warn!(%stage, binding = start, "ignoring UAV descriptors on a graphics stage");
                }
            }
        }
    }

    pub fn bind_graphics_pipeline(&mut self, desc: &GraphicsPipelineDesc) {
        self.list.set_graphics_pipeline_state(&PipelineState::from(desc));
    }

    pub fn bind_compute_pipeline(&mut self, desc: &ComputePipelineDesc) {
        self.list.cs_set_shader(desc.cs);
    }

    pub fn bind_index_buffer(&mut self, view: &IndexBufferView) {
        self.list
            .ia_set_index_buffer(Some(view.buffer), view.format, view.offset);
    }

    pub fn bind_vertex_buffers(&mut self, views: &[VertexBufferView]) {
        let views = clamp(views, MAX_VERTEX_BINDINGS, "vertex buffers");
        let buffers: Vec<Option<BufferId>> = views.iter().map(|v| Some(v.buffer)).collect();
        let strides: Vec<u32> = views.iter().map(|v| v.stride).collect();
        let offsets = vec![0; views.len()];
        self.list.ia_set_vertex_buffers(0, &buffers, &strides, &offsets);
    }

    pub fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        self.list
            .draw_instanced(vertex_count, instance_count, first_vertex, first_instance);
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.list.draw_indexed_instanced(
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        );
    }

    pub fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        self.list.dispatch(group_count_x, group_count_y, group_count_z);
    }

    pub fn copy_buffer_to_buffer(&mut self, info: &BufferToBufferCopyInfo, src: BufferId, dst: BufferId) {
        self.list.copy_buffer_to_buffer(&BufferToBufferCopy {
            src,
            dst,
            src_offset: narrow(info.src_offset, "source offset"),
            dst_offset: narrow(info.dst_offset, "destination offset"),
            size: narrow(info.size, "copy size"),
        });
    }

    pub fn copy_buffer_to_image(&mut self, infos: &[BufferToImageCopyInfo], src: BufferId, dst: &Texture) {
        for info in infos {
            self.list.copy_buffer_to_image(&BufferToImageCopy {
                src,
                dst: *dst,
                footprint: info.src_buffer,
                region: info.dst_image,
                map_type: MapType::Read,
            });
        }
    }

    /// Records a copy whose output rows are tightly packed.
    ///
    /// # Panics
    ///
    /// Panics unless exactly one array layer is copied.
    pub fn copy_image_to_buffer(
        &mut self,
        info: &ImageToBufferCopyInfo,
        src: &Texture,
        dst: &Buffer,
    ) -> ImageToBufferOutputPitch {
        assert_eq!(
            info.src_image.array_layer_count, 1,
            "image-to-buffer copies are limited to a single array layer"
        );

        self.list.copy_image_to_buffer(&ImageToBufferCopy {
            src: *src,
            src_location: info.src_image,
            extent: info.extent,
            dst: *dst,
        });

        ImageToBufferOutputPitch {
            row_pitch: src.desc.format.bytes_per_texel() * info.extent.x,
        }
    }

    /// # Panics
    ///
    /// Panics if only one of the two images is depth-stencil.
    pub fn copy_image_to_image(&mut self, info: &ImageToImageCopyInfo, src: &Texture, dst: &Texture) {
        assert_eq!(
            src.desc.format.is_depth_stencil(),
            dst.desc.format.is_depth_stencil(),
            "both images in an image copy must be depth-stencil if one is"
        );

        self.list.copy_image_to_image(&ImageToImageCopy {
            src: *src,
            src_location: info.src_image,
            dst: *dst,
            dst_location: info.dst_image,
            extent: info.extent,
        });
    }

    pub fn begin_query(&mut self, query: QueryId) {
        self.list.begin_query(query);
    }

    pub fn end_query(&mut self, query: QueryId) {
        self.list.end_query(query);
    }

    pub fn write_timestamp(&mut self, query: QueryId) {
        self.list.write_timestamp(query);
    }

    /// D3D11 reads query results back on the CPU, so nothing is recorded; the range is stored on
    /// `pool` for the readback.
    pub fn resolve_query_data(&mut self, pool: &mut QueryPool, start: u32, count: u32) {
        assert!(
            u64::from(start) + u64::from(count) <= u64::from(pool.len()),
            "invalid query range {start}+{count} for a pool of {}",
            pool.len()
        );
        pool.resolve_start = start;
        pool.resolve_count = count;
    }

    pub fn imgui_render<F>(&mut self, render: F)
    where
        F: Fn(&mut dyn DeviceContext) + Send + 'static,
    {
        self.list.imgui_render(render);
    }
}

fn clamp<'a, T>(items: &'a [T], max: usize, what: &str) -> &'a [T] {
    if items.len() > max {
        warn!(count = items.len(), max, "too many {what}; extra entries dropped");
        &items[..max]
    } else {
        items
    }
}
