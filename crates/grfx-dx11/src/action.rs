//! Recorded operations.
//!
//! An action stores the committed state-stack indices it depends on plus its own scalar
//! arguments. Actions are immutable once appended.

use std::fmt;

use crate::context::DeviceContext;
use crate::copy::{BufferToBufferCopy, BufferToImageCopy, ImageToBufferCopy, ImageToImageCopy};
use crate::types::{ClearFlags, DepthStencilView, QueryId, RenderTargetView, ResourceId};

/// Which kind of shader binding a `Nullify` clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullifyType {
    Srv,
    Uav,
}

/// Callback replayed with direct access to the device context.
pub type RenderCallback = Box<dyn Fn(&mut dyn DeviceContext) + Send>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearDsvArgs {
    pub rtv_dsv_state_index: u32,
    pub dsv: DepthStencilView,
    pub flags: ClearFlags,
    pub depth: f32,
    pub stencil: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearRtvArgs {
    pub rtv_dsv_state_index: u32,
    pub rtv: RenderTargetView,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullifyArgs {
    pub resource: ResourceId,
    pub kind: NullifyType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchArgs {
    pub compute_slot_state_index: u32,
    pub pipeline_state_index: u32,
    pub thread_group_count_x: u32,
    pub thread_group_count_y: u32,
    pub thread_group_count_z: u32,
}

/// State indices shared by both draw variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicsStateIndices {
    pub graphics_slot_state_index: u32,
    pub vertex_buffer_state_index: u32,
    pub scissor_state_index: u32,
    pub viewport_state_index: u32,
    pub rtv_dsv_state_index: u32,
    pub pipeline_state_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawArgs {
    pub state: GraphicsStateIndices,
    pub vertex_count_per_instance: u32,
    pub instance_count: u32,
    pub start_vertex_location: u32,
    pub start_instance_location: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawIndexedArgs {
    pub state: GraphicsStateIndices,
    pub index_buffer_state_index: u32,
    pub index_count_per_instance: u32,
    pub instance_count: u32,
    pub start_index_location: u32,
    pub base_vertex_location: i32,
    pub start_instance_location: u32,
}

pub enum Action {
    ClearDsv(ClearDsvArgs),
    ClearRtv(ClearRtvArgs),
    Nullify(NullifyArgs),
    Dispatch(DispatchArgs),
    Draw(DrawArgs),
    DrawIndexed(DrawIndexedArgs),
    CopyBufferToBuffer(BufferToBufferCopy),
    CopyBufferToImage(BufferToImageCopy),
    CopyImageToBuffer(ImageToBufferCopy),
    CopyImageToImage(ImageToImageCopy),
    BeginQuery(QueryId),
    EndQuery(QueryId),
    WriteTimestamp(QueryId),
    ImGuiRender(RenderCallback),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::ClearDsv(_) => "ClearDsv",
            Action::ClearRtv(_) => "ClearRtv",
            Action::Nullify(_) => "Nullify",
            Action::Dispatch(_) => "Dispatch",
            Action::Draw(_) => "Draw",
            Action::DrawIndexed(_) => "DrawIndexed",
            Action::CopyBufferToBuffer(_) => "CopyBufferToBuffer",
            Action::CopyBufferToImage(_) => "CopyBufferToImage",
            Action::CopyImageToBuffer(_) => "CopyImageToBuffer",
            Action::CopyImageToImage(_) => "CopyImageToImage",
            Action::BeginQuery(_) => "BeginQuery",
            Action::EndQuery(_) => "EndQuery",
            Action::WriteTimestamp(_) => "WriteTimestamp",
            Action::ImGuiRender(_) => "ImGuiRender",
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::ClearDsv(args) => f.debug_tuple("ClearDsv").field(args).finish(),
            Action::ClearRtv(args) => f.debug_tuple("ClearRtv").field(args).finish(),
            Action::Nullify(args) => f.debug_tuple("Nullify").field(args).finish(),
            Action::Dispatch(args) => f.debug_tuple("Dispatch").field(args).finish(),
            Action::Draw(args) => f.debug_tuple("Draw").field(args).finish(),
            Action::DrawIndexed(args) => f.debug_tuple("DrawIndexed").field(args).finish(),
            Action::CopyBufferToBuffer(args) => {
                f.debug_tuple("CopyBufferToBuffer").field(args).finish()
            }
            Action::CopyBufferToImage(args) => {
                f.debug_tuple("CopyBufferToImage").field(args).finish()
            }
            Action::CopyImageToBuffer(args) => {
                f.debug_tuple("CopyImageToBuffer").field(args).finish()
            }
            Action::CopyImageToImage(args) => {
                f.debug_tuple("CopyImageToImage").field(args).finish()
            }
            Action::BeginQuery(query) => f.debug_tuple("BeginQuery").field(query).finish(),
            Action::EndQuery(query) => f.debug_tuple("EndQuery").field(query).finish(),
            Action::WriteTimestamp(query) => f.debug_tuple("WriteTimestamp").field(query).finish(),
            Action::ImGuiRender(_) => f.write_str("ImGuiRender(..)"),
        }
    }
}
