//! `grfx-dx11` emulates recorded command buffers on top of a D3D11 immediate context.
//!
//! Currently this crate provides:
//! - A [`CommandList`] recorder that snapshots pipeline and binding state into per-kind
//!   [`StateStack`]s and appends index-referencing [`Action`]s.
//! - Replay onto any [`DeviceContext`] with redundant-state elision and SRV/UAV nullification
//!   (see [`CommandList::execute`] and [`DeviceContextState`]).
//! - A descriptor-set/render-pass level [`CommandBuffer`] and a submitting [`Queue`].
//! - [`TraceContext`], a headless context that records every call it receives.

mod bound_state;
mod execute;
mod state_stack;

pub mod action;
pub mod command_buffer;
pub mod command_list;
pub mod context;
pub mod copy;
pub mod limits;
pub mod queue;
pub mod slots;
pub mod state;
pub mod trace;
pub mod types;

pub use action::{Action, NullifyType};
pub use bound_state::DeviceContextState;
pub use command_buffer::CommandBuffer;
pub use command_list::CommandList;
pub use context::{DeviceContext, DeviceError};
pub use execute::{ExecuteConfig, ExecuteMetrics, DISABLE_STATE_ELISION_ENV};
pub use queue::{Queue, QueueConfig, QueueError};
pub use state_stack::{StackState, StateStack};
pub use trace::{DeviceCall, TraceContext};
