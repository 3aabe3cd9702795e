//! Shared helpers for `grfx-dx11` integration tests.

#![allow(dead_code)]

use grfx_dx11::types::{
    BufferId, DepthStencilView, DsvId, RenderTargetView, RtvId, ShaderResourceView, SrvId,
    TextureId, UavId, UnorderedAccessView,
};
use grfx_dx11::{
    CommandList, DeviceCall, DeviceContextState, ExecuteConfig, ExecuteMetrics, TraceContext,
};

/// Installs a `tracing` subscriber that writes through the test harness, once per test binary.
pub fn init_tracing() {
    use std::sync::OnceLock;

    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    });
}

pub fn srv(id: u32, texture: u32) -> ShaderResourceView {
    ShaderResourceView {
        id: SrvId(id),
        resource: TextureId(texture).into(),
    }
}

pub fn buffer_srv(id: u32, buffer: u32) -> ShaderResourceView {
    ShaderResourceView {
        id: SrvId(id),
        resource: BufferId(buffer).into(),
    }
}

pub fn uav(id: u32, buffer: u32) -> UnorderedAccessView {
    UnorderedAccessView {
        id: UavId(id),
        resource: BufferId(buffer).into(),
    }
}

pub fn rtv(id: u32, texture: u32) -> RenderTargetView {
    RenderTargetView {
        id: RtvId(id),
        resource: TextureId(texture).into(),
    }
}

pub fn dsv(id: u32, texture: u32) -> DepthStencilView {
    DepthStencilView {
        id: DsvId(id),
        resource: TextureId(texture).into(),
    }
}

/// Replays `list` once onto a fresh trace context with the default configuration.
pub fn replay(list: &CommandList) -> (TraceContext, ExecuteMetrics) {
    let mut ctx = TraceContext::new();
    let mut bound = DeviceContextState::new();
    let metrics = list.execute(&mut ctx, &mut bound, &ExecuteConfig::default());
    (ctx, metrics)
}

pub fn count(calls: &[DeviceCall], pred: impl Fn(&DeviceCall) -> bool) -> usize {
    calls.iter().filter(|c| pred(*c)).count()
}
