#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
#[cfg(not(target_arch = "wasm32"))]
use grfx_dx11::state::PipelineState;
#[cfg(not(target_arch = "wasm32"))]
use grfx_dx11::types::{
    BufferId, IndexFormat, PrimitiveTopology, RenderTargetView, ResourceId, RtvId, ShaderId,
    ShaderResourceView, ShaderStage, SrvId, TextureId, Viewport,
};
#[cfg(not(target_arch = "wasm32"))]
use grfx_dx11::{CommandList, DeviceContextState, ExecuteConfig, TraceContext};

#[cfg(not(target_arch = "wasm32"))]
const DRAW_COUNTS: [u32; 3] = [64, 512, 4096];

/// Records `draws` indexed draws that change one material texture every eighth draw.
#[cfg(not(target_arch = "wasm32"))]
fn record_scene(list: &mut CommandList, draws: u32) {
    let target: ResourceId = TextureId(1).into();
    list.om_set_render_targets(
        &[RenderTargetView {
            id: RtvId(1),
            resource: target,
        }],
        None,
    );
    list.rs_set_viewports(&[Viewport {
        width: 1920.0,
        height: 1080.0,
        max_depth: 1.0,
        ..Viewport::default()
    }]);
    list.set_pipeline_state(&PipelineState {
        vs: Some(ShaderId(1)),
        ps: Some(ShaderId(2)),
        primitive_topology: PrimitiveTopology::TriangleList,
        ..PipelineState::default()
    });
    list.ia_set_index_buffer(Some(BufferId(1)), IndexFormat::R16Uint, 0);
    list.ia_set_vertex_buffers(0, &[Some(BufferId(2))], &[32], &[0]);

    for i in 0..draws {
        if i % 8 == 0 {
            let material = 100 + i / 8;
            list.set_shader_resources(
                ShaderStage::Pixel,
                0,
                &[Some(ShaderResourceView {
                    id: SrvId(material),
                    resource: TextureId(material).into(),
                })],
            );
        }
        list.draw_indexed_instanced(36, 1, i * 36, 0, 0);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_list_record");
    for draws in DRAW_COUNTS {
        group.bench_with_input(BenchmarkId::from_parameter(draws), &draws, |b, &draws| {
            let mut list = CommandList::new();
            b.iter(|| {
                list.reset();
                record_scene(&mut list, draws);
                black_box(list.actions().len());
            });
        });
    }
    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_list_execute");
    for draws in DRAW_COUNTS {
        let mut list = CommandList::new();
        record_scene(&mut list, draws);
        for (name, elide) in [("elide", true), ("no_elide", false)] {
            let config = ExecuteConfig {
                elide_redundant_state: elide,
            };
            group.bench_with_input(BenchmarkId::new(name, draws), &list, |b, list| {
                b.iter_batched(
                    || (TraceContext::new(), DeviceContextState::new()),
                    |(mut ctx, mut bound)| {
                        let metrics = list.execute(&mut ctx, &mut bound, &config);
                        black_box(metrics);
                        ctx
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(2))
}

#[cfg(not(target_arch = "wasm32"))]
criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_record, bench_execute
}
#[cfg(not(target_arch = "wasm32"))]
criterion_main!(benches);
