mod common;

use pretty_assertions::assert_eq;

use grfx_dx11::context::{CopyRegion, MappedSubresource};
use grfx_dx11::copy::{
    BufferFootprint, BufferToBufferCopy, BufferToImageCopy, ImageLocation, ImageRegion,
    ImageToBufferCopy, ImageToImageCopy,
};
use grfx_dx11::types::{
    Box3, Buffer, BufferDesc, BufferId, CopyFlags, Extent3, Format, MapType, Offset3, ResourceId,
    Texture, TextureDesc, TextureDimension, TextureId,
};
use grfx_dx11::{CommandList, DeviceCall, DeviceContextState, ExecuteConfig, TraceContext};

use common::{count, init_tracing, replay};

fn texture(id: u32, format: Format, mip_levels: u32, array_layers: u32) -> Texture {
    Texture {
        id: TextureId(id),
        desc: TextureDesc {
            dimension: TextureDimension::Texture2D,
            width: 16,
            height: 16,
            depth: 1,
            mip_levels,
            array_layers,
            format,
            cube: false,
        },
    }
}

fn image_to_buffer(dst_size: u64) -> ImageToBufferCopy {
    ImageToBufferCopy {
        src: texture(1, Format::R8G8B8A8Unorm, 1, 1),
        src_location: ImageLocation {
            mip_level: 0,
            array_layer: 0,
            array_layer_count: 1,
            offset: Offset3 { x: 2, y: 3, z: 0 },
        },
        extent: Extent3 { x: 2, y: 2, z: 1 },
        dst: Buffer {
            id: BufferId(50),
            desc: BufferDesc { size: dst_size },
        },
    }
}

#[test]
fn buffer_to_buffer_copies_one_region() {
    let mut list = CommandList::new();
    list.copy_buffer_to_buffer(&BufferToBufferCopy {
        src: BufferId(1),
        dst: BufferId(2),
        src_offset: 8,
        dst_offset: 32,
        size: 24,
    });

    let (ctx, _) = replay(&list);
    assert_eq!(
        ctx.calls(),
        &[DeviceCall::CopySubresourceRegion(CopyRegion {
            dst: BufferId(2).into(),
            dst_subresource: 0,
            dst_offset: Offset3 { x: 32, y: 0, z: 0 },
            src: BufferId(1).into(),
            src_subresource: 0,
            src_box: Some(Box3 {
                left: 8,
                right: 32,
                top: 0,
                bottom: 1,
                front: 0,
                back: 1,
            }),
        })]
    );
}

#[test]
fn buffer_to_image_updates_each_layer() {
    let src: ResourceId = BufferId(3).into();
    let mut ctx = TraceContext::new();
    ctx.set_resource_data(
        src,
        MappedSubresource {
            data: (0..12).collect(),
            row_pitch: 12,
            depth_pitch: 12,
        },
    );

    let mut list = CommandList::new();
    list.copy_buffer_to_image(&BufferToImageCopy {
        src: BufferId(3),
        dst: texture(4, Format::R8G8B8A8Unorm, 3, 6),
        footprint: BufferFootprint {
            image_width: 2,
            image_height: 1,
            image_row_stride: 8,
            footprint_offset: 4,
            footprint_width: 2,
            footprint_height: 1,
            footprint_depth: 1,
        },
        region: ImageRegion {
            mip_level: 1,
            array_layer: 2,
            array_layer_count: 2,
            width: 2,
            height: 1,
            depth: 1,
            ..ImageRegion::default()
        },
        map_type: MapType::Read,
    });
    let mut bound = DeviceContextState::new();
    let metrics = list.execute(&mut ctx, &mut bound, &ExecuteConfig::default());
    assert_eq!(metrics.skipped_copies, 0);

    let updates: Vec<(u32, usize, u32, CopyFlags)> = ctx
        .calls()
        .iter()
        .filter_map(|c| match c {
            DeviceCall::UpdateSubresource {
                dst_subresource,
                data_len,
                row_pitch,
                flags,
                ..
            } => Some((*dst_subresource, *data_len, *row_pitch, *flags)),
            _ => None,
        })
        .collect();
    assert_eq!(
        updates,
        [(7, 8, 8, CopyFlags::DISCARD), (10, 8, 8, CopyFlags::DISCARD)]
    );
}

#[test]
fn image_to_buffer_packs_rows_and_releases_staging() {
    init_tracing();

    let copy = image_to_buffer(16);
    let mut ctx = TraceContext::new();
    let mut mapped = Vec::new();
    for row in 0..2u8 {
        mapped.extend((1..=8).map(|b| b + row * 8));
        mapped.extend([0xAA; 4]);
    }
    ctx.set_resource_data(
        copy.src.id.into(),
        MappedSubresource {
            data: mapped,
            row_pitch: 12,
            depth_pitch: 24,
        },
    );

    let mut list = CommandList::new();
    list.copy_image_to_buffer(&copy);
    let mut bound = DeviceContextState::new();
    let metrics = list.execute(&mut ctx, &mut bound, &ExecuteConfig::default());
    assert_eq!(metrics.skipped_copies, 0);

    let dst = ctx
        .resource_data(copy.dst.id.into())
        .expect("destination buffer written");
    assert_eq!(dst.data, (1..=16).collect::<Vec<u8>>());

    let staging_texture = ctx
        .calls()
        .iter()
        .find_map(|c| match c {
            DeviceCall::CreateStagingTexture { desc, id } => Some((*desc, *id)),
            _ => None,
        })
        .expect("staging texture created");
    assert_eq!((staging_texture.0.width, staging_texture.0.height), (2, 2));
    assert_eq!(count(ctx.calls(), |c| matches!(c, DeviceCall::Release(_))), 2);
    assert!(ctx
        .calls()
        .contains(&DeviceCall::Release(staging_texture.1.into())));
}

#[test]
fn image_to_buffer_reads_staging_subresource_zero() {
    let mut copy = image_to_buffer(16);
    copy.src.desc.mip_levels = 4;
    copy.src_location.mip_level = 2;

    let mut list = CommandList::new();
    list.copy_image_to_buffer(&copy);
    let (ctx, _) = replay(&list);

    let region = ctx
        .calls()
        .iter()
        .find_map(|c| match c {
            DeviceCall::CopySubresourceRegion(region) => Some(*region),
            _ => None,
        })
        .expect("region copied to staging");
    assert_eq!(region.src_subresource, 2);
    assert_eq!(region.dst_subresource, 0);
    assert!(ctx.calls().iter().any(|c| matches!(
        c,
        DeviceCall::Map {
            subresource: 0,
            map_type: MapType::Read,
            ..
        }
    )));
}

#[test]
fn failed_map_skips_copy_and_continues() {
    init_tracing();

    let mut ctx = TraceContext::new();
    ctx.set_map_failure(true);

    let mut list = CommandList::new();
    list.copy_image_to_buffer(&image_to_buffer(16));
    list.draw_instanced(3, 1, 0, 0);

    let mut bound = DeviceContextState::new();
    let metrics = list.execute(&mut ctx, &mut bound, &ExecuteConfig::default());
    assert_eq!(metrics.skipped_copies, 1);
    assert_eq!(count(ctx.calls(), |c| matches!(c, DeviceCall::Release(_))), 2);
    assert_eq!(count(ctx.calls(), DeviceCall::is_draw), 1);
}

#[test]
fn depth_stencil_image_copy_uses_whole_subresources() {
    let mut list = CommandList::new();
    list.copy_image_to_image(&ImageToImageCopy {
        src: texture(1, Format::D32Float, 2, 4),
        src_location: ImageLocation {
            mip_level: 1,
            array_layer: 1,
            array_layer_count: 2,
            offset: Offset3 { x: 4, y: 4, z: 0 },
        },
        dst: texture(2, Format::D32Float, 1, 4),
        dst_location: ImageLocation {
            mip_level: 0,
            array_layer: 0,
            array_layer_count: 2,
            offset: Offset3 { x: 4, y: 4, z: 0 },
        },
        extent: Extent3 { x: 8, y: 8, z: 1 },
    });

    let (ctx, _) = replay(&list);
    let regions: Vec<(u32, u32, Option<Box3>, Offset3)> = ctx
        .calls()
        .iter()
        .filter_map(|c| match c {
            DeviceCall::CopySubresourceRegion(r) => {
                Some((r.src_subresource, r.dst_subresource, r.src_box, r.dst_offset))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        regions,
        [
            (3, 0, None, Offset3::default()),
            (5, 1, None, Offset3::default()),
        ]
    );
}

#[test]
fn color_image_copy_uses_source_box() {
    let mut list = CommandList::new();
    list.copy_image_to_image(&ImageToImageCopy {
        src: texture(1, Format::R8G8B8A8Unorm, 1, 1),
        src_location: ImageLocation {
            array_layer_count: 1,
            offset: Offset3 { x: 1, y: 2, z: 0 },
            ..ImageLocation::default()
        },
        dst: texture(2, Format::R8G8B8A8Unorm, 1, 1),
        dst_location: ImageLocation {
            array_layer_count: 1,
            offset: Offset3 { x: 5, y: 6, z: 0 },
            ..ImageLocation::default()
        },
        extent: Extent3 { x: 3, y: 4, z: 1 },
    });

    let (ctx, _) = replay(&list);
    match &ctx.calls()[0] {
        DeviceCall::CopySubresourceRegion(region) => {
            assert_eq!(region.dst_offset, Offset3 { x: 5, y: 6, z: 0 });
            assert_eq!(
                region.src_box,
                Some(Box3 {
                    left: 1,
                    right: 4,
                    top: 2,
                    bottom: 6,
                    front: 0,
                    back: 1,
                })
            );
        }
        other => panic!("unexpected call {other:?}"),
    }
}
