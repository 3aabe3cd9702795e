//! Copy records and the helpers that turn them into device calls.

use crate::context::{DeviceError, MappedSubresource};
use crate::types::{
    Box3, Buffer, BufferDesc, BufferId, CopyFlags, Extent3, MapType, Offset3, Texture,
    TextureDesc, TextureDimension,
};

/// `D3D11CalcSubresource`.
pub const fn subresource_index(mip_level: u32, array_layer: u32, mip_levels: u32) -> u32 {
    mip_level + array_layer * mip_levels
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferToBufferCopy {
    pub src: BufferId,
    pub dst: BufferId,
    pub src_offset: u32,
    pub dst_offset: u32,
    pub size: u32,
}

impl BufferToBufferCopy {
    pub fn src_box(&self) -> Box3 {
        Box3 {
            left: self.src_offset,
            right: self.src_offset + self.size,
            top: 0,
            bottom: 1,
            front: 0,
            back: 1,
        }
    }
}

/// Layout of texel data inside a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferFootprint {
    /// Width of the full image in the buffer, in texels.
    pub image_width: u32,
    /// Height of the full image in the buffer, in texels.
    pub image_height: u32,
    /// Bytes between consecutive rows.
    pub image_row_stride: u32,
    pub footprint_offset: u64,
    pub footprint_width: u32,
    pub footprint_height: u32,
    pub footprint_depth: u32,
}

/// Destination texels of a buffer-to-image copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageRegion {
    pub mip_level: u32,
    /// Must be 0 for 3D images.
    pub array_layer: u32,
    /// Must be 1 for 3D images.
    pub array_layer_count: u32,
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferToImageCopy {
    pub src: BufferId,
    pub dst: Texture,
    pub footprint: BufferFootprint,
    pub region: ImageRegion,
    pub map_type: MapType,
}

impl BufferToImageCopy {
    pub fn dst_box(&self) -> Box3 {
        Box3 {
            left: self.region.x,
            top: self.region.y,
            front: self.region.z,
            right: self.region.x + self.footprint.footprint_width,
            bottom: self.region.y + self.footprint.footprint_height,
            back: self.region.z + self.region.depth,
        }
    }

    /// Destination subresource for the `layer`-th layer of the region.
    pub fn dst_subresource(&self, layer: u32) -> u32 {
        subresource_index(
            self.region.mip_level,
            self.region.array_layer + layer,
            self.dst.desc.mip_levels,
        )
    }

    pub fn row_pitch(&self) -> u32 {
        self.footprint.image_row_stride
    }

    pub fn depth_pitch(&self) -> u32 {
        self.footprint.image_row_stride * self.footprint.image_height
    }

    pub fn copy_flags(&self) -> CopyFlags {
        if self.dst.desc.cube {
            CopyFlags::NO_OVERWRITE
        } else {
            CopyFlags::DISCARD
        }
    }
}

/// A subresource and texel offset inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageLocation {
    pub mip_level: u32,
    /// Must be 0 for 3D images.
    pub array_layer: u32,
    /// Must be 1 for 3D images.
    pub array_layer_count: u32,
    pub offset: Offset3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageToBufferCopy {
    pub src: Texture,
    pub src_location: ImageLocation,
    pub extent: Extent3,
    pub dst: Buffer,
}

impl ImageToBufferCopy {
    pub fn is_depth_stencil_copy(&self) -> bool {
        self.src.desc.format.is_depth_stencil()
    }

    pub fn src_subresource(&self) -> u32 {
        subresource_index(
            self.src_location.mip_level,
            self.src_location.array_layer,
            self.src.desc.mip_levels,
        )
    }

    /// CPU-readable texture holding exactly the copied extent.
    pub fn staging_texture_desc(&self) -> TextureDesc {
        let mut desc = TextureDesc {
            width: self.extent.x,
            mip_levels: 1,
            array_layers: 1,
            cube: false,
            ..self.src.desc
        };
        if self.src.desc.dimension != TextureDimension::Texture1D {
            desc.height = self.extent.y;
        }
        if self.src.desc.dimension == TextureDimension::Texture3D {
            desc.depth = self.extent.z;
        }
        desc
    }

    pub fn staging_buffer_desc(&self) -> BufferDesc {
        self.dst.desc
    }

    pub fn bytes_per_row(&self) -> usize {
        self.src.desc.format.bytes_per_texel() as usize * self.extent.x as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageToImageCopy {
    pub src: Texture,
    pub src_location: ImageLocation,
    pub dst: Texture,
    pub dst_location: ImageLocation,
    pub extent: Extent3,
}

impl ImageToImageCopy {
    pub fn is_depth_stencil_copy(&self) -> bool {
        self.src.desc.format.is_depth_stencil()
    }
}

/// Source box for an image region; axes the dimension lacks stay at `0..1`.
pub fn source_box(dimension: TextureDimension, offset: Offset3, extent: Extent3) -> Box3 {
    let mut b = Box3 {
        left: offset.x,
        right: offset.x + extent.x,
        top: 0,
        bottom: 1,
        front: 0,
        back: 1,
    };
    if dimension != TextureDimension::Texture1D {
        b.top = offset.y;
        b.bottom = offset.y + extent.y;
    }
    if dimension == TextureDimension::Texture3D {
        b.front = offset.z;
        b.back = offset.z + extent.z;
    }
    b
}

/// Packs `max(1, extent.z)` slices of `max(1, extent.y)` rows of `bytes_per_row` bytes from a
/// pitched mapping into `out` with no padding.
pub fn pack_texel_rows(
    mapped: &MappedSubresource,
    bytes_per_row: usize,
    extent: Extent3,
    out: &mut [u8],
) -> Result<(), DeviceError> {
    let rows = extent.y.max(1) as usize;
    let slices = extent.z.max(1) as usize;
    let needed = bytes_per_row * rows * slices;
    if out.len() < needed {
        return Err(DeviceError::MappedRangeTooSmall {
            needed,
            available: out.len(),
        });
    }

    let row_pitch = mapped.row_pitch as usize;
    let depth_pitch = mapped.depth_pitch as usize;
    let mut dst = 0;
    for d in 0..slices {
        for y in 0..rows {
            let src = d * depth_pitch + y * row_pitch;
            let row = mapped
                .data
                .get(src..src + bytes_per_row)
                .ok_or(DeviceError::MappedRangeTooSmall {
                    needed: src + bytes_per_row,
                    available: mapped.data.len(),
                })?;
            out[dst..dst + bytes_per_row].copy_from_slice(row);
            dst += bytes_per_row;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Format, TextureId};

    fn texture(dimension: TextureDimension, mip_levels: u32) -> Texture {
        Texture {
            id: TextureId(1),
            desc: TextureDesc {
                dimension,
                width: 64,
                height: 64,
                depth: 4,
                mip_levels,
                array_layers: 6,
                format: Format::R8G8B8A8Unorm,
                cube: false,
            },
        }
    }

    #[test]
    fn subresource_index_is_mip_major() {
        assert_eq!(subresource_index(0, 0, 4), 0);
        assert_eq!(subresource_index(2, 0, 4), 2);
        assert_eq!(subresource_index(1, 3, 4), 13);
    }

    #[test]
    fn buffer_copy_box_spans_size() {
        let copy = BufferToBufferCopy {
            src: BufferId(1),
            dst: BufferId(2),
            src_offset: 16,
            dst_offset: 0,
            size: 48,
        };
        assert_eq!(
            copy.src_box(),
            Box3 {
                left: 16,
                right: 64,
                top: 0,
                bottom: 1,
                front: 0,
                back: 1
            }
        );
    }

    #[test]
    fn buffer_to_image_uses_per_layer_subresource() {
        let mut dst = texture(TextureDimension::Texture2D, 3);
        dst.desc.cube = true;
        let copy = BufferToImageCopy {
            src: BufferId(1),
            dst,
            footprint: BufferFootprint {
                image_width: 16,
                image_height: 8,
                image_row_stride: 64,
                footprint_offset: 0,
                footprint_width: 16,
                footprint_height: 8,
                footprint_depth: 1,
            },
            region: ImageRegion {
                mip_level: 1,
                array_layer: 2,
                array_layer_count: 2,
                depth: 1,
                ..ImageRegion::default()
            },
            map_type: MapType::Read,
        };
        assert_eq!(copy.dst_subresource(0), 7);
        assert_eq!(copy.dst_subresource(1), 10);
        assert_eq!(copy.depth_pitch(), 512);
        assert_eq!(copy.copy_flags(), CopyFlags::NO_OVERWRITE);
        assert_eq!(copy.dst_box().right, 16);
        assert_eq!(copy.dst_box().back, 1);
    }

    #[test]
    fn source_box_respects_dimension() {
        let offset = Offset3 { x: 1, y: 2, z: 3 };
        let extent = Extent3 { x: 4, y: 5, z: 6 };
        let b1 = source_box(TextureDimension::Texture1D, offset, extent);
        assert_eq!((b1.top, b1.bottom, b1.front, b1.back), (0, 1, 0, 1));
        let b2 = source_box(TextureDimension::Texture2D, offset, extent);
        assert_eq!((b2.top, b2.bottom, b2.front, b2.back), (2, 7, 0, 1));
        let b3 = source_box(TextureDimension::Texture3D, offset, extent);
        assert_eq!((b3.left, b3.right, b3.front, b3.back), (1, 5, 3, 9));
    }

    #[test]
    fn staging_texture_matches_extent() {
        let copy = ImageToBufferCopy {
            src: texture(TextureDimension::Texture2D, 5),
            src_location: ImageLocation::default(),
            extent: Extent3 { x: 8, y: 4, z: 1 },
            dst: Buffer {
                id: BufferId(9),
                desc: BufferDesc { size: 128 },
            },
        };
        let desc = copy.staging_texture_desc();
        assert_eq!((desc.width, desc.height, desc.depth), (8, 4, 4));
        assert_eq!((desc.mip_levels, desc.array_layers), (1, 1));
        assert_eq!(copy.bytes_per_row(), 32);
    }

    #[test]
    fn pack_strips_row_padding() {
        let mapped = MappedSubresource {
            data: vec![1, 2, 0, 0, 3, 4, 0, 0],
            row_pitch: 4,
            depth_pitch: 8,
        };
        let mut out = [0u8; 4];
        pack_texel_rows(&mapped, 2, Extent3 { x: 1, y: 2, z: 0 }, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn pack_reports_short_mapping() {
        let mapped = MappedSubresource {
            data: vec![0; 4],
            row_pitch: 4,
            depth_pitch: 4,
        };
        let mut out = [0u8; 8];
        let err = pack_texel_rows(&mapped, 4, Extent3 { x: 1, y: 2, z: 1 }, &mut out).unwrap_err();
        assert!(matches!(err, DeviceError::MappedRangeTooSmall { .. }));
    }
}
