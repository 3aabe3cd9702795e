//! Per-stage resource slot bindings.
//!
//! Each slot array holds the latest value written to every slot plus the list of ranges written
//! since the last commit. The executor only re-binds those ranges; the cumulative slot contents
//! are what it passes to the device for each range.

use std::ops::Range;

use crate::limits::{
    MAX_CONSTANT_BUFFER_SLOTS, MAX_SAMPLER_SLOTS, MAX_SHADER_RESOURCE_SLOTS,
    MAX_UNORDERED_ACCESS_SLOTS,
};
use crate::state_stack::StackState;
use crate::types::{BufferId, ResourceId, SamplerId, ShaderResourceView, ShaderStage, UnorderedAccessView};

/// A `[start_slot, start_slot + num_slots)` range written by one update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRange {
    pub start_slot: u32,
    pub num_slots: u32,
}

impl SlotRange {
    pub fn as_range(self) -> Range<usize> {
        let start = self.start_slot as usize;
        start..start + self.num_slots as usize
    }
}

/// Fixed-size slot array for one binding kind of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotArray<T, const N: usize> {
    slots: [Option<T>; N],
    ranges: Vec<SlotRange>,
}

pub type ConstantBufferSlots = SlotArray<BufferId, MAX_CONSTANT_BUFFER_SLOTS>;
pub type ShaderResourceViewSlots = SlotArray<ShaderResourceView, MAX_SHADER_RESOURCE_SLOTS>;
pub type SamplerSlots = SlotArray<SamplerId, MAX_SAMPLER_SLOTS>;
pub type UnorderedAccessViewSlots = SlotArray<UnorderedAccessView, MAX_UNORDERED_ACCESS_SLOTS>;

impl<T: Copy, const N: usize> Default for SlotArray<T, N> {
    fn default() -> Self {
        Self {
            slots: [None; N],
            ranges: Vec::new(),
        }
    }
}

impl<T: Copy, const N: usize> SlotArray<T, N> {
    pub const CAPACITY: usize = N;

    /// Writes `values` into `[start_slot, start_slot + values.len())` and records the range.
    ///
    /// `None` entries unbind their slot.
    ///
    /// # Panics
    ///
    /// Panics if the range extends past the `N` slots of this binding kind.
    pub fn update(&mut self, start_slot: u32, values: &[Option<T>]) {
        let start = start_slot as usize;
        let end = start.checked_add(values.len());
        assert!(
            end.is_some_and(|end| end <= N),
            "slot range {start}+{} exceeds {N} available slots",
            values.len()
        );
        let num_slots = values.len() as u32;
        self.slots[start..start + values.len()].copy_from_slice(values);
        self.ranges.push(SlotRange {
            start_slot,
            num_slots,
        });
    }

    pub fn get(&self, slot: u32) -> Option<T> {
        self.slots.get(slot as usize).copied().flatten()
    }

    pub fn slots(&self) -> &[Option<T>; N] {
        &self.slots
    }

    /// Slot contents covered by `range`.
    pub fn range_values(&self, range: SlotRange) -> &[Option<T>] {
        &self.slots[range.as_range()]
    }

    /// Ranges written since the last commit.
    pub fn ranges(&self) -> &[SlotRange] {
        &self.ranges
    }

    pub fn clear_ranges(&mut self) {
        self.ranges.clear();
    }
}

impl ShaderResourceViewSlots {
    /// Resource the view in `slot` reads from.
    pub fn resource(&self, slot: u32) -> Option<ResourceId> {
        self.get(slot).map(|view| view.resource)
    }
}

impl UnorderedAccessViewSlots {
    pub fn resource(&self, slot: u32) -> Option<ResourceId> {
        self.get(slot).map(|view| view.resource)
    }
}

/// Bindings of one graphics stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphicsShaderSlots {
    pub constant_buffers: ConstantBufferSlots,
    pub shader_resources: ShaderResourceViewSlots,
    pub samplers: SamplerSlots,
}

impl GraphicsShaderSlots {
    fn clear_ranges(&mut self) {
        self.constant_buffers.clear_ranges();
        self.shader_resources.clear_ranges();
        self.samplers.clear_ranges();
    }
}

/// Compute bindings: the graphics set plus unordered-access views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputeShaderSlots {
    pub constant_buffers: ConstantBufferSlots,
    pub shader_resources: ShaderResourceViewSlots,
    pub samplers: SamplerSlots,
    pub unordered_access: UnorderedAccessViewSlots,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphicsSlotState {
    pub vs: GraphicsShaderSlots,
    pub hs: GraphicsShaderSlots,
    pub ds: GraphicsShaderSlots,
    pub gs: GraphicsShaderSlots,
    pub ps: GraphicsShaderSlots,
}

impl GraphicsSlotState {
    /// # Panics
    ///
    /// Panics for [`ShaderStage::Compute`], which lives in [`ComputeSlotState`].
    pub fn stage(&self, stage: ShaderStage) -> &GraphicsShaderSlots {
        match stage {
            ShaderStage::Vertex => &self.vs,
            ShaderStage::Hull => &self.hs,
            ShaderStage::Domain => &self.ds,
            ShaderStage::Geometry => &self.gs,
            ShaderStage::Pixel => &self.ps,
            ShaderStage::Compute => panic!("compute bindings are not part of the graphics slot state"),
        }
    }

    /// # Panics
    ///
    /// Panics for [`ShaderStage::Compute`].
    pub fn stage_mut(&mut self, stage: ShaderStage) -> &mut GraphicsShaderSlots {
        match stage {
            ShaderStage::Vertex => &mut self.vs,
            ShaderStage::Hull => &mut self.hs,
            ShaderStage::Domain => &mut self.ds,
            ShaderStage::Geometry => &mut self.gs,
            ShaderStage::Pixel => &mut self.ps,
            ShaderStage::Compute => panic!("compute bindings are not part of the graphics slot state"),
        }
    }
}

impl StackState for GraphicsSlotState {
    fn new_commit_init(&mut self) {
        for stage in [
            &mut self.vs,
            &mut self.hs,
            &mut self.ds,
            &mut self.gs,
            &mut self.ps,
        ] {
            stage.clear_ranges();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputeSlotState {
    pub cs: ComputeShaderSlots,
}

impl StackState for ComputeSlotState {
    fn new_commit_init(&mut self) {
        self.cs.constant_buffers.clear_ranges();
        self.cs.shader_resources.clear_ranges();
        self.cs.samplers.clear_ranges();
        self.cs.unordered_access.clear_ranges();
    }
}
