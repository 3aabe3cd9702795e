//! Record of which resources are bound to which SRV/UAV slots of one device context.
//!
//! D3D11 has no way to unbind a resource from every slot it occupies, and binding a resource for
//! output while it is still bound as a shader input is a hazard. Replay keeps this table current
//! so that a `Nullify` action can clear exactly the slots that reference a resource.

use std::cell::Cell;
use std::marker::PhantomData;

use crate::limits::{MAX_SHADER_RESOURCE_SLOTS, MAX_UNORDERED_ACCESS_SLOTS};
use crate::types::{ResourceId, ShaderStage};

#[derive(Debug, Clone)]
struct StageSrvs {
    slots: [Option<ResourceId>; MAX_SHADER_RESOURCE_SLOTS],
    /// One past the highest slot ever bound; bounds the nullify scan.
    high_water: usize,
}

impl Default for StageSrvs {
    fn default() -> Self {
        Self {
            slots: [None; MAX_SHADER_RESOURCE_SLOTS],
            high_water: 0,
        }
    }
}

/// Bound-resource table for one immediate context.
///
/// Lives as long as the context it mirrors and is shared by every command list executed on it.
/// Not `Sync`: a context is driven from a single thread.
#[derive(Debug, Clone)]
pub struct DeviceContextState {
    srvs: [StageSrvs; 6],
    uavs: [Option<ResourceId>; MAX_UNORDERED_ACCESS_SLOTS],
    uav_high_water: usize,
    _not_sync: PhantomData<Cell<()>>,
}

impl Default for DeviceContextState {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceContextState {
    pub fn new() -> Self {
        Self {
            srvs: Default::default(),
            uavs: [None; MAX_UNORDERED_ACCESS_SLOTS],
            uav_high_water: 0,
            _not_sync: PhantomData,
        }
    }

    pub fn bound_srv(&self, stage: ShaderStage, slot: u32) -> Option<ResourceId> {
        self.srvs[stage.index()]
            .slots
            .get(slot as usize)
            .copied()
            .flatten()
    }

    pub fn set_bound_srv_slot(&mut self, stage: ShaderStage, slot: u32, resource: Option<ResourceId>) {
        let stage = &mut self.srvs[stage.index()];
        let slot = slot as usize;
        stage.slots[slot] = resource;
        if resource.is_some() {
            stage.high_water = stage.high_water.max(slot + 1);
        }
    }

    /// Slots of `stage` whose SRV reads from `resource`.
    pub fn bound_srv_slots(&self, stage: ShaderStage, resource: ResourceId) -> Vec<u32> {
        let stage = &self.srvs[stage.index()];
        matching_slots(&stage.slots[..stage.high_water], resource)
    }

    pub fn bound_uav(&self, slot: u32) -> Option<ResourceId> {
        self.uavs.get(slot as usize).copied().flatten()
    }

    pub fn set_bound_uav_slot(&mut self, slot: u32, resource: Option<ResourceId>) {
        let slot = slot as usize;
        self.uavs[slot] = resource;
        if resource.is_some() {
            self.uav_high_water = self.uav_high_water.max(slot + 1);
        }
    }

    /// Compute UAV slots that write to `resource`.
    pub fn bound_uav_slots(&self, resource: ResourceId) -> Vec<u32> {
        matching_slots(&self.uavs[..self.uav_high_water], resource)
    }

    /// Number of SRV and UAV slots that currently reference anything.
    pub fn occupied_slots(&self) -> usize {
        let srvs: usize = self
            .srvs
            .iter()
            .map(|s| s.slots.iter().filter(|r| r.is_some()).count())
            .sum();
        srvs + self.uavs.iter().filter(|r| r.is_some()).count()
    }
}

fn matching_slots(slots: &[Option<ResourceId>], resource: ResourceId) -> Vec<u32> {
    slots
        .iter()
        .enumerate()
        .filter(|(_, bound)| **bound == Some(resource))
        .map(|(slot, _)| slot as u32)
        .collect()
}
