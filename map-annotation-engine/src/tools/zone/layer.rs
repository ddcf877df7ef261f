use crate::engine::map::occupancy_grid::{MapInfo, OccupancyGrid};
use crate::engine::map::raster_editor::{fill_polygon, point_in_polygon, rasterize_line};
use crate::engine::map::snapshot::EditSnapshot;
use crate::tools::preview::outline_edges;
use crate::tools::records::ZoneRecord;
use bevy::prelude::*;
use constants::occupancy::TRANSPARENT;

/// Committed zones and the RGBA overlay they are rasterised into.
///
/// The overlay shares the map's geometry and is redrawn from the full record
/// list whenever a zone is added, edited or removed, so later zones paint over
/// earlier ones.
#[derive(Resource, Debug, Clone)]
pub struct ZoneLayer {
    overlay: OccupancyGrid,
    zones: Vec<ZoneRecord>,
    next_id: u32,
}

/// Rollback point for the zone tool: overlay pixels plus the record list.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneLayerSnapshot {
    pixels: EditSnapshot,
    zones: Vec<ZoneRecord>,
    next_id: u32,
}

impl ZoneLayer {
    pub fn new(info: MapInfo) -> Self {
        Self {
            overlay: OccupancyGrid::filled(info, TRANSPARENT),
            zones: Vec::new(),
            next_id: 1,
        }
    }

    /// Layer seeded with previously committed zones.
    pub fn with_zones(info: MapInfo, zones: Vec<ZoneRecord>) -> Self {
        let next_id = zones
            .iter()
            .map(|zone| zone.id.saturating_add(1))
            .max()
            .unwrap_or(1);
        let mut layer = Self {
            overlay: OccupancyGrid::filled(info, TRANSPARENT),
            zones,
            next_id,
        };
        layer.rebuild_overlay();
        layer
    }

    pub fn overlay(&self) -> &OccupancyGrid {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut OccupancyGrid {
        &mut self.overlay
    }

    pub fn zones(&self) -> &[ZoneRecord] {
        &self.zones
    }

    pub fn get(&self, id: u32) -> Option<&ZoneRecord> {
        self.zones.iter().find(|zone| zone.id == id)
    }

    /// Next unused id. Ids only wrap back to the lowest free one once the
    /// counter is exhausted.
    pub fn allocate_id(&mut self) -> u32 {
        let id = if self.get(self.next_id).is_none() {
            self.next_id
        } else {
            (1..=u32::MAX)
                .find(|id| self.get(*id).is_none())
                .unwrap_or(self.next_id)
        };
        self.next_id = id.saturating_add(1).max(self.next_id);
        id
    }

    /// Topmost zone whose fill contains `world`.
    pub fn zone_at(&self, world: Vec2) -> Option<u32> {
        self.zones
            .iter()
            .rev()
            .find(|zone| point_in_polygon(world, &zone.polygon()))
            .map(|zone| zone.id)
    }

    /// Replace the record with the same id, or append a new one.
    pub fn upsert(&mut self, record: ZoneRecord) {
        self.next_id = self.next_id.max(record.id.saturating_add(1));
        match self.zones.iter_mut().find(|zone| zone.id == record.id) {
            Some(existing) => *existing = record,
            None => self.zones.push(record),
        }
    }

    pub fn remove(&mut self, id: u32) -> Option<ZoneRecord> {
        let index = self.zones.iter().position(|zone| zone.id == id)?;
        Some(self.zones.remove(index))
    }

    pub fn rebuild_overlay(&mut self) {
        self.overlay.fill(TRANSPARENT);
        for zone in &self.zones {
            let polygon = zone.polygon();
            if polygon.len() < 3 {
                warn!("Zone {} has {} points, not drawn", zone.id, polygon.len());
                continue;
            }
            fill_polygon(&mut self.overlay, &polygon, zone.style.colour);

            let mapper = self.overlay.mapper();
            let width_px = mapper.metres_to_pixels(zone.style.line_width).round().max(1.0) as u32;
            let outline = zone.style.outline_colour();
            for (start, end) in outline_edges(&polygon) {
                rasterize_line(&mut self.overlay, start, end, width_px, outline);
            }
        }
        self.overlay.mark_dirty();
    }

    pub fn snapshot(&self) -> ZoneLayerSnapshot {
        ZoneLayerSnapshot {
            pixels: self.overlay.snapshot(),
            zones: self.zones.clone(),
            next_id: self.next_id,
        }
    }

    pub fn restore(&mut self, snapshot: &ZoneLayerSnapshot) {
        if self.overlay.restore(&snapshot.pixels) {
            self.zones = snapshot.zones.clone();
            self.next_id = snapshot.next_id;
        }
    }
}
