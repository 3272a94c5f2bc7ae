use rand::Rng;
use rayon::prelude::*;

use crate::error::GenError;
use crate::model::config::grid_side;
use crate::model::{
    DistrictData, GenStage, GridCoord, HierarchyConfig, IntRect, NodeLevel, RoomData, RoomType,
    SectorData, StageReport, WorldGraph,
};
use crate::seed::{make_rng, make_seed};

/// Planned subdivision of one sector: its cell in the district grid plus room cells.
#[derive(Debug, Clone, PartialEq)]
struct SectorPlan {
    cell: GridCoord,
    bounds: IntRect,
    grid: (i32, i32),
    rooms: Vec<(GridCoord, IntRect)>,
}

/// Subdivide every district into sectors and every sector into rooms, then type the rooms.
///
/// Subdivision is planned per district in parallel; ids are allocated afterwards in
/// district order so the result does not depend on scheduling.
pub fn build_hierarchy(graph: &mut WorldGraph) -> Result<Option<StageReport>, GenError> {
    if graph.begin_stage(GenStage::SectorHierarchy)? {
        return Ok(None);
    }

    let extent = graph.config.hierarchy.district_extent;
    let mut district_bounds = Vec::with_capacity(graph.districts.len());
    for id in graph.districts.keys() {
        let coords = graph.coordinates(*id).unwrap_or_default();
        let origin = coords
            .x
            .checked_mul(extent)
            .zip(coords.y.checked_mul(extent))
            .filter(|(x, y)| x.checked_add(extent).is_some() && y.checked_add(extent).is_some())
            .ok_or_else(|| {
                GenError::Invariant(format!("district {id} at {coords:?} overflows tile space"))
            })?;
        district_bounds.push((*id, IntRect::new(origin.0, origin.1, extent, extent)));
    }
    for (id, bounds) in district_bounds {
        if let Some(district) = graph.districts.get_mut(&id) {
            district.bounds = bounds;
        }
    }

    let hierarchy = graph.config.hierarchy;
    let districts: Vec<DistrictData> = graph.districts.values().cloned().collect();
    let plans: Vec<(u32, Vec<SectorPlan>)> = districts
        .par_iter()
        .map(|d| (d.node_id, plan_district(d, &hierarchy)))
        .collect();

    let mut sector_count = 0;
    let mut room_count = 0;
    for (district_id, sectors) in plans {
        let district_seed = graph.districts.get(&district_id).map_or(0, |d| d.seed);
        let mut sector_ids = Vec::with_capacity(sectors.len());
        for plan in sectors {
            let sector_id = graph.add_child(NodeLevel::Sector, district_id, plan.cell)?;
            let sector_seed = make_seed(district_seed, sector_id, plan.cell, "sector");
            let mut room_ids = Vec::with_capacity(plan.rooms.len());
            for (cell, bounds) in plan.rooms {
                let room_id = graph.add_child(NodeLevel::Room, sector_id, cell)?;
                graph.rooms.insert(
                    room_id,
                    RoomData {
                        node_id: room_id,
                        sector_id,
                        district_id,
                        seed: make_seed(sector_seed, room_id, cell, "room"),
                        bounds,
                        room_type: RoomType::Normal,
                    },
                );
                room_ids.push(room_id);
            }
            room_count += room_ids.len();
            graph.sectors.insert(
                sector_id,
                SectorData {
                    node_id: sector_id,
                    district_id,
                    seed: sector_seed,
                    bounds: plan.bounds,
                    grid: plan.grid,
                    rooms: room_ids,
                },
            );
            sector_ids.push(sector_id);
        }
        sector_count += sector_ids.len();
        if let Some(district) = graph.districts.get_mut(&district_id) {
            district.sectors = sector_ids;
        }
    }

    assign_room_types(graph);

    Ok(Some(graph.finish_stage(StageReport::new(
        GenStage::SectorHierarchy,
        sector_count + room_count,
        0,
    ))))
}

fn plan_district(district: &DistrictData, config: &HierarchyConfig) -> Vec<SectorPlan> {
    let mut rng = make_rng(district.seed, district.node_id, GridCoord::ORIGIN, "sectors");
    let count = rng.random_range(config.min_sectors..=config.max_sectors);
    tile(district.bounds, count)
        .into_iter()
        .enumerate()
        .map(|(index, (cell, bounds))| {
            let mut room_rng = make_rng(district.seed, index as u32, cell, "rooms");
            let rooms = room_rng.random_range(config.min_rooms..=config.max_rooms);
            SectorPlan {
                cell,
                bounds,
                grid: grid_dims(rooms),
                rooms: tile(bounds, rooms),
            }
        })
        .collect()
}

/// `(cols, rows)` of the smallest near-square grid holding `count` cells.
fn grid_dims(count: u32) -> (i32, i32) {
    let cols = grid_side(count);
    let rows = (count.max(1) as i32 + cols - 1) / cols;
    (cols, rows)
}

/// First `count` cells, row-major, of a grid tiling `bounds`.
fn tile(bounds: IntRect, count: u32) -> Vec<(GridCoord, IntRect)> {
    let (cols, rows) = grid_dims(count);
    let mut cells = bounds.subdivide(cols, rows);
    cells.truncate(count as usize);
    cells
}

fn assign_room_types(graph: &mut WorldGraph) {
    let hub = graph.hub_id();
    let hub_coords = hub.and_then(|h| graph.coordinates(h)).unwrap_or_default();
    // Farthest district from the hub; lowest id wins ties.
    let exit_district = graph
        .districts
        .values()
        .filter(|d| !d.is_hub)
        .map(|d| {
            let coords = graph.coordinates(d.node_id).unwrap_or_default();
            (d.node_id, coords.distance(hub_coords))
        })
        .fold(None, |best: Option<(u32, f32)>, (id, dist)| match best {
            Some((_, best_dist)) if best_dist >= dist => best,
            _ => Some((id, dist)),
        })
        .map(|(id, _)| id);

    let mut typed: Vec<(u32, RoomType)> = Vec::new();
    for district in graph.districts.values() {
        let rooms: Vec<u32> = district
            .sectors
            .iter()
            .filter_map(|s| graph.sectors.get(s))
            .flat_map(|s| s.rooms.iter().copied())
            .collect();
        if district.is_hub {
            for (room, kind) in rooms
                .iter()
                .zip([RoomType::Entrance, RoomType::Hub, RoomType::Shop])
            {
                typed.push((*room, kind));
            }
        } else if let Some(last) = rooms.last() {
            let kind = if Some(district.node_id) == exit_district {
                RoomType::Exit
            } else {
                RoomType::Boss
            };
            typed.push((*last, kind));
        }
    }
    for (room, kind) in typed {
        if let Some(data) = graph.rooms.get_mut(&room) {
            data.room_type = kind;
        }
    }

    let sector_firsts: Vec<u32> = graph
        .sectors
        .values()
        .filter_map(|s| s.rooms.first().copied())
        .collect();
    for room in sector_firsts {
        if let Some(data) = graph.rooms.get_mut(&room)
            && data.room_type == RoomType::Normal
        {
            data.room_type = RoomType::Save;
        }
    }

    let treasure_chance = graph.config.hierarchy.treasure_chance;
    let coords: Vec<(u32, GridCoord)> = graph
        .rooms
        .keys()
        .map(|id| (*id, graph.coordinates(*id).unwrap_or_default()))
        .collect();
    for (id, cell) in coords {
        if let Some(data) = graph.rooms.get_mut(&id)
            && data.room_type == RoomType::Normal
        {
            let mut rng = make_rng(data.seed, id, cell, "room_type");
            if rng.random_bool(treasure_chance.clamp(0.0, 1.0)) {
                data.room_type = RoomType::Treasure;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{WorldConfiguration, WorldSize};
    use crate::worldgen::{connections, layout, rules, wfc};

    fn prepared(seed: u32, districts: u32) -> WorldGraph {
        let config = WorldConfiguration::new(seed, WorldSize::new(50, 50), districts);
        let mut graph = WorldGraph::bootstrap(config).unwrap();
        layout::layout_districts(&mut graph).unwrap();
        connections::build_connections(&mut graph).unwrap();
        rules::randomize_rules(&mut graph).unwrap();
        wfc::resolve_districts(&mut graph).unwrap();
        graph
    }

    #[test]
    fn grid_dims_hold_the_count() {
        assert_eq!(grid_dims(2), (2, 1));
        assert_eq!(grid_dims(3), (2, 2));
        assert_eq!(grid_dims(4), (2, 2));
        assert_eq!(grid_dims(1), (1, 1));
    }

    #[test]
    fn children_tile_inside_parents() {
        let mut graph = prepared(42, 5);
        let report = build_hierarchy(&mut graph).unwrap().unwrap();
        assert_eq!(report.nodes, graph.sectors.len() + graph.rooms.len());
        let h = graph.config.hierarchy;
        for district in graph.districts.values() {
            let n = district.sectors.len() as u32;
            assert!((h.min_sectors..=h.max_sectors).contains(&n));
            for sector_id in &district.sectors {
                let sector = &graph.sectors[sector_id];
                assert!(district.bounds.contains_footprint(
                    GridCoord::new(sector.bounds.x, sector.bounds.y),
                    sector.bounds.width,
                    sector.bounds.height
                ));
                let m = sector.rooms.len() as u32;
                assert!((h.min_rooms..=h.max_rooms).contains(&m));
                for room_id in &sector.rooms {
                    let room = &graph.rooms[room_id];
                    assert!(room.bounds.width >= h.min_room_width);
                    assert!(room.bounds.height >= h.min_room_height);
                    assert_eq!(graph.nodes[room_id].parent_id, *sector_id);
                }
            }
        }
    }

    #[test]
    fn hub_and_boss_rooms_are_typed() {
        let mut graph = prepared(7, 6);
        build_hierarchy(&mut graph).unwrap();
        let hub = graph.hub_id().unwrap();
        let hub_types: Vec<RoomType> = graph.rooms_in_district(hub).map(|r| r.room_type).collect();
        assert_eq!(&hub_types[..3], &[RoomType::Entrance, RoomType::Hub, RoomType::Shop]);

        let exits = graph.rooms.values().filter(|r| r.room_type == RoomType::Exit).count();
        let bosses = graph.rooms.values().filter(|r| r.room_type == RoomType::Boss).count();
        assert_eq!(exits, 1);
        assert_eq!(bosses, graph.districts.len() - 2);
    }

    #[test]
    fn single_district_world_has_no_boss() {
        let mut graph = prepared(3, 1);
        build_hierarchy(&mut graph).unwrap();
        assert!(graph.rooms.values().all(|r| r.room_type != RoomType::Boss));
        assert!(graph.rooms.values().any(|r| r.room_type == RoomType::Entrance));
    }

    #[test]
    fn rerun_is_a_no_op() {
        let mut graph = prepared(11, 4);
        build_hierarchy(&mut graph).unwrap();
        let rooms = graph.rooms.len();
        assert_eq!(build_hierarchy(&mut graph).unwrap(), None);
        assert_eq!(graph.rooms.len(), rooms);
    }
}
