use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rand::Rng;
use rand::RngCore;

use crate::error::GenError;
use crate::model::{
    BakedEdge, ConnectionType, GenStage, GridCoord, Polarity, StageReport, WorldGraph, WorldSize,
};
use crate::seed::{make_seed, stage_rng};

/// Largest pending count laid out with Poisson-disc sampling.
pub const POISSON_MAX_COUNT: usize = 12;
/// Candidate draws per point before accepting the last one.
pub const POISSON_ATTEMPTS: u32 = 30;
/// Minimum spacing as a fraction of the world's shorter side.
pub const MIN_DISTANCE_FRACTION: f32 = 0.2;
/// Maximum jitter of a grid point, as a fraction of its cell.
pub const JITTER_FRACTION: f32 = 0.3;
/// Nearest neighbours each district links to.
const NEIGHBOR_K: usize = 2;
/// World units per unit of traversal cost.
const COST_SCALE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStrategy {
    PoissonDisc,
    JitteredGrid,
}

pub fn choose_strategy(pending: usize) -> LayoutStrategy {
    if pending <= POISSON_MAX_COUNT {
        LayoutStrategy::PoissonDisc
    } else {
        LayoutStrategy::JitteredGrid
    }
}

/// Placement region, centred on the hub: `[min, min + size)` on each axis.
#[derive(Debug, Clone, Copy)]
struct Region {
    min_x: i32,
    min_y: i32,
    width: i32,
    height: i32,
}

impl Region {
    fn new(size: WorldSize) -> Self {
        Self {
            min_x: -(size.width / 2),
            min_y: -(size.height / 2),
            width: size.width,
            height: size.height,
        }
    }

    fn contains(&self, p: GridCoord) -> bool {
        p.x >= self.min_x
            && p.x < self.min_x + self.width
            && p.y >= self.min_y
            && p.y < self.min_y + self.height
    }

    fn clamp(&self, p: GridCoord) -> GridCoord {
        GridCoord::new(
            p.x.clamp(self.min_x, self.min_x + self.width - 1),
            p.y.clamp(self.min_y, self.min_y + self.height - 1),
        )
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> (f32, f32) {
        (
            rng.random_range(self.min_x as f32..(self.min_x + self.width) as f32),
            rng.random_range(self.min_y as f32..(self.min_y + self.height) as f32),
        )
    }
}

/// Place every pending district, freeze coordinates, and bake the district edge list.
/// Already-placed districts (the hub) keep their coordinates. A no-op once complete.
pub fn layout_districts(graph: &mut WorldGraph) -> Result<Option<StageReport>, GenError> {
    if graph.begin_stage(GenStage::DistrictLayout)? {
        return Ok(None);
    }

    let seed = graph.config.seed;
    let region = Region::new(graph.config.world_size);
    let mut rng = stage_rng(seed, "district_layout");

    let pending: Vec<u32> = graph
        .districts
        .values()
        .filter(|d| !d.placed)
        .map(|d| d.node_id)
        .collect();
    let mut occupied: BTreeSet<GridCoord> = graph
        .districts
        .values()
        .filter(|d| d.placed)
        .filter_map(|d| graph.coordinates(d.node_id))
        .collect();

    let strategy = choose_strategy(pending.len());
    let raw_points = match strategy {
        LayoutStrategy::PoissonDisc => {
            let min_dist = graph.config.world_size.min_side() as f32 * MIN_DISTANCE_FRACTION;
            let fixed: Vec<(f32, f32)> = occupied
                .iter()
                .map(|c| (c.x as f32, c.y as f32))
                .collect();
            poisson_disc(pending.len(), region, min_dist, &fixed, &mut rng)
        }
        LayoutStrategy::JitteredGrid => jittered_grid(pending.len(), region, &mut rng),
    };

    // Resolve every coordinate before touching the graph so a failure leaves it unchanged.
    let mut placements = Vec::with_capacity(pending.len());
    for (&id, &(x, y)) in pending.iter().zip(raw_points.iter()) {
        let wanted = region.clamp(GridCoord::new(x.round() as i32, y.round() as i32));
        let coord = nearest_free(wanted, region, &occupied).ok_or_else(|| {
            GenError::Invariant(format!("no free cell left for district {id}"))
        })?;
        occupied.insert(coord);
        placements.push((id, coord));
    }
    for (id, coord) in placements {
        if let Some(node) = graph.nodes.get_mut(&id) {
            node.coordinates = coord;
        }
        if let Some(district) = graph.districts.get_mut(&id) {
            district.placed = true;
        }
    }

    let world_seed = u64::from(seed);
    let coords: BTreeMap<u32, GridCoord> = graph
        .districts
        .keys()
        .filter_map(|&id| graph.coordinates(id).map(|c| (id, c)))
        .collect();
    for (id, district) in graph.districts.iter_mut() {
        let coord = coords.get(id).copied().unwrap_or_default();
        district.seed = make_seed(world_seed, *id, coord, "district");
    }

    let hub = graph.hub_id();
    graph.baked_edges = bake_edges(&coords, hub, &mut rng);

    tracing::debug!(?strategy, placed = pending.len(), "districts placed");
    Ok(Some(graph.finish_stage(StageReport::new(
        GenStage::DistrictLayout,
        pending.len(),
        graph.baked_edges.len(),
    ))))
}

/// Poisson-disc sampling with a per-point attempt cap. When the cap runs out the last
/// candidate is accepted as-is.
fn poisson_disc(
    count: usize,
    region: Region,
    min_dist: f32,
    fixed: &[(f32, f32)],
    rng: &mut dyn RngCore,
) -> Vec<(f32, f32)> {
    let mut placed: Vec<(f32, f32)> = Vec::with_capacity(count);
    for _ in 0..count {
        let mut candidate = region.random_point(rng);
        let mut accepted = false;
        for _ in 0..POISSON_ATTEMPTS {
            let too_close = fixed
                .iter()
                .chain(placed.iter())
                .any(|&p| dist(p, candidate) < min_dist);
            if !too_close {
                accepted = true;
                break;
            }
            candidate = region.random_point(rng);
        }
        if !accepted {
            tracing::debug!(min_dist, "poisson-disc attempt cap reached, accepting last candidate");
        }
        placed.push(candidate);
    }
    placed
}

/// One point per cell of a `ceil(sqrt(n))`-square grid, jittered within its cell.
fn jittered_grid(count: usize, region: Region, rng: &mut dyn RngCore) -> Vec<(f32, f32)> {
    if count == 0 {
        return Vec::new();
    }
    let side = (count as f64).sqrt().ceil() as usize;
    let cell_w = region.width as f32 / side as f32;
    let cell_h = region.height as f32 / side as f32;
    (0..count)
        .map(|i| {
            let col = (i % side) as f32;
            let row = (i / side) as f32;
            let cx = region.min_x as f32 + (col + 0.5) * cell_w;
            let cy = region.min_y as f32 + (row + 0.5) * cell_h;
            let jx = cell_w * JITTER_FRACTION;
            let jy = cell_h * JITTER_FRACTION;
            (
                cx + rng.random_range(-jx..=jx),
                cy + rng.random_range(-jy..=jy),
            )
        })
        .collect()
}

/// Closest free in-region cell to `wanted`, searching outward ring by ring.
fn nearest_free(
    wanted: GridCoord,
    region: Region,
    occupied: &BTreeSet<GridCoord>,
) -> Option<GridCoord> {
    if region.contains(wanted) && !occupied.contains(&wanted) {
        return Some(wanted);
    }
    let max_radius = region.width.max(region.height);
    for radius in 1..=max_radius {
        let mut ring: Vec<GridCoord> = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs() != radius && dy.abs() != radius {
                    continue;
                }
                let p = GridCoord::new(wanted.x + dx, wanted.y + dy);
                if region.contains(p) && !occupied.contains(&p) {
                    ring.push(p);
                }
            }
        }
        if let Some(best) = ring
            .into_iter()
            .min_by(|a, b| wanted.distance(*a).total_cmp(&wanted.distance(*b)).then(a.cmp(b)))
        {
            return Some(best);
        }
    }
    None
}

/// K-nearest-neighbour edges, joined into a single component, with seeded edge types.
fn bake_edges(
    coords: &BTreeMap<u32, GridCoord>,
    hub: Option<u32>,
    rng: &mut dyn RngCore,
) -> Vec<BakedEdge> {
    let ids: Vec<u32> = coords.keys().copied().collect();
    let points: Vec<GridCoord> = coords.values().copied().collect();
    let n = ids.len();
    let mut pairs: BTreeSet<(usize, usize)> = BTreeSet::new();

    for i in 0..n {
        let mut distances: Vec<(usize, f32)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (j, points[i].distance(points[j])))
            .collect();
        distances.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        for &(j, _) in distances.iter().take(NEIGHBOR_K) {
            pairs.insert((i.min(j), i.max(j)));
        }
    }
    ensure_connected(&points, &mut pairs);

    pairs
        .into_iter()
        .map(|(a, b)| {
            let touches_hub = hub.is_some_and(|h| ids[a] == h || ids[b] == h);
            let connection_type = if touches_hub {
                ConnectionType::Bidirectional
            } else {
                roll_connection_type(rng)
            };
            let (from, to) = if !connection_type.is_reversible() && rng.random_bool(0.5) {
                (ids[b], ids[a])
            } else {
                (ids[a], ids[b])
            };
            let required_polarity = if connection_type.is_gated() {
                Polarity::SINGLES[rng.random_range(0..Polarity::SINGLES.len())]
            } else {
                Polarity::NONE
            };
            let traversal_cost = match connection_type {
                ConnectionType::Teleporter => 0.1,
                _ => points[a].distance(points[b]) / COST_SCALE,
            };
            BakedEdge {
                from,
                to,
                connection_type,
                required_polarity,
                traversal_cost,
            }
        })
        .collect()
}

fn roll_connection_type(rng: &mut dyn RngCore) -> ConnectionType {
    let roll: f64 = rng.random_range(0.0..1.0);
    match roll {
        r if r < 0.70 => ConnectionType::Bidirectional,
        r if r < 0.78 => ConnectionType::OneWay,
        r if r < 0.84 => ConnectionType::Drop,
        r if r < 0.89 => ConnectionType::Vent,
        r if r < 0.93 => ConnectionType::CrumbleFloor,
        r if r < 0.96 => ConnectionType::Teleporter,
        _ => ConnectionType::ConditionalGate,
    }
}

/// BFS component search; join each stray component to the first by its closest pair.
fn ensure_connected(points: &[GridCoord], pairs: &mut BTreeSet<(usize, usize)>) {
    let n = points.len();
    if n < 2 {
        return;
    }
    loop {
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        for &(a, b) in pairs.iter() {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        let mut visited = vec![false; n];
        let mut queue = VecDeque::from([0usize]);
        visited[0] = true;
        while let Some(current) = queue.pop_front() {
            for &next in &adjacency[current] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        if visited.iter().all(|v| *v) {
            return;
        }

        let mut best: Option<(usize, usize, f32)> = None;
        for i in (0..n).filter(|&i| visited[i]) {
            for j in (0..n).filter(|&j| !visited[j]) {
                let d = points[i].distance(points[j]);
                if best.is_none_or(|(_, _, bd)| d < bd) {
                    best = Some((i, j, d));
                }
            }
        }
        match best {
            Some((i, j, _)) => {
                pairs.insert((i.min(j), i.max(j)));
            }
            None => return,
        }
    }
}

fn dist(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}
