//! Per-room content generation.
//!
//! Every room walks a six-step request: pick up its district biome, measure its shape, choose
//! a generator from the best-fit matrix, run it, link walkable features with jump arcs and
//! finally drop anything outside the room or behind an ability the world never grants.

pub mod parametric;
pub mod pattern;
pub mod shapes;
pub mod terrain;
pub mod weighted;

use rand::Rng;
use rayon::prelude::*;

use crate::error::GenError;
use crate::model::{
    Ability, Biome, GenStage, GridCoord, IntRect, JumpConnection, JumpPhysicsData, RoomData,
    RoomFeature, RoomGenerationRequest, RoomGeneratorType, RoomLayout, RoomPipelineStep,
    RoomType, SecretAreaConfig, StageReport, WorldGraph,
};
use crate::seed::{make_rng, make_seed};
use crate::worldgen::jump_arc::calculate_jump_arc;
use crate::worldgen::selector::{SelectionInput, select_generator};

/// Lowest share of the district biome's strength a room keeps.
const MIN_AFFINITY_SHARE: f32 = 0.25;

/// Read-only inputs a generator works from. Coordinates are room-local with `y = 0` on
/// the floor.
pub struct RoomContext<'a> {
    pub request: &'a RoomGenerationRequest,
    pub width: i32,
    pub height: i32,
    pub physics: &'a JumpPhysicsData,
    pub secrets: &'a SecretAreaConfig,
}

impl RoomContext<'_> {
    pub fn area(&self) -> IntRect {
        IntRect::new(0, 0, self.width, self.height)
    }

    pub fn abilities(&self) -> Ability {
        self.request.available_abilities
    }

    pub fn fits(&self, feature: &RoomFeature) -> bool {
        feature.width > 0
            && feature.height > 0
            && self
                .area()
                .contains_footprint(feature.position, feature.width, feature.height)
    }
}

/// Generate every room in parallel. Each room depends only on its own seed and the
/// read-only upstream graph.
pub fn generate_rooms(graph: &mut WorldGraph) -> Result<Option<StageReport>, GenError> {
    if graph.begin_stage(GenStage::RoomGeneration)? {
        return Ok(None);
    }
    let rules = graph
        .rules
        .ok_or_else(|| GenError::Invariant("room generation ran without world rules".into()))?;
    let abilities = rules.available_upgrades;
    let physics = graph.config.physics.with_abilities(abilities);
    let secrets = graph.config.secrets;

    let jobs: Vec<(RoomData, Option<Biome>)> = graph
        .rooms
        .values()
        .map(|room| (room.clone(), graph.biomes.get(&room.district_id).copied()))
        .collect();
    let results: Vec<(RoomGenerationRequest, RoomLayout)> = jobs
        .par_iter()
        .map(|(room, biome)| {
            let mut request =
                RoomGenerationRequest::new(room.node_id, room.room_type, abilities, room.seed);
            request.skill_gating = room.room_type == RoomType::Boss
                && abilities.intersects(Ability::GATE_ABILITIES);
            let layout = run_room_pipeline(&mut request, room, biome.as_ref(), &physics, &secrets);
            (request, layout)
        })
        .collect();

    let mut jumps = 0;
    for (request, layout) in results {
        jumps += layout.jumps.len();
        graph.requests.insert(request.room_id, request);
        graph.room_layouts.insert(layout.room_id, layout);
    }
    tracing::debug!(
        rooms = graph.room_layouts.len(),
        features = graph.room_layouts.values().map(|l| l.features.len()).sum::<usize>(),
        "room content generated"
    );

    Ok(Some(graph.finish_stage(StageReport::new(
        GenStage::RoomGeneration,
        graph.room_layouts.len(),
        jumps,
    ))))
}

/// Drive one request through every remaining step. Never fails: placements that do not
/// fit are left out.
pub fn run_room_pipeline(
    request: &mut RoomGenerationRequest,
    room: &RoomData,
    biome: Option<&Biome>,
    physics: &JumpPhysicsData,
    secrets: &SecretAreaConfig,
) -> RoomLayout {
    let mut layout = RoomLayout {
        room_id: room.node_id,
        ..RoomLayout::default()
    };
    while let Some(step) = request.step() {
        match step {
            RoomPipelineStep::BiomeSelection => select_biome(request, room, biome),
            RoomPipelineStep::LayoutOrientation => {
                request.aspect_ratio = room.bounds.aspect_ratio();
            }
            RoomPipelineStep::GeneratorChoice => {
                let input = SelectionInput {
                    room_type: request.room_type,
                    biome: request.target_biome,
                    biome_affinity: request.biome_affinity,
                    aspect_ratio: request.aspect_ratio,
                    skill_gating: request.skill_gating,
                };
                let seed = make_seed(
                    request.seed,
                    request.room_id,
                    GridCoord::ORIGIN,
                    "generator",
                );
                request.generator = Some(select_generator(&input, seed));
            }
            RoomPipelineStep::ContentPass => {
                let ctx = RoomContext {
                    request,
                    width: room.bounds.width,
                    height: room.bounds.height,
                    physics,
                    secrets,
                };
                let generator = request.generator.unwrap_or(RoomGeneratorType::WeightedTilePrefab);
                let generated = run_generator(generator, &ctx);
                layout.generator = Some(generator);
                layout.features = generated.features;
                layout.jumps = generated.jumps;
            }
            RoomPipelineStep::Navigation => {
                if layout.jumps.is_empty() {
                    layout.jumps = link_walkables(&layout.features, physics);
                }
            }
            RoomPipelineStep::Validation => {
                let area = IntRect::new(0, 0, room.bounds.width, room.bounds.height);
                validate(&mut layout, area, request.available_abilities);
            }
        }
        request.advance();
    }
    layout
}

fn select_biome(request: &mut RoomGenerationRequest, room: &RoomData, biome: Option<&Biome>) {
    let Some(biome) = biome else {
        return;
    };
    request.target_biome = biome.biome_type;
    request.target_polarity = biome.polarity_mask();
    let mut rng = make_rng(room.seed, room.node_id, GridCoord::ORIGIN, "affinity");
    let share = rng.random_range(MIN_AFFINITY_SHARE..=1.0);
    request.biome_affinity = (biome.polarity_strength * share).clamp(0.0, 1.0);
}

pub fn run_generator(generator: RoomGeneratorType, ctx: &RoomContext<'_>) -> RoomLayout {
    use RoomGeneratorType::*;
    match generator {
        PatternDrivenModular => pattern::generate(ctx),
        ParametricChallenge => parametric::generate(ctx),
        WeightedTilePrefab => weighted::generate(ctx),
        HorizontalCorridor => shapes::horizontal_corridor(ctx),
        LinearBranchingCorridor => shapes::branching_corridor(ctx),
        VerticalSegment => shapes::vertical_segment(ctx),
        StackedSegment => shapes::stacked_segment(ctx),
        SkyBiomePlatform => terrain::sky_platforms(ctx),
        LayeredPlatformCloud => terrain::platform_cloud(ctx),
        BiomeWeightedTerrain => terrain::weighted_terrain(ctx),
        BiomeWeightedHeightmap => terrain::heightmap(ctx),
    }
}

/// Layout from a generator's raw placements, dropping anything that does not fit.
pub(crate) fn assemble(ctx: &RoomContext<'_>, mut features: Vec<RoomFeature>) -> RoomLayout {
    features.retain(|f| ctx.fits(f));
    RoomLayout {
        room_id: ctx.request.room_id,
        generator: ctx.request.generator,
        features,
        jumps: Vec::new(),
    }
}

/// Launch and landing points between the tops of two features: the launch edge of `from`
/// nearest to `to`, and the spot on `to` nearest to that.
pub(crate) fn launch_points(from: &RoomFeature, to: &RoomFeature) -> ((f32, f32), (f32, f32)) {
    let to_centre = to.position.x as f32 + to.width as f32 / 2.0;
    let launch_x = to_centre.clamp(from.position.x as f32, (from.position.x + from.width) as f32);
    let land_x = launch_x.clamp(to.position.x as f32, (to.position.x + to.width) as f32);
    (
        (launch_x, (from.position.y + from.height) as f32),
        (land_x, (to.position.y + to.height) as f32),
    )
}

/// Arc between two features, as a recorded connection.
pub(crate) fn jump_between(
    features: &[RoomFeature],
    from: usize,
    to: usize,
    physics: &JumpPhysicsData,
) -> Option<JumpConnection> {
    let (launch, land) = launch_points(&features[from], &features[to]);
    let arc = calculate_jump_arc(launch, land, physics)?;
    Some(JumpConnection {
        from_feature: from,
        to_feature: to,
        angle: arc.angle,
        velocity: arc.velocity,
    })
}

/// Connect each walkable feature to the next one to its right when the jump is feasible.
fn link_walkables(features: &[RoomFeature], physics: &JumpPhysicsData) -> Vec<JumpConnection> {
    let mut walkable: Vec<usize> = (0..features.len())
        .filter(|&i| features[i].is_walkable())
        .collect();
    walkable.sort_by_key(|&i| (features[i].position.x, features[i].position.y, i));
    walkable
        .windows(2)
        .filter_map(|pair| jump_between(features, pair[0], pair[1], physics))
        .collect()
}

/// Drop features outside `area` or needing abilities outside `abilities`, and any jump
/// that touched a dropped feature.
fn validate(layout: &mut RoomLayout, area: IntRect, abilities: Ability) {
    let mut remap: Vec<Option<usize>> = Vec::with_capacity(layout.features.len());
    let mut kept = Vec::with_capacity(layout.features.len());
    for feature in &layout.features {
        let ok = feature.width > 0
            && feature.height > 0
            && area.contains_footprint(feature.position, feature.width, feature.height)
            && abilities.contains(feature.required_abilities);
        if ok {
            remap.push(Some(kept.len()));
            kept.push(*feature);
        } else {
            remap.push(None);
        }
    }
    let dropped = layout.features.len() - kept.len();
    if dropped > 0 {
        tracing::debug!(room = layout.room_id, dropped, "invalid room features dropped");
    }
    layout.features = kept;
    layout.jumps = layout
        .jumps
        .iter()
        .filter_map(|jump| {
            let from = remap.get(jump.from_feature).copied().flatten()?;
            let to = remap.get(jump.to_feature).copied().flatten()?;
            Some(JumpConnection {
                from_feature: from,
                to_feature: to,
                ..*jump
            })
        })
        .collect();
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn request(room_type: RoomType, abilities: Ability, seed: u64) -> RoomGenerationRequest {
        RoomGenerationRequest::new(1, room_type, abilities, seed)
    }

    pub fn context<'a>(
        request: &'a RoomGenerationRequest,
        width: i32,
        height: i32,
        physics: &'a JumpPhysicsData,
        secrets: &'a SecretAreaConfig,
    ) -> RoomContext<'a> {
        RoomContext {
            request,
            width,
            height,
            physics,
            secrets,
        }
    }

    /// Every feature fits and every jump indexes a real feature.
    pub fn assert_well_formed(layout: &RoomLayout, width: i32, height: i32) {
        let area = IntRect::new(0, 0, width, height);
        for feature in &layout.features {
            assert!(
                area.contains_footprint(feature.position, feature.width, feature.height),
                "{feature:?} outside {width}x{height}"
            );
        }
        for jump in &layout.jumps {
            assert!(jump.from_feature < layout.features.len());
            assert!(jump.to_feature < layout.features.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::model::{BiomeType, FeatureKind, RoomType};

    fn room(width: i32, height: i32, room_type: RoomType) -> RoomData {
        RoomData {
            node_id: 9,
            sector_id: 2,
            district_id: 1,
            seed: 1234,
            bounds: IntRect::new(0, 0, width, height),
            room_type,
        }
    }

    #[test]
    fn boss_room_with_dash_uses_pattern_generator() {
        let room = room(16, 12, RoomType::Boss);
        let mut request = request(RoomType::Boss, Ability::DASH, room.seed);
        request.skill_gating = true;
        let physics = JumpPhysicsData::default().with_abilities(Ability::DASH);
        let layout = run_room_pipeline(
            &mut request,
            &room,
            Some(&Biome::from_type(BiomeType::ShadowRealms, 0.8)),
            &physics,
            &SecretAreaConfig::default(),
        );
        assert!(request.is_complete);
        assert_eq!(request.generator, Some(RoomGeneratorType::PatternDrivenModular));
        let gaps: Vec<&RoomFeature> = layout
            .features
            .iter()
            .filter(|f| f.kind == FeatureKind::DashGap)
            .collect();
        assert!(!gaps.is_empty());
        // Plain reach is 4 tiles, dash reach 6.
        assert!(gaps.iter().all(|g| (5..=6).contains(&g.width)));
        assert!(
            layout
                .features
                .iter()
                .all(|f| Ability::DASH.contains(f.required_abilities))
        );
    }

    #[test]
    fn every_generator_stays_in_bounds() {
        let physics = JumpPhysicsData::default().with_abilities(Ability::DEFAULT_UPGRADES);
        let secrets = SecretAreaConfig::default();
        let abilities = Ability::DEFAULT_UPGRADES | Ability::GRAPPLE;
        for (i, generator) in [
            RoomGeneratorType::PatternDrivenModular,
            RoomGeneratorType::ParametricChallenge,
            RoomGeneratorType::WeightedTilePrefab,
            RoomGeneratorType::VerticalSegment,
            RoomGeneratorType::HorizontalCorridor,
            RoomGeneratorType::BiomeWeightedTerrain,
            RoomGeneratorType::SkyBiomePlatform,
            RoomGeneratorType::LinearBranchingCorridor,
            RoomGeneratorType::StackedSegment,
            RoomGeneratorType::LayeredPlatformCloud,
            RoomGeneratorType::BiomeWeightedHeightmap,
        ]
        .into_iter()
        .enumerate()
        {
            for (w, h) in [(8, 6), (16, 12), (32, 10), (10, 32)] {
                let request = request(RoomType::Normal, abilities, 77 + i as u64);
                let ctx = context(&request, w, h, &physics, &secrets);
                let layout = run_generator(generator, &ctx);
                assert_well_formed(&layout, w, h);
            }
        }
    }

    #[test]
    fn validation_drops_unavailable_and_out_of_bounds_features() {
        let mut layout = RoomLayout {
            room_id: 1,
            generator: None,
            features: vec![
                RoomFeature::new(FeatureKind::Platform, GridCoord::new(0, 0), 2, 1),
                RoomFeature::new(FeatureKind::GrapplePoint, GridCoord::new(3, 3), 1, 1)
                    .requiring(Ability::GRAPPLE),
                RoomFeature::new(FeatureKind::Platform, GridCoord::new(9, 0), 4, 1),
                RoomFeature::new(FeatureKind::Platform, GridCoord::new(4, 0), 2, 1),
            ],
            jumps: vec![
                JumpConnection {
                    from_feature: 0,
                    to_feature: 2,
                    angle: 1.0,
                    velocity: 1.0,
                },
                JumpConnection {
                    from_feature: 0,
                    to_feature: 3,
                    angle: 0.5,
                    velocity: 2.0,
                },
            ],
        };
        validate(&mut layout, IntRect::new(0, 0, 10, 6), Ability::JUMP);
        assert_eq!(layout.features.len(), 2);
        assert_eq!(layout.jumps.len(), 1);
        assert_eq!(layout.jumps[0].to_feature, 1);
    }

    #[test]
    fn navigation_links_reachable_platforms() {
        let features = vec![
            RoomFeature::new(FeatureKind::Platform, GridCoord::new(0, 0), 2, 1),
            RoomFeature::new(FeatureKind::Platform, GridCoord::new(4, 1), 2, 1),
            RoomFeature::new(FeatureKind::Platform, GridCoord::new(30, 1), 2, 1),
        ];
        let jumps = link_walkables(&features, &JumpPhysicsData::default());
        assert_eq!(jumps.len(), 1);
        assert_eq!((jumps[0].from_feature, jumps[0].to_feature), (0, 1));
    }

    #[test]
    fn pipeline_is_deterministic() {
        let room = room(20, 10, RoomType::Normal);
        let physics = JumpPhysicsData::default();
        let biome = Biome::from_type(BiomeType::Forest, 0.9);
        let run = || {
            let mut request = request(RoomType::Normal, Ability::DEFAULT_UPGRADES, room.seed);
            run_room_pipeline(
                &mut request,
                &room,
                Some(&biome),
                &physics,
                &SecretAreaConfig::default(),
            )
        };
        assert_eq!(run(), run());
    }
}
