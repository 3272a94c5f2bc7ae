//! District biome assignment by wave-function collapse.
//!
//! Every district starts with a candidate list of biomes. The solver repeatedly collapses
//! the unresolved district with the fewest candidates, draws a biome weighted by
//! difficulty and neighbour agreement, and propagates the choice arc-consistently through
//! the connection graph. A contradiction rewinds to the latest choice point and tries its
//! next candidate. After `retry_cap` rewinds the remaining districts take whichever
//! candidate conflicts least with what is already resolved.

use std::collections::{BTreeMap, VecDeque};

use rand::Rng;
use rand::RngCore;

use crate::error::GenError;
use crate::model::{
    Biome, BiomeType, GenStage, Polarity, StageReport, WfcState, WorldGraph, WorldRuleSet,
};
use crate::seed::{make_rng, stage_rng};

/// Weight multiplier for neutral filler biomes, so themed biomes dominate.
const NEUTRAL_WEIGHT: f32 = 0.2;

/// Constraint problem over `domains.len()` variables.
pub struct WfcProblem<'a> {
    pub domains: Vec<Vec<BiomeType>>,
    pub neighbors: Vec<Vec<usize>>,
    pub compatible: &'a dyn Fn(BiomeType, BiomeType) -> bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WfcOutcome {
    pub assignment: Vec<BiomeType>,
    pub backtracks: u32,
    /// Variables assigned by the least-conflict fallback.
    pub fallbacks: usize,
}

/// Choice point: state before the collapse and the candidates not yet tried.
struct Frame {
    domains: Vec<Vec<BiomeType>>,
    assigned: Vec<Option<BiomeType>>,
    node: usize,
    remaining: Vec<BiomeType>,
}

/// Assign one biome per district. A no-op once complete.
pub fn resolve_districts(graph: &mut WorldGraph) -> Result<Option<StageReport>, GenError> {
    if graph.begin_stage(GenStage::DistrictWfc)? {
        return Ok(None);
    }
    let rules = graph
        .rules
        .ok_or_else(|| GenError::Invariant("district WFC ran without world rules".into()))?;

    let ids: Vec<u32> = graph.districts.keys().copied().collect();
    let index: BTreeMap<u32, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    for id in &ids {
        graph.wfc_states.insert(*id, WfcState::Initialized);
    }

    let all_neighbors = graph.undirected_neighbors();
    let neighbors: Vec<Vec<usize>> = ids
        .iter()
        .map(|id| {
            all_neighbors
                .get(id)
                .map(|set| set.iter().filter_map(|n| index.get(n).copied()).collect())
                .unwrap_or_default()
        })
        .collect();
    let domains: Vec<Vec<BiomeType>> = ids
        .iter()
        .map(|id| initial_domain(graph, *id, &rules))
        .collect();

    for id in &ids {
        graph.wfc_states.insert(*id, WfcState::InProgress);
    }
    let compatible = |a: BiomeType, b: BiomeType| biomes_compatible(a, b);
    let problem = WfcProblem {
        domains,
        neighbors,
        compatible: &compatible,
    };
    let mut rng = stage_rng(graph.config.seed, "district_wfc");
    let outcome = solve(&problem, graph.config.wfc_retry_cap, &mut rng)?;

    for (i, id) in ids.iter().enumerate() {
        let seed = graph.districts.get(id).map_or(0, |d| d.seed);
        let coords = graph.coordinates(*id).unwrap_or_default();
        let mut district_rng = make_rng(seed, *id, coords, "biome");
        let strength = if outcome.assignment[i].is_neutral() {
            0.0
        } else {
            district_rng.random_range(0.5..=1.0)
        };
        graph
            .biomes
            .insert(*id, Biome::from_type(outcome.assignment[i], strength));
        graph.wfc_states.insert(*id, WfcState::Completed);
    }

    if outcome.fallbacks > 0 {
        tracing::debug!(
            fallbacks = outcome.fallbacks,
            backtracks = outcome.backtracks,
            "district WFC fell back to least-conflict biomes"
        );
    }
    Ok(Some(graph.finish_stage(StageReport::new(
        GenStage::DistrictWfc,
        ids.len(),
        outcome.backtracks as usize,
    ))))
}

/// Biomes allowed by the rule mask, narrowed by the polarity requirements of the
/// district's connections when that leaves anything.
pub fn candidate_biomes(mask: Polarity) -> Vec<BiomeType> {
    BiomeType::ALL
        .iter()
        .copied()
        .filter(|b| match b {
            BiomeType::Unknown | BiomeType::HubArea => false,
            BiomeType::TransitionZone | BiomeType::AncientRuins => true,
            other => mask.contains(other.polarities().0),
        })
        .collect()
}

fn initial_domain(graph: &WorldGraph, id: u32, rules: &WorldRuleSet) -> Vec<BiomeType> {
    if graph.districts.get(&id).is_some_and(|d| d.is_hub) {
        return vec![BiomeType::HubArea];
    }
    let candidates = candidate_biomes(rules.biome_polarity_mask);
    let requirements: Vec<Polarity> = graph
        .adjacency
        .values()
        .flatten()
        .filter(|c| c.from_node_id == id || c.to_node_id == id)
        .map(|c| c.required_polarity)
        .filter(|p| !p.is_sentinel())
        .collect();
    if requirements.is_empty() {
        return candidates;
    }
    let narrowed: Vec<BiomeType> = candidates
        .iter()
        .copied()
        .filter(|b| {
            let biome = Biome::from_type(*b, 1.0);
            requirements.iter().all(|p| biome.is_compatible_with(*p))
        })
        .collect();
    if narrowed.is_empty() {
        candidates
    } else {
        narrowed
    }
}

pub fn biomes_compatible(a: BiomeType, b: BiomeType) -> bool {
    Biome::from_type(a, 1.0).is_adjacent_compatible(&Biome::from_type(b, 1.0))
}

pub fn solve(
    problem: &WfcProblem<'_>,
    retry_cap: u32,
    rng: &mut dyn RngCore,
) -> Result<WfcOutcome, GenError> {
    let n = problem.domains.len();
    if let Some(empty) = problem.domains.iter().position(Vec::is_empty) {
        return Err(GenError::Invariant(format!(
            "district index {empty} has no candidate biomes"
        )));
    }

    let mut domains = problem.domains.clone();
    let mut assigned: Vec<Option<BiomeType>> = vec![None; n];
    let mut backtracks = 0u32;
    let mut stack: Vec<Frame> = Vec::new();
    let mut consistent = assigned.clone();

    // Initial arc consistency; on failure keep the unpruned domains.
    let all: Vec<usize> = (0..n).collect();
    if propagate(problem, &mut domains, &all).is_err() {
        domains = problem.domains.clone();
    }

    'collapse: loop {
        let Some(node) = min_entropy(&domains, &assigned) else {
            break;
        };
        let remaining = weighted_order(problem, &domains[node], node, &assigned, rng);
        stack.push(Frame {
            domains: domains.clone(),
            assigned: assigned.clone(),
            node,
            remaining,
        });

        loop {
            let Some(frame) = stack.last_mut() else {
                // Every alternative at every choice point failed.
                break 'collapse;
            };
            if frame.remaining.is_empty() {
                stack.pop();
                continue;
            }
            let candidate = frame.remaining.remove(0);
            domains = frame.domains.clone();
            assigned = frame.assigned.clone();
            let node = frame.node;
            assigned[node] = Some(candidate);
            domains[node] = vec![candidate];

            if propagate(problem, &mut domains, &[node]).is_ok() {
                consistent = assigned.clone();
                continue 'collapse;
            }
            backtracks += 1;
            if backtracks >= retry_cap {
                break 'collapse;
            }
        }
    }
    // A finished search ends on a successful propagation, so this is the full assignment
    // then and the last consistent partial one otherwise.
    let mut assigned = consistent;
    let mut fallbacks = 0;
    for i in 0..n {
        if assigned[i].is_none() {
            assigned[i] = Some(least_conflict(problem, i, &assigned));
            fallbacks += 1;
        }
    }
    let assignment = assigned.into_iter().flatten().collect::<Vec<_>>();
    if assignment.len() != n {
        return Err(GenError::Invariant("WFC left a district without a biome".into()));
    }
    Ok(WfcOutcome {
        assignment,
        backtracks,
        fallbacks,
    })
}

/// Unresolved variable with the fewest candidates; lowest index on ties.
fn min_entropy(domains: &[Vec<BiomeType>], assigned: &[Option<BiomeType>]) -> Option<usize> {
    (0..domains.len())
        .filter(|&i| assigned[i].is_none())
        .min_by_key(|&i| (domains[i].len(), i))
}

/// AC-3 from the `changed` variables. `Err` carries the variable whose domain emptied.
fn propagate(
    problem: &WfcProblem<'_>,
    domains: &mut [Vec<BiomeType>],
    changed: &[usize],
) -> Result<(), usize> {
    let mut queue: VecDeque<usize> = changed.iter().copied().collect();
    while let Some(x) = queue.pop_front() {
        for &y in &problem.neighbors[x] {
            let support = domains[x].clone();
            let before = domains[y].len();
            domains[y].retain(|c| support.iter().any(|s| (problem.compatible)(*c, *s)));
            if domains[y].is_empty() {
                return Err(y);
            }
            if domains[y].len() != before {
                queue.push_back(y);
            }
        }
    }
    Ok(())
}

/// Candidate order for a choice point: weighted sampling without replacement.
fn weighted_order(
    problem: &WfcProblem<'_>,
    domain: &[BiomeType],
    node: usize,
    assigned: &[Option<BiomeType>],
    rng: &mut dyn RngCore,
) -> Vec<BiomeType> {
    let mut pool: Vec<(BiomeType, f32)> = domain
        .iter()
        .map(|c| (*c, candidate_weight(problem, *c, node, assigned)))
        .collect();
    let mut order = Vec::with_capacity(pool.len());
    while !pool.is_empty() {
        let total: f32 = pool.iter().map(|(_, w)| w).sum();
        let mut pick = pool.len() - 1;
        if total > 0.0 {
            let mut roll = rng.random_range(0.0..total);
            for (i, (_, w)) in pool.iter().enumerate() {
                if roll < *w {
                    pick = i;
                    break;
                }
                roll -= w;
            }
        } else {
            pick = 0;
        }
        order.push(pool.remove(pick).0);
    }
    order
}

/// Easier biomes and ones agreeing with resolved neighbours weigh more.
fn candidate_weight(
    problem: &WfcProblem<'_>,
    candidate: BiomeType,
    node: usize,
    assigned: &[Option<BiomeType>],
) -> f32 {
    let agreeing = problem.neighbors[node]
        .iter()
        .filter_map(|&n| assigned[n])
        .filter(|n| !n.is_neutral() && (problem.compatible)(candidate, *n))
        .count();
    let mut weight = (1.0 + agreeing as f32) / candidate.base_difficulty().max(Biome::MIN_DIFFICULTY);
    if candidate.is_neutral() {
        weight *= NEUTRAL_WEIGHT;
    }
    weight
}

fn least_conflict(problem: &WfcProblem<'_>, node: usize, assigned: &[Option<BiomeType>]) -> BiomeType {
    let conflicts = |c: BiomeType| {
        problem.neighbors[node]
            .iter()
            .filter_map(|&n| assigned[n])
            .filter(|n| !(problem.compatible)(c, *n))
            .count()
    };
    problem.domains[node]
        .iter()
        .copied()
        .min_by_key(|c| conflicts(*c))
        .unwrap_or(BiomeType::TransitionZone)
}
