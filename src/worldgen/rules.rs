use rand::Rng;
use rand::RngCore;
use rand::seq::SliceRandom;

use crate::error::GenError;
use crate::model::{
    Ability, ConnectionType, GateCondition, GateSoftness, GenStage, Polarity, RandomizationMode,
    StageReport, WorldGraph, WorldRuleSet,
};
use crate::seed::stage_rng;

const MIN_POLARITIES: usize = 2;
const MAX_POLARITIES: usize = 6;
const MIN_EXTRA_UPGRADES: usize = 2;
const MAX_EXTRA_UPGRADES: usize = 5;

/// Derive the world rule set from the root seed, then gate the destination of every
/// conditional connection.
pub fn randomize_rules(graph: &mut WorldGraph) -> Result<Option<StageReport>, GenError> {
    if graph.begin_stage(GenStage::RuleRandomization)? {
        return Ok(None);
    }

    let seed = graph.config.seed;
    let mut rng = stage_rng(seed, "rules");
    let rules = derive_rules(graph.config.randomization_mode, &mut rng);

    let mut gate_rng = stage_rng(seed, "gates");
    let gated: Vec<(u32, Polarity)> = graph
        .adjacency
        .values()
        .flatten()
        .filter(|c| c.connection_type == ConnectionType::ConditionalGate)
        .map(|c| (c.to_node_id, c.required_polarity))
        .collect();
    for (node, polarity) in gated {
        if graph.gates.contains_key(&node) {
            continue;
        }
        let gate = derive_gate(polarity, rules.available_upgrades, &mut gate_rng);
        graph.gates.insert(node, gate);
    }

    tracing::debug!(
        mode = ?rules.mode,
        polarities = ?rules.biome_polarity_mask,
        upgrades = ?rules.available_upgrades,
        "world rules derived"
    );
    graph.rules = Some(rules);
    Ok(Some(graph.finish_stage(StageReport::new(
        GenStage::RuleRandomization,
        graph.gates.len(),
        0,
    ))))
}

pub fn derive_rules(mode: RandomizationMode, rng: &mut dyn RngCore) -> WorldRuleSet {
    let mut rules = WorldRuleSet::authored(mode);
    if matches!(mode, RandomizationMode::Partial | RandomizationMode::Full) {
        let mut singles = Polarity::SINGLES;
        singles.shuffle(rng);
        let count = rng.random_range(MIN_POLARITIES..=MAX_POLARITIES);
        rules.biome_polarity_mask = singles[..count]
            .iter()
            .fold(Polarity::NONE, |mask, p| mask | *p);
    }
    if mode == RandomizationMode::Full {
        let mut extras: Vec<Ability> = Ability::SINGLES
            .iter()
            .copied()
            .filter(|a| *a != Ability::JUMP)
            .collect();
        extras.shuffle(rng);
        let count = rng.random_range(MIN_EXTRA_UPGRADES..=MAX_EXTRA_UPGRADES);
        rules.available_upgrades = extras[..count]
            .iter()
            .fold(Ability::JUMP, |mask, a| mask | *a);
        rules.upgrades_randomized = true;
    }
    rules
}

fn derive_gate(polarity: Polarity, available: Ability, rng: &mut dyn RngCore) -> GateCondition {
    let choices: Vec<Ability> = (available - Ability::JUMP).iter().collect();
    let required = if choices.is_empty() {
        Ability::empty()
    } else {
        choices[rng.random_range(0..choices.len())]
    };
    let softness = GateSoftness::ALL[rng.random_range(0..GateSoftness::ALL.len())];
    GateCondition::new(polarity, required, softness)
}
