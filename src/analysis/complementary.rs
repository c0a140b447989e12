//! Complementary grouping
//!
//! Groups a hub habit with every habit it has a qualifying complementary
//! relation to. The hub is mandatory; its partners are optional add-ons.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use super::{chain_id, input_reference_time};
use crate::config::AnalysisConfig;
use crate::model::{Habit, HabitChain, HabitRelation, RelationType};

/// Discover complementary chains with default thresholds
pub fn discover_complementary_chains(
    habits: &[Habit],
    relations: &[HabitRelation],
) -> Vec<HabitChain> {
    discover_complementary_chains_with(
        habits,
        relations,
        &AnalysisConfig::default(),
        input_reference_time(habits, &[]),
    )
}

/// Discover complementary chains
///
/// Hubs are emitted in order of their first qualifying relation; partners in
/// relation order, deduplicated.
pub fn discover_complementary_chains_with(
    habits: &[Habit],
    relations: &[HabitRelation],
    config: &AnalysisConfig,
    created_at: DateTime<Utc>,
) -> Vec<HabitChain> {
    let roster: HashSet<&str> = habits.iter().map(|h| h.id.as_str()).collect();
    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();

    for relation in relations
        .iter()
        .filter(|r| r.qualifies(RelationType::Complementary, config.chain_min_confidence))
    {
        let source = relation.source_habit_id.as_str();
        let target = relation.target_habit_id.as_str();
        if !roster.contains(source) || !roster.contains(target) {
            tracing::warn!(
                source = %source,
                target = %target,
                "Skipping complementary relation with unknown habit"
            );
            continue;
        }
        if source == target {
            continue;
        }

        match groups.iter().position(|(hub, _)| *hub == source) {
            Some(pos) => {
                let partners = &mut groups[pos].1;
                if !partners.contains(&target) {
                    partners.push(target);
                }
            }
            None => groups.push((source, vec![target])),
        }
    }

    groups
        .into_iter()
        .filter(|(_, partners)| partners.len() >= 2 && partners.len() + 1 >= config.min_chain_length)
        .filter_map(|(hub, partners)| build_chain(habits, hub, &partners, created_at))
        .collect()
}

fn build_chain(
    habits: &[Habit],
    hub: &str,
    partners: &[&str],
    created_at: DateTime<Utc>,
) -> Option<HabitChain> {
    let hub_habit = habits.iter().find(|h| h.id == hub)?;
    let partner_names: Vec<&str> = partners
        .iter()
        .filter_map(|id| habits.iter().find(|h| h.id == *id).map(|h| h.name.as_str()))
        .collect();

    let mut ids = Vec::with_capacity(partners.len() + 1);
    ids.push(hub);
    ids.extend_from_slice(partners);

    let mut chain = HabitChain::new(
        format!("{} bundle", hub_habit.name),
        hub_habit.frequency.clone(),
    )
    .id(chain_id(RelationType::Complementary, &ids))
    .description(format!(
        "Pair {} with {}",
        hub_habit.name,
        partner_names.join(", ")
    ))
    .created_at(created_at)
    .with_habit(hub, false);

    for partner in partners {
        chain = chain.with_habit(*partner, true);
    }

    tracing::debug!(hub = %hub, partners = partners.len(), "Built complementary chain");
    Some(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FrequencyRule, RelationStrength};
    use chrono::NaiveDate;

    fn habits(ids: &[&str]) -> Vec<Habit> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ids.iter()
            .map(|id| Habit::new(*id, id.to_uppercase(), FrequencyRule::daily(), start))
            .collect()
    }

    fn complementary(source: &str, target: &str, confidence: f64) -> HabitRelation {
        HabitRelation {
            source_habit_id: source.to_string(),
            target_habit_id: target.to_string(),
            relation_type: RelationType::Complementary,
            strength: RelationStrength::Medium,
            confidence,
            description: String::new(),
        }
    }

    fn discover(habits: &[Habit], relations: &[HabitRelation]) -> Vec<HabitChain> {
        discover_complementary_chains_with(habits, relations, &AnalysisConfig::default(), Utc::now())
    }

    #[test]
    fn test_hub_with_two_partners() {
        let roster = habits(&["yoga", "tea", "read"]);
        let relations = vec![
            complementary("yoga", "tea", 0.7),
            complementary("yoga", "read", 0.6),
            complementary("yoga", "tea", 0.8), // duplicate partner
        ];

        let chains = discover(&roster, &relations);
        assert_eq!(chains.len(), 1);

        let chain = &chains[0];
        assert_eq!(chain.habit_ids(), vec!["yoga", "tea", "read"]);
        assert!(!chain.habits[0].is_optional);
        assert!(chain.habits[1].is_optional && chain.habits[2].is_optional);
        assert_eq!(chain.name, "YOGA bundle");
        assert!(chain.validate().is_ok());
    }

    #[test]
    fn test_single_partner_not_emitted() {
        let roster = habits(&["yoga", "tea"]);
        let relations = vec![complementary("yoga", "tea", 0.9)];
        assert!(discover(&roster, &relations).is_empty());
    }

    #[test]
    fn test_non_qualifying_relations_ignored() {
        let roster = habits(&["yoga", "tea", "read", "walk"]);
        let mut weak = complementary("yoga", "walk", 0.9);
        weak.strength = RelationStrength::Weak;
        let relations = vec![
            complementary("yoga", "tea", 0.9),
            complementary("yoga", "read", 0.4),
            weak,
            complementary("yoga", "ghost", 0.9),
        ];

        assert!(discover(&roster, &relations).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(discover(&[], &[]).is_empty());
    }
}
