// tests/species_growth.rs
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use glam::IVec3;
use symbios_plantpack::{
    Axion, BlockGeneration, GRAND_MAPLE_ID, Grammar, MAPLE_ID, MapleProfile, ReplacementRule,
    TreeBlock, TreeBlockKind, TreeDefinition, TreeError, TreeStructure, WEIGHT_TOLERANCE,
    grand_maple, maple,
};

fn turn_angles(axion: &Axion) -> Vec<i32> {
    axion
        .elements()
        .filter(|e| e.symbol == '+')
        .map(|e| e.parameter.unwrap().parse().unwrap())
        .collect()
}

#[test]
fn test_species_build() {
    assert_eq!(maple().unwrap().id(), MAPLE_ID);
    assert_eq!(grand_maple().unwrap().id(), GRAND_MAPLE_ID);
    assert_eq!(maple().unwrap().seed().as_str(), "g");
    assert_eq!(maple().unwrap().growth_rate(), 1.5);
}

#[test]
fn test_species_weights_stay_within_unit_mass() {
    for profile in [MapleProfile::maple(), MapleProfile::grand_maple()] {
        for (symbol, rule) in profile.grammar().rules() {
            let total = rule.total_weight();
            assert!(
                total <= 1.0 + WEIGHT_TOLERANCE,
                "{} rule '{symbol}' weighs {total}",
                profile.id
            );
        }
    }
}

#[test]
fn test_species_axions_are_branch_balanced() {
    for definition in [maple().unwrap(), grand_maple().unwrap()] {
        for plant_seed in 0..40 {
            for generations in [0, 1, 3, 7, 12] {
                let axion = definition.grow_axion(plant_seed, generations);
                assert_eq!(axion.count('['), axion.count(']'));
                assert!(axion.branch_balance().is_ok(), "{axion}");
            }
        }
    }
}

#[test]
fn test_trunk_forces_two_branches() {
    let definition = maple().unwrap();

    for plant_seed in 0..200 {
        assert_eq!(definition.grow_axion(plant_seed, 1).as_str(), "Tt");
        // The first trunk-tip rewrite always branches, whichever
        // alternative is drawn, and so does the second.
        assert_eq!(definition.grow_axion(plant_seed, 2).count('b'), 1);
        for generations in 3..=8 {
            let axion = definition.grow_axion(plant_seed, generations);
            assert!(axion.count('b') >= 2, "seed {plant_seed}: {axion}");
            // One junction per trunk-tip rewrite.
            assert_eq!(axion.count('W') as u32, generations - 1);
        }
    }
}

#[test]
fn test_branch_angles_match_species() {
    let cases: [(TreeDefinition, RangeInclusive<i32>); 2] =
        [(maple().unwrap(), 125..=152), (grand_maple().unwrap(), 105..=172)];

    for (definition, range) in cases {
        for plant_seed in 0..30 {
            let axion = definition.grow_axion(plant_seed, 10);
            for angle in turn_angles(&axion) {
                assert!(range.contains(&angle), "{} turned {angle}", definition.id());
            }
        }
    }
}

fn assert_full_tree(structure: &TreeStructure) {
    assert!(structure.count_kind(TreeBlockKind::Trunk) >= 1);
    assert!(structure.count_kind(TreeBlockKind::Branch) >= 1);
    assert!(structure.count_kind(TreeBlockKind::Foliage) >= 20);
    assert_eq!(structure.count_kind(TreeBlockKind::Sapling), 0);
}

#[test]
fn test_maple_five_generations_end_to_end() {
    let definition = maple().unwrap();

    for plant_seed in 0..20 {
        let structure = definition.build_structure(plant_seed, 5).unwrap();
        assert_full_tree(&structure);
        assert_eq!(
            structure.get(IVec3::ZERO).map(|b| b.uri.as_str()),
            Some("PlantPack:MapleTrunk")
        );

        // Trunk leaf balls (r = 2 around the axis) never reach x² + z² > 4,
        // so leaves out there belong to a branch tip's half-ball.
        let branch_leaves = structure
            .iter()
            .filter(|(pos, b)| {
                b.kind == TreeBlockKind::Foliage && pos.x * pos.x + pos.z * pos.z > 4
            })
            .count();
        assert!(branch_leaves > 0, "seed {plant_seed}: no leaves around a branch tip");
    }
}

#[test]
fn test_grand_maple_grows_a_full_tree() {
    let definition = grand_maple().unwrap();

    for plant_seed in 0..10 {
        let structure = definition.build_structure(plant_seed, 10).unwrap();
        assert_full_tree(&structure);
        assert!(
            structure
                .iter()
                .all(|(_, b)| b.uri.starts_with("PlantPack:GrandMaple"))
        );
    }
}

#[test]
fn test_structure_survives_json() {
    let structure = maple().unwrap().build_structure(1, 3).unwrap();

    let json = serde_json::to_string(&structure).unwrap();
    let restored: TreeStructure = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, structure);
    // Sorted output keeps saved trees diffable.
    assert_eq!(json, serde_json::to_string(&restored).unwrap());
}

#[test]
fn test_sapling_stage_is_a_single_block() {
    let structure = maple().unwrap().build_structure(11, 0).unwrap();

    assert_eq!(structure.len(), 1);
    assert_eq!(
        structure.get(IVec3::ZERO),
        Some(&TreeBlock::sapling("PlantPack:MapleSaplingGenerated"))
    );
}

#[test]
fn test_sapling_lookup() {
    let definition = maple().unwrap();
    assert_eq!(definition.sapling_symbol("PlantPack:MapleSapling"), Some('s'));
    assert_eq!(
        definition.sapling_symbol("PlantPack:MapleSaplingGenerated"),
        Some('g')
    );
    assert_eq!(definition.sapling_symbol("PlantPack:MapleTrunk"), None);
    assert!(definition.is_tree_block("PlantPack:MapleLeaf"));
    assert!(!definition.is_tree_block("PlantPack:MapleSapling"));
}

#[test]
fn test_missing_block_rule_is_rejected() {
    let grammar = Grammar::new().with_rule('g', ReplacementRule::new().with_fixed(1.0, "TQ"));
    let blocks = BTreeMap::from([
        (
            'g',
            BlockGeneration::default_block(TreeBlock::sapling("Test:Sapling"), 1.0),
        ),
        (
            'T',
            BlockGeneration::default_block(TreeBlock::trunk("Test:Trunk"), 1.0),
        ),
    ]);

    let err = TreeDefinition::new("Test:tree", "g", grammar, blocks, Vec::new(), 1.0).unwrap_err();
    assert_eq!(err, TreeError::MissingBlockRule { symbol: 'Q' });
}

#[test]
fn test_inert_seed_is_rejected() {
    let blocks = BTreeMap::from([(
        'T',
        BlockGeneration::default_block(TreeBlock::trunk("Test:Trunk"), 1.0),
    )]);

    let err = TreeDefinition::new("Test:tree", "T", Grammar::new(), blocks, Vec::new(), 1.0)
        .unwrap_err();
    assert!(matches!(err, TreeError::InertSeed { .. }));
}

#[test]
fn test_definitions_are_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TreeDefinition>();

    let definition = maple().unwrap();
    let expected: Vec<TreeStructure> = (0..8)
        .map(|seed| definition.build_structure(seed, 9).unwrap())
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8u64)
            .map(|seed| {
                let definition = &definition;
                scope.spawn(move || definition.build_structure(seed, 9).unwrap())
            })
            .collect();

        for (handle, expected) in handles.into_iter().zip(&expected) {
            assert_eq!(&handle.join().unwrap(), expected);
        }
    });
}
