use smti::encode::{EncodingFormat, encode};
use smti::io::{TextStyle, format_instance, read_instance};
use smti::{
    AgentId, GeneratorConfig, Instance, ModelConfig, ModelError, PreprocessMode,
    StabilityFormulation, StabilityModel, preprocess,
};
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

fn random_instances() -> Vec<Instance> {
    (0..6)
        .map(|seed| Instance::random(&GeneratorConfig::new(6, 3, 0.4).with_seed(seed)))
        .collect()
}

fn max_size(instance: &Instance, formulation: StabilityFormulation) -> usize {
    let mut model = StabilityModel::new(instance, ModelConfig::new(formulation));
    let matching = model.solve().expect("solver failed");
    assert!(
        instance.is_stable(&matching),
        "blocking pairs {:?} in {}",
        instance.blocking_pairs(&matching),
        matching
    );
    matching.len()
}

#[test]
fn test_formulations_agree_on_random_instances() {
    for instance in random_instances() {
        let single = max_size(&instance, StabilityFormulation::Single);
        let merged = max_size(&instance, StabilityFormulation::Merged);
        assert_eq!(single, merged, "formulations disagree on\n{}", instance);
    }
}

#[test]
fn test_preprocessing_keeps_optimum() {
    for instance in random_instances() {
        let before = max_size(&instance, StabilityFormulation::Merged);
        for mode in [PreprocessMode::Quick, PreprocessMode::Complete] {
            let mut reduced = instance.clone();
            let report = preprocess(&mut reduced, mode);
            assert!(reduced.num_pairs() <= instance.num_pairs());
            assert_eq!(instance.num_pairs() - reduced.num_pairs(), report.removed());
            assert_eq!(
                max_size(&reduced, StabilityFormulation::Merged),
                before,
                "{} preprocessing changed the optimum of\n{}",
                mode,
                instance
            );
        }
    }
}

/// Optimum size on `instance` after `restrict` adds force/avoid rows
fn restricted_size<F>(instance: &Instance, restrict: F) -> usize
where
    F: FnOnce(&mut StabilityModel<'_>) -> Result<(), ModelError>,
{
    let mut model = StabilityModel::new(instance, ModelConfig::default());
    restrict(&mut model).expect("pairs come from the instance");
    model.solve().expect("solver failed").len()
}

fn pairs(instance: &Instance) -> BTreeSet<(AgentId, AgentId)> {
    instance
        .left()
        .iter()
        .flat_map(|(&l, agent)| agent.prefs().iter().map(move |&r| (l, r)))
        .collect()
}

#[test]
fn test_removed_pairs_are_in_no_maximum_matching() {
    for instance in random_instances() {
        let before = max_size(&instance, StabilityFormulation::Merged);
        for mode in [PreprocessMode::Quick, PreprocessMode::Complete] {
            let mut reduced = instance.clone();
            preprocess(&mut reduced, mode);
            let kept = pairs(&reduced);
            for (l, r) in pairs(&instance).difference(&kept) {
                let forced = restricted_size(&instance, |model| model.force(&[(*l, *r)]));
                assert!(
                    forced < before,
                    "{} preprocessing removed ({}, {}) from a maximum matching of\n{}",
                    mode,
                    l,
                    r,
                    instance
                );
            }
        }
    }
}

#[test]
fn test_must_allocate_agents_are_always_matched() {
    for instance in random_instances() {
        let before = max_size(&instance, StabilityFormulation::Merged);
        let mut reduced = instance.clone();
        let report = preprocess(&mut reduced, PreprocessMode::Complete);

        for &l in &report.must_allocate_left {
            let partners: Vec<(AgentId, AgentId)> = instance
                .agent_left(l)
                .map(|agent| agent.prefs().iter().map(|&r| (l, r)).collect())
                .unwrap_or_default();
            let without = restricted_size(&instance, |model| model.avoid(&partners));
            assert!(without < before, "left {} can stay unmatched in\n{}", l, instance);
        }
        for &r in &report.must_allocate_right {
            let partners: Vec<(AgentId, AgentId)> = instance
                .agent_right(r)
                .map(|agent| agent.prefs().iter().map(|&l| (l, r)).collect())
                .unwrap_or_default();
            let without = restricted_size(&instance, |model| model.avoid(&partners));
            assert!(without < before, "right {} can stay unmatched in\n{}", r, instance);
        }
    }
}

#[test]
fn test_preprocessing_is_idempotent() {
    for instance in random_instances() {
        let mut once = instance.clone();
        preprocess(&mut once, PreprocessMode::Complete);
        let mut twice = once.clone();
        let report = preprocess(&mut twice, PreprocessMode::Complete);
        assert_eq!(report.removed(), 0);
        assert_eq!(once, twice);
    }
}

#[test]
fn test_enumerated_matchings_are_distinct_and_stable() {
    let instance = Instance::random(&GeneratorConfig::new(5, 3, 0.6).with_seed(42));
    let mut model = StabilityModel::new(&instance, ModelConfig::default());
    let all = model.find_all_stable_matchings().unwrap();
    assert!(!all.is_empty());
    for (i, matching) in all.iter().enumerate() {
        assert!(instance.is_stable(matching));
        assert!(all[i + 1..].iter().all(|other| other != matching));
    }
    // One extra solve finds nothing
    assert_eq!(model.statistics().solves, all.len() + 1);
    // Sizes come out largest first
    assert!(all.windows(2).all(|pair| pair[0].len() >= pair[1].len()));
}

#[test]
fn test_dummies_round_trip_after_solving() {
    let original = Instance::random(&GeneratorConfig::new(7, 4, 0.5).with_seed(9));
    let mut instance = original.clone();
    instance.add_dummy(2);
    assert_eq!(instance.num_left(), 9);
    {
        let mut model = StabilityModel::new(&instance, ModelConfig::default());
        let matching = model.solve().unwrap();
        assert!(instance.is_stable(&matching));
    }
    instance.remove_dummy(2).unwrap();
    assert_eq!(instance, original);
}

#[test]
fn test_snapshot_file_round_trip() {
    let dir = TempDir::new().unwrap();
    for (i, instance) in random_instances().into_iter().enumerate() {
        let path = dir.path().join(format!("instance_{}.txt", i));
        fs::write(&path, format_instance(&instance, &TextStyle::standard())).unwrap();
        assert_eq!(read_instance(&path).unwrap(), instance);
    }
}

#[test]
fn test_sat_variable_count_matches_lists() {
    for instance in random_instances() {
        let expected: usize = instance
            .left()
            .values()
            .chain(instance.right().values())
            .map(|agent| agent.len() + 1)
            .sum();
        let text = encode(&instance, EncodingFormat::Sat).unwrap();
        let header: Vec<&str> = text.lines().next().unwrap().split(' ').collect();
        assert_eq!(header[2].parse::<usize>().unwrap(), expected);
        assert_eq!(header[3].parse::<usize>().unwrap(), text.lines().count() - 1);
    }
}
