use petri_cover_lib::{
    config::{CoverabilityConfig, PruningPolicy},
    coverability::CoverabilityTree,
    net::PetriNet,
};
use rand::prelude::*;

const PLACES: usize = 3;
const TRANSITIONS: usize = 3;
const NETS: u64 = 200;

fn random_net(rng: &mut StdRng) -> PetriNet {
    let places = (0..PLACES)
        .map(|p| (format!("p{}", p), rng.random_range(0..3u32)))
        .collect::<Vec<_>>();
    let transitions = (0..TRANSITIONS)
        .map(|t| format!("t{}", t))
        .collect::<Vec<_>>();

    let mut rules = vec![];
    for (place, _) in &places {
        let consumers = transitions
            .iter()
            .filter_map(|t| match rng.random_range(0..3u32) {
                0 => None,
                w => Some(format!("{}*{}", w, t)),
            })
            .collect::<Vec<_>>();
        if !consumers.is_empty() {
            rules.push(format!("{} -> {}", place, consumers.join(" ")));
        }
    }
    for t in &transitions {
        let produced = places
            .iter()
            .filter_map(|(p, _)| match rng.random_range(0..3u32) {
                0 => None,
                w => Some(format!("{}*{}", w, p)),
            })
            .collect::<Vec<_>>();
        if !produced.is_empty() {
            rules.push(format!("{} -> {}", t, produced.join(" ")));
        }
    }

    PetriNet::new("random", places, transitions, rules).unwrap()
}

fn random_sequence(rng: &mut StdRng, net: &PetriNet) -> Vec<String> {
    let len = rng.random_range(0..8);
    (0..len)
        .map(|_| {
            let t = rng.random_range(0..net.transition_count());
            net.transition_names().nth(t).unwrap().to_string()
        })
        .collect()
}

fn build(net: &PetriNet, pruning: PruningPolicy) -> CoverabilityTree {
    let config = CoverabilityConfig::default()
        .with_pruning(pruning)
        .with_max_nodes(Some(100_000));
    net.build_coverability_tree(net.initial_marking(), config)
        .unwrap()
}

#[test]
fn random_nets_terminate_and_cover_reachable_markings() {
    for seed in 0..NETS {
        let mut rng = StdRng::seed_from_u64(seed);
        let net = random_net(&mut rng);

        for pruning in [PruningPolicy::AncestorOnly, PruningPolicy::GlobalSeen] {
            let tree = build(&net, pruning);

            for (_, node) in tree.iter() {
                if let Some(parent) = node.parent() {
                    for p in tree.node(parent).marking().infinite_places() {
                        assert!(node.marking().get(p).is_infinite(), "seed {}", seed);
                    }
                }
            }

            for _ in 0..20 {
                let sequence = random_sequence(&mut rng, &net);
                let outcome = net
                    .engine()
                    .fire_sequence(net.initial_marking(), &sequence)
                    .unwrap();
                assert!(
                    tree.covers(&outcome.marking),
                    "seed {}: {} not covered",
                    seed,
                    outcome.marking
                );
            }
        }
    }
}

#[test]
fn random_nets_build_the_same_tree_twice() {
    for seed in 0..NETS {
        let mut rng = StdRng::seed_from_u64(seed);
        let net = random_net(&mut rng);

        let first = build(&net, PruningPolicy::AncestorOnly);
        let second = build(&net, PruningPolicy::AncestorOnly);
        assert_eq!(first.nodes(), second.nodes(), "seed {}", seed);
    }
}

#[test]
fn failed_sequence_ends_after_applied_prefix() {
    for seed in 0..NETS {
        let mut rng = StdRng::seed_from_u64(seed);
        let net = random_net(&mut rng);
        let engine = net.engine();

        for _ in 0..20 {
            let sequence = random_sequence(&mut rng, &net);
            let outcome = engine
                .fire_sequence(net.initial_marking(), &sequence)
                .unwrap();

            let replay = engine
                .fire_sequence(net.initial_marking(), &outcome.applied)
                .unwrap();
            assert!(replay.is_success());
            assert_eq!(replay.marking, outcome.marking, "seed {}", seed);
            assert!(outcome.applied.len() <= sequence.len());
            if outcome.is_success() {
                assert_eq!(outcome.applied, sequence);
            }
        }
    }
}
