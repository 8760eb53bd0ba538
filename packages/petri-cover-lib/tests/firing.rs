use petri_cover_lib::{
    error::PetriError,
    net::{
        PetriNet,
        marking::{Marking, TokenCount::{self, Finite, Infinite}},
    },
};

fn example_net() -> PetriNet {
    PetriNet::new(
        "Petri1",
        [("P1", 0), ("P2", 0), ("P3", 0), ("P4", 0)],
        ["T1", "T2", "T3", "T4"],
        [
            "T1 -> P1",
            "P1 -> T2 T4",
            "T2 -> 2*P1 P2",
            "P2 -> T3 T4",
            "T4 -> P3 P4",
        ],
    )
    .unwrap()
}

#[test]
fn sequence_succeeds() {
    let net = example_net();
    let outcome = net
        .engine()
        .fire_sequence(net.initial_marking(), &["T1", "T2", "T2", "T2"])
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.marking, Marking::from(vec![4, 3, 0, 0]));
    assert_eq!(outcome.applied, vec!["T1", "T2", "T2", "T2"]);
}

#[test]
fn first_transition_disabled() {
    let net = example_net();
    let outcome = net
        .engine()
        .fire_sequence(net.initial_marking(), &["T2"])
        .unwrap();

    assert!(outcome.is_failure());
    assert_eq!(outcome.marking, Marking::zero(4));
    assert!(outcome.applied.is_empty());
}

#[test]
fn sequence_stops_at_disabled_transition() {
    let net = example_net();
    let outcome = net
        .engine()
        .fire_sequence(net.initial_marking(), &["T1", "T2", "T3", "T4"])
        .unwrap();

    assert!(outcome.is_failure());
    assert_eq!(outcome.marking, Marking::from(vec![2, 0, 0, 0]));
    assert_eq!(outcome.applied, vec!["T1", "T2", "T3"]);
}

#[test]
fn unknown_transition_has_no_effect() {
    let mut net = example_net();
    net.fire("T1").unwrap();

    assert_eq!(
        net.fire_sequence(&["T2", "T9"]),
        Err(PetriError::unknown("T9"))
    );
    assert_eq!(net.marking(), &Marking::from(vec![1, 0, 0, 0]));
    assert_eq!(net.fire("T9"), Err(PetriError::unknown("T9")));
    assert_eq!(net.is_enabled("T9"), Err(PetriError::unknown("T9")));
}

#[test]
fn net_continues_from_current_marking() {
    let mut net = example_net();

    let first = net.fire_sequence(&["T1", "T2"]).unwrap();
    assert!(first.is_success());

    let second = net.fire_sequence(&["T3", "T3"]).unwrap();
    assert!(second.is_failure());
    assert_eq!(second.applied, vec!["T3"]);
    assert_eq!(net.marking(), &Marking::from(vec![2, 0, 0, 0]));

    // the initial marking is not touched by firing
    assert_eq!(net.initial_marking(), &Marking::zero(4));
    net.reset();
    assert_eq!(net.marking(), net.initial_marking());
}

#[test]
fn failed_firing_is_atomic() {
    let mut net = example_net();
    net.set_marking(vec![2, 0, 0, 0].into()).unwrap();

    // T4 could take its token from P1, but P2 is empty
    assert!(!net.is_enabled("T4").unwrap());
    assert_eq!(
        net.fire("T4"),
        Err(PetriError::InsufficientTokens {
            transition: "T4".to_string(),
            place: "P2".to_string(),
            required: 1,
            available: 0,
        })
    );
    assert_eq!(net.marking(), &Marking::from(vec![2, 0, 0, 0]));
}

#[test]
fn weighted_arcs() {
    let mut net = PetriNet::new(
        "weights",
        [("A", 3), ("B", 0)],
        ["t"],
        ["A -> t t", "t -> 3*B"],
    )
    .unwrap();

    net.fire("t").unwrap();
    assert_eq!(net.marking(), &Marking::from(vec![1, 3]));
    assert!(!net.is_enabled("t").unwrap());
}

#[test]
fn omega_places_stay_omega() {
    let net = example_net();
    let engine = net.engine();
    let start = Marking::from(vec![Infinite, Finite(0), Finite(0), Finite(0)]);

    let outcome = engine.fire_sequence(&start, &["T2", "T4", "T1"]).unwrap();
    assert!(outcome.is_success());
    assert_eq!(
        outcome.marking,
        Marking::from(vec![Infinite, Finite(0), Finite(1), Finite(1)])
    );

    let enabled = engine.enabled_transitions(&start).collect::<Vec<_>>();
    let names = enabled
        .iter()
        .map(|t| net.transition_name(*t))
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["T1", "T2"]);
}

#[test]
fn overflow_is_an_error() {
    let mut net = PetriNet::new("overflow", [("P1", u32::MAX)], ["T1"], ["T1 -> P1"]).unwrap();

    assert_eq!(
        net.fire("T1"),
        Err(PetriError::TokenOverflow {
            transition: "T1".to_string(),
            place: "P1".to_string(),
        })
    );
    assert_eq!(net.tokens("P1").unwrap(), TokenCount::Finite(u32::MAX));
}

#[test]
fn marking_dimension_is_checked() {
    let net = example_net();
    let engine = net.engine();

    assert_eq!(
        engine.fire_by_name(&Marking::from(vec![1, 1]), "T1"),
        Err(PetriError::MarkingDimensionMismatch {
            expected: 4,
            actual: 2
        })
    );
    assert!(engine.fire_sequence(&Marking::zero(5), &["T1"]).is_err());
}

#[test]
#[should_panic(expected = "Marking dimension does not match the net")]
fn enabled_check_needs_full_marking() {
    let net = example_net();
    let t1 = net.transition_id("T1").unwrap();
    net.engine().is_enabled(&Marking::zero(1), t1);
}

#[test]
#[should_panic(expected = "Marking dimension does not match the net")]
fn enabled_transitions_need_full_marking() {
    let net = example_net();
    let marking = Marking::zero(6);
    let _ = net.engine().enabled_transitions(&marking).count();
}
