use petri_cover_lib::{
    error::PetriError,
    net::{
        PetriNet,
        definition::NetDefinition,
        entity::{Entity, EntityRef},
        marking::{Marking, TokenCount},
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
fn parse_worked_example() {
    let net = example_net();
    let p = |name| net.place_id(name).unwrap();
    let t = |name| net.arcs(net.transition_id(name).unwrap());

    assert!(t("T1").consumes().is_empty());
    assert_eq!(t("T1").produces(), &[(1, p("P1"))]);

    assert_eq!(t("T2").consumes(), &[(1, p("P1"))]);
    assert_eq!(t("T2").produces(), &[(2, p("P1")), (1, p("P2"))]);

    assert_eq!(t("T3").consumes(), &[(1, p("P2"))]);
    assert!(t("T3").produces().is_empty());

    assert_eq!(t("T4").consumes(), &[(1, p("P1")), (1, p("P2"))]);
    assert_eq!(t("T4").produces(), &[(1, p("P3")), (1, p("P4"))]);
}

#[test]
fn multiplicity_is_one_weighted_arc() {
    let net = PetriNet::new(
        "weights",
        [("P1", 0), ("P2", 0)],
        ["T1"],
        ["T1 -> 2*P1 P1 3 * P2", "P2 -> T1 T1"],
    )
    .unwrap();
    let arcs = net.arcs(net.transition_id("T1").unwrap());
    let p1 = net.place_id("P1").unwrap();
    let p2 = net.place_id("P2").unwrap();

    assert_eq!(arcs.produces(), &[(3, p1), (3, p2)]);
    assert_eq!(arcs.consumes(), &[(2, p2)]);
    assert_eq!(arcs.effect(p2), 1);
}

#[test]
fn rules_as_one_block() {
    let block = r#"
        # same rules as the worked example
        T1 -> P1
        P1 -> T2 T4
        T2 -> 2*P1 P2

        P2 -> T3 T4
        T4 -> P3 P4
    "#;
    let net = PetriNet::new(
        "Petri1",
        [("P1", 0), ("P2", 0), ("P3", 0), ("P4", 0)],
        ["T1", "T2", "T3", "T4"],
        [block],
    )
    .unwrap();

    assert_eq!(net.rules().len(), 5);
    for (a, b) in net.iter_transitions().zip(example_net().iter_transitions()) {
        assert_eq!(a, b);
    }
}

#[test]
fn malformed_rule_aborts_construction() {
    let res = PetriNet::new("bad", [("P1", 0)], ["T1"], ["T1 -> P1", "T1 => P1"]);
    assert!(matches!(res, Err(PetriError::MalformedRule { line, .. }) if line == "T1 => P1"));
}

#[test]
fn unknown_entity_aborts_construction() {
    let res = PetriNet::new("bad", [("P1", 0)], ["T1"], ["T1 -> P1 P7"]);
    assert_eq!(res, Err(PetriError::unknown("P7")));

    let res = PetriNet::new("bad", [("P1", 0)], ["T1"], ["X -> P1"]);
    assert_eq!(res, Err(PetriError::unknown("X")));
}

#[test]
fn arcs_must_connect_place_and_transition() {
    let res = PetriNet::new("bad", [("P1", 0), ("P2", 0)], ["T1"], ["P1 -> P2"]);
    assert!(matches!(res, Err(PetriError::MalformedRule { .. })));
}

#[test]
fn duplicate_names_are_rejected() {
    let res = PetriNet::new("bad", [("X", 0)], ["X"], Vec::<String>::new());
    assert_eq!(
        res,
        Err(PetriError::DuplicateName {
            name: "X".to_string()
        })
    );
}

#[test]
fn entities_keep_declaration_order() {
    let mut net = example_net();
    net.set_tokens("P2", 5u32).unwrap();

    let entities = net.entities();
    assert_eq!(entities.len(), 8);
    assert_eq!(entities[1], Entity::place("P2", 5u32));
    assert_eq!(entities[4], Entity::transition("T1"));
    assert_eq!(
        net.place_names().collect::<Vec<_>>(),
        vec!["P1", "P2", "P3", "P4"]
    );
    assert!(matches!(net.resolve("T3"), Some(EntityRef::Transition(_))));
    assert!(net.resolve("T5").is_none());
}

#[test]
fn marking_get_and_set() {
    let mut net = example_net();

    net.set_marking(vec![1, 2, 3, 4].into()).unwrap();
    assert_eq!(net.tokens("P3").unwrap(), TokenCount::Finite(3));

    net.set_tokens("P1", TokenCount::Infinite).unwrap();
    assert_eq!(net.marking().to_string(), "(Ω 2 3 4)");

    assert_eq!(
        net.set_marking(vec![1, 2].into()),
        Err(PetriError::MarkingDimensionMismatch {
            expected: 4,
            actual: 2
        })
    );
    assert_eq!(net.tokens("P9"), Err(PetriError::unknown("P9")));

    net.reset();
    assert_eq!(net.marking(), &Marking::zero(4));
}

#[test]
fn definition_json() {
    let json = r#"{
        "name": "Petri1",
        "places": [
            { "name": "P1" },
            { "name": "P2", "tokens": 2 }
        ],
        "transitions": ["T1"],
        "rules": ["P2 -> T1", "T1 -> P1"]
    }"#;

    let definition = NetDefinition::from_json(json).unwrap();
    let net = definition.clone().build().unwrap();
    assert_eq!(net.initial_marking(), &Marking::from(vec![0, 2]));

    let described = net.to_definition().unwrap();
    assert_eq!(described, definition);

    let reparsed = NetDefinition::from_json(&described.to_json().unwrap()).unwrap();
    assert_eq!(PetriNet::try_from(reparsed).unwrap(), net);
}

#[test]
fn empty_or_commented_rule_is_malformed() {
    for rule in ["", "   ", "# T1 -> P1"] {
        let res = PetriNet::new("bad", [("P1", 0)], ["T1"], ["T1 -> P1", rule]);
        assert!(
            matches!(res, Err(PetriError::MalformedRule { .. })),
            "{:?} was accepted",
            rule
        );
    }
}

#[test]
fn overflowing_multiplicity_is_malformed() {
    let res = PetriNet::new("bad", [("P1", 0)], ["T1"], ["T1 -> 4294967295*P1 P1"]);
    assert!(matches!(
        res,
        Err(PetriError::MalformedRule { line, .. }) if line == "T1 -> 4294967295*P1 P1"
    ));

    let net = PetriNet::new("max", [("P1", 0)], ["T1"], ["T1 -> 4294967295*P1"]).unwrap();
    let arcs = net.arcs(net.transition_id("T1").unwrap());
    assert_eq!(arcs.produces(), &[(u32::MAX, net.place_id("P1").unwrap())]);
}
