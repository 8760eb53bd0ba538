//! Parser for the textual arc rules of a net.
//!
//! Every rule is a single line `LHS -> RHS`. The left hand side is one place
//! or transition name, the right hand side a whitespace separated list of
//! names, each optionally prefixed with a multiplicity:
//!
//! ```text
//! T1 -> P1
//! P1 -> T2 T4
//! T2 -> 2*P1 P2
//! ```
//!
//! A transition on the left produces tokens on the listed places, a place on
//! the left is consumed by the listed transitions.
use nom::{
    Parser,
    bytes::complete::{tag, take_while1},
    character::complete::{digit1, space0, space1},
    error::{ErrorKind, ParseError},
};

use crate::{
    error::{PetriError, PetriResult},
    net::{
        entity::EntityRef,
        transition::TransitionArcs,
    },
};

fn name<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, &'a str, E> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn weight<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, u32, E> {
    let (rest, digits) = digit1(input)?;
    match digits.parse::<u32>() {
        Ok(value) => Ok((rest, value)),
        Err(_) => Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Digit))),
    }
}

// E.g., 2*P1 or 3 * P2
fn multiplier<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, u32, E> {
    let (input, value) = weight(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag("*")(input)?;
    let (input, _) = space0(input)?;
    Ok((input, value))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry<'a> {
    pub weight: u32,
    pub name: &'a str,
}

fn entry<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, RuleEntry<'a>, E> {
    let (input, weight) = nom::combinator::opt(multiplier).parse(input)?;
    let (input, name) = name(input)?;

    Ok((
        input,
        RuleEntry {
            weight: weight.unwrap_or(1),
            name,
        },
    ))
}

#[test]
fn test_entry_1() {
    let (_, e) = entry::<nom::error::Error<&str>>("P1").unwrap();
    assert_eq!(e, RuleEntry { weight: 1, name: "P1" });
}

#[test]
fn test_entry_2() {
    let (_, e) = entry::<nom::error::Error<&str>>("12 * place_a").unwrap();
    assert_eq!(
        e,
        RuleEntry {
            weight: 12,
            name: "place_a"
        }
    );
}

#[test]
fn test_entry_numeric_name() {
    // a bare number without '*' is a name, not a multiplier
    let (rest, e) = entry::<nom::error::Error<&str>>("42 P1").unwrap();
    assert_eq!(e, RuleEntry { weight: 1, name: "42" });
    assert_eq!(rest, " P1");
}

/// A parsed but not yet resolved rule line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule<'a> {
    pub line: &'a str,
    pub source: &'a str,
    pub targets: Vec<RuleEntry<'a>>,
}

fn rule<'a, E: ParseError<&'a str>>(
    input: &'a str,
) -> nom::IResult<&'a str, (&'a str, Vec<RuleEntry<'a>>), E> {
    let (input, _) = space0(input)?;
    let (input, source) = name(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag("->")(input)?;
    let (input, _) = space0(input)?;
    let (input, targets) = nom::multi::separated_list0(space1, entry).parse(input)?;
    let (input, _) = space0(input)?;

    Ok((input, (source, targets)))
}

impl<'a> Rule<'a> {
    pub fn parse(line: &'a str) -> PetriResult<Rule<'a>> {
        match rule::<nom::error::Error<&str>>(line) {
            Ok(("", (source, targets))) => Ok(Rule {
                line,
                source,
                targets,
            }),
            Ok((rest, _)) => Err(PetriError::malformed(
                line,
                format!("unexpected input '{}'", rest.trim()),
            )),
            Err(_) => Err(PetriError::malformed(line, "expected 'name -> entries'")),
        }
    }
}

#[test]
fn test_rule_1() {
    let rule = Rule::parse("T2 -> 2*P1 P2").unwrap();
    assert_eq!(rule.source, "T2");
    assert_eq!(
        rule.targets,
        vec![
            RuleEntry { weight: 2, name: "P1" },
            RuleEntry { weight: 1, name: "P2" },
        ]
    );
}

#[test]
fn test_rule_2() {
    let rule = Rule::parse("  P2->T3   T4  ").unwrap();
    assert_eq!(rule.source, "P2");
    assert_eq!(rule.targets.len(), 2);
}

#[test]
fn test_rule_empty_rhs() {
    let rule = Rule::parse("T3 ->").unwrap();
    assert!(rule.targets.is_empty());
}

#[test]
fn test_rule_malformed() {
    assert!(matches!(
        Rule::parse("T1 P1"),
        Err(PetriError::MalformedRule { .. })
    ));
    assert!(matches!(
        Rule::parse("T1 T2 -> P1"),
        Err(PetriError::MalformedRule { .. })
    ));
    assert!(matches!(
        Rule::parse("T1 -> 2*"),
        Err(PetriError::MalformedRule { .. })
    ));
    assert!(matches!(
        Rule::parse("T1 -> P1, P2"),
        Err(PetriError::MalformedRule { .. })
    ));
    assert!(matches!(
        Rule::parse(""),
        Err(PetriError::MalformedRule { .. })
    ));
}

/// Parses a block of rules, one per line. Inside a block of several lines,
/// blank lines and lines starting with `#` are skipped. Text without a line
/// break must be exactly one rule, so an empty or commented out entry is
/// rejected.
pub fn parse_rule_block(text: &str) -> PetriResult<Vec<Rule<'_>>> {
    if !text.contains('\n') {
        return Ok(vec![Rule::parse(text.trim())?]);
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Rule::parse)
        .collect()
}

#[test]
fn test_rule_block() {
    let rules = parse_rule_block(
        r#"
        # producers
        T1 -> P1

        P1 -> T2 T4
        "#,
    )
    .unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[1].source, "P1");
}

#[test]
fn test_single_line_is_one_rule() {
    assert_eq!(parse_rule_block(" T1 -> P1 ").unwrap().len(), 1);

    for text in ["", "   ", "# T1 -> P1"] {
        assert!(matches!(
            parse_rule_block(text),
            Err(PetriError::MalformedRule { .. })
        ));
    }
}

/// Turns parsed rules into the incidence map of a net: one [TransitionArcs]
/// per declared transition, indexed by [TransitionId].
///
/// `resolve` looks up a name among the declared places and transitions.
pub fn build_incidence<F>(
    rules: &[Rule<'_>],
    transition_count: usize,
    resolve: F,
) -> PetriResult<Vec<TransitionArcs>>
where
    F: Fn(&str) -> Option<EntityRef>,
{
    let mut incidence = vec![TransitionArcs::default(); transition_count];
    let lookup = |name: &str| resolve(name).ok_or_else(|| PetriError::unknown(name));

    for rule in rules {
        let source = lookup(rule.source)?;

        for target in &rule.targets {
            if target.weight == 0 {
                return Err(PetriError::malformed(
                    rule.line,
                    format!("multiplicity of '{}' must be positive", target.name),
                ));
            }

            let summed = match (source, lookup(target.name)?) {
                (EntityRef::Transition(t), EntityRef::Place(p)) => {
                    incidence[t.to_usize()].add_produced(p, target.weight)
                }
                (EntityRef::Place(p), EntityRef::Transition(t)) => {
                    incidence[t.to_usize()].add_consumed(p, target.weight)
                }
                _ => {
                    return Err(PetriError::malformed(
                        rule.line,
                        format!(
                            "'{}' and '{}' are both places or both transitions",
                            rule.source, target.name
                        ),
                    ));
                }
            };

            if summed.is_none() {
                return Err(PetriError::malformed(
                    rule.line,
                    format!("multiplicity of '{}' overflows", target.name),
                ));
            }
        }
    }

    tracing::debug!(
        rules = %rules.len(),
        transitions = %transition_count,
        "Built incidence map"
    );

    Ok(incidence)
}

#[cfg(test)]
fn resolve_example(name: &str) -> Option<EntityRef> {
    use crate::net::entity::{PlaceId, TransitionId};

    match name {
        "P1" => Some(EntityRef::Place(PlaceId::new(0))),
        "P2" => Some(EntityRef::Place(PlaceId::new(1))),
        "T1" => Some(EntityRef::Transition(TransitionId::new(0))),
        "T2" => Some(EntityRef::Transition(TransitionId::new(1))),
        _ => None,
    }
}

#[test]
fn test_build_incidence() {
    use crate::net::entity::PlaceId;

    let rules = parse_rule_block("T1 -> P1\nP1 -> T2 T2\nT2 -> 3*P2 P2").unwrap();
    let incidence = build_incidence(&rules, 2, resolve_example).unwrap();

    assert!(incidence[0].consumes().is_empty());
    assert_eq!(incidence[0].produces(), &[(1, PlaceId::new(0))]);
    assert_eq!(incidence[1].consumes(), &[(2, PlaceId::new(0))]);
    assert_eq!(incidence[1].produces(), &[(4, PlaceId::new(1))]);
}

#[test]
fn test_build_incidence_unknown_name() {
    let rules = parse_rule_block("T1 -> P3").unwrap();
    assert_eq!(
        build_incidence(&rules, 2, resolve_example),
        Err(PetriError::unknown("P3"))
    );

    let rules = parse_rule_block("T9 -> P1").unwrap();
    assert_eq!(
        build_incidence(&rules, 2, resolve_example),
        Err(PetriError::unknown("T9"))
    );
}

#[test]
fn test_build_incidence_not_bipartite() {
    let rules = parse_rule_block("T1 -> T2").unwrap();
    assert!(matches!(
        build_incidence(&rules, 2, resolve_example),
        Err(PetriError::MalformedRule { .. })
    ));

    let rules = parse_rule_block("T1 -> 0*P1").unwrap();
    assert!(matches!(
        build_incidence(&rules, 2, resolve_example),
        Err(PetriError::MalformedRule { .. })
    ));
}

#[test]
fn test_build_incidence_weight_overflow() {
    let rules = parse_rule_block("T1 -> 4294967295*P1 P1").unwrap();
    assert!(matches!(
        build_incidence(&rules, 2, resolve_example),
        Err(PetriError::MalformedRule { line, .. }) if line == "T1 -> 4294967295*P1 P1"
    ));

    let rules = parse_rule_block("P1 -> 4294967295*T1\nP1 -> T1").unwrap();
    assert!(matches!(
        build_incidence(&rules, 2, resolve_example),
        Err(PetriError::MalformedRule { line, .. }) if line == "P1 -> T1"
    ));
}
