use proptest::prelude::*;
use serde_json::json;

use crate::candidate::CandidatePath;

use super::methods::{
    DATETIME_AFTER, DATETIME_BEFORE, OBSERVATION_ID_CONTAINS, OBSERVER_ID_CONTAINS,
};
use super::{Arity, CombinatorOp, Matcher, PredicateRegistry, QueryNode, prepare};

fn candidate(raw: &str) -> CandidatePath {
    CandidatePath::parse(raw).expect("candidate path")
}

fn accepts(node: &QueryNode, raw: &str) -> bool {
    let registry = PredicateRegistry::with_builtins();
    prepare(&registry, node)
        .expect("prepare")
        .test(&candidate(raw))
}

#[test]
fn from_json_discriminates_leaves_and_combinators() {
    let node = QueryNode::from_json(&json!({
        "method": "AND",
        "args": [
            { "method": "DATETIME_AFTER", "args": ["1731012025609"] },
            { "method": "NOT", "args": [
                { "method": "OBSERVER_ID_CONTAINS", "args": ["442eca3f", "87a"] }
            ]}
        ],
        "session_id": "ignored"
    }))
    .expect("parse");

    assert_eq!(
        node,
        QueryNode::and(vec![
            QueryNode::leaf(DATETIME_AFTER, ["1731012025609"]),
            QueryNode::not(QueryNode::leaf(OBSERVER_ID_CONTAINS, ["442eca3f", "87a"])),
        ])
    );
    assert_eq!(node.method(), "AND");
    assert_eq!(QueryNode::from_json(&node.to_json()).expect("reparse"), node);
}

#[test]
fn from_json_rejects_malformed_shapes() {
    let cases = [
        json!("AND"),
        json!({ "args": [] }),
        json!({ "method": 7, "args": [] }),
        json!({ "method": "OBSERVER_ID_CONTAINS" }),
        json!({ "method": "OBSERVER_ID_CONTAINS", "args": "abc" }),
        json!({ "method": "OBSERVER_ID_CONTAINS", "args": [{ "method": "NOT", "args": [] }] }),
        json!({ "method": "DATETIME_AFTER", "args": [1731012025609_i64] }),
        json!({ "method": "OR", "args": ["abc", "def"] }),
    ];
    for case in cases {
        let err = QueryNode::from_json(&case).expect_err("must reject");
        assert_eq!(err.code(), "MALFORMED_QUERY", "{case}");
    }
}

#[test]
fn from_json_reports_nested_location() {
    let err = QueryNode::from_json(&json!({
        "method": "OR",
        "args": [
            { "method": "DATETIME_AFTER", "args": ["1"] },
            { "method": "DATETIME_BEFORE", "args": [2] }
        ]
    }))
    .expect_err("must reject");
    assert!(err.to_string().contains("$.args[1].args[0]"), "{err}");
}

#[test]
fn from_json_str_rejects_invalid_json() {
    let err = QueryNode::from_json_str("{\"method\": ").expect_err("must reject");
    assert_eq!(err.code(), "MALFORMED_QUERY");
}

#[test]
fn unknown_method_fails_during_prepare() {
    let registry = PredicateRegistry::with_builtins();
    let node = QueryNode::or(vec![
        QueryNode::leaf(DATETIME_AFTER, ["1"]),
        QueryNode::leaf("PAGE_NAME_CONTAINS", ["hellofresh"]),
    ]);
    let err = prepare(&registry, &node).expect_err("must reject");
    assert_eq!(err.code(), "UNKNOWN_METHOD");
}

#[test]
fn combinator_arity_is_enforced() {
    let registry = PredicateRegistry::with_builtins();
    let leaf = QueryNode::leaf(OBSERVER_ID_CONTAINS, ["a"]);

    let three = QueryNode::and(vec![leaf.clone(), leaf.clone(), leaf.clone()]);
    let err = prepare(&registry, &three).expect_err("n-ary AND");
    assert!(matches!(
        err,
        crate::QueryError::ArgumentCount { expected: 2, got: 3, .. }
    ));

    let lonely_or = QueryNode::or(vec![leaf.clone()]);
    assert_eq!(
        prepare(&registry, &lonely_or).expect_err("unary OR").code(),
        "ARGUMENT_COUNT"
    );

    let double_not = QueryNode::Combinator {
        op: CombinatorOp::Not,
        children: vec![leaf.clone(), leaf],
    };
    assert_eq!(
        prepare(&registry, &double_not).expect_err("binary NOT").code(),
        "ARGUMENT_COUNT"
    );
}

#[test]
fn leaf_arity_and_argument_errors() {
    let registry = PredicateRegistry::with_builtins();
    let two_bounds = QueryNode::leaf(DATETIME_BEFORE, ["1", "2"]);
    assert_eq!(
        prepare(&registry, &two_bounds).expect_err("arity").code(),
        "ARGUMENT_COUNT"
    );

    let no_bound = QueryNode::leaf(DATETIME_AFTER, Vec::<String>::new());
    assert_eq!(
        prepare(&registry, &no_bound).expect_err("arity").code(),
        "ARGUMENT_COUNT"
    );

    let not_a_number = QueryNode::leaf(DATETIME_AFTER, ["yesterday"]);
    assert_eq!(
        prepare(&registry, &not_a_number).expect_err("argument").code(),
        "INVALID_ARGUMENT"
    );
}

#[test]
fn variadic_substring_predicates_with_no_args_are_false() {
    let path = "442eca3f-0000/temp/100.abc";
    assert!(!accepts(
        &QueryNode::leaf(OBSERVER_ID_CONTAINS, Vec::<String>::new()),
        path
    ));
    assert!(!accepts(
        &QueryNode::leaf(OBSERVATION_ID_CONTAINS, Vec::<String>::new()),
        path
    ));
}

#[test]
fn substring_predicates_match_any_argument() {
    let path = "5d87a001/temp/100.c8caeffe";
    assert!(accepts(&QueryNode::leaf(OBSERVER_ID_CONTAINS, ["87a"]), path));
    assert!(accepts(
        &QueryNode::leaf(OBSERVER_ID_CONTAINS, ["zzz", "d87"]),
        path
    ));
    assert!(!accepts(&QueryNode::leaf(OBSERVER_ID_CONTAINS, ["c8c"]), path));
    assert!(accepts(
        &QueryNode::leaf(OBSERVATION_ID_CONTAINS, ["caef"]),
        path
    ));
}

#[test]
fn datetime_bounds_are_strict() {
    let path = "observer/temp/1731012025609.abc";
    assert!(!accepts(&QueryNode::leaf(DATETIME_AFTER, ["1731012025609"]), path));
    assert!(!accepts(&QueryNode::leaf(DATETIME_BEFORE, ["1731012025609"]), path));
    assert!(accepts(&QueryNode::leaf(DATETIME_AFTER, ["1731012025608"]), path));
    assert!(accepts(&QueryNode::leaf(DATETIME_BEFORE, ["1731012025610"]), path));
}

#[test]
fn select_keeps_matching_subset_in_order() {
    let registry = PredicateRegistry::with_builtins();
    let query = prepare(
        &registry,
        &QueryNode::and(vec![
            QueryNode::leaf(DATETIME_AFTER, ["1731012025609"]),
            QueryNode::leaf(OBSERVER_ID_CONTAINS, ["442eca3f"]),
        ]),
    )
    .expect("prepare");

    let paths = [
        "442eca3f-aaaa/temp/1731012025700.one/",
        "442eca3f-aaaa/temp/1731012025609.boundary/",
        "bbbbbbbb-aaaa/temp/1731012025800.other/",
        "not-a-path",
        "442eca3f-cccc/temp/1731012099999.two/",
    ];
    let selected = query
        .select(paths.iter().copied())
        .into_iter()
        .map(|path| path.as_str().to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        selected,
        vec![
            "442eca3f-aaaa/temp/1731012025700.one/".to_string(),
            "442eca3f-cccc/temp/1731012099999.two/".to_string(),
        ]
    );
    assert_eq!(query.test_path("not-a-path"), None);
}

#[test]
fn custom_predicates_can_be_registered() {
    fn observer_equals(args: &[String]) -> crate::Result<Matcher> {
        let expected = args[0].clone();
        Ok(Box::new(move |candidate: &CandidatePath| {
            candidate.observer_id() == expected
        }))
    }

    let mut registry = PredicateRegistry::empty();
    registry.register("OBSERVER_IS", Arity::Exact(1), observer_equals);
    assert!(registry.contains("OBSERVER_IS"));
    assert_eq!(registry.arity("OBSERVER_IS"), Some(Arity::Exact(1)));

    let query = prepare(&registry, &QueryNode::leaf("OBSERVER_IS", ["abc"])).expect("prepare");
    assert!(query.test(&candidate("abc/temp/1.x")));
    assert!(!query.test(&candidate("abcd/temp/1.x")));
}

fn leaf_strategy() -> impl Strategy<Value = QueryNode> {
    prop_oneof![
        (0_i64..200).prop_map(|bound| QueryNode::leaf(DATETIME_AFTER, [bound.to_string()])),
        (0_i64..200).prop_map(|bound| QueryNode::leaf(DATETIME_BEFORE, [bound.to_string()])),
        prop::collection::vec(prop::sample::select(vec!["ab", "cd", "zz", "x"]), 0..3)
            .prop_map(|needles| QueryNode::leaf(OBSERVER_ID_CONTAINS, needles)),
        prop::collection::vec(prop::sample::select(vec!["1", "2", "9", "abc"]), 0..3)
            .prop_map(|needles| QueryNode::leaf(OBSERVATION_ID_CONTAINS, needles)),
    ]
}

fn query_strategy() -> impl Strategy<Value = QueryNode> {
    leaf_strategy().prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| QueryNode::and(vec![a, b])),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| QueryNode::or(vec![a, b])),
            inner.prop_map(QueryNode::not),
        ]
    })
}

fn candidate_strategy() -> impl Strategy<Value = CandidatePath> {
    (
        prop::sample::select(vec!["abcd", "xxcd", "zzab", "qqqq"]),
        0_i64..200,
        prop::sample::select(vec!["123", "999", "abc", "x2"]),
    )
        .prop_map(|(observer, ts, id)| candidate(&format!("{observer}/temp/{ts}.{id}")))
}

fn reference_eval(node: &QueryNode, candidate: &CandidatePath) -> bool {
    match node {
        QueryNode::Leaf { method, args } => match method.as_str() {
            DATETIME_AFTER => candidate.timestamp() > args[0].parse::<i64>().expect("bound"),
            DATETIME_BEFORE => candidate.timestamp() < args[0].parse::<i64>().expect("bound"),
            OBSERVER_ID_CONTAINS => args.iter().any(|a| candidate.observer_id().contains(a.as_str())),
            OBSERVATION_ID_CONTAINS => args
                .iter()
                .any(|a| candidate.observation_id().contains(a.as_str())),
            other => panic!("unexpected method {other}"),
        },
        QueryNode::Combinator { op, children } => match op {
            CombinatorOp::And => children.iter().all(|c| reference_eval(c, candidate)),
            CombinatorOp::Or => children.iter().any(|c| reference_eval(c, candidate)),
            CombinatorOp::Not => !reference_eval(&children[0], candidate),
        },
    }
}

proptest! {
    #[test]
    fn combinators_follow_boolean_laws(
        left in query_strategy(),
        right in query_strategy(),
        candidate in candidate_strategy(),
    ) {
        let registry = PredicateRegistry::with_builtins();
        let l = prepare(&registry, &left).expect("left").test(&candidate);
        let r = prepare(&registry, &right).expect("right").test(&candidate);

        let and = QueryNode::and(vec![left.clone(), right.clone()]);
        let or = QueryNode::or(vec![left.clone(), right]);
        let not = QueryNode::not(left);

        prop_assert_eq!(prepare(&registry, &and).expect("and").test(&candidate), l && r);
        prop_assert_eq!(prepare(&registry, &or).expect("or").test(&candidate), l || r);
        prop_assert_eq!(prepare(&registry, &not).expect("not").test(&candidate), !l);
    }

    #[test]
    fn interpreter_agrees_with_reference_evaluation(
        node in query_strategy(),
        candidate in candidate_strategy(),
    ) {
        let registry = PredicateRegistry::with_builtins();
        let prepared = prepare(&registry, &node).expect("prepare");
        prop_assert_eq!(prepared.test(&candidate), reference_eval(&node, &candidate));
    }
}
