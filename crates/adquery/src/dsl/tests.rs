use std::time::Duration;

use serde_json::json;

use crate::query::QueryNode;
use crate::search::{InMemorySearchBackend, SearchBackend};
use crate::query::methods::{
    ANYTHING_CONTAINS, CATEGORIES_CONTAINS, DATETIME_AFTER, DATETIME_BEFORE,
    OBSERVATION_ID_CONTAINS, OBSERVER_ID_CONTAINS, PAGE_NAME_CONTAINS,
};

use super::{FormatterRegistry, compile, hit_to_result, match_none, search_body, sort_clause};

fn compiled(node: &QueryNode) -> serde_json::Value {
    compile(&FormatterRegistry::with_builtins(), node).expect("compile")
}

#[test]
fn documented_scenario_compiles_to_must() {
    let node = QueryNode::and(vec![
        QueryNode::leaf(DATETIME_AFTER, ["1731012025609"]),
        QueryNode::leaf(OBSERVER_ID_CONTAINS, ["442eca3f"]),
    ]);
    assert_eq!(
        compiled(&node),
        json!({
            "bool": {
                "must": [
                    { "range": { "observation.observed_on_device_at": { "gte": 1731012025 } } },
                    {
                        "bool": {
                            "should": [
                                { "wildcard": { "observer.uuid": { "value": "*442eca3f*" } } }
                            ],
                            "minimum_should_match": 1
                        }
                    }
                ]
            }
        })
    );
}

#[test]
fn or_and_not_use_should_and_must_not() {
    let leaf = QueryNode::leaf(DATETIME_BEFORE, ["1000"]);
    let before = json!({ "range": { "observation.observed_on_device_at": { "lte": 1 } } });

    assert_eq!(
        compiled(&QueryNode::or(vec![leaf.clone(), leaf.clone()])),
        json!({ "bool": { "should": [before, before] } })
    );
    assert_eq!(
        compiled(&QueryNode::or(Vec::new())),
        json!({ "bool": { "should": [] } })
    );
    let everything = InMemorySearchBackend::new(vec![json!({ "observer": { "uuid": "o" } })])
        .search(
            &search_body(&compiled(&QueryNode::or(Vec::new())), 10, None),
            Duration::from_secs(5),
        )
        .expect("search");
    assert_eq!(everything.hits.len(), 1);
    assert_eq!(
        compiled(&QueryNode::not(leaf)),
        json!({ "bool": { "must_not": [before] } })
    );
}

#[test]
fn combinators_are_n_ary_in_the_compiler() {
    let leaves = (0..4)
        .map(|idx| QueryNode::leaf(OBSERVATION_ID_CONTAINS, [format!("id{idx}")]))
        .collect::<Vec<_>>();
    let clause = compiled(&QueryNode::and(leaves));
    assert_eq!(clause["bool"]["must"].as_array().map(Vec::len), Some(4));
}

#[test]
fn unknown_method_compiles_to_match_none() {
    let node = QueryNode::and(vec![
        QueryNode::leaf("SHOE_SIZE_ABOVE", ["42"]),
        QueryNode::leaf(PAGE_NAME_CONTAINS, ["HelloFresh"]),
    ]);
    let clause = compiled(&node);
    assert_eq!(clause["bool"]["must"][0], match_none());
    assert_eq!(
        clause["bool"]["must"][1]["bool"]["should"][0],
        json!({
            "match_phrase": {
                "enrichment.meta_adlibrary_scrape.candidates.data.page_name": "HelloFresh"
            }
        })
    );
}

#[test]
fn datetime_argument_must_be_millisecond_digits() {
    let registry = FormatterRegistry::with_builtins();
    for bad in ["123", "", "17310120256o9", "-1731012025609"] {
        let err = compile(&registry, &QueryNode::leaf(DATETIME_AFTER, [bad]))
            .expect_err("must reject");
        assert_eq!(err.code(), "INVALID_ARGUMENT", "{bad:?}");
    }
    let err = compile(
        &registry,
        &QueryNode::leaf(DATETIME_BEFORE, Vec::<String>::new()),
    )
    .expect_err("missing argument");
    assert_eq!(err.code(), "INVALID_ARGUMENT");

    assert_eq!(
        compiled(&QueryNode::leaf(DATETIME_AFTER, ["1999"])),
        json!({ "range": { "observation.observed_on_device_at": { "gte": 1 } } })
    );
}

#[test]
fn wildcard_metacharacters_are_escaped() {
    let clause = compiled(&QueryNode::leaf(OBSERVER_ID_CONTAINS, ["a*b?c\\"]));
    assert_eq!(
        clause["bool"]["should"][0]["wildcard"]["observer.uuid"]["value"],
        json!("*a\\*b\\?c\\\\*")
    );
}

#[test]
fn variadic_leaves_with_no_args_produce_empty_should() {
    let clause = compiled(&QueryNode::leaf(CATEGORIES_CONTAINS, Vec::<String>::new()));
    assert_eq!(
        clause,
        json!({ "bool": { "should": [], "minimum_should_match": 1 } })
    );
}

#[test]
fn anything_contains_quotes_each_phrase() {
    let clause = compiled(&QueryNode::leaf(
        ANYTHING_CONTAINS,
        ["meal kit", "say \"hi\""],
    ));
    assert_eq!(
        clause["bool"]["should"],
        json!([
            { "simple_query_string": { "query": "\"meal kit\"", "fields": ["*"] } },
            { "simple_query_string": { "query": "\"say \\\"hi\\\"\"", "fields": ["*"] } }
        ])
    );
}

#[test]
fn search_body_carries_sort_and_optional_cursor() {
    let query = json!({ "match_all": {} });
    let first = search_body(&query, 25, None);
    assert_eq!(first["size"], json!(25));
    assert_eq!(first["sort"], sort_clause());
    assert!(first.get("search_after").is_none());

    let cursor = [json!(1731012025), json!("c8caeffe")];
    let next = search_body(&query, 25, Some(&cursor));
    assert_eq!(next["search_after"], json!([1731012025, "c8caeffe"]));
}

#[test]
fn hits_map_to_observer_temp_observation() {
    let source = json!({
        "observer": { "uuid": "442eca3f" },
        "observation": { "uuid": "c8caeffe", "observed_on_device_at": 1731012025 }
    });
    assert_eq!(
        hit_to_result(&source).as_deref(),
        Some("442eca3f/temp/c8caeffe")
    );
    assert_eq!(hit_to_result(&json!({ "observer": { "uuid": "x" } })), None);
}

#[test]
fn custom_formatters_override_builtins() {
    fn exact_page(args: &[String]) -> crate::Result<serde_json::Value> {
        Ok(json!({ "term": { "page": args.first() } }))
    }
    let mut registry = FormatterRegistry::with_builtins();
    registry.register(PAGE_NAME_CONTAINS, exact_page);
    let clause = compile(&registry, &QueryNode::leaf(PAGE_NAME_CONTAINS, ["x"])).expect("compile");
    assert_eq!(clause, json!({ "term": { "page": "x" } }));
}
