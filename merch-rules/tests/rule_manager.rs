use std::collections::HashSet;
use std::fs;

use merch_protocol::product::{Brand, Product};
use merch_rules::{
    apply, refresh_once, resolve, FacetDescriptor, FileRuleSource, PathScope, ProductTarget,
    Rule, RuleContext, RuleEffect, RuleManager, RuleParams, RuleScope, RuleStore,
};
use rand::seq::SliceRandom;
use rand::Rng;

fn product(id: &str, rank: i32) -> Product {
    Product::builder(id).list_rank(rank).build()
}

fn context(params: RuleParams) -> RuleContext {
    RuleContext::from_params(&params).expect("context")
}

fn catalog() -> Vec<Product> {
    vec![
        Product::builder("p1")
            .list_rank(3)
            .brand(Brand::new("88").named("Trailhead"))
            .add_category("men.shoes")
            .build(),
        Product::builder("p2")
            .list_rank(1)
            .add_category("men.jackets")
            .out_of_stock(true)
            .build(),
        Product::builder("p3")
            .list_rank(2)
            .add_category("women.shoes")
            .free_gift("outdoor", true)
            .build(),
        Product::builder("p4").list_rank(4).add_category("men.shoes").build(),
    ]
}

fn merchandising_rules() -> Vec<Rule> {
    vec![
        Rule::new("demote-oos", 50).with_effect(RuleEffect::Boost {
            amount: -100,
            target: ProductTarget::OutOfStock,
        }),
        Rule::new("men-shoes", 20)
            .with_scope(RuleScope::default().category(["men"]))
            .with_effect(RuleEffect::Boost {
                amount: 5,
                target: ProductTarget::Category {
                    path: "men.shoes".into(),
                },
            })
            .with_effect(RuleEffect::InjectFacet {
                facet: FacetDescriptor::new("brand"),
            }),
        Rule::new("hide-gifts", 10).with_effect(RuleEffect::Block {
            target: ProductTarget::FreeGift,
        }),
    ]
}

#[test]
fn disabled_rules_return_candidates_untouched() {
    let manager = RuleManager::new(RuleStore::with_rules(merchandising_rules()));
    let candidates = catalog();

    let result = manager
        .process(
            &RuleParams::new()
                .rule("false")
                .catalog("outdoor")
                .category_path("men.shoes"),
            &candidates,
        )
        .expect("process");

    assert_eq!(result.outcome.ids(), ["p1", "p2", "p3", "p4"]);
    assert!(result.outcome.facets.is_empty());
    assert!(result.outcome.applied_rules.is_empty());
    assert!(result.snapshot_version.is_none());
    assert_eq!(result.outcome.documents(), candidates);
}

#[test]
fn resolve_orders_equal_priority_rules_by_id() {
    let mut rng = rand::thread_rng();

    for _ in 0..50 {
        let count = rng.gen_range(1..30);
        let mut rules: Vec<Rule> = (0..count)
            .map(|n| Rule::new(format!("rule-{n:03}"), 7))
            .collect();
        // Repeat a few ids to exercise deduplication.
        for _ in 0..rng.gen_range(0..5) {
            let duplicate = rules[rng.gen_range(0..count)].clone();
            rules.push(duplicate);
        }
        // And some that never match.
        rules.push(
            Rule::new("elsewhere", 7).with_scope(RuleScope::default().site("other-site")),
        );
        rules.shuffle(&mut rng);

        let resolved = resolve(&rules, &context(RuleParams::new().site("outdoor")));

        let ids: Vec<&str> = resolved.iter().map(|rule| rule.id.as_str()).collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len(), "no duplicate ids");
        assert_eq!(ids.len(), count);
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "sorted by id: {ids:?}");
        assert!(!ids.contains(&"elsewhere"));
    }
}

#[test]
fn resolve_orders_mixed_priorities_descending() {
    let mut rng = rand::thread_rng();
    let mut rules: Vec<Rule> = (0..40)
        .map(|n| Rule::new(format!("r{n:02}"), rng.gen_range(-5..5)))
        .collect();
    rules.shuffle(&mut rng);

    let resolved = resolve(&rules, &context(RuleParams::new()));

    assert_eq!(resolved.len(), rules.len());
    assert!(resolved.windows(2).all(|pair| {
        pair[0].priority > pair[1].priority
            || (pair[0].priority == pair[1].priority && pair[0].id < pair[1].id)
    }));
}

#[test]
fn category_scope_matches_descendants_only() {
    let manager = RuleManager::new(RuleStore::with_rules(merchandising_rules()));
    let candidates = catalog();

    let running = manager
        .process(&RuleParams::new().category_path("men.shoes.running"), &candidates)
        .expect("process");
    assert!(running
        .outcome
        .applied_rules
        .contains(&"men-shoes".to_string()));
    assert_eq!(running.outcome.facets.len(), 1);

    let women = manager
        .process(&RuleParams::new().category_path("women"), &candidates)
        .expect("process");
    assert!(!women.outcome.applied_rules.contains(&"men-shoes".to_string()));
    assert!(women.outcome.facets.is_empty());
}

#[test]
fn applies_rules_in_precedence_order() {
    let manager = RuleManager::new(RuleStore::with_rules(merchandising_rules()));

    let result = manager
        .process(
            &RuleParams::new()
                .catalog("outdoor")
                .category_path("men.shoes"),
            &catalog(),
        )
        .expect("process");

    // p1: 3 - 5, p4: 4 - 5, p3 blocked, p2 demoted to 101.
    assert_eq!(result.outcome.ids(), ["p1", "p4", "p2"]);
    assert_eq!(
        result.outcome.applied_rules,
        ["demote-oos", "men-shoes", "hide-gifts"]
    );
    assert_eq!(result.snapshot_version, Some(1));
}

#[test]
fn reapplying_rules_to_their_output_is_stable() {
    let rules = merchandising_rules();
    let ctx = context(
        RuleParams::new()
            .catalog("outdoor")
            .category_path("men.shoes"),
    );
    let resolved = resolve(&rules, &ctx);

    let first = apply(&resolved, &ctx, &catalog());
    let second = apply(&resolved, &ctx, &first.documents());

    assert_eq!(first.ids(), second.ids());
    let ranks = |outcome: &merch_rules::ApplicationOutcome| {
        outcome
            .products
            .iter()
            .map(|ranked| ranked.effective_rank)
            .collect::<Vec<_>>()
    };
    assert_eq!(ranks(&first), ranks(&second));
}

#[test]
fn redirect_short_circuits_lower_priority_rules() {
    let rules = vec![
        Rule::new("to-sale", 100).with_effect(RuleEffect::Redirect {
            target: "/sale".into(),
        }),
        Rule::new("block-all", 1).with_effect(RuleEffect::Block {
            target: ProductTarget::All,
        }),
        Rule::new("facet", 1).with_effect(RuleEffect::InjectFacet {
            facet: FacetDescriptor::new("color"),
        }),
    ];
    let manager = RuleManager::new(RuleStore::with_rules(rules));
    let candidates = vec![product("b", 2), product("a", 1)];

    let result = manager
        .process(&RuleParams::new(), &candidates)
        .expect("process");

    assert!(result.outcome.is_redirect());
    assert_eq!(result.outcome.redirect.as_deref(), Some("/sale"));
    assert_eq!(result.outcome.ids(), ["b", "a"]);
    assert!(result.outcome.facets.is_empty());
    assert_eq!(result.outcome.applied_rules, ["to-sale"]);
}

#[test]
fn conflicting_pins_promote_the_losing_product() {
    let rules = vec![
        Rule::new("pin-c", 10).with_effect(RuleEffect::ForceRank {
            target: ProductTarget::ids(["c"]),
            position: 1,
        }),
        Rule::new("pin-b", 5).with_effect(RuleEffect::ForceRank {
            target: ProductTarget::ids(["b"]),
            position: 1,
        }),
    ];
    let ctx = context(RuleParams::new());
    let candidates = vec![product("a", 1), product("b", 2), product("c", 3)];

    let outcome = apply(&resolve(&rules, &ctx), &ctx, &candidates);

    assert_eq!(outcome.ids(), ["c", "b", "a"]);
    assert_eq!(outcome.products[0].pinned, Some(1));
    assert_eq!(
        outcome
            .products
            .iter()
            .filter(|ranked| ranked.pinned == Some(1))
            .count(),
        1
    );
    assert!(outcome.products[1].pinned.is_none());
}

#[test]
fn boost_and_review_average_decide_the_final_order() {
    let rules = vec![
        Rule::new("r1", 10).with_effect(RuleEffect::Boost {
            amount: 20,
            target: ProductTarget::ids(["A"]),
        }),
        Rule::new("r2", 5).with_effect(RuleEffect::Block {
            target: ProductTarget::ids(Vec::<String>::new()),
        }),
    ];
    let candidates = vec![
        product("A", 10),
        Product::builder("B")
            .list_rank(5)
            .bayesian_review_average(4.8)
            .build(),
        Product::builder("C")
            .list_rank(5)
            .bayesian_review_average(4.8)
            .build(),
    ];
    let ctx = context(RuleParams::new());

    let outcome = apply(&resolve(&rules, &ctx), &ctx, &candidates);

    // A reaches -10 and leads; B and C tie on rank and average, id decides.
    assert_eq!(outcome.ids(), ["A", "B", "C"]);
    // An empty id list is malformed and reported, not applied.
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].rule_id, "r2");

    let unboosted = apply(&[], &ctx, &candidates);
    assert_eq!(unboosted.ids(), ["B", "C", "A"]);
}

#[test]
fn review_average_orders_equal_ranks_after_a_boost() {
    let rules = vec![Rule::new("r1", 10).with_effect(RuleEffect::Boost {
        amount: 20,
        target: ProductTarget::ids(["A"]),
    })];
    let candidates = vec![
        product("A", 10),
        product("B", 5),
        Product::builder("C")
            .list_rank(5)
            .bayesian_review_average(4.8)
            .build(),
    ];
    let ctx = context(RuleParams::new());

    let boosted = apply(&resolve(&rules, &ctx), &ctx, &candidates);
    assert_eq!(boosted.ids(), ["A", "C", "B"]);
    assert_eq!(boosted.products[0].effective_rank, -10);

    let unboosted = apply(&[], &ctx, &candidates);
    assert_eq!(unboosted.ids(), ["C", "B", "A"]);
}

#[test]
fn path_and_page_type_scopes_combine() {
    let rule = Rule::new("landing", 1)
        .with_scope(
            RuleScope::default()
                .page_type(merch_rules::PageType::Rule)
                .path(PathScope::Prefix("/collections".into())),
        )
        .with_effect(RuleEffect::Block {
            target: ProductTarget::Brand {
                brand_id: "88".into(),
            },
        });
    let manager = RuleManager::new(RuleStore::with_rules(vec![rule]));

    let hit = manager
        .process(
            &RuleParams::new()
                .page_type("rule")
                .path("/collections/summer"),
            &catalog(),
        )
        .expect("process");
    assert!(!hit.outcome.ids().contains(&"p1"));

    let miss = manager
        .process(&RuleParams::new().page_type("search"), &catalog())
        .expect("process");
    assert!(miss.outcome.ids().contains(&"p1"));
}

#[test]
fn malformed_parameters_fail_the_request() {
    let manager = RuleManager::default();
    let err = manager
        .process(&RuleParams::new().category_path("men..shoes"), &catalog())
        .unwrap_err();
    assert!(err.to_string().contains("empty token"));
}

#[tokio::test]
async fn file_source_feeds_the_manager() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("boost.yaml"),
        r#"
id: boost-p4
priority: 5
effects:
  - type: boost
    amount: 10
    target:
      type: ids
      ids: [p4]
"#,
    )
    .expect("write rule");

    let store = RuleStore::new();
    let source = FileRuleSource::new(dir.path());
    let version = refresh_once(&store, &source).await.expect("refresh");

    let manager = RuleManager::new(store);
    let result = manager
        .process(&RuleParams::new(), &catalog())
        .expect("process");

    assert_eq!(result.snapshot_version, Some(version));
    assert_eq!(result.outcome.ids()[0], "p4");
}

#[tokio::test]
async fn broken_effects_in_a_rule_file_leave_the_rest_working() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("mixed.yaml"),
        r#"
id: mixed
priority: 5
effects:
  - type: boost
    amount: 10
    target:
      type: color
      value: red
  - type: boost
    target:
      type: ids
      ids: [p4]
  - type: block
    target:
      type: ids
      ids: [p2]
"#,
    )
    .expect("write rule");

    let store = RuleStore::new();
    refresh_once(&store, &FileRuleSource::new(dir.path()))
        .await
        .expect("refresh");
    assert_eq!(store.snapshot().len(), 1);

    let result = RuleManager::new(store)
        .process(&RuleParams::new(), &catalog())
        .expect("process");

    assert_eq!(result.outcome.ids(), ["p3", "p1", "p4"]);
    assert_eq!(result.outcome.applied_rules, ["mixed"]);
    let reported: Vec<(usize, &str)> = result
        .outcome
        .diagnostics
        .iter()
        .map(|diagnostic| (diagnostic.effect_index, diagnostic.kind))
        .collect();
    assert_eq!(reported, [(0, "boost"), (1, "malformed")]);
}
