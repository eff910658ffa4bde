use crate::context::RuleContext;
use crate::rule::{Rule, RuleScope};

/// Whether `rule` targets the request described by `context`.
///
/// Every declared dimension must match; absent dimensions are wildcards.
/// Disabled rules, rules outside their validity window and scopes that need
/// request data the context lacks never match.
pub fn matches(rule: &Rule, context: &RuleContext) -> bool {
    rule.is_enabled()
        && rule.is_active_at(context.requested_at())
        && scope_matches(&rule.scope, context)
}

fn scope_matches(scope: &RuleScope, context: &RuleContext) -> bool {
    site_matches(scope, context)
        && catalog_matches(scope, context)
        && category_matches(scope, context)
        && page_type_matches(scope, context)
        && path_matches(scope, context)
}

fn site_matches(scope: &RuleScope, context: &RuleContext) -> bool {
    scope.site_ids.is_empty()
        || scope
            .site_ids
            .iter()
            .any(|site| context.site_ids().contains(site))
}

fn catalog_matches(scope: &RuleScope, context: &RuleContext) -> bool {
    match &scope.catalog_id {
        None => true,
        Some(catalog) => context.catalog_id() == Some(catalog.as_str()),
    }
}

fn category_matches(scope: &RuleScope, context: &RuleContext) -> bool {
    context.category_path().starts_with(&scope.category_path)
}

fn page_type_matches(scope: &RuleScope, context: &RuleContext) -> bool {
    scope.page_types.is_empty() || scope.page_types.contains(&context.page_type())
}

fn path_matches(scope: &RuleScope, context: &RuleContext) -> bool {
    match (&scope.path, context.path()) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(expected), Some(path)) => expected.matches(path),
    }
}
