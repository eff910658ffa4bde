use std::collections::HashSet;

use tracing::debug;

use crate::context::RuleContext;
use crate::predicate;
use crate::rule::Rule;

/// Rules that apply to the request, in precedence order.
///
/// Ordered by descending priority with ascending id as tie-break, each id at
/// most once. A request with rules disabled resolves to nothing without
/// looking at the rule set.
pub fn resolve<'a>(rules: &'a [Rule], context: &RuleContext) -> Vec<&'a Rule> {
    if !context.rule_enabled() {
        return Vec::new();
    }

    let mut matched: Vec<&Rule> = rules
        .iter()
        .filter(|rule| predicate::matches(rule, context))
        .collect();

    matched.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

    let mut seen = HashSet::new();
    matched.retain(|rule| seen.insert(rule.id.clone()));

    for rule in &matched {
        debug!(rule_id = %rule.id, priority = rule.priority, "rule matched request");
    }

    matched
}
