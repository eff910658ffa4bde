use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use merch_protocol::product::Product;
use tracing::{debug, warn};

use crate::context::RuleContext;
use crate::effect::RuleEffect;
use crate::outcome::{ApplicationOutcome, EffectDiagnostic, RankedProduct};
use crate::rule::Rule;
use crate::target::ProductTarget;

struct PendingPin<'a> {
    rule_id: &'a str,
    target: &'a ProductTarget,
    position: usize,
}

/// Applies resolved rules, in the order given, to a copy of the candidate set.
///
/// The candidates themselves are never modified. A valid redirect anywhere in
/// the rule list wins over every other effect and returns the candidates
/// untouched. Otherwise boosts and blocks run first, force-rank pins second,
/// and survivors are ordered by effective rank, review average (descending)
/// and id.
pub fn apply(
    rules: &[&Rule],
    context: &RuleContext,
    candidates: &[Product],
) -> ApplicationOutcome {
    let mut outcome = ApplicationOutcome::new();

    if let Some((rule_id, target)) = find_redirect(rules, &mut outcome) {
        debug!(rule_id, target, "rule redirects request");
        let diagnostics = std::mem::take(&mut outcome.diagnostics);
        let mut redirected = ApplicationOutcome::passthrough(candidates);
        redirected.redirect = Some(target.to_string());
        redirected.diagnostics = diagnostics;
        redirected.record_rule(rule_id);
        return redirected;
    }

    let mut working: Vec<RankedProduct> = candidates
        .iter()
        .cloned()
        .map(RankedProduct::unranked)
        .collect();
    let mut pending_pins = Vec::new();

    for rule in rules {
        let mut executed = false;

        for (index, effect) in rule.effects.iter().enumerate() {
            if matches!(effect, RuleEffect::Redirect { .. }) {
                // Only invalid redirects get here; find_redirect already reported them.
                continue;
            }

            if let Err(err) = effect.validate(&rule.id) {
                warn!(
                    rule_id = %rule.id,
                    effect_index = index,
                    error = %err,
                    "skipping malformed effect"
                );
                outcome.push_diagnostic(EffectDiagnostic::new(index, effect.kind(), &err));
                continue;
            }

            match effect {
                RuleEffect::Boost { amount, target } => {
                    let mut boosted = 0usize;
                    for entry in working
                        .iter_mut()
                        .filter(|entry| target.matches(&entry.product, context))
                    {
                        entry.effective_rank =
                            entry.effective_rank.saturating_sub(i64::from(*amount));
                        boosted += 1;
                    }
                    debug!(rule_id = %rule.id, amount, boosted, "applied boost");
                }
                RuleEffect::Block { target } => {
                    let before = working.len();
                    working.retain(|entry| !target.matches(&entry.product, context));
                    debug!(rule_id = %rule.id, blocked = before - working.len(), "applied block");
                }
                RuleEffect::ForceRank { target, position } => {
                    pending_pins.push(PendingPin {
                        rule_id: &rule.id,
                        target,
                        position: *position,
                    });
                }
                RuleEffect::InjectFacet { facet } => {
                    if !outcome.push_facet(facet.clone()) {
                        debug!(rule_id = %rule.id, field = %facet.field, "facet already injected");
                    }
                }
                RuleEffect::Redirect { .. }
                | RuleEffect::Unknown
                | RuleEffect::Malformed { .. } => {}
            }
            executed = true;
        }

        if executed {
            outcome.record_rule(rule.id.clone());
        }
    }

    working.sort_by(compare_ranked);
    outcome.products = place_pins(working, &pending_pins, context);
    outcome
}

/// First well-formed redirect in precedence order. Malformed ones are reported and skipped.
fn find_redirect<'a>(
    rules: &[&'a Rule],
    outcome: &mut ApplicationOutcome,
) -> Option<(&'a str, &'a str)> {
    for rule in rules {
        for (index, effect) in rule.effects.iter().enumerate() {
            let RuleEffect::Redirect { target } = effect else {
                continue;
            };
            match effect.validate(&rule.id) {
                Ok(()) => return Some((rule.id.as_str(), target.trim())),
                Err(err) => {
                    warn!(
                        rule_id = %rule.id,
                        effect_index = index,
                        error = %err,
                        "skipping malformed redirect"
                    );
                    outcome.push_diagnostic(EffectDiagnostic::new(index, effect.kind(), &err));
                }
            }
        }
    }
    None
}

fn compare_ranked(a: &RankedProduct, b: &RankedProduct) -> Ordering {
    a.effective_rank
        .cmp(&b.effective_rank)
        .then_with(|| {
            b.product
                .bayesian_review_average()
                .total_cmp(&a.product.bayesian_review_average())
        })
        .then_with(|| a.id().cmp(b.id()))
}

/// Second pass: pins in precedence order. Each pin takes the best matching
/// product that is not pinned yet. A pin whose position is taken promotes its
/// product above every unpinned product instead.
fn place_pins(
    mut sorted: Vec<RankedProduct>,
    pending: &[PendingPin<'_>],
    context: &RuleContext,
) -> Vec<RankedProduct> {
    if pending.is_empty() || sorted.is_empty() {
        return sorted;
    }

    let mut pins: BTreeMap<usize, String> = BTreeMap::new();
    let mut pinned_ids: HashSet<String> = HashSet::new();
    let mut promoted: Vec<String> = Vec::new();

    for pin in pending {
        let Some(entry) = sorted.iter().find(|entry| {
            !pinned_ids.contains(entry.id()) && pin.target.matches(&entry.product, context)
        }) else {
            debug!(
                rule_id = pin.rule_id,
                position = pin.position,
                "no unpinned product matches pin"
            );
            continue;
        };
        let id = entry.id().to_string();

        if pins.contains_key(&pin.position) {
            debug!(
                rule_id = pin.rule_id,
                product_id = %id,
                position = pin.position,
                "pin position taken, promoting instead"
            );
            if !promoted.contains(&id) {
                promoted.push(id);
            }
            continue;
        }

        promoted.retain(|existing| existing != &id);
        pinned_ids.insert(id.clone());
        pins.insert(pin.position, id);
    }

    if !promoted.is_empty() {
        let top = sorted
            .iter()
            .filter(|entry| !pinned_ids.contains(entry.id()))
            .map(|entry| entry.effective_rank)
            .min()
            .unwrap_or(0);
        let count = promoted.len() as i64;
        for (offset, id) in promoted.iter().enumerate() {
            if let Some(entry) = sorted.iter_mut().find(|entry| entry.id() == id.as_str()) {
                entry.effective_rank = top.saturating_sub(count - offset as i64);
            }
        }
        sorted.sort_by(compare_ranked);
    }

    let (mut pinned, mut placed): (Vec<RankedProduct>, Vec<RankedProduct>) = sorted
        .into_iter()
        .partition(|entry| pinned_ids.contains(entry.id()));

    for (position, id) in &pins {
        let Some(index) = pinned.iter().position(|entry| entry.id() == id.as_str()) else {
            continue;
        };
        let mut entry = pinned.swap_remove(index);
        let slot = (position - 1).min(placed.len());
        entry.pinned = Some(slot + 1);
        placed.insert(slot, entry);
    }

    placed
}
