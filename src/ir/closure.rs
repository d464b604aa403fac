//! Closure analysis: for a set of expressions, the free variables that must
//! be imported from the enclosing environment.

use crate::expr::Expression;
use crate::ir::expr_utils::referenced_names;
use crate::ir::symbols::{CallEnv, LinkedVar};
use indexmap::IndexMap;

/// Compute the closure of `expressions` against `env`.
///
/// A plain identifier is bound directly if present in `env`. A member-access
/// chain `A.B.C` is trail-searched: look up the full chain, and if absent,
/// strip one trailing component and retry, until a binding is found or the
/// chain is exhausted. The first hit is bound under its full matched key
/// (which may be a strict prefix of the original chain) -- this unifies call
/// output addressing (`A.B` a call, `C` its output) with struct member
/// navigation. A name with no hit at any prefix is locally defined inside the
/// block and is not part of the closure.
pub fn closure_of<'a>(
    expressions: impl IntoIterator<Item = &'a Expression>,
    env: &CallEnv,
) -> IndexMap<String, LinkedVar> {
    let mut closure = IndexMap::new();
    for expr in expressions {
        let (chains, idents) = referenced_names(expr);
        for name in chains.into_iter().chain(idents) {
            trail_search_into(&name, env, &mut closure);
        }
    }
    closure
}

fn trail_search_into(name: &str, env: &CallEnv, closure: &mut IndexMap<String, LinkedVar>) {
    if closure.contains_key(name) {
        return;
    }
    if let Some((key, linked)) = trail_search(env, name) {
        closure.insert(key, linked);
    }
}

/// Prefix-stripping lookup of a dotted name against `env`: look up the full
/// name, and if absent, strip one trailing component and retry. Returns the
/// matched key (a prefix of `name`, possibly `name` itself) together with the
/// binding found there.
pub fn trail_search(env: &CallEnv, name: &str) -> Option<(String, LinkedVar)> {
    let mut candidate = name;
    loop {
        if let Some(linked) = env.resolve(candidate) {
            return Some((candidate.to_string(), linked.clone()));
        }
        match candidate.rfind('.') {
            Some(idx) => candidate = &candidate[..idx],
            None => return None,
        }
    }
}
