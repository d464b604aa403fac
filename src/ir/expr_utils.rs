//! Expression-level primitives used throughout the lowering pass: recognizing
//! dotted member-access chains, renaming free variables, constant-folding, and
//! enumerating free names.
//!
//! Member access `A.B.C` is represented by the front end as nested `Get`
//! nodes whose index is a single-part string literal (`A.B` indexed by the
//! literal `"C"`), rather than as a dedicated dotted-identifier node. Every
//! helper here is built around that representation.

use crate::env::Bindings;
use crate::error::HasSourcePosition;
use crate::expr::{Expression, ExpressionBase, StringPart};
use crate::stdlib::StdLib;
use crate::value::Value;
use indexmap::IndexMap;

/// If `expr` is a bare identifier or a chain of member accesses rooted at one,
/// return the dotted chain (`"A"`, `"A.B"`, `"A.B.C"`, ...). Returns `None` for
/// any other expression shape, including a `Get` whose index is not a
/// single-part string literal (a true dynamic/array index).
pub fn try_member_chain(expr: &Expression) -> Option<String> {
    match expr {
        Expression::Ident { name, .. } => Some(name.clone()),
        Expression::Get { expr, index, .. } => {
            let field = match &**index {
                Expression::String { parts, .. } if parts.len() == 1 => match &parts[0] {
                    StringPart::Text(text) => text.clone(),
                    StringPart::Placeholder { .. } => return None,
                },
                _ => return None,
            };
            let prefix = try_member_chain(expr)?;
            Some(format!("{}.{}", prefix, field))
        }
        _ => None,
    }
}

/// Ordered, deduplicated free names referenced by `expr`: member-access chains
/// (names containing a dot) and plain identifiers, in first-encounter order.
pub fn referenced_names(expr: &Expression) -> (Vec<String>, Vec<String>) {
    let mut chains = Vec::new();
    let mut idents = Vec::new();
    let mut seen = std::collections::HashSet::new();
    collect_names(expr, &mut chains, &mut idents, &mut seen);
    (chains, idents)
}

fn collect_names(
    expr: &Expression,
    chains: &mut Vec<String>,
    idents: &mut Vec<String>,
    seen: &mut std::collections::HashSet<String>,
) {
    if let Some(chain) = try_member_chain(expr) {
        if seen.insert(chain.clone()) {
            if chain.contains('.') {
                chains.push(chain);
            } else {
                idents.push(chain);
            }
        }
        return;
    }
    for child in expr.children() {
        collect_names(child, chains, idents, seen);
    }
}

/// Evaluate `expr` with no environment and no side-effectful stdlib function;
/// `None` if anything prevents evaluation from being a pure compile-time fold.
pub fn try_const_eval(expr: &Expression, wdl_version: &str) -> Option<Value> {
    let stdlib = StdLib::new(wdl_version);
    expr.eval(&Bindings::new(), &stdlib).ok()
}

/// Rewrite `expr`, replacing every occurrence of a member-access chain or bare
/// identifier present in `rename_map` (source FQN -> sanitized `dxVarName`)
/// with a plain identifier reference to its sanitized name. Unlike a textual
/// find/replace, this walks the typed expression tree, so a rename can never
/// spuriously match inside a string literal or a longer identifier.
pub fn rename_free_vars(expr: &Expression, rename_map: &IndexMap<String, String>) -> Expression {
    if let Some(chain) = try_member_chain(expr) {
        if let Some(renamed) = rename_map.get(&chain) {
            return Expression::Ident {
                pos: expr.source_position().clone(),
                name: renamed.clone(),
                inferred_type: None,
            };
        }
    }

    match expr {
        Expression::Boolean { pos, value, .. } => Expression::Boolean {
            pos: pos.clone(),
            value: *value,
            inferred_type: None,
        },
        Expression::Int { pos, value, .. } => Expression::Int {
            pos: pos.clone(),
            value: *value,
            inferred_type: None,
        },
        Expression::Float { pos, value, .. } => Expression::Float {
            pos: pos.clone(),
            value: *value,
            inferred_type: None,
        },
        Expression::String { pos, parts, .. } => Expression::String {
            pos: pos.clone(),
            parts: parts
                .iter()
                .map(|part| match part {
                    StringPart::Text(text) => StringPart::Text(text.clone()),
                    StringPart::Placeholder { expr, options } => StringPart::Placeholder {
                        expr: Box::new(rename_free_vars(expr, rename_map)),
                        options: options.clone(),
                    },
                })
                .collect(),
            inferred_type: None,
        },
        Expression::Null { pos, .. } => Expression::Null {
            pos: pos.clone(),
            inferred_type: None,
        },
        Expression::Array { pos, items, .. } => Expression::Array {
            pos: pos.clone(),
            items: items.iter().map(|i| rename_free_vars(i, rename_map)).collect(),
            inferred_type: None,
        },
        Expression::Pair { pos, left, right, .. } => Expression::Pair {
            pos: pos.clone(),
            left: Box::new(rename_free_vars(left, rename_map)),
            right: Box::new(rename_free_vars(right, rename_map)),
            inferred_type: None,
        },
        Expression::Map { pos, pairs, .. } => Expression::Map {
            pos: pos.clone(),
            pairs: pairs
                .iter()
                .map(|(k, v)| (rename_free_vars(k, rename_map), rename_free_vars(v, rename_map)))
                .collect(),
            inferred_type: None,
        },
        Expression::Struct { pos, members, .. } => Expression::Struct {
            pos: pos.clone(),
            members: members
                .iter()
                .map(|(name, e)| (name.clone(), rename_free_vars(e, rename_map)))
                .collect(),
            inferred_type: None,
        },
        Expression::Ident { pos, name, .. } => Expression::Ident {
            pos: pos.clone(),
            name: name.clone(),
            inferred_type: None,
        },
        Expression::Get { pos, expr, index, .. } => Expression::Get {
            pos: pos.clone(),
            expr: Box::new(rename_free_vars(expr, rename_map)),
            index: Box::new(rename_free_vars(index, rename_map)),
            inferred_type: None,
        },
        Expression::IfThenElse {
            pos,
            condition,
            true_expr,
            false_expr,
            ..
        } => Expression::IfThenElse {
            pos: pos.clone(),
            condition: Box::new(rename_free_vars(condition, rename_map)),
            true_expr: Box::new(rename_free_vars(true_expr, rename_map)),
            false_expr: Box::new(rename_free_vars(false_expr, rename_map)),
            inferred_type: None,
        },
        Expression::Apply {
            pos,
            function_name,
            arguments,
            ..
        } => Expression::Apply {
            pos: pos.clone(),
            function_name: function_name.clone(),
            arguments: arguments.iter().map(|a| rename_free_vars(a, rename_map)).collect(),
            inferred_type: None,
        },
        Expression::BinaryOp { pos, op, left, right, .. } => Expression::BinaryOp {
            pos: pos.clone(),
            op: *op,
            left: Box::new(rename_free_vars(left, rename_map)),
            right: Box::new(rename_free_vars(right, rename_map)),
            inferred_type: None,
        },
        Expression::UnaryOp { pos, op, operand, .. } => Expression::UnaryOp {
            pos: pos.clone(),
            op: *op,
            operand: Box::new(rename_free_vars(operand, rename_map)),
            inferred_type: None,
        },
    }
}
