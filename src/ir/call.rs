//! Lowering shared by the backbone assembler and scatter/conditional bodies:
//! turning one call's source-level input mappings into [`SArg`]s.

use crate::error::HasSourcePosition;
use crate::ir::closure::trail_search;
use crate::ir::error::LowerError;
use crate::ir::expr_utils::{try_const_eval, try_member_chain};
use crate::ir::ids::validate_call_name;
use crate::ir::symbols::{CVar, CallEnv, SArg};
use crate::tree::Call;

pub fn stage_name_for_call(call: &Call) -> Result<String, LowerError> {
    let name = call.name().to_string();
    validate_call_name(&name, call.source_position())?;
    Ok(name)
}

/// Lower one call's inputs against `callee_inputs` (the callee applet's
/// ordered input CVars, ordered identically on the returned `Vec<SArg>`).
/// `missing_required` collects, in order, the names of non-optional formal
/// inputs left unsatisfied (only possible in an unlocked workflow, where it
/// is a warning rather than a fatal error); scatter lowering uses this list
/// to synthesize its "extra propagated inputs" (spec §4.7 step 4).
pub fn lower_call_inputs(
    call: &Call,
    callee_inputs: &[CVar],
    env: &CallEnv,
    locked: bool,
    wdl_version: &str,
) -> Result<(Vec<SArg>, Vec<String>), LowerError> {
    let mut sargs = Vec::with_capacity(callee_inputs.len());
    let mut missing_required = Vec::new();

    for cvar in callee_inputs {
        let is_required = cvar.attrs.default.is_none() && !cvar.ty.is_optional();
        match call.inputs.get(&cvar.name) {
            None => {
                if is_required {
                    if locked {
                        return Err(LowerError::MissingRequiredCallInput {
                            pos: call.source_position().clone(),
                            call_name: call.name().to_string(),
                            input_name: cvar.name.clone(),
                        });
                    }
                    tracing::warn!(
                        call = call.name(),
                        input = cvar.name.as_str(),
                        "missing required call input in unlocked workflow; replaced with SArg::Empty"
                    );
                    missing_required.push(cvar.name.clone());
                }
                sargs.push(SArg::Empty);
            }
            Some(expr) => {
                if let Some(chain) = try_member_chain(expr) {
                    match trail_search(env, &chain) {
                        Some((_, (_, sarg))) => sargs.push(sarg),
                        None => {
                            return Err(LowerError::undefined_symbol(
                                call.source_position().clone(),
                                chain,
                            ))
                        }
                    }
                } else {
                    match try_const_eval(expr, wdl_version) {
                        Some(value) => sargs.push(SArg::Constant(value)),
                        None => {
                            return Err(LowerError::unsupported(
                                call.source_position().clone(),
                                format!(
                                    "non-constant, non-variable expression for input '{}' of call '{}'",
                                    cvar.name,
                                    call.name()
                                ),
                            ))
                        }
                    }
                }
            }
        }
    }

    Ok((sargs, missing_required))
}
