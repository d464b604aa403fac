//! Synthesizes a scatter applet (spec §4.7, `compileScatter`).

use crate::error::{HasSourcePosition, SourcePosition};
use crate::fragment::{check_reparses, render_synthetic_fragment};
use crate::ir::closure::closure_of;
use crate::ir::error::LowerError;
use crate::ir::expr_utils::rename_free_vars;
use crate::ir::ids::StageCounters;
use crate::ir::symbols::{
    Applet, AppletKind, CVar, CallDict, CallEnv, CompileOptions, DockerImage, InstanceType, SArg, Stage,
};
use crate::tree::{Call, CalleeRef, Declaration, Scatter, Task, WorkflowElement};
use crate::types::Type;
use indexmap::IndexMap;

/// Splits a scatter/conditional body into its leading declaration run and
/// trailing calls. A declaration after a call is a fatal *unsupported
/// construct*. Shared with conditional lowering, whose body has the same
/// shape.
pub fn split_body<'a>(
    body: &'a [WorkflowElement],
    pos: &SourcePosition,
) -> Result<(Vec<&'a Declaration>, Vec<&'a Call>), LowerError> {
    let mut decls = Vec::new();
    let mut calls = Vec::new();
    let mut seen_call = false;
    for elem in body {
        match elem {
            WorkflowElement::Declaration(d) => {
                if seen_call {
                    return Err(LowerError::unsupported(
                        d.source_position().clone(),
                        "declaration following a call inside a scatter/conditional body".to_string(),
                    ));
                }
                decls.push(d);
            }
            WorkflowElement::Call(c) => {
                seen_call = true;
                calls.push(c);
            }
            WorkflowElement::Scatter(s) => {
                return Err(LowerError::unsupported(
                    s.source_position().clone(),
                    "nested scatter inside a scatter/conditional body".to_string(),
                ))
            }
            WorkflowElement::Conditional(c) => {
                return Err(LowerError::unsupported(
                    c.source_position().clone(),
                    "nested conditional inside a scatter/conditional body".to_string(),
                ))
            }
        }
    }
    let _ = pos;
    Ok((decls, calls))
}

/// `T -> sequence-of-T`, the scatter output lift.
pub fn lift_sequence(ty: &Type) -> Type {
    Type::array(ty.clone(), false, false)
}

fn is_natively_representable(ty: &Type) -> bool {
    match ty {
        Type::Boolean { .. }
        | Type::Int { .. }
        | Type::Float { .. }
        | Type::String { .. }
        | Type::File { .. }
        | Type::Directory { .. } => true,
        Type::Array { item_type, .. } => is_natively_representable(item_type),
        Type::Pair { left_type, right_type, .. } => {
            is_natively_representable(left_type) && is_natively_representable(right_type)
        }
        Type::Map { .. } | Type::StructInstance { .. } | Type::Object { .. } | Type::Any { .. } => false,
    }
}

/// A generated (not sourced from the parsed AST) declaration is local to its
/// scatter/conditional body iff every downstream reference to it lies inside
/// that same body. This lowering pass never synthesizes declarations inside
/// a block body -- only this function's callers do, and only for top-level
/// backbone stages -- so every declaration reaching here is a genuine source
/// declaration and therefore never local; the name-prefix check is kept so a
/// future body-synthesizing pass has a hook without relitigating this rule.
fn is_local_declaration(name: &str) -> bool {
    name.starts_with('_')
}

fn callee_task_name(call: &Call) -> Result<String, LowerError> {
    match &call.callee {
        Some(CalleeRef::Task(task)) => Ok(task.name.clone()),
        Some(CalleeRef::Workflow(_)) => Err(LowerError::unsupported(
            call.source_position().clone(),
            format!("call '{}' targets a workflow, not a task", call.task),
        )),
        None => Err(LowerError::UnresolvedCallTarget {
            pos: call.source_position().clone(),
            name: call.task.clone(),
        }),
    }
}

pub fn compile_scatter(
    pre_decls: &[&Declaration],
    scatter: &Scatter,
    env: &CallEnv,
    opts: &CompileOptions,
    applets_by_task: &IndexMap<String, Applet>,
    tasks_by_name: &IndexMap<String, Task>,
    counters: &mut StageCounters,
    wdl_version: &str,
) -> Result<(Stage, Applet), LowerError> {
    // Precondition: the collection expression is a bare variable.
    let collection_is_bare_var = matches!(&scatter.expr, crate::expr::Expression::Ident { .. });
    if !collection_is_bare_var {
        return Err(LowerError::unsupported(
            scatter.source_position().clone(),
            "scatter collection expression must be a bare variable".to_string(),
        ));
    }

    let (body_decls, calls) = split_body(&scatter.body, &scatter.pos)?;

    let mut exprs: Vec<&crate::expr::Expression> = Vec::new();
    for d in pre_decls {
        if let Some(e) = &d.expr {
            exprs.push(e);
        }
    }
    exprs.push(&scatter.expr);
    for d in &body_decls {
        if let Some(e) = &d.expr {
            exprs.push(e);
        }
    }
    for call in &calls {
        exprs.extend(call.inputs.values());
    }
    let closure = closure_of(exprs, env);

    let mut input_cvars: Vec<CVar> = closure
        .iter()
        .map(|(name, (cvar, _))| CVar::new(name.clone(), cvar.ty.clone()))
        .collect();
    let mut stage_inputs: Vec<SArg> = closure.values().map(|(_, sarg)| sarg.clone()).collect();

    let mut call_dict: CallDict = IndexMap::new();
    let mut extra_inputs: Vec<CVar> = Vec::new();
    let existing_names: std::collections::HashSet<String> =
        input_cvars.iter().map(|c| c.name.clone()).collect();

    for call in &calls {
        let task_name = callee_task_name(call)?;
        call_dict.insert(call.name().to_string(), task_name.clone());
        let applet = applets_by_task.get(&task_name).ok_or_else(|| {
            LowerError::UnresolvedCallTarget {
                pos: call.source_position().clone(),
                name: task_name.clone(),
            }
        })?;

        if !opts.locked {
            for cvar in &applet.inputs {
                let required = cvar.attrs.default.is_none() && !cvar.ty.is_optional();
                if required && !call.inputs.contains_key(&cvar.name) {
                    let synth_name = format!("{}_{}", call.name(), cvar.name);
                    if !existing_names.contains(&synth_name)
                        && !extra_inputs.iter().any(|c| c.name == synth_name)
                    {
                        tracing::warn!(
                            call = call.name(),
                            input = cvar.name.as_str(),
                            "missing required call input in unlocked workflow; replaced with SArg::Empty"
                        );
                        extra_inputs.push(
                            CVar::new(synth_name, cvar.ty.clone())
                                .with_original_fqn(format!("{}.{}", call.name(), cvar.name)),
                        );
                        stage_inputs.push(SArg::Empty);
                    }
                }
            }
        }
    }
    input_cvars.extend(extra_inputs);

    let rename_map: IndexMap<String, String> = input_cvars
        .iter()
        .map(|cv| (cv.name.clone(), cv.dx_var_name.clone()))
        .collect();

    let mut output_cvars: Vec<CVar> = pre_decls
        .iter()
        .map(|d| CVar::new(d.name.clone(), d.decl_type.clone()))
        .collect();
    for call in &calls {
        let task_name = callee_task_name(call)?;
        let applet = &applets_by_task[&task_name];
        for out in &applet.outputs {
            output_cvars.push(CVar::new(
                format!("{}.{}", call.name(), out.name),
                lift_sequence(&out.ty),
            ));
        }
    }
    for d in &body_decls {
        if !is_local_declaration(&d.name) {
            output_cvars.push(CVar::new(d.name.clone(), lift_sequence(&d.decl_type)));
        }
    }

    let renamed_input_decls: Vec<Declaration> = input_cvars
        .iter()
        .map(|cv| Declaration::new(scatter.pos.clone(), cv.ty.clone(), cv.dx_var_name.clone(), None, "scatter-in"))
        .collect();
    let renamed_pre_decls: Vec<Declaration> = pre_decls
        .iter()
        .map(|d| {
            let expr = d.expr.as_ref().map(|e| rename_free_vars(e, &rename_map));
            Declaration::new(d.pos.clone(), d.decl_type.clone(), d.name.clone(), expr, "scatter-pre")
        })
        .collect();
    let renamed_body_decls: Vec<Declaration> = body_decls
        .iter()
        .map(|d| {
            let expr = d.expr.as_ref().map(|e| rename_free_vars(e, &rename_map));
            Declaration::new(d.pos.clone(), d.decl_type.clone(), d.name.clone(), expr, "scatter-body")
        })
        .collect();
    let renamed_calls: Vec<Call> = calls
        .iter()
        .map(|call| {
            let inputs = call
                .inputs
                .iter()
                .map(|(k, v)| (k.clone(), rename_free_vars(v, &rename_map)))
                .collect();
            Call::new(
                call.pos.clone(),
                call.task.clone(),
                call.alias.clone(),
                inputs,
                call.afters.clone(),
            )
        })
        .collect();

    let inner_scatter = Scatter::new(
        scatter.pos.clone(),
        scatter.variable.clone(),
        rename_free_vars(&scatter.expr, &rename_map),
        renamed_body_decls
            .into_iter()
            .map(WorkflowElement::Declaration)
            .chain(renamed_calls.into_iter().map(WorkflowElement::Call))
            .collect(),
    );

    let stage_name = counters.next_scatter_name();
    let body: Vec<WorkflowElement> = renamed_input_decls
        .into_iter()
        .chain(renamed_pre_decls)
        .map(WorkflowElement::Declaration)
        .chain(std::iter::once(WorkflowElement::Scatter(Box::new(inner_scatter))))
        .collect();

    let stub_tasks: Vec<&Task> = calls
        .iter()
        .map(|c| callee_task_name(c))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter_map(|name| tasks_by_name.get(&name))
        .collect();

    let fragment = render_synthetic_fragment(wdl_version, &stub_tasks, &stage_name, &[], &body);
    check_reparses(wdl_version, &fragment).map_err(|parse_error| LowerError::IllegalGeneratedFragment {
        pos: scatter.source_position().clone(),
        applet_name: stage_name.clone(),
        fragment: fragment.clone(),
        parse_error,
    })?;

    let kind = if output_cvars.iter().all(|cv| is_natively_representable(&cv.ty)) {
        AppletKind::Scatter(call_dict)
    } else {
        AppletKind::ScatterCollect(call_dict)
    };

    let applet = Applet {
        name: stage_name.clone(),
        inputs: input_cvars,
        outputs: output_cvars.clone(),
        instance_type: InstanceType::Default,
        docker: DockerImage::None,
        kind,
        source_fragment: fragment,
    };

    let stage = Stage {
        name: stage_name.clone(),
        stage_id: counters.next_stage_id(),
        applet_name: stage_name,
        inputs: stage_inputs,
        outputs: output_cvars,
    };

    Ok((stage, applet))
}
