//! Synthesizes a conditional applet (spec §4.8, `compileIf`).

use crate::error::HasSourcePosition;
use crate::fragment::{check_reparses, render_synthetic_fragment};
use crate::ir::closure::closure_of;
use crate::ir::error::LowerError;
use crate::ir::expr_utils::rename_free_vars;
use crate::ir::ids::StageCounters;
use crate::ir::scatter::split_body;
use crate::ir::symbols::{
    Applet, AppletKind, CVar, CallDict, CallEnv, CompileOptions, DockerImage, InstanceType, SArg, Stage,
};
use crate::tree::{Call, CalleeRef, Conditional, Declaration, Task, WorkflowElement};
use crate::types::Type;
use indexmap::IndexMap;

/// `T -> T?`, the conditional output lift. Already-optional types pass
/// through unchanged so a doubly-optional type never arises (P5).
fn lift_optional(ty: &Type) -> Type {
    if ty.is_optional() {
        ty.clone()
    } else {
        ty.clone().with_optional(true)
    }
}

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

pub fn compile_conditional(
    pre_decls: &[&Declaration],
    conditional: &Conditional,
    env: &CallEnv,
    opts: &CompileOptions,
    applets_by_task: &IndexMap<String, Applet>,
    tasks_by_name: &IndexMap<String, Task>,
    counters: &mut StageCounters,
    wdl_version: &str,
) -> Result<(Stage, Applet), LowerError> {
    let (body_decls, calls) = split_body(&conditional.body, &conditional.pos)?;

    let mut exprs: Vec<&crate::expr::Expression> = Vec::new();
    for d in pre_decls {
        if let Some(e) = &d.expr {
            exprs.push(e);
        }
    }
    exprs.push(&conditional.expr);
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
        let applet = applets_by_task.get(&task_name).ok_or_else(|| LowerError::UnresolvedCallTarget {
            pos: call.source_position().clone(),
            name: task_name.clone(),
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
                lift_optional(&out.ty),
            ));
        }
    }
    for d in &body_decls {
        if !is_local_declaration(&d.name) {
            output_cvars.push(CVar::new(d.name.clone(), lift_optional(&d.decl_type)));
        }
    }

    let renamed_input_decls: Vec<Declaration> = input_cvars
        .iter()
        .map(|cv| {
            Declaration::new(conditional.pos.clone(), cv.ty.clone(), cv.dx_var_name.clone(), None, "if-in")
        })
        .collect();
    let renamed_pre_decls: Vec<Declaration> = pre_decls
        .iter()
        .map(|d| {
            let expr = d.expr.as_ref().map(|e| rename_free_vars(e, &rename_map));
            Declaration::new(d.pos.clone(), d.decl_type.clone(), d.name.clone(), expr, "if-pre")
        })
        .collect();
    let renamed_body_decls: Vec<Declaration> = body_decls
        .iter()
        .map(|d| {
            let expr = d.expr.as_ref().map(|e| rename_free_vars(e, &rename_map));
            Declaration::new(d.pos.clone(), d.decl_type.clone(), d.name.clone(), expr, "if-body")
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
            Call::new(call.pos.clone(), call.task.clone(), call.alias.clone(), inputs, call.afters.clone())
        })
        .collect();

    let inner_conditional = Conditional::new(
        conditional.pos.clone(),
        rename_free_vars(&conditional.expr, &rename_map),
        renamed_body_decls
            .into_iter()
            .map(WorkflowElement::Declaration)
            .chain(renamed_calls.into_iter().map(WorkflowElement::Call))
            .collect(),
    );

    let stage_name = counters.next_if_name();
    let body: Vec<WorkflowElement> = renamed_input_decls
        .into_iter()
        .chain(renamed_pre_decls)
        .map(WorkflowElement::Declaration)
        .chain(std::iter::once(WorkflowElement::Conditional(Box::new(inner_conditional))))
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
        pos: conditional.source_position().clone(),
        applet_name: stage_name.clone(),
        fragment: fragment.clone(),
        parse_error,
    })?;

    let applet = Applet {
        name: stage_name.clone(),
        inputs: input_cvars,
        outputs: output_cvars.clone(),
        instance_type: InstanceType::Default,
        docker: DockerImage::None,
        kind: AppletKind::If(call_dict),
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
