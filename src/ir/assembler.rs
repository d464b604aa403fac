//! Threads an environment through a workflow's blocks to build the backbone,
//! then wraps it per locked/unlocked semantics (spec §4.9).

use crate::error::HasSourcePosition;
use crate::fragment::{check_reparses, render_synthetic_fragment};
use crate::ir::blocks::{partition_blocks, Block};
use crate::ir::call::{lower_call_inputs, stage_name_for_call};
use crate::ir::closure::closure_of;
use crate::ir::conditional::compile_conditional;
use crate::ir::error::LowerError;
use crate::ir::eval_block::compile_eval;
use crate::ir::expr_utils::{rename_free_vars, try_const_eval};
use crate::ir::ids::{StageCounters, COMMON_STAGE_NAME, OUTPUTS_APPLET_SUFFIX};
use crate::ir::scatter::compile_scatter;
use crate::ir::symbols::{
    Applet, AppletKind, CVar, CallEnv, CompileOptions, DockerImage, InstanceType, SArg, Stage, Workflow,
};
use crate::tree::{CalleeRef, Declaration, Task};
use indexmap::IndexMap;

/// Fold left over `blocks`, threading `env`. Returns the backbone stages, any
/// newly synthesized applets, and the final environment.
fn build_backbone(
    blocks: &[Block],
    mut env: CallEnv,
    opts: &CompileOptions,
    applets_by_task: &IndexMap<String, Applet>,
    tasks_by_name: &IndexMap<String, Task>,
    counters: &mut StageCounters,
    wdl_version: &str,
) -> Result<(Vec<Stage>, Vec<Applet>, CallEnv), LowerError> {
    let mut stages = Vec::new();
    let mut synthesized = Vec::new();

    for block in blocks {
        match block {
            Block::DeclRun(decls) => {
                let refs: Vec<&Declaration> = decls.iter().collect();
                let (stage, applet) = compile_eval(&refs, &env, counters, wdl_version)?;
                for cvar in &stage.outputs {
                    env = env.bind(
                        cvar.name.clone(),
                        (cvar.clone(), SArg::Link { stage_name: stage.name.clone(), cvar: cvar.clone() }),
                    );
                }
                stages.push(stage);
                synthesized.push(applet);
            }
            Block::ScatterBlock(pre, scatter) => {
                let pre_refs: Vec<&Declaration> = pre.iter().collect();
                let (stage, applet) = compile_scatter(
                    &pre_refs,
                    scatter,
                    &env,
                    opts,
                    applets_by_task,
                    tasks_by_name,
                    counters,
                    wdl_version,
                )?;
                for cvar in &stage.outputs {
                    env = env.bind(
                        cvar.name.clone(),
                        (cvar.clone(), SArg::Link { stage_name: stage.name.clone(), cvar: cvar.clone() }),
                    );
                }
                stages.push(stage);
                synthesized.push(applet);
            }
            Block::IfBlock(pre, conditional) => {
                let pre_refs: Vec<&Declaration> = pre.iter().collect();
                let (stage, applet) = compile_conditional(
                    &pre_refs,
                    conditional,
                    &env,
                    opts,
                    applets_by_task,
                    tasks_by_name,
                    counters,
                    wdl_version,
                )?;
                for cvar in &stage.outputs {
                    env = env.bind(
                        cvar.name.clone(),
                        (cvar.clone(), SArg::Link { stage_name: stage.name.clone(), cvar: cvar.clone() }),
                    );
                }
                stages.push(stage);
                synthesized.push(applet);
            }
            Block::CallBlock(call) => {
                let stage_name = stage_name_for_call(call)?;
                let task_name = match &call.callee {
                    Some(CalleeRef::Task(task)) => task.name.clone(),
                    Some(CalleeRef::Workflow(_)) => {
                        return Err(LowerError::unsupported(
                            call.source_position().clone(),
                            format!("call '{}' targets a workflow, not a task", call.task),
                        ))
                    }
                    None => {
                        return Err(LowerError::UnresolvedCallTarget {
                            pos: call.source_position().clone(),
                            name: call.task.clone(),
                        })
                    }
                };
                let applet = applets_by_task.get(&task_name).ok_or_else(|| LowerError::UnresolvedCallTarget {
                    pos: call.source_position().clone(),
                    name: task_name.clone(),
                })?;
                let (sargs, _missing) =
                    lower_call_inputs(call, &applet.inputs, &env, opts.locked, wdl_version)?;

                let stage = Stage {
                    name: stage_name.clone(),
                    stage_id: counters.next_stage_id(),
                    applet_name: task_name,
                    inputs: sargs,
                    outputs: applet.outputs.clone(),
                };
                for cvar in &stage.outputs {
                    let key = format!("{}.{}", stage_name, cvar.name);
                    env = env.bind(
                        key,
                        (cvar.clone(), SArg::Link { stage_name: stage_name.clone(), cvar: cvar.clone() }),
                    );
                }
                stages.push(stage);
            }
        }
    }

    Ok((stages, synthesized, env))
}

/// Builds the fixed-name, fixed-interface `common` stage of an unlocked
/// workflow's backbone: a pass-through applet whose outputs republish the
/// workflow's own declared inputs so later stages can link to them.
fn build_common_stage(
    input_cvars: &[CVar],
    counters: &mut StageCounters,
    wdl_version: &str,
) -> Result<(Stage, Applet), LowerError> {
    let body: Vec<crate::tree::WorkflowElement> = input_cvars
        .iter()
        .map(|cv| {
            crate::tree::WorkflowElement::Declaration(Declaration::new(
                default_pos(),
                cv.ty.clone(),
                cv.dx_var_name.clone(),
                None,
                "common-in",
            ))
        })
        .collect();

    let fragment = render_synthetic_fragment(wdl_version, &[], COMMON_STAGE_NAME, &[], &body);
    check_reparses(wdl_version, &fragment).map_err(|parse_error| LowerError::IllegalGeneratedFragment {
        pos: default_pos(),
        applet_name: COMMON_STAGE_NAME.to_string(),
        fragment: fragment.clone(),
        parse_error,
    })?;

    let applet = Applet {
        name: COMMON_STAGE_NAME.to_string(),
        inputs: input_cvars.to_vec(),
        outputs: input_cvars.to_vec(),
        instance_type: InstanceType::Default,
        docker: DockerImage::None,
        kind: AppletKind::Eval,
        source_fragment: fragment,
    };
    let stage = Stage {
        name: COMMON_STAGE_NAME.to_string(),
        stage_id: counters.next_stage_id(),
        applet_name: COMMON_STAGE_NAME.to_string(),
        inputs: vec![SArg::Empty; input_cvars.len()],
        outputs: input_cvars.to_vec(),
    };
    Ok((stage, applet))
}

/// Builds the fixed-name, fixed-stage-id output-section stage: an `Eval`
/// applet that collects the workflow's declared outputs against the final
/// backbone environment, with output names sanitized dot-free.
fn build_output_section(
    output_decls: &[Declaration],
    env: &CallEnv,
    counters: &StageCounters,
    wdl_version: &str,
) -> Result<(Stage, Applet), LowerError> {
    let exprs = output_decls.iter().filter_map(|d| d.expr.as_ref());
    let closure = closure_of(exprs, env);

    let input_cvars: Vec<CVar> = closure.iter().map(|(name, (cv, _))| CVar::new(name.clone(), cv.ty.clone())).collect();
    let stage_inputs: Vec<SArg> = closure.values().map(|(_, sarg)| sarg.clone()).collect();
    let rename_map: IndexMap<String, String> =
        input_cvars.iter().map(|cv| (cv.name.clone(), cv.dx_var_name.clone())).collect();

    let input_decls: Vec<Declaration> = input_cvars
        .iter()
        .map(|cv| Declaration::new(default_pos(), cv.ty.clone(), cv.dx_var_name.clone(), None, "outputs-in"))
        .collect();
    let body_decls: Vec<Declaration> = output_decls
        .iter()
        .map(|d| {
            let expr = d.expr.as_ref().map(|e| rename_free_vars(e, &rename_map));
            Declaration::new(d.pos.clone(), d.decl_type.clone(), d.name.clone(), expr, "outputs-body")
        })
        .collect();

    let applet_name = OUTPUTS_APPLET_SUFFIX.to_string();
    let body: Vec<crate::tree::WorkflowElement> = input_decls
        .into_iter()
        .chain(body_decls)
        .map(crate::tree::WorkflowElement::Declaration)
        .collect();

    let fragment = render_synthetic_fragment(wdl_version, &[], &applet_name, &[], &body);
    check_reparses(wdl_version, &fragment).map_err(|parse_error| LowerError::IllegalGeneratedFragment {
        pos: default_pos(),
        applet_name: applet_name.clone(),
        fragment: fragment.clone(),
        parse_error,
    })?;

    let output_cvars: Vec<CVar> = output_decls
        .iter()
        .map(|d| CVar::new(crate::ir::ids::dx_var_name(&d.name), d.decl_type.clone()))
        .collect();

    let applet = Applet {
        name: applet_name.clone(),
        inputs: input_cvars,
        outputs: output_cvars.clone(),
        instance_type: InstanceType::Default,
        docker: DockerImage::None,
        kind: AppletKind::Eval,
        source_fragment: fragment,
    };
    let stage = Stage {
        name: applet_name.clone(),
        stage_id: counters.output_section_stage_id(),
        applet_name,
        inputs: stage_inputs,
        outputs: output_cvars,
    };
    Ok((stage, applet))
}

fn default_pos() -> crate::error::SourcePosition {
    crate::error::SourcePosition::new(String::new(), String::new(), 0, 0, 0, 0)
}

/// Lowers a workflow AST to its IR `Workflow`, returning also the applets
/// synthesized along the way (eval/scatter/if/common/outputs/reorg).
pub fn lower_workflow(
    workflow: &crate::tree::Workflow,
    opts: &CompileOptions,
    applets_by_task: &IndexMap<String, Applet>,
    tasks_by_name: &IndexMap<String, Task>,
    wdl_version: &str,
) -> Result<(Workflow, Vec<Applet>), LowerError> {
    let mut counters = StageCounters::new();
    let mut synthesized_applets = Vec::new();
    let mut stages = Vec::new();

    let workflow_input_cvars: Vec<CVar> = workflow
        .inputs
        .iter()
        .map(|d| {
            let default = match &d.expr {
                None => None,
                Some(expr) => match try_const_eval(expr, wdl_version) {
                    Some(v) => Some(v),
                    None => {
                        return Err(LowerError::WorkflowInputDefaultNotConstant {
                            pos: d.source_position().clone(),
                            name: d.name.clone(),
                        })
                    }
                },
            };
            Ok(CVar::new(d.name.clone(), d.decl_type.clone()).with_default(default))
        })
        .collect::<Result<Vec<_>, LowerError>>()?;

    let blocks = partition_blocks(&workflow.body);

    let (env, workflow_level_inputs) = if opts.locked {
        let mut env = CallEnv::new();
        let mut level_inputs = Vec::with_capacity(workflow_input_cvars.len());
        for cvar in &workflow_input_cvars {
            let sarg = SArg::WorkflowInput(cvar.clone());
            env = env.bind(cvar.name.clone(), (cvar.clone(), sarg.clone()));
            level_inputs.push((cvar.clone(), sarg));
        }
        (env, level_inputs)
    } else {
        let (common_stage, common_applet) =
            build_common_stage(&workflow_input_cvars, &mut counters, wdl_version)?;
        let mut env = CallEnv::new();
        let mut level_inputs = Vec::with_capacity(workflow_input_cvars.len());
        for cvar in &workflow_input_cvars {
            env = env.bind(
                cvar.name.clone(),
                (cvar.clone(), SArg::Link { stage_name: COMMON_STAGE_NAME.to_string(), cvar: cvar.clone() }),
            );
            level_inputs.push((cvar.clone(), SArg::Empty));
        }
        stages.push(common_stage);
        synthesized_applets.push(common_applet);
        (env, level_inputs)
    };

    let (backbone_stages, backbone_applets, final_env) =
        build_backbone(&blocks, env, opts, applets_by_task, tasks_by_name, &mut counters, wdl_version)?;
    stages.extend(backbone_stages);
    synthesized_applets.extend(backbone_applets);

    let mut workflow_level_outputs = Vec::new();
    if !workflow.outputs.is_empty() {
        let (output_stage, output_applet) =
            build_output_section(&workflow.outputs, &final_env, &counters, wdl_version)?;
        for cvar in &output_stage.outputs {
            workflow_level_outputs.push((
                cvar.clone(),
                SArg::Link { stage_name: output_stage.name.clone(), cvar: cvar.clone() },
            ));
        }
        stages.push(output_stage);
        synthesized_applets.push(output_applet);
    }

    if opts.reorg {
        let reorg_inputs: Vec<SArg> = workflow_level_outputs
            .iter()
            .map(|(_, sarg)| sarg.clone())
            .collect();
        let reorg_applet_name = crate::ir::ids::REORG_STAGE_NAME.to_string();
        // WorkflowOutputReorg is a native platform applet with no WDL source of
        // its own (it moves/renames output files post hoc); it carries no
        // embedded fragment and is exempt from the reparse check that every
        // WDL-backed applet above it goes through.
        let reorg_applet = Applet {
            name: reorg_applet_name.clone(),
            inputs: workflow_level_outputs.iter().map(|(cv, _)| cv.clone()).collect(),
            outputs: Vec::new(),
            instance_type: InstanceType::Default,
            docker: DockerImage::None,
            kind: AppletKind::WorkflowOutputReorg,
            source_fragment: String::new(),
        };
        let reorg_stage = Stage {
            name: crate::ir::ids::REORG_STAGE_NAME.to_string(),
            stage_id: counters.next_stage_id(),
            applet_name: reorg_applet_name,
            inputs: reorg_inputs,
            outputs: Vec::new(),
        };
        stages.push(reorg_stage);
        synthesized_applets.push(reorg_applet);
    }

    Ok((
        Workflow {
            name: workflow.name.clone(),
            inputs: workflow_level_inputs,
            outputs: workflow_level_outputs,
            stages,
            locked: opts.locked,
        },
        synthesized_applets,
    ))
}
