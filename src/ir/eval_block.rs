//! Synthesizes an expression-evaluation applet for a run of declarations
//! (spec §4.6, `compileEval`).

use crate::error::{HasSourcePosition, SourcePosition};
use crate::fragment::{check_reparses, render_synthetic_fragment};
use crate::ir::closure::closure_of;
use crate::ir::error::LowerError;
use crate::ir::expr_utils::rename_free_vars;
use crate::ir::ids::StageCounters;
use crate::ir::symbols::{Applet, AppletKind, CVar, CallEnv, DockerImage, InstanceType, SArg, Stage};
use crate::tree::Declaration;
use crate::types::Type;
use indexmap::IndexMap;

pub fn compile_eval(
    decls: &[&Declaration],
    env: &CallEnv,
    counters: &mut StageCounters,
    wdl_version: &str,
) -> Result<(Stage, Applet), LowerError> {
    let exprs = decls.iter().filter_map(|d| d.expr.as_ref());
    let closure = closure_of(exprs, env);

    let input_cvars: Vec<CVar> = closure
        .iter()
        .map(|(name, (cvar, _))| CVar::new(name.clone(), cvar.ty.clone()))
        .collect();
    let stage_inputs: Vec<SArg> = closure.values().map(|(_, sarg)| sarg.clone()).collect();
    let rename_map: IndexMap<String, String> = input_cvars
        .iter()
        .map(|cv| (cv.name.clone(), cv.dx_var_name.clone()))
        .collect();

    let input_decls: Vec<Declaration> = input_cvars
        .iter()
        .map(|cv| {
            Declaration::new(
                default_pos(decls),
                cv.ty.clone(),
                cv.dx_var_name.clone(),
                None,
                "eval-in",
            )
        })
        .collect();

    let (output_cvars, body_decls): (Vec<CVar>, Vec<Declaration>) = if decls.is_empty() {
        let dummy = Declaration::new(
            default_pos(decls),
            Type::int(false),
            "_dummy".to_string(),
            Some(crate::expr::Expression::Int {
                pos: default_pos(decls),
                value: 0,
                inferred_type: None,
            }),
            "eval-dummy",
        );
        (vec![CVar::new("_dummy", Type::int(false))], vec![dummy])
    } else {
        let outputs = decls
            .iter()
            .map(|d| CVar::new(d.name.clone(), d.decl_type.clone()))
            .collect();
        let renamed = decls
            .iter()
            .map(|d| {
                let expr = d.expr.as_ref().map(|e| rename_free_vars(e, &rename_map));
                Declaration::new(d.pos.clone(), d.decl_type.clone(), d.name.clone(), expr, "eval-body")
            })
            .collect();
        (outputs, renamed)
    };

    let stage_name = counters.next_eval_name();
    let body: Vec<crate::tree::WorkflowElement> = input_decls
        .iter()
        .cloned()
        .chain(body_decls)
        .map(crate::tree::WorkflowElement::Declaration)
        .collect();

    let fragment = render_synthetic_fragment(wdl_version, &[], &stage_name, &[], &body);
    check_reparses(wdl_version, &fragment).map_err(|parse_error| {
        LowerError::IllegalGeneratedFragment {
            pos: default_pos(decls),
            applet_name: stage_name.clone(),
            fragment: fragment.clone(),
            parse_error,
        }
    })?;

    let applet = Applet {
        name: stage_name.clone(),
        inputs: input_cvars,
        outputs: output_cvars.clone(),
        instance_type: InstanceType::Default,
        docker: DockerImage::None,
        kind: AppletKind::Eval,
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

fn default_pos(decls: &[&Declaration]) -> SourcePosition {
    decls
        .first()
        .map(|d| d.source_position().clone())
        .unwrap_or_else(|| SourcePosition::new(String::new(), String::new(), 0, 0, 0, 0))
}
