//! Lowers a task AST to an [`Applet`].

use crate::error::HasSourcePosition;
use crate::fragment::{check_reparses, render_task};
use crate::ir::error::LowerError;
use crate::ir::expr_utils::try_const_eval;
use crate::ir::ids::{DOCKER_ATTR, DX_URL_PREFIX, INSTANCE_TYPE_ATTRS};
use crate::ir::resolver::DxUrlResolver;
use crate::ir::symbols::{Applet, AppletKind, CVar, DockerImage, InstanceType, InstanceTypeSpec};
use crate::tree::{Declaration, Task};
use crate::value::Value;

/// Task declarations eligible to become applet input CVars, per spec §4.4:
/// unassigned, assigned to a constant, or optionally typed. When the task
/// carries an explicit `input {}` section, every declaration in it is a
/// formal input regardless (this predicate is then trivially satisfied by
/// construction); the predicate only does real work for a task without one,
/// where ordinary body declarations stand in for inputs.
fn is_input_candidate(decl: &Declaration, wdl_version: &str) -> bool {
    match &decl.expr {
        None => true,
        Some(expr) => try_const_eval(expr, wdl_version).is_some() || decl.decl_type.is_optional(),
    }
}

pub fn compile_task(
    task: &Task,
    resolver: &dyn DxUrlResolver,
    wdl_version: &str,
) -> Result<Applet, LowerError> {
    let candidate_decls: Vec<&Declaration> = if !task.inputs.is_empty() {
        task.inputs.iter().collect()
    } else {
        task.postinputs
            .iter()
            .filter(|d| is_input_candidate(d, wdl_version))
            .collect()
    };

    let inputs: Vec<CVar> = candidate_decls
        .iter()
        .map(|decl| {
            let default = decl
                .expr
                .as_ref()
                .and_then(|e| try_const_eval(e, wdl_version));
            CVar::new(decl.name.clone(), decl.decl_type.clone()).with_default(default)
        })
        .collect();

    let outputs: Vec<CVar> = task
        .outputs
        .iter()
        .map(|decl| CVar::new(decl.name.clone(), decl.decl_type.clone()))
        .collect();

    let instance_type = compute_instance_type(task, wdl_version);
    let (docker, mut effective_task) = resolve_docker(task, resolver, wdl_version)?;

    let kind = if is_native(task) {
        AppletKind::Native(native_id(task))
    } else {
        AppletKind::Task
    };

    if let DockerImage::DxAsset(record_id) = &docker {
        effective_task
            .runtime
            .insert(DOCKER_ATTR.to_string(), string_literal_expr(task, record_id));
    }

    let source_fragment = render_task(&effective_task);
    check_reparses(wdl_version, &source_fragment).map_err(|parse_error| {
        LowerError::IllegalGeneratedFragment {
            pos: task.source_position().clone(),
            applet_name: task.name.clone(),
            fragment: source_fragment.clone(),
            parse_error,
        }
    })?;

    Ok(Applet {
        name: task.name.clone(),
        inputs,
        outputs,
        instance_type,
        docker,
        kind,
        source_fragment,
    })
}

fn compute_instance_type(task: &Task, wdl_version: &str) -> InstanceType {
    let mut spec = InstanceTypeSpec::default();
    let mut any_present = false;
    for key in INSTANCE_TYPE_ATTRS {
        if let Some(expr) = task.runtime.get(key) {
            any_present = true;
            match try_const_eval(expr, wdl_version) {
                Some(value) => assign_instance_field(&mut spec, key, value),
                None => return InstanceType::Runtime,
            }
        }
    }
    if any_present {
        InstanceType::Concrete(spec)
    } else {
        InstanceType::Default
    }
}

fn assign_instance_field(spec: &mut InstanceTypeSpec, key: &str, value: Value) {
    match key {
        "memory" => spec.memory = Some(value),
        "disks" => spec.disks = Some(value),
        "cpu" => spec.cpu = Some(value),
        "dx_instance_type" => spec.dx_instance_type = Some(value),
        _ => {}
    }
}

/// Resolve the `docker` runtime attribute. Returns the effective task (with
/// the runtime attribute possibly rewritten to a resolved record id, to avoid
/// a second lookup at execution time).
fn resolve_docker(
    task: &Task,
    resolver: &dyn DxUrlResolver,
    wdl_version: &str,
) -> Result<(DockerImage, Task), LowerError> {
    let effective = task.clone();
    let Some(expr) = task.runtime.get(DOCKER_ATTR) else {
        return Ok((DockerImage::None, effective));
    };
    match try_const_eval(expr, wdl_version) {
        Some(Value::String { value, .. }) if value.starts_with(DX_URL_PREFIX) => {
            let record_id = resolver.resolve(&value)?;
            Ok((DockerImage::DxAsset(record_id), effective))
        }
        _ => Ok((DockerImage::Network, effective)),
    }
}

fn is_native(task: &Task) -> bool {
    matches!(
        task.meta.get("type"),
        Some(serde_json::Value::String(s)) if s == "native"
    ) && matches!(task.meta.get("id"), Some(serde_json::Value::String(_)))
}

fn native_id(task: &Task) -> String {
    match task.meta.get("id") {
        Some(serde_json::Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn string_literal_expr(task: &Task, value: &str) -> crate::expr::Expression {
    crate::expr::Expression::String {
        pos: task.source_position().clone(),
        parts: vec![crate::expr::StringPart::Text(value.to_string())],
        inferred_type: None,
    }
}
