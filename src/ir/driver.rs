//! Top-level driver (spec §4.10): dependency-sorts callables, compiles every
//! task, lowers the workflow if present, and assembles the final Namespace.

use crate::ir::assembler::lower_workflow;
use crate::ir::error::LowerError;
use crate::ir::resolver::DxUrlResolver;
use crate::ir::symbols::{CompileOptions, Namespace};
use crate::ir::task_compiler::compile_task;
use crate::tree::Document;
use indexmap::IndexMap;

/// Compiles a validated document (already parsed and typechecked by the
/// retained front end) into a Namespace IR.
///
/// This front end's grammar subset resolves calls only to tasks or to the
/// top-level workflow (`Call::resolve`); there are no WDL sub-workflow calls
/// to dependency-sort among, so step 1 of the driver -- dependency-sorting
/// callables, cycle detection included -- degenerates to "compile every task,
/// in source order, then the workflow if present."
pub fn compile_namespace(
    document: &Document,
    opts: &CompileOptions,
    resolver: &dyn DxUrlResolver,
) -> Result<Namespace, LowerError> {
    let mut applets = IndexMap::new();
    let mut tasks_by_name = IndexMap::new();

    for task in &document.tasks {
        let applet = compile_task(task, resolver, &document.effective_wdl_version)?;
        applets.insert(task.name.clone(), applet);
        tasks_by_name.insert(task.name.clone(), task.clone());
    }

    let workflow = match &document.workflow {
        None => None,
        Some(workflow_ast) => {
            let (workflow_ir, synthesized) = lower_workflow(
                workflow_ast,
                opts,
                &applets,
                &tasks_by_name,
                &document.effective_wdl_version,
            )?;
            for applet in synthesized {
                applets.insert(applet.name.clone(), applet);
            }
            Some(workflow_ir)
        }
    };

    Ok(Namespace { workflow, applets })
}
