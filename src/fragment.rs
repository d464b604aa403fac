//! A minimal WDL pretty-printer, standing in for the platform's own
//! pretty-printer (out of scope per the IR generator's own design -- see
//! `ir` module docs). The IR generator calls this to serialize a synthesized
//! workflow fragment and hands it straight back to `parser::document` for a
//! round-trip legality check; the generated text is never meant to be
//! pleasant to read, only parseable.

use crate::expr::Expression;
use crate::parser::document::parse_document;
use crate::tree::{Call, Conditional, Declaration, Scatter, Task, WorkflowElement};

/// Verify that `fragment` round-trips through the external parser. Returns
/// the parse error's display text on failure.
pub fn check_reparses(wdl_version: &str, fragment: &str) -> Result<(), String> {
    parse_document(fragment, wdl_version)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

pub fn render_declaration(decl: &Declaration) -> String {
    match &decl.expr {
        Some(expr) => format!("{} {} = {}", decl.decl_type, decl.name, render_expr(expr)),
        None => format!("{} {}", decl.decl_type, decl.name),
    }
}

fn render_expr(expr: &Expression) -> String {
    format!("{}", expr)
}

pub fn render_call(call: &Call) -> String {
    let mut out = format!("call {}", call.task);
    if let Some(alias) = &call.alias {
        out.push_str(&format!(" as {}", alias));
    }
    if !call.inputs.is_empty() {
        let mut pairs: Vec<&String> = call.inputs.keys().collect();
        pairs.sort();
        let rendered: Vec<String> = pairs
            .into_iter()
            .map(|name| format!("{} = {}", name, render_expr(&call.inputs[name])))
            .collect();
        out.push_str(&format!(" {{ input: {} }}", rendered.join(", ")));
    }
    out
}

pub fn render_scatter(scatter: &Scatter) -> String {
    format!(
        "scatter ({} in {}) {{\n{}\n}}",
        scatter.variable,
        render_expr(&scatter.expr),
        render_elements(&scatter.body)
    )
}

pub fn render_conditional(cond: &Conditional) -> String {
    format!(
        "if ({}) {{\n{}\n}}",
        render_expr(&cond.expr),
        render_elements(&cond.body)
    )
}

pub fn render_elements(elements: &[WorkflowElement]) -> String {
    elements
        .iter()
        .map(|e| match e {
            WorkflowElement::Declaration(d) => render_declaration(d),
            WorkflowElement::Call(c) => render_call(c),
            WorkflowElement::Scatter(s) => render_scatter(s),
            WorkflowElement::Conditional(c) => render_conditional(c),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a stub task: its interface (inputs/outputs) only, no command or
/// runtime section. Used to let a synthesized scatter/conditional fragment
/// reference callees by interface without re-including their bodies.
pub fn render_stub_task(task: &Task) -> String {
    let inputs: Vec<String> = task.inputs.iter().map(render_declaration).collect();
    let outputs: Vec<String> = task.outputs.iter().map(render_declaration).collect();
    format!(
        "task {} {{\n  input {{\n    {}\n  }}\n  command <<<\n  >>>\n  output {{\n    {}\n  }}\n}}",
        task.name,
        inputs.join("\n    "),
        outputs.join("\n    ")
    )
}

/// Render the full task (used for the Task-kind applet's own fragment).
pub fn render_task(task: &Task) -> String {
    let inputs: Vec<String> = task.inputs.iter().map(render_declaration).collect();
    let postinputs: Vec<String> = task.postinputs.iter().map(render_declaration).collect();
    let outputs: Vec<String> = task.outputs.iter().map(render_declaration).collect();
    let runtime: Vec<String> = task
        .runtime
        .iter()
        .map(|(k, v)| format!("    {}: {}", k, render_expr(v)))
        .collect();
    format!(
        "task {name} {{\n  input {{\n    {inputs}\n  }}\n  {postinputs}\n  command <<<\n{command}\n  >>>\n  output {{\n    {outputs}\n  }}\n  runtime {{\n{runtime}\n  }}\n}}",
        name = task.name,
        inputs = inputs.join("\n    "),
        postinputs = postinputs.join("\n  "),
        command = render_expr(&task.command),
        outputs = outputs.join("\n    "),
        runtime = runtime.join("\n"),
    )
}

/// Render a synthesized workflow fragment: the given stub tasks, followed by
/// a workflow containing `inputs` as declarations and `body` verbatim.
pub fn render_synthetic_fragment(
    wdl_version: &str,
    stub_tasks: &[&Task],
    workflow_name: &str,
    input_decls: &[Declaration],
    body: &[WorkflowElement],
) -> String {
    let mut out = format!("version {}\n\n", wdl_version);
    for task in stub_tasks {
        out.push_str(&render_stub_task(task));
        out.push_str("\n\n");
    }
    out.push_str(&format!("workflow {} {{\n", workflow_name));
    for decl in input_decls {
        out.push_str(&render_declaration(decl));
        out.push('\n');
    }
    out.push_str(&render_elements(body));
    out.push_str("\n}\n");
    out
}
