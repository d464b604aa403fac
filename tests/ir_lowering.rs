//! End-to-end tests for the WDL-to-staged-workflow-graph lowering pass.

use flowdx::ir::{self, AppletKind, CVar, CompileOptions, LowerError, SArg};
use flowdx::parser;
use flowdx::types::Type;

fn compile(source: &str, opts: CompileOptions) -> Result<ir::Namespace, LowerError> {
    let mut document = parser::parse_document(source, "1.0").expect("parse");
    document.typecheck().expect("typecheck");
    let resolver = ir::resolver::NullDxUrlResolver;
    ir::compile_namespace(&document, &opts, &resolver)
}

fn locked() -> CompileOptions {
    CompileOptions { locked: true, reorg: false }
}

fn unlocked() -> CompileOptions {
    CompileOptions { locked: false, reorg: false }
}

const ADD_MUL_TASKS: &str = r#"
task Add {
    input {
        Int a
        Int b
    }
    command <<<
        echo $(( ~{a} + ~{b} ))
    >>>
    output {
        Int result = read_int(stdout())
    }
}

task Mul {
    input {
        Int a
        Int b
    }
    command <<<
        echo $(( ~{a} * ~{b} ))
    >>>
    output {
        Int result = read_int(stdout())
    }
}
"#;

/// Scenario 1: a plain call chain with an intervening declaration produces
/// `common, Add, eval1, Mul`, with `eval1` taking its input from `Add.result`
/// and `Mul` taking its input from `eval1`'s output.
#[test]
fn simple_call_chain_produces_common_add_eval_mul() {
    let source = format!(
        r#"
version 1.0
{ADD_MUL_TASKS}
workflow wf1 {{
    input {{
        Int ai
    }}
    call Add {{ input: a = ai, b = 3 }}
    Int xtmp = Add.result + 10
    call Mul {{ input: a = xtmp, b = 2 }}
}}
"#
    );

    let namespace = compile(&source, unlocked()).expect("compile");
    let workflow = namespace.workflow.expect("workflow");

    let stage_names: Vec<&str> = workflow.stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(stage_names, vec!["common", "Add", "eval1", "Mul"]);

    let eval1 = workflow.stages.iter().find(|s| s.name == "eval1").unwrap();
    assert_eq!(eval1.inputs.len(), 1);
    match &eval1.inputs[0] {
        SArg::Link { stage_name, .. } => assert_eq!(stage_name, "Add"),
        other => panic!("expected eval1's input linked to Add, got {other:?}"),
    }

    let mul = workflow.stages.iter().find(|s| s.name == "Mul").unwrap();
    match &mul.inputs[0] {
        SArg::Link { stage_name, .. } => assert_eq!(stage_name, "eval1"),
        other => panic!("expected Mul's 'a' input linked to eval1, got {other:?}"),
    }
    match &mul.inputs[1] {
        SArg::Constant(_) => {}
        other => panic!("expected Mul's 'b' input to be a constant, got {other:?}"),
    }
}

const INC_TWICE_MOD7_TASKS: &str = r#"
task Inc {
    input {
        Int i
    }
    command <<<
        echo $(( ~{i} + 1 ))
    >>>
    output {
        Int result = read_int(stdout())
    }
}

task Twice {
    input {
        Int i
    }
    command <<<
        echo $(( ~{i} * 2 ))
    >>>
    output {
        Int result = read_int(stdout())
    }
}

task Mod7 {
    input {
        Int i
    }
    command <<<
        echo $(( ~{i} % 7 ))
    >>>
    output {
        Int result = read_int(stdout())
    }
}
"#;

/// Scenario 2: a scatter over a range computed from a preceding declaration
/// (the front end is assumed to have already lifted the collection
/// expression to a bare variable) produces a single scatter applet whose
/// outputs are the per-call results, each lifted to a sequence.
#[test]
fn scatter_lifts_call_outputs_to_sequences() {
    let source = format!(
        r#"
version 1.0
{INC_TWICE_MOD7_TASKS}
workflow wf2 {{
    input {{
        Array[Int] nums
    }}
    Array[Int] indices = range(length(nums))
    scatter (k in indices) {{
        call Inc {{ input: i = nums[k] }}
        call Twice {{ input: i = Inc.result }}
        call Mod7 {{ input: i = Twice.result }}
    }}
}}
"#
    );

    let namespace = compile(&source, locked()).expect("compile");
    let workflow = namespace.workflow.expect("workflow");

    assert_eq!(workflow.stages.len(), 1, "expected a single scatter stage");
    let stage = &workflow.stages[0];
    assert_eq!(stage.name, "scatter1");

    let applet = namespace.applets.get(&stage.applet_name).expect("scatter applet");
    assert!(matches!(applet.kind, AppletKind::Scatter(_)));

    let expect_seq_int = CVar::new("Inc.result", Type::array(Type::int(false), false, false));
    let outputs_by_name: std::collections::HashMap<&str, &CVar> =
        applet.outputs.iter().map(|cv| (cv.name.as_str(), cv)).collect();
    assert_eq!(outputs_by_name["Inc.result"].ty, expect_seq_int.ty);
    assert_eq!(
        outputs_by_name["Twice.result"].ty,
        Type::array(Type::int(false), false, false)
    );
    assert_eq!(
        outputs_by_name["Mod7.result"].ty,
        Type::array(Type::int(false), false, false)
    );
    // range/length computed inside the applet, not a separate stage.
    assert_eq!(outputs_by_name["indices"].ty, Type::array(Type::int(false), false, false));
}

/// Scenario 3: a conditional whose body opens with plain declarations
/// absorbs them as local computation; its call outputs are lifted to
/// optional.
#[test]
fn conditional_lifts_call_outputs_to_optional() {
    let source = format!(
        r#"
version 1.0
{ADD_MUL_TASKS}
workflow wf3 {{
    input {{
        Array[Int] numbers
    }}
    if (length(numbers) > 0) {{
        Int f0 = 2
        Int f1 = 3
        call Add as a1 {{ input: a = f0, b = f1 }}
        call Add as a2 {{ input: a = a1.result, b = f1 }}
    }}
}}
"#
    );

    let namespace = compile(&source, locked()).expect("compile");
    let workflow = namespace.workflow.expect("workflow");

    assert_eq!(workflow.stages.len(), 1);
    let stage = &workflow.stages[0];
    assert_eq!(stage.name, "if1");

    let applet = namespace.applets.get(&stage.applet_name).expect("if applet");
    assert!(matches!(applet.kind, AppletKind::If(_)));

    let outputs_by_name: std::collections::HashMap<&str, &CVar> =
        applet.outputs.iter().map(|cv| (cv.name.as_str(), cv)).collect();
    assert_eq!(outputs_by_name["a1.result"].ty, Type::int(true));
    assert_eq!(outputs_by_name["a2.result"].ty, Type::int(true));

    // The applet's only closed-over input is `numbers`, referenced by the
    // controlling expression.
    assert_eq!(applet.inputs.len(), 1);
    assert_eq!(applet.inputs[0].name, "numbers");
}

/// Scenario 4: a locked workflow that omits a required call input is a
/// fatal error.
#[test]
fn locked_workflow_missing_required_input_is_fatal() {
    let source = format!(
        r#"
version 1.0
{ADD_MUL_TASKS}
workflow wf4 {{
    call Add {{ input: a = 1 }}
}}
"#
    );

    let err = compile(&source, locked()).expect_err("expected a fatal error");
    match err {
        LowerError::MissingRequiredCallInput { call_name, input_name, .. } => {
            assert_eq!(call_name, "Add");
            assert_eq!(input_name, "b");
        }
        other => panic!("expected MissingRequiredCallInput, got {other:?}"),
    }
}

/// Scenario 5a: the same program in an unlocked workflow compiles; the
/// missing input becomes `SArg::Empty` rather than a fatal error.
#[test]
fn unlocked_workflow_missing_required_input_becomes_empty() {
    let source = format!(
        r#"
version 1.0
{ADD_MUL_TASKS}
workflow wf5 {{
    call Add {{ input: a = 1 }}
}}
"#
    );

    let namespace = compile(&source, unlocked()).expect("compile");
    let workflow = namespace.workflow.unwrap();
    let add_stage = workflow.stages.iter().find(|s| s.name == "Add").unwrap();
    assert!(matches!(add_stage.inputs[1], SArg::Empty));
}

/// Scenario 5b: inside a scatter body, the same situation additionally
/// synthesizes an extra propagated input CVar named `<call>_<input>`.
#[test]
fn unlocked_scatter_missing_required_input_adds_extra_cvar() {
    let source = format!(
        r#"
version 1.0
{ADD_MUL_TASKS}
workflow wf6 {{
    input {{
        Array[Int] items
    }}
    scatter (x in items) {{
        call Add {{ input: a = x }}
    }}
}}
"#
    );

    let namespace = compile(&source, unlocked()).expect("compile");
    let workflow = namespace.workflow.unwrap();
    let scatter_stage = &workflow.stages[0];
    let applet = namespace.applets.get(&scatter_stage.applet_name).unwrap();

    let input_names: Vec<&str> = applet.inputs.iter().map(|c| c.name.as_str()).collect();
    assert!(input_names.contains(&"items"));
    assert!(input_names.contains(&"Add_b"));

    let extra = applet.inputs.iter().find(|c| c.name == "Add_b").unwrap();
    assert_eq!(extra.original_fqn.as_deref(), Some("Add.b"));
}

/// Scenario 6: a task whose instance type depends on a runtime value (here,
/// `size()` of an input that isn't available at compile time) gets
/// `InstanceType::Runtime`, with no other effect on the applet.
#[test]
fn dynamic_instance_type_from_runtime_only_expression() {
    let source = r#"
version 1.0
task Sized {
    input {
        File f
    }
    command <<<
        echo ok
    >>>
    output {
        Int n = 1
    }
    runtime {
        memory: size(f)
    }
}

workflow wf7 {
    input {
        File input_file
    }
    call Sized { input: f = input_file }
}
"#;

    let namespace = compile(source, locked()).expect("compile");
    let applet = namespace.applets.get("Sized").expect("Sized applet");
    assert!(matches!(applet.instance_type, ir::InstanceType::Runtime));
    assert!(matches!(applet.docker, ir::DockerImage::None));
    assert!(matches!(applet.kind, AppletKind::Task));
}

/// P2 spot-check: every stage's `inputs` is positionally aligned with its
/// applet's declared `inputs`.
#[test]
fn stage_inputs_align_in_arity_with_applet_inputs() {
    let source = format!(
        r#"
version 1.0
{ADD_MUL_TASKS}
workflow wf8 {{
    input {{
        Int ai
    }}
    call Add {{ input: a = ai, b = 3 }}
}}
"#
    );

    let namespace = compile(&source, locked()).expect("compile");
    let workflow = namespace.workflow.unwrap();
    for stage in &workflow.stages {
        let applet = namespace.applets.get(&stage.applet_name).unwrap();
        assert_eq!(
            stage.inputs.len(),
            applet.inputs.len(),
            "stage '{}' input arity does not match applet '{}'",
            stage.name,
            stage.applet_name
        );
    }
}

/// P6 spot-check: two independent compilations of the same source produce
/// identical stage ids and names -- the id counters are compilation-local,
/// never process-wide shared state.
#[test]
fn stage_ids_are_deterministic_across_independent_compilations() {
    let source = format!(
        r#"
version 1.0
{ADD_MUL_TASKS}
workflow wf9 {{
    input {{
        Int ai
    }}
    call Add {{ input: a = ai, b = 3 }}
    Int xtmp = Add.result + 10
    call Mul {{ input: a = xtmp, b = 2 }}
}}
"#
    );

    let ns1 = compile(&source, unlocked()).unwrap();
    let ns2 = compile(&source, unlocked()).unwrap();
    let w1 = ns1.workflow.unwrap();
    let w2 = ns2.workflow.unwrap();

    let ids1: Vec<&str> = w1.stages.iter().map(|s| s.stage_id.as_str()).collect();
    let ids2: Vec<&str> = w2.stages.iter().map(|s| s.stage_id.as_str()).collect();
    assert_eq!(ids1, ids2);
}
