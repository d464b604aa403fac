//! The IR data model: CVar, SArg, LinkedVar, CallEnv, Applet, Stage, Workflow, Namespace.
//!
//! `CallEnv` is built directly on [`crate::env::Bindings`] rather than a bespoke
//! map: `Bindings` already gives the insertion-ordered, structurally-shared,
//! shadow-on-rebind environment called for by an immutable symbol table.

use crate::env::Bindings;
use crate::ir::ids::dx_var_name;
use crate::types::Type;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declaration-level attributes carried by a CVar; currently just a compile-time
/// default literal, populated when the source declaration's initializer folds
/// to a constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeclAttrs {
    pub default: Option<Value>,
}

/// A typed compile-time variable: the declared shape of one applet input or
/// output, or one workflow input/output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CVar {
    /// The source-visible identifier.
    pub name: String,
    /// Sanitized form with dots replaced by underscores; illegal at the
    /// platform boundary otherwise.
    pub dx_var_name: String,
    pub ty: Type,
    pub attrs: DeclAttrs,
    /// The original dotted name, when this CVar represents a propagated
    /// unbound task input synthesized for an unlocked scatter/conditional.
    pub original_fqn: Option<String>,
}

impl CVar {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        let name = name.into();
        let dx_var_name = dx_var_name(&name);
        CVar {
            name,
            dx_var_name,
            ty,
            attrs: DeclAttrs::default(),
            original_fqn: None,
        }
    }

    pub fn with_default(mut self, default: Option<Value>) -> Self {
        self.attrs.default = default;
        self
    }

    pub fn with_original_fqn(mut self, fqn: impl Into<String>) -> Self {
        self.original_fqn = Some(fqn.into());
        self
    }
}

/// A stage argument: how one applet input is satisfied in the current scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SArg {
    /// No value supplied; the platform must provide one at runtime.
    Empty,
    /// A compile-time constant.
    Constant(Value),
    /// Reads `cvar.name` from the named stage's outputs.
    Link { stage_name: String, cvar: CVar },
    /// Supplied as a workflow-level input.
    WorkflowInput(CVar),
}

/// A declared shape together with how it is currently satisfied.
pub type LinkedVar = (CVar, SArg);

/// Symbol table mapping a fully qualified source name (`A`, `A.x`, `A.B.x`) to
/// a [`LinkedVar`]. Grows monotonically as the backbone is assembled.
#[derive(Debug, Clone)]
pub struct CallEnv {
    bindings: Bindings<LinkedVar>,
}

impl CallEnv {
    pub fn new() -> Self {
        CallEnv {
            bindings: Bindings::new(),
        }
    }

    /// Bind `key` to `value`, returning the grown environment. `key` must not
    /// already be present (CallEnv keys are required to be unique).
    pub fn bind(&self, key: impl Into<String>, value: LinkedVar) -> Self {
        CallEnv {
            bindings: self.bindings.bind(key.into(), value, None),
        }
    }

    pub fn resolve(&self, key: &str) -> Option<&LinkedVar> {
        self.bindings.resolve(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.bindings.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LinkedVar)> {
        self.bindings.iter().map(|b| (b.name(), b.value()))
    }
}

impl Default for CallEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// A task's resolved instance-type decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InstanceTypeSpec {
    pub memory: Option<Value>,
    pub disks: Option<Value>,
    pub cpu: Option<Value>,
    pub dx_instance_type: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstanceType {
    Default,
    /// The decision must be deferred to job-start time.
    Runtime,
    Concrete(InstanceTypeSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DockerImage {
    None,
    /// Pulled over the network at execution time.
    Network,
    /// Resolved to a platform asset record id, embedded in the fragment.
    DxAsset(String),
}

/// Maps a call's alias to the underlying task name, so the runtime can
/// reconstruct per-iteration/per-branch linkage for Scatter/If applets.
pub type CallDict = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppletKind {
    Task,
    Native(String),
    Eval,
    Scatter(CallDict),
    ScatterCollect(CallDict),
    If(CallDict),
    WorkflowOutputReorg,
}

/// A leaf IR executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applet {
    pub name: String,
    pub inputs: Vec<CVar>,
    pub outputs: Vec<CVar>,
    pub instance_type: InstanceType,
    pub docker: DockerImage,
    pub kind: AppletKind,
    /// Self-contained WDL source re-parseable by the external parser (P7).
    pub source_fragment: String,
}

/// A node in the workflow backbone, bound to an applet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub stage_id: String,
    pub applet_name: String,
    /// Positionally aligned with `applet(appletName).inputs`.
    pub inputs: Vec<SArg>,
    /// A copy of the applet's outputs.
    pub outputs: Vec<CVar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub inputs: Vec<(CVar, SArg)>,
    pub outputs: Vec<(CVar, SArg)>,
    pub stages: Vec<Stage>,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub workflow: Option<Workflow>,
    pub applets: IndexMap<String, Applet>,
}

/// Flags accepted by the top-level driver (spec §6 Inputs).
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    pub locked: bool,
    pub reorg: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            locked: true,
            reorg: false,
        }
    }
}
