//! Reserved names, identifier sanitization, and the per-compilation stage-id counters.

use crate::error::SourcePosition;
use crate::ir::error::LowerError;

/// Name of the synthetic inputs stage of an unlocked workflow's backbone.
pub const COMMON_STAGE_NAME: &str = "common";

/// Suffix carried by the output-section applet's name.
pub const OUTPUTS_APPLET_SUFFIX: &str = "outputs";

/// Name of the reorganization stage, when requested.
pub const REORG_STAGE_NAME: &str = "reorg";

/// Fixed stage id of the output-section stage (the "last-stage marker").
pub const LAST_STAGE_ID: &str = "stage-outputs";

/// Applet-name prefixes a call alias/task name must not begin with.
pub const RESERVED_APPLET_PREFIXES: &[&str] = &["stage-", "applet-"];

/// Substrings a call alias/task name must not contain.
pub const RESERVED_SUBSTRINGS: &[&str] = &["__"];

/// URL prefix identifying a platform-hosted docker image asset.
pub const DX_URL_PREFIX: &str = "dx://";

/// Runtime-section key holding the docker image reference.
pub const DOCKER_ATTR: &str = "docker";

/// Runtime-section keys that jointly determine a task's instance type.
pub const INSTANCE_TYPE_ATTRS: [&str; 4] = ["memory", "disks", "cpu", "dx_instance_type"];

/// Sanitize a source-visible variable name into its platform-legal `dxVarName`:
/// dots (illegal at the platform boundary) become underscores.
pub fn dx_var_name(name: &str) -> String {
    name.replace('.', "_")
}

/// Reject a call's stage name if it collides with a reserved prefix, substring,
/// or the fixed last-stage marker.
pub fn validate_call_name(name: &str, pos: &SourcePosition) -> Result<(), LowerError> {
    if name == LAST_STAGE_ID {
        return Err(LowerError::illegal_call_name(
            pos.clone(),
            name.to_string(),
            "equals the reserved last-stage marker".to_string(),
        ));
    }
    if let Some(prefix) = RESERVED_APPLET_PREFIXES.iter().find(|p| name.starts_with(**p)) {
        return Err(LowerError::illegal_call_name(
            pos.clone(),
            name.to_string(),
            format!("begins with reserved prefix '{}'", prefix),
        ));
    }
    if let Some(sub) = RESERVED_SUBSTRINGS.iter().find(|s| name.contains(**s)) {
        return Err(LowerError::illegal_call_name(
            pos.clone(),
            name.to_string(),
            format!("contains reserved substring '{}'", sub),
        ));
    }
    Ok(())
}

/// Monotonic, compilation-local counters for synthetic stage/applet names.
///
/// A fresh instance is created per call to [`crate::ir::assembler::build_backbone`];
/// it is never process-wide, so two concurrent compilations never share state (P6).
#[derive(Debug, Default)]
pub struct StageCounters {
    eval: u32,
    scatter: u32,
    conditional: u32,
    stage: u32,
}

impl StageCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_eval_name(&mut self) -> String {
        self.eval += 1;
        format!("eval{}", self.eval)
    }

    pub fn next_scatter_name(&mut self) -> String {
        self.scatter += 1;
        format!("scatter{}", self.scatter)
    }

    pub fn next_if_name(&mut self) -> String {
        self.conditional += 1;
        format!("if{}", self.conditional)
    }

    /// Assign the next ordinary (non-fixed) stage id, in block-emission order.
    pub fn next_stage_id(&mut self) -> String {
        let id = format!("stage-{}", self.stage);
        self.stage += 1;
        id
    }

    /// The fixed id reserved for the output-section stage.
    pub fn output_section_stage_id(&self) -> String {
        LAST_STAGE_ID.to_string()
    }
}
