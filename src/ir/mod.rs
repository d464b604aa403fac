//! Lowers a validated WDL namespace into a staged workflow graph (IR) for
//! submission to the execution platform.
//!
//! The parsing, type-checking, and AST construction are handled entirely by
//! the rest of this crate (`parser`, `tree`, `types`, `expr`); this module
//! takes a validated [`crate::tree::Document`] as given and is concerned only
//! with lowering it to the platform's IR. The platform's own pretty-printer
//! and URL resolver are external collaborators, represented here by
//! [`fragment`](crate::fragment) and [`resolver::DxUrlResolver`] respectively.

pub mod assembler;
pub mod blocks;
pub mod call;
pub mod closure;
pub mod conditional;
pub mod driver;
pub mod error;
pub mod eval_block;
pub mod expr_utils;
pub mod ids;
pub mod resolver;
pub mod scatter;
pub mod symbols;
pub mod task_compiler;

pub use driver::compile_namespace;
pub use error::LowerError;
pub use symbols::{
    Applet, AppletKind, CVar, CallDict, CallEnv, CompileOptions, DeclAttrs, DockerImage, InstanceType,
    InstanceTypeSpec, LinkedVar, Namespace, SArg, Stage, Workflow,
};
