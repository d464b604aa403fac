//! Segments a workflow body into an ordered sequence of blocks (spec §4.2).

use crate::tree::{Call, Conditional, Declaration, Scatter, WorkflowElement};

#[derive(Debug, Clone)]
pub enum Block {
    /// A maximal run of consecutive declarations not immediately followed by
    /// a scatter or conditional.
    DeclRun(Vec<Declaration>),
    /// A conditional, with any declarations immediately preceding it
    /// absorbed as `preDecls`.
    IfBlock(Vec<Declaration>, Conditional),
    /// A scatter, with any declarations immediately preceding it absorbed as
    /// `preDecls`.
    ScatterBlock(Vec<Declaration>, Scatter),
    /// A single call.
    CallBlock(Call),
}

/// Single pass over `children`, accumulating a pending declaration run. On a
/// scatter/conditional the pending run is flushed into it as `preDecls`; on a
/// call the pending run is first flushed as its own `DeclRun`, then the call
/// becomes a `CallBlock`; any trailing run is flushed at the end.
pub fn partition_blocks(children: &[WorkflowElement]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending: Vec<Declaration> = Vec::new();

    for child in children {
        match child {
            WorkflowElement::Declaration(d) => pending.push(d.clone()),
            WorkflowElement::Scatter(s) => {
                blocks.push(Block::ScatterBlock(std::mem::take(&mut pending), (**s).clone()));
            }
            WorkflowElement::Conditional(c) => {
                blocks.push(Block::IfBlock(std::mem::take(&mut pending), (**c).clone()));
            }
            WorkflowElement::Call(c) => {
                if !pending.is_empty() {
                    blocks.push(Block::DeclRun(std::mem::take(&mut pending)));
                }
                blocks.push(Block::CallBlock(c.clone()));
            }
        }
    }
    if !pending.is_empty() {
        blocks.push(Block::DeclRun(pending));
    }
    blocks
}
