//! Assigns labels to branch targets.
//!
//! Resolution happens in two passes over an immutable decoded sequence. The first pass walks
//! the branches in address order and gives each target it can find a label in discovery order.
//! The second pass renumbers the labels so that L1..Ln ascend with the target address.
use super::*;
use disasm::Instruction;
use std::collections::HashMap;

/// A 1-based label number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Label(pub usize);
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:width$}", format!("L{}", self.0), width = f.width().unwrap_or(0))
    }
}

/// What a listing line knows about where its instruction transfers control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// not a branch-capable instruction
    NotBranch,
    /// a branch whose target can't be determined statically
    Undefined,
    /// a branch to an address outside the decoded instructions
    Unresolved(u16),
    /// a branch to a labeled instruction
    Resolved(Label),
}

/// An instruction annotated by the resolver.
#[derive(Clone, Copy, Debug)]
pub struct Line {
    pub inst: Instruction,
    /// set if some branch targets this instruction
    pub label: Option<Label>,
    pub target: Target,
}

/// Resolves branch targets across the decoded sequence (which must be in address order).
pub fn resolve(insts: Vec<Instruction>) -> Vec<Line> {
    // first match wins if two instructions claim the same address
    let mut by_addr: HashMap<u16, usize> = HashMap::with_capacity(insts.len());
    for (i, inst) in insts.iter().enumerate() {
        by_addr.entry(inst.addr).or_insert(i);
    }
    // pass 1: discovery order
    let mut discovered: Vec<Option<usize>> = vec![None; insts.len()];
    let mut targets: Vec<Option<usize>> = vec![None; insts.len()];
    let mut next = 1usize;
    for (i, inst) in insts.iter().enumerate() {
        if let Some(&j) = inst.target().and_then(|t| by_addr.get(&t)) {
            if discovered[j].is_none() {
                discovered[j] = Some(next);
                next += 1;
            }
            targets[i] = Some(j);
        }
    }
    // pass 2: renumber by ascending target address
    let mut labeled: Vec<usize> = (0..insts.len()).filter(|&j| discovered[j].is_some()).collect();
    labeled.sort_by_key(|&j| insts[j].addr);
    let mut labels: Vec<Option<Label>> = vec![None; insts.len()];
    for (n, &j) in labeled.iter().enumerate() {
        labels[j] = Some(Label(n + 1));
    }
    insts
        .iter()
        .enumerate()
        .map(|(i, &inst)| Line {
            inst,
            label: labels[i],
            target: match (inst.is_branch(), targets[i], inst.target()) {
                (false, _, _) => Target::NotBranch,
                (true, Some(j), _) => Target::Resolved(labels[j].unwrap_or(Label(0))),
                (true, None, Some(addr)) => Target::Unresolved(addr),
                (true, None, None) => Target::Undefined,
            },
        })
        .collect()
}
