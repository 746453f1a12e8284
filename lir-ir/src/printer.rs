//! Canonical text form of a program
//!
//! Leaf entities (types, operands, instructions, terminators) implement
//! `Display` next to their definitions in `ir`. This module renders the
//! containers. Hash-map backed namespaces are printed sorted by name so
//! the same program always renders to the same text; blocks are sorted by
//! label with `entry` first.

use crate::ir::{BasicBlock, Function, Program, StructDecl, Type};
use std::collections::HashMap;
use std::fmt;
use std::io;

/// Label of the block that conventionally starts a function
pub const ENTRY_LABEL: &str = "entry";

fn sorted<V>(map: &HashMap<String, V>) -> Vec<(&String, &V)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Blocks of `function` in print order
pub fn block_order(function: &Function) -> Vec<&BasicBlock> {
    let mut blocks: Vec<_> = function.body.values().collect();
    blocks.sort_by(|a, b| {
        (a.label != ENTRY_LABEL, &a.label).cmp(&(b.label != ENTRY_LABEL, &b.label))
    });
    blocks
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.label)?;
        for inst in &self.insts {
            writeln!(f, "  {}", inst)?;
        }
        writeln!(f, "  {}", self.term)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{}:{}", param.name, param.ty)?;
        }
        write!(f, ")")?;
        if let Some(ret_ty) = &self.ret_ty {
            write!(f, " -> {}", ret_ty)?;
        }
        writeln!(f, " {{")?;

        if !self.locals.is_empty() {
            write!(f, "let ")?;
            for (i, (name, ty)) in sorted(&self.locals).into_iter().enumerate() {
                if i > 0 { write!(f, ", ")?; }
                write!(f, "{}:{}", name, ty)?;
            }
            writeln!(f)?;
        }

        for block in block_order(self) {
            write!(f, "{}", block)?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for StructDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "struct {} {{", self.name)?;
        for field in &self.fields {
            writeln!(f, "  {}:{}", field.name, field.ty)?;
        }
        writeln!(f, "}}")
    }
}

fn render_typed(entries: &HashMap<String, Type>, prefix: &str) -> String {
    sorted(entries)
        .into_iter()
        .map(|(name, ty)| format!("{}{}:{}\n", prefix, name, ty))
        .collect()
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let structs: Vec<String> = sorted(&self.structs)
            .into_iter()
            .map(|(_, decl)| decl.to_string())
            .collect();
        let functions: Vec<String> = sorted(&self.functions)
            .into_iter()
            .map(|(_, function)| function.to_string())
            .collect();

        let sections = [
            structs.join("\n"),
            render_typed(&self.externs, "extern "),
            render_typed(&self.globals, ""),
            functions.join("\n"),
        ];

        for (i, section) in sections.iter().filter(|s| !s.is_empty()).enumerate() {
            if i > 0 { writeln!(f)?; }
            write!(f, "{}", section)?;
        }
        Ok(())
    }
}

/// Write the canonical form of `program` to `out`
pub fn write_program<W: io::Write>(program: &Program, out: &mut W) -> io::Result<()> {
    write!(out, "{}", program)
}

/// Write the canonical form of a single function to `out`
pub fn write_function<W: io::Write>(function: &Function, out: &mut W) -> io::Result<()> {
    write!(out, "{}", function)
}
