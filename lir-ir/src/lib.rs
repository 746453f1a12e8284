//! LIR loader - Intermediate Representation
//! 
//! This crate defines the in-memory model of a low-level IR program,
//! the conversion from the JSON document emitted by the compiler
//! front end, and a canonical text rendering used for diagnostics and
//! golden tests.

pub mod ir;
pub mod deserialize;
pub mod printer;

pub use ir::{
    ArithOp, BasicBlock, CmpOp, Field, Function, Instruction, Operand, Param, Program,
    StructDecl, Terminator, Type,
};
pub use deserialize::{
    parse_basic_block, parse_externs, parse_function, parse_functions, parse_globals,
    parse_instruction, parse_operand, parse_program, parse_program_str, parse_structs,
    parse_terminator, parse_type,
};
pub use printer::{write_function, write_program};
pub use lir_common::{DocPath, LoadError};
