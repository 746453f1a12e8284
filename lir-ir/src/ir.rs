//! LIR data model
//!
//! This module defines the in-memory representation of a low-level IR
//! program: the recursive type grammar, operands, straight-line
//! instructions, block terminators and the containers that own them.
//! Every nested structure is exclusively owned by its parent, so the
//! whole program is a tree and can be dropped or sent across threads
//! without any bookkeeping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Value types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// Scalar integer
    Int,

    /// Named aggregate, resolved against the struct declarations later
    Struct(String),

    /// Function signature; `ret` is `None` for functions returning nothing
    Fn { params: Vec<Type>, ret: Option<Box<Type>> },

    /// Pointer to another type
    Ptr(Box<Type>),
}

impl Type {
    /// Shorthand for building `Ptr(inner)`
    pub fn ptr(inner: Type) -> Self {
        Type::Ptr(Box::new(inner))
    }

    /// Shorthand for building a function signature
    pub fn func(params: Vec<Type>, ret: Option<Type>) -> Self {
        Type::Fn {
            params,
            ret: ret.map(Box::new),
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int)
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, Type::Ptr(_))
    }

    /// The referenced type of a pointer
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Ptr(inner) => Some(inner),
            _ => None,
        }
    }

    /// Name of the aggregate, for `Struct` types
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Type::Struct(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Struct(name) => write!(f, "struct {}", name),
            Type::Fn { params, ret } => {
                write!(f, "fn(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", param)?;
                }
                write!(f, ")")?;
                match ret {
                    Some(ret) => write!(f, " -> {}", ret),
                    None => Ok(()),
                }
            }
            Type::Ptr(inner) => write!(f, "&{}", inner),
        }
    }
}

/// Value reference used by instructions and terminators
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    /// Immediate constant
    Const(i32),

    /// Named variable, resolved against the enclosing scope later
    Var(String),
}

impl Operand {
    /// Variable name, for `Var` operands
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Operand::Var(name) => Some(name),
            Operand::Const(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Const(val) => write!(f, "{}", val),
            Operand::Var(name) => write!(f, "{}", name),
        }
    }
}

/// Arithmetic operators, in document code order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub const ALL: [ArithOp; 4] = [ArithOp::Add, ArithOp::Sub, ArithOp::Mul, ArithOp::Div];

    /// Operator for a document op-code (position in `ALL`)
    pub fn from_code(code: u64) -> Option<Self> {
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Operator for a mnemonic (`add`) or variant name (`Add`)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic() == name || op.variant_name() == name)
    }

    pub fn code(self) -> u64 {
        self as u64
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::Div => "div",
        }
    }

    /// Variant name as emitted by serde
    pub fn variant_name(self) -> &'static str {
        match self {
            ArithOp::Add => "Add",
            ArithOp::Sub => "Sub",
            ArithOp::Mul => "Mul",
            ArithOp::Div => "Div",
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Comparison operators, in document code order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CmpOp {
    pub const ALL: [CmpOp; 6] = [
        CmpOp::Eq,
        CmpOp::Neq,
        CmpOp::Lt,
        CmpOp::Lte,
        CmpOp::Gt,
        CmpOp::Gte,
    ];

    /// Operator for a document op-code (position in `ALL`)
    pub fn from_code(code: u64) -> Option<Self> {
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Operator for a mnemonic (`lt`) or variant name (`Lt`)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic() == name || op.variant_name() == name)
    }

    pub fn code(self) -> u64 {
        self as u64
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            CmpOp::Eq => "eq",
            CmpOp::Neq => "neq",
            CmpOp::Lt => "lt",
            CmpOp::Lte => "lte",
            CmpOp::Gt => "gt",
            CmpOp::Gte => "gte",
        }
    }

    /// Variant name as emitted by serde
    pub fn variant_name(self) -> &'static str {
        match self {
            CmpOp::Eq => "Eq",
            CmpOp::Neq => "Neq",
            CmpOp::Lt => "Lt",
            CmpOp::Lte => "Lte",
            CmpOp::Gt => "Gt",
            CmpOp::Gte => "Gte",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Straight-line (non-terminating) instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// lhs = $alloc num
    Alloc { lhs: String, num: Operand },

    /// lhs = $arith aop left right
    Arith {
        lhs: String,
        aop: ArithOp,
        left: Operand,
        right: Operand,
    },

    /// [lhs =] $call_ext callee(args...)
    CallExt {
        lhs: Option<String>,
        callee: String,
        args: Vec<Operand>,
    },

    /// lhs = $cmp aop left right
    Cmp {
        lhs: String,
        aop: CmpOp,
        left: Operand,
        right: Operand,
    },

    /// lhs = $copy op
    Copy { lhs: String, op: Operand },

    /// lhs = $gep src idx
    Gep { lhs: String, src: String, idx: Operand },

    /// lhs = $gfp src field
    Gfp { lhs: String, src: String, field: String },

    /// lhs = $load src
    Load { lhs: String, src: String },

    /// $store dst op
    Store { dst: String, op: Operand },
}

impl Instruction {
    /// Document discriminator for this instruction
    pub fn kind(&self) -> &'static str {
        match self {
            Instruction::Alloc { .. } => "Alloc",
            Instruction::Arith { .. } => "Arith",
            Instruction::CallExt { .. } => "CallExt",
            Instruction::Cmp { .. } => "Cmp",
            Instruction::Copy { .. } => "Copy",
            Instruction::Gep { .. } => "Gep",
            Instruction::Gfp { .. } => "Gfp",
            Instruction::Load { .. } => "Load",
            Instruction::Store { .. } => "Store",
        }
    }

    /// Variable defined by this instruction, if any
    pub fn lhs(&self) -> Option<&str> {
        match self {
            Instruction::Alloc { lhs, .. }
            | Instruction::Arith { lhs, .. }
            | Instruction::Cmp { lhs, .. }
            | Instruction::Copy { lhs, .. }
            | Instruction::Gep { lhs, .. }
            | Instruction::Gfp { lhs, .. }
            | Instruction::Load { lhs, .. } => Some(lhs),
            Instruction::CallExt { lhs, .. } => lhs.as_deref(),
            Instruction::Store { .. } => None,
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Operand]) -> fmt::Result {
    write!(f, "(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 { write!(f, ", ")?; }
        write!(f, "{}", arg)?;
    }
    write!(f, ")")
}

fn write_lhs(f: &mut fmt::Formatter<'_>, lhs: &Option<String>) -> fmt::Result {
    match lhs {
        Some(lhs) => write!(f, "{} = ", lhs),
        None => Ok(()),
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Alloc { lhs, num } => write!(f, "{} = $alloc {}", lhs, num),
            Instruction::Arith { lhs, aop, left, right } => {
                write!(f, "{} = $arith {} {} {}", lhs, aop, left, right)
            }
            Instruction::CallExt { lhs, callee, args } => {
                write_lhs(f, lhs)?;
                write!(f, "$call_ext {}", callee)?;
                write_args(f, args)
            }
            Instruction::Cmp { lhs, aop, left, right } => {
                write!(f, "{} = $cmp {} {} {}", lhs, aop, left, right)
            }
            Instruction::Copy { lhs, op } => write!(f, "{} = $copy {}", lhs, op),
            Instruction::Gep { lhs, src, idx } => write!(f, "{} = $gep {} {}", lhs, src, idx),
            Instruction::Gfp { lhs, src, field } => write!(f, "{} = $gfp {} {}", lhs, src, field),
            Instruction::Load { lhs, src } => write!(f, "{} = $load {}", lhs, src),
            Instruction::Store { dst, op } => write!(f, "$store {} {}", dst, op),
        }
    }
}

/// Control-flow transfer ending a basic block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terminator {
    /// $branch guard tt ff
    Branch { guard: Operand, tt: String, ff: String },

    /// [lhs =] $call_dir callee(args...) then next_bb
    CallDirect {
        lhs: Option<String>,
        callee: String,
        args: Vec<Operand>,
        next_bb: String,
    },

    /// [lhs =] $call_idr callee(args...) then next_bb, callee is a function pointer variable
    CallIndirect {
        lhs: Option<String>,
        callee: String,
        args: Vec<Operand>,
        next_bb: String,
    },

    /// $jump next_bb
    Jump(String),

    /// $ret [op]
    Ret(Option<Operand>),
}

impl Terminator {
    /// Document discriminator for this terminator
    pub fn kind(&self) -> &'static str {
        match self {
            Terminator::Branch { .. } => "Branch",
            Terminator::CallDirect { .. } => "CallDirect",
            Terminator::CallIndirect { .. } => "CallIndirect",
            Terminator::Jump(_) => "Jump",
            Terminator::Ret(_) => "Ret",
        }
    }

    /// Block labels this terminator can transfer control to, in field order
    pub fn successors(&self) -> Vec<&str> {
        match self {
            Terminator::Branch { tt, ff, .. } => vec![tt.as_str(), ff.as_str()],
            Terminator::CallDirect { next_bb, .. }
            | Terminator::CallIndirect { next_bb, .. }
            | Terminator::Jump(next_bb) => vec![next_bb.as_str()],
            Terminator::Ret(_) => Vec::new(),
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Branch { guard, tt, ff } => write!(f, "$branch {} {} {}", guard, tt, ff),
            Terminator::CallDirect { lhs, callee, args, next_bb } => {
                write_lhs(f, lhs)?;
                write!(f, "$call_dir {}", callee)?;
                write_args(f, args)?;
                write!(f, " then {}", next_bb)
            }
            Terminator::CallIndirect { lhs, callee, args, next_bb } => {
                write_lhs(f, lhs)?;
                write!(f, "$call_idr {}", callee)?;
                write_args(f, args)?;
                write!(f, " then {}", next_bb)
            }
            Terminator::Jump(next_bb) => write!(f, "$jump {}", next_bb),
            Terminator::Ret(Some(op)) => write!(f, "$ret {}", op),
            Terminator::Ret(None) => write!(f, "$ret"),
        }
    }
}

/// Basic Block - straight-line instructions closed by exactly one terminator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub label: String,
    pub insts: Vec<Instruction>,
    pub term: Terminator,
}

impl BasicBlock {
    pub fn new(label: String, insts: Vec<Instruction>, term: Terminator) -> Self {
        Self { label, insts, term }
    }

    pub fn successors(&self) -> Vec<&str> {
        self.term.successors()
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

/// Function in LIR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    /// Call-signature order
    pub params: Vec<Param>,
    /// `None` for functions returning nothing
    pub ret_ty: Option<Type>,
    pub locals: HashMap<String, Type>,
    /// Blocks keyed by label; iteration order carries no meaning
    pub body: HashMap<String, BasicBlock>,
}

impl Function {
    pub fn new(name: String, params: Vec<Param>, ret_ty: Option<Type>) -> Self {
        Self {
            name,
            params,
            ret_ty,
            locals: HashMap::new(),
            body: HashMap::new(),
        }
    }

    pub fn block(&self, label: &str) -> Option<&BasicBlock> {
        self.body.get(label)
    }

    pub fn local(&self, name: &str) -> Option<&Type> {
        self.locals.get(name)
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Signature of this function as a `Fn` type
    pub fn signature(&self) -> Type {
        Type::func(self.params.iter().map(|p| p.ty.clone()).collect(), self.ret_ty.clone())
    }
}

/// Struct field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

/// Named aggregate declaration; fields keep document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<Field>,
}

impl StructDecl {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// LIR Program - the four top-level namespaces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub globals: HashMap<String, Type>,
    pub structs: HashMap<String, StructDecl>,
    pub externs: HashMap<String, Type>,
    pub functions: HashMap<String, Function>,
}

impl Program {
    /// Assemble a program from independently parsed sections
    pub fn new(
        globals: HashMap<String, Type>,
        structs: HashMap<String, StructDecl>,
        externs: HashMap<String, Type>,
        functions: HashMap<String, Function>,
    ) -> Self {
        Self {
            globals,
            structs,
            externs,
            functions,
        }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn global(&self, name: &str) -> Option<&Type> {
        self.globals.get(name)
    }

    pub fn struct_decl(&self, name: &str) -> Option<&StructDecl> {
        self.structs.get(name)
    }

    pub fn extern_ty(&self, name: &str) -> Option<&Type> {
        self.externs.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_display() {
        assert_eq!(Type::Int.to_string(), "int");
        assert_eq!(Type::ptr(Type::Int).to_string(), "&int");
        assert_eq!(Type::ptr(Type::Struct("Node".to_string())).to_string(), "&struct Node");

        let sig = Type::func(vec![Type::Int, Type::ptr(Type::Int)], Some(Type::Int));
        assert_eq!(sig.to_string(), "fn(int, &int) -> int");
        assert_eq!(Type::func(vec![], Some(Type::Int)).to_string(), "fn() -> int");
        assert_eq!(Type::func(vec![Type::Int], None).to_string(), "fn(int)");
    }

    #[test]
    fn test_type_helpers() {
        let ty = Type::ptr(Type::Struct("Node".to_string()));
        assert!(ty.is_ptr());
        assert!(!ty.is_int());
        assert_eq!(ty.pointee().and_then(Type::struct_name), Some("Node"));
        assert_eq!(Type::Int.pointee(), None);
    }

    #[test]
    fn test_operator_codes() {
        assert_eq!(ArithOp::from_code(0), Some(ArithOp::Add));
        assert_eq!(ArithOp::from_code(3), Some(ArithOp::Div));
        assert_eq!(ArithOp::from_code(4), None);
        assert_eq!(CmpOp::from_code(2), Some(CmpOp::Lt));
        assert_eq!(CmpOp::from_code(5), Some(CmpOp::Gte));
        assert_eq!(CmpOp::from_code(6), None);

        for (i, op) in CmpOp::ALL.iter().enumerate() {
            assert_eq!(op.code(), i as u64);
        }
    }

    #[test]
    fn test_operator_names() {
        assert_eq!(ArithOp::from_name("mul"), Some(ArithOp::Mul));
        assert_eq!(ArithOp::from_name("Sub"), Some(ArithOp::Sub));
        assert_eq!(CmpOp::from_name("lte"), Some(CmpOp::Lte));
        assert_eq!(CmpOp::from_name("Neq"), Some(CmpOp::Neq));
        assert_eq!(CmpOp::from_name("Lt"), Some(CmpOp::Lt));
        assert_eq!(CmpOp::from_name("Gte"), Some(CmpOp::Gte));
        assert_eq!(CmpOp::from_name("less"), None);

        for op in CmpOp::ALL {
            assert_eq!(CmpOp::from_name(op.variant_name()), Some(op));
            assert_eq!(format!("{:?}", op), op.variant_name());
        }
        for op in ArithOp::ALL {
            assert_eq!(ArithOp::from_name(op.variant_name()), Some(op));
            assert_eq!(format!("{:?}", op), op.variant_name());
        }
    }

    #[test]
    fn test_instruction_display() {
        let arith = Instruction::Arith {
            lhs: "t1".to_string(),
            aop: ArithOp::Add,
            left: Operand::Const(5),
            right: Operand::Var("x".to_string()),
        };
        assert_eq!(arith.to_string(), "t1 = $arith add 5 x");
        assert_eq!(arith.lhs(), Some("t1"));

        let call = Instruction::CallExt {
            lhs: None,
            callee: "print".to_string(),
            args: vec![Operand::Var("a".to_string()), Operand::Const(-1)],
        };
        assert_eq!(call.to_string(), "$call_ext print(a, -1)");
        assert_eq!(call.lhs(), None);

        let store = Instruction::Store {
            dst: "p".to_string(),
            op: Operand::Const(0),
        };
        assert_eq!(store.to_string(), "$store p 0");
        assert_eq!(store.kind(), "Store");
    }

    #[test]
    fn test_terminator_display_and_successors() {
        let branch = Terminator::Branch {
            guard: Operand::Var("c".to_string()),
            tt: "bb1".to_string(),
            ff: "bb2".to_string(),
        };
        assert_eq!(branch.to_string(), "$branch c bb1 bb2");
        assert_eq!(branch.successors(), vec!["bb1", "bb2"]);

        let call = Terminator::CallIndirect {
            lhs: Some("r".to_string()),
            callee: "fp".to_string(),
            args: vec![Operand::Const(1)],
            next_bb: "bb3".to_string(),
        };
        assert_eq!(call.to_string(), "r = $call_idr fp(1) then bb3");
        assert_eq!(call.successors(), vec!["bb3"]);

        assert_eq!(Terminator::Ret(None).to_string(), "$ret");
        assert!(Terminator::Ret(None).successors().is_empty());
    }

    #[test]
    fn test_function_lookup() {
        let mut function = Function::new(
            "add".to_string(),
            vec![
                Param { name: "a".to_string(), ty: Type::Int },
                Param { name: "b".to_string(), ty: Type::Int },
            ],
            Some(Type::Int),
        );
        function.locals.insert("t".to_string(), Type::Int);
        function.body.insert(
            "entry".to_string(),
            BasicBlock::new("entry".to_string(), vec![], Terminator::Ret(Some(Operand::Var("t".to_string())))),
        );

        assert_eq!(function.param("b").map(|p| &p.ty), Some(&Type::Int));
        assert_eq!(function.local("t"), Some(&Type::Int));
        assert!(function.block("entry").is_some());
        assert_eq!(function.signature(), Type::func(vec![Type::Int, Type::Int], Some(Type::Int)));
    }

    #[test]
    fn test_void_function_signature() {
        let function = Function::new(
            "log".to_string(),
            vec![Param { name: "v".to_string(), ty: Type::Int }],
            None,
        );
        assert_eq!(function.signature(), Type::func(vec![Type::Int], None));
        assert_eq!(function.signature().to_string(), "fn(int)");
    }
}
