//! JSON document to LIR model conversion
//!
//! One constructor per entity, composed bottom-up: types and operands,
//! then instructions and terminators, then blocks, functions and the four
//! top-level sections. Each constructor receives the `DocPath` of the node
//! it reads and returns either the entity or a `LoadError` pointing at the
//! offending node. Nothing is printed; progress is reported through `log`.

use crate::ir::{
    ArithOp, BasicBlock, CmpOp, Field, Function, Instruction, Operand, Param, Program,
    StructDecl, Terminator, Type,
};
use lir_common::{DocPath, LoadError};
use log::{debug, trace};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

type Object = Map<String, Value>;

/// Scalar integer marker in type descriptors
const INT_MARKER: &str = "Int";

/// Short description of a JSON node for error messages
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string {:?}", s),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}

fn as_object<'a>(value: &'a Value, path: &DocPath) -> Result<&'a Object, LoadError> {
    value
        .as_object()
        .ok_or_else(|| LoadError::wrong_shape(path, "an object", describe(value)))
}

fn as_array<'a>(value: &'a Value, path: &DocPath) -> Result<&'a Vec<Value>, LoadError> {
    value
        .as_array()
        .ok_or_else(|| LoadError::wrong_shape(path, "an array", describe(value)))
}

fn as_str<'a>(value: &'a Value, path: &DocPath) -> Result<&'a str, LoadError> {
    value
        .as_str()
        .ok_or_else(|| LoadError::wrong_shape(path, "a string", describe(value)))
}

/// Required field; absence aborts the load
fn field<'a>(obj: &'a Object, name: &str, path: &DocPath) -> Result<&'a Value, LoadError> {
    obj.get(name).ok_or_else(|| LoadError::missing_field(path, name))
}

/// Optional field; absent and `null` are the same thing
fn optional_field<'a>(obj: &'a Object, name: &str) -> Option<&'a Value> {
    obj.get(name).filter(|value| !value.is_null())
}

fn str_field(obj: &Object, name: &str, path: &DocPath) -> Result<String, LoadError> {
    Ok(as_str(field(obj, name, path)?, &path.field(name))?.to_string())
}

fn optional_str_field(obj: &Object, name: &str, path: &DocPath) -> Result<Option<String>, LoadError> {
    optional_field(obj, name)
        .map(|value| as_str(value, &path.field(name)).map(str::to_string))
        .transpose()
}

fn array_field<'a>(obj: &'a Object, name: &str, path: &DocPath) -> Result<&'a Vec<Value>, LoadError> {
    as_array(field(obj, name, path)?, &path.field(name))
}

fn operand_field(obj: &Object, name: &str, path: &DocPath) -> Result<Operand, LoadError> {
    parse_operand(field(obj, name, path)?, &path.field(name))
}

/// Ordered operand list, e.g. call arguments
fn operands_field(obj: &Object, name: &str, path: &DocPath) -> Result<Vec<Operand>, LoadError> {
    let list_path = path.field(name);
    array_field(obj, name, path)?
        .iter()
        .enumerate()
        .map(|(i, arg)| parse_operand(arg, &list_path.indexed("argument", i)))
        .collect()
}

/// Instruction and terminator discriminator: `kind`, or the emitter's older `tag`
fn discriminator<'a>(obj: &'a Object, path: &DocPath) -> Result<&'a str, LoadError> {
    let (name, value) = match (obj.get("kind"), obj.get("tag")) {
        (Some(kind), _) => ("kind", kind),
        (None, Some(tag)) => ("tag", tag),
        (None, None) => return Err(LoadError::missing_field(path, "kind")),
    };
    as_str(value, &path.field(name))
}

fn parse_op<T>(
    value: &Value,
    path: &DocPath,
    from_code: fn(u64) -> Option<T>,
    from_name: fn(&str) -> Option<T>,
) -> Result<T, LoadError> {
    let op = match value {
        Value::Number(n) => n.as_u64().and_then(from_code),
        Value::String(s) => from_name(s),
        _ => None,
    };
    op.ok_or_else(|| LoadError::UnknownOperator {
        path: path.clone(),
        code: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    })
}

fn arith_op_field(obj: &Object, name: &str, path: &DocPath) -> Result<ArithOp, LoadError> {
    parse_op(field(obj, name, path)?, &path.field(name), ArithOp::from_code, ArithOp::from_name)
}

fn cmp_op_field(obj: &Object, name: &str, path: &DocPath) -> Result<CmpOp, LoadError> {
    parse_op(field(obj, name, path)?, &path.field(name), CmpOp::from_code, CmpOp::from_name)
}

/// Parse a type descriptor
///
/// Accepts the scalar marker `"Int"` or an object with exactly one of the
/// keys `Struct`, `Fn` or `Ptr`. Anything else is an `UnknownType` error.
pub fn parse_type(value: &Value, path: &DocPath) -> Result<Type, LoadError> {
    let unknown = || LoadError::UnknownType { path: path.clone() };

    match value {
        Value::String(marker) if marker == INT_MARKER => Ok(Type::Int),
        Value::Object(obj) if obj.len() == 1 => {
            if let Some(name) = obj.get("Struct") {
                let name = as_str(name, &path.field("Struct"))?;
                Ok(Type::Struct(name.to_string()))
            } else if let Some(sig) = obj.get("Fn") {
                let sig_path = path.field("Fn");
                let sig = as_object(sig, &sig_path)?;
                let params_path = sig_path.field("param_ty");
                let params = array_field(sig, "param_ty", &sig_path)?
                    .iter()
                    .enumerate()
                    .map(|(i, param)| parse_type(param, &params_path.indexed("param", i)))
                    .collect::<Result<Vec<_>, _>>()?;
                let ret = optional_field(sig, "ret_ty")
                    .map(|ret| parse_type(ret, &sig_path.field("ret_ty")))
                    .transpose()?;
                Ok(Type::func(params, ret))
            } else if let Some(inner) = obj.get("Ptr") {
                Ok(Type::ptr(parse_type(inner, &path.field("Ptr"))?))
            } else {
                Err(unknown())
            }
        }
        _ => Err(unknown()),
    }
}

/// Parse an operand: integer literal or variable name
pub fn parse_operand(value: &Value, path: &DocPath) -> Result<Operand, LoadError> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Operand::Const)
            .ok_or_else(|| LoadError::ConstantOutOfRange {
                path: path.clone(),
                value: n.to_string(),
            }),
        Value::String(name) => Ok(Operand::Var(name.clone())),
        other => Err(LoadError::InvalidOperand {
            path: path.clone(),
            found: describe(other),
        }),
    }
}

/// Parse a straight-line instruction
pub fn parse_instruction(value: &Value, path: &DocPath) -> Result<Instruction, LoadError> {
    let obj = as_object(value, path)?;
    let kind = discriminator(obj, path)?;

    let inst = match kind {
        "Alloc" => Instruction::Alloc {
            lhs: str_field(obj, "lhs", path)?,
            num: operand_field(obj, "num", path)?,
        },
        "Arith" => Instruction::Arith {
            lhs: str_field(obj, "lhs", path)?,
            aop: arith_op_field(obj, "aop", path)?,
            left: operand_field(obj, "left", path)?,
            right: operand_field(obj, "right", path)?,
        },
        "CallExt" => Instruction::CallExt {
            lhs: optional_str_field(obj, "lhs", path)?,
            callee: str_field(obj, "callee", path)?,
            args: operands_field(obj, "args", path)?,
        },
        "Cmp" => Instruction::Cmp {
            lhs: str_field(obj, "lhs", path)?,
            aop: cmp_op_field(obj, "aop", path)?,
            left: operand_field(obj, "left", path)?,
            right: operand_field(obj, "right", path)?,
        },
        "Copy" => Instruction::Copy {
            lhs: str_field(obj, "lhs", path)?,
            op: operand_field(obj, "op", path)?,
        },
        "Gep" => Instruction::Gep {
            lhs: str_field(obj, "lhs", path)?,
            src: str_field(obj, "src", path)?,
            idx: operand_field(obj, "idx", path)?,
        },
        "Gfp" => Instruction::Gfp {
            lhs: str_field(obj, "lhs", path)?,
            src: str_field(obj, "src", path)?,
            field: str_field(obj, "field", path)?,
        },
        "Load" => Instruction::Load {
            lhs: str_field(obj, "lhs", path)?,
            src: str_field(obj, "src", path)?,
        },
        "Store" => Instruction::Store {
            dst: str_field(obj, "dst", path)?,
            op: operand_field(obj, "op", path)?,
        },
        other => {
            return Err(LoadError::UnknownKind {
                path: path.clone(),
                kind: other.to_string(),
            })
        }
    };

    Ok(inst)
}

/// Parse a block terminator
pub fn parse_terminator(value: &Value, path: &DocPath) -> Result<Terminator, LoadError> {
    let obj = as_object(value, path)?;
    let kind = discriminator(obj, path)?;

    let term = match kind {
        "Branch" => Terminator::Branch {
            guard: operand_field(obj, "guard", path)?,
            tt: str_field(obj, "tt", path)?,
            ff: str_field(obj, "ff", path)?,
        },
        "CallDirect" => Terminator::CallDirect {
            lhs: optional_str_field(obj, "lhs", path)?,
            callee: str_field(obj, "callee", path)?,
            args: operands_field(obj, "args", path)?,
            next_bb: str_field(obj, "next_bb", path)?,
        },
        "CallIndirect" => Terminator::CallIndirect {
            lhs: optional_str_field(obj, "lhs", path)?,
            callee: str_field(obj, "callee", path)?,
            args: operands_field(obj, "args", path)?,
            next_bb: str_field(obj, "next_bb", path)?,
        },
        "Jump" => Terminator::Jump(str_field(obj, "next_bb", path)?),
        "Ret" => Terminator::Ret(
            optional_field(obj, "op")
                .map(|op| parse_operand(op, &path.field("op")))
                .transpose()?,
        ),
        other => {
            return Err(LoadError::UnknownKind {
                path: path.clone(),
                kind: other.to_string(),
            })
        }
    };

    Ok(term)
}

/// Parse a basic block
///
/// `path` locates the block by position; once its `id` is read, errors
/// inside the block name it by label instead.
pub fn parse_basic_block(value: &Value, path: &DocPath) -> Result<BasicBlock, LoadError> {
    let obj = as_object(value, path)?;
    let label = str_field(obj, "id", path)?;
    let path = path.parent().named("block", &label);

    let insts_path = path.field("insts");
    let insts = array_field(obj, "insts", &path)?
        .iter()
        .enumerate()
        .map(|(i, inst)| parse_instruction(inst, &insts_path.indexed("instruction", i)))
        .collect::<Result<Vec<_>, _>>()?;
    let term = parse_terminator(field(obj, "term", &path)?, &path.field("term"))?;

    trace!("block '{}': {} instructions, {}", label, insts.len(), term.kind());
    Ok(BasicBlock::new(label, insts, term))
}

/// `{name, typ}` pair used by globals, params, locals and struct fields
fn parse_decl(value: &Value, path: &DocPath) -> Result<(String, Type), LoadError> {
    let obj = as_object(value, path)?;
    let name = str_field(obj, "name", path)?;
    let ty = parse_type(field(obj, "typ", path)?, &path.field("typ"))?;
    Ok((name, ty))
}

/// Ordered `{name, typ}` list; a repeated name is a duplicate declaration
fn parse_decls(items: &[Value], kind: &str, path: &DocPath) -> Result<Vec<(String, Type)>, LoadError> {
    let mut seen = HashSet::new();
    let mut decls = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let item_path = path.indexed(kind, i);
        let (name, ty) = parse_decl(item, &item_path)?;
        if !seen.insert(name.clone()) {
            return Err(LoadError::duplicate(&item_path, &name));
        }
        decls.push((name, ty));
    }

    Ok(decls)
}

/// Parse one function document
///
/// `path` locates the `functions` section; `name` is the function's key.
pub fn parse_function(name: &str, value: &Value, path: &DocPath) -> Result<Function, LoadError> {
    debug!("parsing function '{}'", name);
    let path = path.named("function", name);
    let obj = as_object(value, &path)?;

    let params = parse_decls(array_field(obj, "params", &path)?, "param", &path.field("params"))?
        .into_iter()
        .map(|(name, ty)| Param { name, ty })
        .collect();

    let ret_ty = optional_field(obj, "ret_ty")
        .map(|ty| parse_type(ty, &path.field("ret_ty")))
        .transpose()?;

    let mut function = Function::new(name.to_string(), params, ret_ty);

    function.locals = parse_decls(array_field(obj, "locals", &path)?, "local", &path.field("locals"))?
        .into_iter()
        .collect();

    let body_path = path.field("body");
    for (i, block) in array_field(obj, "body", &path)?.iter().enumerate() {
        let block = parse_basic_block(block, &body_path.indexed("block", i))?;
        if function.body.contains_key(&block.label) {
            return Err(LoadError::duplicate(&body_path.indexed("block", i), &block.label));
        }
        function.body.insert(block.label.clone(), block);
    }

    debug!(
        "function '{}': {} params, {} locals, {} blocks",
        name,
        function.params.len(),
        function.locals.len(),
        function.body.len()
    );
    Ok(function)
}

/// Parse the `globals` section: a list of `{name, typ}`
pub fn parse_globals(value: &Value) -> Result<HashMap<String, Type>, LoadError> {
    let path = DocPath::root().section("globals");
    let globals: HashMap<_, _> = parse_decls(as_array(value, &path)?, "global", &path)?
        .into_iter()
        .collect();

    debug!("parsed {} globals", globals.len());
    Ok(globals)
}

/// Parse the `structs` section: struct name to a list of `{name, typ}` fields
pub fn parse_structs(value: &Value) -> Result<HashMap<String, StructDecl>, LoadError> {
    let path = DocPath::root().section("structs");
    let mut structs = HashMap::new();

    for (name, fields) in as_object(value, &path)? {
        let struct_path = path.named("struct", name);
        let fields = parse_decls(as_array(fields, &struct_path)?, "field", &struct_path)?
            .into_iter()
            .map(|(name, ty)| Field { name, ty })
            .collect();
        structs.insert(
            name.clone(),
            StructDecl {
                name: name.clone(),
                fields,
            },
        );
    }

    debug!("parsed {} structs", structs.len());
    Ok(structs)
}

/// Parse the `externs` section: name to type descriptor
pub fn parse_externs(value: &Value) -> Result<HashMap<String, Type>, LoadError> {
    let path = DocPath::root().section("externs");
    let mut externs = HashMap::new();

    for (name, ty) in as_object(value, &path)? {
        externs.insert(name.clone(), parse_type(ty, &path.named("extern", name))?);
    }

    debug!("parsed {} externs", externs.len());
    Ok(externs)
}

/// Parse the `functions` section: name to function document
pub fn parse_functions(value: &Value) -> Result<HashMap<String, Function>, LoadError> {
    let path = DocPath::root().section("functions");
    let mut functions = HashMap::new();

    for (name, function) in as_object(value, &path)? {
        functions.insert(name.clone(), parse_function(name, function, &path)?);
    }

    debug!("parsed {} functions", functions.len());
    Ok(functions)
}

/// Parse a whole program document
///
/// All four sections are required. They are parsed independently and the
/// first error aborts the load.
pub fn parse_program(value: &Value) -> Result<Program, LoadError> {
    let root = DocPath::root();
    let obj = as_object(value, &root)?;

    let globals = parse_globals(field(obj, "globals", &root)?)?;
    let structs = parse_structs(field(obj, "structs", &root)?)?;
    let externs = parse_externs(field(obj, "externs", &root)?)?;
    let functions = parse_functions(field(obj, "functions", &root)?)?;

    Ok(Program::new(globals, structs, externs, functions))
}

/// Parse a program from JSON text
pub fn parse_program_str(text: &str) -> Result<Program, LoadError> {
    let value: Value = serde_json::from_str(text).map_err(|err| LoadError::Syntax {
        line: err.line(),
        column: err.column(),
        message: err.to_string(),
    })?;
    parse_program(&value)
}

impl FromStr for Program {
    type Err = LoadError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_program_str(text)
    }
}
