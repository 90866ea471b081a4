//! The runtime module.
//!
//! Every compilation includes a module of extern builtins ahead of the user
//! modules. Lowering calls two of them directly: the string conversions of
//! `int` and `char`.

use std::rc::Rc;

use slang_ir::build::Builder;
use slang_ir::defs::ExternFunction;
use slang_ir::{BaseType, Definition, IdGen, Location, Module, Type};

/// Name of the runtime module.
pub const RUNTIME_MODULE: &str = "std";

/// `(name, parameters, return type)`; `None` returns `void`.
type Builtin = (&'static str, &'static [(&'static str, BaseType)], Option<BaseType>);

const BUILTINS: [Builtin; 6] = [
    ("print", &[("value", BaseType::Str)], None),
    ("int_to_str", &[("value", BaseType::Int)], Some(BaseType::Str)),
    ("char_to_str", &[("value", BaseType::Char)], Some(BaseType::Str)),
    ("float_to_str", &[("value", BaseType::Float)], Some(BaseType::Str)),
    ("str_len", &[("value", BaseType::Str)], Some(BaseType::Int)),
    ("exit", &[("code", BaseType::Int)], None),
];

/// Build the runtime module with fresh ids from `ids`.
pub fn runtime_module(ids: &IdGen) -> Module {
    let b = Builder::new(ids);
    b.located(Location::GENERATED);
    let mut module = b.module(RUNTIME_MODULE);
    for (name, params, ret) in BUILTINS {
        let params = params
            .iter()
            .map(|(param, ty)| b.param(param, Type::base(*ty)))
            .collect();
        module.add(Definition::ExternFunction(b.extern_function(
            name,
            params,
            ret.map(Type::base),
        )));
    }
    module
}

/// Builtins the lowering phases emit calls to.
#[derive(Clone, Debug)]
pub struct Runtime {
    pub int_to_str: Rc<ExternFunction>,
    pub char_to_str: Rc<ExternFunction>,
}

impl Runtime {
    /// Pick the builtins out of a runtime module.
    pub fn from_module(module: &Module) -> Option<Runtime> {
        let find = |name: &str| match module.definition(name)? {
            Definition::ExternFunction(function) => Some(Rc::clone(function)),
            _ => None,
        };
        Some(Runtime {
            int_to_str: find("int_to_str")?,
            char_to_str: find("char_to_str")?,
        })
    }
}
