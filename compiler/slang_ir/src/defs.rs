//! Definitions.
//!
//! Definitions are reference counted: a scope, the module's definition list
//! and every resolved reference in the tree share the same `Rc`. Fields that
//! later passes rewrite (a let-bound variable's type, a function body) sit
//! behind `RefCell`s.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::ast::{Expression, Statement};
use crate::{FunctionType, Id, Location, Scope, TyCon, Type};

/// A generic parameter of a struct, enum, class, interface or function.
#[derive(Debug)]
pub struct TypeParameter {
    pub id: Id,
    pub location: Location,
}

/// A function parameter, including the implicit `this` of methods.
#[derive(Debug)]
pub struct Parameter {
    pub id: Id,
    pub location: Location,
    pub ty: RefCell<Type>,
}

/// A local variable (let, for-loop, case-arm and handler bindings).
#[derive(Debug)]
pub struct Variable {
    pub id: Id,
    pub location: Location,
    pub ty: RefCell<Type>,
}

/// A member variable of a class, or a module-level variable.
#[derive(Debug)]
pub struct VarDef {
    pub id: Id,
    pub location: Location,
    pub ty: RefCell<Type>,
    pub value: RefCell<Option<Expression>>,
}

impl VarDef {
    pub fn has_default(&self) -> bool {
        self.value.borrow().is_some()
    }
}

/// A type alias.
#[derive(Debug)]
pub struct TypeDef {
    pub id: Id,
    pub location: Location,
    pub ty: Type,
}

/// A struct field.
#[derive(Debug)]
pub struct Field {
    pub id: Id,
    pub location: Location,
    pub ty: Type,
}

#[derive(Debug)]
pub struct StructDef {
    pub id: Id,
    pub location: Location,
    pub type_parameters: Vec<Rc<TypeParameter>>,
    pub fields: Vec<Rc<Field>>,
    /// Fields overlap in storage; only produced by enum lowering.
    pub is_union: bool,
    pub scope: Rc<Scope>,
}

impl StructDef {
    pub fn field(&self, name: &str) -> Option<(usize, &Rc<Field>)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, field)| field.id.name() == name)
    }
}

#[derive(Debug)]
pub struct EnumVariant {
    pub id: Id,
    pub location: Location,
    /// Position within the enum; becomes the runtime tag.
    pub index: usize,
    pub payload: Vec<Type>,
}

#[derive(Debug)]
pub struct EnumDef {
    pub id: Id,
    pub location: Location,
    pub type_parameters: Vec<Rc<TypeParameter>>,
    pub variants: Vec<Rc<EnumVariant>>,
    pub scope: Rc<Scope>,
}

impl EnumDef {
    pub fn variant(&self, name: &str) -> Option<&Rc<EnumVariant>> {
        self.variants.iter().find(|v| v.id.name() == name)
    }
}

#[derive(Debug)]
pub struct ClassDef {
    pub id: Id,
    pub location: Location,
    pub type_parameters: Vec<Rc<TypeParameter>>,
    pub fields: Vec<Rc<VarDef>>,
    pub methods: Vec<Rc<FunctionDef>>,
    pub scope: Rc<Scope>,
}

impl ClassDef {
    pub fn field(&self, name: &str) -> Option<&Rc<VarDef>> {
        self.fields.iter().find(|f| f.id.name() == name)
    }

    pub fn method(&self, name: &str) -> Option<&Rc<FunctionDef>> {
        self.methods.iter().find(|m| m.id.name() == name)
    }
}

#[derive(Debug)]
pub struct InterfaceDef {
    pub id: Id,
    pub location: Location,
    pub type_parameters: Vec<Rc<TypeParameter>>,
    pub methods: Vec<Rc<FunctionDecl>>,
    pub scope: Rc<Scope>,
}

impl InterfaceDef {
    pub fn method(&self, name: &str) -> Option<&Rc<FunctionDecl>> {
        self.methods.iter().find(|m| m.id.name() == name)
    }
}

/// A body-less function signature (interface members).
#[derive(Debug)]
pub struct FunctionDecl {
    pub id: Id,
    pub location: Location,
    pub parameters: Vec<Rc<Parameter>>,
    pub return_ty: Type,
    pub except_ty: Type,
}

impl FunctionDecl {
    pub fn signature(&self) -> FunctionType {
        signature_of(&self.parameters, &self.return_ty, &self.except_ty)
    }
}

/// A function implemented by the runtime.
#[derive(Debug)]
pub struct ExternFunction {
    pub id: Id,
    pub location: Location,
    pub parameters: Vec<Rc<Parameter>>,
    pub return_ty: Type,
}

impl ExternFunction {
    pub fn signature(&self) -> FunctionType {
        signature_of(&self.parameters, &self.return_ty, &Type::void())
    }
}

#[derive(Debug)]
pub struct FunctionDef {
    pub id: Id,
    pub location: Location,
    pub type_parameters: Vec<Rc<TypeParameter>>,
    /// Receiver of a method, created by scope filling.
    pub this_param: OnceCell<Rc<Parameter>>,
    pub parameters: Vec<Rc<Parameter>>,
    pub return_ty: Type,
    pub except_ty: Type,
    pub body: RefCell<Statement>,
    pub scope: Rc<Scope>,
}

impl FunctionDef {
    /// Signature as seen by callers; the receiver is not part of it.
    pub fn signature(&self) -> FunctionType {
        signature_of(&self.parameters, &self.return_ty, &self.except_ty)
    }

    pub fn is_generic(&self) -> bool {
        !self.type_parameters.is_empty()
    }
}

fn signature_of(parameters: &[Rc<Parameter>], ret: &Type, except: &Type) -> FunctionType {
    FunctionType {
        param_names: parameters
            .iter()
            .map(|p| Some(p.id.name().to_owned()))
            .collect(),
        params: parameters.iter().map(|p| p.ty.borrow().clone()).collect(),
        ret: ret.clone(),
        except: except.clone(),
    }
}

/// Scope-owning handle of a module, shared with importers.
#[derive(Debug)]
pub struct ModuleRef {
    pub id: Id,
    pub location: Location,
    pub scope: Rc<Scope>,
}

/// Anything a name can resolve to.
#[derive(Clone)]
pub enum Definition {
    Module(Rc<ModuleRef>),
    Function(Rc<FunctionDef>),
    ExternFunction(Rc<ExternFunction>),
    FunctionDecl(Rc<FunctionDecl>),
    Struct(Rc<StructDef>),
    Enum(Rc<EnumDef>),
    Class(Rc<ClassDef>),
    Interface(Rc<InterfaceDef>),
    Variable(Rc<Variable>),
    Parameter(Rc<Parameter>),
    VarDef(Rc<VarDef>),
    TypeDef(Rc<TypeDef>),
    TypeParameter(Rc<TypeParameter>),
    EnumVariant(Rc<EnumVariant>),
    Field(Rc<Field>),
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.describe(), self.id())
    }
}

impl Definition {
    pub fn id(&self) -> &Id {
        match self {
            Definition::Module(def) => &def.id,
            Definition::Function(def) => &def.id,
            Definition::ExternFunction(def) => &def.id,
            Definition::FunctionDecl(def) => &def.id,
            Definition::Struct(def) => &def.id,
            Definition::Enum(def) => &def.id,
            Definition::Class(def) => &def.id,
            Definition::Interface(def) => &def.id,
            Definition::Variable(def) => &def.id,
            Definition::Parameter(def) => &def.id,
            Definition::VarDef(def) => &def.id,
            Definition::TypeDef(def) => &def.id,
            Definition::TypeParameter(def) => &def.id,
            Definition::EnumVariant(def) => &def.id,
            Definition::Field(def) => &def.id,
        }
    }

    pub fn name(&self) -> &str {
        self.id().name()
    }

    pub fn location(&self) -> Location {
        match self {
            Definition::Module(def) => def.location,
            Definition::Function(def) => def.location,
            Definition::ExternFunction(def) => def.location,
            Definition::FunctionDecl(def) => def.location,
            Definition::Struct(def) => def.location,
            Definition::Enum(def) => def.location,
            Definition::Class(def) => def.location,
            Definition::Interface(def) => def.location,
            Definition::Variable(def) => def.location,
            Definition::Parameter(def) => def.location,
            Definition::VarDef(def) => def.location,
            Definition::TypeDef(def) => def.location,
            Definition::TypeParameter(def) => def.location,
            Definition::EnumVariant(def) => def.location,
            Definition::Field(def) => def.location,
        }
    }

    /// Scope owned by this definition, for the scoped variants.
    pub fn scope(&self) -> Option<&Rc<Scope>> {
        match self {
            Definition::Module(def) => Some(&def.scope),
            Definition::Function(def) => Some(&def.scope),
            Definition::Struct(def) => Some(&def.scope),
            Definition::Enum(def) => Some(&def.scope),
            Definition::Class(def) => Some(&def.scope),
            Definition::Interface(def) => Some(&def.scope),
            _ => None,
        }
    }

    /// Type constructor facet of struct, enum, class and interface.
    pub fn tycon(&self) -> Option<TyCon> {
        match self {
            Definition::Struct(def) => Some(TyCon::Struct(Rc::clone(def))),
            Definition::Enum(def) => Some(TyCon::Enum(Rc::clone(def))),
            Definition::Class(def) => Some(TyCon::Class(Rc::clone(def))),
            Definition::Interface(def) => Some(TyCon::Interface(Rc::clone(def))),
            _ => None,
        }
    }

    /// Human readable kind, for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Definition::Module(_) => "module",
            Definition::Function(_) | Definition::ExternFunction(_) => "function",
            Definition::FunctionDecl(_) => "method declaration",
            Definition::Struct(_) => "struct",
            Definition::Enum(_) => "enum",
            Definition::Class(_) => "class",
            Definition::Interface(_) => "interface",
            Definition::Variable(_) => "variable",
            Definition::Parameter(_) => "parameter",
            Definition::VarDef(_) => "member variable",
            Definition::TypeDef(_) => "type alias",
            Definition::TypeParameter(_) => "type parameter",
            Definition::EnumVariant(_) => "enum variant",
            Definition::Field(_) => "field",
        }
    }
}
