//! The shared, mutable type graph.
//!
//! A [`Type`] is a handle to a cell holding a [`TypeKind`]. Tree nodes and
//! definitions hold handles, and many handles may point at the same cell: a
//! function's declared return type is the same cell every `return` statement
//! is checked against. Inference works by writing into cells:
//!
//! - An unresolved [`TypeKind::Meta`] placeholder is resolved by linking it to
//!   another type. Every handle to the placeholder observes the link, so no
//!   substitution table has to be threaded through the checker. A resolved
//!   placeholder is never unresolved again.
//! - Lowering swaps whole kinds in place (an enum application becomes the
//!   application of its tagged-union struct) so every alias changes at once.
//!
//! Cells are mutated by exactly one pass at a time; handles are `!Send`.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::defs::{ClassDef, EnumDef, InterfaceDef, StructDef, TypeParameter};
use crate::{Definition, Id, Location};

/// Nesting depth after which `Display` gives up (guards placeholder cycles).
const MAX_DISPLAY_DEPTH: usize = 32;

/// Built-in scalar types.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BaseType {
    Int,
    Float,
    Str,
    Bool,
    Char,
    /// Opaque pointer; the erased form of union types.
    Ptr,
}

impl BaseType {
    /// Primitive types nameable in source, in base-scope order.
    pub const PRIMITIVES: [BaseType; 5] = [
        BaseType::Int,
        BaseType::Float,
        BaseType::Str,
        BaseType::Bool,
        BaseType::Char,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            BaseType::Int => "int",
            BaseType::Float => "float",
            BaseType::Str => "str",
            BaseType::Bool => "bool",
            BaseType::Char => "char",
            BaseType::Ptr => "ptr",
        }
    }
}

/// Signature of a callable value.
#[derive(Clone)]
pub struct FunctionType {
    /// Declared parameter names, used for argument label checks.
    pub param_names: Vec<Option<String>>,
    pub params: Vec<Type>,
    pub ret: Type,
    /// Declared exception type, `void` when the function cannot raise.
    pub except: Type,
}

/// Type syntax as produced by the parser, before name binding.
#[derive(Clone, Debug)]
pub enum TypeExpr {
    /// `Point`, `int`, `T`
    Name { name: String, location: Location },
    /// `module.Point`
    Member {
        base: Box<TypeExpr>,
        name: String,
        location: Location,
    },
    /// `Option[int]`
    Apply {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
        location: Location,
    },
    /// `int[4]`
    Array {
        element: Box<TypeExpr>,
        size: usize,
        location: Location,
    },
    /// `ptr[int]`
    Pointer {
        element: Box<TypeExpr>,
        location: Location,
    },
    /// `fn(int, str) -> bool`
    Function {
        params: Vec<TypeExpr>,
        ret: Option<Box<TypeExpr>>,
        location: Location,
    },
}

impl TypeExpr {
    pub fn name(name: impl Into<String>) -> Self {
        TypeExpr::Name {
            name: name.into(),
            location: Location::GENERATED,
        }
    }

    pub fn apply(base: TypeExpr, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Apply {
            base: Box::new(base),
            args,
            location: Location::GENERATED,
        }
    }

    pub fn array(element: TypeExpr, size: usize) -> Self {
        TypeExpr::Array {
            element: Box::new(element),
            size,
            location: Location::GENERATED,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            TypeExpr::Name { location, .. }
            | TypeExpr::Member { location, .. }
            | TypeExpr::Apply { location, .. }
            | TypeExpr::Array { location, .. }
            | TypeExpr::Pointer { location, .. }
            | TypeExpr::Function { location, .. } => *location,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Name { name, .. } => f.write_str(name),
            TypeExpr::Member { base, name, .. } => write!(f, "{base}.{name}"),
            TypeExpr::Apply { base, args, .. } => {
                write!(f, "{base}[")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str("]")
            }
            TypeExpr::Array { element, size, .. } => write!(f, "{element}[{size}]"),
            TypeExpr::Pointer { element, .. } => write!(f, "ptr[{element}]"),
            TypeExpr::Function { params, ret, .. } => {
                f.write_str("fn(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                f.write_str(")")?;
                if let Some(ret) = ret {
                    write!(f, " -> {ret}")?;
                }
                Ok(())
            }
        }
    }
}

/// A generic type constructor: the template facet of a struct, enum, class
/// or interface definition.
#[derive(Clone)]
pub enum TyCon {
    Struct(Rc<StructDef>),
    Enum(Rc<EnumDef>),
    Class(Rc<ClassDef>),
    Interface(Rc<InterfaceDef>),
}

impl TyCon {
    pub fn id(&self) -> &Id {
        match self {
            TyCon::Struct(def) => &def.id,
            TyCon::Enum(def) => &def.id,
            TyCon::Class(def) => &def.id,
            TyCon::Interface(def) => &def.id,
        }
    }

    pub fn name(&self) -> &str {
        self.id().name()
    }

    pub fn type_parameters(&self) -> &[Rc<TypeParameter>] {
        match self {
            TyCon::Struct(def) => &def.type_parameters,
            TyCon::Enum(def) => &def.type_parameters,
            TyCon::Class(def) => &def.type_parameters,
            TyCon::Interface(def) => &def.type_parameters,
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.type_parameters().is_empty()
    }

    /// Instantiate the constructor with concrete type arguments.
    pub fn apply(&self, args: Vec<Type>) -> Type {
        Type::new(TypeKind::App {
            tycon: self.clone(),
            args,
        })
    }

    /// Constructor identity.
    pub fn same(&self, other: &TyCon) -> bool {
        self.id() == other.id()
    }

    pub fn definition(&self) -> Definition {
        match self {
            TyCon::Struct(def) => Definition::Struct(Rc::clone(def)),
            TyCon::Enum(def) => Definition::Enum(Rc::clone(def)),
            TyCon::Class(def) => Definition::Class(Rc::clone(def)),
            TyCon::Interface(def) => Definition::Interface(Rc::clone(def)),
        }
    }
}

impl fmt::Debug for TyCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.id())
    }
}

/// The content of a type cell.
#[derive(Clone)]
pub enum TypeKind {
    Base(BaseType),
    /// A type constructor applied to arguments.
    App { tycon: TyCon, args: Vec<Type> },
    Function(FunctionType),
    Array { size: usize, element: Type },
    Pointer(Type),
    /// Inference placeholder, transparent once resolved.
    Meta {
        name: Rc<str>,
        resolved: Option<Type>,
    },
    /// Reference to a type parameter inside a generic body.
    Param(Rc<TypeParameter>),
    /// A generic constructor written without type arguments; type evaluation
    /// replaces it with an application to fresh placeholders.
    Unapplied(TyCon),
    /// Parser output awaiting name binding.
    Syntax(TypeExpr),
    /// Type of statements that never complete (return, raise, break).
    Unreachable,
    Void,
}

/// Handle to a shared type cell.
#[derive(Clone)]
pub struct Type(Rc<RefCell<TypeKind>>);

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type(Rc::new(RefCell::new(kind)))
    }

    pub fn base(base: BaseType) -> Self {
        Type::new(TypeKind::Base(base))
    }

    pub fn int() -> Self {
        Type::base(BaseType::Int)
    }

    pub fn float() -> Self {
        Type::base(BaseType::Float)
    }

    pub fn str() -> Self {
        Type::base(BaseType::Str)
    }

    pub fn bool() -> Self {
        Type::base(BaseType::Bool)
    }

    pub fn char() -> Self {
        Type::base(BaseType::Char)
    }

    pub fn ptr() -> Self {
        Type::base(BaseType::Ptr)
    }

    pub fn void() -> Self {
        Type::new(TypeKind::Void)
    }

    pub fn unreachable() -> Self {
        Type::new(TypeKind::Unreachable)
    }

    /// A fresh, unresolved placeholder.
    pub fn meta(name: &str) -> Self {
        Type::new(TypeKind::Meta {
            name: Rc::from(name),
            resolved: None,
        })
    }

    pub fn syntax(expr: TypeExpr) -> Self {
        Type::new(TypeKind::Syntax(expr))
    }

    pub fn param(param: &Rc<TypeParameter>) -> Self {
        Type::new(TypeKind::Param(Rc::clone(param)))
    }

    pub fn array(size: usize, element: Type) -> Self {
        Type::new(TypeKind::Array { size, element })
    }

    pub fn pointer(element: Type) -> Self {
        Type::new(TypeKind::Pointer(element))
    }

    pub fn function(signature: FunctionType) -> Self {
        Type::new(TypeKind::Function(signature))
    }

    /// Borrow this cell's own kind, without following placeholder links.
    pub fn kind(&self) -> Ref<'_, TypeKind> {
        self.0.borrow()
    }

    /// Overwrite this cell in place; visible through every handle.
    pub fn set(&self, kind: TypeKind) {
        *self.0.borrow_mut() = kind;
    }

    /// Whether both handles point at the same cell.
    pub fn same(&self, other: &Type) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the cell, for visited sets.
    pub fn cell_address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Follow resolved placeholder links to the representative cell.
    pub fn resolved(&self) -> Type {
        let mut current = self.clone();
        loop {
            let next = match &*current.kind() {
                TypeKind::Meta {
                    resolved: Some(target),
                    ..
                } => target.clone(),
                _ => break,
            };
            current = next;
        }
        current
    }

    /// Kind of the representative cell.
    pub fn shape(&self) -> TypeKind {
        self.resolved().kind().clone()
    }

    /// Link an unresolved placeholder to `target`.
    ///
    /// Returns `false`, leaving the cell untouched, when this cell is not an
    /// unresolved placeholder.
    pub fn bind_meta(&self, target: &Type) -> bool {
        let mut kind = self.0.borrow_mut();
        match &mut *kind {
            TypeKind::Meta { resolved, .. } if resolved.is_none() => {
                *resolved = Some(target.clone());
                true
            }
            _ => false,
        }
    }

    pub fn is_unresolved_meta(&self) -> bool {
        matches!(
            &*self.resolved().kind(),
            TypeKind::Meta { resolved: None, .. }
        )
    }

    pub fn as_base(&self) -> Option<BaseType> {
        match &*self.resolved().kind() {
            TypeKind::Base(base) => Some(*base),
            _ => None,
        }
    }

    pub fn is_int(&self) -> bool {
        self.as_base() == Some(BaseType::Int)
    }

    pub fn is_float(&self) -> bool {
        self.as_base() == Some(BaseType::Float)
    }

    pub fn is_str(&self) -> bool {
        self.as_base() == Some(BaseType::Str)
    }

    pub fn is_bool(&self) -> bool {
        self.as_base() == Some(BaseType::Bool)
    }

    pub fn is_char(&self) -> bool {
        self.as_base() == Some(BaseType::Char)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.as_base(), Some(BaseType::Int | BaseType::Float))
    }

    pub fn is_void(&self) -> bool {
        matches!(&*self.resolved().kind(), TypeKind::Void)
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(&*self.resolved().kind(), TypeKind::Unreachable)
    }

    /// Constructor and arguments of an application.
    pub fn as_app(&self) -> Option<(TyCon, Vec<Type>)> {
        match &*self.resolved().kind() {
            TypeKind::App { tycon, args } => Some((tycon.clone(), args.clone())),
            _ => None,
        }
    }

    pub fn tycon(&self) -> Option<TyCon> {
        self.as_app().map(|(tycon, _)| tycon)
    }

    pub fn struct_def(&self) -> Option<Rc<StructDef>> {
        match self.tycon()? {
            TyCon::Struct(def) => Some(def),
            _ => None,
        }
    }

    pub fn enum_def(&self) -> Option<Rc<EnumDef>> {
        match self.tycon()? {
            TyCon::Enum(def) => Some(def),
            _ => None,
        }
    }

    pub fn class_def(&self) -> Option<Rc<ClassDef>> {
        match self.tycon()? {
            TyCon::Class(def) => Some(def),
            _ => None,
        }
    }

    pub fn interface_def(&self) -> Option<Rc<InterfaceDef>> {
        match self.tycon()? {
            TyCon::Interface(def) => Some(def),
            _ => None,
        }
    }

    /// A plain (non-union) struct application.
    pub fn is_struct(&self) -> bool {
        self.struct_def().is_some_and(|def| !def.is_union)
    }

    pub fn is_union(&self) -> bool {
        self.struct_def().is_some_and(|def| def.is_union)
    }

    pub fn is_class(&self) -> bool {
        self.class_def().is_some()
    }

    pub fn as_array(&self) -> Option<(usize, Type)> {
        match &*self.resolved().kind() {
            TypeKind::Array { size, element } => Some((*size, element.clone())),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<FunctionType> {
        match &*self.resolved().kind() {
            TypeKind::Function(signature) => Some(signature.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type(f, self, 0)
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type(f, self, 0)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type], depth: usize) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_type(f, ty, depth + 1)?;
    }
    Ok(())
}

fn write_type(f: &mut fmt::Formatter<'_>, ty: &Type, depth: usize) -> fmt::Result {
    if depth > MAX_DISPLAY_DEPTH {
        return f.write_str("...");
    }
    match &*ty.kind() {
        TypeKind::Base(base) => f.write_str(base.name()),
        TypeKind::App { tycon, args } => {
            f.write_str(tycon.name())?;
            if !args.is_empty() {
                f.write_str("[")?;
                write_list(f, args, depth)?;
                f.write_str("]")?;
            }
            Ok(())
        }
        TypeKind::Function(signature) => {
            f.write_str("fn(")?;
            write_list(f, &signature.params, depth)?;
            f.write_str(") -> ")?;
            write_type(f, &signature.ret, depth + 1)
        }
        TypeKind::Array { size, element } => {
            write_type(f, element, depth + 1)?;
            write!(f, "[{size}]")
        }
        TypeKind::Pointer(element) => {
            f.write_str("ptr[")?;
            write_type(f, element, depth + 1)?;
            f.write_str("]")
        }
        TypeKind::Meta {
            resolved: Some(target),
            ..
        } => write_type(f, target, depth + 1),
        TypeKind::Meta {
            name,
            resolved: None,
        } => write!(f, "?{name}"),
        TypeKind::Param(param) => f.write_str(param.id.name()),
        TypeKind::Unapplied(tycon) => f.write_str(tycon.name()),
        TypeKind::Syntax(expr) => write!(f, "{expr}"),
        TypeKind::Unreachable => f.write_str("unreachable"),
        TypeKind::Void => f.write_str("void"),
    }
}
