//! Capability queries.
//!
//! Every query looks through resolved placeholders and substitutes the type
//! arguments of the receiver into the answer, so `Option[int]` reports a
//! `Some` payload of `int`, not `T`.
//!
//! Iteration is structural: a for-loop source qualifies by shape
//! ([`iteration`]), never by naming an interface.

use std::rc::Rc;

use slang_ir::defs::EnumVariant;
use slang_ir::{FunctionType, Iteration, TyCon, Type};

use crate::subst::{bind_arguments, fresh_instance, subst, subst_signature, Substitution};

/// Type-parameter mapping of an applied type constructor.
pub fn app_substitution(tycon: &TyCon, args: &[Type]) -> Substitution {
    bind_arguments(tycon.type_parameters(), args)
}

/// Type of a stored field: struct fields and class member variables.
pub fn field_type(ty: &Type, name: &str) -> Option<Type> {
    let (tycon, args) = ty.as_app()?;
    let mapping = app_substitution(&tycon, &args);
    match &tycon {
        TyCon::Struct(def) => def.field(name).map(|(_, field)| subst(&field.ty, &mapping)),
        TyCon::Class(def) => def
            .field(name)
            .map(|field| subst(&field.ty.borrow(), &mapping)),
        TyCon::Enum(_) | TyCon::Interface(_) => None,
    }
}

pub fn has_field(ty: &Type, name: &str) -> bool {
    field_type(ty, name).is_some()
}

/// Caller-side signature of a method of a class or interface type.
///
/// A generic method gets fresh placeholders for its own type parameters on
/// every query.
pub fn method_signature(ty: &Type, name: &str) -> Option<FunctionType> {
    let (tycon, args) = ty.as_app()?;
    let mut mapping = app_substitution(&tycon, &args);
    match &tycon {
        TyCon::Class(def) => {
            let method = def.method(name)?;
            let (own, _) = fresh_instance(&method.type_parameters);
            mapping.extend(own);
            Some(subst_signature(&method.signature(), &mapping))
        }
        TyCon::Interface(def) => {
            let decl = def.method(name)?;
            Some(subst_signature(&decl.signature(), &mapping))
        }
        TyCon::Struct(_) | TyCon::Enum(_) => None,
    }
}

/// Type of `ty.name`: a field type, or a method's function type.
pub fn member_type(ty: &Type, name: &str) -> Option<Type> {
    field_type(ty, name).or_else(|| method_signature(ty, name).map(Type::function))
}

/// Variant of an enum type with its substituted payload types.
pub fn variant(ty: &Type, name: &str) -> Option<(Rc<EnumVariant>, Vec<Type>)> {
    let (tycon, args) = ty.as_app()?;
    let TyCon::Enum(def) = &tycon else {
        return None;
    };
    let variant = def.variant(name)?;
    let mapping = app_substitution(&tycon, &args);
    let payload = variant.payload.iter().map(|t| subst(t, &mapping)).collect();
    Some((Rc::clone(variant), payload))
}

/// Substituted payload of a variant already known to belong to `ty`.
pub fn variant_payload(ty: &Type, variant: &EnumVariant) -> Vec<Type> {
    match ty.as_app() {
        Some((tycon, args)) => {
            let mapping = app_substitution(&tycon, &args);
            variant.payload.iter().map(|t| subst(t, &mapping)).collect()
        }
        None => variant.payload.clone(),
    }
}

/// Field names and substituted types of a struct type, in declaration order.
pub fn struct_fields(ty: &Type) -> Option<Vec<(String, Type)>> {
    let (tycon, args) = ty.as_app()?;
    let TyCon::Struct(def) = &tycon else {
        return None;
    };
    let mapping = app_substitution(&tycon, &args);
    Some(
        def.fields
            .iter()
            .map(|field| (field.id.name().to_owned(), subst(&field.ty, &mapping)))
            .collect(),
    )
}

/// Parameters of a class construction: the member variables without a
/// default, in declaration order.
pub fn constructor_parameters(ty: &Type) -> Option<Vec<(String, Type)>> {
    let (tycon, args) = ty.as_app()?;
    let TyCon::Class(def) = &tycon else {
        return None;
    };
    let mapping = app_substitution(&tycon, &args);
    Some(
        def.fields
            .iter()
            .filter(|field| !field.has_default())
            .map(|field| (field.id.name().to_owned(), subst(&field.ty.borrow(), &mapping)))
            .collect(),
    )
}

/// How a for-loop over `ty` iterates, and the element type.
///
/// Arrays are checked first, then the iterator protocol (`iter()` returning
/// something whose `next()` returns an enum with `Some(T)` and `None`), then
/// the sequence protocol (`len() -> int` and `get(index) -> T`).
pub fn iteration(ty: &Type) -> Option<(Iteration, Type)> {
    if let Some((size, element)) = ty.as_array() {
        return Some((Iteration::Array { size }, element));
    }
    if let Some(element) = iterator_element(ty) {
        return Some((Iteration::Iterable, element));
    }
    sequence_element(ty).map(|element| (Iteration::Sequence, element))
}

fn iterator_element(ty: &Type) -> Option<Type> {
    let iter = method_signature(ty, "iter").filter(|sig| sig.params.is_empty())?;
    let next = method_signature(&iter.ret, "next").filter(|sig| sig.params.is_empty())?;
    option_element(&next.ret)
}

/// Element type of an option-like enum: `Some` with one payload and `None`
/// with none.
pub fn option_element(ty: &Type) -> Option<Type> {
    let (_, none) = variant(ty, "None")?;
    let (_, mut some) = variant(ty, "Some")?;
    if none.is_empty() && some.len() == 1 {
        some.pop()
    } else {
        None
    }
}

fn sequence_element(ty: &Type) -> Option<Type> {
    let len = method_signature(ty, "len")?;
    if !len.params.is_empty() || !len.ret.is_int() {
        return None;
    }
    let get = method_signature(ty, "get").filter(|sig| sig.params.len() == 1)?;
    Some(get.ret)
}

/// Whether indexing `ty` is a `get(index)` call.
pub fn has_get(ty: &Type) -> bool {
    method_signature(ty, "get").is_some_and(|sig| sig.params.len() == 1)
}
