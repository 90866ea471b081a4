//! Type-parameter substitution.
//!
//! Substitution builds new cells only along paths that mention a substituted
//! parameter; untouched subtrees keep their original handles, so aliasing
//! between unrelated types is preserved.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use slang_ir::defs::TypeParameter;
use slang_ir::{FunctionType, Id, Type, TypeKind};
use slang_stack::ensure_sufficient_stack;

/// Type parameter identity to replacement type.
pub type Substitution = FxHashMap<Id, Type>;

/// Replace every reference to a mapped type parameter inside `ty`.
pub fn subst(ty: &Type, mapping: &Substitution) -> Type {
    if mapping.is_empty() {
        return ty.clone();
    }
    ensure_sufficient_stack(|| subst_inner(ty, mapping))
}

fn subst_inner(ty: &Type, mapping: &Substitution) -> Type {
    let kind = ty.kind().clone();
    match kind {
        TypeKind::Param(param) => mapping
            .get(&param.id)
            .cloned()
            .unwrap_or_else(|| ty.clone()),
        TypeKind::Meta {
            resolved: Some(target),
            ..
        } => subst(&target, mapping),
        TypeKind::App { tycon, args } => match subst_list(&args, mapping) {
            Some(args) => Type::new(TypeKind::App { tycon, args }),
            None => ty.clone(),
        },
        TypeKind::Function(signature) => {
            let params = subst_list(&signature.params, mapping);
            let ret = subst(&signature.ret, mapping);
            let except = subst(&signature.except, mapping);
            if params.is_none() && ret.same(&signature.ret) && except.same(&signature.except) {
                return ty.clone();
            }
            Type::function(FunctionType {
                param_names: signature.param_names,
                params: params.unwrap_or(signature.params),
                ret,
                except,
            })
        }
        TypeKind::Array { size, element } => {
            let new = subst(&element, mapping);
            if new.same(&element) {
                ty.clone()
            } else {
                Type::array(size, new)
            }
        }
        TypeKind::Pointer(element) => {
            let new = subst(&element, mapping);
            if new.same(&element) {
                ty.clone()
            } else {
                Type::pointer(new)
            }
        }
        TypeKind::Base(_)
        | TypeKind::Meta { resolved: None, .. }
        | TypeKind::Unapplied(_)
        | TypeKind::Syntax(_)
        | TypeKind::Unreachable
        | TypeKind::Void => ty.clone(),
    }
}

/// Substituted list, or `None` when no element changed.
fn subst_list(types: &[Type], mapping: &Substitution) -> Option<Vec<Type>> {
    let new: Vec<Type> = types.iter().map(|t| subst(t, mapping)).collect();
    if new.iter().zip(types).all(|(n, o)| n.same(o)) {
        None
    } else {
        Some(new)
    }
}

/// Substitute every component of a signature.
pub fn subst_signature(signature: &FunctionType, mapping: &Substitution) -> FunctionType {
    FunctionType {
        param_names: signature.param_names.clone(),
        params: signature.params.iter().map(|t| subst(t, mapping)).collect(),
        ret: subst(&signature.ret, mapping),
        except: subst(&signature.except, mapping),
    }
}

/// One fresh placeholder per type parameter.
pub fn fresh_instance(params: &[Rc<TypeParameter>]) -> (Substitution, Vec<Type>) {
    let metas: Vec<Type> = params.iter().map(|p| Type::meta(p.id.name())).collect();
    let mapping = params
        .iter()
        .map(|p| p.id.clone())
        .zip(metas.iter().cloned())
        .collect();
    (mapping, metas)
}

/// Map each type parameter to the argument at the same position.
pub fn bind_arguments(params: &[Rc<TypeParameter>], args: &[Type]) -> Substitution {
    params
        .iter()
        .map(|p| p.id.clone())
        .zip(args.iter().cloned())
        .collect()
}
