//! In-place type rewriting.
//!
//! Type cells are shared between the tree, definitions and signatures, so
//! replacing what a cell holds (rather than the handle in one slot) updates
//! every use at once. [`TypeSwap`] visits every cell reachable from a set of
//! modules exactly once and lets a rewrite function replace its contents.
//!
//! Also home to the helpers the enum and class phases share for building
//! generic replacement structs.

use std::rc::Rc;

use rustc_hash::FxHashSet;
use slang_ir::build::Builder;
use slang_ir::defs::{StructDef, TypeParameter};
use slang_ir::visitor::VisitorMut;
use slang_ir::{Module, TyCon, Type, TypeKind};
use slang_stack::ensure_sufficient_stack;
use slang_types::{bind_arguments, Substitution};

/// Fresh type parameters mirroring `params`, and the mapping onto them.
pub(crate) fn mirror(
    b: &Builder<'_>,
    params: &[Rc<TypeParameter>],
) -> (Vec<Rc<TypeParameter>>, Substitution) {
    let fresh: Vec<Rc<TypeParameter>> = params.iter().map(|p| b.type_param(p.id.name())).collect();
    let args: Vec<Type> = fresh.iter().map(Type::param).collect();
    (fresh, bind_arguments(params, &args))
}

pub(crate) fn applied(def: &Rc<StructDef>, args: Vec<Type>) -> Type {
    TyCon::Struct(Rc::clone(def)).apply(args)
}

pub(crate) struct TypeSwap<F> {
    rewrite: F,
    seen: FxHashSet<usize>,
    swapped: usize,
}

impl<F: FnMut(&Type) -> Option<TypeKind>> TypeSwap<F> {
    /// `rewrite` sees each cell before its components and returns the new
    /// contents, if any.
    pub(crate) fn new(rewrite: F) -> Self {
        TypeSwap {
            rewrite,
            seen: FxHashSet::default(),
            swapped: 0,
        }
    }

    pub(crate) fn modules(mut self, modules: &[Module]) -> usize {
        for module in modules {
            for definition in &module.definitions {
                self.visit_definition(definition);
            }
        }
        self.swapped
    }

    fn swap(&mut self, ty: &Type) {
        ensure_sufficient_stack(|| {
            if !self.seen.insert(ty.cell_address()) {
                return;
            }
            if let Some(kind) = (self.rewrite)(ty) {
                ty.set(kind);
                self.swapped += 1;
            }
            let kind = ty.kind().clone();
            match kind {
                TypeKind::App { args, .. } => args.iter().for_each(|arg| self.swap(arg)),
                TypeKind::Function(signature) => {
                    signature.params.iter().for_each(|param| self.swap(param));
                    self.swap(&signature.ret);
                    self.swap(&signature.except);
                }
                TypeKind::Array { element, .. } | TypeKind::Pointer(element) => {
                    self.swap(&element);
                }
                TypeKind::Meta {
                    resolved: Some(target),
                    ..
                } => self.swap(&target),
                TypeKind::Base(_)
                | TypeKind::Meta { resolved: None, .. }
                | TypeKind::Param(_)
                | TypeKind::Unapplied(_)
                | TypeKind::Syntax(_)
                | TypeKind::Unreachable
                | TypeKind::Void => {}
            }
        });
    }
}

impl<F: FnMut(&Type) -> Option<TypeKind>> VisitorMut for TypeSwap<F> {
    fn visit_type(&mut self, ty: &mut Type) {
        self.swap(ty);
    }
}
