//! The type checker.
//!
//! Checking walks every definition of a module and writes a type into each
//! statement and expression. It also records the decisions later passes
//! consume: the iteration capability of each for-loop and the variant each
//! case arm matches.
//!
//! # Failure policy
//!
//! Each definition is checked independently. The first failure inside a
//! definition is reported and abandons the rest of that definition (checks
//! return `Err(Failed)` and `?` unwinds to the definition loop); checking
//! then resumes with the next definition. The module fails as a whole when
//! any definition failed.
//!
//! # Exception context
//!
//! `raise` and calls of raising functions need a compatible handler type on
//! the exception stack. A function declaring an exception type pushes it
//! for its body; a `try` pushes its handler type for the guarded body.

mod expressions;
mod statements;

use std::rc::Rc;

use slang_diagnostic::{Diagnostics, DiagnosticSink, ErrorCode};
use slang_ir::defs::{FunctionDef, VarDef};
use slang_ir::{Definition, FunctionType, LabeledExpression, Location, Module, Type};
use tracing::{debug, trace};

use crate::unify::{coerce, unify, Mismatch};

/// Marker for an already reported failure that abandons the definition.
#[derive(Debug)]
pub(crate) struct Failed;

pub(crate) type Checked<T = ()> = Result<T, Failed>;

/// Type check every definition of `module`.
///
/// Idempotent on checked trees, which lets the lowering pipeline re-run it
/// after each phase.
#[tracing::instrument(level = "debug", skip_all, fields(module = %module.name()))]
pub fn check_module(module: &Module) -> Result<(), Diagnostics> {
    let mut checker = TypeChecker::new(module.name());
    for definition in &module.definitions {
        checker.check_definition(definition);
    }
    debug!(
        definitions = module.definitions.len(),
        errors = checker.sink.error_count(),
        "checked module"
    );
    checker.sink.finish()
}

struct TypeChecker {
    sink: DiagnosticSink,
    /// Declared return type of the function being checked.
    return_ty: Option<Type>,
    /// Innermost handler type last.
    except_stack: Vec<Type>,
}

impl TypeChecker {
    fn new(module: &str) -> Self {
        TypeChecker {
            sink: DiagnosticSink::new(module),
            return_ty: None,
            except_stack: Vec::new(),
        }
    }

    /// Report `message` and abandon the current definition.
    fn fail<T>(
        &mut self,
        code: ErrorCode,
        location: Location,
        message: impl Into<String>,
    ) -> Checked<T> {
        self.sink.error_once(code, location, message);
        Err(Failed)
    }

    fn mismatch<T>(&mut self, location: Location, mismatch: &Mismatch) -> Checked<T> {
        self.fail(ErrorCode::E2001, location, mismatch.to_string())
    }

    fn check_definition(&mut self, definition: &Definition) {
        match definition {
            Definition::Function(function) => {
                let _ = self.check_function(function);
            }
            Definition::VarDef(var) => {
                self.sink.begin_definition();
                self.return_ty = None;
                self.except_stack.clear();
                let _ = self.check_var_def(var);
            }
            Definition::Class(class) => {
                for field in &class.fields {
                    self.check_definition(&Definition::VarDef(Rc::clone(field)));
                }
                for method in &class.methods {
                    let _ = self.check_function(method);
                }
            }
            // Signatures only; nothing to infer.
            Definition::Module(_)
            | Definition::ExternFunction(_)
            | Definition::FunctionDecl(_)
            | Definition::Struct(_)
            | Definition::Enum(_)
            | Definition::Interface(_)
            | Definition::Variable(_)
            | Definition::Parameter(_)
            | Definition::TypeDef(_)
            | Definition::TypeParameter(_)
            | Definition::EnumVariant(_)
            | Definition::Field(_) => {}
        }
    }

    fn check_function(&mut self, function: &FunctionDef) -> Checked {
        trace!(function = %function.id, "checking function");
        self.sink.begin_definition();
        self.return_ty = Some(function.return_ty.clone());
        self.except_stack.clear();
        if !function.except_ty.is_void() {
            self.except_stack.push(function.except_ty.clone());
        }
        let mut body = function.body.borrow_mut();
        self.check_statement(&mut body)
    }

    /// Module-level variable or class member default.
    fn check_var_def(&mut self, var: &VarDef) -> Checked {
        let ty = var.ty.borrow().clone();
        let mut slot = var.value.borrow_mut();
        let Some(value) = slot.as_mut() else {
            return Ok(());
        };
        self.check_expression(value)?;
        let location = value.location;
        if let Err(mismatch) = coerce(value, &ty) {
            return self.mismatch(location, &mismatch);
        }
        Ok(())
    }

    /// Whether the innermost handler accepts `except`.
    fn handler_accepts(&self, except: &Type) -> bool {
        self.except_stack
            .last()
            .is_some_and(|handler| unify(handler, except))
    }

    /// Count, labels and types of call arguments against a signature.
    fn check_arguments(
        &mut self,
        signature: &FunctionType,
        args: &mut [LabeledExpression],
        location: Location,
    ) -> Checked {
        if args.len() != signature.params.len() {
            return self.fail(
                ErrorCode::E2002,
                location,
                format!(
                    "expected {} arguments, found {}",
                    signature.params.len(),
                    args.len()
                ),
            );
        }
        for (i, arg) in args.iter_mut().enumerate() {
            let declared = signature.param_names.get(i).and_then(Option::as_deref);
            if let (Some(label), Some(name)) = (arg.label.as_deref(), declared) {
                if label != name {
                    return self.fail(
                        ErrorCode::E2013,
                        arg.location,
                        format!("argument labeled `{label}` passed to parameter `{name}`"),
                    );
                }
            }
            self.check_expression(&mut arg.value)?;
            if let Err(mismatch) = coerce(&mut arg.value, &signature.params[i]) {
                return self.mismatch(arg.location, &mismatch);
            }
        }
        Ok(())
    }
}
