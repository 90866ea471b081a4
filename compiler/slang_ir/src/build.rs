//! Tree construction.
//!
//! [`Builder`] is the interface between the parser and the front end: it
//! mints ids from the run's [`IdGen`], stamps nodes with the current source
//! location and creates the (empty) scopes that scope filling populates.
//! Tests use it to write programs directly.

use std::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;

use crate::ast::{
    BinaryOp, CaseArm, Expression, ExpressionKind, LabeledExpression, Statement, StatementKind,
    SwitchArm, UnaryOp,
};
use crate::defs::{
    ClassDef, EnumDef, EnumVariant, ExternFunction, Field, FunctionDecl, FunctionDef,
    InterfaceDef, ModuleRef, Parameter, StructDef, TypeDef, TypeParameter, VarDef, Variable,
};
use crate::module::{Import, ImportKind};
use crate::{Definition, IdGen, Location, Module, Scope, ScopeKind, Type, TypeExpr};

pub struct Builder<'a> {
    ids: &'a IdGen,
    location: Cell<Location>,
}

impl<'a> Builder<'a> {
    pub fn new(ids: &'a IdGen) -> Self {
        Builder {
            ids,
            location: Cell::new(Location::new(1, 1)),
        }
    }

    /// Set the location stamped on subsequently built nodes.
    pub fn at(&self, row: u32, column: u32) -> &Self {
        self.location.set(Location::new(row, column));
        self
    }

    /// Like [`Builder::at`], for nodes synthesized from existing ones.
    pub fn located(&self, location: Location) -> &Self {
        self.location.set(location);
        self
    }

    pub fn location(&self) -> Location {
        self.location.get()
    }

    // Modules

    pub fn module(&self, name: &str) -> Module {
        Module {
            handle: Rc::new(ModuleRef {
                id: self.ids.fresh(name),
                location: self.location(),
                scope: Scope::new(ScopeKind::Module),
            }),
            definitions: Vec::new(),
            imports: Vec::new(),
            references: Vec::new(),
        }
    }

    /// `import module`
    pub fn import(&self, module: &str) -> Import {
        Import {
            module: module.to_owned(),
            location: self.location(),
            kind: ImportKind::Module,
        }
    }

    /// `from module import names`
    pub fn import_names(&self, module: &str, names: &[&str]) -> Import {
        Import {
            module: module.to_owned(),
            location: self.location(),
            kind: ImportKind::Names(
                names
                    .iter()
                    .map(|name| ((*name).to_owned(), self.location()))
                    .collect(),
            ),
        }
    }

    // Types

    /// Unresolved type syntax naming `name`.
    pub fn ty(&self, name: &str) -> Type {
        Type::syntax(TypeExpr::Name {
            name: name.to_owned(),
            location: self.location(),
        })
    }

    /// `base[args]` as type syntax.
    pub fn ty_apply(&self, base: &str, args: &[&str]) -> Type {
        let location = self.location();
        Type::syntax(TypeExpr::Apply {
            base: Box::new(TypeExpr::Name {
                name: base.to_owned(),
                location,
            }),
            args: args
                .iter()
                .map(|name| TypeExpr::Name {
                    name: (*name).to_owned(),
                    location,
                })
                .collect(),
            location,
        })
    }

    // Definitions

    pub fn type_param(&self, name: &str) -> Rc<TypeParameter> {
        Rc::new(TypeParameter {
            id: self.ids.fresh(name),
            location: self.location(),
        })
    }

    pub fn param(&self, name: &str, ty: Type) -> Rc<Parameter> {
        Rc::new(Parameter {
            id: self.ids.fresh(name),
            location: self.location(),
            ty: RefCell::new(ty),
        })
    }

    pub fn variable(&self, name: &str) -> Rc<Variable> {
        Rc::new(Variable {
            id: self.ids.fresh(name),
            location: self.location(),
            ty: RefCell::new(Type::void()),
        })
    }

    pub fn field(&self, name: &str, ty: Type) -> Rc<Field> {
        Rc::new(Field {
            id: self.ids.fresh(name),
            location: self.location(),
            ty,
        })
    }

    pub fn struct_def(
        &self,
        name: &str,
        type_parameters: Vec<Rc<TypeParameter>>,
        fields: Vec<Rc<Field>>,
    ) -> Rc<StructDef> {
        self.aggregate(name, type_parameters, fields, false)
    }

    /// A struct whose fields overlap in storage.
    pub fn union_def(
        &self,
        name: &str,
        type_parameters: Vec<Rc<TypeParameter>>,
        fields: Vec<Rc<Field>>,
    ) -> Rc<StructDef> {
        self.aggregate(name, type_parameters, fields, true)
    }

    fn aggregate(
        &self,
        name: &str,
        type_parameters: Vec<Rc<TypeParameter>>,
        fields: Vec<Rc<Field>>,
        is_union: bool,
    ) -> Rc<StructDef> {
        Rc::new(StructDef {
            id: self.ids.fresh(name),
            location: self.location(),
            type_parameters,
            fields,
            is_union,
            scope: Scope::new(ScopeKind::Struct),
        })
    }

    /// An enum; variant indices follow declaration order.
    pub fn enum_def(
        &self,
        name: &str,
        type_parameters: Vec<Rc<TypeParameter>>,
        variants: Vec<(&str, Vec<Type>)>,
    ) -> Rc<EnumDef> {
        let variants = variants
            .into_iter()
            .enumerate()
            .map(|(index, (variant, payload))| {
                Rc::new(EnumVariant {
                    id: self.ids.fresh(variant),
                    location: self.location(),
                    index,
                    payload,
                })
            })
            .collect();
        Rc::new(EnumDef {
            id: self.ids.fresh(name),
            location: self.location(),
            type_parameters,
            variants,
            scope: Scope::new(ScopeKind::Enum),
        })
    }

    pub fn var_def(&self, name: &str, ty: Type, value: Option<Expression>) -> Rc<VarDef> {
        Rc::new(VarDef {
            id: self.ids.fresh(name),
            location: self.location(),
            ty: RefCell::new(ty),
            value: RefCell::new(value),
        })
    }

    pub fn class_def(
        &self,
        name: &str,
        type_parameters: Vec<Rc<TypeParameter>>,
        fields: Vec<Rc<VarDef>>,
        methods: Vec<Rc<FunctionDef>>,
    ) -> Rc<ClassDef> {
        Rc::new(ClassDef {
            id: self.ids.fresh(name),
            location: self.location(),
            type_parameters,
            fields,
            methods,
            scope: Scope::new(ScopeKind::Class),
        })
    }

    pub fn interface_def(
        &self,
        name: &str,
        type_parameters: Vec<Rc<TypeParameter>>,
        methods: Vec<Rc<FunctionDecl>>,
    ) -> Rc<InterfaceDef> {
        Rc::new(InterfaceDef {
            id: self.ids.fresh(name),
            location: self.location(),
            type_parameters,
            methods,
            scope: Scope::new(ScopeKind::Interface),
        })
    }

    pub fn function_decl(
        &self,
        name: &str,
        parameters: Vec<Rc<Parameter>>,
        return_ty: Option<Type>,
    ) -> Rc<FunctionDecl> {
        Rc::new(FunctionDecl {
            id: self.ids.fresh(name),
            location: self.location(),
            parameters,
            return_ty: return_ty.unwrap_or_else(Type::void),
            except_ty: Type::void(),
        })
    }

    pub fn function(
        &self,
        name: &str,
        type_parameters: Vec<Rc<TypeParameter>>,
        parameters: Vec<Rc<Parameter>>,
        return_ty: Option<Type>,
        body: Statement,
    ) -> Rc<FunctionDef> {
        self.raising_function(name, type_parameters, parameters, return_ty, None, body)
    }

    /// A function declaring the exception type it may raise.
    pub fn raising_function(
        &self,
        name: &str,
        type_parameters: Vec<Rc<TypeParameter>>,
        parameters: Vec<Rc<Parameter>>,
        return_ty: Option<Type>,
        except_ty: Option<Type>,
        body: Statement,
    ) -> Rc<FunctionDef> {
        Rc::new(FunctionDef {
            id: self.ids.fresh(name),
            location: self.location(),
            type_parameters,
            this_param: OnceCell::new(),
            parameters,
            return_ty: return_ty.unwrap_or_else(Type::void),
            except_ty: except_ty.unwrap_or_else(Type::void),
            body: RefCell::new(body),
            scope: Scope::new(ScopeKind::Function),
        })
    }

    pub fn extern_function(
        &self,
        name: &str,
        parameters: Vec<Rc<Parameter>>,
        return_ty: Option<Type>,
    ) -> Rc<ExternFunction> {
        Rc::new(ExternFunction {
            id: self.ids.fresh(name),
            location: self.location(),
            parameters,
            return_ty: return_ty.unwrap_or_else(Type::void),
        })
    }

    pub fn type_def(&self, name: &str, ty: Type) -> Rc<TypeDef> {
        Rc::new(TypeDef {
            id: self.ids.fresh(name),
            location: self.location(),
            ty,
        })
    }

    // Statements

    fn statement(&self, kind: StatementKind) -> Statement {
        Statement::new(kind, self.location())
    }

    pub fn pass(&self) -> Statement {
        self.statement(StatementKind::Pass)
    }

    pub fn break_(&self) -> Statement {
        self.statement(StatementKind::Break)
    }

    pub fn unreachable(&self) -> Statement {
        self.statement(StatementKind::Unreachable)
    }

    pub fn compound(&self, statements: Vec<Statement>) -> Statement {
        self.statement(StatementKind::Compound(statements))
    }

    pub fn expr_stmt(&self, value: Expression) -> Statement {
        self.statement(StatementKind::Expression(value))
    }

    pub fn let_(
        &self,
        variable: &Rc<Variable>,
        type_hint: Option<Type>,
        value: Expression,
    ) -> Statement {
        self.statement(StatementKind::Let {
            variable: Rc::clone(variable),
            type_hint,
            value,
        })
    }

    pub fn assign(&self, target: Expression, value: Expression) -> Statement {
        self.statement(StatementKind::Assignment {
            target,
            op: None,
            value,
        })
    }

    pub fn if_(
        &self,
        condition: Expression,
        then_branch: Statement,
        else_branch: Option<Statement>,
    ) -> Statement {
        let else_branch = else_branch.unwrap_or_else(|| self.pass());
        self.statement(StatementKind::If {
            condition,
            then_branch: then_branch.boxed(),
            else_branch: else_branch.boxed(),
        })
    }

    pub fn while_(&self, condition: Expression, body: Statement) -> Statement {
        self.statement(StatementKind::While {
            condition,
            body: body.boxed(),
        })
    }

    pub fn loop_(&self, body: Statement) -> Statement {
        self.statement(StatementKind::Loop { body: body.boxed() })
    }

    pub fn for_(
        &self,
        variable: &Rc<Variable>,
        iterable: Expression,
        body: Statement,
    ) -> Statement {
        self.statement(StatementKind::For {
            variable: Rc::clone(variable),
            iterable,
            body: body.boxed(),
            iteration: None,
        })
    }

    pub fn case(
        &self,
        value: Expression,
        arms: Vec<CaseArm>,
        else_branch: Option<Statement>,
    ) -> Statement {
        self.statement(StatementKind::Case {
            value,
            arms,
            else_branch: else_branch.map(Statement::boxed),
        })
    }

    pub fn arm(&self, name: &str, variables: &[Rc<Variable>], body: Statement) -> CaseArm {
        CaseArm {
            name: name.to_owned(),
            location: self.location(),
            variables: variables.to_vec(),
            body: body.boxed(),
            variant: None,
            scope: Scope::new(ScopeKind::Block),
        }
    }

    pub fn switch(
        &self,
        value: Expression,
        arms: Vec<(i64, Statement)>,
        default: Statement,
    ) -> Statement {
        let location = self.location();
        self.statement(StatementKind::Switch {
            value,
            arms: arms
                .into_iter()
                .map(|(value, body)| SwitchArm {
                    value,
                    location,
                    body,
                })
                .collect(),
            default: default.boxed(),
        })
    }

    pub fn return_(&self, value: Option<Expression>) -> Statement {
        self.statement(StatementKind::Return(value))
    }

    pub fn raise(&self, value: Expression) -> Statement {
        self.statement(StatementKind::Raise(value))
    }

    // Expressions

    fn expression(&self, kind: ExpressionKind) -> Expression {
        Expression::new(kind, self.location())
    }

    pub fn int(&self, value: i64) -> Expression {
        self.expression(ExpressionKind::Int(value))
    }

    pub fn float(&self, value: f64) -> Expression {
        self.expression(ExpressionKind::Float(value))
    }

    pub fn str_(&self, value: &str) -> Expression {
        self.expression(ExpressionKind::Str(value.to_owned()))
    }

    pub fn char_(&self, value: char) -> Expression {
        self.expression(ExpressionKind::Char(value))
    }

    pub fn bool_(&self, value: bool) -> Expression {
        self.expression(ExpressionKind::Bool(value))
    }

    pub fn name(&self, name: &str) -> Expression {
        self.expression(ExpressionKind::Name(name.to_owned()))
    }

    pub fn reference(&self, definition: Definition) -> Expression {
        self.expression(ExpressionKind::Ref(definition))
    }

    pub fn attr(&self, base: Expression, attr: &str) -> Expression {
        self.expression(ExpressionKind::GetAttr {
            base: base.boxed(),
            attr: attr.to_owned(),
        })
    }

    pub fn index(&self, base: Expression, indices: Vec<Expression>) -> Expression {
        self.expression(ExpressionKind::GetIndex {
            base: base.boxed(),
            indices,
        })
    }

    pub fn binop(&self, op: BinaryOp, lhs: Expression, rhs: Expression) -> Expression {
        self.expression(ExpressionKind::Binop {
            op,
            lhs: lhs.boxed(),
            rhs: rhs.boxed(),
        })
    }

    pub fn unop(&self, op: UnaryOp, operand: Expression) -> Expression {
        self.expression(ExpressionKind::Unop {
            op,
            operand: operand.boxed(),
        })
    }

    pub fn call(&self, callee: Expression, args: Vec<LabeledExpression>) -> Expression {
        self.expression(ExpressionKind::Call {
            callee: callee.boxed(),
            args,
        })
    }

    /// Positional argument.
    pub fn arg(&self, value: Expression) -> LabeledExpression {
        LabeledExpression {
            label: None,
            location: self.location(),
            value,
        }
    }

    /// Labeled argument (`label: value`).
    pub fn labeled(&self, label: &str, value: Expression) -> LabeledExpression {
        LabeledExpression {
            label: Some(label.to_owned()),
            location: self.location(),
            value,
        }
    }

    pub fn array(&self, values: Vec<Expression>) -> Expression {
        self.expression(ExpressionKind::ArrayLiteral(values))
    }

    pub fn to_string(&self, value: Expression) -> Expression {
        self.expression(ExpressionKind::ToString(value.boxed()))
    }
}
