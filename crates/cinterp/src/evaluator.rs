//! Tree-walking evaluator: AST + Memory → program result.
//!
//! Grounded on `interpreter/interpreter.py`'s `Interpreter(Visitor)` (same per-node dispatch,
//! same `FunctionCall`/`CompoundStmt`/loop/`Assignment`/`UnOp` behaviors), but control flow is
//! an explicit [`Flow`] sentinel rather than a magic string (`CF_BREAK`/`CF_CONTINUE`) smuggled
//! through a `None`-typed return channel — spec §9's design note. `scanf` and the other
//! memory-writing builtins take the running [`Memory`] through [`EvalContext`] instead of the
//! reference's special-cased "append memory as an extra positional argument" branch in
//! `visit_FunctionCall`.
//!
//! Struct variables are not laid out as a byte blob: `CType::size_bytes` refuses to size a
//! by-value struct (field access is by field identity, not byte layout), so a struct's
//! [`StructLayout`] instead reserves one address slot per leaf field, flattening nested
//! by-value structs recursively. [`Evaluator::struct_bases`] remembers which struct type a
//! base address was laid out as, so `.` access on a struct variable (which carries no `CType`
//! of its own once declared) can still find the right field slot; `->` access reads the struct
//! name straight off the pointer's `CType` instead.

use std::rc::Rc;

use ahash::AHashMap;

use crate::{
    ast::{
        AssignOp, BinOpKind, BlockItem, Expr, FieldOp, FunctionBody, FunctionDecl, IncludeLibrary, NumLit, Program, Stmt,
        SwitchItem, SwitchStmt, TopLevel, UnOpKind, VarDecl,
    },
    builtins,
    ctype::CType,
    error::{CError, CResult},
    io::{PrintWriter, StdinReader},
    memory::{Address, Binding, Memory, StoredValue},
    number::Number,
    resource::RecursionGuard,
    tracer::{EvalTracer, NoopTracer},
};
use rand::rngs::StdRng;

#[derive(Debug, Clone)]
pub enum Value {
    Number(Number),
    Str(String),
}

impl Value {
    /// # Errors
    /// Returns `CError::Runtime` if this value is a string, not a number.
    pub fn as_number(&self) -> CResult<&Number> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Str(_) => Err(CError::runtime("expected a numeric value, found a string")),
        }
    }
}

pub struct EvalContext<'a> {
    pub memory: &'a mut Memory,
    pub writer: &'a mut dyn PrintWriter,
    pub stdin: &'a mut dyn StdinReader,
    pub rng: &'a mut StdRng,
}

enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// One struct's field layout: each field's type and its offset (in address slots, not bytes)
/// from the struct's base address, plus the struct's total width in slots.
#[derive(Debug, Clone, Default)]
struct StructLayout {
    fields: Vec<(String, CType, u32)>,
    width: u32,
}

impl StructLayout {
    fn field(&self, name: &str) -> Option<(&CType, u32)> {
        self.fields.iter().find(|(n, ..)| n == name).map(|(_, ty, offset)| (ty, *offset))
    }
}

/// Number of address slots a field of type `ty` occupies: 1 for any scalar or pointer
/// (including a pointer-to-struct), or the nested struct's own width for a by-value struct
/// field. Never calls `CType::size_bytes` on a by-value struct.
fn field_width(ty: &CType, layouts: &AHashMap<String, StructLayout>) -> u32 {
    if ty.is_struct() && !ty.pointer() {
        let name = ty.struct_name().expect("struct CType carries a name");
        layouts.get(name).map_or(1, |layout| layout.width.max(1))
    } else {
        1
    }
}

fn build_layout(fields: &[(String, CType)], layouts: &AHashMap<String, StructLayout>) -> StructLayout {
    let mut laid_out = Vec::with_capacity(fields.len());
    let mut cursor = 0u32;
    for (name, ty) in fields {
        laid_out.push((name.clone(), ty.clone(), cursor));
        cursor += field_width(ty, layouts);
    }
    StructLayout { fields: laid_out, width: cursor.max(1) }
}

pub struct Evaluator<'t> {
    tracer: &'t mut dyn EvalTracer,
    recursion: RecursionGuard,
    depth: usize,
    struct_layouts: AHashMap<String, StructLayout>,
    /// Base address -> struct type name, for every by-value struct variable (and nested
    /// by-value struct field) laid out so far.
    struct_bases: AHashMap<Address, String>,
}

impl<'t> Evaluator<'t> {
    #[must_use]
    pub fn new(tracer: &'t mut dyn EvalTracer) -> Self {
        Self {
            tracer,
            recursion: RecursionGuard::default(),
            depth: 0,
            struct_layouts: AHashMap::new(),
            struct_bases: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn with_recursion_limit(tracer: &'t mut dyn EvalTracer, max_depth: usize) -> Self {
        Self {
            tracer,
            recursion: RecursionGuard::new(max_depth),
            depth: 0,
            struct_layouts: AHashMap::new(),
            struct_bases: AHashMap::new(),
        }
    }

    /// Runs `program` to completion and returns `main`'s return value, cast to `i64` (spec §6).
    ///
    /// # Errors
    /// Returns any `CError::Runtime` raised while preparing top-level declarations or while
    /// evaluating `main`.
    pub fn run(&mut self, program: &Program, ctx: &mut EvalContext<'_>) -> CResult<i64> {
        self.prepare(program, ctx)?;
        let result = self.call_function("main", &[], program.line, ctx)?;
        Ok(result.as_number()?.as_i64())
    }

    fn prepare(&mut self, program: &Program, ctx: &mut EvalContext<'_>) -> CResult<()> {
        for item in &program.items {
            match item {
                TopLevel::IncludeLibrary(include) => self.include_library(include, ctx)?,
                TopLevel::FunctionDecl(decl) => {
                    ctx.memory.declare_function(&decl.name, Rc::new(decl.clone()));
                }
                TopLevel::StructDecl(decl) => {
                    let layout = build_layout(&decl.fields, &self.struct_layouts);
                    self.struct_layouts.insert(decl.name.clone(), layout);
                }
                TopLevel::VarDecl(decl) => self.var_decl(decl, ctx)?,
            }
        }
        Ok(())
    }

    fn include_library(&mut self, include: &IncludeLibrary, ctx: &mut EvalContext<'_>) -> CResult<()> {
        let library = builtins::library(&include.library_name)
            .ok_or_else(|| CError::runtime_at(format!("unknown library '{}'", include.library_name), include.line))?;
        for function in library.functions {
            ctx.memory.declare_builtin(function.name, Rc::new(function));
        }
        for constant in library.constants {
            ctx.memory.declare_constant(constant.name, constant.value);
        }
        Ok(())
    }

    fn var_decl(&mut self, decl: &VarDecl, ctx: &mut EvalContext<'_>) -> CResult<()> {
        if let CType::Struct { name, pointer: false } = &decl.ty {
            self.declare_struct(name, &decl.name, decl.line, ctx)?;
            return Ok(());
        }

        ctx.memory.declare(&decl.ty, &decl.name);
        if let Some(init) = &decl.init {
            let value = self.eval_expr(init, ctx)?;
            let cast = value.as_number()?.cast(&decl.ty);
            ctx.memory.write(&decl.name, cast)?;
        }
        Ok(())
    }

    /// Lays out a fresh instance of `struct_name` and binds `var_name` to its base address.
    fn declare_struct(&mut self, struct_name: &str, var_name: &str, line: usize, ctx: &mut EvalContext<'_>) -> CResult<()> {
        let base = self.layout_struct(struct_name, line, ctx)?;
        ctx.memory.bind_address(var_name, base);
        Ok(())
    }

    /// Allocates storage for one instance of `struct_name`, recursively initializing nested
    /// by-value struct fields, and returns its base address.
    fn layout_struct(&mut self, struct_name: &str, line: usize, ctx: &mut EvalContext<'_>) -> CResult<Address> {
        let layout = self
            .struct_layouts
            .get(struct_name)
            .cloned()
            .ok_or_else(|| CError::runtime_at(format!("unknown struct '{struct_name}'"), line))?;
        let base = ctx.memory.allocate(layout.width);
        self.struct_bases.insert(base, struct_name.to_string());
        self.init_struct_slots(base, &layout, line, ctx)?;
        Ok(base)
    }

    fn init_struct_slots(&mut self, base: Address, layout: &StructLayout, line: usize, ctx: &mut EvalContext<'_>) -> CResult<()> {
        for (_, ty, offset) in &layout.fields {
            let address = base + Address::from(*offset);
            if ty.is_struct() && !ty.pointer() {
                let nested_name = ty.struct_name().expect("struct CType carries a name").to_string();
                let nested = self
                    .struct_layouts
                    .get(&nested_name)
                    .cloned()
                    .ok_or_else(|| CError::runtime_at(format!("unknown struct '{nested_name}'"), line))?;
                self.struct_bases.insert(address, nested_name);
                self.init_struct_slots(address, &nested, line, ctx)?;
            } else {
                ctx.memory.store(address, Number::uninitialized(ty));
            }
        }
        Ok(())
    }

    fn call_function(&mut self, name: &str, args: &[Value], line: usize, ctx: &mut EvalContext<'_>) -> CResult<Value> {
        let binding = ctx.memory.lookup(name)?.clone();
        match binding {
            Binding::Builtin(builtin) => {
                let result = (builtin.handler)(args, ctx)?;
                let value = result.as_number()?.cast(&builtin.return_type);
                Ok(Value::Number(value))
            }
            Binding::Function(decl) => self.call_user_function(&decl, args, line, ctx),
            Binding::Address(_) | Binding::Const(_) => Err(CError::runtime_at(format!("'{name}' is not callable"), line)),
        }
    }

    fn call_user_function(
        &mut self,
        decl: &FunctionDecl,
        args: &[Value],
        line: usize,
        ctx: &mut EvalContext<'_>,
    ) -> CResult<Value> {
        self.recursion.enter()?;
        self.depth += 1;
        self.tracer.on_call(&decl.name, self.depth);

        ctx.memory.new_frame();
        let bound = (|| -> CResult<()> {
            for (param, arg) in decl.params.iter().zip(args.iter()) {
                ctx.memory.declare(&param.ty, &param.name);
                let cast = arg.as_number()?.cast(&param.ty);
                ctx.memory.write(&param.name, cast)?;
            }
            Ok(())
        })();

        let flow = bound.and_then(|()| self.function_body(&decl.body, ctx));
        ctx.memory.del_frame();
        self.tracer.on_return(&decl.name, self.depth);
        self.depth -= 1;
        self.recursion.exit();

        match flow? {
            Flow::Return(value) => Ok(Value::Number(value.as_number()?.cast(&decl.ret_type))),
            Flow::Normal | Flow::Break | Flow::Continue => {
                Err(CError::runtime_at(format!("function '{}' did not return a value", decl.name), line))
            }
        }
    }

    fn function_body(&mut self, body: &FunctionBody, ctx: &mut EvalContext<'_>) -> CResult<Flow> {
        for item in &body.items {
            match self.block_item(item, ctx)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn block_item(&mut self, item: &BlockItem, ctx: &mut EvalContext<'_>) -> CResult<Flow> {
        match item {
            BlockItem::Decl(decl) => {
                self.var_decl(decl, ctx)?;
                Ok(Flow::Normal)
            }
            BlockItem::Stmt(stmt) => self.stmt(stmt, ctx),
        }
    }

    fn stmt(&mut self, stmt: &Stmt, ctx: &mut EvalContext<'_>) -> CResult<Flow> {
        self.tracer.on_statement(stmt_kind(stmt), stmt.line(), self.depth);
        match stmt {
            Stmt::Compound(c) => {
                ctx.memory.new_scope();
                let mut result = Ok(Flow::Normal);
                for item in &c.items {
                    match self.block_item(item, ctx) {
                        Ok(Flow::Normal) => {}
                        other => {
                            result = other;
                            break;
                        }
                    }
                }
                ctx.memory.del_scope();
                result
            }
            Stmt::If(s) => {
                if self.eval_expr(&s.condition, ctx)?.as_number()?.truthy() {
                    self.stmt(&s.then_branch, ctx)
                } else if let Some(else_branch) = &s.else_branch {
                    self.stmt(else_branch, ctx)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While(s) => {
                while self.eval_expr(&s.condition, ctx)?.as_number()?.truthy() {
                    match self.stmt(&s.body, ctx)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::DoWhile(s) => {
                loop {
                    match self.stmt(&s.body, ctx)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                    if !self.eval_expr(&s.condition, ctx)?.as_number()?.truthy() {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For(s) => {
                self.eval_expr(&s.setup, ctx)?;
                while self.eval_expr(&s.condition, ctx)?.as_number()?.truthy() {
                    match self.stmt(&s.body, ctx)? {
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                        // A `continue` still runs the increment: the correct C semantics the
                        // reference implementation got inconsistently right (spec §9).
                        Flow::Normal | Flow::Continue => {}
                    }
                    self.eval_expr(&s.increment, ctx)?;
                }
                Ok(Flow::Normal)
            }
            Stmt::Switch(s) => self.switch_stmt(s, ctx),
            Stmt::Return(s) => {
                let value = match &s.expr {
                    Some(expr) => self.eval_expr(expr, ctx)?,
                    None => Value::Number(Number::int(0)),
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Continue(_) => Ok(Flow::Continue),
            Stmt::Expr(e) => {
                self.eval_expr(e, ctx)?;
                Ok(Flow::Normal)
            }
            Stmt::NoOp(_) => Ok(Flow::Normal),
        }
    }

    fn switch_stmt(&mut self, s: &SwitchStmt, ctx: &mut EvalContext<'_>) -> CResult<Flow> {
        let scrutinee = self.eval_expr(&s.expr, ctx)?.as_number()?.clone();
        ctx.memory.new_scope();

        let default_index = s.items.iter().position(|item| matches!(item, SwitchItem::DefaultLabel(_)));
        let result = (|| {
            let start = match self.find_case(s, &scrutinee, ctx)? {
                Some(index) => index,
                None => match default_index {
                    Some(index) => index,
                    None => return Ok(Flow::Normal),
                },
            };

            for item in &s.items[start..] {
                match item {
                    SwitchItem::CaseLabel(..) | SwitchItem::DefaultLabel(_) => {}
                    SwitchItem::Decl(decl) => self.var_decl(decl, ctx)?,
                    SwitchItem::Stmt(inner) => match self.stmt(inner, ctx)? {
                        Flow::Break => return Ok(Flow::Normal),
                        Flow::Normal => {}
                        other => return Ok(other),
                    },
                }
            }
            Ok(Flow::Normal)
        })();

        ctx.memory.del_scope();
        result
    }

    fn find_case(&mut self, s: &SwitchStmt, scrutinee: &Number, ctx: &mut EvalContext<'_>) -> CResult<Option<usize>> {
        for (i, item) in s.items.iter().enumerate() {
            if let SwitchItem::CaseLabel(expr, _) = item {
                let label = self.eval_expr(expr, ctx)?;
                if label.as_number()?.as_i64() == scrutinee.as_i64() {
                    return Ok(Some(i));
                }
            }
        }
        Ok(None)
    }

    fn eval_expr(&mut self, expr: &Expr, ctx: &mut EvalContext<'_>) -> CResult<Value> {
        match expr {
            Expr::Num(lit, _) => Ok(Value::Number(match lit {
                NumLit::Int(v) => Number::int(*v),
                NumLit::Char(v) => Number::new(CType::char(), crate::number::RawValue::Int(*v)),
                NumLit::Real(v) => Number::double(*v),
            })),
            Expr::String(s, _) => Ok(Value::Str(s.clone())),
            Expr::Var(name, line) => self.read_var(name, *line, ctx),
            Expr::Assignment { lhs, op, rhs, line } => self.assignment(lhs, *op, rhs, *line, ctx),
            Expr::BinOp { lhs, op, rhs, line } => self.binop(lhs, *op, rhs, *line, ctx),
            Expr::UnOp { op, expr, prefix, line } => self.unop(op, expr, *prefix, *line, ctx),
            Expr::TerOp { condition, true_exp, false_exp, .. } => {
                if self.eval_expr(condition, ctx)?.as_number()?.truthy() {
                    self.eval_expr(true_exp, ctx)
                } else {
                    self.eval_expr(false_exp, ctx)
                }
            }
            Expr::FunctionCall { name, args, line } => self.function_call(name, args, *line, ctx),
            Expr::FieldAccess { op, target, field, line } => self.field_access(*op, target, field, *line, ctx),
            Expr::Comma(items, _) => {
                let mut last = Value::Number(Number::int(0));
                for item in items {
                    last = self.eval_expr(item, ctx)?;
                }
                Ok(last)
            }
            Expr::NoOp(_) => Ok(Value::Number(Number::int(0))),
        }
    }

    fn read_var(&mut self, name: &str, line: usize, ctx: &mut EvalContext<'_>) -> CResult<Value> {
        match ctx.memory.read(name)? {
            StoredValue::Number(n) => Ok(Value::Number(n)),
            StoredValue::Function(_) | StoredValue::Builtin(_) => {
                Err(CError::runtime_at(format!("'{name}' is a function, not a value"), line))
            }
        }
    }

    fn lvalue_address(&mut self, expr: &Expr, ctx: &mut EvalContext<'_>) -> CResult<Address> {
        match expr {
            Expr::Var(name, _) => ctx.memory.get_address(name),
            Expr::UnOp { op: UnOpKind::Deref, expr: inner, .. } => {
                let value = self.eval_expr(inner, ctx)?;
                Ok(value.as_number()?.as_i64() as Address)
            }
            Expr::FieldAccess { op, target, field, line } => self.field_address(*op, target, field, *line, ctx),
            other => Err(CError::runtime_at("expression is not an lvalue", other.line())),
        }
    }

    /// Resolves a `.`/`->` access to the address of the named field.
    ///
    /// `.` looks the target's base address up in `struct_bases` (populated when the struct
    /// variable was declared) to learn which struct type it is; `->` reads the struct name
    /// directly off the pointer value's own `CType`.
    fn field_address(&mut self, op: FieldOp, target: &Expr, field: &str, line: usize, ctx: &mut EvalContext<'_>) -> CResult<Address> {
        let (base, struct_name) = match op {
            FieldOp::Dot => {
                let base = self.lvalue_address(target, ctx)?;
                let name = self
                    .struct_bases
                    .get(&base)
                    .cloned()
                    .ok_or_else(|| CError::runtime_at(format!("'.{field}' accessed on a non-struct value"), line))?;
                (base, name)
            }
            FieldOp::Arrow => {
                let value = self.eval_expr(target, ctx)?;
                let number = value.as_number()?;
                let name = number
                    .ty
                    .struct_name()
                    .ok_or_else(|| CError::runtime_at("'->' requires a pointer-to-struct value", line))?
                    .to_string();
                (number.as_i64() as Address, name)
            }
        };

        let layout = self
            .struct_layouts
            .get(&struct_name)
            .ok_or_else(|| CError::runtime_at(format!("unknown struct '{struct_name}'"), line))?;
        let (_, offset) = layout
            .field(field)
            .ok_or_else(|| CError::runtime_at(format!("struct '{struct_name}' has no field '{field}'"), line))?;
        Ok(base + Address::from(offset))
    }

    fn field_access(&mut self, op: FieldOp, target: &Expr, field: &str, line: usize, ctx: &mut EvalContext<'_>) -> CResult<Value> {
        let address = self.field_address(op, target, field, line, ctx)?;
        Ok(Value::Number(ctx.memory.load(address).as_number()?.clone()))
    }

    fn assignment(&mut self, lhs: &Expr, op: AssignOp, rhs: &Expr, line: usize, ctx: &mut EvalContext<'_>) -> CResult<Value> {
        let address = self.lvalue_address(lhs, ctx)?;

        // A by-value struct variable's base address is also its first field's slot, so keying
        // this branch on the resolved address alone would also catch `z.a = 3` (a scalar field
        // access that happens to resolve to the struct's base address). Require the LHS to be a
        // bare `Var` naming the whole struct, and the RHS to resolve to a struct lvalue too;
        // anything else (including first-field access) falls through to ordinary scalar
        // assignment.
        let lhs_struct_name =
            if matches!(op, AssignOp::Assign) && matches!(lhs, Expr::Var(..)) { self.struct_bases.get(&address).cloned() } else { None };
        let rhs_is_struct_var = matches!(rhs, Expr::Var(..) | Expr::FieldAccess { op: FieldOp::Arrow, .. });

        if let Some(struct_name) = lhs_struct_name
            && rhs_is_struct_var
        {
            let rhs_address = self.lvalue_address(rhs, ctx)?;
            if self.struct_bases.contains_key(&rhs_address) {
                let layout = self
                    .struct_layouts
                    .get(&struct_name)
                    .cloned()
                    .ok_or_else(|| CError::runtime_at(format!("unknown struct '{struct_name}'"), line))?;
                for offset in 0..layout.width {
                    let field_value = ctx.memory.load(rhs_address + Address::from(offset)).as_number()?.clone();
                    ctx.memory.store(address + Address::from(offset), field_value);
                }
                return Ok(Value::Number(ctx.memory.load(address).as_number()?.clone()));
            }
        }

        let current = ctx.memory.load(address).as_number()?.clone();
        let rhs_value = self.eval_expr(rhs, ctx)?.as_number()?.clone();

        let combined = match op {
            AssignOp::Assign => rhs_value,
            AssignOp::AddAssign => current.add(&rhs_value),
            AssignOp::SubAssign => current.sub(&rhs_value),
            AssignOp::MulAssign => current.mul(&rhs_value),
            AssignOp::DivAssign => current.div(&rhs_value)?,
            AssignOp::ModAssign => current.rem(&rhs_value)?,
            AssignOp::AndAssign => current.bitand(&rhs_value),
            AssignOp::OrAssign => current.bitor(&rhs_value),
            AssignOp::XorAssign => current.bitxor(&rhs_value),
            AssignOp::ShlAssign => current.shl(&rhs_value),
            AssignOp::ShrAssign => current.shr(&rhs_value),
        };
        let _ = line;
        let result = combined.cast(&current.ty);
        ctx.memory.store(address, result.clone());
        Ok(Value::Number(result))
    }

    fn binop(&mut self, lhs: &Expr, op: BinOpKind, rhs: &Expr, line: usize, ctx: &mut EvalContext<'_>) -> CResult<Value> {
        let lhs = self.eval_expr(lhs, ctx)?.as_number()?.clone();
        let rhs = self.eval_expr(rhs, ctx)?.as_number()?.clone();
        let _ = line;
        let result = match op {
            BinOpKind::Add => lhs.add(&rhs),
            BinOpKind::Sub => lhs.sub(&rhs),
            BinOpKind::Mul => lhs.mul(&rhs),
            BinOpKind::Div => lhs.div(&rhs)?,
            BinOpKind::Mod => lhs.rem(&rhs)?,
            BinOpKind::Lt => lhs.lt(&rhs),
            BinOpKind::Gt => lhs.gt(&rhs),
            BinOpKind::Le => lhs.le(&rhs),
            BinOpKind::Ge => lhs.ge(&rhs),
            BinOpKind::Eq => lhs.eq_num(&rhs),
            BinOpKind::Ne => lhs.ne_num(&rhs),
            BinOpKind::LogAnd => lhs.log_and(&rhs),
            BinOpKind::LogOr => lhs.log_or(&rhs),
            BinOpKind::BitAnd => lhs.bitand(&rhs),
            BinOpKind::BitOr => lhs.bitor(&rhs),
            BinOpKind::BitXor => lhs.bitxor(&rhs),
            BinOpKind::Shl => lhs.shl(&rhs),
            BinOpKind::Shr => lhs.shr(&rhs),
        };
        Ok(Value::Number(result))
    }

    fn unop(&mut self, op: &UnOpKind, expr: &Expr, prefix: bool, line: usize, ctx: &mut EvalContext<'_>) -> CResult<Value> {
        match op {
            UnOpKind::AddressOf => {
                let address = self.lvalue_address(expr, ctx)?;
                Ok(Value::Number(Number::int(address as i64)))
            }
            UnOpKind::Deref => {
                let value = self.eval_expr(expr, ctx)?;
                let address = value.as_number()?.as_i64() as Address;
                Ok(Value::Number(ctx.memory.load(address).as_number()?.clone()))
            }
            UnOpKind::Inc | UnOpKind::Dec => self.incdec(op, expr, prefix, ctx),
            UnOpKind::Neg => {
                let value = self.eval_expr(expr, ctx)?.as_number()?.clone();
                Ok(Value::Number(value.neg()))
            }
            UnOpKind::Pos => self.eval_expr(expr, ctx),
            UnOpKind::Not => {
                let value = self.eval_expr(expr, ctx)?.as_number()?.clone();
                Ok(Value::Number(value.log_neg()))
            }
            UnOpKind::Cast(ty) => {
                let value = self.eval_expr(expr, ctx)?.as_number()?.clone();
                let _ = line;
                Ok(Value::Number(value.cast(ty)))
            }
        }
    }

    fn incdec(&mut self, op: &UnOpKind, expr: &Expr, prefix: bool, ctx: &mut EvalContext<'_>) -> CResult<Value> {
        let address = self.lvalue_address(expr, ctx)?;
        let before = ctx.memory.load(address).as_number()?.clone();
        let one = Number::int(1);
        let after = match op {
            UnOpKind::Inc => before.add(&one),
            UnOpKind::Dec => before.sub(&one),
            _ => unreachable!("incdec only called for Inc/Dec"),
        }
        .cast(&before.ty);
        ctx.memory.store(address, after.clone());
        Ok(Value::Number(if prefix { after } else { before }))
    }

    fn function_call(&mut self, name: &str, args: &[Expr], line: usize, ctx: &mut EvalContext<'_>) -> CResult<Value> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, ctx)?);
        }
        self.call_function(name, &values, line, ctx)
    }
}

fn stmt_kind(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::Compound(_) => "compound",
        Stmt::If(_) => "if",
        Stmt::While(_) => "while",
        Stmt::DoWhile(_) => "do-while",
        Stmt::For(_) => "for",
        Stmt::Switch(_) => "switch",
        Stmt::Return(_) => "return",
        Stmt::Break(_) => "break",
        Stmt::Continue(_) => "continue",
        Stmt::Expr(_) => "expr",
        Stmt::NoOp(_) => "noop",
    }
}

/// Runs a parsed, analyzed program to completion, returning `main`'s status code (spec §6).
///
/// # Errors
/// Returns any `CError` raised while preparing top-level declarations or evaluating `main`.
pub fn run_program(
    program: &Program,
    writer: &mut dyn PrintWriter,
    stdin: &mut dyn StdinReader,
    rng: &mut StdRng,
) -> CResult<i64> {
    let mut memory = Memory::new();
    let mut ctx = EvalContext { memory: &mut memory, writer, stdin, rng };
    let mut tracer = NoopTracer;
    Evaluator::new(&mut tracer).run(program, &mut ctx)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::{
        io::{CollectStringPrint, FixedStdin, NoStdin},
        parser::Parser,
    };

    fn run(src: &str) -> (i64, String) {
        let program = Parser::parse(src).unwrap();
        crate::analyzer::Analyzer::analyze(&program).unwrap();
        let mut writer = CollectStringPrint::default();
        let mut stdin = NoStdin;
        let mut rng = StdRng::seed_from_u64(0);
        let status = run_program(&program, &mut writer, &mut stdin, &mut rng).unwrap();
        (status, writer.into_output())
    }

    fn run_with_stdin(src: &str, input: &str) -> (i64, String) {
        let program = Parser::parse(src).unwrap();
        crate::analyzer::Analyzer::analyze(&program).unwrap();
        let mut writer = CollectStringPrint::default();
        let mut stdin = FixedStdin::new(input);
        let mut rng = StdRng::seed_from_u64(0);
        let status = run_program(&program, &mut writer, &mut stdin, &mut rng).unwrap();
        (status, writer.into_output())
    }

    #[test]
    fn hello_world_prints_and_exits_zero() {
        let src = r#"
            #include <stdio.h>
            int main() {
                printf("hello, world\n");
                return 0;
            }
        "#;
        let (status, out) = run(src);
        assert_eq!(status, 0);
        assert_eq!(out, "hello, world\n");
    }

    #[test]
    fn for_loop_with_break_accumulates_and_exits_with_accumulator() {
        let src = r"
            int main() {
                int total = 0;
                for (int i = 0; i < 10; i = i + 1) {
                    if (i == 5) { break; }
                    total = total + i;
                }
                return total;
            }
        ";
        let (status, _) = run(src);
        assert_eq!(status, 0 + 1 + 2 + 3 + 4);
    }

    #[test]
    fn xor_of_two_and_three_is_one() {
        let src = r"
            int main() {
                return 2 ^ 3;
            }
        ";
        let (status, _) = run(src);
        assert_eq!(status, 1);
    }

    #[test]
    fn pointer_write_through_deref_is_visible_through_the_original_name() {
        let src = r"
            int main() {
                int a = 1;
                int *p = &a;
                *p = 9;
                return a;
            }
        ";
        let (status, _) = run(src);
        assert_eq!(status, 9);
    }

    #[test]
    fn switch_falls_through_to_default_when_no_case_matches() {
        let src = r#"
            #include <stdio.h>
            int main() {
                int x = 7;
                switch (x) {
                    case 1:
                        printf("one");
                        break;
                    default:
                        printf("other");
                }
                return 0;
            }
        "#;
        let (_, out) = run(src);
        assert_eq!(out, "other");
    }

    #[test]
    fn struct_field_access_through_value_and_pointer() {
        let src = r#"
            #include <stdio.h>
            struct S { int a; int b; };
            int main() {
                struct S z;
                struct S *p = &z;
                z.a = 3;
                p->b = 4;
                printf("%d %d", z.a, p->b);
                return 0;
            }
        "#;
        let (_, out) = run(src);
        assert_eq!(out, "3 4");
    }

    #[test]
    fn whole_struct_assignment_copies_every_field() {
        let src = r#"
            #include <stdio.h>
            struct S { int a; int b; };
            int main() {
                struct S x;
                struct S y;
                x.a = 1;
                x.b = 2;
                y = x;
                y.a = 99;
                printf("%d %d %d %d", x.a, x.b, y.a, y.b);
                return 0;
            }
        "#;
        let (_, out) = run(src);
        assert_eq!(out, "1 2 99 2");
    }

    #[test]
    fn continue_inside_for_loop_still_runs_the_increment() {
        let src = r"
            int main() {
                int count = 0;
                for (int i = 0; i < 5; i = i + 1) {
                    if (i == 2) { continue; }
                    count = count + 1;
                }
                return count;
            }
        ";
        let (status, _) = run(src);
        assert_eq!(status, 4);
    }

    #[test]
    fn recursive_function_calls_compute_factorial() {
        let src = r"
            int fact(int n) {
                if (n <= 1) { return 1; }
                return n * fact(n - 1);
            }
            int main() {
                return fact(5);
            }
        ";
        let (status, _) = run(src);
        assert_eq!(status, 120);
    }

    #[test]
    fn scanf_reads_an_integer_from_stdin_through_a_pointer_argument() {
        let src = r#"
            #include <stdio.h>
            int main() {
                int x;
                scanf("%d", &x);
                return x;
            }
        "#;
        let (status, _) = run_with_stdin(src, "42");
        assert_eq!(status, 42);
    }

    #[test]
    fn double_free_surfaces_as_a_runtime_error() {
        let src = r"
            #include <stdlib.h>
            int main() {
                int *p = malloc(4);
                free(p);
                free(p);
                return 0;
            }
        ";
        let program = Parser::parse(src).unwrap();
        crate::analyzer::Analyzer::analyze(&program).unwrap();
        let mut writer = CollectStringPrint::default();
        let mut stdin = NoStdin;
        let mut rng = StdRng::seed_from_u64(0);
        assert!(run_program(&program, &mut writer, &mut stdin, &mut rng).is_err());
    }
}
