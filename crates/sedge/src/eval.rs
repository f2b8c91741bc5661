//! Statement and expression evaluation.
//!
//! Statement evaluators return a [`Completion`]; expression evaluators
//! return an [`Evaluated`] (a value, or a reference awaiting
//! GetValue/PutValue). Engine errors travel through the `Result` channel,
//! language-level `throw` through `Completion::Throw`; `try` recovers from
//! both.

use std::rc::Rc;

use crate::{
    ast::{Ast, AstKind, CatchClause, ObjectProperty, Postfix, ProgramBody, PropertyKind},
    convert::{decode_number_literal, decode_string_literal, number_to_string, to_boolean},
    error::{EvalResult, JsError},
    interp::{ArgList, Interp},
    object::{JsObject, PropertyDescriptor},
    parse::ParsedProgram,
    token::{Keyword, Punct, Token, TokenKind},
    value::{strict_equals, Completion, CompletionKind, Evaluated, JsString, JsValue, RefBase},
};

/// Whether an abrupt completion targeting `target` is addressed to a
/// construct carrying `labels` (no target addresses the nearest one).
fn matches_label(target: &Option<JsString>, labels: &[JsString]) -> bool {
    match target {
        None => true,
        Some(name) => labels.contains(name),
    }
}

impl Interp {
    /// Evaluates a parsed program in the already-entered global context.
    ///
    /// A `return` at the program top level is a SyntaxError (12.9); the scan
    /// is syntactic and happens before any statement runs.
    pub fn eval_program(&mut self, program: &Rc<ParsedProgram>) -> EvalResult<Completion> {
        let AstKind::Program(body) = &program.program.kind else {
            return Err(JsError::syntax_error("program did not parse"));
        };
        for stmt in &body.statements {
            if matches!(stmt.kind, AstKind::Return { .. }) {
                return Err(JsError::syntax_error("return outside of function"));
            }
        }
        self.eval_source_elements(program, body)
    }

    /// Folds statement completions: the last non-empty value is retained
    /// across normal completions, an abrupt completion short-circuits.
    pub(crate) fn eval_source_elements(
        &mut self,
        program: &Rc<ParsedProgram>,
        body: &ProgramBody,
    ) -> EvalResult<Completion> {
        let mut head = Completion::empty();
        for stmt in &body.statements {
            if head.is_abrupt() {
                break;
            }
            let tail = self.eval_statement(program, stmt)?;
            head = Completion::new(tail.kind, tail.value.or(head.value), tail.target);
        }
        Ok(head)
    }

    // ---- statements ----

    fn eval_statement(&mut self, program: &Rc<ParsedProgram>, ast: &Ast) -> EvalResult<Completion> {
        self.tracer.on_statement(ast.range);
        match &ast.kind {
            AstKind::Empty | AstKind::Debugger => Ok(Completion::empty()),
            AstKind::Block { stmts } => self.eval_statement_list(program, stmts),
            AstKind::VarStmt { decls } => {
                for decl in decls {
                    self.eval_var_decl(program, decl)?;
                }
                Ok(Completion::empty())
            }
            AstKind::If { cond, then, other } => {
                let test = self.eval_to_value(program, cond)?;
                if to_boolean(&test) {
                    self.eval_statement(program, then)
                } else if let Some(other) = other {
                    self.eval_statement(program, other)
                } else {
                    Ok(Completion::empty())
                }
            }
            AstKind::DoWhile { cond, body } => self.eval_do_while(program, cond, body, &[]),
            AstKind::While { cond, body } => self.eval_while(program, cond, body, &[]),
            AstKind::For { init, cond, step, body } => self.eval_for(program, init, cond.as_deref(), step.as_deref(), body, &[]),
            AstKind::ForIn { left, right, body } => self.eval_for_in(program, left, right, body, &[]),
            AstKind::Continue { label } => Ok(Completion::new(
                CompletionKind::Continue,
                None,
                label.map(|t| self.token_string(program, t)),
            )),
            AstKind::Break { label } => Ok(Completion::new(
                CompletionKind::Break,
                None,
                label.map(|t| self.token_string(program, t)),
            )),
            AstKind::Return { expr } => {
                let value = match expr {
                    Some(expr) => self.eval_to_value(program, expr)?,
                    None => JsValue::Undefined,
                };
                Ok(Completion::new(CompletionKind::Return, Some(value.into()), None))
            }
            AstKind::Throw { expr } => {
                let value = match expr {
                    Some(expr) => self.eval_to_value(program, expr)?,
                    None => JsValue::Undefined,
                };
                Ok(Completion::new(CompletionKind::Throw, Some(value.into()), None))
            }
            AstKind::With { object, body } => self.eval_with(program, object, body),
            AstKind::Switch { .. } => self.eval_switch(program, ast, &[]),
            AstKind::Try { block, catch, finally } => {
                self.eval_try(program, block, catch.as_ref(), finally.as_deref())
            }
            AstKind::Label { .. } => self.eval_labelled(program, ast),
            // everything else is an expression statement
            _ => {
                let result = self.eval_expression(program, ast)?;
                Ok(Completion::normal(result))
            }
        }
    }

    fn eval_statement_list(&mut self, program: &Rc<ParsedProgram>, stmts: &[Ast]) -> EvalResult<Completion> {
        let mut head = Completion::empty();
        for stmt in stmts {
            if head.is_abrupt() {
                break;
            }
            let tail = self.eval_statement(program, stmt)?;
            head = Completion::new(tail.kind, tail.value.or(head.value), tail.target);
        }
        Ok(head)
    }

    /// 12.2: resolve the name, then evaluate and assign the initializer.
    /// Returns the declared name (the for-in head reuses it).
    fn eval_var_decl(&mut self, program: &Rc<ParsedProgram>, decl: &Ast) -> EvalResult<JsString> {
        let AstKind::VarDecl { name, init } = &decl.kind else {
            return Err(JsError::syntax_error("malformed variable declaration"));
        };
        let name = self.token_string(program, *name);
        if let Some(init) = init {
            let target = self.resolve_identifier(&name);
            let value = self.eval_to_value(program, init)?;
            self.put_value(target.into(), value)?;
        }
        Ok(name)
    }

    fn eval_do_while(
        &mut self,
        program: &Rc<ParsedProgram>,
        cond: &Ast,
        body: &Ast,
        labels: &[JsString],
    ) -> EvalResult<Completion> {
        let mut value = None;
        loop {
            let completion = self.eval_statement(program, body)?;
            if completion.value.is_some() {
                value = completion.value.clone();
            }
            match completion.kind {
                CompletionKind::Normal => {}
                CompletionKind::Continue if matches_label(&completion.target, labels) => {}
                CompletionKind::Break if matches_label(&completion.target, labels) => break,
                _ => return Ok(Completion::new(completion.kind, value, completion.target)),
            }
            let test = self.eval_to_value(program, cond)?;
            if !to_boolean(&test) {
                break;
            }
        }
        Ok(Completion::new(CompletionKind::Normal, value, None))
    }

    fn eval_while(
        &mut self,
        program: &Rc<ParsedProgram>,
        cond: &Ast,
        body: &Ast,
        labels: &[JsString],
    ) -> EvalResult<Completion> {
        let mut value = None;
        loop {
            let test = self.eval_to_value(program, cond)?;
            if !to_boolean(&test) {
                break;
            }
            let completion = self.eval_statement(program, body)?;
            if completion.value.is_some() {
                value = completion.value.clone();
            }
            match completion.kind {
                CompletionKind::Normal => {}
                CompletionKind::Continue if matches_label(&completion.target, labels) => {}
                CompletionKind::Break if matches_label(&completion.target, labels) => break,
                _ => return Ok(Completion::new(completion.kind, value, completion.target)),
            }
        }
        Ok(Completion::new(CompletionKind::Normal, value, None))
    }

    fn eval_for(
        &mut self,
        program: &Rc<ParsedProgram>,
        init: &[Ast],
        cond: Option<&Ast>,
        step: Option<&Ast>,
        body: &Ast,
        labels: &[JsString],
    ) -> EvalResult<Completion> {
        for element in init {
            if matches!(element.kind, AstKind::VarDecl { .. }) {
                self.eval_var_decl(program, element)?;
            } else {
                self.eval_to_value(program, element)?;
            }
        }
        let mut value = None;
        loop {
            if let Some(cond) = cond {
                let test = self.eval_to_value(program, cond)?;
                if !to_boolean(&test) {
                    break;
                }
            }
            let completion = self.eval_statement(program, body)?;
            if completion.value.is_some() {
                value = completion.value.clone();
            }
            match completion.kind {
                CompletionKind::Normal => {}
                CompletionKind::Continue if matches_label(&completion.target, labels) => {}
                CompletionKind::Break if matches_label(&completion.target, labels) => break,
                _ => return Ok(Completion::new(completion.kind, value, completion.target)),
            }
            if let Some(step) = step {
                self.eval_to_value(program, step)?;
            }
        }
        Ok(Completion::new(CompletionKind::Normal, value, None))
    }

    fn eval_for_in(
        &mut self,
        program: &Rc<ParsedProgram>,
        left: &Ast,
        right: &Ast,
        body: &Ast,
        labels: &[JsString],
    ) -> EvalResult<Completion> {
        let subject = self.eval_to_value(program, right)?;
        let object = self.to_object(&subject)?;

        // `for (var x in o)`: the declaration (and any initializer) runs once
        let var_name = if matches!(left.kind, AstKind::VarDecl { .. }) {
            Some(self.eval_var_decl(program, left)?)
        } else {
            None
        };

        let keys = self.enumerate_keys(object);
        let mut value = None;
        for key in keys {
            // properties deleted during iteration are skipped
            if !self.heap.has_property(object, &key) {
                continue;
            }
            let target = match &var_name {
                Some(name) => Evaluated::Ref(self.resolve_identifier(name)),
                None => self.eval_expression(program, left)?,
            };
            self.put_value(target, JsValue::String(key))?;

            let completion = self.eval_statement(program, body)?;
            if completion.value.is_some() {
                value = completion.value.clone();
            }
            match completion.kind {
                CompletionKind::Normal => {}
                CompletionKind::Continue if matches_label(&completion.target, labels) => {}
                CompletionKind::Break if matches_label(&completion.target, labels) => {
                    return Ok(Completion::new(CompletionKind::Normal, value, None));
                }
                _ => return Ok(Completion::new(completion.kind, value, completion.target)),
            }
        }
        Ok(Completion::new(CompletionKind::Normal, value, None))
    }

    /// Enumerable property names: own first in insertion order, then up the
    /// prototype chain with shadowed names suppressed (a non-enumerable own
    /// property shadows an enumerable inherited one).
    fn enumerate_keys(&self, object: crate::heap::HeapId) -> Vec<JsString> {
        let mut seen = ahash::AHashSet::new();
        let mut keys = Vec::new();
        let mut current = Some(object);
        let mut hops = 0usize;
        while let Some(id) = current {
            let obj = self.heap.get(id);
            for (name, desc) in &obj.properties {
                if seen.insert(name.clone()) && desc.is_enumerable() {
                    keys.push(name.clone());
                }
            }
            current = obj.prototype;
            hops += 1;
            if hops > 100_000 {
                break;
            }
        }
        keys
    }

    fn eval_with(&mut self, program: &Rc<ParsedProgram>, object: &Ast, body: &Ast) -> EvalResult<Completion> {
        let subject = self.eval_to_value(program, object)?;
        let object_id = self.to_object(&subject)?;

        let old_lexical = self.context().lexical_env;
        let with_env = self.envs.new_object(object_id, true, Some(old_lexical));
        self.context_mut().lexical_env = with_env;
        let result = self.eval_statement(program, body);
        // always pop, also on abrupt exits and engine errors
        self.context_mut().lexical_env = old_lexical;
        result
    }

    fn eval_switch(&mut self, program: &Rc<ParsedProgram>, ast: &Ast, labels: &[JsString]) -> EvalResult<Completion> {
        let AstKind::Switch {
            expr,
            before_default,
            default_clause,
            after_default,
        } = &ast.kind
        else {
            return Err(JsError::syntax_error("malformed switch"));
        };
        let subject = self.eval_to_value(program, expr)?;

        // build the fall-through execution plan; case expressions evaluate
        // in textual order until the first strict-equal match
        let mut plan: Vec<&Vec<Ast>> = Vec::new();
        let mut matched = false;
        for (index, clause) in before_default.iter().enumerate() {
            let case_value = self.eval_to_value(program, &clause.expr)?;
            if strict_equals(&subject, &case_value) {
                for clause in &before_default[index..] {
                    plan.push(&clause.stmts);
                }
                if let Some(default_stmts) = default_clause {
                    plan.push(default_stmts);
                }
                for clause in after_default {
                    plan.push(&clause.stmts);
                }
                matched = true;
                break;
            }
        }
        if !matched {
            for (index, clause) in after_default.iter().enumerate() {
                let case_value = self.eval_to_value(program, &clause.expr)?;
                if strict_equals(&subject, &case_value) {
                    for clause in &after_default[index..] {
                        plan.push(&clause.stmts);
                    }
                    matched = true;
                    break;
                }
            }
        }
        if !matched {
            if let Some(default_stmts) = default_clause {
                plan.push(default_stmts);
                for clause in after_default {
                    plan.push(&clause.stmts);
                }
            }
        }

        let mut value = None;
        for stmts in plan {
            for stmt in stmts {
                let completion = self.eval_statement(program, stmt)?;
                if completion.value.is_some() {
                    value = completion.value.clone();
                }
                match completion.kind {
                    CompletionKind::Normal => {}
                    CompletionKind::Break if matches_label(&completion.target, labels) => {
                        return Ok(Completion::new(CompletionKind::Normal, value, None));
                    }
                    _ => return Ok(Completion::new(completion.kind, value, completion.target)),
                }
            }
        }
        Ok(Completion::new(CompletionKind::Normal, value, None))
    }

    fn eval_try(
        &mut self,
        program: &Rc<ParsedProgram>,
        block: &Ast,
        catch: Option<&CatchClause>,
        finally: Option<&Ast>,
    ) -> EvalResult<Completion> {
        let try_outcome = self.eval_statement(program, block);

        // catch recovers from both channels: language throws and pending
        // engine errors
        let intermediate: EvalResult<Completion> = match try_outcome {
            Ok(completion) if completion.kind == CompletionKind::Throw && catch.is_some() => {
                let thrown = match completion.value {
                    Some(value) => self.get_value(value)?,
                    None => JsValue::Undefined,
                };
                self.eval_catch(program, catch.expect("checked above"), thrown)
            }
            Err(error) if catch.is_some() => {
                let thrown = self.error_to_value(&error)?;
                self.eval_catch(program, catch.expect("checked above"), thrown)
            }
            other => other,
        };

        if let Some(finally) = finally {
            let finally_completion = self.eval_statement(program, finally)?;
            if finally_completion.is_abrupt() {
                // an abrupt finally replaces whatever preceded it
                return Ok(finally_completion);
            }
        }
        intermediate
    }

    /// The catch parameter lives in a fresh declarative environment pushed
    /// on the lexical chain only.
    fn eval_catch(&mut self, program: &Rc<ParsedProgram>, clause: &CatchClause, thrown: JsValue) -> EvalResult<Completion> {
        let name = self.token_string(program, clause.param);
        let old_lexical = self.context().lexical_env;
        let catch_env = self.envs.new_declarative(Some(old_lexical));
        self.envs.create_mutable_binding(catch_env, name.clone(), false);
        self.env_set_mutable_binding(catch_env, &name, thrown, false)?;

        self.context_mut().lexical_env = catch_env;
        let result = self.eval_statement(program, &clause.block);
        self.context_mut().lexical_env = old_lexical;
        result
    }

    fn eval_labelled(&mut self, program: &Rc<ParsedProgram>, ast: &Ast) -> EvalResult<Completion> {
        let mut labels = Vec::new();
        let mut current = ast;
        while let AstKind::Label { label, stmt } = &current.kind {
            labels.push(self.token_string(program, *label));
            current = stmt.as_ref();
        }

        let completion = match &current.kind {
            AstKind::DoWhile { cond, body } => self.eval_do_while(program, cond, body, &labels)?,
            AstKind::While { cond, body } => self.eval_while(program, cond, body, &labels)?,
            AstKind::For { init, cond, step, body } => {
                self.eval_for(program, init, cond.as_deref(), step.as_deref(), body, &labels)?
            }
            AstKind::ForIn { left, right, body } => self.eval_for_in(program, left, right, body, &labels)?,
            AstKind::Switch { .. } => self.eval_switch(program, current, &labels)?,
            _ => {
                let completion = self.eval_statement(program, current)?;
                // only a break naming one of these labels is absorbed here;
                // bare breaks keep looking for a loop or switch
                let addressed = completion
                    .target
                    .as_ref()
                    .is_some_and(|target| labels.contains(target));
                if completion.kind == CompletionKind::Break && addressed {
                    return Ok(Completion::new(CompletionKind::Normal, completion.value, None));
                }
                completion
            }
        };
        Ok(completion)
    }

    // ---- expressions ----

    pub(crate) fn eval_expression(&mut self, program: &Rc<ParsedProgram>, ast: &Ast) -> EvalResult<Evaluated> {
        match &ast.kind {
            AstKind::This => Ok(self.context().this_binding.clone().into()),
            AstKind::Ident => {
                let name = JsString::from_units(ast.source(&program.units).to_vec());
                Ok(self.resolve_identifier(&name).into())
            }
            AstKind::Null => Ok(JsValue::Null.into()),
            AstKind::Bool => Ok(JsValue::Bool(ast.text(&program.units) == "true").into()),
            AstKind::Number => Ok(JsValue::Number(decode_number_literal(ast.source(&program.units))).into()),
            AstKind::String => Ok(JsValue::String(decode_string_literal(ast.source(&program.units))).into()),
            AstKind::Regex => self.eval_regex_literal(program, ast),
            AstKind::Array { elements } => self.eval_array_literal(program, elements),
            AstKind::Object { properties } => self.eval_object_literal(program, properties),
            AstKind::Paren { expr } => self.eval_expression(program, expr),
            AstKind::Expr { elements } => {
                let mut last = JsValue::Undefined;
                for element in elements {
                    last = self.eval_to_value(program, element)?;
                }
                Ok(last.into())
            }
            AstKind::Func(id) => {
                let scope = self.context().lexical_env;
                let object = self.instantiate_function(program, *id, scope, false)?;
                Ok(JsValue::Object(object).into())
            }
            AstKind::Binary { lhs, rhs, op } => self.eval_binary(program, lhs, rhs, *op),
            AstKind::Unary { operand, op, prefix } => self.eval_unary(program, operand, *op, *prefix),
            AstKind::Triple { cond, then, other } => {
                let test = self.eval_to_value(program, cond)?;
                let branch = if to_boolean(&test) { then } else { other };
                Ok(self.eval_to_value(program, branch)?.into())
            }
            AstKind::Lhs {
                base,
                new_count,
                postfixes,
            } => self.eval_lhs(program, base, *new_count, postfixes),
            _ => Err(JsError::new(
                crate::error::ErrorKind::NativeError,
                "node is not an expression",
            )),
        }
    }

    /// Evaluates an expression and collapses the result through GetValue.
    pub(crate) fn eval_to_value(&mut self, program: &Rc<ParsedProgram>, ast: &Ast) -> EvalResult<JsValue> {
        let evaluated = self.eval_expression(program, ast)?;
        self.get_value(evaluated)
    }

    fn eval_regex_literal(&mut self, program: &Rc<ParsedProgram>, ast: &Ast) -> EvalResult<Evaluated> {
        let units = ast.source(&program.units);
        let close = units
            .iter()
            .rposition(|&c| c == u16::from(b'/'))
            .unwrap_or(units.len() - 1);
        let source = JsString::from_units(units[1..close].to_vec());
        let flags: Vec<u16> = units[close + 1..].to_vec();
        let has_flag = |c: u8| flags.contains(&u16::from(c));

        let mut object = JsObject::new("RegExp", Some(self.realm.regexp_proto));
        object.set_data_property(JsString::from_str("source"), JsValue::String(source), false, false, false);
        object.set_data_property(JsString::from_str("global"), JsValue::Bool(has_flag(b'g')), false, false, false);
        object.set_data_property(
            JsString::from_str("ignoreCase"),
            JsValue::Bool(has_flag(b'i')),
            false,
            false,
            false,
        );
        object.set_data_property(
            JsString::from_str("multiline"),
            JsValue::Bool(has_flag(b'm')),
            false,
            false,
            false,
        );
        object.set_data_property(JsString::from_str("lastIndex"), JsValue::Number(0.0), true, false, false);
        let id = self.heap.allocate(object)?;
        Ok(JsValue::Object(id).into())
    }

    fn eval_array_literal(&mut self, program: &Rc<ParsedProgram>, elements: &[Option<Ast>]) -> EvalResult<Evaluated> {
        let mut object = JsObject::new("Array", Some(self.realm.array_proto));
        object.set_data_property(
            JsString::from_str("length"),
            JsValue::Number(elements.len() as f64),
            true,
            false,
            false,
        );
        let id = self.heap.allocate(object)?;
        for (index, element) in elements.iter().enumerate() {
            if let Some(element) = element {
                let value = self.eval_to_value(program, element)?;
                self.heap
                    .get_mut(id)
                    .set_data_property(JsString::from_str(&index.to_string()), value, true, true, true);
            }
        }
        Ok(JsValue::Object(id).into())
    }

    fn eval_object_literal(&mut self, program: &Rc<ParsedProgram>, properties: &[ObjectProperty]) -> EvalResult<Evaluated> {
        let id = self.heap.allocate(JsObject::new("Object", Some(self.realm.object_proto)))?;
        for property in properties {
            let name = self.property_name(program, property.key);
            match property.kind {
                PropertyKind::Normal => {
                    let value = self.eval_to_value(program, &property.value)?;
                    let desc = PropertyDescriptor::data(value, true, true, true);
                    self.heap.define_own_property(id, &name, desc, false)?;
                }
                PropertyKind::Get | PropertyKind::Set => {
                    let AstKind::Func(func) = &property.value.kind else {
                        return Err(JsError::syntax_error("malformed accessor property"));
                    };
                    let scope = self.context().lexical_env;
                    let accessor = self.instantiate_function(program, *func, scope, false)?;
                    // partial descriptor: a getter merges with a previously
                    // defined setter and vice versa (last wins per kind)
                    let mut desc = PropertyDescriptor {
                        enumerable: Some(true),
                        configurable: Some(true),
                        ..PropertyDescriptor::default()
                    };
                    if property.kind == PropertyKind::Get {
                        desc.get = Some(JsValue::Object(accessor));
                    } else {
                        desc.set = Some(JsValue::Object(accessor));
                    }
                    self.heap.define_own_property(id, &name, desc, false)?;
                }
            }
        }
        Ok(JsValue::Object(id).into())
    }

    /// A PropertyName token: IdentifierName text, a decoded string literal,
    /// or a numeric literal rendered with ToString.
    fn property_name(&mut self, program: &Rc<ParsedProgram>, key: Token) -> JsString {
        match key.kind {
            TokenKind::String => decode_string_literal(key.source(&program.units)),
            TokenKind::Number => {
                let value = decode_number_literal(key.source(&program.units));
                JsString::from_str(&number_to_string(value))
            }
            _ => JsString::from_units(key.source(&program.units).to_vec()),
        }
    }

    pub(crate) fn token_string(&self, program: &Rc<ParsedProgram>, token: Token) -> JsString {
        JsString::from_units(token.source(&program.units).to_vec())
    }

    // ---- left-hand-side chains, calls, construction ----

    fn eval_lhs(
        &mut self,
        program: &Rc<ParsedProgram>,
        base: &Ast,
        new_count: usize,
        postfixes: &[Postfix],
    ) -> EvalResult<Evaluated> {
        let mut new_remaining = new_count;
        let mut current = self.eval_expression(program, base)?;

        for postfix in postfixes {
            match postfix {
                Postfix::Call(args_ast) => {
                    if new_remaining > 0 {
                        // the innermost `new` claims the first argument list
                        let callee = self.get_value(current)?;
                        let args = self.eval_args(program, args_ast)?;
                        new_remaining -= 1;
                        current = self.construct_value(&callee, &args)?.into();
                    } else {
                        let args = self.eval_args(program, args_ast)?;
                        current = self.eval_call_expression(current, &args)?.into();
                    }
                }
                Postfix::Index(index) => {
                    let base_value = self.get_value(current)?;
                    self.check_object_coercible(&base_value)?;
                    let key = self.eval_to_value(program, index)?;
                    let name = self.to_string(&key)?;
                    current = Evaluated::Ref(crate::value::Reference::new(
                        RefBase::Value(base_value),
                        name,
                        self.strict(),
                    ));
                }
                Postfix::Prop(token) => {
                    let base_value = self.get_value(current)?;
                    self.check_object_coercible(&base_value)?;
                    let name = self.token_string(program, *token);
                    current = Evaluated::Ref(crate::value::Reference::new(
                        RefBase::Value(base_value),
                        name,
                        self.strict(),
                    ));
                }
            }
        }

        // `new` prefixes without argument lists construct with no arguments,
        // innermost first
        while new_remaining > 0 {
            let callee = self.get_value(current)?;
            current = self.construct_value(&callee, &[])?.into();
            new_remaining -= 1;
        }
        Ok(current)
    }

    fn eval_args(&mut self, program: &Rc<ParsedProgram>, args_ast: &Ast) -> EvalResult<ArgList> {
        let AstKind::Args { args } = &args_ast.kind else {
            return Err(JsError::syntax_error("malformed argument list"));
        };
        let mut list = ArgList::new();
        for arg in args {
            let value = self.eval_to_value(program, arg)?;
            list.push(value);
        }
        Ok(list)
    }

    /// 11.2.3 function calls: the callee reference determines `this`.
    fn eval_call_expression(&mut self, callee: Evaluated, args: &[JsValue]) -> EvalResult<JsValue> {
        let func = self.get_value(callee.clone())?;
        let JsValue::Object(func_id) = func else {
            return Err(JsError::type_error("value is not a function"));
        };
        if !self.heap.get(func_id).is_callable() {
            return Err(JsError::type_error("value is not a function"));
        }

        let this = match &callee {
            Evaluated::Ref(reference) => match &reference.base {
                RefBase::Value(base) => base.clone(),
                RefBase::Env(env) => self.implicit_this_value(*env),
                RefBase::Unresolvable => JsValue::Undefined,
            },
            Evaluated::Value(_) => JsValue::Undefined,
        };
        self.call(func_id, this, args)
    }

    // ---- operators ----

    fn eval_binary(&mut self, program: &Rc<ParsedProgram>, lhs: &Ast, rhs: &Ast, op: Token) -> EvalResult<Evaluated> {
        match op.kind {
            TokenKind::Punct(Punct::Assign) => {
                let target = self.eval_expression(program, lhs)?;
                let value = self.eval_to_value(program, rhs)?;
                self.check_strict_assignment(&target)?;
                self.put_value(target, value.clone())?;
                Ok(value.into())
            }
            TokenKind::Punct(punct) if op.is_assignment_operator() => {
                let base_op = compound_base_op(punct);
                let target = self.eval_expression(program, lhs)?;
                let old = self.get_value(target.clone())?;
                let rhs_value = self.eval_to_value(program, rhs)?;
                let result = self.apply_binary_op(base_op, &old, &rhs_value)?;
                self.check_strict_assignment(&target)?;
                self.put_value(target, result.clone())?;
                Ok(result.into())
            }
            TokenKind::Punct(Punct::And) => {
                let left = self.eval_to_value(program, lhs)?;
                if !to_boolean(&left) {
                    return Ok(left.into());
                }
                Ok(self.eval_to_value(program, rhs)?.into())
            }
            TokenKind::Punct(Punct::Or) => {
                let left = self.eval_to_value(program, lhs)?;
                if to_boolean(&left) {
                    return Ok(left.into());
                }
                Ok(self.eval_to_value(program, rhs)?.into())
            }
            TokenKind::Keyword(Keyword::In) => {
                let left = self.eval_to_value(program, lhs)?;
                let right = self.eval_to_value(program, rhs)?;
                let JsValue::Object(id) = right else {
                    return Err(JsError::type_error("'in' requires an object"));
                };
                let name = self.to_string(&left)?;
                Ok(JsValue::Bool(self.heap.has_property(id, &name)).into())
            }
            TokenKind::Keyword(Keyword::Instanceof) => {
                let left = self.eval_to_value(program, lhs)?;
                let right = self.eval_to_value(program, rhs)?;
                Ok(JsValue::Bool(self.has_instance(&left, &right)?).into())
            }
            TokenKind::Punct(punct) => {
                let left = self.eval_to_value(program, lhs)?;
                let right = self.eval_to_value(program, rhs)?;
                Ok(self.apply_binary_op(punct, &left, &right)?.into())
            }
            _ => Err(JsError::syntax_error("unknown binary operator")),
        }
    }

    /// 15.3.5.3 `[[HasInstance]]`.
    fn has_instance(&mut self, value: &JsValue, constructor: &JsValue) -> EvalResult<bool> {
        let JsValue::Object(ctor) = constructor else {
            return Err(JsError::type_error("right-hand side of 'instanceof' is not callable"));
        };
        if !self.heap.get(*ctor).is_callable() {
            return Err(JsError::type_error("right-hand side of 'instanceof' is not callable"));
        }
        let JsValue::Object(instance) = value else {
            return Ok(false);
        };
        let mut current = *instance;
        let prototype = self.object_get(*ctor, &JsString::from_str("prototype"))?;
        let JsValue::Object(proto_id) = prototype else {
            return Err(JsError::type_error("constructor prototype is not an object"));
        };
        let mut hops = 0usize;
        loop {
            match self.heap.get(current).prototype {
                None => return Ok(false),
                Some(parent) if parent == proto_id => return Ok(true),
                Some(parent) => current = parent,
            }
            hops += 1;
            if hops > 100_000 {
                return Ok(false);
            }
        }
    }

    fn apply_binary_op(&mut self, op: Punct, left: &JsValue, right: &JsValue) -> EvalResult<JsValue> {
        match op {
            Punct::Add => {
                let lp = self.to_primitive(left, None)?;
                let rp = self.to_primitive(right, None)?;
                if matches!(lp, JsValue::String(_)) || matches!(rp, JsValue::String(_)) {
                    let ls = self.to_string(&lp)?;
                    let rs = self.to_string(&rp)?;
                    Ok(JsValue::String(ls.concat(&rs)))
                } else {
                    let ln = self.to_number(&lp)?;
                    let rn = self.to_number(&rp)?;
                    Ok(JsValue::Number(ln + rn))
                }
            }
            Punct::Sub => self.numeric_op(left, right, |a, b| a - b),
            Punct::Mul => self.numeric_op(left, right, |a, b| a * b),
            Punct::Div => self.numeric_op(left, right, |a, b| a / b),
            Punct::Mod => self.numeric_op(left, right, |a, b| a % b),
            Punct::Shl => {
                let l = self.to_int32(left)?;
                let shift = self.to_uint32(right)? & 0x1F;
                Ok(JsValue::Number(f64::from(l.wrapping_shl(shift))))
            }
            Punct::Shr => {
                let l = self.to_int32(left)?;
                let shift = self.to_uint32(right)? & 0x1F;
                Ok(JsValue::Number(f64::from(l.wrapping_shr(shift))))
            }
            Punct::UShr => {
                let l = self.to_uint32(left)?;
                let shift = self.to_uint32(right)? & 0x1F;
                Ok(JsValue::Number(f64::from(l.wrapping_shr(shift))))
            }
            Punct::BitAnd => self.int32_op(left, right, |a, b| a & b),
            Punct::BitOr => self.int32_op(left, right, |a, b| a | b),
            Punct::BitXor => self.int32_op(left, right, |a, b| a ^ b),
            Punct::Lt => {
                let result = self.abstract_relational(left, right, true)?;
                Ok(JsValue::Bool(result.unwrap_or(false)))
            }
            Punct::Gt => {
                let result = self.abstract_relational(right, left, false)?;
                Ok(JsValue::Bool(result.unwrap_or(false)))
            }
            Punct::Le => {
                let result = self.abstract_relational(right, left, false)?;
                Ok(JsValue::Bool(result == Some(false)))
            }
            Punct::Ge => {
                let result = self.abstract_relational(left, right, true)?;
                Ok(JsValue::Bool(result == Some(false)))
            }
            Punct::Eq => Ok(JsValue::Bool(self.abstract_equals(left, right)?)),
            Punct::Ne => Ok(JsValue::Bool(!self.abstract_equals(left, right)?)),
            Punct::StrictEq => Ok(JsValue::Bool(strict_equals(left, right))),
            Punct::StrictNe => Ok(JsValue::Bool(!strict_equals(left, right))),
            _ => Err(JsError::syntax_error("unknown binary operator")),
        }
    }

    fn numeric_op(&mut self, left: &JsValue, right: &JsValue, op: fn(f64, f64) -> f64) -> EvalResult<JsValue> {
        let l = self.to_number(left)?;
        let r = self.to_number(right)?;
        Ok(JsValue::Number(op(l, r)))
    }

    fn int32_op(&mut self, left: &JsValue, right: &JsValue, op: fn(i32, i32) -> i32) -> EvalResult<JsValue> {
        let l = self.to_int32(left)?;
        let r = self.to_int32(right)?;
        Ok(JsValue::Number(f64::from(op(l, r))))
    }

    fn eval_unary(&mut self, program: &Rc<ParsedProgram>, operand: &Ast, op: Token, prefix: bool) -> EvalResult<Evaluated> {
        if !prefix {
            // postfix ++/--: the old value is the result
            let target = self.eval_expression(program, operand)?;
            let old = self.get_value(target.clone())?;
            let old = self.to_number(&old)?;
            let delta = if op.is_punct(Punct::Inc) { 1.0 } else { -1.0 };
            self.put_value(target, JsValue::Number(old + delta))?;
            return Ok(JsValue::Number(old).into());
        }

        match op.kind {
            TokenKind::Punct(Punct::Inc | Punct::Dec) => {
                let target = self.eval_expression(program, operand)?;
                let old = self.get_value(target.clone())?;
                let old = self.to_number(&old)?;
                let delta = if op.is_punct(Punct::Inc) { 1.0 } else { -1.0 };
                let new = JsValue::Number(old + delta);
                self.put_value(target, new.clone())?;
                Ok(new.into())
            }
            TokenKind::Punct(Punct::Add) => {
                let value = self.eval_to_value(program, operand)?;
                Ok(JsValue::Number(self.to_number(&value)?).into())
            }
            TokenKind::Punct(Punct::Sub) => {
                let value = self.eval_to_value(program, operand)?;
                Ok(JsValue::Number(-self.to_number(&value)?).into())
            }
            TokenKind::Punct(Punct::Not) => {
                let value = self.eval_to_value(program, operand)?;
                Ok(JsValue::Bool(!to_boolean(&value)).into())
            }
            TokenKind::Punct(Punct::BitNot) => {
                let value = self.eval_to_value(program, operand)?;
                Ok(JsValue::Number(f64::from(!self.to_int32(&value)?)).into())
            }
            TokenKind::Keyword(Keyword::Void) => {
                self.eval_to_value(program, operand)?;
                Ok(JsValue::Undefined.into())
            }
            TokenKind::Keyword(Keyword::Typeof) => {
                let evaluated = self.eval_expression(program, operand)?;
                // typeof tolerates unresolvable references
                if let Evaluated::Ref(reference) = &evaluated {
                    if reference.is_unresolvable() {
                        return Ok(JsValue::String(JsString::from_str("undefined")).into());
                    }
                }
                let value = self.get_value(evaluated)?;
                let name = match &value {
                    JsValue::Undefined => "undefined",
                    JsValue::Null => "object",
                    JsValue::Bool(_) => "boolean",
                    JsValue::Number(_) => "number",
                    JsValue::String(_) => "string",
                    JsValue::Object(id) => {
                        if self.heap.get(*id).is_callable() {
                            "function"
                        } else {
                            "object"
                        }
                    }
                };
                Ok(JsValue::String(JsString::from_str(name)).into())
            }
            TokenKind::Keyword(Keyword::Delete) => {
                let evaluated = self.eval_expression(program, operand)?;
                let Evaluated::Ref(reference) = evaluated else {
                    return Ok(JsValue::Bool(true).into());
                };
                match reference.base {
                    RefBase::Unresolvable => {
                        if reference.strict {
                            Err(JsError::syntax_error("cannot delete an unqualified identifier in strict mode"))
                        } else {
                            Ok(JsValue::Bool(true).into())
                        }
                    }
                    RefBase::Value(base) => {
                        let id = self.to_object(&base)?;
                        let deleted = self.heap.delete_property(id, &reference.name, reference.strict)?;
                        Ok(JsValue::Bool(deleted).into())
                    }
                    RefBase::Env(env) => {
                        if reference.strict {
                            Err(JsError::syntax_error("cannot delete an unqualified identifier in strict mode"))
                        } else {
                            let deleted = self.env_delete_binding(env, &reference.name)?;
                            Ok(JsValue::Bool(deleted).into())
                        }
                    }
                }
            }
            _ => Err(JsError::syntax_error("unknown unary operator")),
        }
    }

    /// 11.13.1: in strict mode, `eval` and `arguments` may not be assignment
    /// targets when they resolve to an environment record.
    fn check_strict_assignment(&self, target: &Evaluated) -> EvalResult<()> {
        if let Evaluated::Ref(reference) = target {
            if reference.strict && matches!(reference.base, RefBase::Env(_)) {
                let name = reference.name.to_string();
                if name == "eval" || name == "arguments" {
                    return Err(JsError::syntax_error(format!("cannot assign to '{name}' in strict mode")));
                }
            }
        }
        Ok(())
    }
}

/// Maps a compound-assignment punctuator to its underlying operator.
fn compound_base_op(punct: Punct) -> Punct {
    match punct {
        Punct::AddAssign => Punct::Add,
        Punct::SubAssign => Punct::Sub,
        Punct::MulAssign => Punct::Mul,
        Punct::DivAssign => Punct::Div,
        Punct::ModAssign => Punct::Mod,
        Punct::ShlAssign => Punct::Shl,
        Punct::ShrAssign => Punct::Shr,
        Punct::UShrAssign => Punct::UShr,
        Punct::BitAndAssign => Punct::BitAnd,
        Punct::BitOrAssign => Punct::BitOr,
        Punct::BitXorAssign => Punct::BitXor,
        other => other,
    }
}
