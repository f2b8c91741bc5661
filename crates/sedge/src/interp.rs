//! The interpreter core: heap, scopes, context stack, reference resolution,
//! function invocation and declaration binding instantiation.
//!
//! Statement and expression evaluation live in `eval.rs`, the abstract
//! conversions in `convert.rs`; both are further `impl Interp` blocks.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::{
    ast::{Ast, AstKind, FuncDef, FuncId, ProgramBody},
    builtins::{create_realm, Realm},
    context::ExecutionContext,
    environment::{EnvId, EnvRecord, Environments, GLOBAL_ENV},
    error::{ErrorKind, EvalResult, JsError},
    heap::{Heap, HeapId, HeapStats},
    object::{ArgumentsMap, Callable, JsObject, PropertyDescriptor, ScriptFunction},
    parse::ParsedProgram,
    resource::ResourceLimits,
    tracer::{NoopTracer, Tracer},
    value::{Completion, CompletionKind, Evaluated, JsString, JsValue, RefBase, Reference},
};

/// Canonical array index encoded by `name`, if any (no leading zeros except
/// `"0"` itself).
pub(crate) fn array_index(name: &JsString) -> Option<u32> {
    let units = name.units();
    if units.is_empty() || units.len() > 10 {
        return None;
    }
    if units[0] == u16::from(b'0') && units.len() > 1 {
        return None;
    }
    let mut value: u64 = 0;
    for &unit in units {
        if !(0x0030..=0x0039).contains(&unit) {
            return None;
        }
        value = value * 10 + u64::from(unit - 0x0030);
    }
    u32::try_from(value).ok()
}

/// The tree-walking interpreter.
///
/// Owns the object heap, the environment arena, the execution-context stack
/// and the realm of built-in objects. Strictly single-threaded and
/// synchronous: evaluation is a depth-first walk driven by the host stack.
pub struct Interp {
    pub(crate) heap: Heap,
    pub(crate) envs: Environments,
    pub(crate) contexts: Vec<ExecutionContext>,
    pub(crate) realm: Realm,
    pub(crate) limits: ResourceLimits,
    pub(crate) tracer: Box<dyn Tracer>,
}

impl Interp {
    pub fn new() -> Self {
        Self::with_limits(ResourceLimits::default(), Box::new(NoopTracer))
    }

    pub fn with_limits(limits: ResourceLimits, tracer: Box<dyn Tracer>) -> Self {
        // bootstrap unlimited; the ceiling bounds program allocations
        let mut heap = Heap::new(None);
        let realm = create_realm(&mut heap);
        heap.set_max_objects(limits.max_heap_objects.map(|max| max + heap.len()));
        let envs = Environments::new(realm.global);
        Self {
            heap,
            envs,
            contexts: Vec::new(),
            realm,
            limits,
            tracer,
        }
    }

    pub fn global_object(&self) -> HeapId {
        self.realm.global
    }

    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    pub(crate) fn context(&self) -> &ExecutionContext {
        self.contexts.last().expect("no active execution context")
    }

    pub(crate) fn context_mut(&mut self) -> &mut ExecutionContext {
        self.contexts.last_mut().expect("no active execution context")
    }

    pub(crate) fn strict(&self) -> bool {
        self.contexts.last().is_some_and(|c| c.strict)
    }

    /// 10.4.1 entering global code: pushes the global context and performs
    /// declaration binding instantiation for the program.
    pub fn enter_global_code(&mut self, program: &Rc<ParsedProgram>) -> EvalResult<()> {
        let AstKind::Program(body) = &program.program.kind else {
            return Err(JsError::syntax_error("program did not parse"));
        };
        self.contexts.push(ExecutionContext::new(
            GLOBAL_ENV,
            JsValue::Object(self.realm.global),
            body.strict,
        ));
        self.declaration_binding_instantiation(program, body, None, GLOBAL_ENV, body.strict)
    }

    // ---- identifier resolution (10.2.2.1) ----

    /// Walks the environment chain outward from `env` until a record claims
    /// the binding; the result is an environment-record reference, or an
    /// unresolvable one when the chain is exhausted.
    pub(crate) fn get_identifier_reference(&self, env: Option<EnvId>, name: &JsString, strict: bool) -> Reference {
        let mut current = env;
        while let Some(id) = current {
            if self.env_has_binding(id, name) {
                return Reference::new(RefBase::Env(id), name.clone(), strict);
            }
            current = self.envs.get(id).outer;
        }
        Reference::new(RefBase::Unresolvable, name.clone(), strict)
    }

    pub(crate) fn resolve_identifier(&self, name: &JsString) -> Reference {
        let lexical = self.context().lexical_env;
        self.get_identifier_reference(Some(lexical), name, self.strict())
    }

    // ---- environment record operations ----

    pub(crate) fn env_has_binding(&self, env: EnvId, name: &JsString) -> bool {
        match &self.envs.get(env).record {
            EnvRecord::Declarative { bindings } => bindings.contains_key(name),
            EnvRecord::Object { object, .. } => self.heap.has_property(*object, name),
        }
    }

    pub(crate) fn env_create_mutable_binding(&mut self, env: EnvId, name: JsString, deletable: bool) -> EvalResult<()> {
        match &self.envs.get(env).record {
            EnvRecord::Declarative { .. } => {
                self.envs.create_mutable_binding(env, name, deletable);
                Ok(())
            }
            EnvRecord::Object { object, .. } => {
                let object = *object;
                self.heap
                    .define_own_property(
                        object,
                        &name,
                        PropertyDescriptor::data(JsValue::Undefined, true, true, deletable),
                        true,
                    )
                    .map(|_| ())
            }
        }
    }

    pub(crate) fn env_set_mutable_binding(
        &mut self,
        env: EnvId,
        name: &JsString,
        value: JsValue,
        strict: bool,
    ) -> EvalResult<()> {
        match &mut self.envs.get_mut(env).record {
            EnvRecord::Declarative { bindings } => match bindings.get_mut(name) {
                Some(binding) if binding.mutable => {
                    binding.value = value;
                    Ok(())
                }
                Some(_) => {
                    if strict {
                        Err(JsError::type_error(format!("assignment to constant '{name}'")))
                    } else {
                        Ok(())
                    }
                }
                None => {
                    bindings.insert(
                        name.clone(),
                        crate::environment::Binding {
                            value,
                            mutable: true,
                            deletable: true,
                            initialized: true,
                        },
                    );
                    Ok(())
                }
            },
            EnvRecord::Object { object, .. } => {
                let object = *object;
                self.object_put(object, name, value, strict)
            }
        }
    }

    pub(crate) fn env_get_binding_value(&mut self, env: EnvId, name: &JsString, strict: bool) -> EvalResult<JsValue> {
        match &self.envs.get(env).record {
            EnvRecord::Declarative { bindings } => match bindings.get(name) {
                Some(binding) if binding.initialized => Ok(binding.value.clone()),
                Some(_) => Err(JsError::reference_error(format!("'{name}' is not initialized"))),
                None => Err(JsError::reference_error(format!("{name} is not defined"))),
            },
            EnvRecord::Object { object, .. } => {
                let object = *object;
                if self.heap.has_property(object, name) {
                    self.object_get_with_this(object, name, &JsValue::Object(object))
                } else if strict {
                    Err(JsError::reference_error(format!("{name} is not defined")))
                } else {
                    Ok(JsValue::Undefined)
                }
            }
        }
    }

    pub(crate) fn env_delete_binding(&mut self, env: EnvId, name: &JsString) -> EvalResult<bool> {
        match &mut self.envs.get_mut(env).record {
            EnvRecord::Declarative { bindings } => match bindings.get(name) {
                Some(binding) if binding.deletable => {
                    bindings.remove(name);
                    Ok(true)
                }
                Some(_) => Ok(false),
                None => Ok(true),
            },
            EnvRecord::Object { object, .. } => {
                let object = *object;
                self.heap.delete_property(object, name, false)
            }
        }
    }

    /// 10.2.1.2.6 ImplicitThisValue: the bound object of an object record
    /// created with `provide_this` (i.e. by `with`), otherwise undefined.
    pub(crate) fn implicit_this_value(&self, env: EnvId) -> JsValue {
        match &self.envs.get(env).record {
            EnvRecord::Object {
                object,
                provide_this: true,
            } => JsValue::Object(*object),
            _ => JsValue::Undefined,
        }
    }

    // ---- GetValue / PutValue (8.7.1, 8.7.2) ----

    pub fn get_value(&mut self, evaluated: Evaluated) -> EvalResult<JsValue> {
        match evaluated {
            Evaluated::Value(value) => Ok(value),
            Evaluated::Ref(reference) => match reference.base {
                RefBase::Unresolvable => Err(JsError::reference_error(format!(
                    "{} is not defined",
                    reference.name
                ))),
                RefBase::Value(JsValue::Object(id)) => {
                    self.object_get_with_this(id, &reference.name, &JsValue::Object(id))
                }
                RefBase::Value(base) => {
                    // primitive base: box it, but the getter's `this` stays
                    // the primitive
                    let boxed = self.to_object(&base)?;
                    self.object_get_with_this(boxed, &reference.name, &base)
                }
                RefBase::Env(env) => {
                    let strict = reference.strict;
                    self.env_get_binding_value(env, &reference.name, strict)
                }
            },
        }
    }

    pub fn put_value(&mut self, evaluated: Evaluated, value: JsValue) -> EvalResult<()> {
        match evaluated {
            Evaluated::Value(_) => Err(JsError::reference_error("invalid assignment target")),
            Evaluated::Ref(reference) => match reference.base {
                RefBase::Unresolvable => {
                    if reference.strict {
                        Err(JsError::reference_error(format!(
                            "{} is not defined",
                            reference.name
                        )))
                    } else {
                        // implicit global
                        let global = self.realm.global;
                        self.object_put(global, &reference.name, value, false)
                    }
                }
                RefBase::Value(JsValue::Object(id)) => self.object_put(id, &reference.name, value, reference.strict),
                RefBase::Value(base) => {
                    // writes through a boxed primitive are observable only via
                    // accessor properties; data writes evaporate with the box
                    let boxed = self.to_object(&base)?;
                    self.object_put(boxed, &reference.name, value, reference.strict)
                }
                RefBase::Env(env) => {
                    let strict = reference.strict;
                    self.env_set_mutable_binding(env, &reference.name, value, strict)
                }
            },
        }
    }

    // ---- object internal methods that can run code ----

    fn arguments_mapped_binding(&self, id: HeapId, name: &JsString) -> Option<(EnvId, JsString)> {
        let object = self.heap.get(id);
        let map = object.arguments_map.as_ref()?;
        let index = array_index(name)? as usize;
        let param = map.names.get(index)?.clone()?;
        Some((map.env, param))
    }

    /// 8.12.3 `[[Get]]`, with `this` supplied by the reference base so
    /// accessors see the receiver even through boxed primitives.
    pub(crate) fn object_get_with_this(&mut self, id: HeapId, name: &JsString, this: &JsValue) -> EvalResult<JsValue> {
        // arguments objects alias their formals in non-strict mode
        if let Some((env, param)) = self.arguments_mapped_binding(id, name) {
            return self.env_get_binding_value(env, &param, false);
        }
        // string wrappers expose their code units as index properties
        if let Some(value) = self.string_wrapper_index(id, name) {
            return Ok(value);
        }
        match self.heap.get_property(id, name) {
            None => Ok(JsValue::Undefined),
            Some(desc) if desc.is_accessor_descriptor() => match desc.get {
                Some(JsValue::Object(getter)) => self.call(getter, this.clone(), &[]),
                _ => Ok(JsValue::Undefined),
            },
            Some(desc) => Ok(desc.value.unwrap_or(JsValue::Undefined)),
        }
    }

    pub(crate) fn object_get(&mut self, id: HeapId, name: &JsString) -> EvalResult<JsValue> {
        self.object_get_with_this(id, name, &JsValue::Object(id))
    }

    fn string_wrapper_index(&self, id: HeapId, name: &JsString) -> Option<JsValue> {
        let object = self.heap.get(id);
        if object.class != "String" {
            return None;
        }
        let Some(JsValue::String(s)) = &object.primitive_value else {
            return None;
        };
        let index = array_index(name)? as usize;
        let unit = s.units().get(index)?;
        Some(JsValue::String(JsString::from_units(vec![*unit])))
    }

    /// 8.12.5 `[[Put]]`, including the array length exotics.
    pub(crate) fn object_put(&mut self, id: HeapId, name: &JsString, value: JsValue, throw: bool) -> EvalResult<()> {
        if let Some((env, param)) = self.arguments_mapped_binding(id, name) {
            return self.env_set_mutable_binding(env, &param, value, false);
        }

        let reject = |throw: bool, name: &JsString| -> EvalResult<()> {
            if throw {
                Err(JsError::type_error(format!("cannot assign to read only property '{name}'")))
            } else {
                Ok(())
            }
        };

        // array length assignment truncates
        if self.heap.get(id).class == "Array" && *name == JsString::from_str("length") {
            let new_len = self.to_uint32(&value)?;
            let len_check = self.to_number(&value)?;
            if f64::from(new_len) != len_check {
                return Err(JsError::range_error("invalid array length"));
            }
            self.set_array_length(id, new_len);
            return Ok(());
        }

        let own = self.heap.get(id).get_own_property(name).cloned();
        match own {
            Some(desc) if desc.is_accessor_descriptor() => {
                return match desc.set {
                    Some(JsValue::Object(setter)) => {
                        self.call(setter, JsValue::Object(id), &[value])?;
                        Ok(())
                    }
                    _ => reject(throw, name),
                };
            }
            Some(desc) => {
                if !desc.is_writable() {
                    return reject(throw, name);
                }
                let object = self.heap.get_mut(id);
                if let Some(current) = object.properties.get_mut(name) {
                    current.value = Some(value);
                }
                return Ok(());
            }
            None => {}
        }

        // not an own property: consult the prototype chain
        match self.heap.get_property(id, name) {
            Some(desc) if desc.is_accessor_descriptor() => match desc.set {
                Some(JsValue::Object(setter)) => {
                    self.call(setter, JsValue::Object(id), &[value])?;
                    Ok(())
                }
                _ => reject(throw, name),
            },
            Some(desc) if !desc.is_writable() => reject(throw, name),
            _ => {
                if !self.heap.get(id).extensible {
                    return reject(throw, name);
                }
                self.heap.get_mut(id).set_data_property(name.clone(), value, true, true, true);
                self.array_maybe_grow_length(id, name);
                Ok(())
            }
        }
    }

    fn array_maybe_grow_length(&mut self, id: HeapId, name: &JsString) {
        if self.heap.get(id).class != "Array" {
            return;
        }
        let Some(index) = array_index(name) else { return };
        let length_key = JsString::from_str("length");
        let current = self
            .heap
            .get(id)
            .get_own_property(&length_key)
            .and_then(|d| d.value.clone());
        let current_len = match current {
            Some(JsValue::Number(n)) => n as u32,
            _ => 0,
        };
        if index >= current_len {
            if let Some(desc) = self.heap.get_mut(id).properties.get_mut(&length_key) {
                desc.value = Some(JsValue::Number(f64::from(index) + 1.0));
            }
        }
    }

    fn set_array_length(&mut self, id: HeapId, new_len: u32) {
        let length_key = JsString::from_str("length");
        let object = self.heap.get_mut(id);
        let doomed: Vec<JsString> = object
            .properties
            .keys()
            .filter(|key| array_index(key).is_some_and(|index| index >= new_len))
            .cloned()
            .collect();
        for key in doomed {
            object.properties.shift_remove(&key);
        }
        if let Some(desc) = object.properties.get_mut(&length_key) {
            desc.value = Some(JsValue::Number(f64::from(new_len)));
        }
    }

    // ---- calls (11.2.3, 13.2.1) ----

    /// Invokes a callable object with an explicit `this` and argument list.
    pub fn call(&mut self, func: HeapId, this: JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
        let Some(callable) = self.heap.get(func).callable.clone() else {
            return Err(JsError::type_error("value is not a function"));
        };
        match callable {
            Callable::Native(native) => {
                self.tracer.on_call(native.name);
                (native.func)(self, &this, args)
            }
            Callable::Script(script) => self.call_script(func, &script, this, args),
        }
    }

    fn call_script(
        &mut self,
        callee_id: HeapId,
        script: &ScriptFunction,
        this: JsValue,
        args: &[JsValue],
    ) -> EvalResult<JsValue> {
        self.limits.check_recursion_depth(self.contexts.len())?;

        let program = script.program.clone();
        let def = program.func(script.func);
        let name = def.name.map(|t| t.text(&program.units)).unwrap_or_default();
        self.tracer.on_call(&name);

        let AstKind::FuncBody(body) = &def.body.kind else {
            unreachable!("function body is always FuncBody");
        };

        // 10.4.3 this coercion: strict code takes `this` as passed
        let this_binding = if script.strict {
            this
        } else {
            match this {
                JsValue::Undefined | JsValue::Null => JsValue::Object(self.realm.global),
                value @ JsValue::Object(_) => value,
                primitive => {
                    let boxed = self.to_object(&primitive)?;
                    JsValue::Object(boxed)
                }
            }
        };

        let local = self.envs.new_declarative(Some(script.scope));
        self.contexts
            .push(ExecutionContext::new(local, this_binding, script.strict));

        let outcome = self
            .declaration_binding_instantiation(
                &program,
                body,
                Some(FrameArgs { def, args, callee_id }),
                local,
                script.strict,
            )
            .and_then(|()| self.eval_source_elements(&program, body));
        self.contexts.pop();

        let completion = outcome?;
        match completion.kind {
            CompletionKind::Return => {
                let value = completion.value.unwrap_or(Evaluated::undefined());
                self.get_value(value)
            }
            CompletionKind::Normal => Ok(JsValue::Undefined),
            CompletionKind::Throw => {
                let thrown = match completion.value {
                    Some(value) => self.get_value(value)?,
                    None => JsValue::Undefined,
                };
                Err(self.error_from_thrown(thrown))
            }
            CompletionKind::Break | CompletionKind::Continue => {
                Err(JsError::syntax_error("illegal break or continue"))
            }
        }
    }

    /// Wraps a language-level thrown value into the engine error channel so
    /// it propagates out of expression evaluation; `try` unwraps it again.
    pub(crate) fn error_from_thrown(&mut self, thrown: JsValue) -> JsError {
        let kind = self.classify_thrown(&thrown);
        JsError {
            kind,
            message: None,
            value: Some(thrown),
        }
    }

    /// Best-effort kind classification of a thrown value, for host-visible
    /// exception reporting. The `name` property usually lives on the error
    /// prototype, so this walks the chain.
    pub(crate) fn classify_thrown(&self, thrown: &JsValue) -> ErrorKind {
        if let JsValue::Object(id) = thrown {
            if self.heap.get(*id).class == "Error" {
                if let Some(desc) = self.heap.get_property(*id, &JsString::from_str("name")) {
                    if let Some(JsValue::String(name)) = &desc.value {
                        if let Ok(kind) = name.to_string().parse::<ErrorKind>() {
                            return kind;
                        }
                    }
                }
                return ErrorKind::Error;
            }
        }
        ErrorKind::Error
    }

    /// Materializes the language-level value of a pending engine error, for
    /// binding in a catch clause.
    pub(crate) fn error_to_value(&mut self, error: &JsError) -> EvalResult<JsValue> {
        if let Some(value) = &error.value {
            return Ok(value.clone());
        }
        let message = error.message.clone().unwrap_or_default();
        let object = self.create_error_object(error.kind, &message)?;
        Ok(JsValue::Object(object))
    }

    /// 13.2.2 `[[Construct]]`.
    pub fn construct(&mut self, func: HeapId, args: &[JsValue]) -> EvalResult<JsValue> {
        let object = self.heap.get(func);
        if !object.constructable {
            return Err(JsError::type_error("value is not a constructor"));
        }
        if let Some(Callable::Native(native)) = &object.callable {
            if let Some(ctor) = native.construct {
                return ctor(self, &JsValue::Undefined, args);
            }
            return Err(JsError::type_error("value is not a constructor"));
        }

        let proto = self.object_get(func, &JsString::from_str("prototype"))?;
        let proto_id = proto.object_id().unwrap_or(self.realm.object_proto);
        let new_object = self.heap.allocate(JsObject::new("Object", Some(proto_id)))?;

        let result = self.call(func, JsValue::Object(new_object), args)?;
        if result.is_object() {
            Ok(result)
        } else {
            Ok(JsValue::Object(new_object))
        }
    }

    pub(crate) fn construct_value(&mut self, func: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
        match func {
            JsValue::Object(id) => self.construct(*id, args),
            _ => Err(JsError::type_error("value is not a constructor")),
        }
    }

    // ---- function objects (13.2) ----

    /// Creates a function object for `func` with `[[Scope]]` = `scope`.
    /// The function is strict if its body carries a directive or the
    /// creating context was strict.
    pub(crate) fn create_function_object(
        &mut self,
        program: &Rc<ParsedProgram>,
        func: FuncId,
        scope: EnvId,
        context_strict: bool,
    ) -> EvalResult<HeapId> {
        let def = program.func(func);
        let AstKind::FuncBody(body) = &def.body.kind else {
            unreachable!("function body is always FuncBody");
        };
        let strict = body.strict || context_strict;

        let mut object = JsObject::new("Function", Some(self.realm.function_proto));
        object.callable = Some(Callable::Script(ScriptFunction {
            program: program.clone(),
            func,
            scope,
            strict,
        }));
        object.constructable = true;
        object.set_data_property(
            JsString::from_str("length"),
            JsValue::Number(def.params.len() as f64),
            false,
            false,
            false,
        );
        let func_id = self.heap.allocate(object)?;

        let mut proto = JsObject::new("Object", Some(self.realm.object_proto));
        proto.set_data_property(JsString::from_str("constructor"), JsValue::Object(func_id), true, false, true);
        let proto_id = self.heap.allocate(proto)?;
        self.heap.get_mut(func_id).set_data_property(
            JsString::from_str("prototype"),
            JsValue::Object(proto_id),
            true,
            false,
            false,
        );
        Ok(func_id)
    }

    /// Evaluates a function expression or declaration to a function object.
    /// Named function expressions get a dedicated scope with an immutable
    /// self-binding so they can recurse.
    pub(crate) fn instantiate_function(
        &mut self,
        program: &Rc<ParsedProgram>,
        func: FuncId,
        scope: EnvId,
        as_declaration: bool,
    ) -> EvalResult<HeapId> {
        let strict = self.strict();
        let def = program.func(func);
        match def.name {
            Some(name_token) if !as_declaration => {
                let name = JsString::from_units(name_token.source(&program.units).to_vec());
                let func_env = self.envs.new_declarative(Some(scope));
                let object = self.create_function_object(program, func, func_env, strict)?;
                self.envs.create_immutable_binding(func_env, name, JsValue::Object(object));
                Ok(object)
            }
            _ => self.create_function_object(program, func, scope, strict),
        }
    }

    // ---- declaration binding instantiation (10.5) ----

    pub(crate) fn declaration_binding_instantiation(
        &mut self,
        program: &Rc<ParsedProgram>,
        body: &ProgramBody,
        frame: Option<FrameArgs<'_>>,
        env: EnvId,
        strict: bool,
    ) -> EvalResult<()> {
        // 1. formal parameters, left to right
        if let Some(frame) = &frame {
            for (index, param) in frame.def.params.iter().enumerate() {
                let name = JsString::from_units(param.source(&program.units).to_vec());
                if !self.env_has_binding(env, &name) {
                    self.env_create_mutable_binding(env, name.clone(), false)?;
                }
                let value = frame.args.get(index).cloned().unwrap_or(JsValue::Undefined);
                self.env_set_mutable_binding(env, &name, value, strict)?;
            }
        }

        // 2. function declarations, in source order
        for &func in &body.func_decls {
            let def = program.func(func);
            let Some(name_token) = def.name else {
                return Err(JsError::syntax_error("function declaration requires a name"));
            };
            let name = JsString::from_units(name_token.source(&program.units).to_vec());
            let object = self.create_function_object(program, func, env, strict)?;
            if !self.env_has_binding(env, &name) {
                self.env_create_mutable_binding(env, name.clone(), false)?;
            }
            self.env_set_mutable_binding(env, &name, JsValue::Object(object), strict)?;
        }

        // 3. the arguments object, functions only
        if let Some(frame) = &frame {
            let arguments_name = JsString::from_str("arguments");
            if !self.env_has_binding(env, &arguments_name) {
                let arguments = self.create_arguments_object(program, frame, env, strict)?;
                self.env_create_mutable_binding(env, arguments_name.clone(), false)?;
                self.env_set_mutable_binding(env, &arguments_name, JsValue::Object(arguments), strict)?;
            }
        }

        // 4. var declarations: bind if absent, never overwrite
        let mut names = Vec::new();
        for stmt in &body.statements {
            collect_var_names(stmt, program, &mut names);
        }
        for name in names {
            if !self.env_has_binding(env, &name) {
                self.env_create_mutable_binding(env, name, false)?;
            }
        }
        Ok(())
    }

    /// 10.6 the arguments object.
    fn create_arguments_object(
        &mut self,
        program: &Rc<ParsedProgram>,
        frame: &FrameArgs<'_>,
        env: EnvId,
        strict: bool,
    ) -> EvalResult<HeapId> {
        let mut object = JsObject::new("Arguments", Some(self.realm.object_proto));
        object.set_data_property(
            JsString::from_str("length"),
            JsValue::Number(frame.args.len() as f64),
            true,
            false,
            true,
        );
        for (index, arg) in frame.args.iter().enumerate() {
            object.set_data_property(JsString::from_str(&index.to_string()), arg.clone(), true, true, true);
        }

        if strict {
            // strict mode: no aliasing, and caller/callee are poisoned
            let thrower = JsValue::Object(self.realm.thrower);
            object.properties.insert(
                JsString::from_str("caller"),
                PropertyDescriptor::accessor(thrower.clone(), thrower.clone(), false, false),
            );
            object.properties.insert(
                JsString::from_str("callee"),
                PropertyDescriptor::accessor(thrower.clone(), thrower, false, false),
            );
        } else {
            object.set_data_property(JsString::from_str("callee"), JsValue::Object(frame.callee_id), true, false, true);
            // non-strict: indexed properties alias the formals; with
            // duplicate parameter names the last formal wins the alias
            let names: Vec<Option<JsString>> = (0..frame.args.len())
                .map(|index| {
                    frame
                        .def
                        .params
                        .get(index)
                        .map(|param| JsString::from_units(param.source(&program.units).to_vec()))
                })
                .collect();
            object.arguments_map = Some(ArgumentsMap { env, names });
        }
        let id = self.heap.allocate(object)?;
        Ok(id)
    }

    /// Creates an Error object of the given kind.
    pub(crate) fn create_error_object(&mut self, kind: ErrorKind, message: &str) -> EvalResult<HeapId> {
        let proto = self.realm.error_proto_for(kind);
        let mut object = JsObject::new("Error", Some(proto));
        if !message.is_empty() {
            object.set_builtin_property("message", JsValue::String(JsString::from_str(message)));
        }
        self.heap.allocate(object)
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

/// Argument bundle for declaration binding instantiation of function code.
pub(crate) struct FrameArgs<'a> {
    pub def: &'a FuncDef,
    pub args: &'a [JsValue],
    pub callee_id: HeapId,
}

/// Collects the names declared by `var` statements, recursing through
/// statements but never into nested function bodies.
fn collect_var_names(ast: &Ast, program: &ParsedProgram, out: &mut Vec<JsString>) {
    match &ast.kind {
        AstKind::VarStmt { decls } => {
            for decl in decls {
                collect_var_names(decl, program, out);
            }
        }
        AstKind::VarDecl { name, .. } => {
            out.push(JsString::from_units(name.source(&program.units).to_vec()));
        }
        AstKind::Block { stmts } => {
            for stmt in stmts {
                collect_var_names(stmt, program, out);
            }
        }
        AstKind::If { then, other, .. } => {
            collect_var_names(then, program, out);
            if let Some(other) = other {
                collect_var_names(other, program, out);
            }
        }
        AstKind::DoWhile { body, .. } | AstKind::While { body, .. } | AstKind::With { body, .. } => {
            collect_var_names(body, program, out);
        }
        AstKind::For { init, body, .. } => {
            for decl in init {
                collect_var_names(decl, program, out);
            }
            collect_var_names(body, program, out);
        }
        AstKind::ForIn { left, body, .. } => {
            collect_var_names(left, program, out);
            collect_var_names(body, program, out);
        }
        AstKind::Switch {
            before_default,
            default_clause,
            after_default,
            ..
        } => {
            for clause in before_default.iter().chain(after_default) {
                for stmt in &clause.stmts {
                    collect_var_names(stmt, program, out);
                }
            }
            if let Some(stmts) = default_clause {
                for stmt in stmts {
                    collect_var_names(stmt, program, out);
                }
            }
        }
        AstKind::Try { block, catch, finally } => {
            collect_var_names(block, program, out);
            if let Some(catch) = catch {
                collect_var_names(&catch.block, program, out);
            }
            if let Some(finally) = finally {
                collect_var_names(finally, program, out);
            }
        }
        AstKind::Label { stmt, .. } => collect_var_names(stmt, program, out),
        _ => {}
    }
}

/// Evaluates argument expressions left to right, collapsing each through
/// GetValue.
pub(crate) type ArgList = SmallVec<[JsValue; 8]>;
