//! Public interface for running source text.

use std::rc::Rc;

use crate::{
    error::{ErrorKind, Exception},
    interp::Interp,
    object::Callable,
    parse::ParsedProgram,
    resource::ResourceLimits,
    tracer::{NoopTracer, Tracer},
    value::{CompletionKind, JsString, JsValue},
};

/// A host-facing value: the final result of a run, converted out of the
/// interpreter's heap. Object conversion is shallow-ish (enumerable own
/// data properties, bounded depth); functions surface as their name.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Function(String),
    Object(Vec<(String, Object)>),
}

/// Primary interface for evaluating programs.
///
/// A `Runner` parses once on construction; [`Runner::run`] evaluates the
/// parsed program in a fresh interpreter each time. The parse can be
/// snapshotted with [`Runner::dump`] and restored with [`Runner::load`] to
/// skip parsing on later runs.
///
/// # Example
/// ```
/// use sedge::{Object, Runner};
///
/// let runner = Runner::new("var a = 1, n = 5; while (a < n) { a *= 2 } a").unwrap();
/// assert_eq!(runner.run().unwrap(), Object::Number(8.0));
/// ```
#[derive(Debug, Clone)]
pub struct Runner {
    program: Rc<ParsedProgram>,
}

impl Runner {
    /// Parses `source`. Parse failures surface as a SyntaxError exception
    /// whose message points at the offending region.
    pub fn new(source: &str) -> Result<Self, Exception> {
        let program = ParsedProgram::parse(source);
        if program.is_illegal() {
            let offending = program.program.text(&program.units);
            return Err(Exception::new(
                ErrorKind::SyntaxError,
                Some(format!("unexpected input near '{offending}'")),
            ));
        }
        Ok(Self {
            program: Rc::new(program),
        })
    }

    /// The original source text.
    #[must_use]
    pub fn source(&self) -> String {
        String::from_utf16_lossy(&self.program.units)
    }

    /// Evaluates the program with default limits, discarding trace events.
    pub fn run(&self) -> Result<Object, Exception> {
        self.run_with(ResourceLimits::default(), Box::new(NoopTracer))
    }

    /// Evaluates the program under the given resource limits and tracer.
    pub fn run_with(&self, limits: ResourceLimits, tracer: Box<dyn Tracer>) -> Result<Object, Exception> {
        let mut interp = Interp::with_limits(limits, tracer);
        let completion = interp
            .enter_global_code(&self.program)
            .and_then(|()| interp.eval_program(&self.program));

        match completion {
            Err(error) => Err(Exception::from(error)),
            Ok(completion) if completion.kind == CompletionKind::Throw => {
                let thrown = match completion.value {
                    Some(value) => interp.get_value(value).map_err(Exception::from)?,
                    None => JsValue::Undefined,
                };
                Err(thrown_to_exception(&mut interp, &thrown))
            }
            Ok(completion) => {
                let value = match completion.value {
                    Some(value) => interp.get_value(value).map_err(Exception::from)?,
                    None => JsValue::Undefined,
                };
                Ok(to_host_object(&mut interp, &value, 0))
            }
        }
    }

    /// Serializes the parsed program to a compact binary form.
    pub fn dump(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(&*self.program)
    }

    /// Restores a runner from [`Runner::dump`] output.
    pub fn load(bytes: &[u8]) -> Result<Self, postcard::Error> {
        let program: ParsedProgram = postcard::from_bytes(bytes)?;
        Ok(Self {
            program: Rc::new(program),
        })
    }
}

fn thrown_to_exception(interp: &mut Interp, thrown: &JsValue) -> Exception {
    let kind = interp.classify_thrown(thrown);
    let message = match thrown {
        JsValue::Object(id) => {
            let message_value = interp
                .object_get(*id, &JsString::from_str("message"))
                .unwrap_or(JsValue::Undefined);
            match message_value {
                JsValue::Undefined => None,
                other => interp.to_string(&other).ok().map(|s| s.to_string()),
            }
        }
        primitive => interp.to_string(primitive).ok().map(|s| s.to_string()),
    };
    Exception::new(kind, message)
}

fn to_host_object(interp: &mut Interp, value: &JsValue, depth: usize) -> Object {
    match value {
        JsValue::Undefined => Object::Undefined,
        JsValue::Null => Object::Null,
        JsValue::Bool(b) => Object::Bool(*b),
        JsValue::Number(n) => Object::Number(*n),
        JsValue::String(s) => Object::String(s.to_string()),
        JsValue::Object(id) => {
            let object = interp.heap.get(*id);
            if let Some(callable) = &object.callable {
                let name = match callable {
                    Callable::Native(native) => native.name.to_owned(),
                    Callable::Script(script) => script
                        .program
                        .func(script.func)
                        .name
                        .map(|t| t.text(&script.program.units))
                        .unwrap_or_default(),
                };
                return Object::Function(name);
            }
            if depth >= 4 {
                return Object::Object(Vec::new());
            }
            // enumerable own data properties only; accessors would run code
            let pairs: Vec<(JsString, JsValue)> = object
                .properties
                .iter()
                .filter(|(_, desc)| desc.is_enumerable() && desc.is_data_descriptor())
                .filter_map(|(name, desc)| desc.value.clone().map(|v| (name.clone(), v)))
                .collect();
            Object::Object(
                pairs
                    .into_iter()
                    .map(|(name, inner)| (name.to_string(), to_host_object(interp, &inner, depth + 1)))
                    .collect(),
            )
        }
    }
}
