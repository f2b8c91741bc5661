//! The execution-context stack.

use crate::{environment::EnvId, value::JsValue};

/// One entry of the context stack.
///
/// `variable_env` and `lexical_env` coincide except inside `with` and
/// `catch`, which push a fresh lexical scope without changing where `var`
/// declarations land.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub variable_env: EnvId,
    pub lexical_env: EnvId,
    pub this_binding: JsValue,
    pub strict: bool,
}

impl ExecutionContext {
    pub fn new(env: EnvId, this_binding: JsValue, strict: bool) -> Self {
        Self {
            variable_env: env,
            lexical_env: env,
            this_binding,
            strict,
        }
    }
}
