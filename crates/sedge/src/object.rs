//! Objects, property descriptors, and callable payloads.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    ast::FuncId,
    environment::EnvId,
    error::EvalResult,
    heap::HeapId,
    interp::Interp,
    parse::ParsedProgram,
    value::{JsString, JsValue},
};

/// A property descriptor: either data or accessor, with any field possibly
/// absent. Empty descriptors are used for partial updates by
/// `[[DefineOwnProperty]]`; a descriptor is never both data and accessor
/// (the merge logic rejects the combination).
#[derive(Debug, Clone, Default)]
pub struct PropertyDescriptor {
    pub value: Option<JsValue>,
    pub writable: Option<bool>,
    /// Getter: `Some(Undefined)` is an explicitly absent getter, `None` means
    /// the field itself is absent.
    pub get: Option<JsValue>,
    pub set: Option<JsValue>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: Some(value),
            writable: Some(writable),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
            ..Self::default()
        }
    }

    pub fn accessor(get: JsValue, set: JsValue, enumerable: bool, configurable: bool) -> Self {
        Self {
            get: Some(get),
            set: Some(set),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
            ..Self::default()
        }
    }

    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_generic_descriptor(&self) -> bool {
        !self.is_data_descriptor() && !self.is_accessor_descriptor()
    }

    pub fn is_enumerable(&self) -> bool {
        self.enumerable.unwrap_or(false)
    }

    pub fn is_writable(&self) -> bool {
        self.writable.unwrap_or(false)
    }

    pub fn is_configurable(&self) -> bool {
        self.configurable.unwrap_or(false)
    }
}

/// A host-implemented function.
pub type NativeFn = fn(&mut Interp, &JsValue, &[JsValue]) -> EvalResult<JsValue>;

/// A function compiled from source: the program that owns its definition,
/// the definition id, the captured `[[Scope]]`, and whether the body is
/// strict (own directive or inherited from the creation context).
#[derive(Debug, Clone)]
pub struct ScriptFunction {
    pub program: Rc<ParsedProgram>,
    pub func: FuncId,
    pub scope: EnvId,
    pub strict: bool,
}

#[derive(Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub func: NativeFn,
    /// Separate `[[Construct]]` behavior. Built-in constructors like String
    /// behave differently when called versus constructed; plain native
    /// functions leave this `None` and are not constructable.
    pub construct: Option<NativeFn>,
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// The `[[Call]]` payload of a callable object.
#[derive(Debug, Clone)]
pub enum Callable {
    Script(ScriptFunction),
    Native(NativeFunction),
}

/// Aliasing table of a non-strict `arguments` object: index properties read
/// and write the corresponding formal-parameter bindings.
#[derive(Debug, Clone)]
pub struct ArgumentsMap {
    pub env: EnvId,
    /// `names[i]` is the formal bound at argument index `i`, when one exists.
    pub names: Vec<Option<JsString>>,
}

pub type PropertyTable = IndexMap<JsString, PropertyDescriptor, ahash::RandomState>;

/// A runtime object.
///
/// Exotic behaviors (array length maintenance, string indexing, arguments
/// aliasing) dispatch on the `class` tag rather than a trait hierarchy, so
/// the internal methods stay plain functions over this one struct.
#[derive(Debug, Clone)]
pub struct JsObject {
    pub class: &'static str,
    pub extensible: bool,
    pub prototype: Option<HeapId>,
    /// Boxed primitive for wrapper objects (String, Number, Boolean).
    pub primitive_value: Option<JsValue>,
    pub callable: Option<Callable>,
    pub constructable: bool,
    /// Insertion-ordered property table; enumeration order follows it.
    pub properties: PropertyTable,
    pub arguments_map: Option<ArgumentsMap>,
}

impl JsObject {
    pub fn new(class: &'static str, prototype: Option<HeapId>) -> Self {
        Self {
            class,
            extensible: true,
            prototype,
            primitive_value: None,
            callable: None,
            constructable: false,
            properties: PropertyTable::default(),
            arguments_map: None,
        }
    }

    pub fn is_callable(&self) -> bool {
        self.callable.is_some()
    }

    pub fn get_own_property(&self, name: &JsString) -> Option<&PropertyDescriptor> {
        self.properties.get(name)
    }

    /// Installs a plain data property, overwriting any existing one.
    pub fn set_data_property(&mut self, name: JsString, value: JsValue, writable: bool, enumerable: bool, configurable: bool) {
        self.properties
            .insert(name, PropertyDescriptor::data(value, writable, enumerable, configurable));
    }

    /// Convenience for writable/non-enumerable/configurable built-in slots.
    pub fn set_builtin_property(&mut self, name: &str, value: JsValue) {
        self.set_data_property(JsString::from_str(name), value, true, false, true);
    }
}
