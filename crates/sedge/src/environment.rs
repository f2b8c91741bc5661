//! Environment records and the lexical-environment arena.
//!
//! All scopes live in one central [`Environments`] store and address each
//! other by [`EnvId`] (the global scope is always slot 0). Closures capture
//! an `EnvId`, so scopes routinely outlive the statements that created them;
//! like objects, environment slots are never reclaimed.

use ahash::AHashMap;

use crate::{
    heap::HeapId,
    value::{JsString, JsValue},
};

/// Index of a lexical environment in [`Environments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct EnvId(u32);

impl EnvId {
    fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("environment arena overflow"))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The global lexical environment is always slot 0.
pub const GLOBAL_ENV: EnvId = EnvId(0);

/// One binding of a declarative record.
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: JsValue,
    pub mutable: bool,
    pub deletable: bool,
    /// Immutable bindings are created uninitialized and set exactly once.
    pub initialized: bool,
}

/// Storage for name bindings: declarative (a plain map) or object-backed
/// (bindings are the properties of some object; `with` sets `provide_this`
/// so function calls resolved through it get the object as `this`).
#[derive(Debug)]
pub enum EnvRecord {
    Declarative { bindings: AHashMap<JsString, Binding> },
    Object { object: HeapId, provide_this: bool },
}

impl EnvRecord {
    pub fn declarative() -> Self {
        Self::Declarative {
            bindings: AHashMap::new(),
        }
    }
}

/// A lexical environment: a record plus the enclosing environment.
#[derive(Debug)]
pub struct LexicalEnv {
    pub record: EnvRecord,
    pub outer: Option<EnvId>,
}

/// Arena owning every lexical environment created during a run.
pub struct Environments {
    records: Vec<LexicalEnv>,
}

impl Environments {
    /// Creates the arena with the global object environment at slot 0.
    pub fn new(global_object: HeapId) -> Self {
        Self {
            records: vec![LexicalEnv {
                record: EnvRecord::Object {
                    object: global_object,
                    provide_this: false,
                },
                outer: None,
            }],
        }
    }

    pub fn get(&self, id: EnvId) -> &LexicalEnv {
        &self.records[id.index()]
    }

    pub fn get_mut(&mut self, id: EnvId) -> &mut LexicalEnv {
        &mut self.records[id.index()]
    }

    /// 10.2.2.2 NewDeclarativeEnvironment.
    pub fn new_declarative(&mut self, outer: Option<EnvId>) -> EnvId {
        let id = EnvId::new(self.records.len());
        self.records.push(LexicalEnv {
            record: EnvRecord::declarative(),
            outer,
        });
        id
    }

    /// 10.2.2.3 NewObjectEnvironment.
    pub fn new_object(&mut self, object: HeapId, provide_this: bool, outer: Option<EnvId>) -> EnvId {
        let id = EnvId::new(self.records.len());
        self.records.push(LexicalEnv {
            record: EnvRecord::Object { object, provide_this },
            outer,
        });
        id
    }

    /// Creates a mutable binding in a declarative record.
    ///
    /// # Panics
    /// Panics when called on an object record; object-backed bindings go
    /// through the property protocol on the interpreter.
    pub fn create_mutable_binding(&mut self, id: EnvId, name: JsString, deletable: bool) {
        match &mut self.get_mut(id).record {
            EnvRecord::Declarative { bindings } => {
                bindings.insert(
                    name,
                    Binding {
                        value: JsValue::Undefined,
                        mutable: true,
                        deletable,
                        initialized: true,
                    },
                );
            }
            EnvRecord::Object { .. } => panic!("create_mutable_binding on an object record"),
        }
    }

    /// Creates an immutable binding (named function expressions bind their
    /// own name this way) and initializes it.
    pub fn create_immutable_binding(&mut self, id: EnvId, name: JsString, value: JsValue) {
        match &mut self.get_mut(id).record {
            EnvRecord::Declarative { bindings } => {
                bindings.insert(
                    name,
                    Binding {
                        value,
                        mutable: false,
                        deletable: false,
                        initialized: true,
                    },
                );
            }
            EnvRecord::Object { .. } => panic!("create_immutable_binding on an object record"),
        }
    }
}
