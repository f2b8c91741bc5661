//! The object arena.
//!
//! Objects live for the whole evaluation: slots are allocated, never
//! reclaimed. That makes the cyclic object graph (closures point at
//! environments, environments at function objects, prototype chains can be
//! rearranged into cycles at runtime) trivially sound: nothing is freed
//! until the interpreter itself is dropped. Long-running programs pay for
//! this with monotonic growth, which the optional object ceiling bounds.

use std::collections::BTreeMap;

use crate::{
    error::{JsError, EvalResult},
    object::{JsObject, PropertyDescriptor},
    value::{JsString, JsValue},
};

/// Handle to an object slot. Object identity is handle equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct HeapId(u32);

impl HeapId {
    fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("heap slot overflow"))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Snapshot of heap occupancy, for host monitoring and tests.
///
/// `objects_by_class` uses a `BTreeMap` so iteration order is deterministic
/// and snapshots compare cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    pub live_objects: usize,
    pub objects_by_class: BTreeMap<&'static str, usize>,
}

pub struct Heap {
    slots: Vec<JsObject>,
    max_objects: Option<usize>,
}

impl Heap {
    pub fn new(max_objects: Option<usize>) -> Self {
        Self {
            slots: Vec::new(),
            max_objects,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Installs (or clears) the object ceiling. The interpreter applies the
    /// configured limit only after realm bootstrap, so it bounds program
    /// allocations rather than the intrinsics.
    pub fn set_max_objects(&mut self, max_objects: Option<usize>) {
        self.max_objects = max_objects;
    }

    /// Allocates a slot for `object`. Fails with a RangeError when the
    /// configured object ceiling would be exceeded.
    pub fn allocate(&mut self, object: JsObject) -> EvalResult<HeapId> {
        if let Some(max) = self.max_objects {
            if self.slots.len() >= max {
                return Err(JsError::range_error("object heap limit exceeded"));
            }
        }
        let id = HeapId::new(self.slots.len());
        self.slots.push(object);
        Ok(id)
    }

    pub fn get(&self, id: HeapId) -> &JsObject {
        &self.slots[id.index()]
    }

    pub fn get_mut(&mut self, id: HeapId) -> &mut JsObject {
        &mut self.slots[id.index()]
    }

    pub fn stats(&self) -> HeapStats {
        let mut objects_by_class: BTreeMap<&'static str, usize> = BTreeMap::new();
        for object in &self.slots {
            *objects_by_class.entry(object.class).or_insert(0) += 1;
        }
        HeapStats {
            live_objects: self.slots.len(),
            objects_by_class,
        }
    }

    /// 8.12.2 `[[GetProperty]]`: the own property, or the nearest one up the
    /// prototype chain. The chain walk is bounded so a prototype cycle
    /// created at runtime terminates.
    pub fn get_property(&self, id: HeapId, name: &JsString) -> Option<PropertyDescriptor> {
        let mut current = Some(id);
        let mut hops = 0usize;
        while let Some(object_id) = current {
            let object = self.get(object_id);
            if let Some(desc) = object.get_own_property(name) {
                return Some(desc.clone());
            }
            current = object.prototype;
            hops += 1;
            if hops > self.slots.len() {
                break;
            }
        }
        None
    }

    /// 8.12.6 `[[HasProperty]]`.
    pub fn has_property(&self, id: HeapId, name: &JsString) -> bool {
        self.get_property(id, name).is_some()
    }

    /// 8.12.7 `[[Delete]]`.
    pub fn delete_property(&mut self, id: HeapId, name: &JsString, throw: bool) -> EvalResult<bool> {
        let object = self.get_mut(id);
        match object.properties.get(name) {
            None => Ok(true),
            Some(desc) if desc.is_configurable() => {
                object.properties.shift_remove(name);
                Ok(true)
            }
            Some(_) => {
                if throw {
                    Err(JsError::type_error(format!("cannot delete property '{name}'")))
                } else {
                    Ok(false)
                }
            }
        }
    }

    /// 8.12.9 `[[DefineOwnProperty]]`: validates against the current
    /// descriptor, then applies the requested fields. Rejections surface as
    /// a TypeError when `throw` is set, `Ok(false)` otherwise.
    pub fn define_own_property(
        &mut self,
        id: HeapId,
        name: &JsString,
        desc: PropertyDescriptor,
        throw: bool,
    ) -> EvalResult<bool> {
        let reject = |throw: bool| -> EvalResult<bool> {
            if throw {
                Err(JsError::type_error(format!("cannot redefine property '{name}'")))
            } else {
                Ok(false)
            }
        };

        let object = self.get_mut(id);
        if !object.properties.contains_key(name) {
            if !object.extensible {
                return reject(throw);
            }
            // fill in absent fields with their defaults
            let filled = if desc.is_accessor_descriptor() {
                PropertyDescriptor {
                    get: Some(desc.get.unwrap_or(JsValue::Undefined)),
                    set: Some(desc.set.unwrap_or(JsValue::Undefined)),
                    enumerable: Some(desc.enumerable.unwrap_or(false)),
                    configurable: Some(desc.configurable.unwrap_or(false)),
                    ..PropertyDescriptor::default()
                }
            } else {
                PropertyDescriptor {
                    value: Some(desc.value.unwrap_or(JsValue::Undefined)),
                    writable: Some(desc.writable.unwrap_or(false)),
                    enumerable: Some(desc.enumerable.unwrap_or(false)),
                    configurable: Some(desc.configurable.unwrap_or(false)),
                    ..PropertyDescriptor::default()
                }
            };
            object.properties.insert(name.clone(), filled);
            return Ok(true);
        }
        let current = object
            .properties
            .get_mut(name)
            .expect("presence checked above");

        if desc.is_generic_descriptor()
            && desc.enumerable.is_none()
            && desc.configurable.is_none()
        {
            return Ok(true);
        }

        if !current.is_configurable() {
            if desc.configurable == Some(true) {
                return reject(throw);
            }
            if desc.enumerable.is_some() && desc.enumerable != current.enumerable {
                return reject(throw);
            }
            // flipping between data and accessor requires configurability
            if current.is_data_descriptor() != desc.is_data_descriptor() && !desc.is_generic_descriptor() {
                return reject(throw);
            }
            if current.is_data_descriptor() && desc.is_data_descriptor() {
                if !current.is_writable() {
                    if desc.writable == Some(true) {
                        return reject(throw);
                    }
                    if let Some(new_value) = &desc.value {
                        let unchanged = current
                            .value
                            .as_ref()
                            .is_some_and(|old| crate::value::same_value(old, new_value));
                        if !unchanged {
                            return reject(throw);
                        }
                    }
                }
            }
        }

        // switching between data and accessor wipes the other side's fields
        if desc.is_accessor_descriptor() && current.is_data_descriptor() {
            current.value = None;
            current.writable = None;
        } else if desc.is_data_descriptor() && current.is_accessor_descriptor() {
            current.get = None;
            current.set = None;
        }

        if let Some(value) = desc.value {
            current.value = Some(value);
        }
        if let Some(writable) = desc.writable {
            current.writable = Some(writable);
        }
        if let Some(get) = desc.get {
            current.get = Some(get);
        }
        if let Some(set) = desc.set {
            current.set = Some(set);
        }
        if let Some(enumerable) = desc.enumerable {
            current.enumerable = Some(enumerable);
        }
        if let Some(configurable) = desc.configurable {
            current.configurable = Some(configurable);
        }
        Ok(true)
    }
}
