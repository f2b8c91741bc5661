//! The realm of built-in objects: the global object and the minimal
//! Object / Function / String / Number / Boolean / Array / Error library
//! needed to host real programs. One concern per file; this module wires
//! the realm together.

mod array;
mod boolean;
mod error;
mod function;
mod number;
mod object;
mod string;

use crate::{
    error::ErrorKind,
    heap::{Heap, HeapId},
    object::{Callable, JsObject, NativeFn, NativeFunction},
    value::{JsString, JsValue},
};

/// Handles to the intrinsic objects of one interpreter instance.
pub struct Realm {
    pub global: HeapId,
    pub object_proto: HeapId,
    pub function_proto: HeapId,
    pub string_proto: HeapId,
    pub number_proto: HeapId,
    pub boolean_proto: HeapId,
    pub array_proto: HeapId,
    pub regexp_proto: HeapId,
    pub error_proto: HeapId,
    pub eval_error_proto: HeapId,
    pub range_error_proto: HeapId,
    pub reference_error_proto: HeapId,
    pub syntax_error_proto: HeapId,
    pub type_error_proto: HeapId,
    pub uri_error_proto: HeapId,
    /// The shared poison function for `caller`/`callee` in strict mode.
    pub thrower: HeapId,
}

impl Realm {
    pub fn error_proto_for(&self, kind: ErrorKind) -> HeapId {
        match kind {
            ErrorKind::EvalError => self.eval_error_proto,
            ErrorKind::RangeError => self.range_error_proto,
            ErrorKind::ReferenceError => self.reference_error_proto,
            ErrorKind::SyntaxError => self.syntax_error_proto,
            ErrorKind::TypeError => self.type_error_proto,
            ErrorKind::UriError => self.uri_error_proto,
            ErrorKind::Error | ErrorKind::NativeError => self.error_proto,
        }
    }
}

/// Bootstrap allocation: the heap is unlimited while the realm is built,
/// so failure here is an interpreter bug.
fn alloc(heap: &mut Heap, object: JsObject) -> HeapId {
    heap.allocate(object).expect("bootstrap allocation cannot fail")
}

/// Creates a native function object.
fn native_function(heap: &mut Heap, function_proto: HeapId, name: &'static str, func: NativeFn, length: u32) -> HeapId {
    let mut object = JsObject::new("Function", Some(function_proto));
    object.callable = Some(Callable::Native(NativeFunction {
        name,
        func,
        construct: None,
    }));
    object.set_data_property(
        JsString::from_str("length"),
        JsValue::Number(f64::from(length)),
        false,
        false,
        false,
    );
    alloc(heap, object)
}

/// Defines a method on a prototype object.
fn define_method(
    heap: &mut Heap,
    function_proto: HeapId,
    target: HeapId,
    name: &'static str,
    func: NativeFn,
    length: u32,
) {
    let method = native_function(heap, function_proto, name, func, length);
    heap.get_mut(target).set_builtin_property(name, JsValue::Object(method));
}

/// Creates a constructor function, wires its `prototype` property and the
/// prototype's `constructor` back-reference, and installs it on the global
/// object.
#[allow(clippy::too_many_arguments)]
fn define_constructor(
    heap: &mut Heap,
    function_proto: HeapId,
    global: HeapId,
    name: &'static str,
    func: NativeFn,
    construct: NativeFn,
    proto: HeapId,
    length: u32,
) -> HeapId {
    let mut object = JsObject::new("Function", Some(function_proto));
    object.callable = Some(Callable::Native(NativeFunction {
        name,
        func,
        construct: Some(construct),
    }));
    object.constructable = true;
    object.set_data_property(
        JsString::from_str("length"),
        JsValue::Number(f64::from(length)),
        false,
        false,
        false,
    );
    let ctor = alloc(heap, object);
    heap.get_mut(ctor)
        .set_data_property(JsString::from_str("prototype"), JsValue::Object(proto), false, false, false);
    heap.get_mut(proto)
        .set_data_property(JsString::from_str("constructor"), JsValue::Object(ctor), true, false, true);
    heap.get_mut(global).set_builtin_property(name, JsValue::Object(ctor));
    ctor
}

fn error_prototype(heap: &mut Heap, error_proto: HeapId, name: &str) -> HeapId {
    let mut proto = JsObject::new("Error", Some(error_proto));
    proto.set_builtin_property("name", JsValue::String(JsString::from_str(name)));
    alloc(heap, proto)
}

/// Builds the realm: every intrinsic object, the global object and its
/// properties.
pub fn create_realm(heap: &mut Heap) -> Realm {
    let object_proto = alloc(heap, JsObject::new("Object", None));

    // Function.prototype is itself callable and returns undefined
    let mut function_proto_object = JsObject::new("Function", Some(object_proto));
    function_proto_object.callable = Some(Callable::Native(NativeFunction {
        name: "",
        func: function::function_proto_self,
        construct: None,
    }));
    let function_proto = alloc(heap, function_proto_object);

    let mut string_proto_object = JsObject::new("String", Some(object_proto));
    string_proto_object.primitive_value = Some(JsValue::String(JsString::empty()));
    let string_proto = alloc(heap, string_proto_object);

    let mut number_proto_object = JsObject::new("Number", Some(object_proto));
    number_proto_object.primitive_value = Some(JsValue::Number(0.0));
    let number_proto = alloc(heap, number_proto_object);

    let mut boolean_proto_object = JsObject::new("Boolean", Some(object_proto));
    boolean_proto_object.primitive_value = Some(JsValue::Bool(false));
    let boolean_proto = alloc(heap, boolean_proto_object);

    let mut array_proto_object = JsObject::new("Array", Some(object_proto));
    array_proto_object.set_data_property(JsString::from_str("length"), JsValue::Number(0.0), true, false, false);
    let array_proto = alloc(heap, array_proto_object);

    let regexp_proto = alloc(heap, JsObject::new("RegExp", Some(object_proto)));

    let mut error_proto_object = JsObject::new("Error", Some(object_proto));
    error_proto_object.set_builtin_property("name", JsValue::String(JsString::from_str("Error")));
    error_proto_object.set_builtin_property("message", JsValue::String(JsString::empty()));
    let error_proto = alloc(heap, error_proto_object);

    let eval_error_proto = error_prototype(heap, error_proto, "EvalError");
    let range_error_proto = error_prototype(heap, error_proto, "RangeError");
    let reference_error_proto = error_prototype(heap, error_proto, "ReferenceError");
    let syntax_error_proto = error_prototype(heap, error_proto, "SyntaxError");
    let type_error_proto = error_prototype(heap, error_proto, "TypeError");
    let uri_error_proto = error_prototype(heap, error_proto, "URIError");

    let thrower = native_function(heap, function_proto, "", error::restricted_access, 0);

    let mut global_object = JsObject::new("global", Some(object_proto));
    global_object.set_data_property(JsString::from_str("NaN"), JsValue::Number(f64::NAN), false, false, false);
    global_object.set_data_property(
        JsString::from_str("Infinity"),
        JsValue::Number(f64::INFINITY),
        false,
        false,
        false,
    );
    global_object.set_data_property(JsString::from_str("undefined"), JsValue::Undefined, false, false, false);
    let global = alloc(heap, global_object);

    // constructors
    define_constructor(
        heap,
        function_proto,
        global,
        "Object",
        object::constructor,
        object::constructor,
        object_proto,
        1,
    );
    define_constructor(
        heap,
        function_proto,
        global,
        "Function",
        function::constructor,
        function::constructor,
        function_proto,
        1,
    );
    define_constructor(
        heap,
        function_proto,
        global,
        "String",
        string::call,
        string::construct,
        string_proto,
        1,
    );
    define_constructor(
        heap,
        function_proto,
        global,
        "Number",
        number::call,
        number::construct,
        number_proto,
        1,
    );
    define_constructor(
        heap,
        function_proto,
        global,
        "Boolean",
        boolean::call,
        boolean::construct,
        boolean_proto,
        1,
    );
    define_constructor(
        heap,
        function_proto,
        global,
        "Array",
        array::constructor,
        array::constructor,
        array_proto,
        1,
    );
    define_constructor(
        heap,
        function_proto,
        global,
        "Error",
        error::error,
        error::error,
        error_proto,
        1,
    );
    define_constructor(
        heap,
        function_proto,
        global,
        "EvalError",
        error::eval_error,
        error::eval_error,
        eval_error_proto,
        1,
    );
    define_constructor(
        heap,
        function_proto,
        global,
        "RangeError",
        error::range_error,
        error::range_error,
        range_error_proto,
        1,
    );
    define_constructor(
        heap,
        function_proto,
        global,
        "ReferenceError",
        error::reference_error,
        error::reference_error,
        reference_error_proto,
        1,
    );
    define_constructor(
        heap,
        function_proto,
        global,
        "SyntaxError",
        error::syntax_error,
        error::syntax_error,
        syntax_error_proto,
        1,
    );
    define_constructor(
        heap,
        function_proto,
        global,
        "TypeError",
        error::type_error,
        error::type_error,
        type_error_proto,
        1,
    );
    define_constructor(
        heap,
        function_proto,
        global,
        "URIError",
        error::uri_error,
        error::uri_error,
        uri_error_proto,
        1,
    );

    // prototype methods
    define_method(heap, function_proto, object_proto, "toString", object::proto_to_string, 0);
    define_method(heap, function_proto, object_proto, "valueOf", object::proto_value_of, 0);
    define_method(
        heap,
        function_proto,
        object_proto,
        "hasOwnProperty",
        object::proto_has_own_property,
        1,
    );

    define_method(heap, function_proto, function_proto, "call", function::proto_call, 1);
    define_method(heap, function_proto, function_proto, "apply", function::proto_apply, 2);
    define_method(heap, function_proto, function_proto, "toString", function::proto_to_string, 0);

    define_method(heap, function_proto, string_proto, "toString", string::proto_to_string, 0);
    define_method(heap, function_proto, string_proto, "valueOf", string::proto_value_of, 0);
    define_method(heap, function_proto, string_proto, "charAt", string::proto_char_at, 1);
    define_method(heap, function_proto, string_proto, "charCodeAt", string::proto_char_code_at, 1);
    define_method(heap, function_proto, string_proto, "concat", string::proto_concat, 1);
    define_method(heap, function_proto, string_proto, "indexOf", string::proto_index_of, 1);
    define_method(heap, function_proto, string_proto, "substring", string::proto_substring, 2);
    define_method(heap, function_proto, string_proto, "toLowerCase", string::proto_to_lower_case, 0);
    define_method(heap, function_proto, string_proto, "toUpperCase", string::proto_to_upper_case, 0);

    define_method(heap, function_proto, number_proto, "toString", number::proto_to_string, 1);
    define_method(heap, function_proto, number_proto, "valueOf", number::proto_value_of, 0);

    define_method(heap, function_proto, boolean_proto, "toString", boolean::proto_to_string, 0);
    define_method(heap, function_proto, boolean_proto, "valueOf", boolean::proto_value_of, 0);

    define_method(heap, function_proto, array_proto, "join", array::proto_join, 1);
    define_method(heap, function_proto, array_proto, "push", array::proto_push, 1);

    define_method(heap, function_proto, error_proto, "toString", error::proto_to_string, 0);

    Realm {
        global,
        object_proto,
        function_proto,
        string_proto,
        number_proto,
        boolean_proto,
        array_proto,
        regexp_proto,
        error_proto,
        eval_error_proto,
        range_error_proto,
        reference_error_proto,
        syntax_error_proto,
        type_error_proto,
        uri_error_proto,
        thrower,
    }
}
