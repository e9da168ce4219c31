//! Structural mock tooling.
//!
//! `get_metadata` reflects on a value and records its shape;
//! `generate_from_metadata` synthesizes a fresh mock from a recorded
//! shape. Functions become call-recording mock functions, containers are
//! rebuilt member by member, and primitives are copied as constants.

#![allow(clippy::unused_self)]

use crate::value::{JsFunction, NativeFn, Value};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Recorded shape of a value.
#[derive(Debug, Clone)]
pub enum MockMetadata {
    Function { name: String },
    Object { members: FxHashMap<String, MockMetadata> },
    Array { items: Vec<MockMetadata> },
    Constant(Value),
}

impl MockMetadata {
    /// The sentinel inserted while introspection of a path is in flight,
    /// so a circular reference terminates with an empty shape.
    #[must_use]
    pub fn empty_object() -> Self {
        Self::Object {
            members: FxHashMap::default(),
        }
    }
}

/// The mocker consumed by the runtime.
#[derive(Debug, Default)]
pub struct ModuleMocker;

impl ModuleMocker {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Reflect on `value` and record its shape.
    ///
    /// Cycles through shared containers are cut: a container already on
    /// the current walk is recorded as an empty object.
    #[must_use]
    pub fn get_metadata(&self, value: &Value) -> Option<MockMetadata> {
        let mut visiting: Vec<*const ()> = Vec::new();
        Some(self.metadata_of(value, &mut visiting))
    }

    fn metadata_of(&self, value: &Value, visiting: &mut Vec<*const ()>) -> MockMetadata {
        match value {
            Value::Function(f) => MockMetadata::Function {
                name: f.name().to_string(),
            },
            Value::Object(map) => {
                let ptr = Rc::as_ptr(map).cast::<()>();
                if visiting.contains(&ptr) {
                    return MockMetadata::empty_object();
                }
                visiting.push(ptr);
                let members = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), self.metadata_of(v, visiting)))
                    .collect();
                visiting.pop();
                MockMetadata::Object { members }
            }
            Value::Array(items) => {
                let ptr = Rc::as_ptr(items).cast::<()>();
                if visiting.contains(&ptr) {
                    return MockMetadata::empty_object();
                }
                visiting.push(ptr);
                let recorded = items
                    .borrow()
                    .iter()
                    .map(|v| self.metadata_of(v, visiting))
                    .collect();
                visiting.pop();
                MockMetadata::Array { items: recorded }
            }
            primitive => MockMetadata::Constant(primitive.clone()),
        }
    }

    /// Synthesize a fresh mock from a recorded shape.
    #[must_use]
    pub fn generate_from_metadata(&self, metadata: &MockMetadata) -> Value {
        match metadata {
            MockMetadata::Function { name } => {
                Value::Function(Rc::new(JsFunction::mock(name.clone(), None)))
            }
            MockMetadata::Object { members } => {
                let object = Value::object();
                for (key, member) in members {
                    object.set(key.clone(), self.generate_from_metadata(member));
                }
                object
            }
            MockMetadata::Array { items } => {
                let generated: Vec<Value> = items
                    .iter()
                    .map(|m| self.generate_from_metadata(m))
                    .collect();
                Value::Array(Rc::new(std::cell::RefCell::new(generated)))
            }
            MockMetadata::Constant(value) => value.clone(),
        }
    }

    /// A fresh anonymous mock function.
    #[must_use]
    pub fn get_mock_function(&self) -> Value {
        self.mock_fn(None)
    }

    /// A fresh mock function with an optional preset implementation.
    #[must_use]
    pub fn mock_fn(&self, implementation: Option<NativeFn>) -> Value {
        Value::Function(Rc::new(JsFunction::mock("mockFunction", implementation)))
    }

    /// Whether `value` is a mock function.
    #[must_use]
    pub fn is_mock_function(&self, value: &Value) -> bool {
        value.as_function().is_some_and(|f| f.is_mock())
    }
}
