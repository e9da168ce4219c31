//! Dynamic values crossing the sandbox boundary.
//!
//! Module exports, mock instances, and the sandbox global all share this
//! representation. Containers are reference-counted shared handles:
//! handing a value across the boundary hands out the same underlying
//! storage, which is what lets a circular require observe a partially
//! populated exports object.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A host-side callable.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Value>;

/// A dynamic value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<FxHashMap<String, Value>>>),
    Function(Rc<JsFunction>),
}

impl Value {
    /// A fresh empty object.
    #[must_use]
    pub fn object() -> Self {
        Self::Object(Rc::new(RefCell::new(FxHashMap::default())))
    }

    /// A fresh empty array.
    #[must_use]
    pub fn array() -> Self {
        Self::Array(Rc::new(RefCell::new(Vec::new())))
    }

    /// A plain (non-mock) function value.
    pub fn function(name: impl Into<String>, f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self::Function(Rc::new(JsFunction::new(name, Some(Rc::new(f)))))
    }

    /// Read a property off an object value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Self::Object(map) => map.borrow().get(key).cloned(),
            _ => None,
        }
    }

    /// Write a property on an object value. Non-objects ignore the write.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        if let Self::Object(map) = self {
            map.borrow_mut().insert(key.into(), value);
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function(&self) -> Option<&Rc<JsFunction>> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Identity comparison: pointer equality for containers and
    /// functions, structural equality for primitives.
    #[must_use]
    pub fn ref_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Convert parsed JSON into a value tree.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => {
                let converted = items.iter().map(Self::from_json).collect();
                Self::Array(Rc::new(RefCell::new(converted)))
            }
            serde_json::Value::Object(map) => {
                let converted = map
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect();
                Self::Object(Rc::new(RefCell::new(converted)))
            }
        }
    }
}

/// Recorded state of a mock function.
#[derive(Default)]
struct MockState {
    calls: Vec<Vec<Value>>,
}

/// A callable value; optionally a mock that records its calls.
pub struct JsFunction {
    name: String,
    implementation: Option<NativeFn>,
    mock: Option<RefCell<MockState>>,
}

impl JsFunction {
    /// A plain function.
    pub(crate) fn new(name: impl Into<String>, implementation: Option<NativeFn>) -> Self {
        Self {
            name: name.into(),
            implementation,
            mock: None,
        }
    }

    /// A mock function, with an optional preset implementation.
    pub(crate) fn mock(name: impl Into<String>, implementation: Option<NativeFn>) -> Self {
        Self {
            name: name.into(),
            implementation,
            mock: Some(RefCell::new(MockState::default())),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_mock(&self) -> bool {
        self.mock.is_some()
    }

    /// Invoke the function. Mocks record the call first.
    pub fn call(&self, args: &[Value]) -> Value {
        if let Some(mock) = &self.mock {
            mock.borrow_mut().calls.push(args.to_vec());
        }
        match &self.implementation {
            Some(f) => f(args),
            None => Value::Undefined,
        }
    }

    /// Number of recorded calls (zero for non-mocks).
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.mock.as_ref().map_or(0, |m| m.borrow().calls.len())
    }

    /// Drop all recorded calls.
    pub fn mock_clear(&self) {
        if let Some(mock) = &self.mock {
            mock.borrow_mut().calls.clear();
        }
    }
}

impl fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsFunction")
            .field("name", &self.name)
            .field("mock", &self.mock.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_properties_are_shared() {
        let a = Value::object();
        let b = a.clone();
        a.set("x", Value::Number(1.0));
        assert_eq!(b.get("x").and_then(|v| v.as_number()), Some(1.0));
        assert!(a.ref_eq(&b));
    }

    #[test]
    fn test_fresh_objects_are_distinct() {
        assert!(!Value::object().ref_eq(&Value::object()));
    }

    #[test]
    fn test_from_json() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"name": "pkg", "count": 3, "tags": ["a", "b"]}"#).unwrap();
        let value = Value::from_json(&json);

        assert_eq!(value.get("name").and_then(|v| v.as_str().map(String::from)), Some("pkg".to_string()));
        assert_eq!(value.get("count").and_then(|v| v.as_number()), Some(3.0));
        match value.get("tags") {
            Some(Value::Array(items)) => assert_eq!(items.borrow().len(), 2),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn test_mock_function_records_calls() {
        let f = JsFunction::mock("m", None);
        assert_eq!(f.call_count(), 0);
        f.call(&[Value::Number(1.0)]);
        f.call(&[]);
        assert_eq!(f.call_count(), 2);
        f.mock_clear();
        assert_eq!(f.call_count(), 0);
    }

    #[test]
    fn test_plain_function_does_not_record() {
        let f = JsFunction::new("f", Some(Rc::new(|_: &[Value]| Value::Number(7.0))));
        assert!(!f.is_mock());
        assert_eq!(f.call(&[]).as_number(), Some(7.0));
        assert_eq!(f.call_count(), 0);
    }
}
