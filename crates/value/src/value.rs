use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use framerelay_protocol::SerializedValue;
use framerelay_protocol::constants::{ANONYMOUS_FUNCTION, ERROR_TYPE_KEY, ERROR_TYPE_MARKER};

/// Identity of a shared array or object (its allocation address).
pub type RefId = usize;

/// Reads a computed property. Reading may throw.
pub type Getter = Arc<dyn Fn() -> Result<Value, Thrown> + Send + Sync>;

/// A thrown value.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .0.to_display_string())]
pub struct Thrown(pub Value);

impl Thrown {
    /// Throws an error of the given name.
    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Thrown(Value::Error(Arc::new(ErrorValue::capture(name, message))))
    }

    /// Throws a plain `Error`.
    pub fn message(message: impl Into<String>) -> Self {
        Thrown::error(ERROR_TYPE_MARKER, message)
    }
}

/// An error object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl ErrorValue {
    /// An error with no stack text.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    /// An error whose stack holds only the header line, as produced when
    /// an error is constructed outside any script frame.
    pub fn capture(name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::new(name, message);
        error.stack = Some(error.header());
        error
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// `Name: message`, collapsing to whichever part is non-empty.
    pub fn header(&self) -> String {
        match (self.name.is_empty(), self.message.is_empty()) {
            (true, _) => self.message.clone(),
            (false, true) => self.name.clone(),
            (false, false) => format!("{}: {}", self.name, self.message),
        }
    }
}

/// A callable. Only its name is observable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionValue {
    pub name: String,
}

impl FunctionValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The name, or `anonymous` when unnamed.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            ANONYMOUS_FUNCTION
        } else {
            &self.name
        }
    }
}

/// A value of a kind the relay has no dedicated handling for (dates,
/// typed arrays, platform objects...).
pub trait HostValue: Send + Sync + fmt::Debug {
    /// JSON text of the value, as a text encoder would produce it.
    fn to_json_text(&self) -> Result<String, Thrown>;

    /// Display text, used when there is no JSON form.
    fn display(&self) -> String;
}

/// A runtime value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    BigInt(i128),
    /// A unique token with an optional description.
    Symbol(Option<String>),
    Function(FunctionValue),
    Error(Arc<ErrorValue>),
    Array(ArrayRef),
    Object(ObjectRef),
    Host(Arc<dyn HostValue>),
}

impl Value {
    pub fn function(name: impl Into<String>) -> Self {
        Value::Function(FunctionValue::new(name))
    }

    pub fn error(error: ErrorValue) -> Self {
        Value::Error(Arc::new(error))
    }

    /// A fresh object holding the given data properties.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(ObjectRef::from_entries(entries))
    }

    /// A fresh array.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(ArrayRef::from_items(items))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Boolean coercion.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::BigInt(n) => *n != 0,
            _ => true,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ErrorValue> for Value {
    fn from(e: ErrorValue) -> Self {
        Value::error(e)
    }
}

/// Rehydrates a received value the way a structured clone delivers it:
/// error records arrive as plain objects.
impl From<&SerializedValue> for Value {
    fn from(value: &SerializedValue) -> Self {
        match value {
            SerializedValue::Undefined => Value::Undefined,
            SerializedValue::Null => Value::Null,
            SerializedValue::Bool(b) => Value::Bool(*b),
            SerializedValue::Number(n) => Value::Number(*n),
            SerializedValue::String(s) => Value::String(s.clone()),
            SerializedValue::Error(e) => {
                let record = ObjectRef::new();
                record.set(ERROR_TYPE_KEY, Value::from(ERROR_TYPE_MARKER));
                record.set("name", Value::from(e.name.as_str()));
                record.set("message", Value::from(e.message.as_str()));
                if let Some(stack) = &e.stack {
                    record.set("stack", Value::from(stack.as_str()));
                }
                Value::Object(record)
            }
            SerializedValue::Array(items) => Value::array(items.iter().map(Value::from)),
            SerializedValue::Object(fields) => {
                Value::object(fields.iter().map(|(k, v)| (k.as_str(), Value::from(v))))
            }
        }
    }
}

/// An own property of an object.
#[derive(Clone)]
pub enum Property {
    Data(Value),
    Getter(Getter),
}

impl Property {
    /// Current value of the property.
    pub fn read(&self) -> Result<Value, Thrown> {
        match self {
            Property::Data(v) => Ok(v.clone()),
            Property::Getter(get) => get(),
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Data(v) => f.debug_tuple("Data").field(v).finish(),
            Property::Getter(_) => f.write_str("Getter"),
        }
    }
}

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared, mutable object with identity. Own keys keep insertion order.
#[derive(Clone, Default)]
pub struct ObjectRef(Arc<Mutex<Vec<(String, Property)>>>);

impl ObjectRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        let obj = Self::new();
        for (k, v) in entries {
            obj.set(k, v);
        }
        obj
    }

    /// Sets a data property, replacing any existing one of that key.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.define(key.into(), Property::Data(value));
    }

    /// Defines a computed property.
    pub fn define_getter<F>(&self, key: impl Into<String>, getter: F)
    where
        F: Fn() -> Result<Value, Thrown> + Send + Sync + 'static,
    {
        self.define(key.into(), Property::Getter(Arc::new(getter)));
    }

    fn define(&self, key: String, property: Property) {
        let mut props = locked(&self.0);
        match props.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = property,
            None => props.push((key, property)),
        }
    }

    /// Reads a property; missing keys read as `Undefined`.
    pub fn get(&self, key: &str) -> Result<Value, Thrown> {
        let property = locked(&self.0)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, p)| p.clone());
        match property {
            Some(p) => p.read(),
            None => Ok(Value::Undefined),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        locked(&self.0).iter().any(|(k, _)| k == key)
    }

    pub fn remove(&self, key: &str) {
        locked(&self.0).retain(|(k, _)| k != key);
    }

    pub fn keys(&self) -> Vec<String> {
        locked(&self.0).iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        locked(&self.0).len()
    }

    pub fn is_empty(&self) -> bool {
        locked(&self.0).is_empty()
    }

    /// Copy of the own properties. Getters are not invoked.
    pub fn snapshot(&self) -> Vec<(String, Property)> {
        locked(&self.0).clone()
    }

    pub fn id(&self) -> RefId {
        Arc::as_ptr(&self.0) as *const () as RefId
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef(#{:x})", self.id())
    }
}

/// Shared, mutable array with identity.
#[derive(Clone, Default)]
pub struct ArrayRef(Arc<Mutex<Vec<Value>>>);

impl ArrayRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = Value>) -> Self {
        Self(Arc::new(Mutex::new(items.into_iter().collect())))
    }

    pub fn push(&self, value: Value) {
        locked(&self.0).push(value);
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        locked(&self.0).get(index).cloned()
    }

    pub fn len(&self) -> usize {
        locked(&self.0).len()
    }

    pub fn is_empty(&self) -> bool {
        locked(&self.0).is_empty()
    }

    pub fn snapshot(&self) -> Vec<Value> {
        locked(&self.0).clone()
    }

    pub fn id(&self) -> RefId {
        Arc::as_ptr(&self.0) as *const () as RefId
    }

    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArrayRef(#{:x})", self.id())
    }
}
