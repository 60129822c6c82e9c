use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// A shared, mutable slot holding a pointee.
///
/// Pointers are the only place a [`Value`] graph can close a cycle, so the
/// pointee lives behind `Rc<RefCell<_>>` and can be filled in after the
/// pointer to it has been handed out.
pub type Shared = Rc<RefCell<Value>>;

/// The five kinds of value the comparator distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Pointer,
    Sequence,
    Aggregate,
    Float,
    Scalar,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Pointer => "pointer",
            Category::Sequence => "sequence",
            Category::Aggregate => "aggregate",
            Category::Float => "float",
            Category::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

/// A named field of a [`Record`].
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

/// A fixed-shape aggregate: a struct, or a tuple with fields `0`, `1`, ...
#[derive(Debug, Clone)]
pub struct Record {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field, keeping declaration order.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }
}

/// Leaf values. All of these are compared exactly.
#[derive(Debug, Clone)]
pub enum Scalar {
    Unit,
    Bool(bool),
    Int(i128),
    UInt(u128),
    Char(char),
    Str(String),
    /// An enum variant. `fields` is empty for unit variants.
    Variant {
        ty: String,
        name: String,
        fields: Vec<Value>,
    },
    /// Map entries in key order.
    Map(Vec<(Value, Value)>),
    /// An error value, kept as its message.
    Error(String),
    /// Anything else, kept as its `Debug` rendering.
    Opaque(String),
}

/// A reflected value.
///
/// Built from ordinary Rust values through [`Reflect`](crate::Reflect), or
/// directly when a fixture needs a shape Rust types can't express (for
/// example a cyclic graph).
///
/// `Debug` prints the same form as `Display`, so cyclic values are safe to
/// format either way.
#[derive(Clone)]
pub enum Value {
    /// A nullable pointer. `None` is null.
    Pointer(Option<Shared>),
    Sequence(Vec<Value>),
    Aggregate(Record),
    Float(f64),
    Scalar(Scalar),
}

impl Value {
    pub const UNIT: Value = Value::Scalar(Scalar::Unit);
    pub const NULL: Value = Value::Pointer(None);

    pub fn category(&self) -> Category {
        match self {
            Value::Pointer(_) => Category::Pointer,
            Value::Sequence(_) => Category::Sequence,
            Value::Aggregate(_) => Category::Aggregate,
            Value::Float(_) => Category::Float,
            Value::Scalar(_) => Category::Scalar,
        }
    }

    /// Allocates a fresh pointee and points at it.
    pub fn pointer(pointee: Value) -> Self {
        Value::Pointer(Some(Rc::new(RefCell::new(pointee))))
    }

    /// Points at an existing slot, sharing it.
    pub fn pointer_to(slot: &Shared) -> Self {
        Value::Pointer(Some(Rc::clone(slot)))
    }

    pub fn int(value: impl Into<i128>) -> Self {
        Value::Scalar(Scalar::Int(value.into()))
    }

    pub fn uint(value: impl Into<u128>) -> Self {
        Value::Scalar(Scalar::UInt(value.into()))
    }

    pub fn str(value: impl Into<String>) -> Self {
        Value::Scalar(Scalar::Str(value.into()))
    }

    pub fn bool(value: bool) -> Self {
        Value::Scalar(Scalar::Bool(value))
    }

    pub fn variant(ty: impl Into<String>, name: impl Into<String>, fields: Vec<Value>) -> Self {
        Value::Scalar(Scalar::Variant {
            ty: ty.into(),
            name: name.into(),
            fields,
        })
    }

    pub fn error(err: &(dyn std::error::Error + '_)) -> Self {
        Value::Scalar(Scalar::Error(err.to_string()))
    }

    pub fn opaque(value: &impl fmt::Debug) -> Self {
        Value::Scalar(Scalar::Opaque(format!("{value:?}")))
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Aggregate(record) => Some(record),
            _ => None,
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Aggregate(record)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut open = HashSet::new();
        write_value(self, f, &mut open)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// `open` holds the pointees currently being printed; meeting one again means
// the graph loops back on itself.
fn write_value(
    value: &Value,
    f: &mut fmt::Formatter<'_>,
    open: &mut HashSet<*const RefCell<Value>>,
) -> fmt::Result {
    match value {
        Value::Pointer(None) => f.write_str("nil"),
        Value::Pointer(Some(slot)) => {
            let key = Rc::as_ptr(slot);
            if !open.insert(key) {
                return f.write_str("<cycle>");
            }
            f.write_str("&")?;
            let result = match slot.try_borrow() {
                Ok(pointee) => write_value(&pointee, f, open),
                Err(_) => f.write_str("<borrowed>"),
            };
            open.remove(&key);
            result
        }
        Value::Sequence(items) => {
            f.write_str("[")?;
            write_list(items.iter(), f, open)?;
            f.write_str("]")
        }
        Value::Aggregate(record) if record.name.is_empty() => {
            f.write_str("(")?;
            write_list(record.fields.iter().map(|field| &field.value), f, open)?;
            if record.fields.len() == 1 {
                f.write_str(",")?;
            }
            f.write_str(")")
        }
        Value::Aggregate(record) => {
            write!(f, "{} {{", record.name)?;
            for (i, field) in record.fields.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, " {}: ", field.name)?;
                write_value(&field.value, f, open)?;
            }
            if record.fields.is_empty() {
                f.write_str("}")
            } else {
                f.write_str(" }")
            }
        }
        Value::Float(x) => write!(f, "{x:?}"),
        Value::Scalar(scalar) => write_scalar(scalar, f, open),
    }
}

fn write_scalar(
    scalar: &Scalar,
    f: &mut fmt::Formatter<'_>,
    open: &mut HashSet<*const RefCell<Value>>,
) -> fmt::Result {
    match scalar {
        Scalar::Unit => f.write_str("()"),
        Scalar::Bool(b) => write!(f, "{b}"),
        Scalar::Int(i) => write!(f, "{i}"),
        Scalar::UInt(u) => write!(f, "{u}"),
        Scalar::Char(c) => write!(f, "{c:?}"),
        Scalar::Str(s) => write!(f, "{s:?}"),
        Scalar::Variant { ty, name, fields } => {
            write!(f, "{ty}::{name}")?;
            if fields.is_empty() {
                return Ok(());
            }
            f.write_str("(")?;
            write_list(fields.iter(), f, open)?;
            f.write_str(")")
        }
        Scalar::Map(entries) => {
            f.write_str("{")?;
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(key, f, open)?;
                f.write_str(": ")?;
                write_value(value, f, open)?;
            }
            f.write_str("}")
        }
        Scalar::Error(message) => write!(f, "error({message})"),
        Scalar::Opaque(repr) => f.write_str(repr),
    }
}

fn write_list<'a>(
    items: impl Iterator<Item = &'a Value>,
    f: &mut fmt::Formatter<'_>,
    open: &mut HashSet<*const RefCell<Value>>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_value(item, f, open)?;
    }
    Ok(())
}
