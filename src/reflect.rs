//! Lowering Rust values into [`Value`] and back.
//!
//! Rust has no runtime reflection, so every type that takes part in a table
//! test says how it maps onto the tagged union: scalars stay scalars, floats
//! get their own category, collections become sequences, structs and tuples
//! become aggregates, and owning or shared pointers (including `Option`)
//! become nullable pointers.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::Hash;
use std::rc::{self, Rc};
use std::sync::{self, Arc};

use crate::error::ConversionError;
use crate::value::{Category, Record, Scalar, Shared, Value};

/// Conversion of a Rust value into a [`Value`].
pub trait Reflect {
    fn reflect(&self, cx: &mut Reflector) -> Value;

    /// Reflects `self` with a fresh [`Reflector`].
    fn to_value(&self) -> Value {
        self.reflect(&mut Reflector::default())
    }
}

/// Per-conversion state.
///
/// Shared pointers are memoised by address, so two `Rc`s to the same
/// allocation reflect to two pointers to the same [`Shared`] slot, and a
/// reference cycle reflects to a cycle instead of recursing forever.
#[derive(Default)]
pub struct Reflector {
    seen: HashMap<usize, Shared>,
}

impl Reflector {
    /// Reflects the pointee at `addr` once; later calls with the same address
    /// point at the same slot. The slot is registered before `build` runs.
    pub fn shared(&mut self, addr: usize, build: impl FnOnce(&mut Self) -> Value) -> Value {
        if let Some(slot) = self.seen.get(&addr) {
            return Value::pointer_to(slot);
        }
        let slot = Rc::new(RefCell::new(Value::UNIT));
        self.seen.insert(addr, Rc::clone(&slot));
        let pointee = build(self);
        *slot.borrow_mut() = pointee;
        Value::Pointer(Some(slot))
    }
}

/// Conversion of a [`Value`] back into a Rust value, used to pass table
/// inputs to the function under test.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

impl Reflect for Value {
    fn reflect(&self, _cx: &mut Reflector) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

fn scalar_type(expected: &'static str, found: &Value) -> ConversionError {
    ConversionError::Type {
        expected,
        found: found.to_string(),
    }
}

fn category(expected: Category, found: &Value) -> ConversionError {
    ConversionError::Category {
        expected,
        found: found.category(),
    }
}

macro_rules! reflect_signed {
    ($($t:ty),*) => {$(
        impl Reflect for $t {
            fn reflect(&self, _cx: &mut Reflector) -> Value {
                Value::Scalar(Scalar::Int(*self as i128))
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self, ConversionError> {
                let wide = match value {
                    Value::Scalar(Scalar::Int(i)) => i,
                    Value::Scalar(Scalar::UInt(u)) => {
                        i128::try_from(u).map_err(|_| ConversionError::OutOfRange {
                            value: u.to_string(),
                            target: stringify!($t),
                        })?
                    }
                    other => return Err(scalar_type(stringify!($t), &other)),
                };
                <$t>::try_from(wide).map_err(|_| ConversionError::OutOfRange {
                    value: wide.to_string(),
                    target: stringify!($t),
                })
            }
        }
    )*};
}

macro_rules! reflect_unsigned {
    ($($t:ty),*) => {$(
        impl Reflect for $t {
            fn reflect(&self, _cx: &mut Reflector) -> Value {
                Value::Scalar(Scalar::UInt(*self as u128))
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self, ConversionError> {
                let wide = match value {
                    Value::Scalar(Scalar::UInt(u)) => u,
                    Value::Scalar(Scalar::Int(i)) => {
                        u128::try_from(i).map_err(|_| ConversionError::OutOfRange {
                            value: i.to_string(),
                            target: stringify!($t),
                        })?
                    }
                    other => return Err(scalar_type(stringify!($t), &other)),
                };
                <$t>::try_from(wide).map_err(|_| ConversionError::OutOfRange {
                    value: wide.to_string(),
                    target: stringify!($t),
                })
            }
        }
    )*};
}

reflect_signed!(i8, i16, i32, i64, i128, isize);
reflect_unsigned!(u8, u16, u32, u64, u128, usize);

impl Reflect for f64 {
    fn reflect(&self, _cx: &mut Reflector) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(x) => Ok(x),
            other => Err(category(Category::Float, &other)),
        }
    }
}

impl Reflect for f32 {
    fn reflect(&self, _cx: &mut Reflector) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl Reflect for bool {
    fn reflect(&self, _cx: &mut Reflector) -> Value {
        Value::Scalar(Scalar::Bool(*self))
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Scalar(Scalar::Bool(b)) => Ok(b),
            other => Err(scalar_type("bool", &other)),
        }
    }
}

impl Reflect for char {
    fn reflect(&self, _cx: &mut Reflector) -> Value {
        Value::Scalar(Scalar::Char(*self))
    }
}

impl FromValue for char {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Scalar(Scalar::Char(c)) => Ok(c),
            other => Err(scalar_type("char", &other)),
        }
    }
}

impl Reflect for () {
    fn reflect(&self, _cx: &mut Reflector) -> Value {
        Value::UNIT
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Scalar(Scalar::Unit) => Ok(()),
            other => Err(scalar_type("()", &other)),
        }
    }
}

impl Reflect for str {
    fn reflect(&self, _cx: &mut Reflector) -> Value {
        Value::Scalar(Scalar::Str(self.to_owned()))
    }
}

impl Reflect for String {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        self.as_str().reflect(cx)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Scalar(Scalar::Str(s)) => Ok(s),
            other => Err(scalar_type("string", &other)),
        }
    }
}

impl<T: Reflect + ?Sized> Reflect for &T {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        (**self).reflect(cx)
    }
}

impl<T: Reflect> Reflect for [T] {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        Value::Sequence(self.iter().map(|item| item.reflect(cx)).collect())
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        self.as_slice().reflect(cx)
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        self.as_slice().reflect(cx)
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        Value::Sequence(self.iter().map(|item| item.reflect(cx)).collect())
    }
}

fn sequence<T: FromValue>(
    value: Value,
) -> Result<impl Iterator<Item = Result<T, ConversionError>>, ConversionError> {
    match value {
        Value::Sequence(items) => Ok(items.into_iter().map(T::from_value)),
        other => Err(category(Category::Sequence, &other)),
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        sequence(value)?.collect()
    }
}

impl<T: FromValue> FromValue for VecDeque<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        sequence(value)?.collect()
    }
}

impl<T: FromValue, const N: usize> FromValue for [T; N] {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        let items: Vec<T> = sequence(value)?.collect::<Result<_, _>>()?;
        let len = items.len();
        items.try_into().map_err(|_| ConversionError::Type {
            expected: "array of fixed length",
            found: format!("sequence of length {len}"),
        })
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        match self {
            Some(inner) => Value::pointer(inner.reflect(cx)),
            None => Value::NULL,
        }
    }
}

fn deref(value: Value) -> Result<Option<Value>, ConversionError> {
    match value {
        Value::Pointer(None) => Ok(None),
        Value::Pointer(Some(slot)) => {
            let pointee = slot.borrow().clone();
            Ok(Some(pointee))
        }
        other => Err(category(Category::Pointer, &other)),
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        deref(value)?.map(T::from_value).transpose()
    }
}

impl<T: Reflect + ?Sized> Reflect for Box<T> {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        Value::pointer((**self).reflect(cx))
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match deref(value)? {
            Some(pointee) => T::from_value(pointee).map(Box::new),
            None => Err(ConversionError::Type {
                expected: "non-null pointer",
                found: "nil".to_owned(),
            }),
        }
    }
}

impl<T: Reflect + ?Sized> Reflect for Rc<T> {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        let addr = Rc::as_ptr(self).cast::<()>() as usize;
        cx.shared(addr, |cx| (**self).reflect(cx))
    }
}

impl<T: Reflect + ?Sized> Reflect for Arc<T> {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        let addr = Arc::as_ptr(self).cast::<()>() as usize;
        cx.shared(addr, |cx| (**self).reflect(cx))
    }
}

impl<T: Reflect> Reflect for rc::Weak<T> {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        match self.upgrade() {
            Some(strong) => strong.reflect(cx),
            None => Value::NULL,
        }
    }
}

impl<T: Reflect> Reflect for sync::Weak<T> {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        match self.upgrade() {
            Some(strong) => strong.reflect(cx),
            None => Value::NULL,
        }
    }
}

impl<T: Reflect + ?Sized> Reflect for RefCell<T> {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        match self.try_borrow() {
            Ok(inner) => inner.reflect(cx),
            Err(_) => Value::Scalar(Scalar::Opaque("<borrowed>".to_owned())),
        }
    }
}

impl<T: Reflect, E: Reflect> Reflect for Result<T, E> {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        match self {
            Ok(value) => Value::variant("Result", "Ok", vec![value.reflect(cx)]),
            Err(err) => Value::variant("Result", "Err", vec![err.reflect(cx)]),
        }
    }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        let entries = self
            .iter()
            .map(|(k, v)| (k.reflect(cx), v.reflect(cx)))
            .collect();
        Value::Scalar(Scalar::Map(entries))
    }
}

impl<K: Reflect, V: Reflect, S> Reflect for HashMap<K, V, S> {
    fn reflect(&self, cx: &mut Reflector) -> Value {
        let mut entries: Vec<(String, Value, Value)> = self
            .iter()
            .map(|(k, v)| {
                let key = k.reflect(cx);
                (key.to_string(), key, v.reflect(cx))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let entries = entries.into_iter().map(|(_, k, v)| (k, v)).collect();
        Value::Scalar(Scalar::Map(entries))
    }
}

fn map_entries<K: FromValue, V: FromValue>(
    value: Value,
) -> Result<impl Iterator<Item = Result<(K, V), ConversionError>>, ConversionError> {
    match value {
        Value::Scalar(Scalar::Map(entries)) => Ok(entries
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))),
        other => Err(scalar_type("map", &other)),
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        map_entries(value)?.collect()
    }
}

impl<K: FromValue + Eq + Hash, V: FromValue> FromValue for HashMap<K, V> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        map_entries(value)?.collect()
    }
}

/// Takes the field called `name` out of a record, for `FromValue` impls of
/// user structs.
pub fn take_field<T: FromValue>(record: &mut Record, name: &str) -> Result<T, ConversionError> {
    let index = record
        .fields
        .iter()
        .position(|field| field.name == name)
        .ok_or_else(|| ConversionError::Missing(name.to_owned()))?;
    let field = record.fields.remove(index);
    T::from_value(field.value).map_err(|source| ConversionError::Field {
        field: name.to_owned(),
        source: Box::new(source),
    })
}

/// Unwraps an aggregate, for `FromValue` impls of user structs.
pub fn expect_record(value: Value) -> Result<Record, ConversionError> {
    match value {
        Value::Aggregate(record) => Ok(record),
        other => Err(category(Category::Aggregate, &other)),
    }
}

macro_rules! reflect_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: Reflect),+> Reflect for ($($name,)+) {
            fn reflect(&self, cx: &mut Reflector) -> Value {
                Record::new("")
                    $(.field(stringify!($idx), self.$idx.reflect(cx)))+
                    .into()
            }
        }

        impl<$($name: FromValue),+> FromValue for ($($name,)+) {
            fn from_value(value: Value) -> Result<Self, ConversionError> {
                let mut record = expect_record(value)?;
                Ok(($(take_field::<$name>(&mut record, stringify!($idx))?,)+))
            }
        }
    };
}

reflect_tuple!(A 0);
reflect_tuple!(A 0, B 1);
reflect_tuple!(A 0, B 1, C 2);
reflect_tuple!(A 0, B 1, C 2, D 3);
reflect_tuple!(A 0, B 1, C 2, D 3, E 4);
reflect_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);

/// Implements [`Reflect`], [`FromValue`] and single-output
/// [`Outputs`](crate::Outputs) for a struct with named fields.
///
/// The `@reflect` form implements only [`Reflect`], for structs whose fields
/// can be reflected but not rebuilt, such as `Rc` links in a cyclic graph.
///
/// ```
/// use tabletest::{reflect_record, Reflect, Value};
///
/// #[derive(Debug, Clone)]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
/// reflect_record!(Point { x, y });
///
/// let value = Point { x: 1.0, y: 2.0 }.to_value();
/// assert_eq!(value.to_string(), "Point { x: 1.0, y: 2.0 }");
///
/// struct Link {
///     weight: f64,
///     next: Option<std::rc::Rc<Link>>,
/// }
/// reflect_record!(@reflect Link { weight, next });
///
/// let tail = std::rc::Rc::new(Link { weight: 0.5, next: None });
/// let head = Link { weight: 1.0, next: Some(tail) };
/// assert_eq!(
///     head.to_value().to_string(),
///     "Link { weight: 1.0, next: &&Link { weight: 0.5, next: nil } }"
/// );
/// ```
#[macro_export]
macro_rules! reflect_record {
    (@reflect $ty:ident { $($field:ident),* $(,)? }) => {
        impl $crate::Reflect for $ty {
            fn reflect(&self, cx: &mut $crate::Reflector) -> $crate::Value {
                $crate::Record::new(stringify!($ty))
                    $(.field(stringify!($field), $crate::Reflect::reflect(&self.$field, cx)))*
                    .into()
            }
        }
    };
    ($ty:ident { $($field:ident),* $(,)? }) => {
        $crate::reflect_record!(@reflect $ty { $($field),* });

        impl $crate::FromValue for $ty {
            fn from_value(value: $crate::Value) -> ::std::result::Result<Self, $crate::ConversionError> {
                #[allow(unused_mut, unused_variables)]
                let mut record = $crate::reflect::expect_record(value)?;
                Ok($ty {
                    $($field: $crate::reflect::take_field(&mut record, stringify!($field))?,)*
                })
            }
        }

        impl $crate::Outputs for $ty {
            const ARITY: usize = 1;

            fn into_values(self) -> ::std::vec::Vec<$crate::Value> {
                vec![$crate::Reflect::to_value(&self)]
            }
        }
    };
}
