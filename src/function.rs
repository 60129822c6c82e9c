//! Calling a function under test with a list of reflected arguments.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::HarnessError;
use crate::reflect::{FromValue, Reflect};
use crate::value::Value;

/// Declared number of inputs and outputs of a function under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub inputs: usize,
    pub outputs: usize,
}

/// A function's return value split into its outputs.
///
/// Tuples are multiple outputs, `()` is none, and any other type is a single
/// output.
pub trait Outputs {
    const ARITY: usize;

    fn into_values(self) -> Vec<Value>;
}

impl Outputs for () {
    const ARITY: usize = 0;

    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }
}

macro_rules! single_output {
    ($($t:ty),*) => {$(
        impl Outputs for $t {
            const ARITY: usize = 1;

            fn into_values(self) -> Vec<Value> {
                vec![self.to_value()]
            }
        }
    )*};
}

single_output!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, String,
    &'static str
);

impl Outputs for Value {
    const ARITY: usize = 1;

    fn into_values(self) -> Vec<Value> {
        vec![self]
    }
}

macro_rules! single_output_generic {
    ($(<$($p:ident),+> $t:ty),* $(,)?) => {$(
        impl<$($p: Reflect),+> Outputs for $t {
            const ARITY: usize = 1;

            fn into_values(self) -> Vec<Value> {
                vec![self.to_value()]
            }
        }
    )*};
}

single_output_generic!(
    <T> Vec<T>,
    <T> VecDeque<T>,
    <T> Option<T>,
    <T> Box<T>,
    <T> Rc<T>,
    <T> Arc<T>,
    <K, V> BTreeMap<K, V>,
    <K, V> HashMap<K, V>,
    <T, E> Result<T, E>,
);

impl<T: Reflect, const N: usize> Outputs for [T; N] {
    const ARITY: usize = 1;

    fn into_values(self) -> Vec<Value> {
        vec![self.to_value()]
    }
}

macro_rules! tuple_outputs {
    ($n:expr; $($name:ident $idx:tt),+) => {
        impl<$($name: Reflect),+> Outputs for ($($name,)+) {
            const ARITY: usize = $n;

            fn into_values(self) -> Vec<Value> {
                vec![$(self.$idx.to_value()),+]
            }
        }
    };
}

tuple_outputs!(1; A 0);
tuple_outputs!(2; A 0, B 1);
tuple_outputs!(3; A 0, B 1, C 2);
tuple_outputs!(4; A 0, B 1, C 2, D 3);
tuple_outputs!(5; A 0, B 1, C 2, D 3, E 4);
tuple_outputs!(6; A 0, B 1, C 2, D 3, E 4, F 5);

/// Something the runners can call with positional [`Value`] arguments.
///
/// `Args` only disambiguates the implementations; it is inferred from the
/// function's parameter list. Implemented for every `Fn` of up to six
/// parameters whose parameters implement [`FromValue`] and whose return type
/// implements [`Outputs`].
pub trait Function<Args> {
    fn signature(&self) -> Signature;

    fn invoke(&self, args: Vec<Value>) -> Result<Vec<Value>, HarnessError>;
}

fn next_arg<T: FromValue>(
    args: &mut impl Iterator<Item = Value>,
    position: &mut usize,
    declared: usize,
) -> Result<T, HarnessError> {
    let value = args.next().ok_or(HarnessError::InputArity {
        expected: declared,
        got: *position,
    })?;
    let arg = T::from_value(value).map_err(|source| HarnessError::Argument {
        position: *position,
        name: None,
        source,
    })?;
    *position += 1;
    Ok(arg)
}

macro_rules! one {
    ($x:ident) => {
        1usize
    };
}

macro_rules! impl_function {
    ($($arg:ident $var:ident),*) => {
        impl<Func, Ret, $($arg),*> Function<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Ret,
            $($arg: FromValue,)*
            Ret: Outputs,
        {
            fn signature(&self) -> Signature {
                Signature {
                    inputs: 0usize $(+ one!($arg))*,
                    outputs: Ret::ARITY,
                }
            }

            #[allow(unused_mut, unused_variables)]
            fn invoke(&self, args: Vec<Value>) -> Result<Vec<Value>, HarnessError> {
                let declared = self.signature().inputs;
                if args.len() != declared {
                    return Err(HarnessError::InputArity {
                        expected: declared,
                        got: args.len(),
                    });
                }
                let mut args = args.into_iter();
                let mut position = 0;
                $(let $var: $arg = next_arg(&mut args, &mut position, declared)?;)*
                Ok((self)($($var),*).into_values())
            }
        }
    };
}

impl_function!();
impl_function!(A a);
impl_function!(A a, B b);
impl_function!(A a, B b, C c);
impl_function!(A a, B b, C c, D d);
impl_function!(A a, B b, C c, D d, E e);
impl_function!(A a, B b, C c, D d, E e, F f);

/// Marker for [`DynFunction`]'s [`Function`] implementation.
#[derive(Debug)]
pub enum Dynamic {}

type Body<'f> = Box<dyn Fn(Vec<Value>) -> Vec<Value> + 'f>;

/// A function over [`Value`]s with an explicitly declared signature.
///
/// ```
/// use tabletest::{DynFunction, Function, Value};
///
/// let swap = DynFunction::new(2, 2, |mut args| {
///     args.swap(0, 1);
///     args
/// });
/// assert_eq!(swap.signature().inputs, 2);
/// let out = swap.invoke(vec![Value::int(1), Value::int(2)]).unwrap();
/// assert_eq!(out[0].to_string(), "2");
/// ```
pub struct DynFunction<'f> {
    signature: Signature,
    body: Body<'f>,
}

impl<'f> DynFunction<'f> {
    pub fn new(
        inputs: usize,
        outputs: usize,
        body: impl Fn(Vec<Value>) -> Vec<Value> + 'f,
    ) -> Self {
        Self {
            signature: Signature { inputs, outputs },
            body: Box::new(body),
        }
    }
}

impl fmt::Debug for DynFunction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynFunction")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl Function<Dynamic> for DynFunction<'_> {
    fn signature(&self) -> Signature {
        self.signature
    }

    fn invoke(&self, args: Vec<Value>) -> Result<Vec<Value>, HarnessError> {
        if args.len() != self.signature.inputs {
            return Err(HarnessError::InputArity {
                expected: self.signature.inputs,
                got: args.len(),
            });
        }
        Ok((self.body)(args))
    }
}
