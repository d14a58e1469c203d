//! Boxed value plumbing at the interception boundary.
//!
//! Arguments and return values cross the advice chain type-erased. Value
//! types and reference types alike are boxed on the way in; trampolines
//! downcast back to the declared type on the way out.
use crate::error::UnsupportedOperation;
use std::{any::Any, sync::Arc};

/// One boxed argument, in declared parameter order.
pub type ArgValue = Box<dyn Any + Send>;

/// A boxed method result.
pub type BoxedValue = Box<dyn Any + Send>;

/// A clonable, shareable value; the result form used by asynchronous tasks.
pub type SharedValue = Arc<dyn Any + Send + Sync>;

pub fn arg<T: Any + Send>(value: T) -> ArgValue {
    Box::new(value)
}

pub fn boxed<T: Any + Send>(value: T) -> BoxedValue {
    Box::new(value)
}

pub fn shared<T: Any + Send + Sync>(value: T) -> SharedValue {
    Arc::new(value)
}

/// Borrows the argument at `index` as `T`.
pub fn arg_ref<T: Any>(args: &[ArgValue], index: usize) -> Result<&T, UnsupportedOperation> {
    args.get(index)
        .and_then(|a| a.downcast_ref::<T>())
        .ok_or(UnsupportedOperation::TypeMismatch {
            expected: std::any::type_name::<T>(),
        })
}

/// Extracts an owned copy of the argument at `index`.
pub fn arg_get<T: Any + Clone>(args: &[ArgValue], index: usize) -> Result<T, UnsupportedOperation> {
    arg_ref::<T>(args, index).map(|v| v.clone())
}

pub fn unbox<T: Any>(value: BoxedValue) -> Result<T, UnsupportedOperation> {
    value
        .downcast::<T>()
        .map(|b| *b)
        .map_err(|_| UnsupportedOperation::TypeMismatch {
            expected: std::any::type_name::<T>(),
        })
}

/// Boxes a comma-separated argument list into a `Vec<ArgValue>`.
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::value::ArgValue>::new()
    };
    ($($a:expr),+ $(,)?) => {
        ::std::vec![$(::std::boxed::Box::new($a) as $crate::value::ArgValue),+]
    };
}
