//! Invocation handlers bound to a service instance

use std::any::{Any, type_name};
use std::marker::PhantomData;

use rockrpc_json::conversion::{AnyBox, short_type_name};

use crate::error::InvokeError;

/// Positional argument values handed to a handler, consumed in order
#[derive(Debug)]
pub struct Arguments {
    values: std::vec::IntoIter<AnyBox>,
}

impl Arguments {
    pub fn new(values: Vec<AnyBox>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }

    /// Number of values not yet taken
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Take the next argument as a `T`
    pub fn take<T: Any>(&mut self, name: &str) -> Result<T, InvokeError> {
        let value = self
            .values
            .next()
            .ok_or_else(|| InvokeError::invocation(format!("Missing argument '{name}'.")))?;
        value.downcast::<T>().map(|value| *value).map_err(|_| {
            InvokeError::invocation(format!(
                "Argument '{name}' is not of type {}.",
                short_type_name(type_name::<T>())
            ))
        })
    }
}

/// Calls one service method
pub trait MethodHandler: Send + Sync {
    fn invoke(&self, service: &dyn Any, args: Arguments) -> Result<AnyBox, InvokeError>;
}

/// [`MethodHandler`] over a closure taking the concrete service type
pub struct FnHandler<S, F> {
    f: F,
    _service: PhantomData<fn(&S)>,
}

impl<S, F> FnHandler<S, F>
where
    S: Any,
    F: Fn(&S, &mut Arguments) -> Result<AnyBox, InvokeError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _service: PhantomData,
        }
    }
}

impl<S, F> MethodHandler for FnHandler<S, F>
where
    S: Any,
    F: Fn(&S, &mut Arguments) -> Result<AnyBox, InvokeError> + Send + Sync,
{
    fn invoke(&self, service: &dyn Any, mut args: Arguments) -> Result<AnyBox, InvokeError> {
        let service = service.downcast_ref::<S>().ok_or_else(|| {
            InvokeError::invocation(format!(
                "The method cannot be invoked on an instance other than {}.",
                short_type_name(type_name::<S>())
            ))
        })?;
        (self.f)(service, &mut args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        step: i32,
    }

    fn add_step() -> FnHandler<Counter, impl Fn(&Counter, &mut Arguments) -> Result<AnyBox, InvokeError> + Send + Sync> {
        FnHandler::new(|service: &Counter, args: &mut Arguments| {
            let value = args.take::<i32>("value")?;
            Ok(Box::new(value + service.step) as AnyBox)
        })
    }

    #[test]
    fn test_take_in_order() {
        let mut args = Arguments::new(vec![Box::new(1_i32) as AnyBox, Box::new("x".to_string())]);
        assert_eq!(args.remaining(), 2);
        assert_eq!(args.take::<i32>("a").unwrap(), 1);
        assert_eq!(args.take::<String>("b").unwrap(), "x");
        assert!(matches!(
            args.take::<i32>("c"),
            Err(InvokeError::Invocation(message)) if message == "Missing argument 'c'."
        ));
    }

    #[test]
    fn test_take_wrong_type() {
        let mut args = Arguments::new(vec![Box::new(1_i64) as AnyBox]);
        let err = args.take::<String>("name").unwrap_err();
        assert_eq!(err.to_string(), "Argument 'name' is not of type String.");
    }

    #[test]
    fn test_fn_handler_invokes_closure() {
        let handler = add_step();
        let counter = Counter { step: 10 };
        let result = handler
            .invoke(&counter, Arguments::new(vec![Box::new(5_i32) as AnyBox]))
            .unwrap();
        assert_eq!(*result.downcast::<i32>().unwrap(), 15);
    }

    #[test]
    fn test_fn_handler_rejects_other_service() {
        let handler = add_step();
        let err = handler
            .invoke(&"not a counter", Arguments::new(vec![]))
            .unwrap_err();
        assert!(matches!(err, InvokeError::Invocation(_)));
    }
}
