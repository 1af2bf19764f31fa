//! Static traversal of argument records.
//!
//! Argument records declare which of their fields can hold text. The
//! reference resolver visits exactly those, skipping fields that were never
//! set.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::str::FromStr;

/// Visits every present string leaf of a value.
pub trait Walk {
    fn walk_strings<'a>(&'a mut self, out: &mut Vec<&'a mut String>);

    /// Collect the string leaves into a vector.
    fn strings_mut(&mut self) -> Vec<&mut String> {
        let mut out = Vec::new();
        self.walk_strings(&mut out);
        out
    }
}

impl Walk for String {
    fn walk_strings<'a>(&'a mut self, out: &mut Vec<&'a mut String>) {
        out.push(self);
    }
}

impl<T: Walk> Walk for Option<T> {
    fn walk_strings<'a>(&'a mut self, out: &mut Vec<&'a mut String>) {
        if let Some(inner) = self {
            inner.walk_strings(out);
        }
    }
}

impl<T: Walk> Walk for Vec<T> {
    fn walk_strings<'a>(&'a mut self, out: &mut Vec<&'a mut String>) {
        for item in self {
            item.walk_strings(out);
        }
    }
}

impl<T: Walk> Walk for Box<T> {
    fn walk_strings<'a>(&'a mut self, out: &mut Vec<&'a mut String>) {
        (**self).walk_strings(out);
    }
}

impl Walk for Value {
    fn walk_strings<'a>(&'a mut self, out: &mut Vec<&'a mut String>) {
        match self {
            Value::String(s) => out.push(s),
            Value::Array(items) => items.walk_strings(out),
            Value::Object(map) => {
                for (_, value) in map.iter_mut() {
                    value.walk_strings(out);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}

macro_rules! walk_nothing {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Walk for $ty {
                fn walk_strings<'a>(&'a mut self, _out: &mut Vec<&'a mut String>) {}
            }
        )*
    };
}

walk_nothing!(bool, i32, i64, u16, u32, u64, f64);

/// Implement [`Walk`] for a record by listing its fields.
///
/// ```ignore
/// impl_walk!(ProjectArgs { name, public, registry_id });
/// ```
#[macro_export]
macro_rules! impl_walk {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::walk::Walk for $ty {
            fn walk_strings<'a>(&'a mut self, out: &mut Vec<&'a mut String>) {
                $( $crate::walk::Walk::walk_strings(&mut self.$field, out); )*
            }
        }
    };
}

/// A typed argument that may instead hold a reference expression.
///
/// Once resolved, an expression that parses as `T` is sent to the provider
/// as `T`.
#[derive(Debug, Clone, PartialEq)]
pub enum Input<T> {
    Value(T),
    Expr(String),
}

impl<T> Walk for Input<T> {
    fn walk_strings<'a>(&'a mut self, out: &mut Vec<&'a mut String>) {
        if let Input::Expr(expr) = self {
            out.push(expr);
        }
    }
}

impl<T: Serialize + FromStr> Serialize for Input<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Input::Value(v) => v.serialize(serializer),
            Input::Expr(e) => match e.trim().parse::<T>() {
                Ok(v) => v.serialize(serializer),
                Err(_) => e.serialize(serializer),
            },
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Input<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Value(T),
            Expr(String),
        }

        Ok(match Raw::<T>::deserialize(deserializer)? {
            Raw::Value(v) => Input::Value(v),
            Raw::Expr(e) => Input::Expr(e),
        })
    }
}
