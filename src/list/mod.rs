//! Nested sequences and their flattening.
//!
//! A [`Nested`] value is either a plain item or a list of further nested values. [`expand`]
//! flattens such lists up to a given [`Depth`], [`flatten`] flattens everything.
//!
//! ```rust
//! use toolboks::{flatten, nested};
//! use toolboks::list::{Depth, expand_to};
//!
//! let values = nested![1, 2, 3, 4, [5, 6, [7, 8]]];
//! assert_eq!(expand_to(values.clone(), Depth::Levels(1)), nested![1, 2, 3, 4, 5, 6, [7, 8]]);
//! assert_eq!(toolboks::list::flatten(values), vec![1, 2, 3, 4, 5, 6, 7, 8]);
//! assert_eq!(flatten![[1, [2, 3]], 4], vec![1, 2, 3, 4]);
//! ```

use thiserror::Error;

/// Either a single item, or a list of nested values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Nested<T> {
    Item(T),
    List(Vec<Nested<T>>),
}

impl<T> Nested<T> {
    /// Returns `true` if `self` is a [`Nested::List`].
    pub fn is_list(&self) -> bool {
        matches!(self, Nested::List(_))
    }

    /// Consume `self`, collecting every item it holds depth-first, left-to-right.
    pub fn into_flat(self) -> Vec<T> {
        let mut flat = Vec::new();
        flatten_into(self, &mut flat);
        flat
    }
}

/// How many levels of nested lists [`expand_to`] should unpack.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub enum Depth {
    /// Unpack every level.
    #[default]
    Unlimited,
    /// Unpack this many levels. `Levels(0)` leaves nested lists untouched.
    Levels(u32),
}

/// Sentinel accepted by [`expand`] in place of [`Depth::Unlimited`].
pub const UNLIMITED: i64 = -1;

/// Errors produced by [`expand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ListError {
    /// Depth was below [`UNLIMITED`].
    #[error("invalid depth {0}, expected -1 or a non-negative number")]
    InvalidDepth(i64),
}

impl TryFrom<i64> for Depth {
    type Error = ListError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            UNLIMITED => Ok(Depth::Unlimited),
            levels if levels >= 0 => Ok(Depth::Levels(
                u32::try_from(levels).unwrap_or(u32::MAX),
            )),
            invalid => Err(ListError::InvalidDepth(invalid)),
        }
    }
}

/// Expand nested lists in `values`, recursing `depth` levels.
///
/// `depth` of [`UNLIMITED`] (`-1`) expands everything, `0` returns `values` unchanged, `n`
/// unpacks `n` levels and keeps deeper lists as nested elements.
///
/// # Errors
///
/// [`ListError::InvalidDepth`] if `depth < -1`.
pub fn expand<T>(values: Vec<Nested<T>>, depth: i64) -> Result<Vec<Nested<T>>, ListError> {
    let depth = Depth::try_from(depth)?;
    Ok(expand_to(values, depth))
}

/// Infallible variant of [`expand`], taking an already validated [`Depth`].
pub fn expand_to<T>(values: Vec<Nested<T>>, depth: Depth) -> Vec<Nested<T>> {
    let mut expanded = Vec::with_capacity(values.len());
    expand_into(values, depth, &mut expanded);
    expanded
}

fn expand_into<T>(values: Vec<Nested<T>>, depth: Depth, out: &mut Vec<Nested<T>>) {
    for value in values {
        match (value, depth) {
            (Nested::List(inner), Depth::Unlimited) => expand_into(inner, depth, out),
            (Nested::List(inner), Depth::Levels(levels)) if levels > 0 => {
                expand_into(inner, Depth::Levels(levels - 1), out)
            }
            (value, _) => out.push(value),
        }
    }
}

/// Flatten any number of items and (nested) lists into one list.
///
/// Each [`Nested::Item`] is appended as is, each [`Nested::List`] is fully expanded. See also
/// the [`flatten!`](crate::flatten) macro.
pub fn flatten<T>(values: impl IntoIterator<Item = Nested<T>>) -> Vec<T> {
    let mut flat = Vec::new();
    for value in values {
        flatten_into(value, &mut flat);
    }
    flat
}

fn flatten_into<T>(value: Nested<T>, out: &mut Vec<T>) {
    match value {
        Nested::Item(item) => out.push(item),
        Nested::List(inner) => {
            for value in inner {
                flatten_into(value, out);
            }
        }
    }
}

/// Build a `Vec<Nested<_>>` from list syntax: bracketed groups become [`Nested::List`], every
/// other element becomes [`Nested::Item`].
///
/// Each element must be a single token tree, so wrap compound expressions in parentheses:
/// `nested![(-1), [2, (x + 1)]]`.
#[macro_export]
macro_rules! nested {
    (@value [$($inner:tt)*]) => {
        $crate::list::Nested::List($crate::nested![$($inner)*])
    };
    (@value $value:expr) => {
        $crate::list::Nested::Item($value)
    };
    ($($value:tt),* $(,)?) => {
        vec![$($crate::nested!(@value $value)),*]
    };
}

/// Variadic [`flatten`](crate::list::flatten): `flatten![11, [22, [33]], 44] == vec![11, 22, 33, 44]`.
#[macro_export]
macro_rules! flatten {
    ($($value:tt),* $(,)?) => {
        $crate::list::flatten($crate::nested![$($value),*])
    };
}
