//! Closed-union type dispatch for loosely-typed callers.
//!
//! # Responsibility
//! - Let one strongly-typed writer accept values of a closed record union.
//! - Reject union values of another variant with `UnsupportedType`.
//!
//! # Invariants
//! - Narrowing happens before any backend access.
//! - Every type narrows to itself, so typed callers pay nothing.

use crate::io::error::{DataError, DataResult};
use std::any::type_name;

/// Value that may hold an `E`.
pub trait Variant<E>: Sized {
    /// Type name of the value actually held, for diagnostics.
    fn variant_name(&self) -> &'static str;

    /// Extracts the `E`, or hands the value back when it holds another type.
    fn narrow(self) -> Result<E, Self>;
}

impl<E> Variant<E> for E {
    fn variant_name(&self) -> &'static str {
        type_name::<E>()
    }

    fn narrow(self) -> Result<E, Self> {
        Ok(self)
    }
}

/// Narrows one record or fails with `UnsupportedType`.
pub fn narrow<E, R: Variant<E>>(record: R) -> DataResult<E> {
    record.narrow().map_err(|rejected| DataError::UnsupportedType {
        expected: type_name::<E>(),
        found: rejected.variant_name(),
    })
}

/// Narrows a whole batch; the first mismatch fails the batch.
pub fn narrow_all<E, R: Variant<E>>(records: Vec<R>) -> DataResult<Vec<E>> {
    records.into_iter().map(narrow).collect()
}

/// Declares a closed union over entity types.
///
/// Generates the enum, a `From` conversion per variant (so readers can
/// widen into the union) and a [`Variant`] impl per variant (so writers can
/// narrow out of it).
///
/// ```
/// use dataio_core::entity_union;
///
/// #[derive(Debug, Clone, PartialEq)]
/// pub struct Invoice(pub u32);
/// #[derive(Debug, Clone, PartialEq)]
/// pub struct Refund(pub u32);
///
/// entity_union! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub enum Ledger {
///         Invoice(Invoice),
///         Refund(Refund),
///     }
/// }
///
/// let entry: Ledger = Invoice(7).into();
/// assert_eq!(entry.type_label(), std::any::type_name::<Invoice>());
/// ```
#[macro_export]
macro_rules! entity_union {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident($ty:ty)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($variant($ty)),+
        }

        impl $name {
            /// Type name of the entity held by this value.
            pub fn type_label(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => ::std::any::type_name::<$ty>()),+
                }
            }
        }

        $(
            impl ::std::convert::From<$ty> for $name {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }

            impl $crate::io::dispatch::Variant<$ty> for $name {
                fn variant_name(&self) -> &'static str {
                    $name::type_label(self)
                }

                #[allow(unreachable_patterns)]
                fn narrow(self) -> ::std::result::Result<$ty, Self> {
                    match self {
                        Self::$variant(value) => Ok(value),
                        other => Err(other),
                    }
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::{narrow, narrow_all};
    use crate::io::error::DataError;

    #[derive(Debug, Clone, PartialEq)]
    pub struct Invoice(u32);

    #[derive(Debug, Clone, PartialEq)]
    pub struct Refund(u32);

    crate::entity_union! {
        #[derive(Debug, Clone, PartialEq)]
        pub enum Ledger {
            Invoice(Invoice),
            Refund(Refund),
        }
    }

    #[test]
    fn plain_values_narrow_to_themselves() {
        let invoice: Invoice = narrow(Invoice(1)).unwrap();
        assert_eq!(invoice, Invoice(1));
    }

    #[test]
    fn matching_union_variant_narrows() {
        let invoice: Invoice = narrow(Ledger::from(Invoice(4))).unwrap();
        assert_eq!(invoice, Invoice(4));
    }

    #[test]
    fn foreign_variant_is_rejected_with_both_type_names() {
        let err = narrow::<Invoice, _>(Ledger::Refund(Refund(2))).unwrap_err();
        match err {
            DataError::UnsupportedType { expected, found } => {
                assert!(expected.ends_with("Invoice"));
                assert!(found.ends_with("Refund"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn one_foreign_variant_fails_the_whole_batch() {
        let batch = vec![Ledger::Invoice(Invoice(1)), Ledger::Refund(Refund(2))];
        let err = narrow_all::<Invoice, _>(batch).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedType { .. }));
    }
}
