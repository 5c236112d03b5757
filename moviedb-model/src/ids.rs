use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, Visitor},
};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_any(NumericIdVisitor).map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Accepts integers and integral doubles. Documents written by other
/// MongoDB clients often store numbers as doubles.
struct NumericIdVisitor;

impl Visitor<'_> for NumericIdVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer identifier")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
        i64::try_from(value).map_err(|_| {
            E::invalid_value(de::Unexpected::Unsigned(value), &self)
        })
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<i64, E> {
        // i64::MAX as f64 rounds up to 2^63, which is already out of range.
        let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
        if value.is_finite() && value.fract() == 0.0 && in_range {
            Ok(value as i64)
        } else {
            Err(E::invalid_value(de::Unexpected::Float(value), &self))
        }
    }
}

numeric_id!(
    /// Movie identifier. Assigned by whoever submits the movie, never minted
    /// by the server.
    MovieID
);

numeric_id!(
    /// Actor identifier, minted sequentially by the allocator.
    ActorID
);

numeric_id!(
    /// Genre identifier, minted sequentially by the allocator.
    GenreID
);

/// Sequentially allocated identifiers.
pub trait SequentialId: Copy + Ord + fmt::Display + Send + Sync {
    /// Identifier handed out when a collection has no records yet.
    const FIRST: Self;

    fn successor(self) -> Self;
}

impl SequentialId for ActorID {
    const FIRST: Self = ActorID(1);

    fn successor(self) -> Self {
        ActorID(self.0 + 1)
    }
}

impl SequentialId for GenreID {
    const FIRST: Self = GenreID(1);

    fn successor(self) -> Self {
        GenreID(self.0 + 1)
    }
}
