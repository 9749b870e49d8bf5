//! Bind values carried next to generated SQL.
//!
//! Unlike a boxed `dyn ToSql`, a [`Value`] is a plain comparable enum, so two generated
//! queries can be checked for equal arguments and args can be logged or serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A positional bind value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// An integer, typically a row or owner ID.
    Integer(u64),
    /// A string.
    Text(String),
    /// A Unix timestamp in seconds.
    Timestamp(u64),
    /// SQL NULL.
    Null,
}

impl Value {
    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Integer(u64::from(v))
                }
            }
        )*
    };
}

impl_from_unsigned!(u8, u16, u32, u64);

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    /// Timestamps before the epoch saturate to `0`.
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(u64::try_from(v.timestamp()).unwrap_or(0))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(feature = "postgres")]
mod pg {
    use super::Value;
    use bytes::BytesMut;
    use std::error::Error;
    use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

    impl ToSql for Value {
        fn to_sql(
            &self,
            ty: &Type,
            out: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
            match self {
                Value::Integer(v) | Value::Timestamp(v) => {
                    let v = i64::try_from(*v)?;
                    match *ty {
                        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
                        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
                        _ => v.to_sql(ty, out),
                    }
                }
                Value::Text(s) => s.to_sql(ty, out),
                Value::Null => Ok(IsNull::Yes),
            }
        }

        fn accepts(ty: &Type) -> bool {
            matches!(
                *ty,
                Type::INT2 | Type::INT4 | Type::INT8 | Type::TEXT | Type::VARCHAR | Type::BPCHAR
            )
        }

        to_sql_checked!();
    }
}
