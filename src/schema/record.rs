use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use super::{BoundField, FieldKey, Schema, Value};
use crate::buffer::ByteWindow;
use crate::error::{Error, Result};

/// Decoded values bound to the schema that produced them.
///
/// Values are positional: `values()[i]` belongs to `schema().fields()[i]`.
#[derive(Clone)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Record {
    /// Bind `values` to `schema`. Fails if the counts differ.
    pub fn new(schema: Arc<Schema>, values: Vec<Value>) -> Result<Self> {
        if values.len() != schema.len() {
            return Err(Error::FieldCount {
                expected: schema.len(),
                actual: values.len(),
            });
        }
        Ok(Self { schema, values })
    }

    pub(super) fn bound(schema: Arc<Schema>, values: Vec<Value>) -> Self {
        debug_assert_eq!(values.len(), schema.len());
        Self { schema, values }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.schema.has_field(name)
    }

    /// The value of `field`, falling back to its default, then to absent if the
    /// type is nullable.
    pub fn get_field<'a>(&'a self, field: &'a BoundField) -> Result<&'a Value> {
        if field.schema_id() != self.schema.id() {
            return Err(Error::SchemaMismatch(field.name().to_string()));
        }
        let value = self
            .values
            .get(field.index())
            .ok_or_else(|| Error::UnknownField(field.name().to_string()))?;
        if !value.is_absent() {
            return Ok(value);
        }
        if let Some(default) = field.def().default_value() {
            return Ok(default);
        }
        if field.def().ty().is_nullable() {
            return Ok(value);
        }
        Err(Error::MissingRequiredField(field.name().to_string()))
    }

    /// Resolve a name or bound field and fetch its value.
    pub fn get<'a, K: FieldKey + ?Sized>(&'a self, key: &'a K) -> Result<&'a Value> {
        let field = key.resolve(&self.schema)?;
        self.get_field(field)
    }

    /// A string field. An absent nullable string reads as `""`.
    pub fn get_string<K: FieldKey + ?Sized>(&self, key: &K) -> Result<String> {
        match self.get(key)? {
            Value::Absent => Ok(String::new()),
            value => value.as_string(),
        }
    }

    /// A string field, keeping absent distinct from empty.
    pub fn get_nullable_string<K: FieldKey + ?Sized>(&self, key: &K) -> Result<Option<String>> {
        match self.get(key)? {
            Value::Absent => Ok(None),
            value => value.as_string().map(Some),
        }
    }

    pub fn get_int16<K: FieldKey + ?Sized>(&self, key: &K) -> Result<i16> {
        self.get(key)?.as_int16()
    }

    pub fn get_int<K: FieldKey + ?Sized>(&self, key: &K) -> Result<i32> {
        self.get(key)?.as_int32()
    }

    pub fn get_int64<K: FieldKey + ?Sized>(&self, key: &K) -> Result<i64> {
        self.get(key)?.as_int64()
    }

    /// A byte blob field as an independent cursor over the shared storage.
    pub fn get_byte_window<K: FieldKey + ?Sized>(&self, key: &K) -> Result<Option<ByteWindow>> {
        match self.get(key)? {
            Value::Absent => Ok(None),
            value => value.as_byte_window().map(|w| Some(w.clone())),
        }
    }

    pub fn get_record<'a, K: FieldKey + ?Sized>(&'a self, key: &'a K) -> Result<&'a Record> {
        self.get(key)?.as_record()
    }

    /// An array field.
    ///
    /// Legacy leniency: a lone INT32 stored where an array is expected is
    /// returned as a one-element array. Use [`Record::get_array_strict`] to
    /// reject it instead.
    pub fn get_array<'a, K: FieldKey + ?Sized>(
        &'a self,
        key: &'a K,
    ) -> Result<Option<Cow<'a, [Value]>>> {
        match self.get(key)? {
            value @ Value::Int32(_) => {
                tracing::warn!(
                    schema = %self.schema,
                    "Promoting scalar INT32 to a single-element array"
                );
                Ok(Some(Cow::Owned(vec![value.clone()])))
            }
            value => self.array_value(value),
        }
    }

    /// An array field, without scalar promotion.
    pub fn get_array_strict<'a, K: FieldKey + ?Sized>(
        &'a self,
        key: &'a K,
    ) -> Result<Option<Cow<'a, [Value]>>> {
        let value = self.get(key)?;
        self.array_value(value)
    }

    fn array_value<'a>(&'a self, value: &'a Value) -> Result<Option<Cow<'a, [Value]>>> {
        match value {
            Value::Absent => Ok(None),
            value => value.as_array().map(|items| Some(Cow::Borrowed(items))),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema.id() == other.schema.id() && self.values == other.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (field, value) in self.schema.fields().iter().zip(&self.values) {
            map.entry(&field.name(), value);
        }
        map.finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (field, value)) in self.schema.fields().iter().zip(&self.values).enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", field.name(), value)?;
        }
        write!(f, "}}")
    }
}
