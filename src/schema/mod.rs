//! Schema-driven struct decoding.
//!
//! A [`Schema`] is an ordered list of named [`Field`]s. Field order is the wire
//! order: fields are positional, not self-describing, so [`Schema::read`]
//! decodes them strictly in declaration order into a [`Record`].
//!
//! [`Schema::get`] resolves a name to a [`BoundField`], a handle that pairs the
//! field definition with its position and the identity of the schema that
//! owns it. Records accept bound fields only from their own schema instance,
//! even when another schema has an identical field at the same position.
//!
//! # Example
//!
//! ```
//! use kafkaesque_offsets::buffer::ByteWindow;
//! use kafkaesque_offsets::schema::{Field, Schema, WireType};
//!
//! let schema = Schema::new([
//!     Field::new("topic", WireType::String),
//!     Field::new("partition", WireType::Int32),
//! ])
//! .unwrap();
//!
//! let mut window = ByteWindow::wrap(vec![0, 1, b't', 0, 0, 0, 7]);
//! let record = schema.read(&mut window).unwrap();
//!
//! let partition = schema.get("partition").unwrap();
//! assert_eq!(record.get_string("topic").unwrap(), "t");
//! assert_eq!(record.get_int(partition).unwrap(), 7);
//! ```

mod field;
mod record;
mod value;
mod wire_type;

pub use field::Field;
pub use record::Record;
pub use value::Value;
pub use wire_type::WireType;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::buffer::ByteWindow;
use crate::error::{Error, Result, ResultExt};

static NEXT_SCHEMA_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one schema instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaId(u64);

impl SchemaId {
    fn next() -> Self {
        SchemaId(NEXT_SCHEMA_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An ordered set of uniquely named fields.
///
/// Immutable after construction and shared through `Arc`.
#[derive(Debug)]
pub struct Schema {
    id: SchemaId,
    fields: Vec<BoundField>,
    by_name: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema. Fails with [`Error::DuplicateField`] if two fields share a name.
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Result<Arc<Schema>> {
        let id = SchemaId::next();
        let mut bound = Vec::new();
        let mut by_name = HashMap::new();
        for (index, def) in fields.into_iter().enumerate() {
            if by_name.insert(def.name().to_string(), index).is_some() {
                return Err(Error::DuplicateField(def.name().to_string()));
            }
            bound.push(BoundField {
                schema: id,
                index,
                def,
            });
        }
        Ok(Arc::new(Schema {
            id,
            fields: bound,
            by_name,
        }))
    }

    pub fn id(&self) -> SchemaId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in wire order.
    pub fn fields(&self) -> &[BoundField] {
        &self.fields
    }

    /// Resolve a field by name.
    pub fn get(&self, name: &str) -> Result<&BoundField> {
        self.by_name
            .get(name)
            .map(|&index| &self.fields[index])
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Decode every field in declared order.
    ///
    /// The first failing field aborts the read with its name attached.
    pub fn read(self: &Arc<Self>, window: &mut ByteWindow) -> Result<Record> {
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            values.push(field.def.ty().read(window).in_field(field.name())?);
        }
        Ok(Record::bound(Arc::clone(self), values))
    }

    /// Build a record from values in field order.
    pub fn record(self: &Arc<Self>, values: Vec<Value>) -> Result<Record> {
        Record::new(Arc::clone(self), values)
    }

    /// Check every field of `record` against its type.
    pub fn validate(&self, record: &Record) -> Result<()> {
        for field in &self.fields {
            let value = record.get_field(field).in_field(field.name())?;
            field.def.ty().validate(value).in_field(field.name())?;
        }
        Ok(())
    }

    /// Encoded size of `record`.
    pub fn size_of(&self, record: &Record) -> Result<usize> {
        let mut size = 0;
        for field in &self.fields {
            let value = record.get_field(field).in_field(field.name())?;
            size += field.def.ty().size_of(value).in_field(field.name())?;
        }
        Ok(size)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, "}}")
    }
}

/// A field definition bound to its position in one schema instance.
#[derive(Debug, Clone)]
pub struct BoundField {
    schema: SchemaId,
    index: usize,
    def: Field,
}

impl BoundField {
    pub fn name(&self) -> &str {
        self.def.name()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn def(&self) -> &Field {
        &self.def
    }

    pub fn schema_id(&self) -> SchemaId {
        self.schema
    }
}

impl fmt::Display for BoundField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.def.name(), self.def.ty())
    }
}

/// Anything a record accessor can resolve to a bound field: a field name or
/// a [`BoundField`] handle.
pub trait FieldKey {
    fn resolve<'a>(&'a self, schema: &'a Schema) -> Result<&'a BoundField>;
}

impl FieldKey for BoundField {
    fn resolve<'a>(&'a self, _schema: &'a Schema) -> Result<&'a BoundField> {
        Ok(self)
    }
}

impl FieldKey for str {
    fn resolve<'a>(&'a self, schema: &'a Schema) -> Result<&'a BoundField> {
        schema.get(self)
    }
}
