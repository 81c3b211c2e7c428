use super::{Value, WireType};
use crate::error::Result;

/// A named, typed field definition.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    ty: WireType,
    doc: Option<String>,
    default: Option<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: WireType) -> Self {
        Self {
            name: name.into(),
            ty,
            doc: None,
            default: None,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Declare the value returned when the record holds none.
    ///
    /// The default must be a valid value of the field's type.
    pub fn with_default(mut self, default: impl Into<Value>) -> Result<Self> {
        let default = default.into();
        self.ty.validate(&default)?;
        self.default = Some(default);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &WireType {
        &self.ty
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}
