//! record — logical record (key + raw value) and its lazy delimiter layers.
//!
//! A raw value splits on field marks (0xFE) into fields, each field on value
//! marks (0xFD) into values, each value on subvalue marks (0xFC) into subvalues.
//! Nothing is split until asked for; indices are 0-based.

use std::fmt;

use crate::consts::{FIELD_MARK, SUBVALUE_MARK, VALUE_MARK};

/// One logical record as produced by every reader. Owns its bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub raw: Vec<u8>,
}

impl Record {
    pub fn new(key: Vec<u8>, raw: Vec<u8>) -> Self {
        Self { key, raw }
    }

    /// Fields of the raw value. An empty value still has one (empty) field.
    pub fn fields(&self) -> impl Iterator<Item = Field<'_>> + '_ {
        self.raw.split(|b| *b == FIELD_MARK).map(Field)
    }

    pub fn field(&self, f_idx: usize) -> Option<Field<'_>> {
        self.fields().nth(f_idx)
    }

    /// Subvalue `s_idx` of value `v_idx` of field `f_idx`.
    pub fn get(&self, f_idx: usize, v_idx: usize, s_idx: usize) -> Option<&[u8]> {
        self.field(f_idx)?.value(v_idx)?.subvalue(s_idx)
    }

    /// Fully split copy: fields → values → subvalues.
    pub fn to_list(&self) -> Vec<Vec<Vec<Vec<u8>>>> {
        self.fields().map(|f| f.to_list()).collect()
    }

    /// Bytes accounted for by the record (key + raw value).
    pub fn byte_len(&self) -> usize {
        self.key.len() + self.raw.len()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("key", &String::from_utf8_lossy(&self.key))
            .field("raw_len", &self.raw.len())
            .finish()
    }
}

/// Field layer view into a record's raw value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field<'a>(pub &'a [u8]);

impl<'a> Field<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn values(&self) -> impl Iterator<Item = Value<'a>> + 'a {
        self.0.split(|b| *b == VALUE_MARK).map(Value)
    }

    pub fn value(&self, v_idx: usize) -> Option<Value<'a>> {
        self.values().nth(v_idx)
    }

    pub fn to_list(&self) -> Vec<Vec<Vec<u8>>> {
        self.values().map(|v| v.to_list()).collect()
    }
}

/// Value layer view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Value<'a>(pub &'a [u8]);

impl<'a> Value<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn subvalues(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.0.split(|b| *b == SUBVALUE_MARK)
    }

    pub fn subvalue(&self, s_idx: usize) -> Option<&'a [u8]> {
        self.subvalues().nth(s_idx)
    }

    pub fn to_list(&self) -> Vec<Vec<u8>> {
        self.subvalues().map(|s| s.to_vec()).collect()
    }
}
