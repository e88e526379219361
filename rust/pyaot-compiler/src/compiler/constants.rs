//! Named integer constants and enumerations declared in one compilation.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConstantEntry {
    Integer(i64),
    Enum(BTreeMap<String, i64>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConstantError {
    #[error("duplicate constant '{0}'")]
    Duplicate(String),
    #[error("'{0}' is an enum, not a constant")]
    NotAnInteger(String),
    #[error("'{0}' is a constant, not an enum")]
    NotAnEnum(String),
    #[error("unknown enum '{0}'")]
    UnknownEnum(String),
    #[error("'{member}' is not a member of enum '{name}'")]
    UnknownMember { name: String, member: String },
}

/// Name to value mapping, created empty per translation.
#[derive(Debug, Clone, Default)]
pub struct ConstantTable {
    entries: HashMap<String, ConstantEntry>,
}

impl ConstantTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_integer(&mut self, name: &str, value: i64) -> Result<(), ConstantError> {
        self.insert(name, ConstantEntry::Integer(value))
    }

    pub fn define_enum(
        &mut self,
        name: &str,
        members: BTreeMap<String, i64>,
    ) -> Result<(), ConstantError> {
        self.insert(name, ConstantEntry::Enum(members))
    }

    fn insert(&mut self, name: &str, entry: ConstantEntry) -> Result<(), ConstantError> {
        if self.entries.contains_key(name) {
            return Err(ConstantError::Duplicate(name.to_string()));
        }
        self.entries.insert(name.to_string(), entry);
        Ok(())
    }

    /// Value of an integer constant. `Ok(None)` when the name is not declared.
    pub fn integer(&self, name: &str) -> Result<Option<i64>, ConstantError> {
        match self.entries.get(name) {
            Some(ConstantEntry::Integer(v)) => Ok(Some(*v)),
            Some(ConstantEntry::Enum(_)) => Err(ConstantError::NotAnInteger(name.to_string())),
            None => Ok(None),
        }
    }

    /// Value of `name.member`, which must name an existing enum member.
    pub fn enum_member(&self, name: &str, member: &str) -> Result<i64, ConstantError> {
        match self.entries.get(name) {
            Some(ConstantEntry::Enum(members)) => {
                members.get(member).copied().ok_or_else(|| ConstantError::UnknownMember {
                    name: name.to_string(),
                    member: member.to_string(),
                })
            }
            Some(ConstantEntry::Integer(_)) => Err(ConstantError::NotAnEnum(name.to_string())),
            None => Err(ConstantError::UnknownEnum(name.to_string())),
        }
    }
}
