//! Section domain model.
//!
//! # Invariants
//! - `id` is assigned by the store on creation and never reused.
//! - `start_address <= end_address` by convention; not enforced here.
//! - `data` may be empty but is always present.

use super::address::Address;
use super::{ModuleId, SectionId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Access rights of a section's memory region.
///
/// The closed set of symbols is the wire representation used by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionPermission {
    Read,
    Write,
    Execute,
    ReadWrite,
    ReadExecute,
    WriteExecute,
    ReadWriteExecute,
}

const SECTION_PERMISSIONS: &[SectionPermission] = &[
    SectionPermission::Read,
    SectionPermission::Write,
    SectionPermission::Execute,
    SectionPermission::ReadWrite,
    SectionPermission::ReadExecute,
    SectionPermission::WriteExecute,
    SectionPermission::ReadWriteExecute,
];

impl SectionPermission {
    /// Canonical symbol stored in the `permission` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Execute => "EXECUTE",
            Self::ReadWrite => "READ_WRITE",
            Self::ReadExecute => "READ_EXECUTE",
            Self::WriteExecute => "WRITE_EXECUTE",
            Self::ReadWriteExecute => "READ_WRITE_EXECUTE",
        }
    }

    /// All permissions in declaration order.
    pub fn all() -> &'static [SectionPermission] {
        SECTION_PERMISSIONS
    }
}

impl Display for SectionPermission {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Parses a canonical permission symbol.
///
/// Matching is exact: no trimming and no case folding.
pub fn parse_section_permission(
    value: &str,
) -> Result<SectionPermission, UnknownSectionPermission> {
    SECTION_PERMISSIONS
        .iter()
        .copied()
        .find(|permission| permission.as_str() == value)
        .ok_or_else(|| UnknownSectionPermission(value.to_string()))
}

/// Permission symbol outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSectionPermission(pub String);

impl Display for UnknownSectionPermission {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown section permission `{}`", self.0)
    }
}

impl Error for UnknownSectionPermission {}

/// Named, address-ranged, permission-tagged region of a module image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    /// Owning module; every section operation is scoped to it.
    pub module_id: ModuleId,
    pub name: String,
    pub start_address: Address,
    pub end_address: Address,
    pub permission: SectionPermission,
    /// Raw bytes of the region.
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::{parse_section_permission, SectionPermission};

    #[test]
    fn permission_symbols_roundtrip_exactly() {
        for permission in SectionPermission::all() {
            assert_eq!(
                parse_section_permission(permission.as_str()),
                Ok(*permission)
            );
        }
    }

    #[test]
    fn permission_parse_is_case_sensitive() {
        let err = parse_section_permission("read_execute").unwrap_err();
        assert_eq!(err.0, "read_execute");
        assert!(parse_section_permission(" READ").is_err());
    }
}
