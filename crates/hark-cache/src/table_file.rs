//! Table file layout.
//!
//! ```text
//! checksum    u32
//! num_leafs   u32
//! table_len   u32          always N²
//! props       u32[table_len]  packed PropagationProps, row-major
//! ```

use std::io::{Read, Write};

use hark_table::{PropagationTable, TableError};

use crate::codec::{expect_end, read_u32_vec, write_u32_slice, FileHeader};
use crate::error::CacheError;

/// Encode `table` for a map with `checksum`.
pub fn write_table(
    w: &mut dyn Write,
    checksum: u32,
    table: &PropagationTable,
) -> Result<(), CacheError> {
    let too_large = |what: &str, value: usize| CacheError::BadHeader {
        detail: format!("{what} {value} does not fit the header"),
    };
    let num_leafs =
        u32::try_from(table.num_leafs()).map_err(|_| too_large("leaf count", table.num_leafs()))?;
    let table_len =
        u32::try_from(table.props().len()).map_err(|_| too_large("table length", table.props().len()))?;
    FileHeader {
        checksum,
        num_leafs,
        section_len: table_len,
    }
    .encode(w)?;

    let packed: Vec<u32> = table.packed().collect();
    write_u32_slice(w, &packed)
}

/// Decode a table, accepting it only for a map with `checksum` and
/// `num_leafs` leaves, with `N²` well-formed entries that pass
/// [`PropagationTable::validate`].
pub fn read_table(
    r: &mut dyn Read,
    checksum: u32,
    num_leafs: u32,
) -> Result<PropagationTable, CacheError> {
    let header = FileHeader::decode(r)?;
    header.check(checksum, num_leafs)?;

    let n = num_leafs as usize;
    let expected = n.saturating_mul(n);
    let table_len = header.section_len as usize;
    if table_len != expected {
        return Err(TableError::SizeMismatch {
            expected,
            actual: table_len,
        }
        .into());
    }

    let packed = read_u32_vec(r, table_len)?;
    expect_end(r)?;

    let table = PropagationTable::from_packed(n, &packed)?;
    table.validate()?;
    Ok(table)
}
