//! Destination folder assignment.
//!
//! Catalog numbers are grouped into fixed-width numeric ranges, one
//! destination folder per range: key 1999 with increment 1000 lands in the
//! folder for 1000, key 2000 in the folder for 2000.

use crate::error::{Error, Result};

/// Compute the destination folder name for a catalog key.
///
/// The folder number is the key rounded down to a multiple of `increment`,
/// zero-padded to `pad_width` digits and prefixed with `prefix`. Padding
/// only ever adds leading zeros; a number wider than `pad_width` is emitted
/// unpadded but correct.
pub fn bucket_folder_name(
    catalog_key: u64,
    increment: u64,
    pad_width: usize,
    prefix: &str,
) -> Result<String> {
    if increment == 0 {
        return Err(Error::InvalidIncrement);
    }
    let folder_number = catalog_key / increment * increment;
    Ok(format!("{prefix}{folder_number:0pad_width$}"))
}

// -- Tests --
