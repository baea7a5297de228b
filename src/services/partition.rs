//! Deterministic hash bucketing of search strings.
//!
//! Buckets are derived from the MD5 digest of the value, so shards stay the
//! same across processes and reruns without any coordination.

use std::collections::BTreeMap;

use md5::{Digest, Md5};

use crate::error::{AppError, Result};
use crate::models::Variation;

/// Bucket index of `value` among `buckets` buckets.
///
/// `buckets <= 0` means no partitioning and always yields bucket 0.
pub fn assign(value: &str, buckets: i64) -> Result<u64> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_input(format!(
            "cannot bucket blank value [{value}]"
        )));
    }

    if buckets <= 0 {
        return Ok(0);
    }

    let digest = Md5::digest(value.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    let hash = u128::from_be_bytes(bytes);
    let bucket = (hash % buckets as u128) as u64;

    log::trace!(
        "Value [{}] hash {} -> bucket {}/{}",
        value,
        hex::encode(digest),
        bucket,
        buckets
    );

    Ok(bucket)
}

/// Group variations by bucket, preserving their order inside each bucket.
pub fn partition(variations: &[Variation], buckets: i64) -> Result<BTreeMap<u64, Vec<Variation>>> {
    let mut result: BTreeMap<u64, Vec<Variation>> = BTreeMap::new();
    for variation in variations {
        let bucket = assign(variation, buckets)?;
        result.entry(bucket).or_default().push(variation.clone());
    }
    Ok(result)
}

/// Keep only the variations that fall into `bucket`.
pub fn select_bucket(variations: &[Variation], buckets: i64, bucket: u64) -> Result<Vec<Variation>> {
    let mut selected = Vec::new();
    for variation in variations {
        if assign(variation, buckets)? == bucket {
            selected.push(variation.clone());
        }
    }
    Ok(selected)
}
