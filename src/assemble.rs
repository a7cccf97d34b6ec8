//! Series assembly from stored observations

use crate::cache::{RankStore, StorageError};
use crate::data::Series;

/// Reads every stored observation for `domain` and builds its series
///
/// Always reads storage afresh; callers must not reuse rows read before a
/// refresh.
pub async fn assemble(store: &dyn RankStore, domain: &str) -> Result<Series, StorageError> {
    let rows = store.find_all(domain).await?;
    Ok(Series::from_observations(domain, &rows))
}
