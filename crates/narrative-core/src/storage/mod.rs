pub mod memory;

use crate::error::Result;
use crate::model::share::{ShareLevel, ShareRequestRecord};

/// Outcome of [`ShareRequestStore::reserve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reservation {
    /// The caller now owns the request and must `save` or `release` it.
    Reserved,
    /// The request was already made, or is being made right now (`None`).
    AlreadyRequested(Option<ShareRequestRecord>),
}

/// Record of share requests already announced, used to suppress duplicates.
#[async_trait::async_trait]
pub trait ShareRequestStore: Send + Sync {
    /// Completed request for this workspace, user and level, if any.
    async fn find(
        &self,
        ws_id: i64,
        user: &str,
        level: ShareLevel,
    ) -> Result<Option<ShareRequestRecord>>;

    /// Claim the request key. Checking and claiming must be one atomic step.
    async fn reserve(&self, ws_id: i64, user: &str, level: ShareLevel) -> Result<Reservation>;

    /// Complete a reservation with the sent notification.
    async fn save(&self, record: &ShareRequestRecord) -> Result<()>;

    /// Drop a reservation that never completed. Completed records stay.
    async fn release(&self, ws_id: i64, user: &str, level: ShareLevel) -> Result<()>;
}

/// Remembers nothing: every request is treated as new.
#[derive(Debug, Clone, Default)]
pub struct NoopShareRequestStore;

#[async_trait::async_trait]
impl ShareRequestStore for NoopShareRequestStore {
    async fn find(
        &self,
        _ws_id: i64,
        _user: &str,
        _level: ShareLevel,
    ) -> Result<Option<ShareRequestRecord>> {
        Ok(None)
    }

    async fn reserve(&self, _ws_id: i64, _user: &str, _level: ShareLevel) -> Result<Reservation> {
        Ok(Reservation::Reserved)
    }

    async fn save(&self, _record: &ShareRequestRecord) -> Result<()> {
        Ok(())
    }

    async fn release(&self, _ws_id: i64, _user: &str, _level: ShareLevel) -> Result<()> {
        Ok(())
    }
}
