use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::{StorageClient, StorageError};

const SCAN_LOCK_KEY: &str = "reminder-scan";
const LOCK_LEASE_SECONDS: i64 = 120;

/// Storage-backed scan lease. The `scan_locks` table carries a uniqueness
/// constraint on `lock_key`, so at most one scanner instance across all
/// processes holds the lease; `expires_at` bounds how long a crashed holder
/// can block the next scan.
pub struct ScanLockService {
    storage: Arc<StorageClient>,
    lock_key: String,
}

impl ScanLockService {
    pub fn new(storage: Arc<StorageClient>) -> Self {
        Self {
            storage,
            lock_key: SCAN_LOCK_KEY.to_string(),
        }
    }

    /// Try to take the lease. `Ok(false)` means another scan is running.
    pub async fn acquire(&self) -> Result<bool, StorageError> {
        match self.try_insert().await {
            Ok(()) => Ok(true),
            Err(StorageError::Conflict(_)) => {
                if self.reap_expired().await? {
                    // The stale lease is gone; one more attempt. A loser here
                    // means another instance got in first.
                    match self.try_insert().await {
                        Ok(()) => Ok(true),
                        Err(StorageError::Conflict(_)) => Ok(false),
                        Err(e) => Err(e),
                    }
                } else {
                    Ok(false)
                }
            }
            Err(e) => Err(e),
        }
    }

    pub async fn release(&self) -> Result<(), StorageError> {
        self.storage
            .delete(&format!("/rest/v1/scan_locks?lock_key=eq.{}", self.lock_key))
            .await?;

        debug!("Scan lock released: {}", self.lock_key);
        Ok(())
    }

    async fn try_insert(&self) -> Result<(), StorageError> {
        let now = Utc::now();
        let lock_data = json!({
            "lock_key": self.lock_key,
            "acquired_at": now.to_rfc3339(),
            "expires_at": (now + Duration::seconds(LOCK_LEASE_SECONDS)).to_rfc3339(),
            "process_id": format!("scanner_{}", Uuid::new_v4())
        });

        let _rows: Vec<Value> = self
            .storage
            .insert_returning("/rest/v1/scan_locks", lock_data)
            .await?;

        debug!("Scan lock acquired: {}", self.lock_key);
        Ok(())
    }

    /// Delete the current lease if its expiry has passed. Returns whether a
    /// stale lease was removed.
    async fn reap_expired(&self) -> Result<bool, StorageError> {
        let rows: Vec<Value> = self
            .storage
            .request(
                Method::GET,
                &format!("/rest/v1/scan_locks?lock_key=eq.{}&select=*", self.lock_key),
                None,
            )
            .await?;

        let Some(lock) = rows.first() else {
            // Holder released between our insert attempt and this read.
            return Ok(true);
        };

        let expired = lock
            .get("expires_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|expires_at| expires_at.with_timezone(&Utc) < Utc::now())
            .unwrap_or(false);

        if expired {
            warn!("Reaping expired scan lock: {}", self.lock_key);
            self.release().await?;
            return Ok(true);
        }

        Ok(false)
    }
}
