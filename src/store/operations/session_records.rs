use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::affect::session::{RunOutcome, RunSummary};
use crate::affect::types::SessionKind;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// One finished session run, kept after the live session is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub session_id: String,
    pub kind: SessionKind,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub observations: u64,
    pub label_counts: BTreeMap<String, u64>,
    pub alerts_raised: u64,
    pub outcome: RunOutcome,
    pub failure_reason: Option<String>,
}

impl SessionRecord {
    pub fn from_run(session_id: &str, run: RunSummary) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            kind: run.kind,
            started_at: run.started_at,
            ended_at: run.ended_at,
            duration_ms: (run.ended_at - run.started_at).num_milliseconds().max(0),
            observations: run.observations,
            label_counts: run.label_counts,
            alerts_raised: run.alerts_raised,
            outcome: run.outcome,
            failure_reason: run.failure_reason,
        }
    }
}

fn map_tx_error(error: sled::transaction::TransactionError<StoreError>) -> StoreError {
    match error {
        sled::transaction::TransactionError::Abort(store_error) => store_error,
        sled::transaction::TransactionError::Storage(storage_error) => {
            StoreError::Sled(storage_error)
        }
    }
}

impl Store {
    pub fn archive_session_record(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let key = keys::session_record_key(record.ended_at.timestamp_millis(), &record.id)?;
        let id_key = keys::session_record_id_key(&record.id)?;
        let bytes = Self::serialize(record)?;

        (&self.session_records, &self.session_record_ids)
            .transaction(|(tx_records, tx_ids)| {
                if tx_ids.get(id_key.as_bytes())?.is_some() {
                    return Err(sled::transaction::ConflictableTransactionError::Abort(
                        StoreError::Conflict {
                            entity: "session_record".to_string(),
                            key: record.id.clone(),
                        },
                    ));
                }
                tx_records.insert(key.as_bytes(), bytes.as_slice())?;
                tx_ids.insert(id_key.as_bytes(), key.as_bytes())?;
                Ok(())
            })
            .map_err(map_tx_error)
    }

    pub fn get_session_record(&self, record_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let id_key = keys::session_record_id_key(record_id)?;
        let Some(primary) = self.session_record_ids.get(id_key.as_bytes())? else {
            return Ok(None);
        };
        match self.session_records.get(primary)? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Newest first.
    pub fn list_session_records(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        let mut records = Vec::new();
        for item in self.session_records.iter().skip(offset) {
            if records.len() >= limit {
                break;
            }
            let (_, value) = item?;
            records.push(Self::deserialize::<SessionRecord>(&value)?);
        }
        Ok(records)
    }

    pub fn count_session_records(&self) -> Result<usize, StoreError> {
        Ok(self.session_records.len())
    }

    /// Removes every record that ended strictly before `cutoff_ms`. Returns how many were removed.
    pub fn delete_session_records_before(&self, cutoff_ms: i64) -> Result<usize, StoreError> {
        let Some(start) = keys::session_records_before_key(cutoff_ms) else {
            return Ok(0);
        };

        let mut doomed: Vec<(sled::IVec, String)> = Vec::new();
        for item in self.session_records.range(start.as_bytes()..) {
            let (key, value) = item?;
            let record: SessionRecord = Self::deserialize(&value)?;
            doomed.push((key, keys::session_record_id_key(&record.id)?));
        }
        if doomed.is_empty() {
            return Ok(0);
        }

        (&self.session_records, &self.session_record_ids)
            .transaction(|(tx_records, tx_ids)| {
                for (key, id_key) in &doomed {
                    tx_records.remove(key.as_ref())?;
                    tx_ids.remove(id_key.as_bytes())?;
                }
                Ok(())
            })
            .map_err(map_tx_error)?;

        Ok(doomed.len())
    }
}
