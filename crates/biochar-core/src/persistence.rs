//! Fire-and-forget storage of research records.
//!
//! Nothing in here returns an error to the caller. Outcomes are reported on the
//! event channel and logged; a failed write is never retried.

use crate::db::migrate::migrate_db;
use crate::db::{initiate_tables, insert_record, ResearchRecord};
use crate::inputs::CalculatorInputs;
use crate::processevent::{emit, EventSender, PersistEvent, ServiceEvent};

use chrono::Utc;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Opens the store, brings it up to the current schema and writes one record. Blocking.
pub fn write_record(db_path: &Path, record: &ResearchRecord) -> Result<i64, PersistError> {
    let conn = Connection::open(db_path)?;
    migrate_db(&conn)?;
    initiate_tables(&conn)?;
    Ok(insert_record(&conn, record)?)
}

/// Persists `inputs` and the computed biochar mass when the researcher authorized
/// data sharing. Returns the new row id, or `None` when nothing was written.
pub async fn save_research_data(
    db_path: PathBuf,
    inputs: CalculatorInputs,
    biochar_mass_ton: f64,
    events: EventSender,
) -> Option<i64> {
    if !inputs.data_authorization {
        debug!(sample = %inputs.sample_name, "data sharing not authorized, skipping store");
        emit(&events, ServiceEvent::Persist(PersistEvent::NotAuthorized));
        return None;
    }

    let record = ResearchRecord::from_inputs(&inputs, biochar_mass_ton, Utc::now());
    let sample = record.sample_id.clone();

    let res = tokio::task::spawn_blocking(move || write_record(&db_path, &record))
        .await
        .map_err(PersistError::from)
        .and_then(|r| r);

    match res {
        Ok(id) => {
            debug!(id, sample = %sample, "research record saved");
            emit(&events, ServiceEvent::Persist(PersistEvent::Saved { id, sample }));
            Some(id)
        },
        Err(e) => {
            warn!(error = %e, "could not save research record");
            emit(&events, ServiceEvent::Persist(PersistEvent::Failed(e.to_string())));
            None
        },
    }
}
