use crate::db::research_schema::{RESEARCH_COLUMNS, RESEARCH_TABLE};
use crate::inputs::CalculatorInputs;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Result};
use serde::Serialize;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One flattened row of `biochar_research`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchRecord {
    pub id: Option<i64>,
    pub researcher_name: String,
    pub academic_level: String,
    pub advisor_name: String,
    pub research_title: String,
    pub institution: String,
    pub city: String,
    pub state: String,
    pub sample_id: String,
    pub biomass_type: String,
    pub pyrolysis_temp: f64,
    pub carbon_content: f64,
    pub hc_ratio: f64,
    pub biochar_mass_ton: f64,
    pub collected_at: DateTime<Utc>,
    pub app_version: String,
}

impl ResearchRecord {
    pub fn from_inputs(
        inputs: &CalculatorInputs,
        biochar_mass_ton: f64,
        collected_at: DateTime<Utc>,
    ) -> Self {
        let p = &inputs.project;
        Self {
            id: None,
            researcher_name: p.researcher_name.clone(),
            academic_level: p.academic_level.to_string(),
            advisor_name: p.advisor_name.clone(),
            research_title: p.research_title.clone(),
            institution: p.institution.clone(),
            city: p.city.clone(),
            state: p.state.clone(),
            sample_id: inputs.sample_name.clone(),
            biomass_type: inputs.biomass_type.to_string(),
            pyrolysis_temp: inputs.pyrolysis_temp,
            carbon_content: inputs.carbon_content,
            hc_ratio: inputs.hc_ratio,
            biochar_mass_ton,
            collected_at,
            app_version: APP_VERSION.to_string(),
        }
    }
}

/// Insert-only. Returns the new row id.
pub fn insert_record(conn: &Connection, r: &ResearchRecord) -> Result<i64> {
    let names: Vec<&str> = RESEARCH_COLUMNS.iter().map(|(name, _)| *name).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {RESEARCH_TABLE} ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    );
    conn.execute(
        &sql,
        params![
            r.researcher_name,
            r.academic_level,
            r.advisor_name,
            r.research_title,
            r.institution,
            r.city,
            r.state,
            r.sample_id,
            r.biomass_type,
            r.pyrolysis_temp,
            r.carbon_content,
            r.hc_ratio,
            r.biochar_mass_ton,
            r.collected_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            r.app_version,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Newest first. `limit = None` returns everything.
pub fn load_records(conn: &Connection, limit: Option<usize>) -> Result<Vec<ResearchRecord>> {
    let limit = limit.map_or(-1, |l| l as i64);
    let mut stmt = conn.prepare(&format!(
        "SELECT id, researcher_name, academic_level, advisor_name, research_title,
                institution, city, state, sample_id, biomass_type, pyrolysis_temp,
                carbon_content, hc_ratio, biochar_mass_ton, collected_at, app_version
         FROM {RESEARCH_TABLE}
         ORDER BY collected_at DESC, id DESC
         LIMIT ?1"
    ))?;

    let rows = stmt.query_map([limit], |row| {
        let collected: String = row.get(14)?;
        let collected_at = DateTime::parse_from_rfc3339(&collected)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(14, rusqlite::types::Type::Text, e.into())
            })?;
        Ok(ResearchRecord {
            id: row.get(0)?,
            researcher_name: row.get(1)?,
            academic_level: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            advisor_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            research_title: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            institution: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            city: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            state: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            sample_id: row.get(8)?,
            biomass_type: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
            pyrolysis_temp: row.get::<_, Option<f64>>(10)?.unwrap_or(f64::NAN),
            carbon_content: row.get::<_, Option<f64>>(11)?.unwrap_or(f64::NAN),
            hc_ratio: row.get::<_, Option<f64>>(12)?.unwrap_or(f64::NAN),
            biochar_mass_ton: row.get::<_, Option<f64>>(13)?.unwrap_or(f64::NAN),
            collected_at,
            app_version: row.get::<_, Option<String>>(15)?.unwrap_or_default(),
        })
    })?;

    rows.collect()
}
