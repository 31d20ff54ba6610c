use biochar_core::calculator::{calculate_sequestration, CalculationResult};
use biochar_core::db::{initiate_tables, load_records};
use biochar_core::dispatch::spawn_collaborators;
use biochar_core::inputs::CalculatorInputs;
use biochar_core::narrative::{GeminiConfig, GeminiGenerator, TextGenerator};
use biochar_core::processevent::{
    drain_service_events, emit, InsightEvent, PersistEvent, ServiceEvent, ServiceEventSink,
};
use biochar_core::report::{
    create_file, format_summary, render_html, write_records_csv, write_results_csv,
    write_results_json, ReportError,
};
use biochar_core::validation::validate_inputs;

use chrono_tz::Tz;
use glob::glob;
use rusqlite::Connection;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/* =================== Public configuration types =================== */

#[derive(Debug)]
pub struct Config {
    pub db_path: PathBuf,
    pub action: Action,
    pub event_receiver: Option<UnboundedReceiver<ServiceEvent>>,
}

#[derive(Debug, Clone)]
pub enum Action {
    Calculate(Calculate),
    ListRecords(ListRecords),
    ExportRecords(ExportRecords),
}

#[derive(Debug, Clone)]
pub enum InputSource {
    Inline(Box<CalculatorInputs>),
    /// Paths or glob patterns of JSON input files.
    Files(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Calculate {
    pub source: InputSource,
    /// `None` disables the insight.
    pub gemini: Option<GeminiConfig>,
    /// Upper bound on background work after the results are shown.
    pub timeout: Duration,
    pub outputs: Outputs,
}

#[derive(Debug, Clone, Default)]
pub struct Outputs {
    pub csv: Option<PathBuf>,
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ListRecords {
    pub limit: Option<usize>,
    pub tz: Tz,
}

#[derive(Debug, Clone)]
pub struct ExportRecords {
    pub output: PathBuf,
}

/* =================== Error type (no process::exit) =================== */

#[derive(thiserror::Error, Debug)]
pub enum CmdError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("report error: {0}")]
    Report(#[from] ReportError),
    #[error("{0}")]
    Msg(String),
}

/* =================== Entry point =================== */

impl Config {
    pub fn run(&mut self) -> Result<(), CmdError> {
        match &self.action.clone() {
            Action::Calculate(c) => self.run_calculate(c),
            Action::ListRecords(l) => self.run_list_records(l),
            Action::ExportRecords(e) => self.run_export_records(e),
        }
    }
}

/* =================== Actions =================== */

impl Config {
    fn run_calculate(&mut self, c: &Calculate) -> Result<(), CmdError> {
        let (samples, mut failed) = load_samples(&c.source);
        if samples.is_empty() && failed == 0 {
            return Err(CmdError::Msg("No input files matched.".to_string()));
        }

        let mut results = Vec::with_capacity(samples.len());
        for inputs in samples {
            match validate_inputs(&inputs) {
                Ok(()) => results.push(calculate_sequestration(&inputs)),
                Err(errors) => {
                    eprintln!("Sample '{}' rejected:", inputs.sample_name);
                    for e in errors {
                        eprintln!("  - {}", e);
                    }
                    failed += 1;
                },
            }
        }
        if results.is_empty() {
            let msg = format!("No sample could be calculated ({failed} rejected).");
            return Err(CmdError::Msg(msg));
        }

        // results are final here, nothing below changes them
        for res in &results {
            println!("{}", format_summary(res));
        }
        write_tabular(&results, &c.outputs)?;

        let insights = self.run_collaborators(&results, c)?;
        for (res, insight) in results.iter().zip(&insights) {
            if !insight.is_empty() {
                println!("Insight for '{}': {}", res.inputs.sample_name, insight);
            }
        }

        if let Some(base) = &c.outputs.html {
            for (i, (res, insight)) in results.iter().zip(&insights).enumerate() {
                let path = html_path(base, i, results.len());
                let mut file = create_file(&path)?;
                file.write_all(render_html(res, insight).as_bytes())?;
                println!("Wrote report {}", path.display());
            }
        }

        if failed > 0 {
            return Err(CmdError::Msg(format!(
                "{} of {} sample(s) could not be calculated.",
                failed,
                failed + results.len()
            )));
        }
        Ok(())
    }

    /// Stores and describes the results in the background. Returns one insight
    /// per result, empty where none was produced.
    fn run_collaborators(
        &mut self,
        results: &[CalculationResult],
        c: &Calculate,
    ) -> Result<Vec<String>, CmdError> {
        let generator: Option<Arc<dyn TextGenerator>> = match &c.gemini {
            Some(cfg) => match GeminiGenerator::new(cfg.clone()) {
                Ok(g) => Some(Arc::new(g)),
                Err(e) => {
                    eprintln!("Insight disabled: {}", e);
                    None
                },
            },
            None => None,
        };

        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
        let (event_sender, event_receiver) = unbounded_channel::<ServiceEvent>();
        self.event_receiver = Some(event_receiver);

        let tasks = spawn_collaborators(
            &runtime,
            results,
            self.db_path.clone(),
            generator,
            event_sender.clone(),
        );

        let finished = tasks.wait_with(c.timeout, || self.handle_service_events());
        if !finished {
            tasks.abort_unfinished();
        }
        let insights = tasks.collect_insights(&runtime);

        let outcome = if finished {
            Ok(())
        } else {
            Err(format!("cancelled after {} s", c.timeout.as_secs()))
        };
        emit(&event_sender, ServiceEvent::Done(outcome));
        drop(event_sender);
        self.handle_service_events();
        Ok(insights)
    }

    fn run_list_records(&self, l: &ListRecords) -> Result<(), CmdError> {
        let conn = Connection::open(&self.db_path)?;
        initiate_tables(&conn)?;
        let records = load_records(&conn, l.limit)?;
        if records.is_empty() {
            println!("No research records in {}", self.db_path.display());
            return Ok(());
        }

        println!(
            "{:>5}  {:<22}  {:<16}  {:<24}  {:<20}  {:>10}",
            "id", "collected", "sample", "biomass", "researcher", "biochar t"
        );
        for r in &records {
            println!(
                "{:>5}  {:<22}  {:<16}  {:<24}  {:<20}  {:>10.4}",
                r.id.unwrap_or_default(),
                r.collected_at.with_timezone(&l.tz).format("%Y-%m-%d %H:%M %Z").to_string(),
                r.sample_id,
                r.biomass_type,
                r.researcher_name,
                r.biochar_mass_ton
            );
        }
        Ok(())
    }

    fn run_export_records(&self, e: &ExportRecords) -> Result<(), CmdError> {
        let conn = Connection::open(&self.db_path)?;
        initiate_tables(&conn)?;
        let records = load_records(&conn, None)?;
        write_records_csv(&records, create_file(&e.output)?)?;
        println!("Exported {} record(s) to {}", records.len(), e.output.display());
        Ok(())
    }

    pub fn handle_service_events(&mut self) {
        // take the receiver out so self can act as the sink
        if let Some(mut receiver) = self.event_receiver.take() {
            drain_service_events(self, &mut receiver);
            self.event_receiver = Some(receiver);
        }
    }
}

impl ServiceEventSink for Config {
    fn on_persist_event(&mut self, ev: &PersistEvent) {
        match ev {
            PersistEvent::NotAuthorized => {
                println!("Data sharing not authorized, sample not stored.");
            },
            PersistEvent::Saved { id, sample } => {
                println!("Stored sample '{}' as research record {}.", sample, id);
            },
            PersistEvent::Failed(e) => {
                eprintln!("Could not store research record: {}", e);
            },
        }
    }

    fn on_insight_event(&mut self, ev: &InsightEvent) {
        match ev {
            InsightEvent::Requested => {
                println!("Requesting technical insight...");
            },
            InsightEvent::Ready(chars) => {
                println!("Insight received ({} characters).", chars);
            },
            InsightEvent::Unavailable(reason) => {
                eprintln!("Insight unavailable: {}", reason);
            },
            InsightEvent::Failed(e) => {
                eprintln!("Insight failed: {}", e);
            },
            InsightEvent::TimedOut => {
                eprintln!("Insight request timed out.");
            },
        }
    }

    fn on_done(&mut self, res: &Result<(), String>) {
        match res {
            Ok(()) => {
                println!("Background work finished.");
            },
            Err(e) => {
                eprintln!("Background work {}.", e);
            },
        }
    }
}

/// Reads every sample from the source. Unreadable files are reported and
/// counted, never fatal.
fn load_samples(source: &InputSource) -> (Vec<CalculatorInputs>, usize) {
    match source {
        InputSource::Inline(inputs) => (vec![(**inputs).clone()], 0),
        InputSource::Files(patterns) => {
            let mut samples = Vec::new();
            let mut failed = 0;
            for path in resolve_inputs(patterns) {
                match CalculatorInputs::from_json_file(&path) {
                    Ok(inputs) => samples.push(inputs),
                    Err(e) => {
                        eprintln!("Failed to read inputs {}: {}", path.display(), e);
                        failed += 1;
                    },
                }
            }
            (samples, failed)
        },
    }
}

fn write_tabular(results: &[CalculationResult], outputs: &Outputs) -> Result<(), CmdError> {
    if let Some(path) = &outputs.csv {
        write_results_csv(results, create_file(path)?)?;
        println!("Wrote {}", path.display());
    }
    if let Some(path) = &outputs.json {
        write_results_json(results, create_file(path)?)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// `report.html` stays as is for a single sample and becomes `report_01.html`,
/// `report_02.html`, … when batching.
fn html_path(base: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return base.to_path_buf();
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("report");
    let ext = base.extension().and_then(|s| s.to_str()).unwrap_or("html");
    base.with_file_name(format!("{}_{:02}.{}", stem, index + 1, ext))
}

fn resolve_inputs(inputs: &[String]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for inp in inputs {
        if inp.contains('*') || inp.contains('?') || inp.contains('[') {
            match glob(inp) {
                Ok(paths) => out.extend(paths.filter_map(Result::ok)),
                Err(e) => eprintln!("Invalid glob '{}': {}", inp, e),
            }
        } else {
            out.push(PathBuf::from(inp));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use biochar_core::inputs::ProjectInfo;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("biochar_cmd_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn calculate(inputs: CalculatorInputs, outputs: Outputs) -> Calculate {
        Calculate {
            source: InputSource::Inline(Box::new(inputs)),
            gemini: None,
            timeout: Duration::from_secs(10),
            outputs,
        }
    }

    fn config(db_path: PathBuf, action: Action) -> Config {
        Config { db_path, action, event_receiver: None }
    }

    #[test]
    fn test_html_path_numbering() {
        let base = Path::new("out/report.html");
        assert_eq!(html_path(base, 0, 1), PathBuf::from("out/report.html"));
        assert_eq!(html_path(base, 1, 3), PathBuf::from("out/report_02.html"));
        assert_eq!(html_path(Path::new("summary"), 0, 2), PathBuf::from("summary_01.html"));
    }

    #[test]
    fn test_shared_calculation_is_stored_and_exported() {
        let dir = temp_dir("shared");
        let db = dir.join("research.db");
        let inputs = CalculatorInputs {
            project: ProjectInfo { researcher_name: "R. Lima".into(), ..Default::default() },
            data_authorization: true,
            ..Default::default()
        };
        let outputs = Outputs {
            csv: Some(dir.join("points.csv")),
            html: Some(dir.join("report.html")),
            json: None,
        };

        let mut cfg = config(db.clone(), Action::Calculate(calculate(inputs, outputs)));
        cfg.run().unwrap();

        let csv = fs::read_to_string(dir.join("points.csv")).unwrap();
        assert_eq!(csv.lines().count(), 1 + 4);
        let html = fs::read_to_string(dir.join("report.html")).unwrap();
        assert!(html.contains("R. Lima"));

        let export = dir.join("export/records.csv");
        let mut cfg = config(db, Action::ExportRecords(ExportRecords { output: export.clone() }));
        cfg.run().unwrap();
        let exported = fs::read_to_string(export).unwrap();
        assert_eq!(exported.lines().count(), 2);
        assert!(exported.contains("Sample 01"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_invalid_inputs_are_refused() {
        let dir = temp_dir("invalid");
        let inputs = CalculatorInputs { mass_input: 0.0, ..Default::default() };
        let outputs = Outputs { json: Some(dir.join("results.json")), ..Default::default() };

        let mut cfg = config(dir.join("r.db"), Action::Calculate(calculate(inputs, outputs)));
        assert!(matches!(cfg.run(), Err(CmdError::Msg(_))));
        assert!(!dir.join("results.json").exists());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_batch_reads_globbed_files() {
        let dir = temp_dir("batch");
        fs::write(dir.join("a.json"), r#"{"sample_name": "A", "selected_soil_temps": [5]}"#)
            .unwrap();
        fs::write(dir.join("b.json"), r#"{"sample_name": "B", "mass_input": 2}"#).unwrap();
        fs::write(dir.join("broken.txt"), "not json").unwrap();

        let pattern = dir.join("*.json").display().to_string();
        let (samples, failed) = load_samples(&InputSource::Files(vec![pattern]));
        let mut names: Vec<_> = samples.iter().map(|s| s.sample_name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(failed, 0);

        let missing = dir.join("missing.json").display().to_string();
        let (samples, failed) = load_samples(&InputSource::Files(vec![missing]));
        assert!(samples.is_empty());
        assert_eq!(failed, 1);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_list_on_fresh_database() {
        let dir = temp_dir("list");
        let mut cfg = config(
            dir.join("empty.db"),
            Action::ListRecords(ListRecords { limit: Some(3), tz: chrono_tz::UTC }),
        );
        cfg.run().unwrap();
        let _ = fs::remove_dir_all(dir);
    }
}
