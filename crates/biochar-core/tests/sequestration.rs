use biochar_core::biomass::BiomassType;
use biochar_core::calculator::{calculate_sequestration, CO2_PER_C};
use biochar_core::coefficients::CALIBRATION_TEMPERATURES;
use biochar_core::db::load_records;
use biochar_core::dispatch::spawn_collaborators;
use biochar_core::inputmode::InputMode;
use biochar_core::inputs::{CalculatorInputs, ProjectInfo};
use biochar_core::massunit::MassUnit;
use biochar_core::narrative::{InsightRequest, NarrativeError, TextGenerator};
use biochar_core::processevent::{PersistEvent, ServiceEvent};
use biochar_core::validation::validate_inputs;

use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;

const EPS: f64 = 1e-9;

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < EPS, "{a} != {b}");
}

#[test]
fn feedstock_sample_at_25_degrees() {
    let inputs = CalculatorInputs {
        biomass_type: BiomassType::SugarcaneBagasse,
        input_mode: InputMode::Feedstock,
        mass_input: 2000.0,
        mass_unit: MassUnit::Kilogram,
        biochar_yield: 25.0,
        carbon_content: 80.0,
        hc_ratio: 0.5,
        selected_soil_temps: vec![25.0],
        ..Default::default()
    };
    assert!(validate_inputs(&inputs).is_ok());

    let res = calculate_sequestration(&inputs);
    assert_close(res.total_biochar_mass, 0.5);
    assert_close(res.total_carbon_mass, 0.4);

    let s = &res.scenarios[0];
    assert_eq!((s.chc, s.mhc), (0.98, -0.66));
    let years: Vec<u32> = s.data_points.iter().map(|p| p.year).collect();
    assert_eq!(years, vec![0, 100, 500, 1000]);

    let f: Vec<f64> = s.data_points.iter().map(|p| p.f_perm).collect();
    assert_close(f[0], 1.0);
    assert_close(f[1], 0.65);
    assert_close(f[2], 0.235);
    assert_close(f[3], 0.115);

    assert_close(s.data_points[0].co2_sequestered, 0.4 * CO2_PER_C);
    assert_close(s.data_points[1].co2_sequestered, 0.4 * CO2_PER_C * 0.65);
    assert_close(res.efficiency_ratio, 0.4 * CO2_PER_C * 0.65 / 0.5);
}

#[test]
fn permanence_never_increases_with_time() {
    for &temp in CALIBRATION_TEMPERATURES.iter() {
        for hc in [0.0, 0.2, 0.35, 0.5, 0.7] {
            let inputs = CalculatorInputs {
                hc_ratio: hc,
                selected_soil_temps: vec![temp],
                ..Default::default()
            };
            let res = calculate_sequestration(&inputs);
            let points = &res.scenarios[0].data_points;
            for pair in points.windows(2) {
                assert!(
                    pair[1].f_perm <= pair[0].f_perm,
                    "fPerm rose from year {} to {} at {temp}°C, H/C {hc}",
                    pair[0].year,
                    pair[1].year
                );
                assert!((0.0..=1.0).contains(&pair[1].f_perm));
            }
        }
    }
}

#[test]
fn units_are_interchangeable() {
    let base = CalculatorInputs { selected_soil_temps: vec![10.9], ..Default::default() };
    let in_grams =
        CalculatorInputs { mass_input: 1_000_000.0, mass_unit: MassUnit::Gram, ..base.clone() };
    let in_kilos =
        CalculatorInputs { mass_input: 1000.0, mass_unit: MassUnit::Kilogram, ..base.clone() };

    let expected = calculate_sequestration(&base);
    for other in [in_grams, in_kilos] {
        let res = calculate_sequestration(&other);
        assert_close(res.total_carbon_mass, expected.total_carbon_mass);
        for (a, b) in res.scenarios[0].data_points.iter().zip(&expected.scenarios[0].data_points) {
            assert_close(a.co2_sequestered, b.co2_sequestered);
        }
    }
}

#[test]
fn very_labile_char_has_no_long_term_permanence() {
    let inputs =
        CalculatorInputs { hc_ratio: 2.0, selected_soil_temps: vec![5.0], ..Default::default() };
    let res = calculate_sequestration(&inputs);
    for p in &res.scenarios[0].data_points[1..] {
        assert_eq!(p.f_perm, 0.0);
        assert_eq!(p.co2_sequestered, 0.0);
    }
    assert_eq!(res.efficiency_ratio, 0.0);
}

struct Fixed(&'static str);

#[async_trait]
impl TextGenerator for Fixed {
    async fn generate(&self, _request: &InsightRequest) -> Result<String, NarrativeError> {
        Ok(self.0.to_string())
    }
}

#[test]
fn shared_result_is_stored_and_described() {
    let db = std::env::temp_dir().join(format!("biochar_integration_{}.db", std::process::id()));
    let _ = std::fs::remove_file(&db);

    let inputs = CalculatorInputs {
        project: ProjectInfo {
            researcher_name: "J. Costa".into(),
            institution: "UFC".into(),
            ..Default::default()
        },
        sample_name: "CNS-500".into(),
        data_authorization: true,
        ..Default::default()
    };
    let results = vec![calculate_sequestration(&inputs)];
    let snapshot = results.clone();

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build().unwrap();
    let (tx, mut rx) = unbounded_channel();
    let tasks = spawn_collaborators(
        &runtime,
        &results,
        db.clone(),
        Some(Arc::new(Fixed("**High** aromaticity, credit eligible."))),
        tx,
    );
    assert!(tasks.wait_with(Duration::from_secs(10), || {}));
    let insights = tasks.collect_insights(&runtime);

    assert_eq!(insights, vec!["High aromaticity, credit eligible."]);
    assert_eq!(results, snapshot);

    let mut saved = None;
    while let Ok(ev) = rx.try_recv() {
        if let ServiceEvent::Persist(PersistEvent::Saved { sample, .. }) = ev {
            saved = Some(sample);
        }
    }
    assert_eq!(saved.as_deref(), Some("CNS-500"));

    let conn = Connection::open(&db).unwrap();
    let records = load_records(&conn, None).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].institution, "UFC");
    assert_close(records[0].biochar_mass_ton, 1.0);
    drop(conn);
    let _ = std::fs::remove_file(&db);
}
