use crate::calculator::CalculationResult;
use crate::db::ResearchRecord;
use crate::stability::assess;

use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ScenarioRow<'a> {
    sample_id: &'a str,
    biomass_type: String,
    input_mode: String,
    soil_temp_c: f64,
    chc_100: f64,
    mhc_100: f64,
    year: u32,
    f_perm: f64,
    co2_sequestered_t: f64,
    biochar_mass_t: f64,
    carbon_mass_t: f64,
    efficiency_ratio: f64,
}

/// One row per scenario and time point, for every result given.
pub fn write_results_csv<W: Write>(
    results: &[CalculationResult],
    writer: W,
) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for res in results {
        for scenario in &res.scenarios {
            for p in &scenario.data_points {
                wtr.serialize(ScenarioRow {
                    sample_id: &res.inputs.sample_name,
                    biomass_type: res.inputs.biomass_type.to_string(),
                    input_mode: res.inputs.input_mode.to_string(),
                    soil_temp_c: scenario.temp,
                    chc_100: scenario.chc,
                    mhc_100: scenario.mhc,
                    year: p.year,
                    f_perm: p.f_perm,
                    co2_sequestered_t: p.co2_sequestered,
                    biochar_mass_t: res.total_biochar_mass,
                    carbon_mass_t: res.total_carbon_mass,
                    efficiency_ratio: res.efficiency_ratio,
                })?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_records_csv<W: Write>(
    records: &[ResearchRecord],
    writer: W,
) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_results_json<W: Write>(
    results: &[CalculationResult],
    writer: W,
) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(writer, results)?;
    Ok(())
}

pub fn create_file<P: AsRef<Path>>(path: P) -> Result<File, ReportError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}

/// Plain-text summary for the terminal.
pub fn format_summary(res: &CalculationResult) -> String {
    let inputs = &res.inputs;
    let stability = assess(inputs.hc_ratio, inputs.oc_ratio);
    let mut out = String::new();

    let _ = writeln!(out, "Sample: {} ({})", inputs.sample_name, inputs.biomass_type);
    let _ = writeln!(
        out,
        "Input: {} {} as {}",
        inputs.mass_input,
        inputs.mass_unit,
        inputs.input_mode.to_string().to_lowercase()
    );
    let _ = writeln!(out, "Biochar mass: {:.4} t", res.total_biochar_mass);
    let _ = writeln!(out, "Carbon mass:  {:.4} t", res.total_carbon_mass);
    let _ = writeln!(
        out,
        "Stability: {} (H/C {:.2}, O/C {:.2}, {})",
        stability.class, inputs.hc_ratio, inputs.oc_ratio, stability.zone
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>8} {:>6} {:>8} {:>8} {:>14}",
        "soil °C", "year", "chc/mhc", "fPerm", "tCO2e"
    );
    for s in &res.scenarios {
        for p in &s.data_points {
            let coeffs = if p.year == 100 { format!("{}/{}", s.chc, s.mhc) } else { String::new() };
            let _ = writeln!(
                out,
                "{:>8} {:>6} {:>8} {:>8.3} {:>14.4}",
                s.temp, p.year, coeffs, p.f_perm, p.co2_sequestered
            );
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Efficiency: {:.3} tCO2e per t biochar (100 years)",
        res.efficiency_ratio
    );
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Standalone printable report. `insight` may be empty, in which case the
/// section is left out.
pub fn render_html(res: &CalculationResult, insight: &str) -> String {
    let inputs = &res.inputs;
    let p = &inputs.project;
    let stability = assess(inputs.hc_ratio, inputs.oc_ratio);

    let mut html = String::from(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>Biochar sequestration report</title>
  <style>
    body { font-family: Arial, sans-serif; color: #0f172a; padding: 20px; }
    table { border-collapse: collapse; margin-bottom: 16px; }
    th, td { border: 1px solid #cbd5e1; text-align: right; padding: 6px 10px; }
    th { background-color: #f1f5f9; }
    td.label { text-align: left; }
    .insight { background-color: #ecfdf5; border: 1px solid #a7f3d0; padding: 12px; }
  </style>
</head>
<body>
"#,
    );

    let _ = writeln!(html, "  <h1>Sample {}</h1>", escape_html(&inputs.sample_name));
    html.push_str("  <table>\n");
    for (label, value) in [
        ("Researcher", p.researcher_name.clone()),
        ("Level", p.academic_level.to_string()),
        ("Research title", p.research_title.clone()),
        ("Advisor", p.advisor_name.clone()),
        ("Institution", p.institution.clone()),
        ("Location", [p.city.as_str(), p.state.as_str()].join(" / ")),
        ("Biomass", inputs.biomass_type.to_string()),
        ("Pyrolysis temperature", format!("{} °C", inputs.pyrolysis_temp)),
        ("Carbon content", format!("{} %", inputs.carbon_content)),
        ("H/C, O/C", format!("{:.2}, {:.2}", inputs.hc_ratio, inputs.oc_ratio)),
        ("Biochar mass", format!("{:.4} t", res.total_biochar_mass)),
        ("Carbon mass", format!("{:.4} t", res.total_carbon_mass)),
        ("Chemical stability", format!("{} ({:.0} %)", stability.class, stability.gauge_percent)),
        ("Van Krevelen region", stability.zone.to_string()),
        ("Efficiency", format!("{:.3} tCO2e/t biochar", res.efficiency_ratio)),
    ] {
        let _ = writeln!(
            html,
            "    <tr><td class=\"label\">{}</td><td>{}</td></tr>",
            label,
            escape_html(&value)
        );
    }
    html.push_str("  </table>\n");

    html.push_str(
        "  <table>\n    <tr><th>Soil °C</th><th>Year</th><th>fPerm</th><th>tCO2e</th></tr>\n",
    );
    for s in &res.scenarios {
        for pt in &s.data_points {
            let _ = writeln!(
                html,
                "    <tr><td>{}</td><td>{}</td><td>{:.3}</td><td>{:.4}</td></tr>",
                s.temp, pt.year, pt.f_perm, pt.co2_sequestered
            );
        }
    }
    html.push_str("  </table>\n");

    if !insight.is_empty() {
        let _ = writeln!(
            html,
            "  <div class=\"insight\"><strong>Technical insight</strong><p>{}</p></div>",
            escape_html(insight)
        );
    }

    html.push_str(
        "  <p><small>Permanence after Woolf et al. (2021), \
         https://doi.org/10.1021/acs.est.1c02425</small></p>\n</body>\n</html>\n",
    );
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::calculate_sequestration;
    use crate::inputs::CalculatorInputs;

    #[test]
    fn test_csv_has_row_per_point() {
        let inputs =
            CalculatorInputs { selected_soil_temps: vec![5.0, 20.0], ..Default::default() };
        let res = calculate_sequestration(&inputs);
        let mut buf = Vec::new();
        write_results_csv(&[res], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 2 * 4);
        assert!(lines[0].starts_with("sample_id,biomass_type,input_mode,soil_temp_c"));
        assert!(lines[1].starts_with("Sample 01,Cashew nut shell,Direct biochar,"));
        assert!(lines[1].contains(",1.13,-0.46,0,"));
    }

    #[test]
    fn test_html_escapes_and_omits_empty_insight() {
        let inputs =
            CalculatorInputs { sample_name: "<script>".into(), ..Default::default() };
        let res = calculate_sequestration(&inputs);
        let html = render_html(&res, "");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("Technical insight"));

        let with_insight = render_html(&res, "Stable & aromatic");
        assert!(with_insight.contains("Stable &amp; aromatic"));
    }

    #[test]
    fn test_summary_lists_every_point() {
        let res = calculate_sequestration(&CalculatorInputs::default());
        let summary = format_summary(&res);
        assert!(summary.contains("Stability: High"));
        assert!(summary.contains("1.04/-0.64"));
        assert!(summary.contains("2.2440"));
        assert!(summary.contains("Efficiency: 2.244"));
    }
}
