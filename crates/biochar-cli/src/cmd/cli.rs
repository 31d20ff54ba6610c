use biochar_core::biomass::{AcademicLevel, BiomassType};
use biochar_core::inputmode::InputMode;
use biochar_core::inputs::CalculatorInputs;
use biochar_core::massunit::MassUnit;
use biochar_core::narrative::{GeminiConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};

use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;
use std::time::Duration;

use crate::cmd::config::{
    Action, Calculate as CalculateCfg, Config, ExportRecords, InputSource, ListRecords, Outputs,
};

#[derive(Debug, Parser)]
#[command(
    name = "biochar",
    about = "Biochar carbon sequestration calculator (Woolf et al. 2021 permanence model)",
    version,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Path to SQLite database for shared research records
    #[arg(long = "db", value_name = "PATH", default_value = "biochar.db", global = true)]
    pub db_path: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Calculate sequestration for one sample (flags) or many (JSON files)
    Calculate(CalculateArgs),

    /// Research records shared by earlier calculations
    Records {
        #[command(subcommand)]
        cmd: RecordsCmd,
    },
}

/* ----------------------- calculate ----------------------- */

#[derive(Debug, Args)]
pub struct CalculateArgs {
    /// JSON input files or glob patterns (quote the pattern). Sample flags are ignored when given
    #[arg(num_args = 1..,
        value_hint = ValueHint::AnyPath,
        short = 'i', long = "inputs",
        value_name = "Input files")]
    pub inputs: Vec<String>,

    #[command(flatten)]
    pub sample: SampleArgs,

    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub insight: InsightArgs,

    /// Write every scenario point to a CSV file
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Write a printable HTML report (one file per sample when batching)
    #[arg(long, value_name = "PATH")]
    pub html: Option<PathBuf>,

    /// Write the full results as JSON
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SampleArgs {
    /// Sample identifier
    #[arg(long = "sample")]
    pub sample_name: Option<String>,

    /// Biomass source, e.g. cashew_shell, sugarcane_bagasse
    #[arg(long)]
    pub biomass: Option<BiomassType>,

    /// Treat the mass as feedstock and apply the pyrolysis yield
    #[arg(long)]
    pub feedstock: bool,

    /// Mass of biochar (or feedstock with --feedstock)
    #[arg(short = 'm', long)]
    pub mass: Option<f64>,

    /// Unit of --mass: g, kg or t
    #[arg(short = 'u', long)]
    pub unit: Option<MassUnit>,

    /// Pyrolysis yield in percent (feedstock mode only)
    #[arg(long = "yield")]
    pub biochar_yield: Option<f64>,

    /// Pyrolysis temperature in °C
    #[arg(long = "pyrolysis-temp")]
    pub pyrolysis_temp: Option<f64>,

    /// Organic carbon content in percent
    #[arg(short = 'c', long = "carbon")]
    pub carbon_content: Option<f64>,

    /// Molar H/C ratio
    #[arg(long = "hc")]
    pub hc_ratio: Option<f64>,

    /// Molar O/C ratio
    #[arg(long = "oc")]
    pub oc_ratio: Option<f64>,

    /// Soil temperature scenarios in °C, up to three (5, 10, 10.9, 14.9, 15, 20, 25)
    #[arg(short = 't', long = "soil-temp", num_args = 1..=3, value_name = "°C")]
    pub soil_temps: Vec<f64>,
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    #[arg(long = "researcher")]
    pub researcher_name: Option<String>,

    /// undergraduate, masters, phd, postdoc or other
    #[arg(long = "level")]
    pub academic_level: Option<AcademicLevel>,

    #[arg(long = "title")]
    pub research_title: Option<String>,

    #[arg(long = "advisor")]
    pub advisor_name: Option<String>,

    #[arg(long)]
    pub institution: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub state: Option<String>,

    /// Authorize storing the sample in the research database
    #[arg(long = "share")]
    pub data_authorization: bool,
}

#[derive(Debug, Args)]
pub struct InsightArgs {
    /// Skip the generated technical insight
    #[arg(long = "no-insight")]
    pub no_insight: bool,

    /// API key for the text generation service
    #[arg(long = "api-key", env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, default_value = DEFAULT_ENDPOINT, hide = true)]
    pub endpoint: String,

    /// Seconds to wait for background work before giving up on it
    #[arg(long = "timeout", default_value_t = 20)]
    pub timeout_secs: u64,
}

impl SampleArgs {
    fn apply(self, inputs: &mut CalculatorInputs) {
        if let Some(v) = self.sample_name {
            inputs.sample_name = v;
        }
        if let Some(v) = self.biomass {
            inputs.biomass_type = v;
        }
        if self.feedstock {
            inputs.input_mode = InputMode::Feedstock;
        }
        if let Some(v) = self.mass {
            inputs.mass_input = v;
        }
        if let Some(v) = self.unit {
            inputs.mass_unit = v;
        }
        if let Some(v) = self.biochar_yield {
            inputs.biochar_yield = v;
        }
        if let Some(v) = self.pyrolysis_temp {
            inputs.pyrolysis_temp = v;
        }
        if let Some(v) = self.carbon_content {
            inputs.carbon_content = v;
        }
        if let Some(v) = self.hc_ratio {
            inputs.hc_ratio = v;
        }
        if let Some(v) = self.oc_ratio {
            inputs.oc_ratio = v;
        }
        if !self.soil_temps.is_empty() {
            inputs.selected_soil_temps = self.soil_temps;
        }
    }
}

impl ProjectArgs {
    fn apply(self, inputs: &mut CalculatorInputs) {
        let p = &mut inputs.project;
        for (field, value) in [
            (&mut p.researcher_name, self.researcher_name),
            (&mut p.research_title, self.research_title),
            (&mut p.advisor_name, self.advisor_name),
            (&mut p.institution, self.institution),
            (&mut p.city, self.city),
            (&mut p.state, self.state),
        ] {
            if let Some(v) = value {
                *field = v;
            }
        }
        if let Some(level) = self.academic_level {
            p.academic_level = level;
        }
        inputs.data_authorization = self.data_authorization;
    }
}

/* ----------------------- records ----------------------- */

#[derive(Debug, Subcommand)]
pub enum RecordsCmd {
    /// Print stored records, newest first
    List {
        /// Show at most this many records
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Timezone for the collection timestamps, e.g. America/Sao_Paulo
        #[arg(short = 'z', long = "tz", default_value = "UTC")]
        tz: Tz,
    },

    /// Export every stored record to CSV
    Export {
        #[arg(short = 'o', long = "output", value_name = "PATH")]
        output: PathBuf,
    },
}

// -------- Map CLI -> Config/Action types --------

impl Cli {
    pub fn into_config(self) -> Config {
        let db_path = PathBuf::from(self.db_path);

        match self.command {
            Commands::Calculate(args) => {
                let source = if args.inputs.is_empty() {
                    let mut inputs = CalculatorInputs::default();
                    args.sample.apply(&mut inputs);
                    args.project.apply(&mut inputs);
                    InputSource::Inline(Box::new(inputs))
                } else {
                    InputSource::Files(args.inputs)
                };

                let timeout = Duration::from_secs(args.insight.timeout_secs);
                let gemini = (!args.insight.no_insight).then(|| GeminiConfig {
                    api_key: args.insight.api_key,
                    model: args.insight.model,
                    endpoint: args.insight.endpoint,
                    timeout,
                });

                Config {
                    db_path,
                    event_receiver: None,
                    action: Action::Calculate(CalculateCfg {
                        source,
                        gemini,
                        timeout,
                        outputs: Outputs { csv: args.csv, html: args.html, json: args.json },
                    }),
                }
            },

            Commands::Records { cmd } => match cmd {
                RecordsCmd::List { limit, tz } => Config {
                    db_path,
                    event_receiver: None,
                    action: Action::ListRecords(ListRecords { limit, tz }),
                },
                RecordsCmd::Export { output } => Config {
                    db_path,
                    event_receiver: None,
                    action: Action::ExportRecords(ExportRecords { output }),
                },
            },
        }
    }
}
