//! Measure command-line interface

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use octofhir_measure::cli::{
    care_gaps, collect, content, evaluate, output, submit, workspace::WorkspaceConfig,
};
use octofhir_measure::{CareGapsRequest, CollectDataRequest, EvaluateMeasureRequest, MeasureError};
use std::path::PathBuf;

/// Clinical quality measure tool
#[derive(Parser)]
#[command(name = "measure")]
#[command(author, version, about = "Clinical quality measure evaluation and care gaps", long_about = None)]
struct Cli {
    /// Resource file or directory (JSON resources or Bundles)
    #[arg(short, long, global = true)]
    data: Vec<PathBuf>,

    /// Pre-computed MeasureReport file or directory
    #[arg(short, long, global = true)]
    reports: Vec<PathBuf>,

    /// Service configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, pretty)
    #[arg(short = 'f', long, default_value = "pretty", global = true)]
    format: output::OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Period {
    /// Start of the measurement period
    #[arg(long = "period-start")]
    start: String,

    /// End of the measurement period
    #[arg(long = "period-end")]
    end: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a measure ($evaluate-measure)
    Evaluate {
        /// Measure id
        measure: String,

        #[command(flatten)]
        period: Period,

        /// Report type (patient, patient-list, population)
        #[arg(short = 't', long = "report-type")]
        report_type: Option<String>,

        /// Subject (Patient/<id> or <id>)
        #[arg(short, long)]
        subject: Option<String>,

        /// Practitioner whose subjects are evaluated (patient-list)
        #[arg(long)]
        practitioner: Option<String>,

        /// Product line recorded on the report
        #[arg(long = "product-line")]
        product_line: Option<String>,

        /// Only data received on or after this date
        #[arg(long = "last-received-on")]
        last_received_on: Option<String>,
    },

    /// Build care-gap documents ($care-gaps)
    CareGaps {
        #[command(flatten)]
        period: Period,

        /// Subject (Patient/<id> or <id>)
        #[arg(short, long)]
        subject: Option<String>,

        /// Comma-separated subjects, takes precedence over --subject
        #[arg(long = "subject-group")]
        subject_group: Option<String>,

        /// Measure topic ([system|]code)
        #[arg(long)]
        topic: Option<String>,
    },

    /// Collect a report with the resources it was evaluated from ($collect-data)
    CollectData {
        /// Measure id
        measure: String,

        #[command(flatten)]
        period: Period,

        /// Subject (Patient/<id> or <id>)
        #[arg(short, long)]
        subject: Option<String>,

        /// Only data received on or after this date
        #[arg(long = "last-received-on")]
        last_received_on: Option<String>,
    },

    /// Submit a report and resources as one transaction ($submit-data)
    SubmitData {
        /// Measure id
        measure: String,

        /// MeasureReport file
        #[arg(long)]
        report: PathBuf,

        /// Resource or Bundle files
        resources: Vec<PathBuf>,
    },

    /// Compute the data requirements of a measure ($data-requirements)
    DataRequirements {
        /// Measure id
        measure: String,

        /// Start of the measurement period
        #[arg(long = "period-start")]
        period_start: Option<String>,

        /// End of the measurement period
        #[arg(long = "period-end")]
        period_end: Option<String>,
    },

    /// Refresh dependencies and narrative of a measure ($refresh-generated-content)
    Refresh {
        /// Measure id
        measure: String,
    },

    /// Print the generated narrative of a measure ($get-narrative)
    Narrative {
        /// Measure id
        measure: String,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let workspace = WorkspaceConfig {
        data: cli.data,
        reports: cli.reports,
        config: cli.config,
        verbose: cli.verbose,
    };
    let target = output::OutputTarget {
        format: cli.format,
        file: cli.output,
    };

    match cli.command {
        Commands::Evaluate {
            measure,
            period,
            report_type,
            subject,
            practitioner,
            product_line,
            last_received_on,
        } => {
            let request = EvaluateMeasureRequest {
                measure_id: measure,
                period_start: period.start,
                period_end: period.end,
                report_type,
                subject,
                practitioner,
                product_line,
                last_received_on,
            };
            evaluate::evaluate(evaluate::EvaluateConfig {
                workspace,
                request,
                output: target,
            })
            .await
        }

        Commands::CareGaps {
            period,
            subject,
            subject_group,
            topic,
        } => {
            let request = CareGapsRequest {
                period_start: period.start,
                period_end: period.end,
                subject,
                subject_group,
                topic,
            };
            care_gaps::care_gaps(care_gaps::CareGapsConfig {
                workspace,
                request,
                output: target,
            })
            .await
        }

        Commands::CollectData {
            measure,
            period,
            subject,
            last_received_on,
        } => {
            let request = CollectDataRequest {
                measure_id: measure,
                period_start: period.start,
                period_end: period.end,
                subject,
                last_received_on,
            };
            collect::collect_data(collect::CollectConfig {
                workspace,
                request,
                output: target,
            })
            .await
        }

        Commands::SubmitData {
            measure,
            report,
            resources,
        } => {
            submit::submit_data(submit::SubmitConfig {
                workspace,
                measure_id: measure,
                report,
                resources,
                output: target,
            })
            .await
        }

        Commands::DataRequirements {
            measure,
            period_start,
            period_end,
        } => {
            let config = content::ContentConfig {
                workspace,
                measure_id: measure,
                output: target,
            };
            content::data_requirements(config, period_start, period_end).await
        }

        Commands::Refresh { measure } => {
            content::refresh(content::ContentConfig {
                workspace,
                measure_id: measure,
                output: target,
            })
            .await
        }

        Commands::Narrative { measure } => {
            content::narrative(content::ContentConfig {
                workspace,
                measure_id: measure,
                output: target,
            })
            .await
        }
    }
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(&cli.color);
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{}", output::format_error(&e));
        if let Some(measure_error) = e.downcast_ref::<MeasureError>() {
            eprintln!("{}", output::format_diagnostic(&measure_error.to_diagnostic()));
        }
        std::process::exit(1);
    }
}
