//! `glr` - fill inspection report templates from the command line

mod batch;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pipeline::{report_path_for, FillRequest, Pipeline, PipelineSettings};
use std::path::{Path, PathBuf};
use store::{sample_template, TemplateDocument};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "glr")]
#[command(about = "Fill .docx report templates from inspection reports")]
#[command(version)]
struct Cli {
    /// JSON settings file (model, narratives, audit report)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract, map and fill one report
    Fill {
        #[arg(long, value_name = "DOCX")]
        template: PathBuf,
        /// Inspection report, `.pdf` or plain text
        #[arg(long, value_name = "FILE")]
        report: PathBuf,
        #[arg(long, value_name = "DOCX")]
        output: PathBuf,
        /// Skip narrative generation
        #[arg(long)]
        no_narrative: bool,
        /// Where to write the audit JSON (default: next to the output)
        #[arg(long, value_name = "FILE")]
        report_json: Option<PathBuf>,
    },
    /// List a template's placeholders and show its text
    Inspect {
        #[arg(long, value_name = "DOCX")]
        template: PathBuf,
        /// Print an empty placeholder mapping as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Fill one template from many reports in parallel
    Batch {
        #[arg(long, value_name = "DOCX")]
        template: PathBuf,
        #[arg(long, value_name = "DIR")]
        output_dir: PathBuf,
        #[arg(long)]
        no_narrative: bool,
        /// Upper bound on reports processed at once
        #[arg(long, default_value_t = 4)]
        jobs: usize,
        #[arg(required = true, value_name = "REPORT")]
        reports: Vec<PathBuf>,
    },
    /// Write the built-in sample template
    SampleTemplate {
        #[arg(long, value_name = "DOCX")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fill {
            template,
            report,
            output,
            no_narrative,
            report_json,
        } => {
            let settings = load_settings(cli.settings.as_deref(), no_narrative)?;
            let audit_path = match report_json {
                Some(path) => Some(path),
                None if settings.write_report => Some(report_path_for(&output)),
                None => None,
            };
            let pipeline = Pipeline::from_settings(&settings)?;
            let request = FillRequest::new(template, report, &output).with_audit_path(audit_path);
            let result = pipeline.process(&request)?;
            println!("{}", result.audit.summary());
            println!("Wrote {}", output.display());
        }
        Commands::Inspect { template, json } => inspect(&template, json)?,
        Commands::Batch {
            template,
            output_dir,
            no_narrative,
            jobs,
            reports,
        } => {
            let settings = load_settings(cli.settings.as_deref(), no_narrative)?;
            let pipeline = Pipeline::from_settings(&settings)?;
            let label = template.display().to_string();
            let template = TemplateDocument::load(&template)
                .with_context(|| format!("loading template {}", template.display()))?;
            let plan = batch::BatchPlan {
                output_dir,
                write_report: settings.write_report,
                jobs,
            };
            batch::run(pipeline, template, label, reports, plan)?;
        }
        Commands::SampleTemplate { output } => {
            sample_template()?.save(&output)?;
            info!(path = %output.display(), "Wrote sample template");
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}

fn load_settings(path: Option<&Path>, no_narrative: bool) -> Result<PipelineSettings> {
    let mut settings = PipelineSettings::load(path)?;
    if no_narrative {
        settings.narratives_enabled = false;
    }
    settings.validate()?;
    Ok(settings)
}

fn inspect(path: &Path, json: bool) -> Result<()> {
    let template = TemplateDocument::load(path)
        .with_context(|| format!("loading template {}", path.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&template.placeholder_template())?);
        return Ok(());
    }

    let placeholders = template.discover();
    println!("{} placeholder(s):", placeholders.len());
    for name in &placeholders {
        println!("  {}", name);
    }
    println!();
    println!("{}", template.plain_text());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_arguments() {
        let cli = Cli::try_parse_from([
            "glr", "fill", "--template", "t.docx", "--report", "r.pdf", "--output", "o.docx",
            "--no-narrative",
        ])
        .unwrap();
        match cli.command {
            Commands::Fill { report, no_narrative, report_json, .. } => {
                assert_eq!(report, PathBuf::from("r.pdf"));
                assert!(no_narrative);
                assert!(report_json.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_batch_requires_reports() {
        assert!(Cli::try_parse_from(["glr", "batch", "--template", "t.docx", "--output-dir", "out"]).is_err());
        let cli = Cli::try_parse_from([
            "glr", "--settings", "s.json", "batch", "--template", "t.docx", "--output-dir", "out", "a.txt",
            "b.pdf",
        ])
        .unwrap();
        assert_eq!(cli.settings, Some(PathBuf::from("s.json")));
        assert!(matches!(cli.command, Commands::Batch { ref reports, jobs: 4, .. } if reports.len() == 2));
    }

    #[test]
    fn test_sample_template_command() {
        let cli = Cli::try_parse_from(["glr", "sample-template", "--output", "sample.docx"]).unwrap();
        assert!(matches!(cli.command, Commands::SampleTemplate { .. }));
    }
}
