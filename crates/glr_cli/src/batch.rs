//! Parallel processing of independent reports against one template
//!
//! Each report gets its own extraction call and its own copy of the filled
//! document; only the loaded template and the pipeline configuration are
//! shared, read-only.

use anyhow::{bail, Result};
use extraction::LlmClient;
use pipeline::{read_report_text, report_path_for, Pipeline};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use store::TemplateDocument;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

pub struct BatchPlan {
    pub output_dir: PathBuf,
    pub write_report: bool,
    /// Reports processed at once
    pub jobs: usize,
}

/// Process every report on the blocking pool, at most `plan.jobs` at a time.
/// Fails after all reports have been attempted if any of them failed.
pub fn run<C>(
    pipeline: Pipeline<C>,
    template: TemplateDocument,
    template_label: String,
    reports: Vec<PathBuf>,
    plan: BatchPlan,
) -> Result<()>
where
    C: LlmClient + Send + Sync + 'static,
{
    std::fs::create_dir_all(&plan.output_dir)?;
    let total = reports.len();

    let outputs = output_paths(&plan.output_dir, &reports);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let pipeline = Arc::new(pipeline);
    let template = Arc::new(template);

    let failed = runtime.block_on(async {
        let permits = Arc::new(Semaphore::new(plan.jobs.max(1)));
        let mut handles = Vec::with_capacity(total);

        for (report, output) in reports.into_iter().zip(outputs) {
            let permit = Arc::clone(&permits).acquire_owned().await?;
            let pipeline = Arc::clone(&pipeline);
            let template = Arc::clone(&template);
            let label = template_label.clone();
            let write_report = plan.write_report;

            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let outcome = process_one(&pipeline, &template, &label, &report, &output, write_report);
                (report, output, outcome)
            }));
        }

        let mut failed = 0usize;
        for handle in handles {
            let (report, output, outcome) = handle.await?;
            match outcome {
                Ok(summary) => {
                    info!(report = %report.display(), output = %output.display(), "{}", summary);
                    println!("{} -> {}", report.display(), output.display());
                }
                Err(err) => {
                    failed += 1;
                    error!(report = %report.display(), "Report failed: {:#}", err);
                }
            }
        }
        Ok::<usize, anyhow::Error>(failed)
    })?;

    if failed > 0 {
        bail!("{} of {} report(s) failed", failed, total);
    }
    info!(reports = total, "Batch complete");
    Ok(())
}

fn process_one<C: LlmClient>(
    pipeline: &Pipeline<C>,
    template: &TemplateDocument,
    label: &str,
    report: &Path,
    output: &Path,
    write_report: bool,
) -> Result<String> {
    let text = read_report_text(report)?;
    let result = pipeline.run(&text, template, label)?;
    result.document.save(output)?;
    if write_report {
        result.audit.write(&report_path_for(output))?;
    }
    Ok(result.audit.summary())
}

/// One output per report, named after its stem: `reports/site-7.pdf` ->
/// `<dir>/site-7.docx`. Stems already taken get `-2`, `-3`, ... so no two
/// jobs write the same file.
fn output_paths(dir: &Path, reports: &[PathBuf]) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    reports
        .iter()
        .map(|report| {
            let stem = report
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "report".to_string());
            let mut output = dir.join(format!("{}.docx", stem));
            let mut n = 2;
            while !taken.insert(output.clone()) {
                output = dir.join(format!("{}-{}.docx", stem, n));
                n += 1;
            }
            if n > 2 {
                warn!(report = %report.display(), output = %output.display(), "Output name already used, renamed");
            }
            output
        })
        .collect()
}
