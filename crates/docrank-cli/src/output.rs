use std::io::Write;

use docrank_core::ProgressEvent;
use docrank_ingest::{BatchSummary, Collection, CollectionOutcome};
use docrank_reporting::Output;
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Spinner text for events that mark a long-running step, if any.
pub fn spinner_message(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::CollectionStarted { id, documents } => {
            Some(format!("{id}: extracting {documents} documents"))
        }
        ProgressEvent::Refining {
            index,
            total,
            document,
            page_number,
        } => Some(format!(
            "refining [{}/{}] {} p.{}",
            index + 1,
            total,
            document,
            page_number
        )),
        _ => None,
    }
}

/// Print a real-time progress event.
pub fn print_progress(
    w: &mut dyn Write,
    event: &ProgressEvent,
    color: ColorMode,
) -> std::io::Result<()> {
    match event {
        ProgressEvent::CollectionStarted { id, documents } => {
            if color.enabled() {
                writeln!(w, "{} ({} documents)", id.bold(), documents)?;
            } else {
                writeln!(w, "{} ({} documents)", id, documents)?;
            }
        }
        ProgressEvent::DocumentExtracted {
            document,
            candidates,
        } => {
            writeln!(w, "  {}: {} candidates", document, candidates)?;
        }
        ProgressEvent::DocumentFailed { document, error } => {
            if color.enabled() {
                writeln!(w, "  {} {}: {}", "FAILED".red(), document, error.dimmed())?;
            } else {
                writeln!(w, "  FAILED {}: {}", document, error)?;
            }
        }
        ProgressEvent::Ranked {
            selected,
            candidates,
            ..
        } => {
            writeln!(w, "  ranked {} of {} candidates", selected, candidates)?;
        }
        ProgressEvent::Refining { .. } => {
            // Shown on the spinner only
        }
        ProgressEvent::CollectionWritten { path, .. } => {
            if color.enabled() {
                writeln!(w, "  {} {}", "->".green(), path.display())?;
            } else {
                writeln!(w, "  -> {}", path.display())?;
            }
        }
        ProgressEvent::CollectionSkipped { reason, .. } => {
            if color.enabled() {
                writeln!(w, "  {} {}", "SKIPPED:".yellow(), reason)?;
            } else {
                writeln!(w, "  SKIPPED: {}", reason)?;
            }
        }
        ProgressEvent::CollectionFailed { error, .. } => {
            if color.enabled() {
                writeln!(w, "  {} {}", "ERROR:".red().bold(), error)?;
            } else {
                writeln!(w, "  ERROR: {}", error)?;
            }
        }
    }
    Ok(())
}

/// Print the ranking of a dry-run collection.
pub fn print_dry_run(
    w: &mut dyn Write,
    id: &str,
    output: &Output,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "DRY RUN:".bold().cyan(), id.bold())?;
    } else {
        writeln!(w, "DRY RUN: {}", id)?;
    }
    for (section, analysis) in output
        .extracted_sections
        .iter()
        .zip(&output.subsection_analysis)
    {
        writeln!(
            w,
            "  {}. {} (p.{}) {}",
            section.importance_rank, section.document, section.page_number, section.section_title
        )?;
        let text: String = analysis.refined_text.split_whitespace().collect::<Vec<_>>().join(" ");
        if color.enabled() {
            writeln!(w, "     {}", text.dimmed())?;
        } else {
            writeln!(w, "     {}", text)?;
        }
    }
    Ok(())
}

/// Print the end-of-batch summary.
pub fn print_summary(
    w: &mut dyn Write,
    summary: &BatchSummary,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    let failed = summary.failed();
    let skipped = summary.skipped();
    let ok = summary.succeeded();
    if color.enabled() {
        writeln!(
            w,
            "{} {} ok, {} skipped, {} failed",
            "Summary:".bold(),
            ok.to_string().green(),
            skipped.to_string().yellow(),
            if failed > 0 {
                failed.to_string().red().to_string()
            } else {
                failed.to_string()
            }
        )?;
    } else {
        writeln!(w, "Summary: {} ok, {} skipped, {} failed", ok, skipped, failed)?;
    }
    for outcome in &summary.outcomes {
        if let CollectionOutcome::Failed { id, error } = outcome {
            writeln!(w, "  {}: {}", id, error)?;
        }
    }
    if summary.cancelled {
        writeln!(w, "Cancelled before all collections were processed.")?;
    }
    Ok(())
}

/// Print one discovered collection for `docrank list`.
pub fn print_collection(
    w: &mut dyn Write,
    collection: &Collection,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", collection.id.bold(), collection.dir.display().dimmed())?;
    } else {
        writeln!(w, "{} {}", collection.id, collection.dir.display())?;
    }
    writeln!(w, "  persona: {}", collection.persona())?;
    writeln!(w, "  job:     {}", collection.job())?;
    for (path, name) in collection.pdfs.iter().zip(&collection.input_documents) {
        let marker = if path.is_file() { " " } else { "!" };
        writeln!(w, "  {} {}", marker, name)?;
    }
    Ok(())
}
