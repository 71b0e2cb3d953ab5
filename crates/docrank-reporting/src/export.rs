use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use docrank_core::{Config, RefinedSection};

use crate::ReportError;
use crate::types::{ExtractedSection, Metadata, Output, SubsectionAnalysis};

/// Local wall-clock time, e.g. `2025-07-28 14:03:11.482913`.
pub fn processing_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

/// Build the output document. `sections` must already be in rank order.
pub fn assemble_output(
    input_documents: Vec<String>,
    persona: &str,
    job: &str,
    sections: &[RefinedSection],
    processing_timestamp: Option<String>,
) -> Output {
    let extracted_sections = sections
        .iter()
        .map(|s| ExtractedSection {
            document: s.ranked.candidate.document.clone(),
            section_title: s.ranked.candidate.title(),
            importance_rank: s.ranked.rank,
            page_number: s.ranked.candidate.page_number,
        })
        .collect();
    let subsection_analysis = sections
        .iter()
        .map(|s| SubsectionAnalysis {
            document: s.ranked.candidate.document.clone(),
            refined_text: s.refined_text.clone(),
            page_number: s.ranked.candidate.page_number,
        })
        .collect();

    Output {
        metadata: Metadata {
            input_documents,
            persona: persona.to_string(),
            job_to_be_done: job.to_string(),
            processing_timestamp,
        },
        extracted_sections,
        subsection_analysis,
    }
}

/// Pretty-print `output` with `indent` spaces per level. Non-ASCII text is
/// written as UTF-8, not escaped.
pub fn render_json(output: &Output, indent: usize) -> Result<String, ReportError> {
    let indent = " ".repeat(indent);
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    output.serialize(&mut ser)?;
    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Render and write `output` to `path`, creating parent directories.
pub fn write_output(output: &Output, path: &Path, indent: usize) -> Result<(), ReportError> {
    let content = render_json(output, indent)?;
    let io_err = |source| ReportError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    std::fs::write(path, content).map_err(io_err)?;
    tracing::debug!(path = %path.display(), "wrote output");
    Ok(())
}

/// Where a collection's output goes: `<output_dir>/<id>.json` when an output
/// directory is configured, else `<collection_dir>/<output_file_name>`.
pub fn output_path(config: &Config, collection_dir: &Path, id: &str) -> PathBuf {
    match &config.output_dir {
        Some(dir) => dir.join(format!("{}.json", file_stem(id))),
        None => collection_dir.join(&config.output_file_name),
    }
}

/// A collection id reduced to a single safe path component. Characters other
/// than ASCII alphanumerics, `-`, `_` and `.` become `_`.
pub fn file_stem(id: &str) -> String {
    let stem: String = id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.chars().all(|c| c == '.') {
        // "", "." and ".." would escape or name the directory itself
        format!("_{stem}")
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrank_core::{Candidate, Mode, RankedCandidate};

    fn refined(document: &str, page: usize, rank: usize, title: Option<&str>, text: &str) -> RefinedSection {
        RefinedSection {
            ranked: RankedCandidate {
                candidate: Candidate {
                    document: document.into(),
                    page_number: page,
                    section_title: title.map(str::to_string),
                    text: text.into(),
                },
                score: 0.5,
                rank,
            },
            refined_text: format!("refined {rank}"),
        }
    }

    fn sample() -> Output {
        assemble_output(
            vec!["a.pdf".into(), "b.pdf".into()],
            "Travel Planner",
            "Plan a trip",
            &[
                refined("b.pdf", 3, 1, Some("Coastal Adventures"), "body"),
                refined("a.pdf", 1, 2, None, "Côte d'Azur Guide\nmore"),
            ],
            None,
        )
    }

    #[test]
    fn assembles_in_rank_order() {
        let output = sample();
        assert_eq!(output.extracted_sections.len(), 2);
        assert_eq!(output.extracted_sections[0].section_title, "Coastal Adventures");
        assert_eq!(output.extracted_sections[0].importance_rank, 1);
        assert_eq!(output.extracted_sections[1].section_title, "Côte d'Azur Guide");
        assert_eq!(output.subsection_analysis[1].refined_text, "refined 2");
        assert_eq!(output.subsection_analysis[0].page_number, 3);
    }

    #[test]
    fn render_uses_indent_and_keeps_unicode() {
        let json = render_json(&sample(), 2).unwrap();
        assert!(json.starts_with("{\n  \"metadata\": {\n    \"input_documents\""));
        assert!(json.contains("Côte d'Azur Guide"));
        assert!(!json.contains("processing_timestamp"));

        let json4 = render_json(&sample(), 4).unwrap();
        assert!(json4.starts_with("{\n    \"metadata\""));
    }

    #[test]
    fn timestamp_is_serialized_when_present() {
        let mut output = sample();
        output.metadata.processing_timestamp = Some(processing_timestamp());
        let json = render_json(&output, 4).unwrap();
        assert!(json.contains("\"processing_timestamp\""));
        let parsed: Output = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, output);
    }

    #[test]
    fn field_order_matches_schema() {
        let json = render_json(&sample(), 2).unwrap();
        let metadata = json.find("\"metadata\"").unwrap();
        let extracted = json.find("\"extracted_sections\"").unwrap();
        let analysis = json.find("\"subsection_analysis\"").unwrap();
        assert!(metadata < extracted && extracted < analysis);
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/collection.json");
        write_output(&sample(), &path, 2).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render_json(&sample(), 2).unwrap());
    }

    #[test]
    fn output_path_respects_output_dir() {
        let mut config = Config::for_mode(Mode::Pages);
        let dir = Path::new("/data/collection_1");
        assert_eq!(
            output_path(&config, dir, "travel"),
            PathBuf::from("/data/collection_1/challenge1b_output.json")
        );
        config.output_dir = Some(PathBuf::from("/out"));
        assert_eq!(output_path(&config, dir, "travel"), PathBuf::from("/out/travel.json"));
    }

    #[test]
    fn output_path_stays_inside_output_dir() {
        let mut config = Config::for_mode(Mode::Pages);
        config.output_dir = Some(PathBuf::from("/out"));
        let dir = Path::new("/data/c");
        assert_eq!(
            output_path(&config, dir, "../../etc/passwd"),
            PathBuf::from("/out/.._.._etc_passwd.json")
        );
        assert_eq!(output_path(&config, dir, "a/b\\c"), PathBuf::from("/out/a_b_c.json"));
        assert_eq!(output_path(&config, dir, ".."), PathBuf::from("/out/_...json"));
        for id in ["../x", "/abs", "..", "", "trip planner"] {
            let path = output_path(&config, dir, id);
            assert_eq!(path.parent(), Some(Path::new("/out")), "{id:?} -> {path:?}");
        }
    }

    #[test]
    fn file_stem_keeps_safe_names() {
        assert_eq!(file_stem("travel_planner-2.v1"), "travel_planner-2.v1");
        assert_eq!(file_stem("Menu Planning"), "Menu_Planning");
        assert_eq!(file_stem(""), "_");
    }
}
