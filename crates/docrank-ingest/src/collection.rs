//! Discovery of collection directories and loading of their input JSON.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::IngestError;

/// Sub-directory holding a collection's PDFs, when present.
pub const PDF_SUBDIR: &str = "PDFs";

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionInput {
    #[serde(default)]
    pub challenge_info: Option<ChallengeInfo>,
    /// Explicit document list. When absent every PDF in the directory is used.
    #[serde(default)]
    pub documents: Option<Vec<DocumentRef>>,
    pub persona: Persona,
    pub job_to_be_done: JobToBeDone,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeInfo {
    #[serde(default)]
    pub challenge_id: Option<String>,
    #[serde(default)]
    pub test_case_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRef {
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Persona {
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobToBeDone {
    pub task: String,
}

impl CollectionInput {
    pub fn parse(json: &str, path: &Path) -> Result<Self, IngestError> {
        let input: CollectionInput =
            serde_json::from_str(json).map_err(|source| IngestError::ConfigParse {
                path: path.display().to_string(),
                source,
            })?;
        if input.persona.role.trim().is_empty() {
            return Err(IngestError::MissingField("persona.role"));
        }
        if input.job_to_be_done.task.trim().is_empty() {
            return Err(IngestError::MissingField("job_to_be_done.task"));
        }
        Ok(input)
    }

    pub fn test_case_name(&self) -> Option<&str> {
        self.challenge_info
            .as_ref()
            .and_then(|c| c.test_case_name.as_deref())
            .filter(|name| !name.trim().is_empty())
    }
}

/// A directory that contains a collection config file. Nothing has been read yet.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDir {
    pub dir: PathBuf,
    pub config_path: PathBuf,
}

impl CollectionDir {
    /// The directory name, used as identifier until the config is loaded.
    pub fn name(&self) -> String {
        self.dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.dir.display().to_string())
    }
}

/// A loaded collection ready for extraction.
#[derive(Debug, Clone)]
pub struct Collection {
    /// `challenge_info.test_case_name` if present, else the directory name.
    pub id: String,
    pub dir: PathBuf,
    pub input: CollectionInput,
    /// PDF paths in processing order, parallel to `input_documents`.
    pub pdfs: Vec<PathBuf>,
    pub input_documents: Vec<String>,
}

impl Collection {
    pub fn persona(&self) -> &str {
        &self.input.persona.role
    }

    pub fn job(&self) -> &str {
        &self.input.job_to_be_done.task
    }
}

fn io_error(path: &Path, source: std::io::Error) -> IngestError {
    IngestError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Find collections under `root`: the root itself if it holds
/// `config_file_name`, followed by every immediate sub-directory that does,
/// sorted by name.
pub fn discover_collections(
    root: &Path,
    config_file_name: &str,
) -> Result<Vec<CollectionDir>, IngestError> {
    let mut found = Vec::new();
    let root_config = root.join(config_file_name);
    if root_config.is_file() {
        found.push(CollectionDir {
            dir: root.to_path_buf(),
            config_path: root_config,
        });
    }

    let mut subdirs: Vec<PathBuf> = std::fs::read_dir(root)
        .map_err(|e| io_error(root, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();

    for dir in subdirs {
        let config_path = dir.join(config_file_name);
        if config_path.is_file() {
            found.push(CollectionDir { dir, config_path });
        }
    }
    tracing::debug!(root = %root.display(), collections = found.len(), "discovered collections");
    Ok(found)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Read the config of `entry` and resolve its PDF list.
pub fn load_collection(entry: &CollectionDir) -> Result<Collection, IngestError> {
    let json =
        std::fs::read_to_string(&entry.config_path).map_err(|e| io_error(&entry.config_path, e))?;
    let input = CollectionInput::parse(&json, &entry.config_path)?;

    let pdf_dir = {
        let sub = entry.dir.join(PDF_SUBDIR);
        if sub.is_dir() { sub } else { entry.dir.clone() }
    };

    let (pdfs, input_documents): (Vec<PathBuf>, Vec<String>) = match &input.documents {
        Some(docs) => docs
            .iter()
            .map(|d| (pdf_dir.join(&d.filename), d.filename.clone()))
            .unzip(),
        None => {
            let mut pdfs: Vec<PathBuf> = std::fs::read_dir(&pdf_dir)
                .map_err(|e| io_error(&pdf_dir, e))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_pdf(p))
                .collect();
            pdfs.sort();
            let names = pdfs
                .iter()
                .map(|p| {
                    p.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default()
                })
                .collect();
            (pdfs, names)
        }
    };

    let id = input
        .test_case_name()
        .map(str::to_string)
        .unwrap_or_else(|| entry.name());

    Ok(Collection {
        id,
        dir: entry.dir.clone(),
        input,
        pdfs,
        input_documents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const INPUT: &str = r#"{
        "challenge_info": {"challenge_id": "round_1b_002", "test_case_name": "travel_planner"},
        "documents": [{"filename": "b.pdf", "title": "B"}, {"filename": "a.pdf", "title": "A"}],
        "persona": {"role": "Travel Planner"},
        "job_to_be_done": {"task": "Plan a trip of 4 days for a group of 10 college friends."},
        "extra": true
    }"#;

    #[test]
    fn parses_input_and_ignores_unknown_fields() {
        let input = CollectionInput::parse(INPUT, Path::new("in.json")).unwrap();
        assert_eq!(input.persona.role, "Travel Planner");
        assert_eq!(input.test_case_name(), Some("travel_planner"));
        assert_eq!(input.documents.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn missing_persona_is_parse_error() {
        let err = CollectionInput::parse(r#"{"job_to_be_done": {"task": "x"}}"#, Path::new("in.json"))
            .unwrap_err();
        assert!(matches!(err, IngestError::ConfigParse { .. }));
    }

    #[test]
    fn blank_task_is_missing_field() {
        let err = CollectionInput::parse(
            r#"{"persona": {"role": "Chef"}, "job_to_be_done": {"task": "  "}}"#,
            Path::new("in.json"),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::MissingField("job_to_be_done.task")));
    }

    #[test]
    fn discovers_root_and_sorted_subdirs() {
        let root = tempfile::tempdir().unwrap();
        for name in ["zeta", "alpha", "no_config"] {
            fs::create_dir(root.path().join(name)).unwrap();
        }
        fs::write(root.path().join("zeta/cfg.json"), "{}").unwrap();
        fs::write(root.path().join("alpha/cfg.json"), "{}").unwrap();
        fs::write(root.path().join("cfg.json"), "{}").unwrap();

        let found = discover_collections(root.path(), "cfg.json").unwrap();
        let dirs: Vec<PathBuf> = found.iter().map(|c| c.dir.clone()).collect();
        assert_eq!(
            dirs,
            vec![
                root.path().to_path_buf(),
                root.path().join("alpha"),
                root.path().join("zeta")
            ]
        );
    }

    #[test]
    fn explicit_documents_keep_their_order() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("collection_1");
        fs::create_dir_all(dir.join(PDF_SUBDIR)).unwrap();
        fs::write(dir.join("challenge1b_input.json"), INPUT).unwrap();

        let entry = &discover_collections(root.path(), "challenge1b_input.json").unwrap()[0];
        let collection = load_collection(entry).unwrap();
        assert_eq!(collection.id, "travel_planner");
        assert_eq!(collection.input_documents, vec!["b.pdf", "a.pdf"]);
        assert_eq!(collection.pdfs[0], dir.join(PDF_SUBDIR).join("b.pdf"));
    }

    #[test]
    fn implicit_documents_are_sorted_pdfs() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("menu");
        fs::create_dir(&dir).unwrap();
        fs::write(
            dir.join("input.json"),
            r#"{"persona": {"role": "Chef"}, "job_to_be_done": {"task": "Plan a menu"}}"#,
        )
        .unwrap();
        for name in ["b.PDF", "a.pdf", "notes.txt"] {
            fs::write(dir.join(name), b"").unwrap();
        }

        let entry = &discover_collections(root.path(), "input.json").unwrap()[0];
        let collection = load_collection(entry).unwrap();
        assert_eq!(collection.id, "menu");
        assert_eq!(collection.input_documents, vec!["a.pdf", "b.PDF"]);
        assert_eq!(collection.persona(), "Chef");
    }
}
