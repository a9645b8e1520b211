//! Conversion of a directory of plain-text documents into JSON stem lists.

use std::{
    fs,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use walkdir::WalkDir;

use crate::{Pipeline, Result};

/// Stems of one source document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub document_location: PathBuf,
    pub tokens: Vec<String>,
}

impl Document {
    /// Create an empty document for the file at `path`, located at `path` itself.
    ///
    /// The id is the last `_`-separated segment of the file stem, so `haddas_eritra_01012023.txt`
    /// gets the id `01012023`.
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default();
        let document_id = stem.rsplit('_').next().unwrap_or_default().to_owned();

        Self {
            document_id,
            document_location: path.to_owned(),
            tokens: Vec::new(),
        }
    }

    /// Point the document at another location, such as the PDF its text was extracted from.
    pub fn with_location(mut self, location: PathBuf) -> Self {
        self.document_location = location;
        self
    }
}

/// Outcome of [`convert_dir`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub converted: usize,
    pub failed: usize,
}

/// Stem every `*.txt` file under `source` and write a pretty-printed JSON [`Document`] for each
/// one into `target`.
///
/// The layout of `source` is mirrored: `source/a/x_1.txt` is written to `target/a/x_1.json`. Every
/// document is located at its text file.
///
/// Files are processed in parallel. A file that cannot be read or written is logged and counted
/// as failed; errors walking `source` or creating `target` abort the conversion.
pub fn convert_dir(pipeline: &Pipeline, source: &Path, target: &Path) -> Result<Summary> {
    convert(pipeline, source, target, None)
}

/// Same as [`convert_dir`], but every document is located at the PDF file mirroring its text
/// file under `originals` (`source/a/x_1.txt` is located at `originals/a/x_1.pdf`).
pub fn convert_dir_with_originals(
    pipeline: &Pipeline,
    source: &Path,
    target: &Path,
    originals: &Path,
) -> Result<Summary> {
    convert(pipeline, source, target, Some(originals))
}

#[instrument(skip(pipeline, source, target, originals), fields(source = %source.display(), target = %target.display()))]
fn convert(
    pipeline: &Pipeline,
    source: &Path,
    target: &Path,
    originals: Option<&Path>,
) -> Result<Summary> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry?;

        if entry.file_type().is_file() && entry.path().extension().map_or(false, |e| e == "txt") {
            let relative = entry
                .path()
                .strip_prefix(source)
                .map(Path::to_owned)
                .unwrap_or_else(|_| PathBuf::from(entry.file_name()));
            paths.push((entry.into_path(), relative));
        }
    }

    fs::create_dir_all(target)?;

    let failed = paths
        .par_iter()
        .map(|(path, relative)| {
            let mut document = Document::from_path(path);
            if let Some(originals) = originals {
                document = document.with_location(originals.join(relative).with_extension("pdf"));
            }

            let output = target.join(relative).with_extension("json");
            convert_file(pipeline, path, document, &output)
        })
        .filter(|r| match r {
            Ok(_) => false,
            Err(e) => {
                warn!(error = %e, "failed to convert a document");
                true
            }
        })
        .count();

    let summary = Summary {
        converted: paths.len() - failed,
        failed,
    };
    info!(converted = summary.converted, failed = summary.failed, "corpus converted");

    Ok(summary)
}

#[instrument(skip(pipeline, path, document, output), fields(output = %output.display()))]
fn convert_file(
    pipeline: &Pipeline,
    path: &Path,
    mut document: Document,
    output: &Path,
) -> Result<()> {
    document.tokens = pipeline.process_file(path)?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, serde_json::to_string_pretty(&document)?)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::Config;

    fn pipeline() -> Pipeline {
        Pipeline::new(Arc::new(Config::embedded().unwrap())).unwrap()
    }

    #[test]
    fn document_id_is_last_stem_segment() {
        let document = Document::from_path(Path::new("/corpus/haddas_eritra_01012023.txt"));

        assert_eq!(document.document_id, "01012023");
        assert_eq!(
            document.document_location,
            Path::new("/corpus/haddas_eritra_01012023.txt")
        );
        assert!(document.tokens.is_empty());

        assert_eq!(Document::from_path(Path::new("ዜና.txt")).document_id, "ዜና");
    }

    #[test]
    fn text_files_are_converted_to_json_documents() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        let nested = source.path().join("2023");
        fs::create_dir(&nested).unwrap();

        let first = source.path().join("haddas_eritra_01.txt");
        let second = nested.join("haddas_eritra_02.txt");
        fs::write(&first, "ብምምሕዳር ሀገር ።").unwrap();
        fs::write(&second, "መንግስቲ ሰባቢሩ").unwrap();
        fs::write(source.path().join("notes.md"), "ሰላም").unwrap();

        let pipeline = pipeline();
        let summary = convert_dir(&pipeline, source.path(), target.path()).unwrap();

        assert_eq!(
            summary,
            Summary {
                converted: 2,
                failed: 0
            }
        );

        let read = |name: &str| -> Document {
            let json = fs::read_to_string(target.path().join(name)).unwrap();
            serde_json::from_str(&json).unwrap()
        };

        assert_eq!(
            read("haddas_eritra_01.json"),
            Document {
                document_id: "01".to_owned(),
                document_location: first,
                tokens: vec!["ሕዳር".to_owned(), "ሐገር".to_owned()],
            }
        );
        assert_eq!(
            read("2023/haddas_eritra_02.json").tokens,
            vec!["ንግስ".to_owned(), "ሰባሩ".to_owned()]
        );
        assert!(!target.path().join("notes.json").exists());
    }

    #[test]
    fn unreadable_file_is_counted_and_skipped() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::write(source.path().join("a_1.txt"), "ሰላም").unwrap();
        fs::write(source.path().join("b_2.txt"), [0xff, 0xfe, 0x00]).unwrap();

        let summary = convert_dir(&pipeline(), source.path(), target.path()).unwrap();

        assert_eq!(
            summary,
            Summary {
                converted: 1,
                failed: 1
            }
        );
        assert!(target.path().join("a_1.json").exists());
        assert!(!target.path().join("b_2.json").exists());
    }

    #[test]
    fn same_names_in_different_directories_do_not_collide() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        for (dir, text) in [("a", "ብምምሕዳር"), ("b", "መንግስቲ")] {
            fs::create_dir(source.path().join(dir)).unwrap();
            fs::write(source.path().join(dir).join("x_1.txt"), text).unwrap();
        }

        let summary = convert_dir(&pipeline(), source.path(), target.path()).unwrap();
        assert_eq!(
            summary,
            Summary {
                converted: 2,
                failed: 0
            }
        );

        let tokens = |name: &str| -> Vec<String> {
            let json = fs::read_to_string(target.path().join(name)).unwrap();
            serde_json::from_str::<Document>(&json).unwrap().tokens
        };
        assert_eq!(tokens("a/x_1.json"), vec!["ሕዳር".to_owned()]);
        assert_eq!(tokens("b/x_1.json"), vec!["ንግስ".to_owned()]);
    }

    #[test]
    fn documents_can_be_located_at_their_originals() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::create_dir(source.path().join("2023")).unwrap();
        fs::write(source.path().join("2023").join("haddas_eritra_07.txt"), "ሰላም").unwrap();

        let originals = Path::new("/corpus/pdf");
        let summary =
            convert_dir_with_originals(&pipeline(), source.path(), target.path(), originals)
                .unwrap();
        assert_eq!(summary.converted, 1);

        let json =
            fs::read_to_string(target.path().join("2023").join("haddas_eritra_07.json")).unwrap();
        let document: Document = serde_json::from_str(&json).unwrap();

        assert_eq!(document.document_id, "07");
        assert_eq!(
            document.document_location,
            Path::new("/corpus/pdf/2023/haddas_eritra_07.pdf")
        );
        assert_eq!(document.tokens, vec!["ሰላም".to_owned()]);
    }

    #[test]
    fn missing_source_directory_is_an_error() {
        let target = TempDir::new().unwrap();

        assert!(convert_dir(&pipeline(), Path::new("/nonexistent/corpus"), target.path()).is_err());
    }
}
