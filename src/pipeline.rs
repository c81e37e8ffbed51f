//! Bid-group pipeline: discover folders, extract each file, merge, validate, write.

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::chunker::Chunker;
use crate::error::ExtractionError;
use crate::extractor::HybridExtractor;
use crate::merge::{merge, SOURCE_FILE_KEY};
use crate::parsers::{parse_document, DocumentKind};
use crate::schema::{FieldMap, FieldValue};
use crate::validator::{to_json, validate};

/// A folder of related documents that collapses to one output record.
#[derive(Debug, Clone)]
pub struct BidGroup {
    pub name: String,
    pub root: PathBuf,
}

impl BidGroup {
    /// Supported files under the group root, recursively, in path order.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| DocumentKind::from_path(path).is_some())
            .collect();
        files.sort();
        files
    }
}

/// One subdirectory per group, sorted by name. Fails if `root` is missing.
pub fn discover_groups(root: &Path) -> Result<Vec<BidGroup>> {
    if !root.is_dir() {
        anyhow::bail!("Input directory does not exist: {:?}", root);
    }

    let mut groups = Vec::new();
    for entry in std::fs::read_dir(root).with_context(|| format!("Failed to list {:?}", root))? {
        let path = entry?.path();
        if path.is_dir() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            groups.push(BidGroup { name, root: path });
        }
    }
    groups.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(groups)
}

/// Why a file produced nothing.
#[derive(Debug, Clone, Serialize)]
pub struct FileIssue {
    pub file: String,
    pub reason: String,
}

/// Outcome counts for one bid group.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupReport {
    pub name: String,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub issues: Vec<FileIssue>,
    pub output: Option<PathBuf>,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub groups: Vec<GroupReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.groups.iter().map(|g| g.succeeded).sum()
    }

    pub fn skipped(&self) -> usize {
        self.groups.iter().map(|g| g.skipped).sum()
    }

    pub fn failed(&self) -> usize {
        self.groups.iter().map(|g| g.failed).sum()
    }

    pub fn outputs_written(&self) -> usize {
        self.groups.iter().filter(|g| g.output.is_some()).count()
    }
}

/// Runs extraction over every bid group under an input root.
pub struct Pipeline {
    chunker: Chunker,
    extractor: HybridExtractor,
    use_oracle: bool,
    output_dir: PathBuf,
}

impl Pipeline {
    pub fn new(
        chunker: Chunker,
        extractor: HybridExtractor,
        use_oracle: bool,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            chunker,
            extractor,
            use_oracle,
            output_dir: output_dir.into(),
        }
    }

    /// Process every group. Only a missing input root or output dir aborts the run.
    pub async fn run(&self, input_dir: &Path) -> Result<RunReport> {
        let groups = discover_groups(input_dir)?;
        info!("Found {} bid folders in {:?}", groups.len(), input_dir);

        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create output dir {:?}", self.output_dir))?;

        let mut report = RunReport::default();
        for group in &groups {
            report.groups.push(self.process_group(group).await);
        }

        info!(
            "Run complete: {} files extracted, {} skipped, {} failed, {} records written",
            report.succeeded(),
            report.skipped(),
            report.failed(),
            report.outputs_written()
        );
        Ok(report)
    }

    /// Extract every file in a group, then merge and write once at the end.
    pub async fn process_group(&self, group: &BidGroup) -> GroupReport {
        info!("Processing folder: {}", group.name);

        let mut report = GroupReport {
            name: group.name.clone(),
            ..GroupReport::default()
        };
        let mut results: Vec<FieldMap> = Vec::new();
        let mut seen_digests: HashSet<String> = HashSet::new();

        for path in group.files() {
            let file_name = source_name(&group.root, &path);
            info!("  {}", file_name);

            match self.process_file(&path, &mut seen_digests).await {
                Ok(Some(mut fields)) => {
                    fields.insert(SOURCE_FILE_KEY.to_string(), FieldValue::text(file_name));
                    results.push(fields);
                    report.succeeded += 1;
                }
                Ok(None) => {
                    info!("Skipping {}: duplicate of an earlier file", file_name);
                    report.skipped += 1;
                    report.issues.push(FileIssue {
                        file: file_name,
                        reason: "duplicate content".to_string(),
                    });
                }
                Err(e) if e.is_skip() => {
                    warn!("{}", e);
                    report.skipped += 1;
                    report.issues.push(FileIssue {
                        file: file_name,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    error!("Error processing {}: {}", file_name, e);
                    report.failed += 1;
                    report.issues.push(FileIssue {
                        file: file_name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if results.is_empty() {
            info!("No valid files found in {}", group.name);
            return report;
        }

        match self.write_group(&group.name, results) {
            Ok(path) => {
                info!("Consolidated JSON saved: {:?}", path);
                report.output = Some(path);
            }
            Err(e) => {
                error!("Failed to write output for {}: {:#}", group.name, e);
            }
        }

        report
    }

    /// Parse, chunk and extract one file. `Ok(None)` marks a duplicate.
    pub async fn process_file(
        &self,
        path: &Path,
        seen_digests: &mut HashSet<String>,
    ) -> Result<Option<FieldMap>, ExtractionError> {
        let text = parse_document(path)?;
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyExtraction(path.to_path_buf()));
        }

        let digest = format!("{:x}", Sha256::digest(text.as_bytes()));
        if !seen_digests.insert(digest) {
            return Ok(None);
        }

        let chunks = self.chunker.chunk(&text);
        let fields = self.extractor.extract(&chunks, self.use_oracle).await;
        Ok(Some(fields))
    }

    fn write_group(&self, name: &str, results: Vec<FieldMap>) -> Result<PathBuf> {
        let record = validate(merge(results))?;
        let json = to_json(&record)?;

        let path = self.output_dir.join(format!("{}_consolidated.json", name));
        std::fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(path)
    }
}

/// Path relative to the group root with `/` separators, so same-named files
/// in different subfolders stay distinct.
fn source_name(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => display_name(path),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
