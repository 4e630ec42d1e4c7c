use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunMetadata {
    pub capture_name: String,
    pub created_at: DateTime<Utc>,
    pub run_id: String,
    #[serde(skip)]
    pub output_dir: PathBuf,
}

/// All capture files under the capture root.
pub fn list_captures(capture_root: &Path) -> Vec<PathBuf> {
    WalkDir::new(capture_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|s| s.to_lowercase() == "jsonl")
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect()
}

/// Create the output directory for one analysis run and persist its
/// metadata. Re-running over an existing run directory is rejected.
pub fn create_run(output_root: &Path, capture_name: &str) -> Result<RunMetadata> {
    let stem = Path::new(capture_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid capture name: {}", capture_name))?;

    let output_dir = output_root.join(stem);
    if output_dir.exists() {
        return Err(anyhow::anyhow!(
            "Output directory already exists for: {}",
            stem
        ));
    }

    fs::create_dir_all(&output_dir)?;

    let metadata = RunMetadata {
        capture_name: capture_name.to_string(),
        created_at: Utc::now(),
        run_id: stem.to_string(),
        output_dir: output_dir.clone(),
    };

    let metadata_path = output_dir.join("metadata.json");
    let content = serde_json::to_string_pretty(&metadata)?;
    fs::write(metadata_path, content)?;

    Ok(metadata)
}

pub fn list_runs(output_root: &Path) -> Result<Vec<(String, RunMetadata)>> {
    let mut runs = Vec::new();

    if !output_root.exists() {
        return Ok(runs);
    }

    for entry in fs::read_dir(output_root)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            let metadata_path = path.join("metadata.json");
            if metadata_path.exists() {
                let content = fs::read_to_string(metadata_path)?;
                let mut metadata: RunMetadata = serde_json::from_str(&content)?;
                metadata.output_dir = path.clone();
                let name = path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or("unknown")
                    .to_string();
                runs.push((name, metadata));
            }
        }
    }

    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(tag: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("matchsight_runs_{tag}_{}", std::process::id()));
        fs::create_dir_all(&root).unwrap();
        root
    }

    #[test]
    fn create_run_writes_metadata_and_rejects_duplicates() {
        let root = temp_root("create");

        let run = create_run(&root, "match2.jsonl").unwrap();
        assert_eq!(run.run_id, "match2");
        assert!(run.output_dir.join("metadata.json").exists());

        assert!(create_run(&root, "match2.jsonl").is_err());

        let listed = list_runs(&root).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].1.capture_name, "match2.jsonl");
        assert_eq!(listed[0].1.output_dir, run.output_dir);

        fs::remove_dir_all(root).ok();
    }

    #[test]
    fn list_runs_on_missing_root_is_empty() {
        let root = std::env::temp_dir().join("matchsight_no_such_root");
        assert!(list_runs(&root).unwrap().is_empty());
    }
}
