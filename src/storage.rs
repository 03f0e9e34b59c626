//! Reading datasets and writing result files.

use std::fs;
use std::path::{ Path, PathBuf };

use log::info;
use serde::Serialize;

use crate::errors::{ CvError, CvResult };
use crate::models::pipeline::{ DatasetItem, PipelineResult };

/// File name of the combined dataset results
pub const DATASET_RESULTS_FILE: &str = "results.json";

/// Id given to the item at `index` (0-based) when the dataset has none
pub fn default_requirement_id(index: usize) -> String {
    format!("req_{:03}", index + 1)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> CvResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Write `<outdir>/result_<id>.json`
pub fn save_result(result: &PipelineResult, outdir: &Path) -> CvResult<PathBuf> {
    let path = outdir.join(format!("result_{}.json", result.requirement_id));
    write_json(&path, result)?;
    Ok(path)
}

/// Write all results of a dataset run to `<outdir>/results.json`
pub fn save_results(results: &[PipelineResult], outdir: &Path) -> CvResult<PathBuf> {
    let path = outdir.join(DATASET_RESULTS_FILE);
    write_json(&path, results)?;
    Ok(path)
}

/// Write any serializable report, creating parent directories
pub fn save_report<T: Serialize>(report: &T, path: &Path) -> CvResult<()> {
    write_json(path, report)
}

/// Load a results file: either a list of results or a single result
pub fn load_results(path: &Path) -> CvResult<Vec<PipelineResult>> {
    let contents = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&contents)?;
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(vec![serde_json::from_value(value)?])
    }
}

/// Load a dataset and give every item an id
pub fn load_dataset(path: &Path) -> CvResult<Vec<DatasetItem>> {
    let contents = fs::read_to_string(path)?;
    let mut items: Vec<DatasetItem> = serde_json::from_str(&contents)?;

    for (index, item) in items.iter_mut().enumerate() {
        if item.requirement.trim().is_empty() {
            return Err(
                CvError::InvalidInput(format!("dataset item {} has no requirement text", index + 1))
            );
        }
        if item.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
            item.id = Some(default_requirement_id(index));
        }
    }
    Ok(items)
}
