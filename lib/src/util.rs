use std::path::{Path, PathBuf};

use regex::Regex;
use tokio::fs::read_dir;
use tokio::io::AsyncReadExt as _;

use crate::errors::*;

macro_rules! make_log_macro {
    (@wdoll $macro_name:ident, $block_name:literal, ($dol:tt)) => {
        #[allow(unused_macros)]
        macro_rules! $macro_name {
            ($dol($args:tt)+) => {
                ::log::$macro_name!(target: $block_name, $dol($args)+);
            };
        }
    };
    ($macro_name:ident, $block_name:literal) => {
        make_log_macro!(@wdoll $macro_name, $block_name, ($));
    };
}

pub async fn read_file(path: impl AsRef<Path>) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut content = String::new();
    file.read_to_string(&mut content).await?;
    Ok(content.trim_end().to_string())
}

/// Return the first entry of `class_path` (in name order) whose name matches `regex`.
pub async fn find_device(class_path: &Path, regex: &Regex) -> Result<Option<PathBuf>> {
    let mut entries = read_dir(class_path).await?;

    let mut matches = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if regex.is_match(&name.to_string_lossy()) {
            log::debug!(
                target: "util",
                "{:?} matched {}",
                name.to_string_lossy().to_string(),
                regex.as_str()
            );
            matches.push(entry.path());
        }
    }
    matches.sort();
    Ok(matches.into_iter().next())
}

/// Scale a number from an arbitrary scale to `low..=high` percent
pub fn scale_to_clamped_percent(value: f64, max: f64, low: f64, high: f64) -> Result<f64> {
    if low > high {
        Err(AlsError::InvalidConfig(format!(
            "Invalid scale parameters: {low} > {high}"
        )))
    } else {
        Ok((value / max * 100.0).clamp(low, high))
    }
}
