// annotation.rs - Annotation sidecar loader (name<TAB>type<TAB>intervals)

use crate::core::interval::{Annotation, AnnotationSet, Interval};
use crate::error::{FinalizeError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse `min-max[,min-max...]` into 1-based inclusive intervals
fn parse_intervals(field: &str) -> std::result::Result<Vec<Interval>, String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (min, max) = part
                .split_once('-')
                .ok_or_else(|| format!("interval '{}' is not of the form min-max", part))?;
            let min = min
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid interval start '{}'", min.trim()))?;
            let max = max
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid interval end '{}'", max.trim()))?;
            if min == 0 || max < min {
                return Err(format!("interval '{}' must satisfy 1 <= min <= max", part));
            }
            Ok(Interval::new(min, max))
        })
        .collect()
}

/// Parse annotation lines read from `source`; `#` comments and blank lines are skipped
pub fn parse_annotations<R: BufRead>(reader: R, source: &Path) -> Result<AnnotationSet> {
    let mut annotations = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| FinalizeError::io(source, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() != 3 {
            return Err(FinalizeError::parse(
                source,
                format!("line {} has {} columns, expected name, type and intervals", line_num + 1, parts.len()),
            ));
        }
        let intervals = parse_intervals(parts[2])
            .map_err(|e| FinalizeError::parse(source, format!("line {}: {}", line_num + 1, e)))?;
        annotations.push(Annotation {
            name: parts[0].trim().to_string(),
            kind: parts[1].trim().to_string(),
            intervals,
        });
    }
    Ok(AnnotationSet::new(annotations))
}

pub fn load_annotations(path: &Path) -> Result<AnnotationSet> {
    let file = File::open(path).map_err(|e| FinalizeError::io(path, e))?;
    parse_annotations(BufReader::new(file), path)
}

/// Annotations for an optional sidecar; no file means no annotations
pub fn load_optional_annotations(path: Option<&Path>) -> Result<AnnotationSet> {
    match path {
        Some(path) => load_annotations(path),
        None => Ok(AnnotationSet::default()),
    }
}
