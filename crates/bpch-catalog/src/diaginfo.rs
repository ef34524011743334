//! `diaginfo.dat` parsing.
//!
//! Fixed-width layout (byte columns):
//!
//! ```text
//! offset    0..8
//! (spacer)  8..9
//! name      9..49
//! desc      49..149
//! ```
//!
//! Lines starting with `#` are comments.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use bpch_common::BpchResult;

use crate::{column, CatalogIssue};

/// One diagnostic category and its tracer numbering offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOffset {
    pub name: String,
    pub offset: u32,
    pub description: String,
}

pub(crate) fn load(
    path: &Path,
    issues: &mut Vec<CatalogIssue>,
) -> BpchResult<HashMap<String, u32>> {
    let text = fs::read_to_string(path)?;
    let mut offsets = HashMap::new();

    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_line(line) {
            Ok(cat) => {
                if offsets.contains_key(&cat.name) {
                    issues.push(CatalogIssue {
                        file: path.to_path_buf(),
                        line: lineno,
                        detail: format!("duplicate category '{}'", cat.name),
                    });
                } else {
                    offsets.insert(cat.name, cat.offset);
                }
            }
            Err(detail) => issues.push(CatalogIssue {
                file: path.to_path_buf(),
                line: lineno,
                detail,
            }),
        }
    }

    Ok(offsets)
}

fn parse_line(line: &str) -> Result<CategoryOffset, String> {
    let raw_offset = column(line, 0, 8).ok_or("offset column is not valid text")?;
    let offset: u32 = raw_offset
        .parse()
        .map_err(|_| format!("non-numeric offset field '{}'", raw_offset))?;

    let name = column(line, 9, 49).ok_or("name column is not valid text")?;
    if name.is_empty() {
        return Err("empty category name".to_string());
    }
    let description = column(line, 49, 149).unwrap_or("");

    Ok(CategoryOffset {
        name: name.to_string(),
        offset,
        description: description.to_string(),
    })
}
