use super::TwoPointTable;
use crate::builder::RankedItem;
use crate::error::{MarkerForgeError, MfResult};
use crate::types::Item;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct PairRecord {
    marker_a: String,
    marker_b: String,
    rf: f64,
    lod: f64,
    #[serde(default)]
    phase: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct CategoryRecord {
    marker: String,
    category: u8,
}

/// Reads `marker_a,marker_b,rf,lod[,phase]` rows. Identifiers are assigned
/// in order of first appearance.
pub fn load_two_point<R: Read>(reader: R) -> MfResult<TwoPointTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut names: Vec<String> = Vec::new();
    let mut index: HashMap<String, Item> = HashMap::new();
    let mut rows: Vec<(Item, Item, f64, f64, u8)> = Vec::new();

    let mut intern = |name: &str, names: &mut Vec<String>| -> Item {
        if let Some(&id) = index.get(name) {
            return id;
        }
        let id = names.len() as Item;
        names.push(name.to_string());
        index.insert(name.to_string(), id);
        id
    };

    for (row_idx, result) in rdr.deserialize::<PairRecord>().enumerate() {
        let rec = result?;
        if rec.marker_a == rec.marker_b {
            return Err(MarkerForgeError::Validation(format!(
                "Row {}: marker '{}' paired with itself",
                row_idx + 1,
                rec.marker_a
            )));
        }
        if !(0.0..=0.5).contains(&rec.rf) {
            return Err(MarkerForgeError::Validation(format!(
                "Row {}: recombination fraction {} outside [0, 0.5]",
                row_idx + 1,
                rec.rf
            )));
        }
        if !rec.lod.is_finite() {
            return Err(MarkerForgeError::Validation(format!(
                "Row {}: LOD {} is not finite",
                row_idx + 1,
                rec.lod
            )));
        }
        let a = intern(&rec.marker_a, &mut names);
        let b = intern(&rec.marker_b, &mut names);
        rows.push((a, b, rec.rf, rec.lod, rec.phase.unwrap_or(1)));
    }

    if names.is_empty() {
        return Err(MarkerForgeError::Validation(
            "Two-point table has no rows".to_string(),
        ));
    }

    let n = names.len();
    let mut table = TwoPointTable::empty(names);
    for (a, b, rf, lod, phase) in rows {
        if table.set(a, b, rf, lod, phase) {
            warn!(
                "Pair ({}, {}) listed twice, keeping the last row",
                table.name_of(a).unwrap_or("?"),
                table.name_of(b).unwrap_or("?")
            );
        }
    }

    let missing = table.missing_pairs();
    if missing > 0 {
        debug!("{} of {} pairs have no estimate", missing, n * (n - 1) / 2);
    }
    info!("Loaded two-point table: {} markers", n);
    Ok(table)
}

pub fn load_two_point_file<P: AsRef<Path>>(path: P) -> MfResult<TwoPointTable> {
    let file = File::open(path.as_ref()).map_err(|e| {
        MarkerForgeError::Config(format!(
            "Could not open two-point table at '{}': {}",
            path.as_ref().display(),
            e
        ))
    })?;
    load_two_point(file)
}

/// Reads `marker,category` rows. Markers missing from the file get
/// category 0.
pub fn load_categories<R: Read>(reader: R, table: &TwoPointTable) -> MfResult<Vec<RankedItem>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut categories: HashMap<Item, u8> = HashMap::new();
    for result in rdr.deserialize::<CategoryRecord>() {
        let rec = result?;
        let id = table.id_of(&rec.marker).ok_or_else(|| {
            MarkerForgeError::Validation(format!(
                "Category given for unknown marker '{}'",
                rec.marker
            ))
        })?;
        categories.insert(id, rec.category);
    }

    Ok(table
        .items()
        .into_iter()
        .map(|item| RankedItem {
            item,
            category: categories.get(&item).copied().unwrap_or(0),
        })
        .collect())
}

pub fn load_categories_file<P: AsRef<Path>>(
    path: P,
    table: &TwoPointTable,
) -> MfResult<Vec<RankedItem>> {
    let file = File::open(path)?;
    load_categories(file, table)
}
