use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{CombinedPayload, RawItem};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const CSV_COLUMNS: [&str; 11] = [
    "contentsid",
    "title",
    "roadaddress",
    "address",
    "introduction",
    "alltag",
    "phoneno",
    "latitude",
    "longitude",
    "imgpath",
    "thumbnailpath",
];

pub fn write_payload(path: &Path, payload: &CombinedPayload) -> Result<()> {
    let json = serde_json::to_string_pretty(payload)?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

pub fn read_payload(path: &Path) -> Result<CombinedPayload> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let payload: CombinedPayload =
        serde_json::from_str(&text).with_context(|| format!("Malformed payload in {:?}", path))?;
    if payload.total_items != payload.items.len() {
        tracing::warn!(
            "{:?} declares {} items but holds {}",
            path,
            payload.total_items,
            payload.items.len()
        );
    }
    Ok(payload)
}

/// Flat projection of the raw items for spreadsheet inspection. Returns the
/// number of rows written.
pub fn write_csv(path: &Path, items: &[RawItem]) -> Result<usize> {
    let file = fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM)?;

    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(CSV_COLUMNS)?;
    for item in items {
        let photo = item.photo();
        let cell = |v: &Option<String>| v.clone().unwrap_or_default();
        wtr.write_record([
            cell(&item.contentsid),
            cell(&item.title),
            cell(&item.roadaddress),
            cell(&item.address),
            cell(&item.introduction),
            cell(&item.alltag),
            cell(&item.phoneno),
            cell(&item.latitude),
            cell(&item.longitude),
            photo.map(|p| cell(&p.imgpath)).unwrap_or_default(),
            photo.map(|p| cell(&p.thumbnailpath)).unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(items.len())
}
