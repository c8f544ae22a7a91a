//! Inspect command handler

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;

use pcdseq::cloud::pcd::{DataEncoding, FieldType};
use pcdseq::cloud::PcdHeader;
use pcdseq::{PcdData, RecordKind};

/// Print a PCD file's header, the record kinds it can be decoded as,
/// and the bounds of its geometry.
#[cfg(not(tarpaulin_include))]
pub fn handle(file: &Path, as_json: bool) -> Result<()> {
    let data =
        PcdData::open(file).with_context(|| format!("Failed to parse PCD file: {:?}", file))?;
    let header = &data.header;

    let kinds: Vec<RecordKind> = RecordKind::ALL
        .into_iter()
        .filter(|kind| data.project(*kind).is_ok())
        .collect();
    let bounds = data
        .project(RecordKind::Xyz)
        .ok()
        .and_then(|cloud| cloud.bounds());

    if as_json {
        let value = json!({
            "file": file.display().to_string(),
            "header": header,
            "kinds": kinds,
            "bounds": bounds,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("File:      {}", file.display());
    println!("Version:   {}", header.version);
    println!(
        "Size:      {} x {} ({} points)",
        header.width, header.height, header.points
    );
    println!("Data:      {}", encoding_name(header));
    println!("Fields:");
    for field in &header.fields {
        let kind = match field.kind {
            FieldType::Float => 'F',
            FieldType::Signed => 'I',
            FieldType::Unsigned => 'U',
        };
        println!("    {:<14} {}{} x {}", field.name, kind, field.size, field.count);
    }
    let names: Vec<&str> = kinds.iter().map(|k| k.name()).collect();
    if names.is_empty() {
        println!("Kinds:     none");
    } else {
        println!("Kinds:     {}", names.join(", "));
    }
    if let Some(b) = bounds {
        println!(
            "Bounds:    [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
            b.min[0], b.min[1], b.min[2], b.max[0], b.max[1], b.max[2]
        );
    }
    Ok(())
}

fn encoding_name(header: &PcdHeader) -> &'static str {
    match header.data {
        DataEncoding::Ascii => "ascii",
        DataEncoding::Binary => "binary",
        DataEncoding::BinaryCompressed => "binary_compressed",
    }
}
