use crate::error::PipelineResult;
use crate::models::{CatalogReport, MasterCatalogEntry, RawBatch, RawRecord, MASTER_CATALOG_COLUMNS};
use csv::{ReaderBuilder, Trim, Writer};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// 读取供应商 CSV (首行为表头, 允许行长度不一致)
pub fn read_source_csv(path: &Path) -> PipelineResult<RawBatch> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: RawRecord = headers
            .iter()
            .map(String::as_str)
            .zip(row.iter())
            .collect();
        records.push(record);
    }

    Ok(RawBatch { headers, records })
}

fn ensure_parent(path: &Path) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// 同目录下的唯一临时文件
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), seq))
}

/// 先写临时文件再重命名, 读者只会看到完整的旧文件或新文件
fn write_replacing<F>(path: &Path, write: F) -> PipelineResult<()>
where
    F: FnOnce(&Path) -> PipelineResult<()>,
{
    ensure_parent(path)?;
    let tmp = temp_sibling(path);
    if let Err(e) = write(&tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// 导出主目录 CSV, 空值写为空单元格
pub fn export_master_catalog_csv(entries: &[MasterCatalogEntry], output_path: &Path) -> PipelineResult<()> {
    write_replacing(output_path, |tmp| {
        let mut writer = Writer::from_path(tmp)?;
        writer.write_record(MASTER_CATALOG_COLUMNS)?;

        for entry in entries {
            let r = &entry.record;
            writer.write_record(&[
                entry.product_id.clone(),
                r.product_name.clone(),
                r.serial_number.clone().unwrap_or_default(),
                r.supplier.clone(),
                r.weight_quantity.clone().unwrap_or_default(),
                r.packaging_type.as_str().to_string(),
                r.units_per_carton.map(|u| u.to_string()).unwrap_or_default(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    })
}

/// 导出分析报告 (section, key, value)
pub fn export_report_csv(report: &CatalogReport, output_path: &Path) -> PipelineResult<()> {
    write_replacing(output_path, |tmp| {
        let mut writer = Writer::from_path(tmp)?;
        writer.write_record(["section", "key", "value"])?;

        let totals = [
            ("total_products", report.total_products as u64),
            ("ctn_products", report.ctn_products as u64),
            ("non_ctn_products", report.non_ctn_products as u64),
            ("total_units", report.total_units),
            ("missing_serial_numbers", report.missing_serial_numbers as u64),
            ("single_catalog_serials", report.single_catalog_serials as u64),
        ];
        for (key, value) in totals {
            writer.write_record(["summary", key, value.to_string().as_str()])?;
        }
        for s in &report.supplier_counts {
            writer.write_record(["supplier_products", s.supplier.as_str(), s.total_products.to_string().as_str()])?;
        }
        for s in &report.duplicate_serial_numbers {
            writer.write_record(["duplicate_serial", s.serial_number.as_str(), s.count.to_string().as_str()])?;
        }
        for s in &report.multi_catalog_serials {
            writer.write_record(["multi_catalog_serial", s.serial_number.as_str(), s.count.to_string().as_str()])?;
        }

        writer.flush()?;
        Ok(())
    })
}

/// 读取匹配请求 (JSON 数组, 每个元素为一条记录)
pub fn read_match_records(path: &Path) -> PipelineResult<Vec<Map<String, Value>>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// 写出增强后的匹配记录
pub fn write_match_records(records: &[Map<String, Value>], output_path: &Path) -> PipelineResult<()> {
    write_replacing(output_path, |tmp| {
        let mut writer = BufWriter::new(File::create(tmp)?);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.flush()?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NormalizedRecord, PackagingType};

    #[test]
    fn source_csv_tolerates_short_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("supplier.csv");
        fs::write(&path, "\u{feff}Item Name,SL NO,Unit\nRice 5KG,1,CTN\nSugar 1KG\n").unwrap();

        let batch = read_source_csv(&path).unwrap();

        assert_eq!(batch.headers, vec!["Item Name", "SL NO", "Unit"]);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].get("Unit"), Some("CTN"));
        assert_eq!(batch.records[1].get("Item Name"), Some("Sugar 1KG"));
        assert_eq!(batch.records[1].get("SL NO"), None);
    }

    #[test]
    fn master_catalog_csv_writes_blank_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("catalog.csv");
        let entries = vec![MasterCatalogEntry {
            product_id: "product_1".to_string(),
            record: NormalizedRecord {
                product_name: "Milk, full cream 1L".to_string(),
                serial_number: None,
                supplier: "Future".to_string(),
                weight_quantity: Some("1000G".to_string()),
                units_per_carton: None,
                packaging_type: PackagingType::NonCtn,
            },
        }];

        export_master_catalog_csv(&entries, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("Product_ID,Product_Name,Serial_Number,Supplier,Weight_Quantity,Packaging_Type,Units_Per_Carton")
        );
        assert_eq!(
            lines.next(),
            Some("product_1,\"Milk, full cream 1L\",,Future,1000G,NON-CTN,")
        );
    }

    fn catalog_of(supplier: &str, rows: usize) -> Vec<MasterCatalogEntry> {
        (1..=rows)
            .map(|i| MasterCatalogEntry {
                product_id: format!("product_{}", i),
                record: NormalizedRecord {
                    product_name: format!("{} item {}", supplier, i),
                    serial_number: Some(i.to_string()),
                    supplier: supplier.to_string(),
                    weight_quantity: None,
                    units_per_carton: Some(12),
                    packaging_type: PackagingType::Ctn,
                },
            })
            .collect()
    }

    #[test]
    fn concurrent_exports_never_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        let north = catalog_of("North", 2000);
        let south = catalog_of("South", 2000);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| export_master_catalog_csv(&north, &path).unwrap());
                scope.spawn(|| export_master_catalog_csv(&south, &path).unwrap());
            }
        });

        let content = fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = content.lines().skip(1).collect();
        assert_eq!(rows.len(), 2000);
        let first_supplier = rows[0].split(',').nth(3).unwrap();
        assert!(rows.iter().all(|r| r.split(',').nth(3) == Some(first_supplier)));

        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn match_records_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matches.json");
        let records: Vec<Map<String, Value>> = vec![serde_json::json!({
            "id": "1",
            "input_title": "Café Arabica 250G",
            "url_1_title": "not_available"
        })
        .as_object()
        .cloned()
        .unwrap()];

        write_match_records(&records, &path).unwrap();
        let back = read_match_records(&path).unwrap();

        assert_eq!(back, records);
        assert!(fs::read_to_string(&path).unwrap().contains("Café"));
    }
}
