use catalog_matcher::config::{CatalogConfig, PackagingOverride, SourceConfig};
use catalog_matcher::db::files;
use catalog_matcher::models::PackagingType;
use catalog_matcher::{build_master_catalog, CatalogNormalizer, PipelineError};
use std::fs;
use std::path::Path;

fn write_source(dir: &Path, supplier: &str, file: &str, content: &str) -> SourceConfig {
    let path = dir.join(file);
    fs::write(&path, content).unwrap();
    SourceConfig {
        supplier: supplier.to_string(),
        path: path.to_string_lossy().into_owned(),
    }
}

fn normalizer_with_amal_override() -> CatalogNormalizer {
    let mut config = CatalogConfig::default();
    config.packaging_overrides.push(PackagingOverride {
        supplier: "Amal Trading".to_string(),
        field: "Unit".to_string(),
    });
    CatalogNormalizer::from_config(&config)
}

#[test]
fn two_suppliers_build_one_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let sources = vec![
        write_source(
            dir.path(),
            "Amal Trading",
            "amal.csv",
            "Item Name,SL NO,Unit\nPepsi 24X330ML,101,CTN\nBasmati Rice 5KG,102,\nPepsi 24X330ML,103,CTN\n",
        ),
        write_source(
            dir.path(),
            "Future Trading",
            "future.csv",
            "PRODUCT TITLE,SERIAL NUMBER\nNido Milk Powder 2.5KG CTN,101\nTea 100 TEA BAGS,\n",
        ),
    ];

    let outcome = build_master_catalog(&normalizer_with_amal_override(), &sources).unwrap();

    assert_eq!(outcome.duplicates_dropped, 1);
    assert!(outcome.skipped.is_empty());

    let ids: Vec<&str> = outcome.entries.iter().map(|e| e.product_id.as_str()).collect();
    assert_eq!(ids, vec!["product_1", "product_2", "product_3", "product_4"]);

    let pepsi = &outcome.entries[0].record;
    assert_eq!(pepsi.serial_number.as_deref(), Some("101"));
    assert_eq!(pepsi.weight_quantity.as_deref(), Some("330G"));
    assert_eq!(pepsi.units_per_carton, Some(24));
    assert_eq!(pepsi.packaging_type, PackagingType::Ctn);

    let rice = &outcome.entries[1].record;
    assert_eq!(rice.weight_quantity.as_deref(), Some("5000G"));
    assert_eq!(rice.units_per_carton, None);
    assert_eq!(rice.packaging_type, PackagingType::NonCtn);

    let nido = &outcome.entries[2].record;
    assert_eq!(nido.supplier, "Future Trading");
    assert_eq!(nido.weight_quantity.as_deref(), Some("2500G"));
    assert_eq!(nido.packaging_type, PackagingType::Ctn);

    let tea = &outcome.entries[3].record;
    assert_eq!(tea.serial_number, None);
    assert_eq!(tea.units_per_carton, Some(100));
    assert_eq!(tea.weight_quantity, None);

    let report = &outcome.report;
    assert_eq!(report.total_products, 4);
    assert_eq!(report.ctn_products, 2);
    assert_eq!(report.total_units, 27);
    assert_eq!(report.missing_serial_numbers, 1);
    assert_eq!(report.duplicate_serial_numbers.len(), 1);
    assert_eq!(report.multi_catalog_serials[0].serial_number, "101");
    assert_eq!(report.single_catalog_serials, 1);
    assert_eq!(report.supplier_counts[0].supplier, "Amal Trading");
}

#[test]
fn override_without_unit_column_uses_keywords() {
    let dir = tempfile::tempdir().unwrap();
    let sources = vec![write_source(
        dir.path(),
        "Amal Trading",
        "amal.csv",
        "Product_Name\nJuice (200 ML*24) CARTON\n",
    )];

    let outcome = build_master_catalog(&normalizer_with_amal_override(), &sources).unwrap();

    let record = &outcome.entries[0].record;
    assert_eq!(record.packaging_type, PackagingType::Ctn);
    assert_eq!(record.units_per_carton, Some(24));
}

#[test]
fn missing_source_file_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut sources = vec![SourceConfig {
        supplier: "Royal Foods".to_string(),
        path: dir.path().join("absent.csv").to_string_lossy().into_owned(),
    }];
    sources.push(write_source(dir.path(), "Future Trading", "future.csv", "Name\nSalt 800GM\n"));

    let outcome = build_master_catalog(&normalizer_with_amal_override(), &sources).unwrap();

    assert_eq!(outcome.skipped, vec!["Royal Foods"]);
    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.entries[0].product_id, "product_1");
}

#[test]
fn source_without_product_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let sources = vec![write_source(dir.path(), "Future Trading", "future.csv", "Code,Price\nA1,3\n")];

    match build_master_catalog(&normalizer_with_amal_override(), &sources) {
        Err(PipelineError::MissingProductColumn { supplier, columns }) => {
            assert_eq!(supplier, "Future Trading");
            assert_eq!(columns, vec!["Code", "Price"]);
        }
        other => panic!("expected missing product column, got {:?}", other.map(|o| o.entries.len())),
    }
}

#[test]
fn exported_files_follow_catalog_order() {
    let dir = tempfile::tempdir().unwrap();
    let sources = vec![write_source(
        dir.path(),
        "Future Trading",
        "future.csv",
        "Name,SL NO\nCups 96PCS,9\nSugar 1KG,\n",
    )];
    let outcome = build_master_catalog(&normalizer_with_amal_override(), &sources).unwrap();

    let catalog_path = dir.path().join("out/catalog.csv");
    let report_path = dir.path().join("out/report.csv");
    files::export_master_catalog_csv(&outcome.entries, &catalog_path).unwrap();
    files::export_report_csv(&outcome.report, &report_path).unwrap();

    let catalog = fs::read_to_string(&catalog_path).unwrap();
    let lines: Vec<&str> = catalog.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "product_1,Cups 96PCS,9,Future Trading,,NON-CTN,96");
    assert_eq!(lines[2], "product_2,Sugar 1KG,,Future Trading,1000G,NON-CTN,");

    let report = fs::read_to_string(&report_path).unwrap();
    assert!(report.starts_with("section,key,value\n"));
    assert!(report.contains("summary,total_products,2\n"));
    assert!(report.contains("supplier_products,Future Trading,2\n"));
}
