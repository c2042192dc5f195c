use crate::models::{MasterCatalogEntry, PackagingType};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 序列号出现次数 / 覆盖供应商数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialCount {
    pub serial_number: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierCount {
    pub supplier: String,
    pub total_products: usize,
}

/// 主目录分析报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogReport {
    pub total_products: usize,
    pub ctn_products: usize,
    pub non_ctn_products: usize,
    /// 整箱按箱内数量计, 其余按 1 计
    pub total_units: u64,
    pub duplicate_serial_numbers: Vec<SerialCount>,
    pub missing_serial_numbers: usize,
    pub supplier_counts: Vec<SupplierCount>,
    /// 出现在多个供应商目录中的序列号 (count = 供应商数)
    pub multi_catalog_serials: Vec<SerialCount>,
    pub single_catalog_serials: usize,
}

impl CatalogReport {
    pub fn from_catalog(entries: &[MasterCatalogEntry]) -> Self {
        let mut ctn_products = 0;
        let mut total_units = 0u64;
        let mut missing_serial_numbers = 0;
        let mut serial_counts: IndexMap<&str, usize> = IndexMap::new();
        let mut serial_suppliers: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
        let mut supplier_totals: HashMap<&str, usize> = HashMap::new();

        for entry in entries {
            let r = &entry.record;

            match (r.packaging_type, r.units_per_carton) {
                (PackagingType::Ctn, Some(units)) if units > 0 => {
                    ctn_products += 1;
                    total_units += u64::from(units);
                }
                (PackagingType::Ctn, _) => {
                    ctn_products += 1;
                    total_units += 1;
                }
                (PackagingType::NonCtn, _) => total_units += 1,
            }

            *supplier_totals.entry(r.supplier.as_str()).or_insert(0) += 1;

            match r.serial_number.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                Some(serial) => {
                    *serial_counts.entry(serial).or_insert(0) += 1;
                    serial_suppliers
                        .entry(serial)
                        .or_default()
                        .insert(r.supplier.as_str());
                }
                None => missing_serial_numbers += 1,
            }
        }

        let duplicate_serial_numbers = serial_counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(serial, count)| SerialCount {
                serial_number: serial.to_string(),
                count: *count,
            })
            .collect();

        let multi_catalog_serials = serial_suppliers
            .iter()
            .filter(|(_, suppliers)| suppliers.len() > 1)
            .map(|(serial, suppliers)| SerialCount {
                serial_number: serial.to_string(),
                count: suppliers.len(),
            })
            .collect();

        let single_catalog_serials = serial_suppliers.values().filter(|s| s.len() == 1).count();

        let mut supplier_counts: Vec<SupplierCount> = supplier_totals
            .into_iter()
            .map(|(supplier, total_products)| SupplierCount {
                supplier: supplier.to_string(),
                total_products,
            })
            .collect();
        supplier_counts.sort_by(|a, b| {
            b.total_products
                .cmp(&a.total_products)
                .then_with(|| a.supplier.cmp(&b.supplier))
        });

        Self {
            total_products: entries.len(),
            ctn_products,
            non_ctn_products: entries.len() - ctn_products,
            total_units,
            duplicate_serial_numbers,
            missing_serial_numbers,
            supplier_counts,
            multi_catalog_serials,
            single_catalog_serials,
        }
    }
}
