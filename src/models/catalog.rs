use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 标准字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    ProductName,
    SerialNumber,
    /// 供应商自带的包装单位列
    PackagingUnit,
}

impl CanonicalField {
    pub fn column_name(&self) -> &'static str {
        match self {
            CanonicalField::ProductName => "Product_Name",
            CanonicalField::SerialNumber => "Serial_Number",
            CanonicalField::PackagingUnit => "Unit",
        }
    }
}

/// 包装类型 (整箱 / 非整箱)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PackagingType {
    #[serde(rename = "CTN")]
    Ctn,
    #[serde(rename = "NON-CTN")]
    NonCtn,
}

impl PackagingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackagingType::Ctn => "CTN",
            PackagingType::NonCtn => "NON-CTN",
        }
    }
}

impl fmt::Display for PackagingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 供应商原始行: 列名 -> 单元格文本
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: IndexMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    /// 取非空单元格 (去除首尾空白)
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// 按映射表重命名列, 未出现在映射表中的列保持原名
    pub fn rename_columns(self, rename: &IndexMap<String, String>) -> Self {
        let fields = self
            .fields
            .into_iter()
            .map(|(k, v)| match rename.get(&k) {
                Some(canonical) => (canonical.clone(), v),
                None => (k, v),
            })
            .collect();
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// 单个供应商文件读入的原始数据
#[derive(Debug, Clone, Default)]
pub struct RawBatch {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

/// 标准化后的商品记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub product_name: String,
    pub serial_number: Option<String>,
    pub supplier: String,
    /// 统一换算为克, 如 "400G"
    pub weight_quantity: Option<String>,
    pub units_per_carton: Option<u32>,
    pub packaging_type: PackagingType,
}

/// 单个供应商的标准化结果, 交给合并器
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub supplier: String,
    pub records: Vec<NormalizedRecord>,
}

/// 主目录条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterCatalogEntry {
    pub product_id: String,
    #[serde(flatten)]
    pub record: NormalizedRecord,
}

/// 主目录 CSV 列顺序
pub const MASTER_CATALOG_COLUMNS: [&str; 7] = [
    "Product_ID",
    "Product_Name",
    "Serial_Number",
    "Supplier",
    "Weight_Quantity",
    "Packaging_Type",
    "Units_Per_Carton",
];
