use crate::config::PackagingOverride;
use crate::models::{CanonicalField, PackagingType, RawRecord};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 整箱关键字
pub const CARTON_KEYWORDS: [&str; 3] = ["CTN", "CARTON", "CARTONS"];

/// 根据商品名判断包装类型, 名称缺失时为 NON-CTN
pub fn detect_packaging_type(name: Option<&str>) -> PackagingType {
    let Some(name) = name else {
        return PackagingType::NonCtn;
    };
    let upper = name.trim().to_uppercase();
    if CARTON_KEYWORDS.iter().any(|k| upper.contains(k)) {
        PackagingType::Ctn
    } else {
        PackagingType::NonCtn
    }
}

/// 显式包装单位字段: 仅 "CTN" 视为整箱
pub fn packaging_from_unit(unit: Option<&str>) -> PackagingType {
    match unit {
        Some(u) if u.trim().eq_ignore_ascii_case("CTN") => PackagingType::Ctn,
        _ => PackagingType::NonCtn,
    }
}

/// 单个供应商的包装判定策略
pub trait PackagingStrategy: Send + Sync + fmt::Debug {
    fn classify(&self, record: &RawRecord) -> PackagingType;

    /// 该批次的列是否满足策略所需
    fn is_applicable(&self, _columns: &[String]) -> bool {
        true
    }
}

/// 默认策略: 商品名关键字
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordStrategy;

impl PackagingStrategy for KeywordStrategy {
    fn classify(&self, record: &RawRecord) -> PackagingType {
        detect_packaging_type(record.get(CanonicalField::ProductName.column_name()))
    }
}

/// 供应商提供了包装单位列时直接使用该列
#[derive(Debug, Clone)]
pub struct ExplicitFieldStrategy {
    field: String,
}

impl ExplicitFieldStrategy {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

impl PackagingStrategy for ExplicitFieldStrategy {
    fn classify(&self, record: &RawRecord) -> PackagingType {
        packaging_from_unit(record.get(&self.field))
    }

    fn is_applicable(&self, columns: &[String]) -> bool {
        columns.iter().any(|c| c == &self.field)
    }
}

/// 供应商 -> 包装策略 查找表
#[derive(Debug, Clone)]
pub struct PackagingClassifier {
    default: Arc<dyn PackagingStrategy>,
    overrides: HashMap<String, Arc<dyn PackagingStrategy>>,
}

impl Default for PackagingClassifier {
    fn default() -> Self {
        Self {
            default: Arc::new(KeywordStrategy),
            overrides: HashMap::new(),
        }
    }
}

impl PackagingClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_overrides(overrides: &[PackagingOverride]) -> Self {
        overrides.iter().fold(Self::new(), |classifier, o| {
            classifier.with_override(o.supplier.clone(), ExplicitFieldStrategy::new(o.field.clone()))
        })
    }

    pub fn with_override(
        mut self,
        supplier: impl Into<String>,
        strategy: impl PackagingStrategy + 'static,
    ) -> Self {
        self.overrides.insert(supplier.into(), Arc::new(strategy));
        self
    }

    /// 选择供应商的策略; 覆盖策略所需列不存在时回退到关键字策略
    pub fn strategy_for(&self, supplier: &str, columns: &[String]) -> &dyn PackagingStrategy {
        match self.overrides.get(supplier) {
            Some(strategy) if strategy.is_applicable(columns) => strategy.as_ref(),
            Some(strategy) => {
                tracing::warn!(
                    "[Catalog] {}: packaging override {:?} not applicable to columns, using product name keywords",
                    supplier,
                    strategy
                );
                self.default.as_ref()
            }
            None => self.default.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs.iter().copied().collect()
    }

    #[test]
    fn keyword_detection_is_total() {
        assert_eq!(detect_packaging_type(Some("Pepsi 24X330ML CTN")), PackagingType::Ctn);
        assert_eq!(detect_packaging_type(Some("noodles carton")), PackagingType::Ctn);
        assert_eq!(detect_packaging_type(Some("Rice BAG 5KG")), PackagingType::NonCtn);
        assert_eq!(detect_packaging_type(Some("")), PackagingType::NonCtn);
        assert_eq!(detect_packaging_type(None), PackagingType::NonCtn);
    }

    #[test]
    fn explicit_unit_must_equal_ctn() {
        assert_eq!(packaging_from_unit(Some(" ctn ")), PackagingType::Ctn);
        assert_eq!(packaging_from_unit(Some("CARTON")), PackagingType::NonCtn);
        assert_eq!(packaging_from_unit(Some("")), PackagingType::NonCtn);
        assert_eq!(packaging_from_unit(None), PackagingType::NonCtn);
    }

    #[test]
    fn override_only_applies_to_named_supplier() {
        let classifier = PackagingClassifier::new().with_override("Wholesale", ExplicitFieldStrategy::new("Unit"));
        let columns = vec!["Product_Name".to_string(), "Unit".to_string()];
        let row = record(&[("Product_Name", "Dates 12 CTN"), ("Unit", "BOX")]);

        assert_eq!(
            classifier.strategy_for("Wholesale", &columns).classify(&row),
            PackagingType::NonCtn
        );
        assert_eq!(
            classifier.strategy_for("Retail", &columns).classify(&row),
            PackagingType::Ctn
        );
    }

    #[test]
    fn override_falls_back_without_its_column() {
        let classifier = PackagingClassifier::new().with_override("Wholesale", ExplicitFieldStrategy::new("Unit"));
        let columns = vec!["Product_Name".to_string()];
        let row = record(&[("Product_Name", "Dates CARTON")]);

        assert_eq!(
            classifier.strategy_for("Wholesale", &columns).classify(&row),
            PackagingType::Ctn
        );
    }
}
