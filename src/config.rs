use crate::error::{PipelineError, PipelineResult};
use crate::models::{CanonicalField, TieBreak};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// 商品目录合并配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// 按顺序处理的供应商数据源
    pub sources: Vec<SourceConfig>,
    pub output_path: String,
    pub report_path: String,
    /// 标准字段 -> 各供应商历史列名
    pub column_aliases: Vec<ColumnAlias>,
    /// 使用显式包装字段的供应商
    pub packaging_overrides: Vec<PackagingOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    pub supplier: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnAlias {
    pub field: CanonicalField,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingOverride {
    pub supplier: String,
    pub field: String,
}

/// 标题相似度匹配配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// 判定为匹配的最低相似度
    pub threshold: f64,
    pub tie_break: TieBreak,
    /// 相似度保留的小数位数
    pub precision: u32,
    pub max_slots: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            tie_break: TieBreak::EarliestSlot,
            precision: 3,
            max_slots: 5,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let alias = |field, names: &[&str]| ColumnAlias {
            field,
            aliases: names.iter().map(|s| s.to_string()).collect(),
        };

        Self {
            sources: Vec::new(),
            output_path: "data/cleaned_products.csv".to_string(),
            report_path: "data/catalog_report.csv".to_string(),
            column_aliases: vec![
                alias(
                    CanonicalField::ProductName,
                    &["Product_Name", "Item Name", "PRODUCT TITLE", "Name"],
                ),
                alias(
                    CanonicalField::SerialNumber,
                    &["Serial_Number", "SERIAL NUMBER", "SL NO"],
                ),
                alias(CanonicalField::PackagingUnit, &["Unit"]),
            ],
            packaging_overrides: Vec::new(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/product_catalog".to_string(),
            },
            catalog: CatalogConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

impl AppConfig {
    /// 加载配置: 默认值 -> config/catalog.toml -> CATALOG__* 环境变量
    pub fn load() -> PipelineResult<Self> {
        let path = std::env::var("CATALOG_CONFIG").unwrap_or_else(|_| "config/catalog".to_string());

        let mut builder = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name(&path).required(false))
            .add_source(Environment::with_prefix("CATALOG").separator("__"));

        // 兼容旧的扁平环境变量
        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }
        if let Ok(host) = std::env::var("SERVER_HOST") {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置参数
    pub fn validate(&self) -> PipelineResult<()> {
        let m = &self.matching;
        if !(0.0..=1.0).contains(&m.threshold) {
            return Err(PipelineError::Config(format!(
                "matching.threshold must be within [0, 1], got {}",
                m.threshold
            )));
        }
        if m.max_slots == 0 {
            return Err(PipelineError::Config(
                "matching.max_slots must be greater than 0".to_string(),
            ));
        }
        if m.precision > 10 {
            return Err(PipelineError::Config(format!(
                "matching.precision must be at most 10, got {}",
                m.precision
            )));
        }

        for (i, source) in self.catalog.sources.iter().enumerate() {
            if source.supplier.trim().is_empty() {
                return Err(PipelineError::Config(format!(
                    "catalog.sources[{}].supplier cannot be empty",
                    i
                )));
            }
        }

        for alias in &self.catalog.column_aliases {
            if alias.aliases.iter().all(|a| a.trim().is_empty()) {
                return Err(PipelineError::Config(format!(
                    "catalog.column_aliases for {:?} cannot be empty",
                    alias.field
                )));
            }
        }

        for o in &self.catalog.packaging_overrides {
            if o.supplier.trim().is_empty() || o.field.trim().is_empty() {
                return Err(PipelineError::Config(
                    "catalog.packaging_overrides entries need supplier and field".to_string(),
                ));
            }
        }

        Ok(())
    }
}
