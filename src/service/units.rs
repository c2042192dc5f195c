use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LEADING_NUMBER: Regex =
        Regex::new(r"^[0-9]+(?:\.[0-9]+)?").expect("Invalid number regex pattern");
}

/// 可换算为克的计量单位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Kilogram,
    Gram,
    /// 按水的密度近似: 1 L ≈ 1000 g
    Litre,
    /// 1 mL ≈ 1 g
    Millilitre,
}

impl Unit {
    /// 解析单位标记 (已大写), 不在换算表中的标记返回 None
    pub fn parse(token: &str) -> Option<Unit> {
        match token {
            "KG" | "KGS" => Some(Unit::Kilogram),
            "G" | "GM" | "GR" | "GRAM" | "GRAMS" => Some(Unit::Gram),
            "L" | "LTR" | "LITRE" => Some(Unit::Litre),
            "ML" | "M L" => Some(Unit::Millilitre),
            _ => None,
        }
    }

    pub fn grams_factor(&self) -> f64 {
        match self {
            Unit::Kilogram | Unit::Litre => 1000.0,
            Unit::Gram | Unit::Millilitre => 1.0,
        }
    }
}

/// 商品名中识别的单位标记, 按尝试顺序排列
pub const UNIT_TOKENS: [&str; 13] = [
    "KG", "KGS", "G", "GM", "GR", "GRAM", "GRAMS", "L", "LTR", "LITRE", "ML", "M L", "LT",
];

/// 数量 + 单位 -> "<整数克>G"
///
/// 无法识别的单位按 ×1 处理 (如 "LT"), 数量无法解析时返回 None。
/// 取整为四舍五入 (远离零)。
pub fn normalize_to_grams(quantity: &str, unit_token: &str) -> Option<String> {
    let value: f64 = quantity.trim().parse().ok()?;
    let token = unit_token.trim().to_uppercase();

    let factor = match Unit::parse(&token) {
        Some(unit) => unit.grams_factor(),
        None => {
            tracing::debug!("unrecognized unit token {:?}, keeping value as grams", token);
            1.0
        }
    };

    Some(format!("{}G", (value * factor).round() as i64))
}

/// 提取商品名中第一个重量/体积并换算为克, 如 "2.5KGX 4" -> "2500G"
pub fn extract_weight_quantity(name: &str) -> Option<String> {
    let text = name.trim().to_uppercase();

    for (start, ch) in text.char_indices() {
        if !ch.is_ascii_digit() {
            continue;
        }
        let rest = &text[start..];
        let Some(number) = LEADING_NUMBER.find(rest) else {
            continue;
        };
        let after = rest[number.end()..].trim_start();

        for token in UNIT_TOKENS {
            if let Some(tail) = after.strip_prefix(token) {
                if unit_boundary(tail) {
                    return normalize_to_grams(number.as_str(), token);
                }
            }
        }
    }

    None
}

/// 单位后允许紧跟: 结尾、空白、乘号、X、数字或任何非单词字符
fn unit_boundary(tail: &str) -> bool {
    match tail.chars().next() {
        None => true,
        Some(c) => c == 'X' || c.is_ascii_digit() || !(c.is_alphanumeric() || c == '_'),
    }
}
