use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref PIECES: Regex =
        Regex::new(r"(\d+)\s*(?:PCS|PC|PS)\b").expect("Invalid pieces regex pattern");
    static ref BRACKET_MULTIPLIER: Regex =
        Regex::new(r"\(\s*[\d.]+\s*(?:ML|L|G|KG)?\s*[*×X]\s*(\d+)\s*\)")
            .expect("Invalid bracket regex pattern");
    static ref STAR_BEFORE_UNIT: Regex =
        Regex::new(r"(\d+)\s*[*×]\s*[\d.]+\s*(?:ML|L|LTR|G|KG|MIL|OZ)")
            .expect("Invalid star multiplier regex pattern");
    static ref X_TOKEN: Regex = Regex::new(r"(\d+)\s*[X×]\s*").expect("Invalid X token regex pattern");
    static ref COUNT_X_UNIT: Regex =
        Regex::new(r"\b(\d+)\s*[X×]\s*\d*\s*(?:KG|G|GM|L|ML)\b")
            .expect("Invalid count-unit regex pattern");
    static ref BAGS: Regex =
        Regex::new(r"\b(\d+)\s*(?:BAG|BAGS|TEABAG|TEABAGS|TEA BAGS|STICKS)\b")
            .expect("Invalid bag regex pattern");
    static ref PLUS: Regex = Regex::new(r"(\d+)\s*\+\s*(\d+)").expect("Invalid plus regex pattern");
    static ref ANY_MULTIPLIER: Regex =
        Regex::new(r"[*×X]\s*(\d+)").expect("Invalid fallback regex pattern");
}

/// 规则结果: 外层 None 表示未命中; 命中但数量超出 u32 时为 Some(None)
type Recognized = Option<Option<u32>>;

/// 箱规识别规则 (输入已大写)
#[derive(Debug, Clone, Copy)]
pub struct CartonRule {
    pub name: &'static str,
    recognize: fn(&str) -> Recognized,
}

impl CartonRule {
    pub fn apply(&self, text: &str) -> Option<u32> {
        (self.recognize)(text).flatten()
    }
}

/// 按优先级排列, 首个命中的规则生效。
/// 命中后数量溢出时整体返回 None, 不再尝试后续规则。
pub static CARTON_RULES: [CartonRule; 9] = [
    CartonRule { name: "pieces", recognize: pieces },
    CartonRule { name: "bracket_multiplier", recognize: bracket_multiplier },
    CartonRule { name: "count_times_quantity", recognize: count_times_quantity },
    CartonRule { name: "chained_multipliers", recognize: chained_multipliers },
    CartonRule { name: "single_multiplier", recognize: single_multiplier },
    CartonRule { name: "count_x_unit", recognize: count_x_unit },
    CartonRule { name: "bags", recognize: bags },
    CartonRule { name: "plus_combo", recognize: plus_combo },
    CartonRule { name: "any_multiplier", recognize: any_multiplier },
];

/// 从商品名推断每箱数量, 无法识别返回 None (与 "1 件" 区分)
pub fn extract_units_per_carton(name: &str) -> Option<u32> {
    matching_rule(name).map(|(_, units)| units)
}

/// 返回命中的规则名和数量
pub fn matching_rule(name: &str) -> Option<(&'static str, u32)> {
    let text = name.trim().to_uppercase();
    let (rule, units) = CARTON_RULES
        .iter()
        .find_map(|rule| (rule.recognize)(&text).map(|units| (rule.name, units)))?;

    if units.is_none() {
        tracing::debug!("carton rule {} matched {:?} but the count overflows", rule, name);
    }
    units.map(|units| (rule, units))
}

fn group(caps: &Captures, idx: usize) -> Option<u32> {
    caps.get(idx)?.as_str().parse().ok()
}

fn single_group(re: &Regex, text: &str) -> Recognized {
    re.captures(text).map(|caps| group(&caps, 1))
}

/// "96PCS" / "12 PC"
fn pieces(text: &str) -> Recognized {
    single_group(&PIECES, text)
}

/// "(1.5 ML*12)" -> 12
fn bracket_multiplier(text: &str) -> Recognized {
    single_group(&BRACKET_MULTIPLIER, text)
}

/// "6*2.5L" / "6×2.25LTR" -> 6
fn count_times_quantity(text: &str) -> Recognized {
    single_group(&STAR_BEFORE_UNIT, text)
}

/// 紧跟数字的 X 之前的各个数量
fn x_counts(text: &str) -> Vec<Option<u32>> {
    X_TOKEN
        .captures_iter(text)
        .filter(|caps| {
            let end = caps.get(0).map_or(text.len(), |m| m.end());
            text[end..].starts_with(|c: char| c.is_ascii_digit())
        })
        .map(|caps| group(&caps, 1))
        .collect()
}

/// "4 X 18 X 56G" -> 72
fn chained_multipliers(text: &str) -> Recognized {
    let counts = x_counts(text);
    if counts.len() < 2 {
        return None;
    }
    Some(
        counts
            .into_iter()
            .try_fold(1u32, |acc, n| acc.checked_mul(n?)),
    )
}

/// "24X500 ML" -> 24
fn single_multiplier(text: &str) -> Recognized {
    match x_counts(text).as_slice() {
        [count] => Some(*count),
        _ => None,
    }
}

/// "12X KG"
fn count_x_unit(text: &str) -> Recognized {
    single_group(&COUNT_X_UNIT, text)
}

/// "100 TEABAGS" / "25 STICKS"
fn bags(text: &str) -> Recognized {
    single_group(&BAGS, text)
}

/// "36+6" -> 42
fn plus_combo(text: &str) -> Recognized {
    let caps = PLUS.captures(text)?;
    Some(group(&caps, 1).zip(group(&caps, 2)).and_then(|(a, b)| a.checked_add(b)))
}

/// "7 UP 150 ML X 30" -> 30
fn any_multiplier(text: &str) -> Recognized {
    single_group(&ANY_MULTIPLIER, text)
}
