use std::collections::BTreeMap;

/// 分词: 连续字母或连续数字为一个词, 统一小写 ("330ML" -> "330", "ml")
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_numeric = false;

    for ch in text.chars() {
        let numeric = ch.is_numeric();
        if !(numeric || ch.is_alphabetic()) {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !current.is_empty() && numeric != current_numeric {
            tokens.push(std::mem::take(&mut current));
        }
        current_numeric = numeric;
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn term_counts(tokens: &[String]) -> BTreeMap<&str, f64> {
    let mut counts = BTreeMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0.0) += 1.0;
    }
    counts
}

/// 两篇文档语料上的 TF-IDF 余弦相似度, 结果在 [0, 1]
///
/// idf 采用平滑形式 ln((1 + n) / (1 + df)) + 1, n = 2。
/// 任一方没有词时返回 0.0。
pub fn cosine_similarity(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let tf_a = term_counts(&tokens_a);
    let tf_b = term_counts(&tokens_b);

    let idf = |term: &str| {
        let df = f64::from(u8::from(tf_a.contains_key(term)) + u8::from(tf_b.contains_key(term)));
        (3.0 / (1.0 + df)).ln() + 1.0
    };

    // 按词序累加, 结果可逐位复现
    let wa: BTreeMap<&str, f64> = tf_a.iter().map(|(t, c)| (*t, c * idf(*t))).collect();
    let wb: BTreeMap<&str, f64> = tf_b.iter().map(|(t, c)| (*t, c * idf(*t))).collect();

    let dot: f64 = wa
        .iter()
        .filter_map(|(t, w)| wb.get(t).map(|v| w * v))
        .sum();
    let norm_a = wa.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = wb.values().map(|w| w * w).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}
