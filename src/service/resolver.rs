use crate::config::MatchingConfig;
use crate::models::{
    MatchCandidate, MatchQuery, MatchResult, MatchStatus, TieBreak, NOT_AVAILABLE_EVERYWHERE,
};
use crate::service::similarity::cosine_similarity;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// 候选标题判定
#[derive(Debug, Clone)]
pub struct MatchResolver {
    threshold: f64,
    tie_break: TieBreak,
    precision: u32,
}

impl Default for MatchResolver {
    fn default() -> Self {
        Self::new(&MatchingConfig::default())
    }
}

impl MatchResolver {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            threshold: config.threshold,
            tie_break: config.tie_break,
            precision: config.precision,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 对每个可用候选打分, 取最高分, 与阈值比较
    pub fn resolve(&self, query: &MatchQuery) -> MatchResult {
        let input = query.input_title.to_lowercase();

        let mut candidates: Vec<&MatchCandidate> =
            query.candidates.iter().filter(|c| c.is_available()).collect();
        candidates.sort_by_key(|c| c.slot);

        let mut per_slot_similarity = BTreeMap::new();
        // (候选, 原始分): 取最高分时比较原始分, 输出时再取整
        let mut best: Option<(&MatchCandidate, f64)> = None;

        for candidate in candidates {
            let score = cosine_similarity(&input, &candidate.title.to_lowercase());
            per_slot_similarity.insert(candidate.slot, self.round(score));

            let better = match best {
                None => true,
                Some((_, best_score)) => match self.tie_break {
                    TieBreak::EarliestSlot => score > best_score,
                    TieBreak::LatestSlot => score >= best_score,
                },
            };
            if better {
                best = Some((candidate, score));
            }
        }

        let best_similarity = best.map_or(0.0, |(_, s)| self.round(s));
        match best {
            Some((candidate, _)) if best_similarity >= self.threshold => MatchResult {
                per_slot_similarity,
                best_similarity,
                best_slot: Some(candidate.slot),
                matched_url: candidate.url.clone(),
                status: MatchStatus::Matched,
            },
            _ => MatchResult {
                per_slot_similarity,
                best_similarity,
                best_slot: best.map(|(c, _)| c.slot),
                matched_url: NOT_AVAILABLE_EVERYWHERE.to_string(),
                status: MatchStatus::Unmatched,
            },
        }
    }

    /// 批量判定, 输出顺序与输入一致
    pub fn resolve_batch(&self, queries: &[MatchQuery]) -> Vec<MatchResult> {
        queries.par_iter().map(|q| self.resolve(q)).collect()
    }

    fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.precision as i32);
        (value * factor).round() / factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(input: &str, titles: [&str; 5]) -> MatchQuery {
        MatchQuery {
            id: "1".to_string(),
            serial_number: None,
            input_title: input.to_string(),
            candidates: titles
                .iter()
                .enumerate()
                .map(|(i, t)| MatchCandidate::new(i + 1, format!("https://shop.example/{}", i + 1), *t))
                .collect(),
        }
    }

    #[test]
    fn picks_overlapping_candidate() {
        let q = query(
            "Pepsi 330ML Can",
            [
                "Samsung Galaxy Phone Case",
                "Wireless Mouse Black",
                "Pepsi Cola 330 ml Can",
                "Garden Hose Reel",
                "Yoga Mat Purple",
            ],
        );
        let result = MatchResolver::default().resolve(&q);

        assert_eq!(result.status, MatchStatus::Matched);
        assert_eq!(result.best_slot, Some(3));
        assert_eq!(result.matched_url, "https://shop.example/3");
        assert!(result.best_similarity >= 0.6);
        assert_eq!(result.per_slot_similarity.len(), 5);
        assert_eq!(result.per_slot_similarity[&1], 0.0);
    }

    #[test]
    fn unrelated_candidates_are_unmatched() {
        let q = query(
            "Pepsi 330ML Can",
            [
                "Samsung Galaxy Phone Case",
                "Wireless Mouse Black",
                "Garden Hose Reel",
                "Yoga Mat Purple",
                "Desk Lamp LED",
            ],
        );
        let result = MatchResolver::default().resolve(&q);

        assert_eq!(result.status, MatchStatus::Unmatched);
        assert_eq!(result.matched_url, NOT_AVAILABLE_EVERYWHERE);
        assert_eq!(result.best_similarity, 0.0);
    }

    #[test]
    fn placeholder_slots_are_omitted() {
        let q = query(
            "Nido Milk Powder 2500G",
            ["not_available", "Nido Milk Powder 2500G", "", "Not Available", "Tea"],
        );
        let result = MatchResolver::default().resolve(&q);

        let slots: Vec<usize> = result.per_slot_similarity.keys().copied().collect();
        assert_eq!(slots, vec![2, 5]);
        assert_eq!(result.per_slot_similarity[&2], 1.0);
        assert_eq!(result.best_slot, Some(2));
    }

    #[test]
    fn ties_follow_configured_rule() {
        let titles = ["Rice Bag", "Rice Bag", "Soap", "Soap", "Soap"];

        let earliest = MatchResolver::default().resolve(&query("rice bag", titles));
        assert_eq!(earliest.best_slot, Some(1));

        let latest = MatchResolver::new(&MatchingConfig {
            tie_break: TieBreak::LatestSlot,
            ..MatchingConfig::default()
        })
        .resolve(&query("rice bag", titles));
        assert_eq!(latest.best_slot, Some(2));
    }

    #[test]
    fn threshold_is_tunable() {
        let q = query("pepsi cola can", ["pepsi zero", "", "", "", ""]);
        let strict = MatchResolver::default().resolve(&q);
        assert_eq!(strict.status, MatchStatus::Unmatched);
        // 未匹配时仍报告最高分的槽位
        assert_eq!(strict.best_slot, Some(1));

        let loose = MatchResolver::new(&MatchingConfig {
            threshold: 0.1,
            ..MatchingConfig::default()
        })
        .resolve(&q);
        assert_eq!(loose.status, MatchStatus::Matched);
        assert_eq!(loose.matched_url, "https://shop.example/1");
    }

    #[test]
    fn scores_are_rounded() {
        let q = query("Pepsi 330ML Can", ["Pepsi Cola 330 ml Can", "", "", "", ""]);
        let score = MatchResolver::default().resolve(&q).best_similarity;
        assert_eq!(score, (score * 1000.0).round() / 1000.0);
    }

    #[test]
    fn argmax_uses_unrounded_scores() {
        // 两者取整后均为 0.657, 原始分 slot 2 略高
        let q = query(
            "pepsi cola 330ml can",
            ["pepsi cola 330", "pepsi cola 330 can pepsi can diet zero", "", "", ""],
        );
        let result = MatchResolver::default().resolve(&q);

        assert_eq!(result.per_slot_similarity[&1], 0.657);
        assert_eq!(result.per_slot_similarity[&2], 0.657);
        assert_eq!(result.best_slot, Some(2));
        assert_eq!(result.matched_url, "https://shop.example/2");
        assert_eq!(result.best_similarity, 0.657);
        assert_eq!(result.status, MatchStatus::Matched);
    }

    #[test]
    fn no_candidates_means_unmatched() {
        let q = query("anything", ["", "", "", "", ""]);
        let result = MatchResolver::default().resolve(&q);
        assert!(result.per_slot_similarity.is_empty());
        assert_eq!(result.status, MatchStatus::Unmatched);
        assert_eq!(result.best_slot, None);
    }

    #[test]
    fn batch_preserves_order() {
        let queries = vec![
            query("rice bag", ["Rice Bag", "", "", "", ""]),
            query("rice bag", ["Soap", "", "", "", ""]),
        ];
        let results = MatchResolver::default().resolve_batch(&queries);
        assert_eq!(results[0].status, MatchStatus::Matched);
        assert_eq!(results[1].status, MatchStatus::Unmatched);
    }
}
