//! 百分位模块
//! 最近秩（不插值）百分位估计

use std::time::Duration;

/// 秩的取法
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum RankRule {
    /// 1 起始秩 `ceil(p * len)`，截断到 [1, len]
    #[default]
    NearestRank,
    /// 0 起始下标 `floor((len - 1) * p)`，与历史结果逐位一致
    Floor,
}

impl RankRule {
    /// 分位 `p` 在长度为 `len` 的序列中的 0 起始下标，`len` 必须非零
    #[inline]
    fn index(self, len: usize, p: f64) -> usize {
        let last = len - 1;
        // NaN 的比较为 false，按 0 处理
        let p = if p > 0.0 { p.min(1.0) } else { 0.0 };
        let index = match self {
            RankRule::NearestRank => ((len as f64) * p).ceil().max(1.0) as usize - 1,
            RankRule::Floor => ((last as f64) * p).floor() as usize,
        };
        index.min(last)
    }
}

/// 从升序延迟序列中取分位 `p` 对应的样本，空序列返回 0
#[inline]
pub fn percentile(sorted: &[Duration], p: f64) -> Duration {
    percentile_with(sorted, p, RankRule::default())
}

pub fn percentile_with(sorted: &[Duration], p: f64, rule: RankRule) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    sorted[rule.index(sorted.len(), p)]
}

/// p50 / p95 / p99
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LatencyPercentiles {
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
}

impl LatencyPercentiles {
    pub fn from_sorted(sorted: &[Duration], rule: RankRule) -> Self {
        Self {
            p50: percentile_with(sorted, 0.50, rule),
            p95: percentile_with(sorted, 0.95, rule),
            p99: percentile_with(sorted, 0.99, rule),
        }
    }

    /// 以微秒表示，供结果输出
    pub fn as_micros(&self) -> (f64, f64, f64) {
        (
            self.p50.as_micros() as f64,
            self.p95.as_micros() as f64,
            self.p99.as_micros() as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn micros(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&v| Duration::from_micros(v)).collect()
    }

    #[test]
    fn empty_is_zero() {
        for p in [0.0, 0.5, 0.99, 1.0] {
            assert_eq!(percentile(&[], p), Duration::ZERO);
            assert_eq!(percentile_with(&[], p, RankRule::Floor), Duration::ZERO);
        }
        assert_eq!(
            LatencyPercentiles::from_sorted(&[], RankRule::NearestRank),
            LatencyPercentiles::default()
        );
    }

    #[test]
    fn nearest_rank() {
        let lat = micros(&[10, 20, 30, 40, 50]);
        assert_eq!(percentile(&lat, 0.5), Duration::from_micros(30));
        assert_eq!(percentile(&lat, 0.95), Duration::from_micros(50));
        assert_eq!(percentile(&lat, 0.99), Duration::from_micros(50));
        assert_eq!(percentile(&lat, 0.0), Duration::from_micros(10));
        assert_eq!(percentile(&lat, 1.0), Duration::from_micros(50));
    }

    #[test]
    fn floor_rule() {
        let lat = micros(&[10, 20, 30, 40, 50]);
        assert_eq!(percentile_with(&lat, 0.5, RankRule::Floor), Duration::from_micros(30));
        assert_eq!(percentile_with(&lat, 0.95, RankRule::Floor), Duration::from_micros(40));
        assert_eq!(percentile_with(&lat, 1.0, RankRule::Floor), Duration::from_micros(50));
    }

    #[test]
    fn out_of_range_quantiles_clamp() {
        let lat = micros(&[1, 2, 3]);
        for rule in [RankRule::NearestRank, RankRule::Floor] {
            assert_eq!(percentile_with(&lat, -1.0, rule), Duration::from_micros(1));
            assert_eq!(percentile_with(&lat, 7.0, rule), Duration::from_micros(3));
            assert_eq!(percentile_with(&lat, f64::NAN, rule), Duration::from_micros(1));
        }
    }

    #[test]
    fn micros_triple() {
        let p = LatencyPercentiles::from_sorted(&micros(&[10, 20, 30, 40, 50]), RankRule::NearestRank);
        assert_eq!(p.as_micros(), (30.0, 50.0, 50.0));
    }

    proptest! {
        #[test]
        fn result_is_an_observed_sample(
            mut values in proptest::collection::vec(0u64..1_000_000, 1..200),
            p in 0.0f64..=1.0,
            floor in any::<bool>(),
        ) {
            values.sort_unstable();
            let lat = micros(&values);
            let rule = if floor { RankRule::Floor } else { RankRule::NearestRank };
            let got = percentile_with(&lat, p, rule);
            prop_assert!(lat.contains(&got));
        }

        #[test]
        fn monotone_in_p(
            mut values in proptest::collection::vec(0u64..1_000_000, 1..200),
            a in 0.0f64..=1.0,
            b in 0.0f64..=1.0,
        ) {
            values.sort_unstable();
            let lat = micros(&values);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(percentile(&lat, lo) <= percentile(&lat, hi));
            prop_assert!(percentile_with(&lat, lo, RankRule::Floor) <= percentile_with(&lat, hi, RankRule::Floor));
        }
    }
}
