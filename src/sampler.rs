//! 偏斜采样模块
//! 按 Zipf（或 skew = 0 时的均匀）分布生成 key 编号

use crate::error::{AppError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Zipf};

/// Zipf 采样方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ZipfMethod {
    /// 逆变换近似：`xi = (η·c)^(-1/(1-s))`，与历史工作负载一致
    #[default]
    Approximate,
    /// `rand_distr::Zipf` 精确采样，头部集中度随 s 单调增加
    Exact,
}

#[derive(Clone, Debug)]
enum Law {
    Uniform,
    Approximate { alpha: f64, c: f64 },
    Exact(Zipf<f64>),
}

/// 偏斜 key 采样器
///
/// 随机源由实例独占，相同的 (seed, N, s, method) 产生完全相同的序列。
/// s 接近 1 时 alpha 趋于无穷，近似公式的结果就是浮点运算的结果，不做特殊处理。
#[derive(Clone, Debug)]
pub struct SkewSampler<R = ChaCha8Rng> {
    rng: R,
    n: u64,
    law: Law,
}

impl SkewSampler<ChaCha8Rng> {
    /// 用种子创建采样器
    pub fn seeded(seed: u64, n: u64, skew: f64, method: ZipfMethod) -> Result<Self> {
        Self::new(ChaCha8Rng::seed_from_u64(seed), n, skew, method)
    }
}

impl<R: Rng> SkewSampler<R> {
    /// 创建采样器，归一化常数的计算是 O(N) 的一次性开销
    pub fn new(rng: R, n: u64, skew: f64, method: ZipfMethod) -> Result<Self> {
        if n == 0 {
            return Err(AppError::ZipfCreate("key space must be non-empty".into()));
        }
        if !skew.is_finite() || skew < 0.0 {
            return Err(AppError::ZipfCreate(format!("invalid skew {}", skew)));
        }

        let law = if skew == 0.0 {
            Law::Uniform
        } else {
            match method {
                ZipfMethod::Approximate => Law::Approximate {
                    alpha: 1.0 / (1.0 - skew),
                    c: harmonic(n, skew),
                },
                ZipfMethod::Exact => Law::Exact(
                    Zipf::new(n as f64, skew).map_err(|e| AppError::ZipfCreate(e.to_string()))?,
                ),
            }
        };

        Ok(Self { rng, n, law })
    }

    /// 下一个 1 起始的 rank，近似公式下可能超过 N
    #[inline]
    pub fn next_rank(&mut self) -> u64 {
        match &self.law {
            Law::Uniform => self.rng.random_range(1..=self.n),
            Law::Approximate { alpha, c } => {
                let eta: f64 = self.rng.random();
                let xi = (eta * c).powf(-alpha);
                // `as` 饱和转换：inf -> u64::MAX，NaN -> 0
                xi.ceil() as u64
            }
            Law::Exact(zipf) => zipf.sample(&mut self.rng) as u64,
        }
    }

    /// 下一个 key 编号，落在 [0, N)
    #[inline]
    pub fn next_id(&mut self) -> u64 {
        self.next_rank() % self.n
    }

    pub fn key_space_size(&self) -> u64 {
        self.n
    }

    pub fn is_uniform(&self) -> bool {
        matches!(self.law, Law::Uniform)
    }
}

/// `Σ_{i=1}^{n} i^-s`
fn harmonic(n: u64, s: f64) -> f64 {
    (1..=n).map(|i| (i as f64).powf(-s)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn draw(sampler: &mut SkewSampler, count: usize) -> Vec<u64> {
        (0..count).map(|_| sampler.next_id()).collect()
    }

    /// 经验频率最高的前 1% 编号所占的份额
    fn top_share(n: u64, skew: f64, method: ZipfMethod, draws: usize) -> f64 {
        let mut sampler = SkewSampler::seeded(7, n, skew, method).unwrap();
        let mut freq: HashMap<u64, usize> = HashMap::new();
        for _ in 0..draws {
            *freq.entry(sampler.next_id()).or_default() += 1;
        }
        let mut counts: Vec<usize> = freq.into_values().collect();
        counts.sort_unstable_by(|a, b| b.cmp(a));
        let top = (n as usize / 100).max(1);
        counts.iter().take(top).sum::<usize>() as f64 / draws as f64
    }

    #[test]
    fn same_seed_same_sequence() {
        for method in [ZipfMethod::Approximate, ZipfMethod::Exact] {
            let mut a = SkewSampler::seeded(42, 1000, 0.99, method).unwrap();
            let mut b = SkewSampler::seeded(42, 1000, 0.99, method).unwrap();
            assert_eq!(draw(&mut a, 5000), draw(&mut b, 5000));
        }
    }

    #[test]
    fn different_seed_different_sequence() {
        let mut a = SkewSampler::seeded(1, 1000, 0.0, ZipfMethod::Approximate).unwrap();
        let mut b = SkewSampler::seeded(2, 1000, 0.0, ZipfMethod::Approximate).unwrap();
        assert_ne!(draw(&mut a, 100), draw(&mut b, 100));
    }

    #[test]
    fn uniform_converges() {
        let n = 10u64;
        let draws = 200_000;
        let mut sampler = SkewSampler::seeded(3, n, 0.0, ZipfMethod::Approximate).unwrap();
        assert!(sampler.is_uniform());
        let mut freq = vec![0usize; n as usize];
        for _ in 0..draws {
            freq[sampler.next_id() as usize] += 1;
        }
        for count in freq {
            let p = count as f64 / draws as f64;
            assert!((p - 0.1).abs() < 0.01, "frequency {p} too far from 1/N");
        }
    }

    #[test]
    fn exact_concentration_increases_with_skew() {
        let shares: Vec<f64> = [0.8, 0.9, 0.95, 0.99]
            .into_iter()
            .map(|s| top_share(1000, s, ZipfMethod::Exact, 100_000))
            .collect();
        for pair in shares.windows(2) {
            assert!(pair[0] < pair[1], "shares not increasing: {shares:?}");
        }
    }

    #[test]
    fn approximate_has_heavy_head() {
        let mut sampler = SkewSampler::seeded(42, 1000, 0.99, ZipfMethod::Approximate).unwrap();
        let draws = 100_000;
        let ones = (0..draws).filter(|_| sampler.next_id() == 1).count();
        // 头部份额约为 1 - 1/c
        assert!(ones as f64 / draws as f64 > 0.8);
    }

    #[test]
    fn single_key_space() {
        for method in [ZipfMethod::Approximate, ZipfMethod::Exact] {
            let mut sampler = SkewSampler::seeded(9, 1, 0.5, method).unwrap();
            assert!(draw(&mut sampler, 1000).iter().all(|&id| id == 0));
        }
        assert_eq!(harmonic(1, 0.99), 1.0);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(SkewSampler::seeded(1, 0, 0.5, ZipfMethod::Approximate).is_err());
        assert!(SkewSampler::seeded(1, 10, -1.0, ZipfMethod::Exact).is_err());
        assert!(SkewSampler::seeded(1, 10, f64::INFINITY, ZipfMethod::Approximate).is_err());
    }

    proptest! {
        #[test]
        fn ids_stay_in_key_space(
            n in 1u64..5000,
            skew in 0.0f64..2.0,
            seed in any::<u64>(),
            exact in any::<bool>(),
        ) {
            let method = if exact { ZipfMethod::Exact } else { ZipfMethod::Approximate };
            let mut sampler = SkewSampler::seeded(seed, n, skew, method).unwrap();
            for _ in 0..200 {
                prop_assert!(sampler.next_id() < n);
            }
        }
    }
}
