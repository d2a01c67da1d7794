//! Synthetic boundary-condition contracts.
//!
//! Three families are generated: contracts at maturity, deep out of the money
//! (underlying at zero) and deep in the money (underlying far above strike).
//! Structural fields follow closed-form boundary prices; every other feature
//! is drawn from a normal distribution fitted to the training partition.

use optionset_core::{OptionType, PipelineError, SyntheticRecord, INDUSTRY_COUNT};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::stats::{ColumnStats, FeatureStats};

/// Underlying price of the at-maturity family.
pub const AT_MATURITY_UNDERLYING: f64 = 100.0;
/// Strike of both boundary families.
pub const BOUNDARY_STRIKE: f64 = 100.0;
/// Resampled copies per strike in the at-maturity family.
pub const AT_MATURITY_REPETITIONS: usize = 10;
/// Resampled copies per expiry in the deep out-of-the-money family.
pub const DEEP_OTM_REPETITIONS: usize = 3;
/// Days to expiry swept by the boundary families, as `first..end`.
pub const BOUNDARY_DAYS: std::ops::Range<u32> = 2..60;
const DAYS_PER_YEAR: f64 = 365.0;

/// Price and delta of a contract under a boundary condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryPrice {
    pub option_price: f64,
    pub delta: f64,
}

/// Intrinsic value at expiry. Delta is the step of the payoff, one half at the money.
#[must_use]
pub fn at_maturity_price(option_type: OptionType, underlying: f64, strike: f64) -> BoundaryPrice {
    let (option_price, itm, otm, atm) = match option_type {
        OptionType::Call => ((underlying - strike).max(0.0), 1.0, 0.0, 0.5),
        OptionType::Put => ((strike - underlying).max(0.0), 0.0, -1.0, -0.5),
    };
    let delta = if underlying > strike {
        itm
    } else if underlying < strike {
        otm
    } else {
        atm
    };
    BoundaryPrice {
        option_price,
        delta,
    }
}

/// Underlying at zero: calls are worthless, puts pay the discounted strike.
#[must_use]
pub fn deep_otm_price(option_type: OptionType, strike: f64, rate: f64, years: f64) -> BoundaryPrice {
    match option_type {
        OptionType::Call => BoundaryPrice {
            option_price: 0.0,
            delta: 0.0,
        },
        OptionType::Put => BoundaryPrice {
            option_price: strike * (-rate * years).exp(),
            delta: -1.0,
        },
    }
}

/// Underlying far above strike: calls are worth the discounted underlying, puts nothing.
#[must_use]
pub fn deep_itm_price(option_type: OptionType, underlying: f64, rate: f64, years: f64) -> BoundaryPrice {
    match option_type {
        OptionType::Call => BoundaryPrice {
            option_price: underlying * (-rate * years).exp(),
            delta: 1.0,
        },
        OptionType::Put => BoundaryPrice {
            option_price: 0.0,
            delta: 0.0,
        },
    }
}

/// Strikes of the at-maturity family: 10, 20, ... below 1.5 × underlying.
#[must_use]
pub fn at_maturity_strikes(underlying: f64) -> Vec<f64> {
    let upper = underlying * 1.5;
    (1_u32..)
        .map(|step| f64::from(step) * 10.0)
        .take_while(|k| *k < upper)
        .collect()
}

/// Underlying levels of the deep in-the-money family: 2.5 × to below 4 × strike, step 50.
#[must_use]
pub fn deep_itm_underlyings(strike: f64) -> Vec<f64> {
    let upper = strike * 4.0;
    (0_u32..)
        .map(|step| f64::from(step).mul_add(50.0, strike * 2.5))
        .take_while(|s| *s < upper)
        .collect()
}

/// Auxiliary features drawn for one synthetic row.
#[derive(Debug, Clone, PartialEq)]
struct SampledFeatures {
    returns: f64,
    v110: f64,
    v60: f64,
    v20: f64,
    v5: f64,
    r: f64,
    vix: f64,
    auxiliary: Vec<f64>,
    industry: usize,
}

fn draw<R: Rng + ?Sized>(rng: &mut R, stats: ColumnStats) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    z.mul_add(stats.std, stats.mean)
}

/// Generates synthetic contracts for one option type from training statistics.
#[derive(Debug, Clone)]
pub struct SyntheticGenerator<'a> {
    option_type: OptionType,
    stats: &'a FeatureStats,
}

impl<'a> SyntheticGenerator<'a> {
    #[must_use]
    pub const fn new(option_type: OptionType, stats: &'a FeatureStats) -> Self {
        Self { option_type, stats }
    }

    /// Parses the option type, rejecting anything but call or put.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOptionType` for an unknown option type.
    pub fn for_option_type(option_type: &str, stats: &'a FeatureStats) -> Result<Self, PipelineError> {
        Ok(Self::new(option_type.parse()?, stats))
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SampledFeatures {
        let s = self.stats;
        SampledFeatures {
            returns: draw(rng, s.returns),
            v110: draw(rng, s.v110),
            v60: draw(rng, s.v60),
            v20: draw(rng, s.v20),
            v5: draw(rng, s.v5),
            r: draw(rng, s.r),
            vix: draw(rng, s.vix),
            auxiliary: s.auxiliary.iter().map(|(_, c)| draw(rng, *c)).collect(),
            industry: rng.gen_range(0..INDUSTRY_COUNT),
        }
    }

    fn record(
        sampled: SampledFeatures,
        days: f64,
        underlying: f64,
        strike: f64,
        moneyness: f64,
        price: BoundaryPrice,
    ) -> SyntheticRecord {
        SyntheticRecord {
            days,
            option_price: price.option_price,
            delta: price.delta,
            strike_price: strike,
            prc: underlying,
            returns: sampled.returns,
            v110: sampled.v110,
            v60: sampled.v60,
            v20: sampled.v20,
            v5: sampled.v5,
            r: sampled.r,
            moneyness,
            scaled_option_price: price.option_price / strike,
            vix: sampled.vix,
            industry: sampled.industry,
            auxiliary: sampled.auxiliary,
        }
    }

    /// Contracts expiring today, swept over strikes.
    pub fn at_maturity<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<SyntheticRecord> {
        let underlying = AT_MATURITY_UNDERLYING;
        let mut records = Vec::new();
        for strike in at_maturity_strikes(underlying) {
            for _ in 0..AT_MATURITY_REPETITIONS {
                let price = at_maturity_price(self.option_type, underlying, strike);
                let sampled = self.sample(rng);
                records.push(Self::record(
                    sampled,
                    0.0,
                    underlying,
                    strike,
                    underlying / strike,
                    price,
                ));
            }
        }
        tracing::info!(rows = records.len(), "Generated synthetic contracts at maturity");
        records
    }

    /// Contracts on a worthless underlying (S = 0 ≪ K).
    pub fn deep_out_of_the_money<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<SyntheticRecord> {
        let strike = BOUNDARY_STRIKE;
        let mut records = Vec::new();
        for _ in 0..DEEP_OTM_REPETITIONS {
            for days in BOUNDARY_DAYS {
                let years = f64::from(days) / DAYS_PER_YEAR;
                let sampled = self.sample(rng);
                let price = deep_otm_price(self.option_type, strike, sampled.r, years);
                records.push(Self::record(sampled, years, 0.0, strike, 0.0, price));
            }
        }
        tracing::info!(
            rows = records.len(),
            "Generated synthetic contracts at boundary condition S = 0"
        );
        records
    }

    /// Contracts with the underlying far above strike (S ≫ K).
    pub fn deep_in_the_money<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<SyntheticRecord> {
        let strike = BOUNDARY_STRIKE;
        let mut records = Vec::new();
        for underlying in deep_itm_underlyings(strike) {
            for days in BOUNDARY_DAYS {
                let years = f64::from(days) / DAYS_PER_YEAR;
                let sampled = self.sample(rng);
                let price = deep_itm_price(self.option_type, underlying, sampled.r, years);
                records.push(Self::record(
                    sampled,
                    years,
                    underlying,
                    strike,
                    underlying / strike,
                    price,
                ));
            }
        }
        tracing::info!(
            rows = records.len(),
            "Generated synthetic contracts at boundary condition S >> K"
        );
        records
    }

    /// All three families, row-shuffled.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<SyntheticRecord> {
        let mut records = self.at_maturity(rng);
        records.extend(self.deep_out_of_the_money(rng));
        records.extend(self.deep_in_the_money(rng));
        records.shuffle(rng);
        records
    }
}
