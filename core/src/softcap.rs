//! Softcap and scaling transforms.
//!
//! Pure functions that dampen (`softcap`) or rescale (`scale`) a resource
//! value once it crosses a threshold. Layer formulas call these with a fresh
//! parameter set on every evaluation; nothing here holds state.
//!
//! RULE: every softcap mode equals `start` at the threshold and never
//! decreases above it. Every scale mode's inverted form exactly undoes its
//! forward form for inputs at or above the threshold.

use crate::decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftcapMode {
    Exponential,
    Multiplicative,
    BaseExponent,
    Logarithmic,
    LogarithmicExponential,
    RepeatedLogarithm,
    SuperLogarithmic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    Exponential,
    BaseExponent,
    Dilation,
    DilationTier2,
    RepeatedExponentiation,
    Tetration,
}

/// Dampens `base` past `start` with steepness `power`.
///
/// With `disabled` set the below-threshold early return is skipped and the
/// active-branch formula applies everywhere.
pub fn softcap(
    base: &Decimal,
    start: &Decimal,
    power: &Decimal,
    mode: SoftcapMode,
    disabled: bool,
) -> Decimal {
    if !disabled && base.lt(start) {
        return base.clone();
    }
    let ratio = base.div(start);
    match mode {
        SoftcapMode::Exponential => ratio.max(&Decimal::one()).pow(power).mul(start),
        SoftcapMode::Multiplicative => base.sub(start).div(power).add(start),
        SoftcapMode::BaseExponent => ratio.log10().pow(power).exp10().mul(start),
        SoftcapMode::Logarithmic => ratio.log(power).add(&Decimal::one()).mul(start),
        SoftcapMode::LogarithmicExponential => {
            // The inner log10 dives to -inf as ratio approaches 1; clamping
            // it at zero keeps the result pinned to `start` until the outer
            // curve takes over at ratio == power.
            let inner = ratio.log(power);
            let lifted = if inner.gt(&Decimal::one()) {
                inner.log10()
            } else {
                Decimal::zero()
            };
            lifted.pow(power).exp10().mul(start)
        }
        SoftcapMode::RepeatedLogarithm => {
            let depth = power.to_f64();
            let reduced = ratio.iterated_log10(depth);
            let reduced = if reduced.is_nan() || reduced.sign() < 0 {
                Decimal::zero()
            } else {
                reduced
            };
            reduced.add(&Decimal::one()).mul(start)
        }
        SoftcapMode::SuperLogarithmic => ratio.slog(power).add(&Decimal::one()).mul(start),
    }
}

/// Rescales `base` past `start` with steepness `power`. The `inverted` form
/// is the exact inverse of the forward form above the threshold.
pub fn scale(
    base: &Decimal,
    start: &Decimal,
    power: &Decimal,
    mode: ScaleMode,
    inverted: bool,
) -> Decimal {
    if base.lt(start) {
        return base.clone();
    }
    let ratio = base.div(start);
    match mode {
        ScaleMode::Exponential => {
            if inverted {
                ratio.root(power).mul(start)
            } else {
                ratio.pow(power).mul(start)
            }
        }
        ScaleMode::BaseExponent => {
            if inverted {
                ratio.max(&Decimal::one())
                    .log(power)
                    .add(&Decimal::one())
                    .mul(start)
            } else {
                power.pow(&ratio.sub(&Decimal::one())).mul(start)
            }
        }
        ScaleMode::Dilation => {
            // Operates on log10(x) relative to log10(start); start must be
            // above 1 for the pivot to be positive.
            let pivot = start.log10();
            let bent = base.log10().div(&pivot);
            let bent = if inverted {
                bent.root(power)
            } else {
                bent.pow(power)
            };
            bent.mul(&pivot).exp10()
        }
        ScaleMode::DilationTier2 => {
            // Same shape one log level deeper: works on
            // t(x) = log10(log10(x) + 1) so the inverse unwinds exactly.
            let pivot = tier2_log(start);
            let bent = tier2_log(base).div(&pivot);
            let bent = if inverted {
                bent.root(power)
            } else {
                bent.pow(power)
            };
            tier2_exp(&bent.mul(&pivot))
        }
        ScaleMode::RepeatedExponentiation => {
            let depth = power.to_f64();
            if inverted {
                ratio.iterated_log10(depth).mul(start)
            } else {
                ratio.iterated_exp10(depth).mul(start)
            }
        }
        ScaleMode::Tetration => {
            let height = ratio.slog10();
            let height = if inverted {
                height.div(power)
            } else {
                height.mul(power)
            };
            Decimal::tet10(&height).mul(start)
        }
    }
}

fn tier2_log(value: &Decimal) -> Decimal {
    value.log10().add(&Decimal::one()).log10()
}

fn tier2_exp(value: &Decimal) -> Decimal {
    value.exp10().sub(&Decimal::one()).exp10()
}
