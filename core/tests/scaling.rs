//! Transform laws for the softcap and scale libraries.
//!
//! Softcaps: continuous at the threshold, monotone above it.
//! Scales: the inverted form exactly undoes the forward form.

use prestige_core::{scale, softcap, Decimal, ScaleMode, SoftcapMode};

const SOFTCAP_MODES: [SoftcapMode; 7] = [
    SoftcapMode::Exponential,
    SoftcapMode::Multiplicative,
    SoftcapMode::BaseExponent,
    SoftcapMode::Logarithmic,
    SoftcapMode::LogarithmicExponential,
    SoftcapMode::RepeatedLogarithm,
    SoftcapMode::SuperLogarithmic,
];

const SCALE_MODES: [ScaleMode; 6] = [
    ScaleMode::Exponential,
    ScaleMode::BaseExponent,
    ScaleMode::Dilation,
    ScaleMode::DilationTier2,
    ScaleMode::RepeatedExponentiation,
    ScaleMode::Tetration,
];

fn d(v: f64) -> Decimal {
    Decimal::from(v)
}

fn assert_close(a: &Decimal, b: &Decimal, context: &str) {
    if a == b {
        return;
    }
    // Compare in slog space so tower-sized values get a meaningful metric.
    let gap = a.slog10().sub(&b.slog10()).abs().to_f64();
    assert!(gap < 1e-6, "{context}: {a} vs {b} (slog gap {gap})");
}

#[test]
fn softcap_is_identity_below_threshold() {
    let start = d(1e3);
    let below = d(999.0);
    for mode in SOFTCAP_MODES {
        let out = softcap(&below, &start, &d(2.0), mode, false);
        assert_eq!(out, below, "{mode:?} changed a below-threshold value");
    }
}

#[test]
fn softcap_is_continuous_at_threshold() {
    let start = d(1e3);
    for mode in SOFTCAP_MODES {
        let at = softcap(&start, &start, &d(2.0), mode, false);
        assert_close(&at, &start, &format!("{mode:?} at threshold"));
    }
}

#[test]
fn softcap_is_monotone_above_threshold() {
    let start = d(1e3);
    let ladder: [Decimal; 5] = [
        d(1e3),
        d(1e4),
        d(1e9),
        d(1e30),
        "e2000".parse().unwrap(),
    ];
    for mode in SOFTCAP_MODES {
        let mut previous: Option<Decimal> = None;
        for value in &ladder {
            let out = softcap(value, &start, &d(2.0), mode, false);
            assert!(
                !out.is_nan(),
                "{mode:?} produced NaN for input {value}"
            );
            if let Some(prev) = previous {
                assert!(
                    out.gte(&prev),
                    "{mode:?} decreased: {prev} then {out} at input {value}"
                );
            }
            previous = Some(out);
        }
    }
}

#[test]
fn softcap_dampens_rather_than_amplifies() {
    // Every mode with power meaning "divide the growth" must stay at or
    // below the raw value well past the threshold.
    let start = d(1e3);
    let raw = d(1e12);
    for (mode, power) in [
        (SoftcapMode::Exponential, 0.5),
        (SoftcapMode::Multiplicative, 4.0),
        (SoftcapMode::Logarithmic, 10.0),
        (SoftcapMode::RepeatedLogarithm, 2.0),
        (SoftcapMode::SuperLogarithmic, 10.0),
    ] {
        let out = softcap(&raw, &start, &d(power), mode, false);
        assert!(
            out.lte(&raw),
            "{mode:?} with power {power} amplified {raw} to {out}"
        );
        assert!(out.gte(&start), "{mode:?} fell below the threshold");
    }
}

#[test]
fn scale_is_identity_below_threshold() {
    let below = d(500.0);
    for mode in SCALE_MODES {
        for inverted in [false, true] {
            let out = scale(&below, &d(1e3), &d(2.0), mode, inverted);
            assert_eq!(out, below, "{mode:?} changed a below-threshold value");
        }
    }
}

#[test]
fn scale_inverse_undoes_forward() {
    let start = d(1e3);
    let power = d(2.0);
    let inputs: [Decimal; 4] = [
        d(1e3),
        d(1e6),
        d(1e12),
        "e500".parse().unwrap(),
    ];
    for mode in SCALE_MODES {
        for value in &inputs {
            let forward = scale(value, &start, &power, mode, false);
            let back = scale(&forward, &start, &power, mode, true);
            assert_close(
                &back,
                value,
                &format!("{mode:?} round trip from {value}"),
            );
        }
    }
}

#[test]
fn scale_round_trip_holds_at_tower_magnitudes() {
    let start = d(1e3);
    let power = d(2.0);
    let tower = Decimal::tet10(&d(50.0));
    for mode in [
        ScaleMode::Exponential,
        ScaleMode::RepeatedExponentiation,
        ScaleMode::Tetration,
    ] {
        let forward = scale(&tower, &start, &power, mode, false);
        let back = scale(&forward, &start, &power, mode, true);
        assert_close(&back, &tower, &format!("{mode:?} at tower magnitude"));
    }
}

#[test]
fn exponential_scale_matches_hand_computation() {
    // 1e6 past 1e3 with power 2: (1e6/1e3)^2 * 1e3 = 1e9.
    let out = scale(&d(1e6), &d(1e3), &d(2.0), ScaleMode::Exponential, false);
    assert_close(&out, &d(1e9), "forward");
    let back = scale(&d(1e9), &d(1e3), &d(2.0), ScaleMode::Exponential, true);
    assert_close(&back, &d(1e6), "inverse");
}

#[test]
fn dilation_scale_matches_hand_computation() {
    // log10 pivot is 3: 1e6 -> 10^((6/3)^2 * 3) = 1e12.
    let out = scale(&d(1e6), &d(1e3), &d(2.0), ScaleMode::Dilation, false);
    assert_close(&out, &d(1e12), "forward");
}
