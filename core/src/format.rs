//! Player-facing number, time and growth-rate formatting.
//!
//! Every quantity shown to the user goes through here. All functions are
//! pure and total: NaN, infinities, zero and negatives all render rather
//! than panic.
//!
//! Notation is picked by magnitude band, most extreme first: `10^^N` towers,
//! `e`/`ee`/`eee` prefix forms, exponential, comma-grouped integers,
//! fixed-point, then mirrored sub-unity bands down to the reciprocal form.

use crate::decimal::Decimal;

fn d(v: f64) -> Decimal {
    Decimal::from(v)
}

fn threshold(text: &str) -> Decimal {
    text.parse().unwrap_or_else(|_| Decimal::nan())
}

fn to_fixed(value: f64, precision: usize) -> String {
    format!("{value:.precision$}")
}

/// Thousands-grouping on the integer part, decimals untouched.
fn group_commas(text: &str) -> String {
    let (integer, fraction) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text, None),
    };
    let digits: Vec<char> = integer.chars().collect();
    let mut grouped = String::with_capacity(text.len() + text.len() / 3);
    for (index, ch) in digits.iter().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 && ch.is_ascii_digit() {
            grouped.push(',');
        }
        grouped.push(*ch);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

fn comma_format(value: &Decimal, precision: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.lt(&d(0.001)) {
        return to_fixed(0.0, precision);
    }
    group_commas(&to_fixed(value.to_f64(), precision))
}

fn regular_format(value: &Decimal, precision: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.lt(&d(0.001)) {
        return to_fixed(0.0, precision);
    }
    to_fixed(value.to_f64(), precision)
}

/// `<mantissa>e<exponent>` with carry fix-up: a mantissa that rounds to
/// exactly 10 becomes 1 with the exponent bumped.
fn exponential_format(value: &Decimal, precision: usize) -> String {
    let (mantissa, exponent) = value.mantissa_exponent();
    let mut mantissa = mantissa;
    let mut exponent = exponent.to_f64();
    if to_fixed(mantissa, precision).parse::<f64>().map_or(false, |m| m == 10.0) {
        mantissa = 1.0;
        exponent += 1.0;
    }
    let exponent_text = if exponent >= 1000.0 {
        comma_format(&d(exponent), 0)
    } else {
        to_fixed(exponent, 0)
    };
    format!("{}e{}", to_fixed(mantissa, precision), exponent_text)
}

pub fn format(value: &Decimal, precision: usize) -> String {
    format_opts(value, precision, false)
}

/// Banded formatter. `whole_numbers` forces the fixed-point branch for
/// values below its usual lower bound.
pub fn format_opts(value: &Decimal, precision: usize, whole_numbers: bool) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.sign() < 0 {
        return format!("-{}", format(&value.neg(), precision));
    }
    if value.is_infinite() {
        return "Infinity".to_string();
    }
    if value.is_zero() {
        return "0".to_string();
    }
    if value.gte(&threshold("eeee1000")) {
        let slog = value.slog10();
        if slog.gte(&d(1e3)) {
            return format!("10^^{}", format_whole(&slog, false));
        }
        return format!("10^^{}", regular_format(&slog, 3));
    }
    if value.gte(&threshold("eee100000")) {
        return format!("eee{}", format(&value.log10().log10().log10(), 3));
    }
    if value.gte(&threshold("ee100000")) {
        return format!("ee{}", format(&value.log10().log10(), 3));
    }
    if value.gte(&threshold("1e100000")) {
        return format!("e{}", format(&value.log10(), 3));
    }
    if value.gte(&threshold("1e1000")) {
        return exponential_format(value, 0);
    }
    if value.gte(&d(1e9)) {
        return exponential_format(value, precision);
    }
    if value.gte(&d(1e3)) {
        return comma_format(value, 0);
    }
    if value.gte(&d(0.1).pow(&d(precision as f64))) || whole_numbers {
        return regular_format(value, precision);
    }
    if value.gt(&threshold("1e-100000")) {
        let reduced = if value.gte(&threshold("1e-1000")) {
            precision
        } else {
            0
        };
        return exponential_format(value, reduced);
    }
    format!("1/({})", format(&value.recip(), precision))
}

pub fn format_whole(value: &Decimal, really_whole: bool) -> String {
    if value.gte(&d(1e9)) {
        return format(value, 2);
    }
    if value.lte(&d(0.95)) && !value.is_zero() && !really_whole {
        return format(value, 2);
    }
    format_opts(value, 0, true)
}

/// Duration in seconds rendered in its most legible unit, from Planck time
/// up to multiples of the age of the universe. Mid-range durations use
/// `M:SS` / `H:MM:SS` clock forms unless `use_hms` is off.
pub fn format_time(value: &Decimal, use_hms: bool) -> String {
    let s = value;
    if s.lt(&d(1e-30)) {
        return format!("{} tP", format(&s.mul(&d(5.391_247e44)), 2));
    }
    // SI ladder: each band scales into [1, 1000) of its unit.
    let si_bands: [(f64, f64, &str); 10] = [
        (1e-27, 1e30, "qs"),
        (1e-24, 1e27, "rs"),
        (1e-21, 1e24, "ys"),
        (1e-18, 1e21, "zs"),
        (1e-15, 1e18, "as"),
        (1e-12, 1e15, "fs"),
        (1e-9, 1e12, "ps"),
        (1e-6, 1e9, "ns"),
        (1e-3, 1e6, "μs"),
        (1.0, 1e3, "ms"),
    ];
    for (limit, factor, unit) in si_bands {
        if s.lt(&d(limit)) {
            return format!("{} {}", format(&s.mul(&d(factor)), 2), unit);
        }
    }
    if s.lt(&d(60.0)) {
        return format!("{} s", format(s, 2));
    }
    if s.lt(&d(3600.0)) {
        if use_hms {
            let minutes = s.div(&d(60.0)).floor();
            let seconds = s.rem(&d(60.0)).floor().to_f64() as u64;
            return format!("{}:{seconds:02}", format_whole(&minutes, false));
        }
        return format!("{} minutes", format(&s.div(&d(60.0)), 2));
    }
    if s.lt(&d(86_400.0)) {
        if use_hms {
            let hours = s.div(&d(3600.0)).floor();
            let minutes = s.div(&d(60.0)).floor().rem(&d(60.0)).to_f64() as u64;
            let seconds = s.rem(&d(60.0)).floor().to_f64() as u64;
            return format!(
                "{}:{minutes:02}:{seconds:02}",
                format_whole(&hours, false)
            );
        }
        return format!(
            "{} hours, {} minutes",
            format(&s.div(&d(3600.0)).floor(), 2),
            format(&s.div(&d(60.0)).rem(&d(60.0)), 2)
        );
    }
    if s.lt(&d(31_536_000.0)) {
        return format!(
            "{} days, {} hours, {} minutes",
            format_whole(&s.div(&d(86_400.0)).floor(), false),
            format_whole(&s.div(&d(3600.0)).floor().rem(&d(24.0)), false),
            format_whole(&s.div(&d(60.0)).rem(&d(60.0)), false)
        );
    }
    if s.lt(&d(4.351_968e17)) {
        return format!(
            "{} years, {} days",
            format_whole(&s.div(&d(31_536_000.0)).floor(), false),
            format_whole(&s.div(&d(86_400.0)).rem(&d(365.0)), false)
        );
    }
    format!("{} unis", format(&s.div(&d(4.351_968e17)), 2))
}

pub fn format_mult(value: &Decimal, precision: usize) -> String {
    if value.lt(&Decimal::one()) {
        format!("/{}", format(value, precision))
    } else {
        format!("×{}", format(value, precision))
    }
}

pub fn format_pow(value: &Decimal, precision: usize) -> String {
    if value.lt(&Decimal::one()) {
        format!("√{}", format(value, precision))
    } else {
        format!("^{}", format(value, precision))
    }
}

pub fn format_add(value: &Decimal, precision: usize) -> String {
    // `format` already prefixes the minus sign for negatives.
    if value.is_zero() || value.sign() < 0 {
        format(value, precision)
    } else {
        format!("+{}", format(value, precision))
    }
}

// 10^0.05, the "5% of an order of magnitude per second" escalation point.
const OOM_ESCALATE: f64 = 1.122_018_454_301_963_3;

fn log_tower(value: &Decimal, depth: u32) -> Decimal {
    let mut v = value.clone();
    for _ in 0..depth {
        v = v.max(&Decimal::one()).log10();
    }
    v
}

/// Growth-rate annotation for `value` gaining `gain` each second.
///
/// Compares order-of-magnitude growth at up to four nesting depths and
/// escalates the label (`OoMs/sec` through `OoMs^4/sec`, then
/// `OoMs^OoM/sec`) once growth crosses the threshold tied to the current
/// magnitude tier; below every threshold it falls back to `(+gain/sec)`.
pub fn format_gain(value: &Decimal, gain: &Decimal, precision: usize) -> String {
    let next = value.add(gain);
    let ten = d(10.0);

    let ooms = next.max(&ten).slog10().div(&gain.max(&ten).slog10());
    if ooms.gte(&d(3.0)) {
        return format!("(+{} OoMs^OoM/sec)", format(&ooms, 2));
    }

    let tiers: [(u32, &str, &str, &str); 3] = [
        (3, "eee1e100", "eee1e1000", "OoMs^4/sec"),
        (2, "ee1e100", "ee1e1000", "OoMs^3/sec"),
        (1, "e1e100", "e1e1000", "OoMs^2/sec"),
    ];
    for (depth, floor_10x, floor_5pct, label) in tiers {
        let ooms = log_tower(&next, depth).div(&log_tower(value, depth));
        let hit = (ooms.gte(&ten) && value.gte(&threshold(floor_10x)))
            || (ooms.gte(&d(OOM_ESCALATE)) && value.gte(&threshold(floor_5pct)));
        if hit {
            let scaled = ooms.log10().mul(&d(20.0));
            return format!("(+{} {label})", format(&scaled, 2));
        }
    }

    let ooms = next.div(value);
    if (ooms.gte(&ten) && value.gte(&threshold("1e100"))) || ooms.gte(&d(50.0)) {
        let scaled = ooms.log10().mul(&d(20.0));
        return format!("(+{} OoMs/sec)", format(&scaled, 2));
    }
    format!("(+{}/sec)", format(gain, precision))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_band() {
        assert_eq!(format(&d(1234.0), 2), "1,234");
        assert_eq!(format(&d(1_234_567.0), 2), "1,234,567");
    }

    #[test]
    fn fixed_point_band() {
        assert_eq!(format(&d(0.5), 2), "0.50");
        assert_eq!(format(&d(12.0), 2), "12.00");
        assert_eq!(format_opts(&d(0.004), 2, true), "0.00");
    }

    #[test]
    fn exponential_band_normalizes_mantissa() {
        assert_eq!(format(&d(1e10), 2), "1.00e10");
        assert_eq!(format(&d(2.5e9), 2), "2.50e9");
        assert_eq!(format(&d(1e300), 2), "1.00e300");
    }

    #[test]
    fn extreme_bands() {
        // 10^10^5 is exactly 1e100000, the first "e" band value.
        let tall = Decimal::from(5.0).iterated_exp10(2.0);
        assert_eq!(format(&tall, 2), "e100,000");

        let huge = "e200000".parse::<Decimal>().unwrap();
        assert_eq!(format(&huge, 2), "e200,000");

        let tower = Decimal::tet10(&d(5000.0));
        assert_eq!(format(&tower, 2), "10^^5,000");
    }

    #[test]
    fn totals() {
        assert_eq!(format(&Decimal::nan(), 2), "NaN");
        assert_eq!(format(&Decimal::infinity(), 2), "Infinity");
        assert_eq!(format(&Decimal::zero(), 2), "0");
        assert_eq!(format(&d(-1234.0), 2), "-1,234");
    }

    #[test]
    fn clock_forms() {
        assert_eq!(format_time(&d(90.0), true), "1:30");
        assert_eq!(format_time(&d(3_661.0), true), "1:01:01");
        assert_eq!(format_time(&d(90.0), false), "1.50 minutes");
        assert_eq!(format_time(&d(30.0), true), "30.00 s");
        assert_eq!(format_time(&d(0.5), true), "500.00 ms");
    }

    #[test]
    fn operator_prefixes() {
        assert_eq!(format_mult(&d(2.0), 2), "×2.00");
        assert_eq!(format_mult(&d(0.5), 2), "/0.50");
        assert_eq!(format_pow(&d(2.0), 2), "^2.00");
        assert_eq!(format_pow(&d(0.5), 2), "√0.50");
        assert_eq!(format_add(&d(0.0), 2), "0");
        assert_eq!(format_add(&d(2.0), 2), "+2.00");
        assert_eq!(format_add(&d(-2.0), 2), "-2.00");
    }

    #[test]
    fn gain_fallback_and_escalation() {
        assert_eq!(format_gain(&d(100.0), &d(5.0), 2), "(+5.00/sec)");

        // 1e200 gaining 1e210/sec: ratio 1e10, value past 1e100.
        let label = format_gain(&d(1e200), &d(1e210), 2);
        assert!(label.ends_with("OoMs/sec)"), "got {label}");
    }
}
