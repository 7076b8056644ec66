//! Arbitrary-precision game value.
//!
//! Wraps [`omeganum::OmegaNum`] behind the capability surface the rest of
//! the core needs: ordinary arithmetic, log/pow/root, the tetration family
//! (slog, iterated exp/log, 10^^h), mantissa/exponent introspection, a
//! canonical string form, and serde tagging as `["<string>", "Decimal"]`.
//!
//! RULE: Only this module touches the backing number type. Everything else
//! (formatting, softcaps, saves, layer formulas) goes through `Decimal`.
//!
//! The backend stores magnitude as an f64 plus operator counts, so values
//! below roughly 1e-308 collapse to zero. The formatter and codec are total
//! over everything the type can represent.

use omeganum::OmegaNum;
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// log10 of the largest integer the backend keeps exact (2^53 - 1).
/// Canonical representations keep their top float below this once any
/// exponent layers exist.
const MAX_E_F: f64 = 15.954589770191003;

/// Largest float treated as a plain count when shuffling exponent layers.
const MAX_SAFE_F: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub struct Decimal(OmegaNum);

#[derive(Error, Debug, PartialEq, Eq)]
#[error("malformed numeric literal '{0}'")]
pub struct ParseDecimalError(String);

impl Decimal {
    pub fn zero() -> Self {
        Self(OmegaNum::from(0.0))
    }

    pub fn one() -> Self {
        Self(OmegaNum::from(1.0))
    }

    pub fn nan() -> Self {
        Self(OmegaNum::from(f64::NAN))
    }

    pub fn infinity() -> Self {
        Self(OmegaNum::from(f64::INFINITY))
    }

    /// `mantissa * 10^exponent` without round-tripping through text.
    pub fn from_mantissa_exponent(mantissa: f64, exponent: f64) -> Self {
        if mantissa == 0.0 {
            return Self::zero();
        }
        if mantissa < 0.0 {
            return Self::from_mantissa_exponent(-mantissa, exponent).neg();
        }
        Self::from(exponent + mantissa.log10()).exp10()
    }

    fn parts(&self) -> (f64, Vec<f64>) {
        let (base, array) = self.0.clone().into_parts();
        (base, array.into_owned())
    }

    fn from_parts(base: f64, array: Vec<f64>) -> Self {
        Self(OmegaNum::from_parts(base, Cow::Owned(array)).normalized())
    }

    // ---- predicates ------------------------------------------------------

    pub fn is_nan(&self) -> bool {
        self.0.is_nan()
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }

    pub fn is_infinite(&self) -> bool {
        self.0.is_infinite()
    }

    pub fn is_zero(&self) -> bool {
        !self.is_nan() && *self == Self::zero()
    }

    /// -1, 0 or 1. NaN reports 0; callers check `is_nan` first.
    pub fn sign(&self) -> i32 {
        if self.is_nan() {
            return 0;
        }
        match self.partial_cmp(&Self::zero()) {
            Some(std::cmp::Ordering::Less) => -1,
            Some(std::cmp::Ordering::Greater) => 1,
            _ => 0,
        }
    }

    // NaN-safe comparison helpers (false whenever either side is NaN).

    pub fn lt(&self, rhs: &Self) -> bool {
        matches!(self.partial_cmp(rhs), Some(std::cmp::Ordering::Less))
    }

    pub fn lte(&self, rhs: &Self) -> bool {
        matches!(
            self.partial_cmp(rhs),
            Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
        )
    }

    pub fn gt(&self, rhs: &Self) -> bool {
        matches!(self.partial_cmp(rhs), Some(std::cmp::Ordering::Greater))
    }

    pub fn gte(&self, rhs: &Self) -> bool {
        matches!(
            self.partial_cmp(rhs),
            Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
        )
    }

    // ---- arithmetic ------------------------------------------------------

    pub fn add(&self, rhs: &Self) -> Self {
        Self(self.0.clone() + rhs.0.clone())
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        Self(self.0.clone() - rhs.0.clone())
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        Self(self.0.clone() * rhs.0.clone())
    }

    pub fn div(&self, rhs: &Self) -> Self {
        Self(self.0.clone() / rhs.0.clone())
    }

    pub fn rem(&self, rhs: &Self) -> Self {
        Self(self.0.clone() % rhs.0.clone())
    }

    pub fn neg(&self) -> Self {
        Self(-self.0.clone())
    }

    pub fn abs(&self) -> Self {
        let mut inner = self.0.clone();
        inner.absolutize();
        Self(inner)
    }

    pub fn recip(&self) -> Self {
        Self(self.0.clone().recip())
    }

    pub fn floor(&self) -> Self {
        Self(self.0.clone().floor())
    }

    pub fn max(&self, rhs: &Self) -> Self {
        Self(self.0.clone().max_move(rhs.0.clone()))
    }

    pub fn min(&self, rhs: &Self) -> Self {
        Self(self.0.clone().min_move(rhs.0.clone()))
    }

    // ---- exponential family ----------------------------------------------

    pub fn pow(&self, rhs: &Self) -> Self {
        Self(self.0.clone().pow(rhs.0.clone()))
    }

    pub fn root(&self, rhs: &Self) -> Self {
        Self(self.0.clone().root(rhs.0.clone()))
    }

    pub fn sqrt(&self) -> Self {
        Self(self.0.clone().sqrt())
    }

    /// 10^self.
    pub fn exp10(&self) -> Self {
        Self(self.0.clone().exp10())
    }

    pub fn log10(&self) -> Self {
        Self(self.0.clone().log10())
    }

    pub fn ln(&self) -> Self {
        Self(self.0.clone().ln())
    }

    pub fn log(&self, base: &Self) -> Self {
        Self(self.0.clone().log(base.0.clone()))
    }

    /// Applies 10^x to self `times` times (integer count).
    pub fn iterated_exp10(&self, times: f64) -> Self {
        let mut n = times.max(0.0).floor();
        if self.is_nan() || n == 0.0 {
            return self.clone();
        }
        let mut v = self.clone();
        // Lift numerically until the value leaves plain-float range; the
        // remaining applications are a bulk bump of the exponent layer.
        while n > 0.0 && v.0.is_simple() && v.0.to_f64() < MAX_E_F {
            v = v.exp10();
            n -= 1.0;
        }
        if n > 0.0 {
            let (base, mut array) = v.parts();
            if array.is_empty() {
                array.push(n);
            } else {
                array[0] += n;
            }
            v = Self::from_parts(base, array);
        }
        v
    }

    /// Applies log10 to self `times` times (integer count). Mirrors
    /// `iterated_exp10` exactly while the value stays positive; drains into
    /// NaN the same way repeated log10 of a small number would.
    pub fn iterated_log10(&self, times: f64) -> Self {
        let mut n = times.max(0.0).floor();
        let mut v = self.clone();
        while n > 0.0 && !v.is_nan() {
            let (base, array) = v.parts();
            if !array.is_empty() && array[0] >= 1.0 {
                let take = array[0].min(n);
                let mut next = array;
                next[0] -= take;
                v = Self::from_parts(base, next);
                n -= take;
            } else {
                v = v.log10();
                n -= 1.0;
            }
        }
        v
    }

    /// Base-10 super-logarithm: the height h with 10^^h == self.
    ///
    /// Uses a logarithmic critical section (slog(x) = log10(x) on [1, 10)),
    /// which makes it the exact inverse of [`Decimal::tet10`].
    pub fn slog10(&self) -> Self {
        if self.is_nan() {
            return Self::nan();
        }
        if self.is_infinite() {
            return self.clone();
        }
        if self.sign() <= 0 {
            return Self::from(slog10_f64(self.0.to_f64()));
        }
        let (base, array) = self.parts();
        match array.len() {
            0 => Self::from(slog10_f64(base)),
            1 => Self::from(array[0] + slog10_f64(base)),
            _ => {
                // Past a full tetration layer the super-log is the same
                // tower with one ^^ stripped off.
                if array[1] >= 1.0 {
                    let mut next = array;
                    next[1] -= 1.0;
                    Self::from_parts(base, next)
                } else {
                    self.clone()
                }
            }
        }
    }

    /// 10^^height, the inverse of [`Decimal::slog10`].
    pub fn tet10(height: &Self) -> Self {
        if height.is_nan() {
            return Self::nan();
        }
        if height.gt(&Self::from(MAX_SAFE_F)) {
            // The height itself is a tower; the result is that tower with
            // one more ^^ on it.
            let (base, mut array) = height.parts();
            while array.len() < 2 {
                array.push(0.0);
            }
            array[1] += 1.0;
            return Self::from_parts(base, array);
        }
        let h = height.0.to_f64();
        if h <= -1.0 {
            return Self::zero();
        }
        if h < 0.0 {
            return Self::from(h + 1.0);
        }
        let layers = h.floor();
        let seed = 10f64.powf(h - layers);
        Self::from(seed).iterated_exp10(layers)
    }

    /// Super-logarithm to an arbitrary base: counts log_base applications.
    pub fn slog(&self, base: &Self) -> Self {
        if base == &Self::from(10.0) {
            return self.slog10();
        }
        if self.is_nan() || base.is_nan() {
            return Self::nan();
        }
        if self.sign() <= 0 {
            return Self::from(-1.0);
        }
        let one = Self::one();
        if self.lt(&one) {
            return self.sub(&one);
        }
        let mut v = self.clone();
        let mut count = 0.0;
        for _ in 0..256 {
            if v.lt(base) {
                return Self::from(count).add(&v.log(base));
            }
            v = v.log(base);
            count += 1.0;
        }
        // Tower so tall the base stops mattering.
        self.slog10()
    }

    // ---- introspection ---------------------------------------------------

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64()
    }

    /// floor(log10) as a full-precision value.
    pub fn exponent(&self) -> Self {
        self.log10().floor()
    }

    /// Splits a positive finite value into `(mantissa, exponent)` with
    /// mantissa in [1, 10). Only meaningful while the exponent fits an f64,
    /// which holds everywhere exponential notation is rendered.
    pub fn mantissa_exponent(&self) -> (f64, Self) {
        let exponent = self.exponent();
        // Divide in log space: 10^-n underflows to zero in the backend once
        // n leaves the simple-float range, which would blow the quotient up
        // to infinity for tiny values.
        let mantissa = 10f64.powf(self.log10().to_f64() - exponent.to_f64());
        (mantissa, exponent)
    }
}

fn slog10_f64(x: f64) -> f64 {
    if x.is_nan() {
        return x;
    }
    if x <= 0.0 {
        return -1.0;
    }
    if x < 1.0 {
        return x - 1.0;
    }
    let mut v = x;
    let mut count = 0.0;
    while v >= 10.0 {
        v = v.log10();
        count += 1.0;
    }
    count + v.log10()
}

impl Default for Decimal {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<f64> for Decimal {
    fn from(value: f64) -> Self {
        Self(OmegaNum::from(value))
    }
}

impl From<i32> for Decimal {
    fn from(value: i32) -> Self {
        Self::from(f64::from(value))
    }
}

impl From<u32> for Decimal {
    fn from(value: u32) -> Self {
        Self::from(f64::from(value))
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self::from(value as f64)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::from(value as f64)
    }
}

// ---- canonical text form -------------------------------------------------

fn write_f64(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    let abs = value.abs();
    if abs >= 1e21 || (abs > 0.0 && abs < 1e-6) {
        write!(f, "{value:e}")
    } else {
        write!(f, "{value}")
    }
}

impl fmt::Display for Decimal {
    /// Canonical form. Plain floats print as shortest-round-trip literals;
    /// layered values print as `(10^)^N base` segments (highest operator
    /// first), so parsing reconstructs the value bit-exactly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nan() {
            return write!(f, "NaN");
        }
        if self.is_infinite() {
            return if self.sign() < 0 {
                write!(f, "-Infinity")
            } else {
                write!(f, "Infinity")
            };
        }
        if self.sign() < 0 {
            write!(f, "-")?;
            return fmt::Display::fmt(&self.abs(), f);
        }
        let (base, array) = self.parts();
        for (index, count) in array.iter().enumerate().rev() {
            if *count == 0.0 {
                continue;
            }
            write!(f, "(10")?;
            for _ in 0..=index {
                write!(f, "^")?;
            }
            write!(f, ")^")?;
            write_f64(f, *count)?;
            write!(f, " ")?;
        }
        write_f64(f, base)
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    /// Accepts the canonical form plus the human spellings used by game
    /// content: `NaN`, `Infinity`, plain/scientific literals (`1.5e308`,
    /// `3.14e1e15`), leading-`e` chains (`e100`, `ee100000`), and arrow
    /// towers (`10^^25`).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let text = raw.trim();
        let fail = || ParseDecimalError(raw.to_string());
        match text {
            "" => return Err(fail()),
            "NaN" | "nan" => return Ok(Self::nan()),
            "Infinity" | "inf" => return Ok(Self::infinity()),
            "-Infinity" | "-inf" => return Ok(Self::infinity().neg()),
            _ => {}
        }
        if let Some(rest) = text.strip_prefix('-') {
            return Self::from_str(rest).map(|v| v.neg());
        }

        // Canonical layered segments: "(10^)^N " etc.
        if text.starts_with("(10") {
            let mut array: Vec<f64> = Vec::new();
            let mut rest = text;
            while let Some(inner) = rest.strip_prefix("(10") {
                let arrows = inner.chars().take_while(|c| *c == '^').count();
                let inner = inner[arrows..].strip_prefix(")^").ok_or_else(fail)?;
                let (count_text, tail) =
                    inner.split_once(' ').ok_or_else(fail)?;
                let count: f64 = count_text.parse().map_err(|_| fail())?;
                if arrows == 0 || !count.is_finite() {
                    return Err(fail());
                }
                if array.len() < arrows {
                    array.resize(arrows, 0.0);
                }
                array[arrows - 1] += count;
                rest = tail.trim_start();
            }
            let base: f64 = rest.parse().map_err(|_| fail())?;
            return Ok(Self::from_parts(base, array));
        }

        // Arrow towers: "10^^N", "10^^^N", ...
        if let Some(inner) = text.strip_prefix("10^") {
            let extra = inner.chars().take_while(|c| *c == '^').count();
            let height_text = &inner[extra..];
            let height: f64 = height_text.parse().map_err(|_| fail())?;
            let arrows = extra + 1;
            if arrows == 2 {
                return Ok(Self::tet10(&Self::from(height)));
            }
            return Ok(Self(OmegaNum::from_arrows(height, arrows)));
        }

        // Leading-e chain: each "e" is one application of 10^x.
        let lifts = text.chars().take_while(|c| *c == 'e').count();
        let body = &text[lifts..];
        if body.is_empty() {
            return Err(fail());
        }

        let value = parse_scientific(body).ok_or_else(fail)?;
        Ok(value.iterated_exp10(lifts as f64))
    }
}

/// Parses `<float>` or `<mantissa>e<exponent>` where the exponent may exceed
/// f64 range (e.g. "1e100000" or "3.14e1e15").
fn parse_scientific(body: &str) -> Option<Decimal> {
    if let Ok(plain) = body.parse::<f64>() {
        if plain.is_finite() {
            return Some(Decimal::from(plain));
        }
    }
    let split = body[1..].find(['e', 'E']).map(|i| i + 1)?;
    let mantissa: f64 = body[..split].parse().ok()?;
    let exponent = parse_scientific(&body[split + 1..])?;
    if !exponent.0.is_simple() {
        // Exponent itself beyond f64: mantissa is noise at that scale.
        return Some(exponent.exp10());
    }
    Some(Decimal::from_mantissa_exponent(mantissa, exponent.to_f64()))
}

// ---- serde tagging -------------------------------------------------------

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.to_string())?;
        tuple.serialize_element("Decimal")?;
        tuple.end()
    }
}

struct DecimalVisitor;

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a 2-element [string, \"Decimal\"] array")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Decimal, A::Error> {
        let text: String = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let tag: String = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        if tag != "Decimal" {
            return Err(de::Error::custom(format!(
                "expected tag \"Decimal\", found \"{tag}\""
            )));
        }
        text.parse()
            .map_err(|e: ParseDecimalError| de::Error::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_tuple(2, DecimalVisitor)
    }
}
