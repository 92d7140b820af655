//! Field element type for the constraint system.

use std::cmp::Ordering;
use std::fmt;
use std::iter::{Product, Sum};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Goldilocks prime: 2^64 - 2^32 + 1
pub const GOLDILOCKS_PRIME: u64 = 0xFFFF_FFFF_0000_0001;

/// 2^64 mod p, used when folding little-endian limbs into the field
const TWO_POW_64: u64 = 0xFFFF_FFFF;

/// An element of the Goldilocks prime field, p = 2^64 - 2^32 + 1.
///
/// All constraint arithmetic is performed in this field. The ordering
/// implementation compares canonical representatives, which is what
/// sorted permutation checking relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldElement(u64);

impl FieldElement {
    /// The prime modulus
    pub const MODULUS: u64 = GOLDILOCKS_PRIME;

    /// Create a new field element from a value (reduced mod p)
    pub fn new(value: u64) -> Self {
        FieldElement(value % Self::MODULUS)
    }

    /// The zero element
    pub fn zero() -> Self {
        FieldElement(0)
    }

    /// The one element
    pub fn one() -> Self {
        FieldElement(1)
    }

    /// Canonical representative in `0..p`
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Check whether this is the zero element
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Compute self^exp using binary exponentiation
    pub fn pow(&self, mut exp: u64) -> Self {
        let mut base = *self;
        let mut result = FieldElement::one();

        while exp > 0 {
            if exp & 1 == 1 {
                result *= base;
            }
            base *= base;
            exp >>= 1;
        }

        result
    }

    /// Multiplicative inverse via Fermat's little theorem, a^(p-2).
    ///
    /// By convention `inverse(0) = 0`, which is the behaviour the
    /// normalisation operator depends on.
    pub fn inverse(&self) -> Self {
        if self.is_zero() {
            return FieldElement::zero();
        }

        self.pow(Self::MODULUS - 2)
    }

    /// Fold a 256-bit little-endian limb array into the field.
    ///
    /// Used when reading binary trace files, whose cells are stored as
    /// unreduced 256-bit integers.
    pub fn from_le_limbs(limbs: [u64; 4]) -> Self {
        let mut acc = FieldElement::zero();
        for limb in limbs.iter().rev() {
            acc = acc * FieldElement::new(TWO_POW_64) + FieldElement::new(*limb);
        }
        acc
    }

    /// Expand into a 256-bit little-endian limb array
    pub fn to_le_limbs(&self) -> [u64; 4] {
        [self.0, 0, 0, 0]
    }
}

impl Add for FieldElement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let sum = (self.0 as u128 + rhs.0 as u128) % Self::MODULUS as u128;
        FieldElement(sum as u64)
    }
}

impl Sub for FieldElement {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        let diff = (self.0 as u128 + Self::MODULUS as u128 - rhs.0 as u128)
            % Self::MODULUS as u128;
        FieldElement(diff as u64)
    }
}

impl Mul for FieldElement {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let prod = (self.0 as u128 * rhs.0 as u128) % Self::MODULUS as u128;
        FieldElement(prod as u64)
    }
}

impl Neg for FieldElement {
    type Output = Self;

    fn neg(self) -> Self {
        FieldElement::zero() - self
    }
}

impl AddAssign for FieldElement {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for FieldElement {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for FieldElement {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Sum for FieldElement {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(FieldElement::zero(), |acc, x| acc + x)
    }
}

impl Product for FieldElement {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(FieldElement::one(), |acc, x| acc * x)
    }
}

impl PartialOrd for FieldElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldElement {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        FieldElement::new(value)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FieldElement {
    type Err = String;

    /// Parse a decimal string of any length, reducing into the field
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("empty field literal".to_string());
        }

        let mut acc: u128 = 0;
        for c in s.chars() {
            let d = c
                .to_digit(10)
                .ok_or_else(|| format!("invalid field literal: {}", s))?;
            acc = (acc * 10 + d as u128) % Self::MODULUS as u128;
        }

        Ok(FieldElement(acc as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_basic_arithmetic() {
        let a = FieldElement::new(100);
        let b = FieldElement::new(42);

        assert_eq!((a + b).value(), 142);
        assert_eq!((a - b).value(), 58);
        assert_eq!((a * b).value(), 4200);
    }

    #[test]
    fn test_subtraction_wraps() {
        let a = FieldElement::new(1);
        let b = FieldElement::new(2);
        assert_eq!((a - b).value(), GOLDILOCKS_PRIME - 1);
    }

    #[test]
    fn test_inverse() {
        let a = FieldElement::new(12345);
        assert_eq!(a * a.inverse(), FieldElement::one());
    }

    #[test]
    fn test_inverse_of_zero_is_zero() {
        assert_eq!(FieldElement::zero().inverse(), FieldElement::zero());
    }

    #[test]
    fn test_pow() {
        let a = FieldElement::new(3);
        assert_eq!(a.pow(0), FieldElement::one());
        assert_eq!(a.pow(1), a);
        assert_eq!(a.pow(5).value(), 243);
    }

    #[test]
    fn test_neg() {
        let a = FieldElement::new(5);
        assert_eq!(a + (-a), FieldElement::zero());
    }

    #[test]
    fn test_parse_decimal() {
        let a: FieldElement = "123456789".parse().unwrap();
        assert_eq!(a.value(), 123456789);
    }

    #[test]
    fn test_parse_oversized_decimal_reduces() {
        // 2^64 - 2^32 + 2 = p + 1
        let a: FieldElement = "18446744069414584322".parse().unwrap();
        assert_eq!(a, FieldElement::one());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("12x3".parse::<FieldElement>().is_err());
        assert!("".parse::<FieldElement>().is_err());
    }

    #[test]
    fn test_limb_folding() {
        assert_eq!(
            FieldElement::from_le_limbs([42, 0, 0, 0]),
            FieldElement::new(42)
        );
        // 2^64 ≡ 2^32 - 1 (mod p)
        assert_eq!(
            FieldElement::from_le_limbs([0, 1, 0, 0]),
            FieldElement::new(0xFFFF_FFFF)
        );
    }

    #[test]
    fn test_display_roundtrip() {
        let a = FieldElement::new(987654321);
        let s = a.to_string();
        assert_eq!(s.parse::<FieldElement>().unwrap(), a);
    }

    proptest! {
        #[test]
        fn prop_add_commutes(a in 0u64.., b in 0u64..) {
            let (a, b) = (FieldElement::new(a), FieldElement::new(b));
            prop_assert_eq!(a + b, b + a);
        }

        #[test]
        fn prop_mul_distributes(a in 0u64.., b in 0u64.., c in 0u64..) {
            let (a, b, c) = (FieldElement::new(a), FieldElement::new(b), FieldElement::new(c));
            prop_assert_eq!(a * (b + c), a * b + a * c);
        }

        #[test]
        fn prop_sub_is_add_neg(a in 0u64.., b in 0u64..) {
            let (a, b) = (FieldElement::new(a), FieldElement::new(b));
            prop_assert_eq!(a - b, a + (-b));
        }

        #[test]
        fn prop_nonzero_inverse(a in 1u64..GOLDILOCKS_PRIME) {
            let a = FieldElement::new(a);
            prop_assert_eq!(a * a.inverse(), FieldElement::one());
        }
    }
}
