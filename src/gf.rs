//! GF(2^8) log/antilog tables and arithmetic, per the field order 256 under
//! the primitive polynomial `x^8 + x^4 + x^3 + x^2 + 1` (0x11D) with
//! generator `alpha = 2`.

use std::sync::OnceLock;

const IRREDUCIBLE_POLY: u16 = 0x11D;

struct Tables {
    /// `exp[i] = alpha^i`, duplicated into `[255, 510)` so `exp[a+b]` never
    /// needs a modular reduction on the exponent sum.
    exp: [u8; 510],
    /// `log[alpha^i] = i`. `log[0]` is never read.
    log: [u8; 256],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

fn tables() -> &'static Tables {
    TABLES.get_or_init(|| {
        let mut exp = [0u8; 510];
        let mut log = [0u8; 256];
        let mut x: u16 = 1;
        for i in 0..255usize {
            exp[i] = x as u8;
            exp[i + 255] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x >= 256 {
                x ^= IRREDUCIBLE_POLY;
            }
        }
        Tables { exp, log }
    })
}

/// Forces table construction. Idempotent; callers don't need to invoke this
/// explicitly since every other function in this module does so lazily, but
/// it's handy to call once up front when constructing a filter.
pub fn init() {
    tables();
}

#[inline(always)]
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

#[inline(always)]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = tables();
    let sum = t.log[a as usize] as usize + t.log[b as usize] as usize;
    t.exp[sum]
}

/// `a * b + c`.
#[inline(always)]
pub fn mul_add(a: u8, b: u8, c: u8) -> u8 {
    mul(a, b) ^ c
}

/// Multiplicative inverse. Panics on `a == 0` (undefined in the field).
#[inline(always)]
pub fn inv(a: u8) -> u8 {
    assert!(a != 0, "inverse of 0 is undefined in GF(2^8)");
    let t = tables();
    t.exp[255 - t.log[a as usize] as usize]
}

/// `alpha^exp`, wrapping the exponent into `[0, 255)` (the group has order 255).
#[inline(always)]
pub fn exp_alpha(exp: u32) -> u8 {
    let t = tables();
    t.exp[(exp % 255) as usize]
}
