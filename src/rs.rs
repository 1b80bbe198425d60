//! Systematic `(k, m)` Reed-Solomon codec over GF(2^8) (§4.2).
//!
//! The code is defined by the parity-check matrix `H[j][i] = alpha^(j*i)`,
//! `j in 0..m`, `i in 0..k+m` — the standard construction whose null space is
//! exactly the RS code with roots `alpha^0 .. alpha^(m-1)`, i.e. the code
//! generated by `g(x) = prod_{i=0}^{m-1} (x - alpha^i)`. Encode and erasure
//! decode both reduce to solving linear systems over this matrix, which lets
//! them share one Gauss-Jordan core (`crate::matrix`) instead of needing a
//! separate LFSR implementation for encode.

use crate::error::DecodeError;
use crate::gf;
use crate::matrix::GfMatrix;

/// Builds `g(x) = prod_{i=0}^{m-1} (x - alpha^i)`, coefficients low-degree
/// first in `m+1` bytes, per §4.2. Exposed for callers that want the literal
/// generator polynomial (e.g. to verify the codec's roots); `RsCodec` itself
/// does not evaluate this on the hot path — see the module doc comment.
pub fn generator_polynomial(m: usize) -> Vec<u8> {
    let mut g = vec![1u8];
    for i in 0..m {
        let root = gf::exp_alpha(i as u32);
        let mut next = vec![0u8; g.len() + 1];
        for (deg, &coeff) in g.iter().enumerate() {
            next[deg + 1] ^= coeff;
            next[deg] ^= gf::mul(coeff, root);
        }
        g = next;
    }
    g
}

/// A systematic `(k, m)` RS codec instance. Stateless with respect to any
/// particular block; one instance serves both the send and receive paths.
pub struct RsCodec {
    k: usize,
    m: usize,
    /// `parity_coeffs[j][i]`: contribution of source shard `i` to parity
    /// shard `j`. Precomputed once at construction.
    parity_coeffs: Vec<Vec<u8>>,
    /// Full `m x (k+m)` check matrix, kept around for erasure decoding.
    check: Vec<Vec<u8>>,
}

impl RsCodec {
    /// `k + m` must not exceed 255 (one GF(2^8) symbol per position);
    /// callers are expected to have already validated this against
    /// configuration (§6) — this constructor asserts it as a precondition.
    pub fn new(k: usize, m: usize) -> Self {
        assert!(k >= 1 && m >= 1, "k and m must be at least 1");
        let n = k + m;
        assert!(n <= 255, "k+m must not exceed 255");

        let mut check = vec![vec![0u8; n]; m];
        for (j, row) in check.iter_mut().enumerate() {
            for (i, cell) in row.iter_mut().enumerate() {
                *cell = gf::exp_alpha((j * i) as u32);
            }
        }

        let mut parity_block = GfMatrix::zeros(m);
        for j in 0..m {
            for l in 0..m {
                parity_block.set(j, l, check[j][k + l]);
            }
        }
        let parity_inv = parity_block
            .invert()
            .expect("parity submatrix of a Vandermonde check matrix is always invertible");

        let source_block: Vec<Vec<u8>> = check.iter().map(|row| row[..k].to_vec()).collect();
        let parity_coeffs = parity_inv.mul_matrix(&source_block);

        Self { k, m, parity_coeffs, check }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn m(&self) -> usize {
        self.m
    }

    /// Systematic encode: `data` holds `k` shards of equal length `L`;
    /// returns `m` parity shards of the same length.
    pub fn encode(&self, data: &[Vec<u8>]) -> Vec<Vec<u8>> {
        assert_eq!(data.len(), self.k);
        let l = data[0].len();
        let mut parity = vec![vec![0u8; l]; self.m];
        for (j, prow) in parity.iter_mut().enumerate() {
            let coeffs = &self.parity_coeffs[j];
            for (i, src) in data.iter().enumerate() {
                let c = coeffs[i];
                if c == 0 {
                    continue;
                }
                for col in 0..l {
                    prow[col] = gf::mul_add(c, src[col], prow[col]);
                }
            }
        }
        parity
    }

    /// Erasure-only decode. `shards` holds all `k+m` shards (equal length
    /// `L`); positions named in `erasures` are overwritten with their
    /// reconstructed values on success. Values at erased positions on input
    /// are ignored — callers SHOULD zero them, but this implementation does
    /// so itself before computing syndromes (§4.2).
    ///
    /// Fails with `TooManyErasures` if `erasures.len() > m`; the codeword is
    /// left unmodified in that case.
    pub fn decode(&self, shards: &mut [Vec<u8>], erasures: &[usize]) -> Result<(), DecodeError> {
        let e = erasures.len();
        if e > self.m {
            return Err(DecodeError::TooManyErasures { erasures: e, capacity: self.m });
        }
        if e == 0 {
            return Ok(());
        }

        let mut sys = GfMatrix::zeros(e);
        for row in 0..e {
            for (t, &pos) in erasures.iter().enumerate() {
                sys.set(row, t, self.check[row][pos]);
            }
        }
        let sys_inv = sys.invert().ok_or(DecodeError::SingularMatrix)?;

        for &pos in erasures {
            for b in shards[pos].iter_mut() {
                *b = 0;
            }
        }

        let l = shards[0].len();
        let n = self.k + self.m;
        let mut missing = vec![vec![0u8; l]; e];
        for col in 0..l {
            let mut syndrome = vec![0u8; e];
            for (row, syn) in syndrome.iter_mut().enumerate() {
                let mut acc = 0u8;
                for i in 0..n {
                    let v = shards[i][col];
                    if v == 0 {
                        continue;
                    }
                    acc = gf::mul_add(self.check[row][i], v, acc);
                }
                *syn = acc;
            }
            for (t, row) in missing.iter_mut().enumerate() {
                let mut acc = 0u8;
                for (row_idx, &s) in syndrome.iter().enumerate() {
                    acc = gf::mul_add(sys_inv.get(t, row_idx), s, acc);
                }
                row[col] = acc;
            }
        }

        for (t, &pos) in erasures.iter().enumerate() {
            shards[pos].copy_from_slice(&missing[t]);
        }
        Ok(())
    }
}
