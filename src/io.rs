//! Reading and writing pencils as text streams
//!
//! Format version 1 is whitespace separated UTF-8 text. Lines whose first non-blank character is
//! `#` are comments. The stream may start with the header `%%pencil 1`; a stream without the
//! header is read as version 1. Then follow the dimension `n`, the `n * n` entries of `K` in
//! row-major order and the `n * n` entries of `M` in row-major order. Nothing may follow `M`.

use std::io::{self, BufRead, Write};

use ndarray::Array2;
use thiserror::Error;

use crate::{pencil::Pencil, EigError, Operator};

const MAGIC: &str = "%%pencil";
pub const FORMAT_VERSION: u32 = 1;

/// Malformed or unreadable matrix input
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InputError {
    #[error("failed to read matrix stream")]
    Io(#[from] io::Error),
    #[error("unsupported pencil format version {0}")]
    UnsupportedVersion(String),
    #[error("cannot parse token {position} ({token:?}) as a number")]
    Parse { position: usize, token: String },
    #[error("stream ended after {found} of {expected} values")]
    Truncated { expected: usize, found: usize },
    #[error("unexpected data after the mass matrix")]
    TrailingData,
    #[error("pencil dimension must be positive")]
    ZeroDimension,
    #[error("pencil dimension {0} is too large")]
    DimensionOverflow(usize),
    #[error("the {operator} matrix is not symmetric")]
    NotSymmetric { operator: Operator },
}

/// Read a pencil from a text stream
///
/// Fails before building any matrix if the stream is malformed or truncated. Entries have to be
/// finite; `nan` and `inf` are rejected as parse errors.
pub fn read_pencil<R: BufRead>(reader: R) -> Result<Pencil, EigError> {
    let mut tokens = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(InputError::from)?;
        if line.trim_start().starts_with('#') {
            continue;
        }
        tokens.extend(line.split_whitespace().map(str::to_owned));
    }

    let mut pos = 0;
    if tokens.first().map(String::as_str) == Some(MAGIC) {
        let version = tokens.get(1).cloned().unwrap_or_default();
        if version.parse::<u32>().ok() != Some(FORMAT_VERSION) {
            return Err(InputError::UnsupportedVersion(version).into());
        }
        pos = 2;
    }

    let n_token = tokens.get(pos).ok_or(InputError::Truncated {
        expected: 1,
        found: 0,
    })?;
    let n: usize = n_token.parse().map_err(|_| InputError::Parse {
        position: pos,
        token: n_token.clone(),
    })?;
    if n == 0 {
        return Err(InputError::ZeroDimension.into());
    }
    pos += 1;

    let expected = n
        .checked_mul(n)
        .and_then(|len| len.checked_mul(2))
        .ok_or(InputError::DimensionOverflow(n))?;
    let available = tokens.len() - pos;
    if available < expected {
        return Err(InputError::Truncated {
            expected,
            found: available,
        }
        .into());
    }
    if available > expected {
        return Err(InputError::TrailingData.into());
    }

    let values = tokens[pos..]
        .iter()
        .enumerate()
        .map(|(i, tok)| {
            tok.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| InputError::Parse {
                    position: pos + i,
                    token: tok.clone(),
                })
        })
        .collect::<Result<Vec<f64>, InputError>>()?;

    let (k, m) = values.split_at(n * n);
    Pencil::new(square_from_row_major(n, k)?, square_from_row_major(n, m)?)
}

fn square_from_row_major(n: usize, values: &[f64]) -> Result<Array2<f64>, EigError> {
    Array2::from_shape_vec((n, n), values.to_vec()).map_err(|_| EigError::DimensionMismatch {
        expected: n * n,
        actual: values.len(),
    })
}

/// Write a pencil in format version 1
///
/// Floats are written with Rust's shortest round-trip representation, so reading the output back
/// gives bit-identical matrices.
pub fn write_pencil<W: Write>(mut writer: W, pencil: &Pencil) -> io::Result<()> {
    writeln!(writer, "{} {}", MAGIC, FORMAT_VERSION)?;
    writeln!(writer, "{}", pencil.dim())?;
    for (name, mat) in [("stiffness", &pencil.stiffness), ("mass", &pencil.mass)] {
        writeln!(writer, "# {}", name)?;
        for row in mat.rows() {
            let line = row
                .iter()
                .map(|x| format!("{:?}", x))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(writer, "{}", line)?;
        }
    }
    writer.flush()
}
