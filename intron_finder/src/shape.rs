//! Parsing of SAM CIGAR strings
//!
//! A CIGAR string is a run of (length, operation) pairs, i.e. `63M50N40M`.
//! Only the parsed form is walked when extracting junctions, so any
//! malformed string is rejected here and the record is skipped by the caller.
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    Match,
    Insertion,
    Deletion,
    Skip,
    SoftClip,
    HardClip,
    Pad,
    SeqMatch,
    SeqMismatch,
}

impl CigarOp {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'M' => Some(Self::Match),
            'I' => Some(Self::Insertion),
            'D' => Some(Self::Deletion),
            'N' => Some(Self::Skip),
            'S' => Some(Self::SoftClip),
            'H' => Some(Self::HardClip),
            'P' => Some(Self::Pad),
            '=' => Some(Self::SeqMatch),
            'X' => Some(Self::SeqMismatch),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Self::Match => 'M',
            Self::Insertion => 'I',
            Self::Deletion => 'D',
            Self::Skip => 'N',
            Self::SoftClip => 'S',
            Self::HardClip => 'H',
            Self::Pad => 'P',
            Self::SeqMatch => '=',
            Self::SeqMismatch => 'X',
        }
    }

    /// Operations that move the cursor along the reference without
    /// producing a junction.  Skip (N) also consumes reference but is
    /// handled separately.
    pub fn advances_cursor(&self) -> bool {
        matches!(
            self,
            Self::Match | Self::Deletion | Self::SeqMatch | Self::SeqMismatch
        )
    }
}

/// Parsed CIGAR string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    ops: Vec<(usize, CigarOp)>,
}

impl Shape {
    pub fn ops(&self) -> &[(usize, CigarOp)] {
        &self.ops
    }

    pub fn n_skips(&self) -> usize {
        self.ops.iter().filter(|(_, op)| *op == CigarOp::Skip).count()
    }

    /// Length of reference covered by the cursor walk, or None on overflow
    pub fn ref_span(&self) -> Option<usize> {
        self.ops
            .iter()
            .filter(|(_, op)| *op == CigarOp::Skip || op.advances_cursor())
            .try_fold(0usize, |s, (l, _)| s.checked_add(*l))
    }
}

impl FromStr for Shape {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(anyhow!("Empty CIGAR string"));
        }
        let mut ops = Vec::new();
        let mut len: Option<usize> = None;
        for c in s.chars() {
            if let Some(d) = c.to_digit(10) {
                let l = len.unwrap_or(0);
                len = Some(
                    l.checked_mul(10)
                        .and_then(|x| x.checked_add(d as usize))
                        .ok_or_else(|| anyhow!("Operation length overflow in CIGAR {}", s))?,
                );
            } else {
                let op = CigarOp::from_char(c)
                    .ok_or_else(|| anyhow!("Unknown operation '{}' in CIGAR {}", c, s))?;
                match len.take() {
                    Some(0) => return Err(anyhow!("Zero length operation in CIGAR {}", s)),
                    Some(l) => ops.push((l, op)),
                    None => return Err(anyhow!("Operation '{}' without length in CIGAR {}", c, s)),
                }
            }
        }
        if len.is_some() {
            Err(anyhow!("Trailing length without operation in CIGAR {}", s))
        } else {
            Ok(Self { ops })
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (l, op) in self.ops.iter() {
            write!(f, "{}{}", l, op.as_char())?
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_spliced_cigar() {
        let s: Shape = "63M50N40M56N37M".parse().unwrap();
        assert_eq!(
            s.ops(),
            &[
                (63, CigarOp::Match),
                (50, CigarOp::Skip),
                (40, CigarOp::Match),
                (56, CigarOp::Skip),
                (37, CigarOp::Match)
            ]
        );
        assert_eq!(s.n_skips(), 2);
        assert_eq!(s.ref_span(), Some(246));
        assert_eq!(s.to_string(), "63M50N40M56N37M");
    }

    #[test]
    fn parse_all_operations() {
        let s: Shape = "5H3S10M2I4D100N6=1X2P7M".parse().unwrap();
        assert_eq!(s.ops().len(), 10);
        assert_eq!(s.n_skips(), 1);
        assert!(s.ops()[8].1 == CigarOp::Pad);
        // I, S, H and P do not cover reference
        assert_eq!(s.ref_span(), Some(10 + 4 + 100 + 6 + 1 + 7));
    }

    #[test]
    fn ref_span_overflow() {
        let s: Shape = format!("{}M5N10M", usize::MAX).parse().unwrap();
        assert_eq!(s.ref_span(), None);
    }

    #[test]
    fn reject_malformed_cigars() {
        for bad in ["", "*", "M10", "10M5", "10Q", "0M10N5M", "10M N"] {
            assert!(bad.parse::<Shape>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn cursor_operations() {
        assert!(CigarOp::Match.advances_cursor());
        assert!(CigarOp::Deletion.advances_cursor());
        assert!(CigarOp::SeqMatch.advances_cursor());
        assert!(!CigarOp::Skip.advances_cursor());
        assert!(!CigarOp::Insertion.advances_cursor());
        assert!(!CigarOp::SoftClip.advances_cursor());
    }
}
