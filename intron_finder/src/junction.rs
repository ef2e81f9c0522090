use std::{
    collections::{hash_map::Entry, HashMap},
    fmt,
};

use crate::{
    config::Contig,
    shape::{CigarOp, Shape},
};

/// A skipped region of the reference, `end = start + gap length`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Junction {
    ctg: Contig,
    start: usize,
    end: usize,
}

impl Junction {
    pub fn new(ctg: Contig, start: usize, end: usize) -> Self {
        Self { ctg, start, end }
    }
    pub fn ctg(&self) -> &Contig {
        &self.ctg
    }
    pub fn start(&self) -> usize {
        self.start
    }
    pub fn end(&self) -> usize {
        self.end
    }
}

impl fmt::Display for Junction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}>{}", self.ctg, self.start, self.end)
    }
}

/// Iterator over the junctions of one alignment, walking the CIGAR from
/// the alignment start
pub struct Junctions<'a> {
    ctg: &'a Contig,
    cursor: usize,
    ops: std::slice::Iter<'a, (usize, CigarOp)>,
}

impl<'a> Iterator for Junctions<'a> {
    type Item = Junction;

    fn next(&mut self) -> Option<Self::Item> {
        for (l, op) in self.ops.by_ref() {
            if *op == CigarOp::Skip {
                let start = self.cursor;
                self.cursor += l;
                return Some(Junction::new(self.ctg.clone(), start, self.cursor));
            } else if op.advances_cursor() {
                self.cursor += l
            }
        }
        None
    }
}

pub fn extract_junctions<'a>(ctg: &'a Contig, pos: usize, shape: &'a Shape) -> Junctions<'a> {
    Junctions {
        ctg,
        cursor: pos,
        ops: shape.ops().iter(),
    }
}

/// Read support for each distinct junction.
///
/// Junctions are kept in the order they were first seen so that
/// the report is reproducible between runs.
#[derive(Debug, Default)]
pub struct JunctionCounts {
    index: HashMap<Junction, usize>,
    counts: Vec<(Junction, usize)>,
}

impl JunctionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, j: Junction) {
        match self.index.entry(j) {
            Entry::Occupied(e) => self.counts[*e.get()].1 += 1,
            Entry::Vacant(e) => {
                let ix = self.counts.len();
                self.counts.push((e.key().clone(), 1));
                e.insert(ix);
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, j: &Junction) -> Option<usize> {
        self.index.get(j).map(|ix| self.counts[*ix].1)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Junction, usize)> {
        self.counts.iter().map(|(j, n)| (j, *n))
    }
}

impl Extend<Junction> for JunctionCounts {
    fn extend<I: IntoIterator<Item = Junction>>(&mut self, iter: I) {
        for j in iter {
            self.add(j)
        }
    }
}

impl FromIterator<Junction> for JunctionCounts {
    fn from_iter<I: IntoIterator<Item = Junction>>(iter: I) -> Self {
        let mut jc = Self::new();
        jc.extend(iter);
        jc
    }
}
