use std::{collections::HashSet, path::Path};

use anyhow::Context;
use compress_io::compress::CompressIo;
use utils::get_next_line;

use crate::{
    config::{intern_contig, Contig},
    junction::{extract_junctions, JunctionCounts},
    shape::Shape,
};

const SAM_HEADER_MARKER: char = '@';
// Chromosome, position and CIGAR are at columns 2, 3 and 5; the NH tag is the last column
const SAM_MIN_FIELDS: usize = 6;

/// True if the read aligned to exactly one location and contains at least one skipped region
pub fn is_singly_spliced_read(cigar: &str, align_num: &str, unique_tag: &str) -> bool {
    align_num == unique_tag && cigar.contains('N')
}

/// Fields of interest from one SAM data line
#[derive(Debug, PartialEq, Eq)]
pub struct AlignmentRecord<'a> {
    rname: &'a str,
    pos: &'a str,
    cigar: &'a str,
    align_num: &'a str,
}

impl<'a> AlignmentRecord<'a> {
    pub fn from_fields(fields: &[&'a str]) -> anyhow::Result<Self> {
        if fields.len() < SAM_MIN_FIELDS {
            Err(anyhow!(
                "Expected at least {} fields, found {}",
                SAM_MIN_FIELDS,
                fields.len()
            ))
        } else {
            Ok(Self {
                rname: fields[2],
                pos: fields[3],
                cigar: fields[5],
                align_num: fields[fields.len() - 1],
            })
        }
    }

    pub fn is_singly_spliced(&self, unique_tag: &str) -> bool {
        is_singly_spliced_read(self.cigar, self.align_num, unique_tag)
    }

    /// Parse position and CIGAR of a record that has passed the filter
    pub fn to_filtered(&self, ctg_hash: &mut HashSet<Contig>) -> anyhow::Result<FilteredAlignment> {
        let pos = self
            .pos
            .parse::<usize>()
            .with_context(|| format!("Error reading position {}", self.pos))?;
        let shape = self.cigar.parse::<Shape>()?;
        shape
            .ref_span()
            .and_then(|span| pos.checked_add(span))
            .ok_or_else(|| {
                anyhow!(
                    "Alignment at {} with CIGAR {} runs past the end of the coordinate range",
                    pos,
                    self.cigar
                )
            })?;
        Ok(FilteredAlignment {
            ctg: intern_contig(ctg_hash, self.rname),
            pos,
            shape,
        })
    }
}

/// A uniquely mapped alignment with at least one skipped region
#[derive(Debug)]
pub struct FilteredAlignment {
    ctg: Contig,
    pos: usize,
    shape: Shape,
}

impl FilteredAlignment {
    pub fn ctg(&self) -> &Contig {
        &self.ctg
    }
    pub fn pos(&self) -> usize {
        self.pos
    }
    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

#[derive(Debug, Default)]
struct ReadStats {
    lines: usize,
    headers: usize,
    skipped: usize,
    kept: usize,
    junctions: usize,
}

/// Read SAM file and count support for each junction found in uniquely mapped spliced reads.
/// Lines lacking the required fields, or with unreadable position or CIGAR, are skipped with a warning
pub fn count_junctions<P: AsRef<Path>>(
    fname: P,
    unique_tag: &str,
    ctg_hash: &mut HashSet<Contig>,
) -> anyhow::Result<JunctionCounts> {
    let fname = fname.as_ref();
    debug!("Reading in alignments from {}", fname.display());

    trace!("Opening SAM file for reading");
    let mut rdr = CompressIo::new()
        .path(fname)
        .bufreader()
        .with_context(|| format!("{} not found. Please check and try again", fname.display()))?;

    trace!("Reading from file");
    let mut buf = String::new();
    let mut stats = ReadStats::default();
    let mut counts = JunctionCounts::new();

    while let Some(fields) = get_next_line(&mut rdr, &mut buf).with_context(|| {
        format!(
            "Error after reading {} lines from {}",
            stats.lines,
            fname.display()
        )
    })? {
        stats.lines += 1;
        // Skip header lines
        if fields
            .first()
            .map(|s| s.starts_with(SAM_HEADER_MARKER))
            .unwrap_or(false)
        {
            stats.headers += 1;
            continue;
        }
        let rec = match AlignmentRecord::from_fields(&fields) {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    "{}:{} '{}' in SAM file is lacking essential information ({}). Line skipped",
                    fname.display(),
                    stats.lines,
                    fields.join("\t"),
                    e
                );
                stats.skipped += 1;
                continue;
            }
        };
        if !rec.is_singly_spliced(unique_tag) {
            continue;
        }
        match rec.to_filtered(ctg_hash) {
            Ok(aln) => {
                stats.kept += 1;
                stats.junctions += aln.shape().n_skips();
                counts.extend(extract_junctions(aln.ctg(), aln.pos(), aln.shape()))
            }
            Err(e) => {
                warn!(
                    "{}:{} '{}' in SAM file could not be parsed ({}). Line skipped",
                    fname.display(),
                    stats.lines,
                    fields.join("\t"),
                    e
                );
                stats.skipped += 1;
            }
        }
    }

    info!(
        "Read {} lines from {} ({} header, {} skipped); {} uniquely mapped spliced reads gave {} junctions ({} distinct)",
        stats.lines,
        fname.display(),
        stats.headers,
        stats.skipped,
        stats.kept,
        stats.junctions,
        counts.len()
    );

    Ok(counts)
}
