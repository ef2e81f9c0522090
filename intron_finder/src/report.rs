use std::{fmt, io::Write, path::Path, thread};

use anyhow::Context;
use compress_io::compress::CompressIo;
use crossbeam_channel::{unbounded, Receiver};

use crate::{gene::GeneTable, junction::JunctionCounts};

pub const REPORT_HEADER: &str = "Gene ID\tJuncStart\tJuncEnd\tSupportReads";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow<'a> {
    gene_id: &'a str,
    start: usize,
    end: usize,
    support: usize,
}

impl<'a> ReportRow<'a> {
    pub fn new(gene_id: &'a str, start: usize, end: usize, support: usize) -> Self {
        Self {
            gene_id,
            start,
            end,
            support,
        }
    }
}

impl<'a> fmt::Display for ReportRow<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.gene_id, self.start, self.end, self.support
        )
    }
}

/// Rows for the junctions lying within gene ix of the table
fn gene_rows<'a>(
    genes: &'a GeneTable,
    counts: &JunctionCounts,
    ix: usize,
    same_ctg: bool,
) -> Vec<ReportRow<'a>> {
    let (loc, id) = &genes.genes()[ix];
    counts
        .iter()
        .filter(|(j, _)| loc.contains(j.ctg(), j.start(), j.end(), same_ctg))
        .map(|(j, n)| ReportRow::new(id, j.start(), j.end(), n))
        .collect()
}

/// Find junctions contained within each gene.
///
/// One entry is returned per gene having at least one junction, in gene table order.
/// With nt > 1 the genes are shared out between nt threads.
pub fn build_report<'a>(
    genes: &'a GeneTable,
    counts: &JunctionCounts,
    same_ctg: bool,
    nt: usize,
) -> anyhow::Result<Vec<Vec<ReportRow<'a>>>> {
    let nt = nt.min(genes.len()).max(1);
    debug!(
        "Matching {} junctions against {} genes using {} thread(s)",
        counts.len(),
        genes.len(),
        nt
    );
    let mut groups: Vec<(usize, Vec<ReportRow<'a>>)> = if nt == 1 {
        (0..genes.len())
            .map(|ix| (ix, gene_rows(genes, counts, ix, same_ctg)))
            .collect()
    } else {
        multi_threaded_build(genes, counts, same_ctg, nt)?
    };
    groups.sort_unstable_by_key(|(ix, _)| *ix);
    let groups: Vec<_> = groups
        .into_iter()
        .filter_map(|(_, v)| if v.is_empty() { None } else { Some(v) })
        .collect();
    debug!("{} genes have at least one junction", groups.len());
    Ok(groups)
}

fn multi_threaded_build<'a>(
    genes: &'a GeneTable,
    counts: &JunctionCounts,
    same_ctg: bool,
    nt: usize,
) -> anyhow::Result<Vec<(usize, Vec<ReportRow<'a>>)>> {
    let mut v = Vec::with_capacity(nt);
    // Everything runs within a scope so that we can pass references to the threads
    thread::scope(|sc| {
        trace!("Spawning {} report workers", nt);
        let (snd, rcv) = unbounded();
        let jobs: Vec<_> = (0..nt)
            .map(|i| {
                let r = rcv.clone();
                sc.spawn(move || worker(genes, counts, same_ctg, i + 1, r))
            })
            .collect();
        drop(rcv);

        // Send gene indices to child threads
        for ix in 0..genes.len() {
            if snd.send(ix).is_err() {
                error!("Error sending message to report workers");
                break;
            }
        }

        drop(snd);
        for jh in jobs {
            v.push(jh.join())
        }
    });

    trace!("Collecting results from report workers");
    let mut groups = Vec::with_capacity(genes.len());
    for (ix, res) in v.drain(..).enumerate() {
        match res {
            Ok(mut g) => groups.append(&mut g),
            Err(_) => return Err(anyhow!("Error joining report worker thread {}", ix + 1)),
        }
    }
    if groups.len() != genes.len() {
        Err(anyhow!(
            "Report workers processed {} of {} genes",
            groups.len(),
            genes.len()
        ))
    } else {
        Ok(groups)
    }
}

fn worker<'a>(
    genes: &'a GeneTable,
    counts: &JunctionCounts,
    same_ctg: bool,
    ix: usize,
    r: Receiver<usize>,
) -> Vec<(usize, Vec<ReportRow<'a>>)> {
    trace!("Starting up report worker {}", ix);
    let mut v = Vec::new();
    while let Ok(gene_ix) = r.recv() {
        v.push((gene_ix, gene_rows(genes, counts, gene_ix, same_ctg)))
    }
    trace!("Report worker {} processed {} genes", ix, v.len());
    v
}

/// Write report with a header line; each gene block is followed by a blank line
pub fn write_report<P: AsRef<Path>>(fname: P, groups: &[Vec<ReportRow>]) -> anyhow::Result<()> {
    let fname = fname.as_ref();
    debug!("Writing report to {}", fname.display());
    let mut wrt = CompressIo::new()
        .path(fname)
        .bufwriter()
        .with_context(|| format!("Could not open {} for output", fname.display()))?;

    let mut n_rows = 0;
    let mut write_all = || -> std::io::Result<()> {
        writeln!(wrt, "{}", REPORT_HEADER)?;
        for g in groups {
            for row in g {
                writeln!(wrt, "{}", row)?;
                n_rows += 1;
            }
            writeln!(wrt)?;
        }
        wrt.flush()
    };
    write_all().with_context(|| format!("Error writing report to {}", fname.display()))?;

    info!("Wrote {} junction rows to {}", n_rows, fname.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gene::GeneLocation,
        junction::{Junction, JunctionCounts},
    };
    use std::sync::Arc;
    use tempfile::tempdir;

    fn test_data() -> (GeneTable, JunctionCounts) {
        let mut genes = GeneTable::new();
        for (loc, id) in [
            ("chrI>100>200>(+)", "g1"),
            ("chrI>500>600>(-)", "g2"),
            ("chrII>100>200>(+)", "g3"),
            ("chrI>150>550>(+)", "g4"),
        ] {
            let key = loc.to_owned();
            genes.insert(key, loc.parse::<GeneLocation>().unwrap(), id.to_owned());
        }
        let c1: Arc<str> = Arc::from("chrI");
        let c2: Arc<str> = Arc::from("chrII");
        let counts: JunctionCounts = [
            Junction::new(c1.clone(), 100, 150),
            Junction::new(c1.clone(), 120, 200),
            Junction::new(c1.clone(), 100, 150),
            Junction::new(c2.clone(), 110, 190),
            Junction::new(c1.clone(), 199, 201),
        ]
        .into_iter()
        .collect();
        (genes, counts)
    }

    fn rows_as_text(groups: &[Vec<ReportRow>]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.iter().map(|r| r.to_string()).collect())
            .collect()
    }

    #[test]
    fn rows_require_same_contig() {
        let (genes, counts) = test_data();
        let groups = build_report(&genes, &counts, true, 1).unwrap();
        assert_eq!(
            rows_as_text(&groups),
            vec![
                vec!["g1\t100\t150\t2", "g1\t120\t200\t1"],
                vec!["g3\t110\t190\t1"],
                vec!["g4\t199\t201\t1"],
            ]
        );
    }

    #[test]
    fn rows_ignoring_contig() {
        let (genes, counts) = test_data();
        let groups = build_report(&genes, &counts, false, 1).unwrap();
        assert_eq!(
            rows_as_text(&groups),
            vec![
                vec!["g1\t100\t150\t2", "g1\t120\t200\t1", "g1\t110\t190\t1"],
                vec!["g3\t100\t150\t2", "g3\t120\t200\t1", "g3\t110\t190\t1"],
                vec!["g4\t199\t201\t1"],
            ]
        );
    }

    #[test]
    fn threaded_report_matches_single_threaded() {
        let (genes, counts) = test_data();
        for same_ctg in [true, false] {
            let g1 = build_report(&genes, &counts, same_ctg, 1).unwrap();
            let g3 = build_report(&genes, &counts, same_ctg, 3).unwrap();
            let g8 = build_report(&genes, &counts, same_ctg, 8).unwrap();
            assert_eq!(g1, g3);
            assert_eq!(g1, g8);
        }
    }

    #[test]
    fn empty_inputs_give_no_groups() {
        let genes = GeneTable::new();
        let counts = JunctionCounts::new();
        assert!(build_report(&genes, &counts, true, 4).unwrap().is_empty());
    }

    #[test]
    fn report_layout() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("Intron Junctions.txt");
        let groups = vec![
            vec![ReportRow::new("g1", 10, 20, 2), ReportRow::new("g1", 30, 40, 1)],
            vec![ReportRow::new("g2", 50, 60, 5)],
        ];
        write_report(&p, &groups).unwrap();
        let content = std::fs::read_to_string(&p).unwrap();
        assert_eq!(
            content,
            "Gene ID\tJuncStart\tJuncEnd\tSupportReads\ng1\t10\t20\t2\ng1\t30\t40\t1\n\ng2\t50\t60\t5\n\n"
        );
    }
}
