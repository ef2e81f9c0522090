use std::{collections::HashSet, path::Path};

use anyhow::Context;

use crate::{alignment, config::Config, gene, report};

/// Strategy
///
/// Read through the SAM file, counting the junctions from uniquely mapped
/// spliced reads.  Read in the gene location table, then for each gene
/// collect the junctions lying within the gene and write these out as a
/// block of rows.
pub fn run(cfg: &Config) -> anyhow::Result<()> {
    debug!("Starting processing");
    find_gene_junctions(
        cfg.sam_file(),
        cfg.gene_file(),
        cfg.output_file(),
        cfg.unique_tag(),
        cfg.require_same_chrom(),
        cfg.threads(),
    )
}

fn find_gene_junctions(
    sam_file: &Path,
    gene_file: &Path,
    output_file: &Path,
    unique_tag: &str,
    same_ctg: bool,
    nt: usize,
) -> anyhow::Result<()> {
    let mut ctg_hash = HashSet::new();

    let counts = alignment::count_junctions(sam_file, unique_tag, &mut ctg_hash)
        .with_context(|| "Error reading alignments")?;

    let genes = gene::read_gene_table(gene_file, &mut ctg_hash)
        .with_context(|| "Error reading gene locations")?;

    if counts.is_empty() {
        warn!("No junctions found in {}", sam_file.display())
    }
    if genes.is_empty() {
        warn!("No gene locations found in {}", gene_file.display())
    }

    let groups = report::build_report(&genes, &counts, same_ctg, nt)?;
    report::write_report(output_file, &groups)?;
    debug!("Finished processing");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(p: &Path, lines: &[&str]) {
        let mut f = std::fs::File::create(p).unwrap();
        for l in lines {
            writeln!(f, "{}", l).unwrap();
        }
    }

    fn sam_lines() -> Vec<&'static str> {
        vec![
            "@HD\tVN:1.6",
            "r1\t0\tTGME49_chrVIII\t6631349\t255\t63M50N40M56N37M\t*\t0\t0\tA\tI\tNH:i:1",
            "r2\t0",
            "r3\t0\tTGME49_chrVIII\t6631360\t255\t52M50N20M\t*\t0\t0\tA\tI\tNH:i:1",
            "r4\t0\tTGME49_chrVIII\t6631349\t255\t63M50N40M\t*\t0\t0\tA\tI\tNH:i:3",
        ]
    }

    #[test]
    fn end_to_end_report() {
        let dir = tempdir().unwrap();
        let sam = dir.path().join("reads.sam");
        let genes = dir.path().join("genes.txt");
        let out = dir.path().join("Intron Junctions.txt");
        write_file(&sam, &sam_lines());
        write_file(
            &genes,
            &[
                "Gene ID\tProduct\tLocation",
                "TGME49_1",
                "TGME49_2\tkinase\tTGME49_chrVIII:6,631,349..6,636,865(+)",
                "TGME49_3\tother\tTGME49_chrVIII:1..1,000(-)",
            ],
        );

        find_gene_junctions(&sam, &genes, &out, "NH:i:1", true, 2).unwrap();
        let content = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Gene ID\tJuncStart\tJuncEnd\tSupportReads",
                "TGME49_2\t6631412\t6631462\t2",
                "TGME49_2\t6631502\t6631558\t1",
                "",
            ]
        );
    }

    #[test]
    fn missing_input_aborts() {
        let dir = tempdir().unwrap();
        let sam = dir.path().join("reads.sam");
        let genes = dir.path().join("genes.txt");
        let out = dir.path().join("out.txt");
        write_file(&sam, &sam_lines());

        let e = find_gene_junctions(&sam, &genes, &out, "NH:i:1", true, 1).unwrap_err();
        assert!(format!("{:#}", e).contains("genes.txt"));
        assert!(!out.exists());

        let e = find_gene_junctions(&genes, &sam, &out, "NH:i:1", true, 1).unwrap_err();
        assert!(format!("{:#}", e).contains("genes.txt"));
    }
}
