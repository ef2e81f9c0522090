use std::{
    collections::{hash_map::Entry, HashMap, HashSet},
    fmt,
    path::Path,
    str::FromStr,
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use utils::get_next_line;

use crate::config::{intern_contig, Contig};

/// Separator used in the canonical text form of locations and junctions
pub const LOCATION_DELIM: char = '>';

/// Convert a location of the form `chrom:1,234..5,678(+)` to the canonical
/// form `chrom>1234>5678>(+)`
pub fn normalize_location(raw: &str) -> String {
    let d = LOCATION_DELIM.to_string();
    raw.replace(',', "")
        .replace(':', &d)
        .replace("..", &d)
        .replace('(', &format!("{}(", LOCATION_DELIM))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeneLocation {
    ctg: Contig,
    start: usize,
    end: usize,
    // Text between the parentheses, normally '+' or '-'
    strand: String,
}

impl GeneLocation {
    pub fn ctg(&self) -> &Contig {
        &self.ctg
    }
    pub fn start(&self) -> usize {
        self.start
    }
    pub fn end(&self) -> usize {
        self.end
    }
    pub fn strand(&self) -> &str {
        &self.strand
    }

    /// Parse canonical location, sharing the contig name through ctg_hash
    pub fn from_canonical(s: &str, ctg_hash: &mut HashSet<Contig>) -> anyhow::Result<Self> {
        let fields: Vec<_> = s.split(LOCATION_DELIM).collect();
        if fields.len() != 4 {
            return Err(anyhow!(
                "Expected 4 location fields in {}, found {}",
                s,
                fields.len()
            ));
        }
        let start = fields[1]
            .parse::<usize>()
            .with_context(|| format!("Error reading gene start from {}", s))?;
        let end = fields[2]
            .parse::<usize>()
            .with_context(|| format!("Error reading gene end from {}", s))?;
        let strand = fields[3]
            .strip_prefix('(')
            .and_then(|x| x.strip_suffix(')'))
            .ok_or_else(|| anyhow!("Strand not enclosed in parentheses in {}", s))?;
        Ok(Self {
            ctg: intern_contig(ctg_hash, fields[0]),
            start,
            end,
            strand: strand.to_owned(),
        })
    }

    /// Inclusive at both ends.  Contig is only compared if same_ctg is set
    pub fn contains(&self, ctg: &str, start: usize, end: usize, same_ctg: bool) -> bool {
        (!same_ctg || self.ctg.as_ref() == ctg)
            && (self.start..=self.end).contains(&start)
            && (self.start..=self.end).contains(&end)
    }
}

impl FromStr for GeneLocation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_canonical(s, &mut HashSet::new())
    }
}

impl fmt::Display for GeneLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = LOCATION_DELIM;
        write!(
            f,
            "{}{d}{}{d}{}{d}({})",
            self.ctg, self.start, self.end, self.strand
        )
    }
}

/// Mapping from gene location to gene id.
///
/// Genes are keyed on the canonical location text, so a later row with the
/// same text replaces the id of the earlier one but keeps its position in the table.
#[derive(Debug, Default)]
pub struct GeneTable {
    index: HashMap<String, usize>,
    genes: Vec<(GeneLocation, String)>,
}

impl GeneTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, loc: GeneLocation, id: String) {
        match self.index.entry(key) {
            Entry::Occupied(e) => {
                trace!("Gene {} replaces {} at {}", id, self.genes[*e.get()].1, e.key());
                self.genes[*e.get()].1 = id
            }
            Entry::Vacant(e) => {
                trace!(
                    "Adding gene {} at {}:{}-{} ({})",
                    id,
                    loc.ctg(),
                    loc.start(),
                    loc.end(),
                    loc.strand()
                );
                let ix = self.genes.len();
                self.genes.push((loc, id));
                e.insert(ix);
            }
        }
    }

    /// Normalize a raw location and add the gene
    pub fn insert_raw(
        &mut self,
        raw: &str,
        id: String,
        ctg_hash: &mut HashSet<Contig>,
    ) -> anyhow::Result<()> {
        let key = normalize_location(raw);
        let loc = GeneLocation::from_canonical(&key, ctg_hash)?;
        self.insert(key, loc, id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn genes(&self) -> &[(GeneLocation, String)] {
        &self.genes
    }
}

// Gene id is column 0 and location column 2
const GENE_MIN_FIELDS: usize = 3;

/// Read gene location table.  The first line is a header and is always skipped
pub fn read_gene_table<P: AsRef<Path>>(
    fname: P,
    ctg_hash: &mut HashSet<Contig>,
) -> anyhow::Result<GeneTable> {
    let fname = fname.as_ref();
    debug!("Reading in gene locations from {}", fname.display());

    trace!("Opening gene location file for reading");
    let mut rdr = CompressIo::new()
        .path(fname)
        .bufreader()
        .with_context(|| format!("{} not found. Please check and try again", fname.display()))?;

    trace!("Reading from file");
    let mut buf = String::new();
    let mut line = 0;
    let mut skipped = 0;
    let mut table = GeneTable::new();

    while let Some(fields) = get_next_line(&mut rdr, &mut buf).with_context(|| {
        format!(
            "Error after reading {} lines from {}",
            line,
            fname.display()
        )
    })? {
        line += 1;
        if line == 1 {
            trace!("Skipping header line");
            continue;
        }
        if fields.len() < GENE_MIN_FIELDS {
            warn!(
                "{}:{} '{}' in gene location file is lacking essential information. Line skipped",
                fname.display(),
                line,
                fields.join("\t")
            );
            skipped += 1;
            continue;
        }
        if let Err(e) = table.insert_raw(fields[2], fields[0].to_owned(), ctg_hash) {
            warn!(
                "{}:{} '{}' in gene location file has an unreadable location ({}). Line skipped",
                fname.display(),
                line,
                fields.join("\t"),
                e
            );
            skipped += 1;
        }
    }

    info!(
        "Read {} lines from {} ({} skipped); found {} gene locations",
        line,
        fname.display(),
        skipped,
        table.len()
    );

    Ok(table)
}
