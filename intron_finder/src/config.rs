use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

pub const DEFAULT_OUTPUT: &str = "Intron Junctions.txt";
pub const DEFAULT_UNIQUE_TAG: &str = "NH:i:1";

pub struct Config {
    sam_file: PathBuf,
    gene_file: PathBuf,
    output_file: PathBuf,
    unique_tag: String,
    require_same_chrom: bool,
    threads: usize,
}

impl Config {
    pub fn new(sam_file: PathBuf, gene_file: PathBuf) -> Self {
        Self {
            sam_file,
            gene_file,
            output_file: PathBuf::from(DEFAULT_OUTPUT),
            unique_tag: DEFAULT_UNIQUE_TAG.to_owned(),
            require_same_chrom: true,
            threads: 1,
        }
    }

    pub fn set_output_file(&mut self, p: PathBuf) {
        self.output_file = p
    }

    pub fn set_unique_tag(&mut self, s: String) {
        self.unique_tag = s
    }

    pub fn set_require_same_chrom(&mut self, x: bool) {
        self.require_same_chrom = x
    }

    pub fn set_threads(&mut self, n: usize) {
        self.threads = n.max(1)
    }

    pub fn sam_file(&self) -> &Path {
        &self.sam_file
    }

    pub fn gene_file(&self) -> &Path {
        &self.gene_file
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    pub fn unique_tag(&self) -> &str {
        &self.unique_tag
    }

    pub fn require_same_chrom(&self) -> bool {
        self.require_same_chrom
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}

pub type Contig = Arc<str>;

/// Return the shared copy of a contig name, adding it to the set if new
pub fn intern_contig(ctg_hash: &mut HashSet<Contig>, name: &str) -> Contig {
    if let Some(c) = ctg_hash.get(name) {
        c.clone()
    } else {
        trace!("Adding contig {}", name);
        let c: Contig = Arc::from(name);
        ctg_hash.insert(c.clone());
        c
    }
}
