use std::{num::NonZeroUsize, path::PathBuf};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    ArgMatches, Command,
};

use utils::{init_log, LogLevel};

use crate::config::*;

/// Set up definition of command options for clap
fn cli_model() -> Command {
    Command::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .author(crate_authors!())
        .arg(
            Arg::new("timestamp")
                .short('X')
                .long("timestamp")
                .value_parser(value_parser!(stderrlog::Timestamp))
                .value_name("GRANULARITY")
                .default_value("none")
                .help("Prepend log entries with a timestamp"),
        )
        .arg(
            Arg::new("loglevel")
                .short('l')
                .long("loglevel")
                .value_name("LOGLEVEL")
                .value_parser(value_parser!(LogLevel))
                .ignore_case(true)
                .default_value("warn")
                .help("Set log level"),
        )
        .arg(
            Arg::new("quiet")
                .action(ArgAction::SetTrue)
                .long("quiet")
                .conflicts_with("loglevel")
                .help("Silence all output"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_parser(value_parser!(NonZeroUsize))
                .value_name("INT")
                .help("Set number of threads for matching junctions to genes [default: available cores]"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .default_value(DEFAULT_OUTPUT)
                .help("Set output file"),
        )
        .arg(
            Arg::new("unique_tag")
                .short('u')
                .long("unique-tag")
                .value_parser(value_parser!(String))
                .value_name("TAG")
                .default_value(DEFAULT_UNIQUE_TAG)
                .help("Last SAM field marking a uniquely mapped read"),
        )
        .arg(
            Arg::new("ignore_chrom")
                .action(ArgAction::SetTrue)
                .long("ignore-chrom")
                .help("Match junctions to genes on coordinates only, without comparing chromosomes"),
        )
        .arg(
            Arg::new("sam")
                .value_parser(value_parser!(PathBuf))
                .value_name("SAM_FILE")
                .required(true)
                .help("Input SAM file"),
        )
        .arg(
            Arg::new("gene_locations")
                .value_parser(value_parser!(PathBuf))
                .value_name("GENE_FILE")
                .required(true)
                .help("Input gene location table"),
        )
}

/// Handle command line options.  Set up Config structure
pub fn handle_cli() -> anyhow::Result<Config> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m)?;

    debug!("Processing command line options");
    Ok(config_from_matches(&m))
}

fn config_from_matches(m: &ArgMatches) -> Config {
    let sam = m
        .get_one::<PathBuf>("sam")
        .expect("Missing SAM file")
        .to_owned();
    let gene_file = m
        .get_one::<PathBuf>("gene_locations")
        .expect("Missing gene location file")
        .to_owned();

    let nt = m
        .get_one::<NonZeroUsize>("threads")
        .map(|x| usize::from(*x))
        .unwrap_or_else(num_cpus::get);

    let mut cfg = Config::new(sam, gene_file);

    if let Some(p) = m.get_one::<PathBuf>("output") {
        cfg.set_output_file(p.to_owned())
    }
    if let Some(s) = m.get_one::<String>("unique_tag") {
        cfg.set_unique_tag(s.clone())
    }
    cfg.set_require_same_chrom(!m.get_flag("ignore_chrom"));
    cfg.set_threads(nt);

    if !cfg.require_same_chrom() {
        info!("Chromosomes will not be compared when matching junctions to genes")
    }
    debug!(
        "Input: {} {}; output: {}; threads: {}",
        cfg.sam_file().display(),
        cfg.gene_file().display(),
        cfg.output_file().display(),
        cfg.threads()
    );
    cfg
}
