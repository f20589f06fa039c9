use locus_base::{Locus, LocusIter, LocusStore, NeighborQuery, Strand, WithinQuery};
use locus_base::formats;

use std::io::{self, BufWriter, Write};
use std::str::FromStr;
use std::{env, process};

use getopts::Options;
use log::info;
use regex::Regex;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse arguments.
    let config = Config::new()?;

    // Open the database.
    let mut store = LocusStore::open(&config.filename).map_err(|x| x.to_string())?;

    // Switch the primary feature type for this query only.
    let scope;
    let store: &LocusStore = match config.primary.as_ref() {
        Some(primary) => {
            scope = store.scoped_primary_feature_type(primary, true).map_err(|x| x.to_string())?;
            &scope
        },
        None => &store,
    };

    // Find the query locus.
    let query = match &config.target {
        Target::Name(name) => store.get(name).map_err(|x| x.to_string())?,
        Target::Region(locus) => locus.clone(),
    };
    info!("Query: {}", query);

    // Run the query and write the results in GFF format.
    let mut output = BufWriter::new(io::stdout());
    match config.mode {
        Mode::Within => {
            let params = WithinQuery::default()
                .with_partial(config.partial)
                .with_ignore_strand(config.ignore_strand)
                .with_same_strand(config.same_strand);
            let found = store.within(&query, &params).map_err(|x| x.to_string())?;
            write_loci(found, &mut output)?;
        },
        Mode::Upstream => {
            let found = store.upstream_loci(&query, &config.neighbor_query()).map_err(|x| x.to_string())?;
            write_loci(found, &mut output)?;
        },
        Mode::Downstream => {
            let found = store.downstream_loci(&query, &config.neighbor_query()).map_err(|x| x.to_string())?;
            write_loci(found, &mut output)?;
        },
        Mode::Flanking => {
            let (upstream, downstream) = store.flanking_loci(&query, &config.neighbor_query()).map_err(|x| x.to_string())?;
            write_loci(upstream, &mut output)?;
            write_loci(downstream, &mut output)?;
        },
        Mode::Encompassing => {
            let found = store.encompassing_loci(&query).map_err(|x| x.to_string())?;
            write_loci(found, &mut output)?;
        },
    }
    output.flush().map_err(|x| x.to_string())?;

    Ok(())
}

fn write_loci<W: Write>(loci: LocusIter, output: &mut W) -> Result<(), String> {
    info!("Found {} loci", loci.len());
    for locus in loci {
        let locus = locus.map_err(|x| x.to_string())?;
        formats::write_gff_locus(&locus, output).map_err(|x| x.to_string())?;
    }
    Ok(())
}

//-----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Within,
    Upstream,
    Downstream,
    Flanking,
    Encompassing,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "within" => Ok(Mode::Within),
            "upstream" => Ok(Mode::Upstream),
            "downstream" => Ok(Mode::Downstream),
            "flanking" => Ok(Mode::Flanking),
            "encompassing" => Ok(Mode::Encompassing),
            _ => Err(format!("Invalid query mode: {}", s)),
        }
    }
}

#[derive(Clone, Debug)]
enum Target {
    Name(String),
    Region(Locus),
}

// Parses a region of the form chromosome:start-end.
fn parse_region(region: &str, strand: Strand) -> Result<Locus, String> {
    let pattern = Regex::new(r"^(.+):(\d+)-(\d+)$").map_err(|x| x.to_string())?;
    let captures = pattern.captures(region).ok_or(format!("Invalid region: {}", region))?;
    let start = captures[2].parse::<i64>().map_err(|x| format!("--region: {}", x))?;
    let end = captures[3].parse::<i64>().map_err(|x| format!("--region: {}", x))?;
    let locus = Locus::new(&captures[1], start, end).map_err(|x| x.to_string())?;
    Ok(locus.with_strand(strand))
}

struct Config {
    filename: String,
    target: Target,
    mode: Mode,
    primary: Option<String>,
    n: usize,
    max_distance: i64,
    partial: bool,
    ignore_strand: bool,
    same_strand: bool,
}

impl Config {
    fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("n", "name", "name of the query locus", "STR");
        opts.optopt("r", "region", "query region chromosome:start-end", "STR");
        opts.optopt("s", "strand", "strand of the query region (default: +)", "+|-|.");
        opts.optopt("m", "mode", "within, upstream, downstream, flanking, or encompassing (default: within)", "STR");
        opts.optopt("p", "primary", "query loci of this feature type (default: stored selection)", "STR");
        opts.optopt("k", "count", "report at most this many neighbors in each direction", "INT");
        opts.optopt("d", "distance", "maximum distance to neighbors in bp", "INT");
        opts.optflag("", "partial", "include partially overlapping loci");
        opts.optflag("", "ignore-strand", "order results by position regardless of the query strand");
        opts.optflag("", "same-strand", "report only loci on the same strand as the query");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let header = format!("Usage: {} [options] annotations.db", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let strand = match matches.opt_str("s") {
            Some(s) => Strand::from_str(&s).map_err(|x| x.to_string())?,
            None => Strand::Forward,
        };
        let target = match (matches.opt_str("n"), matches.opt_str("r")) {
            (Some(name), None) => Target::Name(name),
            (None, Some(region)) => Target::Region(parse_region(&region, strand)?),
            _ => return Err(String::from("Exactly one of --name and --region must be provided")),
        };
        let mode = match matches.opt_str("m") {
            Some(s) => Mode::from_str(&s)?,
            None => Mode::Within,
        };
        let mut n = NeighborQuery::N;
        if let Some(s) = matches.opt_str("k") {
            n = s.parse::<usize>().map_err(|x| format!("--count: {}", x))?;
        }
        let mut max_distance = NeighborQuery::MAX_DISTANCE;
        if let Some(s) = matches.opt_str("d") {
            max_distance = s.parse::<i64>().map_err(|x| format!("--distance: {}", x))?;
        }

        let filename = if let Some(s) = matches.free.first() {
            s.clone()
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        Ok(Config {
            filename,
            target,
            mode,
            primary: matches.opt_str("p"),
            n,
            max_distance,
            partial: matches.opt_present("partial"),
            ignore_strand: matches.opt_present("ignore-strand"),
            same_strand: matches.opt_present("same-strand"),
        })
    }

    fn neighbor_query(&self) -> NeighborQuery {
        NeighborQuery::default()
            .with_n(self.n)
            .with_max_distance(self.max_distance)
            .with_partial(self.partial)
            .with_same_strand(self.same_strand)
    }
}

//-----------------------------------------------------------------------------
