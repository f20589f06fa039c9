use std::time::Instant;
use std::{env, fs, process};

use locus_base::{GffParams, LocusStore};
use locus_base::utils;

use getopts::Options;
use log::info;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse arguments.
    let config = Config::new();

    // Check if the database already exists.
    if utils::file_exists(&config.db_file) {
        if config.overwrite {
            info!("Overwriting database {}", config.db_file);
            fs::remove_file(&config.db_file).map_err(|x| x.to_string())?;
        } else {
            return Err(format!("Database {} already exists", config.db_file));
        }
    }

    // Create the database and import the loci.
    let mut store = LocusStore::create(&config.db_file).map_err(|x| x.to_string())?;
    let stats = store.import_gff_file(&config.gff_file, &config.params).map_err(|x| x.to_string())?;
    store.set_primary_feature_type(&config.primary, true).map_err(|x| x.to_string())?;

    // Statistics.
    eprintln!(
        "Read {} records: {} top-level loci, {} loci in total, {} failed, {} skipped",
        stats.total, stats.top_level, stats.inserted, stats.failed, stats.skipped
    );
    let counts = store.feature_type_counts().map_err(|x| x.to_string())?;
    for (feature_type, count) in counts.iter() {
        eprintln!("{}\t{}", feature_type, count);
    }
    let primary = store.len().map_err(|x| x.to_string())?;
    eprintln!("{} primary loci with feature type {}", primary, config.primary);
    if let Some(size) = store.file_size() {
        eprintln!("Database size: {}", size);
    }

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub gff_file: String,
    pub db_file: String,
    pub primary: String,
    pub params: GffParams,
    pub overwrite: bool,
}

impl Config {
    const DEFAULT_PRIMARY: &'static str = "gene";

    pub fn new() -> Config {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("o", "output", "output file name (default: <input>.db)", "FILE");
        opts.optopt("p", "primary", "primary feature type (default: gene)", "STR");
        opts.optmulti("s", "skip", "skip records with this feature type (may repeat)", "STR");
        opts.optflag("", "gtf", "the input is in GTF format");
        opts.optflag("", "infer-types", "infer integer, float, and boolean attribute values");
        opts.optflag("", "overwrite", "overwrite the database file if it exists");
        let matches = match opts.parse(&args[1..]) {
            Ok(m) => m,
            Err(f) => {
                eprintln!("{}", f);
                process::exit(1);
            }
        };

        let header = format!("Usage: {} [options] annotations.gff[.gz]", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let gff_file = if let Some(s) = matches.free.first() {
            s.clone()
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };
        let db_file = matches.opt_str("o").unwrap_or(format!("{}.db", gff_file));
        let primary = matches.opt_str("p").unwrap_or(String::from(Self::DEFAULT_PRIMARY));

        let mut params = if matches.opt_present("gtf") { GffParams::gtf() } else { GffParams::default() };
        params.skip_feature_types = matches.opt_strs("s");
        params.infer_types = matches.opt_present("infer-types");

        let overwrite = matches.opt_present("overwrite");

        Config {
            gff_file,
            db_file,
            primary,
            params,
            overwrite,
        }
    }
}

//-----------------------------------------------------------------------------
