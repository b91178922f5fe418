use clap::{self, Parser};
use config::{ArgCheck, CasVocabulary};
use log::{error, info, Level};
use simple_logger::init_with_level;

use cas_cassette::{cli::Args, lib_cas_cassette};

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: Args = Args::parse();
    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let vocab = CasVocabulary::default();
    let tables = lib_cas_cassette(args, &vocab).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    for table in tables.iter() {
        info!("{}: {} cassettes", table.domain_set, table.len());
    }

    let elapsed = start.elapsed();
    info!("Elapsed time: {:?}", elapsed);
}
