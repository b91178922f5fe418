use clap::{self, Parser};
use config::{ArgCheck, CasVocabulary};
use log::{error, info, Level};
use simple_logger::init_with_level;

use cas_predict::{cli::Args, lib_cas_predict};

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: Args = Args::parse();
    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
        .unwrap();

    let vocab = CasVocabulary::default();
    let report = lib_cas_predict(args, &vocab).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    info!(
        "Predictions: {}, imputed scores: {}, notices: {}",
        report.records.len(),
        report.imputations.len(),
        report.notices.len()
    );

    let elapsed = start.elapsed();
    info!("Elapsed time: {:?}", elapsed);
}
