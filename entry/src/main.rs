/// castools: CRISPR-Cas cassette identification and subtype prediction
///
/// This is the entry point for the castools CLI.
/// It is responsible for parsing the CLI arguments
/// and executing the appropriate subcommand.
///
/// This wrapper offers 3 subcommands:
/// - annotate: protein table + hmmsearch hit aggregation per HMM set
/// - cassette: annotate + cassette segmentation
/// - run: the whole pipeline, up to subtype predictions
///
/// Gene calling and hmmsearch are not run here; castools consumes
/// a protein FASTA and one directory of --tblout files per HMM set.
///
/// To get help on the subcommands, you can run:
///
/// ```shell
/// castools run -- --help
/// ```
///
use clap::{Args, Parser, Subcommand};
use castools::{dispatch, Step};
use log::{error, info, Level};
use simple_logger::init_with_level;

const HELP: &str = r#"
Usage: castools run -f <FASTA> [-s HMM1,..,HMM5] [-c CART,ERT,SVM] [-r CART,ERT,SVM] [-m MODE]

 Options:
  -f, --fasta <PATH>                Protein FASTA [gene-called proteins for dna input]
  -s, --hmm-sets <HMM_SETS>         HMM sets delimited by comma [default: HMM3]
  -c, --classifiers <MODELS>        Classifiers delimited by comma [default: ERT]
  -r, --regressors <MODELS>         Regressors delimited by comma [default: ERT]
  -p, --class-probabilities         Report every class with its probability
  -m, --mode <MODE>                 classification, regression or mixed
  --sequence-type <TYPE>            dna or protein [default: protein]
  --hmmsearch-output-dir <DIR>      hmmsearch --tblout files, one sub-directory per HMM set
  --models-dir <DIR>                Exported model artifacts
  --cassette-output-dir <DIR>       Intermediate tables
  -o, --output-file <PATH>          Prediction table
  -t, --threads <THREADS>           Number of threads
  -h, --help                        Print help
"#;

#[derive(Parser)]
#[command(name = "castools")]
#[command(about = "castools: CRISPR-Cas cassette identification and subtype prediction")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "annotate")]
    Annotate(StepArgs),
    #[command(name = "cassette")]
    Cassette(StepArgs),
    #[command(name = "run")]
    Run(StepArgs),
}

#[derive(Args)]
struct StepArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, help = HELP)]
    args: Vec<String>,
}

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();
    let cli = Cli::parse();

    init();

    let (step, args) = match cli.command {
        Commands::Annotate(args) => (Step::Annotate, args.args),
        Commands::Cassette(args) => (Step::Cassette, args.args),
        Commands::Run(args) => (Step::Run, args.args),
    };

    dispatch(step, args).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let elapsed = start.elapsed();
    info!("Elapsed time: {:?}", elapsed);
}

fn init() {
    let message = format!(
        r#"

        castools: CRISPR-Cas cassette identification and subtype prediction

        this is the entry point for the castools CLI
        and it is responsible for parsing the CLI arguments
        for each step:

        - annotate
        - cassette
        - run

        > version: {}

        * to get help on the subcommands, run:
            castools <SUBCOMMAND> -- --help

        "#,
        env!("CARGO_PKG_VERSION")
    );

    println!("{}", message);
}
