use flate2::read::MultiGzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{CasError, FASTA_EXTENSIONS};

// os
#[cfg(not(windows))]
const TICK_SETTINGS: (&str, u64) = ("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ", 80);
#[cfg(windows)]
const TICK_SETTINGS: (&str, u64) = (r"+-x| ", 200);

/// return a pre-configured progress bar
pub fn get_progress_bar(length: u64, msg: &str) -> ProgressBar {
    let progressbar_style = ProgressStyle::default_spinner()
        .tick_chars(TICK_SETTINGS.0)
        .template(" {spinner} {msg:<30} {wide_bar} ETA {eta_precise} ")
        .expect("no template error");

    let progress_bar = ProgressBar::new(length);

    progress_bar.set_style(progressbar_style);
    progress_bar.enable_steady_tick(Duration::from_millis(TICK_SETTINGS.1));
    progress_bar.set_message(msg.to_owned());

    progress_bar
}

/// open a plain or gzip-compressed text file as a buffered reader
pub fn open_reader<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>, CasError> {
    let file = File::open(path.as_ref())?;

    let is_gz = path
        .as_ref()
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    if is_gz {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// write any collection of lines to a file, optionally preceded by a header
pub fn write_collection<P: AsRef<Path>>(
    data: &[String],
    header: Option<&str>,
    fname: P,
) -> Result<(), CasError> {
    log::info!(
        "Records in {}: {:?}. Writing...",
        fname.as_ref().display(),
        data.len()
    );

    let mut writer = BufWriter::new(File::create(fname.as_ref())?);

    if let Some(header) = header {
        writeln!(writer, "{}", header)?;
    }

    for line in data.iter() {
        writeln!(writer, "{}", line)?;
    }

    writer.flush()?;
    Ok(())
}

/// join an output directory with a per domain-set artifact name
pub fn set_artifact<P: AsRef<Path>>(outdir: P, set: &str, name: &str) -> PathBuf {
    outdir.as_ref().join(format!("{}_{}", set, name))
}

/// argument checker for all subcommands
pub trait ArgCheck {
    fn check(&self) -> Result<(), CliError> {
        self.validate_args()
    }

    fn validate_args(&self) -> Result<(), CliError> {
        validate(self.get_fasta())?;
        self.check_hit_dirs()?;

        if let Some(models) = self.get_models_dir() {
            if !models.is_dir() {
                return Err(CliError::InvalidInput(format!(
                    "ERROR: models directory {:?} does not exist",
                    models
                )));
            }
        } else {
            log::debug!("No models directory required. Skipping...");
        }

        Ok(())
    }

    fn check_hit_dirs(&self) -> Result<(), CliError> {
        if self.get_hmm_sets().is_empty() {
            let err = "No HMM sets provided".to_string();
            return Err(CliError::InvalidInput(err));
        }

        for set in self.get_hmm_sets() {
            let dir = self.get_hit_dir().join(set);
            if !dir.is_dir() {
                return Err(CliError::InvalidInput(format!(
                    "ERROR: hmmsearch output directory {:?} does not exist",
                    dir
                )));
            }
        }

        Ok(())
    }

    fn get_fasta(&self) -> &PathBuf;
    fn get_hit_dir(&self) -> &PathBuf;
    fn get_hmm_sets(&self) -> &Vec<String>;
    fn get_models_dir(&self) -> Option<&PathBuf>;
}

/// error handling for CLI
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// argument validation
pub fn validate(arg: &PathBuf) -> Result<(), CliError> {
    if !arg.exists() {
        return Err(CliError::InvalidInput(format!(
            "ERROR: {:?} does not exist",
            arg
        )));
    }

    if !arg.is_file() {
        return Err(CliError::InvalidInput(format!(
            "ERROR: {:?} is not a file",
            arg
        )));
    }

    match arg.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if FASTA_EXTENSIONS.contains(&ext) => (),
        _ => {
            return Err(CliError::InvalidInput(format!(
                "ERROR: file {:?} is not a FASTA file",
                arg
            )))
        }
    }

    match std::fs::metadata(arg) {
        Ok(metadata) if metadata.len() == 0 => Err(CliError::InvalidInput(format!(
            "ERROR: file {:?} is empty",
            arg
        ))),
        Ok(_) => Ok(()),
        Err(e) => Err(CliError::IoError(e)),
    }
}
