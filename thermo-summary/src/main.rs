use anyhow::{anyhow, Result};
use clap::Parser;
use itertools::{izip, Itertools};
use lammps_log_rust::LogFile;
use log::info;
use rayon::{prelude::*, ThreadPoolBuilder};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// LAMMPS log files
    #[arg(required = true)]
    log_files: Vec<PathBuf>,

    /// Print the full series of a thermo property
    #[arg(short, long)]
    property: Vec<String>,

    /// Number of threads to run in parallel
    #[arg(short, long, default_value_t = 2)]
    threads: usize,

    /// Print the serialized record instead of the summary
    #[arg(long)]
    json: bool,
}

fn summary(path: &Path, log: &LogFile) -> String {
    let params = log.run_parameters();
    let header = format!(
        "{}\nrun: {} thermo: {} rows: {}",
        path.to_string_lossy(),
        params.run_steps,
        params.log_interval,
        log.data().rows_count()
    );
    let properties = izip!(log.data().averages(), log.data().std_deviations())
        .map(|((key, avg), (_, std))| format!("{key}\t{avg}\t{std}"))
        .join("\n");
    format!("{header}\n{properties}")
}

fn series_table(path: &Path, log: &LogFile, keys: &[String]) -> Result<String> {
    let columns = keys
        .iter()
        .map(|key| {
            log.get_property(key).ok_or(anyhow!(
                "{}: no thermo property `{key}`",
                path.to_string_lossy()
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    let rows = (0..log.data().rows_count())
        .map(|i| columns.iter().map(|column| column[i]).join("\t"));
    Ok([keys.join("\t")].into_iter().chain(rows).join("\n"))
}

fn report(path: &Path, log: &LogFile, cli: &Cli) -> Result<String> {
    if cli.json {
        return log.to_json();
    }
    let mut out = summary(path, log);
    if !cli.property.is_empty() {
        out.push('\n');
        out.push_str(&series_table(path, log, &cli.property)?);
    }
    Ok(out)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let tp = ThreadPoolBuilder::new().num_threads(cli.threads).build()?;
    let logs = tp.install(|| {
        cli.log_files
            .par_iter()
            .map(|path| LogFile::read(path))
            .collect::<Result<Vec<_>>>()
    })?;
    info!("parsed {} log files", logs.len());

    for (path, log) in izip!(&cli.log_files, &logs) {
        println!("{}", report(path, log, &cli)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LOG: &str = "\
thermo 1
thermo_style custom step temp
run 2
Step Temp
0 10.0
1 20.0
2 30.0
";

    fn log() -> LogFile {
        LogFile::from_reader(Cursor::new(LOG)).unwrap()
    }

    #[test]
    fn test_summary() {
        let out = summary(Path::new("log.lammps"), &log());
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "log.lammps");
        assert_eq!(lines[1], "run: 2 thermo: 1 rows: 3");
        assert!(lines[3].starts_with("temp\t20\t"));
    }

    #[test]
    fn test_series_table() {
        let keys = vec!["temp".to_string(), "step".to_string()];
        let out = series_table(Path::new("log.lammps"), &log(), &keys).unwrap();
        assert_eq!(out, "temp\tstep\n10\t0\n20\t1\n30\t2");
        let keys = vec!["press".to_string()];
        let err = series_table(Path::new("log.lammps"), &log(), &keys).unwrap_err();
        assert!(err.to_string().contains("press"));
    }
}
