use anyhow::Result;
use clap::Parser;

use routexml2csv::logging::init_logging;
use routexml2csv::{Cli, ConvertOptions, RouteXmlError, run};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = ConvertOptions::from(&cli);
    let report = run(&options).map_err(|e| match e {
        RouteXmlError::NoInput | RouteXmlError::NoRows => anyhow::Error::new(e),
        other => anyhow::Error::new(other).context("conversion failed"),
    })?;

    let mut written = report.written.iter();
    if let Some(main_path) = written.next() {
        println!("Wrote main CSV: {}", main_path.display());
    }
    for detail_path in written {
        println!("Wrote detail TSV: {}", detail_path.display());
    }

    Ok(())
}
