mod compiler;
mod container;
mod error;
mod fixtures;
mod model;
#[cfg(test)]
mod temp_file;
mod tracer;

use anyhow::Result;
use clap::Parser;
use compiler::compile;
use container::Hdf5Container;
use fixtures::FixtureKind;
use itertools::Itertools;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Directory the fixture files are written to, created if it does not exist.
    #[clap(long, default_value = ".")]
    output_dir: PathBuf,

    /// Fixture to write, may be repeated. All fixtures are written if none are given.
    #[clap(long = "fixture", value_enum)]
    fixtures: Vec<FixtureKind>,
}

impl Cli {
    fn selected_fixtures(&self) -> Vec<FixtureKind> {
        if self.fixtures.is_empty() {
            FixtureKind::all()
        } else {
            self.fixtures.iter().copied().unique().collect()
        }
    }
}

fn main() -> Result<()> {
    tracer::init_tracer()?;

    let args = Cli::parse();
    debug!("{args:?}");

    std::fs::create_dir_all(&args.output_dir)?;

    for kind in args.selected_fixtures() {
        info!("Building fixture {kind}");
        let file = kind.build()?.in_directory(&args.output_dir);
        compile::<Hdf5Container>(&file)?;
    }
    Ok(())
}
