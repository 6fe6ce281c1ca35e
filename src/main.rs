mod cli;

use clap::Parser;
use ipranges::{BoxError, ResolverBuilder};
use log::{error, info};
use std::process::ExitCode;

/*-------------------------------------------------------------------------------------------------
  Main CLI Function
-------------------------------------------------------------------------------------------------*/

fn main() -> ExitCode {
    let args = cli::Args::parse();

    // Initialize logging; --debug needs at least `info` to show the decision trail
    let verbosity = args
        .verbose
        .log_level()
        .map_or(0, |level| level as usize - 1);
    let verbosity = if args.debug {
        verbosity.max(2)
    } else {
        verbosity
    };
    let _ = stderrlog::new()
        .module(module_path!())
        .quiet(args.verbose.is_silent())
        .verbosity(verbosity)
        .init();

    match run(&args) {
        Ok(exit_code) => exit_code,
        Err(error) => {
            error!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &cli::Args) -> Result<ExitCode, BoxError> {
    let mut builder = ResolverBuilder::new();
    if let Some(url) = &args.url {
        builder.url(url);
    }
    if let Some(cache_file) = &args.cache_file {
        builder.cache_file(cache_file);
    }
    if args.debug {
        builder.debug(true);
    }
    let resolver = builder.build();

    // Cache maintenance
    if args.clear_cache {
        resolver.clear_cache()?;
        info!("Cleared cache file {:?}", resolver.storage_path());
        return Ok(ExitCode::SUCCESS);
    }

    if args.check {
        return Ok(if resolver.is_up_to_date() {
            println!("up-to-date");
            ExitCode::SUCCESS
        } else {
            println!("stale");
            ExitCode::from(1)
        });
    }

    // Resolve the selected prefixes
    let filters = cli::build_filters(args)?;
    let entries = if args.offline {
        resolver.get_entries_from_cache(&filters)?
    } else {
        resolver.resolve_entries(&filters)?
    };
    info!("Selected {} prefixes", entries.len());

    // Display results
    match args.output {
        cli::OutputFormat::Cidr => cli::output::prefixes_in_cidr_format(&entries),
        cli::OutputFormat::Netmask => cli::output::prefixes_in_netmask_format(&entries),
        cli::OutputFormat::Table => cli::output::prefix_table(&entries),
    }

    // Save results to CSV file
    if let Some(csv_file) = &args.csv_file {
        cli::csv::save(&entries, csv_file)?;
        info!("Saved {} prefixes to {:?}", entries.len(), csv_file);
    }

    Ok(ExitCode::SUCCESS)
}
