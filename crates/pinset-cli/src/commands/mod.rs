//! Command dispatch and handler modules.

mod compile;
mod tree;

use std::path::Path;

use miette::Result;

use pinset_core::config::{PinsetConfig, ResolverConfig};
use pinset_core::requirement::Requirement;
use pinset_resolver::cache::CachingProvider;
use pinset_resolver::index::IndexProvider;
use pinset_resolver::{Resolution, Resolver};
use pinset_util::errors::PinsetError;
use pinset_util::progress;

use crate::cli::{Cli, Command, ResolveArgs};

const CONFIG_FILE: &str = "pinset.toml";

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Compile {
            resolve,
            output_file,
        } => compile::exec(&resolve, output_file.as_deref()),
        Command::Tree {
            resolve,
            depth,
            why,
            invert,
        } => tree::exec(&resolve, depth, why.as_deref(), invert.as_deref()),
    }
}

/// Settings from the config file with command-line flags layered on top.
fn resolver_config(args: &ResolveArgs) -> Result<ResolverConfig> {
    let mut config = match args.config {
        Some(ref path) => PinsetConfig::from_path(path)?,
        None => PinsetConfig::load_or_default(Path::new(CONFIG_FILE)),
    }
    .resolver;

    config.prereleases |= args.pre;
    config.allow_unsafe |= args.allow_unsafe;
    if let Some(rounds) = args.max_rounds {
        config.max_rounds = rounds;
    }
    Ok(config)
}

fn parse_requirements(args: &ResolveArgs) -> Result<Vec<Requirement>> {
    let invalid = |line: &str, e: &dyn std::fmt::Display| PinsetError::Requirement {
        message: format!("`{line}`: {e}"),
    };

    let mut roots = Vec::with_capacity(args.requirements.len() + args.constraints.len());
    for line in &args.requirements {
        roots.push(line.parse::<Requirement>().map_err(|e| invalid(line, &e))?);
    }
    for line in &args.constraints {
        roots.push(Requirement::constraint(line).map_err(|e| invalid(line, &e))?);
    }
    Ok(roots)
}

/// Load the index, resolve the requested requirements and report progress.
fn run_resolve(args: &ResolveArgs) -> Result<(Resolution, ResolverConfig)> {
    let config = resolver_config(args)?;
    let roots = parse_requirements(args)?;

    let index = IndexProvider::from_path(&args.index).map_err(|e| PinsetError::Index {
        message: e.to_string(),
    })?;
    tracing::debug!(
        "Loaded {} packages from {}",
        index.package_count(),
        args.index.display()
    );

    progress::status(
        "Resolving",
        &format!("{} requirements", args.requirements.len()),
    );
    let spinner = progress::spinner("Resolving dependencies...");
    let provider = CachingProvider::new(index);
    let resolver = Resolver::new(&provider, config.clone());
    let result = resolver.resolve(&roots);
    spinner.finish_and_clear();
    let resolution = result?;

    tracing::debug!(
        "Dependency cache: {} hits, {} misses",
        provider.hits(),
        provider.misses()
    );
    progress::status(
        "Resolved",
        &format!(
            "{} packages in {} rounds",
            resolution.len(),
            resolution.rounds
        ),
    );
    Ok((resolution, config))
}
