//! Handler for `pinset compile`.

use std::path::Path;

use miette::Result;

use pinset_resolver::Resolution;
use pinset_util::errors::PinsetError;
use pinset_util::progress;

use crate::cli::ResolveArgs;

pub fn exec(args: &ResolveArgs, output_file: Option<&Path>) -> Result<()> {
    let (resolution, config) = super::run_resolve(args)?;
    let rendered = render(&resolution, config.allow_unsafe);

    match output_file {
        Some(path) => {
            std::fs::write(path, &rendered).map_err(PinsetError::Io)?;
            progress::status("Wrote", &path.display().to_string());
        }
        None => print!("{rendered}"),
    }

    if !config.allow_unsafe && !resolution.unsafe_pins.is_empty() {
        progress::status_warn(
            "Omitted",
            &format!(
                "{} unsafe packages (use --allow-unsafe to keep them)",
                resolution.unsafe_pins.len()
            ),
        );
    }
    Ok(())
}

/// One pin per line, then the omitted unsafe packages as comments.
fn render(resolution: &Resolution, allow_unsafe: bool) -> String {
    let mut out = String::new();
    for line in resolution.to_lines() {
        out.push_str(&line);
        out.push('\n');
    }
    if !allow_unsafe && !resolution.unsafe_pins.is_empty() {
        out.push_str(
            "\n# The following packages are considered to be unsafe in a requirements file:\n",
        );
        for pin in resolution.unsafe_pins.values() {
            out.push_str(&format!("# {pin}\n"));
        }
    }
    out
}
