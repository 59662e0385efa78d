//! Handler for `pinset tree`.

use miette::Result;

use pinset_util::errors::PinsetError;

use crate::cli::ResolveArgs;

pub fn exec(
    args: &ResolveArgs,
    depth: Option<usize>,
    why: Option<&str>,
    invert: Option<&str>,
) -> Result<()> {
    let (resolution, _) = super::run_resolve(args)?;
    let graph = &resolution.graph;

    if let Some(target) = why {
        let path = graph.find_path(target).ok_or_else(|| PinsetError::Generic {
            message: format!("Package '{target}' is not in the resolved set"),
        })?;
        println!("Path to {target}:");
        for (i, node) in path.iter().enumerate() {
            let indent = "  ".repeat(i);
            println!("{indent}{node}");
        }
        return Ok(());
    }

    if let Some(target) = invert {
        let tree = graph.print_inverted_tree(target);
        if tree.is_empty() {
            return Err(PinsetError::Generic {
                message: format!("Package '{target}' is not in the resolved set"),
            }
            .into());
        }
        print!("{tree}");
        return Ok(());
    }

    print!("{}", graph.print_tree(depth));
    Ok(())
}
