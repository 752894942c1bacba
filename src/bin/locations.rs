use anyhow::Result;
use clap::ArgMatches;

use mailview::ViewLocationExpander;

pub fn locations(args: &ArgMatches) -> Result<()> {
    let (_hosting, options) = super::environment(args)?;

    let expander = ViewLocationExpander::new(&options)?;

    for location in expander.locations() {
        println!("{}", location);
    }

    Ok(())
}
