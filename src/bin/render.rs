use std::fs;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;
use serde_yaml::{Mapping, Value};

use mailview::add_view_to_string_renderer;

pub fn render(args: &ArgMatches) -> Result<()> {
    // Parse CLI arguments.
    let name = args.value_of("name").unwrap();
    let model = match args.value_of("model") {
        Some(path) => load_model(path)?,
        None => Value::Mapping(Mapping::new()),
    };

    let (hosting, options) = super::environment(args)?;

    info!("Rendering view {}", name);

    let renderer = add_view_to_string_renderer(hosting, |o| *o = options)?;
    let output = renderer.render_view_to_string(name, &model)?;

    print!("{}", output);

    Ok(())
}

fn load_model(path: &str) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("error reading model file {}", path))?;

    serde_yaml::from_str(&raw)
        .with_context(|| format!("error parsing model file {}", path))
}

#[test]
fn example_model_is_loaded() {
    let model = load_model("test_assets/models/welcome.yaml").unwrap();

    assert_eq!(model.get("name").and_then(Value::as_str), Some("Ada"));
}
