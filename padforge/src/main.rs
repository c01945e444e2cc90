//! padforge - compile Steam Controller configurations to Steam VDF.

use std::fs::File;
use std::io::{self, Read};
use std::process;

use clap::Parser;
use log::{error, info};

use padforge_compiler::config::ControllerConfig;
use padforge_compiler::export::Exporter;
use padforge_compiler::maker::Maker;
use padforge_compiler::source::{self, Node};
use padforge_compiler::vdf;
use padforge_compiler::{Error, Result};

mod cli;
mod logging;

use crate::cli::{Format, Options};

fn main() {
    let options = Options::parse();

    logging::initialize(&options).expect("Unable to initialize logger");

    if let Err(err) = run(&options) {
        error!("{}", err);
        process::exit(1);
    }
}

fn run(options: &Options) -> Result<()> {
    let root = read_source(options)?;
    let config = compile(&root)?;
    let document = config.encode_kv();

    if options.check {
        info!("source document compiles cleanly");
        return Ok(());
    }

    match &options.output {
        Some(path) => {
            let mut file = File::create(path)?;
            vdf::dump(&document, &mut file)?;
        },
        None => {
            let stdout = io::stdout();
            vdf::dump(&document, &mut stdout.lock())?;
        },
    }
    Ok(())
}

fn read_source(options: &Options) -> Result<Node> {
    let reader: Box<dyn Read> = match &options.input {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin()),
    };
    match options.format {
        Format::Yaml => source::load_yaml(reader),
        Format::Json => source::load_json(reader),
    }
}

/// Dispatch on the document's root key: the canonical schema, the
/// short-hand adapter grammar, or the DOM exporter grammar.
fn compile(root: &Node) -> Result<ControllerConfig> {
    if source::attr(root, "controller_mappings").is_some() {
        ControllerConfig::from_node(root)
    } else if source::attr(root, "actions").is_some() {
        Maker::load(root)?.export_config()
    } else if source::attr(root, "action").is_some() {
        Exporter::new().export_config(root)
    } else {
        Err(Error::UnknownSchema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_dispatch() {
        let canonical: Node =
            serde_yaml::from_str("controller_mappings:\n  version: 3").unwrap();
        assert!(compile(&canonical).is_ok());

        let shorthand: Node = serde_yaml::from_str(
            "actions:\n  - name: Default\n    layers:\n      - name: Base\n        BK: <Escape>",
        )
        .unwrap();
        assert!(compile(&shorthand).is_ok());

        let dom: Node = serde_yaml::from_str(
            "action:\n  - name: Default\n    layer:\n      - name: Default\n        DP.u: (DUP)",
        )
        .unwrap();
        assert!(compile(&dom).is_ok());

        let unknown: Node = serde_yaml::from_str("bogus: 1").unwrap();
        assert!(matches!(compile(&unknown), Err(Error::UnknownSchema)));
    }
}
