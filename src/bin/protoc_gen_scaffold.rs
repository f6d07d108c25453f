//! protoc plugin: `CodeGeneratorRequest` on stdin, `CodeGeneratorResponse`
//! on stdout. Logs go to stderr.

use anyhow::Context;
use scaffolder::config::ScaffoldConfig;
use scaffolder::descriptor::encode_response;
use scaffolder::logging::{init_logging, LogConfig};
use scaffolder::pipeline::proto::{error_response, serve_plugin, PLUGIN_USAGE};
use scaffolder::replacer::Replacer;
use scaffolder::writer::OutputWriter;
use std::io::{Read, Write};
use std::path::Path;

fn main() -> anyhow::Result<()> {
    if std::env::args().skip(1).any(|arg| arg == "-h" || arg == "--help") {
        print!("{PLUGIN_USAGE}");
        return Ok(());
    }
    init_logging(&LogConfig::from_env());

    let mut request = Vec::new();
    std::io::stdin()
        .read_to_end(&mut request)
        .context("Failed to read CodeGeneratorRequest from stdin")?;

    let response = match ScaffoldConfig::load(None) {
        Ok(config) => serve_plugin(
            &request,
            &config.layout,
            &Replacer::new(config.markers.clone()),
            &OutputWriter::new(),
            Path::new("."),
        ),
        Err(e) => error_response(&e),
    };

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&encode_response(&response))
        .context("Failed to write CodeGeneratorResponse to stdout")?;
    stdout.flush()?;
    Ok(())
}
