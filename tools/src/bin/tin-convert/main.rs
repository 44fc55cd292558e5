use anyhow::Context as _;
use anyhow::Result;
use std::env;
use std::time::Instant;
use tin_io::Format;
use tin_io::Mesh;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::Registry;
use tracing_tree::HierarchicalLayer;

fn parse_format(name: &str) -> Result<Format> {
    match name {
        "landxml" | "xml" => Ok(Format::LandXml),
        "ply" => Ok(Format::Ply),
        _ => anyhow::bail!("unknown format {name:?}, see FORMATS"),
    }
}

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optflag("h", "help", "print this help menu");
    options.optopt("i", "input", "mesh file to read", "FILE");
    options.optopt("o", "output", "destination file", "FILE");
    options.optopt(
        "f",
        "format",
        "destination format, when the extension is not enough",
        "NAME",
    );
    options.optopt("p", "precision", "decimal places for textual coordinates", "DIGITS");
    options.optopt("t", "trace", "emit a chrome trace", "FILE");

    let matches = options.parse(env::args().skip(1))?;

    if matches.opt_present("h") {
        eprintln!("{}", options.usage("Usage: tin-convert [options]"));
        eprint!(include_str!("help_after.txt"));
        return Ok(());
    }

    let registry = Registry::default().with(EnvFilter::from_env("LOG")).with(
        HierarchicalLayer::new(4)
            .with_thread_ids(true)
            .with_targets(true)
            .with_bracketed_fields(true),
    );
    let _chrome_trace_guard = match matches.opt_str("t") {
        Some(filename) => {
            let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
                .file(filename)
                .build();
            registry.with(chrome_layer).init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    };

    let input = matches
        .opt_str("i")
        .context("missing required option 'input'")?;
    let output = matches
        .opt_str("o")
        .context("missing required option 'output'")?;

    let format = match matches.opt_str("f") {
        Some(name) => parse_format(&name)?,
        None => Format::from_path(&output)
            .with_context(|| format!("cannot tell the format of {output:?}, pass --format"))?,
    };
    let precision = match matches.opt_str("p") {
        Some(digits) => digits
            .parse()
            .context("invalid value for option 'precision'")?,
        None => tin_io::DEFAULT_PRECISION,
    };

    let start = Instant::now();
    let mesh = Mesh::from_file(&input).with_context(|| format!("failed to read {input:?}"))?;
    eprintln!(
        "loaded {} points and {} faces in {:?}",
        mesh.point_count(),
        mesh.face_count(),
        start.elapsed(),
    );

    let start = Instant::now();
    format
        .write_file(&mesh, &output, precision)
        .with_context(|| format!("failed to write {output:?}"))?;
    eprintln!("wrote {output} in {:?}", start.elapsed());

    Ok(())
}
