use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use cloudlabel_core::{Colour, ColourMode, IdPalette, PartitionedIndex, Payload, Point3d};
use cloudlabel_io::{CsvOptions, RecordReader};
use cloudlabel_label::Dataset;
use cloudlabel_stream::{ReaderConfig, StreamReader, DEFAULT_CAPACITY};

#[derive(Parser)]
#[command(name = "cloudlabel", version, about = "Labeled point cloud tools")]
struct Cli {
    /// More log output; repeat for trace level. `RUST_LOG` takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct Format {
    /// Comma separated field names, e.g. x,y,z,id
    #[arg(short, long, default_value = "x,y,z,id")]
    fields: String,
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,
    /// First line is a header
    #[arg(long)]
    header: bool,
}

impl Format {
    fn options(&self) -> Result<CsvOptions> {
        Ok(CsvOptions::new(&self.fields)?
            .with_delimiter(self.delimiter)
            .with_header(self.header))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print point count, extents and partition sizes
    Info {
        input: PathBuf,
        #[command(flatten)]
        format: Format,
    },

    /// Give duplicated points the label of their first occurrence and save in place
    Repair {
        input: PathBuf,
        #[command(flatten)]
        format: Format,
    },

    /// Label every point inside a box
    Relabel {
        input: PathBuf,
        /// Lower corner as x,y,z
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        min: Point3d,
        /// Upper corner as x,y,z
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        max: Point3d,
        #[arg(long)]
        id: u32,
        /// Write here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        format: Format,
    },

    /// Read points from a file or `-` for stdin and report the render window
    Stream {
        source: String,
        /// Vertex buffer capacity per block
        #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
        size: usize,
        /// `id`, `record`, or a colour name or #rrggbb
        #[arg(short, long, default_value = "white")]
        colour: String,
        #[command(flatten)]
        format: Format,
    },
}

fn parse_point(s: &str) -> std::result::Result<Point3d, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("invalid coordinate \"{}\": {}", v, e)))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [x, y, z] => Ok(Point3d::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z, got \"{}\"", s)),
    }
}

fn parse_colour_mode(s: &str) -> Result<ColourMode> {
    Ok(match s {
        "id" => ColourMode::ById(IdPalette::new()),
        "record" => ColourMode::FromRecord { fallback: Colour::WHITE },
        _ => ColourMode::Fixed(Colour::parse(s)?),
    })
}

fn info(input: &Path, format: &Format) -> Result<()> {
    let reader = RecordReader::open(input, format.options()?)
        .with_context(|| format!("failed to open {}", input.display()))?;
    let mut index = PartitionedIndex::new();
    for (i, line) in reader.enumerate() {
        let line = line?;
        index.insert(&line.record.point, Payload::new(line.record.id, i));
    }
    println!("{}: {} point(s)", input.display(), index.size());
    println!("extents: {}", index.extents());
    println!("partitions: {}", index.partitions().len());
    for (id, partition) in index.partitions() {
        println!("  {}: {} point(s)", id, partition.size());
    }
    Ok(())
}

fn relabel(input: &Path, min: &Point3d, max: &Point3d, id: u32, output: Option<&Path>, format: &Format) -> Result<()> {
    let mut dataset = Dataset::open(input, format.options()?, None, false)?;
    if !dataset.valid() {
        bail!("failed to load {}", input.display());
    }
    let selection = dataset.points().find_range(min, max);
    let changed = dataset.label_map(&selection, id);
    log::info!("{} of {} point(s) in box relabeled to {}", changed, selection.size(), id);
    match output {
        Some(path) => dataset.save_as(path)?,
        None => dataset.save()?,
    };
    Ok(())
}

fn stream(source: &str, size: usize, colour: &str, format: &Format) -> Result<()> {
    let config = ReaderConfig::new()
        .with_capacity(size)
        .with_colour(parse_colour_mode(colour)?)
        .with_label(source);
    let mut reader = StreamReader::open(source, format.options()?, config)?;
    loop {
        let finished = reader.is_shutdown();
        if reader.update(&Point3d::origin()) > 0 {
            let vertices = reader.vertices();
            log::info!(
                "{}: {} point(s), window [{}, {}) of block {}",
                source,
                reader.index().size(),
                vertices.index(),
                vertices.index() + vertices.size(),
                vertices.block()
            );
            if let Some(point) = reader.latest_point() {
                log::debug!("latest point ({}, {}, {})", point.x, point.y, point.z);
            }
        }
        if finished {
            break;
        }
        thread::sleep(Duration::from_millis(40));
    }
    reader.shutdown();
    if reader.failed() {
        bail!("reading {} failed", source);
    }
    println!("{}: {} point(s)", source, reader.index().size());
    println!("extents: {}", reader.index().extents());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Info { input, format } => info(&input, &format),
        Command::Repair { input, format } => {
            let count = Dataset::repair(&input, format.options()?)?;
            println!("{}: relabeled {} duplicated point(s)", input.display(), count);
            Ok(())
        }
        Command::Relabel { input, min, max, id, output, format } => {
            relabel(&input, &min, &max, id, output.as_deref(), &format)
        }
        Command::Stream { source, size, colour, format } => stream(&source, size, &colour, &format),
    }
}
