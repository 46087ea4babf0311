use clap::{Parser, ValueEnum};
use log::info;
use std::error;
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use jp2::{
    box_type_string, Conformance, JBox, JP2Box, Jp2File, ParseOptions, WriteOptions,
};
use jpc::Codestream;

#[derive(Debug)]
enum JP2000Error {
    Decoding { path: String, error: String },
    Writing { path: String, error: String },
}

impl error::Error for JP2000Error {}
impl fmt::Display for JP2000Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Decoding { path, error } => {
                write!(f, "error decoding {}: {}", path, error)
            }
            Self::Writing { path, error } => {
                write!(f, "error writing {}: {}", path, error)
            }
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ConformanceArg {
    /// ISO/IEC 15444-1, colour specification precedence and approximation must be 0
    Jp2,
    /// ISO/IEC 15444-2
    Jpx,
}

impl From<ConformanceArg> for Conformance {
    fn from(value: ConformanceArg) -> Self {
        match value {
            ConformanceArg::Jp2 => Conformance::Jp2,
            ConformanceArg::Jpx => Conformance::Jpx,
        }
    }
}

#[derive(Parser)]
struct Opts {
    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(Parser)]
enum SubCommand {
    /// Print the box tree, diagnostics and codestream main header of a .jp2
    /// file or raw codestream
    Dump(Dump),

    /// Write a new .jp2 file around the first codestream of a .jp2 file or
    /// raw codestream
    Wrap(Wrap),
}

#[derive(Parser)]
struct Dump {
    /// Path to .jp2, .jpc or .j2c file
    path: String,

    /// Conformance the file is checked against
    #[clap(short, long, value_enum, default_value = "jp2")]
    conformance: ConformanceArg,
}

#[derive(Parser)]
struct Wrap {
    /// Path to .jp2, .jpc or .j2c file
    input: String,

    /// Path of the .jp2 file to write
    #[clap(short, long)]
    output: String,

    /// Conformance the written file is validated against
    #[clap(short, long, value_enum, default_value = "jp2")]
    conformance: ConformanceArg,
}

fn dump_boxes<W: Write>(out: &mut W, boxes: &[JP2Box], depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    for jbox in boxes {
        writeln!(
            out,
            "{}{:?} {} (offset {}, length {})",
            indent,
            box_type_string(&jbox.identifier()),
            jbox.name(),
            jbox.offset(),
            jbox.length()
        )?;

        match jbox {
            JP2Box::FileType(ftyp) => writeln!(
                out,
                "{}  brand {:?}, compatible with {:?}",
                indent,
                ftyp.brand(),
                ftyp.compatibility_list()
            )?,
            JP2Box::ImageHeader(ihdr) => writeln!(
                out,
                "{}  {}x{}, {} components, bit depth {}",
                indent,
                ihdr.width(),
                ihdr.height(),
                ihdr.no_components(),
                ihdr.bits_per_component()
                    .map_or("varies".to_owned(), |depth| depth.to_string())
            )?,
            JP2Box::ColourSpecification(colr) => {
                writeln!(out, "{}  method {}", indent, colr.method())?;
                if let Some(colour_space) = colr.enumerated_colour_space() {
                    writeln!(out, "{}  colourspace {}", indent, colour_space)?;
                }
                if let Some(profile) = colr.icc_profile() {
                    match colr.icc_profile_header() {
                        Some(Ok(header)) => {
                            for (name, value) in header.fields() {
                                writeln!(out, "{}  {}: {}", indent, name, value)?;
                            }
                        }
                        Some(Err(error)) => writeln!(out, "{}  {}", indent, error)?,
                        None => {}
                    }
                    if let Some(count) = icc::tag_count(profile) {
                        writeln!(out, "{}  Tag Count: {}", indent, count)?;
                    }
                }
            }
            JP2Box::Xml(xml) => {
                if let Ok(text) = xml.format() {
                    writeln!(out, "{}  {}", indent, text.trim())?;
                }
            }
            JP2Box::Uuid(uuid) => writeln!(out, "{}  {}", indent, uuid.uuid_string())?,
            _ => {}
        }

        if let Some(children) = jbox.children() {
            dump_boxes(out, children, depth + 1)?;
        }
    }
    Ok(())
}

fn dump_codestream<W: Write>(out: &mut W, codestream: &Codestream) -> io::Result<()> {
    writeln!(out, "codestream at offset {}", codestream.offset())?;
    for segment in codestream.segments() {
        writeln!(
            out,
            "  {} (0x{:04X}) offset {} length {}",
            segment.name(),
            segment.marker(),
            segment.offset(),
            segment.length()
        )?;
    }

    let geometry = codestream.geometry();
    writeln!(
        out,
        "image {}x{}, {}x{} tiles of {}x{}",
        geometry.image_width,
        geometry.image_height,
        geometry.no_tiles_x,
        geometry.no_tiles_y,
        geometry.tile_width,
        geometry.tile_height
    )?;
    for (i, component) in geometry.components.iter().enumerate() {
        writeln!(
            out,
            "  component {}: {}x{}, {} bit {}",
            i,
            component.width,
            component.height,
            component.precision,
            if component.signed { "signed" } else { "unsigned" }
        )?;
    }
    for comment in codestream.comment_marker_segments() {
        if let Ok(text) = comment.comment_utf8() {
            writeln!(out, "comment {:?}", text)?;
        }
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let opts: Opts = Opts::parse();

    match opts.subcommand {
        SubCommand::Dump(c) => {
            let options = ParseOptions {
                conformance: c.conformance.into(),
                ..Default::default()
            };
            let mut reader = BufReader::new(File::open(Path::new(&c.path))?);
            let file =
                Jp2File::decode(&mut reader, options).map_err(|error| JP2000Error::Decoding {
                    path: c.path.clone(),
                    error: error.to_string(),
                })?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            dump_boxes(&mut out, file.boxes(), 0)?;
            for diagnostic in file.diagnostics() {
                writeln!(out, "warning: {}", diagnostic)?;
            }
            if let Some(codestream) = file.codestream() {
                dump_codestream(&mut out, codestream)?;
            }
        }
        SubCommand::Wrap(c) => {
            let mut reader = BufReader::new(File::open(Path::new(&c.input))?);
            let file = Jp2File::decode(&mut reader, ParseOptions::default()).map_err(|error| {
                JP2000Error::Decoding {
                    path: c.input.clone(),
                    error: error.to_string(),
                }
            })?;

            // Encoded in full before the output file is created
            let mut encoded = vec![];
            let options = WriteOptions {
                conformance: c.conformance.into(),
            };
            file.wrap(&mut reader, &mut encoded, None, options)
                .map_err(|error| JP2000Error::Writing {
                    path: c.output.clone(),
                    error: error.to_string(),
                })?;

            let mut writer = BufWriter::new(File::create(Path::new(&c.output))?);
            writer.write_all(&encoded)?;
            writer.flush()?;
            info!("{} bytes written to {}", encoded.len(), c.output);
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    match run() {
        Err(e) => Err(e.to_string().into()),
        Ok(_) => Ok(()),
    }
}
