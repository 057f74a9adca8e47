use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};

use clap::Parser;
use serde::Deserialize;
use serde_bencode::DecodeOptions;
use serde_json::{json, Value as Json};

#[derive(Parser, Debug)]
#[command(
    name = "bencode2json",
    version,
    about = "Decode bencode (.torrent) files to JSON"
)]
struct Args {
    /// Input file path. Omit or use '-' to read from stdin.
    input: Option<String>,

    /// Output file path (prints to stdout if omitted).
    #[arg(short, long, value_name = "file")]
    output: Option<String>,

    /// Decode as an untyped value tree instead of the metainfo shape.
    #[arg(long)]
    raw: bool,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,

    /// Maximum container nesting accepted while decoding.
    #[arg(long, value_name = "number")]
    max_depth: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct Metainfo {
    announce: String,
    info: Info,
}

#[derive(Debug, Deserialize)]
struct Info {
    files: Option<Vec<FileEntry>>,
    length: Option<i64>,
    name: Option<String>,
    #[serde(rename = "piece length")]
    piece_length: i64,
    pieces: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    length: i64,
    path: Vec<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("ERROR  {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let input = read_input(args.input.as_deref())?;

    let mut options = DecodeOptions::new();
    if let Some(max_depth) = args.max_depth {
        options = options.with_max_depth(max_depth);
    }

    let output = if args.raw {
        serde_bencode::decode_to_value_with_options(&input, &options)?.to_json()
    } else {
        let metainfo: Metainfo = serde_bencode::from_slice_with_options(&input, &options)?;
        metainfo_to_json(&metainfo)
    };

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    write_output(args.output.as_deref(), rendered.as_bytes())
}

fn metainfo_to_json(metainfo: &Metainfo) -> Json {
    let info = &metainfo.info;
    let mut entries = serde_json::Map::new();
    if let Some(files) = &info.files {
        let files = files
            .iter()
            .map(|file| json!({ "length": file.length, "path": &file.path }))
            .collect();
        entries.insert("files".to_string(), Json::Array(files));
    }
    if let Some(length) = info.length {
        entries.insert("length".to_string(), json!(length));
    }
    if let Some(name) = &info.name {
        entries.insert("name".to_string(), json!(name));
    }
    entries.insert("piece length".to_string(), json!(info.piece_length));
    entries.insert("pieces".to_string(), json!(hex(&info.pieces)));

    json!({ "announce": &metainfo.announce, "info": Json::Object(entries) })
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn read_input(arg: Option<&str>) -> Result<Vec<u8>, Box<dyn Error>> {
    match arg {
        None | Some("-") => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(fs::read(path)?),
    }
}

fn write_output(arg: Option<&str>, rendered: &[u8]) -> Result<(), Box<dyn Error>> {
    match arg {
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered)?;
            stdout.write_all(b"\n")?;
            Ok(())
        }
        Some(path) => {
            fs::write(path, rendered)?;
            Ok(())
        }
    }
}
