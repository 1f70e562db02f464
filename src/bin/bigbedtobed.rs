use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};

use clap::Parser;

use bigbed::BigBedRead;

/// Extracts BED records from a BigBed file, writing them as TSV.
#[derive(Clone, Debug, Parser)]
#[command(name = "bigbedtobed", about = "Convert a BigBed file to BED (TSV)")]
struct Args {
    /// Path to the input BigBed file.
    input: String,

    /// Path to write output to, or `-` for stdout.
    #[arg(default_value = "-")]
    output: String,

    /// Restrict output to a single chromosome.
    #[arg(long)]
    chrom: Option<String>,

    /// Restrict output to start at this position (requires `--chrom`).
    #[arg(long, default_value_t = 0)]
    start: u32,

    /// Restrict output to end at this position (requires `--chrom`).
    #[arg(long)]
    end: Option<u32>,

    /// Stop after this many records; 0 means unlimited.
    #[arg(long, default_value_t = 0)]
    max_items: u32,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut reader = BigBedRead::open_file(&args.input)?;

    let mut out: Box<dyn Write> = if args.output == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        Box::new(BufWriter::new(File::create(&args.output)?))
    };

    let lines = match &args.chrom {
        Some(chrom) => {
            let chrom_info = reader
                .chrom_list()
                .into_iter()
                .find(|c| &c.name == chrom)
                .ok_or_else(|| format!("chromosome not found: {chrom}"))?;
            let end = args.end.unwrap_or(chrom_info.size);
            reader
                .query(chrom.as_bytes(), args.start, end, args.max_items)?
                .into_iter()
                .map(|l| (chrom_info.name.clone(), l))
                .collect()
        }
        None => reader.to_bed(args.max_items)?,
    };

    for (chrom_name, line) in lines {
        match line.rest {
            Some(rest) => writeln!(
                out,
                "{}\t{}\t{}\t{}",
                chrom_name,
                line.start,
                line.end,
                String::from_utf8_lossy(&rest)
            )?,
            None => writeln!(out, "{}\t{}\t{}", chrom_name, line.start, line.end)?,
        }
    }

    Ok(())
}
