//! Line-oriented script driver for the pagetree index
//!
//! Usage: `pagetree <script> <output> [db-file]`
//!
//! Script format: the first line carries the tree order, the second the
//! number of operations, then one operation per line:
//! `I <key>, <value>` inserts, `R <key>` removes, `B <key>` looks a key up
//! and reports the result to the output file. A level-order dump of the
//! final tree is appended after the operations.

use pagetree::{Error, Result, TreeBuilder};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("pagetree: {err}");
        process::exit(err.to_status_code().unsigned_abs() as i32);
    }
}

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(script_path), Some(output_path)) = (args.next(), args.next()) else {
        return Err(Error::InvalidParameter("usage: pagetree <script> <output> [db-file]"));
    };
    let db_path = args.next().unwrap_or_else(|| "pagetree.db".to_string());

    let script = fs::read_to_string(script_path).map_err(|e| Error::Io(e.to_string()))?;
    let mut lines = script.lines();

    let order = usize::try_from(parse_int(lines.next())?)
        .map_err(|_| Error::InvalidParameter("tree order must be at least 3"))?;
    let op_count = parse_int(lines.next())?;

    let mut tree = TreeBuilder::new().order(order).create(db_path)?;
    let output = File::create(output_path).map_err(|e| Error::Io(e.to_string()))?;
    let mut output = BufWriter::new(output);

    for _ in 0..op_count {
        let Some(line) = lines.next() else {
            return Err(Error::InvalidParameter("script ends before the declared operation count"));
        };
        let line = line.trim();
        match line.split_at(line.len().min(1)) {
            ("I", rest) => {
                let (key, value) = parse_pair(rest)?;
                tree.insert(key, value)?;
            }
            ("R", rest) => {
                let key = parse_int(Some(rest))?;
                // A missing key is reported, not fatal: the script goes on.
                match tree.remove(key) {
                    Ok(()) => {}
                    Err(Error::KeyNotFound) => warn!(key, "remove of a key not in the tree"),
                    Err(err) => return Err(err),
                }
            }
            ("B", rest) => {
                let key = parse_int(Some(rest))?;
                if tree.search(key)?.is_some() {
                    writeln!(output, "record found")?;
                } else {
                    writeln!(output, "record not found")?;
                }
            }
            _ => {
                writeln!(output, "unsupported operation")?;
            }
        }
    }

    writeln!(output)?;
    tree.print(&mut output)?;
    output.flush()?;
    Ok(())
}

/// Parse one integer from a script fragment.
fn parse_int(fragment: Option<&str>) -> Result<i32> {
    fragment
        .map(str::trim)
        .and_then(|s| s.parse().ok())
        .ok_or(Error::InvalidParameter("malformed integer in script"))
}

/// Parse a `<key>, <value>` pair.
fn parse_pair(fragment: &str) -> Result<(i32, i32)> {
    let (key, value) = fragment
        .split_once(',')
        .ok_or(Error::InvalidParameter("insert expects `I <key>, <value>`"))?;
    Ok((parse_int(Some(key))?, parse_int(Some(value))?))
}
