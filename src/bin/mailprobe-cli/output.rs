use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};

use mailprobe_lib::ProbeOutcome;
use mailprobe_lib::report::{human_line, write_all_atomically};

pub fn print_outcome(outcome: &ProbeOutcome, format: &str) -> Result<()> {
    match format {
        "human" => println!("{}", human_line(outcome)),
        "json" => println!("{}", serde_json::to_string_pretty(outcome)?),
        other => bail!("format inconnu '{other}', utilisez human|json"),
    }
    Ok(())
}

/// One address per line, to `path` when given, stdout otherwise.
pub fn write_lines(lines: &[String], path: Option<&Path>) -> Result<()> {
    let mut buf = Vec::new();
    for line in lines {
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
    }
    match path {
        Some(path) => write_all_atomically(path, &buf)
            .with_context(|| format!("write {}", path.display())),
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(&buf)?;
            lock.flush()?;
            Ok(())
        }
    }
}
