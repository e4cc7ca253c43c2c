use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Plain-text fallback layouts. Ledalab's `Text-file` import reads the
/// tab-separated one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextLayout {
    Tab,
    Comma,
}

impl TextLayout {
    pub fn header(self) -> &'static str {
        match self {
            TextLayout::Tab => "Time(s)\tConductance(uS)",
            TextLayout::Comma => "Time,Conductance",
        }
    }

    pub fn separator(self) -> char {
        match self {
            TextLayout::Tab => '\t',
            TextLayout::Comma => ',',
        }
    }
}

/// Writes one `<time><sep><conductance>` row per sample with six decimals.
pub fn write_series(
    path: &Path,
    time: &[f64],
    conductance: &[f64],
    layout: TextLayout,
) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{}", layout.header())?;
    let sep = layout.separator();
    for (t, c) in time.iter().zip(conductance) {
        writeln!(w, "{t:.6}{sep}{c:.6}")?;
    }
    w.flush()
}

#[cfg(test)]
pub fn read_series(path: &Path, layout: TextLayout) -> io::Result<(Vec<f64>, Vec<f64>)> {
    let text = std::fs::read_to_string(path)?;
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(layout.header()));
    let mut time = Vec::new();
    let mut conductance = Vec::new();
    for line in lines {
        let (t, c) = line
            .split_once(layout.separator())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, line.to_string()))?;
        let parse = |v: &str| {
            v.parse::<f64>()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        };
        time.push(parse(t)?);
        conductance.push(parse(c)?);
    }
    Ok((time, conductance))
}
