//! Output formatting and logging utilities

use color_eyre::eyre::{Result, WrapErr};
use lmp2::{CorrelationEnergy, OrbitalPair};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Custom time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let total_seconds = StdSystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Setup output logging to file or stdout
pub fn setup_output(output_path: Option<&String>) -> Result<()> {
    match output_path {
        Some(path) => {
            let log = File::create(path)
                .wrap_err_with(|| format!("Could not create output file: {}", path))?;
            let file_layer = layer()
                .with_writer(log)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(false);
            Registry::default().with(file_layer).init();
            info!("Output will be written to: {}", path);
        }
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default().with(stdout_layer).init();
            info!("Output will be printed to stdout");
        }
    }
    Ok(())
}

/// Print the pair energy table to a writer
pub fn write_pair_energies<W: Write>(
    writer: &mut W,
    pairs: &[OrbitalPair],
    energy: &CorrelationEnergy,
) -> Result<()> {
    writeln!(
        writer,
        "{:>4} {:>4} {:>13} {:>6} {:>18} {:>14}",
        "i", "j", "type", "n_pno", "E_pair", "dE_PNO"
    )?;
    for pair in pairs {
        writeln!(
            writer,
            "{:>4} {:>4} {:>13} {:>6} {:>18.10} {:>14.3e}",
            pair.i,
            pair.j,
            pair.pair_type.to_string(),
            pair.n_pno(),
            pair.pair_energy.unwrap_or(0.0),
            pair.delta_pno
        )?;
    }
    writeln!(writer, "Local MP2 correlation energy: {:.10} au", energy.total())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lmp2::PairType;

    #[test]
    fn test_pair_table_lists_every_pair() {
        let mut close = OrbitalPair::new(0, 1, PairType::Close);
        close.pair_energy = Some(-0.0123);
        let far = OrbitalPair::new(0, 2, PairType::VeryDistant);
        let energy = CorrelationEnergy {
            local: -0.0123,
            dipole: 0.0,
            pno_truncation: 0.0,
        };

        let mut buffer = Vec::new();
        write_pair_energies(&mut buffer, &[close, far], &energy).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("VERY_DISTANT"));
        assert!(text.contains("-0.0123000000"));
    }
}
