use std::fmt;

/// Measured utilization of one memory region. `used` may exceed
/// `capacity` when the image overflows the region; the bar clamps at
/// full but the printed numbers stay exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionUsage {
    name: String,
    used: u64,
    capacity: u64,
}

impl RegionUsage {
    pub fn new(name: impl Into<String>, used: u64, capacity: u64) -> Self {
        Self {
            name: name.into(),
            used,
            capacity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// used/capacity, unclamped. Defined as 0 for unsized regions.
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.used as f64 / self.capacity as f64
        }
    }

    pub fn percent(&self) -> f64 {
        self.ratio() * 100.0
    }

    pub fn is_unsized(&self) -> bool {
        self.capacity == 0
    }
}

/// Abbreviates a byte count into the largest unit whose mantissa lands in
/// [1, 1024), one decimal place, trailing `.0` dropped: `1536` becomes
/// `1.5KiB`, `131072` becomes `128KiB`.
pub fn abbreviate(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let mut num = bytes as f64;
    for unit in ["B", "KiB", "MiB", "GiB", "TiB"] {
        // anything at or above 1023.95 would print as 1024, so it
        // belongs to the next unit
        if num < 1023.95 {
            return with_unit(num, unit);
        }
        num /= 1024.0;
    }
    with_unit(num, "PiB")
}

fn with_unit(num: f64, unit: &str) -> String {
    let mantissa = format!("{num:.1}");
    let mantissa = mantissa.strip_suffix(".0").unwrap_or(&mantissa);
    format!("{mantissa}{unit}")
}

/// One bracketed bar of `width` cells; filled cells clamp to the width so
/// overflowing regions still render.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar(ratio: f64, width: usize) -> String {
    let filled = ((width as f64 * ratio).round() as usize).min(width);
    format!("[{:<width$}]", "=".repeat(filled))
}

/// Usage report for a set of regions. Displays one aligned line per
/// region in the shape `NAME: [bar] PCT% (used X of Y)`.
#[derive(Debug, Clone)]
pub struct Report {
    regions: Vec<RegionUsage>,
    pub width: usize,
    pub abbreviated: bool,
    pub show_all: bool,
}

impl Report {
    pub fn new(regions: Vec<RegionUsage>) -> Self {
        Self {
            regions,
            width: 10,
            abbreviated: true,
            show_all: false,
        }
    }

    fn shown(&self) -> impl Iterator<Item = &RegionUsage> {
        self.regions
            .iter()
            .filter(|region| self.show_all || region.used() != 0)
    }

    fn line(&self, region: &RegionUsage, name_width: usize) -> String {
        let counts = if self.abbreviated {
            format!(
                "used {} of {}",
                abbreviate(region.used()),
                abbreviate(region.capacity())
            )
        } else {
            format!(
                "used {} bytes of {} bytes",
                region.used(),
                region.capacity()
            )
        };
        let marker = if region.is_unsized() { " (unsized)" } else { "" };
        let name = format!("{}:", region.name());
        format!(
            "{name:<name_width$} {} {:>5.1}% ({counts}){marker}",
            bar(region.ratio(), self.width),
            region.percent()
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad names against every region, not just the shown ones, so the
        // layout is stable regardless of --show-all
        let name_width = self
            .regions
            .iter()
            .map(|region| region.name().len() + 1)
            .max()
            .unwrap_or(0);
        for (i, region) in self.shown().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(&self.line(region, name_width))?;
        }
        Ok(())
    }
}
