use crate::report::RegionUsage;
use crate::size_tool::{Section, SysvSizes};
use crate::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Capacity and layout of a single memory region.
///
/// The JSON form is either a bare byte count (`"FLASH": 131072`) or the
/// object emitted by `--gen-config`, which also carries the region's base
/// address and the output sections the linker places there.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum RegionSpec {
    Capacity(u64),
    Detailed {
        size: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<u64>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        sections: Vec<String>,
    },
}

impl RegionSpec {
    pub fn new(size: u64, origin: Option<u64>) -> Self {
        Self::Detailed {
            size,
            origin,
            sections: Vec::new(),
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Self::Capacity(size) | Self::Detailed { size, .. } => *size,
        }
    }

    pub fn origin(&self) -> Option<u64> {
        match self {
            Self::Capacity(_) => None,
            Self::Detailed { origin, .. } => *origin,
        }
    }

    pub fn sections(&self) -> &[String] {
        match self {
            Self::Capacity(_) => &[],
            Self::Detailed { sections, .. } => sections,
        }
    }

    pub fn add_section(&mut self, name: &str) {
        if let Self::Detailed { sections, .. } = self {
            if !sections.iter().any(|s| s == name) {
                sections.push(name.to_string());
            }
        }
    }

    /// Whether a section measured by the size tool belongs to this region,
    /// either by name (the linker placed it here) or by address range.
    /// Address 0 is ignored since non-allocated sections (debug info,
    /// comments) report it.
    fn claims(&self, section: &Section) -> bool {
        if self.sections().iter().any(|s| *s == section.name) {
            return true;
        }
        match self.origin() {
            Some(origin) if section.addr != 0 => {
                section.addr >= origin && section.addr - origin < self.size()
            }
            _ => false,
        }
    }
}

/// Mapping from region name to [`RegionSpec`], in declaration order.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(transparent)]
pub struct Config {
    regions: IndexMap<String, RegionSpec>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON config string.
    ///
    /// # Errors
    /// Returns an error on malformed JSON or on region values that are
    /// neither an integer capacity nor a `{size, origin, sections}` object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a JSON config file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Renders the config as pretty-printed JSON, the `--gen-config` output.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn insert(&mut self, name: &str, spec: RegionSpec) {
        self.regions.insert(name.to_string(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&RegionSpec> {
        self.regions.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut RegionSpec> {
        self.regions.get_mut(name)
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegionSpec)> {
        self.regions.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Aggregates per-section sizes into per-region usage, preserving the
    /// config's region order. A section may count toward more than one
    /// region (initialized data is stored in flash and used in RAM).
    pub fn usage(&self, sizes: &SysvSizes) -> Vec<RegionUsage> {
        self.regions
            .iter()
            .map(|(name, spec)| {
                let used = sizes
                    .sections()
                    .filter(|section| spec.claims(section))
                    .map(|section| section.size)
                    .sum();
                RegionUsage::new(name, used, spec.size())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn bare_capacity_form() {
        let config = Config::from_json_str(r#"{"FLASH": 131072}"#).unwrap();
        let spec = config.get("FLASH").unwrap();
        assert_eq!(spec.size(), 131_072);
        assert_eq!(spec.origin(), None);
        assert!(spec.sections().is_empty());
    }

    #[test]
    fn detailed_form() {
        let json = r#"{
            "FLASH": {"size": 131072, "origin": 134217728, "sections": [".text"]},
            "RAM": {"size": 32768}
        }"#;
        let config = Config::from_json_str(json).unwrap();
        let flash = config.get("FLASH").unwrap();
        assert_eq!(flash.size(), 131_072);
        assert_eq!(flash.origin(), Some(134_217_728));
        assert_eq!(flash.sections(), [".text"]);
        assert_eq!(config.get("RAM").unwrap().origin(), None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Config::from_json_str(r#"{"FLASH": "big"}"#).is_err());
        assert!(Config::from_json_str("{").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"RAM": 32768}}"#).unwrap();
        let config = Config::from_json_file(file.path()).unwrap();
        assert_eq!(config.get("RAM").unwrap().size(), 32_768);
    }

    #[test]
    fn region_order_is_preserved() {
        let config = Config::from_json_str(r#"{"RAM": 1, "FLASH": 2, "CCM": 3}"#).unwrap();
        let names: Vec<&str> = config.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["RAM", "FLASH", "CCM"]);
    }

    #[test]
    fn sections_claimed_by_name() {
        let mut config = Config::new();
        let mut flash = RegionSpec::new(1024, None);
        flash.add_section(".text");
        flash.add_section(".rodata");
        config.insert("FLASH", flash);

        let sizes = SysvSizes::parse(
            ".text 600 0\n.rodata 100 0\n.bss 50 0\nTotal 750",
        )
        .unwrap();
        let usage = config.usage(&sizes);
        assert_eq!(usage[0].used(), 700);
    }

    #[test]
    fn sections_claimed_by_address_range() {
        let mut config = Config::new();
        config.insert("FLASH", RegionSpec::new(0x2_0000, Some(0x0800_0000)));
        config.insert("RAM", RegionSpec::new(0x8000, Some(0x2000_0000)));

        let sizes = SysvSizes::parse(concat!(
            ".text 60000 134217728\n",
            ".data 1000 536870912\n",
            ".debug_info 9999 0\n",
            "Total 70999",
        ))
        .unwrap();
        let usage = config.usage(&sizes);
        assert_eq!(usage[0].used(), 60_000);
        assert_eq!(usage[1].used(), 1_000);
    }

    #[test]
    fn unclaimed_regions_report_zero() {
        let mut config = Config::new();
        config.insert("EEPROM", RegionSpec::Capacity(4096));
        let sizes = SysvSizes::parse(".text 100 4096\nTotal 100").unwrap();
        assert_eq!(config.usage(&sizes)[0].used(), 0);
    }

    #[test]
    fn gen_config_round_trip() {
        let mut config = Config::new();
        let mut flash = RegionSpec::new(0x2_0000, Some(0x0800_0000));
        flash.add_section(".text");
        config.insert("FLASH", flash);

        let json = config.to_json_pretty().unwrap();
        let reloaded = Config::from_json_str(&json).unwrap();
        assert_eq!(reloaded.get("FLASH"), config.get("FLASH"));
    }
}
