use crate::{Error, Result};
use std::path::Path;
use std::process::Command;

/// Source of raw size-tool output. The real implementation shells out to
/// the toolchain's `size`; tests substitute canned output.
pub trait SizeTool {
    /// Measures `file` and returns the tool's stdout.
    ///
    /// # Errors
    /// Returns an error if the tool cannot be started or exits non-zero.
    fn measure(&self, file: &Path) -> Result<String>;
}

/// Runs `<program> -A -d <file>` and captures stdout.
#[derive(Debug, Clone)]
pub struct SizeCommand {
    program: String,
}

impl SizeCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SizeTool for SizeCommand {
    fn measure(&self, file: &Path) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-A")
            .arg("-d")
            .arg(file)
            .output()
            .map_err(|source| Error::Tool {
                command: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::ToolStatus {
                command: self.program.clone(),
                status: output.status,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// One section row of SysV-format size output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub size: u64,
    pub addr: u64,
}

/// Parsed `size -A -d` (SysV format) output: one entry per section, in
/// the order the tool printed them.
#[derive(Debug, Clone, Default)]
pub struct SysvSizes {
    sections: Vec<Section>,
}

impl SysvSizes {
    /// Parses SysV-format output. Section rows are `name size addr` with
    /// decimal numbers; the filename header, the column header, and the
    /// `Total` footer are skipped.
    ///
    /// # Errors
    /// Returns an error if no section row is recognized.
    pub fn parse(output: &str) -> Result<Self> {
        let mut sections = Vec::new();

        for line in output.lines() {
            let mut fields = line.split_whitespace();
            let (Some(name), Some(size), Some(addr), None) =
                (fields.next(), fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            let (Ok(size), Ok(addr)) = (size.parse::<u64>(), addr.parse::<u64>()) else {
                continue;
            };
            sections.push(Section {
                name: name.to_string(),
                size,
                addr,
            });
        }

        if sections.is_empty() {
            return Err(Error::Output(
                "no section rows found (expected SysV `size -A` format)".to_string(),
            ));
        }

        Ok(Self { sections })
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.sections
            .iter()
            .find(|section| section.name == name)
            .map(|section| section.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSV_OUTPUT: &str = "\
firmware.elf  :
section           size        addr
.isr_vector        404   134217728
.text            60212   134218132
.rodata           1288   134278344
.data              120   536870912
.bss              1824   536871032
.comment            67           0
Total            63915
";

    #[test]
    fn parses_section_rows() {
        let sizes = SysvSizes::parse(SYSV_OUTPUT).unwrap();
        assert_eq!(sizes.get(".text"), Some(60_212));
        assert_eq!(sizes.get(".bss"), Some(1_824));
        assert_eq!(sizes.get(".missing"), None);
    }

    #[test]
    fn keeps_addresses() {
        let sizes = SysvSizes::parse(SYSV_OUTPUT).unwrap();
        let data = sizes.sections().find(|s| s.name == ".data").unwrap();
        assert_eq!(data.addr, 536_870_912);
    }

    #[test]
    fn skips_headers_and_total() {
        let sizes = SysvSizes::parse(SYSV_OUTPUT).unwrap();
        assert!(sizes.sections().all(|s| s.name != "Total"));
        assert!(sizes.sections().all(|s| s.name != "section"));
        assert_eq!(sizes.sections().count(), 6);
    }

    #[test]
    fn garbage_output_is_an_error() {
        assert!(SysvSizes::parse("").is_err());
        assert!(SysvSizes::parse("size: invalid option -- 'q'").is_err());
    }

    #[test]
    fn missing_binary_is_a_tool_error() {
        let tool = SizeCommand::new("/nonexistent/size-tool");
        let err = tool.measure(Path::new("firmware.elf")).unwrap_err();
        assert!(matches!(err, Error::Tool { .. }));
    }
}
