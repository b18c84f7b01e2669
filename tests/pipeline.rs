//! End-to-end: linker script in, formatted report out, with the size
//! tool replaced by canned output.

use prettysize::size_tool::{SizeTool, SysvSizes};
use prettysize::{linker, Report, Result};
use std::path::Path;

struct FakeSize(&'static str);

impl SizeTool for FakeSize {
    fn measure(&self, _file: &Path) -> Result<String> {
        Ok(self.0.to_string())
    }
}

const SCRIPT: &str = r"
MEMORY
{
  FLASH (rx) : ORIGIN = 0x08000000, LENGTH = 128K
  RAM (xrw)  : ORIGIN = 0x20000000, LENGTH = 32K
}

SECTIONS
{
  .isr_vector : { KEEP(*(.isr_vector)) } > FLASH
  .text : { *(.text*) } > FLASH
  .rodata : { *(.rodata*) } > FLASH
  .data : { *(.data*) } > RAM AT > FLASH
  .bss (NOLOAD) : { *(.bss*) } > RAM
}
";

const SIZE_OUTPUT: &str = "\
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
fn linker_script_to_report() {
    let config = linker::parse(SCRIPT).unwrap();
    let tool = FakeSize(SIZE_OUTPUT);
    let output = tool.measure(Path::new("firmware.elf")).unwrap();
    let sizes = SysvSizes::parse(&output).unwrap();

    let report = Report::new(config.usage(&sizes));
    assert_eq!(
        report.to_string(),
        "FLASH: [=====     ]  47.3% (used 60.6KiB of 128KiB)\n\
         RAM:   [=         ]   5.9% (used 1.9KiB of 32KiB)"
    );
}

#[test]
fn failing_tool_propagates() {
    struct BrokenSize;
    impl SizeTool for BrokenSize {
        fn measure(&self, _file: &Path) -> Result<String> {
            Err(prettysize::Error::Output("boom".to_string()))
        }
    }
    assert!(BrokenSize.measure(Path::new("firmware.elf")).is_err());
}
