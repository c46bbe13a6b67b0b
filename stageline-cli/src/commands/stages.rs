use anyhow::Result;
use stageline::stages::BUILTIN_STAGES;

/// Execute the `stages` command: list built-in stages and the field each sets.
pub fn execute() -> Result<i32> {
    println!("{:12} SETS FIELD", "STAGE");
    for (name, field) in BUILTIN_STAGES {
        println!("{name:12} {field}");
    }
    Ok(0)
}
