use std::fs::File;
use std::io::Error;
use std::path::Path;

/// Writes an operations CSV with one agent, one client, and `loads` unit
/// loads.
pub fn generate_operations_csv(path: &Path, loads: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record([
        "type",
        "user",
        "client",
        "counterparty",
        "amount",
        "receipt",
        "notes",
    ])?;
    wtr.write_record(["agent", "maria@desk.io", "", "", "", "", ""])?;
    wtr.write_record(["enroll", "ana@example.com", "", "", "", "", ""])?;

    for i in 1..=loads {
        let receipt = format!("COMP-{i:06}");
        wtr.write_record([
            "load",
            "maria@desk.io",
            "ana@example.com",
            "",
            "1",
            receipt.as_str(),
            "",
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
