use ipranges::PrefixEntry;
use std::path::Path;

/*-------------------------------------------------------------------------------------------------
  Save Prefix Entries to CSV File
-------------------------------------------------------------------------------------------------*/

pub fn save(entries: &[PrefixEntry], path: &Path) -> csv::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    // Write header
    writer.serialize(["IP Prefix", "Service", "Region", "Network Border Group"])?;

    // Write prefix records
    for entry in entries {
        let record = (
            entry.cidr().unwrap_or_default(),
            &entry.service,
            entry.attribute("region").unwrap_or_default(),
            entry.attribute("network_border_group").unwrap_or_default(),
        );
        writer.serialize(record)?;
    }

    writer.flush()?;

    Ok(())
}
