use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{NOTHING, UTF8_FULL};
use comfy_table::*;
use ipnetwork::IpNetwork;
use ipranges::PrefixEntry;
use log::warn;

/*-------------------------------------------------------------------------------------------------
  Output Functions
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Prefix Table
--------------------------------------------------------------------------------------*/

pub fn prefix_table(entries: &[PrefixEntry]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(
        ["IP Prefix", "Service", "Region", "Network Border Group"].map(|header| {
            Cell::new(header)
                .add_attribute(Attribute::Bold)
                .fg(Color::Green)
        }),
    );

    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.cidr().unwrap_or_default()).add_attribute(Attribute::Bold),
            Cell::new(&entry.service),
            Cell::new(entry.attribute("region").unwrap_or_default()),
            Cell::new(entry.attribute("network_border_group").unwrap_or_default()),
        ]);
    }

    // Right-align the IP Prefix column
    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    println!("{table}");

    // Print prefix-table summary
    let ipv4_count = entries
        .iter()
        .filter(|entry| entry.ip_prefix.is_some())
        .count();
    let ipv6_count = entries
        .iter()
        .filter(|entry| entry.ipv6_prefix.is_some())
        .count();

    let mut summary_table = Table::new();
    summary_table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic);

    summary_table.add_row(vec![Cell::new(ipv4_count), Cell::new("IPv4 Prefixes")]);
    summary_table.add_row(vec![Cell::new(ipv6_count), Cell::new("IPv6 Prefixes")]);

    if let Some(column) = summary_table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    println!("{summary_table}");
}

/*--------------------------------------------------------------------------------------
  Prefixes In CIDR Format
--------------------------------------------------------------------------------------*/

pub fn prefixes_in_cidr_format(entries: &[PrefixEntry]) {
    for cidr in entries.iter().filter_map(PrefixEntry::cidr) {
        println!("{cidr}");
    }
}

/*--------------------------------------------------------------------------------------
  Prefixes In Netmask Format
--------------------------------------------------------------------------------------*/

pub fn prefixes_in_netmask_format(entries: &[PrefixEntry]) {
    for cidr in entries.iter().filter_map(PrefixEntry::cidr) {
        match netmask_format(cidr) {
            Some(line) => println!("{line}"),
            None => warn!("Skipping prefix that is not an IP network: {:?}", cidr),
        }
    }
}

/// Format a CIDR string as `network mask`.
pub fn netmask_format(cidr: &str) -> Option<String> {
    cidr.parse::<IpNetwork>()
        .ok()
        .map(|network| format!("{} {}", network.network(), network.mask()))
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_netmask_format() {
        assert_eq!(
            netmask_format("13.32.0.0/15").as_deref(),
            Some("13.32.0.0 255.254.0.0")
        );
        assert_eq!(
            netmask_format("2600:9000::/28").as_deref(),
            Some("2600:9000:: ffff:fff0::")
        );
        assert_eq!(netmask_format("not-a-prefix"), None);
    }
}
