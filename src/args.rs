use bluer::Address;
use clap::Parser;

/// Reads Ventus W820 weather station data over Bluetooth LE
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// BLE address of the station, overrides W820_MAC
    #[arg(long)]
    pub mac: Option<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_is_optional() {
        let args = Args::try_parse_from(["ventus-w820"]).unwrap();
        assert_eq!(args.mac, None);
    }

    #[test]
    fn parses_mac_override() {
        let args = Args::try_parse_from(["ventus-w820", "--mac", "D8:1F:12:34:56:78"]).unwrap();
        assert_eq!(
            args.mac,
            Some(Address::new([0xd8, 0x1f, 0x12, 0x34, 0x56, 0x78]))
        );
    }

    #[test]
    fn rejects_invalid_mac() {
        assert!(Args::try_parse_from(["ventus-w820", "--mac", "not-a-mac"]).is_err());
    }
}
