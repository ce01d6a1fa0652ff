//! Classification of single command-line tokens.
//!
//! A token is a hardware address, a port number, or anything else. The
//! checks here are pure and stateless; the resolver decides what "anything
//! else" means from its position in the token stream.

/// Number of octets in a hardware address.
const HW_ADDR_OCTETS: usize = 6;

/// Kind of a single destination token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Six hex octets, optionally separated by `:` or `-`.
    HardwareAddress,
    /// A decimal port in `1..=65535`.
    Port(u16),
    /// Host name, IP address, or alias.
    Other,
}

/// Classifies a token.
pub fn classify(token: &str) -> TokenKind {
    if is_hardware_address(token) {
        TokenKind::HardwareAddress
    } else if let Some(port) = as_port(token) {
        TokenKind::Port(port)
    } else {
        TokenKind::Other
    }
}

/// Returns true if the token starts with a hardware address.
///
/// Separators between octets are optional and may be mixed. Only the prefix
/// has to match, so `aa:bb:cc:dd:ee:ff/extra` still counts.
pub fn is_hardware_address(token: &str) -> bool {
    parse_hardware_address(token).is_some()
}

/// Parses the hardware address at the start of the token into its octets.
pub fn parse_hardware_address(token: &str) -> Option<[u8; HW_ADDR_OCTETS]> {
    let bytes = token.as_bytes();
    let mut octets = [0u8; HW_ADDR_OCTETS];
    let mut pos = 0;

    for (i, octet) in octets.iter_mut().enumerate() {
        let hi = hex_value(*bytes.get(pos)?)?;
        let lo = hex_value(*bytes.get(pos + 1)?)?;
        *octet = (hi << 4) | lo;
        pos += 2;

        // separator allowed after each of the first five octets
        if i < HW_ADDR_OCTETS - 1 && matches!(bytes.get(pos), Some(b':') | Some(b'-')) {
            pos += 1;
        }
    }

    Some(octets)
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Parses a token consisting solely of ASCII digits into a non-zero port.
pub fn as_port(token: &str) -> Option<u16> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    // u16 parsing rejects anything above 65535, leading zeros are fine
    match token.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}
