use std::{fs, io::Read};

use alloy_primitives::{hex, Bytes};

use super::{EvmeError, Result};

/// Loads hex-encoded bytes from an argument or from a file, `-` standing for stdin.
///
/// The argument wins over the file. Returns empty bytes when neither is given.
pub fn load_hex(arg: Option<&str>, file: Option<&str>) -> Result<Bytes> {
    let text = match (arg, file) {
        (Some(arg), _) => arg.to_string(),
        (None, Some("-")) => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => return Ok(Bytes::new()),
    };
    decode_hex(&text).map(Bytes::from)
}

fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(text);
    if digits.len() % 2 != 0 {
        return Err(EvmeError::InvalidInput(format!(
            "hex string has odd length {}",
            digits.len()
        )));
    }
    Ok(hex::decode(digits)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_wins_over_file() {
        let bytes = load_hex(Some("0x0102"), Some("/nonexistent")).unwrap();
        assert_eq!(bytes, Bytes::from_static(&[1, 2]));
    }

    #[test]
    fn test_file_is_trimmed() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "  6000\n").unwrap();
        let bytes = load_hex(None, file.path().to_str()).unwrap();
        assert_eq!(bytes, Bytes::from_static(&[0x60, 0x00]));
    }

    #[test]
    fn test_odd_length_is_rejected() {
        assert!(matches!(load_hex(Some("0x123"), None), Err(EvmeError::InvalidInput(_))));
        assert!(load_hex(None, None).unwrap().is_empty());
    }
}
