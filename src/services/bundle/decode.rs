use crate::types::errors::UpdResult;
use encoding_rs::WINDOWS_1251;
use std::fs;
use std::path::Path;

/// Windows-1251 to Unicode. Total: every byte maps to a code point.
pub fn decode_cp1251(bytes: &[u8]) -> String {
    let (text, _had_errors) = WINDOWS_1251.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Read a payload file through the Windows-1251 code page.
pub fn read_cp1251(path: &Path) -> UpdResult<String> {
    let bytes = fs::read(path)?;
    Ok(decode_cp1251(&bytes))
}
