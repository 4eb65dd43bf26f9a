//! Symbology encoders
//!
//! Turn a content string into a module pattern (dark/light, one entry per
//! module). Each symbology enforces its own alphabet and check rules.

use thiserror::Error;

use crate::symbology::BarcodeFormat;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{format} content is empty")]
    Empty { format: BarcodeFormat },

    #[error("{format} expects {expected} digits, got {actual}")]
    InvalidLength {
        format: BarcodeFormat,
        expected: &'static str,
        actual: usize,
    },

    #[error("{format} accepts digits only, found {found:?}")]
    NonDigit { format: BarcodeFormat, found: char },

    #[error("{format} check digit mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        format: BarcodeFormat,
        expected: u8,
        actual: u8,
    },

    #[error("{format} cannot encode character {found:?}")]
    UnsupportedCharacter { format: BarcodeFormat, found: char },
}

/// Linear bar pattern: `true` is a dark module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarPattern {
    modules: Vec<bool>,
}

impl BarPattern {
    fn with_capacity(n: usize) -> Self {
        Self { modules: Vec::with_capacity(n) }
    }

    /// Append runs of alternating color, starting with `dark`.
    fn push_widths(&mut self, widths: &[u8], mut dark: bool) {
        for &w in widths {
            self.modules.extend(std::iter::repeat(dark).take(w as usize));
            dark = !dark;
        }
    }

    fn push_bits(&mut self, bits: &str) {
        self.modules.extend(bits.bytes().map(|b| b == b'1'));
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn modules(&self) -> &[bool] {
        &self.modules
    }
}

pub trait Encoder: Send + Sync {
    fn format(&self) -> BarcodeFormat;
    fn encode(&self, content: &str) -> Result<BarPattern, EncodeError>;
}

pub struct Ean13Encoder;
pub struct UpcAEncoder;
pub struct Code128Encoder;

/// Total over the enumerated formats.
pub fn encoder_for(format: BarcodeFormat) -> &'static dyn Encoder {
    match format {
        BarcodeFormat::Ean13 => &Ean13Encoder,
        BarcodeFormat::UpcA => &UpcAEncoder,
        BarcodeFormat::Code128 => &Code128Encoder,
    }
}

// --- EAN-13 / UPC-A ---

// L-code run widths (space, bar, space, bar); 7 modules each.
// G-codes are these reversed, R-codes are these starting with a bar.
const L_WIDTHS: [[u8; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

/// G-code positions of the six left digits, selected by the leading digit.
const PARITY: [[bool; 6]; 10] = [
    [false, false, false, false, false, false],
    [false, false, true, false, true, true],
    [false, false, true, true, false, true],
    [false, false, true, true, true, false],
    [false, true, false, false, true, true],
    [false, true, true, false, false, true],
    [false, true, true, true, false, false],
    [false, true, false, true, false, true],
    [false, true, false, true, true, false],
    [false, true, true, false, true, false],
];

const EAN_MODULES: usize = 95;

/// Modulo-10 check digit; the rightmost data digit has weight 3.
pub fn check_digit(digits: &[u8]) -> u8 {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| d as u32 * if i % 2 == 0 { 3 } else { 1 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// Parse `data_len` digits and append or verify the check digit.
fn digits_with_check(
    format: BarcodeFormat,
    content: &str,
    data_len: usize,
) -> Result<Vec<u8>, EncodeError> {
    if content.is_empty() {
        return Err(EncodeError::Empty { format });
    }
    if let Some(found) = content.chars().find(|c| !c.is_ascii_digit()) {
        return Err(EncodeError::NonDigit { format, found });
    }

    let mut digits: Vec<u8> = content.bytes().map(|b| b - b'0').collect();
    let expected = check_digit(&digits[..data_len.min(digits.len())]);

    match digits.len() {
        n if n == data_len => digits.push(expected),
        n if n == data_len + 1 => {
            let actual = digits[data_len];
            if actual != expected {
                return Err(EncodeError::ChecksumMismatch { format, expected, actual });
            }
        }
        actual => {
            let expected = if data_len == 12 { "12 or 13" } else { "11 or 12" };
            return Err(EncodeError::InvalidLength { format, expected, actual });
        }
    }

    Ok(digits)
}

fn ean13_pattern(digits: &[u8; 13]) -> BarPattern {
    let mut pattern = BarPattern::with_capacity(EAN_MODULES);
    let parity = PARITY[digits[0] as usize];

    pattern.push_bits("101");
    for (pos, &d) in digits[1..7].iter().enumerate() {
        let widths = L_WIDTHS[d as usize];
        if parity[pos] {
            let mut reversed = widths;
            reversed.reverse();
            pattern.push_widths(&reversed, false);
        } else {
            pattern.push_widths(&widths, false);
        }
    }
    pattern.push_bits("01010");
    for &d in &digits[7..13] {
        pattern.push_widths(&L_WIDTHS[d as usize], true);
    }
    pattern.push_bits("101");

    debug_assert_eq!(pattern.len(), EAN_MODULES);
    pattern
}

impl Encoder for Ean13Encoder {
    fn format(&self) -> BarcodeFormat {
        BarcodeFormat::Ean13
    }

    fn encode(&self, content: &str) -> Result<BarPattern, EncodeError> {
        let digits = digits_with_check(self.format(), content, 12)?;
        let mut full = [0u8; 13];
        full.copy_from_slice(&digits);
        Ok(ean13_pattern(&full))
    }
}

impl Encoder for UpcAEncoder {
    fn format(&self) -> BarcodeFormat {
        BarcodeFormat::UpcA
    }

    /// UPC-A bars are EAN-13 bars with a leading zero.
    fn encode(&self, content: &str) -> Result<BarPattern, EncodeError> {
        let digits = digits_with_check(self.format(), content, 11)?;
        let mut full = [0u8; 13];
        full[1..].copy_from_slice(&digits);
        Ok(ean13_pattern(&full))
    }
}

// --- Code 128 ---

/// Symbol widths 0..=105 (bar, space, bar, space, bar, space); 11 modules each.
const CODE128_WIDTHS: [&str; 106] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312", "132212",
    "221213", "221312", "231212", "112232", "122132", "122231", "113222", "123122", "123221",
    "223211", "221132", "221231", "213212", "223112", "312131", "311222", "321122", "321221",
    "312212", "322112", "322211", "212123", "212321", "232121", "111323", "131123", "131321",
    "112313", "132113", "132311", "211313", "231113", "231311", "112133", "112331", "132131",
    "113123", "113321", "133121", "313121", "211331", "231131", "213113", "213311", "213131",
    "311123", "311321", "331121", "312113", "312311", "332111", "314111", "221411", "431111",
    "111224", "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111", "111242",
    "121142", "121241", "114212", "124112", "124211", "411212", "421112", "421211", "212141",
    "214121", "412121", "111143", "111341", "131141", "114113", "114311", "411113", "411311",
    "113141", "114131", "311141", "411131", "211412", "211214", "211232",
];

const CODE128_STOP: &str = "2331112";
const CODE_C: u8 = 99;
const CODE_B: u8 = 100;
const START_B: u8 = 104;
const START_C: u8 = 105;

/// Symbol values including start and check symbol, excluding stop.
///
/// Code set B covers printable ASCII; digit runs of six or more (four or
/// more at either end) switch to code set C.
pub fn code128_symbols(content: &str) -> Result<Vec<u8>, EncodeError> {
    let format = BarcodeFormat::Code128;
    if content.is_empty() {
        return Err(EncodeError::Empty { format });
    }
    if let Some(found) = content.chars().find(|c| !(' '..='~').contains(c)) {
        return Err(EncodeError::UnsupportedCharacter { format, found });
    }

    let bytes = content.as_bytes();
    let digit_run = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let lead = digit_run(0);
    let mut in_c = lead >= 4 || (lead == bytes.len() && lead % 2 == 0);
    let mut symbols = vec![if in_c { START_C } else { START_B }];

    let mut i = 0;
    while i < bytes.len() {
        if in_c {
            if digit_run(i) >= 2 {
                symbols.push((bytes[i] - b'0') * 10 + (bytes[i + 1] - b'0'));
                i += 2;
            } else {
                symbols.push(CODE_B);
                in_c = false;
            }
            continue;
        }

        let run = digit_run(i);
        if run >= 6 || (run >= 4 && i + run == bytes.len()) {
            if run % 2 == 1 {
                symbols.push(bytes[i] - b' ');
                i += 1;
            }
            symbols.push(CODE_C);
            in_c = true;
        } else {
            symbols.push(bytes[i] - b' ');
            i += 1;
        }
    }

    let weighted: u32 = symbols
        .iter()
        .enumerate()
        .map(|(pos, &v)| v as u32 * (pos.max(1) as u32))
        .sum();
    symbols.push((weighted % 103) as u8);

    Ok(symbols)
}

impl Encoder for Code128Encoder {
    fn format(&self) -> BarcodeFormat {
        BarcodeFormat::Code128
    }

    fn encode(&self, content: &str) -> Result<BarPattern, EncodeError> {
        let symbols = code128_symbols(content)?;
        let mut pattern = BarPattern::with_capacity(symbols.len() * 11 + 13);

        for &symbol in &symbols {
            let widths: Vec<u8> = CODE128_WIDTHS[symbol as usize].bytes().map(|b| b - b'0').collect();
            pattern.push_widths(&widths, true);
        }
        let stop: Vec<u8> = CODE128_STOP.bytes().map(|b| b - b'0').collect();
        pattern.push_widths(&stop, true);

        Ok(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(pattern: &BarPattern, range: std::ops::Range<usize>) -> String {
        pattern.modules()[range]
            .iter()
            .map(|&dark| if dark { '1' } else { '0' })
            .collect()
    }

    #[test]
    fn test_check_digit() {
        assert_eq!(check_digit(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1, 2]), 8);
        assert_eq!(check_digit(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3]), 1);
        assert_eq!(check_digit(&[0, 3, 6, 0, 0, 0, 2, 9, 1, 4, 5]), 2);
    }

    #[test]
    fn test_ean13_structure() {
        let pattern = Ean13Encoder.encode("123456789012").unwrap();
        assert_eq!(pattern.len(), 95);
        assert_eq!(bits(&pattern, 0..3), "101");
        assert_eq!(bits(&pattern, 45..50), "01010");
        assert_eq!(bits(&pattern, 92..95), "101");
        // Leading 1 selects LLGLGG; the first left digit is 2 as an L-code.
        assert_eq!(bits(&pattern, 3..10), "0010011");
        // Third left digit 4 is a G-code.
        assert_eq!(bits(&pattern, 17..24), "0011101");
        // Right-hand check digit 8 as an R-code.
        assert_eq!(bits(&pattern, 85..92), "1001000");
    }

    #[test]
    fn test_ean13_accepts_matching_check_digit() {
        let computed = Ean13Encoder.encode("123456789012").unwrap();
        let explicit = Ean13Encoder.encode("1234567890128").unwrap();
        assert_eq!(computed, explicit);
    }

    #[test]
    fn test_ean13_rejections() {
        assert_eq!(
            Ean13Encoder.encode("1234567890123"),
            Err(EncodeError::ChecksumMismatch {
                format: BarcodeFormat::Ean13,
                expected: 8,
                actual: 3
            })
        );
        assert!(matches!(
            Ean13Encoder.encode("12345"),
            Err(EncodeError::InvalidLength { actual: 5, .. })
        ));
        assert!(matches!(
            Ean13Encoder.encode("12345678901A"),
            Err(EncodeError::NonDigit { found: 'A', .. })
        ));
        assert!(matches!(Ean13Encoder.encode(""), Err(EncodeError::Empty { .. })));
    }

    #[test]
    fn test_upca_matches_ean13_with_leading_zero() {
        let upc = UpcAEncoder.encode("036000291452").unwrap();
        let ean = Ean13Encoder.encode("0036000291452").unwrap();
        assert_eq!(upc, ean);
        assert_eq!(UpcAEncoder.encode("03600029145").unwrap(), upc);
    }

    #[test]
    fn test_code128_set_b() {
        assert_eq!(
            code128_symbols("PJJ123C").unwrap(),
            vec![104, 48, 42, 42, 17, 18, 19, 35, 55]
        );
    }

    #[test]
    fn test_code128_set_c_and_switch() {
        assert_eq!(code128_symbols("123456").unwrap(), vec![105, 12, 34, 56, 44]);
        assert_eq!(
            code128_symbols("AB12345678").unwrap(),
            vec![104, 33, 34, 99, 12, 34, 56, 78, 57]
        );
    }

    #[test]
    fn test_code128_odd_leading_run_falls_back_to_b() {
        let symbols = code128_symbols("12345").unwrap();
        assert_eq!(&symbols[..4], &[105, 12, 34, CODE_B]);
        assert_eq!(symbols[4], b'5' - b' ');
    }

    #[test]
    fn test_code128_pattern_length() {
        let pattern = Code128Encoder.encode("123456").unwrap();
        assert_eq!(pattern.len(), 5 * 11 + 13);
        assert!(pattern.modules()[0]);
        assert!(pattern.modules()[pattern.len() - 1]);
    }

    #[test]
    fn test_code128_rejects_non_printable() {
        assert!(matches!(
            Code128Encoder.encode("A\tB"),
            Err(EncodeError::UnsupportedCharacter { found: '\t', .. })
        ));
        assert!(matches!(Code128Encoder.encode("é"), Err(EncodeError::UnsupportedCharacter { .. })));
    }

    #[test]
    fn test_encoder_for_is_total() {
        for format in BarcodeFormat::ALL {
            assert_eq!(encoder_for(format).format(), format);
        }
    }
}
