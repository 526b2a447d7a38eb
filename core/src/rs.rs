use crate::gf::{alpha_to, index_of, modnn, A0};
use crate::RS_PARITY_BYTES;

/// Generator polynomial coefficients G0..G16 in index form.
///
/// The CCSDS generator is palindromic (G0 = G32, G1 = G31, ...), so only half of it is
/// stored; G16 is the single unpaired coefficient.
const CCSDS_POLY: [u8; RS_PARITY_BYTES / 2 + 1] = [
    0, 249, 59, 66, 4, 43, 126, 251, 97, 30, 3, 213, 50, 66, 170, 5, 24,
];

/// Shift one data byte through a Reed-Solomon parity register.
///
/// The register must be zeroed before the first byte of each codeword. After the last data
/// byte it holds the parities in transmission order, starting with `parity[0]`.
pub fn update_parity(parity: &mut [u8; RS_PARITY_BYTES], byte: u8) {
    let feedback = index_of(byte ^ parity[0]);

    if feedback != A0 {
        let half = RS_PARITY_BYTES / 2;
        for j in 1..half {
            let t = alpha_to(modnn(feedback as usize + CCSDS_POLY[j] as usize));
            parity[j] ^= t;
            parity[RS_PARITY_BYTES - j] ^= t;
        }
        parity[half] ^= alpha_to(modnn(feedback as usize + CCSDS_POLY[half] as usize));
    }

    parity.copy_within(1.., 0);
    // G0 is alpha^0, so the feedback term needs no multiply; alpha_to[A0] is zero
    parity[RS_PARITY_BYTES - 1] = alpha_to(feedback as usize);
}

/// Systematic (255,223) CCSDS Reed-Solomon parity generator.
///
/// Shortened codewords need no special handling: leading zero data bytes leave the register
/// untouched, so only the transmitted bytes are fed in.
#[derive(Debug, Clone, Default)]
pub struct RsEncoder {
    parity: [u8; RS_PARITY_BYTES],
}

impl RsEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the parity register before a new codeword
    pub fn reset(&mut self) {
        self.parity = [0; RS_PARITY_BYTES];
    }

    pub fn update(&mut self, byte: u8) {
        update_parity(&mut self.parity, byte);
    }

    /// Current register contents
    pub fn parity(&self) -> &[u8; RS_PARITY_BYTES] {
        &self.parity
    }

    /// Take the parity block of the finished codeword and reset for the next one
    pub fn finalize(&mut self) -> [u8; RS_PARITY_BYTES] {
        std::mem::take(&mut self.parity)
    }

    /// Parity of a complete codeword, independent of any register state
    pub fn encode(data: &[u8]) -> [u8; RS_PARITY_BYTES] {
        let mut encoder = Self::new();
        for &byte in data {
            encoder.update(byte);
        }
        encoder.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gf::{mul, NN};
    use crate::{RS_FCR, RS_PRIM};

    /// Evaluate data || parity at every generator root
    fn syndromes(data: &[u8], parity: &[u8]) -> Vec<u8> {
        (0..RS_PARITY_BYTES)
            .map(|i| {
                let root = alpha_to((RS_PRIM * (RS_FCR + i)) % NN);
                data.iter()
                    .chain(parity.iter())
                    .fold(0u8, |acc, &c| mul(acc, root) ^ c)
            })
            .collect()
    }

    #[test]
    fn test_zero_input_gives_zero_parity() {
        let parity = RsEncoder::encode(&[0u8; 223]);
        assert_eq!(parity, [0u8; RS_PARITY_BYTES]);
    }

    #[test]
    fn test_unit_input_gives_generator() {
        // x^32 mod g(x) = g(x) - x^32, i.e. G31..G0 in alpha form
        let parity = RsEncoder::encode(&[0x01]);
        assert_eq!(parity[RS_PARITY_BYTES - 1], 1);
        for i in 0..RS_PARITY_BYTES - 1 {
            assert_eq!(parity[i], parity[RS_PARITY_BYTES - 2 - i], "coefficient {}", i);
        }
        assert_eq!(
            parity,
            [
                91, 127, 86, 16, 30, 13, 235, 97, 165, 8, 42, 54, 86, 171, 32, 113, 32, 171, 86,
                54, 42, 8, 165, 97, 235, 13, 30, 16, 86, 127, 91, 1,
            ]
        );
    }

    #[test]
    fn test_known_codeword() {
        let data: Vec<u8> = (0..64).collect();
        let parity = RsEncoder::encode(&data);
        assert_eq!(
            parity,
            [
                38, 107, 137, 0, 1, 79, 226, 232, 92, 101, 206, 252, 254, 66, 48, 217, 57, 4, 200,
                192, 43, 221, 158, 63, 187, 58, 124, 75, 5, 219, 41, 206,
            ]
        );
    }

    #[test]
    fn test_codewords_have_zero_syndromes() {
        let header = [0x05, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00];
        let full: Vec<u8> = (0..223).map(|i| (i * 7 + 3) as u8).collect();

        for data in [&header[..], &full[..], &[0xffu8; 17][..]] {
            let parity = RsEncoder::encode(data);
            assert!(syndromes(data, &parity).iter().all(|&s| s == 0));
        }
    }

    #[test]
    fn test_leading_zeros_do_not_change_parity() {
        let data = [0x05, 0x00, 0x7e, 0x03, 0xe6, 0x01];
        let mut padded = vec![0u8; 100];
        padded.extend_from_slice(&data);

        assert_eq!(RsEncoder::encode(&data), RsEncoder::encode(&padded));
    }

    #[test]
    fn test_finalize_resets_register() {
        let data = [0x05, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00];
        let mut encoder = RsEncoder::new();

        for &byte in &data {
            encoder.update(byte);
        }
        let first = encoder.finalize();
        assert_eq!(encoder.parity(), &[0u8; RS_PARITY_BYTES]);

        for &byte in &data {
            encoder.update(byte);
        }
        assert_eq!(encoder.finalize(), first);
        assert_eq!(first[0], 0x33);
        assert_eq!(first[RS_PARITY_BYTES - 1], 0x30);
    }

    #[test]
    fn test_reset_discards_partial_codeword() {
        let mut encoder = RsEncoder::new();
        encoder.update(0xaa);
        encoder.update(0x55);
        encoder.reset();
        encoder.update(0x01);
        assert_eq!(encoder.finalize(), RsEncoder::encode(&[0x01]));
    }
}
