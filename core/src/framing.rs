use log::debug;

use crate::code8b10b::{end_of_frame_disparity, Disparity, LineDecoder, LineEncoder, Symbol};
use crate::error::{CodecError, Result};
use crate::rs::RsEncoder;
use crate::{
    DUV_HEADER_BYTES, DUV_PAYLOAD_BYTES, HS_CODEWORDS, HS_HEADER_BYTES, HS_PAYLOADS,
    HS_PAYLOAD_BYTES, RS_DATA_BYTES, RS_PARITY_BYTES,
};

/// Layout of one telemetry frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Data bytes per frame, header included
    pub data_len: usize,
    /// Number of Reed-Solomon codewords the data is split across
    pub codewords: usize,
}

impl FrameConfig {
    /// Low-rate DUV frame: 6-byte header + 58-byte payload in one codeword
    pub fn duv() -> Self {
        Self {
            data_len: DUV_HEADER_BYTES + DUV_PAYLOAD_BYTES,
            codewords: 1,
        }
    }

    /// High-speed frame: 8-byte header + six 78-byte payloads.
    ///
    /// The 476 bytes fill three codewords of 159, 159 and 158 bytes, which are interleaved
    /// on air.
    pub fn high_speed() -> Self {
        Self {
            data_len: HS_HEADER_BYTES + HS_PAYLOADS * HS_PAYLOAD_BYTES,
            codewords: HS_CODEWORDS,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_len == 0 {
            return Err(CodecError::InvalidConfig(
                "frame must carry at least one data byte".to_string(),
            ));
        }
        if self.codewords == 0 || self.codewords > self.data_len {
            return Err(CodecError::InvalidConfig(format!(
                "{} codewords cannot share {} data bytes",
                self.codewords, self.data_len
            )));
        }
        if (self.codewords - 1) * self.codeword_len() >= self.data_len {
            return Err(CodecError::InvalidConfig(format!(
                "{} data bytes leave the last of {} codewords empty",
                self.data_len, self.codewords
            )));
        }
        if self.codeword_len() > RS_DATA_BYTES {
            return Err(CodecError::InvalidConfig(format!(
                "{} data bytes exceed {} codewords of {} bytes",
                self.data_len, self.codewords, RS_DATA_BYTES
            )));
        }
        Ok(())
    }

    /// Data bytes per codeword; only the last codeword may be shorter
    pub fn codeword_len(&self) -> usize {
        self.data_len.div_ceil(self.codewords)
    }

    /// Logical index of each data byte, in the order the bytes go on air.
    ///
    /// Codeword `j` holds the contiguous bytes `j * codeword_len()..`, and the codewords are
    /// sent column by column: byte 0 of every codeword, then byte 1 of every codeword, and so
    /// on. Positions past the end of a short last codeword are skipped.
    pub fn transmit_order(&self) -> impl Iterator<Item = usize> {
        let (len, codewords, data_len) = (self.codeword_len(), self.codewords, self.data_len);
        (0..len)
            .flat_map(move |i| (0..codewords).map(move |j| j * len + i))
            .filter(move |&k| k < data_len)
    }

    /// Parity bytes per frame
    pub fn parity_len(&self) -> usize {
        RS_PARITY_BYTES * self.codewords
    }

    /// Channel symbols per frame, end-of-frame comma included
    pub fn frame_len(&self) -> usize {
        self.data_len + self.parity_len() + 1
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self::duv()
    }
}

/// Assembles telemetry frames into 8b/10b channel symbols.
///
/// `encode_frame` takes the frame in logical order (header, then payloads). The bytes are
/// split into contiguous codewords and sent in `FrameConfig::transmit_order`. After the
/// data, parity byte `i` of every codeword is sent in turn, then the end-of-frame comma.
/// Parity registers restart with each frame; the running disparity carries over to the
/// next one.
pub struct FrameEncoder {
    config: FrameConfig,
    line: LineEncoder,
    rs: Vec<RsEncoder>,
}

impl FrameEncoder {
    pub fn new(config: FrameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            line: LineEncoder::new(),
            rs: vec![RsEncoder::new(); config.codewords],
        })
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn disparity(&self) -> Disparity {
        self.line.disparity()
    }

    /// Abort any partial frame and restart the stream at `disparity`
    pub fn resync(&mut self, disparity: Disparity) {
        self.rs.iter_mut().for_each(RsEncoder::reset);
        self.line.resync(disparity);
    }

    pub fn encode_frame(&mut self, data: &[u8]) -> Result<Vec<u16>> {
        if data.len() != self.config.data_len {
            return Err(CodecError::InvalidFrameSize {
                expected: self.config.data_len,
                actual: data.len(),
            });
        }

        for (rs, codeword) in self.rs.iter_mut().zip(data.chunks(self.config.codeword_len())) {
            codeword.iter().for_each(|&byte| rs.update(byte));
        }

        let mut words = Vec::with_capacity(self.config.frame_len());
        for k in self.config.transmit_order() {
            words.push(self.line.encode(data[k]));
        }

        let parities: Vec<[u8; RS_PARITY_BYTES]> =
            self.rs.iter_mut().map(RsEncoder::finalize).collect();
        for i in 0..RS_PARITY_BYTES {
            for parity in &parities {
                words.push(self.line.encode(parity[i]));
            }
        }

        words.push(self.line.end_of_frame());

        debug!(
            "encoded frame: {} data bytes, {} codewords, {} symbols, ending {}",
            data.len(),
            self.config.codewords,
            words.len(),
            self.line.disparity()
        );
        Ok(words)
    }
}

/// Data and parity bytes recovered from one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Frame bytes in logical order, as passed to `FrameEncoder::encode_frame`
    pub data: Vec<u8>,
    /// Parity bytes in transmission order (interleaved across codewords)
    pub parity: Vec<u8>,
}

/// Splits received channel symbols back into frames.
///
/// Reed-Solomon errors are detected, not corrected: parity is recomputed from the received
/// data and compared per codeword.
///
/// A bad frame is still read through to its end-of-frame comma before the first error is
/// returned, so the running disparity is right for the frame that follows.
pub struct FrameDecoder {
    config: FrameConfig,
    line: LineDecoder,
}

impl FrameDecoder {
    pub fn new(config: FrameConfig) -> Result<Self> {
        Self::with_polarity(config, false)
    }

    pub fn with_polarity(config: FrameConfig, inverted: bool) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            line: LineDecoder::with_polarity(inverted),
        })
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn disparity(&self) -> Disparity {
        self.line.disparity()
    }

    pub fn resync(&mut self, disparity: Disparity) {
        self.line.resync(disparity);
    }

    pub fn decode_frame(&mut self, words: &[u16]) -> Result<DecodedFrame> {
        let frame_len = self.config.frame_len();
        if words.len() != frame_len {
            return Err(CodecError::InvalidFrameSize {
                expected: frame_len,
                actual: words.len(),
            });
        }

        let (body, terminator) = words.split_at(frame_len - 1);
        let mut bytes = Vec::with_capacity(body.len());
        let mut first_error = None;
        for (position, &word) in body.iter().enumerate() {
            match self.line.decode(word) {
                Ok(Symbol::Data(byte)) => bytes.push(byte),
                Ok(Symbol::EndOfFrame) => {
                    first_error.get_or_insert(CodecError::UnexpectedEndOfFrame { position });
                }
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        let end = self.line.decode(terminator[0]);
        if let Some(err) = first_error {
            debug!("dropping frame: {}", err);
            return Err(err);
        }
        match end {
            Ok(Symbol::EndOfFrame) => {}
            Err(CodecError::DisparityMismatch { word, expected })
                if end_of_frame_disparity(word).is_some() =>
            {
                return Err(CodecError::DisparityMismatch { word, expected });
            }
            _ => return Err(CodecError::MissingEndOfFrame),
        }

        let parity = bytes.split_off(self.config.data_len);
        let mut data = vec![0u8; self.config.data_len];
        for (k, &byte) in self.config.transmit_order().zip(&bytes) {
            data[k] = byte;
        }

        let codewords = self.config.codewords;
        for (codeword, chunk) in data.chunks(self.config.codeword_len()).enumerate() {
            let expected = RsEncoder::encode(chunk);
            let received = parity.iter().skip(codeword).step_by(codewords);
            if !expected.iter().eq(received) {
                debug!("parity check failed for codeword {}", codeword);
                return Err(CodecError::ParityMismatch { codeword });
            }
        }

        Ok(DecodedFrame { data, parity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let duv = FrameConfig::duv();
        assert_eq!(duv.data_len, 64);
        assert_eq!(duv.frame_len(), 64 + 32 + 1);
        assert_eq!(FrameConfig::default(), duv);

        let hs = FrameConfig::high_speed();
        assert_eq!(hs.data_len, 476);
        assert_eq!(hs.parity_len(), 96);
        assert_eq!(hs.frame_len(), 476 + 96 + 1);

        assert!(duv.validate().is_ok());
        assert!(hs.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let bad = [
            FrameConfig { data_len: 0, codewords: 1 },
            FrameConfig { data_len: 64, codewords: 0 },
            FrameConfig { data_len: 2, codewords: 3 },
            FrameConfig { data_len: 224, codewords: 1 },
            FrameConfig { data_len: 670, codewords: 3 },
            FrameConfig { data_len: 6, codewords: 4 },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(CodecError::InvalidConfig(_))),
                "{:?} should be rejected",
                config
            );
            assert!(FrameEncoder::new(config).is_err());
        }

        assert!(FrameConfig { data_len: 223, codewords: 1 }.validate().is_ok());
        assert!(FrameConfig { data_len: 669, codewords: 3 }.validate().is_ok());
    }

    #[test]
    fn test_encoder_rejects_wrong_data_size() {
        let mut encoder = FrameEncoder::new(FrameConfig::duv()).unwrap();
        match encoder.encode_frame(&[0u8; 63]) {
            Err(CodecError::InvalidFrameSize { expected: 64, actual: 63 }) => {}
            other => panic!("Expected InvalidFrameSize, got {:?}", other),
        }
    }

    #[test]
    fn test_single_codeword_layout() {
        let config = FrameConfig { data_len: 8, codewords: 1 };
        let header = [0x05, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00];
        let mut encoder = FrameEncoder::new(config).unwrap();
        let words = encoder.encode_frame(&header).unwrap();

        assert_eq!(words.len(), config.frame_len());
        assert_eq!(
            &words[..8],
            &[0x29b, 0x18b, 0x18b, 0x18b, 0x18b, 0x24b, 0x18b, 0x18b]
        );

        let mut decoder = FrameDecoder::new(config).unwrap();
        let frame = decoder.decode_frame(&words).unwrap();
        assert_eq!(frame.data, header);
        assert_eq!(&frame.parity[..], &RsEncoder::encode(&header)[..]);
        assert_eq!(decoder.disparity(), encoder.disparity());
    }

    #[test]
    fn test_transmit_order() {
        let hs = FrameConfig::high_speed();
        assert_eq!(hs.codeword_len(), 159);

        let order: Vec<usize> = hs.transmit_order().collect();
        assert_eq!(order.len(), hs.data_len);
        assert_eq!(&order[..6], &[0, 159, 318, 1, 160, 319]);
        assert_eq!(&order[order.len() - 4..], &[316, 475, 158, 317]);

        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert!(sorted.iter().copied().eq(0..hs.data_len));

        let duv = FrameConfig::duv();
        assert!(duv.transmit_order().eq(0..duv.data_len));

        let short = FrameConfig { data_len: 5, codewords: 3 };
        assert_eq!(short.transmit_order().collect::<Vec<_>>(), vec![0, 2, 4, 1, 3]);
    }

    #[test]
    fn test_codewords_are_interleaved() {
        let config = FrameConfig { data_len: 6, codewords: 3 };
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut encoder = FrameEncoder::new(config).unwrap();
        let words = encoder.encode_frame(&data).unwrap();

        let mut line = LineDecoder::new();
        let on_air: Vec<Symbol> = words[..6].iter().map(|&w| line.decode(w).unwrap()).collect();
        let expected: Vec<Symbol> = [1, 3, 5, 2, 4, 6].into_iter().map(Symbol::Data).collect();
        assert_eq!(on_air, expected);

        let mut decoder = FrameDecoder::new(config).unwrap();
        let frame = decoder.decode_frame(&words).unwrap();
        assert_eq!(frame.data, data);

        let p0 = RsEncoder::encode(&[1, 2]);
        let p1 = RsEncoder::encode(&[3, 4]);
        let p2 = RsEncoder::encode(&[5, 6]);
        assert_eq!(&frame.parity[..3], &[p0[0], p1[0], p2[0]]);
        assert_eq!(&frame.parity[93..], &[p0[31], p1[31], p2[31]]);
    }

    #[test]
    fn test_short_last_codeword() {
        let config = FrameConfig { data_len: 5, codewords: 3 };
        let data = [10u8, 20, 30, 40, 50];
        let mut encoder = FrameEncoder::new(config).unwrap();
        let words = encoder.encode_frame(&data).unwrap();
        assert_eq!(words.len(), 5 + 96 + 1);

        let mut decoder = FrameDecoder::new(config).unwrap();
        let frame = decoder.decode_frame(&words).unwrap();
        assert_eq!(frame.data, data);
        assert_eq!(frame.parity[2], RsEncoder::encode(&[50])[0]);
    }

    #[test]
    fn test_bad_frame_is_read_to_its_end() {
        let config = FrameConfig::duv();
        let data: Vec<u8> = (0..64).map(|i: u8| i.wrapping_mul(29)).collect();
        let mut encoder = FrameEncoder::new(config).unwrap();
        let mut words = encoder.encode_frame(&data).unwrap();
        let end = encoder.disparity();
        words[20] = 0x270;

        let mut decoder = FrameDecoder::new(config).unwrap();
        assert_eq!(
            decoder.decode_frame(&words),
            Err(CodecError::UnrecognizedSymbol { word: 0x270 })
        );
        assert_eq!(decoder.disparity(), end);
    }

    #[test]
    fn test_decoder_rejects_wrong_length() {
        let mut decoder = FrameDecoder::new(FrameConfig::duv()).unwrap();
        match decoder.decode_frame(&[0x274; 10]) {
            Err(CodecError::InvalidFrameSize { expected: 97, actual: 10 }) => {}
            other => panic!("Expected InvalidFrameSize, got {:?}", other),
        }
    }
}
