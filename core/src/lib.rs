//! Line coding and forward error correction for the Fox-1 telemetry downlink
//!
//! 8b/10b channel coding with running disparity, and CCSDS (255,223) Reed-Solomon parity
//! generation over GF(256). A frame is split into contiguous Reed-Solomon codewords whose
//! bytes are interleaved on air, followed by the parity bytes and a K.28.5 comma.

pub mod error;
pub mod gf;
pub mod rs;
pub mod code8b10b;
pub mod framing;
pub mod bits;

pub use code8b10b::{Disparity, LineDecoder, LineEncoder, Symbol};
pub use error::{CodecError, Result};
pub use framing::{DecodedFrame, FrameConfig, FrameDecoder, FrameEncoder};
pub use rs::RsEncoder;

// Reed-Solomon configuration
pub const RS_TOTAL_BYTES: usize = 255;
pub const RS_DATA_BYTES: usize = 223;
pub const RS_PARITY_BYTES: usize = RS_TOTAL_BYTES - RS_DATA_BYTES; // 32
pub const RS_FCR: usize = 112; // first consecutive root, index form
pub const RS_PRIM: usize = 11; // primitive element for the roots

// DUV (200 bps) frame layout
pub const DUV_HEADER_BYTES: usize = 6;
pub const DUV_PAYLOAD_BYTES: usize = 58;

// High-speed (1200 bps BPSK) frame layout
pub const HS_HEADER_BYTES: usize = 8;
pub const HS_PAYLOAD_BYTES: usize = 78;
pub const HS_PAYLOADS: usize = 6;
pub const HS_CODEWORDS: usize = 3;
