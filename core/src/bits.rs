//! Channel symbols as a transmitted bit stream.
//!
//! Symbols go out left to right: bit 9 of each 10-bit word first.

use crate::code8b10b::{complement, SYNC};

/// Bits per channel symbol
pub const SYMBOL_BITS: usize = 10;

/// Frame marker sent ahead of each high-speed frame
pub const HS_SYNC_WORD: u32 = 0b1000111110011010010000101011101;

/// Length of `HS_SYNC_WORD` in bits
pub const HS_SYNC_BITS: usize = 31;

/// The low `len` bits of `word`, most significant first
pub fn word_bits(word: u32, len: usize) -> impl Iterator<Item = bool> {
    (0..len).rev().map(move |i| (word >> i) & 1 == 1)
}

fn bits_value(bits: &[bool]) -> u32 {
    bits.iter().fold(0u32, |acc, &bit| (acc << 1) | bit as u32)
}

pub fn symbols_to_bits(words: &[u16]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(words.len() * SYMBOL_BITS);
    for &word in words {
        bits.extend(word_bits(word as u32, SYMBOL_BITS));
    }
    bits
}

/// Regroup a bit stream into 10-bit symbols; a trailing partial symbol is dropped
pub fn bits_to_symbols(bits: &[bool]) -> Vec<u16> {
    bits.chunks_exact(SYMBOL_BITS)
        .map(|chunk| bits_value(chunk) as u16)
        .collect()
}

/// Bit offset of the first `len`-bit `word` in the stream
pub fn find_sync_word(bits: &[bool], word: u32, len: usize) -> Option<usize> {
    if len == 0 || len > 32 {
        return None;
    }
    let mask = if len == 32 { u32::MAX } else { (1u32 << len) - 1 };
    bits.windows(len)
        .position(|window| bits_value(window) == word & mask)
}

/// A high-speed frame as transmitted: the sync word, then the frame's channel symbols
pub fn high_speed_frame_bits(words: &[u16]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(HS_SYNC_BITS + words.len() * SYMBOL_BITS);
    bits.extend(word_bits(HS_SYNC_WORD, HS_SYNC_BITS));
    bits.extend(symbols_to_bits(words));
    bits
}

/// Bit offset of the first symbol following a high-speed sync word
pub fn find_high_speed_frame(bits: &[bool]) -> Option<usize> {
    find_sync_word(bits, HS_SYNC_WORD, HS_SYNC_BITS).map(|offset| offset + HS_SYNC_BITS)
}

/// Bit offset of the first K.28.5 comma, in either disparity.
///
/// The symbol after the comma starts `SYMBOL_BITS` later, which recovers symbol alignment
/// for a receiver that started listening mid-stream.
pub fn find_comma(bits: &[bool]) -> Option<usize> {
    let commas = [SYNC as u32, complement(SYNC) as u32];
    bits.windows(SYMBOL_BITS)
        .position(|window| commas.contains(&bits_value(window)))
}
