//! Elias-Fano encoding of a single sorted, duplicate-free neighbor list
//! (§4.E compressed back-end), ported from the reference implementation's
//! `EliasFanoEncoder`. High bits are a unary bitmap over `value >> low_width`;
//! low bits are packed at a fixed width chosen from the universe/count ratio.
//! Encoded count is capped at 255 elements, matching the source.

/// Maximum neighbor-list length this encoding supports.
pub const MAX_ELEMENTS: usize = u8::MAX as usize;

/// A single Elias-Fano encoded sorted `u32` sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EliasFano {
    high_bits: Vec<u64>,
    low_bits: Vec<u64>,
    num_elements: u8,
    low_bits_width: u8,
}

fn set_bit(words: &mut [u64], pos: usize) {
    words[pos >> 6] |= 1u64 << (pos & 63);
}

impl EliasFano {
    /// Number of elements encoded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.num_elements as usize
    }

    /// True if the encoded list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_elements == 0
    }

    /// Approximate size in bytes of the encoded representation (§4.J wire size).
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.high_bits.len() * 8 + self.low_bits.len() * 8 + 2
    }

    fn set_low_bits(&mut self, index: usize, value: u32) {
        if self.low_bits_width == 0 {
            return;
        }
        let width = self.low_bits_width as usize;
        let bit_pos = index * width;
        let word_pos = bit_pos >> 6;
        let shift = bit_pos & 63;
        let mask = ((1u64 << width) - 1) << shift;
        self.low_bits[word_pos] = (self.low_bits[word_pos] & !mask) | (u64::from(value) << shift);

        if shift + width > 64 && word_pos + 1 < self.low_bits.len() {
            let remaining = shift + width - 64;
            let mask = (1u64 << remaining) - 1;
            self.low_bits[word_pos + 1] = (self.low_bits[word_pos + 1] & !mask)
                | (u64::from(value) >> (width - remaining));
        }
    }

    fn get_low_bits(&self, index: usize) -> u32 {
        if self.low_bits_width == 0 {
            return 0;
        }
        let width = self.low_bits_width as usize;
        let bit_pos = index * width;
        let word_pos = bit_pos >> 6;
        let shift = bit_pos & 63;
        let mut value = ((self.low_bits[word_pos] >> shift) & ((1u64 << width) - 1)) as u32;

        if shift + width > 64 && word_pos + 1 < self.low_bits.len() {
            let remaining = shift + width - 64;
            let mask = (1u64 << remaining) - 1;
            value |= ((self.low_bits[word_pos + 1] & mask) as u32) << (width - remaining);
        }
        value
    }

    /// Encode a sorted, duplicate-free `u32` sequence. `max_value` is the
    /// largest value that can appear (the graph's vertex-count universe bound).
    ///
    /// # Panics
    /// Panics if `values.len() > MAX_ELEMENTS` (255) — callers must cap degree
    /// to this encoding's limit before calling, the same contract the source enforces.
    #[must_use]
    pub fn encode(values: &[u32], max_value: u32) -> Self {
        assert!(
            values.len() <= MAX_ELEMENTS,
            "Elias-Fano neighbor list exceeds {MAX_ELEMENTS} elements"
        );
        if values.is_empty() {
            return Self::default();
        }

        let num_elements = values.len() as u8;
        let universe = u64::from(max_value) + 1;
        let low_bits_width = ((universe as f64) / f64::from(num_elements))
            .log2()
            .floor()
            .max(0.0) as u8;

        let high_bits_count =
            (max_value >> low_bits_width) as usize + num_elements as usize + 1;
        let mut high_bits = vec![0u64; (high_bits_count + 63) / 64];

        let total_low_bits = num_elements as usize * low_bits_width as usize;
        let mut low_bits = vec![0u64; ((total_low_bits + 63) / 64).max(1)];

        let mut ef = Self {
            high_bits: std::mem::take(&mut high_bits),
            low_bits: std::mem::take(&mut low_bits),
            num_elements,
            low_bits_width,
        };

        for (i, &x) in values.iter().enumerate() {
            let high = x >> low_bits_width;
            let low = if low_bits_width == 0 {
                0
            } else {
                x & ((1u32 << low_bits_width) - 1)
            };
            set_bit(&mut ef.high_bits, i + high as usize);
            ef.set_low_bits(i, low);
        }

        ef
    }

    /// Decode the original sorted sequence exactly.
    #[must_use]
    pub fn decode(&self) -> Vec<u32> {
        let mut result = Vec::with_capacity(self.num_elements as usize);
        let mut count = 0usize;
        for (i, &word) in self.high_bits.iter().enumerate() {
            let mut word = word;
            while word != 0 && count < self.num_elements as usize {
                let bit = word.trailing_zeros() as usize;
                let high = (i * 64 + bit) - count;
                let low = self.get_low_bits(count);
                result.push(((high as u32) << self.low_bits_width) | low);
                count += 1;
                word &= word - 1;
            }
            if count >= self.num_elements as usize {
                break;
            }
        }
        result
    }
}
