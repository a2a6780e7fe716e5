//! Sample/nibble conversions
//!
//! Exact integer arithmetic between decoded sample counts and the codec's
//! native nibble counts. A partial final frame still carries its 2-nibble
//! header.

use crate::{FRAME_HEADER_NIBBLES, NIBBLES_PER_FRAME, SAMPLES_PER_FRAME};

/// Number of nibbles needed to hold `samples` decoded samples.
///
/// Whole frames take 16 nibbles per 14 samples; a trailing partial frame
/// takes its 2 header nibbles plus one nibble per remaining sample.
pub fn samples_to_nibbles(samples: u32) -> u32 {
    let mut nibbles = samples / SAMPLES_PER_FRAME * NIBBLES_PER_FRAME;
    if samples % SAMPLES_PER_FRAME != 0 {
        nibbles += FRAME_HEADER_NIBBLES + samples % SAMPLES_PER_FRAME;
    }
    nibbles
}

/// Number of decoded samples held in `nibbles` nibbles.
///
/// Inverse of [`samples_to_nibbles`] for every nibble count that function
/// can produce. A trailing partial frame contributes its nibble count minus
/// the 2-nibble header.
pub fn nibbles_to_samples(nibbles: u32) -> u32 {
    let whole_frames = nibbles / NIBBLES_PER_FRAME;
    if nibbles % NIBBLES_PER_FRAME != 0 {
        whole_frames * SAMPLES_PER_FRAME + nibbles % NIBBLES_PER_FRAME - FRAME_HEADER_NIBBLES
    } else {
        whole_frames * SAMPLES_PER_FRAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_frames() {
        assert_eq!(samples_to_nibbles(0), 0);
        assert_eq!(samples_to_nibbles(14), 16);
        assert_eq!(samples_to_nibbles(28), 32);
        assert_eq!(nibbles_to_samples(16), 14);
        assert_eq!(nibbles_to_samples(32), 28);
    }

    #[test]
    fn test_partial_frame() {
        // 1 sample = 2 header nibbles + 1 sample nibble
        assert_eq!(samples_to_nibbles(1), 3);
        assert_eq!(samples_to_nibbles(24), 28);
        assert_eq!(nibbles_to_samples(28), 24);
        assert_eq!(nibbles_to_samples(3), 1);
    }

    #[test]
    fn test_roundtrip() {
        // Round-trips for every sample count across several frame boundaries
        for samples in 0..10_000 {
            let nibbles = samples_to_nibbles(samples);
            assert_eq!(
                nibbles_to_samples(nibbles),
                samples,
                "round-trip failed for {} samples ({} nibbles)",
                samples,
                nibbles
            );
        }
    }

    #[test]
    fn test_block_sized_counts() {
        // The container block size is 0x2000 bytes = 0x4000 nibbles
        assert_eq!(nibbles_to_samples(0x4000), 14336);
        assert_eq!(samples_to_nibbles(14336), 0x4000);
    }
}
