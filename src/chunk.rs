//! Fixed-size native sample chunk filled by one device fetch.

use crate::MicStreamError;

/// Number of frames delivered by one device fetch.
///
/// Matches the block size most downstream buffers append in, so a reader
/// pulling `CHUNK_SIZE` pairs at a time never straddles two fetches.
pub const CHUNK_SIZE: usize = 512;

/// Channel layout of an input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// One input channel, duplicated into both output channels.
    Mono,
    /// Two input channels, mapped to left and right.
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of native channels.
    #[must_use]
    pub fn count(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

impl TryFrom<u16> for ChannelLayout {
    type Error = MicStreamError;

    fn try_from(channels: u16) -> Result<Self, Self::Error> {
        match channels {
            1 => Ok(Self::Mono),
            2 => Ok(Self::Stereo),
            channels => Err(MicStreamError::InvalidChannelCount { channels }),
        }
    }
}

impl From<ChannelLayout> for u16 {
    fn from(layout: ChannelLayout) -> Self {
        match layout {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

/// One buffer of [`CHUNK_SIZE`] f32 samples per input channel.
///
/// Overwritten in place by every fetch.
#[derive(Debug, Clone)]
pub struct Chunk {
    layout: ChannelLayout,
    channels: Vec<[f32; CHUNK_SIZE]>,
}

impl Chunk {
    /// Creates a silent chunk for the given layout.
    #[must_use]
    pub fn new(layout: ChannelLayout) -> Self {
        Self {
            layout,
            channels: vec![[0.0; CHUNK_SIZE]; layout.count()],
        }
    }

    /// Returns the channel layout.
    #[must_use]
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Returns the samples of one channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is not below the layout's channel count.
    #[must_use]
    pub fn channel(&self, channel: usize) -> &[f32; CHUNK_SIZE] {
        &self.channels[channel]
    }

    /// Returns the samples of one channel for writing.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is not below the layout's channel count.
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32; CHUNK_SIZE] {
        &mut self.channels[channel]
    }

    /// Splits `CHUNK_SIZE` interleaved frames into the per-channel buffers.
    pub(crate) fn fill_interleaved(&mut self, interleaved: &[f32]) {
        let stride = self.channels.len();
        for (frame_idx, frame) in interleaved.chunks_exact(stride).take(CHUNK_SIZE).enumerate() {
            for (channel, &sample) in self.channels.iter_mut().zip(frame) {
                channel[frame_idx] = sample;
            }
        }
    }

    /// Widens one column into a stereo pair.
    ///
    /// Mono input is duplicated into both outputs.
    #[inline]
    #[must_use]
    pub fn pair(&self, idx: usize) -> [f64; 2] {
        match self.layout {
            ChannelLayout::Mono => {
                let s = f64::from(self.channels[0][idx]);
                [s, s]
            }
            ChannelLayout::Stereo => [
                f64::from(self.channels[0][idx]),
                f64::from(self.channels[1][idx]),
            ],
        }
    }

    /// Writes columns `start..start + dest.len()` into `dest`.
    pub(crate) fn copy_pairs(&self, start: usize, dest: &mut [[f64; 2]]) {
        for (offset, out) in dest.iter_mut().enumerate() {
            *out = self.pair(start + offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_from_channel_count() {
        assert_eq!(ChannelLayout::try_from(1u16).unwrap(), ChannelLayout::Mono);
        assert_eq!(ChannelLayout::try_from(2u16).unwrap(), ChannelLayout::Stereo);
        assert_eq!(
            ChannelLayout::try_from(0u16).unwrap_err(),
            MicStreamError::InvalidChannelCount { channels: 0 }
        );
        assert_eq!(
            ChannelLayout::try_from(3u16).unwrap_err(),
            MicStreamError::InvalidChannelCount { channels: 3 }
        );
    }

    #[test]
    fn test_new_chunk_allocates_one_buffer_per_channel() {
        assert_eq!(Chunk::new(ChannelLayout::Mono).channels.len(), 1);
        assert_eq!(Chunk::new(ChannelLayout::Stereo).channels.len(), 2);
    }

    #[test]
    fn test_mono_pair_duplicates_channel() {
        let mut chunk = Chunk::new(ChannelLayout::Mono);
        chunk.channel_mut(0)[7] = 0.25;
        assert_eq!(chunk.pair(7), [0.25, 0.25]);
    }

    #[test]
    fn test_stereo_pair_maps_left_right() {
        let mut chunk = Chunk::new(ChannelLayout::Stereo);
        chunk.channel_mut(0)[3] = 0.5;
        chunk.channel_mut(1)[3] = -0.5;
        assert_eq!(chunk.pair(3), [0.5, -0.5]);
    }

    #[test]
    fn test_fill_interleaved_splits_channels() {
        let mut chunk = Chunk::new(ChannelLayout::Stereo);
        let interleaved: Vec<f32> = (0..CHUNK_SIZE)
            .flat_map(|i| [i as f32, -(i as f32)])
            .collect();
        chunk.fill_interleaved(&interleaved);

        assert_eq!(chunk.channel(0)[0], 0.0);
        assert_eq!(chunk.channel(0)[511], 511.0);
        assert_eq!(chunk.channel(1)[511], -511.0);
    }

    #[test]
    fn test_copy_pairs_from_offset() {
        let mut chunk = Chunk::new(ChannelLayout::Mono);
        for (i, s) in chunk.channel_mut(0).iter_mut().enumerate() {
            *s = i as f32;
        }
        let mut dest = [[0.0; 2]; 3];
        chunk.copy_pairs(10, &mut dest);
        assert_eq!(dest, [[10.0, 10.0], [11.0, 11.0], [12.0, 12.0]]);
    }
}
