use super::decode::{Decoder, Error, Item};
use super::value::Value;

/// Pull iterator over the items inside a container.
///
/// Yields decoded items until a break marker, which is consumed and ends the sequence. Running
/// out of data is an error, not an end. Definite-length containers bound this with
/// [`take`](super::seq::take) and treat an early end as a stray break.
pub(super) struct Items<'d, 'a> {
    decoder: &'d mut Decoder<'a>,
    depth: usize,
    chunk_major: Option<u8>,
    done: bool,
}

impl<'d, 'a> Items<'d, 'a> {
    pub(super) fn new(decoder: &'d mut Decoder<'a>, depth: usize) -> Self {
        Self {
            decoder,
            depth,
            chunk_major: None,
            done: false,
        }
    }

    /// The chunks of an indefinite-length string: each must be a definite-length string of
    /// the same major type.
    pub(super) fn chunks(decoder: &'d mut Decoder<'a>, major: u8, depth: usize) -> Self {
        Self {
            chunk_major: Some(major),
            ..Self::new(decoder, depth)
        }
    }

    fn check_chunk(&self) -> Result<(), Error> {
        match (self.chunk_major, self.decoder.peek()) {
            (None, _) | (_, None) | (_, Some(0xFF)) => Ok(()),
            (Some(major), Some(header)) if header >> 5 == major && header & 0x1F != 31 => Ok(()),
            _ => Err(Error::InvalidChunk),
        }
    }
}

impl Iterator for Items<'_, '_> {
    type Item = Result<Value, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self
            .check_chunk()
            .and_then(|_| self.decoder.parse_item(self.depth));
        match item {
            Ok(Item::Value(value)) => Some(Ok(value)),
            Ok(Item::Break) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl core::iter::FusedIterator for Items<'_, '_> {}
