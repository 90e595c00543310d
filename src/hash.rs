use bytes::Buf;
use sha2::{Digest, Sha256};

const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Incremental Dropbox content hash.
///
/// Content is split into 4 MiB blocks, each block is hashed with SHA-256 and
/// the concatenation of the block digests is hashed again.
#[derive(Clone, Debug, Default)]
pub struct ContentHash {
    overall: Sha256,
    block: Sha256,
    block_len: usize,
}

impl ContentHash {
    pub fn new() -> ContentHash {
        ContentHash::default()
    }

    pub fn update(&mut self, mut data: impl Buf) {
        while data.has_remaining() {
            let chunk = data.chunk();
            let take = std::cmp::min(chunk.len(), BLOCK_SIZE - self.block_len);

            self.block.update(&chunk[..take]);
            self.block_len += take;
            data.advance(take);

            if self.block_len == BLOCK_SIZE {
                self.finish_block();
            }
        }
    }

    fn finish_block(&mut self) {
        let digest = std::mem::take(&mut self.block).finalize();
        self.overall.update(digest);
        self.block_len = 0;
    }

    /// Hex-encoded digest, as reported in file metadata.
    pub fn finalize(mut self) -> String {
        if self.block_len > 0 {
            self.finish_block();
        }
        hex::encode(self.overall.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentHash, BLOCK_SIZE};
    use bytes::Buf;

    const INPUT_LEN: usize = 9876501;
    const EXPECTED: &str = "0ed4dab4a6535976a6d564309e64392a0b7971c5cb2bbc3881782832fca57484";

    fn input() -> Vec<u8> {
        (0..INPUT_LEN).map(|i| (i as u8).wrapping_add(42)).collect()
    }

    #[test]
    fn empty_content() {
        assert_eq!(
            ContentHash::new().finalize(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn short_content() {
        let mut hash = ContentHash::new();
        hash.update(&b"hello world"[..]);
        assert_eq!(
            hash.finalize(),
            "bc62d4b80d9e36da29c16c5d4d9f11731f36052c72401a76c23c0fb5a9b74423"
        );
    }

    #[test]
    fn multi_block() {
        let mut hash = ContentHash::new();
        hash.update(input().as_slice());
        assert_eq!(hash.finalize(), EXPECTED);
    }

    #[test]
    fn split_does_not_change_digest() {
        let input = input();

        for split in [1234567, BLOCK_SIZE, BLOCK_SIZE + 1] {
            let (head, tail) = input.split_at(split);

            let mut chained = ContentHash::new();
            chained.update(head.chain(tail));
            assert_eq!(chained.finalize(), EXPECTED, "chained at {split}");

            let mut separate = ContentHash::new();
            separate.update(head);
            separate.update(tail);
            assert_eq!(separate.finalize(), EXPECTED, "separate at {split}");
        }
    }
}
