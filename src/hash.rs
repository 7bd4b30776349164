//! Hash function capability consumed by [`HMac`](crate::hmac::HMac).

/// An incremental message digest.
pub trait HashFunction: Clone {
    /// Canonical lower-case name, e.g. `md5`.
    fn name(&self) -> &'static str;

    /// Input block size in bytes.
    fn block_size(&self) -> usize;

    /// Output size in bytes.
    fn hash_size(&self) -> usize;

    fn update(&mut self, data: &[u8]);

    /// Finish the computation and return the digest. The state is reset.
    fn digest(&mut self) -> Vec<u8>;

    fn reset(&mut self);
}

macro_rules! digest_hash {
    ($(#[$attr:meta])* $name:ident, $inner:ty, $digest:path, $label:literal, $block:literal) => {
        $(#[$attr])*
        #[derive(Clone, Default)]
        pub struct $name($inner);

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }
        }

        impl HashFunction for $name {
            fn name(&self) -> &'static str {
                $label
            }

            fn block_size(&self) -> usize {
                $block
            }

            fn hash_size(&self) -> usize {
                <$inner as $digest>::output_size()
            }

            fn update(&mut self, data: &[u8]) {
                <$inner as $digest>::update(&mut self.0, data);
            }

            fn digest(&mut self) -> Vec<u8> {
                <$inner as $digest>::finalize_reset(&mut self.0).to_vec()
            }

            fn reset(&mut self) {
                <$inner as $digest>::reset(&mut self.0);
            }
        }
    };
}

digest_hash!(
    /// MD5 (RFC 1321).
    Md5,
    md5::Md5,
    md5::Digest,
    "md5",
    64
);

digest_hash!(
    /// SHA-1 (FIPS 180-4).
    Sha1,
    sha1::Sha1,
    sha1::Digest,
    "sha1",
    64
);
