//! HMAC (RFC 2104) over any [`HashFunction`].
//!
//! Keying derives two primed hash states, one fed `K ^ ipad` and one fed
//! `K ^ opad`. Both are kept so that every [`HMac::digest`] can start the
//! next message without the key material being supplied again.
//!
//! Keys shorter than the hash output are rejected. Keys longer than the hash
//! block are truncated to the block size rather than hashed.

use std::sync::OnceLock;

use zeroize::Zeroizing;

use crate::common::{Error, unhex};
use crate::hash::{HashFunction, Md5, Sha1};

const IPAD_BYTE: u8 = 0x36;
const OPAD_BYTE: u8 = 0x5c;

/// Smallest truncated MAC, in bytes, regardless of hash size.
pub const MIN_TRUNCATED_SIZE: usize = 10;

/// A published HMAC test vector, hex encoded.
#[derive(Debug, Clone, Copy)]
pub struct HMacVector {
    pub key: &'static str,
    pub data: &'static str,
    pub mac: &'static str,
}

/// Hash functions with published HMAC known answers.
pub trait KnownAnswers: HashFunction {
    /// Name of the MAC the vectors belong to, e.g. `hmac-md5`.
    const MAC_NAME: &'static str;

    fn vectors() -> &'static [HMacVector];

    /// Memoized self-test outcome for HMAC over this hash.
    fn validity() -> &'static OnceLock<bool>;
}

impl KnownAnswers for Md5 {
    const MAC_NAME: &'static str = "hmac-md5";

    fn vectors() -> &'static [HMacVector] {
        // RFC 2104 / RFC 2202 section 2. Test case 2 ("Jefe") is omitted: the
        // key is shorter than the hash output.
        &[
            HMacVector {
                key: "0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b",
                data: "4869205468657265",
                mac: "9294727a3638bb1c13f48ef8158bfc9d",
            },
            HMacVector {
                key: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
                data: "dddddddddddddddddddddddddddddddddddddddddddddddddd\
                       dddddddddddddddddddddddddddddddddddddddddddddddddd",
                mac: "56be34521d144c88dbb8c733f0e8b3f6",
            },
        ]
    }

    fn validity() -> &'static OnceLock<bool> {
        static VALID: OnceLock<bool> = OnceLock::new();
        &VALID
    }
}

impl KnownAnswers for Sha1 {
    const MAC_NAME: &'static str = "hmac-sha1";

    fn vectors() -> &'static [HMacVector] {
        // RFC 2202 section 3, test cases 1 and 3.
        &[
            HMacVector {
                key: "0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b",
                data: "4869205468657265",
                mac: "b617318655057264e28bc0b6fb378c8ef146be00",
            },
            HMacVector {
                key: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
                data: "dddddddddddddddddddddddddddddddddddddddddddddddddd\
                       dddddddddddddddddddddddddddddddddddddddddddddddddd",
                mac: "125d7342b9ac11cd91a39af48aa17b4f63f175d3",
            },
        ]
    }

    fn validity() -> &'static OnceLock<bool> {
        static VALID: OnceLock<bool> = OnceLock::new();
        &VALID
    }
}

/// Keyed-hash message authentication code.
///
/// `Clone` is deep: the live hash and both primed pads are copied, so a clone
/// can process an independent stream.
#[derive(Clone)]
pub struct HMac<H: HashFunction> {
    hash: H,
    ipad_hash: Option<H>,
    opad_hash: Option<H>,
    block_size: usize,
    mac_size: usize,
    truncated_size: usize,
}

impl<H: HashFunction> HMac<H> {
    pub fn new(hash: H) -> Self {
        let block_size = hash.block_size();
        let mac_size = hash.hash_size();
        Self {
            hash,
            ipad_hash: None,
            opad_hash: None,
            block_size,
            mac_size,
            truncated_size: mac_size,
        }
    }

    /// `hmac-` followed by the hash name.
    pub fn name(&self) -> String {
        format!("hmac-{}", self.hash.name())
    }

    /// Length of the tags returned by [`HMac::digest`].
    pub fn mac_size(&self) -> usize {
        self.truncated_size
    }

    /// Key the MAC.
    ///
    /// With `key == None` the pads derived by the previous call are reused.
    /// `truncated_size` defaults to the full hash output.
    ///
    /// # Errors
    /// `InvalidKey` if the key is shorter than the hash output or no key was
    /// ever supplied; `IllegalArgument` if `truncated_size` is below
    /// `max(hash_size / 2, 10)` or above the hash size.
    pub fn init(
        &mut self,
        key: Option<&[u8]>,
        truncated_size: Option<usize>,
    ) -> Result<(), Error> {
        let truncated_size = truncated_size.unwrap_or(self.mac_size);
        if truncated_size < self.mac_size / 2 {
            return Err(Error::IllegalArgument("truncated size too small"));
        }
        if truncated_size < MIN_TRUNCATED_SIZE {
            return Err(Error::IllegalArgument("truncated size less than 80 bits"));
        }
        if truncated_size > self.mac_size {
            return Err(Error::IllegalArgument("truncated size exceeds hash size"));
        }

        let Some(key) = key else {
            let ipad = self
                .ipad_hash
                .as_ref()
                .ok_or(Error::InvalidKey("no key material"))?;
            self.hash = ipad.clone();
            self.truncated_size = truncated_size;
            return Ok(());
        };
        if key.len() < self.mac_size {
            return Err(Error::InvalidKey("key too short"));
        }

        let mut k = Zeroizing::new(vec![0u8; self.block_size]);
        let limit = key.len().min(self.block_size);
        k[..limit].copy_from_slice(&key[..limit]);

        let inner: Zeroizing<Vec<u8>> =
            Zeroizing::new(k.iter().map(|b| b ^ IPAD_BYTE).collect());
        let outer: Zeroizing<Vec<u8>> =
            Zeroizing::new(k.iter().map(|b| b ^ OPAD_BYTE).collect());

        self.hash.reset();
        let mut opad_hash = self.hash.clone();
        opad_hash.update(&outer);
        self.hash.update(&inner);

        self.ipad_hash = Some(self.hash.clone());
        self.opad_hash = Some(opad_hash);
        self.truncated_size = truncated_size;
        tracing::debug!(mac = %self.name(), mac_size = truncated_size, "mac keyed");
        Ok(())
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hash.update(data);
    }

    /// Discard buffered data, keeping the key.
    pub fn reset(&mut self) {
        match &self.ipad_hash {
            Some(ipad) => self.hash = ipad.clone(),
            None => self.hash.reset(),
        }
    }

    /// Finish the tag for the data supplied since keying or the last digest.
    ///
    /// The MAC is left ready for the next message under the same key.
    ///
    /// # Errors
    /// `IllegalState` if the MAC was never keyed.
    pub fn digest(&mut self) -> Result<Vec<u8>, Error> {
        let (Some(ipad), Some(opad)) = (&self.ipad_hash, &self.opad_hash) else {
            return Err(Error::IllegalState("HMAC not initialised"));
        };

        let inner = Zeroizing::new(self.hash.digest());
        let mut outer = opad.clone();
        outer.update(&inner);
        let mut out = outer.digest();
        self.hash = ipad.clone();

        out.truncate(self.truncated_size);
        Ok(out)
    }
}

impl<H: KnownAnswers> HMac<H> {
    /// Like [`HMac::new`], but only returns the MAC once HMAC over `H` has
    /// passed its known-answer test.
    pub fn verified(hash: H) -> Result<Self, Error> {
        let mac = Self::new(hash);
        crate::selftest::require(H::MAC_NAME, mac.self_test())?;
        Ok(mac)
    }

    /// Run the published vectors for `H`. Computed at most once per hash
    /// type; `self` is not touched.
    pub fn self_test(&self) -> bool {
        *H::validity().get_or_init(|| {
            let mut mac = Self::new(self.hash.clone());
            H::vectors().iter().all(|v| {
                if mac.init(Some(&unhex(v.key)), None).is_err() {
                    return false;
                }
                mac.update(&unhex(v.data));
                mac.digest().is_ok_and(|tag| tag == unhex(v.mac))
            })
        })
    }
}
