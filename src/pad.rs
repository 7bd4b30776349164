//! Padding schemes: PKCS7 and TBC (Trailing Bit Complement).
//!
//! A padding scheme is a stateless generator/validator of trailing bytes. It
//! never buffers data: [`Padding::pad`] returns the bytes to append and
//! [`Padding::unpad`] returns how many trailing bytes to discard. Both always
//! work in units of at least one byte, so a message whose length is already a
//! multiple of the block size still gains a full block of padding.

use std::sync::OnceLock;

use crate::common::Error;

/// Largest block size any scheme accepts.
pub const MAX_BLOCK_SIZE: usize = 256;

/// Supported padding algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Each padding byte holds the padding length (RFC 5652 section 6.3).
    Pkcs7,
    /// Padding bytes complement the last bit of the message.
    Tbc,
}

impl Scheme {
    pub fn name(self) -> &'static str {
        match self {
            Scheme::Pkcs7 => "pkcs7",
            Scheme::Tbc => "tbc",
        }
    }

    /// Smallest block size the scheme can express.
    pub fn min_block_size(self) -> usize {
        match self {
            Scheme::Pkcs7 => 2,
            Scheme::Tbc => 1,
        }
    }

    fn validity(self) -> &'static OnceLock<bool> {
        static PKCS7_VALID: OnceLock<bool> = OnceLock::new();
        static TBC_VALID: OnceLock<bool> = OnceLock::new();
        match self {
            Scheme::Pkcs7 => &PKCS7_VALID,
            Scheme::Tbc => &TBC_VALID,
        }
    }
}

/// A padding scheme instance, unconfigured until [`Padding::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Padding {
    scheme: Scheme,
    block_size: Option<usize>,
}

impl Padding {
    pub fn new(scheme: Scheme) -> Self {
        Self {
            scheme,
            block_size: None,
        }
    }

    /// Create an instance after the scheme has passed its self-test.
    ///
    /// The self-test runs once per scheme and process.
    pub fn verified(scheme: Scheme) -> Result<Self, Error> {
        let pad = Self::new(scheme);
        crate::selftest::require(scheme.name(), pad.self_test())?;
        Ok(pad)
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Configured block size, or `None` before [`Padding::init`].
    pub fn block_size(&self) -> Option<usize> {
        self.block_size
    }

    /// Scheme name, suffixed with the block size in bits once configured.
    pub fn name(&self) -> String {
        match self.block_size {
            Some(bs) => format!("{}-{}", self.scheme.name(), 8 * bs),
            None => self.scheme.name().to_string(),
        }
    }

    /// Configure the block size.
    ///
    /// # Errors
    /// `IllegalState` if already configured, `IllegalArgument` if the block
    /// size is outside the scheme's bounds.
    pub fn init(&mut self, block_size: usize) -> Result<(), Error> {
        if self.block_size.is_some() {
            return Err(Error::IllegalState("padding already initialised"));
        }
        if block_size < self.scheme.min_block_size() || block_size > MAX_BLOCK_SIZE {
            return Err(Error::IllegalArgument("block size out of range"));
        }
        self.block_size = Some(block_size);
        tracing::debug!(padding = %self.name(), "padding initialised");
        Ok(())
    }

    pub fn reset(&mut self) {
        self.block_size = None;
    }

    fn configured(&self) -> Result<usize, Error> {
        self.block_size.ok_or(Error::IllegalState("padding not initialised"))
    }

    /// Padding to append to `data`.
    ///
    /// The result is 1 to `block_size` bytes long and brings the total
    /// length to a multiple of the block size.
    pub fn pad(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let bs = self.configured()?;
        let n = bs - data.len() % bs;

        let byte = match self.scheme {
            Scheme::Pkcs7 => n as u8,
            // An empty message has no trailing bit; treat it as zero.
            Scheme::Tbc => match data.last() {
                Some(last) if last & 0x01 == 1 => 0x00,
                _ => 0x01,
            },
        };
        Ok(vec![byte; n])
    }

    /// Number of trailing padding bytes in `data`.
    ///
    /// # Errors
    /// `WrongPadding` if the trailing bytes are not valid padding for this
    /// scheme and block size.
    pub fn unpad(&self, data: &[u8]) -> Result<usize, Error> {
        let bs = self.configured()?;
        let Some(&last) = data.last() else {
            return Err(Error::WrongPadding);
        };

        let result = match self.scheme {
            Scheme::Pkcs7 => unpad_pkcs7(data, last, bs),
            Scheme::Tbc => unpad_tbc(data, last, bs),
        };
        if result.is_err() {
            tracing::trace!(padding = %self.name(), len = data.len(), "rejected padding");
        }
        result
    }

    /// Pad and unpad every prefix of a fixed buffer for block sizes 2..=255.
    ///
    /// Runs on a scratch instance; `self` is left untouched. The outcome is
    /// cached per scheme.
    pub fn self_test(&self) -> bool {
        *self
            .scheme
            .validity()
            .get_or_init(|| round_trip_all(self.scheme))
    }
}

fn unpad_pkcs7(data: &[u8], last: u8, bs: usize) -> Result<usize, Error> {
    // A 256-byte block pads a full block with 256 as u8 == 0.
    let n = match last {
        0 if bs == MAX_BLOCK_SIZE => MAX_BLOCK_SIZE,
        0 => return Err(Error::WrongPadding),
        n => n as usize,
    };
    if n > bs || n > data.len() {
        return Err(Error::WrongPadding);
    }
    if data[data.len() - n..].iter().any(|&b| b != last) {
        return Err(Error::WrongPadding);
    }
    Ok(n)
}

fn unpad_tbc(data: &[u8], last: u8, bs: usize) -> Result<usize, Error> {
    if last > 0x01 {
        return Err(Error::WrongPadding);
    }
    let n = data.iter().rev().take_while(|&&b| b == last).count();
    if n > bs {
        return Err(Error::WrongPadding);
    }
    // The byte before the run is the message's last byte, whose low bit the
    // padding complements. An empty message leaves nothing before the run.
    let before = data.len().checked_sub(n + 1).map(|i| data[i]);
    if before.is_some_and(|b| b & 0x01 == last) {
        return Err(Error::WrongPadding);
    }
    Ok(n)
}

fn round_trip_all(scheme: Scheme) -> bool {
    const OFFSET: usize = 5;
    const LIMIT: usize = 1024;

    let mut buf = [0u8; LIMIT];
    for bs in 2..MAX_BLOCK_SIZE {
        let mut pad = Padding::new(scheme);
        if pad.init(bs).is_err() {
            return false;
        }
        for len in 0..LIMIT - OFFSET - bs {
            let padding = match pad.pad(&buf[OFFSET..OFFSET + len]) {
                Ok(p) => p,
                Err(_) => return false,
            };
            if (len + padding.len()) % bs != 0 {
                return false;
            }
            let end = OFFSET + len + padding.len();
            buf[OFFSET + len..end].copy_from_slice(&padding);
            match pad.unpad(&buf[OFFSET..end]) {
                Ok(n) if n == padding.len() => {}
                _ => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ready(scheme: Scheme, bs: usize) -> Padding {
        let mut pad = Padding::new(scheme);
        pad.init(bs).unwrap();
        pad
    }

    #[test]
    fn test_pkcs7_partial_block() {
        let pad = ready(Scheme::Pkcs7, 8);
        let data = [0xaau8; 5];
        let padding = pad.pad(&data).unwrap();
        assert_eq!(padding, vec![0x03, 0x03, 0x03]);

        let mut padded = data.to_vec();
        padded.extend_from_slice(&padding);
        assert_eq!(pad.unpad(&padded), Ok(3));
    }

    #[test]
    fn test_pkcs7_full_block_gets_full_padding() {
        let pad = ready(Scheme::Pkcs7, 8);
        assert_eq!(pad.pad(&[0u8; 16]).unwrap(), vec![0x08; 8]);
        assert_eq!(pad.pad(&[]).unwrap(), vec![0x08; 8]);
    }

    #[test]
    fn test_pkcs7_rejects_corruption() {
        let pad = ready(Scheme::Pkcs7, 8);
        assert_eq!(pad.unpad(&[1, 2, 3, 4, 5, 3, 2, 3]), Err(Error::WrongPadding));
        assert_eq!(pad.unpad(&[1, 2, 3, 4, 5, 6, 7, 0]), Err(Error::WrongPadding));
        assert_eq!(pad.unpad(&[9; 8]), Err(Error::WrongPadding));
        assert_eq!(pad.unpad(&[3, 3]), Err(Error::WrongPadding));
        assert_eq!(pad.unpad(&[]), Err(Error::WrongPadding));
    }

    #[test]
    fn test_pkcs7_block_256() {
        let pad = ready(Scheme::Pkcs7, 256);
        let padding = pad.pad(&[0x11u8; 256]).unwrap();
        assert_eq!(padding.len(), 256);
        assert!(padding.iter().all(|&b| b == 0));

        let mut padded = vec![0x11u8; 256];
        padded.extend_from_slice(&padding);
        assert_eq!(pad.unpad(&padded), Ok(256));
    }

    #[test]
    fn test_tbc_last_bit_zero() {
        let pad = ready(Scheme::Tbc, 8);
        let data = [0x10, 0x20, 0x02];
        let padding = pad.pad(&data).unwrap();
        assert_eq!(padding, vec![0x01; 5]);

        let mut padded = data.to_vec();
        padded.extend_from_slice(&padding);
        assert_eq!(pad.unpad(&padded), Ok(5));
    }

    #[test]
    fn test_tbc_last_bit_one() {
        let pad = ready(Scheme::Tbc, 8);
        let data = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03];
        let padding = pad.pad(&data).unwrap();
        assert_eq!(padding, vec![0x00; 8]);

        let mut padded = data.to_vec();
        padded.extend_from_slice(&padding);
        assert_eq!(pad.unpad(&padded), Ok(8));
    }

    #[test]
    fn test_tbc_empty_message() {
        let pad = ready(Scheme::Tbc, 4);
        let padding = pad.pad(&[]).unwrap();
        assert_eq!(padding, vec![0x01; 4]);
        assert_eq!(pad.unpad(&padding), Ok(4));
    }

    #[test]
    fn test_tbc_rejects_corruption() {
        let pad = ready(Scheme::Tbc, 4);
        assert_eq!(pad.unpad(&[0x10, 0x01, 0x01, 0x07]), Err(Error::WrongPadding));
        assert_eq!(pad.unpad(&[0x01; 9]), Err(Error::WrongPadding));
        assert_eq!(pad.unpad(&[0x10, 0x03, 0x01, 0x01]), Err(Error::WrongPadding));
        assert_eq!(pad.unpad(&[0x10, 0x02, 0x00, 0x00]), Err(Error::WrongPadding));
    }

    #[test]
    fn test_tbc_detects_inner_corruption() {
        let pad = ready(Scheme::Tbc, 8);
        let data = [0x10, 0x20, 0x02];
        let mut padded = data.to_vec();
        padded.extend(pad.pad(&data).unwrap());

        // A replacement byte with an even low bit reads as shorter valid
        // padding; one with an odd low bit contradicts the complement rule.
        let mut corrupted = 0;
        for pos in data.len()..padded.len() - 1 {
            for value in (0..=0xffu8).filter(|&v| v != 0x01 && v & 0x01 == 0x01) {
                let mut c = padded.clone();
                c[pos] = value;
                assert_eq!(pad.unpad(&c), Err(Error::WrongPadding), "{pos} {value:#04x}");
                corrupted += 1;
            }
        }
        assert_eq!(corrupted, 4 * 127);
    }

    #[test]
    fn test_tbc_block_size_one() {
        let pad = ready(Scheme::Tbc, 1);
        assert_eq!(pad.pad(&[0x04]).unwrap(), vec![0x01]);
    }

    #[test]
    fn test_init_bounds() {
        let mut pad = Padding::new(Scheme::Pkcs7);
        assert!(matches!(pad.init(1), Err(Error::IllegalArgument(_))));
        assert!(matches!(pad.init(257), Err(Error::IllegalArgument(_))));
        assert_eq!(pad.block_size(), None);

        let mut pad = Padding::new(Scheme::Tbc);
        assert!(pad.init(1).is_ok());
        assert!(matches!(pad.init(8), Err(Error::IllegalState(_))));
        pad.reset();
        assert!(pad.init(8).is_ok());
    }

    #[test]
    fn test_uninitialised() {
        let pad = Padding::new(Scheme::Pkcs7);
        assert!(matches!(pad.pad(b"abc"), Err(Error::IllegalState(_))));
        assert!(matches!(pad.unpad(b"abc"), Err(Error::IllegalState(_))));
    }

    #[test]
    fn test_names() {
        let mut pad = Padding::new(Scheme::Pkcs7);
        assert_eq!(pad.name(), "pkcs7");
        pad.init(8).unwrap();
        assert_eq!(pad.name(), "pkcs7-64");
        assert_eq!(ready(Scheme::Tbc, 16).name(), "tbc-128");
    }

    #[test]
    fn test_self_test() {
        let pad = ready(Scheme::Pkcs7, 16);
        assert!(pad.self_test());
        assert_eq!(pad.block_size(), Some(16));
        assert!(Padding::new(Scheme::Tbc).self_test());
    }

    #[test]
    fn test_verified() {
        let pad = Padding::verified(Scheme::Tbc).unwrap();
        assert_eq!(pad.block_size(), None);
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            data in proptest::collection::vec(any::<u8>(), 0..600),
            bs in 2usize..=256,
            tbc in any::<bool>(),
        ) {
            let scheme = if tbc { Scheme::Tbc } else { Scheme::Pkcs7 };
            let pad = ready(scheme, bs);
            let padding = pad.pad(&data).unwrap();
            prop_assert!(!padding.is_empty() && padding.len() <= bs);
            prop_assert_eq!((data.len() + padding.len()) % bs, 0);

            let mut padded = data.clone();
            padded.extend_from_slice(&padding);
            prop_assert_eq!(pad.unpad(&padded), Ok(padding.len()));
        }

        #[test]
        fn prop_pkcs7_byte_is_length(len in 0usize..600, bs in 2usize..256) {
            let pad = ready(Scheme::Pkcs7, bs);
            let padding = pad.pad(&vec![0u8; len]).unwrap();
            prop_assert!(padding.iter().all(|&b| b as usize == padding.len()));
        }

        #[test]
        fn prop_tbc_complements_last_bit(
            data in proptest::collection::vec(any::<u8>(), 1..100),
            bs in 1usize..=64,
        ) {
            let pad = ready(Scheme::Tbc, bs);
            let padding = pad.pad(&data).unwrap();
            let last_bit = data[data.len() - 1] & 0x01;
            prop_assert!(padding.iter().all(|&b| b == last_bit ^ 0x01));
        }
    }
}
