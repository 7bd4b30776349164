//! Block cipher modes of operation, padding schemes and HMAC.
//!
//! This crate provides the building blocks that sit between a raw block
//! cipher and a usable encryption or authentication layer:
//!
//! - **Modes**: ECB, CTR, ICM (integer counter mode) and OFB over any
//!   [`BlockCipher`], with [`Aes`] supplied.
//! - **Padding**: PKCS #7 and trailing-bit-complement (TBC).
//! - **HMAC**: RFC 2104 over any [`HashFunction`], with [`Md5`] and [`Sha1`]
//!   supplied, plus truncated output.
//! - **Self-tests**: every algorithm can verify itself against published
//!   vectors or a round trip; [`selftest::run_all`] runs them all.
//!
//! # Quick Start
//!
//! ## OFB encryption
//!
//! ```rust
//! use blockmodes::{Aes, Direction, Mode, ModeKind, ModeParams};
//!
//! let key = [0x2bu8; 16];
//! let iv = [0u8; 16];
//! let plaintext = [0x42u8; 32];
//!
//! let mut mode = Mode::new(ModeKind::Ofb, Aes::new());
//! mode.init(&ModeParams::new(Direction::Encrypt, &key).with_iv(&iv)).unwrap();
//! let mut ciphertext = [0u8; 32];
//! for (src, dst) in plaintext.chunks(16).zip(ciphertext.chunks_mut(16)) {
//!     mode.update(src, dst).unwrap();
//! }
//!
//! mode.reset();
//! mode.init(&ModeParams::new(Direction::Decrypt, &key).with_iv(&iv)).unwrap();
//! let mut decrypted = [0u8; 32];
//! for (src, dst) in ciphertext.chunks(16).zip(decrypted.chunks_mut(16)) {
//!     mode.update(src, dst).unwrap();
//! }
//! assert_eq!(plaintext, decrypted);
//! ```
//!
//! ## Padding a message for ECB
//!
//! ```rust
//! use blockmodes::{Padding, Scheme};
//!
//! let mut pad = Padding::new(Scheme::Pkcs7);
//! pad.init(16).unwrap();
//!
//! let mut message = b"attack at dawn".to_vec();
//! message.extend(pad.pad(&message).unwrap());
//! assert_eq!(message.len(), 16);
//! assert_eq!(pad.unpad(&message).unwrap(), 2);
//! ```
//!
//! ## HMAC
//!
//! ```rust
//! use blockmodes::{HMac, Md5};
//!
//! let mut mac = HMac::new(Md5::new());
//! mac.init(Some(&[0x0bu8; 16]), None).unwrap();
//! mac.update(b"Hi There");
//! assert_eq!(
//!     hex::encode(mac.digest().unwrap()),
//!     "9294727a3638bb1c13f48ef8158bfc9d"
//! );
//! ```
//!
//! # Security Considerations
//!
//! - **ECB leaks structure**: identical plaintext blocks give identical
//!   ciphertext blocks
//! - **Never reuse (key, IV) or (key, segment) pairs** with the keystream
//!   modes
//! - **No authentication**: pair a mode with [`HMac`] for integrity

pub mod cipher;
pub mod common;
pub mod hash;
pub mod hmac;
pub mod mode;
pub mod pad;
pub mod selftest;

#[cfg(test)]
mod cross_check;

pub use cipher::{AES_BLOCK_LENGTH, Aes, BlockCipher};
pub use common::{Direction, Error};
pub use hash::{HashFunction, Md5, Sha1};
pub use hmac::{HMac, HMacVector, KnownAnswers};
pub use mode::{IcmParams, Mode, ModeKind, ModeParams};
pub use pad::{Padding, Scheme};
