#![allow(deprecated)]
//! Block cipher capability consumed by the mode engine.
//!
//! Modes never implement a cipher themselves: they drive any type that can
//! encrypt and decrypt one block at a time under a key. [`Aes`] adapts the
//! `aes` crate to this capability for 16-byte blocks and 128/192/256-bit keys.

#[allow(deprecated)]
use aes::cipher::{Array, BlockCipherDecrypt, BlockCipherEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};

use crate::common::Error;

/// A keyed single-block transformation.
///
/// Implementations are cloned freely: a mode owns a private clone of the
/// cipher it was constructed with.
pub trait BlockCipher: Clone {
    /// Canonical lower-case name, e.g. `aes`.
    fn name(&self) -> &'static str;

    /// Supported block sizes in bytes.
    fn block_sizes(&self) -> &'static [usize];

    /// Supported key sizes in bytes.
    fn key_sizes(&self) -> &'static [usize];

    /// Block size used when the caller does not ask for one.
    fn default_block_size(&self) -> usize {
        self.block_sizes()[0]
    }

    /// Key the cipher for the given block size.
    fn init(&mut self, key: &[u8], block_size: usize) -> Result<(), Error>;

    /// Forget the key schedule.
    fn reset(&mut self);

    /// Encrypt the first block of `input` into the first block of `output`.
    fn encrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), Error>;

    /// Decrypt the first block of `input` into the first block of `output`.
    fn decrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), Error>;
}

/// AES block length in bytes.
pub const AES_BLOCK_LENGTH: usize = 16;

#[derive(Clone)]
enum AesKey {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

macro_rules! with_aes_key {
    ($key:expr, $ks:ident => $body:expr) => {
        match $key {
            AesKey::Aes128($ks) => $body,
            AesKey::Aes192($ks) => $body,
            AesKey::Aes256($ks) => $body,
        }
    };
}

/// AES as a [`BlockCipher`]. Starts unkeyed.
#[derive(Clone, Default)]
pub struct Aes {
    key: Option<AesKey>,
}

impl Aes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key length in bytes of the current key schedule, if keyed.
    pub fn key_length(&self) -> Option<usize> {
        self.key.as_ref().map(|k| match k {
            AesKey::Aes128(_) => 16,
            AesKey::Aes192(_) => 24,
            AesKey::Aes256(_) => 32,
        })
    }

    fn keyed(&self) -> Result<&AesKey, Error> {
        self.key.as_ref().ok_or(Error::IllegalState("cipher not keyed"))
    }
}

fn check_block(input: &[u8], output: &[u8]) -> Result<(), Error> {
    if input.len() < AES_BLOCK_LENGTH || output.len() < AES_BLOCK_LENGTH {
        return Err(Error::IllegalArgument("buffer shorter than one block"));
    }
    Ok(())
}

impl BlockCipher for Aes {
    fn name(&self) -> &'static str {
        "aes"
    }

    fn block_sizes(&self) -> &'static [usize] {
        &[AES_BLOCK_LENGTH]
    }

    fn key_sizes(&self) -> &'static [usize] {
        &[16, 24, 32]
    }

    fn init(&mut self, key: &[u8], block_size: usize) -> Result<(), Error> {
        if block_size != AES_BLOCK_LENGTH {
            return Err(Error::IllegalArgument("AES block size must be 16"));
        }
        let invalid = |_| Error::InvalidKey("AES key must be 16, 24 or 32 bytes");
        self.key = Some(match key.len() {
            16 => AesKey::Aes128(Aes128::new_from_slice(key).map_err(invalid)?),
            24 => AesKey::Aes192(Aes192::new_from_slice(key).map_err(invalid)?),
            32 => AesKey::Aes256(Aes256::new_from_slice(key).map_err(invalid)?),
            _ => return Err(Error::InvalidKey("AES key must be 16, 24 or 32 bytes")),
        });
        Ok(())
    }

    /// Drops the key schedule, which wipes itself on drop.
    fn reset(&mut self) {
        self.key = None;
    }

    fn encrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        check_block(input, output)?;
        let mut block = Array::clone_from_slice(&input[..AES_BLOCK_LENGTH]);
        with_aes_key!(self.keyed()?, ks => ks.encrypt_block(&mut block));
        output[..AES_BLOCK_LENGTH].copy_from_slice(block.as_slice());
        Ok(())
    }

    fn decrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        check_block(input, output)?;
        let mut block = Array::clone_from_slice(&input[..AES_BLOCK_LENGTH]);
        with_aes_key!(self.keyed()?, ks => ks.decrypt_block(&mut block));
        output[..AES_BLOCK_LENGTH].copy_from_slice(block.as_slice());
        Ok(())
    }
}
