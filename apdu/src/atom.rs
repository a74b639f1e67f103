// Copyright (c) 2023 The Radix Ledger App Authors

//! Atom signing APDUs
//!
//! See the crate documentation for the expected exchange order.

use encdec::{Decode, DecodeOwned, Encode};
use heapless::Vec;

use crate::{
    helpers::arr, path::Bip32Path, state::AtomState, state::Digest, ApduError, ApduStatic,
    Instruction, MAX_CHUNK_SIZE, MAX_ITEMS, RADIX_APDU_CLA,
};

/// Length of a radix address (magic byte, compressed public key, checksum)
pub const ADDRESS_LEN: usize = 38;

/// Length of a 256-bit token amount
pub const AMOUNT_LEN: usize = 32;

/// Maximum length of a token definition reference
pub const TOKEN_ID_MAX_LEN: usize = 67;

/// Length of a compact secp256k1 signature (`r || s`)
pub const SIGNATURE_LEN: usize = 64;

/// Start an atom signing session
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                  BIP32_PATH (see [Bip32Path])                 /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |            ATOM_LEN           |   NUM_ITEMS   | NUM_TRANSFERS |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct SignAtomInit {
    /// Signing key path
    pub path: Bip32Path,

    /// Total length of the atom to be streamed
    pub atom_len: u16,

    /// Number of items (up particles) in the atom
    pub num_items: u8,

    /// Number of items that are token transfers
    pub num_transfers: u8,
}

impl ApduStatic for SignAtomInit {
    const CLA: u8 = RADIX_APDU_CLA;
    const INS: u8 = Instruction::SignAtomInit as u8;
}

impl SignAtomInit {
    /// Create a new atom signing request
    pub fn new(path: Bip32Path, atom_len: u16, num_items: u8, num_transfers: u8) -> Self {
        Self {
            path,
            atom_len,
            num_items,
            num_transfers,
        }
    }
}

/// Location of a single field within the atom
///
/// An empty range (zero length) marks an absent field.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct FieldRange {
    /// Offset of the field from the start of the atom
    pub start: u16,
    /// Encoded length of the field
    pub len: u16,
}

impl FieldRange {
    pub const fn new(start: u16, len: u16) -> Self {
        Self { start, len }
    }
}

/// Field locations for a single item
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |         ADDRESS_START         |          ADDRESS_LEN          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          AMOUNT_START         |           AMOUNT_LEN          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |        SERIALIZER_START       |         SERIALIZER_LEN        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |         TOKEN_ID_START        |          TOKEN_ID_LEN         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct FieldCatalogEntry {
    pub address: FieldRange,
    pub amount: FieldRange,
    pub serializer: FieldRange,
    pub token_id: FieldRange,
}

impl FieldCatalogEntry {
    /// Encoded length of a catalog entry
    pub const LEN: usize = 16;

    /// Create an entry for a token transfer
    pub fn transfer(
        address: FieldRange,
        amount: FieldRange,
        serializer: FieldRange,
        token_id: FieldRange,
    ) -> Self {
        Self {
            address,
            amount,
            serializer,
            token_id,
        }
    }

    /// Create an entry for an item carrying only a serializer
    pub fn other(serializer: FieldRange) -> Self {
        Self {
            serializer,
            ..Default::default()
        }
    }
}

/// Load field catalog entries, in stream order
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  NUM_ENTRIES  |                    RESERVED                   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                 ENTRIES (see [FieldCatalogEntry])             /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug, Default)]
pub struct SignAtomCatalog {
    pub entries: Vec<FieldCatalogEntry, MAX_ITEMS>,
}

impl ApduStatic for SignAtomCatalog {
    const CLA: u8 = RADIX_APDU_CLA;
    const INS: u8 = Instruction::SignAtomCatalog as u8;
}

impl SignAtomCatalog {
    /// Create a catalog APDU from a list of entries
    pub fn new(entries: &[FieldCatalogEntry]) -> Result<Self, ApduError> {
        let entries = Vec::from_slice(entries).map_err(|_| ApduError::InvalidLength)?;
        Ok(Self { entries })
    }
}

impl Encode for SignAtomCatalog {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(4 + self.entries.len() * FieldCatalogEntry::LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = self.entries.len() as u8;
        buff[1..4].fill(0);
        let mut index = 4;

        for e in &self.entries {
            index += e.encode(&mut buff[index..])?;
        }

        Ok(index)
    }
}

impl DecodeOwned for SignAtomCatalog {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.len() < 4 {
            return Err(ApduError::InvalidLength);
        }

        let n = buff[0] as usize;
        if n > MAX_ITEMS || buff.len() < 4 + n * FieldCatalogEntry::LEN {
            #[cfg(feature = "log")]
            log::warn!("invalid catalog length {} for {} byte buffer", n, buff.len());

            return Err(ApduError::InvalidLength);
        }

        let mut entries = Vec::new();
        let mut index = 4;

        for _ in 0..n {
            let (e, l) = FieldCatalogEntry::decode(&buff[index..])?;
            index += l;

            entries.push(e).map_err(|_| ApduError::InvalidLength)?;
        }

        Ok((Self { entries }, index))
    }
}

/// Stream a chunk of atom bytes
///
/// The chunk occupies the whole APDU body, its length is taken from the
/// body length so a full [`MAX_CHUNK_SIZE`] chunk fits a short APDU.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                      CHUNK (1..=255 bytes)                    /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SignAtomBytes<'a> {
    pub chunk: &'a [u8],
}

impl<'a> ApduStatic for SignAtomBytes<'a> {
    const CLA: u8 = RADIX_APDU_CLA;
    const INS: u8 = Instruction::SignAtomBytes as u8;
}

impl<'a> SignAtomBytes<'a> {
    pub fn new(chunk: &'a [u8]) -> Self {
        Self { chunk }
    }
}

impl<'a> Encode for SignAtomBytes<'a> {
    type Error = ApduError;

    /// Encode a [`SignAtomBytes`] APDU into the provided buffer
    #[inline]
    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        let d = self.chunk;

        if d.is_empty() || d.len() > MAX_CHUNK_SIZE || buff.len() < d.len() {
            return Err(ApduError::InvalidLength);
        }

        buff[..d.len()].copy_from_slice(d);

        Ok(d.len())
    }

    #[inline]
    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(self.chunk.len())
    }
}

impl<'a> Decode<'a> for SignAtomBytes<'a> {
    type Output = Self;
    type Error = ApduError;

    /// Decode a [`SignAtomBytes`] APDU from the provided buffer
    #[inline]
    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.is_empty() || buff.len() > MAX_CHUNK_SIZE {
            #[cfg(feature = "log")]
            log::warn!("invalid chunk length {}", buff.len());

            return Err(ApduError::InvalidLength);
        }

        Ok((Self { chunk: buff }, buff.len()))
    }
}

/// Fetch atom signing state, returns [AtomInfo]
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct AtomInfoReq;

impl ApduStatic for AtomInfoReq {
    const CLA: u8 = RADIX_APDU_CLA;
    const INS: u8 = Instruction::GetInfo as u8;
}

/// Atom signing state, returned for all session APDUs
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     STATE     |     VALUE     |         BYTES_CONSUMED        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   TRANSFERS   |    OTHERS     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct AtomInfo {
    /// Current engine state
    pub state: AtomState,

    /// Value associated with the current state
    /// (remaining catalog entries or progress percentage, zero otherwise)
    pub value: u8,

    /// Atom bytes hashed so far
    pub consumed: u16,

    /// Transfers identified so far
    pub transfers: u8,

    /// Other items identified so far
    pub others: u8,
}

/// Fetch the transfer awaiting review, returns [TransferResp]
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct TransferReq;

impl ApduStatic for TransferReq {
    const CLA: u8 = RADIX_APDU_CLA;
    const INS: u8 = Instruction::GetTransfer as u8;
}

/// Transfer awaiting review
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                      ADDRESS (38 bytes)                       /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /               AMOUNT (32 bytes, big-endian u256)              /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  TOKEN_ID_LEN |                                               |
/// +-+-+-+-+-+-+-+-+                                               +
/// /                     TOKEN_ID (1..=67 bytes)                   /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct TransferResp {
    pub address: [u8; ADDRESS_LEN],
    pub amount: [u8; AMOUNT_LEN],
    pub token_id: Vec<u8, TOKEN_ID_MAX_LEN>,
}

impl TransferResp {
    pub fn new(
        address: [u8; ADDRESS_LEN],
        amount: [u8; AMOUNT_LEN],
        token_id: &[u8],
    ) -> Result<Self, ApduError> {
        let token_id = Vec::from_slice(token_id).map_err(|_| ApduError::InvalidLength)?;

        Ok(Self {
            address,
            amount,
            token_id,
        })
    }
}

impl Encode for TransferResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(ADDRESS_LEN + AMOUNT_LEN + 1 + self.token_id.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;
        index += arr::enc(&self.address, &mut buff[index..])?;
        index += arr::enc(&self.amount, &mut buff[index..])?;

        buff[index] = self.token_id.len() as u8;
        index += 1;

        buff[index..][..self.token_id.len()].copy_from_slice(&self.token_id);
        index += self.token_id.len();

        Ok(index)
    }
}

impl DecodeOwned for TransferResp {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        let mut index = 0;

        let (address, n) = arr::dec::<ADDRESS_LEN>(&buff[index..])?;
        index += n;

        let (amount, n) = arr::dec::<AMOUNT_LEN>(&buff[index..])?;
        index += n;

        if buff.len() <= index {
            return Err(ApduError::InvalidLength);
        }
        let l = buff[index] as usize;
        index += 1;

        if buff.len() < index + l {
            return Err(ApduError::InvalidLength);
        }
        let t = Self::new(address, amount, &buff[index..][..l])?;
        index += l;

        Ok((t, index))
    }
}

/// Fetch the atom signature once approved, returns [SignatureResp]
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct SignatureReq;

impl ApduStatic for SignatureReq {
    const CLA: u8 = RADIX_APDU_CLA;
    const INS: u8 = Instruction::GetSignature as u8;
}

/// Signed atom digest
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                       DIGEST (32 bytes)                       /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                  SIGNATURE (64 bytes, r || s)                 /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct SignatureResp {
    pub digest: Digest,

    #[encdec(with = "arr")]
    pub signature: [u8; SIGNATURE_LEN],
}

impl SignatureResp {
    pub fn new(digest: Digest, signature: [u8; SIGNATURE_LEN]) -> Self {
        Self { digest, signature }
    }
}

/// Complete the current session, releasing any held state
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct AtomComplete;

impl ApduStatic for AtomComplete {
    const CLA: u8 = RADIX_APDU_CLA;
    const INS: u8 = Instruction::Complete as u8;
}

#[cfg(test)]
mod test {
    use rand::random;

    use super::*;
    use crate::test::encode_decode_apdu;

    #[test]
    fn encode_decode_atom_init() {
        let path = Bip32Path::new(random(), 0, random()).unwrap();
        let apdu = SignAtomInit::new(path, 1200, 3, 2);

        let mut buff = [0u8; 256];
        let n = encode_decode_apdu(&mut buff, &apdu);

        assert_eq!(n, 16);
    }

    #[test]
    fn encode_decode_catalog() {
        let entries = [
            FieldCatalogEntry::transfer(
                FieldRange::new(0, 41),
                FieldRange::new(41, 35),
                FieldRange::new(76, 38),
                FieldRange::new(114, 46),
            ),
            FieldCatalogEntry::other(FieldRange::new(200, 20)),
        ];
        let apdu = SignAtomCatalog::new(&entries).unwrap();

        let mut buff = [0u8; 256];
        let n = encode_decode_apdu(&mut buff, &apdu);

        assert_eq!(n, 4 + 2 * FieldCatalogEntry::LEN);
        assert_eq!(&buff[4..8], &[0, 0, 41, 0]);
    }

    #[test]
    fn full_catalog_fits_apdu() {
        let entries = [FieldCatalogEntry::other(FieldRange::new(1, 2)); MAX_ITEMS];
        let apdu = SignAtomCatalog::new(&entries).unwrap();

        let mut buff = [0u8; 256];
        encode_decode_apdu(&mut buff, &apdu);
    }

    #[test]
    fn reject_oversized_catalog() {
        let mut buff = [0u8; 256];
        buff[0] = MAX_ITEMS as u8 + 1;

        assert!(matches!(
            SignAtomCatalog::decode(&buff),
            Err(ApduError::InvalidLength)
        ));
    }

    #[test]
    fn encode_decode_atom_bytes() {
        let chunk: [u8; 200] = core::array::from_fn(|i| i as u8);
        let apdu = SignAtomBytes::new(&chunk);

        let mut buff = [0u8; 256];
        let n = encode_decode_apdu(&mut buff, &apdu);

        assert_eq!(n, 200);
    }

    #[test]
    fn full_chunk_fits_apdu() {
        let chunk = [0x5a; MAX_CHUNK_SIZE];
        let apdu = SignAtomBytes::new(&chunk);

        assert_eq!(apdu.encode_len(), Ok(MAX_CHUNK_SIZE));

        let mut buff = [0u8; MAX_CHUNK_SIZE];
        let n = encode_decode_apdu(&mut buff, &apdu);

        assert_eq!(n, MAX_CHUNK_SIZE);
    }

    #[test]
    fn reject_invalid_atom_bytes() {
        let mut buff = [0u8; 8];
        assert!(SignAtomBytes::new(&[]).encode(&mut buff).is_err());
        assert!(SignAtomBytes::decode(&[]).is_err());

        let oversized = [0u8; MAX_CHUNK_SIZE + 1];
        assert!(SignAtomBytes::new(&oversized).encode(&mut [0u8; 512]).is_err());
        assert!(SignAtomBytes::decode(&oversized).is_err());
    }

    #[test]
    fn encode_decode_atom_info() {
        let apdu = AtomInfo {
            state: AtomState::PendingTransfer,
            value: 50,
            consumed: 80,
            transfers: 1,
            others: 0,
        };

        let mut buff = [0u8; 256];
        let n = encode_decode_apdu(&mut buff, &apdu);

        assert_eq!(n, 6);
    }

    #[test]
    fn encode_decode_transfer() {
        let mut address = [0u8; ADDRESS_LEN];
        address[0] = 0x02;
        address[1..33].copy_from_slice(&random::<[u8; 32]>());

        let token_id = b"/JH1P8f3znbyrDj8F4RWpix7hRkgxqHjdW2fNnKpR3v6ufXnknor/XRD";
        let apdu = TransferResp::new(address, random(), token_id).unwrap();

        let mut buff = [0u8; 256];
        encode_decode_apdu(&mut buff, &apdu);
    }

    #[test]
    fn encode_decode_signature() {
        let apdu = SignatureResp::new(Digest::from(random::<[u8; 32]>()), [0xa5; 64]);

        let mut buff = [0u8; 256];
        let n = encode_decode_apdu(&mut buff, &apdu);

        assert_eq!(n, 96);
    }

    #[test]
    fn encode_decode_requests() {
        let mut buff = [0u8; 16];

        assert_eq!(encode_decode_apdu(&mut buff, &AtomInfoReq), 0);
        assert_eq!(encode_decode_apdu(&mut buff, &TransferReq), 0);
        assert_eq!(encode_decode_apdu(&mut buff, &SignatureReq), 0);
        assert_eq!(encode_decode_apdu(&mut buff, &AtomComplete), 0);
    }
}
