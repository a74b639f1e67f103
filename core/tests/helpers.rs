#![allow(unused)]

use std::fmt::Debug;

use encdec::{Decode, Encode};
use log::{debug, trace};
use sha2::{Digest, Sha256};

use radix_ledger_core::{
    apdu::{prelude::*, ApduError, ApduStatic, MAX_CHUNK_SIZE},
    engine::{Driver, Engine, Error, Event, Output, Review, State, Transfer, TRANSFER_SERIALIZER},
};

/// Driver implementation for test use, keys are derived by hashing the seed and path
pub struct TestDriver {
    pub seed: [u8; 32],
}

impl TestDriver {
    pub fn new() -> Self {
        Self {
            seed: rand::random(),
        }
    }
}

impl Driver for TestDriver {
    fn public_key(&self, path: &[u32; 5]) -> [u8; 33] {
        let mut h = Sha256::new();
        h.update(self.seed);
        for p in path {
            h.update(p.to_le_bytes());
        }

        let mut k = [0x03; 33];
        k[1..].copy_from_slice(&h.finalize());
        k
    }

    fn sign_digest(&self, path: &[u32; 5], digest: &[u8; 32]) -> [u8; 64] {
        let k = self.public_key(path);

        let mut s = [0u8; 64];
        s[..32].copy_from_slice(&Sha256::digest(&k[..]));
        s[32..].copy_from_slice(&Sha256::digest(digest));
        s
    }
}

/// Engine wrapper exchanging requests via their APDU encodings
pub struct TestEngine {
    pub engine: Engine<TestDriver>,
}

impl TestEngine {
    pub fn new(drv: TestDriver) -> Self {
        Self {
            engine: Engine::new(drv),
        }
    }

    /// Encode a request, parse it to an [Event] and apply it to the engine
    pub fn exchange<REQ>(&mut self, req: &REQ) -> Result<Output, Error>
    where
        REQ: Encode<Error = ApduError> + ApduStatic + Debug,
    {
        let mut buff = [0u8; 256];

        debug!("cmd: {:?}", req);

        // Encode command to APDU (skipping header)
        let n = req.encode(&mut buff).unwrap();
        trace!("encoded: {:02x?}", &buff[..n]);
        assert!(n <= 255, "request too long for a short APDU: {req:?} ({n} bytes)");

        // Decode APDU to event
        let evt = match Event::parse(REQ::INS, &buff[..n]) {
            Ok(v) => v,
            Err(e) => panic!("Decode failed with {:?} for: {:02x?}", e, &buff[..n]),
        };

        // Handle event
        let r = self.engine.update(&evt)?;

        // Ensure response encodes within an APDU
        let mut resp = [0u8; 256];
        let m = r.encode(&mut resp).unwrap();
        assert!(m < 256, "encoded response too long for: {r:?} ({m} bytes)");

        Ok(r)
    }

    /// Fetch atom info via its response encoding
    pub fn info(&mut self) -> AtomInfo {
        let r = self.exchange(&AtomInfoReq).unwrap();

        let mut buff = [0u8; 256];
        let n = r.encode(&mut buff).unwrap();

        let (info, _) = AtomInfo::decode(&buff[..n]).unwrap();
        info
    }
}

/// Encode a CBOR byte or text string
pub fn cbor(major: u8, payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    match payload.len() {
        n @ 0..=23 => v.push(major << 5 | n as u8),
        n => v.extend_from_slice(&[major << 5 | 24, n as u8]),
    }
    v.extend_from_slice(payload);
    v
}

/// Encode a DSON prefixed byte string
pub fn dson(prefix: u8, data: &[u8]) -> Vec<u8> {
    let mut p = vec![prefix];
    p.extend_from_slice(data);
    cbor(2, &p)
}

/// Build an address for the provided public key
pub fn address_for(public_key: &[u8; 33]) -> [u8; 38] {
    let mut a = [0u8; 38];
    a[0] = 0x01;
    a[1..34].copy_from_slice(public_key);
    let checksum = Sha256::digest(&a[..34]);
    a[34..].copy_from_slice(&checksum[..4]);
    a
}

/// Random (third-party) address
pub fn random_address() -> [u8; 38] {
    let mut k = [0x02; 33];
    k[1..].copy_from_slice(&rand::random::<[u8; 32]>());
    address_for(&k)
}

/// Atom under construction, cataloged fields are appended with filler between
#[derive(Clone, Debug, Default)]
pub struct Atom {
    pub bytes: Vec<u8>,
    pub entries: Vec<FieldCatalogEntry>,
    pub transfers: u8,
}

impl Atom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append uncataloged bytes
    pub fn filler(&mut self, n: usize) -> &mut Self {
        self.bytes.extend((0..n).map(|i| 0xa0 | (i as u8 & 0x1f)));
        self
    }

    fn field(&mut self, raw: &[u8]) -> FieldRange {
        let r = FieldRange::new(self.bytes.len() as u16, raw.len() as u16);
        self.bytes.extend_from_slice(raw);
        r
    }

    /// Append a transferrable tokens item
    pub fn transfer(&mut self, address: &[u8; 38], amount: &[u8; 32], token: &[u8]) -> &mut Self {
        let a = self.field(&dson(0x04, address));
        let m = self.field(&dson(0x05, amount));
        let s = self.field(&cbor(3, TRANSFER_SERIALIZER.as_bytes()));
        let t = self.field(&dson(0x06, token));

        self.entries.push(FieldCatalogEntry::transfer(a, m, s, t));
        self.transfers += 1;
        self
    }

    /// Append a non-transfer item
    pub fn other(&mut self, serializer: &str) -> &mut Self {
        let s = self.field(&cbor(3, serializer.as_bytes()));

        self.entries.push(FieldCatalogEntry::other(s));
        self
    }

    pub fn init(&self, path: Bip32Path) -> SignAtomInit {
        SignAtomInit::new(
            path,
            self.bytes.len() as u16,
            self.entries.len() as u8,
            self.transfers,
        )
    }

    /// Expected (double SHA-256) atom digest
    pub fn digest(&self) -> [u8; 32] {
        let mut d = [0u8; 32];
        d.copy_from_slice(&Sha256::digest(Sha256::digest(&self.bytes)));
        d
    }
}

/// Result of an approved atom signing session
#[derive(Clone, Debug, Default)]
pub struct Signed {
    pub reviews: Vec<Review>,
    pub transfers: Vec<Transfer>,
    pub digest: [u8; 32],
    pub signature: Vec<u8>,
}

/// Start a session and load the catalog, `per_apdu` entries at a time
pub fn load_atom(
    e: &mut TestEngine,
    atom: &Atom,
    path: Bip32Path,
    per_apdu: usize,
) -> Result<(), Error> {
    e.exchange(&atom.init(path))?;

    for c in atom.entries.chunks(per_apdu) {
        e.exchange(&SignAtomCatalog::new(c).unwrap())?;
    }

    Ok(())
}

/// Approve reviews while the engine is pending, recording each
pub fn approve_pending(e: &mut TestEngine, s: &mut Signed) -> Result<(), Error> {
    while let State::Pending(r) = e.engine.state() {
        debug!("approving {}", r);

        if r == Review::Transfer {
            match e.exchange(&TransferReq)? {
                Output::Transfer(t) => s.transfers.push(t),
                o => panic!("unexpected transfer response: {o:?}"),
            }
        }

        s.reviews.push(r);
        e.engine.approve()?;
    }

    Ok(())
}

/// Sign an atom streamed in `chunk_size` chunks, approving every review
pub fn sign_atom(
    e: &mut TestEngine,
    atom: &Atom,
    path: Bip32Path,
    chunk_size: usize,
) -> Result<Signed, Error> {
    let chunks: Vec<&[u8]> = atom.bytes.chunks(chunk_size).collect();
    sign_atom_chunks(e, atom, path, &chunks)
}

/// Sign an atom streamed in the provided chunks, approving every review
pub fn sign_atom_chunks(
    e: &mut TestEngine,
    atom: &Atom,
    path: Bip32Path,
    chunks: &[&[u8]],
) -> Result<Signed, Error> {
    let mut s = Signed::default();

    load_atom(e, atom, path, 4)?;
    assert_eq!(e.engine.state(), State::SignAtom(Default::default()));

    for c in chunks {
        e.exchange(&SignAtomBytes::new(c))?;
        approve_pending(e, &mut s)?;
    }

    assert_eq!(e.engine.state(), State::Ready);

    match e.exchange(&SignatureReq)? {
        Output::Signature { digest, signature } => {
            s.digest = digest;
            s.signature = signature.to_vec();
        }
        o => panic!("unexpected signature response: {o:?}"),
    }

    e.exchange(&AtomComplete)?;
    assert_eq!(e.engine.state(), State::Complete);

    Ok(s)
}

/// Split a stream into pseudo-random chunks no larger than [MAX_CHUNK_SIZE]
pub fn random_chunks(bytes: &[u8]) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut rest = bytes;

    while !rest.is_empty() {
        let n = (rand::random::<usize>() % MAX_CHUNK_SIZE + 1).min(rest.len());
        let (c, r) = rest.split_at(n);
        chunks.push(c);
        rest = r;
    }

    chunks
}
