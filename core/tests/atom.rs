//! Streamed atom parsing and signing

use radix_ledger_core::{
    apdu::{prelude::*, MAX_CHUNK_SIZE, MAX_ITEMS},
    engine::{Driver, Error, ParseState, Review, State},
};

mod helpers;
use helpers::*;

fn setup() -> TestEngine {
    let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, Default::default());

    TestEngine::new(TestDriver::new())
}

fn path() -> Bip32Path {
    Bip32Path::new(0, 0, 0).unwrap()
}

const XRD: &[u8] = b"/JH1P8f3znbyrDj8F4RWpix7hRkgxqHjdW2fNnKpR3v6ufXnknor/XRD";

/// Single transfer of 160 bytes, fields spanning the boundary of two 80 byte chunks
#[test]
fn transfer_two_chunks() -> anyhow::Result<()> {
    let mut e = setup();

    let address = random_address();
    let amount = [0x11; 32];
    let token = &XRD[..43];

    let mut atom = Atom::new();
    atom.transfer(&address, &amount, token);

    // Check layout
    assert_eq!(atom.bytes.len(), 160);
    let entry = atom.entries[0];
    assert_eq!(entry.address, FieldRange::new(0, 41));
    assert_eq!(entry.amount, FieldRange::new(41, 35));
    assert_eq!(entry.serializer, FieldRange::new(76, 38));
    assert_eq!(entry.token_id, FieldRange::new(114, 46));

    load_atom(&mut e, &atom, path(), 1)?;

    // First chunk holds address and amount, serializer is split
    e.exchange(&SignAtomBytes::new(&atom.bytes[..80]))?;
    assert_eq!(e.engine.state(), State::SignAtom(ParseState::Stream));

    let info = e.info();
    assert_eq!(info.state, AtomState::Stream);
    assert_eq!(info.consumed, 80);
    assert_eq!(info.value, 50);

    // Second chunk completes the transfer
    e.exchange(&SignAtomBytes::new(&atom.bytes[80..]))?;
    assert_eq!(e.engine.state(), State::Pending(Review::Transfer));

    let t = e.engine.transfer().unwrap();
    assert_eq!(t.address, address);
    assert_eq!(t.amount, amount);
    assert_eq!(&t.token_id[..], token);

    let info = e.info();
    assert_eq!(info.state, AtomState::PendingTransfer);
    assert_eq!(info.transfers, 1);

    // Approve transfer, then hash
    e.engine.approve()?;
    assert_eq!(e.engine.state(), State::Pending(Review::Hash));
    assert_eq!(e.engine.digest(), Some(atom.digest()));

    e.engine.approve()?;
    assert_eq!(e.engine.state(), State::Ready);

    Ok(())
}

/// Digest and reviews are independent of chunking
#[test]
fn chunking_independent() -> anyhow::Result<()> {
    let mut atom = Atom::new();
    atom.filler(30)
        .transfer(&random_address(), &[0x22; 32], XRD)
        .filler(200)
        .other("radix.particles.rri")
        .filler(12)
        .transfer(&random_address(), &[0x33; 32], b"/abc/XYZ")
        .filler(300);

    let mut e = setup();
    let expected = sign_atom(&mut e, &atom, path(), atom.bytes.len().min(MAX_CHUNK_SIZE))?;

    assert_eq!(expected.digest, atom.digest());
    assert_eq!(
        expected.reviews,
        &[
            Review::Transfer,
            Review::NonTransfer,
            Review::Transfer,
            Review::Hash
        ]
    );

    for size in [1, 2, 7, 41, 64, 128, MAX_CHUNK_SIZE] {
        let mut e = setup();
        let s = sign_atom(&mut e, &atom, path(), size)?;

        assert_eq!(s.digest, expected.digest, "chunk size {size}");
        assert_eq!(s.reviews, expected.reviews, "chunk size {size}");
        assert_eq!(s.transfers, expected.transfers, "chunk size {size}");
    }

    for _i in 0..20 {
        let mut e = setup();
        let chunks = random_chunks(&atom.bytes);
        let s = sign_atom_chunks(&mut e, &atom, path(), &chunks)?;

        assert_eq!(s.digest, expected.digest);
        assert_eq!(s.reviews, expected.reviews);
    }

    Ok(())
}

/// Fields split at every offset are reassembled
#[test]
fn split_every_offset() -> anyhow::Result<()> {
    let mut atom = Atom::new();
    atom.filler(5).transfer(&random_address(), &[0x44; 32], XRD);

    for split in 1..atom.bytes.len() {
        let mut e = setup();
        let (a, b) = atom.bytes.split_at(split);

        let s = sign_atom_chunks(&mut e, &atom, path(), &[a, b])?;

        assert_eq!(s.transfers.len(), 1, "split at {split}");
        assert_eq!(&s.transfers[0].token_id[..], XRD);
        assert_eq!(s.digest, atom.digest());
    }

    Ok(())
}

/// Transfers to the signing key are not reviewed
#[test]
fn own_transfer_skipped() -> anyhow::Result<()> {
    let seed = rand::random();
    let d = TestDriver { seed };
    let own = address_for(&d.public_key(&path().components()));

    let mut atom = Atom::new();
    atom.transfer(&random_address(), &[0x55; 32], XRD)
        .filler(10)
        .transfer(&own, &[0x66; 32], XRD);

    let mut e = TestEngine::new(d);
    let s = sign_atom(&mut e, &atom, path(), 100)?;

    assert_eq!(s.reviews, &[Review::Transfer, Review::Hash]);
    assert_eq!(s.transfers.len(), 1);

    // A different path does not match the change address
    let mut e = TestEngine::new(TestDriver { seed });
    let s = sign_atom(&mut e, &atom, Bip32Path::new(0, 0, 1).unwrap(), 100)?;
    assert_eq!(s.reviews, &[Review::Transfer, Review::Transfer, Review::Hash]);

    Ok(())
}

/// Non-transfer data is reviewed once per atom
#[test]
fn non_transfer_review() -> anyhow::Result<()> {
    let mut e = setup();

    let mut atom = Atom::new();
    atom.other("radix.particles.message")
        .filler(20)
        .other("radix.particles.unique")
        .filler(20)
        .transfer(&random_address(), &[0x77; 32], XRD)
        .other("radix.particles.message");

    load_atom(&mut e, &atom, path(), 15)?;

    e.exchange(&SignAtomBytes::new(&atom.bytes[..30]))?;
    assert_eq!(e.engine.state(), State::Pending(Review::NonTransfer));

    // Transfers are only reported while reviewing a transfer
    assert_eq!(e.exchange(&TransferReq), Err(Error::UnexpectedEvent));
    assert!(e.engine.transfer().is_none());

    let mut s = Signed::default();
    approve_pending(&mut e, &mut s)?;

    for c in atom.bytes[30..].chunks(50) {
        e.exchange(&SignAtomBytes::new(c))?;
        approve_pending(&mut e, &mut s)?;
    }

    assert_eq!(
        s.reviews,
        &[Review::NonTransfer, Review::Transfer, Review::Hash]
    );
    assert_eq!(e.engine.state(), State::Ready);

    let info = e.info();
    assert_eq!(info.state, AtomState::Ready);
    assert_eq!(info.transfers, 1);
    assert_eq!(info.others, 3);

    Ok(())
}

/// Bytes are refused, and not hashed, while a review is pending
#[test]
fn pending_refuses_bytes() -> anyhow::Result<()> {
    let mut e = setup();

    let mut atom = Atom::new();
    atom.transfer(&random_address(), &[0x12; 32], XRD).filler(100);

    load_atom(&mut e, &atom, path(), 1)?;

    let (a, b) = atom.bytes.split_at(200);
    e.exchange(&SignAtomBytes::new(a))?;
    assert_eq!(e.engine.state(), State::Pending(Review::Transfer));

    assert_eq!(
        e.exchange(&SignAtomBytes::new(b)),
        Err(Error::ApprovalPending)
    );
    assert_eq!(e.info().consumed, 200);

    // Resend following approval
    e.engine.approve()?;
    e.exchange(&SignAtomBytes::new(b))?;
    assert_eq!(e.engine.state(), State::Pending(Review::Hash));
    assert_eq!(e.engine.digest(), Some(atom.digest()));

    Ok(())
}

/// Denied sessions refuse further progress
#[test]
fn deny_transfer() -> anyhow::Result<()> {
    let mut e = setup();

    let mut atom = Atom::new();
    atom.transfer(&random_address(), &[0x12; 32], XRD).filler(100);

    load_atom(&mut e, &atom, path(), 1)?;
    e.exchange(&SignAtomBytes::new(&atom.bytes[..200]))?;

    e.engine.deny();
    assert_eq!(e.info().state, AtomState::Denied);

    assert_eq!(
        e.exchange(&SignAtomBytes::new(&atom.bytes[200..])),
        Err(Error::UserRejected)
    );
    assert_eq!(e.exchange(&SignatureReq), Err(Error::UserRejected));
    assert_eq!(e.exchange(&TransferReq), Err(Error::UserRejected));

    // A new session may be started
    let s = sign_atom(&mut e, &atom, path(), 64)?;
    assert_eq!(s.digest, atom.digest());

    Ok(())
}

/// Item counts must match the stream
#[test]
fn counter_mismatch() -> anyhow::Result<()> {
    let mut atom = Atom::new();
    atom.other("radix.particles.message")
        .transfer(&random_address(), &[0x12; 32], XRD);

    // Declaring fewer transfers than present overruns the counter
    let mut e = setup();
    e.exchange(&SignAtomInit::new(path(), atom.bytes.len() as u16, 2, 0))?;
    e.exchange(&SignAtomCatalog::new(&atom.entries).unwrap())?;

    e.exchange(&SignAtomBytes::new(&atom.bytes))?;
    assert_eq!(e.engine.approve(), Err(Error::CounterOverrun));
    assert_eq!(e.engine.state(), State::Error);
    assert_eq!(e.info().state, AtomState::Error);

    // Declaring more items than cataloged leaves the catalog incomplete
    let mut e = setup();
    e.exchange(&SignAtomInit::new(path(), atom.bytes.len() as u16, 3, 1))?;
    e.exchange(&SignAtomCatalog::new(&atom.entries).unwrap())?;
    assert_eq!(e.engine.state(), State::SignAtom(ParseState::Catalog(1)));
    assert_eq!(e.info().value, 1);

    assert_eq!(
        e.exchange(&SignAtomBytes::new(&atom.bytes)),
        Err(Error::UnexpectedEvent)
    );

    // Declaring more transfers than items is rejected at init
    let mut e = setup();
    assert_eq!(
        e.exchange(&SignAtomInit::new(path(), 100, 1, 2)),
        Err(Error::ProtocolMismatch)
    );

    Ok(())
}

/// Catalog entries must be ordered, bounded and within the atom
#[test]
fn catalog_validation() -> anyhow::Result<()> {
    let mut atom = Atom::new();
    atom.other("radix.particles.message")
        .filler(10)
        .other("radix.particles.unique");

    // Out of order
    let mut e = setup();
    e.exchange(&SignAtomInit::new(path(), atom.bytes.len() as u16, 2, 0))?;
    let entries = [atom.entries[1], atom.entries[0]];
    assert_eq!(
        e.exchange(&SignAtomCatalog::new(&entries).unwrap()),
        Err(Error::ProtocolMismatch)
    );
    assert_eq!(e.engine.state(), State::Error);

    // Past the end of the atom
    let mut e = setup();
    e.exchange(&SignAtomInit::new(path(), 20, 2, 0))?;
    assert_eq!(
        e.exchange(&SignAtomCatalog::new(&atom.entries).unwrap()),
        Err(Error::ProtocolMismatch)
    );

    // Fields larger than the window allows
    let mut e = setup();
    e.exchange(&SignAtomInit::new(path(), 1000, 1, 0))?;
    let large = FieldCatalogEntry::other(FieldRange::new(0, 71));
    assert_eq!(
        e.exchange(&SignAtomCatalog::new(&[large]).unwrap()),
        Err(Error::CapacityExceeded)
    );

    // Partial transfer entries
    let mut e = setup();
    e.exchange(&SignAtomInit::new(path(), 1000, 1, 1))?;
    let mut partial = FieldCatalogEntry::other(FieldRange::new(100, 30));
    partial.address = FieldRange::new(0, 41);
    assert_eq!(
        e.exchange(&SignAtomCatalog::new(&[partial]).unwrap()),
        Err(Error::ProtocolMismatch)
    );

    Ok(())
}

/// Field contents must match the cataloged kind
#[test]
fn malformed_fields() -> anyhow::Result<()> {
    let mut atom = Atom::new();
    atom.transfer(&random_address(), &[0x12; 32], XRD);

    // Serializer disagreeing with a transfer entry
    let mut bad = atom.clone();
    let s = bad.entries[0].serializer.start as usize + 2;
    bad.bytes[s..s + 5].copy_from_slice(b"xxxxx");

    let mut e = setup();
    load_atom(&mut e, &bad, path(), 1)?;
    assert_eq!(
        e.exchange(&SignAtomBytes::new(&bad.bytes)),
        Err(Error::ProtocolMismatch)
    );
    assert_eq!(e.engine.state(), State::Error);

    // Address with the wrong CBOR type
    let mut bad = atom.clone();
    bad.bytes[0] = 0x78;

    let mut e = setup();
    load_atom(&mut e, &bad, path(), 1)?;
    assert_eq!(
        e.exchange(&SignAtomBytes::new(&bad.bytes)),
        Err(Error::MalformedEncoding)
    );

    Ok(())
}

/// Streams longer than the declared atom are rejected
#[test]
fn stream_overrun() -> anyhow::Result<()> {
    let mut atom = Atom::new();
    atom.other("radix.particles.message").filler(20);

    let mut e = setup();
    load_atom(&mut e, &atom, path(), 1)?;

    let mut bytes = atom.bytes.clone();
    bytes.push(0xff);

    let mut s = Signed::default();
    e.exchange(&SignAtomBytes::new(&bytes[..10]))?;
    approve_pending(&mut e, &mut s)?;

    assert_eq!(
        e.exchange(&SignAtomBytes::new(&bytes[10..])),
        Err(Error::InvalidLength)
    );
    assert_eq!(e.engine.state(), State::Error);

    Ok(())
}

/// Long atoms with many items stream within the fixed window
#[test]
fn long_atom() -> anyhow::Result<()> {
    let mut atom = Atom::new();
    for i in 0..MAX_ITEMS {
        atom.filler(1500);
        match i % 3 {
            0 => atom.other("radix.particles.message"),
            _ => atom.transfer(&random_address(), &[i as u8; 32], XRD),
        };
    }
    atom.filler(10_000);

    let mut e = setup();
    let s = sign_atom(&mut e, &atom, path(), MAX_CHUNK_SIZE)?;

    assert_eq!(s.transfers.len(), 10);
    assert_eq!(s.digest, atom.digest());

    Ok(())
}
