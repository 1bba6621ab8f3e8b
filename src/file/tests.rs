use std::{
    fmt::Write,
    io::{self, BufReader, Read},
};

use expect_test::{expect, Expect};

use crate::error::ErrorKind;

use super::{Marker, SegmentReader};

fn dump(jpeg: &[u8]) -> String {
    fn dump_impl(jpeg: &[u8], out: &mut String) -> crate::error::Result<()> {
        let mut reader = SegmentReader::new(jpeg);

        while let Some(segment) = reader.next_segment()? {
            writeln!(
                out,
                "{:04X} [FF {:02X}] {:?} {:x?}",
                segment.offset(),
                segment.marker().0,
                segment.marker(),
                segment.data(),
            )
            .unwrap();
        }
        Ok(())
    }

    let mut out = String::new();
    if let Err(e) = dump_impl(jpeg, &mut out) {
        writeln!(out, "error: {e}").unwrap();
    }

    out
}

fn check(jpeg: &[u8], expect: Expect) {
    expect.assert_eq(&dump(jpeg));
}

#[test]
fn empty() {
    check(&[], expect![[""]]);
    check(
        &[0xFF],
        expect![[r#"
            error: unexpected end of stream
        "#]],
    );
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xFF, // fill bytes, then nothing
        ],
        expect![[r#"
            0000 [FF D8] SOI []
            error: unexpected end of stream
        "#]],
    );
    check(
        &[0xFF, 0xD8 /* SOI */],
        expect![[r#"
            0000 [FF D8] SOI []
        "#]],
    );
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xD9, // EOI
        ],
        expect![[r#"
            0000 [FF D8] SOI []
            0002 [FF D9] EOI []
        "#]],
    );
}

#[test]
fn app() {
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, // APP0
            0x00, 0x02, // empty
            0xFF, 0xD9, // EOI
        ],
        expect![[r#"
            0000 [FF D8] SOI []
            0002 [FF E0] APP0 []
            0006 [FF D9] EOI []
        "#]],
    );
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, // APP0
            0x00, 0x04, // 2 more bytes after this
            0x00, 0x00, // APP0 contents (non-JFIF)
            0xFF, 0xDD, // DRI
            0x00, 0x04, // length
            0x00, 0x0F, // Ri
            0xFF, 0xD9, // EOI
        ],
        expect![[r#"
            0000 [FF D8] SOI []
            0002 [FF E0] APP0 [0, 0]
            0008 [FF DD] DRI [0, f]
            000E [FF D9] EOI []
        "#]],
    );
}

#[test]
fn standalone_markers() {
    check(
        &[
            0xFF, 0xD0, // RST0
            0xFF, 0xD7, // RST7
            0xFF, 0x01, // TEM
            0xFF, 0xC8, // JPG (reserved)
            0x00, 0x03, 0xAB, // 1 byte payload
        ],
        expect![[r#"
            0000 [FF D0] RST0 []
            0002 [FF D7] RST7 []
            0004 [FF 01] TEM []
            0006 [FF C8] Marker(c8) [ab]
        "#]],
    );
}

#[test]
fn fill_bytes_and_garbage() {
    check(
        &[
            0xFF, 0xD8, // SOI
            0x12, 0x34, // garbage
            0xFF, 0xFF, 0xFF, 0xD9, // EOI with fill bytes
        ],
        expect![[r#"
            0000 [FF D8] SOI []
            0006 [FF D9] EOI []
        "#]],
    );
    check(
        &[
            0xFF, 0xD8, // SOI
            0x00, 0x00, 0x00, // trailing garbage
        ],
        expect![[r#"
            0000 [FF D8] SOI []
        "#]],
    );
}

#[test]
fn frame_and_scan_headers() {
    check(
        &[
            0xFF, 0xC2, // SOF2
            0x00, 0x08, // length
            0x08, 0x00, 0x02, 0x00, 0x03, 0x01, // P, Y, X, Nf
            0xFF, 0xDA, // SOS
            0x00, 0x03, // length
            0x01, // Ns
        ],
        expect![[r#"
            0000 [FF C2] SOF2 [8, 0, 2, 0, 3, 1]
            000A [FF DA] SOS [1]
        "#]],
    );
}

#[test]
fn malformed() {
    check(
        &[
            0xFF, 0xD8, // SOI
            0xFF, 0xE2, // APP2
            0x00, 0x10, // 14 bytes of payload
            0x01, 0x02, // ...but only 2 present
        ],
        expect![[r#"
            0000 [FF D8] SOI []
            error: segment truncated: expected 14 bytes of segment data, got 2
        "#]],
    );
    check(
        &[
            0xFF, 0xE1, // APP1
            0x00, 0x01, // too short to include the length itself
        ],
        expect![[r#"
            error: invalid segment length 1
        "#]],
    );
    check(
        &[0xFF, 0x00],
        expect![[r#"
            error: invalid ff 00 marker at offset 0
        "#]],
    );
    check(
        &[
            0xFF, 0xDB, // DQT
            0x00, // half a length field
        ],
        expect![[r#"
            error: reached end of data while decoding JPEG stream
        "#]],
    );
}

#[test]
fn malformed_errors_have_malformed_kind() {
    let mut reader = SegmentReader::new(&[0xFF, 0xE1, 0x00, 0x01][..]);
    let err = reader.next_segment().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[test]
fn io_errors_are_propagated() {
    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    let mut reader = SegmentReader::new(BufReader::new(Failing));
    let err = reader.next_segment().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn interrupted_reads_are_retried() {
    struct Interrupting<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for Interrupting<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            let n = buf.len().min(self.data.len()).min(3);
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    let jpeg = [
        0xFF, 0xD8, // SOI
        0xFF, 0xE0, 0x00, 0x04, 0xAA, 0xBB, // APP0
        0xFF, 0xD9, // EOI
    ];
    let reader = Interrupting {
        data: &jpeg,
        interrupt: false,
    };
    let mut reader = SegmentReader::new(BufReader::with_capacity(3, reader));
    let mut markers = Vec::new();
    while let Some(segment) = reader.next_segment().unwrap() {
        markers.push(segment.marker());
    }
    assert_eq!(markers, [Marker::SOI, Marker::APP0, Marker::EOI]);
}

#[test]
fn position_tracks_consumed_bytes() {
    let jpeg = [
        0xFF, 0xD8, // SOI
        0xFF, 0xE0, 0x00, 0x04, 0xAA, 0xBB, // APP0
        0xFF, 0xD9, // EOI
        0x00, 0x00, // never read
    ];
    let mut reader = SegmentReader::new(&jpeg[..]);
    assert_eq!(reader.next_segment().unwrap().unwrap().marker(), Marker::SOI);
    assert_eq!(reader.position(), 2);
    let app0 = reader.next_segment().unwrap().unwrap();
    assert_eq!(app0.marker().app_n(), Some(0));
    assert_eq!(app0.into_data(), [0xAA, 0xBB]);
    assert_eq!(reader.position(), 8);
    assert_eq!(reader.next_segment().unwrap().unwrap().marker(), Marker::EOI);
    assert_eq!(reader.position(), 10);
}

#[test]
fn marker_classification() {
    assert!(Marker::SOF0.is_sof());
    assert!(Marker::SOF2.is_sof());
    assert!(!Marker::DHT.is_sof());
    assert!(!Marker(0xC8).is_sof());
    assert!(!Marker(0xCC).is_sof());
    assert!(Marker::SOF15.is_sof());
    assert_eq!(format!("{:?}", Marker::SOF15), "SOF15");
    assert_eq!(format!("{:?}", Marker::SOF9), "SOF9");
    assert!(Marker::EOI.is_standalone());
    assert!(Marker(0xD3).is_standalone());
    assert!(!Marker::SOS.is_standalone());
    assert_eq!(Marker::APP2.app_n(), Some(2));
    assert_eq!(Marker::APP15.app_n(), Some(15));
    assert_eq!(Marker::COM.app_n(), None);
}
