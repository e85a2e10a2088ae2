mod common;

use common::{hello_world, ldstr, tiny, ImageBuilder, HELLO_WORLD, TEXT_OFFSET};
use dotredact::prelude::*;

const OPTIONAL_HEADER_OFFSET: usize = 0x98;

#[test]
fn truncated_dos_header() {
    let data = hello_world(0x00).data[..127].to_vec();
    assert!(matches!(
        CilImage::from_mem(data),
        Err(Error::OutOfBounds { .. })
    ));
}

#[test]
fn pe_signature() {
    for index in 0x80..0x84 {
        let mut data = hello_world(0x00).data;
        data[index] ^= 0xFF;
        assert!(
            matches!(CilImage::from_mem(data), Err(Error::Malformed { .. })),
            "byte {index:#x}"
        );
    }
}

#[test]
fn not_managed() {
    let mut data = hello_world(0x00).data;
    data[OPTIONAL_HEADER_OFFSET + 208..OPTIONAL_HEADER_OFFSET + 216].fill(0);

    assert!(matches!(CilImage::from_mem(data), Err(Error::NotSupported)));
}

#[test]
fn cli_header_size() {
    let mut data = hello_world(0x00).data;
    data[TEXT_OFFSET + 8] = 0x40;

    assert!(matches!(
        CilImage::from_mem(data),
        Err(Error::Malformed { .. })
    ));
}

#[test]
fn metadata_signature() {
    let built = hello_world(0x00);
    let mut data = built.data;
    data[built.metadata_offset] = b'X';

    assert!(matches!(
        CilImage::from_mem(data),
        Err(Error::Malformed { .. })
    ));
}

#[test]
fn unsupported_table() {
    let built = hello_world(0x00);
    let mut data = built.data;
    // valid bit 0x2D
    data[built.tables_range.start + 8 + 5] |= 0x20;

    assert!(matches!(
        CilImage::from_mem(data),
        Err(Error::UnsupportedTable(0x2D))
    ));
}

#[test]
fn table_overrun() {
    let built = hello_world(0x00);
    let mut data = built.data;
    // MethodDef is the fifth row count
    let count = built.tables_range.start + 24 + 4 * 4;
    data[count..count + 4].copy_from_slice(&0xFFFFu32.to_le_bytes());

    assert!(matches!(
        CilImage::from_mem(data),
        Err(Error::Malformed { .. })
    ));
}

#[test]
fn per_method_failures() {
    let builder = ImageBuilder::default().user_string(HELLO_WORLD);
    let hello = builder.us_offset(0);

    let mut good = ldstr(hello).to_vec();
    good.extend_from_slice(&[0x26, 0x2A]);

    let mut undefined = ldstr(hello).to_vec();
    undefined.extend_from_slice(&[0x24, 0x2A]);

    let built = builder
        .method("Good", tiny(&good))
        .abstract_method("Abstract")
        .method("Undefined", tiny(&undefined))
        .method("BadHeader", vec![0x00, 0x00, 0x2A])
        .method_at("Unmapped", 0x9000)
        .method("Truncated", tiny(&[0x00, 0x72, 0x01]))
        .build();

    let image = CilImage::from_mem(built.data).unwrap();
    let report = scan(&image, &ScanConfig::default());

    assert_eq!(report.methods_without_body, 1);
    assert_eq!(report.methods_scanned, 1);
    assert_eq!(report.loads.len(), 1);
    assert_eq!(report.loads[0].rid, 1);
    assert_eq!(report.loads[0].value, HELLO_WORLD);

    let failed: Vec<u32> = report.failures.iter().map(|failure| failure.rid).collect();
    assert_eq!(failed, [3, 4, 5, 6]);
    assert!(!report.is_complete());

    assert!(matches!(report.failures[0].error, Error::Malformed { .. }));
    assert!(matches!(
        report.failures[1].error,
        Error::InvalidMethodHeader { value: 0x00, .. }
    ));
    assert!(matches!(
        report.failures[2].error,
        Error::UnmappedRva { rva: 0x9000 }
    ));
    assert!(matches!(report.failures[3].error, Error::OutOfBounds { .. }));
    assert_eq!(report.failures[3].token.value(), 0x0600_0006);
}

#[test]
fn foreign_string_token() {
    let builder = ImageBuilder::default().user_string(HELLO_WORLD);
    let hello = builder.us_offset(0);

    #[rustfmt::skip]
    let mut code = vec![
        0x72, 0x01, 0x00, 0x00, 0x0A,       // ldstr with a MemberRef token
        0x26,
    ];
    code.extend_from_slice(&ldstr(hello));
    code.push(0x2A);

    let image = CilImage::from_mem(builder.method("Main", tiny(&code)).build().data).unwrap();

    let strict = scan(&image, &ScanConfig::default());
    assert!(strict.loads.is_empty());
    assert_eq!(strict.failures.len(), 1);
    assert!(matches!(strict.failures[0].error, Error::Malformed { .. }));

    let lenient = scan(&image, &ScanConfig::lenient());
    assert!(lenient.is_complete());
    assert_eq!(lenient.loads.len(), 1);
    assert_eq!(lenient.loads[0].value, HELLO_WORLD);
    assert_eq!(lenient.loads[0].token.value(), 0x7000_0000 | hello);

    // the skipped instruction sits right before `pop`
    let skipped = lenient.loads[0].instruction_offset - 6;
    assert_eq!(image.data()[skipped], 0x72);
}

#[test]
fn string_offset_past_heap() {
    let builder = ImageBuilder::default().user_string(HELLO_WORLD);

    let mut code = ldstr(0x4000).to_vec();
    code.push(0x2A);

    let image = CilImage::from_mem(builder.method("Main", tiny(&code)).build().data).unwrap();
    let report = scan(&image, &ScanConfig::sequential());

    assert!(report.loads.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, Error::OutOfBounds { .. }));
}

#[test]
fn empty_string() {
    let mut code = ldstr(0).to_vec();
    code.push(0x2A);

    let built = ImageBuilder::default().method("Main", tiny(&code)).build();
    let image = CilImage::from_mem(built.data.clone()).unwrap();
    let config = ScanConfig::default();
    let report = scan(&image, &config);

    assert_eq!(report.loads.len(), 1);
    assert_eq!(report.loads[0].value, "");
    assert_eq!(report.loads[0].flag, None);
    assert!(report.loads[0].payload.is_empty());

    let redacted = redact(&image, &report, &config).unwrap();
    assert_eq!(redacted.data(), built.data.as_slice());
    assert_eq!(redacted.patched_bytes(), 0);
}

#[test]
fn string_offset_inside_entry() {
    let long = "x".repeat(100);
    let builder = ImageBuilder::default()
        .user_string("AB")
        .user_string("secret")
        .user_string(&long);
    let inside = builder.us_offset(0) + 1;
    let secret = builder.us_offset(1);

    // the first payload byte of "AB" reads as a 65 byte length prefix
    let mut misaligned = ldstr(inside).to_vec();
    misaligned.extend_from_slice(&[0x26, 0x2A]);

    let mut aligned = ldstr(secret).to_vec();
    aligned.extend_from_slice(&[0x26, 0x2A]);

    let built = builder
        .method("Misaligned", tiny(&misaligned))
        .method("Aligned", tiny(&aligned))
        .build();
    let image = CilImage::from_mem(built.data.clone()).unwrap();
    let config = ScanConfig::default();
    let report = scan(&image, &config);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].rid, 1);
    assert!(matches!(report.failures[0].error, Error::Malformed { .. }));
    assert_eq!(report.loads.len(), 1);
    assert_eq!(report.loads[0].value, "secret");

    // only the payload of "secret" changes, its prefix and the other entries stay intact
    let redacted = redact(&image, &report, &config).unwrap();
    let payload = built.payload_range(1, "secret");
    assert_eq!(redacted.patched(), &[payload.clone()]);
    for (index, (before, after)) in built.data.iter().zip(redacted.data()).enumerate() {
        if !payload.contains(&index) {
            assert_eq!(before, after, "byte {index:#x} changed");
        }
    }

    let reloaded = CilImage::from_mem(redacted.into_vec()).unwrap();
    let heap = reloaded.userstrings().unwrap();
    let ab = heap.get(built.us_offsets[0] as usize).unwrap();
    assert_eq!(ab.to_string_lossy(), "AB");
    assert_eq!(heap.get(secret as usize).unwrap().length, 13);
    let tail = heap.get(built.us_offsets[2] as usize).unwrap();
    assert_eq!(tail.to_string_lossy(), long);
}

#[test]
fn native_code() {
    let builder = ImageBuilder::default().user_string(HELLO_WORLD);
    let hello = builder.us_offset(0);

    let mut code = ldstr(hello).to_vec();
    code.extend_from_slice(&[0x26, 0x2A]);

    // a valid CIL body and an invalid header, both behind native methods
    let built = builder
        .method("Main", tiny(&code))
        .native_method("Lookalike", tiny(&code))
        .native_method("Stub", vec![0x00, 0x00, 0xC3])
        .build();
    assert!(built.method_rvas[1..].iter().all(|&rva| rva != 0));

    let image = CilImage::from_mem(built.data).unwrap();
    let lookalike = image.tables().method_def.get(2).unwrap();
    assert_eq!(lookalike.code_type(), MethodImplCodeType::NATIVE);
    assert!(!lookalike.has_body());

    let report = scan(&image, &ScanConfig::default());
    assert!(report.is_complete());
    assert_eq!(report.methods_scanned, 1);
    assert_eq!(report.methods_without_body, 2);
    assert_eq!(report.loads.len(), 1);
    assert_eq!(report.loads[0].rid, 1);
}
