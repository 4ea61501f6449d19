mod common;

use std::fs;

use common::*;
use spb_codec::options::DEFAULT_MAX_DEPTH;
use spb_codec::{
    Decoder, Document, Element, Encoder, Location, Node, SpbError, compile_file, decompile_file,
    metadata_path_for, parse_document, roundtrip_bytes, to_xml_string,
};

fn zero_header() -> [i32; 12] {
    [0; 12]
}

#[test]
fn single_long_property_decodes_to_one_element() {
    let bank = score_bank();
    let bytes = stream(zero_header(), &[(SCORE, 0)], Body::new().words(&[1, 42]));
    assert_eq!(bytes[..2], [0xAC, 0xEB]);

    let decoded = Decoder::new(&bank).decode(&bytes).unwrap();
    assert_eq!(
        decoded.document.children,
        [Node::Element(Element::with_text("Score", "42"))]
    );
    assert_eq!(decoded.metadata.header[6], 2);

    let xml = to_xml_string(&decoded.document).unwrap();
    insta::assert_snapshot!(xml, @r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <Score>42</Score>
    "#);

    let encoded = Encoder::new(&bank)
        .encode(&parse_document(&xml).unwrap(), &decoded.metadata)
        .unwrap();
    assert_eq!(encoded, bytes);
}

#[test]
fn unbound_guid_aborts_decode() {
    let bank = score_bank();
    let bytes = stream(zero_header(), &[(0xDEAD, 0)], Body::new().words(&[1, 42]));
    let err = Decoder::new(&bank).decode(&bytes).unwrap_err();
    match err {
        SpbError::UnboundSymbol { guid, at } => {
            assert_eq!(guid, "{00000000-0000-0000-0000-00000000DEAD}");
            assert_eq!(at, Location::Offset(body_offset(0)));
        }
        other => panic!("expected UnboundSymbol, got {other:?}"),
    }
}

#[test]
fn unknown_element_aborts_encode() {
    let bank = score_bank();
    let bytes = stream(zero_header(), &[(SCORE, 0)], Body::new().words(&[1, 42]));
    let decoded = Decoder::new(&bank).decode(&bytes).unwrap();

    let mut document = decoded.document.clone();
    document
        .children
        .push(Node::Element(Element::with_text("Bogus", "1")));
    let err = Encoder::new(&bank)
        .encode(&document, &decoded.metadata)
        .unwrap_err();
    assert!(
        matches!(err, SpbError::UnknownElement { ref name, at: Location::Path(ref path) } if name == "Bogus" && path == "/Bogus[1]"),
        "{err}"
    );
}

fn mission_stream() -> Vec<u8> {
    let tags = [
        (MISSION, 0x10),
        (TITLE, 0),
        (LEG, 7),
        (SCORE, 0),
        (HEADING, 0),
        (ORIENTATION, -1),
        (INSTANCE_ID, 2),
    ];
    let leg = Body::new()
        .words(&[4, 42])
        .words(&[5, 2])
        .word(6)
        .words(&[0, 1 << 30, i32::MIN, 0]);
    let mission = Body::new()
        .word(7)
        .guid(PIPER_CUB)
        .word(2)
        .text("Hop")
        .set(3, leg);
    stream(HEADER, &tags, Body::new().set(1, mission))
}

#[test]
fn nested_sets_render_context_qualified_names() {
    let bank = world_bank();
    let models = models();
    let decoder = Decoder::new(&bank).with_models(&models);
    let decoded = decoder.decode(&mission_stream()).unwrap();

    insta::assert_snapshot!(to_xml_string(&decoded.document).unwrap(), @r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <WorldBase.Mission InstanceId="{00000000-0000-0000-0000-000000000099}">
      <!--Model: Piper Cub-->
      <Title>Hop</Title>
      <Mission.Leg>
        <WorldBase.Score>42</WorldBase.Score>
        <WorldBase.Heading>South</WorldBase.Heading>
        <WorldBase.Orientation>0.000,90.000,180.000</WorldBase.Orientation>
      </Mission.Leg>
    </WorldBase.Mission>
    "#);

    let sets: Vec<_> = decoded
        .metadata
        .sets
        .iter()
        .map(|entry| entry.name.as_str())
        .collect();
    assert_eq!(sets, ["WorldBase.Mission", "Mission.Leg"]);
    assert_eq!(decoded.metadata.sets[0].offset, body_offset(7) + 8);
}

#[test]
fn nested_sets_round_trip_bit_exact() {
    let bank = world_bank();
    let models = models();
    let bytes = mission_stream();
    let report = roundtrip_bytes(
        &Decoder::new(&bank).with_models(&models),
        &Encoder::new(&bank),
        &bytes,
    )
    .unwrap();
    assert!(report.is_exact(), "{report:?}");
    assert_eq!(report.encoded_len, bytes.len());
}

#[test]
fn qualifier_selects_between_same_named_properties() {
    let bank = world_bank();
    let bytes = stream(
        HEADER,
        &[(SCORE, 0), (SCENERY_SCORE, 0)],
        Body::new().words(&[1, -5, 2, 7]),
    );
    let decoded = Decoder::new(&bank).decode(&bytes).unwrap();
    let names: Vec<_> = decoded
        .document
        .elements()
        .map(|e| (e.name.as_str(), e.text()))
        .collect();
    assert_eq!(
        names,
        [
            ("WorldBase.Score", "-5".to_string()),
            ("Scenery.Score", "7".to_string())
        ]
    );

    let edited = parse_document("<scenery.score>7</scenery.score><WORLDBASE.SCORE>-5</WORLDBASE.SCORE>")
        .unwrap();
    let encoded = Encoder::new(&bank).encode(&edited, &decoded.metadata).unwrap();
    let body = &encoded[body_offset(2) as usize..];
    assert_eq!(body[..8], [2, 0, 0, 0, 7, 0, 0, 0]);
    assert_eq!(body[8..12], [1, 0, 0, 0]);
}

#[test]
fn explicit_terminators_and_trailer_survive() {
    let bank = world_bank();
    let bytes = stream(
        HEADER,
        &[(MISSION, 0), (SCORE, 0)],
        Body::new()
            .set(1, Body::new().words(&[2, 1, 0]))
            .word(0)
            .raw(&[0xAA, 0xBB]),
    );
    let decoder = Decoder::new(&bank);
    let decoded = decoder.decode(&bytes).unwrap();
    assert!(decoded.metadata.sets[0].terminated);
    assert!(decoded.metadata.terminated);
    assert_eq!(decoded.metadata.trailer, "aabb");

    let report = roundtrip_bytes(&decoder, &Encoder::new(&bank), &bytes).unwrap();
    assert!(report.is_exact(), "{report:?}");
}

#[test]
fn leading_zero_reference_is_an_empty_document() {
    let bank = world_bank();
    let bytes = stream(HEADER, &[(MISSION, 0)], Body::new().word(0));
    let decoded = Decoder::new(&bank).decode(&bytes).unwrap();
    assert!(decoded.document.children.is_empty());
    assert!(decoded.metadata.terminated);

    let encoded = Encoder::new(&bank)
        .encode(&Document::new(), &decoded.metadata)
        .unwrap();
    assert_eq!(encoded, bytes);
}

#[test]
fn zero_length_set_is_an_empty_container() {
    let bank = world_bank();
    let bytes = stream(
        HEADER,
        &[(MISSION, 0), (SCORE, 0)],
        Body::new().set(1, Body::new()).words(&[2, 9]),
    );
    let decoded = Decoder::new(&bank).decode(&bytes).unwrap();
    let mission = decoded.document.elements().next().unwrap();
    assert_eq!(mission.name, "WorldBase.Mission");
    assert!(mission.children.is_empty());
    assert_eq!(decoded.metadata.sets[0].size, 0);
    assert_eq!(decoded.document.element_count(), 2);

    let report = roundtrip_bytes(&Decoder::new(&bank), &Encoder::new(&bank), &bytes).unwrap();
    assert!(report.is_exact());
}

#[test]
fn top_level_attribute_property_becomes_an_element() {
    let bank = world_bank();
    let models = models();
    let bytes = stream(
        HEADER,
        &[(INSTANCE_ID, 0)],
        Body::new().word(1).guid(PIPER_CUB),
    );
    let decoded = Decoder::new(&bank)
        .with_models(&models)
        .decode(&bytes)
        .unwrap();
    assert_eq!(
        decoded.document.children,
        [
            Node::Comment("Model: Piper Cub".into()),
            Node::Element(Element::with_text(
                "WorldBase.InstanceId",
                "{00000000-0000-0000-0000-000000000099}"
            )),
        ]
    );

    let encoded = Encoder::new(&bank)
        .encode(&decoded.document, &decoded.metadata)
        .unwrap();
    assert_eq!(encoded, bytes);
}

#[test]
fn attribute_after_a_child_keeps_its_position() {
    let bank = world_bank();
    let bytes = stream(
        HEADER,
        &[(MISSION, 0), (SCORE, 0), (INSTANCE_ID, 0)],
        Body::new().set(1, Body::new().words(&[2, 42]).word(3).guid(PIPER_CUB)),
    );
    let decoded = Decoder::new(&bank).decode(&bytes).unwrap();
    let mission = decoded.document.elements().next().unwrap();
    assert_eq!(
        mission.attribute("InstanceId"),
        Some("{00000000-0000-0000-0000-000000000099}")
    );
    assert_eq!(decoded.metadata.sets[0].attribute_slots, [1]);

    let report = roundtrip_bytes(&Decoder::new(&bank), &Encoder::new(&bank), &bytes).unwrap();
    assert!(report.is_exact(), "{report:?}");
}

#[test]
fn repeated_attribute_property_falls_back_to_an_element() {
    let bank = world_bank();
    let bytes = stream(
        HEADER,
        &[(MISSION, 0), (INSTANCE_ID, 0)],
        Body::new().set(
            1,
            Body::new().word(2).guid(PIPER_CUB).word(2).guid(SCORE),
        ),
    );
    let decoded = Decoder::new(&bank).decode(&bytes).unwrap();
    let mission = decoded.document.elements().next().unwrap();
    assert_eq!(mission.attributes.len(), 1);
    assert_eq!(
        mission.attribute("InstanceId"),
        Some("{00000000-0000-0000-0000-000000000099}")
    );
    let repeats: Vec<_> = mission
        .elements()
        .map(|e| (e.name.as_str(), e.text()))
        .collect();
    assert_eq!(
        repeats,
        [(
            "InstanceId",
            "{00000000-0000-0000-0000-000000000010}".to_string()
        )]
    );

    let xml = to_xml_string(&decoded.document).unwrap();
    assert_eq!(parse_document(&xml).unwrap(), decoded.document);
    let report = roundtrip_bytes(&Decoder::new(&bank), &Encoder::new(&bank), &bytes).unwrap();
    assert!(report.is_exact(), "{report:?}");
}

fn nested_missions(levels: usize) -> Vec<u8> {
    let mut body = Body::new();
    for _ in 0..levels {
        body = Body::new().set(1, body);
    }
    stream(HEADER, &[(MISSION, 0)], body)
}

#[test]
fn nesting_past_the_default_limit_is_an_error() {
    let bank = world_bank();
    let err = Decoder::new(&bank)
        .decode(&nested_missions(DEFAULT_MAX_DEPTH + 1))
        .unwrap_err();
    assert!(
        matches!(err, SpbError::NestingTooDeep { limit, .. } if limit == DEFAULT_MAX_DEPTH),
        "{err}"
    );

    let bytes = nested_missions(DEFAULT_MAX_DEPTH);
    let report = roundtrip_bytes(&Decoder::new(&bank), &Encoder::new(&bank), &bytes).unwrap();
    assert!(report.is_exact(), "{report:?}");
}

#[test]
fn filetime_and_unknown_types_are_fatal() {
    let bank = world_bank();
    let bytes = stream(HEADER, &[(STAMP, 0)], Body::new().words(&[1, 0, 0]));
    let err = Decoder::new(&bank).decode(&bytes).unwrap_err();
    assert!(
        matches!(err, SpbError::UnsupportedType { at: Location::Offset(at), .. } if at == body_offset(1) + 4),
        "{err}"
    );

    let bytes = stream(HEADER, &[(MASS, 0)], Body::new().words(&[1, 0]));
    let err = Decoder::new(&bank).decode(&bytes).unwrap_err();
    assert!(matches!(err, SpbError::UnknownType { ref type_name, .. } if type_name == "VECTOR"));
}

#[test]
fn truncated_value_aborts_decode() {
    let bank = world_bank();
    let bytes = stream(HEADER, &[(SCORE, 0)], Body::new().word(1).raw(&[1, 0]));
    assert!(matches!(
        Decoder::new(&bank).decode(&bytes),
        Err(SpbError::UnexpectedEof { needed: 2, .. })
    ));
}

#[test]
fn decompile_and_compile_files() {
    let bank = world_bank();
    let models = models();
    let dir = tempfile::tempdir().unwrap();
    let spb = dir.path().join("mission.spb");
    let xml = dir.path().join("mission.xml");
    let rebuilt = dir.path().join("rebuilt.spb");
    fs::write(&spb, mission_stream()).unwrap();

    let summary = decompile_file(&Decoder::new(&bank).with_models(&models), &spb, &xml).unwrap();
    assert_eq!(summary.elements, 6);
    assert_eq!(summary.tags, 7);
    assert_eq!(summary.sets, 2);
    let meta = metadata_path_for(&xml);
    assert!(meta.exists());

    compile_file(&Encoder::new(&bank), &xml, &meta, &rebuilt).unwrap();
    assert_eq!(fs::read(&rebuilt).unwrap(), mission_stream());
}

#[test]
fn compile_without_metadata_leaves_no_output() {
    let bank = world_bank();
    let dir = tempfile::tempdir().unwrap();
    let xml = dir.path().join("mission.xml");
    let spb = dir.path().join("mission.spb");
    fs::write(&xml, "<Title>Hop</Title>").unwrap();

    let err = compile_file(&Encoder::new(&bank), &xml, &metadata_path_for(&xml), &spb).unwrap_err();
    assert!(matches!(err, SpbError::MissingRoundTripMetadata { .. }));
    assert!(!spb.exists());
}

#[test]
fn decoders_share_one_bank_across_threads() {
    let bank = world_bank();
    let bytes = mission_stream();
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| Decoder::new(&bank).decode(&bytes).map(|d| d.document)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let first = results[0].as_ref().unwrap();
    assert!(results.iter().all(|r| r.as_ref().unwrap() == first));
}
