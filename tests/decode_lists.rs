use rstest::rstest;
use serde_bencode::{from_slice, ErrorKind};

#[rstest]
fn decodes_empty_list() {
    let decoded: Vec<i64> = from_slice(b"le").unwrap();
    assert!(decoded.is_empty());
}

#[rstest]
fn decodes_integer_list() {
    let decoded: Vec<i64> = from_slice(b"li0ei255ee").unwrap();
    assert_eq!(decoded, vec![0, 255]);
}

#[rstest]
fn decodes_string_list() {
    let decoded: Vec<String> = from_slice(b"l4:spam3:egge").unwrap();
    assert_eq!(decoded, vec!["spam".to_string(), "egg".to_string()]);
}

#[rstest]
fn decodes_nested_lists() {
    let decoded: Vec<Vec<i64>> = from_slice(b"lli1ei2eeleli3eee").unwrap();
    assert_eq!(decoded, vec![vec![1, 2], vec![], vec![3]]);
}

#[rstest]
fn decodes_tuples() {
    let decoded: (i64, String) = from_slice(b"li7e4:spame").unwrap();
    assert_eq!(decoded, (7, "spam".to_string()));
}

#[rstest]
fn decodes_fixed_integer_array() {
    let decoded: [i64; 3] = from_slice(b"li1ei2ei3ee").unwrap();
    assert_eq!(decoded, [1, 2, 3]);
}

#[rstest]
fn decodes_fixed_byte_array_from_byte_string() {
    let decoded: [u8; 4] = from_slice(b"4:spam").unwrap();
    assert_eq!(&decoded, b"spam");
}

#[rstest]
fn rejects_fixed_byte_array_length_mismatch() {
    let err = from_slice::<[u8; 4]>(b"3:egg").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnexpectedToken { .. }));
}

#[rstest]
#[case(b"l".as_slice())]
#[case(b"li".as_slice())]
#[case(b"li0ei255e".as_slice())]
fn rejects_unterminated_fixed_list(#[case] input: &[u8]) {
    let err = from_slice::<(i64, i64)>(input).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnexpectedEnd));
}

#[rstest]
fn rejects_fixed_list_closed_early() {
    // The list ends after one element while the target wants two.
    assert!(from_slice::<(i64, i64)>(b"li1ee").is_err());
}

#[rstest]
fn rejects_fixed_list_with_extra_elements() {
    let err = from_slice::<(i64, i64)>(b"li1ei2ei3ee").unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::UnexpectedToken {
            expected: "end of list",
            ..
        }
    ));
}

#[rstest]
fn rejects_unterminated_dynamic_list() {
    let err = from_slice::<Vec<i64>>(b"li1ei2e").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnexpectedEnd));
}

#[rstest]
fn rejects_non_list_token() {
    let err = from_slice::<Vec<i64>>(b"i1e").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnexpectedToken { .. }));
}
