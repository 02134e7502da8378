use challan_core::{build_registration_set, dedupe_normalized, normalize_token, IngestError};

#[test]
fn normalize_strips_whitespace_and_uppercases() {
    assert_eq!(normalize_token(" ka 01 ab 1234 "), Some("KA01AB1234".to_string()));
    assert_eq!(normalize_token("mh12xy0001"), Some("MH12XY0001".to_string()));
    assert_eq!(normalize_token("   "), None);
    assert_eq!(normalize_token(""), None);
}

#[test]
fn dedupe_folds_case_and_keeps_first_appearance_order() {
    let regs = dedupe_normalized(["AB01", "ab01 ", "CD02"]);
    assert_eq!(regs, vec!["AB01", "CD02"]);
}

#[test]
fn dedupe_drops_empty_cells() {
    let regs = dedupe_normalized(["", "  ", "KA01AB1234", "ka01ab1234"]);
    assert_eq!(regs, vec!["KA01AB1234"]);
}

#[test]
fn registration_set_filters_implausible_lengths() {
    let regs = build_registration_set([
        "KA01AB1234",     // 10 chars, plausible
        "AB1",            // too short
        "X",              // too short
        "KA01AB12345678", // 14 chars, too long
        "DL1CAB1",        // 7 chars, short series
    ])
    .unwrap();
    assert_eq!(regs, vec!["KA01AB1234", "DL1CAB1"]);
}

#[test]
fn registration_set_rejects_empty_survivor_set() {
    assert_eq!(
        build_registration_set(["", "ab", "  "]),
        Err(IngestError::EmptyResult)
    );
    assert_eq!(
        build_registration_set(Vec::<String>::new()),
        Err(IngestError::EmptyResult)
    );
}
