use navidb_core::{parse_section_permission, Address, Section, SectionPermission};
use serde_json::json;

#[test]
fn permission_serializes_as_canonical_symbol() {
    for permission in SectionPermission::all() {
        let value = serde_json::to_value(permission).unwrap();
        assert_eq!(value, json!(permission.as_str()));
        assert_eq!(
            parse_section_permission(value.as_str().unwrap()),
            Ok(*permission)
        );
    }
}

#[test]
fn section_serializes_with_numeric_addresses() {
    let section = Section {
        id: 3,
        module_id: 1,
        name: ".text".to_string(),
        start_address: Address::new(0x1000),
        end_address: Address::new(u64::MAX),
        permission: SectionPermission::ReadExecute,
        data: vec![1, 2],
    };

    let value = serde_json::to_value(&section).unwrap();
    assert_eq!(value["start_address"], json!(0x1000));
    assert_eq!(value["end_address"], json!(u64::MAX));
    assert_eq!(value["permission"], json!("READ_EXECUTE"));

    let decoded: Section = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, section);
}

#[test]
fn unknown_serialized_permission_is_rejected() {
    let err = serde_json::from_value::<SectionPermission>(json!("READ_ONLY"));
    assert!(err.is_err());
}
