use udyam_schema::schema::{
    normalize::{DEFAULT_LABEL, guess_name, infer_step, normalize_control},
    schema_model::{FieldType, RawControl, Step},
};

fn raw(label: &str, name: Option<&str>, control_type: &str) -> RawControl {
    RawControl {
        label: label.into(),
        name: name.map(str::to_string),
        control_type: control_type.into(),
        required: false,
        options: None,
    }
}

// =========================================================================
// Type normalization
// =========================================================================

#[test]
fn unrecognized_types_normalize_to_text() {
    for t in ["checkbox", "radio", "date", "file", "textarea", "", "submit", "datetime-local"] {
        let field = normalize_control(&raw("Something", Some("x"), t));
        assert_eq!(field.field_type, FieldType::Text, "type {:?} should become text", t);
    }
}

#[test]
fn recognized_types_are_lowercased_and_kept() {
    let cases = [
        ("TEXT", FieldType::Text),
        ("Email", FieldType::Email),
        ("number", FieldType::Number),
        ("SELECT", FieldType::Select),
        ("password", FieldType::Password),
        ("Tel", FieldType::Tel),
        ("hidden", FieldType::Hidden),
    ];
    for (t, expected) in cases {
        assert_eq!(normalize_control(&raw("L", Some("n"), t)).field_type, expected);
    }
}

// =========================================================================
// Step inference
// =========================================================================

#[test]
fn aadhaar_and_otp_labels_are_step_one() {
    for label in [
        "Aadhaar Number",
        "AADHAR NO",
        "Enter OTP",
        "One Time Password(otp)",
        "1. Aadhaar Number/ आधार संख्या",
    ] {
        assert_eq!(infer_step(label), Step::One, "label {:?}", label);
    }
}

#[test]
fn other_labels_are_step_two() {
    for label in ["PAN", "Name of Entrepreneur", "Email", "", "Field", "Adhaar"] {
        assert_eq!(infer_step(label), Step::Two, "label {:?}", label);
    }
}

// =========================================================================
// Name inference
// =========================================================================

#[test]
fn name_attribute_is_used_verbatim_after_trim() {
    assert_eq!(guess_name("Aadhaar Number", Some("  Txt_Adhar  ")), "Txt_Adhar");
}

#[test]
fn blank_name_attribute_falls_back_to_label() {
    assert_eq!(guess_name("Aadhaar Number", Some("   ")), "aadhar");
    assert_eq!(guess_name("Aadhaar Number", None), "aadhar");
}

#[test]
fn keyword_precedence_follows_declared_order() {
    assert_eq!(guess_name("Enter the OTP", None), "otp");
    assert_eq!(guess_name("PAN Card", None), "pan");
    assert_eq!(guess_name("Business Name", None), "businessName");
    assert_eq!(guess_name("Type of Organisation", None), "organizationType");
    assert_eq!(guess_name("Organization", None), "organizationType");
    assert_eq!(guess_name("Applicant", None), "ownerName");
    assert_eq!(guess_name("Name of Entrepreneur", None), "ownerName");
    assert_eq!(guess_name("E-mail / Email ID", None), "email");
    // aadhaar beats otp when both appear
    assert_eq!(guess_name("Aadhaar OTP", None), "aadhar");
    // "business" beats "name"
    assert_eq!(guess_name("Name of Business", None), "businessName");
}

#[test]
fn unmatched_label_uses_first_three_words() {
    assert_eq!(guess_name("Mobile Number", None), "mobilenumber");
    assert_eq!(guess_name("Date of Incorporation / Registration", None), "dateofincorporation");
    assert_eq!(guess_name("PIN-code of plant", None), "pincodeof");
}

// =========================================================================
// Label defaults and full records
// =========================================================================

#[test]
fn empty_label_defaults_to_name_then_field() {
    let named = normalize_control(&raw("", Some("txtMobile"), "text"));
    assert_eq!(named.label, "txtMobile");

    let anonymous = normalize_control(&raw("", None, "text"));
    assert_eq!(anonymous.label, DEFAULT_LABEL);
    assert_eq!(anonymous.name, "field");
}

#[test]
fn scraped_name_attribute_keeps_its_own_identity() {
    let control = RawControl {
        label: "Aadhaar Number".into(),
        name: Some("aadhar_no".into()),
        control_type: "text".into(),
        required: true,
        options: None,
    };
    let field = normalize_control(&control);

    assert_eq!(field.name, "aadhar_no");
    assert_eq!(field.step, Step::One);
    assert!(field.required);
    assert_eq!(field.pattern, None, "patterns only come from critical definitions");
}

#[test]
fn options_survive_only_on_selects() {
    let mut select = raw("State", Some("ddlState"), "select");
    select.options = Some(vec!["Goa".into(), "Kerala".into()]);
    assert_eq!(
        normalize_control(&select).options,
        Some(vec!["Goa".to_string(), "Kerala".to_string()])
    );

    let mut text = raw("State", Some("txtState"), "text");
    text.options = Some(vec!["stray".into()]);
    assert_eq!(normalize_control(&text).options, None);
}
