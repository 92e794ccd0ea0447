use rigpatch_core::{
    ColorParam, Device, EnumParam, FloatParam, OrientationParam, ParamValue, ValueKind,
};

fn moving_head() -> Device {
    let mut d = Device::new("mh1", "Moving Head")
        .with_param("intensity", FloatParam::new(0.0))
        .with_param("pan", OrientationParam::degrees(0.0))
        .with_param("color", ColorParam::rgbw(0.0, 0.0, 0.0, 0.0))
        .with_param(
            "gobo",
            EnumParam::new([("Open", 0u8), ("Dots", 16), ("Breakup", 32)]),
        );
    d.set_metadata("position", "Truss 2");
    d
}

#[test]
fn test_device_json_roundtrip() {
    let device = moving_head();
    let json = device.to_json().unwrap();
    let back = Device::from_json(&json).unwrap();
    assert_eq!(device, back);
    assert_eq!(back.id(), "mh1");
    assert_eq!(back.metadata("position"), Some("Truss 2"));
}

#[test]
fn test_device_ron_roundtrip() {
    let device = moving_head();
    let text = ron::to_string(&device).unwrap();
    let back: Device = ron::from_str(&text).unwrap();
    assert_eq!(device, back);
}

#[test]
fn test_typed_accessors() {
    let mut device = moving_head();
    device.set_enum("gobo", "Dots", 0.0).unwrap();
    device.set_color_channel("color", "Red", 2.0).unwrap();

    assert_eq!(device.enumeration("gobo").unwrap().range_value(), 16);
    assert_eq!(device.color("color").unwrap().channel("Red"), 1.0);
    assert_eq!(device.param("pan").map(ParamValue::kind), Some(ValueKind::Orientation));
    assert!(device.float("gobo").is_none());
}

#[test]
fn test_reset_all_params() {
    let mut device = moving_head();
    device.set_float("intensity", 1.0).unwrap();
    device.set_enum("gobo", "Breakup", 1.0).unwrap();

    device.reset();

    assert_eq!(device.intensity(), Some(0.0));
    assert_eq!(device.enumeration("gobo").unwrap().active, "Open");
}

#[test]
fn test_param_names_sorted() {
    let device = moving_head();
    let names: Vec<&str> = device.param_names().collect();
    assert_eq!(names, vec!["color", "gobo", "intensity", "pan"]);
}
