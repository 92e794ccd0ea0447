use rigpatch_control::dmx::{
    ArtNetConfig, ConversionProfile, ConversionType, DevicePatch, InterfaceConfig, KinetConfig,
    KinetProtocol, LoopbackConfig, RigTopology, SacnConfig, TracingSink,
};
use rigpatch_core::{ColorParam, Device, EnumParam, FloatParam, OrientationParam};
use rigpatch_io::{build_patch, load_rig, save_rig, IoError, RigFile};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn devices() -> Vec<Device> {
    vec![
        Device::new("front-1", "dimmer").with_param("intensity", FloatParam::new(1.0)),
        Device::new("spot-1", "spot")
            .with_param("intensity", FloatParam::new(0.5))
            .with_param("pan", OrientationParam::degrees(180.0))
            .with_param("gobo", EnumParam::new([("open", 0), ("stars", 64)]))
            .with_param("color", ColorParam::rgbw(0.0, 1.0, 0.0, 0.0)),
    ]
}

fn topology() -> RigTopology {
    RigTopology::new()
        .with_interface("bus", InterfaceConfig::Loopback(LoopbackConfig::default()))
        .with_interface("net", InterfaceConfig::ArtNet(ArtNetConfig::default()))
        .with_interface("sacn", InterfaceConfig::Sacn(SacnConfig::default()))
        .with_interface(
            "ps1",
            InterfaceConfig::Kinet(KinetConfig {
                protocol: KinetProtocol::PortOut,
                output: 2,
                ..KinetConfig::new("10.0.0.40")
            }),
        )
        .with_assignment("bus", 0)
        .with_assignment("net", 0)
        .with_assignment("sacn", 1)
        .with_assignment("ps1", 1)
        .with_profile(
            "dimmer",
            ConversionProfile::new().with("intensity", 0, ConversionType::SingleByte),
        )
        .with_profile(
            "spot",
            ConversionProfile::new()
                .with("intensity", 0, ConversionType::SingleByte)
                .with("pan", 1, ConversionType::OrientationFine)
                .with("gobo", 3, ConversionType::EnumByte)
                .with("color", 4, ConversionType::ColorRgbw),
        )
        .with_device("front-1", DevicePatch::new("dimmer", 0, 0))
        .with_device("spot-1", DevicePatch::new("spot", 20, 0))
}

fn round_trip(path: &Path) -> RigFile {
    save_rig(&devices(), &topology(), path).unwrap();
    load_rig(path).unwrap()
}

#[test]
fn test_json_rig_round_trip() {
    let dir = tempdir().unwrap();
    let rig = round_trip(&dir.path().join("show.json"));

    assert_eq!(rig.devices, devices());
    assert_eq!(rig.patch, topology());
}

#[test]
fn test_ron_rig_round_trip() {
    let dir = tempdir().unwrap();
    let rig = round_trip(&dir.path().join("show.rig"));

    assert_eq!(rig.devices, devices());
    assert_eq!(rig.patch, topology());
}

#[test]
fn test_loaded_rig_encodes() {
    let dir = tempdir().unwrap();
    let rig = round_trip(&dir.path().join("show.json"));

    let (patch, report) = build_patch(&rig, Arc::new(TracingSink));
    assert!(report.is_clean());
    assert_eq!(patch.interface_ids().len(), 4);

    let cycle = patch.update(rig.devices.iter());
    assert_eq!(cycle.encoded(), 2);

    let universe = patch.universe(0).unwrap();
    assert_eq!(universe[0], 255);
    // spot: intensity, pan (180 of 360 degrees), gobo "open", RGBW
    assert_eq!(universe[20], 128);
    assert_eq!(&universe[21..23], &[0x80, 0x00]);
    assert_eq!(universe[23], 32);
    assert_eq!(&universe[24..28], &[0, 255, 0, 0]);
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        load_rig(&dir.path().join("absent.json")),
        Err(IoError::Io(_))
    ));
}

#[test]
fn test_garbage_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(load_rig(&path), Err(IoError::Json(_))));
}

#[test]
fn test_garbage_ron() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.ron");
    std::fs::write(&path, "(version: ").unwrap();

    assert!(matches!(load_rig(&path), Err(IoError::RonParse(_))));
}
