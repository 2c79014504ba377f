// End-to-end decoding of candump traces against DBC files on disk
use candump_decoder::{Decoder, DecoderError, DuplicatePolicy};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DBC_HEADER: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: SENSOR VCU INVERTER
"#;

const SENSOR_BUS: &str = r#"
BO_ 1801 SensorData: 8 SENSOR
 SG_ CoolantPressureFanOUT : 0|16@1+ (0.5,-18108) [-18108|14659.5] "kPa" VCU
"#;

const CONTROL_BUS: &str = r#"
BO_ 512 ControlMux: 8 VCU
 SG_ Mode M : 0|8@1+ (1,0) [0|3] "" SENSOR
 SG_ TorqueRequest m0 : 8|8@1+ (2,0) [0|510] "Nm" SENSOR
 SG_ SpeedLimit m1 : 8|8@1+ (0.1,0) [0|25.5] "km/h" SENSOR
"#;

const TRACTIVE_BUS: &str = r#"
BO_ 1801 InverterTemp: 8 INVERTER
 SG_ InverterTemperature : 0|8@1+ (1,-40) [-40|215] "C" VCU
"#;

fn write_dbc(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("{}{}", DBC_HEADER, body)).unwrap();
    path
}

fn vehicle_decoder(dir: &TempDir) -> Decoder {
    let mut decoder = Decoder::new();
    for (name, body) in [
        ("ControlBus.dbc", CONTROL_BUS),
        ("SensorBus.dbc", SENSOR_BUS),
        ("TractiveBus.dbc", TRACTIVE_BUS),
    ] {
        decoder.add_dbc(&write_dbc(dir.path(), name, body)).unwrap();
    }
    decoder
}

fn decode(decoder: &Decoder, input: &str) -> String {
    let mut out = Vec::new();
    decoder.decode_to_writer(Cursor::new(input), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn sensor_bus_reference_frame() {
    let dir = tempfile::tempdir().unwrap();
    let decoder = vehicle_decoder(&dir);

    let output = decode(&decoder, "(1730892639.316946) can1 709#FF7F0080A3BC\n");
    assert_eq!(output, "(1730892639.316946): CoolantPressureFanOUT: -1724.5\n");
}

#[test]
fn same_id_is_routed_by_interface() {
    let dir = tempfile::tempdir().unwrap();
    let decoder = vehicle_decoder(&dir);

    let output = decode(
        &decoder,
        "(10.000000) can2 709#5A\n(10.500000) can0 709#5A\n",
    );
    // 0x709 only exists on can1 and can2
    assert_eq!(output, "(10.000000): InverterTemperature: 50\n");
}

#[test]
fn unknown_interface_produces_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let decoder = vehicle_decoder(&dir);

    assert_eq!(decode(&decoder, "(1730892639.316946) can9 709#FF7F0080A3BC\n"), "");
}

#[test]
fn multiplexed_groups_follow_switch() {
    let dir = tempfile::tempdir().unwrap();
    let decoder = vehicle_decoder(&dir);

    let output = decode(
        &decoder,
        "(1.000000) can0 200#0032\n(2.000000) can0 200#0105\n(3.000000) can0 200#02FF\n",
    );
    assert_eq!(
        output,
        "(1.000000): Mode: 0\n\
         (1.000000): TorqueRequest: 100\n\
         (2.000000): Mode: 1\n\
         (2.000000): SpeedLimit: 0.5\n\
         (3.000000): Mode: 2\n"
    );
}

#[test]
fn non_frame_and_malformed_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let decoder = vehicle_decoder(&dir);

    let input = "\
candump log start
(1.000000) can1 709#FF7
(2.000000) can1 709#FF7F
not a frame (3.0) at all
";
    let mut out = Vec::new();
    let stats = decoder.decode_to_writer(Cursor::new(input), &mut out).unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "(2.000000): CoolantPressureFanOUT: -1724.5\n");
    assert_eq!(stats.lines_read, 4);
    assert_eq!(stats.lines_skipped, 3);
    assert_eq!(stats.frames_decoded, 1);
}

#[test]
fn interfaces_resolved_from_file_names() {
    let dir = tempfile::tempdir().unwrap();
    let decoder = vehicle_decoder(&dir);
    let registry = decoder.registry();

    assert_eq!(registry.interfaces(), vec!["can0", "can1", "can2"]);
    assert_eq!(registry.lookup("can0", 0x200).unwrap().name, "ControlMux");
    assert_eq!(registry.lookup("can1", 0x709).unwrap().name, "SensorData");
    assert_eq!(registry.lookup("can2", 0x709).unwrap().name, "InverterTemp");
}

#[test]
fn duplicate_ids_keep_first_schema_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_dbc(dir.path(), "SensorBus.dbc", SENSOR_BUS);
    let second = write_dbc(dir.path(), "SensorBusOld.dbc", TRACTIVE_BUS);

    let mut decoder = Decoder::new();
    decoder.add_dbc(&first).unwrap();
    let summary = decoder.add_dbc(&second).unwrap();
    assert_eq!(summary.duplicates, 1);
    assert_eq!(decode(&decoder, "(1.000000) can1 709#FF7F\n"), "(1.000000): CoolantPressureFanOUT: -1724.5\n");

    let mut decoder = Decoder::new().with_duplicate_policy(DuplicatePolicy::Last);
    decoder.add_dbc(&first).unwrap();
    decoder.add_dbc(&second).unwrap();
    assert_eq!(decode(&decoder, "(1.000000) can1 709#FF7F\n"), "(1.000000): InverterTemperature: 215\n");
}

#[test]
fn explicit_interface_overrides_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dbc(dir.path(), "SensorBus.dbc", SENSOR_BUS);

    let mut decoder = Decoder::new();
    decoder.add_dbc_on(&path, "vcan3").unwrap();

    assert!(decoder.registry().lookup("can1", 0x709).is_none());
    assert_eq!(
        decode(&decoder, "(5.000000) vcan3 709#FF7F\n"),
        "(5.000000): CoolantPressureFanOUT: -1724.5\n"
    );
}

#[test]
fn broken_schema_is_an_error_for_that_file_only() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("SensorBus.dbc");
    fs::write(&broken, "this is not a dbc file").unwrap();

    let mut decoder = Decoder::new();
    assert!(matches!(decoder.add_dbc(&broken), Err(DecoderError::DbcParseError(_))));

    decoder
        .add_dbc(&write_dbc(dir.path(), "TractiveBus.dbc", TRACTIVE_BUS))
        .unwrap();
    assert_eq!(decoder.database_stats().num_messages, 1);
}

#[test]
fn decode_file_reports_unopenable_output() {
    let dir = tempfile::tempdir().unwrap();
    let decoder = vehicle_decoder(&dir);
    let input = dir.path().join("dump.log");
    fs::write(&input, "(1.000000) can1 709#FF7F\n").unwrap();

    let result = decoder.decode_file(&input, &dir.path().join("missing/output.txt"));
    assert!(matches!(result, Err(DecoderError::StreamOpen { .. })));

    let output = dir.path().join("output.txt");
    let stats = decoder.decode_file(&input, &output).unwrap();
    assert_eq!(stats.signals_written, 1);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "(1.000000): CoolantPressureFanOUT: -1724.5\n"
    );
}
