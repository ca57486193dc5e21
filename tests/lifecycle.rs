mod common;

use common::{compact_node, le2, le4, load_compact_image, SimTransport, NODE};
use servoreg_proto::descriptor::{app_param, core_param, drive_param};
use servoreg_proto::{
    param, Error, FirmwareVersion, NetworkRegistry, NodeClass, ParamAccess, ParameterAddress,
    Platform,
};

const VEL_LIM: ParameterAddress = param(0, core_param::VEL_LIM);

#[test]
fn setup_identifies_the_node() -> anyhow::Result<()> {
    let mut t = SimTransport::new();
    let registry = compact_node(&mut t);

    let record = registry
        .node(NODE)
        .ok_or_else(|| anyhow::anyhow!("node record missing after setup"))?;
    assert_eq!(record.class(), NodeClass::Compact);
    assert_eq!(record.firmware(), FirmwareVersion::from_raw(0x1601));
    assert_eq!(record.platform(), Platform::Standard);
    assert_eq!(record.bank_count(), 3);
    Ok(())
}

#[test]
fn high_voltage_platform_from_hardware_revision() {
    let mut t = SimTransport::new();
    load_compact_image(&mut t, NODE);
    t.load(NODE, param(0, core_param::HW_VERS), &le2(0x0103));

    let mut registry = NetworkRegistry::new(0);
    ParamAccess::new(&mut registry, &mut t)
        .setup_node(NODE, NodeClass::Compact)
        .unwrap();
    assert_eq!(
        registry.node(NODE).unwrap().platform(),
        Platform::HighVoltage
    );
}

#[test]
fn wrong_device_type_is_rejected() {
    let mut t = SimTransport::new();
    load_compact_image(&mut t, NODE);

    let mut registry = NetworkRegistry::new(0);
    let result = ParamAccess::new(&mut registry, &mut t).setup_node(NODE, NodeClass::Advanced);
    assert_eq!(result, Err(Error::WrongDeviceType));
    assert!(registry.node(NODE).is_none());
}

#[test]
fn setup_seeds_unconfigured_defaults() {
    let mut t = SimTransport::new();
    load_compact_image(&mut t, NODE);
    // Fresh-from-factory node: everything configurable still zero.
    t.load(NODE, param(0, core_param::HW_CONFIG_REG), &le4(0));
    t.load(NODE, VEL_LIM, &le4(0));
    t.load(NODE, param(0, core_param::ACC_LIM), &le4(0));
    t.load(NODE, param(0, core_param::STOP_DECEL), &le4(0));
    t.load(NODE, param(0, core_param::IN_RANGE_WIN), &le4(0));
    t.load(NODE, param(1, drive_param::RMS_SLOW_TC), &le2(0));
    t.load(NODE, param(2, app_param::A_START), &le4(0));

    let mut registry = NetworkRegistry::new(0);
    ParamAccess::new(&mut registry, &mut t)
        .setup_node(NODE, NodeClass::Compact)
        .unwrap();

    assert_eq!(
        t.raw_bytes(NODE, param(0, core_param::HW_CONFIG_REG)).unwrap(),
        &le4(1)
    );
    // 100 kticks/s at a 1 ms sample time.
    assert_eq!(t.raw_bytes(NODE, VEL_LIM).unwrap(), &le4(100 << 17));
    assert_eq!(
        t.raw_bytes(NODE, param(0, core_param::ACC_LIM)).unwrap(),
        &le4(1 << 17)
    );
    assert_eq!(
        t.raw_bytes(NODE, param(0, core_param::STOP_DECEL)).unwrap(),
        &le4(2 << 17)
    );
    assert_eq!(
        t.raw_bytes(NODE, param(0, core_param::IN_RANGE_WIN)).unwrap(),
        &le4(100)
    );
    assert_eq!(
        t.raw_bytes(NODE, param(2, app_param::A_START)).unwrap(),
        &le4(5)
    );
    // A zero decay code reads as no time constant at all, so the
    // slow-RMS row counts as unconfigured and gets its default.
    let slow_tc = param(1, drive_param::RMS_SLOW_TC);
    let raw = t.raw_bytes(NODE, slow_tc).unwrap().to_vec();
    assert_ne!(raw, le2(0));
    let mut access = ParamAccess::new(&mut registry, &mut t);
    let minutes = access.get(NODE, slow_tc).unwrap();
    assert!((minutes - 2.).abs() < 0.01, "seeded slow TC {}", minutes);
}

#[test]
fn configured_values_are_left_alone() {
    let mut t = SimTransport::new();
    load_compact_image(&mut t, NODE);
    t.load(NODE, VEL_LIM, &le4(250 << 17));

    let mut registry = NetworkRegistry::new(0);
    ParamAccess::new(&mut registry, &mut t)
        .setup_node(NODE, NodeClass::Compact)
        .unwrap();
    assert_eq!(t.raw_bytes(NODE, VEL_LIM).unwrap(), &le4(250 << 17));
}

#[test]
fn unidentified_node_errors() {
    let mut t = SimTransport::new();
    load_compact_image(&mut t, NODE);
    let mut registry = NetworkRegistry::new(0);

    let mut access = ParamAccess::new(&mut registry, &mut t);
    assert_eq!(access.get(NODE, VEL_LIM), Err(Error::NotInitialized));
    assert_eq!(access.set(NODE, VEL_LIM, 1., false), Err(Error::NotInitialized));
}

#[test]
fn teardown_forgets_the_node() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    t.load(NODE, VEL_LIM, &le4(500 << 17));

    registry.teardown_node(NODE);
    let mut access = ParamAccess::new(&mut registry, &mut t);
    assert_eq!(access.get(NODE, VEL_LIM), Err(Error::NotInitialized));
}

#[test]
fn invalidation_forces_a_reread() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    t.load(NODE, VEL_LIM, &le4(500 << 17));

    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 500_000.);
    }
    t.load(NODE, VEL_LIM, &le4(250 << 17));

    // Still cached.
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 500_000.);
    }
    registry.invalidate_node(NODE).unwrap();
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 250_000.);
    }
}

#[test]
fn single_parameter_invalidation_is_targeted() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    t.load(NODE, VEL_LIM, &le4(500 << 17));

    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        access.get(NODE, VEL_LIM).unwrap();
    }
    registry.invalidate_param(NODE, VEL_LIM).unwrap();

    let reads = t.reads;
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        access.get(NODE, VEL_LIM).unwrap();
    }
    // Only the invalidated slot goes to the wire; the sample-period
    // dependency stays cached.
    assert_eq!(t.reads, reads + 1);
}

#[test]
fn repeat_setup_starts_from_a_cold_cache() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    t.load(NODE, VEL_LIM, &le4(500 << 17));

    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 500_000.);
    }

    // The node was swapped for an identically-addressed one.
    t.load(NODE, VEL_LIM, &le4(250 << 17));
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        access.setup_node(NODE, NodeClass::Compact).unwrap();
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 250_000.);
    }
}
