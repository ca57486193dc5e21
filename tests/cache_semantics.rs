mod common;

use std::sync::{Arc, Mutex};

use common::{compact_node, le2, le4, SimTransport, NODE};
use servoreg_proto::descriptor::core_param;
use servoreg_proto::{param, ChangeEvent, Error, NodeClass, ParamAccess, ParameterAddress};

const VEL_LIM: ParameterAddress = param(0, core_param::VEL_LIM);
const POSN_MEAS: ParameterAddress = param(0, core_param::POSN_MEAS);
const STATUS_ACCUM: ParameterAddress = param(0, core_param::STATUS_ACCUM);
const USER_ID0: ParameterAddress = param(0, core_param::USER_ID0);

fn slot_state(
    registry: &servoreg_proto::NetworkRegistry,
    p: ParameterAddress,
) -> (f64, bool) {
    let slot = registry
        .node(NODE)
        .unwrap()
        .bank(p.bank())
        .unwrap()
        .slot(p.index())
        .unwrap();
    (slot.value, slot.exists)
}

#[test]
fn non_realtime_reads_are_cached() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    t.load(NODE, VEL_LIM, &le4(500 << 17));

    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 500_000.);
    }
    let reads = t.reads;
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 500_000.);
    }
    // Second read is served from the cache, dependencies included.
    assert_eq!(t.reads, reads);
    assert_eq!(slot_state(&registry, VEL_LIM), (500_000., true));
}

#[test]
fn realtime_reads_always_hit_the_wire() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    t.load(NODE, POSN_MEAS, &le4((-2500i32) as u32));

    let reads = t.reads;
    let mut access = ParamAccess::new(&mut registry, &mut t);
    assert_eq!(access.get(NODE, POSN_MEAS).unwrap(), -2500.);
    assert_eq!(access.get(NODE, POSN_MEAS).unwrap(), -2500.);
    drop(access);
    assert_eq!(t.reads, reads + 2);
}

#[test]
fn clear_on_read_accumulator_is_consumed() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    t.load(NODE, STATUS_ACCUM, &le4(0b0101));

    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, STATUS_ACCUM).unwrap(), 5.);
    }
    // The accumulation was handed out; the cache holds nothing.
    assert_eq!(slot_state(&registry, STATUS_ACCUM), (0., true));

    t.load(NODE, STATUS_ACCUM, &le4(0b0010));
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, STATUS_ACCUM).unwrap(), 2.);
    }
    assert_eq!(slot_state(&registry, STATUS_ACCUM), (0., true));
}

#[test]
fn option_bit_reads_bypass_the_cache() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    t.load(NODE, VEL_LIM, &le4(500 << 17));

    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 500_000.);
    }

    // The node changes behind the host's back.
    t.load(NODE, VEL_LIM, &le4(250 << 17));

    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        // The snapshot sees the node's current value...
        assert_eq!(access.get(NODE, VEL_LIM.with_option()).unwrap(), 250_000.);
        // ...while the persistent slot and the plain path keep the old one.
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 500_000.);
    }
    assert_eq!(slot_state(&registry, VEL_LIM), (500_000., true));
}

#[test]
fn unknown_parameter_reads_through() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    let p = param(0, 60);
    t.load(NODE, p, &le2(0x1234));

    let events: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    registry.register_change_callback(
        NodeClass::Compact,
        Arc::new(move |e| sink.lock().unwrap().push(e)),
    );

    let reads = t.reads;
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        let (value, info) = access.get_info(NODE, p).unwrap();
        assert_eq!(value, 0x1234 as f64);
        assert!(info.class.is_unknown());
        assert_eq!(info.width, 2);
        assert_eq!(info.scale, 1.);
        // No tracking: the second read goes to the wire too.
        assert_eq!(access.get(NODE, p).unwrap(), 0x1234 as f64);
    }
    assert_eq!(t.reads, reads + 2);
    // Every read-through notifies, even without a value change.
    let events = events.lock().unwrap();
    assert_eq!(events.iter().filter(|e| e.param == p).count(), 2);
}

#[test]
fn failed_set_marks_the_slot_missing() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    t.load(NODE, VEL_LIM, &le4(500 << 17));

    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 500_000.);
    }

    t.trigger_write_error();
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(
            access.set(NODE, VEL_LIM, 600_000., false),
            Err(Error::Timeout)
        );
    }
    assert!(!slot_state(&registry, VEL_LIM).1);

    // The node never saw the write, so the next read recovers the old
    // value from the wire.
    let reads = t.reads;
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 500_000.);
    }
    assert!(t.reads > reads);
}

#[test]
fn failed_verify_readback_invalidates_the_slot() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    t.load(NODE, VEL_LIM, &le4(500 << 17));

    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 500_000.);
    }

    // The write lands, then the verification read times out.
    t.trigger_read_error();
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(
            access.set(NODE, VEL_LIM, 250_000., true),
            Err(Error::Timeout)
        );
    }
    assert!(!slot_state(&registry, VEL_LIM).1);

    // The node holds the new value; the cache must not keep serving
    // the old one.
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 250_000.);
    }
}

#[test]
fn string_chunks_exist_at_any_length() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    // A 5-byte chunk, shorter than any numeric width pattern.
    t.load(NODE, USER_ID0, b"AXIS5");

    let reads = t.reads;
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        let (value, info) = access.get_info(NODE, USER_ID0).unwrap();
        assert_eq!(value, 0.);
        assert_eq!(info.width, 8);
        // The slot is tracked; a second read stays off the wire.
        access.get(NODE, USER_ID0).unwrap();
    }
    assert_eq!(t.reads, reads + 1);
    assert_eq!(slot_state(&registry, USER_ID0), (0., true));
}

#[test]
fn user_name_writes_are_sanitized() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);

    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        access.set_raw(NODE, USER_ID0, b"Ax<is>1").unwrap();
        // Longer than the 8-byte chunk capacity.
        assert_eq!(
            access.set_raw(NODE, USER_ID0, b"AXIS-NAME"),
            Err(Error::ValueSize)
        );
    }
    assert_eq!(t.raw_bytes(NODE, USER_ID0).unwrap(), b"Ax_is_1");
    assert_eq!(slot_state(&registry, USER_ID0), (0., true));
}

#[test]
fn failed_read_marks_the_slot_missing() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    t.load(NODE, VEL_LIM, &le4(500 << 17));

    t.trigger_read_error();
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, VEL_LIM), Err(Error::Timeout));
    }
    assert_eq!(slot_state(&registry, VEL_LIM), (0., false));

    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        assert_eq!(access.get(NODE, VEL_LIM).unwrap(), 500_000.);
    }
}

#[test]
fn change_callbacks_fire_on_new_values_only() {
    let mut t = SimTransport::new();
    let mut registry = compact_node(&mut t);
    t.load(NODE, VEL_LIM, &le4(500 << 17));

    let events: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    registry.register_change_callback(
        NodeClass::Compact,
        Arc::new(move |e| sink.lock().unwrap().push(e)),
    );

    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        access.get(NODE, VEL_LIM).unwrap();
    }
    {
        let fired = events.lock().unwrap();
        let vel: Vec<_> = fired.iter().filter(|e| e.param == VEL_LIM).collect();
        assert_eq!(vel.len(), 1);
        assert_eq!(vel[0].value, 500_000.);
        assert_eq!(vel[0].node, NODE);
    }
    events.lock().unwrap().clear();

    // A cached read observes no change.
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        access.get(NODE, VEL_LIM).unwrap();
    }
    assert!(events.lock().unwrap().is_empty());

    // A set always notifies with the read-back-equivalent value.
    {
        let mut access = ParamAccess::new(&mut registry, &mut t);
        access.set(NODE, VEL_LIM, 250_000., false).unwrap();
    }
    let fired = events.lock().unwrap();
    assert!(fired
        .iter()
        .any(|e| e.param == VEL_LIM && e.value == 250_000.));
}
