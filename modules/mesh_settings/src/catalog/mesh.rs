//! Mesh-wide batman-adv settings

use crate::contract::{QueryOutcome, SettingValue, SettingsError, Target};
use crate::domain::validation::{self, BOOLEAN_VALUES};
use crate::domain::SettingDescriptor;
use crate::infra::netlink::batadv::{attr, Command};
use crate::infra::netlink::codec::{Attributes, CodecError, GenlMessage};
use crate::infra::netlink::{execute, Session};
use std::ops::ControlFlow;

/// Pick the mesh or the VLAN flavour of a command
fn select(target: &Target, vlan_aware: bool, mesh: Command, vlan: Command) -> (Command, Option<u16>) {
    match target.vid {
        Some(vid) if vlan_aware => (vlan, Some(vid)),
        _ => (mesh, None),
    }
}

/// Fetch the mesh (or VLAN) configuration and render the first reply that
/// carries the wanted attributes.
fn query(
    session: &mut Session,
    target: &Target,
    vlan_aware: bool,
    render: impl Fn(&Attributes) -> Option<String>,
) -> QueryOutcome<String> {
    let (command, vid) = select(target, vlan_aware, Command::GetMesh, Command::GetVlan);
    let add_vid = |msg: &mut GenlMessage| -> Result<(), CodecError> {
        if let Some(vid) = vid {
            msg.put_u16(attr::VLANID, vid);
        }
        Ok(())
    };

    let mut value = None;
    let mut handle = |msg: &GenlMessage| match render(&msg.attributes) {
        Some(rendered) => {
            value = Some(rendered);
            ControlFlow::Break(())
        }
        None => ControlFlow::Continue(()),
    };

    let outcome = execute(session, command, Some(&add_vid), Some(&mut handle));
    outcome.map(|()| value.unwrap_or_default())
}

fn update(
    session: &mut Session,
    target: &Target,
    vlan_aware: bool,
    put: impl Fn(&mut GenlMessage),
) -> QueryOutcome {
    let (command, vid) = select(target, vlan_aware, Command::SetMesh, Command::SetVlan);
    let add = |msg: &mut GenlMessage| -> Result<(), CodecError> {
        if let Some(vid) = vid {
            msg.put_u16(attr::VLANID, vid);
        }
        put(msg);
        Ok(())
    };
    execute(session, command, Some(&add), None)
}

fn unexpected(setting: &str, value: &SettingValue) -> QueryOutcome {
    QueryOutcome::Failed(SettingsError::validation(format!(
        "unexpected value for {setting}: {value:?}"
    )))
}

fn first(values: &[String]) -> Result<&str, SettingsError> {
    values
        .first()
        .map(String::as_str)
        .ok_or_else(|| SettingsError::validation("missing value"))
}

// ===== On/off settings =====

fn render_bool(enabled: u8) -> String {
    let label = if enabled != 0 { "enabled" } else { "disabled" };
    label.to_string()
}

fn get_bool(session: &mut Session, target: &Target, vlan_aware: bool, kind: u16) -> QueryOutcome<String> {
    query(session, target, vlan_aware, |attrs| attrs.get_u8(kind).map(render_bool))
}

fn set_bool(
    session: &mut Session,
    target: &Target,
    vlan_aware: bool,
    kind: u16,
    value: &SettingValue,
) -> QueryOutcome {
    let enabled = match value.as_bool() {
        Ok(enabled) => enabled,
        Err(err) => return QueryOutcome::Failed(err),
    };
    update(session, target, vlan_aware, |msg| msg.put_u8(kind, u8::from(enabled)))
}

macro_rules! boolean_setting {
    (
        $descriptor:ident, $get:ident, $set:ident,
        name: $name:literal, abbr: $abbr:literal, attr: $attr:expr,
        sysfs: $sysfs:expr, vlan_aware: $vlan:literal
    ) => {
        fn $get(session: &mut Session, target: &Target) -> QueryOutcome<String> {
            get_bool(session, target, $vlan, $attr)
        }

        fn $set(session: &mut Session, target: &Target, value: &SettingValue) -> QueryOutcome {
            set_bool(session, target, $vlan, $attr, value)
        }

        pub static $descriptor: SettingDescriptor = SettingDescriptor {
            name: $name,
            abbr: $abbr,
            usage: "[0|1]",
            protocol_read: Some($get),
            protocol_write: Some($set),
            legacy_entry: $sysfs,
            vlan_aware: $vlan,
            allowed_values: Some(BOOLEAN_VALUES),
            parse: None,
        };
    };
}

boolean_setting!(
    AGGREGATION, aggregation_get, aggregation_set,
    name: "aggregation", abbr: "ag", attr: attr::AGGREGATED_OGMS_ENABLED,
    sysfs: Some("aggregated_ogms"), vlan_aware: false
);

boolean_setting!(
    AP_ISOLATION, ap_isolation_get, ap_isolation_set,
    name: "ap_isolation", abbr: "ap", attr: attr::AP_ISOLATION_ENABLED,
    sysfs: Some("ap_isolation"), vlan_aware: true
);

boolean_setting!(
    BONDING, bonding_get, bonding_set,
    name: "bonding", abbr: "b", attr: attr::BONDING_ENABLED,
    sysfs: Some("bonding"), vlan_aware: false
);

boolean_setting!(
    BRIDGE_LOOP_AVOIDANCE, bridge_loop_avoidance_get, bridge_loop_avoidance_set,
    name: "bridge_loop_avoidance", abbr: "bl", attr: attr::BRIDGE_LOOP_AVOIDANCE_ENABLED,
    sysfs: Some("bridge_loop_avoidance"), vlan_aware: false
);

boolean_setting!(
    DISTRIBUTED_ARP_TABLE, distributed_arp_table_get, distributed_arp_table_set,
    name: "distributed_arp_table", abbr: "dat", attr: attr::DISTRIBUTED_ARP_TABLE_ENABLED,
    sysfs: Some("distributed_arp_table"), vlan_aware: false
);

boolean_setting!(
    FRAGMENTATION, fragmentation_get, fragmentation_set,
    name: "fragmentation", abbr: "f", attr: attr::FRAGMENTATION_ENABLED,
    sysfs: Some("fragmentation"), vlan_aware: false
);

// sysfs only knows the inverse switch (multicast_mode)
boolean_setting!(
    MULTICAST_FORCEFLOOD, multicast_forceflood_get, multicast_forceflood_set,
    name: "multicast_forceflood", abbr: "mff", attr: attr::MULTICAST_FORCEFLOOD_ENABLED,
    sysfs: None, vlan_aware: false
);

boolean_setting!(
    NETWORK_CODING, network_coding_get, network_coding_set,
    name: "network_coding", abbr: "nc", attr: attr::NETWORK_CODING_ENABLED,
    sysfs: Some("network_coding"), vlan_aware: false
);

// ===== Numeric settings =====

fn hop_penalty_get(session: &mut Session, target: &Target) -> QueryOutcome<String> {
    query(session, target, false, |attrs| {
        attrs.get_u8(attr::HOP_PENALTY).map(|penalty| penalty.to_string())
    })
}

fn hop_penalty_set(session: &mut Session, target: &Target, value: &SettingValue) -> QueryOutcome {
    match value {
        SettingValue::U8(penalty) => update(session, target, false, |msg| {
            msg.put_u8(attr::HOP_PENALTY, *penalty)
        }),
        other => unexpected("hop_penalty", other),
    }
}

fn hop_penalty_parse(values: &[String]) -> Result<SettingValue, SettingsError> {
    validation::parse_u8("hop_penalty", first(values)?).map(SettingValue::U8)
}

pub static HOP_PENALTY: SettingDescriptor = SettingDescriptor {
    name: "hop_penalty",
    abbr: "hp",
    usage: "[penalty]",
    protocol_read: Some(hop_penalty_get),
    protocol_write: Some(hop_penalty_set),
    legacy_entry: Some("hop_penalty"),
    vlan_aware: false,
    allowed_values: None,
    parse: Some(hop_penalty_parse),
};

fn orig_interval_get(session: &mut Session, target: &Target) -> QueryOutcome<String> {
    query(session, target, false, |attrs| {
        attrs.get_u32(attr::ORIG_INTERVAL).map(|interval| interval.to_string())
    })
}

fn orig_interval_set(session: &mut Session, target: &Target, value: &SettingValue) -> QueryOutcome {
    match value {
        SettingValue::U32(interval) => update(session, target, false, |msg| {
            msg.put_u32(attr::ORIG_INTERVAL, *interval)
        }),
        other => unexpected("orig_interval", other),
    }
}

fn orig_interval_parse(values: &[String]) -> Result<SettingValue, SettingsError> {
    validation::parse_u32("orig_interval", first(values)?).map(SettingValue::U32)
}

pub static ORIG_INTERVAL: SettingDescriptor = SettingDescriptor {
    name: "orig_interval",
    abbr: "it",
    usage: "[interval]",
    protocol_read: Some(orig_interval_get),
    protocol_write: Some(orig_interval_set),
    legacy_entry: Some("orig_interval"),
    vlan_aware: false,
    allowed_values: None,
    parse: Some(orig_interval_parse),
};

fn isolation_mark_get(session: &mut Session, target: &Target) -> QueryOutcome<String> {
    query(session, target, false, |attrs| {
        let mark = attrs.get_u32(attr::ISOLATION_MARK)?;
        let mask = attrs.get_u32(attr::ISOLATION_MASK)?;
        Some(format!("{mark:#010x}/{mask:#010x}"))
    })
}

fn isolation_mark_set(session: &mut Session, target: &Target, value: &SettingValue) -> QueryOutcome {
    match value {
        SettingValue::Mark { value: mark, mask } => update(session, target, false, |msg| {
            msg.put_u32(attr::ISOLATION_MARK, *mark);
            msg.put_u32(attr::ISOLATION_MASK, *mask);
        }),
        other => unexpected("isolation_mark", other),
    }
}

fn isolation_mark_parse(values: &[String]) -> Result<SettingValue, SettingsError> {
    validation::parse_mark(first(values)?)
}

pub static ISOLATION_MARK: SettingDescriptor = SettingDescriptor {
    name: "isolation_mark",
    abbr: "mark",
    usage: "[mark]",
    protocol_read: Some(isolation_mark_get),
    protocol_write: Some(isolation_mark_set),
    legacy_entry: Some("isolation_mark"),
    vlan_aware: false,
    allowed_values: None,
    parse: Some(isolation_mark_parse),
};
