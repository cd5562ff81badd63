//! Common test utilities: an in-memory kernel and an in-memory sysfs

#![allow(dead_code)]

use mesh_settings::infra::netlink::batadv::{attr, Command};
use mesh_settings::infra::netlink::codec::{
    self, GenlMessage, NetlinkMessage, CTRL_ATTR_FAMILY_ID, CTRL_ATTR_FAMILY_NAME,
    CTRL_CMD_GETFAMILY, GENL_ID_CTRL,
};
use mesh_settings::{LegacyBackend, LegacyError, PrivilegeGuard, SettingsError, Transport};
use mesh_settings::{Session, SettingsDispatcher, SysfsLayout, Target};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const FAMILY_ID: u16 = 0x1c;
pub const MESH_IFINDEX: u32 = 7;
pub const EOPNOTSUPP: i32 = 95;

pub fn print_test_header(test_name: &str, purpose: &str) {
    println!("\n🧪 TEST: {}", test_name);
    println!("📋 PURPOSE: {}", purpose);
}

pub fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

// ===== Kernel =====

/// How the fake kernel answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelMode {
    /// Serve GET/SET from the attribute store
    Normal,
    /// Negative acknowledgement with this (negative) errno for every request
    Fail(i32),
}

#[derive(Debug)]
pub struct KernelState {
    pub mode: KernelMode,
    /// Mesh-wide attributes, raw payloads
    pub mesh: BTreeMap<u16, Vec<u8>>,
    /// Per-VLAN attributes
    pub vlans: HashMap<u16, BTreeMap<u16, Vec<u8>>>,
    pub requests: Vec<GenlMessage>,
    pending: VecDeque<Vec<u8>>,
}

impl KernelState {
    pub fn set_mesh_u8(&mut self, kind: u16, value: u8) {
        self.mesh.insert(kind, vec![value]);
    }

    pub fn set_mesh_u32(&mut self, kind: u16, value: u32) {
        self.mesh.insert(kind, value.to_ne_bytes().to_vec());
    }

    pub fn set_vlan_u8(&mut self, vid: u16, kind: u16, value: u8) {
        self.vlans.entry(vid).or_default().insert(kind, vec![value]);
    }

    pub fn mesh_u8(&self, kind: u16) -> Option<u8> {
        self.mesh.get(&kind).and_then(|v| v.first().copied())
    }

    pub fn mesh_u32(&self, kind: u16) -> Option<u32> {
        let raw = self.mesh.get(&kind)?;
        Some(u32::from_ne_bytes(raw.get(..4)?.try_into().ok()?))
    }

    pub fn vlan_u8(&self, vid: u16, kind: u16) -> Option<u8> {
        self.vlans.get(&vid)?.get(&kind)?.first().copied()
    }

    /// Datagrams the kernel has queued but nobody has read
    pub fn unread(&self) -> usize {
        self.pending.len()
    }

    /// Controller reply and its acknowledgement, as two datagrams
    fn answer_family_lookup(&mut self, request: &GenlMessage) {
        let mut reply = GenlMessage::request(GENL_ID_CTRL, CTRL_CMD_GETFAMILY);
        reply.flags = 0;
        reply.seq = request.seq;
        if let Some(name) = request.attributes.get_string(CTRL_ATTR_FAMILY_NAME) {
            reply.put_string(CTRL_ATTR_FAMILY_NAME, &name);
        }
        reply.put_u16(CTRL_ATTR_FAMILY_ID, FAMILY_ID);
        self.pending.push_back(reply.encode().unwrap().to_vec());
        self.pending.push_back(codec::encode_error(request.seq, 0).to_vec());
    }

    fn answer(&mut self, request: &GenlMessage) {
        if request.family == GENL_ID_CTRL {
            self.answer_family_lookup(request);
            return;
        }
        self.requests.push(request.clone());
        if let KernelMode::Fail(code) = self.mode {
            self.pending.push_back(codec::encode_error(request.seq, code).to_vec());
            return;
        }

        let vid = request.attributes.get_u16(attr::VLANID);
        let command = request.command;
        if command == Command::GetMesh.code() || command == Command::GetVlan.code() {
            let store = match vid {
                Some(vid) if command == Command::GetVlan.code() => {
                    self.vlans.get(&vid).cloned().unwrap_or_default()
                }
                _ => self.mesh.clone(),
            };
            let mut reply = GenlMessage::request(FAMILY_ID, command);
            reply.flags = 0;
            reply.seq = request.seq;
            for (kind, payload) in store {
                reply.attributes.push(kind, payload);
            }
            self.pending.push_back(reply.encode().unwrap().to_vec());
        } else if command == Command::SetMesh.code() || command == Command::SetVlan.code() {
            for attribute in request.attributes.iter() {
                if attribute.kind == attr::MESH_IFINDEX || attribute.kind == attr::VLANID {
                    continue;
                }
                let payload = attribute.payload.to_vec();
                match vid {
                    Some(vid) if command == Command::SetVlan.code() => {
                        self.vlans.entry(vid).or_default().insert(attribute.kind, payload);
                    }
                    _ => {
                        self.mesh.insert(attribute.kind, payload);
                    }
                }
            }
        }
        self.pending.push_back(codec::encode_error(request.seq, 0).to_vec());
    }
}

/// Transport backed by [`KernelState`]
pub struct FakeKernel(Rc<RefCell<KernelState>>);

impl Transport for FakeKernel {
    fn send(&mut self, datagram: &[u8]) -> io::Result<()> {
        let messages = codec::decode(datagram)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        let mut state = self.0.borrow_mut();
        for message in messages {
            if let NetlinkMessage::Data(request) = message {
                state.answer(&request);
            }
        }
        Ok(())
    }

    fn recv(&mut self) -> io::Result<Vec<u8>> {
        self.0
            .borrow_mut()
            .pending
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::WouldBlock, "kernel has nothing to say"))
    }
}

/// Kernel transport that has not been used for anything yet
pub fn kernel_transport(mode: KernelMode) -> (FakeKernel, Rc<RefCell<KernelState>>) {
    let state = Rc::new(RefCell::new(KernelState {
        mode,
        mesh: BTreeMap::new(),
        vlans: HashMap::new(),
        requests: Vec::new(),
        pending: VecDeque::new(),
    }));
    (FakeKernel(state.clone()), state)
}

pub fn kernel(mode: KernelMode) -> (Session, Rc<RefCell<KernelState>>) {
    let (transport, state) = kernel_transport(mode);
    let session = Session::new(Box::new(transport), FAMILY_ID, MESH_IFINDEX);
    (session, state)
}

// ===== sysfs =====

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyCall {
    Read { path: PathBuf },
    Write { path: PathBuf, line: String },
}

/// In-memory sysfs that records every access
#[derive(Default)]
pub struct MemorySysfs {
    pub entries: RefCell<HashMap<PathBuf, String>>,
    pub calls: RefCell<Vec<LegacyCall>>,
}

impl MemorySysfs {
    pub fn with_entry(self, path: impl Into<PathBuf>, value: &str) -> Self {
        self.entries.borrow_mut().insert(path.into(), value.to_string());
        self
    }

    pub fn calls(&self) -> Vec<LegacyCall> {
        self.calls.borrow().clone()
    }

    pub fn value(&self, path: impl AsRef<Path>) -> Option<String> {
        self.entries.borrow().get(path.as_ref()).cloned()
    }
}

impl LegacyBackend for MemorySysfs {
    fn read(&self, dir: &Path, entry: &str) -> Result<String, LegacyError> {
        let path = dir.join(entry);
        self.calls.borrow_mut().push(LegacyCall::Read { path: path.clone() });
        self.entries
            .borrow()
            .get(&path)
            .cloned()
            .ok_or(LegacyError::NotFound { path })
    }

    fn write(
        &self,
        dir: &Path,
        entry: &str,
        value: &str,
        secondary: Option<&str>,
    ) -> Result<(), LegacyError> {
        let path = dir.join(entry);
        let line = match secondary {
            Some(secondary) => format!("{value} {secondary}"),
            None => value.to_string(),
        };
        self.calls.borrow_mut().push(LegacyCall::Write {
            path: path.clone(),
            line: line.clone(),
        });
        let mut entries = self.entries.borrow_mut();
        match entries.get_mut(&path) {
            Some(current) => {
                *current = line;
                Ok(())
            }
            None => Err(LegacyError::NotFound { path }),
        }
    }
}

// ===== Privileges =====

pub struct Root;

impl PrivilegeGuard for Root {
    fn ensure_can_write(&self, _setting: &'static str) -> Result<(), SettingsError> {
        Ok(())
    }
}

pub struct NotRoot;

impl PrivilegeGuard for NotRoot {
    fn ensure_can_write(&self, setting: &'static str) -> Result<(), SettingsError> {
        Err(SettingsError::PermissionDenied { setting })
    }
}

// ===== Invocation helper =====

pub const MESH_DIR: &str = "/sys/class/net/bat0/mesh";

/// Outcome of one dispatcher run plus everything written to the diagnostics sink
pub struct Invocation {
    pub result: Result<mesh_settings::Report, SettingsError>,
    pub diagnostics: String,
}

pub fn invoke(
    session: &mut Session,
    sysfs: &MemorySysfs,
    guard: &dyn PrivilegeGuard,
    descriptor: &mesh_settings::SettingDescriptor,
    target: &Target,
    argv: &[&str],
) -> Invocation {
    let layout = SysfsLayout::default();
    let mut diagnostics = Vec::new();
    let result = {
        let mut dispatcher = SettingsDispatcher::new(session, sysfs, guard, &layout, &mut diagnostics);
        dispatcher.handle(descriptor, target, &args(argv))
    };
    Invocation {
        result,
        diagnostics: String::from_utf8(diagnostics).unwrap(),
    }
}
