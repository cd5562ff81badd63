//! Query executor: one batman-adv request, one terminal answer

use super::batadv::{attr, Command, EOPNOTSUPP};
use super::codec::{self, CodecError, GenlMessage, NetlinkMessage};
use super::session::Session;
use crate::contract::{QueryOutcome, SettingsError, UnsupportedReason};
use std::ops::ControlFlow;

/// Appends command specific attributes to an outgoing request
pub type AttributeCallback<'a> = &'a dyn Fn(&mut GenlMessage) -> Result<(), CodecError>;

/// Inspects one data message; `Break` marks the query as answered.
pub type ResponseCallback<'a> = &'a mut dyn FnMut(&GenlMessage) -> ControlFlow<()>;

/// Send `command` for the session's mesh interface and wait for the answer.
///
/// Terminal events are a data message accepted by `response`, an
/// acknowledgement, an error acknowledgement or `NLMSG_DONE`. A query with a
/// response callback that never accepts a message reports the backend as
/// unsupported. There is no retry and no timeout.
pub fn execute(
    session: &mut Session,
    command: Command,
    attributes: Option<AttributeCallback<'_>>,
    mut response: Option<ResponseCallback<'_>>,
) -> QueryOutcome {
    if !session.has_transport() {
        return QueryOutcome::Unsupported(UnsupportedReason::NoTransport);
    }

    let mut request = GenlMessage::request(session.family_id(), command.code());
    request.seq = session.next_seq();
    request.put_u32(attr::MESH_IFINDEX, session.mesh_ifindex());
    if let Some(add_attributes) = attributes {
        if let Err(err) = add_attributes(&mut request) {
            return QueryOutcome::Failed(SettingsError::Protocol(err.to_string()));
        }
    }
    let datagram = match request.encode() {
        Ok(datagram) => datagram,
        Err(err) => return QueryOutcome::Failed(SettingsError::Protocol(err.to_string())),
    };

    let Some(transport) = session.transport() else {
        return QueryOutcome::Unsupported(UnsupportedReason::NoTransport);
    };
    tracing::trace!(?command, seq = request.seq, "sending netlink request");
    if let Err(err) = transport.send(&datagram) {
        return QueryOutcome::Failed(SettingsError::Protocol(err.to_string()));
    }

    let outcome = if response.is_some() {
        QueryOutcome::Unsupported(UnsupportedReason::Declined)
    } else {
        QueryOutcome::Success(())
    };

    loop {
        let received = match transport.recv() {
            Ok(received) => received,
            Err(err) => return QueryOutcome::Failed(SettingsError::Protocol(err.to_string())),
        };
        let messages = match codec::decode(&received) {
            Ok(messages) => messages,
            Err(err) => return QueryOutcome::Failed(SettingsError::Protocol(err.to_string())),
        };

        for message in messages {
            // leftovers of an earlier query on the same socket
            if message.seq() != request.seq {
                continue;
            }
            match message {
                NetlinkMessage::Data(reply) => {
                    if let Some(handle) = response.as_mut() {
                        if handle(&reply).is_break() {
                            return QueryOutcome::Success(());
                        }
                    }
                }
                NetlinkMessage::Error { code: 0, .. } | NetlinkMessage::Done { .. } => {
                    return outcome;
                }
                NetlinkMessage::Error { code, .. } if code == -EOPNOTSUPP => {
                    tracing::debug!(?command, "kernel does not support command");
                    return QueryOutcome::Unsupported(UnsupportedReason::Declined);
                }
                NetlinkMessage::Error { code, .. } => {
                    let err = SettingsError::from_errno(code);
                    tracing::debug!(?command, code, "{err}");
                    return QueryOutcome::Failed(err);
                }
                NetlinkMessage::Noop { .. } | NetlinkMessage::Overrun { .. } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::netlink::Transport;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::rc::Rc;

    #[derive(Default)]
    struct Script {
        sent: Vec<GenlMessage>,
        replies: VecDeque<Box<dyn Fn(u32) -> Vec<u8>>>,
    }

    struct ScriptedTransport(Rc<RefCell<Script>>);

    impl Transport for ScriptedTransport {
        fn send(&mut self, datagram: &[u8]) -> io::Result<()> {
            for message in codec::decode(datagram).unwrap() {
                if let NetlinkMessage::Data(msg) = message {
                    self.0.borrow_mut().sent.push(msg);
                }
            }
            Ok(())
        }

        fn recv(&mut self) -> io::Result<Vec<u8>> {
            let mut script = self.0.borrow_mut();
            let seq = script.sent.last().map_or(0, |msg| msg.seq);
            let reply = script
                .replies
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))?;
            Ok(reply(seq))
        }
    }

    fn session_with(replies: Vec<Box<dyn Fn(u32) -> Vec<u8>>>) -> (Session, Rc<RefCell<Script>>) {
        let script = Rc::new(RefCell::new(Script {
            sent: Vec::new(),
            replies: replies.into(),
        }));
        let session = Session::new(Box::new(ScriptedTransport(script.clone())), 0x1c, 9);
        (session, script)
    }

    fn ack(code: i32) -> Box<dyn Fn(u32) -> Vec<u8>> {
        Box::new(move |seq| codec::encode_error(seq, code).to_vec())
    }

    fn data(attr_kind: u16, value: u8) -> Box<dyn Fn(u32) -> Vec<u8>> {
        Box::new(move |seq| {
            let mut msg = GenlMessage::request(0x1c, Command::GetMesh.code());
            msg.flags = 0;
            msg.seq = seq;
            msg.put_u8(attr_kind, value);
            msg.encode().unwrap().to_vec()
        })
    }

    #[test]
    fn test_no_transport_is_unsupported() {
        let mut session = Session::without_transport();
        let outcome = execute(&mut session, Command::GetMesh, None, None);
        assert!(matches!(
            outcome,
            QueryOutcome::Unsupported(UnsupportedReason::NoTransport)
        ));
    }

    #[test]
    fn test_request_carries_mesh_ifindex_and_extra_attributes() {
        let (mut session, script) = session_with(vec![ack(0)]);
        let add: AttributeCallback<'_> = &|msg: &mut GenlMessage| {
            msg.put_u8(attr::BONDING_ENABLED, 1);
            Ok(())
        };

        let outcome = execute(&mut session, Command::SetMesh, Some(add), None);
        assert!(matches!(outcome, QueryOutcome::Success(())));

        let script = script.borrow();
        let sent = &script.sent[0];
        assert_eq!(sent.family, 0x1c);
        assert_eq!(sent.command, Command::SetMesh.code());
        assert_eq!(sent.attributes.get_u32(attr::MESH_IFINDEX), Some(9));
        assert_eq!(sent.attributes.get_u8(attr::BONDING_ENABLED), Some(1));
    }

    #[test]
    fn test_eopnotsupp_is_unsupported() {
        let (mut session, _) = session_with(vec![ack(-EOPNOTSUPP)]);
        let outcome = execute(&mut session, Command::SetMesh, None, None);
        assert!(matches!(
            outcome,
            QueryOutcome::Unsupported(UnsupportedReason::Declined)
        ));
    }

    #[test]
    fn test_other_errors_are_failures() {
        let (mut session, _) = session_with(vec![ack(-1)]);
        let outcome = execute(&mut session, Command::SetMesh, None, None);
        match outcome {
            QueryOutcome::Failed(SettingsError::Transport { code, .. }) => assert_eq!(code, -1),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_response_callback_receives_data() {
        let (mut session, _) = session_with(vec![data(attr::BONDING_ENABLED, 1)]);
        let mut seen = None;
        let mut handle = |msg: &GenlMessage| match msg.attributes.get_u8(attr::BONDING_ENABLED) {
            Some(value) => {
                seen = Some(value);
                ControlFlow::Break(())
            }
            None => ControlFlow::Continue(()),
        };

        let outcome = execute(&mut session, Command::GetMesh, None, Some(&mut handle));
        assert!(matches!(outcome, QueryOutcome::Success(())));
        assert_eq!(seen, Some(1));
    }

    #[test]
    fn test_ack_without_data_is_unsupported_for_reads() {
        let (mut session, _) = session_with(vec![data(attr::FRAGMENTATION_ENABLED, 1), ack(0)]);
        let mut handle = |msg: &GenlMessage| match msg.attributes.get_u8(attr::BONDING_ENABLED) {
            Some(_) => ControlFlow::Break(()),
            None => ControlFlow::Continue(()),
        };

        let outcome = execute(&mut session, Command::GetMesh, None, Some(&mut handle));
        assert!(matches!(
            outcome,
            QueryOutcome::Unsupported(UnsupportedReason::Declined)
        ));
    }

    #[test]
    fn test_stale_replies_are_skipped() {
        let stale: Box<dyn Fn(u32) -> Vec<u8>> =
            Box::new(|seq| codec::encode_error(seq.wrapping_sub(1), -1).to_vec());
        let (mut session, _) = session_with(vec![stale, ack(0)]);

        let outcome = execute(&mut session, Command::SetMesh, None, None);
        assert!(matches!(outcome, QueryOutcome::Success(())));
    }

    #[test]
    fn test_socket_error_is_protocol_failure() {
        let (mut session, _) = session_with(Vec::new());
        let outcome = execute(&mut session, Command::SetMesh, None, None);
        assert!(matches!(outcome, QueryOutcome::Failed(SettingsError::Protocol(_))));
    }
}
