//! Protocol-level tests for the client engine
//!
//! Each test drives a Client through a scripted server: the handshake and
//! extension discovery are answered automatically, everything after that is
//! built byte by byte so the wire layout is checked as well as the dispatch.

mod common;

use common::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use x11client::extensions::ExtensionVersion;
use x11client::protocol::*;
use x11client::{ConnectionState, EventCallbacks, RequestState};

#[test]
fn test_discovery_registers_advertised_extensions() {
    let (client, _) = ready_client(&[SHM, BIG_REQUESTS, XFIXES, PRESENT, XINPUT]);

    let names: Vec<_> = client.extensions().names().collect();
    assert_eq!(
        names,
        vec!["core", "MIT-SHM", "BIG-REQUESTS", "XFIXES", "Present", "XInputExtension"]
    );
    assert!(client.has_extension("Present"));
    assert!(!client.has_extension("RANDR"));
    assert_eq!(
        client.extensions().version("XFIXES"),
        Some(ExtensionVersion { major: 5, minor: 0 })
    );
    assert_eq!(
        client.extensions().version("XInputExtension"),
        Some(ExtensionVersion { major: 2, minor: 4 })
    );
    assert!(client.big_requests_enabled());
    assert_eq!(client.maximum_request_length(), BIG_REQUEST_MAXIMUM);
    assert_eq!(client.pending_request_count(), 0);
}

#[test]
fn test_connected_waits_for_version_replies() {
    let mut server = FakeServer::new(&[XFIXES]);
    let mut client = server.client();
    let connected = Rc::new(Cell::new(false));
    let seen = Rc::clone(&connected);
    client
        .connect(move |_, result| {
            assert!(result.is_ok());
            seen.set(true);
        })
        .unwrap();
    server.transport.take_written();
    let setup = setup_success();
    client.process_input(&setup);
    assert_eq!(client.state(), ConnectionState::Discovering);

    // Answer the ten queries by hand: only XFIXES (the sixth) is present
    let queries = server.skip_written();
    assert_eq!(queries.len(), 10);
    for sequence in 1..=10u16 {
        let payload = if sequence == 6 {
            vec![1, XFIXES.major_opcode, XFIXES.first_event, XFIXES.first_error]
        } else {
            vec![0; 4]
        };
        client.process_input(&reply(sequence, 0, &payload));
    }
    assert!(!connected.get());
    assert_eq!(client.state(), ConnectionState::Discovering);

    let version_request = server.skip_written();
    assert_eq!(version_request.len(), 1);
    assert_eq!(version_request[0][0], XFIXES.major_opcode);
    assert_eq!(client.sequence_number(), 11);

    let payload = [5u32.to_le_bytes(), 0u32.to_le_bytes()].concat();
    client.process_input(&reply(11, 0, &payload));
    assert!(connected.get());
    assert!(client.is_ready());
}

#[test]
fn test_setup_failure_reaches_connect_callback() {
    let server = FakeServer::new(&[]);
    let mut client = server.client();
    let reason = Rc::new(RefCell::new(None));
    let seen = Rc::clone(&reason);
    client
        .connect(move |_, result| {
            if let Err(ClientError::Connection(message)) = result {
                *seen.borrow_mut() = Some(message);
            }
        })
        .unwrap();

    let bytes = setup_failed("No protocol specified");
    assert_eq!(client.process_input(&bytes), bytes.len());
    assert_eq!(reason.borrow().as_deref(), Some("No protocol specified"));
    assert_eq!(client.state(), ConnectionState::Failed);
    assert!(client.map_window(Window::new(1)).is_err());
}

#[test]
fn test_sequence_numbers_increment_by_one() {
    let (mut client, mut server) = ready_client(&[]);
    let base = client.sequence_number();

    let first = client.map_window(Window::new(0x00200001)).unwrap();
    let second = client.no_operation().unwrap();
    assert_eq!(first, base.wrapping_add(1));
    assert_eq!(second, base.wrapping_add(2));
    assert_eq!(client.pending_request_count(), 0);

    let frames = server.skip_written();
    assert_eq!(frames[0], vec![8, 0, 2, 0, 0x01, 0x00, 0x20, 0x00]);
    assert_eq!(frames[1], vec![127, 0, 1, 0]);
}

#[test]
fn test_intern_atom_reply_delivered_once() {
    let (mut client, mut server) = ready_client(&[]);
    let atoms = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&atoms);
    let cookie = client
        .intern_atom("WM_PROTOCOLS", true, move |_, result| {
            seen.borrow_mut().push(result.unwrap());
        })
        .unwrap();

    let frame = server.skip_written().remove(0);
    let mut expected = vec![16, 1, 5, 0, 12, 0, 0, 0];
    expected.extend_from_slice(b"WM_PROTOCOLS");
    assert_eq!(frame, expected);
    assert_eq!(cookie.state(), RequestState::Pending);

    let message = reply(cookie.sequence_number(), 0, &97u32.to_le_bytes());
    assert_eq!(client.process_input(&message), 32);
    assert_eq!(*atoms.borrow(), vec![Atom(97)]);
    assert_eq!(cookie.state(), RequestState::Completed);

    // A second reply for the same sequence number has nobody to go to
    assert_eq!(client.process_input(&message), 32);
    assert_eq!(atoms.borrow().len(), 1);
}

#[test]
fn test_input_split_across_chunks() {
    let (mut client, _) = ready_client(&[]);
    let names = Rc::new(RefCell::new(None));
    let seen = Rc::clone(&names);
    let cookie = client
        .get_atom_name(Atom::WM_NAME, move |_, result| {
            *seen.borrow_mut() = Some(result.unwrap());
        })
        .unwrap();

    let mut payload = Vec::new();
    payload.extend_from_slice(&7u16.to_le_bytes());
    payload.extend_from_slice(&[0; 22]);
    payload.extend_from_slice(b"WM_NAME\0");
    let message = reply(cookie.sequence_number(), 0, &payload);
    assert_eq!(message.len(), 40);

    assert_eq!(client.process_input(&message[..7]), 0);
    assert_eq!(client.process_input(&message[..39]), 0);
    assert!(names.borrow().is_none());
    assert_eq!(client.process_input(&message), 40);
    assert_eq!(names.borrow().as_deref(), Some("WM_NAME"));
}

#[test]
fn test_cancelled_request_drops_reply() {
    let (mut client, _) = ready_client(&[]);
    let called = Rc::new(Cell::new(false));
    let seen = Rc::clone(&called);
    let cookie = client
        .intern_atom("_NET_WM_NAME", false, move |_, _| seen.set(true))
        .unwrap();
    cookie.cancel();
    assert_eq!(cookie.state(), RequestState::Cancelled);

    client.process_input(&reply(cookie.sequence_number(), 0, &300u32.to_le_bytes()));
    assert!(!called.get());
    assert_eq!(cookie.state(), RequestState::Cancelled);
    assert_eq!(client.pending_request_count(), 0);
}

#[test]
fn test_error_completes_pending_request() {
    let (mut client, _) = ready_client(&[]);
    let outcome = Rc::new(RefCell::new(None));
    let seen = Rc::clone(&outcome);
    let cookie = client
        .get_atom_name(Atom(0xdead), move |_, result| {
            *seen.borrow_mut() = Some(result);
        })
        .unwrap();
    let unsolicited = Rc::new(Cell::new(0));
    let counter = Rc::clone(&unsolicited);
    client.set_error_callback(move |_, _| counter.set(counter.get() + 1));

    client.process_input(&error(5, cookie.sequence_number(), 0xdead, 17));
    match outcome.borrow_mut().take() {
        Some(Err(ClientError::Protocol(e))) => {
            assert_eq!(e.kind, ErrorKind::Atom);
            assert_eq!(e.bad_value, 0xdead);
            assert_eq!(e.major_opcode, 17);
        }
        other => panic!("unexpected outcome {:?}", other.map(|r| r.is_ok())),
    }
    assert_eq!(unsolicited.get(), 0);
}

#[test]
fn test_extension_errors_resolved_by_range() {
    let (mut client, _) = ready_client(&[SHM, XFIXES, XINPUT]);
    let errors = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&errors);
    client.set_error_callback(move |_, e| seen.borrow_mut().push((e.code, e.kind)));

    let sequence = client.map_window(Window::new(0x00200001)).unwrap();
    client.process_input(&error(3, sequence, 0x00200001, 8));
    client.process_input(&error(128, sequence, 0, 130));
    client.process_input(&error(129, sequence, 0, 131));
    client.process_input(&error(140, sequence, 0, 138));
    client.process_input(&error(250, sequence, 0, 1));

    assert_eq!(
        *errors.borrow(),
        vec![
            (3, ErrorKind::Window),
            (128, ErrorKind::ShmBadSegment),
            (129, ErrorKind::InputDevice),
            (140, ErrorKind::XfixesBadRegion),
            (250, ErrorKind::Unknown),
        ]
    );
}

#[test]
fn test_core_and_extension_events_dispatched() {
    let (mut client, _) = ready_client(&[SHM]);
    let exposed = Rc::new(RefCell::new(Vec::new()));
    let completions = Rc::new(RefCell::new(Vec::new()));
    let unknown = Rc::new(RefCell::new(Vec::new()));
    let (e, c, u) = (Rc::clone(&exposed), Rc::clone(&completions), Rc::clone(&unknown));
    client.set_event_callbacks(EventCallbacks {
        expose: Some(Box::new(move |_, ev| e.borrow_mut().push((ev.window, ev.width, ev.height)))),
        shm_completion: Some(Box::new(move |_, ev| c.borrow_mut().push((ev.shmseg, ev.offset)))),
        unknown_event: Some(Box::new(move |_, code| u.borrow_mut().push(code))),
        ..Default::default()
    });

    let mut expose = vec![0u8; 32];
    expose[0] = 12;
    expose[4..8].copy_from_slice(&0x00200001u32.to_le_bytes());
    expose[12..14].copy_from_slice(&640u16.to_le_bytes());
    expose[14..16].copy_from_slice(&480u16.to_le_bytes());

    let mut completion = vec![0u8; 32];
    completion[0] = SHM.first_event | 0x80;
    completion[4..8].copy_from_slice(&0x00200002u32.to_le_bytes());
    completion[8..10].copy_from_slice(&3u16.to_le_bytes());
    completion[10] = SHM.major_opcode;
    completion[12..16].copy_from_slice(&0x00200003u32.to_le_bytes());
    completion[16..20].copy_from_slice(&4096u32.to_le_bytes());

    // Code 87 would be XFIXES, which this server does not have
    let mut stray = vec![0u8; 32];
    stray[0] = 87;

    let input = [expose, completion, stray].concat();
    assert_eq!(client.process_input(&input), 96);
    assert_eq!(*exposed.borrow(), vec![(Window::new(0x00200001), 640, 480)]);
    assert_eq!(*completions.borrow(), vec![(ShmSeg::new(0x00200003), 4096)]);
    assert_eq!(*unknown.borrow(), vec![87]);
}

#[test]
fn test_generic_events_use_extra_length() {
    let (mut client, _) = ready_client(&[PRESENT]);
    let completed = Rc::new(RefCell::new(Vec::new()));
    let unknown = Rc::new(RefCell::new(Vec::new()));
    let (c, u) = (Rc::clone(&completed), Rc::clone(&unknown));
    client.set_event_callbacks(EventCallbacks {
        present_complete_notify: Some(Box::new(move |_, ev| {
            c.borrow_mut().push((ev.serial, ev.msc))
        })),
        unknown_generic_event: Some(Box::new(move |_, major, event_type| {
            u.borrow_mut().push((major, event_type))
        })),
        ..Default::default()
    });

    let mut data = vec![0u8, 1];
    data.extend_from_slice(&0x00200010u32.to_le_bytes());
    data.extend_from_slice(&0x00200001u32.to_le_bytes());
    data.extend_from_slice(&42u32.to_le_bytes());
    data.extend_from_slice(&1_000_000u64.to_le_bytes());
    data.extend_from_slice(&600u64.to_le_bytes());
    let event = generic_event(PRESENT.major_opcode, 1, &data);
    assert_eq!(event.len(), 40);

    assert_eq!(client.process_input(&event[..32]), 0);
    assert_eq!(client.process_input(&event[..39]), 0);
    assert_eq!(client.process_input(&event), 40);
    assert_eq!(*completed.borrow(), vec![(42, 600)]);

    let foreign = generic_event(200, 7, &[]);
    assert_eq!(client.process_input(&foreign), 32);
    assert_eq!(*unknown.borrow(), vec![(200, 7)]);
}

#[test]
fn test_sync_alarm_lifecycle() {
    use x11client::extensions::sync::{test_type, value_type, AlarmAttributes};

    let (mut client, mut server) = ready_client(&[SYNC]);
    assert_eq!(
        client.extensions().version("SYNC"),
        Some(ExtensionVersion { major: 3, minor: 1 })
    );
    let notified = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&notified);
    client.event_callbacks_mut().sync_alarm_notify = Some(Box::new(move |_, e| {
        seen.borrow_mut().push((e.alarm, e.counter_value, e.alarm_value))
    }));

    let counter = Counter::from(client.generate_id());
    let alarm = Alarm::from(client.generate_id());
    client
        .sync_create_alarm(
            alarm,
            &AlarmAttributes {
                counter: Some(counter),
                value_type: Some(value_type::ABSOLUTE),
                value: Some(5),
                test_type: Some(test_type::POSITIVE_COMPARISON),
                ..Default::default()
            },
        )
        .unwrap();
    let frame = server.skip_written().remove(0);
    assert_eq!(&frame[..4], &[SYNC.major_opcode, 8, 8, 0]);
    assert_eq!(&frame[8..12], &0b1111u32.to_le_bytes());
    // Value 5 as high word then low word
    assert_eq!(&frame[20..28], &[0, 0, 0, 0, 5, 0, 0, 0]);

    let mut event = vec![0u8; 32];
    event[0] = SYNC.first_event + 1;
    event[4..8].copy_from_slice(&alarm.id().get().to_le_bytes());
    event[12..16].copy_from_slice(&6u32.to_le_bytes());
    event[20..24].copy_from_slice(&5u32.to_le_bytes());
    client.process_input(&event);
    assert_eq!(*notified.borrow(), vec![(alarm, 6, 5)]);
}

#[test]
fn test_overlong_atom_name_is_rejected() {
    let (mut client, mut server) = ready_client(&[BIG_REQUESTS]);
    let before = client.sequence_number();
    let name = "A".repeat(0x10000);

    let called = Rc::new(Cell::new(false));
    let seen = Rc::clone(&called);
    match client.intern_atom(&name, false, move |_, _| seen.set(true)).err() {
        Some(ClientError::TooLong { field, length, maximum }) => {
            assert_eq!(field, "atom name");
            assert_eq!(length, 0x10000);
            assert_eq!(maximum, 0xffff);
        }
        other => panic!("expected TooLong, got {:?}", other),
    }
    assert_eq!(client.sequence_number(), before);
    assert!(server.skip_written().is_empty());
    assert!(!called.get());

    // One byte shorter fits the length field
    client.intern_atom(&name[1..], false, |_, _| {}).unwrap();
    assert_eq!(client.sequence_number(), before.wrapping_add(1));
    assert_eq!(server.skip_written().len(), 1);
}

#[test]
fn test_big_requests_needs_extension() {
    let payload = vec![0u8; 0xffff * 4];

    let (mut client, mut server) = ready_client(&[]);
    let before = client.sequence_number();
    let mut w = WireWriter::new();
    w.bytes(&payload);
    match client.send_request(RequestOpcode::NoOperation as u8, 0, w) {
        Err(ClientError::RequestTooLarge { length, maximum }) => {
            assert_eq!(length, 0x10000);
            assert_eq!(maximum, 0xffff);
        }
        other => panic!("expected RequestTooLarge, got {:?}", other),
    }
    assert_eq!(client.sequence_number(), before);
    assert!(server.skip_written().is_empty());

    let (mut client, mut server) = ready_client(&[BIG_REQUESTS]);
    let mut w = WireWriter::new();
    w.bytes(&payload);
    client
        .send_request(RequestOpcode::NoOperation as u8, 0, w)
        .unwrap();
    let frame = server.skip_written().remove(0);
    assert_eq!(frame.len(), 8 + payload.len());
    assert_eq!(&frame[..4], &[127, 0, 0, 0]);
    assert_eq!(u32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]), 0x10001);
}

#[test]
fn test_extension_requests_need_extension() {
    let (mut client, _) = ready_client(&[]);
    let region = Region::from(client.generate_id());
    match client.xfixes_create_region(region, &[]) {
        Err(ClientError::ExtensionMissing(name)) => assert_eq!(name, "XFIXES"),
        other => panic!("expected ExtensionMissing, got {:?}", other),
    }
}

#[test]
fn test_resource_ids_come_from_setup_range() {
    let (mut client, _) = ready_client(&[]);
    let first = client.generate_id();
    let second = client.generate_id();
    assert_eq!(first.get() & !0x001fffff, 0x00200000);
    assert_ne!(first, second);
}

#[test]
fn test_close_cancels_pending_requests() {
    let (mut client, _) = ready_client(&[]);
    let cookie = client.intern_atom("UTF8_STRING", false, |_, _| {}).unwrap();
    client.close();
    assert_eq!(cookie.state(), RequestState::Cancelled);
    assert_eq!(client.state(), ConnectionState::Closed);
    assert!(matches!(client.no_operation(), Err(ClientError::Closed)));
}

#[test]
fn test_outstanding_replies_stay_with_their_requests() {
    let (mut client, mut server) = ready_client(&[]);
    let results = Rc::new(RefCell::new(Vec::new()));

    let seen = Rc::clone(&results);
    let first = client
        .intern_atom("CLIPBOARD", false, move |_, result| {
            seen.borrow_mut().push(format!("first {:?}", result.map(|a| a.get())))
        })
        .unwrap();
    let one_way = client.map_window(Window::new(0x00200001)).unwrap();
    let seen = Rc::clone(&results);
    let second = client
        .get_atom_name(Atom(0xbad), move |_, result| {
            let outcome = match result {
                Err(ClientError::Protocol(e)) => format!("error {:?}", e.kind),
                Ok(name) => name,
                Err(e) => e.to_string(),
            };
            seen.borrow_mut().push(format!("second {}", outcome))
        })
        .unwrap();
    let seen = Rc::clone(&results);
    let third = client
        .intern_atom("TARGETS", false, move |_, result| {
            seen.borrow_mut().push(format!("third {:?}", result.map(|a| a.get())))
        })
        .unwrap();
    server.skip_written();
    assert_eq!(client.pending_request_count(), 3);
    assert!(!client.is_pending(one_way));

    let errors = Rc::new(Cell::new(0));
    let counter = Rc::clone(&errors);
    client.set_error_callback(move |_, _| counter.set(counter.get() + 1));

    let input = [
        reply(first.sequence_number(), 0, &300u32.to_le_bytes()),
        error(5, second.sequence_number(), 0xbad, 17),
        reply(third.sequence_number(), 0, &301u32.to_le_bytes()),
        // Nothing waits on the one-way request
        reply(one_way, 0, &999u32.to_le_bytes()),
    ]
    .concat();
    assert_eq!(client.process_input(&input), input.len());

    assert_eq!(
        *results.borrow(),
        vec!["first Ok(300)", "second error Atom", "third Ok(301)"]
    );
    assert_eq!(errors.get(), 0);
    assert_eq!(client.pending_request_count(), 0);
}

#[test]
fn test_sequence_numbers_wrap_at_16_bits() {
    let (mut client, mut server) = ready_client(&[]);
    while client.sequence_number() != 0xfffe {
        client.no_operation().unwrap();
    }
    server.skip_written();

    let atoms = Rc::new(RefCell::new(Vec::new()));
    let mut cookies = Vec::new();
    for name in ["BEFORE_WRAP", "AT_ZERO", "AFTER_WRAP"] {
        let seen = Rc::clone(&atoms);
        cookies.push(
            client
                .intern_atom(name, false, move |_, result| {
                    seen.borrow_mut().push((name, result.unwrap()))
                })
                .unwrap(),
        );
    }
    let sequences: Vec<_> = cookies.iter().map(|c| c.sequence_number()).collect();
    assert_eq!(sequences, vec![0xffff, 0, 1]);
    assert_eq!(client.sequence_number(), 1);

    // Answer out of order; each reply still finds its own request
    client.process_input(&reply(0, 0, &11u32.to_le_bytes()));
    client.process_input(&reply(1, 0, &12u32.to_le_bytes()));
    client.process_input(&reply(0xffff, 0, &10u32.to_le_bytes()));
    assert_eq!(
        *atoms.borrow(),
        vec![
            ("AT_ZERO", Atom(11)),
            ("AFTER_WRAP", Atom(12)),
            ("BEFORE_WRAP", Atom(10)),
        ]
    );
}

#[cfg(unix)]
fn file_with_contents(tag: &str) -> (std::path::PathBuf, std::os::fd::OwnedFd) {
    let path = std::env::temp_dir().join(format!("x11client-{}-{}", tag, std::process::id()));
    std::fs::write(&path, tag).unwrap();
    let fd = std::fs::File::open(&path).unwrap().into();
    (path, fd)
}

#[cfg(unix)]
fn contents(fd: std::os::fd::OwnedFd) -> String {
    use std::io::Read;
    let mut text = String::new();
    std::fs::File::from(fd).read_to_string(&mut text).unwrap();
    text
}

#[cfg(unix)]
#[test]
fn test_dri3_open_takes_received_fd() {
    let (mut client, _) = ready_client(&[DRI3]);
    let root = Drawable::Window(Window::new(ROOT_WINDOW));
    let opened = Rc::new(RefCell::new(Vec::new()));

    let seen = Rc::clone(&opened);
    let cookie = client
        .dri3_open(root, 0, move |_, result| seen.borrow_mut().push(contents(result.unwrap())))
        .unwrap();
    let (path, fd) = file_with_contents("device");
    client.push_received_fds(vec![fd]);
    client.process_input(&reply(cookie.sequence_number(), 1, &[]));
    std::fs::remove_file(path).unwrap();
    assert_eq!(*opened.borrow(), vec!["device"]);
    assert_eq!(client.received_fd_count(), 0);

    let missing = Rc::new(Cell::new(false));
    let seen = Rc::clone(&missing);
    let cookie = client
        .dri3_open(root, 0, move |_, result| {
            seen.set(matches!(result, Err(ClientError::MissingFd)))
        })
        .unwrap();
    client.process_input(&reply(cookie.sequence_number(), 1, &[]));
    assert!(missing.get());
}

#[cfg(unix)]
#[test]
fn test_cancelled_reply_releases_its_fd() {
    let (mut client, _) = ready_client(&[DRI3]);
    let root = Drawable::Window(Window::new(ROOT_WINDOW));
    let opened = Rc::new(RefCell::new(Vec::new()));

    let seen = Rc::clone(&opened);
    let abandoned = client
        .dri3_open(root, 0, move |_, result| seen.borrow_mut().push(contents(result.unwrap())))
        .unwrap();
    abandoned.cancel();
    let (stale_path, stale) = file_with_contents("stale");
    client.push_received_fds(vec![stale]);
    client.process_input(&reply(abandoned.sequence_number(), 1, &[]));
    std::fs::remove_file(stale_path).unwrap();
    assert_eq!(client.received_fd_count(), 0);

    let seen = Rc::clone(&opened);
    let cookie = client
        .dri3_open(root, 0, move |_, result| seen.borrow_mut().push(contents(result.unwrap())))
        .unwrap();
    let (fresh_path, fresh) = file_with_contents("fresh");
    client.push_received_fds(vec![fresh]);
    client.process_input(&reply(cookie.sequence_number(), 1, &[]));
    std::fs::remove_file(fresh_path).unwrap();

    assert_eq!(*opened.borrow(), vec!["fresh"]);
}

#[cfg(unix)]
#[test]
fn test_surplus_reply_fds_are_not_reused() {
    let (mut client, _) = ready_client(&[DRI3]);
    let buffers = Rc::new(RefCell::new(Vec::new()));
    let mut layout = Vec::new();
    layout.extend_from_slice(&4096u32.to_le_bytes());
    layout.extend_from_slice(&32u16.to_le_bytes());
    layout.extend_from_slice(&32u16.to_le_bytes());
    layout.extend_from_slice(&128u16.to_le_bytes());
    layout.extend_from_slice(&[24, 32]);

    // The first reply announces two descriptors but the decoder wants one
    let seen = Rc::clone(&buffers);
    let cookie = client
        .dri3_buffer_from_pixmap(Pixmap::new(0x00200004), move |_, result| {
            let buffer = result.unwrap();
            seen.borrow_mut().push((buffer.layout.stride, contents(buffer.fd)))
        })
        .unwrap();
    let (first_path, first) = file_with_contents("plane0");
    let (extra_path, extra) = file_with_contents("plane1");
    client.push_received_fds(vec![first, extra]);
    client.process_input(&reply(cookie.sequence_number(), 2, &layout));
    assert_eq!(client.received_fd_count(), 0);

    let seen = Rc::clone(&buffers);
    let cookie = client
        .dri3_buffer_from_pixmap(Pixmap::new(0x00200005), move |_, result| {
            let buffer = result.unwrap();
            seen.borrow_mut().push((buffer.layout.stride, contents(buffer.fd)))
        })
        .unwrap();
    let (next_path, next) = file_with_contents("next");
    client.push_received_fds(vec![next]);
    client.process_input(&reply(cookie.sequence_number(), 1, &layout));

    for path in [first_path, extra_path, next_path] {
        std::fs::remove_file(path).unwrap();
    }
    assert_eq!(
        *buffers.borrow(),
        vec![(128, "plane0".to_string()), (128, "next".to_string())]
    );
}
